#![allow(
    clippy::cognitive_complexity,
    clippy::inherent_to_string,
    clippy::new_without_default,
    clippy::toplevel_ref_arg
)]

mod app;
mod output;

use crate::output::Output;
use anyhow::{bail, Result};
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use cppfier::{harness, Config};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Opt {
    inputs: Vec<PathBuf>,
    config: Option<PathBuf>,
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    namespace: Option<String>,
    prefixes: Vec<String>,
    ignore: Vec<String>,
    check: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match try_main(app::from_args()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("cppfier: {:?}", err);
            ExitCode::FAILURE
        }
    }
}

// Ok(false) when the run produced diagnostics or a check failed.
fn try_main(opt: Opt) -> Result<bool> {
    let mut config = match &opt.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(source) = opt.source {
        config.source_dir = Some(source);
    }
    if let Some(output) = opt.output {
        config.output_dir = Some(output);
    }
    if let Some(namespace) = opt.namespace {
        config.namespace = Some(namespace).filter(|namespace| !namespace.is_empty());
    }
    if !opt.prefixes.is_empty() {
        config.prefixes = opt.prefixes;
    }
    if !opt.ignore.is_empty() {
        config.ignore_tokens = opt.ignore;
    }

    let inputs = if opt.inputs.is_empty() {
        config.inputs()?
    } else {
        let mut inputs = Vec::new();
        for path in &opt.inputs {
            inputs.push(config.input(path)?);
        }
        inputs
    };

    let generation = cppfier::generate(&inputs, &config.opt());
    let writer = StandardStream::stderr(ColorChoice::Auto);
    generation.emit_diagnostics(&mut writer.lock());
    let mut ok = generation.is_clean();

    let output = match config.output_dir {
        Some(dir) => Output::Dir(dir),
        None => Output::Stdout,
    };
    if opt.check {
        let Output::Dir(dir) = &output else {
            bail!("--check needs an output directory to compare against");
        };
        let failures = harness::check(&generation, dir)?;
        for failure in &failures {
            eprintln!("cppfier: {}", failure);
        }
        ok &= failures.is_empty();
    } else {
        output.write(&generation.files)?;
    }
    Ok(ok)
}
