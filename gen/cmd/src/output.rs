use anyhow::{Context, Result};
use cppfier::GeneratedFile;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug)]
pub(crate) enum Output {
    Stdout,
    Dir(PathBuf),
}

impl Output {
    pub(crate) fn write(&self, files: &[GeneratedFile]) -> Result<()> {
        match self {
            Output::Stdout => {
                let stdout = &mut io::stdout().lock();
                for file in files {
                    stdout
                        .write_all(file.content.as_bytes())
                        .context("Failed to write to stdout")?;
                }
            }
            Output::Dir(dir) => {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory `{}`", dir.display()))?;
                for file in files {
                    let path = dir.join(&file.path);
                    fs::write(&path, &file.content)
                        .with_context(|| format!("Failed to write file `{}`", path.display()))?;
                    tracing::debug!(path = %path.display(), "wrote");
                }
            }
        }
        Ok(())
    }
}
