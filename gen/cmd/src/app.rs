#[cfg(test)]
#[path = "test.rs"]
mod test;

use super::Opt;
use clap::builder::{ArgAction, ValueParser};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

const USAGE: &str = "\
cppfier --config <config.json>             Generate the headers listed in the config
    cppfier <input>.h... --output <dir>        Generate one .hpp per input into <dir>
    cppfier --config <config.json> --check     Compare against the existing output\
";

const TEMPLATE: &str = "\
{bin} {version}
Ownership-aware C++ wrapper headers for C libraries

USAGE:
    {usage}

ARGS:
{positionals}

OPTIONS:
{options}\
";

fn app() -> Command {
    let mut app = Command::new("cppfier")
        .override_usage(USAGE)
        .help_template(TEMPLATE)
        .next_line_help(true)
        .arg(arg_input())
        .arg(arg_config())
        .arg(arg_source())
        .arg(arg_output())
        .arg(arg_namespace())
        .arg(arg_prefix())
        .arg(arg_ignore())
        .arg(arg_check());
    if let Some(version) = option_env!("CARGO_PKG_VERSION") {
        app = app.version(version);
    }
    app
}

const INPUT: &str = "input";
const CONFIG: &str = "config";
const SOURCE: &str = "source";
const OUTPUT: &str = "output";
const NAMESPACE: &str = "namespace";
const PREFIX: &str = "prefix";
const IGNORE: &str = "ignore";
const CHECK: &str = "check";

pub(super) fn from_args() -> Opt {
    from_matches(&app().get_matches())
}

fn from_matches(matches: &ArgMatches) -> Opt {
    let inputs = matches
        .get_many::<PathBuf>(INPUT)
        .unwrap_or_default()
        .cloned()
        .collect();
    let config = matches.get_one::<PathBuf>(CONFIG).cloned();
    let source = matches.get_one::<PathBuf>(SOURCE).cloned();
    let output = matches.get_one::<PathBuf>(OUTPUT).cloned();
    let namespace = matches.get_one::<String>(NAMESPACE).cloned();
    let prefixes = matches
        .get_many::<String>(PREFIX)
        .unwrap_or_default()
        .cloned()
        .collect();
    let ignore = matches
        .get_many::<String>(IGNORE)
        .unwrap_or_default()
        .cloned()
        .collect();
    let check = matches.get_flag(CHECK);

    Opt {
        inputs,
        config,
        source,
        output,
        namespace,
        prefixes,
        ignore,
        check,
    }
}

fn arg_input() -> Arg {
    Arg::new(INPUT)
        .help("Input C headers. Defaults to the config's file list or every .h in the source directory.")
        .action(ArgAction::Append)
        .value_name("input.h")
        .value_parser(ValueParser::path_buf())
}

fn arg_config() -> Arg {
    const HELP: &str = "\
Path of a config.json. Relative directories inside it are
resolved against the directory holding it.";
    Arg::new(CONFIG)
        .long(CONFIG)
        .short('c')
        .action(ArgAction::Set)
        .value_name("file")
        .value_parser(ValueParser::path_buf())
        .help(HELP)
}

fn arg_source() -> Arg {
    Arg::new(SOURCE)
        .long(SOURCE)
        .short('s')
        .action(ArgAction::Set)
        .value_name("dir")
        .value_parser(ValueParser::path_buf())
        .help("Directory holding the input headers.")
}

fn arg_output() -> Arg {
    const HELP: &str = "\
Directory to write the generated headers to. Output goes to
stdout if neither this nor the config names one.";
    Arg::new(OUTPUT)
        .long(OUTPUT)
        .short('o')
        .action(ArgAction::Set)
        .value_name("dir")
        .value_parser(ValueParser::path_buf())
        .help(HELP)
}

fn arg_namespace() -> Arg {
    const HELP: &str = "\
Namespace to emit the wrappers into. An empty value emits them
at global scope.";
    Arg::new(NAMESPACE)
        .long(NAMESPACE)
        .short('n')
        .action(ArgAction::Set)
        .value_name("ns")
        .value_parser(ValueParser::string())
        .help(HELP)
}

fn arg_prefix() -> Arg {
    Arg::new(PREFIX)
        .long(PREFIX)
        .short('p')
        .action(ArgAction::Append)
        .value_name("prefix")
        .value_parser(ValueParser::string())
        .help("Library prefix stripped from source names, such as SDL_.")
}

fn arg_ignore() -> Arg {
    const HELP: &str = "\
Attribute-like macro the parser skips, such as SDL_DECLSPEC.
Followed by a parenthesized argument list, that is skipped too.";
    Arg::new(IGNORE)
        .long(IGNORE)
        .action(ArgAction::Append)
        .value_name("token")
        .value_parser(ValueParser::string())
        .help(HELP)
}

fn arg_check() -> Arg {
    const HELP: &str = "\
Write nothing; compare each generated header with the file of
the same name in the output directory and fail on the first
differing declaration.";
    Arg::new(CHECK)
        .long(CHECK)
        .action(ArgAction::SetTrue)
        .help(HELP)
}
