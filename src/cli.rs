//! Command-line interface for ptyctl.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

use lexopt::ValueExt;

use crate::pty::EnvironmentBlock;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Command line to run; positional words joined by single spaces.
    pub command_line: Option<String>,
    /// Application to execute (or to interpret the command line).
    pub app_name: Option<String>,
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Extra `KEY=VALUE` variables for the child.
    pub env: Vec<(String, String)>,
    /// Start the child with only the variables given by `--env`.
    pub env_clear: bool,
    /// Initial columns (overrides config).
    pub cols: Option<u16>,
    /// Initial rows (overrides config).
    pub rows: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
///
/// The first element is the program name. Everything from the first
/// positional argument on belongs to the command line, flags included.
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('a') | Long("app") => {
                result.app_name = Some(parser.value()?.parse()?);
            }
            Short('C') | Long("cwd") => {
                result.cwd = Some(parser.value()?.parse()?);
            }
            Short('e') | Long("env") => {
                let value: String = parser.value()?.parse()?;
                let entry = EnvironmentBlock::parse_entry(&value)
                    .map_err(|_| ArgsError::InvalidValue("env", value))?;
                result.env.push(entry);
            }
            Long("env-clear") => {
                result.env_clear = true;
            }
            Long("cols") => {
                result.cols = Some(parse_dimension(&mut parser, "cols")?);
            }
            Long("rows") => {
                result.rows = Some(parse_dimension(&mut parser, "rows")?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(first) => {
                let mut words = vec![os_to_string(first)?];
                for raw in parser.raw_args()? {
                    words.push(os_to_string(raw)?);
                }
                result.command_line = Some(words.join(" "));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

fn parse_dimension(parser: &mut lexopt::Parser, name: &'static str) -> Result<u16, ArgsError> {
    let value: String = parser.value()?.parse()?;
    match value.parse::<u16>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ArgsError::InvalidValue(name, value)),
    }
}

fn os_to_string(value: OsString) -> Result<String, ArgsError> {
    value
        .into_string()
        .map_err(|raw| ArgsError::InvalidValue("command", raw.to_string_lossy().into_owned()))
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"ptyctl {version}
Run a command on a pseudo-terminal and relay its I/O

USAGE:
    ptyctl [OPTIONS] [--] <COMMAND LINE>...

The command line is passed verbatim to the interpreter (/bin/sh -c on Unix,
cmd.exe /c on Windows). The process exits with the child's exit code.

OPTIONS:
    -a, --app <PATH>        Application to run (interprets the command line if given)
    -C, --cwd <DIR>         Working directory [default: current directory]
    -e, --env <KEY=VALUE>   Set a variable for the child (repeatable)
        --env-clear         Do not inherit the current environment
        --cols <N>          Initial columns [default: 80]
        --rows <N>          Initial rows [default: 25]
    -c, --config <FILE>     Path to configuration file (JSON)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    PTYCTL_COLS             Initial columns (overrides config)
    PTYCTL_ROWS             Initial rows (overrides config)
    PTYCTL_SHELL            Interpreter for command lines (overrides config)
    PTYCTL_LOG_LEVEL        Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXAMPLES:
    ptyctl echo hello
    ptyctl --cols 120 --rows 40 -- top -b -n 1
    ptyctl --env-clear -e TERM=dumb -- env
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("ptyctl {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
