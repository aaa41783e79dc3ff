//! Command-line interface for ssh-relay.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Positional values form the remote command: the first is the command
/// line, the rest are its arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Remote host to connect to.
    pub host: Option<String>,
    /// SSH port.
    pub port: Option<u16>,
    /// Username to authenticate as.
    pub username: Option<String>,
    /// Path to the private key file.
    pub key: Option<PathBuf>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Lowest exit code treated as an error.
    pub min_error: Option<u32>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Remote command and its arguments.
    pub command: Vec<String>,
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
            Short('H') | Long("host") => {
                result.host = Some(parser.value()?.parse()?);
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('u') | Long("user") => {
                result.username = Some(parser.value()?.parse()?);
            }
            Short('k') | Long("key") => {
                result.key = Some(parser.value()?.parse()?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Long("min-error") => {
                let value: String = parser.value()?.parse()?;
                result.min_error = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("min-error", value))?,
                );
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                // First positional starts the remote command; everything
                // after it belongs to that command verbatim.
                result.command.push(val.to_string_lossy().into());
                for rest in parser.raw_args()? {
                    result.command.push(rest.to_string_lossy().into());
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"ssh-relay {version}
Run a remote command over SSH with connection-deferred stream handles

USAGE:
    ssh-relay [OPTIONS] <COMMAND> [ARGS]...

OPTIONS:
    -H, --host <HOST>       Remote host to connect to
    -p, --port <PORT>       SSH port [default: 22]
    -u, --user <USER>       Username to authenticate as
    -k, --key <FILE>        Private key file (re-read on every run)
    -c, --config <FILE>     Path to configuration file (JSON)
        --min-error <N>     Lowest exit code treated as an error [default: 1]
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    SSH_RELAY_HOST          Remote host (overrides config)
    SSH_RELAY_PORT          SSH port (overrides config)
    SSH_RELAY_USER          Username (overrides config)
    SSH_RELAY_KEY           Private key path (overrides config)
    SSH_RELAY_LOG_LEVEL     Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXAMPLES:
    # Run a command as deploy@build.example.com
    ssh-relay -H build.example.com -u deploy -k ~/.ssh/id_ed25519 uptime

    # Arguments with spaces are escaped for the remote shell
    ssh-relay -c relay.json ls "my dir" other

    # Treat exit codes >= 2 as failures
    ssh-relay -c relay.json --min-error 2 grep pattern /var/log/app.log
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("ssh-relay {}", env!("CARGO_PKG_VERSION"));
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
