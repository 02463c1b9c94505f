//! Command-line interface for messenger-session.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// App auth key (overrides config file).
    pub auth_key: Option<String>,
    /// Seed a live backend session for this user so startup restore finds it.
    pub resume: Option<String>,
    /// Per-call backend timeout in seconds.
    pub timeout_secs: Option<u64>,
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
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('k') | Long("auth-key") => {
                result.auth_key = Some(parser.value()?.parse()?);
            }
            Short('u') | Long("resume") => {
                result.resume = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                let secs = value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ArgsError::InvalidValue("timeout", value))?;
                result.timeout_secs = Some(secs);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
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
        r#"messenger-session {version}
Session lifecycle console for a hosted-backend messaging client

USAGE:
    messenger-session [OPTIONS]

OPTIONS:
    -c, --config <FILE>     Path to configuration file (JSON)
    -k, --auth-key <KEY>    App auth key used for every login
    -u, --resume <ID>       Start with a live backend session for this user
    -t, --timeout <SECS>    Per-call backend timeout [default: 30]
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    MESSENGER_APP_ID        Backend app id (overrides config)
    MESSENGER_REGION        Backend region (overrides config)
    MESSENGER_AUTH_KEY      App auth key (overrides config)
    MESSENGER_TIMEOUT_SECS  Backend timeout (overrides config)
    MESSENGER_LOG_LEVEL     Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXAMPLES:
    # Start with defaults
    messenger-session

    # Start already signed in as a seeded user
    messenger-session -c users.json -u alice

    # Verbose session transitions
    messenger-session -l debug
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("messenger-session {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("messenger-session")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.config.is_none());
        assert!(result.auth_key.is_none());
        assert!(result.resume.is_none());
        assert!(!result.help);
    }

    #[test]
    fn test_auth_key() {
        let result = parse_args_from(args(&["-k", "my-secret"])).unwrap();
        assert_eq!(result.auth_key, Some("my-secret".to_string()));

        let result = parse_args_from(args(&["--auth-key", "other"])).unwrap();
        assert_eq!(result.auth_key, Some("other".to_string()));
    }

    #[test]
    fn test_config_file() {
        let result = parse_args_from(args(&["-c", "/etc/messenger.json"])).unwrap();
        assert_eq!(result.config, Some(PathBuf::from("/etc/messenger.json")));
    }

    #[test]
    fn test_resume() {
        let result = parse_args_from(args(&["--resume", "alice"])).unwrap();
        assert_eq!(result.resume, Some("alice".to_string()));
    }

    #[test]
    fn test_timeout() {
        let result = parse_args_from(args(&["-t", "5"])).unwrap();
        assert_eq!(result.timeout_secs, Some(5));
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(parse_args_from(args(&["-t", "soon"])).is_err());
        assert!(parse_args_from(args(&["--timeout", "0"])).is_err());
    }

    #[test]
    fn test_help_flag() {
        let result = parse_args_from(args(&["-h"])).unwrap();
        assert!(result.help);

        let result = parse_args_from(args(&["--help"])).unwrap();
        assert!(result.help);
    }

    #[test]
    fn test_version_flag() {
        let result = parse_args_from(args(&["-V"])).unwrap();
        assert!(result.version);
    }

    #[test]
    fn test_log_level() {
        let result = parse_args_from(args(&["-l", "debug"])).unwrap();
        assert_eq!(result.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_unexpected_positional() {
        let result = parse_args_from(args(&["stray"]));
        assert!(matches!(result, Err(ArgsError::UnexpectedArgument(_))));
    }
}
