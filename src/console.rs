//! Line-oriented console front end.
//!
//! Stands in for the sign-in, sign-up and chat screens: each input line is
//! parsed into a [`ConsoleCommand`] and the session state is rendered back
//! as text.

use std::fmt::Write as _;

use crate::identity::SignUpProfile;
use crate::router::select_screen;
use crate::session::SessionState;

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// `signin <id>`
    SignIn { identifier: String },
    /// `signup <id> <name...> [--email <addr>]`
    SignUp(SignUpProfile),
    /// `signout`
    SignOut,
    /// `status`
    Status,
    /// `help`
    Help,
    /// `quit`
    Quit,
}

impl ConsoleCommand {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, ConsoleError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ConsoleError::Empty);
        };

        match verb.to_lowercase().as_str() {
            "signin" | "login" => {
                let identifier = words.next().ok_or(ConsoleError::MissingArgument("id"))?;
                if let Some(extra) = words.next() {
                    return Err(ConsoleError::UnexpectedArgument(extra.to_string()));
                }
                Ok(Self::SignIn {
                    identifier: identifier.to_string(),
                })
            }
            "signup" | "register" => {
                let identifier = words.next().ok_or(ConsoleError::MissingArgument("id"))?;
                let mut name = Vec::new();
                let mut email = None;
                while let Some(word) = words.next() {
                    if word == "--email" {
                        let value = words.next().ok_or(ConsoleError::MissingArgument("email"))?;
                        email = Some(value.to_string());
                    } else {
                        name.push(word);
                    }
                }
                if name.is_empty() {
                    return Err(ConsoleError::MissingArgument("name"));
                }
                Ok(Self::SignUp(SignUpProfile {
                    identifier: identifier.to_string(),
                    display_name: name.join(" "),
                    email,
                }))
            }
            "signout" | "logout" => Ok(Self::SignOut),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(ConsoleError::UnknownCommand(other.to_string())),
        }
    }
}

/// Console parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    /// Blank line.
    Empty,
    /// Unrecognized verb.
    UnknownCommand(String),
    /// Required argument missing.
    MissingArgument(&'static str),
    /// Extra positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::UnknownCommand(verb) => write!(f, "unknown command: '{}' (try 'help')", verb),
            Self::MissingArgument(name) => write!(f, "missing argument: <{}>", name),
            Self::UnexpectedArgument(arg) => write!(f, "unexpected argument: '{}'", arg),
        }
    }
}

impl std::error::Error for ConsoleError {}

/// Console help text.
pub const HELP: &str = "\
COMMANDS:
    signin <id>                          Sign in with the configured auth key
    signup <id> <name...> [--email <a>]  Create an account and sign in
    signout                              Sign out
    status                               Show the session state
    help                                 Show this help
    quit                                 Exit";

/// Render the session state as a short multi-line report.
pub fn render_status(state: &SessionState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "screen: {}", select_screen(state));

    match state.identity() {
        Some(identity) => {
            let _ = write!(out, "user: {} ({})", identity.display_name, identity.id);
            if let Some(avatar) = &identity.avatar_url {
                let _ = write!(out, " avatar={}", avatar);
            }
            out.push('\n');
        }
        None => out.push_str("user: -\n"),
    }

    if let Some(op) = state.in_flight() {
        let _ = writeln!(out, "busy: {}", op);
    } else if state.is_busy() {
        out.push_str("busy: restore pending\n");
    }

    if let Some(error) = state.last_error() {
        let _ = writeln!(out, "error: {}", error);
    }

    out.truncate(out.trim_end().len());
    out
}
