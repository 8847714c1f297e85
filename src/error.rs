use std::fmt;
use std::io;

/// Failure raised while parsing an rc-style configuration file.
///
/// Syntax errors mean the file itself is bad and re-running the parse on the
/// same input will fail again; [`ConfigError::ResourceExhausted`] is the one
/// system-level variant, kept distinct so callers can report "internal error"
/// instead of "bad file".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// First non-whitespace character on a content line is neither an
    /// identifier start (`[A-Za-z_]`) nor `#`.
    InvalidIdentifierStart(char),
    /// Identifier run ended at a character other than whitespace or `=`.
    /// `None` means the input ended inside the identifier line.
    MalformedIdentifier(Option<char>),
    /// No `=` found after the identifier and any whitespace.
    ExpectedEquals(String),
    /// End of line or end of input immediately after the `=`.
    MissingValue(String),
    /// End of input reached inside a quoted value, before the closing `"`.
    UnterminatedQuotedValue,
    /// Identifier is not one of the recognized settings.
    UnknownIdentifier(String),
    /// Value given for a boolean setting is not a recognized literal.
    InvalidBooleanLiteral(String),
    /// Allocation failed while materializing a token.
    ResourceExhausted,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidIdentifierStart(c) => {
                write!(f, "invalid identifier start: {:?}", c)
            }
            ConfigError::MalformedIdentifier(Some(c)) => {
                write!(f, "expected whitespace or '=' after identifier, got: {:?}", c)
            }
            ConfigError::MalformedIdentifier(None) => {
                write!(f, "expected whitespace or '=' after identifier, got end of input")
            }
            ConfigError::ExpectedEquals(ident) => {
                write!(f, "expected a '=' after \"{}\"", ident)
            }
            ConfigError::MissingValue(ident) => {
                write!(f, "no value provided for {}", ident)
            }
            ConfigError::UnterminatedQuotedValue => {
                write!(f, "expected terminating '\"', got end of input")
            }
            ConfigError::UnknownIdentifier(ident) => {
                write!(f, "invalid identifier: {}", ident)
            }
            ConfigError::InvalidBooleanLiteral(value) => {
                write!(f, "invalid boolean value: {}", value)
            }
            ConfigError::ResourceExhausted => {
                write!(f, "out of memory while reading configuration")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Custom error type for daemon_kit.
/// Provides specific details about why daemonization or setup failed.
#[derive(Debug)]
pub enum DaemonError {
    /// Standard IO errors (file creation, reading the rc file, etc.)
    Io(io::Error),
    /// The configuration file did not parse.
    Config(ConfigError),
    /// The PID lock file is already held by another instance.
    AlreadyRunning,
    /// A system call failed during daemonization (fork, setsid).
    Syscall { call: &'static str, errno: i32 },
    /// The syslog connection could not be established.
    Logger(String),
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonError::Io(err) => write!(f, "IO error: {}", err),
            DaemonError::Config(err) => write!(f, "config: {}", err),
            DaemonError::AlreadyRunning => write!(f, "daemon is already running (PID file locked)"),
            DaemonError::Syscall { call, errno } => {
                write!(f, "syscall '{}' failed with errno {}", call, errno)
            }
            DaemonError::Logger(msg) => write!(f, "syslog setup failed: {}", msg),
        }
    }
}

impl std::error::Error for DaemonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DaemonError::Io(err) => Some(err),
            DaemonError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DaemonError {
    fn from(err: io::Error) -> Self {
        DaemonError::Io(err)
    }
}

impl From<ConfigError> for DaemonError {
    fn from(err: ConfigError) -> Self {
        DaemonError::Config(err)
    }
}

/// A specialized Result type for daemon_kit operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
