use std::fs;
use std::path::{Path, PathBuf};

use crate::config::parse_config;
use crate::error::{ConfigError, DaemonResult};

/// Maximum number of visible characters kept in [`Options::syslog_ident`].
/// Assignments never overflow this bound; longer values are truncated.
pub const SYSLOG_IDENT_MAX: usize = 255;

/// Daemon options, such as those which might be provided on the
/// command-line or in a config file.
///
/// Both an rc-file parse and a flag parser mutate the same record, so the
/// fields are plain and public. The config parser only ever touches
/// `daemonize`, `verbose` and `syslog_ident`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Path of the configuration file to load, if any.
    pub config_file: Option<PathBuf>,
    /// Whether the process should fork to the background.
    pub daemonize: bool,
    /// Whether verbose logging should occur.
    pub verbose: bool,
    /// The syslog ident string, at most [`SYSLOG_IDENT_MAX`] characters.
    pub syslog_ident: String,
}

impl Options {
    /// Creates a record with defaults: run in the foreground, quiet, with
    /// `name` as the syslog ident.
    pub fn new(name: &str) -> Self {
        let mut opts = Options {
            config_file: None,
            daemonize: false,
            verbose: false,
            syslog_ident: String::new(),
        };
        // Infallible for any sane daemon name; fall back to empty otherwise.
        let _ = opts.set_syslog_ident(name);
        opts
    }

    /// Applies one `(identifier, value)` pair from the config scanner.
    ///
    /// Identifiers are matched exactly and case-sensitively. Unrecognized
    /// identifiers and unparseable boolean values are rejected, which aborts
    /// the surrounding parse.
    pub fn apply(&mut self, ident: &str, value: &str) -> Result<(), ConfigError> {
        match ident {
            "daemonize" => self.daemonize = validate_boolean(value)?,
            "verbose" => self.verbose = validate_boolean(value)?,
            "syslog_ident" => self.set_syslog_ident(value)?,
            _ => return Err(ConfigError::UnknownIdentifier(ident.to_owned())),
        }
        Ok(())
    }

    /// Stores `value` as the syslog ident, truncated to
    /// [`SYSLOG_IDENT_MAX`] characters. Any string content is accepted; the
    /// only possible failure is the allocation for the copy itself.
    pub fn set_syslog_ident(&mut self, value: &str) -> Result<(), ConfigError> {
        let end = value
            .char_indices()
            .nth(SYSLOG_IDENT_MAX)
            .map_or(value.len(), |(i, _)| i);
        let truncated = &value[..end];

        let mut ident = String::new();
        ident
            .try_reserve_exact(truncated.len())
            .map_err(|_| ConfigError::ResourceExhausted)?;
        ident.push_str(truncated);
        self.syslog_ident = ident;
        Ok(())
    }

    /// Reads the file at `path` and runs [`parse_config`] over its contents.
    ///
    /// The read and the parse are the caller-side sequence the daemon
    /// template performs at startup; the parser itself never does I/O.
    pub fn load_file(&mut self, path: &Path) -> DaemonResult<()> {
        let data = fs::read_to_string(path)?;
        parse_config(&data, self)?;
        Ok(())
    }
}

/// Validates a boolean literal. Valid input is, case insensitive:
/// true: `y`, `yes`, `true`, `1`; false: `n`, `no`, `false`, `0`.
fn validate_boolean(value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "1" | "yes" | "true" => Ok(true),
        "n" | "0" | "no" | "false" => Ok(false),
        _ => Err(ConfigError::InvalidBooleanLiteral(value.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = Options::new("mydaemon");
        assert!(!opts.daemonize);
        assert!(!opts.verbose);
        assert_eq!(opts.syslog_ident, "mydaemon");
        assert!(opts.config_file.is_none());
    }

    #[test]
    fn test_boolean_literals() {
        for v in ["y", "Y", "1", "yes", "YES", "true", "TRUE", "True"] {
            assert_eq!(validate_boolean(v).unwrap(), true, "literal {:?}", v);
        }
        for v in ["n", "N", "0", "no", "No", "false", "FALSE"] {
            assert_eq!(validate_boolean(v).unwrap(), false, "literal {:?}", v);
        }
    }

    #[test]
    fn test_boolean_rejects_everything_else() {
        for v in ["maybe", "", "10", "yess", "tru", "on", "off", " yes"] {
            assert_eq!(
                validate_boolean(v).unwrap_err(),
                ConfigError::InvalidBooleanLiteral(v.to_owned()),
                "literal {:?}",
                v
            );
        }
    }

    #[test]
    fn test_apply_dispatch() {
        let mut opts = Options::new("testd");
        opts.apply("daemonize", "yes").unwrap();
        opts.apply("verbose", "TRUE").unwrap();
        opts.apply("syslog_ident", "other").unwrap();
        assert!(opts.daemonize);
        assert!(opts.verbose);
        assert_eq!(opts.syslog_ident, "other");
    }

    #[test]
    fn test_apply_is_case_sensitive() {
        let mut opts = Options::new("testd");
        assert_eq!(
            opts.apply("Daemonize", "yes").unwrap_err(),
            ConfigError::UnknownIdentifier("Daemonize".to_owned())
        );
    }

    #[test]
    fn test_apply_invalid_boolean() {
        let mut opts = Options::new("testd");
        assert_eq!(
            opts.apply("daemonize", "maybe").unwrap_err(),
            ConfigError::InvalidBooleanLiteral("maybe".to_owned())
        );
        assert!(!opts.daemonize);
    }

    #[test]
    fn test_syslog_ident_truncated_to_capacity() {
        let mut opts = Options::new("testd");
        let long = "x".repeat(300);
        opts.apply("syslog_ident", &long).unwrap();
        assert_eq!(opts.syslog_ident.chars().count(), SYSLOG_IDENT_MAX);
        assert_eq!(opts.syslog_ident, "x".repeat(SYSLOG_IDENT_MAX));
    }

    #[test]
    fn test_syslog_ident_truncates_on_char_boundary() {
        let mut opts = Options::new("testd");
        let long = "ü".repeat(300);
        opts.apply("syslog_ident", &long).unwrap();
        assert_eq!(opts.syslog_ident.chars().count(), SYSLOG_IDENT_MAX);
    }

    #[test]
    fn test_syslog_ident_exactly_at_capacity() {
        let mut opts = Options::new("testd");
        let exact = "y".repeat(SYSLOG_IDENT_MAX);
        opts.apply("syslog_ident", &exact).unwrap();
        assert_eq!(opts.syslog_ident, exact);
    }
}
