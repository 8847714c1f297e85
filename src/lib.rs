//! # daemon_kit
//!
//! **daemon_kit** is a small library for building classic *nix daemons in
//! Rust: forking to the background, wiring up syslog, and parsing a
//! simplistic `IDENT=VALUE` configuration file into a typed options record.
//!
//! A typical daemon reads its rc file, refuses to start on any parse error,
//! and only then detaches:
//!
//! ```no_run
//! use daemon_kit::{Daemon, Options};
//!
//! let mut opts = Options::new("mydaemon");
//! opts.load_file(std::path::Path::new("/etc/mydaemon.rc"))?;
//!
//! Daemon::from_options(&opts)
//!     .payload(|| {
//!         log::info!("daemon running");
//!         Ok(())
//!     })
//!     .start()?;
//! # Ok::<(), daemon_kit::DaemonError>(())
//! ```
//!
//! Unix only. See `demos/mydaemon.rs` for a complete template with a
//! command-line option table.

mod config;
mod daemon;
mod error;
mod options;
mod signals;
mod stdio;
mod sys;

// Re-export public types to keep the API flat
pub use config::parse_config;
pub use daemon::Daemon;
pub use error::{ConfigError, DaemonError, DaemonResult};
pub use options::{Options, SYSLOG_IDENT_MAX};
pub use signals::shutdown_flag;
pub use stdio::Stdio;
