use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{DaemonError, DaemonResult};
use crate::options::Options;
use crate::stdio::Stdio;

/// Builder that configures and launches the daemon process.
///
/// `Payload` is the return type of the daemon's main function; `start`
/// returns that value wrapped in a [`DaemonResult`] once the payload
/// finishes.
pub struct Daemon<Payload> {
    pub(crate) name: Option<String>,
    pub(crate) directory: PathBuf,
    pub(crate) pid_file: Option<PathBuf>,
    pub(crate) stdin: Stdio,
    pub(crate) stdout: Stdio,
    pub(crate) stderr: Stdio,
    pub(crate) umask: Option<u32>,
    pub(crate) foreground: bool,
    pub(crate) verbose: bool,
    pub(crate) payload: Option<Box<dyn FnOnce() -> DaemonResult<Payload>>>,
}

// Manual Debug because the payload closure has none.
impl<T> fmt::Debug for Daemon<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Daemon")
            .field("name", &self.name)
            .field("directory", &self.directory)
            .field("pid_file", &self.pid_file)
            .field("stdin", &self.stdin)
            .field("stdout", &self.stdout)
            .field("stderr", &self.stderr)
            .field("umask", &self.umask)
            .field("foreground", &self.foreground)
            .field("verbose", &self.verbose)
            .field(
                "payload",
                &if self.payload.is_some() { "Some(FnOnce)" } else { "None" },
            )
            .finish()
    }
}

impl Default for Daemon<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon<()> {
    /// Creates a new default configuration.
    ///
    /// # Defaults
    /// - Working directory: `/`
    /// - Stdio: `/dev/null`
    /// - Umask: `0`
    /// - Runs in the background (forks)
    pub fn new() -> Self {
        Daemon {
            name: None,
            directory: PathBuf::from("/"),
            pid_file: None,
            stdin: Stdio::null(),
            stdout: Stdio::null(),
            stderr: Stdio::null(),
            umask: Some(0),
            foreground: false,
            verbose: false,
            payload: Some(Box::new(|| Ok(()))),
        }
    }

    /// Creates a configuration from a parsed [`Options`] record: the record's
    /// syslog ident becomes the daemon name, and the `daemonize`/`verbose`
    /// flags map onto foreground mode and log verbosity.
    pub fn from_options(opts: &Options) -> Self {
        Self::new()
            .name(&opts.syslog_ident)
            .foreground(!opts.daemonize)
            .verbose(opts.verbose)
    }
}

impl<Payload> Daemon<Payload> {
    // --- Public getters ---

    /// Returns the daemon name (doubles as the syslog ident), if set.
    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the configured PID file path, if any.
    pub fn pid_file_path(&self) -> Option<&Path> {
        self.pid_file.as_deref()
    }

    /// Returns the configured working directory.
    pub fn working_directory_path(&self) -> &Path {
        &self.directory
    }

    // --- Builder methods ---

    /// Sets the daemon name. Used as the syslog ident and as the fallback
    /// PID file name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    /// Sets the path to the PID file, which is also the single-instance lock.
    pub fn pid_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.pid_file = Some(path.into());
        self
    }

    /// Sets the working directory for the daemon.
    pub fn working_directory<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.directory = path.into();
        self
    }

    /// Configures the standard input stream.
    pub fn stdin<S: Into<Stdio>>(mut self, stdio: S) -> Self {
        self.stdin = stdio.into();
        self
    }

    /// Configures the standard output stream.
    pub fn stdout<S: Into<Stdio>>(mut self, stdio: S) -> Self {
        self.stdout = stdio.into();
        self
    }

    /// Configures the standard error stream.
    pub fn stderr<S: Into<Stdio>>(mut self, stdio: S) -> Self {
        self.stderr = stdio.into();
        self
    }

    /// Sets the umask applied after detaching.
    pub fn umask(mut self, mask: u32) -> Self {
        self.umask = Some(mask);
        self
    }

    /// If `true`, skips forking and stream redirection and runs the payload
    /// in the calling process. Syslog, umask and the working directory are
    /// still applied.
    pub fn foreground(mut self, foreground: bool) -> Self {
        self.foreground = foreground;
        self
    }

    /// Enables debug-level syslog output.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validates the configuration without starting the daemon.
    /// Checks that the PID file's directory exists.
    pub fn build(self) -> DaemonResult<Self> {
        if let Some(pid) = &self.pid_file {
            if pid.parent().map(|p| !p.exists()).unwrap_or(false) {
                return Err(DaemonError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    "PID file directory does not exist",
                )));
            }
        }
        Ok(self)
    }

    /// Sets the daemon's main function. If it returns `Err`, `start`
    /// surfaces that error from the daemonized process.
    ///
    /// This consumes the builder and returns one with the payload type `N`.
    pub fn payload<N, F>(self, payload: F) -> Daemon<N>
    where
        F: FnOnce() -> DaemonResult<N> + 'static,
    {
        Daemon {
            name: self.name,
            directory: self.directory,
            pid_file: self.pid_file,
            stdin: self.stdin,
            stdout: self.stdout,
            stderr: self.stderr,
            umask: self.umask,
            foreground: self.foreground,
            verbose: self.verbose,
            payload: Some(Box::new(payload)),
        }
    }

    /// Starts the daemonization process.
    pub fn start(self) -> DaemonResult<Payload> {
        crate::sys::unix::start(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let d = Daemon::new();
        assert_eq!(d.working_directory_path(), Path::new("/"));
        assert!(d.get_name().is_none());
        assert!(d.pid_file_path().is_none());
        assert!(!d.foreground);
        assert_eq!(d.umask, Some(0));
    }

    #[test]
    fn test_from_options() {
        let mut opts = Options::new("acmed");
        opts.daemonize = true;
        opts.verbose = true;
        let d = Daemon::from_options(&opts);
        assert_eq!(d.get_name(), Some("acmed"));
        assert!(!d.foreground);
        assert!(d.verbose);

        opts.daemonize = false;
        assert!(Daemon::from_options(&opts).foreground);
    }

    #[test]
    fn test_build_rejects_missing_pid_dir() {
        let d = Daemon::new().pid_file("/definitely/not/a/real/dir/x.pid");
        assert!(d.build().is_err());
    }

    #[test]
    fn test_build_accepts_existing_pid_dir() {
        let d = Daemon::new().pid_file(std::env::temp_dir().join("daemon_kit_test.pid"));
        assert!(d.build().is_ok());
    }
}
