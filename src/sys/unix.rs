use std::env;
use std::ffi::CString;
use std::io;
use std::path::Path;
use std::process::exit;

use log::{debug, LevelFilter};
use syslog::Facility;

use crate::daemon::Daemon;
use crate::error::{DaemonError, DaemonResult};
use crate::stdio::Stdio;

#[cfg(target_os = "linux")]
use sd_notify::NotifyState;

/// Entry point for Unix systems.
///
/// Picks one of three modes:
/// - **Systemd** (`NOTIFY_SOCKET` set): stay in the foreground, notify
///   `READY=1`, run the payload.
/// - **Foreground** (`foreground(true)`): no fork, no stream redirection,
///   but umask, working directory and syslog are applied as usual.
/// - **Background**: the classic double-fork into a new session.
pub fn start<T>(daemon: Daemon<T>) -> DaemonResult<T> {
    #[cfg(target_os = "linux")]
    {
        // If NOTIFY_SOCKET is present, systemd expects us to stay put.
        if env::var("NOTIFY_SOCKET").is_ok() {
            return start_systemd_mode(daemon);
        }
    }

    if daemon.foreground {
        return run_daemon(daemon);
    }
    start_background_mode(daemon)
}

#[cfg(target_os = "linux")]
fn start_systemd_mode<T>(daemon: Daemon<T>) -> DaemonResult<T> {
    apply_io_redirection(&daemon)?;

    // 'true' unsets the env var so it doesn't leak to children.
    let _ = sd_notify::notify(true, &[NotifyState::Ready]);

    run_daemon(daemon)
}

/// Double-fork to detach from the terminal and run in the background.
fn start_background_mode<T>(daemon: Daemon<T>) -> DaemonResult<T> {
    // Fork 1
    if perform_fork()? > 0 {
        exit(0);
    }

    // New session
    let sid = unsafe { libc::setsid() };
    if sid < 0 {
        return Err(syscall_error("setsid"));
    }

    apply_io_redirection(&daemon)?;

    // Fork 2
    if perform_fork()? > 0 {
        exit(0);
    }

    // The grandchild is the daemon.
    run_daemon(daemon)
}

/// Setup and payload execution common to all three modes: umask, working
/// directory, syslog, PID file, then the payload itself.
fn run_daemon<T>(mut daemon: Daemon<T>) -> DaemonResult<T> {
    if let Some(mask) = daemon.umask {
        unsafe {
            libc::umask(mask as libc::mode_t);
        }
    }

    env::set_current_dir(&daemon.directory)?;

    init_syslog(&daemon)?;
    debug!("working directory is now {}", daemon.directory.display());

    let ident = daemon.name.take();
    let lock_path = if let Some(path) = &daemon.pid_file {
        Some(path.clone())
    } else if let Some(name) = &ident {
        Some(env::temp_dir().join(format!("{}.pid", name)))
    } else {
        None
    };
    if let Some(path) = lock_path {
        write_pid_file(&path)?;
        debug!("wrote PID file {}", path.display());
    }

    let foreground = daemon.foreground;
    let payload = daemon.payload.take().ok_or_else(|| {
        DaemonError::Io(io::Error::new(io::ErrorKind::InvalidInput, "no payload set"))
    })?;
    let result = payload()?;

    debug!(
        "payload finished, exiting {} process",
        if foreground { "foreground" } else { "background" }
    );
    Ok(result)
}

// =========================================================================
// Helpers
// =========================================================================

/// Wires the `log` facade to the local syslog daemon, the moral equivalent
/// of `openlog(ident, LOG_PID, LOG_DAEMON)`. Verbose mode lets debug-level
/// records through.
fn init_syslog<T>(daemon: &Daemon<T>) -> DaemonResult<()> {
    let level = if daemon.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    syslog::init(Facility::LOG_DAEMON, level, daemon.name.as_deref())
        .map_err(|e| DaemonError::Logger(e.to_string()))
}

fn syscall_error(call: &'static str) -> DaemonError {
    DaemonError::Syscall {
        call,
        errno: io::Error::last_os_error().raw_os_error().unwrap_or(0),
    }
}

fn perform_fork() -> DaemonResult<libc::pid_t> {
    let pid = unsafe { libc::fork() };
    if pid < 0 {
        Err(syscall_error("fork"))
    } else {
        Ok(pid)
    }
}

fn apply_io_redirection<T>(daemon: &Daemon<T>) -> DaemonResult<()> {
    redirect_stream(&daemon.stdin, libc::STDIN_FILENO)?;
    redirect_stream(&daemon.stdout, libc::STDOUT_FILENO)?;
    redirect_stream(&daemon.stderr, libc::STDERR_FILENO)?;
    Ok(())
}

fn redirect_stream(stdio: &Stdio, target_fd: libc::c_int) -> DaemonResult<()> {
    use std::os::unix::io::AsRawFd;

    match stdio {
        Stdio::File(f) => {
            if unsafe { libc::dup2(f.as_raw_fd(), target_fd) } < 0 {
                return Err(DaemonError::Io(io::Error::last_os_error()));
            }
        }
        Stdio::Null => {
            let path = CString::new("/dev/null").expect("static path");
            let fd = unsafe { libc::open(path.as_ptr(), libc::O_RDWR) };
            if fd < 0 {
                return Err(DaemonError::Io(io::Error::last_os_error()));
            }
            if unsafe { libc::dup2(fd, target_fd) } < 0 {
                unsafe { libc::close(fd) };
                return Err(DaemonError::Io(io::Error::last_os_error()));
            }
            unsafe { libc::close(fd) };
        }
        Stdio::Inherit => {}
    }
    Ok(())
}

/// Writes the PID file and takes an exclusive flock on it. The lock (and
/// the deliberately leaked file handle backing it) doubles as the
/// single-instance guard for the lifetime of the process.
fn write_pid_file(path: &Path) -> DaemonResult<()> {
    use std::io::Write;
    use std::os::unix::io::AsRawFd;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    // LOCK_NB so we fail instead of blocking on a running instance.
    if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } < 0 {
        return Err(DaemonError::AlreadyRunning);
    }

    let pid = unsafe { libc::getpid() };
    write!(file, "{}", pid)?;

    // Keep the handle (and therefore the lock) alive until the process dies.
    std::mem::forget(file);

    Ok(())
}
