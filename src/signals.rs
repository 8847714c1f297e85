use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use signal_hook::consts::signal::{SIGINT, SIGQUIT, SIGTERM};
use signal_hook::flag;

/// Registers a shutdown flag for the usual termination signals.
///
/// The returned flag flips to `true` on SIGTERM (service manager stop),
/// SIGINT (Ctrl+C in the foreground) or SIGQUIT, so a daemon's main loop can
/// poll it and exit cleanly:
///
/// ```no_run
/// use std::sync::atomic::Ordering;
///
/// let term = daemon_kit::shutdown_flag()?;
/// while !term.load(Ordering::Relaxed) {
///     // do one unit of work, then sleep a little
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn shutdown_flag() -> io::Result<Arc<AtomicBool>> {
    let term = Arc::new(AtomicBool::new(false));
    for sig in [SIGTERM, SIGINT, SIGQUIT] {
        flag::register(sig, Arc::clone(&term))?;
    }
    Ok(term)
}
