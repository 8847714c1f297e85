//! A *nix daemon template built on daemon_kit.
//!
//! Supports forking to the background, logging to syslog, a command-line
//! option table, and a simplistic rc-style config file. Put the actual
//! daemon work inside the payload closure at the bottom of `main`.
//!
//! Run with `cargo run --example mydaemon -- --help`.

use std::path::PathBuf;
use std::process::exit;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use clap::{ArgAction, Parser};
use daemon_kit::{Daemon, Options};
use log::{debug, info};

const DAEMON_NAME: &str = "mydaemon";

#[derive(Parser, Debug)]
#[command(name = DAEMON_NAME, version, disable_version_flag = true)]
struct Cli {
    /// Show this program's version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version, value_parser = clap::value_parser!(bool))]
    version: (),

    /// Enable more verbose logging.
    #[arg(short = 'V', long)]
    verbose: bool,

    /// Fork and run in the background.
    #[arg(short, long, overrides_with = "foreground")]
    daemonize: bool,

    /// Run in the foreground (default).
    #[arg(short, long, overrides_with = "daemonize")]
    foreground: bool,

    /// Use the specified config file.
    #[arg(short, long, value_name = "path")]
    config: Option<PathBuf>,

    /// Use the specified string as the syslog ident.
    #[arg(short = 'Z', long, value_name = "ident")]
    ident: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let mut opts = Options::new(DAEMON_NAME);
    opts.verbose = cli.verbose;
    if cli.daemonize {
        opts.daemonize = true;
    }
    if cli.foreground {
        opts.daemonize = false;
    }
    if let Some(ident) = cli.ident.as_deref() {
        if let Err(err) = opts.set_syslog_ident(ident) {
            eprintln!("{}: {}", DAEMON_NAME, err);
            exit(1);
        }
    }
    opts.config_file = cli.config;

    // Settings from the config file override command-line flags: the file
    // is read after the flags, and the last assignment wins.
    if let Some(path) = opts.config_file.clone() {
        if let Err(err) = opts.load_file(&path) {
            eprintln!("{}: could not load config file {:?}: {}", DAEMON_NAME, path, err);
            exit(1);
        }
    }

    let result = Daemon::from_options(&opts)
        .pid_file(std::env::temp_dir().join(format!("{}.pid", DAEMON_NAME)))
        .payload(|| {
            // Termination signals flip this flag; the loop below polls it.
            let term = daemon_kit::shutdown_flag()?;

            info!("service started, PID {}", std::process::id());

            // Main daemon functionality goes here.
            let mut ticks: u64 = 0;
            while !term.load(Ordering::Relaxed) {
                debug!("tick #{}", ticks);
                ticks += 1;
                thread::sleep(Duration::from_secs(3));
            }

            info!("termination signal received, shutting down");
            Ok(())
        })
        .start();

    if let Err(err) = result {
        eprintln!("{}: {}", DAEMON_NAME, err);
        exit(1);
    }
}
