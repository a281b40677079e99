//! Main application entry point and high-level flow coordination.
//!
//! Argument parsing decides between a one-shot command and the daemon. The
//! daemon flow is:
//!
//! 1. File logging (optional) and the single-instance lock
//! 2. Configuration loading and signal registration
//! 3. Engine and mode controller construction, then restoring the saved mode
//! 4. Blocking on signals: SIGUSR1 toggles automatic mode, anything else stops
//! 5. Graceful cleanup: scheduler joined, pending output flushed, lock released

#[macro_use]
extern crate autotemp;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use autotemp::args::{CliAction, ParsedArgs, display_help, display_version_info};
use autotemp::backend::{CoalescingSink, DryRunBackend, TerminalDisplay};
use autotemp::commands;
use autotemp::common::constants::{EXIT_FAILURE, EXIT_SUCCESS};
use autotemp::config::{self, ConfigStore};
use autotemp::core::mode::ModeController;
use autotemp::core::{Engine, EngineParams};
use autotemp::geo::NetworkSolarSource;
use autotemp::io::lock::{LockAttempt, acquire_lock, default_lock_path};
use autotemp::io::signals::{SignalMessage, setup_signal_handler};
use autotemp::logger::Log;
use autotemp::time_source::RealTimeSource;

fn main() {
    let parsed = ParsedArgs::from_env();

    let code = match parsed.action {
        CliAction::ShowVersion => {
            display_version_info();
            EXIT_SUCCESS
        }
        CliAction::ShowHelp => {
            display_help();
            EXIT_SUCCESS
        }
        CliAction::ShowHelpDueToError => {
            display_help();
            EXIT_FAILURE
        }
        CliAction::Now {
            debug_enabled,
            config_dir,
        } => {
            Log::set_debug(debug_enabled);
            report(
                config::set_config_dir(config_dir)
                    .and_then(|()| commands::now::handle_now_command())
                    .map(|()| EXIT_SUCCESS),
            )
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_file,
        } => run_with_logging(debug_enabled, config_dir, log_file),
    };

    std::process::exit(code);
}

/// Set up file logging, then run the daemon while the log guard is alive.
fn run_with_logging(
    debug_enabled: bool,
    config_dir: Option<String>,
    log_file: Option<String>,
) -> i32 {
    let _log_guard = match log_file.map(Log::start_file_logging).transpose() {
        Ok(guard) => guard,
        Err(e) => {
            log_error_exit!("{e:#}");
            return EXIT_FAILURE;
        }
    };

    Log::set_debug(debug_enabled);
    log_version!();
    if debug_enabled {
        log_pipe!();
        log_debug!("Debug mode enabled");
    }

    let code = report(run_daemon(debug_enabled, config_dir));
    log_end!();
    code
}

fn report(result: Result<i32>) -> i32 {
    match result {
        Ok(code) => code,
        Err(e) => {
            log_error_exit!("{e:#}");
            EXIT_FAILURE
        }
    }
}

fn run_daemon(debug_enabled: bool, config_dir: Option<String>) -> Result<i32> {
    config::set_config_dir(config_dir)?;

    let lock_path = default_lock_path();
    let _instance_lock = match acquire_lock(&lock_path)? {
        LockAttempt::Acquired(lock) => lock,
        LockAttempt::Held { pid } => {
            log_pipe!();
            match pid {
                Some(pid) => log_error!("autotemp is already running (PID: {pid})"),
                None => log_error!("autotemp is already running"),
            }
            log_block_start!("Did you mean to:");
            log_indented!("• Toggle automatic mode: kill -USR1 <PID>");
            log_indented!("• Check today's schedule: autotemp now");
            return Ok(EXIT_FAILURE);
        }
    };

    let mut signals = setup_signal_handler(debug_enabled)?;

    let store = Arc::new(ConfigStore::open()?);
    let settings = store.snapshot();
    settings.log_config();

    let sink = Arc::new(CoalescingSink::start(Box::new(DryRunBackend::new()))?);
    let engine = Engine::new(EngineParams::new(
        store.clone(),
        Arc::new(NetworkSolarSource::new()),
        sink.clone(),
        Arc::new(TerminalDisplay),
        Arc::new(RealTimeSource),
        Duration::from_secs(settings.update_interval()),
    ));

    let controller = ModeController::new(engine.clone(), store);
    controller.restore();

    loop {
        match signals.signal_receiver.recv() {
            Ok(SignalMessage::ToggleAuto) => {
                if controller.toggle_auto() {
                    log_indented!("Automatic mode enabled");
                } else {
                    log_indented!("Automatic mode disabled");
                }
            }
            Ok(SignalMessage::Shutdown) | Err(_) => break,
        }
    }

    controller.cancel_fade();
    engine.shutdown();
    sink.close();
    signals.close();

    log_block_start!("Shutdown complete");
    Ok(EXIT_SUCCESS)
}
