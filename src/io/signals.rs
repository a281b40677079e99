//! Signal handling for the autotemp daemon.
//!
//! A dedicated thread turns Unix signals into [`SignalMessage`]s on a channel
//! the main loop blocks on:
//!
//! - SIGINT, SIGTERM, SIGHUP: graceful shutdown
//! - SIGUSR1: toggle automatic mode (`kill -USR1 $(cat $XDG_RUNTIME_DIR/autotemp.lock)`)

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1},
    iterator::{Handle, Signals},
};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Message sent from the signal thread to the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalMessage {
    /// SIGINT, SIGTERM or SIGHUP
    Shutdown,
    /// SIGUSR1
    ToggleAuto,
}

/// Receiving end of the signal thread.
pub struct SignalState {
    pub signal_receiver: Receiver<SignalMessage>,
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalState {
    /// Unregister the handlers and wait for the signal thread to finish.
    pub fn close(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SignalState {
    fn drop(&mut self) {
        self.close();
    }
}

/// Map a raw signal number to the message it triggers.
pub fn message_for_signal(sig: i32) -> Option<SignalMessage> {
    match sig {
        SIGINT | SIGTERM | SIGHUP => Some(SignalMessage::Shutdown),
        SIGUSR1 => Some(SignalMessage::ToggleAuto),
        _ => None,
    }
}

/// Register the handlers and spawn the thread that forwards them.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let (signal_sender, signal_receiver) = mpsc::channel::<SignalMessage>();

    let signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1])
        .context("failed to register signal handlers")?;
    let handle = signals.handle();

    let thread = thread::Builder::new()
        .name("autotemp-signals".into())
        .spawn(move || forward_signals(signals, signal_sender, debug_enabled))
        .context("failed to spawn signal thread")?;

    Ok(SignalState {
        signal_receiver,
        handle,
        thread: Some(thread),
    })
}

fn forward_signals(mut signals: Signals, sender: Sender<SignalMessage>, debug_enabled: bool) {
    for sig in signals.forever() {
        let Some(message) = message_for_signal(sig) else {
            continue;
        };

        match message {
            SignalMessage::Shutdown => {
                log_pipe!();
                let user_message = match sig {
                    SIGINT if debug_enabled => "Received SIGINT (Ctrl+C), shutting down...",
                    SIGINT => "Received interrupt signal, shutting down...",
                    SIGTERM => "Received termination request, shutting down...",
                    _ => "Terminal closed, shutting down...",
                };
                log_info!("{}", user_message);
            }
            SignalMessage::ToggleAuto => {
                log_pipe!();
                log_info!("Received mode toggle signal");
            }
        }

        if sender.send(message).is_err() {
            // Main loop is gone
            break;
        }
    }
}
