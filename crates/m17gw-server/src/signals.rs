//! Cooperative signal handling.
//!
//! `spec.md` §9 describes "process-wide termination intent set from an
//! interrupt context, polled cooperatively" plus a hot-restart on `SIGHUP`.
//! `signal_hook::iterator::Signals` gives us exactly that: registration
//! happens once, and `pending()` drains whatever arrived without blocking,
//! so the event loop can poll it once per iteration alongside its sockets.

use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

/// What the most recent signal poll asked the driver to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalIntent {
    /// No signal pending.
    None,
    /// Clean shutdown requested (`SIGINT`/`SIGTERM`).
    Terminate {
        /// The raw signal number, for the exit-reason log line.
        signum: i32,
    },
    /// Hot-restart requested (`SIGHUP`): the caller should tear down and
    /// recreate the gateway, then keep running.
    Restart,
}

/// Thin wrapper around a registered [`Signals`] iterator.
pub struct SignalWatcher {
    signals: Signals,
}

impl SignalWatcher {
    /// Register handlers for `SIGINT`, `SIGTERM`, and `SIGHUP`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if registration fails (e.g. the
    /// platform doesn't support one of these signals).
    pub fn install() -> std::io::Result<Self> {
        let signals = Signals::new([SIGINT, SIGTERM, SIGHUP])?;
        Ok(Self { signals })
    }

    /// Drain any signals that arrived since the last poll. Returns the
    /// highest-priority intent found this call: a terminate request wins
    /// over a pending restart, matching the upstream `sigHandler`'s
    /// last-write-wins `m_signal` with termination signals checked first in
    /// `main()`'s `switch`.
    pub fn poll(&mut self) -> SignalIntent {
        let mut intent = SignalIntent::None;
        for signum in self.signals.pending() {
            match signum {
                SIGHUP => {
                    if intent == SignalIntent::None {
                        intent = SignalIntent::Restart;
                    }
                }
                SIGINT | SIGTERM => intent = SignalIntent::Terminate { signum },
                _ => {}
            }
        }
        intent
    }
}
