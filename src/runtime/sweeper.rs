/*!
Background sweeper.

Runs a tick on a dedicated thread every `interval` until it is stopped,
dropped, or the tick reports that there is nothing left to sweep. Expiry is
also enforced lazily on every access, so a missed or late sweep only delays
reclaiming memory.
*/

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

use crate::core::error::{Error, Result};

/// Handle to a running sweeper thread; stops the thread when dropped
#[derive(Debug)]
pub struct SweeperHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Start calling `tick` every `interval`. The thread exits once `tick`
    /// returns `false`.
    pub fn spawn<F>(interval: Duration, mut tick: F) -> Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        if interval.is_zero() {
            return Err(Error::InvalidConfig("sweep interval must be non-zero".into()));
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("signal-runtime-sweeper".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if !tick() {
                            debug!(target: "signal_runtime::sweep", "runtime dropped, sweeper exiting");
                            break;
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| Error::Internal(format!("failed to spawn sweeper: {}", e)))?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Whether the thread is still running
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the thread and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // the receiver is gone if the thread already exited
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(target: "signal_runtime::sweep", "sweeper thread panicked");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
