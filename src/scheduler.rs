use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};

use crate::error::Result;

/// A named background thread that calls `tick` once per `period` until stopped.
///
/// The thread waits on a stop channel with a timeout, so `stop` takes
/// effect immediately rather than after the current period. A tick that is
/// already running finishes before the thread exits.
pub struct PeriodicTask {
    name: String,
    stop_signal: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F>(name: &str, period: Duration, mut tick: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let task_name = name.to_string();

        let handle = thread::Builder::new().name(task_name.clone()).spawn(move || {
            debug!("Task '{}' running every {:?}", task_name, period);
            loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => tick(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            debug!("Task '{}' exited", task_name);
        })?;

        info!("Started periodic task '{}' ({:?})", name, period);
        Ok(PeriodicTask {
            name: name.to_string(),
            stop_signal: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Signal the thread and wait for it. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop_signal.take() {
            // A send error only means the thread is already gone
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Task '{}' panicked", self.name);
            } else {
                info!("Stopped periodic task '{}'", self.name);
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}
