use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, error};

use super::{ReadySignal, SourceReady};

/// Cancellation observed by a worker. Cancellation is signalled by dropping
/// the paired sender, which also wakes a worker sleeping in [`wait`](Self::wait).
pub struct CancelToken {
    rx: mpsc::Receiver<()>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        !matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
    }

    /// Sleep for up to `timeout`. Returns `true` as soon as cancellation is
    /// requested.
    pub fn wait(&self, timeout: Duration) -> bool {
        !matches!(self.rx.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
    }
}

/// Single-shot readiness notification sent from the worker.
pub struct ReadyNotifier {
    tx: mpsc::Sender<SourceReady>,
}

impl ReadyNotifier {
    /// Consumes the notifier, so readiness is reported at most once per run.
    pub fn notify(self, ready: SourceReady) {
        // The receiver may already be gone if nobody waits for readiness.
        let _ = self.tx.send(ready);
    }
}

/// Lifecycle of one dedicated worker thread: Idle <-> Running.
///
/// Dropping the worker stops it.
#[derive(Default)]
pub struct SourceWorker {
    running: AtomicBool,
    cancel: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl SourceWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawn `body` on a new thread. Returns `None` without spawning if the
    /// worker is already running.
    pub fn start<F>(&mut self, name: &str, body: F) -> Option<ReadySignal>
    where
        F: FnOnce(CancelToken, ReadyNotifier) + Send + 'static,
    {
        if self.is_running() {
            return None;
        }

        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<SourceReady>();
        let token = CancelToken { rx: cancel_rx };
        let notifier = ReadyNotifier { tx: ready_tx };

        let spawned = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(token, notifier));

        match spawned {
            Ok(handle) => {
                debug!(worker = name, "Worker started");
                self.cancel = Some(cancel_tx);
                self.handle = Some(handle);
                self.running.store(true, Ordering::Release);
                Some(ReadySignal::new(ready_rx))
            }
            Err(e) => {
                error!(worker = name, error = %e, "Failed to spawn worker thread");
                None
            }
        }
    }

    /// Signal cancellation and block until the worker thread has exited.
    /// Calling this on an idle worker does nothing.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }

        drop(self.cancel.take());
        if let Some(handle) = self.handle.take() {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "Worker thread panicked");
            } else {
                debug!(worker = %name, "Worker stopped");
            }
        }
        self.running.store(false, Ordering::Release);
    }
}

impl Drop for SourceWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
