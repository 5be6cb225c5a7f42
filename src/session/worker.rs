use crate::foundation::error::{ScenepixError, ScenepixResult};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

/// Result slot of a background unit of work.
///
/// The worker sends at most once over a one-slot channel. A worker that dies before sending
/// (for instance by panicking) drops its sender, which resolves the handle as a failure, so
/// every handle resolves exactly once.
#[derive(Debug)]
pub struct TaskHandle<T> {
    name: String,
    rx: Receiver<ScenepixResult<T>>,
    started: Instant,
}

/// Run `f` on a named thread.
pub fn spawn_task<T, F>(name: impl Into<String>, f: F) -> ScenepixResult<TaskHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> ScenepixResult<T> + Send + 'static,
{
    // Thread names may not contain NUL; asset paths can.
    let name = name.into().replace('\0', "?");
    let (tx, rx) = mpsc::sync_channel::<ScenepixResult<T>>(1);
    std::thread::Builder::new()
        .name(name.clone())
        .spawn(move || {
            // The receiver may already be gone after a timeout.
            let _ = tx.send(f());
        })
        .map_err(|e| ScenepixError::render(format!("failed to spawn worker '{name}': {e}")))?;
    Ok(TaskHandle {
        name,
        rx,
        started: Instant::now(),
    })
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Time since the worker was spawned.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Block until the worker resolves.
    pub fn wait(self) -> ScenepixResult<T> {
        self.rx.recv().unwrap_or_else(|_| Err(self.exited()))
    }

    /// Block until the worker resolves or `timeout` has elapsed since it was spawned. `None`
    /// waits indefinitely.
    ///
    /// On timeout the worker is left running detached and its eventual result is discarded.
    pub fn wait_timeout(self, timeout: Option<Duration>) -> ScenepixResult<T> {
        let Some(timeout) = timeout else {
            return self.wait();
        };
        match self.rx.recv_timeout(timeout.saturating_sub(self.elapsed())) {
            Ok(res) => res,
            Err(RecvTimeoutError::Timeout) => Err(self.timed_out(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(self.exited()),
        }
    }

    /// The worker's result if it has already resolved. Never blocks.
    pub fn try_wait(&self) -> Option<ScenepixResult<T>> {
        match self.rx.try_recv() {
            Ok(res) => Some(res),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(self.exited())),
        }
    }

    /// Resolve the handle if possible. With `block` set this is [`TaskHandle::wait_timeout`];
    /// otherwise a handle that is still running and within `timeout` is handed back.
    pub fn poll(self, timeout: Option<Duration>, block: bool) -> Result<ScenepixResult<T>, Self> {
        if block {
            return Ok(self.wait_timeout(timeout));
        }
        if let Some(res) = self.try_wait() {
            return Ok(res);
        }
        match timeout {
            Some(t) if self.elapsed() >= t => Ok(Err(self.timed_out(t))),
            _ => Err(self),
        }
    }

    fn exited(&self) -> ScenepixError {
        ScenepixError::render(format!("worker '{}' exited without a result", self.name))
    }

    fn timed_out(&self, timeout: Duration) -> ScenepixError {
        ScenepixError::render(format!(
            "worker '{}' timed out after {:.3}s",
            self.name,
            timeout.as_secs_f64()
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/worker.rs"]
mod tests;
