//! Cooperative task orchestration: `TaskManager` owns the runtime handle and
//! the shared shutdown signal; `TaskExecutor` is the cloneable handle every
//! component spawns its long-running loops through; `ShutdownSignal` is the
//! cooperative-cancellation token checked at the top of each loop iteration.
//!
//! This crate has no upstream source in the retrieval pack to adapt from —
//! only its `Cargo.toml` survived. Its shape is reconstructed from call
//! sites elsewhere in the tree: `TaskManager::new(runtime.handle().clone())`,
//! `task_manager.executor()`, `executor.spawn_critical_async(name, fut)`,
//! `executor.spawn_critical(name, |shutdown| { .. })`.

use std::sync::{Arc, Mutex};

use tokio::{runtime::Handle, sync::watch, task::JoinHandle};
use tracing::{error, warn};

/// Cooperative-cancellation token. Cloning shares the same underlying
/// signal; `is_shutdown` is a cheap non-blocking check meant to be polled at
/// the top of a loop, `wait` suspends until the signal fires.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Suspends until shutdown is signalled. Safe to call from a
    /// `tokio::select!` arm alongside other suspension points.
    pub async fn wait(&mut self) {
        if self.is_shutdown() {
            return;
        }
        let _ = self.rx.changed().await;
    }
}

struct TaskEntry {
    name: String,
    handle: JoinHandle<()>,
}

struct Inner {
    handle: Handle,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<TaskEntry>>,
}

/// Owns the tokio runtime handle and the shutdown signal for a process.
/// Constructed once in `main`; every component that needs to spawn a
/// long-running loop gets a [`TaskExecutor`] via [`TaskManager::executor`].
pub struct TaskManager {
    inner: Arc<Inner>,
}

impl TaskManager {
    pub fn new(handle: Handle) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                handle,
                shutdown_tx,
                shutdown_rx,
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn executor(&self) -> TaskExecutor {
        TaskExecutor {
            inner: self.inner.clone(),
        }
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.inner.shutdown_rx.clone(),
        }
    }

    /// Signals cooperative shutdown to every task spawned through any
    /// [`TaskExecutor`] derived from this manager. Idempotent.
    pub fn initiate_shutdown(&self) {
        let _ = self.inner.shutdown_tx.send(true);
    }

    /// Blocks until every spawned task has returned. Call after
    /// [`initiate_shutdown`](Self::initiate_shutdown).
    pub async fn wait_for_shutdown(&self) {
        let entries = std::mem::take(&mut *self.inner.tasks.lock().unwrap());
        for entry in entries {
            if let Err(err) = entry.handle.await {
                error!(task = %entry.name, %err, "task panicked");
            }
        }
    }
}

/// Cloneable spawn handle. Every critical task spawned through this struct
/// is tracked so [`TaskManager::wait_for_shutdown`] can join on it.
#[derive(Clone)]
pub struct TaskExecutor {
    inner: Arc<Inner>,
}

impl TaskExecutor {
    pub fn handle(&self) -> Handle {
        self.inner.handle.clone()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.inner.shutdown_rx.clone(),
        }
    }

    /// Spawns an async task that's expected to run until shutdown. If the
    /// future returns an error or panics, it's logged but does not bring
    /// down the process — there's no restart here, so a critical task's own
    /// loop must treat transient failures as retry-in-place, not as a
    /// reason to return `Err`, or it simply stops running.
    pub fn spawn_critical_async<F>(&self, name: &str, fut: F)
    where
        F: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.to_owned();
        let task_name = name.clone();
        let handle = self.inner.handle.spawn(async move {
            if let Err(err) = fut.await {
                error!(task = %task_name, %err, "critical task exited with error");
            }
        });
        self.inner.tasks.lock().unwrap().push(TaskEntry { name, handle });
    }

    /// Spawns a synchronous, potentially blocking task onto a blocking
    /// thread, handing it a [`ShutdownSignal`] to poll.
    pub fn spawn_critical<F>(&self, name: &str, f: F)
    where
        F: FnOnce(ShutdownSignal) -> anyhow::Result<()> + Send + 'static,
    {
        let shutdown = self.shutdown_signal();
        let name = name.to_owned();
        let task_name = name.clone();
        let handle = self.inner.handle.spawn_blocking(move || {
            if let Err(err) = f(shutdown) {
                error!(task = %task_name, %err, "critical blocking task exited with error");
            }
        });
        // spawn_blocking returns JoinHandle<()> after the closure's Result
        // is consumed above, so map it down for the tracker.
        let handle = self.inner.handle.spawn(async move {
            if let Err(err) = handle.await {
                warn!(task = %name, %err, "blocking task join failed");
            }
        });
        self.inner
            .tasks
            .lock()
            .unwrap()
            .push(TaskEntry { name: task_name, handle });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    #[tokio::test]
    async fn spawned_task_observes_shutdown() {
        let manager = TaskManager::new(Handle::current());
        let executor = manager.executor();
        let observed = Arc::new(AtomicBool::new(false));
        let observed_clone = observed.clone();
        let mut shutdown = executor.shutdown_signal();

        executor.spawn_critical_async("observe-shutdown", async move {
            shutdown.wait().await;
            observed_clone.store(true, Ordering::SeqCst);
            Ok(())
        });

        manager.initiate_shutdown();
        manager.wait_for_shutdown().await;

        assert!(observed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn blocking_task_runs_to_completion() {
        let manager = TaskManager::new(Handle::current());
        let executor = manager.executor();
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();

        executor.spawn_critical("blocking-task", move |_shutdown| {
            ran_clone.store(true, Ordering::SeqCst);
            Ok(())
        });

        manager.wait_for_shutdown().await;
        assert!(ran.load(Ordering::SeqCst));
    }
}
