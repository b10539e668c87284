//! Request-scoped background execution.
//!
//! Handlers acknowledge a batch synchronously and hand the forwarding work
//! to this scheduler. The capability is owned by the hosting boundary: it
//! keeps spawned tasks alive after the response is sent and drains them on
//! shutdown via `close`/`wait`. There is no retry and no durable queue; a
//! task abandoned at teardown is lost.

use std::future::Future;
use tokio_util::task::TaskTracker;

/// Handle to the set of in-flight forwarding tasks.
#[derive(Clone, Debug, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tracker: TaskTracker::new(),
        }
    }

    /// Detaches forwarding work from the response path.
    ///
    /// The task starts immediately and outlives the request handler.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(future);
    }

    /// Number of tasks still in flight.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Stops accepting new tasks. Called by the hosting boundary at shutdown.
    pub fn close(&self) {
        self.tracker.close();
    }

    /// Waits for all in-flight tasks to settle. Requires `close` first.
    pub async fn wait(&self) {
        self.tracker.wait().await;
    }
}
