//! Deferred actions (cooldown release, delayed message deletion).
//!
//! Every scheduled action runs in its own tokio task after its delay. Actions
//! cannot be cancelled individually; `shutdown` aborts whatever is still
//! pending when the bot stops.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info};

pub struct Scheduler {
    tasks: Mutex<JoinSet<()>>,
    stopped: AtomicBool,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(JoinSet::new()),
            stopped: AtomicBool::new(false),
        }
    }

    /// Run `action` once `delay` has elapsed
    pub fn schedule<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.stopped.load(Ordering::Acquire) {
            debug!("Scheduler stopped, dropping action delayed by {:?}", delay);
            return;
        }

        let mut tasks = self.tasks.lock();
        // Reap finished tasks so the set does not grow with uptime
        while tasks.try_join_next().is_some() {}

        tasks.spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
    }

    /// Number of actions still waiting to fire
    pub fn pending(&self) -> usize {
        let mut tasks = self.tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    /// Abort every pending action and refuse new ones
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
        let mut tasks = self.tasks.lock();
        let pending = tasks.len();
        tasks.abort_all();
        info!("Scheduler stopped ({} pending actions aborted)", pending);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared scheduler type
pub type SharedScheduler = Arc<Scheduler>;

pub fn create_shared_scheduler() -> SharedScheduler {
    Arc::new(Scheduler::new())
}
