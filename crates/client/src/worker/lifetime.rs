//! Event lifetimes.
//!
//! A handler may answer its caller before all of its work is finished. Work
//! that must still run to completion is pushed into the event's [`Lifetime`];
//! the host awaits [`Lifetime::settled`] before it considers the event done.

use tokio::task::JoinHandle;

/// Background work an event must outlive.
#[derive(Debug, Default)]
pub struct Lifetime {
    tasks: Vec<JoinHandle<()>>,
}

impl Lifetime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the event until `task` finishes.
    pub fn wait_until(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    /// Number of tasks still attached.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every attached task.
    ///
    /// Task failures are logged; they never fail the event.
    pub async fn settled(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "event task did not complete");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_settled_waits_for_tasks() {
        let done = Arc::new(AtomicUsize::new(0));
        let mut lifetime = Lifetime::new();

        for _ in 0..3 {
            let done = done.clone();
            lifetime.wait_until(tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                done.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(lifetime.pending(), 3);
        lifetime.settled().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_settled_survives_panicking_task() {
        let mut lifetime = Lifetime::new();
        lifetime.wait_until(tokio::spawn(async { panic!("boom") }));
        lifetime.settled().await;
    }

    #[tokio::test]
    async fn test_empty_lifetime() {
        let lifetime = Lifetime::new();
        assert!(lifetime.is_empty());
        lifetime.settled().await;
    }
}
