use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::{runtime::events::EventMask, types::Table};

use super::{cache::ViewCache, traits::RecordStore};

/// Background task that refreshes the cached packages on every package change.
///
/// The event payload is never inspected: any insert, update, delete, or lag
/// marker triggers a full re-fetch. The subscription lives exactly as long as
/// the task; [`ChangeListener::stop`] or dropping the listener releases it.
#[derive(Debug)]
pub struct ChangeListener {
    task: Option<JoinHandle<()>>,
}

impl ChangeListener {
    /// Subscribes to the packages feed and starts the refresh task.
    ///
    /// The subscription is registered before this returns, so no change made
    /// afterwards is missed.
    pub fn spawn<S: RecordStore>(cache: Arc<ViewCache<S>>) -> Self {
        let mut sub = cache.store().subscribe(Table::Packages, EventMask::ALL);
        let task = tokio::spawn(async move {
            debug!("package change listener started");
            while let Some(event) = sub.recv().await {
                trace!(?event, "package change received");
                // Failures are logged by the cache; the next event retries.
                let _ = cache.refresh(Table::Packages).await;
            }
            debug!("package change feed closed");
        });
        Self { task: Some(task) }
    }

    /// True while the task is still consuming the feed. The task ends on its
    /// own when the record store stops.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the task and waits until its subscription is released.
    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
