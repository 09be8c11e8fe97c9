//! Change feed payloads and subscriptions.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::warn;

use crate::types::Table;

/// Row change published by the record store after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A row was inserted.
    Inserted {
        /// Table written.
        table: Table,
        /// New row id.
        id: u64,
    },
    /// A row was updated.
    Updated {
        /// Table written.
        table: Table,
        /// Updated row id.
        id: u64,
    },
    /// A row was deleted.
    Deleted {
        /// Table written.
        table: Table,
        /// Deleted row id.
        id: u64,
    },
    /// The subscriber fell behind and `skipped` events were dropped.
    Lagged {
        /// Table subscribed to.
        table: Table,
        /// Number of events lost.
        skipped: u64,
    },
}

impl ChangeEvent {
    /// Table this event concerns.
    pub fn table(&self) -> Table {
        match *self {
            ChangeEvent::Inserted { table, .. }
            | ChangeEvent::Updated { table, .. }
            | ChangeEvent::Deleted { table, .. }
            | ChangeEvent::Lagged { table, .. } => table,
        }
    }
}

/// Which kinds of row change a subscription wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMask {
    /// Deliver inserts.
    pub insert: bool,
    /// Deliver updates.
    pub update: bool,
    /// Deliver deletes.
    pub delete: bool,
}

impl EventMask {
    /// Every kind of change.
    pub const ALL: EventMask = EventMask {
        insert: true,
        update: true,
        delete: true,
    };

    /// True when `event` passes this mask. Lag markers always pass.
    pub fn accepts(&self, event: &ChangeEvent) -> bool {
        match event {
            ChangeEvent::Inserted { .. } => self.insert,
            ChangeEvent::Updated { .. } => self.update,
            ChangeEvent::Deleted { .. } => self.delete,
            ChangeEvent::Lagged { .. } => true,
        }
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Live feed of changes on one table.
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// releases it. The feed closes when the record store stops.
#[derive(Debug)]
pub struct Subscription {
    table: Table,
    mask: EventMask,
    rx: broadcast::Receiver<ChangeEvent>,
    closed: watch::Receiver<bool>,
}

impl Subscription {
    pub(crate) fn new(
        table: Table,
        mask: EventMask,
        rx: broadcast::Receiver<ChangeEvent>,
        closed: watch::Receiver<bool>,
    ) -> Self {
        Self {
            table,
            mask,
            rx,
            closed,
        }
    }

    /// Waits for the next matching event. Returns `None` once the feed is closed.
    ///
    /// Events published before the store stopped are still delivered first.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            let next = tokio::select! {
                biased;
                next = self.rx.recv() => next,
                _ = self.closed.wait_for(|closed| *closed) => return None,
            };
            match next {
                Ok(event) if self.mask.accepts(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(table = %self.table, skipped, "change subscription lagged");
                    return Some(ChangeEvent::Lagged {
                        table: self.table,
                        skipped,
                    });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Releases the subscription.
    pub fn unsubscribe(self) {}
}

/// Per-table broadcast senders plus the shared closed flag.
#[derive(Debug, Clone)]
pub(crate) struct ChangeFeeds {
    residents: broadcast::Sender<ChangeEvent>,
    storage_locations: broadcast::Sender<ChangeEvent>,
    packages: broadcast::Sender<ChangeEvent>,
    closed: Arc<watch::Sender<bool>>,
}

impl ChangeFeeds {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            residents: broadcast::channel(capacity).0,
            storage_locations: broadcast::channel(capacity).0,
            packages: broadcast::channel(capacity).0,
            closed: Arc::new(watch::Sender::new(false)),
        }
    }

    fn sender(&self, table: Table) -> &broadcast::Sender<ChangeEvent> {
        match table {
            Table::Residents => &self.residents,
            Table::StorageLocations => &self.storage_locations,
            Table::Packages => &self.packages,
        }
    }

    pub(crate) fn publish(&self, event: ChangeEvent) {
        // No receivers is fine.
        let _ = self.sender(event.table()).send(event);
    }

    pub(crate) fn subscribe(&self, table: Table, mask: EventMask) -> Subscription {
        Subscription::new(
            table,
            mask,
            self.sender(table).subscribe(),
            self.closed.subscribe(),
        )
    }

    /// Ends every subscription, current and future.
    pub(crate) fn close(&self) {
        self.closed.send_replace(true);
    }

    pub(crate) fn subscriber_count(&self, table: Table) -> usize {
        self.sender(table).receiver_count()
    }
}
