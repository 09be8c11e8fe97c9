use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    records::{PackageQuery, PackageView, Resident, StorageLocation},
    runtime::handle::RuntimeError,
    types::{ResidentId, Table},
};

use super::traits::RecordStore;

/// One cached collection plus the sequence number of the fetch it came from.
#[derive(Debug)]
struct Collection<T> {
    tx: watch::Sender<Arc<Vec<T>>>,
    applied: AtomicU64,
}

impl<T> Collection<T> {
    fn new() -> Self {
        Self {
            tx: watch::Sender::new(Arc::new(Vec::new())),
            applied: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> Arc<Vec<T>> {
        self.tx.borrow().clone()
    }

    /// Swaps in `rows` unless a later-issued fetch already landed.
    /// Returns the installed row count.
    fn install(&self, seq: u64, rows: Vec<T>) -> Option<usize> {
        let len = rows.len();
        // Runs under the channel's write lock, so check and swap are one step.
        let installed = self.tx.send_if_modified(|current| {
            if seq <= self.applied.load(Ordering::Relaxed) {
                return false;
            }
            self.applied.store(seq, Ordering::Relaxed);
            *current = Arc::new(rows);
            true
        });
        installed.then_some(len)
    }
}

/// Last-fetched snapshots of the three tables.
///
/// Each collection sits behind a `watch` channel holding an `Arc<Vec<_>>`,
/// so a refresh swaps the whole collection in one step and readers only
/// ever see a complete snapshot. Every refresh takes a sequence number
/// before it reads the store; a result older than the one already cached
/// is dropped, so the most recently issued read wins.
#[derive(Debug)]
pub struct ViewCache<S> {
    store: S,
    next_seq: AtomicU64,
    residents: Collection<Resident>,
    storage_locations: Collection<StorageLocation>,
    packages: Collection<PackageView>,
}

impl<S: RecordStore> ViewCache<S> {
    /// Empty cache over `store`. Nothing is fetched until a refresh.
    pub fn new(store: S) -> Self {
        Self {
            store,
            next_seq: AtomicU64::new(0),
            residents: Collection::new(),
            storage_locations: Collection::new(),
            packages: Collection::new(),
        }
    }

    /// The store this cache reads from.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replaces the `table` collection with a fresh read.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self, table: Table) -> Result<(), RuntimeError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let res = match table {
            Table::Residents => self
                .store
                .residents()
                .await
                .map(|rows| self.residents.install(seq, rows)),
            Table::StorageLocations => self
                .store
                .storage_locations()
                .await
                .map(|rows| self.storage_locations.install(seq, rows)),
            Table::Packages => self
                .store
                .packages(PackageQuery::default())
                .await
                .map(|rows| self.packages.install(seq, rows)),
        };

        match res {
            Ok(Some(rows)) => {
                debug!(%table, rows, "cache refreshed");
                Ok(())
            }
            Ok(None) => {
                debug!(%table, seq, "stale refresh discarded");
                Ok(())
            }
            Err(err) => {
                warn!(%table, error = %err, "cache refresh failed");
                Err(err)
            }
        }
    }

    /// Refreshes every collection, stopping at the first failure.
    pub async fn refresh_all(&self) -> Result<(), RuntimeError> {
        for table in Table::ALL {
            self.refresh(table).await?;
        }
        Ok(())
    }

    /// Current residents snapshot.
    pub fn residents(&self) -> Arc<Vec<Resident>> {
        self.residents.snapshot()
    }

    /// Current storage locations snapshot.
    pub fn storage_locations(&self) -> Arc<Vec<StorageLocation>> {
        self.storage_locations.snapshot()
    }

    /// Current packages snapshot, newest check-in first.
    pub fn packages(&self) -> Arc<Vec<PackageView>> {
        self.packages.snapshot()
    }

    /// Cached resident by id.
    pub fn resident(&self, id: ResidentId) -> Option<Resident> {
        self.residents.tx.borrow().iter().find(|r| r.id == id).cloned()
    }

    /// Receiver notified whenever the packages collection is replaced.
    pub fn watch_packages(&self) -> watch::Receiver<Arc<Vec<PackageView>>> {
        self.packages.tx.subscribe()
    }
}
