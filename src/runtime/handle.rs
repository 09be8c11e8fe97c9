use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::{debug, warn};

use crate::{
    config::StoreConfig,
    core::store::MemoryBackend,
    persist::{Backend, StoreError, StoreResult, sqlite::SqliteBackend},
    records::{
        Package, PackageDraft, PackagePatch, PackageQuery, PackageView, Resident, ResidentDraft,
        StorageLocation,
    },
    types::{PackageRecordId, PackageStatus, ResidentId, Table},
    view::traits::RecordStore,
};

use super::events::{ChangeEvent, ChangeFeeds, EventMask, Subscription};

/// Failure of a record store request.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The backend rejected or failed the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The store runtime has shut down.
    #[error("record store is not running")]
    ChannelClosed,
}

type Reply<T> = oneshot::Sender<Result<T, RuntimeError>>;
type SharedBackend = Arc<Mutex<Box<dyn Backend>>>;

/// Cloneable client for the single-writer record store runtime.
#[derive(Clone)]
pub struct RecordStoreHandle {
    cmd_tx: mpsc::Sender<Command>,
    feeds: ChangeFeeds,
}

impl std::fmt::Debug for RecordStoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStoreHandle")
            .field("closed", &self.cmd_tx.is_closed())
            .finish()
    }
}

enum Command {
    Residents {
        resp: Reply<Vec<Resident>>,
    },
    StorageLocations {
        resp: Reply<Vec<StorageLocation>>,
    },
    Packages {
        query: PackageQuery,
        resp: Reply<Vec<PackageView>>,
    },
    InsertResident {
        draft: ResidentDraft,
        resp: Reply<Resident>,
    },
    UpdateResident {
        id: ResidentId,
        draft: ResidentDraft,
        resp: Reply<Resident>,
    },
    DeleteResident {
        id: ResidentId,
        resp: Reply<()>,
    },
    InsertStorageLocation {
        location_name: String,
        resp: Reply<StorageLocation>,
    },
    InsertPackage {
        draft: PackageDraft,
        resp: Reply<Package>,
    },
    UpdatePackage {
        id: PackageRecordId,
        patch: PackagePatch,
        expect_status: Option<PackageStatus>,
        resp: Reply<Package>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Spawns the store runtime over `backend`.
///
/// Commands are handled one at a time, so every write is serialized. Each
/// successful write publishes a [`ChangeEvent`] on the table's feed.
pub fn spawn_record_store(backend: Box<dyn Backend>, config: &StoreConfig) -> RecordStoreHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let feeds = ChangeFeeds::new(config.change_feed_capacity);
    let backend: SharedBackend = Arc::new(Mutex::new(backend));

    let feeds_loop = feeds.clone();
    tokio::spawn(async move {
        debug!("record store started");
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &backend, &feeds_loop).await {
                break;
            }
        }
        feeds_loop.close();
        debug!("record store stopped");
    });

    RecordStoreHandle { cmd_tx, feeds }
}

/// Opens the backend named by `config` (SQLite when a path is set, memory otherwise) and spawns it.
pub fn open_record_store(config: &StoreConfig) -> StoreResult<RecordStoreHandle> {
    let backend: Box<dyn Backend> = match &config.database_path {
        Some(path) => Box::new(SqliteBackend::open(path)?),
        None => Box::new(MemoryBackend::new()),
    };
    Ok(spawn_record_store(backend, config))
}

impl RecordStoreHandle {
    /// Seeds a storage location. Locations are read-only to the rest of the crate.
    pub async fn insert_storage_location(
        &self,
        location_name: impl Into<String>,
    ) -> Result<StorageLocation, RuntimeError> {
        let location_name = location_name.into();
        self.request(|resp| Command::InsertStorageLocation {
            location_name,
            resp,
        })
        .await
    }

    /// Number of live subscriptions on `table`.
    pub fn subscriber_count(&self, table: Table) -> usize {
        self.feeds.subscriber_count(table)
    }

    /// Stops the runtime after in-flight commands finish.
    ///
    /// Every change subscription ends before this returns.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command + Send,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }
}

impl RecordStore for RecordStoreHandle {
    async fn residents(&self) -> Result<Vec<Resident>, RuntimeError> {
        self.request(|resp| Command::Residents { resp }).await
    }

    async fn storage_locations(&self) -> Result<Vec<StorageLocation>, RuntimeError> {
        self.request(|resp| Command::StorageLocations { resp }).await
    }

    async fn packages(&self, query: PackageQuery) -> Result<Vec<PackageView>, RuntimeError> {
        self.request(|resp| Command::Packages { query, resp }).await
    }

    async fn insert_resident(&self, draft: ResidentDraft) -> Result<Resident, RuntimeError> {
        self.request(|resp| Command::InsertResident { draft, resp }).await
    }

    async fn update_resident(
        &self,
        id: ResidentId,
        draft: ResidentDraft,
    ) -> Result<Resident, RuntimeError> {
        self.request(|resp| Command::UpdateResident { id, draft, resp })
            .await
    }

    async fn delete_resident(&self, id: ResidentId) -> Result<(), RuntimeError> {
        self.request(|resp| Command::DeleteResident { id, resp }).await
    }

    async fn insert_package(&self, draft: PackageDraft) -> Result<Package, RuntimeError> {
        self.request(|resp| Command::InsertPackage { draft, resp }).await
    }

    async fn update_package(
        &self,
        id: PackageRecordId,
        patch: PackagePatch,
        expect_status: Option<PackageStatus>,
    ) -> Result<Package, RuntimeError> {
        self.request(|resp| Command::UpdatePackage {
            id,
            patch,
            expect_status,
            resp,
        })
        .await
    }

    fn subscribe(&self, table: Table, mask: EventMask) -> Subscription {
        self.feeds.subscribe(table, mask)
    }
}

async fn handle_command(cmd: Command, backend: &SharedBackend, feeds: &ChangeFeeds) -> bool {
    match cmd {
        Command::Residents { resp } => {
            let _ = resp.send(run_blocking(backend, |b| b.residents()).await);
        }
        Command::StorageLocations { resp } => {
            let _ = resp.send(run_blocking(backend, |b| b.storage_locations()).await);
        }
        Command::Packages { query, resp } => {
            let _ = resp.send(run_blocking(backend, move |b| b.packages(&query)).await);
        }
        Command::InsertResident { draft, resp } => {
            let res = run_blocking(backend, move |b| b.insert_resident(draft)).await;
            publish_write(feeds, Table::Residents, &res, |r| ChangeEvent::Inserted {
                table: Table::Residents,
                id: r.id,
            });
            let _ = resp.send(res);
        }
        Command::UpdateResident { id, draft, resp } => {
            let res = run_blocking(backend, move |b| b.update_resident(id, draft)).await;
            publish_write(feeds, Table::Residents, &res, |r| ChangeEvent::Updated {
                table: Table::Residents,
                id: r.id,
            });
            let _ = resp.send(res);
        }
        Command::DeleteResident { id, resp } => {
            let res = run_blocking(backend, move |b| b.delete_resident(id)).await;
            publish_write(feeds, Table::Residents, &res, |_| ChangeEvent::Deleted {
                table: Table::Residents,
                id,
            });
            let _ = resp.send(res);
        }
        Command::InsertStorageLocation {
            location_name,
            resp,
        } => {
            let res = run_blocking(backend, move |b| b.insert_storage_location(location_name)).await;
            publish_write(feeds, Table::StorageLocations, &res, |l| ChangeEvent::Inserted {
                table: Table::StorageLocations,
                id: l.id,
            });
            let _ = resp.send(res);
        }
        Command::InsertPackage { draft, resp } => {
            let res = run_blocking(backend, move |b| b.insert_package(draft)).await;
            publish_write(feeds, Table::Packages, &res, |p| ChangeEvent::Inserted {
                table: Table::Packages,
                id: p.id,
            });
            let _ = resp.send(res);
        }
        Command::UpdatePackage {
            id,
            patch,
            expect_status,
            resp,
        } => {
            let res =
                run_blocking(backend, move |b| b.update_package(id, patch, expect_status)).await;
            publish_write(feeds, Table::Packages, &res, |p| ChangeEvent::Updated {
                table: Table::Packages,
                id: p.id,
            });
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => {
            feeds.close();
            let _ = resp.send(());
            return true;
        }
    }

    false
}

fn publish_write<T>(
    feeds: &ChangeFeeds,
    table: Table,
    res: &Result<T, RuntimeError>,
    event: impl FnOnce(&T) -> ChangeEvent,
) {
    match res {
        Ok(row) => feeds.publish(event(row)),
        Err(err) => warn!(%table, error = %err, "record store write rejected"),
    }
}

async fn run_blocking<T, F>(backend: &SharedBackend, f: F) -> Result<T, RuntimeError>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn Backend) -> StoreResult<T> + Send + 'static,
{
    let backend = Arc::clone(backend);
    tokio::task::spawn_blocking(move || {
        let mut guard = backend.blocking_lock();
        f(&mut **guard)
    })
    .await
    .map_err(|e| StoreError::Message(format!("join error: {e}")))?
    .map_err(RuntimeError::from)
}
