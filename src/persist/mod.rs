//! Backend abstraction behind the record store, plus the SQLite implementation.

pub mod sqlite;

use thiserror::Error;

use crate::{
    records::{
        Package, PackageDraft, PackagePatch, PackageQuery, PackageView, Resident, ResidentDraft,
        StorageLocation,
    },
    types::{PackageRecordId, PackageStatus, ResidentId, Table},
};

/// Failure reported by a backend. The display text is the store's own reason.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite error.
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A required field or reference was rejected.
    #[error("{0}")]
    Constraint(String),
    /// No row with this id.
    #[error("no {table} row with id {id}")]
    NotFound {
        /// Table searched.
        table: Table,
        /// Missing id.
        id: u64,
    },
    /// A conditional update found the row in an unexpected state.
    #[error("{table} row {id} did not match the update condition")]
    ConditionFailed {
        /// Table updated.
        table: Table,
        /// Row id.
        id: u64,
    },
    /// Any other backend failure.
    #[error("{0}")]
    Message(String),
}

/// Backend result alias.
pub type StoreResult<T> = Result<T, StoreError>;

/// Synchronous storage for the three tables.
///
/// Calls are serialized by the record store runtime, so implementations only
/// need per-call atomicity.
pub trait Backend: Send {
    /// All residents ordered by name.
    fn residents(&self) -> StoreResult<Vec<Resident>>;
    /// All storage locations ordered by name.
    fn storage_locations(&self) -> StoreResult<Vec<StorageLocation>>;
    /// Joined packages matching `query`, newest check-in first.
    fn packages(&self, query: &PackageQuery) -> StoreResult<Vec<PackageView>>;

    /// Inserts a resident.
    fn insert_resident(&mut self, draft: ResidentDraft) -> StoreResult<Resident>;
    /// Replaces every field of an existing resident.
    fn update_resident(&mut self, id: ResidentId, draft: ResidentDraft) -> StoreResult<Resident>;
    /// Deletes a resident that no package references.
    fn delete_resident(&mut self, id: ResidentId) -> StoreResult<()>;
    /// Seeds a storage location.
    fn insert_storage_location(&mut self, location_name: String) -> StoreResult<StorageLocation>;

    /// Inserts a package with status `checked_in`, stamped with the current time.
    fn insert_package(&mut self, draft: PackageDraft) -> StoreResult<Package>;
    /// Applies `patch` in one write, only if the current status equals `expect_status` when given.
    fn update_package(
        &mut self,
        id: PackageRecordId,
        patch: PackagePatch,
        expect_status: Option<PackageStatus>,
    ) -> StoreResult<Package>;
}

pub(crate) fn require_non_empty(value: &str, what: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Constraint(format!("{what} must not be empty")));
    }
    Ok(())
}
