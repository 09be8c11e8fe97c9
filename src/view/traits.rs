use std::future::Future;

use crate::{
    records::{
        Package, PackageDraft, PackagePatch, PackageQuery, PackageView, Resident, ResidentDraft,
        StorageLocation,
    },
    runtime::{
        events::{EventMask, Subscription},
        handle::RuntimeError,
    },
    types::{PackageRecordId, PackageStatus, ResidentId, Table},
};

/// Contract of the shared record store that the views depend on.
///
/// Reads are plain fetches with no caching; every write is a single
/// store-side operation that either applies fully or fails. Changes are
/// announced on per-table feeds, delivered asynchronously and possibly
/// out of order relative to direct reads.
pub trait RecordStore: Clone + Send + Sync + 'static {
    /// All residents ordered by name.
    fn residents(&self) -> impl Future<Output = Result<Vec<Resident>, RuntimeError>> + Send;

    /// All storage locations ordered by name.
    fn storage_locations(
        &self,
    ) -> impl Future<Output = Result<Vec<StorageLocation>, RuntimeError>> + Send;

    /// Packages joined with resident and location names, newest check-in first.
    fn packages(
        &self,
        query: PackageQuery,
    ) -> impl Future<Output = Result<Vec<PackageView>, RuntimeError>> + Send;

    /// Creates a resident.
    fn insert_resident(
        &self,
        draft: ResidentDraft,
    ) -> impl Future<Output = Result<Resident, RuntimeError>> + Send;

    /// Replaces a resident's fields.
    fn update_resident(
        &self,
        id: ResidentId,
        draft: ResidentDraft,
    ) -> impl Future<Output = Result<Resident, RuntimeError>> + Send;

    /// Removes a resident.
    fn delete_resident(&self, id: ResidentId)
    -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// Creates a package in `checked_in` state.
    fn insert_package(
        &self,
        draft: PackageDraft,
    ) -> impl Future<Output = Result<Package, RuntimeError>> + Send;

    /// Applies `patch` atomically, guarded by `expect_status` when given.
    fn update_package(
        &self,
        id: PackageRecordId,
        patch: PackagePatch,
        expect_status: Option<PackageStatus>,
    ) -> impl Future<Output = Result<Package, RuntimeError>> + Send;

    /// Opens a live change feed on `table`.
    fn subscribe(&self, table: Table, mask: EventMask) -> Subscription;
}
