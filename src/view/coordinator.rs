use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    config::ViewConfig,
    persist::StoreError,
    records::{Package, PackageDraft, PackagePatch},
    runtime::handle::RuntimeError,
    types::{PackageRecordId, PackageStatus, Table, now_ms},
};

use super::{
    cache::ViewCache,
    traits::RecordStore,
    validate::{CheckInRequest, ValidationError, non_blank},
};

/// Failure of a user-initiated write.
///
/// The display text is what staff see; store failures carry the store's
/// reason verbatim.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The form was rejected before reaching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The package was no longer checked in when the update ran.
    #[error("package {0} has already been checked out")]
    AlreadyCheckedOut(PackageRecordId),
    /// The store rejected or failed the write.
    #[error(transparent)]
    Store(#[from] RuntimeError),
}

/// Result of a successful check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInReceipt {
    /// The created row.
    pub package: Package,
    /// Resident name for the confirmation message.
    pub resident_name: String,
}

impl CheckInReceipt {
    /// Store identity of the new package.
    pub fn record_id(&self) -> PackageRecordId {
        self.package.id
    }

    /// Confirmation line, e.g. `Package PKG-001 has been logged for Jane Doe`.
    pub fn confirmation(&self) -> String {
        format!(
            "Package {} has been logged for {}",
            self.package.package_id, self.resident_name
        )
    }
}

/// Runs check-in and check-out as single store writes followed by a refresh.
///
/// Local state is never mutated optimistically: the cache only changes by
/// re-reading the store, so a failed write needs no rollback.
#[derive(Debug, Clone)]
pub struct MutationCoordinator<S> {
    cache: Arc<ViewCache<S>>,
    config: ViewConfig,
}

impl<S: RecordStore> MutationCoordinator<S> {
    /// Coordinator writing through `cache`'s store.
    pub fn new(cache: Arc<ViewCache<S>>, config: ViewConfig) -> Self {
        Self { cache, config }
    }

    /// Shared cache.
    pub fn cache(&self) -> &Arc<ViewCache<S>> {
        &self.cache
    }

    /// View settings.
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Validates `req` and inserts one `checked_in` package.
    ///
    /// No retry: a store failure is returned as is and nothing is created.
    pub async fn check_in(&self, req: &CheckInRequest) -> Result<CheckInReceipt, MutationError> {
        let valid = req.validate()?;

        if self
            .cache
            .packages()
            .iter()
            .any(|p| p.package.is_available() && p.package.package_id == valid.package_id)
        {
            warn!(package_id = %valid.package_id, "package id is already checked in");
        }

        let draft = PackageDraft {
            package_id: valid.package_id,
            description: non_blank(&req.description),
            color: non_blank(&req.color),
            size: non_blank(&req.size),
            notes: non_blank(&req.notes),
            resident_id: valid.resident_id,
            storage_location_id: valid.storage_location_id,
            checked_in_by: self.config.operator_or_default(&req.checked_in_by),
        };
        let package = self.cache.store().insert_package(draft).await?;
        info!(
            record_id = package.id,
            package_id = %package.package_id,
            resident_id = package.resident_id,
            "package checked in"
        );

        let resident_name = self
            .cache
            .resident(package.resident_id)
            .map(|r| r.name)
            .unwrap_or_else(|| "Resident".to_string());

        self.refresh_packages().await;
        Ok(CheckInReceipt {
            package,
            resident_name,
        })
    }

    /// Marks a package delivered: status, time, and operator in one conditional write.
    ///
    /// A blank `operator` records the default label. A package that is no
    /// longer checked in is rejected with [`MutationError::AlreadyCheckedOut`]
    /// and keeps its original check-out fields.
    pub async fn check_out(
        &self,
        id: PackageRecordId,
        operator: &str,
    ) -> Result<Package, MutationError> {
        let patch = PackagePatch::check_out(now_ms(), self.config.operator_or_default(operator));
        let res = self
            .cache
            .store()
            .update_package(id, patch, Some(PackageStatus::CheckedIn))
            .await;

        match res {
            Ok(package) => {
                info!(
                    record_id = package.id,
                    package_id = %package.package_id,
                    checked_out_by = package.checked_out_by.as_deref().unwrap_or_default(),
                    "package checked out"
                );
                self.refresh_packages().await;
                Ok(package)
            }
            Err(RuntimeError::Store(StoreError::ConditionFailed { .. })) => {
                warn!(record_id = id, "check-out rejected, package already checked out");
                // Our snapshot was stale; pull the other terminal's write.
                self.refresh_packages().await;
                Err(MutationError::AlreadyCheckedOut(id))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn refresh_packages(&self) {
        // A failed refresh is logged by the cache and does not undo the write.
        let _ = self.cache.refresh(Table::Packages).await;
    }
}
