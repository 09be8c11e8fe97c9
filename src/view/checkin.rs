use std::sync::Arc;

use tracing::debug;

use crate::{
    records::{Resident, StorageLocation},
    types::Table,
};

use super::{
    coordinator::{CheckInReceipt, MutationCoordinator, MutationError},
    traits::RecordStore,
    validate::CheckInRequest,
};

/// The check-in screen: resident and storage location pickers plus the form submit.
#[derive(Debug)]
pub struct CheckInView<S: RecordStore> {
    coordinator: MutationCoordinator<S>,
}

impl<S: RecordStore> CheckInView<S> {
    /// Opens the screen and loads both pickers.
    ///
    /// Load failures leave the previous snapshots in place.
    pub async fn enter(coordinator: MutationCoordinator<S>) -> Self {
        let cache = coordinator.cache();
        let _ = cache.refresh(Table::Residents).await;
        let _ = cache.refresh(Table::StorageLocations).await;
        debug!("check-in view entered");
        Self { coordinator }
    }

    /// Residents ordered by name.
    pub fn residents(&self) -> Arc<Vec<Resident>> {
        self.coordinator.cache().residents()
    }

    /// Storage locations ordered by name.
    pub fn storage_locations(&self) -> Arc<Vec<StorageLocation>> {
        self.coordinator.cache().storage_locations()
    }

    /// Submits the form.
    pub async fn check_in(&self, req: &CheckInRequest) -> Result<CheckInReceipt, MutationError> {
        self.coordinator.check_in(req).await
    }
}
