use std::sync::Arc;

use tracing::debug;

use crate::{
    records::{Package, PackageView, Resident},
    types::{PackageRecordId, ResidentId, Table},
};

use super::{
    cache::ViewCache,
    coordinator::{MutationCoordinator, MutationError},
    filter::{available_packages, recent_check_outs},
    listener::ChangeListener,
    traits::RecordStore,
};

/// Outcome of a check-out from the check-out screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutOutcome {
    /// The updated row.
    pub package: Package,
    /// Packages still available for the selected resident, after the refresh.
    pub available: Vec<PackageView>,
}

impl CheckOutOutcome {
    /// Confirmation line shown after a successful check-out.
    pub fn confirmation(&self) -> String {
        format!(
            "Package {} has been delivered to the resident",
            self.package.package_id
        )
    }
}

/// The check-out screen: resident selection, the derived package list, and
/// the live package subscription for as long as the screen is open.
#[derive(Debug)]
pub struct CheckOutView<S: RecordStore> {
    coordinator: MutationCoordinator<S>,
    selected: Option<ResidentId>,
    listener: Option<ChangeListener>,
}

impl<S: RecordStore> CheckOutView<S> {
    /// Opens the screen: subscribes to package changes, then loads residents and packages.
    ///
    /// Load failures leave the previous snapshots in place.
    pub async fn enter(coordinator: MutationCoordinator<S>) -> Self {
        let listener = ChangeListener::spawn(Arc::clone(coordinator.cache()));
        let cache = coordinator.cache();
        let _ = cache.refresh(Table::Residents).await;
        let _ = cache.refresh(Table::Packages).await;
        debug!("check-out view entered");
        Self {
            coordinator,
            selected: None,
            listener: Some(listener),
        }
    }

    fn cache(&self) -> &Arc<ViewCache<S>> {
        self.coordinator.cache()
    }

    /// Residents for the picker.
    pub fn residents(&self) -> Arc<Vec<Resident>> {
        self.cache().residents()
    }

    /// Selects a resident and returns their available packages.
    ///
    /// `None` or an id missing from the cache clears the selection.
    pub fn select_resident(&mut self, id: Option<ResidentId>) -> Vec<PackageView> {
        self.selected = id.filter(|id| self.cache().resident(*id).is_some());
        self.available()
    }

    /// Currently selected resident, resolved against the latest snapshot.
    pub fn selected_resident(&self) -> Option<Resident> {
        self.selected.and_then(|id| self.cache().resident(id))
    }

    /// Packages available for the selected resident, derived from the latest snapshot.
    pub fn available(&self) -> Vec<PackageView> {
        match self.selected {
            Some(id) => available_packages(id, &self.cache().packages()),
            None => Vec::new(),
        }
    }

    /// Latest check-outs across all residents, capped by configuration.
    pub fn recent_check_outs(&self) -> Vec<PackageView> {
        recent_check_outs(
            &self.cache().packages(),
            self.coordinator.config().recent_check_outs_limit,
        )
    }

    /// Checks out `id` and re-derives the selected resident's list.
    pub async fn check_out(
        &self,
        id: PackageRecordId,
        operator: &str,
    ) -> Result<CheckOutOutcome, MutationError> {
        let package = self.coordinator.check_out(id, operator).await?;
        Ok(CheckOutOutcome {
            package,
            available: self.available(),
        })
    }

    /// True while the package subscription is live; false once the store has stopped.
    pub fn is_listening(&self) -> bool {
        self.listener.as_ref().is_some_and(ChangeListener::is_active)
    }

    /// Replaces the package subscription and reloads packages.
    ///
    /// The old listener is fully stopped first, so at most one is ever active.
    /// Against a stopped store the new listener ends at once.
    pub async fn resubscribe(&mut self) {
        if let Some(old) = self.listener.take() {
            old.stop().await;
        }
        self.listener = Some(ChangeListener::spawn(Arc::clone(self.cache())));
        let _ = self.cache().refresh(Table::Packages).await;
    }

    /// Closes the screen and releases the subscription.
    pub async fn exit(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.stop().await;
        }
        debug!("check-out view exited");
    }
}
