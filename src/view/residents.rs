use std::sync::Arc;

use tracing::info;

use crate::{
    records::Resident,
    runtime::handle::RuntimeError,
    types::{ResidentId, Table},
};

use super::{
    cache::ViewCache, coordinator::MutationError, traits::RecordStore, validate::ResidentForm,
};

/// Resident directory management: add, edit, delete, each followed by a
/// refresh of the cached residents.
#[derive(Debug, Clone)]
pub struct ResidentDirectory<S> {
    cache: Arc<ViewCache<S>>,
}

impl<S: RecordStore> ResidentDirectory<S> {
    /// Directory over the shared cache.
    pub fn new(cache: Arc<ViewCache<S>>) -> Self {
        Self { cache }
    }

    /// Fetches the directory and returns the new snapshot.
    pub async fn load(&self) -> Result<Arc<Vec<Resident>>, RuntimeError> {
        self.cache.refresh(Table::Residents).await?;
        Ok(self.cache.residents())
    }

    /// Cached residents, ordered by name.
    pub fn residents(&self) -> Arc<Vec<Resident>> {
        self.cache.residents()
    }

    /// Form prefilled from an existing resident for editing.
    pub fn edit_form(resident: &Resident) -> ResidentForm {
        ResidentForm {
            name: resident.name.clone(),
            house_number: resident.house_number.clone(),
            phone: resident.phone.clone().unwrap_or_default(),
            email: resident.email.clone().unwrap_or_default(),
        }
    }

    /// Adds a resident.
    pub async fn add(&self, form: &ResidentForm) -> Result<Resident, MutationError> {
        let draft = form.validate()?;
        let resident = self.cache.store().insert_resident(draft).await?;
        info!(resident_id = resident.id, "resident added");
        self.refresh().await;
        Ok(resident)
    }

    /// Replaces every field of resident `id` with the form's values.
    pub async fn update(&self, id: ResidentId, form: &ResidentForm) -> Result<Resident, MutationError> {
        let draft = form.validate()?;
        let resident = self.cache.store().update_resident(id, draft).await?;
        info!(resident_id = id, "resident updated");
        self.refresh().await;
        Ok(resident)
    }

    /// Deletes resident `id`. Whether referenced residents may go is up to the store.
    pub async fn remove(&self, id: ResidentId) -> Result<(), MutationError> {
        self.cache.store().delete_resident(id).await?;
        info!(resident_id = id, "resident deleted");
        self.refresh().await;
        Ok(())
    }

    async fn refresh(&self) {
        let _ = self.cache.refresh(Table::Residents).await;
    }
}
