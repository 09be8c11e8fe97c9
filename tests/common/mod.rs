#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use parceldesk::{
    config::{StoreConfig, ViewConfig},
    records::{PackageView, Resident, ResidentDraft, StorageLocation},
    runtime::handle::{RecordStoreHandle, open_record_store},
    view::{
        cache::ViewCache, coordinator::MutationCoordinator, traits::RecordStore,
        validate::CheckInRequest,
    },
};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Fixture {
    pub store: RecordStoreHandle,
    pub cache: Arc<ViewCache<RecordStoreHandle>>,
    pub coordinator: MutationCoordinator<RecordStoreHandle>,
    pub jane: Resident,
    pub john: Resident,
    pub shelf: StorageLocation,
    pub bin: StorageLocation,
}

impl Fixture {
    /// A second terminal on the same store with its own cache.
    pub async fn terminal(&self) -> MutationCoordinator<RecordStoreHandle> {
        let cache = Arc::new(ViewCache::new(self.store.clone()));
        cache.refresh_all().await.expect("refresh");
        MutationCoordinator::new(cache, ViewConfig::default())
    }
}

pub async fn fixture() -> Fixture {
    let store = open_record_store(&StoreConfig::default()).expect("open store");
    seeded(store).await
}

pub async fn seeded(store: RecordStoreHandle) -> Fixture {
    init_tracing();

    let jane = store
        .insert_resident(resident("Jane Doe", "A-101"))
        .await
        .expect("jane");
    let john = store
        .insert_resident(resident("John Roe", "B-202"))
        .await
        .expect("john");
    let shelf = store.insert_storage_location("Shelf-3").await.expect("shelf");
    let bin = store.insert_storage_location("Bin-1").await.expect("bin");

    let cache = Arc::new(ViewCache::new(store.clone()));
    cache.refresh_all().await.expect("refresh");
    let coordinator = MutationCoordinator::new(Arc::clone(&cache), ViewConfig::default());

    Fixture {
        store,
        cache,
        coordinator,
        jane,
        john,
        shelf,
        bin,
    }
}

pub fn resident(name: &str, house: &str) -> ResidentDraft {
    ResidentDraft {
        name: name.to_string(),
        house_number: house.to_string(),
        phone: None,
        email: None,
    }
}

pub fn check_in(package_id: &str, resident: &Resident, location: &StorageLocation) -> CheckInRequest {
    CheckInRequest {
        package_id: package_id.to_string(),
        resident_id: Some(resident.id),
        storage_location_id: Some(location.id),
        checked_in_by: "Alice".to_string(),
        ..CheckInRequest::default()
    }
}

/// Waits until the cached packages satisfy `pred`.
pub async fn wait_for_packages<S, F>(cache: &ViewCache<S>, pred: F)
where
    S: RecordStore,
    F: Fn(&[PackageView]) -> bool,
{
    let mut rx = cache.watch_packages();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if pred(&rx.borrow_and_update()) {
                return;
            }
            rx.changed().await.expect("cache dropped");
        }
    })
    .await
    .expect("timed out waiting for package refresh");
}
