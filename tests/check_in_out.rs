mod common;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use parceldesk::{
    config::ViewConfig,
    persist::StoreError,
    records::{
        Package, PackageDraft, PackagePatch, PackageQuery, PackageView, Resident, ResidentDraft,
        StorageLocation,
    },
    runtime::{
        events::{EventMask, Subscription},
        handle::{RecordStoreHandle, RuntimeError},
    },
    types::{PackageRecordId, PackageStatus, ResidentId, Table, now_ms},
    view::{
        cache::ViewCache,
        checkin::CheckInView,
        checkout::CheckOutView,
        coordinator::{MutationCoordinator, MutationError},
        filter::available_packages,
        traits::RecordStore,
        validate::CheckInRequest,
    },
};

use common::{check_in, fixture};

async fn stored(store: &RecordStoreHandle, id: PackageRecordId) -> Package {
    store
        .packages(PackageQuery::default())
        .await
        .expect("select")
        .into_iter()
        .find(|p| p.package.id == id)
        .expect("package row")
        .package
}

#[tokio::test]
async fn check_in_scenario_creates_one_available_package() {
    let fx = fixture().await;
    let mut req = check_in("PKG-001", &fx.jane, &fx.shelf);
    req.description = "Brown box".to_string();
    req.color = "Brown".to_string();
    req.size = "Medium".to_string();

    let receipt = fx.coordinator.check_in(&req).await.expect("check in");
    assert_eq!(receipt.resident_name, "Jane Doe");
    assert_eq!(
        receipt.confirmation(),
        "Package PKG-001 has been logged for Jane Doe"
    );

    let pkg = stored(&fx.store, receipt.record_id()).await;
    assert_eq!(pkg.status, PackageStatus::CheckedIn);
    assert_eq!(pkg.checked_out_at_ms, None);
    assert_eq!(pkg.checked_out_by, None);
    assert_eq!(pkg.checked_in_by, "Alice");
    assert_eq!(pkg.storage_location_id, fx.shelf.id);
    assert_eq!(pkg.description.as_deref(), Some("Brown box"));
    assert_eq!(pkg.color.as_deref(), Some("Brown"));
    assert_eq!(pkg.size.as_deref(), Some("Medium"));
    assert_eq!(pkg.notes, None);

    let available = available_packages(fx.jane.id, &fx.cache.packages());
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].package.package_id, "PKG-001");
    assert_eq!(available[0].location_name.as_deref(), Some("Shelf-3"));
    assert!(available_packages(fx.john.id, &fx.cache.packages()).is_empty());
}

#[tokio::test]
async fn check_in_screen_loads_pickers_in_name_order() {
    let fx = fixture().await;
    let cache = Arc::new(ViewCache::new(fx.store.clone()));
    assert!(cache.storage_locations().is_empty());

    let screen = CheckInView::enter(MutationCoordinator::new(cache, ViewConfig::default())).await;
    let locations: Vec<String> = screen
        .storage_locations()
        .iter()
        .map(|l| l.location_name.clone())
        .collect();
    assert_eq!(locations, ["Bin-1", "Shelf-3"]);
    let residents: Vec<String> = screen.residents().iter().map(|r| r.name.clone()).collect();
    assert_eq!(residents, ["Jane Doe", "John Roe"]);

    let receipt = screen
        .check_in(&check_in("PKG-001", &fx.jane, &fx.bin))
        .await
        .expect("check in");
    assert_eq!(receipt.resident_name, "Jane Doe");
    assert_eq!(receipt.package.storage_location_id, fx.bin.id);
}

#[tokio::test]
async fn storage_locations_refresh_picks_up_new_rows() {
    let fx = fixture().await;
    fx.store
        .insert_storage_location("Annex")
        .await
        .expect("annex");
    assert_eq!(fx.cache.storage_locations().len(), 2);

    fx.cache
        .refresh(Table::StorageLocations)
        .await
        .expect("refresh");
    let names: Vec<String> = fx
        .cache
        .storage_locations()
        .iter()
        .map(|l| l.location_name.clone())
        .collect();
    assert_eq!(names, ["Annex", "Bin-1", "Shelf-3"]);
}

#[tokio::test]
async fn check_out_scenario_updates_status_and_recent_list() {
    let fx = fixture().await;
    let earlier = fx
        .coordinator
        .check_in(&check_in("PKG-000", &fx.john, &fx.bin))
        .await
        .expect("check in earlier");
    fx.coordinator
        .check_out(earlier.record_id(), "Carol")
        .await
        .expect("check out earlier");

    let receipt = fx
        .coordinator
        .check_in(&check_in("PKG-001", &fx.jane, &fx.shelf))
        .await
        .expect("check in");

    let mut view = CheckOutView::enter(fx.coordinator.clone()).await;
    let picker: Vec<u64> = view.residents().iter().map(|r| r.id).collect();
    assert_eq!(picker, [fx.jane.id, fx.john.id]);
    assert_eq!(view.select_resident(Some(fx.jane.id)).len(), 1);
    assert_eq!(
        view.selected_resident().map(|r| r.display_label()),
        Some("Jane Doe - House A-101".to_string())
    );

    let before = now_ms();
    let outcome = view
        .check_out(receipt.record_id(), "Bob")
        .await
        .expect("check out");
    let after = now_ms();

    assert_eq!(outcome.package.status, PackageStatus::CheckedOut);
    assert_eq!(outcome.package.checked_out_by.as_deref(), Some("Bob"));
    let at = outcome.package.checked_out_at_ms.expect("timestamp");
    assert!(before <= at && at <= after);
    assert!(outcome.available.is_empty());
    assert_eq!(
        outcome.confirmation(),
        "Package PKG-001 has been delivered to the resident"
    );
    assert!(view.available().is_empty());

    let recent = view.recent_check_outs();
    assert_eq!(recent[0].package.package_id, "PKG-001");
    assert_eq!(recent[0].resident_name.as_deref(), Some("Jane Doe"));
    assert_eq!(recent.len(), 2);

    view.exit().await;
}

#[tokio::test]
async fn second_check_out_is_rejected_and_keeps_first_record() {
    let fx = fixture().await;
    let id = fx
        .coordinator
        .check_in(&check_in("PKG-001", &fx.jane, &fx.shelf))
        .await
        .expect("check in")
        .record_id();

    let first = fx.coordinator.check_out(id, "Bob").await.expect("first");
    let err = fx.coordinator.check_out(id, "Eve").await.unwrap_err();
    assert!(matches!(err, MutationError::AlreadyCheckedOut(rejected) if rejected == id));

    let pkg = stored(&fx.store, id).await;
    assert_eq!(pkg.checked_out_by.as_deref(), Some("Bob"));
    assert_eq!(pkg.checked_out_at_ms, first.checked_out_at_ms);
}

#[tokio::test]
async fn blank_operator_is_recorded_as_staff() {
    let fx = fixture().await;
    let mut req = check_in("PKG-001", &fx.jane, &fx.shelf);
    req.checked_in_by = "   ".to_string();
    let receipt = fx.coordinator.check_in(&req).await.expect("check in");
    assert_eq!(receipt.package.checked_in_by, "Staff");

    let pkg = fx
        .coordinator
        .check_out(receipt.record_id(), "")
        .await
        .expect("check out");
    assert_eq!(pkg.checked_out_by.as_deref(), Some("Staff"));
}

#[tokio::test]
async fn invalid_form_never_reaches_the_store() {
    let fx = fixture().await;
    let mut sub = fx.store.subscribe(Table::Packages, EventMask::ALL);

    let err = fx
        .coordinator
        .check_in(&CheckInRequest {
            package_id: "PKG-001".to_string(),
            resident_id: Some(fx.jane.id),
            ..CheckInRequest::default()
        })
        .await
        .unwrap_err();
    let MutationError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(
        errors.message_for("storage_location_id"),
        Some("Storage location is required")
    );

    let rows = fx.store.packages(PackageQuery::default()).await.expect("select");
    assert!(rows.is_empty());
    assert!(
        tokio::time::timeout(std::time::Duration::from_millis(50), sub.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn store_rejection_is_reported_verbatim_and_creates_nothing() {
    let fx = fixture().await;
    let req = CheckInRequest {
        package_id: "PKG-001".to_string(),
        resident_id: Some(999),
        storage_location_id: Some(fx.shelf.id),
        ..CheckInRequest::default()
    };

    let err = fx.coordinator.check_in(&req).await.unwrap_err();
    assert!(matches!(
        err,
        MutationError::Store(RuntimeError::Store(StoreError::Constraint(_)))
    ));
    assert_eq!(
        err.to_string(),
        "packages.resident_id references missing resident 999"
    );
    assert!(fx.store.packages(PackageQuery::default()).await.expect("select").is_empty());
}

/// Store whose package inserts always fail, counting attempts.
#[derive(Clone)]
struct RejectingStore {
    inner: RecordStoreHandle,
    inserts: Arc<AtomicUsize>,
}

const REJECTION: &str = "new row for relation \"packages\" violates check constraint";

impl RecordStore for RejectingStore {
    async fn residents(&self) -> Result<Vec<Resident>, RuntimeError> {
        self.inner.residents().await
    }

    async fn storage_locations(&self) -> Result<Vec<StorageLocation>, RuntimeError> {
        self.inner.storage_locations().await
    }

    async fn packages(&self, query: PackageQuery) -> Result<Vec<PackageView>, RuntimeError> {
        self.inner.packages(query).await
    }

    async fn insert_resident(&self, draft: ResidentDraft) -> Result<Resident, RuntimeError> {
        self.inner.insert_resident(draft).await
    }

    async fn update_resident(
        &self,
        id: ResidentId,
        draft: ResidentDraft,
    ) -> Result<Resident, RuntimeError> {
        self.inner.update_resident(id, draft).await
    }

    async fn delete_resident(&self, id: ResidentId) -> Result<(), RuntimeError> {
        self.inner.delete_resident(id).await
    }

    async fn insert_package(&self, _draft: PackageDraft) -> Result<Package, RuntimeError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Err(RuntimeError::Store(StoreError::Message(REJECTION.to_string())))
    }

    async fn update_package(
        &self,
        id: PackageRecordId,
        patch: PackagePatch,
        expect_status: Option<PackageStatus>,
    ) -> Result<Package, RuntimeError> {
        self.inner.update_package(id, patch, expect_status).await
    }

    fn subscribe(&self, table: Table, mask: EventMask) -> Subscription {
        self.inner.subscribe(table, mask)
    }
}

#[tokio::test]
async fn failed_insert_is_not_retried() {
    let fx = fixture().await;
    let inserts = Arc::new(AtomicUsize::new(0));
    let store = RejectingStore {
        inner: fx.store.clone(),
        inserts: Arc::clone(&inserts),
    };
    let cache = Arc::new(ViewCache::new(store));
    cache.refresh_all().await.expect("refresh");
    let coordinator = MutationCoordinator::new(cache, ViewConfig::default());

    let err = coordinator
        .check_in(&check_in("PKG-001", &fx.jane, &fx.shelf))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), REJECTION);
    assert_eq!(inserts.load(Ordering::SeqCst), 1);
    assert!(coordinator.cache().packages().is_empty());
}

#[tokio::test]
async fn check_out_of_unknown_package_surfaces_store_error() {
    let fx = fixture().await;
    let err = fx.coordinator.check_out(42, "Bob").await.unwrap_err();
    assert!(matches!(
        err,
        MutationError::Store(RuntimeError::Store(StoreError::NotFound {
            table: Table::Packages,
            id: 42
        }))
    ));
}

#[tokio::test]
async fn unknown_resident_selection_clears_the_view() {
    let fx = fixture().await;
    fx.coordinator
        .check_in(&check_in("PKG-001", &fx.jane, &fx.shelf))
        .await
        .expect("check in");

    let mut view = CheckOutView::enter(fx.coordinator.clone()).await;
    assert_eq!(view.select_resident(Some(fx.jane.id)).len(), 1);
    assert!(view.select_resident(Some(999)).is_empty());
    assert!(view.selected_resident().is_none());
    assert!(view.select_resident(None).is_empty());
    view.exit().await;
}
