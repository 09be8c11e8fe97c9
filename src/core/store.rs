use hashbrown::HashMap;

use crate::{
    persist::{Backend, StoreError, StoreResult, require_non_empty},
    records::{
        Package, PackageDraft, PackagePatch, PackageQuery, PackageView, Resident, ResidentDraft,
        StorageLocation,
    },
    types::{
        PackageRecordId, PackageStatus, ResidentId, StorageLocationId, Table, TimestampMs, now_ms,
    },
};

use super::indices::VecIndex;

/// Volatile backend holding all three tables in hash maps.
///
/// Enforces the same constraints as the SQLite schema: required strings are
/// non-empty, package references must exist, and a referenced resident cannot
/// be deleted.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    residents: HashMap<ResidentId, Resident>,
    locations: HashMap<StorageLocationId, StorageLocation>,
    packages: HashMap<PackageRecordId, Package>,
    by_resident: VecIndex<ResidentId>,
    next_resident_id: ResidentId,
    next_location_id: StorageLocationId,
    next_package_id: PackageRecordId,
    last_checked_in_at: TimestampMs,
}

impl MemoryBackend {
    /// Empty backend; ids start at 1.
    pub fn new() -> Self {
        Self {
            next_resident_id: 1,
            next_location_id: 1,
            next_package_id: 1,
            ..Self::default()
        }
    }

    /// Direct row lookup, bypassing the join.
    pub fn package(&self, id: PackageRecordId) -> Option<&Package> {
        self.packages.get(&id)
    }

    /// Number of package rows.
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    fn join(&self, pkg: &Package) -> PackageView {
        let resident = self.residents.get(&pkg.resident_id);
        PackageView {
            package: pkg.clone(),
            resident_name: resident.map(|r| r.name.clone()),
            resident_house_number: resident.map(|r| r.house_number.clone()),
            location_name: self
                .locations
                .get(&pkg.storage_location_id)
                .map(|l| l.location_name.clone()),
        }
    }

    fn validate_resident(draft: &ResidentDraft) -> StoreResult<()> {
        require_non_empty(&draft.name, "residents.name")?;
        require_non_empty(&draft.house_number, "residents.house_number")
    }

    /// Monotonic check-in clock so insertion order and time order agree.
    fn stamp_check_in(&mut self) -> TimestampMs {
        let ts = now_ms().max(self.last_checked_in_at);
        self.last_checked_in_at = ts;
        ts
    }
}

impl Backend for MemoryBackend {
    fn residents(&self) -> StoreResult<Vec<Resident>> {
        let mut out: Vec<Resident> = self.residents.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn storage_locations(&self) -> StoreResult<Vec<StorageLocation>> {
        let mut out: Vec<StorageLocation> = self.locations.values().cloned().collect();
        out.sort_by(|a, b| a.location_name.cmp(&b.location_name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn packages(&self, query: &PackageQuery) -> StoreResult<Vec<PackageView>> {
        let candidates: Box<dyn Iterator<Item = &Package> + '_> = match query.resident_id {
            Some(resident_id) => Box::new(
                self.by_resident
                    .get(&resident_id)
                    .into_iter()
                    .flat_map(|ids| ids.iter())
                    .filter_map(|id| self.packages.get(id)),
            ),
            None => Box::new(self.packages.values()),
        };

        let mut rows: Vec<&Package> = candidates.filter(|p| query.matches(p)).collect();
        rows.sort_by(|a, b| {
            b.checked_in_at_ms
                .cmp(&a.checked_in_at_ms)
                .then(b.id.cmp(&a.id))
        });
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows.into_iter().map(|p| self.join(p)).collect())
    }

    fn insert_resident(&mut self, draft: ResidentDraft) -> StoreResult<Resident> {
        Self::validate_resident(&draft)?;
        let id = self.next_resident_id;
        self.next_resident_id += 1;
        let rec = draft.into_record(id);
        self.residents.insert(id, rec.clone());
        Ok(rec)
    }

    fn update_resident(&mut self, id: ResidentId, draft: ResidentDraft) -> StoreResult<Resident> {
        Self::validate_resident(&draft)?;
        let rec = self.residents.get_mut(&id).ok_or(StoreError::NotFound {
            table: Table::Residents,
            id,
        })?;
        *rec = draft.into_record(id);
        Ok(rec.clone())
    }

    fn delete_resident(&mut self, id: ResidentId) -> StoreResult<()> {
        if !self.residents.contains_key(&id) {
            return Err(StoreError::NotFound {
                table: Table::Residents,
                id,
            });
        }
        if self.by_resident.get(&id).is_some_and(|ids| !ids.is_empty()) {
            return Err(StoreError::Constraint(format!(
                "resident {id} is still referenced by packages"
            )));
        }
        self.residents.remove(&id);
        self.by_resident.remove(&id);
        Ok(())
    }

    fn insert_storage_location(&mut self, location_name: String) -> StoreResult<StorageLocation> {
        require_non_empty(&location_name, "storage_locations.location_name")?;
        let id = self.next_location_id;
        self.next_location_id += 1;
        let rec = StorageLocation { id, location_name };
        self.locations.insert(id, rec.clone());
        Ok(rec)
    }

    fn insert_package(&mut self, draft: PackageDraft) -> StoreResult<Package> {
        require_non_empty(&draft.package_id, "packages.package_id")?;
        if !self.residents.contains_key(&draft.resident_id) {
            return Err(StoreError::Constraint(format!(
                "packages.resident_id references missing resident {}",
                draft.resident_id
            )));
        }
        if !self.locations.contains_key(&draft.storage_location_id) {
            return Err(StoreError::Constraint(format!(
                "packages.storage_location_id references missing location {}",
                draft.storage_location_id
            )));
        }

        let id = self.next_package_id;
        self.next_package_id += 1;
        let at = self.stamp_check_in();
        let rec = draft.into_record(id, at);
        self.by_resident.entry(rec.resident_id).or_default().push(id);
        self.packages.insert(id, rec.clone());
        Ok(rec)
    }

    fn update_package(
        &mut self,
        id: PackageRecordId,
        patch: PackagePatch,
        expect_status: Option<PackageStatus>,
    ) -> StoreResult<Package> {
        let rec = self.packages.get_mut(&id).ok_or(StoreError::NotFound {
            table: Table::Packages,
            id,
        })?;
        if expect_status.is_some_and(|s| s != rec.status) {
            return Err(StoreError::ConditionFailed {
                table: Table::Packages,
                id,
            });
        }
        patch.apply_to(rec);
        Ok(rec.clone())
    }
}
