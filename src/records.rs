//! Resident, storage location, and package records plus their drafts and patches.

use serde::{Deserialize, Serialize};

use crate::types::{
    PackageRecordId, PackageStatus, ResidentId, StorageLocationId, TimestampMs,
};

/// A person who receives packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    /// Stable resident identifier.
    pub id: ResidentId,
    /// Display name.
    pub name: String,
    /// House or unit number.
    pub house_number: String,
    /// Optional contact phone.
    pub phone: Option<String>,
    /// Optional contact email.
    pub email: Option<String>,
}

impl Resident {
    /// Header line shown when the resident is selected, e.g. `Jane Doe - House A-101`.
    pub fn display_label(&self) -> String {
        format!("{} - House {}", self.name, self.house_number)
    }
}

/// Insert/replace payload for a [`Resident`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResidentDraft {
    /// Display name.
    pub name: String,
    /// House or unit number.
    pub house_number: String,
    /// Optional contact phone.
    pub phone: Option<String>,
    /// Optional contact email.
    pub email: Option<String>,
}

impl ResidentDraft {
    pub(crate) fn into_record(self, id: ResidentId) -> Resident {
        Resident {
            id,
            name: self.name,
            house_number: self.house_number,
            phone: self.phone,
            email: self.email,
        }
    }
}

/// A shelf or bin where packages wait for pickup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLocation {
    /// Stable location identifier.
    pub id: StorageLocationId,
    /// Human-readable location name.
    pub location_name: String,
}

/// Authoritative package row as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Store identity.
    pub id: PackageRecordId,
    /// Carrier or label id, assigned outside the system.
    pub package_id: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Package color.
    pub color: Option<String>,
    /// Package size.
    pub size: Option<String>,
    /// Staff notes.
    pub notes: Option<String>,
    /// Owning resident.
    pub resident_id: ResidentId,
    /// Where the package is stored.
    pub storage_location_id: StorageLocationId,
    /// Lifecycle state.
    pub status: PackageStatus,
    /// Check-in time.
    pub checked_in_at_ms: TimestampMs,
    /// Check-in operator.
    pub checked_in_by: String,
    /// Check-out time, set exactly once.
    pub checked_out_at_ms: Option<TimestampMs>,
    /// Check-out operator, set exactly once.
    pub checked_out_by: Option<String>,
}

impl Package {
    /// True while the package is still waiting in storage.
    pub fn is_available(&self) -> bool {
        self.status == PackageStatus::CheckedIn
    }
}

/// Insert payload for a [`Package`]. Status and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDraft {
    /// Carrier or label id.
    pub package_id: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Package color.
    pub color: Option<String>,
    /// Package size.
    pub size: Option<String>,
    /// Staff notes.
    pub notes: Option<String>,
    /// Owning resident.
    pub resident_id: ResidentId,
    /// Where the package is stored.
    pub storage_location_id: StorageLocationId,
    /// Check-in operator.
    pub checked_in_by: String,
}

impl PackageDraft {
    pub(crate) fn into_record(self, id: PackageRecordId, checked_in_at_ms: TimestampMs) -> Package {
        Package {
            id,
            package_id: self.package_id,
            description: self.description,
            color: self.color,
            size: self.size,
            notes: self.notes,
            resident_id: self.resident_id,
            storage_location_id: self.storage_location_id,
            status: PackageStatus::CheckedIn,
            checked_in_at_ms,
            checked_in_by: self.checked_in_by,
            checked_out_at_ms: None,
            checked_out_by: None,
        }
    }
}

/// Sparse patch where each `Some` field overwrites the package value.
///
/// Every field of one patch is applied in a single write.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackagePatch {
    /// Replacement status.
    pub status: Option<PackageStatus>,
    /// Replacement check-out time.
    pub checked_out_at_ms: Option<TimestampMs>,
    /// Replacement check-out operator.
    pub checked_out_by: Option<String>,
}

impl PackagePatch {
    /// The check-out write: status, time, and operator together.
    pub fn check_out(at_ms: TimestampMs, by: impl Into<String>) -> Self {
        Self {
            status: Some(PackageStatus::CheckedOut),
            checked_out_at_ms: Some(at_ms),
            checked_out_by: Some(by.into()),
        }
    }

    /// Applies this patch in place to `rec`.
    pub fn apply_to(&self, rec: &mut Package) {
        if let Some(v) = self.status {
            rec.status = v;
        }
        if let Some(v) = self.checked_out_at_ms {
            rec.checked_out_at_ms = Some(v);
        }
        if let Some(v) = &self.checked_out_by {
            rec.checked_out_by = Some(v.clone());
        }
    }
}

/// Package row joined with its resident and storage location names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageView {
    /// The stored package.
    pub package: Package,
    /// Owning resident's name, if the resident still exists.
    pub resident_name: Option<String>,
    /// Owning resident's house number, if the resident still exists.
    pub resident_house_number: Option<String>,
    /// Storage location name, if the location still exists.
    pub location_name: Option<String>,
}

/// Filter for package selects. Results are always newest check-in first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageQuery {
    /// Only packages in this state.
    pub status: Option<PackageStatus>,
    /// Only packages owned by this resident.
    pub resident_id: Option<ResidentId>,
    /// Maximum number of rows.
    pub limit: Option<usize>,
}

impl PackageQuery {
    /// True when `pkg` passes the status and resident filters.
    pub fn matches(&self, pkg: &Package) -> bool {
        self.status.is_none_or(|s| s == pkg.status)
            && self.resident_id.is_none_or(|r| r == pkg.resident_id)
    }
}
