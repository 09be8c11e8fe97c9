//! Shared primitive IDs, table names, and package status.

use std::{
    fmt,
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

/// Store-assigned resident identifier.
pub type ResidentId = u64;
/// Store-assigned storage location identifier.
pub type StorageLocationId = u64;
/// Store-assigned package record identifier (not the printed package id).
pub type PackageRecordId = u64;
/// Milliseconds since the Unix epoch.
pub type TimestampMs = u64;

/// One of the three tables held by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Resident directory.
    Residents,
    /// Physical shelves and bins.
    StorageLocations,
    /// Tracked packages.
    Packages,
}

impl Table {
    /// Every table, in dependency order.
    pub const ALL: [Table; 3] = [Table::Residents, Table::StorageLocations, Table::Packages];

    /// SQL table name.
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Residents => "residents",
            Table::StorageLocations => "storage_locations",
            Table::Packages => "packages",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package lifecycle state. Only `CheckedIn -> CheckedOut` is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    /// Sitting in storage, available for pickup.
    CheckedIn,
    /// Handed over to the resident.
    CheckedOut,
}

impl PackageStatus {
    /// Wire/storage spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            PackageStatus::CheckedIn => "checked_in",
            PackageStatus::CheckedOut => "checked_out",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checked_in" => Ok(PackageStatus::CheckedIn),
            "checked_out" => Ok(PackageStatus::CheckedOut),
            other => Err(format!("unknown package status: {other}")),
        }
    }
}

/// Current wall-clock time in milliseconds.
pub fn now_ms() -> TimestampMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
