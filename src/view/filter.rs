//! Derived package lists. Pure functions over a cache snapshot.

use crate::{
    records::PackageView,
    types::{PackageStatus, ResidentId},
};

/// Packages still in storage for `resident_id`, in snapshot order.
pub fn available_packages(resident_id: ResidentId, packages: &[PackageView]) -> Vec<PackageView> {
    packages
        .iter()
        .filter(|p| p.package.resident_id == resident_id && p.package.status == PackageStatus::CheckedIn)
        .cloned()
        .collect()
}

/// Checked-out packages, most recent check-out first, at most `limit`.
pub fn recent_check_outs(packages: &[PackageView], limit: usize) -> Vec<PackageView> {
    let mut out: Vec<PackageView> = packages
        .iter()
        .filter(|p| p.package.status == PackageStatus::CheckedOut)
        .cloned()
        .collect();
    // Stable, so equal timestamps keep snapshot order.
    out.sort_by(|a, b| b.package.checked_out_at_ms.cmp(&a.package.checked_out_at_ms));
    out.truncate(limit);
    out
}
