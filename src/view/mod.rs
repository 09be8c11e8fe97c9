//! Cached views over the record store and the operations staff run on them.

/// Snapshot cache of the three tables.
pub mod cache;
/// Check-in screen state.
pub mod checkin;
/// Check-out screen state.
pub mod checkout;
/// Check-in and check-out writes.
pub mod coordinator;
/// Derived package lists.
pub mod filter;
/// Live package refresh task.
pub mod listener;
/// Resident directory management.
pub mod residents;
/// Record store contract.
pub mod traits;
/// Forms and field validation.
pub mod validate;
