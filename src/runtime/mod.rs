//! Single-writer record store runtime and its change feeds.

/// Change events and subscriptions.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
