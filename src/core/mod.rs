//! In-memory backend and index helpers.

/// Helper index aliases.
pub mod indices;
/// In-memory implementation of [`crate::persist::Backend`].
pub mod store;
