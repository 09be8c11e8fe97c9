//! Package room tracking: residents, storage locations, and packages kept in a
//! shared record store, with cached views that stay consistent across staff
//! terminals by re-reading the store on every change notification.
//!
//! # Examples
//!
//! Check a package in and out against the in-memory backend:
//! ```
//! use std::sync::Arc;
//!
//! use parceldesk::{
//!     config::TrackerConfig,
//!     records::ResidentDraft,
//!     runtime::handle::open_record_store,
//!     view::{
//!         cache::ViewCache,
//!         checkout::CheckOutView,
//!         coordinator::MutationCoordinator,
//!         traits::RecordStore,
//!         validate::CheckInRequest,
//!     },
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = TrackerConfig::default();
//! let store = open_record_store(&config.store).expect("open store");
//! let jane = store
//!     .insert_resident(ResidentDraft {
//!         name: "Jane Doe".to_string(),
//!         house_number: "A-101".to_string(),
//!         ..ResidentDraft::default()
//!     })
//!     .await
//!     .expect("resident");
//! let shelf = store.insert_storage_location("Shelf-3").await.expect("location");
//!
//! let cache = Arc::new(ViewCache::new(store.clone()));
//! let coordinator = MutationCoordinator::new(Arc::clone(&cache), config.view.clone());
//! let mut view = CheckOutView::enter(coordinator.clone()).await;
//!
//! let receipt = coordinator
//!     .check_in(&CheckInRequest {
//!         package_id: "PKG-001".to_string(),
//!         resident_id: Some(jane.id),
//!         storage_location_id: Some(shelf.id),
//!         checked_in_by: "Alice".to_string(),
//!         ..CheckInRequest::default()
//!     })
//!     .await
//!     .expect("check in");
//! assert_eq!(view.select_resident(Some(jane.id)).len(), 1);
//!
//! let outcome = view.check_out(receipt.record_id(), "Bob").await.expect("check out");
//! assert!(outcome.available.is_empty());
//! view.exit().await;
//! # }
//! ```
#![deny(missing_docs)]

/// Runtime and view settings.
pub mod config;
/// In-memory backend and index helpers.
pub mod core;
/// Backend abstraction and SQLite implementation.
pub mod persist;
/// Resident, storage location, and package records.
pub mod records;
/// Single-writer record store runtime and change feeds.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;
/// Cached views, filters, and mutations.
pub mod view;
