use hashbrown::HashMap;

use crate::types::PackageRecordId;

/// Secondary index from a key to package ids in insertion order.
pub type VecIndex<K> = HashMap<K, Vec<PackageRecordId>>;
