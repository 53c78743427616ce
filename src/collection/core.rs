use bson::Document as BsonDocument;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use crate::index::{IndexKeyKind, IndexManager};

/// Documents keyed by insertion sequence, with an `_id` lookup table and the
/// collection's index set, all behind one lock.
#[derive(Debug, Default)]
pub(crate) struct Store {
    pub(crate) docs: BTreeMap<u64, BsonDocument>,
    pub(crate) ids: HashMap<IndexKeyKind, u64>,
    pub(crate) next_seq: u64,
    pub(crate) indexes: IndexManager,
}

#[derive(Debug)]
pub struct Collection {
    name: String,
    pub(crate) store: RwLock<Store>,
}

impl Collection {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), store: RwLock::new(Store::default()) }
    }

    #[must_use]
    pub fn name_str(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.read().docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all documents in insertion order.
    #[must_use]
    pub fn documents(&self) -> Vec<BsonDocument> {
        self.store.read().docs.values().cloned().collect()
    }
}
