use bson::Document as BsonDocument;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::collection::Collection;
use crate::errors::{DslError, Result};
use crate::index::IndexDescriptor;
use crate::query::{Filter, FindOptions, UpdateDoc, count_docs, find_docs};
use crate::session::StorageSession;

fn as_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// The embedded in-memory engine: a named set of collections.
#[derive(Debug, Default)]
pub struct Engine {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the collection `name`.
    pub fn create_collection(&self, name: &str) -> Arc<Collection> {
        if let Some(c) = self.collections.read().get(name) {
            return Arc::clone(c);
        }
        let mut map = self.collections.write();
        Arc::clone(map.entry(name.to_string()).or_insert_with(|| {
            log::debug!("creating collection '{name}'");
            Arc::new(Collection::new(name))
        }))
    }

    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    pub fn drop_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }

    #[must_use]
    pub fn list_collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn collection(&self, name: &str) -> Result<Arc<Collection>> {
        self.get_collection(name).ok_or_else(|| DslError::NoSuchCollection(name.to_string()))
    }
}

impl StorageSession for Engine {
    fn ensure_collection(&self, name: &str, indexes: &[IndexDescriptor]) -> Result<()> {
        let col = self.create_collection(name);
        for desc in indexes {
            col.create_index(desc.clone())?;
        }
        Ok(())
    }

    fn index_descriptors(&self, collection: &str) -> Result<Vec<IndexDescriptor>> {
        Ok(self.collection(collection)?.index_descriptors())
    }

    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        opts: &FindOptions,
    ) -> Result<Vec<BsonDocument>> {
        let col = self.collection(collection)?;
        Ok(find_docs(&col, filter, opts))
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let col = self.collection(collection)?;
        Ok(as_u64(count_docs(&col, filter)))
    }

    fn save(&self, collection: &str, doc: BsonDocument) -> Result<bool> {
        self.collection(collection)?.upsert(doc)
    }

    fn update_first(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> Result<Option<BsonDocument>> {
        self.collection(collection)?.update_first(filter, update)
    }

    fn delete(&self, collection: &str, filter: &Filter, just_one: bool) -> Result<u64> {
        Ok(as_u64(self.collection(collection)?.delete_where(filter, just_one)))
    }
}
