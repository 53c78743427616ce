use super::core::Collection;
use crate::errors::Result;
use crate::index::{IndexDescriptor, key_from_bson};

impl Collection {
    /// Create an index and build it over the current documents.
    /// Returns false when an index with the same name already exists.
    ///
    /// # Errors
    /// DUPLICATE_KEY when current documents violate a new unique index.
    pub fn create_index(&self, desc: IndexDescriptor) -> Result<bool> {
        let name = desc.name.clone();
        let mut guard = self.store.write();
        let store = &mut *guard;
        let docs =
            store.docs.values().filter_map(|d| d.get("_id").map(|id| (key_from_bson(id), d)));
        let created = store.indexes.create_index(desc, docs)?;
        drop(guard);
        if created {
            log::info!("created index '{name}' on collection '{}'", self.name_str());
        }
        Ok(created)
    }

    pub fn drop_index(&self, name: &str) -> bool {
        self.store.write().indexes.drop_index(name)
    }

    #[must_use]
    pub fn index_descriptors(&self) -> Vec<IndexDescriptor> {
        self.store.read().indexes.descriptors().to_vec()
    }
}
