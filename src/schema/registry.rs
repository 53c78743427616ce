//! Process-wide per-entity-type metadata, computed once per type.
//!
//! The map lock is held only long enough to hand out the per-type cell; the
//! (possibly slow) initializer runs on that cell, so unrelated types never
//! wait on each other.

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use super::index_info::EntityIndexInfo;
use super::mapper::EntityFieldMapper;
use super::types::{EntityDescriptor, FieldType};
use crate::entity::Entity;
use crate::errors::Result;

/// Compute-once table keyed by type.
pub struct TypeCache<V> {
    cells: RwLock<HashMap<TypeId, Arc<OnceCell<Arc<V>>>>>,
}

impl<V> Default for TypeCache<V> {
    fn default() -> Self {
        Self { cells: RwLock::new(HashMap::new()) }
    }
}

impl<V> TypeCache<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, key: TypeId) -> Arc<OnceCell<Arc<V>>> {
        if let Some(c) = self.cells.read().get(&key) {
            return Arc::clone(c);
        }
        Arc::clone(self.cells.write().entry(key).or_default())
    }

    pub fn get_or_init<F: FnOnce() -> V>(&self, key: TypeId, init: F) -> Arc<V> {
        Arc::clone(self.cell(key).get_or_init(|| Arc::new(init())))
    }

    /// Value for `key`, running `init` at most once per key on success.
    ///
    /// # Errors
    /// Propagates the initializer's error; a later call retries.
    pub fn get_or_try_init<F>(&self, key: TypeId, init: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        let cell = self.cell(key);
        cell.get_or_try_init(|| init().map(Arc::new)).cloned()
    }

    #[must_use]
    pub fn get(&self, key: TypeId) -> Option<Arc<V>> {
        self.cells.read().get(&key).and_then(|c| c.get().cloned())
    }
}

/// Identifier metadata of an entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub id_field: String,
    pub id_storage_name: String,
    pub id_type: FieldType,
}

static DESCRIPTORS: LazyLock<TypeCache<EntityDescriptor>> = LazyLock::new(TypeCache::new);
static INDEX_INFO: LazyLock<TypeCache<EntityIndexInfo>> = LazyLock::new(TypeCache::new);

/// Shared descriptor of `E`.
#[must_use]
pub fn descriptor_of<E: Entity>() -> Arc<EntityDescriptor> {
    DESCRIPTORS.get_or_init(TypeId::of::<E>(), E::descriptor)
}

/// Identifier metadata of `E` as seen through `mapper`. Not cached: the
/// storage name of the id differs between mappers.
///
/// # Errors
/// ENTITY_ERROR when `E` declares no id field.
pub fn entity_info<E: Entity>(mapper: &dyn EntityFieldMapper) -> Result<EntityInfo> {
    let desc = descriptor_of::<E>();
    let id_field = mapper.id_field_name(&desc)?;
    Ok(EntityInfo {
        id_storage_name: mapper.storage_name(&desc, &id_field)?,
        id_type: mapper.id_field_type(&desc)?,
        id_field,
    })
}

/// Index metadata of `E`, built by `init` on first use.
///
/// # Errors
/// Propagates the initializer's error.
pub fn index_info<E: Entity, F>(init: F) -> Result<Arc<EntityIndexInfo>>
where
    F: FnOnce() -> Result<EntityIndexInfo>,
{
    INDEX_INFO.get_or_try_init(TypeId::of::<E>(), init)
}
