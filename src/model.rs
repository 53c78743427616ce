//! Service models: the layer between resources and data-access objects.

use bson::{Bson, Document as BsonDocument};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dao::{BaseServiceDao, PersistentServiceDao};
use crate::dsl::{PatchContext, ServiceQuery, ServiceQueryInfo};
use crate::entity::{Entity, to_document};
use crate::errors::{DslError, Result};
use crate::results::EntityResult;
use crate::schema::{DocumentFieldMapper, EntityDescriptor, EntityFieldMapper, descriptor_of};

/// Read access plus delete by id.
pub struct BaseServiceModel<E> {
    dao: Arc<dyn BaseServiceDao<E>>,
}

impl<E: Entity> BaseServiceModel<E> {
    #[must_use]
    pub fn new(dao: Arc<dyn BaseServiceDao<E>>) -> Self {
        Self { dao }
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn get(&self, query: &ServiceQuery) -> Result<EntityResult<E>> {
        self.dao.get(query)
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn get_by_id(&self, id: impl Into<Bson>) -> Result<Option<E>> {
        self.dao.get_one(&ServiceQuery::by_id(id)?)
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn get_one(&self, query: &ServiceQuery) -> Result<Option<E>> {
        self.dao.get_one(query)
    }

    #[must_use]
    pub fn describe(&self, query: &ServiceQuery) -> ServiceQueryInfo {
        self.dao.describe(query)
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn delete_by_id(&self, id: impl Into<Bson>) -> Result<u64> {
        self.dao.delete_by_id(&id.into())
    }
}

/// Full read/write model over a persistent dao.
pub struct ServiceModel<E> {
    dao: Arc<dyn PersistentServiceDao<E>>,
    mapper: Arc<dyn EntityFieldMapper>,
    descriptor: Arc<EntityDescriptor>,
}

impl<E: Entity> ServiceModel<E> {
    #[must_use]
    pub fn new(dao: Arc<dyn PersistentServiceDao<E>>) -> Self {
        Self::with_mapper(dao, Arc::new(DocumentFieldMapper))
    }

    /// `mapper` must match the one the dao was built with.
    #[must_use]
    pub fn with_mapper(dao: Arc<dyn PersistentServiceDao<E>>, mapper: Arc<dyn EntityFieldMapper>) -> Self {
        Self { dao, mapper, descriptor: descriptor_of::<E>() }
    }

    #[must_use]
    pub fn field_mapper(&self) -> &dyn EntityFieldMapper {
        self.mapper.as_ref()
    }

    #[must_use]
    pub fn descriptor(&self) -> &Arc<EntityDescriptor> {
        &self.descriptor
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn get(&self, query: &ServiceQuery) -> Result<EntityResult<E>> {
        self.dao.get(query)
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn get_one(&self, query: &ServiceQuery) -> Result<Option<E>> {
        self.dao.get_one(query)
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn get_by_id(&self, id: impl Into<Bson>) -> Result<Option<E>> {
        self.dao.get_one(&ServiceQuery::by_id(id)?)
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn count(&self, query: &ServiceQuery) -> Result<u64> {
        self.dao.count(query)
    }

    #[must_use]
    pub fn describe(&self, query: &ServiceQuery) -> ServiceQueryInfo {
        self.dao.describe(query)
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn save(&self, entity: E) -> Result<E> {
        self.dao.save(entity)
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn delete(&self, query: &ServiceQuery) -> Result<u64> {
        self.dao.delete(query)
    }

    /// # Errors
    /// Propagates dao failures.
    pub fn delete_by_id(&self, id: impl Into<Bson>) -> Result<u64> {
        self.dao.delete_by_id(&id.into())
    }

    /// Write the non-null fields of `entity` that differ from the stored
    /// version, and unset the fields named in `context`.
    ///
    /// Returns `None` when no entity with that id exists, and the stored
    /// entity untouched when nothing changed.
    ///
    /// # Errors
    /// ENTITY_ERROR when `entity` has no id; PARAMS_ERROR when a field is both
    /// patched and unset; dao failures.
    pub fn patch(&self, entity: &E, context: &PatchContext) -> Result<Option<E>> {
        let doc = to_document(entity)?;
        let Some(id) = self.mapper.id_value(&self.descriptor, &doc)? else {
            return Err(DslError::entity("Id must be provided when patching an entity, but was null"));
        };
        let by_id = ServiceQuery::by_id(id)?;
        let Some(stored) = self.dao.get_one(&by_id)? else {
            log::debug!("patch target {by_id} not found");
            return Ok(None);
        };

        let mut changes = self.diff(&to_document(&stored)?, doc)?;
        for field in context.unset_fields() {
            if changes.contains_key(field) {
                return Err(DslError::params(format!(
                    "Patched field '{field}' is also requested to be unset"
                )));
            }
            changes.insert(field.clone(), Bson::Null);
        }
        if changes.is_empty() {
            return Ok(Some(stored));
        }
        self.dao.patch(&by_id, &changes)
    }

    /// Top-level fields of `patch` that are set and differ from `stored`,
    /// keyed by logical name.
    fn diff(&self, stored: &BsonDocument, patch: BsonDocument) -> Result<BTreeMap<String, Bson>> {
        let id_field = self.mapper.id_field_name(&self.descriptor)?;
        let id_storage = self.mapper.storage_name(&self.descriptor, &id_field)?;
        Ok(patch
            .into_iter()
            .filter(|(key, value)| {
                *key != id_storage && !matches!(value, Bson::Null) && stored.get(key) != Some(value)
            })
            .map(|(key, value)| {
                let name = self.mapper.logical_name(&self.descriptor, &key).unwrap_or(key);
                (name, value)
            })
            .collect())
    }
}
