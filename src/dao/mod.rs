//! Data access: validation, translation and execution of service queries.

pub mod counting;
pub mod document_dao;
pub mod translate;
pub mod validate;

use bson::Bson;
use std::collections::BTreeMap;

use crate::dsl::{ServiceQuery, ServiceQueryInfo};
use crate::errors::Result;
use crate::query::UpdateDoc;
use crate::results::EntityResult;

pub use counting::total_items;
pub use document_dao::DocumentServiceDao;
pub use translate::{predicate, to_filter, to_find_options};
pub use validate::{is_safe, validate};

/// Read side of a data-access object.
pub trait ServiceDao<E>: Send + Sync {
    /// # Errors
    /// Validation, translation or storage failures.
    fn get(&self, query: &ServiceQuery) -> Result<EntityResult<E>>;

    /// First match under the query's order and projection.
    ///
    /// # Errors
    /// Same as [`get`](Self::get).
    fn get_one(&self, query: &ServiceQuery) -> Result<Option<E>>;

    /// # Errors
    /// Same as [`get`](Self::get).
    fn count(&self, query: &ServiceQuery) -> Result<u64>;

    /// # Errors
    /// QUERY_ERROR for unsafe or inconsistent queries.
    fn validate_query(&self, query: &ServiceQuery) -> Result<()>;

    fn describe(&self, query: &ServiceQuery) -> ServiceQueryInfo;
}

/// Reads plus delete by id.
pub trait BaseServiceDao<E>: ServiceDao<E> {
    /// Number of deleted entities, 0 or 1.
    ///
    /// # Errors
    /// Storage failures.
    fn delete_by_id(&self, id: &Bson) -> Result<u64>;
}

/// All write operations.
pub trait PersistentServiceDao<E>: BaseServiceDao<E> {
    /// Upsert by id; returns the entity as stored.
    ///
    /// # Errors
    /// DUPLICATE_KEY on unique index collisions; listener rejections.
    fn save(&self, entity: E) -> Result<E>;

    /// Apply `changes` (logical field → value, `Null` unsets) to the first
    /// match and return it as updated.
    ///
    /// # Errors
    /// DUPLICATE_KEY on unique index collisions; listener rejections.
    fn patch(&self, query: &ServiceQuery, changes: &BTreeMap<String, Bson>) -> Result<Option<E>>;

    /// # Errors
    /// QUERY_ERROR when the query has neither ids nor criteria.
    fn delete(&self, query: &ServiceQuery) -> Result<u64>;
}

/// Hooks run before writes; returning an error aborts the write.
pub trait EntityLifecycleListener<E>: Send + Sync {
    /// # Errors
    /// Rejects the save.
    fn pre_persist(&self, _entity: &mut E) -> Result<()> {
        Ok(())
    }

    /// May add operations to `update`.
    ///
    /// # Errors
    /// Rejects the update.
    fn pre_update(&self, _query: &ServiceQuery, _update: &mut UpdateDoc) -> Result<()> {
        Ok(())
    }

    /// # Errors
    /// Rejects the delete.
    fn pre_delete(&self, _query: &ServiceQuery) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpListener;

impl<E> EntityLifecycleListener<E> for NoOpListener {}
