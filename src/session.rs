//! The storage contract the data-access layer executes against.

use bson::Document as BsonDocument;

use crate::errors::Result;
use crate::index::IndexDescriptor;
use crate::query::{Filter, FindOptions, UpdateDoc};

/// A document store session. Paths in filters, sort specs and projections are
/// storage paths.
pub trait StorageSession: Send + Sync {
    /// Create `name` if missing and make sure `indexes` exist on it.
    ///
    /// # Errors
    /// DUPLICATE_KEY when existing data violates a new unique index.
    fn ensure_collection(&self, name: &str, indexes: &[IndexDescriptor]) -> Result<()>;

    /// # Errors
    /// Fails for unknown collections.
    fn index_descriptors(&self, collection: &str) -> Result<Vec<IndexDescriptor>>;

    /// # Errors
    /// Fails for unknown collections.
    fn find(&self, collection: &str, filter: &Filter, opts: &FindOptions)
    -> Result<Vec<BsonDocument>>;

    /// # Errors
    /// Fails for unknown collections.
    fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Upsert by `_id`; true when a new document was inserted.
    ///
    /// # Errors
    /// DUPLICATE_KEY on unique collisions.
    fn save(&self, collection: &str, doc: BsonDocument) -> Result<bool>;

    /// Update the first match and return it as stored afterwards.
    ///
    /// # Errors
    /// DUPLICATE_KEY on unique collisions.
    fn update_first(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDoc,
    ) -> Result<Option<BsonDocument>>;

    /// # Errors
    /// Fails for unknown collections.
    fn delete(&self, collection: &str, filter: &Filter, just_one: bool) -> Result<u64>;
}
