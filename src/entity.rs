//! Entities: serde types with a static schema descriptor.

use bson::Document as BsonDocument;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::Result;
use crate::schema::EntityDescriptor;

/// A persisted type. The id field is expected to serialize as `_id`
/// (`#[serde(rename = "_id")]`); fields absent from a projection must
/// tolerate being missing (`#[serde(default)]`).
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn descriptor() -> EntityDescriptor;
}

/// Serialize an entity into its stored document.
///
/// # Errors
/// Returns a bson error when the entity cannot be represented as a document.
pub fn to_document<E: Entity>(entity: &E) -> Result<BsonDocument> {
    Ok(bson::serialize_to_document(entity)?)
}

/// Rebuild an entity from a stored (possibly projected) document.
///
/// # Errors
/// Returns a bson error when required fields are missing or mistyped.
pub fn from_document<E: Entity>(doc: BsonDocument) -> Result<E> {
    Ok(bson::deserialize_from_document(doc)?)
}
