//! Field metadata providers: one capability trait, one adapter per store.

use bson::{Bson, Document as BsonDocument};

use super::types::{EntityDescriptor, FieldDef, FieldType};
use crate::errors::{DslError, Result};

/// Resolves field names and types of an entity descriptor.
pub trait EntityFieldMapper: Send + Sync {
    /// Declared type of `field` on `ty`.
    ///
    /// # Errors
    /// Unknown fields fail; the error kind depends on the adapter.
    fn field_type(&self, ty: &EntityDescriptor, field: &str) -> Result<FieldType>;

    /// Like [`field_type`](Self::field_type) but unwraps list wrappers.
    ///
    /// # Errors
    /// Same as [`field_type`](Self::field_type).
    fn element_type(&self, ty: &EntityDescriptor, field: &str) -> Result<FieldType> {
        Ok(self.field_type(ty, field)?.element().clone())
    }

    /// Name of `field` as written in storage.
    ///
    /// # Errors
    /// Same as [`field_type`](Self::field_type).
    fn storage_name(&self, ty: &EntityDescriptor, field: &str) -> Result<String>;

    /// Logical name for a storage name, when one is declared.
    fn logical_name(&self, ty: &EntityDescriptor, storage_name: &str) -> Option<String>;

    /// # Errors
    /// ENTITY_ERROR when the type declares no id field.
    fn id_field_name(&self, ty: &EntityDescriptor) -> Result<String> {
        ty.id_field
            .clone()
            .ok_or_else(|| DslError::entity(format!("No id field annotated on {}", ty.name)))
    }

    /// # Errors
    /// ENTITY_ERROR when the type declares no id field.
    fn id_field_type(&self, ty: &EntityDescriptor) -> Result<FieldType> {
        let id = self.id_field_name(ty)?;
        self.field_type(ty, &id)
    }

    /// The id of a serialized instance; `None` when absent or null.
    ///
    /// # Errors
    /// ENTITY_ERROR when the type declares no id field.
    fn id_value(&self, ty: &EntityDescriptor, instance: &BsonDocument) -> Result<Option<Bson>> {
        let id = self.id_field_name(ty)?;
        let storage = self.storage_name(ty, &id)?;
        Ok(instance.get(&storage).filter(|v| !matches!(v, Bson::Null)).cloned())
    }
}

fn lookup<'a>(ty: &'a EntityDescriptor, field: &str) -> Option<&'a FieldDef> {
    ty.get_field(field)
}

/// Adapter for the embedded document store: honours declared storage names.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentFieldMapper;

impl EntityFieldMapper for DocumentFieldMapper {
    fn field_type(&self, ty: &EntityDescriptor, field: &str) -> Result<FieldType> {
        lookup(ty, field).map(|f| f.ty.clone()).ok_or_else(|| {
            DslError::params(format!("Cannot find field '{field}' in class {}", ty.name))
        })
    }

    fn storage_name(&self, ty: &EntityDescriptor, field: &str) -> Result<String> {
        lookup(ty, field).map(|f| f.storage_name.clone()).ok_or_else(|| {
            DslError::params(format!("Cannot find field '{field}' in class {}", ty.name))
        })
    }

    fn logical_name(&self, ty: &EntityDescriptor, storage_name: &str) -> Option<String> {
        ty.field_by_storage(storage_name).map(|f| f.name.clone())
    }
}

/// Store-agnostic adapter: storage names equal logical names.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericFieldMapper;

impl EntityFieldMapper for GenericFieldMapper {
    fn field_type(&self, ty: &EntityDescriptor, field: &str) -> Result<FieldType> {
        lookup(ty, field).map(|f| f.ty.clone()).ok_or_else(|| {
            DslError::entity(format!("Cannot find field '{field}' in class {}", ty.name))
        })
    }

    fn storage_name(&self, ty: &EntityDescriptor, field: &str) -> Result<String> {
        self.field_type(ty, field).map(|_| field.to_string())
    }

    fn logical_name(&self, ty: &EntityDescriptor, storage_name: &str) -> Option<String> {
        lookup(ty, storage_name).map(|f| f.name.clone())
    }
}
