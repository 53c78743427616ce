use std::sync::Arc;

use super::mapper::EntityFieldMapper;
use super::types::{EntityDescriptor, FieldType};
use crate::errors::{DslError, Result};

/// Outcome of walking a dotted field path.
#[derive(Debug, Clone)]
pub struct ResolvedField {
    /// Terminal type; list fields resolve to their element type.
    pub leaf: FieldType,
    /// The type that declares the last segment.
    pub parent: Arc<EntityDescriptor>,
    pub storage_path: String,
}

/// Walk `path` segment by segment, descending through object and list types.
///
/// # Errors
/// Fails when a segment is unknown or a non-object type is dereferenced.
pub fn resolve_field_path(
    mapper: &dyn EntityFieldMapper,
    root: &Arc<EntityDescriptor>,
    path: &str,
) -> Result<ResolvedField> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut parent = Arc::clone(root);
    let mut storage = Vec::with_capacity(segments.len());
    for (i, seg) in segments.iter().enumerate() {
        let ty = mapper.element_type(&parent, seg)?;
        storage.push(mapper.storage_name(&parent, seg)?);
        let Some(next) = segments.get(i + 1) else {
            return Ok(ResolvedField { leaf: ty, parent, storage_path: storage.join(".") });
        };
        match ty {
            FieldType::Object(desc) => parent = desc,
            other => {
                return Err(DslError::params(format!(
                    "Cannot find field '{next}' in class {other}"
                )));
            }
        }
    }
    Err(DslError::params(format!("Cannot resolve field path '{path}'")))
}

/// Storage path for a dotted logical path.
///
/// # Errors
/// See [`resolve_field_path`].
pub fn storage_path(
    mapper: &dyn EntityFieldMapper,
    root: &Arc<EntityDescriptor>,
    path: &str,
) -> Result<String> {
    resolve_field_path(mapper, root, path).map(|r| r.storage_path)
}

/// Logical path for a dotted storage path; `None` when any segment is unknown.
pub fn logical_path(
    mapper: &dyn EntityFieldMapper,
    root: &Arc<EntityDescriptor>,
    storage_path: &str,
) -> Option<String> {
    let mut current = Arc::clone(root);
    let mut out = Vec::new();
    let mut segments = storage_path.split('.').peekable();
    while let Some(seg) = segments.next() {
        let name = mapper.logical_name(&current, seg)?;
        if segments.peek().is_some() {
            match mapper.element_type(&current, &name).ok()? {
                FieldType::Object(desc) => current = desc,
                _ => return None,
            }
        }
        out.push(name);
    }
    Some(out.join("."))
}
