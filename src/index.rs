//! Storage-side index metadata and unique-constraint enforcement.

use bson::{Bson, Document as BsonDocument};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{DslError, Result};

/// Name of the implicit index on `_id`.
pub const ID_INDEX_NAME: &str = "_id_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexDirection {
    Asc,
    Desc,
    Hashed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    pub path: String,
    pub direction: IndexDirection,
}

impl IndexKey {
    #[must_use]
    pub fn asc(path: &str) -> Self {
        Self { path: path.to_string(), direction: IndexDirection::Asc }
    }

    #[must_use]
    pub fn desc(path: &str) -> Self {
        Self { path: path.to_string(), direction: IndexDirection::Desc }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub keys: Vec<IndexKey>,
    pub unique: bool,
}

impl IndexDescriptor {
    #[must_use]
    pub fn new(name: &str, keys: Vec<IndexKey>, unique: bool) -> Self {
        Self { name: name.to_string(), keys, unique }
    }

    /// Descriptor named after its keys, e.g. `nick_1_rating_-1`.
    #[must_use]
    pub fn from_keys(keys: Vec<IndexKey>, unique: bool) -> Self {
        let name = keys
            .iter()
            .map(|k| {
                let dir = match k.direction {
                    IndexDirection::Asc => "1",
                    IndexDirection::Desc => "-1",
                    IndexDirection::Hashed => "hashed",
                };
                format!("{}_{dir}", k.path)
            })
            .collect::<Vec<_>>()
            .join("_");
        Self { name, keys, unique }
    }
}

/// Hashable, totally ordered projection of a bson value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKeyKind {
    Null,
    Bool(bool),
    I64(i64),
    F64(OrderedFloat<f64>),
    Str(String),
    Date(i64),
    Oid([u8; 12]),
    Other(String),
}

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn key_from_bson(v: &Bson) -> IndexKeyKind {
    match v {
        Bson::Null => IndexKeyKind::Null,
        Bson::Boolean(b) => IndexKeyKind::Bool(*b),
        Bson::Int32(i) => IndexKeyKind::I64(i64::from(*i)),
        Bson::Int64(i) => IndexKeyKind::I64(*i),
        Bson::Double(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            IndexKeyKind::I64(*f as i64)
        }
        Bson::Double(f) => IndexKeyKind::F64(OrderedFloat(*f)),
        Bson::String(s) => IndexKeyKind::Str(s.clone()),
        Bson::DateTime(d) => IndexKeyKind::Date(d.timestamp_millis()),
        Bson::ObjectId(o) => IndexKeyKind::Oid(o.bytes()),
        other => IndexKeyKind::Other(other.to_string()),
    }
}

/// Value at a dotted path, descending through sub-documents only.
#[must_use]
pub fn value_at<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut cur = doc.get(first)?;
    for p in parts {
        match cur {
            Bson::Document(d) => cur = d.get(p)?,
            _ => return None,
        }
    }
    Some(cur)
}

fn compound_key(desc: &IndexDescriptor, doc: &BsonDocument) -> Vec<IndexKeyKind> {
    desc.keys
        .iter()
        .map(|k| value_at(doc, &k.path).map_or(IndexKeyKind::Null, key_from_bson))
        .collect()
}

/// Declared indexes of one collection. Unique indexes keep a key → owner map.
#[derive(Debug)]
pub struct IndexManager {
    descriptors: Vec<IndexDescriptor>,
    unique: HashMap<String, HashMap<Vec<IndexKeyKind>, IndexKeyKind>>,
}

impl Default for IndexManager {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptors: vec![IndexDescriptor::new(
                ID_INDEX_NAME,
                vec![IndexKey::asc("_id")],
                true,
            )],
            unique: HashMap::new(),
        }
    }

    #[must_use]
    pub fn descriptors(&self) -> &[IndexDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn has_index(&self, name: &str) -> bool {
        self.descriptors.iter().any(|d| d.name == name)
    }

    /// Add an index and build it over `docs` (`(id key, doc)` pairs).
    /// Returns false when an index of that name already exists.
    ///
    /// # Errors
    /// DUPLICATE_KEY when existing documents violate a new unique index.
    pub fn create_index<'a>(
        &mut self,
        desc: IndexDescriptor,
        docs: impl IntoIterator<Item = (IndexKeyKind, &'a BsonDocument)>,
    ) -> Result<bool> {
        if self.has_index(&desc.name) {
            return Ok(false);
        }
        if desc.unique {
            let mut owners = HashMap::new();
            for (id, doc) in docs {
                let key = compound_key(&desc, doc);
                if owners.insert(key.clone(), id).is_some() {
                    return Err(duplicate(&desc.name, &key));
                }
            }
            self.unique.insert(desc.name.clone(), owners);
        }
        self.descriptors.push(desc);
        Ok(true)
    }

    pub fn drop_index(&mut self, name: &str) -> bool {
        if name == ID_INDEX_NAME {
            return false;
        }
        self.unique.remove(name);
        let before = self.descriptors.len();
        self.descriptors.retain(|d| d.name != name);
        before != self.descriptors.len()
    }

    /// Verify `doc` (owned by `id`) would not collide with another document.
    ///
    /// # Errors
    /// DUPLICATE_KEY naming the violated index.
    pub fn check(&self, doc: &BsonDocument, id: &IndexKeyKind) -> Result<()> {
        for desc in self.descriptors.iter().filter(|d| self.unique.contains_key(&d.name)) {
            let key = compound_key(desc, doc);
            if let Some(owner) = self.unique.get(&desc.name).and_then(|m| m.get(&key))
                && owner != id
            {
                return Err(duplicate(&desc.name, &key));
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, doc: &BsonDocument, id: &IndexKeyKind) {
        for desc in &self.descriptors {
            if let Some(map) = self.unique.get_mut(&desc.name) {
                map.insert(compound_key(desc, doc), id.clone());
            }
        }
    }

    pub fn remove(&mut self, doc: &BsonDocument, id: &IndexKeyKind) {
        for desc in &self.descriptors {
            if let Some(map) = self.unique.get_mut(&desc.name) {
                let key = compound_key(desc, doc);
                if map.get(&key) == Some(id) {
                    map.remove(&key);
                }
            }
        }
    }
}

fn duplicate(index: &str, key: &[IndexKeyKind]) -> DslError {
    DslError::DuplicateKey(format!("index '{index}' already contains key {key:?}"))
}
