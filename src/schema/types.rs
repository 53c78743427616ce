use std::fmt;
use std::sync::Arc;

/// Storage name reserved for the identifier field.
pub const ID_STORAGE_NAME: &str = "_id";

/// Declared type of an entity field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Long,
    Int,
    Double,
    Bool,
    /// Stored as a bson datetime.
    Date,
    ObjectId,
    /// Stored as hyphenated lowercase text.
    Uuid,
    /// Stored as the variant name.
    Enum(Vec<String>),
    Object(Arc<EntityDescriptor>),
    List(Box<FieldType>),
    /// Converted by a converter registered under this name.
    Custom(String),
}

impl FieldType {
    #[must_use]
    pub fn list_of(inner: Self) -> Self {
        Self::List(Box::new(inner))
    }

    #[must_use]
    pub fn object(descriptor: EntityDescriptor) -> Self {
        Self::Object(Arc::new(descriptor))
    }

    #[must_use]
    pub fn enumeration<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::Enum(names.into_iter().map(Into::into).collect())
    }

    /// The element type for lists, the type itself otherwise.
    #[must_use]
    pub fn element(&self) -> &Self {
        match self {
            Self::List(inner) => inner.element(),
            other => other,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("String"),
            Self::Long => f.write_str("Long"),
            Self::Int => f.write_str("Integer"),
            Self::Double => f.write_str("Double"),
            Self::Bool => f.write_str("Boolean"),
            Self::Date => f.write_str("Date"),
            Self::ObjectId => f.write_str("ObjectId"),
            Self::Uuid => f.write_str("UUID"),
            Self::Enum(_) => f.write_str("Enum"),
            Self::Object(d) => f.write_str(&d.name),
            Self::List(inner) => write!(f, "List<{inner}>"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub storage_name: String,
    pub ty: FieldType,
}

/// Direction of one declared index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrder {
    Asc,
    Desc,
}

/// An index declared on an entity, in logical field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub keys: Vec<(String, KeyOrder)>,
    pub unique: bool,
}

impl IndexSpec {
    /// Parse `["a", "-b"]` style key lists; a leading `-` marks a descending key.
    #[must_use]
    pub fn from_keys(keys: &[&str], unique: bool) -> Self {
        let keys = keys
            .iter()
            .map(|k| match k.strip_prefix('-') {
                Some(name) => (name.to_string(), KeyOrder::Desc),
                None => ((*k).to_string(), KeyOrder::Asc),
            })
            .collect();
        Self { keys, unique }
    }
}

/// Static description of an entity type: its fields, id and indexes.
///
/// Embedded types (used through [`FieldType::Object`]) carry no collection.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub name: String,
    pub collection: Option<String>,
    pub fields: Vec<FieldDef>,
    pub id_field: Option<String>,
    pub indexes: Vec<IndexSpec>,
}

impl EntityDescriptor {
    #[must_use]
    pub fn new(name: &str, collection: &str) -> Self {
        Self {
            name: name.to_string(),
            collection: Some(collection.to_string()),
            fields: Vec::new(),
            id_field: None,
            indexes: Vec::new(),
        }
    }

    #[must_use]
    pub fn embedded(name: &str) -> Self {
        Self {
            name: name.to_string(),
            collection: None,
            fields: Vec::new(),
            id_field: None,
            indexes: Vec::new(),
        }
    }

    /// Declare the identifier field; it is stored as `_id`.
    #[must_use]
    pub fn id(mut self, name: &str, ty: FieldType) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            storage_name: ID_STORAGE_NAME.to_string(),
            ty,
        });
        self.id_field = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn field(self, name: &str, ty: FieldType) -> Self {
        self.field_as(name, name, ty)
    }

    /// Declare a field whose storage name differs from its logical name.
    #[must_use]
    pub fn field_as(mut self, name: &str, storage_name: &str, ty: FieldType) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            storage_name: storage_name.to_string(),
            ty,
        });
        self
    }

    #[must_use]
    pub fn index(mut self, keys: &[&str]) -> Self {
        self.indexes.push(IndexSpec::from_keys(keys, false));
        self
    }

    #[must_use]
    pub fn unique_index(mut self, keys: &[&str]) -> Self {
        self.indexes.push(IndexSpec::from_keys(keys, true));
        self
    }

    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn field_by_storage(&self, storage_name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.storage_name == storage_name)
    }

    #[must_use]
    pub fn collection_name(&self) -> &str {
        self.collection.as_deref().unwrap_or(&self.name)
    }
}
