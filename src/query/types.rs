use bson::Bson;
use serde::{Deserialize, Serialize};

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

/// Which fields of a matched document are returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// Only these paths (plus `_id`).
    Include(Vec<String>),
    /// Everything except these paths.
    Exclude(Vec<String>),
}

/// Options for `find_docs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    pub projection: Option<Projection>,
    pub sort: Option<Vec<SortSpec>>,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Storage predicate. Paths are dotted storage paths; arrays along a path are
/// traversed element-wise.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    True,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Exists { path: String, exists: bool },
    In { path: String, values: Vec<Bson> },
    Nin { path: String, values: Vec<Bson> },
    Cmp { path: String, op: CmpOp, value: Bson },
    /// Some element of the array at `path` satisfies `filter` as a whole.
    ElemMatch { path: String, filter: Box<Filter> },
}

impl Filter {
    #[must_use]
    pub fn eq(path: &str, value: Bson) -> Self {
        Self::Cmp { path: path.to_string(), op: CmpOp::Eq, value }
    }

    #[must_use]
    pub fn cmp(path: &str, op: CmpOp, value: Bson) -> Self {
        Self::Cmp { path: path.to_string(), op, value }
    }

    /// Equality with null; also matches documents missing the field.
    #[must_use]
    pub fn is_null(path: &str) -> Self {
        Self::eq(path, Bson::Null)
    }

    #[must_use]
    pub fn exists(path: &str) -> Self {
        Self::Exists { path: path.to_string(), exists: true }
    }

    #[must_use]
    pub fn is_in(path: &str, values: Vec<Bson>) -> Self {
        Self::In { path: path.to_string(), values }
    }

    #[must_use]
    pub fn not_in(path: &str, values: Vec<Bson>) -> Self {
        Self::Nin { path: path.to_string(), values }
    }

    #[must_use]
    pub fn elem_match(path: &str, filter: Self) -> Self {
        Self::ElemMatch { path: path.to_string(), filter: Box::new(filter) }
    }

    /// Conjunction; collapses empty and single-clause forms.
    #[must_use]
    pub fn and(mut clauses: Vec<Self>) -> Self {
        match clauses.len() {
            0 => Self::True,
            1 => clauses.remove(0),
            _ => Self::And(clauses),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UpdateDoc {
    pub set: Vec<(String, Bson)>,
    pub unset: Vec<String>,
}

impl UpdateDoc {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }
}
