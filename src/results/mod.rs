//! Response containers: a flat list, a keyed map or a grouped multimap, each
//! with an optional total.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityList<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
}

impl<T> EntityList<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total_items: Option<u64>) -> Self {
        Self { items, total_items }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a EntityList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Entities keyed by a caller-chosen string key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMap<T> {
    pub items: BTreeMap<String, T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
}

impl<T> EntityMap<T> {
    #[must_use]
    pub fn new(items: BTreeMap<String, T>, total_items: Option<u64>) -> Self {
        Self { items, total_items }
    }

    /// Key each item with `key`; later items win on key collisions.
    #[must_use]
    pub fn from_items(items: Vec<T>, key: impl Fn(&T) -> String, total_items: Option<u64>) -> Self {
        let items = items.into_iter().map(|item| (key(&item), item)).collect();
        Self { items, total_items }
    }
}

/// One sub-list (with its own total) per group value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMultimap<T> {
    pub items: BTreeMap<String, EntityList<T>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
}

impl<T> EntityMultimap<T> {
    #[must_use]
    pub fn new(items: BTreeMap<String, EntityList<T>>, total_items: Option<u64>) -> Self {
        Self { items, total_items }
    }
}

/// Exactly one container shape per response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityResult<T> {
    List(EntityList<T>),
    Map(EntityMap<T>),
    Multimap(EntityMultimap<T>),
}

impl<T> EntityResult<T> {
    #[must_use]
    pub fn from_items(items: Vec<T>, total_items: Option<u64>) -> Self {
        Self::List(EntityList::new(items, total_items))
    }

    #[must_use]
    pub fn total_items(&self) -> Option<u64> {
        match self {
            Self::List(l) => l.total_items,
            Self::Map(m) => m.total_items,
            Self::Multimap(m) => m.total_items,
        }
    }

    /// All entities; multimaps are flattened group by group.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            Self::List(l) => Box::new(l.items.iter()),
            Self::Map(m) => Box::new(m.items.values()),
            Self::Multimap(m) => Box::new(m.items.values().flat_map(EntityList::iter)),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// First entity, when the caller expects at most one.
    #[must_use]
    pub fn get_one(&self) -> Option<&T> {
        self.iter().next()
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&EntityList<T>> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_multimap(&self) -> Option<&EntityMultimap<T>> {
        match self {
            Self::Multimap(m) => Some(m),
            _ => None,
        }
    }

    /// Owned entities in iteration order.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::List(l) => l.items,
            Self::Map(m) => m.items.into_values().collect(),
            Self::Multimap(m) => m.items.into_values().flat_map(|l| l.items).collect(),
        }
    }
}
