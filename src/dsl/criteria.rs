use std::collections::BTreeMap;

use super::field::ParsedField;
use super::value::CriterionValue;

/// Field → value set. AND across keys, OR within a key.
/// Values keep first-seen order and are deduplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria(BTreeMap<ParsedField, Vec<CriterionValue>>);

impl Criteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, key: &ParsedField) -> Option<&[CriterionValue]> {
        self.0.get(key).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains_key(&self, key: &ParsedField) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ParsedField> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParsedField, &[CriterionValue])> {
        self.0.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Merge `values` into the set for `key`.
    pub fn insert_all(&mut self, key: ParsedField, values: impl IntoIterator<Item = CriterionValue>) {
        let set = self.0.entry(key).or_default();
        for v in values {
            if !set.contains(&v) {
                set.push(v);
            }
        }
    }

    /// Replace the set for `key`.
    pub fn set(&mut self, key: ParsedField, values: Vec<CriterionValue>) {
        self.0.insert(key, values);
    }

    pub fn remove(&mut self, key: &ParsedField) -> Option<Vec<CriterionValue>> {
        self.0.remove(key)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&ParsedField, &[CriterionValue]) -> bool) {
        self.0.retain(|k, v| keep(k, v));
    }
}

impl<'a> IntoIterator for &'a Criteria {
    type Item = (&'a ParsedField, &'a Vec<CriterionValue>);
    type IntoIter = std::collections::btree_map::Iter<'a, ParsedField, Vec<CriterionValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
