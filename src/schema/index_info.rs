use std::collections::BTreeSet;
use std::sync::Arc;

use super::mapper::EntityFieldMapper;
use super::resolve::logical_path;
use super::types::EntityDescriptor;
use crate::index::{IndexDescriptor, IndexDirection};

/// Declared indexes of an entity in logical names, e.g. `"rating"` or
/// `"stats.followers,-rating"`, plus every leading prefix of each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityIndexInfo {
    indexes: Vec<String>,
    prefixes: BTreeSet<String>,
}

impl EntityIndexInfo {
    /// Build from comma-joined key lists (`-field` marks descending keys).
    #[must_use]
    pub fn from_index_strings<S: AsRef<str>>(indexes: impl IntoIterator<Item = S>) -> Self {
        let mut info = Self::default();
        for index in indexes {
            info.add(index.as_ref());
        }
        info
    }

    /// Translate storage index descriptors back into logical field names.
    /// Keys without a logical counterpart are dropped with an error log.
    #[must_use]
    pub fn from_storage(
        mapper: &dyn EntityFieldMapper,
        root: &Arc<EntityDescriptor>,
        descriptors: &[IndexDescriptor],
    ) -> Self {
        let mut info = Self::default();
        for desc in descriptors {
            let mut components = Vec::with_capacity(desc.keys.len());
            for key in &desc.keys {
                let Some(name) = logical_path(mapper, root, &key.path) else {
                    log::error!(
                        "cannot map storage index key '{}' of '{}' to fields of {}; skipping",
                        key.path,
                        desc.name,
                        root.name
                    );
                    continue;
                };
                match key.direction {
                    IndexDirection::Desc => components.push(format!("-{name}")),
                    IndexDirection::Asc | IndexDirection::Hashed => components.push(name),
                }
            }
            if components.is_empty() {
                continue;
            }
            let joined = components.join(",");
            log::info!("mapped index '{}' of {} to '{joined}'", desc.name, root.name);
            info.add(&joined);
        }
        info
    }

    fn add(&mut self, index: &str) {
        if !self.indexes.iter().any(|i| i == index) {
            self.indexes.push(index.to_string());
        }
        let mut acc = String::new();
        for part in index.split(',') {
            if !acc.is_empty() {
                acc.push(',');
            }
            acc.push_str(part.trim_start_matches('-'));
            self.prefixes.insert(acc.clone());
        }
    }

    #[must_use]
    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }

    #[must_use]
    pub fn prefixes(&self) -> &BTreeSet<String> {
        &self.prefixes
    }

    /// True when `field` is the leading key of some declared index.
    #[must_use]
    pub fn covers(&self, field: &str) -> bool {
        self.prefixes.contains(field)
    }

    /// `[(a), (b,-c)]`
    #[must_use]
    pub fn describe(&self) -> String {
        format!("[({})]", self.indexes.join("), ("))
    }
}
