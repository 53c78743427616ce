use std::collections::BTreeSet;

/// Extra PATCH input: fields to remove from the stored entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchContext {
    unset_fields: BTreeSet<String>,
}

impl PatchContext {
    #[must_use]
    pub fn with_unset_fields<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self { unset_fields: fields.into_iter().map(Into::into).collect() }
    }

    #[must_use]
    pub fn unset_fields(&self) -> &BTreeSet<String> {
        &self.unset_fields
    }
}
