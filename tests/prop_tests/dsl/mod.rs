mod prop_operators;
mod prop_shape;
mod prop_url;

use restdsl::schema::{EntityDescriptor, FieldType};
use std::sync::Arc;

pub(crate) fn profile() -> Arc<EntityDescriptor> {
    Arc::new(
        EntityDescriptor::new("Profile", "profiles")
            .id("id", FieldType::Long)
            .field("rating", FieldType::Long)
            .field("status", FieldType::String)
            .field("since", FieldType::Date)
            .index(&["rating"]),
    )
}
