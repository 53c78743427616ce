//! Entity metadata: descriptors, field resolution, value coercion and the
//! per-type metadata cache.

pub mod convert;
pub mod index_info;
pub mod mapper;
pub mod registry;
pub mod resolve;
pub mod types;

pub use convert::{ValueConverter, coerce_literal, register_converter, render_literal};
pub use index_info::EntityIndexInfo;
pub use mapper::{DocumentFieldMapper, EntityFieldMapper, GenericFieldMapper};
pub use registry::{EntityInfo, TypeCache, descriptor_of, entity_info};
pub use resolve::{ResolvedField, logical_path, resolve_field_path, storage_path};
pub use types::{EntityDescriptor, FieldDef, FieldType, ID_STORAGE_NAME, IndexSpec, KeyOrder};
