//! Storage-side predicates and their evaluation over bson documents.

mod eval;
mod exec;
mod types;

pub use eval::{apply_projection, compare_bson, eval_filter};
pub use exec::{apply_update, count_docs, find_docs};
pub use types::{CmpOp, Filter, FindOptions, Order, Projection, SortSpec, UpdateDoc};
