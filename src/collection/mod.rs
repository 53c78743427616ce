//! In-memory collections of bson documents, kept in insertion order.

mod core;
mod index_admin;
mod ops;

pub use self::core::Collection;
