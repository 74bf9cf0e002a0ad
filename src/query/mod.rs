//! Relational operators over heap files.
//!
//! Relations are described by an explicit [`Relation`] (attribute names,
//! types and offsets). Attribute values and predicate constants are given
//! as text and encoded to the record layout before use.

mod catalog;
mod operators;

pub use catalog::{encode_value, AttrDesc, AttrValue, Predicate, Relation};
pub use operators::{delete, insert, select};
