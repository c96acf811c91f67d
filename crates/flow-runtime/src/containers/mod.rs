//! Backing stores for aggregate values
//!
//! - [`OrderedTable`]: hash table that iterates in insertion order (Dict,
//!   struct fields, scope records)
//! - [`DynamicArray`]: growable indexed array (List)

mod array;
mod table;

pub use array::DynamicArray;
pub use table::{Entry, OrderedTable};
