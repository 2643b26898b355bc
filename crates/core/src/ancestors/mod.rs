//! Combinations-of-ancestors engine (component G): score every subset of a
//! focal witness's potential ancestors by how completely it accounts for
//! that witness's readings.

pub mod combinations;

pub use combinations::{combinations_of_ancestors, CombinationRow};
