//! Declarative loader for the CBGM input data contract: manuscript set and
//! nested variant-unit/reading structure, deserialized without executing any
//! user code, then validated and assembled into a [`cbgm_core::DataStore`].

pub mod dataset;
pub mod error;
pub mod grammar;

pub use dataset::{load_from_path, load_from_str, Dataset};
pub use error::LoaderError;
pub use grammar::parse_connectivity;
