//! Coherence-based genealogical method (CBGM) for manuscript stemmatics.
//!
//! `cbgm_core` holds a normalized set of manuscript attestations and local
//! stemmata for a text, and computes the coherence measures used to
//! reconstruct the genealogical relationships between witnesses:
//!
//! 1. **Pre-genealogical coherence** ([`coherence::pregenealogical`]) -- plain
//!    agreement between a focal witness and every other witness, with no
//!    regard to direction.
//! 2. **Genealogical coherence** ([`coherence::genealogical`]) -- the same,
//!    refined by direction (who has the prior reading) to yield the focal
//!    witness's list of potential ancestors.
//! 3. **Parent-combination search** ([`flow::parent_search`]) -- for one
//!    variant unit, the minimal sets of potential ancestors that jointly
//!    explain a witness's reading.
//! 4. **Textual flow** ([`flow::textual_flow`]) -- parent-combination search
//!    applied across every witness at a variant unit, assembled into a
//!    directed graph.
//! 5. **Combinations of ancestors** ([`ancestors`]) -- the powerset of a
//!    witness's potential ancestors, scored by how completely each subset
//!    accounts for its readings.
//!
//! # Entry points
//!
//! Build a [`store::DataStore`] from normalized attestation rows (typically
//! produced by `cbgm_loader`), then construct a
//! [`coherence::genealogical::GenealogicalCoherence`] for a focal witness.
//!
//! # Crate features
//!
//! - **`serde`** -- enables `Serialize`/`Deserialize` derives on the data
//!   model (`Reading`, `ParentExpr`, `Attestation`) and on the coherence
//!   cache rows, so a [`coherence::genealogical::GenealogicalCoherence`]
//!   rowset can be spilled to disk between runs.

pub mod ancestors;
pub mod coherence;
pub mod error;
pub mod flow;
pub mod graph;
pub mod relation;
pub mod store;
pub mod types;

pub use error::CbgmError;
pub use store::DataStore;
pub use types::{Attestation, ParentExpr, Reading, ReadingLabel, VariantUnitId, Witness};
