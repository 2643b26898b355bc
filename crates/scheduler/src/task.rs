//! Task and result types dispatched by [`crate::Scheduler`].

use std::path::PathBuf;

use cbgm_core::flow::parent_search::ConnectivityBound;
use cbgm_core::types::{VariantUnitId, Witness};

/// One unit of work handed to a worker thread.
#[derive(Debug, Clone)]
pub enum Task {
    /// Generate and persist the genealogical-coherence cache for `w1`.
    GenCoh { w1: Witness },
    /// Parent-combination search for `w1`'s reading at `vu`, across every
    /// requested connectivity bound.
    Parents {
        w1: Witness,
        vu: VariantUnitId,
        connectivity: Vec<ConnectivityBound>,
    },
    /// Full combinations-of-ancestors table for `w1`.
    CombAnc {
        w1: Witness,
        max_comb_len: Option<usize>,
        allow_incomplete: bool,
        output_path: PathBuf,
    },
}

/// A task's result, summarized rather than carrying the full computed
/// structure (callers who need the full rowset call the `cbgm_core` API
/// directly; the scheduler's job is dispatch and bookkeeping).
#[derive(Debug, Clone)]
pub enum TaskResult {
    GenCoh {
        potential_ancestor_count: usize,
    },
    Parents {
        /// Per requested bound, the witnesses of the chosen combination (or
        /// none, if no explaining combination was found).
        chosen: Vec<(ConnectivityBound, Vec<Witness>)>,
    },
    CombAnc {
        row_count: usize,
    },
}
