//! Worker-pool scheduling of coarse-grained CBGM computations over a shared,
//! read-only [`DataStore`].
//!
//! Three task kinds are supported: generating and caching genealogical
//! coherence for one witness, running the parent-combination search for one
//! witness at one variant unit across a set of connectivity values, and
//! computing the full combinations-of-ancestors table for one witness. A
//! fixed pool of worker threads drains a shared queue; a watchdog thread
//! flags tasks that overrun their deadline so a caller can requeue them.

pub mod outcome;
pub mod task;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cbgm_core::coherence::genealogical::GenealogicalCoherence;
use cbgm_core::flow::parent_search::{select_for_textual_flow, ParentSearch};
use cbgm_core::store::DataStore;
use cbgm_core::types::Witness;
use parking_lot::Mutex;

pub use outcome::RunOutcome;
pub use task::{Task, TaskResult};

/// Identifies one dispatched task for watchdog bookkeeping and result
/// correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// Default watchdog timeout for an in-flight task, matching the original
/// long-running-batch deployment: four hours.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(4 * 60 * 60);

/// Runs a batch of tasks against `store` using `worker_count` threads,
/// returning one outcome per task in submission order.
///
/// Workers are stateless beyond `store`, the cache directory, and a
/// per-cache-key lock that skips redundant concurrent recomputation (not
/// required for correctness — concurrent writers to the same cache key
/// produce identical bytes — but avoids wasted CPU). Cancellation is
/// cooperative: workers check `shutdown` between tasks, never mid-task.
pub struct Scheduler<'s> {
    store: &'s DataStore,
    store_id: String,
    cache_dir: PathBuf,
    worker_count: usize,
    timeout: Duration,
    shutdown: Arc<AtomicBool>,
}

impl<'s> Scheduler<'s> {
    #[must_use]
    pub fn new(store: &'s DataStore, store_id: impl Into<String>, cache_dir: PathBuf) -> Self {
        Self {
            store,
            store_id: store_id.into(),
            cache_dir,
            worker_count: std::thread::available_parallelism()
                .map_or(1, std::num::NonZeroUsize::get),
            timeout: DEFAULT_TASK_TIMEOUT,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn worker_count(mut self, n: usize) -> Self {
        self.worker_count = n.max(1);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// A clone of the cooperative shutdown flag; setting it stops workers
    /// from picking up new tasks (in-flight tasks still run to completion).
    #[must_use]
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Runs every task in `tasks` and returns `(TaskId, Result<TaskResult,
    /// RunOutcome>)` pairs in submission order.
    pub fn run(&self, tasks: Vec<Task>) -> Vec<(TaskId, Result<TaskResult, RunOutcome>)> {
        let next_id = AtomicU64::new(0);
        let indexed: Vec<(TaskId, Task)> = tasks
            .into_iter()
            .map(|t| (TaskId(next_id.fetch_add(1, Ordering::Relaxed)), t))
            .collect();
        let total = indexed.len();

        let (tx, rx) = mpsc::channel::<(TaskId, Task)>();
        for item in indexed {
            tx.send(item).expect("receiver outlives this send loop");
        }
        drop(tx);
        let rx = Mutex::new(rx);

        let (result_tx, result_rx) = mpsc::channel::<(TaskId, Result<TaskResult, RunOutcome>)>();
        let deadlines: Mutex<std::collections::HashMap<TaskId, Instant>> =
            Mutex::new(std::collections::HashMap::new());
        let in_flight_cache_keys: Mutex<std::collections::HashSet<String>> =
            Mutex::new(std::collections::HashSet::new());

        std::thread::scope(|scope| {
            let watchdog_deadlines = &deadlines;
            let watchdog_shutdown = &self.shutdown;
            let timeout = self.timeout;
            scope.spawn(move || {
                while !watchdog_shutdown.load(Ordering::Relaxed) {
                    std::thread::sleep(Duration::from_millis(200));
                    let now = Instant::now();
                    for (id, deadline) in watchdog_deadlines.lock().iter() {
                        if now > *deadline {
                            tracing::warn!(task = ?id, "task exceeded its watchdog deadline");
                        }
                    }
                    if watchdog_deadlines.lock().is_empty() {
                        break;
                    }
                }
            });

            for _ in 0..self.worker_count {
                let rx = &rx;
                let result_tx = result_tx.clone();
                let deadlines = &deadlines;
                let in_flight_cache_keys = &in_flight_cache_keys;
                let shutdown = &self.shutdown;
                scope.spawn(move || loop {
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    let next = rx.lock().recv();
                    let Ok((id, task)) = next else { break };

                    deadlines.lock().insert(id, Instant::now() + timeout);
                    let outcome = self.execute(task, in_flight_cache_keys);
                    deadlines.lock().remove(&id);

                    if result_tx.send((id, outcome)).is_err() {
                        break;
                    }
                });
            }
            drop(result_tx);
        });

        let mut results: Vec<(TaskId, Result<TaskResult, RunOutcome>)> =
            result_rx.into_iter().collect();
        results.sort_by_key(|(id, _)| *id);
        debug_assert_eq!(results.len(), total);
        results
    }

    fn execute(
        &self,
        task: Task,
        in_flight_cache_keys: &Mutex<std::collections::HashSet<String>>,
    ) -> Result<TaskResult, RunOutcome> {
        match task {
            Task::GenCoh { w1 } => self.run_gen_coh(w1, in_flight_cache_keys),
            Task::Parents { w1, vu, connectivity } => self.run_parents(w1, vu, connectivity),
            Task::CombAnc {
                w1,
                max_comb_len,
                allow_incomplete,
                output_path,
            } => self.run_comb_anc(w1, max_comb_len, allow_incomplete, output_path),
        }
    }

    fn run_gen_coh(
        &self,
        w1: Witness,
        in_flight_cache_keys: &Mutex<std::collections::HashSet<String>>,
    ) -> Result<TaskResult, RunOutcome> {
        if !self.store.contains_witness(&w1) {
            return Err(RunOutcome::MissingWitness(w1));
        }

        let key = format!("{}-{}", self.store_id, w1.0);
        let already_running = !in_flight_cache_keys.lock().insert(key.clone());
        if already_running {
            tracing::debug!(witness = %w1, "another worker already owns this cache key");
        }

        let result = GenealogicalCoherence::compute_cached(self.store, w1, &self.cache_dir, &self.store_id);
        in_flight_cache_keys.lock().remove(&key);

        match result {
            Ok(coh) => Ok(TaskResult::GenCoh {
                potential_ancestor_count: coh.potential_ancestors().len(),
            }),
            Err(err) => Err(RunOutcome::InvariantViolation(err)),
        }
    }

    fn run_parents(
        &self,
        w1: Witness,
        vu: cbgm_core::types::VariantUnitId,
        connectivity: Vec<cbgm_core::flow::parent_search::ConnectivityBound>,
    ) -> Result<TaskResult, RunOutcome> {
        if !self.store.contains_witness(&w1) {
            return Err(RunOutcome::MissingWitness(w1));
        }
        if !self.store.contains_variant_unit(&vu) {
            return Err(RunOutcome::MissingVariantUnit(vu));
        }
        let Some(label) = self.store.reading_of(&w1, &vu) else {
            return Ok(TaskResult::Parents { chosen: Vec::new() });
        };
        let Some(reading) = self.store.reading(&vu, label) else {
            return Ok(TaskResult::Parents { chosen: Vec::new() });
        };

        let coh = GenealogicalCoherence::compute(self.store, w1)
            .map_err(RunOutcome::InvariantViolation)?;

        let mut chosen = Vec::with_capacity(connectivity.len());
        for bound in connectivity {
            let search = ParentSearch::new(&coh, &vu, bound);
            let combinations = search.search(label, &reading.parent);
            let members = select_for_textual_flow(&combinations)
                .map(|combo| {
                    combo
                        .iter()
                        .filter(|m| m.witness_index != usize::MAX)
                        .map(|m| search.witness(m.witness_index).clone())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            chosen.push((bound, members));
        }

        Ok(TaskResult::Parents { chosen })
    }

    fn run_comb_anc(
        &self,
        w1: Witness,
        max_comb_len: Option<usize>,
        allow_incomplete: bool,
        output_path: PathBuf,
    ) -> Result<TaskResult, RunOutcome> {
        if !self.store.contains_witness(&w1) {
            return Err(RunOutcome::MissingWitness(w1));
        }
        match cbgm_core::ancestors::combinations_of_ancestors(
            self.store,
            w1,
            max_comb_len,
            allow_incomplete,
            &output_path,
        ) {
            Ok(rows) => Ok(TaskResult::CombAnc { row_count: rows.map_or(0, |r| r.len()) }),
            Err(err) => Err(RunOutcome::InvariantViolation(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbgm_fixtures::{generate, FixtureConfig};

    #[test]
    fn gen_coh_task_succeeds_for_a_known_witness() {
        let store = generate(&FixtureConfig::builder().n_witnesses(8).n_variant_units(6).build());
        let w1 = store.all_manuscripts()[1].clone();
        let dir = tempfile::TempDir::new().unwrap();
        let scheduler = Scheduler::new(&store, "bench", dir.path().to_path_buf()).worker_count(2);

        let results = scheduler.run(vec![Task::GenCoh { w1 }]);
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0].1, Ok(TaskResult::GenCoh { .. })));
    }

    #[test]
    fn gen_coh_task_rejects_unknown_witness() {
        let store = generate(&FixtureConfig::builder().n_witnesses(4).n_variant_units(3).build());
        let dir = tempfile::TempDir::new().unwrap();
        let scheduler = Scheduler::new(&store, "bench", dir.path().to_path_buf());

        let results = scheduler.run(vec![Task::GenCoh { w1: Witness::from("nonexistent") }]);
        assert!(matches!(results[0].1, Err(RunOutcome::MissingWitness(_))));
    }

    #[test]
    fn batch_of_tasks_returns_one_result_per_submission_in_order() {
        let store = generate(&FixtureConfig::builder().n_witnesses(10).n_variant_units(8).build());
        let witnesses: Vec<Witness> = store.all_manuscripts().into_iter().take(4).cloned().collect();
        let dir = tempfile::TempDir::new().unwrap();
        let scheduler = Scheduler::new(&store, "bench", dir.path().to_path_buf()).worker_count(3);

        let tasks: Vec<Task> = witnesses.into_iter().map(|w1| Task::GenCoh { w1 }).collect();
        let n = tasks.len();
        let results = scheduler.run(tasks);
        assert_eq!(results.len(), n);
        for window in results.windows(2) {
            assert!(window[0].0 .0 < window[1].0 .0);
        }
    }
}
