//! Exercises the scheduler's `Parents` and `CombAnc` task kinds against a
//! generated store, beyond the `GenCoh` coverage in the crate's own unit
//! tests.

use cbgm_core::flow::parent_search::ConnectivityBound;
use cbgm_core::types::Witness;
use cbgm_fixtures::{generate, FixtureConfig};
use cbgm_scheduler::{RunOutcome, Scheduler, Task, TaskResult};

#[test]
fn parents_task_returns_one_choice_per_requested_bound() {
    let store = generate(
        &FixtureConfig::builder()
            .n_witnesses(12)
            .n_variant_units(10)
            .build(),
    );
    let w1 = store.all_manuscripts()[2].clone();
    let vu = store.all_variant_units()[0].clone();
    let dir = tempfile::TempDir::new().unwrap();
    let scheduler = Scheduler::new(&store, "bench", dir.path().to_path_buf());

    let results = scheduler.run(vec![Task::Parents {
        w1,
        vu,
        connectivity: vec![ConnectivityBound::MaxRank(5), ConnectivityBound::MaxRank(u32::MAX)],
    }]);

    assert_eq!(results.len(), 1);
    match &results[0].1 {
        Ok(TaskResult::Parents { chosen }) => assert_eq!(chosen.len(), 2),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn parents_task_rejects_an_unknown_variant_unit() {
    let store = generate(
        &FixtureConfig::builder()
            .n_witnesses(6)
            .n_variant_units(4)
            .build(),
    );
    let w1 = store.all_manuscripts()[0].clone();
    let dir = tempfile::TempDir::new().unwrap();
    let scheduler = Scheduler::new(&store, "bench", dir.path().to_path_buf());

    let results = scheduler.run(vec![Task::Parents {
        w1,
        vu: cbgm_core::types::VariantUnitId("does-not-exist".to_string()),
        connectivity: vec![ConnectivityBound::MaxRank(u32::MAX)],
    }]);

    assert!(matches!(
        results[0].1,
        Err(RunOutcome::MissingVariantUnit(_))
    ));
}

#[test]
fn comb_anc_task_writes_a_table_and_reports_its_row_count() {
    let store = generate(
        &FixtureConfig::builder()
            .n_witnesses(9)
            .n_variant_units(7)
            .build(),
    );
    let w1 = store.all_manuscripts()[3].clone();
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("out.csv");
    let scheduler = Scheduler::new(&store, "bench", dir.path().to_path_buf());

    let results = scheduler.run(vec![Task::CombAnc {
        w1,
        max_comb_len: None,
        allow_incomplete: true,
        output_path: out.clone(),
    }]);

    match &results[0].1 {
        Ok(TaskResult::CombAnc { row_count }) => {
            if *row_count > 0 {
                assert!(out.exists());
            }
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn a_mixed_batch_of_task_kinds_completes_in_submission_order() {
    let store = generate(
        &FixtureConfig::builder()
            .n_witnesses(10)
            .n_variant_units(8)
            .build(),
    );
    let mut witnesses = store.all_manuscripts().into_iter().cloned();
    let w1 = witnesses.next().unwrap();
    let w2 = witnesses.next().unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    let scheduler = Scheduler::new(&store, "bench", dir.path().to_path_buf()).worker_count(2);

    let tasks = vec![
        Task::GenCoh { w1: w1.clone() },
        Task::CombAnc {
            w1: w2,
            max_comb_len: Some(3),
            allow_incomplete: true,
            output_path: dir.path().join("mixed.csv"),
        },
    ];
    let results = scheduler.run(tasks);
    assert_eq!(results.len(), 2);
    assert!(results[0].0 < results[1].0);
}
