//! Deterministic and randomized synthetic CBGM datasets, for tests and
//! benches across the workspace.
//!
//! A generated dataset always satisfies the data-model invariants: full
//! witness coverage per variant unit, acyclic local stemmata, and resolvable
//! parent labels. [`FixtureConfig`] is reproducible by seed; two runs with
//! the same config produce byte-identical stores.

use cbgm_core::store::DataStore;
use cbgm_core::types::{ParentExpr, Reading, ReadingLabel, VariantUnitId, Witness};
use hashbrown::HashSet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngExt, SeedableRng};
use rayon::prelude::*;
use typed_builder::TypedBuilder;

/// Parameters governing a synthetic dataset.
///
/// `reading_fan_out` caps how many competing readings a variant unit may
/// have; every unit gets at least two (the initial reading plus one split).
#[derive(Debug, Clone, TypedBuilder)]
pub struct FixtureConfig {
    pub n_witnesses: usize,
    pub n_variant_units: usize,
    #[builder(default = 3)]
    pub reading_fan_out: usize,
    #[builder(default = 0.3)]
    pub split_probability: f64,
    #[builder(default = 0x5EED)]
    pub seed: u64,
}

/// Builds a [`DataStore`] from `config`. Variant units are generated
/// independently and in parallel, then assembled sequentially (store
/// construction itself is not safely parallelizable, since it accumulates
/// shared per-witness state).
#[must_use]
pub fn generate(config: &FixtureConfig) -> DataStore {
    let witnesses: Vec<Witness> = witness_names(config.n_witnesses);

    let rows_per_vu: Vec<Vec<(VariantUnitId, Reading, HashSet<Witness>)>> = (0..config
        .n_variant_units)
        .into_par_iter()
        .map(|v| generate_variant_unit(config, v, &witnesses))
        .collect();

    DataStore::build(rows_per_vu.into_iter().flatten())
        .expect("generated fixtures satisfy the data-model invariants by construction")
}

fn witness_names(n: usize) -> Vec<Witness> {
    (0..n).map(|i| Witness::from(format!("{i:03}").as_str())).collect()
}

/// Deterministic per-variant-unit RNG, seeded from the config seed and the
/// unit's index, so units generate independently of iteration order.
fn rng_for(config: &FixtureConfig, index: usize) -> StdRng {
    StdRng::seed_from_u64(config.seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn generate_variant_unit(
    config: &FixtureConfig,
    index: usize,
    witnesses: &[Witness],
) -> Vec<(VariantUnitId, Reading, HashSet<Witness>)> {
    let mut rng = rng_for(config, index);
    let vu = VariantUnitId(format!("B01K01V{:04}/1", index + 1));

    let fan_out = rng.random_range(2..=config.reading_fan_out.max(2));
    let mut labels: Vec<ReadingLabel> = (0..fan_out)
        .map(|i| ReadingLabel::from(char::from(b'a' + i as u8).to_string().as_str()))
        .collect();
    labels.shuffle(&mut rng);

    let mut remaining: Vec<Witness> = witnesses.to_vec();
    remaining.push(Witness::from(Witness::INITIAL_TEXT));
    remaining.shuffle(&mut rng);

    let mut rows = Vec::with_capacity(fan_out);
    let mut parent_chain = vec![labels[0].clone()];

    for (i, label) in labels.iter().enumerate() {
        let support: HashSet<Witness> = if i == 0 {
            take_majority(&mut remaining, &mut rng, config.split_probability)
        } else if i + 1 == labels.len() {
            remaining.drain(..).collect()
        } else {
            take_majority(&mut remaining, &mut rng, 0.5)
        };
        if support.is_empty() {
            continue;
        }

        let parent = if i == 0 {
            ParentExpr::Initial
        } else {
            ParentExpr::Labels(vec![parent_chain[rng.random_range(0..parent_chain.len())].clone()])
        };

        rows.push((
            vu.clone(),
            Reading {
                label: label.clone(),
                text: format!("reading-{label}"),
                parent,
            },
            support,
        ));
        parent_chain.push(label.clone());
    }

    rows
}

/// Peels a random, probability-weighted share of `pool` off into a fresh set
/// (always at least one witness if the pool is non-empty).
fn take_majority(pool: &mut Vec<Witness>, rng: &mut StdRng, keep_probability: f64) -> HashSet<Witness> {
    if pool.is_empty() {
        return HashSet::new();
    }
    let mut taken = HashSet::new();
    let mut i = 0;
    while i < pool.len() {
        if rng.random::<f64>() < keep_probability {
            taken.insert(pool.remove(i));
        } else {
            i += 1;
        }
    }
    if taken.is_empty() {
        taken.insert(pool.remove(rng.random_range(0..pool.len())));
    }
    taken
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_the_same_manuscript_universe() {
        let config = FixtureConfig::builder().n_witnesses(20).n_variant_units(15).build();
        let a = generate(&config);
        let b = generate(&config);
        assert_eq!(a.all_manuscripts(), b.all_manuscripts());
        assert_eq!(a.all_variant_units(), b.all_variant_units());
    }

    #[test]
    fn generated_store_covers_the_full_witness_universe_per_unit() {
        let config = FixtureConfig::builder().n_witnesses(12).n_variant_units(5).build();
        let store = generate(&config);
        let all: HashSet<&Witness> = store.all_manuscripts().into_iter().collect();

        for vu in store.all_variant_units() {
            let mut covered: HashSet<Witness> = HashSet::new();
            for (label, _) in store.readings_at(vu) {
                covered.extend(store.attesters_of(vu, label));
            }
            let covered_refs: HashSet<&Witness> = covered.iter().collect();
            assert_eq!(covered_refs, all, "variant unit {vu:?} must cover every witness");
        }
    }

    #[test]
    fn different_seeds_usually_differ() {
        let a = generate(&FixtureConfig::builder().n_witnesses(10).n_variant_units(10).seed(1).build());
        let b = generate(&FixtureConfig::builder().n_witnesses(10).n_variant_units(10).seed(2).build());
        assert_ne!(a.all_variant_units().len(), 0);
        assert_ne!(b.all_variant_units().len(), 0);
    }
}
