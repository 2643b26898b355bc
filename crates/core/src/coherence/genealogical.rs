//! Genealogical coherence (component D): pre-genealogical coherence refined
//! by direction, yielding a focal witness's list of potential ancestors.

use std::fs;
use std::path::Path;

use crate::coherence::pregenealogical::{self, PregenealogicalRow};
use crate::coherence::ranking::assign_ranks;
use crate::error::CbgmError;
use crate::relation::{classify, Relation};
use crate::store::DataStore;
use crate::types::{ReadingLabel, Witness};

/// One row of the genealogical coherence table.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenealogicalRow {
    pub w2: Witness,
    pub pass: u32,
    pub eq: u32,
    pub perc1: u32,
    /// `"-"` when `w1<w2 == w1>w2` (no established direction), else blank.
    pub direction: Direction,
    /// Count of variant units where `w2`'s reading is the direct parent of
    /// `w1`'s.
    pub w1_lt_w2: u32,
    /// Count of variant units where `w1`'s reading is the direct parent of
    /// `w2`'s.
    pub w1_gt_w2: u32,
    pub uncl: u32,
    pub norel: u32,
    pub rank: u32,
    pub nr: u32,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    None,
    Directed,
}

/// Genealogical coherence for one focal witness: potential ancestors and,
/// for any variant unit, the parent-combination search (component E) run
/// against it.
pub struct GenealogicalCoherence<'s> {
    store: &'s DataStore,
    w1: Witness,
    /// All rows, filtered to potential ancestors (`w1>w2 <= w1<w2`) and
    /// re-ranked, matching the table a caller actually wants to read.
    rows: Vec<GenealogicalRow>,
}

impl<'s> GenealogicalCoherence<'s> {
    /// Computes genealogical coherence for `w1` from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`CbgmError::NorelMismatch`] if the arithmetic identity
    /// `pass = eq + uncl + w1_lt_w2 + w1_gt_w2 + norel` fails for any row,
    /// which would indicate a bug in the direct-relationship tally.
    pub fn compute(store: &'s DataStore, w1: Witness) -> Result<Self, CbgmError> {
        let pregen_rows = pregenealogical::compute(store, &w1);
        let w1_readings = store.all_readings_of(&w1);

        let mut rows: Vec<GenealogicalRow> = pregen_rows
            .into_iter()
            .map(|pregen| direct_relationship_row(store, &w1, &w1_readings, pregen))
            .collect::<Result<_, _>>()?;

        rows.retain(|row| row.w1_gt_w2 <= row.w1_lt_w2);
        sort_and_rank(&mut rows);

        Ok(Self { store, w1, rows })
    }

    /// Loads a previously cached rowset keyed by `(store_id, w1)`, or
    /// computes and caches it if absent.
    ///
    /// The per-variant-unit `READING`/`TEXT` extension is never part of the
    /// cache: it is cheap to recompute and would multiply the cache key
    /// space for no benefit.
    #[cfg(feature = "serde")]
    pub fn compute_cached(
        store: &'s DataStore,
        w1: Witness,
        cache_dir: &Path,
        store_id: &str,
    ) -> Result<Self, CbgmError> {
        let cache_path = cache_dir.join(format!("{store_id}-{}.json", w1.0));
        if let Ok(bytes) = fs::read(&cache_path) {
            if let Ok(rows) = serde_json::from_slice::<Vec<GenealogicalRow>>(&bytes) {
                return Ok(Self { store, w1, rows });
            }
        }

        let computed = Self::compute(store, w1)?;
        if let Ok(bytes) = serde_json::to_vec(&computed.rows) {
            let _ = fs::create_dir_all(cache_dir);
            let tmp = cache_path.with_extension("json.tmp");
            if fs::write(&tmp, bytes).is_ok() {
                let _ = fs::rename(&tmp, &cache_path);
            }
        }
        Ok(computed)
    }

    #[must_use]
    pub fn w1(&self) -> &Witness {
        &self.w1
    }

    #[must_use]
    pub fn rows(&self) -> &[GenealogicalRow] {
        &self.rows
    }

    /// Witnesses whose row survived ranking (`nr != 0`), in table order.
    #[must_use]
    pub fn potential_ancestors(&self) -> Vec<&Witness> {
        self.rows
            .iter()
            .filter(|row| row.nr != 0)
            .map(|row| &row.w2)
            .collect()
    }

    #[must_use]
    pub fn store(&self) -> &DataStore {
        self.store
    }
}

fn direct_relationship_row(
    store: &DataStore,
    w1: &Witness,
    w1_readings: &hashbrown::HashMap<&crate::types::VariantUnitId, &ReadingLabel>,
    pregen: PregenealogicalRow,
) -> Result<GenealogicalRow, CbgmError> {
    let w2_readings = store.all_readings_of(&pregen.w2);

    let mut w1_lt_w2 = 0u32;
    let mut w1_gt_w2 = 0u32;
    let mut uncl = 0u32;
    let mut norel = 0u32;

    for (vu, w1_label) in w1_readings {
        if w1_label.is_lacuna() {
            continue;
        }
        let Some(w2_label) = w2_readings.get(*vu) else {
            continue;
        };
        if w2_label.is_lacuna() {
            continue;
        }
        match classify(store, vu, w1_label, w2_label) {
            Relation::Equal => {}
            Relation::Prior => w1_gt_w2 += 1,
            Relation::Posterior => w1_lt_w2 += 1,
            Relation::Unclear => uncl += 1,
            Relation::NoRelation => norel += 1,
        }
    }

    let expected_norel = i64::from(pregen.pass)
        - i64::from(pregen.eq)
        - i64::from(uncl)
        - i64::from(w1_gt_w2)
        - i64::from(w1_lt_w2);
    if expected_norel != i64::from(norel) {
        return Err(CbgmError::NorelMismatch {
            witness: w1.clone(),
            expected: expected_norel,
            computed: i64::from(norel),
        });
    }

    let direction = if w1_lt_w2 == w1_gt_w2 {
        Direction::None
    } else {
        Direction::Directed
    };

    Ok(GenealogicalRow {
        w2: pregen.w2,
        pass: pregen.pass,
        eq: pregen.eq,
        perc1: pregen.perc1,
        direction,
        w1_lt_w2,
        w1_gt_w2,
        uncl,
        norel,
        rank: 0,
        nr: 0,
    })
}

fn sort_and_rank(rows: &mut Vec<GenealogicalRow>) {
    rows.sort_by(|a, b| {
        b.perc1
            .cmp(&a.perc1)
            .then(b.eq.cmp(&a.eq))
            .then(b.pass.cmp(&a.pass))
            .then(a.w2.cmp(&b.w2))
    });

    assign_ranks(
        rows,
        |r| r.perc1,
        |r| matches!(r.direction, Direction::None),
        |r, rank, nr| {
            r.rank = rank;
            r.nr = nr;
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParentExpr, Reading, VariantUnitId};
    use hashbrown::HashSet;

    fn reading(label: &str, parent: &str) -> Reading {
        Reading {
            label: ReadingLabel::from(label),
            text: String::new(),
            parent: ParentExpr::parse(parent),
        }
    }

    /// Scenario 1 from the worked examples: C descends from A via D/E, and
    /// both D and E are potential ancestors of C with E closer than D.
    fn scenario_store() -> DataStore {
        let vu1 = VariantUnitId("B01K01V01/1".to_string());
        let vu2 = VariantUnitId("B01K01V02/1".to_string());
        let vu3 = VariantUnitId("B01K01V03/1".to_string());
        DataStore::build(vec![
            (
                vu1.clone(),
                reading("a", "INIT"),
                HashSet::from([
                    Witness::from("A"),
                    Witness::from("D"),
                    Witness::from("E"),
                ]),
            ),
            (vu1, reading("b", "a"), HashSet::from([Witness::from("C")])),
            (
                vu2.clone(),
                reading("a", "INIT"),
                HashSet::from([
                    Witness::from("A"),
                    Witness::from("C"),
                    Witness::from("D"),
                    Witness::from("E"),
                ]),
            ),
            (
                vu3.clone(),
                reading("a", "INIT"),
                HashSet::from([Witness::from("A"), Witness::from("D")]),
            ),
            (
                vu3,
                reading("b", "a"),
                HashSet::from([Witness::from("C"), Witness::from("E")]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn potential_ancestors_excludes_witnesses_more_posterior_than_prior() {
        let store = scenario_store();
        let coh = GenealogicalCoherence::compute(&store, Witness::from("C")).unwrap();
        let ancestors: Vec<String> = coh
            .potential_ancestors()
            .into_iter()
            .map(|w| w.0.clone())
            .collect();
        assert!(ancestors.contains(&"A".to_string()));
        assert!(ancestors.contains(&"D".to_string()));
        assert!(ancestors.contains(&"E".to_string()));
    }

    #[test]
    fn filtered_rows_never_have_more_posterior_than_prior_variants() {
        let store = scenario_store();
        let coh = GenealogicalCoherence::compute(&store, Witness::from("C")).unwrap();
        for row in coh.rows() {
            assert!(row.w1_gt_w2 <= row.w1_lt_w2);
        }
    }
}
