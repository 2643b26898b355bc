//! Pre-genealogical coherence (component C): plain agreement between a focal
//! witness and every other witness, without regard to direction.

use crate::coherence::ranking::assign_ranks;
use crate::store::DataStore;
use crate::types::{ReadingLabel, VariantUnitId, Witness};

/// One row of the pre-genealogical coherence table: `w1`'s agreement with
/// `w2`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PregenealogicalRow {
    pub w2: Witness,
    /// Variant units where both `w1` and `w2` are extant.
    pub pass: u32,
    /// Of those, variant units where their readings match.
    pub eq: u32,
    /// `100 * eq / pass`, truncated; 0 when `pass` is 0.
    pub perc1: u32,
    pub rank: u32,
    pub nr: u32,
}

/// Pre-genealogical coherence for `w1` against every other extant witness in
/// `store`.
///
/// Resolved as an ordered field list (PASS, EQ, PERC1, then ranks) rather
/// than the retry-until-stable idiom of the original implementation: every
/// field here depends only on fields computed earlier in this same pass, so
/// a single linear walk over the overlap suffices.
#[must_use]
pub fn compute(store: &DataStore, w1: &Witness) -> Vec<PregenealogicalRow> {
    let w1_readings = store.all_readings_of(w1);

    let mut rows: Vec<PregenealogicalRow> = store
        .all_manuscripts()
        .into_iter()
        .filter(|w2| *w2 != w1)
        .map(|w2| {
            let w2_readings = store.all_readings_of(w2);
            let mut pass = 0u32;
            let mut eq = 0u32;
            for (vu, w1_label) in &w1_readings {
                if w1_label.is_lacuna() {
                    continue;
                }
                let Some(w2_label) = w2_readings.get(*vu) else {
                    continue;
                };
                if w2_label.is_lacuna() {
                    continue;
                }
                pass += 1;
                if w1_label == w2_label {
                    eq += 1;
                }
            }
            let perc1 = if pass == 0 { 0 } else { 100 * eq / pass };
            PregenealogicalRow {
                w2: w2.clone(),
                pass,
                eq,
                perc1,
                rank: 0,
                nr: 0,
            }
        })
        .collect();

    sort_and_rank(&mut rows);
    rows
}

/// Adds the `READING`/`TEXT` columns for a specific variant unit to an
/// already-computed table; never part of the cached rowset.
#[must_use]
pub fn with_variant_unit_columns(
    store: &DataStore,
    rows: &[PregenealogicalRow],
    vu: &VariantUnitId,
) -> Vec<(PregenealogicalRow, Option<ReadingLabel>, Option<String>)> {
    rows.iter()
        .map(|row| {
            let label = store.reading_of(&row.w2, vu).cloned();
            let text = label
                .as_ref()
                .and_then(|l| store.reading(vu, l))
                .map(|r| r.text.clone());
            (row.clone(), label, text)
        })
        .collect()
}

fn sort_and_rank(rows: &mut Vec<PregenealogicalRow>) {
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
        |_| false,
        |r, rank, nr| {
            r.rank = rank;
            r.nr = nr;
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParentExpr, Reading};
    use hashbrown::HashSet;

    fn reading(label: &str, parent: &str) -> Reading {
        Reading {
            label: ReadingLabel::from(label),
            text: format!("text-{label}"),
            parent: ParentExpr::parse(parent),
        }
    }

    fn store_with_two_agreements_and_one_disagreement() -> DataStore {
        let vu1 = VariantUnitId("B04K01V01/1".to_string());
        let vu2 = VariantUnitId("B04K01V02/1".to_string());
        let vu3 = VariantUnitId("B04K01V03/1".to_string());
        DataStore::build(vec![
            (
                vu1.clone(),
                reading("a", "INIT"),
                HashSet::from([Witness::from("A"), Witness::from("W1"), Witness::from("W2")]),
            ),
            (
                vu2.clone(),
                reading("a", "INIT"),
                HashSet::from([Witness::from("A"), Witness::from("W1"), Witness::from("W2")]),
            ),
            (
                vu3.clone(),
                reading("a", "INIT"),
                HashSet::from([Witness::from("A"), Witness::from("W1")]),
            ),
            (vu3, reading("b", "a"), HashSet::from([Witness::from("W2")])),
        ])
        .unwrap()
    }

    #[test]
    fn computes_pass_eq_and_percentage() {
        let store = store_with_two_agreements_and_one_disagreement();
        let rows = compute(&store, &Witness::from("W1"));
        let w2_row = rows.iter().find(|r| r.w2 == Witness::from("W2")).unwrap();
        assert_eq!(w2_row.pass, 3);
        assert_eq!(w2_row.eq, 2);
        assert_eq!(w2_row.perc1, 66);
    }

    #[test]
    fn ranks_are_assigned_in_descending_percentage_order() {
        let store = store_with_two_agreements_and_one_disagreement();
        let rows = compute(&store, &Witness::from("W1"));
        // W1<->A agrees on all 3 passages it's extant at; W1<->W2 on 2 of 3.
        let a_row = rows.iter().find(|r| r.w2 == Witness::from("A")).unwrap();
        let w2_row = rows.iter().find(|r| r.w2 == Witness::from("W2")).unwrap();
        assert!(a_row.rank < w2_row.rank);
        assert_eq!(a_row.nr, 1);
    }
}
