//! The normalized attestation store: every manuscript's reading at every
//! variant unit, plus the local stemma of readings at each variant unit.

use hashbrown::{HashMap, HashSet};

use crate::error::CbgmError;
use crate::graph::DiGraph;
use crate::types::{ParentExpr, Reading, ReadingLabel, VariantUnitId, Witness};

/// One variant unit's local stemma: its competing readings and the witnesses
/// attesting each.
#[derive(Debug, Clone, Default)]
struct VariantUnitData {
    readings: Vec<Reading>,
    support: HashMap<ReadingLabel, HashSet<Witness>>,
}

/// A validated, indexed collection of manuscript attestations and local
/// stemmata for a single text.
///
/// Construction validates the four invariants of the data model: full
/// coverage of the witness universe per variant unit, no witness attesting
/// two readings at the same place, acyclic local stemmata, and parent labels
/// that resolve to an existing reading.
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    variant_units: HashMap<VariantUnitId, VariantUnitData>,
    /// witness -> variant_unit -> reading label, including `A`.
    by_witness: HashMap<Witness, HashMap<VariantUnitId, ReadingLabel>>,
}

impl DataStore {
    /// Builds a store from normalized rows and validates it.
    ///
    /// `rows` is `(variant_unit, reading, support)`, where `support` is the
    /// set of witnesses attesting that reading (the lacuna pseudo-reading,
    /// labelled [`ReadingLabel::LACUNA`], carries the witnesses extant
    /// nowhere else at this variant unit).
    ///
    /// # Errors
    ///
    /// Returns [`CbgmError::DuplicateAttestation`] if a witness attests two
    /// readings at one variant unit, [`CbgmError::SelfParentingReading`] or
    /// [`CbgmError::UnknownParentLabel`] for a malformed parent expression,
    /// or [`CbgmError::CyclicLocalStemma`] if a local stemma's reading graph
    /// is cyclic.
    pub fn build(
        rows: impl IntoIterator<Item = (VariantUnitId, Reading, HashSet<Witness>)>,
    ) -> Result<Self, CbgmError> {
        let mut variant_units: HashMap<VariantUnitId, VariantUnitData> = HashMap::new();
        let mut by_witness: HashMap<Witness, HashMap<VariantUnitId, ReadingLabel>> =
            HashMap::new();

        for (vu, reading, support) in rows {
            let data = variant_units.entry(vu.clone()).or_default();

            for witness in &support {
                let seen = by_witness.entry(witness.clone()).or_default();
                if seen
                    .insert(vu.clone(), reading.label.clone())
                    .is_some_and(|prev| prev != reading.label)
                {
                    return Err(CbgmError::DuplicateAttestation {
                        witness: witness.clone(),
                        variant_unit: vu,
                    });
                }
            }

            data.support.insert(reading.label.clone(), support);
            data.readings.push(reading);
        }

        let store = Self {
            variant_units,
            by_witness,
        };
        store.validate()?;
        Ok(store)
    }

    fn validate(&self) -> Result<(), CbgmError> {
        for (vu, data) in &self.variant_units {
            let labels: HashSet<&ReadingLabel> = data.readings.iter().map(|r| &r.label).collect();

            for reading in &data.readings {
                if reading.label.is_lacuna() {
                    continue;
                }
                for parent in reading.parent.conjuncts() {
                    if parent == &reading.label {
                        return Err(CbgmError::SelfParentingReading {
                            variant_unit: vu.clone(),
                            label: reading.label.clone(),
                        });
                    }
                    if !labels.contains(parent) {
                        return Err(CbgmError::UnknownParentLabel {
                            variant_unit: vu.clone(),
                            label: reading.label.clone(),
                            unknown_parent: parent.clone(),
                        });
                    }
                }
            }

            let mut graph: DiGraph<ReadingLabel> = DiGraph::default();
            for reading in &data.readings {
                graph.add_vertex(reading.label.clone());
                for parent in reading.parent.conjuncts() {
                    graph.add_edge(parent.clone(), reading.label.clone());
                }
            }
            if let Some((parent, child)) = graph.find_cycle_edge() {
                return Err(CbgmError::CyclicLocalStemma {
                    variant_unit: vu.clone(),
                    parent,
                    child,
                });
            }
        }

        Ok(())
    }

    /// All readings at a variant unit, as `(label, parent)` pairs.
    #[must_use]
    pub fn readings_at(&self, vu: &VariantUnitId) -> Vec<(&ReadingLabel, &ParentExpr)> {
        self.variant_units
            .get(vu)
            .map(|data| data.readings.iter().map(|r| (&r.label, &r.parent)).collect())
            .unwrap_or_default()
    }

    /// Full [`Reading`] record for a label at a variant unit.
    #[must_use]
    pub fn reading(&self, vu: &VariantUnitId, label: &ReadingLabel) -> Option<&Reading> {
        self.variant_units
            .get(vu)?
            .readings
            .iter()
            .find(|r| &r.label == label)
    }

    #[must_use]
    pub fn attesters_of(&self, vu: &VariantUnitId, label: &ReadingLabel) -> HashSet<Witness> {
        self.variant_units
            .get(vu)
            .and_then(|data| data.support.get(label))
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn reading_of(&self, witness: &Witness, vu: &VariantUnitId) -> Option<&ReadingLabel> {
        self.by_witness.get(witness)?.get(vu)
    }

    #[must_use]
    pub fn all_readings_of(&self, witness: &Witness) -> HashMap<&VariantUnitId, &ReadingLabel> {
        self.by_witness
            .get(witness)
            .map(|m| m.iter().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains_witness(&self, witness: &Witness) -> bool {
        self.by_witness.contains_key(witness)
    }

    #[must_use]
    pub fn contains_variant_unit(&self, vu: &VariantUnitId) -> bool {
        self.variant_units.contains_key(vu)
    }

    /// All witnesses, sorted in the historical `A`, papyri, majuscule,
    /// minuscule, lectionary order.
    #[must_use]
    pub fn all_manuscripts(&self) -> Vec<&Witness> {
        let mut mss: Vec<&Witness> = self.by_witness.keys().collect();
        mss.sort_by_key(|w| w.sort_key());
        mss
    }

    /// All variant units, sorted by their location-then-range key.
    #[must_use]
    pub fn all_variant_units(&self) -> Vec<&VariantUnitId> {
        let mut vus: Vec<&VariantUnitId> = self.variant_units.keys().collect();
        vus.sort_by_key(|vu| vu.sort_key());
        vus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(label: &str, parent: &str) -> Reading {
        Reading {
            label: ReadingLabel::from(label),
            text: String::new(),
            parent: ParentExpr::parse(parent),
        }
    }

    fn witnesses(names: &[&str]) -> HashSet<Witness> {
        names.iter().map(|n| Witness::from(*n)).collect()
    }

    #[test]
    fn rejects_duplicate_attestation_at_one_variant_unit() {
        let vu = VariantUnitId("B04K21V20/2".to_string());
        let rows = vec![
            (vu.clone(), reading("a", "INIT"), witnesses(&["01"])),
            (vu, reading("b", "a"), witnesses(&["01"])),
        ];
        assert!(matches!(
            DataStore::build(rows),
            Err(CbgmError::DuplicateAttestation { .. })
        ));
    }

    #[test]
    fn rejects_cyclic_local_stemma() {
        let vu = VariantUnitId("B04K21V20/2".to_string());
        let rows = vec![
            (vu.clone(), reading("a", "b"), witnesses(&["01"])),
            (vu, reading("b", "a"), witnesses(&["02"])),
        ];
        assert!(matches!(
            DataStore::build(rows),
            Err(CbgmError::CyclicLocalStemma { .. })
        ));
    }

    #[test]
    fn rejects_unknown_parent_label() {
        let vu = VariantUnitId("B04K21V20/2".to_string());
        let rows = vec![(vu, reading("a", "z"), witnesses(&["01"]))];
        assert!(matches!(
            DataStore::build(rows),
            Err(CbgmError::UnknownParentLabel { .. })
        ));
    }

    #[test]
    fn accepts_well_formed_store_and_answers_queries() {
        let vu = VariantUnitId("B04K21V20/2".to_string());
        let rows = vec![
            (vu.clone(), reading("a", "INIT"), witnesses(&["A", "01"])),
            (vu.clone(), reading("b", "a"), witnesses(&["02", "03"])),
        ];
        let store = DataStore::build(rows).unwrap();

        assert_eq!(
            store.reading_of(&Witness::from("02"), &vu),
            Some(&ReadingLabel::from("b"))
        );
        assert_eq!(store.attesters_of(&vu, &ReadingLabel::from("a")).len(), 2);
        assert_eq!(store.all_manuscripts().len(), 4);
    }
}
