//! Textual-flow builder (component F): parent-combination search applied
//! across every witness at a variant unit, assembled into a directed graph
//! and rendered as a DOT description.

use std::fmt::Write as _;

use crate::coherence::genealogical::GenealogicalCoherence;
use crate::error::CbgmError;
use crate::flow::parent_search::{select_for_textual_flow, ConnectivityBound, ParentSearch};
use crate::store::DataStore;
use crate::types::{VariantUnitId, Witness};

/// Deterministic fill colours keyed by a reading label's first character,
/// cycling through a small pastel palette.
const PALETTE: [&str; 12] = [
    "#FF8A8A", "#FF86E3", "#FF86C2", "#FE8BF0", "#EA8DFE", "#DD88FD", "#AD8BFE", "#FFA4FF",
    "#EAA6EA", "#D698FE", "#CEA8F4", "#BCB4F3",
];

#[must_use]
fn fill_colour(first_char: char) -> &'static str {
    if !first_char.is_ascii_lowercase() {
        return "#cccccc";
    }
    let index = (first_char as usize - 'a' as usize) % PALETTE.len();
    PALETTE[index]
}

#[must_use]
fn darken(hex: &str) -> String {
    let bytes = hex.trim_start_matches('#');
    if bytes.len() != 6 {
        return hex.to_string();
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0).saturating_sub(75);
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(&bytes[0..2]),
        channel(&bytes[2..4]),
        channel(&bytes[4..6])
    )
}

/// One witness's chosen parent arcs at a variant unit, or none if no
/// explaining combination was found.
struct WitnessFlow {
    witness: Witness,
    reading_label: String,
    parents: Vec<(Witness, u32, u32)>,
}

/// Builds the textual-flow graph for one variant unit at one connectivity
/// setting.
pub struct TextualFlowBuilder<'a> {
    store: &'a DataStore,
    vu: &'a VariantUnitId,
    bound: ConnectivityBound,
    perfect_only: bool,
}

impl<'a> TextualFlowBuilder<'a> {
    #[must_use]
    pub fn new(store: &'a DataStore, vu: &'a VariantUnitId, bound: ConnectivityBound) -> Self {
        Self { store, vu, bound, perfect_only: false }
    }

    #[must_use]
    pub fn perfect_coherence_only(mut self, perfect_only: bool) -> Self {
        self.perfect_only = perfect_only;
        self
    }

    /// Runs parent-combination search for every witness attesting at `vu`
    /// and assembles the resulting arcs into a DOT-formatted digraph.
    ///
    /// # Errors
    ///
    /// Returns [`CbgmError::ForestDetected`] in perfect-coherence mode if any
    /// non-`A` witness ends up with no parent.
    pub fn build(&self) -> Result<String, CbgmError> {
        let readings = self.store.readings_at(self.vu);
        let mut flows = Vec::new();

        for (label, parent_expr) in &readings {
            if label.is_lacuna() {
                continue;
            }
            for witness in self.store.attesters_of(self.vu, label) {
                tracing::debug!(%witness, variant_unit = self.vu.as_str(), "computing genealogical coherence for textual flow");
                let coh = GenealogicalCoherence::compute(self.store, witness.clone())
                    .map_err(|_| CbgmError::ForestDetected { variant_unit: self.vu.clone() })?;
                let search = ParentSearch::new(&coh, self.vu, self.bound);
                let combinations = search.search(label, parent_expr);
                let parents = select_for_textual_flow(&combinations)
                    .map(|combo| {
                        combo
                            .iter()
                            .filter(|m| m.witness_index != usize::MAX)
                            .map(|m| (search.witness(m.witness_index).clone(), m.rank, m.perc1))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();

                if parents.is_empty() && !witness.is_initial_text() {
                    if self.perfect_only {
                        return Err(CbgmError::ForestDetected { variant_unit: self.vu.clone() });
                    }
                    tracing::debug!(%witness, "no parent found; leaving isolated in textual flow");
                }

                flows.push(WitnessFlow {
                    witness,
                    reading_label: label.0.clone(),
                    parents,
                });
            }
        }

        Ok(render_dot(self.vu, &flows))
    }
}

fn render_dot(vu: &VariantUnitId, flows: &[WitnessFlow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph \"{}\" {{", vu.as_str());

    for flow in flows {
        let fill = fill_colour(flow.reading_label.chars().next().unwrap_or('?'));
        let border = darken(fill);
        let node_label = if flow.parents.len() > 1 {
            let parts: Vec<String> = flow
                .parents
                .iter()
                .map(|(w, rank, _)| format!("{w}.{rank}"))
                .collect();
            format!("{}/[{}] ({})", flow.witness, parts.join(", "), flow.reading_label)
        } else if let Some((_, rank, _)) = flow.parents.first() {
            if *rank == 1 {
                format!("{} ({})", flow.witness, flow.reading_label)
            } else {
                format!("{}/{} ({})", flow.witness, rank, flow.reading_label)
            }
        } else {
            format!("{} ({})", flow.witness, flow.reading_label)
        };

        let _ = writeln!(
            out,
            "  \"{}\" [label=\"{}\", style=filled, fillcolor=\"{}\", color=\"{}\"];",
            flow.witness, node_label, fill, border
        );
    }

    for flow in flows {
        for (parent, rank, perc) in &flow.parents {
            let _ = writeln!(
                out,
                "  \"{}\" -> \"{}\" [label=\"rank {} / {}%\"];",
                parent, flow.witness, rank, perc
            );
        }
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParentExpr, Reading, ReadingLabel};
    use hashbrown::HashSet;

    fn reading(label: &str, parent: &str) -> Reading {
        Reading {
            label: ReadingLabel::from(label),
            text: String::new(),
            parent: ParentExpr::parse(parent),
        }
    }

    #[test]
    fn renders_a_digraph_with_quoted_witness_nodes() {
        let vu = VariantUnitId("B01K01V01/1".to_string());
        let store = DataStore::build(vec![
            (
                vu.clone(),
                reading("a", "INIT"),
                HashSet::from([Witness::from("A"), Witness::from("D")]),
            ),
            (vu.clone(), reading("b", "a"), HashSet::from([Witness::from("C")])),
        ])
        .unwrap();

        let dot = TextualFlowBuilder::new(&store, &vu, ConnectivityBound::MaxRank(499))
            .build()
            .unwrap();

        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("\"C\""));
    }

    #[test]
    fn perfect_coherence_mode_rejects_forests() {
        let vu = VariantUnitId("B01K01V01/1".to_string());
        // Two disjoint readings both with unclear parentage: no arcs possible.
        let store = DataStore::build(vec![
            (vu.clone(), reading("a", "UNCL"), HashSet::from([Witness::from("X")])),
            (vu.clone(), reading("b", "UNCL"), HashSet::from([Witness::from("Y")])),
        ])
        .unwrap();

        let result = TextualFlowBuilder::new(&store, &vu, ConnectivityBound::MaxRank(499))
            .perfect_coherence_only(true)
            .build();

        assert!(result.is_err());
    }
}
