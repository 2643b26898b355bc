//! Powerset enumeration and scoring for component G.

use std::fs;
use std::path::Path;

use hashbrown::{HashMap, HashSet};

use crate::coherence::genealogical::GenealogicalCoherence;
use crate::error::CbgmError;
use crate::flow::parent_search::{ConnectivityBound, ParentSearch};
use crate::store::DataStore;
use crate::types::{ParentExpr, VariantUnitId, Witness};

/// Matches the unrestricted default rank bound used by the original
/// combinations-of-ancestors search (it never applies a real connectivity
/// cap; this just keeps obviously-unreachable rows out).
const UNRESTRICTED_MAX_RANK: u32 = 499;

/// One scored row of the combinations-of-ancestors table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationRow {
    pub members: Vec<Witness>,
    pub vorfanz: usize,
    pub stellen: u32,
    pub post: u32,
    pub fragl: u32,
    pub offen: u32,
    pub hinweis: bool,
    pub sum_rank: u64,
    pub ranks: Vec<u32>,
    pub vus_post: Vec<String>,
}

struct VuCandidates {
    /// `(witness set, max generation)` for every combination found to
    /// explain this variant unit's reading.
    combos: Vec<(HashSet<Witness>, u32)>,
}

/// Computes and persists the combinations-of-ancestors table for `w1`.
///
/// Returns `Ok(None)` without writing anything if `output_path` already
/// exists (the skip-if-exists rule). Otherwise returns the rows actually
/// written, sorted and `Hinweis`-marked as they were spooled to CSV.
///
/// # Errors
///
/// Propagates any [`CbgmError`] raised while computing genealogical
/// coherence for `w1`, or an I/O failure writing the CSV.
pub fn combinations_of_ancestors(
    store: &DataStore,
    w1: Witness,
    max_comb_len: Option<usize>,
    allow_incomplete: bool,
    output_path: &Path,
) -> Result<Option<Vec<CombinationRow>>, CbgmError> {
    if output_path.exists() {
        tracing::info!(witness = %w1, path = %output_path.display(), "skipping, output already exists");
        return Ok(None);
    }

    let coh = GenealogicalCoherence::compute(store, w1.clone())?;
    let potential_ancestors: Vec<Witness> = coh
        .potential_ancestors()
        .into_iter()
        .cloned()
        .collect();

    let ranks: HashMap<Witness, u32> = coh
        .rows()
        .iter()
        .map(|row| (row.w2.clone(), row.nr))
        .collect();

    let my_vus: Vec<&VariantUnitId> = {
        let mut vus: Vec<&VariantUnitId> = store.all_readings_of(&w1).keys().copied().collect();
        vus.sort_by_key(|vu| vu.sort_key());
        vus
    };

    let mut vu_map: HashMap<&VariantUnitId, VuCandidates> = HashMap::new();
    for vu in &my_vus {
        let Some(label) = store.reading_of(&w1, vu) else { continue };
        let Some(reading) = store.reading(vu, label) else { continue };
        if matches!(reading.parent, ParentExpr::Unclear) {
            continue;
        }
        let search = ParentSearch::new(&coh, vu, ConnectivityBound::MaxRank(UNRESTRICTED_MAX_RANK));
        let found = search.search(label, &reading.parent);
        let combos = found
            .into_iter()
            .map(|combo| {
                let generation = combo.iter().map(|m| m.generation).max().unwrap_or(0);
                let witnesses: HashSet<Witness> = combo
                    .iter()
                    .filter(|m| m.witness_index != usize::MAX)
                    .map(|m| search.witness(m.witness_index).clone())
                    .collect();
                (witnesses, generation)
            })
            .collect();
        vu_map.insert(vu, VuCandidates { combos });
    }

    let mut rows = Vec::new();
    let mut best_explanations: HashMap<usize, u32> = HashMap::new();

    for candidate in powerset_ascending(&potential_ancestors, max_comb_len) {
        if candidate.is_empty() {
            continue;
        }
        if let Some(row) = score_combination(&candidate, &my_vus, &vu_map, allow_incomplete, &ranks) {
            if row.offen == 0 {
                let entry = best_explanations.entry(row.vorfanz).or_insert(0);
                *entry = (*entry).max(row.stellen);
            }
            rows.push(row);
        }
    }

    rows.sort_by(|a, b| {
        b.stellen
            .cmp(&a.stellen)
            .then(b.post.cmp(&a.post))
            .then(a.offen.cmp(&b.offen))
            .then(a.fragl.cmp(&b.fragl))
            .then(a.vorfanz.cmp(&b.vorfanz))
            .then(a.sum_rank.cmp(&b.sum_rank))
    });

    for row in &mut rows {
        row.hinweis =
            row.offen == 0 && best_explanations.get(&row.vorfanz) == Some(&row.stellen);
    }

    write_csv(output_path, &rows)?;

    Ok(Some(rows))
}

fn score_combination(
    candidate: &[Witness],
    my_vus: &[&VariantUnitId],
    vu_map: &HashMap<&VariantUnitId, VuCandidates>,
    allow_incomplete: bool,
    ranks: &HashMap<Witness, u32>,
) -> Option<CombinationRow> {
    let candidate_set: HashSet<Witness> = candidate.iter().cloned().collect();

    let mut stellen = 0u32;
    let mut post = 0u32;
    let mut fragl = 0u32;
    let mut offen = 0u32;
    let mut vus_post = Vec::new();

    for vu in my_vus {
        let Some(candidates) = vu_map.get(*vu) else {
            fragl += 1;
            continue;
        };

        let best_gen = candidates
            .combos
            .iter()
            .filter(|(witnesses, _)| witnesses.is_subset(&candidate_set))
            .map(|(_, gen)| *gen)
            .min();

        match best_gen {
            None if !allow_incomplete => return None,
            None => offen += 1,
            Some(1) => stellen += 1,
            Some(2) => {
                post += 1;
                vus_post.push(vu.as_str().to_string());
            }
            Some(_) => offen += 1,
        }
    }

    let sum_rank: u64 = candidate
        .iter()
        .map(|w| u64::from(ranks.get(w).copied().unwrap_or(0)))
        .sum();
    let row_ranks: Vec<u32> = candidate.iter().map(|w| ranks.get(w).copied().unwrap_or(0)).collect();

    Some(CombinationRow {
        members: candidate.to_vec(),
        vorfanz: candidate.len(),
        stellen,
        post,
        fragl,
        offen,
        hinweis: false,
        sum_rank,
        ranks: row_ranks,
        vus_post,
    })
}

/// Enumerates the powerset of `items` in ascending subset-size order,
/// stopping after `cap` combinations if given (the empty set counts towards
/// the cap, matching the original's `2**n` accounting).
fn powerset_ascending(items: &[Witness], cap: Option<usize>) -> Vec<Vec<Witness>> {
    let n = items.len();
    let total = 1usize.checked_shl(n as u32).unwrap_or(usize::MAX);
    let limit = cap.map_or(total, |c| c.min(total));

    let mut out = Vec::with_capacity(limit);
    'sizes: for size in 0..=n {
        for combo in combinations_of_size(items, size) {
            if out.len() >= limit {
                break 'sizes;
            }
            out.push(combo);
        }
    }
    out
}

fn combinations_of_size(items: &[Witness], size: usize) -> Vec<Vec<Witness>> {
    if size == 0 {
        return vec![Vec::new()];
    }
    if size > items.len() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut indices: Vec<usize> = (0..size).collect();
    loop {
        out.push(indices.iter().map(|&i| items[i].clone()).collect());

        let mut i = size;
        loop {
            if i == 0 {
                return out;
            }
            i -= 1;
            if indices[i] != i + items.len() - size {
                break;
            }
        }
        indices[i] += 1;
        for j in (i + 1)..size {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

fn write_csv(path: &Path, rows: &[CombinationRow]) -> Result<(), CbgmError> {
    let tmp_path = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp_path)
            .map_err(|_| CbgmError::OutputExists(path.display().to_string()))?;
        writer
            .write_record(["Vorf", "Vorfanz", "Stellen", "Post", "Fragl", "Offen", "Hinweis", "sum_rank", "ranks", "vus_post"])
            .ok();
        for row in rows {
            let vorf = row.members.iter().map(|w| w.0.as_str()).collect::<Vec<_>>().join(", ");
            let ranks = row.ranks.iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
            let vus_post = row.vus_post.join(", ");
            writer
                .write_record([
                    vorf.as_str(),
                    &row.vorfanz.to_string(),
                    &row.stellen.to_string(),
                    &row.post.to_string(),
                    &row.fragl.to_string(),
                    &row.offen.to_string(),
                    if row.hinweis { "<<" } else { "" },
                    &row.sum_rank.to_string(),
                    ranks.as_str(),
                    vus_post.as_str(),
                ])
                .ok();
        }
        writer.flush().ok();
    }
    fs::rename(&tmp_path, path).map_err(|_| CbgmError::OutputExists(path.display().to_string()))
}
