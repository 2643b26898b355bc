//! Deserializable shape of the input data contract and its assembly into a
//! [`cbgm_core::DataStore`].

use std::path::Path;

use hashbrown::HashSet;
use serde::Deserialize;

use cbgm_core::store::DataStore;
use cbgm_core::types::{ParentExpr, Reading, ReadingLabel, VariantUnitId, Witness};

use crate::error::LoaderError;

/// The witness support for one reading record: either an explicit list, or
/// every manuscript except a short exclusion list (the common shorthand for
/// a majority reading).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Support {
    Explicit(Vec<String>),
    AllExcept {
        #[serde(rename = "all_except")]
        except: Vec<String>,
    },
}

impl Support {
    fn resolve(&self, all_mss: &HashSet<Witness>) -> HashSet<Witness> {
        match self {
            Self::Explicit(names) => names.iter().map(|n| Witness::from(n.as_str())).collect(),
            Self::AllExcept { except } => {
                let excluded: HashSet<Witness> =
                    except.iter().map(|n| Witness::from(n.as_str())).collect();
                all_mss.difference(&excluded).cloned().collect()
            }
        }
    }
}

/// One reading record as it appears in the input document.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadingRecord {
    pub label: String,
    #[serde(default)]
    pub text: String,
    pub support: Support,
    /// Absent only for lacuna records (`label == "LAC"`).
    #[serde(default)]
    pub parent: Option<String>,
}

/// A verse's variant units, keyed by the range/word suffix that follows the
/// `/` in the full variant-unit identifier.
pub type VerseUnits = std::collections::BTreeMap<String, Vec<ReadingRecord>>;

/// The full input document: the manuscript universe and the nested
/// verse/variant-unit/reading structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Dataset {
    pub all_mss: Vec<String>,
    #[serde(rename = "struct")]
    pub structure: std::collections::BTreeMap<String, VerseUnits>,
}

/// Parses `raw` as YAML or JSON according to `extension` (`"yaml"`, `"yml"`,
/// or `"json"`) and assembles a validated [`DataStore`].
///
/// # Errors
///
/// Returns [`LoaderError::UnknownFormat`] for an unrecognized extension,
/// [`LoaderError::Deserialize`] for malformed documents,
/// [`LoaderError::IncompleteCoverage`] when a variant unit's readings don't
/// cover the full witness universe, and [`LoaderError::Store`] if the
/// assembled store fails a data-model invariant.
pub fn load_from_str(raw: &str, extension: &str) -> Result<DataStore, LoaderError> {
    let dataset: Dataset = match extension {
        "yaml" | "yml" => {
            serde_yaml::from_str(raw).map_err(|e| LoaderError::Deserialize(e.to_string()))?
        }
        "json" => {
            serde_json::from_str(raw).map_err(|e| LoaderError::Deserialize(e.to_string()))?
        }
        other => return Err(LoaderError::UnknownFormat(other.to_string())),
    };
    build_store(&dataset)
}

/// Convenience wrapper that dispatches on the file's extension.
///
/// # Errors
///
/// See [`load_from_str`]; additionally returns a [`LoaderError::Deserialize`]
/// if the file cannot be read.
pub fn load_from_path(path: &Path) -> Result<DataStore, LoaderError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| LoaderError::Deserialize(e.to_string()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    load_from_str(&raw, extension)
}

fn build_store(dataset: &Dataset) -> Result<DataStore, LoaderError> {
    let mut all_mss: HashSet<Witness> =
        dataset.all_mss.iter().map(|n| Witness::from(n.as_str())).collect();
    all_mss.insert(Witness::from(Witness::INITIAL_TEXT));

    let mut rows: Vec<(VariantUnitId, Reading, HashSet<Witness>)> = Vec::new();

    for (verse, verse_units) in &dataset.structure {
        for (suffix, records) in verse_units {
            let vu = VariantUnitId(format!("{verse}/{suffix}"));
            let mut covered: HashSet<Witness> = HashSet::new();

            for record in records {
                let support = record.support.resolve(&all_mss);
                covered.extend(support.iter().cloned());

                let label = ReadingLabel::from(record.label.as_str());
                let parent = if label.is_lacuna() {
                    ParentExpr::Unclear
                } else {
                    ParentExpr::parse(record.parent.as_deref().unwrap_or(ReadingLabel::UNCLEAR))
                };

                rows.push((
                    vu.clone(),
                    Reading {
                        label,
                        text: record.text.clone(),
                        parent,
                    },
                    support,
                ));
            }

            if covered != all_mss {
                return Err(LoaderError::IncompleteCoverage {
                    variant_unit: vu.0.clone(),
                });
            }
        }
    }

    Ok(DataStore::build(rows)?)
}
