//! Data model: witnesses, variant units, readings and their local-stemma
//! parent expressions.

use std::cmp::Ordering;
use std::fmt;

/// A manuscript identifier, e.g. `"01"`, `"P75"`, or the virtual witness `"A"`
/// representing the reconstructed initial text.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Witness(pub String);

impl Witness {
    pub const INITIAL_TEXT: &'static str = "A";

    #[must_use]
    pub fn is_initial_text(&self) -> bool {
        self.0 == Self::INITIAL_TEXT
    }

    /// Sort key reproducing the historical witness ordering: `A` first, then
    /// papyri, then majuscules, then minuscules, then lectionaries, each
    /// ordered by the first run of digits in the identifier.
    #[must_use]
    pub fn sort_key(&self) -> (u64, String) {
        let id = self.0.as_str();
        let num_match = first_digit_run(id);
        let (num, remainder) = match num_match {
            Some((start, end)) => {
                let num: u64 = id[start..end].parse().unwrap_or(0);
                let mut rem = String::with_capacity(id.len());
                rem.push_str(&id[..start]);
                rem.push_str(&id[end..]);
                (num, rem)
            }
            None => (0, id.to_string()),
        };

        let (num, offset) = if id.starts_with('0') {
            (num, 20_000)
        } else if id.starts_with('P') {
            (num, 10_000)
        } else if id == Self::INITIAL_TEXT {
            (1, 0)
        } else if id.starts_with('L') {
            (num, 40_000)
        } else if id.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            (num, 30_000)
        } else {
            (num, 0)
        };

        (offset + num, remainder)
    }
}

fn first_digit_run(s: &str) -> Option<(usize, usize)> {
    let bytes = s.as_bytes();
    let start = bytes.iter().position(u8::is_ascii_digit)?;
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    Some((start, end))
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Witness {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Witness {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A variant unit reference, e.g. `"B04K21V20-24/2-10"`, kept as the raw
/// string alongside a precomputed sort key.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantUnitId(pub String);

impl VariantUnitId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-key sort value: location-encoded primary key, start-of-range
    /// secondary key. Composite (comma-joined) identifiers sort by their
    /// first component.
    #[must_use]
    pub fn sort_key(&self) -> (i64, OrderedFloat) {
        numify(&self.0)
    }
}

/// A thin wrapper giving `f64` a total order, needed because variant-unit
/// sort keys are compared and the input is always finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedFloat(pub f64);

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn numify(vu: &str) -> (i64, OrderedFloat) {
    let (a_part, b_part) = vu.split_once('/').unwrap_or((vu, "0"));
    let b_part = b_part.split(',').next().unwrap_or(b_part);

    let b = if let Some((lo, hi)) = b_part.split_once('-') {
        let (lo, hi): (i64, i64) = (lo.parse().unwrap_or(0), hi.parse().unwrap_or(0));
        format!("{lo}.{hi}").parse().unwrap_or(0.0)
    } else {
        b_part.parse::<i64>().unwrap_or(0) as f64
    };

    let a = parse_location(a_part);

    (a, OrderedFloat(b))
}

fn parse_location(a: &str) -> i64 {
    if let Some(bits) = parse_vref(a) {
        return 100_000 * bits[0] + 1_000 * bits[1] + bits[2];
    }
    if let Some((context, offset)) = parse_context(a) {
        return match context.as_str() {
            "inscriptio" => 100_000,
            "subscriptio" => 100_000 + 1_000 * 99,
            other => 100_000 + 1_000 * other.parse::<i64>().unwrap_or(0) + offset,
        };
    }
    a.parse().unwrap_or(0)
}

/// Matches `B<digits>K<digits>V<digits>` at the start of the string.
fn parse_vref(a: &str) -> Option<[i64; 3]> {
    let rest = a.strip_prefix('B')?;
    let (book, rest) = split_digits(rest)?;
    let rest = rest.strip_prefix('K')?;
    let (chapter, rest) = split_digits(rest)?;
    let rest = rest.strip_prefix('V')?;
    let (verse, _) = split_digits(rest)?;
    Some([book, chapter, verse])
}

/// Matches `<anything-without-dot>.<digits-or-word>.<digits>?` (context refs
/// such as `title.inscriptio` or `prologue.3.1`).
fn parse_context(a: &str) -> Option<(String, i64)> {
    let mut parts = a.splitn(3, '.');
    let _head = parts.next()?;
    let label = parts.next()?.to_string();
    let offset = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    Some((label, offset))
}

fn split_digits(s: &str) -> Option<(i64, &str)> {
    let end = s.bytes().position(|b| !b.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((s[..end].parse().ok()?, &s[end..]))
}

/// A reading's label at a variant unit: `"a"`, `"b1"`, or one of the three
/// sentinel labels.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadingLabel(pub String);

impl ReadingLabel {
    pub const LACUNA: &'static str = "LAC";
    pub const INIT: &'static str = "INIT";
    pub const OL_PARENT: &'static str = "OL_PARENT";
    pub const UNCLEAR: &'static str = "UNCL";

    #[must_use]
    pub fn is_lacuna(&self) -> bool {
        self.0 == Self::LACUNA
    }
}

impl fmt::Display for ReadingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReadingLabel {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The parentage of a reading in its local stemma.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParentExpr {
    /// This reading is the initial text at this variant unit.
    Initial,
    /// This reading is the parent across an overlapping variant unit whose
    /// initial text is lacunose here.
    OverlapParent,
    /// Parentage is unknown.
    Unclear,
    /// One or more conjunct parent readings (`a`, or the multi-parent split
    /// `a&b`).
    Labels(Vec<ReadingLabel>),
}

impl ParentExpr {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            ReadingLabel::INIT => Self::Initial,
            ReadingLabel::OL_PARENT => Self::OverlapParent,
            ReadingLabel::UNCLEAR => Self::Unclear,
            other => Self::Labels(other.split('&').map(ReadingLabel::from).collect()),
        }
    }

    #[must_use]
    pub fn conjuncts(&self) -> &[ReadingLabel] {
        match self {
            Self::Labels(labels) => labels,
            Self::Initial | Self::OverlapParent | Self::Unclear => &[],
        }
    }

    /// True when this expression is exactly the single given label (used by
    /// the relation resolver to compare a reading against its neighbour's
    /// whole, unsplit parent expression).
    #[must_use]
    pub fn is_single(&self, label: &ReadingLabel) -> bool {
        matches!(self, Self::Labels(labels) if labels.len() == 1 && &labels[0] == label)
    }
}

impl fmt::Display for ParentExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => f.write_str(ReadingLabel::INIT),
            Self::OverlapParent => f.write_str(ReadingLabel::OL_PARENT),
            Self::Unclear => f.write_str(ReadingLabel::UNCLEAR),
            Self::Labels(labels) => {
                let joined = labels
                    .iter()
                    .map(|l| l.0.as_str())
                    .collect::<Vec<_>>()
                    .join("&");
                f.write_str(&joined)
            }
        }
    }
}

/// One competing reading at a variant unit.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub label: ReadingLabel,
    pub text: String,
    pub parent: ParentExpr,
}

/// One manuscript's attestation of a reading at a variant unit.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestation {
    pub witness: Witness,
    pub variant_unit: VariantUnitId,
    pub label: ReadingLabel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn witness_sort_key_orders_initial_text_first_among_digit_free() {
        let a = Witness::from("A").sort_key();
        let other = Witness::from("Xyz").sort_key();
        assert!(other < a, "a non-digit, non-A identifier sorts before A");
    }

    #[test]
    fn witness_sort_key_orders_papyri_before_majuscules() {
        let p75 = Witness::from("P75").sort_key();
        let maj_01 = Witness::from("01").sort_key();
        assert!(p75 < maj_01);
    }

    #[test]
    fn numify_orders_simple_verse_refs_by_location_then_range() {
        let a = VariantUnitId("B04K21V20/2-4".to_string()).sort_key();
        let b = VariantUnitId("B04K21V20/2-10".to_string()).sort_key();
        assert!(a < b);
    }

    #[test]
    fn numify_composite_sorts_by_first_component() {
        let composite =
            VariantUnitId("B04K01V50/2-36,B04K01V51/2-22".to_string()).sort_key();
        let simple = VariantUnitId("B04K01V50/2-36".to_string()).sort_key();
        assert_eq!(composite, simple);
    }

    #[test]
    fn parent_expr_splits_multi_parent_conjuncts() {
        let parsed = ParentExpr::parse("c&d");
        assert_eq!(
            parsed.conjuncts(),
            &[ReadingLabel::from("c"), ReadingLabel::from("d")]
        );
    }

    #[test]
    fn parent_expr_recognizes_sentinels() {
        assert_eq!(ParentExpr::parse("INIT"), ParentExpr::Initial);
        assert_eq!(ParentExpr::parse("OL_PARENT"), ParentExpr::OverlapParent);
        assert_eq!(ParentExpr::parse("UNCL"), ParentExpr::Unclear);
    }
}
