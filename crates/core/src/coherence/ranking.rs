//! The "standard competition ranking" (1, 1, 1, 4, ...) shared by
//! pre-genealogical and genealogical coherence tables.
//!
//! `_RANK` is the dense 1-based running position in the already-sorted
//! table. `_NR` is the rank of the first row in the current tie group, so
//! rows with an equal tie key share an `_NR` while `_RANK` keeps advancing —
//! the "skip" pattern `1, 1, 1, 4, 5, 5, 7, ...`. A row whose `force_zero`
//! predicate holds (used for genealogical rows with no direction, `D = "-"`)
//! gets `_RANK = _NR = 0` and breaks the tie chain for subsequent rows,
//! mirroring the reset that happens in the source material when a row is
//! excluded from ranking.

/// Assigns `_RANK`/`_NR` to an already-sorted slice of rows.
///
/// `tie_key` returns the value two rows must share to be considered tied.
/// `force_zero` marks rows that are excluded from ranking entirely.
/// `set_rank` receives `(row, rank, nr)` for every row, in order.
pub fn assign_ranks<T, K: PartialEq>(
    rows: &mut [T],
    tie_key: impl Fn(&T) -> K,
    force_zero: impl Fn(&T) -> bool,
    mut set_rank: impl FnMut(&mut T, u32, u32),
) {
    let mut tie_group_start = 0u32;
    let mut prev_key: Option<K> = None;

    for (index, row) in rows.iter_mut().enumerate() {
        let position = u32::try_from(index + 1).unwrap_or(u32::MAX);

        if force_zero(row) {
            set_rank(row, 0, 0);
            prev_key = None;
            continue;
        }

        let key = tie_key(row);
        let nr = if prev_key.as_ref() == Some(&key) {
            tie_group_start
        } else {
            tie_group_start = position;
            position
        };
        set_rank(row, position, nr);
        prev_key = Some(key);
    }
}
