//! Winnow grammar for the small textual mini-languages in the input
//! contract: connectivity specifications and parent expressions.
//!
//! Grammar:
//! ```text
//! connectivity = INTEGER "%"?
//! parent_expr  = "INIT" | "OL_PARENT" | "UNCL" | label ("&" label)*
//! label        = IDENT
//! ```

use winnow::ascii::dec_uint;
use winnow::combinator::opt;
use winnow::prelude::*;
use winnow::token::literal;
use winnow::ModalResult;

use cbgm_core::flow::parent_search::ConnectivityBound;

use crate::error::LoaderError;

/// Parses a connectivity specification: a bare integer (`"6"`) means
/// [`ConnectivityBound::MaxRank`]; a trailing `%` (`"50%"`) means
/// [`ConnectivityBound::MinPercent`].
///
/// # Errors
///
/// Returns [`LoaderError::MalformedConnectivity`] if `raw` is not
/// `INTEGER` or `INTEGER%`.
pub fn parse_connectivity(raw: &str) -> Result<ConnectivityBound, LoaderError> {
    let mut input = raw;
    connectivity
        .parse_next(&mut input)
        .map_err(|_| LoaderError::MalformedConnectivity(raw.to_string()))
        .and_then(|bound| {
            if input.is_empty() {
                Ok(bound)
            } else {
                Err(LoaderError::MalformedConnectivity(raw.to_string()))
            }
        })
}

fn connectivity(input: &mut &str) -> ModalResult<ConnectivityBound> {
    let value = dec_uint.parse_next(input)?;
    let percent = opt(literal("%")).parse_next(input)?;
    Ok(if percent.is_some() {
        ConnectivityBound::MinPercent(f64::from(value))
    } else {
        ConnectivityBound::MaxRank(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_integer_is_a_max_rank_bound() {
        assert!(matches!(
            parse_connectivity("6"),
            Ok(ConnectivityBound::MaxRank(6))
        ));
    }

    #[test]
    fn trailing_percent_is_a_min_percent_bound() {
        match parse_connectivity("50%") {
            Ok(ConnectivityBound::MinPercent(p)) => assert!((p - 50.0).abs() < f64::EPSILON),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        assert!(matches!(
            parse_connectivity("6x"),
            Err(LoaderError::MalformedConnectivity(_))
        ));
    }
}
