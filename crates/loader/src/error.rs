//! Loader-specific error taxonomy.

use cbgm_core::CbgmError;

#[derive(Debug)]
pub enum LoaderError {
    /// The document is not valid YAML/JSON for the dataset shape.
    Deserialize(String),
    /// The document's file extension is neither `.yaml`/`.yml` nor `.json`.
    UnknownFormat(String),
    /// A connectivity specification string did not match `N` or `N%`.
    MalformedConnectivity(String),
    /// A variant unit listed fewer or more witnesses than the declared
    /// manuscript universe (plus `A`).
    IncompleteCoverage { variant_unit: String },
    /// The assembled store failed a [`cbgm_core`] invariant.
    Store(CbgmError),
}

impl From<CbgmError> for LoaderError {
    fn from(err: CbgmError) -> Self {
        Self::Store(err)
    }
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deserialize(msg) => write!(f, "failed to parse dataset: {msg}"),
            Self::UnknownFormat(ext) => write!(f, "unrecognized dataset format: {ext}"),
            Self::MalformedConnectivity(raw) => {
                write!(f, "malformed connectivity specification: {raw}")
            }
            Self::IncompleteCoverage { variant_unit } => write!(
                f,
                "variant unit {variant_unit} does not cover the full witness universe"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LoaderError {}
