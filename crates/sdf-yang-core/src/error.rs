use thiserror::Error;

/// Fatal translation failures.
///
/// Only failures to load or parse the initial input abort a run. Everything
/// else (malformed facets, unresolved references, unsupported combinations)
/// is recovered locally, logged, and tallied in [`crate::diagnostics`].
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("yang parse error: {0}")]
    YangParse(String),

    #[error("sdf parse error: {0}")]
    SdfParse(#[from] serde_json::Error),

    #[error("unknown input kind: {0}")]
    UnknownInput(String),

    #[error("empty input")]
    EmptyInput,
}
