use thiserror::Error;

/// Errors raised at the edges of the engine: loading inputs, validating
/// configuration, writing exports.
///
/// The counting and scoring stages themselves never fail; degenerate input
/// simply produces empty results.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A token was listed under two different category labels.
    #[error("token {token:?} is listed under both {first:?} and {second:?}")]
    ConflictingCategory {
        token: String,
        first: String,
        second: String,
    },

    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no periods could be built from the input")]
    NoPeriods,

    #[error("invalid input: {0}")]
    Input(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
