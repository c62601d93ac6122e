// ⛔ Pipeline Errors - the fatal classes of the resolution core
//
// Malformed values and left-join misses are NOT errors: they normalize to
// empty / None on the surviving row. Only violations of the
// one-row-per-tract invariant stop the pipeline.

use thiserror::Error;

/// Result type for the resolution core
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A reference table has conflicting rows for one join key
    #[error("{stage}: reference table has {rows} conflicting rows for join key '{key}'")]
    CardinalityViolation {
        stage: String,
        key: String,
        rows: usize,
    },

    /// Two tract rows share a key that must be unique
    #[error("{stage}: duplicate tract key '{key}'")]
    DuplicateTractKey { stage: String, key: String },

    /// More central-city corrections than the configured bound
    #[error("central-city correction flipped {found} rows, limit is {limit}")]
    AnomalyLimitExceeded { found: usize, limit: usize },

    /// A stage ran before the stage it depends on
    #[error("{stage} requires {requires} to run first")]
    StageOrder { stage: String, requires: String },

    /// A required column is missing after header normalization
    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },
}
