use thiserror::Error;

/// Failure of a catalog read.
#[derive(Debug, Error)]
pub enum DataError {
    /// The store call itself failed. Passed through unchanged, never retried.
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// A single-row lookup matched more than one row.
    #[error("{entity} lookup is ambiguous: {key} matched more than one row")]
    Ambiguous { entity: &'static str, key: String },

    #[error("failed to decode {entity} row: {source}")]
    Decode {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type DataResult<T> = Result<T, DataError>;
