use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A numeric attribute needed for vector construction is missing.
    #[error("malformed record {id}: missing numeric field `{field}`")]
    MalformedRecord { id: String, field: &'static str },

    #[error("dimension mismatch: expected vectors of width {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Both operands have the same width but were built from different
    /// genre vocabularies, so their genre columns do not line up.
    #[error("vocabulary mismatch: playlist vector and candidate table use different genre vocabularies")]
    VocabularyMismatch,

    #[error("invalid top-k: k must be at least 1")]
    InvalidTopK,

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
