use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("document produced no indexable chunks")]
    EmptyIndex,

    #[error("embedding dimensionality mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("embedding failed: {0}")]
    Embedding(String),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no document has been ingested yet")]
    NoIndexLoaded,

    #[error("query vector dimensionality mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}
