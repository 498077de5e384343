use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    #[error("Missing credential: set generation.api_key or GEMINI_API_KEY")]
    MissingCredential,

    #[error("No text chunks found under {0}; refusing to build an empty index")]
    EmptyCorpus(String),

    #[error("Encoder mismatch: index was built with '{expected}', current encoder is '{found}'")]
    EncoderMismatch { expected: String, found: String },

    #[error("Corpus artifacts are inconsistent: {0}")]
    CorruptArtifacts(String),

    #[error("Age group '{0}' not found in the curriculum map")]
    UnknownAgeGroup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
