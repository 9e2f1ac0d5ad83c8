use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatRagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Vector index error: {0}")]
    VectorIndexError(String),

    #[error("Session store error: {0}")]
    SessionError(String),

    #[error("Ingestion error: {0}")]
    IngestError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Custom(String),
}

impl From<reqwest::Error> for ChatRagError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

impl From<::config::ConfigError> for ChatRagError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<redis::RedisError> for ChatRagError {
    fn from(err: redis::RedisError) -> Self {
        Self::SessionError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatRagError>;
