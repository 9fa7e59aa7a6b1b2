use std::path::PathBuf;
use thiserror::Error;

/// Error raised while loading or converting configuration documents
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading configuration '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unknown or unsupported config format for path: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to serialize config value: {0}")]
    Serialization(String),

    #[error("Failed to deserialize config node: {0}")]
    Deserialization(String),
}
