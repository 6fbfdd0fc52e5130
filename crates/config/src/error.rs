use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_value(key: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
