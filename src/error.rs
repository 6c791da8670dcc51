//! Error types for the similar-media crate.

use thiserror::Error;

use crate::model::{AlbumId, OwnerId};

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Detection errors
    #[error("Album not found: {0}")]
    NotFound(AlbumId),

    #[error("Access denied: owner {owner} does not own album {album}")]
    Forbidden { owner: OwnerId, album: AlbumId },

    #[error("Not enough media to compare ({found} usable, at least 2 required)")]
    InsufficientData { found: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cannot decode image: {0}")]
    Decode(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Detection run cancelled")]
    Cancelled,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio_rusqlite::Error> for Error {
    fn from(err: tokio_rusqlite::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl Error {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_)
            | Error::ConfigValidation { .. }
            | Error::MissingConfig(_)
            | Error::TomlParse(_)
            | Error::UrlParse(_) => exit_codes::CONFIG_ERROR,
            Error::Forbidden { .. } => exit_codes::NOT_AUTHORIZED,
            Error::NotFound(_) => exit_codes::NOT_FOUND,
            Error::InsufficientData { .. } => exit_codes::INSUFFICIENT_DATA,
            Error::Storage(_) | Error::Http(_) => exit_codes::STORAGE_ERROR,
            Error::Persistence(_) => exit_codes::PERSISTENCE_ERROR,
            _ => exit_codes::UNEXPECTED_ERROR,
        }
    }
}

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const CONFIG_ERROR: i32 = 3;
    pub const NOT_AUTHORIZED: i32 = 4;
    pub const NOT_FOUND: i32 = 5;
    pub const INSUFFICIENT_DATA: i32 = 6;
    pub const STORAGE_ERROR: i32 = 7;
    pub const PERSISTENCE_ERROR: i32 = 8;
    pub const UNEXPECTED_ERROR: i32 = 9;
}
