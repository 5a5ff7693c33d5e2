use thiserror::Error;

/// Errors that can occur while reorganizing a file store
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Item not found: {id}")]
    NotFound { id: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unauthorized by remote store: {message}")]
    Unauthorized { message: String },

    #[error("Rate limited by remote store: {message}")]
    RateLimited { message: String },

    #[error("Invalid response from remote store: {message}")]
    InvalidResponse { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for organizer operations
pub type Result<T> = std::result::Result<T, OrganizerError>;
