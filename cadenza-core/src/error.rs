use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - edit it if needed and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Lyrics errors
    #[error("Lyrics provider {provider} failed: {reason}")]
    LyricsProviderFailed { provider: String, reason: String },

    // Track metadata errors
    #[error("Track provider {provider} failed: {reason}")]
    TrackProviderFailed { provider: String, reason: String },

    // Search errors
    #[error("Search provider {provider} failed: {reason}")]
    SearchProviderFailed { provider: String, reason: String },

    // Device errors
    #[error("Wake lock unavailable: {reason}")]
    WakeLockUnavailable { reason: String },

    // Network errors
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("HTTP middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
