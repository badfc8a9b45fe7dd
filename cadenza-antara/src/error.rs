use cadenza_core::CoreError;
use thiserror::Error;

/// Errors from the track, home feed and geolocation services
#[derive(Debug, Error)]
pub enum AntaraError {
    /// Request could not be sent or timed out
    #[error("Request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    Decode(#[from] reqwest::Error),

    #[error("Service returned status {status}")]
    Status { status: u16 },

    #[error("Invalid service URL: {0}")]
    Url(#[from] url::ParseError),

    /// Country code was not two ASCII letters
    #[error("Invalid country code: {code:?}")]
    InvalidCountry { code: String },
}

impl AntaraError {
    /// Wrap into the core error for a named provider
    #[must_use]
    pub fn into_core(self, provider: &str) -> CoreError {
        CoreError::TrackProviderFailed {
            provider: provider.to_string(),
            reason: self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AntaraError>;
