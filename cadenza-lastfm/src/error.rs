use cadenza_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LastfmError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),

    #[error("Invalid response: {0}")]
    Decode(#[from] reqwest::Error),

    #[error("Service returned status {status}")]
    Status { status: u16 },

    /// Error payload such as `{"error":10,"message":"Invalid API key"}`
    #[error("Last.fm error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Invalid service URL: {0}")]
    Url(#[from] url::ParseError),
}

impl LastfmError {
    #[must_use]
    pub fn into_core(self, provider: &str) -> CoreError {
        CoreError::SearchProviderFailed {
            provider: provider.to_string(),
            reason: self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LastfmError>;
