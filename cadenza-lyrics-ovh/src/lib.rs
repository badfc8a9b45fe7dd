//! Plain text lyrics from lyrics.ovh.

use async_trait::async_trait;
use cadenza_core::{
    build_client, CadenzaConfig, CoreError, FetchedLyrics, LyricsProvider, LyricsQuery,
    LyricsResult,
};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "cadenza::lyrics_ovh";

pub const PROVIDER_NAME: &str = "lyrics_ovh";

pub struct LyricsOvhProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

/// Body of both the success and the "No lyrics found" responses
#[derive(Debug, Default, Deserialize)]
struct LyricsOvhResponse {
    #[serde(default)]
    lyrics: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl LyricsOvhProvider {
    pub fn new(client: ClientWithMiddleware, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a provider from the `[network]` and `[services]` config sections.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &CadenzaConfig) -> Result<Self, CoreError> {
        let client = build_client(&config.network)?;
        Ok(Self::new(client, &config.services.lyrics_ovh_url))
    }

    fn lyrics_url(&self, query: &LyricsQuery) -> String {
        format!(
            "{}/v1/{}/{}",
            self.base_url,
            urlencoding::encode(query.artist_name.trim()),
            urlencoding::encode(query.track_name.trim())
        )
    }

    fn not_found() -> FetchedLyrics {
        FetchedLyrics {
            result: LyricsResult::NotFound,
            provider_id: String::new(),
        }
    }
}

/// Normalize line endings. The service mixes `\r\n` and `\n`.
fn into_result(response: LyricsOvhResponse) -> LyricsResult {
    match response.lyrics {
        Some(text) if !text.trim().is_empty() => {
            LyricsResult::Unsynced(text.replace("\r\n", "\n").trim().to_string())
        }
        _ => {
            if let Some(error) = response.error {
                debug!(target: LOG_TARGET, "lyrics.ovh: {error}");
            }
            LyricsResult::NotFound
        }
    }
}

#[async_trait]
impl LyricsProvider for LyricsOvhProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        // Both path segments are required by the endpoint
        if !query.has_artist_and_title() {
            debug!(target: LOG_TARGET, "Skipping lyrics.ovh: artist or title missing");
            return Ok(Self::not_found());
        }

        let url = self.lyrics_url(query);
        info!(target: LOG_TARGET, "lyrics.ovh GET: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Self::not_found());
        }
        if !status.is_success() {
            warn!(target: LOG_TARGET, "lyrics.ovh returned status: {}", status);
            return Err(CoreError::LyricsProviderFailed {
                provider: self.name().to_string(),
                reason: format!("lyrics.ovh returned status: {status}"),
            });
        }

        let body: LyricsOvhResponse = response.json().await?;
        Ok(FetchedLyrics {
            result: into_result(body),
            provider_id: String::new(),
        })
    }
}
