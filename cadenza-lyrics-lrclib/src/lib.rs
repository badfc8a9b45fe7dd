use async_trait::async_trait;
use cadenza_core::{
    build_client, CadenzaConfig, CoreError, FetchedLyrics, LrcFile, LyricsProvider, LyricsQuery,
    LyricsResult,
};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "cadenza::lrclib";

/// Provider name
pub const PROVIDER_NAME: &str = "lrclib";

/// Duration tolerance for matching (±2 seconds)
const DURATION_TOLERANCE_SECS: f64 = 2.0;

/// Calculate a score for duration matching (lower is better).
/// Returns 0 for exact matches, higher values for larger differences.
/// Capped at `i32::MAX` to prevent overflow.
fn duration_score(actual: Option<f64>, expected: Option<u32>) -> i32 {
    match (actual, expected) {
        (Some(d), Some(q)) => {
            let diff = (d - f64::from(q)).abs();
            #[allow(clippy::cast_possible_truncation)]
            if diff > f64::from(i32::MAX) {
                i32::MAX
            } else {
                diff as i32
            }
        }
        _ => 50, // Default score when duration is unknown
    }
}

/// LRCLIB.net lyrics provider
pub struct LrclibProvider {
    client: ClientWithMiddleware,
    api_url: String,
}

impl LrclibProvider {
    /// Create a provider talking to `base_url` (without the `/api` suffix).
    pub fn new(client: ClientWithMiddleware, base_url: &str) -> Self {
        Self {
            client,
            api_url: format!("{}/api", base_url.trim_end_matches('/')),
        }
    }

    /// Create a provider from the `[network]` and `[services]` config sections.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &CadenzaConfig) -> Result<Self, CoreError> {
        let client = build_client(&config.network)?;
        Ok(Self::new(client, &config.services.lrclib_url))
    }

    fn exact_url(&self, query: &LyricsQuery) -> String {
        use std::fmt::Write;

        let mut url = format!(
            "{}/get?artist_name={}&track_name={}",
            self.api_url,
            urlencoding::encode(query.artist_name.trim()),
            urlencoding::encode(query.track_name.trim())
        );
        if let Some(duration) = query.duration_secs {
            let _ = write!(url, "&duration={duration}");
        }
        url
    }

    fn search_url(&self, query: &LyricsQuery) -> String {
        let terms = format!("{} {}", query.artist_name.trim(), query.track_name.trim());
        format!(
            "{}/search?q={}",
            self.api_url,
            urlencoding::encode(terms.trim())
        )
    }

    /// Fetch a single record. `Ok(None)` on 404.
    async fn get_record(&self, url: &str) -> Result<Option<LrclibRecord>, CoreError> {
        debug!(target: LOG_TARGET, "LRCLIB GET: {}", url);
        let response = self.client.get(url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            warn!(target: LOG_TARGET, "LRCLIB returned status: {}", response.status());
            return Err(self.failed(format!("LRCLIB returned status: {}", response.status())));
        }
        Ok(Some(response.json().await?))
    }

    async fn search(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        let url = self.search_url(query);
        debug!(target: LOG_TARGET, "LRCLIB GET (search): {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(self.failed(format!(
                "LRCLIB search returned status: {}",
                response.status()
            )));
        }

        let results: Vec<LrclibRecord> = response.json().await?;
        match best_match(results, query.duration_secs) {
            Some(record) => {
                info!(
                    target: LOG_TARGET,
                    "LRCLIB found match via search (id: {}, artist: {})",
                    record.id, record.artist_name
                );
                Ok(record.into_fetched())
            }
            None => Ok(FetchedLyrics {
                result: LyricsResult::NotFound,
                provider_id: String::new(),
            }),
        }
    }

    fn failed(&self, reason: String) -> CoreError {
        CoreError::LyricsProviderFailed {
            provider: self.name().to_string(),
            reason,
        }
    }
}

/// Record returned by the LRCLIB API. Unused fields are ignored.
#[derive(Debug, Deserialize)]
struct LrclibRecord {
    id: i64,
    #[serde(rename = "artistName", default)]
    artist_name: String,
    duration: Option<f64>,
    #[serde(default)]
    instrumental: bool,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

impl LrclibRecord {
    fn has_lyrics(&self) -> bool {
        let present = |text: Option<&str>| text.is_some_and(|t| !t.trim().is_empty());
        present(self.synced_lyrics.as_deref()) || present(self.plain_lyrics.as_deref())
    }

    fn into_fetched(self) -> FetchedLyrics {
        let provider_id = self.id.to_string();

        if self.instrumental {
            debug!(target: LOG_TARGET, "Track is instrumental (lrclib id: {})", self.id);
            return FetchedLyrics {
                result: LyricsResult::NotFound,
                provider_id,
            };
        }

        // Prefer synced lyrics
        if let Some(synced) = self.synced_lyrics.as_deref() {
            let lrc = LrcFile::parse(synced);
            if lrc.is_synced() {
                debug!(
                    target: LOG_TARGET,
                    "Got synced lyrics with {} lines (lrclib id: {})",
                    lrc.lines.len(),
                    self.id
                );
                return FetchedLyrics {
                    result: LyricsResult::Synced(lrc),
                    provider_id,
                };
            }
            warn!(target: LOG_TARGET, "Synced lyrics without timestamps (lrclib id: {})", self.id);
        }

        if let Some(plain) = self.plain_lyrics.filter(|p| !p.trim().is_empty()) {
            debug!(target: LOG_TARGET, "Got plain lyrics (lrclib id: {})", self.id);
            return FetchedLyrics {
                result: LyricsResult::Unsynced(plain),
                provider_id,
            };
        }

        FetchedLyrics {
            result: LyricsResult::NotFound,
            provider_id,
        }
    }
}

/// Pick the best search result: synced before plain, then closest duration.
/// Results outside the duration tolerance are skipped when a duration is known.
fn best_match(results: Vec<LrclibRecord>, duration_secs: Option<u32>) -> Option<LrclibRecord> {
    results
        .into_iter()
        .filter(LrclibRecord::has_lyrics)
        .filter(|r| match (duration_secs, r.duration) {
            (Some(expected), Some(actual)) => {
                (actual - f64::from(expected)).abs() <= DURATION_TOLERANCE_SECS
            }
            _ => true,
        })
        .min_by_key(|r| {
            let sync_score = if r.synced_lyrics.is_some() { 0 } else { 100 };
            sync_score + duration_score(r.duration, duration_secs)
        })
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        info!(
            target: LOG_TARGET,
            "Fetching lyrics from LRCLIB for: {} - {} (duration: {:?}s)",
            query.artist_name, query.track_name, query.duration_secs
        );

        // Any exact lookup failure still gets a search
        if query.has_artist_and_title() {
            match self.get_record(&self.exact_url(query)).await {
                Ok(Some(record)) => {
                    info!(target: LOG_TARGET, "LRCLIB found exact match with id: {}", record.id);
                    return Ok(record.into_fetched());
                }
                Ok(None) => info!(target: LOG_TARGET, "LRCLIB exact match not found, searching"),
                Err(e) => warn!(target: LOG_TARGET, "LRCLIB exact lookup failed ({e}), searching"),
            }
        } else if query.track_name.trim().is_empty() {
            return Ok(FetchedLyrics {
                result: LyricsResult::NotFound,
                provider_id: String::new(),
            });
        }

        self.search(query).await
    }
}
