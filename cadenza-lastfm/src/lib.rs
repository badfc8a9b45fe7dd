//! Artist and track search backed by the Last.fm web service.

pub mod error;

pub use error::LastfmError;

use async_trait::async_trait;
use cadenza_core::{
    build_client, CadenzaConfig, CoreError, SearchProvider, SearchResults, TrackMatch,
};
use error::Result;
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

const LOG_TARGET: &str = "cadenza::lastfm";

pub const PROVIDER_NAME: &str = "lastfm";

#[derive(Debug, Deserialize)]
struct ApiFailure {
    error: i64,
    #[serde(default)]
    message: String,
}

impl From<ApiFailure> for LastfmError {
    fn from(failure: ApiFailure) -> Self {
        Self::Api {
            code: failure.error,
            message: failure.message,
        }
    }
}

/// Last.fm answers errors with a JSON body, sometimes under a 200 status
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Failure(ApiFailure),
    Success(T),
}

#[derive(Debug, Deserialize)]
struct ArtistSearch {
    results: ArtistResults,
}

#[derive(Debug, Deserialize)]
struct ArtistResults {
    artistmatches: ArtistMatches,
}

#[derive(Debug, Deserialize)]
struct ArtistMatches {
    #[serde(default)]
    artist: Vec<ArtistEntry>,
}

#[derive(Debug, Deserialize)]
struct ArtistEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TrackSearch {
    results: TrackResults,
}

#[derive(Debug, Deserialize)]
struct TrackResults {
    trackmatches: TrackMatches,
}

#[derive(Debug, Deserialize)]
struct TrackMatches {
    #[serde(default)]
    track: Vec<TrackEntry>,
}

#[derive(Debug, Deserialize)]
struct TrackEntry {
    name: String,
    #[serde(default)]
    artist: String,
}

impl From<ArtistSearch> for Vec<String> {
    fn from(search: ArtistSearch) -> Self {
        search
            .results
            .artistmatches
            .artist
            .into_iter()
            .map(|a| a.name)
            .filter(|name| !name.trim().is_empty())
            .collect()
    }
}

impl From<TrackSearch> for Vec<TrackMatch> {
    fn from(search: TrackSearch) -> Self {
        search
            .results
            .trackmatches
            .track
            .into_iter()
            .filter(|t| !t.name.trim().is_empty())
            .map(|t| TrackMatch {
                name: t.name,
                artist: t.artist,
            })
            .collect()
    }
}

pub struct LastfmSearchProvider {
    client: ClientWithMiddleware,
    api_url: Url,
    api_key: String,
}

impl LastfmSearchProvider {
    /// # Errors
    ///
    /// Returns an error if `api_url` is not a valid URL.
    pub fn new(
        client: ClientWithMiddleware,
        api_url: &str,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client,
            api_url: Url::parse(api_url)?,
            api_key: api_key.into(),
        })
    }

    /// Create a provider from the `[network]` and `[services]` config sections.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissingField` without an API key, or an error if the
    /// HTTP client cannot be created.
    pub fn from_config(config: &CadenzaConfig) -> std::result::Result<Self, CoreError> {
        let api_key = config.services.lastfm_api_key.trim();
        if api_key.is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "services.lastfm_api_key".to_string(),
            });
        }
        let client = build_client(&config.network)?;
        Self::new(client, &config.services.lastfm_url, api_key)
            .map_err(|e| e.into_core(PROVIDER_NAME))
    }

    fn method_url(&self, method: &str, field: &str, text: &str) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("method", method)
            .append_pair(field, text)
            .append_pair("api_key", &self.api_key)
            .append_pair("format", "json");
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(match response.json::<ApiFailure>().await {
                Ok(failure) => failure.into(),
                Err(_) => LastfmError::Status {
                    status: status.as_u16(),
                },
            });
        }
        match response.json::<Envelope<T>>().await? {
            Envelope::Failure(failure) => Err(failure.into()),
            Envelope::Success(body) => Ok(body),
        }
    }

    async fn artists(&self, text: &str) -> Result<Vec<String>> {
        debug!(target: LOG_TARGET, "Last.fm artist.search: {text}");
        let url = self.method_url("artist.search", "artist", text);
        Ok(self.get_json::<ArtistSearch>(url).await?.into())
    }

    async fn tracks(&self, text: &str) -> Result<Vec<TrackMatch>> {
        debug!(target: LOG_TARGET, "Last.fm track.search: {text}");
        let url = self.method_url("track.search", "track", text);
        Ok(self.get_json::<TrackSearch>(url).await?.into())
    }
}

fn or_empty<T>(result: Result<Vec<T>>, kind: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(target: LOG_TARGET, "Last.fm {kind} search failed: {e}");
        Vec::new()
    })
}

#[async_trait]
impl SearchProvider for LastfmSearchProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    /// Artist and track searches run together. One failing still yields the
    /// other's matches.
    async fn search(&self, text: &str) -> std::result::Result<SearchResults, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SearchResults::default());
        }

        let (artists, tracks) = tokio::join!(self.artists(text), self.tracks(text));
        let results = match (artists, tracks) {
            (Err(e), Err(_)) => return Err(e.into_core(PROVIDER_NAME)),
            (artists, tracks) => SearchResults {
                artists: or_empty(artists, "artist"),
                tracks: or_empty(tracks, "track"),
            },
        };
        info!(
            target: LOG_TARGET,
            "Last.fm search for {text:?}: {} artists, {} tracks",
            results.artists.len(),
            results.tracks.len()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::NetworkConfig;

    fn provider() -> LastfmSearchProvider {
        let client = build_client(&NetworkConfig::default()).unwrap();
        LastfmSearchProvider::new(client, "https://lastfm.test/2.0/", "k3y").unwrap()
    }

    #[test]
    fn test_method_url() {
        let url = provider().method_url("track.search", "track", "daft punk & co");
        assert_eq!(
            url.as_str(),
            "https://lastfm.test/2.0/?method=track.search&track=daft+punk+%26+co&api_key=k3y&format=json"
        );
    }

    #[test]
    fn test_artist_matches() {
        let search: ArtistSearch = serde_json::from_str(
            r#"{"results":{"opensearch:totalResults":"2","artistmatches":{"artist":[
                {"name":"Daft Punk","listeners":"4000000","mbid":"056e4f3e"},
                {"name":"  ","listeners":"1"},
                {"name":"Daft Punk Tribute","listeners":"12"}
            ]}}}"#,
        )
        .unwrap();
        let names: Vec<String> = search.into();
        assert_eq!(names, vec!["Daft Punk", "Daft Punk Tribute"]);
    }

    #[test]
    fn test_track_matches() {
        let search: TrackSearch = serde_json::from_str(
            r#"{"results":{"trackmatches":{"track":[
                {"name":"One More Time","artist":"Daft Punk","listeners":"2000000"},
                {"name":"Digital Love","artist":"Daft Punk"}
            ]}}}"#,
        )
        .unwrap();
        let tracks: Vec<TrackMatch> = search.into();
        assert_eq!(tracks.len(), 2);
        assert_eq!(
            tracks[0],
            TrackMatch {
                name: "One More Time".into(),
                artist: "Daft Punk".into()
            }
        );
    }

    #[test]
    fn test_empty_matches() {
        let search: ArtistSearch =
            serde_json::from_str(r#"{"results":{"artistmatches":{}}}"#).unwrap();
        assert!(Vec::<String>::from(search).is_empty());
    }

    #[test]
    fn test_error_body_is_failure() {
        let body: Envelope<ArtistSearch> = serde_json::from_str(
            r#"{"error":10,"message":"Invalid API key - You must be granted a valid key by last.fm"}"#,
        )
        .unwrap();
        let err = match body {
            Envelope::Failure(failure) => LastfmError::from(failure),
            Envelope::Success(_) => LastfmError::Status { status: 200 },
        };
        assert!(matches!(err, LastfmError::Api { code: 10, .. }));
        assert!(err.to_string().starts_with("Last.fm error 10: Invalid API key"));
    }

    #[tokio::test]
    async fn test_blank_text_skips_requests() {
        let results = provider().search("   ").await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_api_key() {
        let config = CadenzaConfig::default();
        let err = LastfmSearchProvider::from_config(&config).err().unwrap();
        assert!(matches!(err, CoreError::ConfigMissingField { ref field } if field == "services.lastfm_api_key"));
    }
}
