//! Previous/next navigation and the landing page feed.

use crate::base_url;
use crate::error::{AntaraError, Result};
use async_trait::async_trait;
use cadenza_core::{build_client, CadenzaConfig, CoreError, Direction, TrackInfo, TrackProvider};
use reqwest_middleware::ClientWithMiddleware;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

const LOG_TARGET: &str = "cadenza::antara";

pub const PROVIDER_NAME: &str = "antara";

#[derive(Debug, Deserialize)]
struct HomeResponse {
    results: HomeResults,
}

#[derive(Debug, Deserialize)]
struct HomeResults {
    #[serde(default)]
    quick_picks: Vec<TrackInfo>,
}

pub struct AntaraTrackProvider {
    client: ClientWithMiddleware,
    tracks_url: Url,
    home_url: Url,
}

impl AntaraTrackProvider {
    /// # Errors
    ///
    /// Returns an error if either base URL is invalid.
    pub fn new(client: ClientWithMiddleware, tracks_url: &str, home_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            tracks_url: base_url(tracks_url)?,
            home_url: base_url(home_url)?,
        })
    }

    /// Create a provider from the `[network]` and `[services]` config sections.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or a URL is invalid.
    pub fn from_config(config: &CadenzaConfig) -> std::result::Result<Self, CoreError> {
        let client = build_client(&config.network)?;
        Self::new(
            client,
            &config.services.tracks_url,
            &config.services.home_url,
        )
        .map_err(|e| e.into_core(PROVIDER_NAME))
    }

    fn adjacent_url(&self, track_id: &str, direction: Direction) -> Result<Url> {
        let mut url = self.tracks_url.join(direction.as_str())?;
        url.query_pairs_mut().append_pair("id", track_id);
        Ok(url)
    }

    fn home_url(&self, country: &str) -> Result<Url> {
        let mut url = self.home_url.join("home")?;
        url.query_pairs_mut().append_pair("gl", country);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(target: LOG_TARGET, "GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AntaraError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    async fn fetch_adjacent(&self, track_id: &str, direction: Direction) -> Result<Option<TrackInfo>> {
        let url = self.adjacent_url(track_id, direction)?;
        let candidates: Vec<TrackInfo> = self.get_json(url).await?;
        Ok(first_playable(candidates))
    }

    async fn fetch_home(&self, country: &str) -> Result<Vec<TrackInfo>> {
        let url = self.home_url(country)?;
        let response: HomeResponse = self.get_json(url).await?;
        Ok(response
            .results
            .quick_picks
            .into_iter()
            .filter(|track| !track.track_id.is_empty())
            .collect())
    }
}

/// The service answers with a list; only the first entry is used.
fn first_playable(candidates: Vec<TrackInfo>) -> Option<TrackInfo> {
    candidates
        .into_iter()
        .next()
        .filter(|track| !track.track_id.is_empty())
}

#[async_trait]
impl TrackProvider for AntaraTrackProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn adjacent(
        &self,
        track_id: &str,
        direction: Direction,
    ) -> std::result::Result<Option<TrackInfo>, CoreError> {
        let track = self
            .fetch_adjacent(track_id, direction)
            .await
            .map_err(|e| e.into_core(PROVIDER_NAME))?;
        match &track {
            Some(track) => info!(
                target: LOG_TARGET,
                "{direction} track: {} - {}", track.author, track.title
            ),
            None => info!(target: LOG_TARGET, "No {direction} track for {track_id}"),
        }
        Ok(track)
    }

    async fn home(&self, country: &str) -> std::result::Result<Vec<TrackInfo>, CoreError> {
        let picks = self
            .fetch_home(country)
            .await
            .map_err(|e| e.into_core(PROVIDER_NAME))?;
        info!(target: LOG_TARGET, "Loaded {} quick picks for {country}", picks.len());
        Ok(picks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::NetworkConfig;

    fn provider() -> AntaraTrackProvider {
        let client = build_client(&NetworkConfig::default()).unwrap();
        AntaraTrackProvider::new(client, "https://tracks.test", "https://home.test/").unwrap()
    }

    #[test]
    fn test_adjacent_url() {
        let url = provider().adjacent_url("a b&c", Direction::Next).unwrap();
        assert_eq!(url.as_str(), "https://tracks.test/next?id=a+b%26c");
        let url = provider().adjacent_url("xyz", Direction::Previous).unwrap();
        assert_eq!(url.as_str(), "https://tracks.test/previous?id=xyz");
    }

    #[test]
    fn test_urls_under_base_path() {
        let client = build_client(&NetworkConfig::default()).unwrap();
        let provider =
            AntaraTrackProvider::new(client, "https://host.test/api", "https://host.test/v2").unwrap();
        let url = provider.adjacent_url("xyz", Direction::Next).unwrap();
        assert_eq!(url.as_str(), "https://host.test/api/next?id=xyz");
        let url = provider.home_url("GB").unwrap();
        assert_eq!(url.as_str(), "https://host.test/v2/home?gl=GB");
    }

    #[test]
    fn test_home_url() {
        let url = provider().home_url("IN").unwrap();
        assert_eq!(url.as_str(), "https://home.test/home?gl=IN");
    }

    #[test]
    fn test_adjacent_takes_first_entry() {
        let candidates: Vec<TrackInfo> = serde_json::from_str(
            r#"[
                {"videoId":"n1","title":"Next","author":"Band","thumbnail":"https://img/n1.jpg"},
                {"videoId":"n2","title":"Later","author":"Band"}
            ]"#,
        )
        .unwrap();
        let track = first_playable(candidates).unwrap();
        assert_eq!(track.track_id, "n1");
        assert_eq!(track.thumbnail.as_deref(), Some("https://img/n1.jpg"));
    }

    #[test]
    fn test_adjacent_empty_list_is_none() {
        assert_eq!(first_playable(Vec::new()), None);
    }

    #[test]
    fn test_home_response_shape() {
        let response: HomeResponse = serde_json::from_str(
            r#"{"results":{"quick_picks":[
                {"videoId":"q1","title":"One","author":"A","thumbnail":"t1"},
                {"videoId":"q2","title":"Two","author":"B","thumbnail":"t2"}
            ],"other":[]}}"#,
        )
        .unwrap();
        let ids: Vec<_> = response
            .results
            .quick_picks
            .iter()
            .map(|t| t.track_id.as_str())
            .collect();
        assert_eq!(ids, vec!["q1", "q2"]);
    }
}
