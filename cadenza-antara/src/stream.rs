//! Audio stream and thumbnail URLs.

use crate::error::Result;
use cadenza_core::{CadenzaConfig, CoreError, StreamProvider, StreamSource};
use url::Url;

pub const PROVIDER_NAME: &str = "paxsenix";

/// Builds download and thumbnail URLs. No request is made until the device
/// opens the stream.
#[derive(Debug, Clone)]
pub struct PaxsenixStreamProvider {
    base_url: Url,
}

impl PaxsenixStreamProvider {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: crate::base_url(base_url)?,
        })
    }

    /// # Errors
    ///
    /// Returns an error if `services.stream_url` is not a valid URL.
    pub fn from_config(config: &CadenzaConfig) -> std::result::Result<Self, CoreError> {
        Self::new(&config.services.stream_url).map_err(|e| e.into_core(PROVIDER_NAME))
    }

    fn audio_url(&self, track_id: &str) -> Result<Url> {
        let mut url = self.base_url.join("download")?;
        url.query_pairs_mut()
            .append_pair("id", track_id)
            .append_pair("type", "audio");
        Ok(url)
    }

    fn thumbnail_url(&self, track_id: &str) -> Result<Url> {
        let mut url = self.base_url.join("thumbnailHD")?;
        url.query_pairs_mut().append_pair("id", track_id);
        Ok(url)
    }
}

impl StreamProvider for PaxsenixStreamProvider {
    fn stream_source(&self, track_id: &str) -> std::result::Result<StreamSource, CoreError> {
        let build = || -> Result<StreamSource> {
            Ok(StreamSource {
                audio_url: self.audio_url(track_id)?,
                thumbnail_url: self.thumbnail_url(track_id)?,
            })
        };
        build().map_err(|e| e.into_core(PROVIDER_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_source_urls() {
        let provider = PaxsenixStreamProvider::new("https://stream.test").unwrap();
        let source = provider.stream_source("dQw4w9WgXcQ").unwrap();
        assert_eq!(
            source.audio_url.as_str(),
            "https://stream.test/download?id=dQw4w9WgXcQ&type=audio"
        );
        assert_eq!(
            source.thumbnail_url.as_str(),
            "https://stream.test/thumbnailHD?id=dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_stream_urls_under_base_path() {
        let provider = PaxsenixStreamProvider::new("https://api.test/yt").unwrap();
        let source = provider.stream_source("abc").unwrap();
        assert_eq!(
            source.audio_url.as_str(),
            "https://api.test/yt/download?id=abc&type=audio"
        );
        assert_eq!(source.thumbnail_url.as_str(), "https://api.test/yt/thumbnailHD?id=abc");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(PaxsenixStreamProvider::new("not a url").is_err());
    }
}
