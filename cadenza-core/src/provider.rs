use crate::error::CoreError;
use crate::lrc::LrcFile;
use crate::playback::TrackInfo;
use async_trait::async_trait;
use url::Url;

/// Query parameters for fetching lyrics
#[derive(Debug, Clone)]
pub struct LyricsQuery {
    /// Track name
    pub track_name: String,
    /// Artist name
    pub artist_name: String,
    /// Track duration in seconds (for matching)
    pub duration_secs: Option<u32>,
}

impl LyricsQuery {
    /// Create a new lyrics query
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
            duration_secs: None,
        }
    }

    /// Build the query for a track descriptor
    #[must_use]
    pub fn for_track(track: &TrackInfo) -> Self {
        Self::new(&track.title, &track.author)
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }

    /// Whether artist and title are both present
    #[must_use]
    pub fn has_artist_and_title(&self) -> bool {
        !self.artist_name.trim().is_empty() && !self.track_name.trim().is_empty()
    }
}

/// Result from a lyrics provider
#[derive(Debug, Clone)]
pub enum LyricsResult {
    /// Lyrics with per-line timestamps
    Synced(LrcFile),
    /// Plain text lyrics without timing
    Unsynced(String),
    /// No lyrics found
    NotFound,
}

/// Lyrics with provider metadata
#[derive(Debug, Clone)]
pub struct FetchedLyrics {
    /// The lyrics result
    pub result: LyricsResult,
    /// Provider-specific ID (e.g., LRCLIB's numeric ID as string)
    pub provider_id: String,
}

impl LyricsResult {
    /// Lines to display. Plain text becomes untimed lines.
    #[must_use]
    pub fn into_lrc(self) -> Option<LrcFile> {
        let lrc = match self {
            Self::Synced(lrc) => lrc,
            Self::Unsynced(text) => LrcFile::parse(&text),
            Self::NotFound => return None,
        };
        (!lrc.is_empty()).then_some(lrc)
    }
}

/// Trait for lyrics providers
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fetch lyrics for a query
    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError>;
}

/// Navigation direction for previous/next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Previous => "previous",
            Self::Next => "next",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Track metadata service
#[async_trait]
pub trait TrackProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Track before or after `track_id`. `Ok(None)` when the service has none.
    async fn adjacent(
        &self,
        track_id: &str,
        direction: Direction,
    ) -> Result<Option<TrackInfo>, CoreError>;

    /// Landing page picks for a country code
    async fn home(&self, country: &str) -> Result<Vec<TrackInfo>, CoreError>;
}

/// A track hit from the search service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMatch {
    pub name: String,
    pub artist: String,
}

/// Artist and track names matching a search text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub artists: Vec<String>,
    pub tracks: Vec<TrackMatch>,
}

impl SearchResults {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty() && self.tracks.is_empty()
    }
}

/// Music search service
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Artists and tracks matching `text`. Blank text yields no results.
    async fn search(&self, text: &str) -> Result<SearchResults, CoreError>;
}

/// Playable resources for a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSource {
    pub audio_url: Url,
    pub thumbnail_url: Url,
}

/// Resolves a track identifier to stream URLs
pub trait StreamProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the URLs cannot be built for this identifier.
    fn stream_source(&self, track_id: &str) -> Result<StreamSource, CoreError>;
}
