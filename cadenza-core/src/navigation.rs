//! Page parameters: `audioId`, `title` and `author` carried in the player
//! link query string, and `q` in the search link.

use crate::playback::TrackInfo;
use url::{form_urlencoded, Url};

/// Relative location of the player page on the landing page
pub const PLAYER_PAGE: &str = "play/index.html";
/// Relative location of the search page
pub const SEARCH_PAGE: &str = "search/index.html";

/// Query string of a full URL, a `page?query` link or a bare query
fn query_part(input: &str) -> String {
    let input = input.trim();
    match Url::parse(input) {
        Ok(url) => url.query().unwrap_or_default().to_string(),
        Err(_) => input
            .split_once('?')
            .map_or(input, |(_, query)| query)
            .to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerParams {
    pub audio_id: String,
    pub title: String,
    pub author: String,
}

impl PlayerParams {
    /// Read parameters from a query string (with or without the leading `?`)
    /// or a full player URL.
    ///
    /// Returns `None` when `audioId` is missing or blank, in which case the
    /// player stays idle.
    #[must_use]
    pub fn from_query(input: &str) -> Option<Self> {
        let query = query_part(input);

        let mut audio_id = None;
        let mut title = String::new();
        let mut author = String::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "audioId" => audio_id = Some(value.into_owned()),
                "title" => title = value.into_owned(),
                "author" => author = value.into_owned(),
                _ => {}
            }
        }

        let audio_id = audio_id.filter(|id| !id.trim().is_empty())?;
        Some(Self {
            audio_id,
            title,
            author,
        })
    }

    #[must_use]
    pub fn into_track(self) -> TrackInfo {
        TrackInfo::new(self.audio_id, self.title, self.author)
    }
}

impl From<&TrackInfo> for PlayerParams {
    fn from(track: &TrackInfo) -> Self {
        Self {
            audio_id: track.track_id.clone(),
            title: track.title.clone(),
            author: track.author.clone(),
        }
    }
}

/// Link from the landing page to the player for `track`
#[must_use]
pub fn player_link(track: &TrackInfo) -> String {
    format!(
        "{PLAYER_PAGE}?audioId={}&title={}&author={}",
        urlencoding::encode(&track.track_id),
        urlencoding::encode(&track.title),
        urlencoding::encode(&track.author)
    )
}

/// Link to the search page for `text`
#[must_use]
pub fn search_link(text: &str) -> String {
    format!("{SEARCH_PAGE}?q={}", urlencoding::encode(text))
}

/// The `q` parameter of a search link or query string. `None` when it is
/// missing or blank.
#[must_use]
pub fn search_text(input: &str) -> Option<String> {
    form_urlencoded::parse(query_part(input).as_bytes())
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bare_query() {
        let params = PlayerParams::from_query("?audioId=abc&title=Hello%20World&author=Me").unwrap();
        assert_eq!(params.audio_id, "abc");
        assert_eq!(params.title, "Hello World");
        assert_eq!(params.author, "Me");
    }

    #[test]
    fn test_from_full_url() {
        let params =
            PlayerParams::from_query("https://example.com/play/index.html?audioId=x1&title=A+B")
                .unwrap();
        assert_eq!(params.audio_id, "x1");
        assert_eq!(params.title, "A B");
        assert!(params.author.is_empty());
    }

    #[test]
    fn test_missing_audio_id_is_none() {
        assert_eq!(PlayerParams::from_query("title=Song&author=Band"), None);
        assert_eq!(PlayerParams::from_query("audioId=&title=Song"), None);
        assert_eq!(PlayerParams::from_query(""), None);
    }

    #[test]
    fn test_search_text_from_link() {
        assert_eq!(
            search_text("search/index.html?q=daft+punk").as_deref(),
            Some("daft punk")
        );
        assert_eq!(
            search_text("https://example.com/search/?q=AC%2FDC").as_deref(),
            Some("AC/DC")
        );
        assert_eq!(search_text(&search_link("Sigur Rós")).as_deref(), Some("Sigur Rós"));
    }

    #[test]
    fn test_search_text_missing_or_blank() {
        assert_eq!(search_text("search/index.html"), None);
        assert_eq!(search_text("q=%20%20"), None);
        assert_eq!(search_text("audioId=abc"), None);
    }

    #[test]
    fn test_link_round_trips_through_params() {
        let track = TrackInfo::new("id/1", "Song & Dance", "Björk");
        let link = player_link(&track);
        assert!(link.starts_with("play/index.html?audioId=id%2F1"));

        let params = PlayerParams::from_query(&link).unwrap();
        assert_eq!(params, PlayerParams::from(&track));
        assert_eq!(params.into_track(), track);
    }
}
