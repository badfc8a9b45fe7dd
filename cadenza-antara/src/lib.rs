//! Remote services behind the player: previous/next navigation and the home
//! feed, stream URLs, and country lookup.

pub mod error;
pub mod geo;
pub mod stream;
pub mod tracks;

pub use error::AntaraError;

use url::Url;
pub use geo::{normalize_country, CountryLocator};
pub use stream::PaxsenixStreamProvider;
pub use tracks::AntaraTrackProvider;

/// Used for the home feed when the country cannot be located
pub const DEFAULT_COUNTRY: &str = "US";

/// Parse a service base URL. Endpoints are joined onto it, so the path always
/// ends in `/` and `https://host/api` keeps its `api` segment.
pub(crate) fn base_url(raw: &str) -> error::Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
