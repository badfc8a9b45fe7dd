//! Country lookup for the home feed.

use crate::error::{AntaraError, Result};
use cadenza_core::{build_client, CadenzaConfig, CoreError};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

const LOG_TARGET: &str = "cadenza::geo";

pub const PROVIDER_NAME: &str = "ipapi";

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    country: Option<String>,
}

/// Resolves the caller's country from their IP address
pub struct CountryLocator {
    client: ClientWithMiddleware,
    geo_url: Url,
}

impl CountryLocator {
    /// # Errors
    ///
    /// Returns an error if `geo_url` is not a valid URL.
    pub fn new(client: ClientWithMiddleware, geo_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            geo_url: crate::base_url(geo_url)?,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the URL is invalid.
    pub fn from_config(config: &CadenzaConfig) -> std::result::Result<Self, CoreError> {
        let client = build_client(&config.network)?;
        Self::new(client, &config.services.geo_url).map_err(|e| e.into_core(PROVIDER_NAME))
    }

    /// Two-letter country code of the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unreachable or answers without a
    /// usable country code.
    pub async fn locate(&self) -> Result<String> {
        let url = self.geo_url.join("json/")?;
        debug!(target: LOG_TARGET, "GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AntaraError::Status {
                status: status.as_u16(),
            });
        }

        let body: GeoResponse = response.json().await?;
        let country = normalize_country(body.country.as_deref().unwrap_or_default())?;
        info!(target: LOG_TARGET, "Located country: {country}");
        Ok(country)
    }
}

/// Uppercase two-letter code
///
/// # Errors
///
/// Returns `InvalidCountry` for anything other than two ASCII letters.
pub fn normalize_country(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(AntaraError::InvalidCountry {
            code: code.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_country() {
        assert_eq!(normalize_country(" in ").unwrap(), "IN");
        assert_eq!(normalize_country("US").unwrap(), "US");
        assert!(normalize_country("").is_err());
        assert!(normalize_country("USA").is_err());
        assert!(normalize_country("1A").is_err());
    }

    #[test]
    fn test_geo_response_shape() {
        let body: GeoResponse =
            serde_json::from_str(r#"{"ip":"203.0.113.1","country":"DE","city":"Berlin"}"#).unwrap();
        assert_eq!(body.country.as_deref(), Some("DE"));

        let body: GeoResponse = serde_json::from_str(r#"{"error":true,"reason":"RateLimited"}"#).unwrap();
        assert!(body.country.is_none());
    }
}
