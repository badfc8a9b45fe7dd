use crate::error::{CoreError, Result};
use crate::paths;
use crate::time::TimeFormat;
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Track navigation service (previous/next)
pub const DEFAULT_TRACKS_URL: &str = "https://antara.deno.dev";
/// Landing page picks service
pub const DEFAULT_HOME_URL: &str = "https://antara-in.deno.dev";
/// Audio stream and thumbnail service
pub const DEFAULT_STREAM_URL: &str = "https://paxsenixjs.deno.dev";
/// IP geolocation service
pub const DEFAULT_GEO_URL: &str = "https://ipapi.co";
pub const DEFAULT_LRCLIB_URL: &str = "https://lrclib.net";
pub const DEFAULT_LYRICS_OVH_URL: &str = "https://api.lyrics.ovh";
/// Artist and track search
pub const DEFAULT_LASTFM_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadenzaConfig {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub time_format: TimeFormat,
    /// Step for the skip forward/backward controls
    #[serde(default = "default_skip_seconds")]
    pub skip_seconds: u64,
    /// Load the next track when the current one ends
    #[serde(default = "default_true")]
    pub auto_advance: bool,
    /// Hold a wake lock while a track is open
    #[serde(default = "default_true")]
    pub keep_awake: bool,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

const fn default_skip_seconds() -> u64 {
    10
}

const fn default_true() -> bool {
    true
}

const fn default_tick_interval() -> u64 {
    250
}

impl PlayerConfig {
    #[must_use]
    pub const fn skip_step(&self) -> Duration {
        Duration::from_secs(self.skip_seconds)
    }

    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            time_format: TimeFormat::default(),
            skip_seconds: default_skip_seconds(),
            auto_advance: true,
            keep_awake: true,
            tick_interval_ms: default_tick_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Provider priority: providers are tried in order
    #[serde(default = "default_providers")]
    pub providers: Vec<LyricsProviderType>,
    /// Lines shown above the highlighted line
    #[serde(default = "default_context")]
    pub context_before: usize,
    /// Lines shown below the highlighted line
    #[serde(default = "default_context")]
    pub context_after: usize,
}

fn default_providers() -> Vec<LyricsProviderType> {
    vec![LyricsProviderType::Lrclib, LyricsProviderType::LyricsOvh]
}

const fn default_context() -> usize {
    1
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            context_before: default_context(),
            context_after: default_context(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LyricsProviderType {
    Lrclib,
    LyricsOvh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Retries for transient failures. Zero disables retrying.
    #[serde(default)]
    pub max_retries: u32,
}

const fn default_timeout() -> u64 {
    10
}

impl NetworkConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: 0,
        }
    }
}

/// Base URLs of the remote services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_tracks_url")]
    pub tracks_url: String,
    #[serde(default = "default_home_url")]
    pub home_url: String,
    #[serde(default = "default_stream_url")]
    pub stream_url: String,
    #[serde(default = "default_geo_url")]
    pub geo_url: String,
    #[serde(default = "default_lrclib_url")]
    pub lrclib_url: String,
    #[serde(default = "default_lyrics_ovh_url")]
    pub lyrics_ovh_url: String,
    #[serde(default = "default_lastfm_url")]
    pub lastfm_url: String,
    /// Required by the search command only
    #[serde(default)]
    pub lastfm_api_key: String,
}

fn default_tracks_url() -> String {
    DEFAULT_TRACKS_URL.to_string()
}

fn default_home_url() -> String {
    DEFAULT_HOME_URL.to_string()
}

fn default_stream_url() -> String {
    DEFAULT_STREAM_URL.to_string()
}

fn default_geo_url() -> String {
    DEFAULT_GEO_URL.to_string()
}

fn default_lrclib_url() -> String {
    DEFAULT_LRCLIB_URL.to_string()
}

fn default_lyrics_ovh_url() -> String {
    DEFAULT_LYRICS_OVH_URL.to_string()
}

fn default_lastfm_url() -> String {
    DEFAULT_LASTFM_URL.to_string()
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            tracks_url: default_tracks_url(),
            home_url: default_home_url(),
            stream_url: default_stream_url(),
            geo_url: default_geo_url(),
            lrclib_url: default_lrclib_url(),
            lyrics_ovh_url: default_lyrics_ovh_url(),
            lastfm_url: default_lastfm_url(),
            lastfm_api_key: String::new(),
        }
    }
}

impl ServicesConfig {
    fn entries(&self) -> [(&'static str, &str); 7] {
        [
            ("services.tracks_url", &self.tracks_url),
            ("services.home_url", &self.home_url),
            ("services.stream_url", &self.stream_url),
            ("services.geo_url", &self.geo_url),
            ("services.lrclib_url", &self.lrclib_url),
            ("services.lyrics_ovh_url", &self.lyrics_ovh_url),
            ("services.lastfm_url", &self.lastfm_url),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to `cadenza.log` in the config directory
    #[serde(default)]
    pub enabled: bool,
}

/// Config file written on first run
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"# Cadenza configuration

[player]
# "padded" shows 01:05, "unpadded" shows 1:05
time_format = "padded"
skip_seconds = 10
auto_advance = true
keep_awake = true
tick_interval_ms = 250

[lyrics]
# Tried in order. Synced lyrics win over plain text.
providers = ["lrclib", "lyrics_ovh"]
context_before = 1
context_after = 1

[network]
timeout_secs = 10
# 0 disables retrying
max_retries = 0

[services]
tracks_url = ""#,
    DEFAULT_TRACKS_URL,
    "\"\nhome_url = \"",
    DEFAULT_HOME_URL,
    "\"\nstream_url = \"",
    DEFAULT_STREAM_URL,
    "\"\ngeo_url = \"",
    DEFAULT_GEO_URL,
    "\"\nlrclib_url = \"",
    DEFAULT_LRCLIB_URL,
    "\"\nlyrics_ovh_url = \"",
    DEFAULT_LYRICS_OVH_URL,
    "\"\nlastfm_url = \"",
    DEFAULT_LASTFM_URL,
    "\"\n# Needed for `cadenza search`\nlastfm_api_key = \"\"\n\n[logging]\nenabled = false\n"
);

impl CadenzaConfig {
    /// Load config from the default location, or write the template on first run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` after creating the template, so the caller can
    /// tell the user where it is. Parse and validation failures are returned
    /// as is.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&paths::config_path())
    }

    /// Same as [`Self::load_or_create`] for an explicit path.
    ///
    /// # Errors
    ///
    /// See [`Self::load_or_create`].
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, CONFIG_TEMPLATE)?;
            info!("Created config template at {}", path.display());
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a config document.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges and service URLs.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.player.skip_seconds == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "player.skip_seconds must be greater than 0".into(),
            });
        }
        if self.player.tick_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "player.tick_interval_ms must be greater than 0".into(),
            });
        }
        if self.network.timeout_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "network.timeout_secs must be greater than 0".into(),
            });
        }
        for (field, value) in self.services.entries() {
            if value.trim().is_empty() {
                return Err(CoreError::ConfigMissingField {
                    field: field.into(),
                });
            }
            Url::parse(value).map_err(|e| CoreError::ConfigInvalid {
                message: format!("{field}: {e}"),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let config = CadenzaConfig::from_toml_str(CONFIG_TEMPLATE).unwrap();
        let defaults = CadenzaConfig::default();
        assert_eq!(config.player.skip_seconds, defaults.player.skip_seconds);
        assert_eq!(config.player.time_format, TimeFormat::Padded);
        assert_eq!(config.lyrics.providers, defaults.lyrics.providers);
        assert_eq!(config.services.tracks_url, DEFAULT_TRACKS_URL);
        assert_eq!(config.services.lyrics_ovh_url, DEFAULT_LYRICS_OVH_URL);
        assert_eq!(config.services.lastfm_url, DEFAULT_LASTFM_URL);
        assert!(config.services.lastfm_api_key.is_empty());
        assert_eq!(config.network.max_retries, 0);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CadenzaConfig::from_toml_str("").unwrap();
        assert_eq!(config.player.skip_step(), Duration::from_secs(10));
        assert_eq!(config.player.tick_interval(), Duration::from_millis(250));
        assert!(config.player.auto_advance);
    }

    #[test]
    fn test_partial_section() {
        let config = CadenzaConfig::from_toml_str(
            r#"
[player]
time_format = "unpadded"

[lyrics]
providers = ["lyrics_ovh"]
"#,
        )
        .unwrap();
        assert_eq!(config.player.time_format, TimeFormat::Unpadded);
        assert_eq!(config.player.skip_seconds, 10);
        assert_eq!(config.lyrics.providers, vec![LyricsProviderType::LyricsOvh]);
        assert_eq!(config.lyrics.context_after, 1);
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let err = CadenzaConfig::from_toml_str("[player]\ntick_interval_ms = 0").unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_bad_service_url_rejected() {
        let err =
            CadenzaConfig::from_toml_str("[services]\nstream_url = \"not a url\"").unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));

        let err = CadenzaConfig::from_toml_str("[services]\ngeo_url = \" \"").unwrap_err();
        assert!(matches!(err, CoreError::ConfigMissingField { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = CadenzaConfig::from_toml_str("[player\n").unwrap_err();
        assert!(matches!(err, CoreError::ConfigParseError(_)));
    }

    #[test]
    fn test_first_run_writes_template() {
        let dir = std::env::temp_dir().join(format!("cadenza-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_file(&path);

        let err = CadenzaConfig::load_or_create_at(&path).unwrap_err();
        assert!(matches!(err, CoreError::ConfigNotFound { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);

        let config = CadenzaConfig::load_or_create_at(&path).unwrap();
        assert_eq!(config.player.skip_seconds, 10);
        let _ = fs::remove_dir_all(&dir);
    }
}
