pub mod config;
pub mod error;
pub mod fetcher;
pub mod home;
pub mod http;
pub mod lrc;
pub mod navigation;
pub mod paths;
pub mod playback;
pub mod player;
pub mod progress;
pub mod provider;
pub mod render;
pub mod sync;
pub mod time;
pub mod wake_lock;

pub use config::{
    CadenzaConfig, LoggingConfig, LyricsConfig, LyricsProviderType, NetworkConfig, PlayerConfig,
    ServicesConfig, CONFIG_TEMPLATE,
};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
pub use error::CoreError;
pub use fetcher::LyricsFetcher;
pub use home::Greeting;
pub use http::build_client;
pub use lrc::{LrcFile, LrcLine, LrcMetadata};
pub use navigation::{player_link, search_link, search_text, PlayerParams};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME};
pub use playback::{PlayIcon, PlaybackCommand, PlaybackDevice, PlaybackState, PlayerPhase, TrackInfo};
pub use player::{Player, PlayerOptions};
pub use progress::{ProgressSync, ProgressView};
pub use provider::{
    Direction, FetchedLyrics, LyricsProvider, LyricsQuery, LyricsResult, SearchProvider,
    SearchResults, StreamProvider, StreamSource, TrackMatch, TrackProvider,
};
pub use render::{render, Emphasis, Frame, LyricRow, LyricsView, PlayerView, RenderOptions};
pub use sync::{RequestId, SyncEngine, SyncEvent};
pub use time::{format_clock, DurationExt, TimeFormat};
pub use wake_lock::{NoopWakeLock, WakeLock, WakeLockBackend};
