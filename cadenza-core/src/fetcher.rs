//! Lyrics fetcher that orchestrates multiple lyrics providers.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::lrc::LrcFile;
use crate::playback::TrackInfo;
use crate::provider::{LyricsProvider, LyricsQuery, LyricsResult};
use crate::sync::{RequestId, SyncEngine, SyncEvent};
use crate::time::DurationExt;

/// How long a fetch waits for the device to report the track duration
pub const METADATA_WAIT: Duration = Duration::from_secs(2);

/// Lyrics fetcher that listens for track loads and fetches lyrics
pub struct LyricsFetcher {
    sync_engine: Arc<SyncEngine>,
    providers: Arc<[Arc<dyn LyricsProvider>]>,
    cancel_token: CancellationToken,
    metadata_wait: Duration,
}

impl LyricsFetcher {
    /// Create a new lyrics fetcher
    ///
    /// # Arguments
    /// * `sync_engine` - Sync engine to listen for track loads
    /// * `providers` - List of lyrics providers to try in order
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        sync_engine: Arc<SyncEngine>,
        providers: Vec<Arc<dyn LyricsProvider>>,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            sync_engine,
            providers: providers.into(),
            cancel_token: cancel_token.unwrap_or_default(),
            metadata_wait: METADATA_WAIT,
        }
    }

    /// Override how long a fetch waits for the track duration
    #[must_use]
    pub const fn with_metadata_wait(mut self, wait: Duration) -> Self {
        self.metadata_wait = wait;
        self
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start the lyrics fetcher in a background task. Tracks loaded after
    /// this returns are always seen.
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let rx = self.sync_engine.subscribe();
        tokio::spawn(async move {
            self.run(rx).await;
        })
    }

    /// Run the lyrics fetching loop
    async fn run(&self, mut rx: broadcast::Receiver<SyncEvent>) {
        info!("Initializing lyrics fetching handler");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Lyrics fetcher shutting down");
                    break;
                }
                event = rx.recv() => {
                    match event {
                        Ok(SyncEvent::TrackLoading { track, request }) => {
                            let events = self.sync_engine.subscribe();
                            self.spawn_fetch(track, request, events);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            break;
                        }
                        _ => {
                            // Lagged or unrelated event
                        }
                    }
                }
            }
        }
    }

    /// Fetch in its own task so a slow provider never delays the next track.
    /// Results for superseded tracks are dropped by the engine.
    fn spawn_fetch(
        &self,
        track: TrackInfo,
        request: RequestId,
        events: broadcast::Receiver<SyncEvent>,
    ) {
        let engine = Arc::clone(&self.sync_engine);
        let providers = Arc::clone(&self.providers);
        let cancel = self.cancel_token.clone();
        let wait = self.metadata_wait;
        tokio::spawn(async move {
            let fetch = async {
                let duration = wait_for_duration(&engine, request, events, wait).await;
                if engine.current_request().await != request {
                    debug!("Skipping lyrics for {}, track already replaced", track.title);
                    return;
                }
                fetch_for_track(&engine, &providers, &track, request, duration).await;
            };
            tokio::select! {
                () = cancel.cancelled() => {}
                () = fetch => {}
            }
        });
    }
}

/// Duration reported for `request`, waiting up to `wait` for the device
/// metadata. `None` when it never arrives or the track is replaced first.
async fn wait_for_duration(
    engine: &SyncEngine,
    request: RequestId,
    mut events: broadcast::Receiver<SyncEvent>,
    wait: Duration,
) -> Option<Duration> {
    if let Some(duration) = engine.known_duration(request).await {
        return Some(duration);
    }

    let metadata = async {
        loop {
            match events.recv().await {
                Ok(SyncEvent::MetadataLoaded {
                    request: loaded,
                    duration,
                }) if loaded == request => return Some(duration),
                Ok(SyncEvent::TrackLoading { .. }) | Err(broadcast::error::RecvError::Closed) => {
                    return None;
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    if let Some(duration) = engine.known_duration(request).await {
                        return Some(duration);
                    }
                }
                Ok(_) => {}
            }
        }
    };

    if let Ok(duration) = tokio::time::timeout(wait, metadata).await {
        duration
    } else {
        debug!("No duration for request {request}, fetching without it");
        None
    }
}

/// Fetch lyrics for a track and hand the outcome to the engine
pub async fn fetch_for_track(
    engine: &SyncEngine,
    providers: &[Arc<dyn LyricsProvider>],
    track: &TrackInfo,
    request: RequestId,
    duration: Option<Duration>,
) {
    info!(
        "Fetching lyrics for: {} - {} (request {request})",
        track.author, track.title
    );

    let mut query = LyricsQuery::for_track(track);
    if let Some(duration) = duration {
        query = query.with_duration(duration.as_secs_u32());
    }
    let applied = match lookup(providers, &query).await {
        Some(lrc) => engine.set_lyrics(request, lrc).await,
        None => {
            info!("No lyrics found for {} - {}", track.author, track.title);
            engine.set_no_lyrics(request).await
        }
    };
    if !applied {
        info!("Track changed while fetching lyrics for {}", track.title);
    }
}

/// Try providers in order. Synced lyrics win outright; otherwise the first
/// plain text result is used.
pub async fn lookup(
    providers: &[Arc<dyn LyricsProvider>],
    query: &LyricsQuery,
) -> Option<LrcFile> {
    let mut fallback: Option<LrcFile> = None;

    for provider in providers {
        info!("Trying provider: {}", provider.name());
        match provider.fetch(query).await {
            Ok(fetched) => match fetched.result {
                LyricsResult::Synced(lrc) if !lrc.is_empty() => {
                    info!(
                        "Found synced lyrics from {} ({} lines, provider_id: {})",
                        provider.name(),
                        lrc.lines.len(),
                        fetched.provider_id
                    );
                    return Some(lrc);
                }
                result @ (LyricsResult::Synced(_) | LyricsResult::Unsynced(_)) => {
                    if fallback.is_none() {
                        info!("Provider {} returned unsynced lyrics", provider.name());
                        fallback = result.into_lrc();
                    }
                }
                LyricsResult::NotFound => {
                    info!("Provider {} returned no lyrics", provider.name());
                }
            },
            Err(e) => {
                warn!("Provider {} failed with error: {}", provider.name(), e);
            }
        }
    }

    fallback
}
