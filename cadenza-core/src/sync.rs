use crate::lrc::LrcFile;
use crate::playback::{PlaybackCommand, PlaybackState, PlayerMachine, PlayerPhase, TrackInfo};
use crate::progress::ProgressSync;
use crate::render::{LyricsView, PlayerView};
use crate::time::TimeFormat;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Identifies one track load. Lyrics responses carrying an older id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RequestId(u64);

impl RequestId {
    #[must_use]
    const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events emitted by the sync engine
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A track was selected and its lyrics should be requested
    TrackLoading {
        track: TrackInfo,
        request: RequestId,
    },
    /// The device reported the track duration
    MetadataLoaded {
        request: RequestId,
        duration: Duration,
    },
    /// Playback was paused
    PlaybackPaused {
        position: Duration,
    },
    /// Playback was resumed
    PlaybackResumed {
        position: Duration,
    },
    /// Regular position sync update
    PositionSync {
        position: Duration,
    },
    /// The highlighted lyric line changed
    LineChanged {
        index: Option<usize>,
    },
    /// A seek was committed
    SeekOccurred {
        position: Duration,
    },
    /// The track played to completion
    TrackEnded,
    /// Lyrics were loaded for current track
    LyricsLoaded {
        lyrics: Arc<LrcFile>,
    },
    /// No lyrics found for current track
    LyricsNotFound,
    /// Non-fatal message for the user
    Notice {
        message: String,
    },
}

#[derive(Debug, Clone)]
enum LyricsSlot {
    Idle,
    Pending,
    Loaded(Arc<LrcFile>),
    NotFound,
}

/// Sync engine state
struct SyncEngineInner {
    machine: PlayerMachine,
    progress: ProgressSync,
    track: Option<TrackInfo>,
    lyrics: LyricsSlot,
    current_line: Option<usize>,
    request: RequestId,
    notice: Option<String>,
}

impl SyncEngineInner {
    fn new(format: TimeFormat) -> Self {
        Self {
            machine: PlayerMachine::new(),
            progress: ProgressSync::new(format),
            track: None,
            lyrics: LyricsSlot::Idle,
            current_line: None,
            request: RequestId::default(),
            notice: None,
        }
    }

    /// Recompute the highlighted line from the clock. Returns the new index
    /// when it changed.
    fn refresh_line(&mut self) -> Option<Option<usize>> {
        let index = match &self.lyrics {
            LyricsSlot::Loaded(lyrics) => lyrics.current_line_index(self.progress.position()),
            _ => None,
        };
        if index == self.current_line {
            None
        } else {
            self.current_line = index;
            Some(index)
        }
    }
}

/// Engine that synchronizes playback state, the progress slider and lyrics
pub struct SyncEngine {
    inner: RwLock<SyncEngineInner>,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    #[must_use]
    pub fn new(format: TimeFormat) -> Arc<Self> {
        Arc::new(Self::with_format(format))
    }

    fn with_format(format: TimeFormat) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            inner: RwLock::new(SyncEngineInner::new(format)),
            event_tx,
        }
    }

    /// Subscribe to sync events
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Start loading a new track. Everything from the previous track is reset.
    pub async fn load_track(&self, track: TrackInfo, autoplay: bool) -> RequestId {
        let mut inner = self.inner.write().await;
        inner.request = inner.request.next();
        inner.machine.load(autoplay);
        inner.progress.reset();
        inner.track = Some(track.clone());
        inner.lyrics = LyricsSlot::Pending;
        inner.current_line = None;
        inner.notice = None;

        let request = inner.request;
        self.emit(SyncEvent::TrackLoading { track, request });
        request
    }

    /// The device finished loading metadata for the load identified by
    /// `request`. Returns `false` and ignores the duration when a newer track
    /// has been loaded since.
    pub async fn metadata_loaded(&self, request: RequestId, duration: Duration) -> bool {
        let mut inner = self.inner.write().await;
        if inner.request != request || inner.track.is_none() {
            debug!("Discarding stale metadata for request {request}");
            return false;
        }
        inner.progress.set_duration(duration);
        inner.machine.metadata_loaded();
        self.emit(SyncEvent::MetadataLoaded { request, duration });
        true
    }

    /// Track duration once metadata for `request` has loaded
    pub async fn known_duration(&self, request: RequestId) -> Option<Duration> {
        let inner = self.inner.read().await;
        if inner.request == request {
            inner.progress.duration()
        } else {
            None
        }
    }

    /// Periodic clock update from the device
    pub async fn tick(&self, position: Duration) {
        let mut inner = self.inner.write().await;
        inner.progress.tick(position);
        if let Some(index) = inner.refresh_line() {
            self.emit(SyncEvent::LineChanged { index });
        }
        self.emit(SyncEvent::PositionSync { position });
    }

    /// Flip play/pause. Returns the command for the device, or `None` when
    /// nothing is loaded.
    pub async fn toggle(&self) -> Option<PlaybackCommand> {
        let mut inner = self.inner.write().await;
        let command = inner.machine.toggle()?;
        let position = inner.progress.position();
        if inner.machine.playback_state().is_playing() {
            self.emit(SyncEvent::PlaybackResumed { position });
        } else {
            self.emit(SyncEvent::PlaybackPaused { position });
        }
        Some(command)
    }

    /// The device reported natural completion
    pub async fn track_ended(&self) -> bool {
        let mut inner = self.inner.write().await;
        let ended = inner.machine.ended();
        if ended {
            self.emit(SyncEvent::TrackEnded);
        }
        ended
    }

    pub async fn begin_scrub(&self) {
        self.inner.write().await.progress.begin_scrub();
    }

    /// Move the held slider. Only the displayed times change.
    pub async fn scrub_to(&self, value: f64) -> bool {
        self.inner.write().await.progress.scrub_to(value)
    }

    pub async fn cancel_scrub(&self) {
        self.inner.write().await.progress.cancel_scrub();
    }

    /// Release the slider. Returns the position the device should seek to.
    pub async fn commit_scrub(&self) -> Option<Duration> {
        let mut inner = self.inner.write().await;
        let target = inner.progress.commit_scrub()?;
        self.after_seek(&mut inner, target);
        Some(target)
    }

    /// Relative jump, clamped to the track. Returns the seek target.
    pub async fn skip(&self, forward: bool, step: Duration) -> Option<Duration> {
        let mut inner = self.inner.write().await;
        inner.track.as_ref()?;
        let target = inner.progress.skip(forward, step)?;
        self.after_seek(&mut inner, target);
        Some(target)
    }

    fn after_seek(&self, inner: &mut SyncEngineInner, target: Duration) {
        self.emit(SyncEvent::SeekOccurred { position: target });
        if let Some(index) = inner.refresh_line() {
            self.emit(SyncEvent::LineChanged { index });
        }
    }

    /// Set lyrics for the load identified by `request`.
    ///
    /// Returns `false` and drops the lyrics when a newer track has been loaded
    /// since the request started. An empty file counts as not found.
    pub async fn set_lyrics(&self, request: RequestId, lyrics: LrcFile) -> bool {
        let mut inner = self.inner.write().await;
        if inner.request != request {
            debug!("Discarding stale lyrics for request {request}");
            return false;
        }
        if lyrics.is_empty() {
            inner.lyrics = LyricsSlot::NotFound;
            inner.current_line = None;
            self.emit(SyncEvent::LyricsNotFound);
            return true;
        }

        let lyrics = Arc::new(lyrics);
        inner.lyrics = LyricsSlot::Loaded(Arc::clone(&lyrics));
        inner.current_line = None;
        self.emit(SyncEvent::LyricsLoaded { lyrics });
        if let Some(index) = inner.refresh_line() {
            self.emit(SyncEvent::LineChanged { index });
        }
        true
    }

    /// Mark that no lyrics were found for the load identified by `request`
    pub async fn set_no_lyrics(&self, request: RequestId) -> bool {
        let mut inner = self.inner.write().await;
        if inner.request != request {
            debug!("Discarding stale not-found result for request {request}");
            return false;
        }
        inner.lyrics = LyricsSlot::NotFound;
        inner.current_line = None;
        self.emit(SyncEvent::LyricsNotFound);
        true
    }

    /// Show a non-fatal message
    pub async fn set_notice(&self, message: impl Into<String>) {
        let message = message.into();
        self.inner.write().await.notice = Some(message.clone());
        self.emit(SyncEvent::Notice { message });
    }

    pub async fn clear_notice(&self) {
        self.inner.write().await.notice = None;
    }

    /// Snapshot for rendering
    pub async fn view(&self) -> PlayerView {
        let inner = self.inner.read().await;
        let lyrics = match &inner.lyrics {
            LyricsSlot::Idle => LyricsView::Idle,
            LyricsSlot::Pending => LyricsView::Loading,
            LyricsSlot::NotFound => LyricsView::NotFound,
            LyricsSlot::Loaded(lyrics) => LyricsView::Loaded {
                lyrics: Arc::clone(lyrics),
                current: inner.current_line,
            },
        };
        PlayerView {
            track: inner.track.clone(),
            phase: inner.machine.phase(),
            playback: inner.machine.playback_state(),
            progress: inner.progress.view(),
            lyrics,
            notice: inner.notice.clone(),
        }
    }

    /// Id of the most recent track load
    pub async fn current_request(&self) -> RequestId {
        self.inner.read().await.request
    }

    /// Get current track info
    pub async fn current_track(&self) -> Option<TrackInfo> {
        self.inner.read().await.track.clone()
    }

    pub async fn playback_state(&self) -> PlaybackState {
        self.inner.read().await.machine.playback_state()
    }

    pub async fn phase(&self) -> PlayerPhase {
        self.inner.read().await.machine.phase()
    }

    /// Index of the highlighted lyric line
    pub async fn current_line(&self) -> Option<usize> {
        self.inner.read().await.current_line
    }

    /// Clock position from the last tick or seek
    pub async fn position(&self) -> Duration {
        self.inner.read().await.progress.position()
    }

    pub async fn is_scrubbing(&self) -> bool {
        self.inner.read().await.progress.is_scrubbing()
    }
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::with_format(TimeFormat::default())
    }
}
