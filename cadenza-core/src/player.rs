//! Player orchestration: wires the sync engine to the playback device and the
//! remote track services.

use crate::config::PlayerConfig;
use crate::error::CoreError;
use crate::navigation::PlayerParams;
use crate::playback::{PlaybackCommand, PlaybackDevice, TrackInfo};
use crate::provider::{Direction, StreamProvider, TrackProvider};
use crate::sync::{RequestId, SyncEngine};
use crate::wake_lock::WakeLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Notice shown when there is nothing to move to
#[must_use]
pub const fn no_track_notice(direction: Direction) -> &'static str {
    match direction {
        Direction::Next => "No next track available.",
        Direction::Previous => "No previous track available.",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerOptions {
    pub skip_step: Duration,
    pub auto_advance: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self::from(&PlayerConfig::default())
    }
}

impl From<&PlayerConfig> for PlayerOptions {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            skip_step: config.skip_step(),
            auto_advance: config.auto_advance,
        }
    }
}

pub struct Player {
    engine: Arc<SyncEngine>,
    device: Arc<dyn PlaybackDevice>,
    tracks: Arc<dyn TrackProvider>,
    streams: Arc<dyn StreamProvider>,
    wake_lock: Option<WakeLock>,
    options: PlayerOptions,
}

impl Player {
    pub fn new(
        engine: Arc<SyncEngine>,
        device: Arc<dyn PlaybackDevice>,
        tracks: Arc<dyn TrackProvider>,
        streams: Arc<dyn StreamProvider>,
        options: PlayerOptions,
    ) -> Self {
        Self {
            engine,
            device,
            tracks,
            streams,
            wake_lock: None,
            options,
        }
    }

    /// Hold `wake_lock` while a track is open
    #[must_use]
    pub fn with_wake_lock(mut self, wake_lock: WakeLock) -> Self {
        self.wake_lock = Some(wake_lock);
        self
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Open the player page. Without an `audioId` the player stays idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream URLs cannot be built for the track.
    pub async fn open(
        &self,
        params: Option<PlayerParams>,
        autoplay: bool,
    ) -> Result<Option<RequestId>, CoreError> {
        let Some(params) = params else {
            debug!("No audioId given, player stays idle");
            return Ok(None);
        };
        self.play_track(params.into_track(), autoplay).await.map(Some)
    }

    /// The device loaded metadata for the track started by `request`.
    /// Late reports for a replaced track are ignored.
    pub async fn on_metadata(&self, request: RequestId, duration: Duration) -> bool {
        self.engine.metadata_loaded(request, duration).await
    }

    /// Load `track` into the device and reset the engine for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream URLs cannot be built for the track. The
    /// current track is left untouched in that case.
    pub async fn play_track(&self, track: TrackInfo, autoplay: bool) -> Result<RequestId, CoreError> {
        let source = self.streams.stream_source(&track.track_id)?;
        let track = if track.thumbnail.is_some() {
            track
        } else {
            track.with_thumbnail(source.thumbnail_url.as_str())
        };

        info!("Loading track: {} - {}", track.author, track.title);
        let request = self.engine.load_track(track, autoplay).await;
        self.device.load(&source);
        if autoplay {
            self.device.play();
        }

        if let Some(wake_lock) = &self.wake_lock {
            wake_lock.request();
        }
        Ok(request)
    }

    /// Flip play/pause
    pub async fn toggle(&self) -> Option<PlaybackCommand> {
        let command = self.engine.toggle().await?;
        self.device.apply(command);
        Some(command)
    }

    /// Release the progress slider and seek once
    pub async fn commit_scrub(&self) -> Option<Duration> {
        let target = self.engine.commit_scrub().await?;
        self.device.seek(target);
        Some(target)
    }

    pub async fn skip_forward(&self) -> Option<Duration> {
        self.skip(true).await
    }

    pub async fn skip_backward(&self) -> Option<Duration> {
        self.skip(false).await
    }

    async fn skip(&self, forward: bool) -> Option<Duration> {
        let target = self.engine.skip(forward, self.options.skip_step).await?;
        self.device.seek(target);
        Some(target)
    }

    /// Move to the adjacent track. When the service has none, or fails, the
    /// current track keeps playing and a notice is shown.
    ///
    /// Returns whether a new track was loaded.
    pub async fn advance(&self, direction: Direction) -> bool {
        let Some(current) = self.engine.current_track().await else {
            debug!("No current track, ignoring {direction}");
            return false;
        };

        let next = match self.tracks.adjacent(&current.track_id, direction).await {
            Ok(next) => next,
            Err(e) => {
                warn!("Failed to fetch {direction} track from {}: {e}", self.tracks.name());
                None
            }
        };

        let Some(next) = next else {
            self.engine.set_notice(no_track_notice(direction)).await;
            return false;
        };

        match self.play_track(next, true).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to load {direction} track: {e}");
                self.engine.set_notice(no_track_notice(direction)).await;
                false
            }
        }
    }

    /// The device reported natural completion
    pub async fn on_ended(&self) -> bool {
        if !self.engine.track_ended().await {
            return false;
        }
        if self.options.auto_advance {
            self.advance(Direction::Next).await
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlayerPhase;
    use crate::provider::StreamSource;
    use crate::time::TimeFormat;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use url::Url;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Load(String),
        Play,
        Pause,
        Seek(Duration),
    }

    #[derive(Default)]
    struct FakeDevice {
        calls: Mutex<Vec<Call>>,
    }

    impl FakeDevice {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PlaybackDevice for FakeDevice {
        fn load(&self, source: &StreamSource) {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Load(source.audio_url.to_string()));
        }

        fn play(&self) {
            self.calls.lock().unwrap().push(Call::Play);
        }

        fn pause(&self) {
            self.calls.lock().unwrap().push(Call::Pause);
        }

        fn seek(&self, position: Duration) {
            self.calls.lock().unwrap().push(Call::Seek(position));
        }
    }

    /// Serves `next` for the next direction; errors for previous when `fail`
    struct FakeTracks {
        next: Option<TrackInfo>,
        fail: bool,
    }

    #[async_trait]
    impl TrackProvider for FakeTracks {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn adjacent(
            &self,
            _track_id: &str,
            direction: Direction,
        ) -> Result<Option<TrackInfo>, CoreError> {
            match direction {
                Direction::Next => Ok(self.next.clone()),
                Direction::Previous if self.fail => Err(CoreError::TrackProviderFailed {
                    provider: "fake".into(),
                    reason: "offline".into(),
                }),
                Direction::Previous => Ok(None),
            }
        }

        async fn home(&self, _country: &str) -> Result<Vec<TrackInfo>, CoreError> {
            Ok(Vec::new())
        }
    }

    struct FakeStreams;

    impl StreamProvider for FakeStreams {
        fn stream_source(&self, track_id: &str) -> Result<StreamSource, CoreError> {
            Ok(StreamSource {
                audio_url: Url::parse(&format!("https://audio.test/{track_id}"))?,
                thumbnail_url: Url::parse(&format!("https://thumb.test/{track_id}"))?,
            })
        }
    }

    fn player(next: Option<TrackInfo>, auto_advance: bool) -> (Player, Arc<FakeDevice>) {
        let device = Arc::new(FakeDevice::default());
        let player = Player::new(
            SyncEngine::new(TimeFormat::Padded),
            device.clone(),
            Arc::new(FakeTracks { next, fail: true }),
            Arc::new(FakeStreams),
            PlayerOptions {
                skip_step: Duration::from_secs(10),
                auto_advance,
            },
        );
        (player, device)
    }

    #[tokio::test]
    async fn test_open_without_params_stays_idle() {
        let (player, device) = player(None, true);
        assert_eq!(player.open(None, true).await.unwrap(), None);
        assert_eq!(player.engine().phase().await, PlayerPhase::Idle);
        assert!(device.calls().is_empty());
    }

    #[tokio::test]
    async fn test_open_loads_and_plays() {
        let (player, device) = player(None, true);
        let params = PlayerParams::from_query("audioId=abc&title=Song&author=Band");
        assert!(player.open(params, true).await.unwrap().is_some());

        assert_eq!(
            device.calls(),
            vec![Call::Load("https://audio.test/abc".into()), Call::Play]
        );
        let track = player.engine().current_track().await.unwrap();
        assert_eq!(track.thumbnail.as_deref(), Some("https://thumb.test/abc"));
        assert_eq!(player.engine().phase().await, PlayerPhase::Loading);
    }

    #[tokio::test]
    async fn test_open_paused_does_not_play() {
        let (player, device) = player(None, true);
        let params = PlayerParams::from_query("audioId=abc");
        assert!(player.open(params, false).await.unwrap().is_some());
        assert_eq!(device.calls(), vec![Call::Load("https://audio.test/abc".into())]);
    }

    #[tokio::test]
    async fn test_late_metadata_for_replaced_track_is_ignored() {
        let (player, _) = player(Some(TrackInfo::new("b", "B", "Band")), true);
        let first = player
            .play_track(TrackInfo::new("a", "A", "Band"), true)
            .await
            .unwrap();
        assert!(player.advance(Direction::Next).await);

        assert!(!player.on_metadata(first, Duration::from_secs(42)).await);
        assert_eq!(player.engine().phase().await, PlayerPhase::Loading);
        assert_eq!(player.engine().view().await.progress.elapsed, "--:--");
    }

    #[tokio::test]
    async fn test_toggle_forwards_to_device() {
        let (player, device) = player(None, true);
        let request = player
            .play_track(TrackInfo::new("a", "A", "Band"), false)
            .await
            .unwrap();
        assert!(player.on_metadata(request, Duration::from_secs(100)).await);

        assert_eq!(player.toggle().await, Some(PlaybackCommand::Play));
        assert_eq!(player.toggle().await, Some(PlaybackCommand::Pause));
        assert_eq!(&device.calls()[1..], &[Call::Play, Call::Pause]);
    }

    #[tokio::test]
    async fn test_skip_seeks_device() {
        let (player, device) = player(None, true);
        let request = player
            .play_track(TrackInfo::new("a", "A", "Band"), true)
            .await
            .unwrap();
        assert!(player.on_metadata(request, Duration::from_secs(100)).await);
        player.engine().tick(Duration::from_secs(95)).await;

        assert_eq!(player.skip_forward().await, Some(Duration::from_secs(100)));
        assert_eq!(player.skip_backward().await, Some(Duration::from_secs(90)));
        let calls = device.calls();
        assert_eq!(
            &calls[calls.len() - 2..],
            &[
                Call::Seek(Duration::from_secs(100)),
                Call::Seek(Duration::from_secs(90))
            ]
        );
    }

    #[tokio::test]
    async fn test_commit_scrub_seeks_once() {
        let (player, device) = player(None, true);
        let request = player
            .play_track(TrackInfo::new("a", "A", "Band"), true)
            .await
            .unwrap();
        assert!(player.on_metadata(request, Duration::from_secs(200)).await);
        player.engine().begin_scrub().await;
        player.engine().scrub_to(20.0).await;
        player.engine().scrub_to(50.0).await;

        assert_eq!(player.commit_scrub().await, Some(Duration::from_secs(100)));
        let seeks: Vec<_> = device
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Seek(_)))
            .collect();
        assert_eq!(seeks, vec![Call::Seek(Duration::from_secs(100))]);
    }

    #[tokio::test]
    async fn test_advance_loads_next_track() {
        let (player, _) = player(Some(TrackInfo::new("b", "B", "Band")), true);
        player
            .play_track(TrackInfo::new("a", "A", "Band"), true)
            .await
            .unwrap();
        assert!(player.advance(Direction::Next).await);
        assert_eq!(player.engine().current_track().await.unwrap().track_id, "b");
    }

    #[tokio::test]
    async fn test_advance_without_result_keeps_track_and_notifies() {
        let (player, _) = player(None, true);
        player
            .play_track(TrackInfo::new("a", "A", "Band"), true)
            .await
            .unwrap();

        assert!(!player.advance(Direction::Next).await);
        let view = player.engine().view().await;
        assert_eq!(view.track.unwrap().track_id, "a");
        assert_eq!(view.notice.as_deref(), Some("No next track available."));

        // Service errors degrade the same way
        assert!(!player.advance(Direction::Previous).await);
        assert_eq!(
            player.engine().view().await.notice.as_deref(),
            Some("No previous track available.")
        );
    }

    #[tokio::test]
    async fn test_on_ended_auto_advances() {
        let (player, _) = player(Some(TrackInfo::new("b", "B", "Band")), true);
        let request = player
            .play_track(TrackInfo::new("a", "A", "Band"), true)
            .await
            .unwrap();
        assert!(player.on_metadata(request, Duration::from_secs(10)).await);

        assert!(player.on_ended().await);
        assert_eq!(player.engine().current_track().await.unwrap().track_id, "b");
    }

    #[tokio::test]
    async fn test_on_ended_without_auto_advance_stops() {
        let (player, _) = player(Some(TrackInfo::new("b", "B", "Band")), false);
        let request = player
            .play_track(TrackInfo::new("a", "A", "Band"), true)
            .await
            .unwrap();
        assert!(player.on_metadata(request, Duration::from_secs(10)).await);

        assert!(!player.on_ended().await);
        assert_eq!(player.engine().phase().await, PlayerPhase::Ended);
    }

    #[tokio::test]
    async fn test_play_track_requests_wake_lock() {
        let (player, _) = player(None, true);
        let player = player.with_wake_lock(WakeLock::default());
        player
            .play_track(TrackInfo::new("a", "A", "Band"), true)
            .await
            .unwrap();
        assert!(player.wake_lock.as_ref().is_some_and(WakeLock::is_held));
    }
}
