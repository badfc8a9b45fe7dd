//! Headless playback device driven by a virtual clock.

use cadenza_core::{PlaybackDevice, StreamSource};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct Clock {
    source: Option<StreamSource>,
    /// Position when the clock was last paused or seeked
    base: Duration,
    /// Set while running
    since: Option<Instant>,
    ended: bool,
}

impl Clock {
    fn position(&self, duration: Option<Duration>) -> Duration {
        let position = self
            .since
            .map_or(self.base, |since| self.base.saturating_add(since.elapsed()));
        duration.map_or(position, |duration| position.min(duration))
    }
}

/// Plays nothing; advances a clock while "playing" and reports the end of the
/// track once the configured duration is reached.
pub struct VirtualDevice {
    clock: Mutex<Clock>,
    duration: Option<Duration>,
}

impl VirtualDevice {
    /// `duration` applies to every loaded track. Without it the track never
    /// ends and its length stays unknown.
    pub fn new(duration: Option<Duration>) -> Self {
        Self {
            clock: Mutex::new(Clock::default()),
            duration: duration.filter(|d| !d.is_zero()),
        }
    }

    fn clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub const fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn position(&self) -> Duration {
        self.clock().position(self.duration)
    }

    /// Report natural completion once per track
    pub fn take_ended(&self) -> bool {
        let mut clock = self.clock();
        let Some(duration) = self.duration else {
            return false;
        };
        if clock.ended || clock.since.is_none() || clock.position(Some(duration)) < duration {
            return false;
        }
        clock.base = duration;
        clock.since = None;
        clock.ended = true;
        true
    }
}

impl PlaybackDevice for VirtualDevice {
    fn load(&self, source: &StreamSource) {
        debug!("Loading stream {}", source.audio_url);
        *self.clock() = Clock {
            source: Some(source.clone()),
            ..Clock::default()
        };
    }

    fn play(&self) {
        let mut clock = self.clock();
        if clock.source.is_none() || clock.since.is_some() {
            return;
        }
        if clock.ended {
            // Replay from the start
            clock.base = Duration::ZERO;
            clock.ended = false;
        }
        clock.since = Some(Instant::now());
    }

    fn pause(&self) {
        let mut clock = self.clock();
        clock.base = clock.position(self.duration);
        clock.since = None;
    }

    fn seek(&self, position: Duration) {
        let mut clock = self.clock();
        clock.base = self.duration.map_or(position, |d| position.min(d));
        clock.ended = false;
        if clock.since.is_some() {
            clock.since = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> StreamSource {
        StreamSource {
            audio_url: "https://audio.test/a".parse().unwrap(),
            thumbnail_url: "https://thumb.test/a".parse().unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_runs_only_while_playing() {
        let device = VirtualDevice::new(Some(Duration::from_secs(60)));
        device.load(&source());
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(device.position(), Duration::ZERO);

        device.play();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(device.position(), Duration::from_secs(5));

        device.pause();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(device.position(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_and_end() {
        let device = VirtualDevice::new(Some(Duration::from_secs(60)));
        device.load(&source());
        device.play();
        device.seek(Duration::from_secs(58));
        assert!(!device.take_ended());

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(device.position(), Duration::from_secs(60));
        assert!(device.take_ended());
        assert!(!device.take_ended());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_duration_never_ends() {
        let device = VirtualDevice::new(None);
        device.load(&source());
        device.play();
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(!device.take_ended());
        assert_eq!(device.duration(), None);
    }

    #[test]
    fn test_play_without_source_is_ignored() {
        let device = VirtualDevice::new(None);
        device.play();
        assert!(device.clock().since.is_none());
    }
}
