use crate::provider::StreamSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Normalized play/pause state. Changed only by an explicit toggle or by the
/// track ending, never inferred from the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    Playing,
    #[default]
    Paused,
}

impl PlaybackState {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Playing => Self::Paused,
            Self::Paused => Self::Playing,
        }
    }

    #[must_use]
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Device command that brings the device into this state
    #[must_use]
    pub const fn command(self) -> PlaybackCommand {
        match self {
            Self::Playing => PlaybackCommand::Play,
            Self::Paused => PlaybackCommand::Pause,
        }
    }

    /// Icon shown on the play/pause button: the action the button performs.
    #[must_use]
    pub const fn icon(self) -> PlayIcon {
        match self {
            Self::Playing => PlayIcon::Pause,
            Self::Paused => PlayIcon::Play,
        }
    }
}

/// Icon on the play/pause button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayIcon {
    Play,
    Pause,
}

/// Command issued to the playback device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Seek(Duration),
}

/// Player lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerPhase {
    /// No media selected
    #[default]
    Idle,
    /// Track selected, metadata not loaded yet
    Loading,
    /// Metadata loaded, not started
    Ready,
    Playing,
    Paused,
    /// Natural completion of the track
    Ended,
}

/// Lifecycle state machine for the player:
/// `Idle -> Loading -> Ready -> Playing <-> Paused -> Ended`.
#[derive(Debug, Clone, Default)]
pub struct PlayerMachine {
    phase: PlayerPhase,
    /// Requested state while metadata is still loading
    intent: PlaybackState,
}

impl PlayerMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> PlayerPhase {
        self.phase
    }

    #[must_use]
    pub const fn playback_state(&self) -> PlaybackState {
        match self.phase {
            PlayerPhase::Playing => PlaybackState::Playing,
            PlayerPhase::Loading => self.intent,
            _ => PlaybackState::Paused,
        }
    }

    /// A track was selected. Valid from every phase.
    pub fn load(&mut self, autoplay: bool) {
        self.phase = PlayerPhase::Loading;
        self.intent = if autoplay {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        };
    }

    /// Metadata arrived for the loading track. Repeated notifications are ignored.
    pub fn metadata_loaded(&mut self) {
        if self.phase == PlayerPhase::Loading {
            self.phase = if self.intent.is_playing() {
                PlayerPhase::Playing
            } else {
                PlayerPhase::Ready
            };
        }
    }

    /// Flip between playing and paused, returning the command for the device.
    ///
    /// Returns `None` when no media is loaded.
    pub fn toggle(&mut self) -> Option<PlaybackCommand> {
        match self.phase {
            PlayerPhase::Idle => None,
            PlayerPhase::Loading => {
                self.intent = self.intent.toggled();
                Some(self.intent.command())
            }
            PlayerPhase::Ready | PlayerPhase::Paused | PlayerPhase::Ended => {
                self.phase = PlayerPhase::Playing;
                Some(PlaybackCommand::Play)
            }
            PlayerPhase::Playing => {
                self.phase = PlayerPhase::Paused;
                Some(PlaybackCommand::Pause)
            }
        }
    }

    /// The device reported natural completion.
    ///
    /// Returns `true` when the track actually ended from a started state.
    pub fn ended(&mut self) -> bool {
        match self.phase {
            PlayerPhase::Playing | PlayerPhase::Paused | PlayerPhase::Ready => {
                self.phase = PlayerPhase::Ended;
                true
            }
            _ => false,
        }
    }
}

/// Track descriptor as returned by the track metadata service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Service track identifier
    #[serde(rename = "videoId")]
    pub track_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl TrackInfo {
    pub fn new(
        track_id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            track_id: track_id.into(),
            title: title.into(),
            author: author.into(),
            thumbnail: None,
        }
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }
}

/// The audio element: plays a stream and reports its clock back through the
/// sync engine. Implementations keep their own interior state.
pub trait PlaybackDevice: Send + Sync {
    /// Replace the current source. Playback stays paused until `play`.
    fn load(&self, source: &StreamSource);

    fn play(&self);

    fn pause(&self);

    fn seek(&self, position: Duration);

    /// Apply a command produced by the state machine
    fn apply(&self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Play => self.play(),
            PlaybackCommand::Pause => self.pause(),
            PlaybackCommand::Seek(position) => self.seek(position),
        }
    }
}
