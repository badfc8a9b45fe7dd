//! Pure rendering from a per-tick view model to display instructions.

use crate::lrc::LrcFile;
use crate::playback::{PlayIcon, PlaybackState, PlayerPhase, TrackInfo};
use crate::progress::ProgressView;
use crate::time::TIME_PLACEHOLDER;
use std::sync::Arc;

/// Shown when no lyrics could be found for the track
pub const LYRICS_NOT_FOUND: &str = "Lyrics not found.";

/// Shown while the lyrics request is in flight
pub const LYRICS_LOADING: &str = "Loading lyrics...";

/// Lyrics part of the view model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsView {
    /// No track selected
    Idle,
    Loading,
    NotFound,
    Loaded {
        lyrics: Arc<LrcFile>,
        current: Option<usize>,
    },
}

/// Immutable snapshot of everything the player displays
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub track: Option<TrackInfo>,
    pub phase: PlayerPhase,
    pub playback: PlaybackState,
    pub progress: ProgressView,
    pub lyrics: LyricsView,
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Lines shown before the current line
    pub context_before: usize,
    /// Lines shown after the current line
    pub context_after: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            context_before: 1,
            context_after: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Current,
    /// Already sung, or plain lyrics without timing
    Context,
    /// Not reached yet
    Upcoming,
    /// Placeholder message instead of lyrics
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricRow {
    pub text: String,
    pub emphasis: Emphasis,
}

impl LyricRow {
    fn new(text: impl Into<String>, emphasis: Emphasis) -> Self {
        Self {
            text: text.into(),
            emphasis,
        }
    }
}

/// Display instructions for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub icon: PlayIcon,
    pub title: String,
    pub artist: String,
    pub thumbnail: Option<String>,
    pub slider: f64,
    pub elapsed: String,
    /// Remaining time with a leading `-`, or the placeholder
    pub remaining: String,
    pub lyrics: Vec<LyricRow>,
    pub notice: Option<String>,
}

/// Turn a view model into display instructions.
#[must_use]
pub fn render(view: &PlayerView, options: &RenderOptions) -> Frame {
    let (title, artist, thumbnail) = view.track.as_ref().map_or_else(
        || (String::new(), String::new(), None),
        |track| (track.title.clone(), track.author.clone(), track.thumbnail.clone()),
    );

    Frame {
        icon: view.playback.icon(),
        title,
        artist,
        thumbnail,
        slider: view.progress.slider,
        elapsed: view.progress.elapsed.clone(),
        remaining: signed_remaining(&view.progress.remaining),
        lyrics: lyric_rows(&view.lyrics, options),
        notice: view.notice.clone(),
    }
}

fn signed_remaining(remaining: &str) -> String {
    if remaining == TIME_PLACEHOLDER {
        remaining.to_string()
    } else {
        format!("-{remaining}")
    }
}

fn lyric_rows(lyrics: &LyricsView, options: &RenderOptions) -> Vec<LyricRow> {
    match lyrics {
        LyricsView::Idle => Vec::new(),
        LyricsView::Loading => vec![LyricRow::new(LYRICS_LOADING, Emphasis::Fallback)],
        LyricsView::NotFound => vec![LyricRow::new(LYRICS_NOT_FOUND, Emphasis::Fallback)],
        LyricsView::Loaded { lyrics, .. } if lyrics.is_empty() => {
            vec![LyricRow::new(LYRICS_NOT_FOUND, Emphasis::Fallback)]
        }
        LyricsView::Loaded { lyrics, current } => {
            // Plain lyrics have no highlight to follow, show all of them
            if !lyrics.is_synced() {
                return lyrics
                    .lines
                    .iter()
                    .map(|line| LyricRow::new(line.text.as_str(), Emphasis::Context))
                    .collect();
            }
            lyrics
                .visible_range(*current, options.context_before, options.context_after)
                .map(|index| {
                    let emphasis = match current {
                        Some(current) if index == *current => Emphasis::Current,
                        Some(current) if index < *current => Emphasis::Context,
                        _ => Emphasis::Upcoming,
                    };
                    LyricRow::new(lyrics.lines[index].text.as_str(), emphasis)
                })
                .collect()
        }
    }
}
