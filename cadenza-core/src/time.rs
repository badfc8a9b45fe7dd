//! Time conversion and clock formatting utilities.
//!
//! Playback devices report positions as float seconds; everything inside the
//! synchronizer works on [`Duration`]. Conversions here reject the values a
//! device reports before metadata has loaded (NaN, infinity, negatives) so no
//! `NaN` ever reaches the display.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text shown in place of a time when the duration is not yet known.
pub const TIME_PLACEHOLDER: &str = "--:--";

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Convert duration to seconds as u32, saturating at `u32::MAX`.
    ///
    /// In practice, this is always safe for audio tracks because
    /// `u32::MAX` seconds is approximately 136 years.
    fn as_secs_u32(&self) -> u32;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn as_secs_u32(&self) -> u32 {
        u32::try_from(self.as_secs()).unwrap_or(u32::MAX)
    }
}

/// Convert device-reported float seconds into a [`Duration`].
///
/// Returns `None` for NaN, infinite or negative input.
#[must_use]
pub fn duration_from_secs_f64(secs: f64) -> Option<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

/// How minutes are rendered in `mm:ss` clock text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFormat {
    /// `01:40`
    #[default]
    Padded,
    /// `1:40`
    Unpadded,
}

/// Format a duration as clock text, floored to whole seconds.
#[must_use]
pub fn format_clock(duration: Duration, format: TimeFormat) -> String {
    let total = duration.as_secs();
    let minutes = total / 60;
    let seconds = total % 60;
    match format {
        TimeFormat::Padded => format!("{minutes:02}:{seconds:02}"),
        TimeFormat::Unpadded => format!("{minutes}:{seconds:02}"),
    }
}
