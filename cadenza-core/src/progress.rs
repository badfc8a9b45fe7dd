//! Bidirectional sync between the playback clock and the position slider.
//!
//! The slider is normalized to `[0, 100]`. On every clock tick the slider
//! follows the clock. While the user holds the slider (a scrub) the displayed
//! times follow the pointer instead, and the clock is seeked only once, when
//! the gesture commits.

use crate::time::{duration_from_secs_f64, format_clock, TimeFormat, TIME_PLACEHOLDER};
use std::time::Duration;

pub const SLIDER_MAX: f64 = 100.0;

/// What the progress area shows for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    /// Slider position in `[0, 100]`
    pub slider: f64,
    /// Elapsed time text, or the placeholder
    pub elapsed: String,
    /// Remaining time text without sign, or the placeholder
    pub remaining: String,
    pub scrubbing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressSync {
    format: TimeFormat,
    duration: Option<Duration>,
    position: Duration,
    /// Slider value while the pointer is held
    scrub: Option<f64>,
}

impl ProgressSync {
    #[must_use]
    pub fn new(format: TimeFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Forget everything about the previous track
    pub fn reset(&mut self) {
        self.duration = None;
        self.position = Duration::ZERO;
        self.scrub = None;
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = Some(duration);
    }

    /// Known, non-zero duration
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.duration.filter(|d| !d.is_zero())
    }

    #[must_use]
    pub const fn position(&self) -> Duration {
        self.position
    }

    #[must_use]
    pub const fn is_scrubbing(&self) -> bool {
        self.scrub.is_some()
    }

    /// Record a clock tick. The slider only follows when no scrub is active.
    pub fn tick(&mut self, position: Duration) {
        self.position = position;
    }

    /// Pointer pressed on the slider
    pub fn begin_scrub(&mut self) {
        if self.scrub.is_none() {
            self.scrub = Some(self.clock_slider());
        }
    }

    /// Pointer moved while held. Returns `false` when no scrub is active or
    /// the value is not a number.
    pub fn scrub_to(&mut self, value: f64) -> bool {
        if self.scrub.is_none() || value.is_nan() {
            return false;
        }
        self.scrub = Some(value.clamp(0.0, SLIDER_MAX));
        true
    }

    /// Pointer released: end the scrub and return the single seek target.
    ///
    /// Returns `None` when no scrub was active or the duration is unknown.
    pub fn commit_scrub(&mut self) -> Option<Duration> {
        let value = self.scrub.take()?;
        let target = self.slider_to_time(value)?;
        self.position = target;
        Some(target)
    }

    /// Abandon the scrub without seeking
    pub fn cancel_scrub(&mut self) {
        self.scrub = None;
    }

    /// Seek target for a relative jump, clamped to the track.
    ///
    /// Rewinding works without a duration. Forward skips return `None` while
    /// the end of the track is unknown.
    pub fn skip(&mut self, forward: bool, step: Duration) -> Option<Duration> {
        let target = if forward {
            self.position.saturating_add(step).min(self.duration()?)
        } else {
            self.position.saturating_sub(step)
        };
        self.position = target;
        Some(target)
    }

    #[must_use]
    pub fn view(&self) -> ProgressView {
        let (slider, shown) = match self.scrub {
            Some(value) => (value, self.slider_to_time(value)),
            None => (self.clock_slider(), self.duration().map(|_| self.position)),
        };

        let (elapsed, remaining) = match (shown, self.duration()) {
            (Some(shown), Some(duration)) => {
                let shown = shown.min(duration);
                (
                    format_clock(shown, self.format),
                    format_clock(duration.saturating_sub(shown), self.format),
                )
            }
            _ => (TIME_PLACEHOLDER.to_string(), TIME_PLACEHOLDER.to_string()),
        };

        ProgressView {
            slider,
            elapsed,
            remaining,
            scrubbing: self.is_scrubbing(),
        }
    }

    fn clock_slider(&self) -> f64 {
        self.duration().map_or(0.0, |duration| {
            (SLIDER_MAX * self.position.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, SLIDER_MAX)
        })
    }

    fn slider_to_time(&self, value: f64) -> Option<Duration> {
        let duration = self.duration()?;
        duration_from_secs_f64(duration.as_secs_f64() * value / SLIDER_MAX)
    }
}
