use std::ops::Range;
use std::time::Duration;

/// Parsed lyrics payload: ID-tag metadata plus lines in payload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LrcFile {
    pub metadata: LrcMetadata,
    pub lines: Vec<LrcLine>,
}

/// LRC metadata from ID tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LrcMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub author: Option<String>,
    pub length: Option<Duration>,
    pub offset: i64, // milliseconds, can be negative
}

/// A single line of lyrics. Untimed lines are shown but never become current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrcLine {
    pub start_time: Option<Duration>,
    pub text: String,
}

impl LrcLine {
    pub fn timed(start_time: Duration, text: impl Into<String>) -> Self {
        Self {
            start_time: Some(start_time),
            text: text.into(),
        }
    }

    pub fn untimed(text: impl Into<String>) -> Self {
        Self {
            start_time: None,
            text: text.into(),
        }
    }

    #[must_use]
    pub const fn is_timed(&self) -> bool {
        self.start_time.is_some()
    }
}

const ID_TAGS: &[&str] = &["ti", "ar", "al", "au", "by", "length", "offset", "re", "ve"];

impl LrcFile {
    /// Parse a lyrics payload.
    ///
    /// Never fails: lines with a recognizable timestamp prefix become timed
    /// lines, anything else is kept as an untimed line. An empty payload yields
    /// an empty file.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let mut metadata = LrcMetadata::default();
        let mut lines = Vec::new();

        for line in input.trim_start_matches('\u{feff}').lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some((tag, value)) = parse_id_tag(line) {
                match tag.as_str() {
                    "ti" => metadata.title = Some(value),
                    "ar" => metadata.artist = Some(value),
                    "al" => metadata.album = Some(value),
                    "au" => metadata.author = Some(value),
                    "length" => metadata.length = parse_timestamp(&value),
                    "offset" => {
                        if let Ok(offset) = value.parse::<i64>() {
                            metadata.offset = offset;
                        }
                    }
                    _ => {} // by, re, ve carry nothing we display
                }
                continue;
            }

            match parse_lyric_line(line) {
                Some((timestamps, text)) => {
                    // One line per timestamp, e.g. [00:05][00:15]Chorus
                    lines.extend(timestamps.into_iter().map(|t| LrcLine::timed(t, text)));
                }
                None => lines.push(LrcLine::untimed(line)),
            }
        }

        if metadata.offset != 0 {
            for line in &mut lines {
                if let Some(start) = line.start_time {
                    line.start_time = Some(apply_offset(start, metadata.offset));
                }
            }
        }

        Self { metadata, lines }
    }

    /// Parse an optional payload, as delivered by a provider response field.
    ///
    /// A missing or blank payload yields an empty file; callers show the
    /// "lyrics not found" state for it.
    #[must_use]
    pub fn from_payload(payload: Option<&str>) -> Self {
        payload.map_or_else(Self::default, Self::parse)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any line carries a timestamp
    #[must_use]
    pub fn is_synced(&self) -> bool {
        self.lines.iter().any(LrcLine::is_timed)
    }

    /// Index of the line that most recently started at `position`.
    ///
    /// Picks the timed line with the greatest start time not after `position`.
    /// When several lines share that start time the later one wins. Returns
    /// `None` before the first timestamp or when no line is timed.
    #[must_use]
    pub fn current_line_index(&self, position: Duration) -> Option<usize> {
        let mut best: Option<(Duration, usize)> = None;
        for (index, line) in self.lines.iter().enumerate() {
            let Some(start) = line.start_time else {
                continue;
            };
            if start > position {
                continue;
            }
            if best.map_or(true, |(best_start, _)| start >= best_start) {
                best = Some((start, index));
            }
        }
        best.map(|(_, index)| index)
    }

    /// Find the current line for a given playback position
    #[must_use]
    pub fn current_line(&self, position: Duration) -> Option<&LrcLine> {
        self.current_line_index(position).map(|i| &self.lines[i])
    }

    /// Range of line indices to display around `current`.
    ///
    /// Without a current line the first `after + 1` lines are shown.
    #[must_use]
    pub fn visible_range(&self, current: Option<usize>, before: usize, after: usize) -> Range<usize> {
        let len = self.lines.len();
        match current {
            Some(index) if index < len => {
                let start = index.saturating_sub(before);
                let end = index.saturating_add(after).saturating_add(1).min(len);
                start..end
            }
            _ => 0..after.saturating_add(1).min(len),
        }
    }
}

/// Parse an ID tag like [ti:Title] or [offset:500]. Only known tag names count,
/// so section markers such as `[Chorus: Artist]` stay lyric text.
fn parse_id_tag(line: &str) -> Option<(String, String)> {
    let content = line.strip_prefix('[')?.strip_suffix(']')?;
    let (tag, value) = content.split_once(':')?;
    let tag = tag.trim().to_ascii_lowercase();
    if !ID_TAGS.contains(&tag.as_str()) {
        return None;
    }
    Some((tag, value.trim().to_string()))
}

/// Split leading timestamps off a line like `[00:12.34]Hello` or
/// `[00:05][00:15]Repeated`.
fn parse_lyric_line(line: &str) -> Option<(Vec<Duration>, &str)> {
    let mut remaining = line;
    let mut timestamps = Vec::new();

    while let Some(rest) = remaining.strip_prefix('[') {
        let Some(end) = rest.find(']') else {
            break;
        };
        let Some(time) = parse_timestamp(&rest[..end]) else {
            break;
        };
        timestamps.push(time);
        remaining = &rest[end + 1..];
    }

    if timestamps.is_empty() {
        None
    } else {
        Some((timestamps, remaining.trim()))
    }
}

/// Parse `m:ss`, `m:ss.f` (one to three fraction digits) or `mm:ss:xx`.
fn parse_timestamp(s: &str) -> Option<Duration> {
    let mut parts = s.trim().split(':');
    let minutes = parse_digits(parts.next()?)?;
    let seconds_part = parts.next()?;
    let hundredths_part = parts.next();
    if parts.next().is_some() {
        return None;
    }

    let (seconds_str, fraction_str) = match hundredths_part {
        Some(hundredths) => (seconds_part, Some(hundredths)),
        None => match seconds_part.split_once('.') {
            Some((secs, frac)) => (secs, Some(frac)),
            None => (seconds_part, None),
        },
    };

    if seconds_str.is_empty() || seconds_str.len() > 2 {
        return None;
    }
    let seconds = parse_digits(seconds_str)?;
    if seconds >= 60 {
        return None;
    }
    let millis = match fraction_str {
        Some(fraction) => parse_fraction_millis(fraction)?,
        None => 0,
    };

    let total = minutes
        .checked_mul(60_000)?
        .checked_add(seconds * 1000)?
        .checked_add(millis)?;
    Some(Duration::from_millis(total))
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Decimal fraction of a second in milliseconds: "5" = 500, "34" = 340, "500" = 500.
fn parse_fraction_millis(fraction: &str) -> Option<u64> {
    if fraction.is_empty() || fraction.len() > 3 {
        return None;
    }
    let value = parse_digits(fraction)?;
    let scale = match fraction.len() {
        1 => 100,
        2 => 10,
        _ => 1,
    };
    Some(value * scale)
}

/// Apply a millisecond offset to a duration (can be negative)
fn apply_offset(duration: Duration, offset_ms: i64) -> Duration {
    let magnitude = Duration::from_millis(offset_ms.unsigned_abs());
    if offset_ms >= 0 {
        duration + magnitude
    } else {
        duration.saturating_sub(magnitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timed_file(seconds: &[u64]) -> LrcFile {
        LrcFile {
            metadata: LrcMetadata::default(),
            lines: seconds
                .iter()
                .map(|s| LrcLine::timed(Duration::from_secs(*s), format!("at {s}")))
                .collect(),
        }
    }

    #[test]
    fn test_parse_simple_lrc() {
        let result = LrcFile::parse("[00:12.34]Hello world");
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].start_time, Some(Duration::from_millis(12340)));
        assert_eq!(result.lines[0].text, "Hello world");
    }

    #[test]
    fn test_parse_millisecond_timestamp() {
        let result = LrcFile::parse("[01:02.500]Sixty two and a half");
        let start = result.lines[0].start_time.unwrap();
        assert!((start.as_secs_f64() - 62.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_whole_second_timestamp() {
        let result = LrcFile::parse("[1:05]Short form");
        assert_eq!(result.lines[0].start_time, Some(Duration::from_secs(65)));
        assert_eq!(result.lines[0].text, "Short form");
    }

    #[test]
    fn test_alternative_timestamp_format() {
        // Some LRC files use mm:ss:xx format (colon instead of dot for hundredths)
        let result = LrcFile::parse("[00:12:34]Hello world");
        assert_eq!(result.lines[0].start_time, Some(Duration::from_millis(12340)));
    }

    #[test]
    fn test_untimed_lines_are_kept_in_order() {
        let input = "Intro without time\n[00:10.00]Timed\nOutro";
        let result = LrcFile::parse(input);
        assert_eq!(result.lines.len(), 3);
        assert_eq!(result.lines[0], LrcLine::untimed("Intro without time"));
        assert!(result.lines[1].is_timed());
        assert_eq!(result.lines[2], LrcLine::untimed("Outro"));
    }

    #[test]
    fn test_lines_keep_payload_order() {
        let input = "[00:20.00]Second\n[00:10.00]First";
        let result = LrcFile::parse(input);
        assert_eq!(result.lines[0].text, "Second");
        assert_eq!(result.lines[1].text, "First");
    }

    #[test]
    fn test_malformed_timestamps_become_text() {
        let input = "[00:75]Bad seconds\n[ab:12]Letters\n[00:12.3456]Too precise\n[00:12";
        let result = LrcFile::parse(input);
        assert_eq!(result.lines.len(), 4);
        assert!(result.lines.iter().all(|l| !l.is_timed()));
        assert_eq!(result.lines[0].text, "[00:75]Bad seconds");
    }

    #[test]
    fn test_section_marker_is_not_id_tag() {
        let result = LrcFile::parse("[Chorus: Someone]\n[00:01.00]La la");
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].text, "[Chorus: Someone]");
        assert!(result.metadata.title.is_none());
    }

    #[test]
    fn test_parse_id_tags() {
        let input = r"
[ti:Song Title]
[ar:Artist Name]
[al:Album Name]
[length: 03:25]
[00:05.00]Lyrics here
";
        let result = LrcFile::parse(input);
        assert_eq!(result.metadata.title, Some("Song Title".to_string()));
        assert_eq!(result.metadata.artist, Some("Artist Name".to_string()));
        assert_eq!(result.metadata.album, Some("Album Name".to_string()));
        assert_eq!(result.metadata.length, Some(Duration::from_secs(205)));
        assert_eq!(result.lines.len(), 1);
    }

    #[test]
    fn test_parse_offset() {
        let result = LrcFile::parse("[offset:500]\n[00:10.00]Test\nUntimed");
        // 10.00s + 0.5s offset = 10.5s
        assert_eq!(result.lines[0].start_time, Some(Duration::from_millis(10500)));
        assert_eq!(result.lines[1].start_time, None);
    }

    #[test]
    fn test_parse_negative_offset_saturates() {
        let result = LrcFile::parse("[offset:-500]\n[00:00.20]Early\n[00:10.00]Test");
        assert_eq!(result.lines[0].start_time, Some(Duration::ZERO));
        assert_eq!(result.lines[1].start_time, Some(Duration::from_millis(9500)));
    }

    #[test]
    fn test_parse_multi_timestamp_line() {
        let result = LrcFile::parse("[00:05.00][00:15.00]Repeated lyric");
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].text, "Repeated lyric");
        assert_eq!(result.lines[1].text, "Repeated lyric");
        assert_eq!(result.lines[0].start_time, Some(Duration::from_secs(5)));
        assert_eq!(result.lines[1].start_time, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_parse_cjk_lyrics() {
        let result = LrcFile::parse("[00:05.00]你好世界");
        assert_eq!(result.lines[0].text, "你好世界");
    }

    #[test]
    fn test_empty_and_missing_payloads() {
        assert!(LrcFile::parse("").is_empty());
        assert!(LrcFile::parse("  \n\r\n ").is_empty());
        assert!(LrcFile::from_payload(None).is_empty());
    }

    #[test]
    fn test_plain_text_payload_is_unsynced() {
        let result = LrcFile::parse("First verse\r\nSecond verse\r\n");
        assert_eq!(result.lines.len(), 2);
        assert!(!result.is_synced());
        assert_eq!(result.current_line_index(Duration::from_secs(100)), None);
    }

    #[test]
    fn test_current_line_between_timestamps() {
        let lrc = timed_file(&[0, 10, 20]);
        assert_eq!(lrc.current_line_index(Duration::from_secs(15)), Some(1));
        assert_eq!(lrc.current_line(Duration::from_secs(15)).unwrap().text, "at 10");
    }

    #[test]
    fn test_current_line_before_first_timestamp() {
        let lrc = timed_file(&[10, 20]);
        assert_eq!(lrc.current_line_index(Duration::from_secs(5)), None);
    }

    #[test]
    fn test_current_line_on_exact_boundary() {
        let lrc = timed_file(&[0, 10, 20]);
        assert_eq!(lrc.current_line_index(Duration::from_secs(10)), Some(1));
        assert_eq!(lrc.current_line_index(Duration::from_secs(99)), Some(2));
    }

    #[test]
    fn test_current_line_tie_prefers_later_line() {
        let lrc = timed_file(&[0, 10, 10, 20]);
        assert_eq!(lrc.current_line_index(Duration::from_secs(12)), Some(2));
    }

    #[test]
    fn test_current_line_skips_untimed() {
        let lrc = LrcFile::parse("[00:05.00]Timed\nUntimed after");
        assert_eq!(lrc.current_line_index(Duration::from_secs(30)), Some(0));
    }

    #[test]
    fn test_current_line_with_unsorted_payload() {
        let lrc = LrcFile::parse("[00:20.00]Late\n[00:10.00]Early");
        assert_eq!(lrc.current_line_index(Duration::from_secs(15)), Some(1));
        assert_eq!(lrc.current_line_index(Duration::from_secs(25)), Some(0));
    }

    #[test]
    fn test_current_line_is_idempotent() {
        let lrc = timed_file(&[0, 10, 20]);
        let t = Duration::from_millis(17_250);
        assert_eq!(lrc.current_line_index(t), lrc.current_line_index(t));
    }

    #[test]
    fn test_visible_range() {
        let lrc = timed_file(&[5, 10, 15, 20, 25]);
        assert_eq!(lrc.visible_range(Some(1), 1, 1), 0..3);
        assert_eq!(lrc.visible_range(Some(0), 1, 1), 0..2);
        assert_eq!(lrc.visible_range(Some(4), 1, 1), 3..5);
        assert_eq!(lrc.visible_range(None, 1, 2), 0..3);
    }

    #[test]
    fn test_visible_range_empty_file() {
        let lrc = LrcFile::default();
        assert_eq!(lrc.visible_range(None, 1, 1), 0..0);
        assert_eq!(lrc.visible_range(Some(3), 1, 1), 0..0);
    }
}
