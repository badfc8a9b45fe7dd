//! Plain text output of rendered frames.

use cadenza_core::{player_link, Emphasis, Frame, Greeting, PlayIcon, SearchResults, TrackInfo};
use std::fmt::Write;

const BAR_WIDTH: usize = 30;

fn icon(icon: PlayIcon) -> &'static str {
    match icon {
        PlayIcon::Play => "[>]",
        PlayIcon::Pause => "[||]",
    }
}

fn progress_bar(slider: f64) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = ((slider.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Text block for one frame
pub fn format_frame(frame: &Frame) -> String {
    let mut out = String::new();
    let title = if frame.title.is_empty() {
        "No track"
    } else {
        frame.title.as_str()
    };
    let _ = writeln!(out, "{} {title}", icon(frame.icon));
    if !frame.artist.is_empty() {
        let _ = writeln!(out, "    {}", frame.artist);
    }
    let _ = writeln!(
        out,
        "{} [{}] {}",
        frame.elapsed,
        progress_bar(frame.slider),
        frame.remaining
    );

    for row in &frame.lyrics {
        let marker = match row.emphasis {
            Emphasis::Current => "> ",
            Emphasis::Context | Emphasis::Upcoming | Emphasis::Fallback => "  ",
        };
        let _ = writeln!(out, "{marker}{}", row.text);
    }

    if let Some(notice) = &frame.notice {
        let _ = writeln!(out, "! {notice}");
    }
    out
}

/// Landing page listing
pub fn format_home(greeting: Greeting, tracks: &[TrackInfo]) -> String {
    let mut out = format!("{greeting}\n\n");
    for track in tracks {
        let _ = writeln!(out, "{} - {}", track.title, track.author);
        let _ = writeln!(out, "    {}", player_link(track));
    }
    out
}

/// Search hits numbered from 1, artists first
pub fn format_search(text: &str, results: &SearchResults) -> String {
    let mut out = format!("Results for {text:?}\n");
    if results.is_empty() {
        out.push_str("No matches\n");
        return out;
    }

    let mut number = 0;
    if !results.artists.is_empty() {
        out.push_str("\nArtists\n");
        for name in &results.artists {
            number += 1;
            let _ = writeln!(out, "{number:>3}. {name}");
        }
    }
    if !results.tracks.is_empty() {
        out.push_str("\nTracks\n");
        for track in &results.tracks {
            number += 1;
            let _ = writeln!(out, "{number:>3}. {} - {}", track.name, track.artist);
        }
    }
    out
}

/// Name behind a number printed by [`format_search`]
pub fn search_choice(results: &SearchResults, input: &str) -> Option<String> {
    let index = input.trim().parse::<usize>().ok()?.checked_sub(1)?;
    results
        .artists
        .iter()
        .chain(results.tracks.iter().map(|t| &t.name))
        .nth(index)
        .cloned()
}
