//! SRT subtitle writer.
//!
//! Writes phrase spans as an SRT sidecar.
//!
//! # Timing Precision
//!
//! SRT uses millisecond timing (HH:MM:SS,mmm). Span boundaries in seconds
//! are rounded to the nearest millisecond at write time.

use std::path::Path;

use crate::error::{ComposeError, ComposeResult};
use crate::models::Phrase;

/// Write phrases to an SRT format string.
///
/// Phrases with no duration (clipped away) are skipped.
pub fn write_srt(phrases: &[Phrase]) -> String {
    let mut output = String::new();

    let spans: Vec<&Phrase> = phrases.iter().filter(|p| p.duration > 0.0).collect();

    for (i, phrase) in spans.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        // Index (1-based)
        output.push_str(&format!("{}\n", i + 1));

        let start = format_srt_time(phrase.start);
        let end = format_srt_time(phrase.end());
        output.push_str(&format!("{} --> {}\n", start, end));

        output.push_str(&phrase.text);
        output.push('\n');
    }

    output
}

/// Write phrases to an SRT file.
pub fn save_srt(path: &Path, phrases: &[Phrase]) -> ComposeResult<()> {
    std::fs::write(path, write_srt(phrases))
        .map_err(|e| ComposeError::io(format!("writing {}", path.display()), e))
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm).
pub fn format_srt_time(seconds: f64) -> String {
    let ms = (seconds * 1000.0).round().max(0.0) as u64;

    let millis = ms % 1000;
    let total_secs = ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}
