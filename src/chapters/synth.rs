// Chapter synthesis from free-form episode descriptions
//
// Show notes often list chapters as "00:00 Intro 01:30 Main topic ...". Each
// timestamp starts a chapter titled by the text up to the next timestamp.

use std::sync::OnceLock;

use regex::{Match, Regex};
use tracing::debug;

use crate::id3::Chapter;

fn timestamp_regex() -> &'static Regex {
    static TIMESTAMP: OnceLock<Regex> = OnceLock::new();
    TIMESTAMP.get_or_init(|| {
        Regex::new(r"[0-9]{1,2}:[0-9]{2}(?::[0-9]{2})?").expect("valid timestamp pattern")
    })
}

/// Find MM:SS and HH:MM:SS timestamps that are not preceded by another digit
fn find_timestamps(text: &str) -> Vec<Match<'_>> {
    let regex = timestamp_regex();
    let mut found = Vec::new();
    let mut start = 0;

    while let Some(m) = regex.find_at(text, start) {
        let after_digit = text[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit());

        if after_digit {
            // Matches begin with an ASCII digit, so one byte on is a char boundary
            start = m.start() + 1;
        } else {
            found.push(m);
            start = m.end();
        }
    }

    found
}

/// Milliseconds for "MM:SS" or "HH:MM:SS"
fn parse_timestamp(stamp: &str) -> u32 {
    let parts: Vec<u32> = stamp.split(':').map(|part| part.parse().unwrap_or(0)).collect();
    let seconds = match parts.as_slice() {
        [h, m, s] => h * 3600 + m * 60 + s,
        [m, s] => m * 60 + s,
        _ => 0,
    };
    seconds.saturating_mul(1000)
}

/// Build chapters from every timestamp in `text`.
///
/// A chapter ends where the next one starts. The last chapter, and any
/// chapter followed by a timestamp that is not later than its own start, is
/// open-ended. Element IDs are `chp0`, `chp1`, ... so the same text always
/// yields the same chapters.
pub fn synthesize_chapters(text: &str) -> Vec<Chapter> {
    let stamps = find_timestamps(text);

    let chapters: Vec<Chapter> = stamps
        .iter()
        .enumerate()
        .map(|(i, stamp)| {
            let start_time_ms = parse_timestamp(stamp.as_str());
            let next = stamps.get(i + 1);

            let title_end = next.map_or(text.len(), |m| m.start());
            let title = text[stamp.end()..title_end].trim().to_string();

            let end_time_ms = match next.map(|m| parse_timestamp(m.as_str())) {
                Some(next_start) if next_start > start_time_ms => next_start,
                _ => 0,
            };

            Chapter::synthetic(format!("chp{i}"), start_time_ms, end_time_ms, title)
        })
        .collect();

    debug!(count = chapters.len(), "synthesized chapters from description");
    chapters
}
