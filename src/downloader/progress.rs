// Line classification for streamed yt-dlp output
//
// classify() is pure and total: any input line yields either an event or
// None, never an error. Field extraction is regex-based with explicit
// "unknown" (None) fallbacks, so it stays unit-testable without a process.

use lazy_static::lazy_static;
use regex::Regex;

use super::models::{Phase, ProgressEvent};

const DOWNLOAD_TAG: &str = "[download]";
const DESTINATION_MARKER: &str = "[download] Destination:";
const SLEEP_MARKER: &str = "Sleeping";

/// Log-tag markers whose lines are worth passing through.
const INFO_MARKERS: [&str; 4] = ["[youtube]", "[info]", "Merging", "Deleting"];

/// Pass-through lines longer than this are dropped as noise.
const MAX_INFO_LINE_LEN: usize = 200;

lazy_static! {
    static ref PERCENT_RE: Regex = Regex::new(r"(\d+\.?\d*)%").unwrap();
    static ref SPEED_RE: Regex = Regex::new(r"at\s+([0-9.]+\s*[KMG]iB/s)").unwrap();
    static ref ETA_RE: Regex = Regex::new(r"ETA\s+(\d+:\d+)").unwrap();
}

/// Classify a single line of process output. Each line is judged
/// independently of any earlier line.
pub fn classify(line: &str) -> Option<ProgressEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // Progress rows are exclusively Progress events; when even the percent
    // cannot be extracted the row is swallowed, never passed through.
    if line.contains(DOWNLOAD_TAG) && line.contains('%') {
        let percent: f32 = PERCENT_RE.captures(line)?.get(1)?.as_str().parse().ok()?;
        return Some(ProgressEvent::Progress {
            percent: percent / 100.0,
            speed: SPEED_RE.captures(line).map(|c| c[1].to_string()),
            eta: ETA_RE.captures(line).map(|c| c[1].to_string()),
        });
    }

    if line.contains(DESTINATION_MARKER) {
        let path = line
            .split("Destination:")
            .last()
            .unwrap_or("")
            .trim()
            .to_string();
        return Some(ProgressEvent::DestinationAnnounced { path });
    }

    // rate-limit pauses imposed by the remote side
    if line.contains(SLEEP_MARKER) {
        return Some(ProgressEvent::PhaseChange {
            phase: Phase::Sleeping,
        });
    }

    if INFO_MARKERS.iter().any(|m| line.contains(m)) {
        // API JSON fetches fire for every fragment; too noisy to surface
        if line.contains("Downloading") && line.contains("API JSON") {
            return None;
        }
        if line.contains("Extracting") {
            return Some(ProgressEvent::PhaseChange {
                phase: Phase::ExtractingInfo,
            });
        }
        if line.contains("Merging") {
            return Some(ProgressEvent::PhaseChange {
                phase: Phase::Merging,
            });
        }
        // character count, not bytes: titles are often CJK
        if line.chars().count() < MAX_INFO_LINE_LEN {
            return Some(ProgressEvent::InfoLine {
                text: line.to_string(),
            });
        }
    }

    None
}
