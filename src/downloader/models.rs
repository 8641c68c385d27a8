// Common data models for the downloader core

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolution label used for audio-only rows in the format table.
/// Kept as the Korean sentinel the UI layer displays verbatim.
pub const AUDIO_SENTINEL: &str = "오디오";

/// Format expression used when the caller picked nothing.
pub const DEFAULT_FORMAT_EXPRESSION: &str = "bv+ba";

/// Extractor hint selecting the VR-capable player client.
/// Passed verbatim to yt-dlp; the exact string matters.
pub const EXTRACTOR_HINT: &str = "youtube:player-client=android_vr";

/// Video codec family recognized in a format row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoCodec {
    None,
    H264,
    Vp9,
    Av1,
}

/// Audio codec family recognized in a format row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCodec {
    None,
    Aac,
    Opus,
}

/// Special attributes a format row may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatAttr {
    SixtyFps,
    Vr,
    SpatialAudio,
}

/// One selectable stream variant from the tool's format listing.
/// Immutable once built; a new listing replaces the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatRecord {
    pub id: String,
    pub ext: String,
    /// Either [`AUDIO_SENTINEL`] or the raw resolution token (usually "WxH")
    pub resolution: String,
    /// First size token from the row ("10.04MiB"), empty when absent
    pub size_label: String,
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    pub attrs: Vec<FormatAttr>,
}

impl FormatRecord {
    pub fn is_audio_only(&self) -> bool {
        self.resolution == AUDIO_SENTINEL
    }

    pub fn has_attr(&self, attr: FormatAttr) -> bool {
        self.attrs.contains(&attr)
    }
}

/// Lifecycle of a download job. Transitions are driven solely by the
/// supervisor; Succeeded/Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    /// Terminal state for a finished download process.
    pub fn from_exit(exit_code: i32) -> Self {
        if exit_code == 0 {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }
}

/// A single download request. Discarded after the run finishes;
/// no retry state is retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadJob {
    pub url: String,
    pub format_expression: String,
    pub destination_dir: PathBuf,
}

impl DownloadJob {
    /// Job with the default format expression and the user's download
    /// directory as destination.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            format_expression: DEFAULT_FORMAT_EXPRESSION.to_string(),
            destination_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }

    pub fn with_format(mut self, expression: &str) -> Self {
        self.format_expression = expression.to_string();
        self
    }

    pub fn with_destination(mut self, dir: impl Into<PathBuf>) -> Self {
        self.destination_dir = dir.into();
        self
    }
}

/// Coarse status transitions reported by the tool's log stream,
/// distinct from numeric progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    ExtractingInfo,
    Merging,
    Sleeping,
    /// Any other coarse transition. The built-in classifier does not
    /// produce this; callers extending the allow list may.
    Generic,
}

/// One event distilled from a line of streamed process output.
/// Events are emitted in line-arrival order and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    Progress {
        /// 0.0 to 1.0
        percent: f32,
        /// e.g. "2.50MiB/s"; `None` when not extractable from the line
        speed: Option<String>,
        /// e.g. "00:07"; `None` when not extractable from the line
        eta: Option<String>,
    },
    DestinationAnnounced {
        path: String,
    },
    PhaseChange {
        phase: Phase,
    },
    InfoLine {
        text: String,
    },
    Completed {
        exit_code: i32,
    },
}

/// Final outcome of a supervised download process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub exit_code: i32,
}

impl Completion {
    pub fn state(&self) -> JobState {
        JobState::from_exit(self.exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_defaults() {
        let job = DownloadJob::new("https://youtu.be/abc");
        assert_eq!(job.format_expression, DEFAULT_FORMAT_EXPRESSION);
        assert_eq!(job.url, "https://youtu.be/abc");
    }

    #[test]
    fn job_builders_override_defaults() {
        let job = DownloadJob::new("u")
            .with_format("625+140")
            .with_destination("/tmp/videos");
        assert_eq!(job.format_expression, "625+140");
        assert_eq!(job.destination_dir, PathBuf::from("/tmp/videos"));
    }

    #[test]
    fn exit_code_maps_to_terminal_state() {
        assert_eq!(JobState::from_exit(0), JobState::Succeeded);
        assert_eq!(JobState::from_exit(1), JobState::Failed);
        assert_eq!(Completion { exit_code: 2 }.state(), JobState::Failed);
    }

    #[test]
    fn progress_event_wire_shape() {
        let event = ProgressEvent::Progress {
            percent: 0.425,
            speed: Some("2.50MiB/s".to_string()),
            eta: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "progress");
        assert_eq!(json["speed"], "2.50MiB/s");
        assert!(json["eta"].is_null());

        let done = serde_json::to_value(ProgressEvent::Completed { exit_code: 0 }).unwrap();
        assert_eq!(done["kind"], "completed");
        assert_eq!(done["exit_code"], 0);
    }
}
