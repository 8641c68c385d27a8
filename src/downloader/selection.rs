// Combines picked format ids into a yt-dlp format expression

use serde::{Deserialize, Serialize};

use super::models::{FormatRecord, DEFAULT_FORMAT_EXPRESSION};

/// Tracks the caller's current video/audio picks from the catalog.
/// Picking a new record of the same kind replaces the previous pick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSelection {
    pub video: Option<String>,
    pub audio: Option<String>,
}

impl FormatSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot the record into the video or audio pick based on its kind.
    pub fn pick(&mut self, record: &FormatRecord) {
        if record.is_audio_only() {
            self.audio = Some(record.id.clone());
        } else {
            self.video = Some(record.id.clone());
        }
    }

    /// The format expression to hand to the download invocation:
    /// "video+audio" when both are picked, a single id when one is,
    /// and the default expression when nothing is.
    pub fn expression(&self) -> String {
        match (&self.video, &self.audio) {
            (Some(video), Some(audio)) => format!("{}+{}", video, audio),
            (Some(video), None) => video.clone(),
            (None, Some(audio)) => audio.clone(),
            (None, None) => DEFAULT_FORMAT_EXPRESSION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::models::{AudioCodec, VideoCodec, AUDIO_SENTINEL};
    use super::*;

    fn video_record(id: &str) -> FormatRecord {
        FormatRecord {
            id: id.to_string(),
            ext: "mp4".to_string(),
            resolution: "3840x2160".to_string(),
            size_label: "800.00MiB".to_string(),
            video_codec: VideoCodec::Vp9,
            audio_codec: AudioCodec::None,
            attrs: Vec::new(),
        }
    }

    fn audio_record(id: &str) -> FormatRecord {
        FormatRecord {
            id: id.to_string(),
            ext: "m4a".to_string(),
            resolution: AUDIO_SENTINEL.to_string(),
            size_label: "10.04MiB".to_string(),
            video_codec: VideoCodec::None,
            audio_codec: AudioCodec::Aac,
            attrs: Vec::new(),
        }
    }

    #[test]
    fn empty_selection_uses_default_expression() {
        assert_eq!(FormatSelection::new().expression(), DEFAULT_FORMAT_EXPRESSION);
    }

    #[test]
    fn single_picks() {
        let mut selection = FormatSelection::new();
        selection.pick(&video_record("313"));
        assert_eq!(selection.expression(), "313");

        let mut selection = FormatSelection::new();
        selection.pick(&audio_record("140"));
        assert_eq!(selection.expression(), "140");
    }

    #[test]
    fn video_plus_audio() {
        let mut selection = FormatSelection::new();
        selection.pick(&video_record("625"));
        selection.pick(&audio_record("140"));
        assert_eq!(selection.expression(), "625+140");
    }

    #[test]
    fn repicking_replaces_the_slot() {
        let mut selection = FormatSelection::new();
        selection.pick(&video_record("313"));
        selection.pick(&video_record("625"));
        selection.pick(&audio_record("140"));
        selection.pick(&audio_record("251"));
        assert_eq!(selection.expression(), "625+251");
    }
}
