//! Core library for a YouTube VR video downloader.
//!
//! Wraps the yt-dlp binary: checks it is installed (installing it through
//! winget when it is not), lists the VR-capable formats for a URL as
//! structured records, and supervises a download process while classifying
//! its streamed output into progress events. The UI layer consumes those
//! events from a channel; nothing here touches media bytes.

pub mod downloader;

pub use downloader::{
    classify, parse_format_table, AudioCodec, Completion, DownloadError, DownloadJob,
    DownloadSupervisor, FormatAttr, FormatCatalog, FormatListing, FormatRecord,
    FormatSelection, JobState, Phase, ProgressEvent, Readiness, ToolAvailability, UpdateStatus,
    VideoCodec,
};
