// Downloader core - tool checks, format catalog, progress parsing, supervision

pub mod catalog;
pub mod errors;
pub mod models;
pub mod process;
pub mod progress;
pub mod selection;
pub mod supervisor;
pub mod tools;

pub use catalog::{parse_format_table, FormatCatalog, FormatListing};
pub use errors::DownloadError;
pub use models::{
    AudioCodec, Completion, DownloadJob, FormatAttr, FormatRecord, JobState, Phase,
    ProgressEvent, VideoCodec,
};
pub use progress::classify;
pub use selection::FormatSelection;
pub use supervisor::DownloadSupervisor;
pub use tools::{Readiness, ToolAvailability, UpdateStatus};
