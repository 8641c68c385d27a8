// Format catalog: fetch a format listing and parse the free-text table

use lazy_static::lazy_static;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::errors::DownloadError;
use super::models::{
    AudioCodec, FormatAttr, FormatRecord, VideoCodec, AUDIO_SENTINEL, EXTRACTOR_HINT,
};
use super::process::{CommandRunner, SystemRunner};
use super::tools::TOOL_NAME;

/// Marker preceding the structured table in yt-dlp's listing output.
const TABLE_MARKER: &str = "Available formats";

/// Still-image preview rows carry this extension and are never downloadable.
const THUMBNAIL_EXT: &str = "mhtml";

/// Rows with both dimensions at or below Full HD are dropped; the catalog
/// surfaces high/VR resolutions only.
const MAX_EXCLUDED_WIDTH: u32 = 1920;
const MAX_EXCLUDED_HEIGHT: u32 = 1080;

lazy_static! {
    static ref RESOLUTION_RE: Regex = Regex::new(r"^(\d+)x(\d+)$").unwrap();
}

/// Parse result for a raw listing blob. `Unstructured` is the degraded
/// fallback when the table marker is missing entirely, which is distinct
/// from a table where every row was filtered out.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatListing {
    Table(Vec<FormatRecord>),
    Unstructured(String),
}

pub struct FormatCatalog {
    tool_path: String,
    runner: Box<dyn CommandRunner>,
    listing_active: AtomicBool,
}

impl FormatCatalog {
    pub fn new() -> Self {
        Self::with_tool(TOOL_NAME)
    }

    pub fn with_tool(tool_path: &str) -> Self {
        Self {
            tool_path: tool_path.to_string(),
            runner: Box::new(SystemRunner::default()),
            listing_active: AtomicBool::new(false),
        }
    }

    pub fn with_runner(runner: Box<dyn CommandRunner>) -> Self {
        Self {
            tool_path: TOOL_NAME.to_string(),
            runner,
            listing_active: AtomicBool::new(false),
        }
    }

    /// Fetch and parse the format listing for a URL. At most one listing
    /// may be in flight at a time. A structured table with zero surviving
    /// rows maps to `NoMatchingFormats`; a returned `Table` is non-empty.
    pub async fn list_formats(&self, url: &str) -> Result<FormatListing, DownloadError> {
        if self.listing_active.swap(true, Ordering::SeqCst) {
            return Err(DownloadError::OperationInFlight("format listing"));
        }
        let result = self.fetch(url).await;
        self.listing_active.store(false, Ordering::SeqCst);
        result
    }

    pub fn is_listing(&self) -> bool {
        self.listing_active.load(Ordering::SeqCst)
    }

    async fn fetch(&self, url: &str) -> Result<FormatListing, DownloadError> {
        let args: Vec<String> = [
            "--extractor-args",
            EXTRACTOR_HINT,
            "--list-formats",
            url,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        log::debug!("listing formats: {} {}", self.tool_path, args.join(" "));

        let output = self
            .runner
            .capture(&self.tool_path, &args)
            .await
            .map_err(DownloadError::ListFormatsFailed)?;

        if !output.status.success() {
            return Err(DownloadError::ListFormatsFailed(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        match parse_format_table(&String::from_utf8_lossy(&output.stdout)) {
            FormatListing::Table(records) if records.is_empty() => {
                Err(DownloadError::NoMatchingFormats)
            }
            listing => Ok(listing),
        }
    }
}

impl Default for FormatCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a raw listing blob into format records. Pure; never panics.
/// Row order follows the input (the tool lists ascending quality tiers).
pub fn parse_format_table(raw: &str) -> FormatListing {
    let lines: Vec<&str> = raw.lines().collect();

    let marker = match lines.iter().position(|l| l.contains(TABLE_MARKER)) {
        Some(idx) => idx,
        None => return FormatListing::Unstructured(raw.to_string()),
    };

    // The tool prints a column header and a separator right after the marker
    let start = marker + 1;
    let data_start = if start + 2 < lines.len() { start + 2 } else { start };

    let mut records = Vec::new();

    for line in &lines[data_start..] {
        let line = line.trim();
        // bracketed tags are log lines, not data rows
        if line.is_empty() || line.starts_with('[') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }

        let id = tokens[0];
        let ext = tokens[1];
        if ext == THUMBNAIL_EXT {
            continue;
        }

        let audio_only = line.contains("audio only");
        let resolution = if audio_only {
            AUDIO_SENTINEL.to_string()
        } else {
            let token = tokens[2];
            if let Some((width, height)) = parse_resolution(token) {
                if width <= MAX_EXCLUDED_WIDTH && height <= MAX_EXCLUDED_HEIGHT {
                    continue;
                }
            }
            // an unparseable resolution token is kept as-is, not dropped
            token.to_string()
        };

        let size_label = tokens
            .iter()
            .find(|t| t.ends_with("KiB") || t.ends_with("MiB") || t.ends_with("GiB"))
            .map(|t| t.to_string())
            .unwrap_or_default();

        let video_codec = if line.contains("avc1") {
            VideoCodec::H264
        } else if line.contains("vp9") {
            VideoCodec::Vp9
        } else if line.contains("av01") {
            VideoCodec::Av1
        } else {
            VideoCodec::None
        };

        let audio_codec = if line.contains("mp4a") {
            AudioCodec::Aac
        } else if line.contains("opus") {
            AudioCodec::Opus
        } else {
            AudioCodec::None
        };

        let mut attrs = Vec::new();
        if line.contains("60") {
            attrs.push(FormatAttr::SixtyFps);
        }
        if line.contains("mesh") {
            attrs.push(FormatAttr::Vr);
        }
        if line.contains("ambisonics") {
            attrs.push(FormatAttr::SpatialAudio);
        }

        records.push(FormatRecord {
            id: id.to_string(),
            ext: ext.to_string(),
            resolution,
            size_label,
            video_codec,
            audio_codec,
            attrs,
        });
    }

    FormatListing::Table(records)
}

fn parse_resolution(token: &str) -> Option<(u32, u32)> {
    let caps = RESOLUTION_RE.captures(token)?;
    let width = caps[1].parse().ok()?;
    let height = caps[2].parse().ok()?;
    Some((width, height))
}
