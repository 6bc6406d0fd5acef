//! Core data types shared by the record loaders, the normalizer, and the CLI.
//!
//! A [`RawRecord`] is whatever a loader pulled out of a file; an
//! [`ExtractionResult`] is the fixed schema every extraction ends in.

use serde::Serialize;
use std::path::Path;

/// Raw metadata record produced by a loader: string keys to arbitrary JSON
/// values, kept in decode order.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// `file_info` when the requested file could not be resolved.
pub const FILE_NOT_FOUND: &str = "File not found";
/// `file_info` when the container carried nothing decodable.
pub const NO_METADATA: &str = "No metadata found";
/// `file_info` fallback when the record has no video properties.
pub const STILL_IMAGE_INFO: &str = "PNG Image";

/// Still-image extensions handled by the PNG chunk loader.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
/// Video container extensions handled by the ffprobe loader.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];

/// Which loader backend a file is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a bare extension (without the dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Lower-cased extension with its leading dot (`".gif"`), or `""` when the
/// path has none.
pub fn extension_label(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Normalized generation parameters for one file.
///
/// Always fully populated: fields that could not be recovered keep their
/// defaults, and `file_info` says why when nothing was found at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub positive_prompt: String,
    pub negative_prompt: String,
    /// Wide enough for both signed seeds and the full unsigned 64-bit range
    /// that samplers draw from.
    pub seed: i128,
    pub steps: i64,
    pub cfg: f64,
    pub sampler: String,
    /// Part of the schema, but no node rule assigns it yet.
    pub scheduler: String,
    /// The complete raw record, pretty-printed.
    pub metadata_json: String,
    pub file_info: String,
}

impl Default for ExtractionResult {
    fn default() -> Self {
        Self {
            positive_prompt: String::new(),
            negative_prompt: String::new(),
            seed: 0,
            steps: 0,
            cfg: 0.0,
            sampler: String::new(),
            scheduler: String::new(),
            metadata_json: "{}".to_string(),
            file_info: String::new(),
        }
    }
}

impl ExtractionResult {
    /// All-default result carrying only a descriptive `file_info`.
    pub fn empty(file_info: impl Into<String>) -> Self {
        Self {
            file_info: file_info.into(),
            ..Default::default()
        }
    }

    pub fn not_found() -> Self {
        Self::empty(FILE_NOT_FOUND)
    }

    pub fn no_metadata() -> Self {
        Self::empty(NO_METADATA)
    }

    /// `ext` is the dotted, lower-cased extension from [`extension_label`].
    pub fn unsupported(ext: &str) -> Self {
        Self::empty(format!("Unsupported: {}", ext))
    }
}
