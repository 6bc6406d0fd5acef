//! The extraction pipeline: resolve → load → normalize.
//!
//! [`Extractor::extract_path`] always returns an [`ExtractionResult`]:
//!
//! | Situation | `file_info` |
//! |-----------|-------------|
//! | path missing | `File not found` |
//! | extension not handled | `Unsupported: .ext` |
//! | loader found nothing | `No metadata found` |
//! | record loaded | video summary or `PNG Image` |

use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::loader::{FfprobeLoader, PngChunkLoader, RecordLoader};
use crate::locate::{resolve_source, SourceRequest};
use crate::models::{extension_label, ExtractionResult, MediaKind};
use crate::normalize::normalize;

/// Routes files to the loader for their container kind.
pub struct Extractor {
    image: Box<dyn RecordLoader>,
    video: Box<dyn RecordLoader>,
}

impl Extractor {
    pub fn new(image: Box<dyn RecordLoader>, video: Box<dyn RecordLoader>) -> Self {
        Self { image, video }
    }

    /// PNG chunk loader for images, ffprobe (per `[probe]`) for videos.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Box::new(PngChunkLoader),
            Box::new(FfprobeLoader::from_config(&config.probe)),
        )
    }

    pub async fn extract_path(&self, path: &Path) -> ExtractionResult {
        if !path.is_file() {
            return ExtractionResult::not_found();
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        info!(file = name.as_str(), "processing");

        let loader = match MediaKind::from_path(path) {
            Some(MediaKind::Image) => &self.image,
            Some(MediaKind::Video) => &self.video,
            None => return ExtractionResult::unsupported(&extension_label(path)),
        };

        match loader.load(path).await {
            Some(record) if !record.is_empty() => normalize(&record),
            _ => {
                info!(file = name.as_str(), loader = loader.name(), "no metadata found");
                ExtractionResult::no_metadata()
            }
        }
    }

    /// Resolve `request` against the configured directories and extract.
    pub async fn extract(&self, request: &SourceRequest, config: &Config) -> ExtractionResult {
        match resolve_source(request, &config.paths) {
            Some(path) => self.extract_path(&path).await,
            None => ExtractionResult::not_found(),
        }
    }
}
