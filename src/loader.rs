//! Record loaders: the boundary between container formats and the normalizer.
//!
//! A [`RecordLoader`] turns a file into a [`RawRecord`] or reports that it
//! found nothing. Loaders never fail loudly; I/O and probe errors are logged
//! and folded into `None`.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use std::path::Path;
//! use workflow_meta::loader::RecordLoader;
//! use workflow_meta::models::RawRecord;
//!
//! /// Serves a sidecar `.json` file next to the media file.
//! pub struct SidecarLoader;
//!
//! #[async_trait]
//! impl RecordLoader for SidecarLoader {
//!     fn name(&self) -> &str { "sidecar" }
//!
//!     async fn load(&self, path: &Path) -> Option<RawRecord> {
//!         let text = tokio::fs::read_to_string(path.with_extension("json")).await.ok()?;
//!         serde_json::from_str(&text).ok()
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{error, warn};

use crate::config::ProbeConfig;
use crate::models::RawRecord;
use crate::png;
use crate::probe::{self, ProbeError};

/// Source of raw metadata records for one kind of container.
#[async_trait]
pub trait RecordLoader: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &str;

    /// Load the embedded record, or `None` when the file carries nothing
    /// usable. An empty record is reported as `None`.
    async fn load(&self, path: &Path) -> Option<RawRecord>;
}

/// Reads `workflow` / `prompt` text chunks from still images.
#[derive(Debug, Default, Clone)]
pub struct PngChunkLoader;

#[async_trait]
impl RecordLoader for PngChunkLoader {
    fn name(&self) -> &str {
        "png"
    }

    async fn load(&self, path: &Path) -> Option<RawRecord> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read image");
                return None;
            }
        };
        let record = png::record_from_chunks(&png::text_chunks(&bytes));
        (!record.is_empty()).then_some(record)
    }
}

/// Reads format tags and stream properties of video containers via ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeLoader {
    command: String,
    timeout: Duration,
}

impl FfprobeLoader {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(&config.command, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl RecordLoader for FfprobeLoader {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn load(&self, path: &Path) -> Option<RawRecord> {
        match probe::run_probe(&self.command, path, self.timeout).await {
            Ok(output) => {
                let record = probe::record_from_probe(&output);
                (!record.is_empty()).then_some(record)
            }
            Err(e @ ProbeError::NotFound(_)) => {
                error!("{}", e);
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "video probe failed");
                None
            }
        }
    }
}
