//! Video container metadata via `ffprobe`.
//!
//! Video muxers store the workflow in format-level tags (`comment`,
//! `prompt`, ...). One `ffprobe` run returns those tags plus stream
//! properties as JSON; [`record_from_probe`] turns that into a raw record.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::coerce;
use crate::models::RawRecord;

/// Format tags that may hold workflow metadata, in lookup order. Each is
/// stored under its lower-cased name, so a later case variant replaces an
/// earlier one.
pub const METADATA_TAGS: &[&str] = &[
    "comment",
    "Comment",
    "description",
    "Description",
    "workflow",
    "Workflow",
    "prompt",
    "Prompt",
];

/// Probe failure. Callers treat every variant as "no metadata".
#[derive(Debug)]
pub enum ProbeError {
    /// The probe executable is not installed or not on `PATH`.
    NotFound(String),
    Spawn(std::io::Error),
    Timeout(Duration),
    Exit(Option<i32>),
    Parse(serde_json::Error),
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::NotFound(cmd) => {
                write!(f, "{} not found; install ffmpeg to read video metadata", cmd)
            }
            ProbeError::Spawn(e) => write!(f, "failed to run probe: {}", e),
            ProbeError::Timeout(d) => write!(f, "probe timed out after {}s", d.as_secs()),
            ProbeError::Exit(Some(code)) => write!(f, "probe exited with status {}", code),
            ProbeError::Exit(None) => write!(f, "probe terminated by signal"),
            ProbeError::Parse(e) => write!(f, "probe output is not valid JSON: {}", e),
        }
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProbeError::Spawn(e) => Some(e),
            ProbeError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// The subset of `ffprobe -print_format json` output this crate reads.
#[derive(Debug, Default, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub format: ProbeFormat,
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeFormat {
    #[serde(default)]
    pub tags: serde_json::Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProbeStream {
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub width: Option<u64>,
    #[serde(default)]
    pub height: Option<u64>,
    #[serde(default)]
    pub r_frame_rate: Option<String>,
    /// Seconds as a decimal string (`"5.500000"`), sometimes `"N/A"`.
    #[serde(default)]
    pub duration: Option<Value>,
}

/// Run `ffprobe` against `path`, bounded by `timeout`.
///
/// The child is killed if the deadline passes.
pub async fn run_probe(
    command: &str,
    path: &Path,
    timeout: Duration,
) -> Result<ProbeOutput, ProbeError> {
    let output = tokio::process::Command::new(command)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, output)
        .await
        .map_err(|_| ProbeError::Timeout(timeout))?
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProbeError::NotFound(command.to_string()),
            _ => ProbeError::Spawn(e),
        })?;

    if !output.status.success() {
        return Err(ProbeError::Exit(output.status.code()));
    }

    serde_json::from_slice(&output.stdout).map_err(ProbeError::Parse)
}

/// Build a raw record from probe output.
///
/// Tag values are decoded as JSON when possible and kept as raw strings
/// otherwise. Properties of the first video stream are added as
/// `video_width`, `video_height`, `video_fps` and `video_duration`.
pub fn record_from_probe(probe: &ProbeOutput) -> RawRecord {
    let mut record = RawRecord::new();

    debug!(tags = ?probe.format.tags.keys().collect::<Vec<_>>(), "video tags");
    for tag in METADATA_TAGS {
        let Some(raw) = probe.format.tags.get(*tag) else {
            continue;
        };
        let value = match raw {
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(parsed) => {
                    debug!(tag = *tag, "decoded JSON tag");
                    parsed
                }
                Err(_) => raw.clone(),
            },
            other => other.clone(),
        };
        record.insert(tag.to_lowercase(), value);
    }

    if let Some(stream) = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
    {
        record.insert("video_width".into(), stream.width.unwrap_or(0).into());
        record.insert("video_height".into(), stream.height.unwrap_or(0).into());
        let fps = stream
            .r_frame_rate
            .as_deref()
            .map(parse_frame_rate)
            .unwrap_or(0.0);
        record.insert("video_fps".into(), fps.into());
        let duration = stream
            .duration
            .as_ref()
            .and_then(coerce::to_float)
            .unwrap_or(0.0);
        record.insert("video_duration".into(), duration.into());
    }

    record
}

/// Parse an ffprobe rational frame rate (`"30000/1001"`).
///
/// A zero denominator or anything that is not `int/int` gives `0.0`.
pub fn parse_frame_rate(rate: &str) -> f64 {
    let Some((num, den)) = rate.split_once('/') else {
        return 0.0;
    };
    match (num.trim().parse::<i64>(), den.trim().parse::<i64>()) {
        (Ok(_), Ok(0)) => 0.0,
        (Ok(num), Ok(den)) => num as f64 / den as f64,
        _ => 0.0,
    }
}
