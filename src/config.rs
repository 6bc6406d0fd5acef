use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Directories used to resolve bare filenames and to look for recent videos.
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("./input")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_command")]
    pub command: String,
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            command: default_probe_command(),
            timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_probe_command() -> String {
    "ffprobe".to_string()
}
fn default_probe_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    crate::models::IMAGE_EXTENSIONS
        .iter()
        .chain(crate::models::VIDEO_EXTENSIONS)
        .map(|ext| format!("**/*.{}", ext))
        .collect()
}
fn default_concurrency() -> usize {
    4
}

impl Config {
    /// Defaults for every section; used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` when it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.probe.command.trim().is_empty() {
        bail!("probe.command must not be empty");
    }
    if config.probe.timeout_secs == 0 {
        bail!("probe.timeout_secs must be > 0");
    }
    if config.scan.concurrency == 0 {
        bail!("scan.concurrency must be >= 1");
    }
    if config.scan.include_globs.is_empty() {
        bail!("scan.include_globs must list at least one pattern");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("wfm.toml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let (_tmp, path) = write_config("");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.probe.command, "ffprobe");
        assert_eq!(cfg.probe.timeout_secs, 10);
        assert_eq!(cfg.paths.input_dir, PathBuf::from("./input"));
        assert_eq!(cfg.output.format, OutputFormat::Auto);
        assert!(cfg.scan.include_globs.contains(&"**/*.webm".to_string()));
    }

    #[test]
    fn sections_override_defaults() {
        let (_tmp, path) = write_config(
            r#"
[paths]
input_dir = "/srv/comfy/input"

[probe]
command = "/opt/ffmpeg/bin/ffprobe"
timeout_secs = 3

[output]
format = "json"
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.paths.input_dir, PathBuf::from("/srv/comfy/input"));
        assert_eq!(cfg.paths.output_dir, PathBuf::from("./output"));
        assert_eq!(cfg.probe.timeout_secs, 3);
        assert_eq!(cfg.output.format, OutputFormat::Json);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let (_tmp, path) = write_config("[probe]\ntimeout_secs = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let (_tmp, path) = write_config("[output]\nformat = \"yaml\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_minimal() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_or_minimal(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.scan.concurrency, 4);
    }
}
