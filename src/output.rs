//! Result rendering for the CLI.
//!
//! Results go to **stdout**; logs stay on stderr so output can be piped.

use serde::{Deserialize, Serialize};

use crate::models::ExtractionResult;

/// Output mode: human-readable lines, pretty JSON, or pick by TTY.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Text when stdout is a terminal, JSON otherwise.
    #[default]
    Auto,
    Text,
    Json,
}

impl OutputFormat {
    /// Resolve `Auto` against the current stdout.
    pub fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if atty::is(atty::Stream::Stdout) => OutputFormat::Text,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

/// Render one result. `Auto` is resolved first.
pub fn render(result: &ExtractionResult, format: OutputFormat) -> String {
    match format.resolve() {
        OutputFormat::Json => {
            serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
        }
        _ => render_text(result),
    }
}

/// `key: value` lines; the multi-line `metadata_json` comes last.
pub fn render_text(result: &ExtractionResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("positive_prompt: {}\n", result.positive_prompt));
    out.push_str(&format!("negative_prompt: {}\n", result.negative_prompt));
    out.push_str(&format!("seed: {}\n", result.seed));
    out.push_str(&format!("steps: {}\n", result.steps));
    out.push_str(&format!("cfg: {:?}\n", result.cfg));
    out.push_str(&format!("sampler: {}\n", result.sampler));
    out.push_str(&format!("scheduler: {}\n", result.scheduler));
    out.push_str(&format!("file_info: {}\n", result.file_info));
    out.push_str("metadata_json:\n");
    out.push_str(&result.metadata_json);
    out.push('\n');
    out
}

/// One line of `wfm scan` output.
#[derive(Debug, Serialize)]
pub struct ScanLine<'a> {
    pub path: &'a str,
    #[serde(flatten)]
    pub result: &'a ExtractionResult,
}

pub fn render_scan_line(path: &str, result: &ExtractionResult) -> String {
    serde_json::to_string(&ScanLine { path, result }).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractionResult {
        ExtractionResult {
            positive_prompt: "a cat".to_string(),
            seed: 123,
            cfg: 7.0,
            file_info: "PNG Image".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn text_lists_every_field() {
        let text = render_text(&sample());
        assert!(text.contains("positive_prompt: a cat\n"));
        assert!(text.contains("negative_prompt: \n"));
        assert!(text.contains("seed: 123\n"));
        assert!(text.contains("steps: 0\n"));
        assert!(text.contains("cfg: 7.0\n"));
        assert!(text.contains("scheduler: \n"));
        assert!(text.contains("file_info: PNG Image\n"));
        assert!(text.ends_with("metadata_json:\n{}\n"));
    }

    #[test]
    fn json_has_all_nine_fields() {
        let json = render(&sample(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 9);
        assert_eq!(obj["seed"], 123);
        assert_eq!(obj["cfg"], 7.0);
    }

    #[test]
    fn scan_line_is_flat_and_single_line() {
        let line = render_scan_line("out/a.png", &sample());
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["path"], "out/a.png");
        assert_eq!(value["positive_prompt"], "a cat");
    }
}
