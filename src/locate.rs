//! Source file resolution.
//!
//! A request names its file in one of three ways, tried in order:
//! an explicit path (used only if it exists), a bare filename inside the
//! input directory, or "the newest video" across the input and output
//! directories. The last one is a recency heuristic, not content matching.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::PathsConfig;
use crate::models::MediaKind;

/// How the caller identified the file to extract from.
#[derive(Debug, Clone, Default)]
pub struct SourceRequest {
    pub file_path: Option<PathBuf>,
    pub filename: Option<String>,
    pub latest_video: bool,
}

/// Resolve a request to a path. The returned path may still not exist when
/// it came from `filename`; callers check.
pub fn resolve_source(request: &SourceRequest, paths: &PathsConfig) -> Option<PathBuf> {
    if let Some(path) = request.file_path.as_ref().filter(|p| p.exists()) {
        return Some(path.clone());
    }
    if let Some(name) = request.filename.as_deref().filter(|n| !n.is_empty()) {
        return Some(paths.input_dir.join(name));
    }
    if request.latest_video {
        return latest_video(&[paths.input_dir.as_path(), paths.output_dir.as_path()]);
    }
    None
}

/// Most recently modified video file directly inside any of `dirs`.
///
/// Missing directories are skipped. Ties on modification time go to the
/// lexicographically smaller path.
pub fn latest_video(dirs: &[&Path]) -> Option<PathBuf> {
    let mut candidates: Vec<(SystemTime, PathBuf)> = dirs
        .iter()
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| direct_files(dir))
        .filter(|path| MediaKind::from_path(path) == Some(MediaKind::Video))
        .filter_map(|path| {
            let modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok()?;
            Some((modified, path))
        })
        .collect();

    candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    let found = candidates.into_iter().next().map(|(_, path)| path);
    if let Some(path) = &found {
        info!(file = %path.display(), "using most recent video");
    } else {
        debug!("no video files in input or output directories");
    }
    found
}

fn direct_files(dir: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
}

/// A supported file in the input directory.
#[derive(Debug, Clone, Serialize)]
pub struct InputFile {
    pub name: String,
    pub kind: MediaKind,
    pub modified: Option<DateTime<Local>>,
}

/// Supported files directly inside `dir`, sorted by name. A missing
/// directory lists as empty.
pub fn list_input_files(dir: &Path) -> Vec<InputFile> {
    let mut files: Vec<InputFile> = direct_files(dir)
        .filter_map(|path| {
            let kind = MediaKind::from_path(&path)?;
            let name = path.file_name()?.to_string_lossy().to_string();
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Local>::from);
            Some(InputFile {
                name,
                kind,
                modified,
            })
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(path: &Path, age_secs: u64) {
        fs::write(path, b"data").unwrap();
        let when = SystemTime::now() - Duration::from_secs(age_secs);
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(when)
            .unwrap();
    }

    fn paths(tmp: &TempDir) -> PathsConfig {
        let input_dir = tmp.path().join("input");
        let output_dir = tmp.path().join("output");
        fs::create_dir_all(&input_dir).unwrap();
        fs::create_dir_all(&output_dir).unwrap();
        PathsConfig {
            input_dir,
            output_dir,
        }
    }

    #[test]
    fn existing_path_wins() {
        let tmp = TempDir::new().unwrap();
        let cfg = paths(&tmp);
        let file = tmp.path().join("direct.png");
        touch(&file, 0);
        let request = SourceRequest {
            file_path: Some(file.clone()),
            filename: Some("other.png".into()),
            latest_video: true,
        };
        assert_eq!(resolve_source(&request, &cfg), Some(file));
    }

    #[test]
    fn missing_path_falls_through_to_filename() {
        let tmp = TempDir::new().unwrap();
        let cfg = paths(&tmp);
        let request = SourceRequest {
            file_path: Some(tmp.path().join("nope.png")),
            filename: Some("in.png".into()),
            latest_video: false,
        };
        assert_eq!(resolve_source(&request, &cfg), Some(cfg.input_dir.join("in.png")));
    }

    #[test]
    fn nothing_requested_resolves_to_none() {
        let tmp = TempDir::new().unwrap();
        let cfg = paths(&tmp);
        let request = SourceRequest {
            file_path: Some(tmp.path().join("nope.png")),
            ..Default::default()
        };
        assert_eq!(resolve_source(&request, &cfg), None);
    }

    #[test]
    fn latest_video_across_directories() {
        let tmp = TempDir::new().unwrap();
        let cfg = paths(&tmp);
        touch(&cfg.input_dir.join("old.mp4"), 300);
        touch(&cfg.output_dir.join("new.webm"), 10);
        touch(&cfg.output_dir.join("newest.png"), 0);
        fs::create_dir_all(cfg.output_dir.join("nested")).unwrap();
        touch(&cfg.output_dir.join("nested").join("deeper.mkv"), 0);

        let request = SourceRequest {
            latest_video: true,
            ..Default::default()
        };
        assert_eq!(
            resolve_source(&request, &cfg),
            Some(cfg.output_dir.join("new.webm"))
        );
    }

    #[test]
    fn latest_video_skips_missing_directories() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing");
        assert_eq!(latest_video(&[missing.as_path()]), None);
    }

    #[test]
    fn input_listing_is_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let cfg = paths(&tmp);
        touch(&cfg.input_dir.join("b.MP4"), 0);
        touch(&cfg.input_dir.join("a.png"), 0);
        touch(&cfg.input_dir.join("notes.txt"), 0);

        let files = list_input_files(&cfg.input_dir);
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.MP4"]);
        assert_eq!(files[1].kind, MediaKind::Video);
        assert!(files[0].modified.is_some());
    }
}
