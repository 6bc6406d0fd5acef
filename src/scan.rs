//! Batch extraction over a directory tree.
//!
//! Walks `root`, keeps files matching the `[scan]` include globs and not the
//! exclude globs, and extracts each one independently. Up to
//! `scan.concurrency` files are in flight at once; results come back sorted
//! by relative path.

use anyhow::{bail, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::extract::Extractor;
use crate::models::ExtractionResult;

/// One scanned file.
#[derive(Debug, Clone)]
pub struct ScanEntry {
    /// Path relative to the scan root.
    pub relative_path: String,
    pub result: ExtractionResult,
}

/// Files under `root` selected by the scan globs, sorted by relative path.
pub fn discover(root: &Path, config: &ScanConfig, recursive: bool) -> Result<Vec<(String, PathBuf)>> {
    if !root.is_dir() {
        bail!("scan root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.include_globs)?;
    let mut default_excludes = vec!["**/.git/**".to_string(), "**/.thumbnails/**".to_string()];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        files.push((rel_str, path.to_path_buf()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Extract every discovered file under `root`.
pub async fn scan_directory(
    extractor: Arc<Extractor>,
    root: &Path,
    config: &ScanConfig,
    recursive: bool,
) -> Result<Vec<ScanEntry>> {
    let files = discover(root, config, recursive)?;
    let permits = Arc::new(Semaphore::new(config.concurrency.max(1)));

    let mut tasks = JoinSet::new();
    for (relative_path, path) in files {
        let extractor = extractor.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = extractor.extract_path(&path).await;
            ScanEntry {
                relative_path,
                result,
            }
        });
    }

    let mut entries = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(error = %e, "scan task failed"),
        }
    }
    entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(entries)
}

/// Case-insensitive glob set; `*.PNG` and `*.png` are the same file type.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::RecordLoader;
    use crate::models::RawRecord;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    struct SeedFromName;

    #[async_trait]
    impl RecordLoader for SeedFromName {
        fn name(&self) -> &str {
            "seed-from-name"
        }

        async fn load(&self, path: &Path) -> Option<RawRecord> {
            let stem = path.file_stem()?.to_str()?;
            let seed: u64 = stem.parse().ok()?;
            let value = serde_json::json!({
                "prompt": { "1": { "class_type": "RandomNoise", "inputs": { "noise_seed": seed } } }
            });
            value.as_object().cloned()
        }
    }

    fn tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("1.png"), b"x").unwrap();
        fs::write(root.join("2.MP4"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("3.webm"), b"x").unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git").join("4.png"), b"x").unwrap();
        tmp
    }

    #[test]
    fn discover_respects_depth_and_globs() {
        let tmp = tree();
        let config = ScanConfig::default();

        let flat = discover(tmp.path(), &config, false).unwrap();
        let names: Vec<&str> = flat.iter().map(|(rel, _)| rel.as_str()).collect();
        assert_eq!(names, vec!["1.png", "2.MP4"]);

        let deep = discover(tmp.path(), &config, true).unwrap();
        let names: Vec<&str> = deep.iter().map(|(rel, _)| rel.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert!(names.iter().any(|n| n.ends_with("3.webm")));
    }

    #[test]
    fn exclude_globs_apply() {
        let tmp = tree();
        let config = ScanConfig {
            exclude_globs: vec!["**/*.mp4".to_string()],
            ..Default::default()
        };
        let files = discover(tmp.path(), &config, false).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, "1.png");
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(discover(&tmp.path().join("nope"), &ScanConfig::default(), false).is_err());
    }

    #[tokio::test]
    async fn scan_extracts_each_file() {
        let tmp = tree();
        let extractor = Arc::new(Extractor::new(Box::new(SeedFromName), Box::new(SeedFromName)));
        let config = ScanConfig {
            concurrency: 2,
            ..Default::default()
        };

        let entries = scan_directory(extractor, tmp.path(), &config, true).await.unwrap();
        let seeds: Vec<i128> = entries.iter().map(|e| e.result.seed).collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].relative_path, "1.png");
        assert_eq!(seeds, vec![1, 2, 3]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_does_not_stop_discovery() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tree();
        let locked = tmp.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("5.png"), b"x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = discover(tmp.path(), &ScanConfig::default(), true);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let names: Vec<String> = result.unwrap().into_iter().map(|(rel, _)| rel).collect();
        assert!(names.contains(&"1.png".to_string()));
        assert!(names.iter().any(|n| n.ends_with("3.webm")));
    }
}
