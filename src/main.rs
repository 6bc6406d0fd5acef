//! # workflow-meta CLI (`wfm`)
//!
//! Prints the generation parameters embedded in images and videos produced
//! by node-graph generation tools.
//!
//! ## Usage
//!
//! ```bash
//! wfm --config ./config/wfm.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wfm extract <path>` | Extract from one file (or `--filename`, `--latest-video`) |
//! | `wfm normalize <file>` | Normalize a raw record given as JSON |
//! | `wfm list` | List supported files in the input directory |
//! | `wfm scan [dir]` | Extract every supported file under a directory |
//! | `wfm completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # One PNG, human-readable
//! wfm extract ./output/ComfyUI_00042_.png --format text
//!
//! # A file from the input directory, as JSON
//! wfm extract --filename clip.mp4 --format json
//!
//! # Whatever video was written last
//! wfm extract --latest-video
//!
//! # One JSON line per file
//! wfm scan ./output --recursive
//! ```

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use workflow_meta::config::{self, Config};
use workflow_meta::extract::Extractor;
use workflow_meta::locate::{list_input_files, SourceRequest};
use workflow_meta::logging::{self, Verbosity};
use workflow_meta::models::RawRecord;
use workflow_meta::normalize::normalize;
use workflow_meta::output::{self, OutputFormat};
use workflow_meta::scan;

/// workflow-meta: read prompts, seed and sampler settings back out of
/// generated images and videos.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means built-in defaults.
#[derive(Parser)]
#[command(
    name = "wfm",
    about = "Extract generation parameters embedded in image and video workflow metadata",
    version,
    long_about = "Reads the node-graph workflow that generation tools embed in PNG text chunks \
    and video container tags, and normalizes it into prompts, seed, steps, cfg and sampler."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/wfm.toml`. Directory, probe and output settings
    /// are read from this file; when it does not exist defaults are used.
    #[arg(long, global = true, default_value = "./config/wfm.toml")]
    config: PathBuf,

    /// Log extraction details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Extract metadata from one file.
    ///
    /// The file is taken from PATH if it exists, otherwise from `--filename`
    /// inside the input directory, otherwise (with `--latest-video`) the most
    /// recently modified video in the input or output directory. Always
    /// prints a result; failures show up in `file_info`.
    Extract {
        /// Full path to the file.
        path: Option<PathBuf>,

        /// File name inside the configured input directory.
        #[arg(long)]
        filename: Option<String>,

        /// Fall back to the newest video in the input/output directories.
        #[arg(long)]
        latest_video: bool,

        /// Output format; overrides `[output].format`.
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Normalize a raw metadata record.
    ///
    /// Reads a JSON object (as a loader would produce it) from FILE, or from
    /// stdin when FILE is `-` or omitted, and prints the normalized result.
    Normalize {
        /// JSON file holding the record, or `-` for stdin.
        file: Option<PathBuf>,

        /// Output format; overrides `[output].format`.
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// List supported files in the input directory.
    List,

    /// Extract every supported file under a directory.
    ///
    /// Prints one JSON object per line: the relative `path` plus all result
    /// fields. Defaults to the output directory.
    Scan {
        /// Directory to scan.
        dir: Option<PathBuf>,

        /// Descend into subdirectories.
        #[arg(long)]
        recursive: bool,
    },

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet));

    // Commands that don't require config
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "wfm", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_or_minimal(&cli.config)?;

    match cli.command {
        Commands::Extract {
            path,
            filename,
            latest_video,
            format,
        } => {
            let request = SourceRequest {
                file_path: path,
                filename,
                latest_video,
            };
            let extractor = Extractor::from_config(&cfg);
            let result = extractor.extract(&request, &cfg).await;
            print!("{}", with_newline(output::render(&result, pick_format(format, &cfg))));
        }
        Commands::Normalize { file, format } => {
            let record = read_record(file)?;
            let result = normalize(&record);
            print!("{}", with_newline(output::render(&result, pick_format(format, &cfg))));
        }
        Commands::List => {
            let files = list_input_files(&cfg.paths.input_dir);
            if files.is_empty() {
                println!("No supported files in {}", cfg.paths.input_dir.display());
            }
            for file in files {
                let modified = file
                    .modified
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<6} {:<19} {}", file.kind.as_str(), modified, file.name);
            }
        }
        Commands::Scan { dir, recursive } => {
            let root = dir.unwrap_or_else(|| cfg.paths.output_dir.clone());
            let extractor = Arc::new(Extractor::from_config(&cfg));
            let entries = scan::scan_directory(extractor, &root, &cfg.scan, recursive).await?;
            for entry in entries {
                println!(
                    "{}",
                    output::render_scan_line(&entry.relative_path, &entry.result)
                );
            }
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}

fn pick_format(flag: Option<OutputFormat>, cfg: &Config) -> OutputFormat {
    flag.unwrap_or(cfg.output.format)
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn read_record(file: Option<PathBuf>) -> Result<RawRecord> {
    let text = match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read record file: {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read record from stdin")?;
            buf
        }
    };

    let value: serde_json::Value =
        serde_json::from_str(&text).context("Record is not valid JSON")?;
    match value {
        serde_json::Value::Object(record) => Ok(record),
        other => bail!(
            "Record must be a JSON object, got {}",
            json_type_name(&other)
        ),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
