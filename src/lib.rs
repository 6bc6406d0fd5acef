//! # workflow-meta
//!
//! Recovers generation parameters that node-graph image and video tools
//! embed in their output files, and normalizes them into one fixed schema.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │   locate     │──▶│    loader     │──▶│  normalize  │──▶│ ExtractionResult │
//! │ path/name/   │   │ PNG chunks    │   │ node rules  │   │ 7 fields + json  │
//! │ latest video │   │ ffprobe tags  │   │ + file_info │   │ + file_info      │
//! └──────────────┘   └───────────────┘   └─────────────┘   └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! wfm extract ./output/ComfyUI_00042_.png
//! wfm extract --filename clip.mp4 --format json
//! wfm extract --latest-video
//! cat record.json | wfm normalize -
//! wfm scan ./output --recursive
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Raw record and result types |
//! | [`coerce`] | Lenient value conversions |
//! | [`normalize`] | Workflow graph normalization |
//! | [`png`] | PNG text chunk reader |
//! | [`probe`] | ffprobe invocation and tag decoding |
//! | [`loader`] | Record loader trait and backends |
//! | [`locate`] | Source file resolution |
//! | [`extract`] | End-to-end extraction pipeline |
//! | [`scan`] | Batch extraction over directories |
//! | [`output`] | Text and JSON rendering |
//! | [`logging`] | Diagnostic logging setup |

pub mod coerce;
pub mod config;
pub mod extract;
pub mod loader;
pub mod locate;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod output;
pub mod png;
pub mod probe;
pub mod scan;
