//! Workflow graph normalization.
//!
//! A generation tool stores the graph that produced an output as a mapping
//! from node id to `{ "class_type": ..., "inputs": { ... } }`. Node classes,
//! field names and link encodings drift between tool versions, so this module
//! only knows a small table of node kinds and reads each one with a
//! dedicated rule. Everything else in the graph is ignored.
//!
//! ```text
//! RawRecord ──▶ select_graph ──▶ for each node: NodeKind ──▶ rule(inputs, acc)
//!                                                              │
//!                      describe_file ◀── metadata_json ◀── Accumulator
//! ```
//!
//! [`normalize`] is total: unreadable values are logged and skipped, and the
//! result always carries the full raw record for auditing.

use serde_json::{Map, Value};
use tracing::debug;

use crate::coerce;
use crate::models::{ExtractionResult, RawRecord, STILL_IMAGE_INFO};

/// Node input mapping.
pub type Inputs = Map<String, Value>;

/// Node kinds the normalizer knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Text conditioning; the first two carry the positive and negative prompt.
    TextEncode,
    /// Noise source holding the generation seed.
    NoiseSource,
    /// Sampler selector holding the sampler name.
    SamplerSelect,
    /// Sigma scheduler holding the step count.
    Scheduler,
    /// Guider holding the guidance scale.
    Guider,
    Unknown,
}

/// Class-type names mapped to the kind that reads them.
const NODE_KINDS: &[(&str, NodeKind)] = &[
    ("CLIPTextEncode", NodeKind::TextEncode),
    ("CLIPTextEncodeSDXL", NodeKind::TextEncode),
    ("CLIPTextEncodeFlux", NodeKind::TextEncode),
    ("RandomNoise", NodeKind::NoiseSource),
    ("KSamplerSelect", NodeKind::SamplerSelect),
    ("LTXVScheduler", NodeKind::Scheduler),
    ("BasicScheduler", NodeKind::Scheduler),
    ("KScheduler", NodeKind::Scheduler),
    ("CFGGuider", NodeKind::Guider),
    ("DualCFGGuider", NodeKind::Guider),
];

type Rule = fn(&Inputs, &mut Accumulator);

impl NodeKind {
    pub fn from_class_type(class_type: &str) -> Self {
        NODE_KINDS
            .iter()
            .find(|(name, _)| *name == class_type)
            .map(|(_, kind)| *kind)
            .unwrap_or(NodeKind::Unknown)
    }

    fn rule(self) -> Rule {
        match self {
            NodeKind::TextEncode => read_prompt,
            NodeKind::NoiseSource => read_seed,
            NodeKind::SamplerSelect => read_sampler,
            NodeKind::Scheduler => read_steps,
            NodeKind::Guider => read_cfg,
            NodeKind::Unknown => ignore,
        }
    }
}

/// Fields collected while walking the graph.
///
/// Seed, sampler, steps and cfg are overwritten by every matching node, so
/// with several samplers in one graph the last one in node order wins.
#[derive(Debug, Default)]
struct Accumulator {
    positive: Option<String>,
    negative: Option<String>,
    seed: Option<i128>,
    sampler: Option<String>,
    steps: Option<i64>,
    cfg: Option<f64>,
}

fn ignore(_: &Inputs, _: &mut Accumulator) {}

fn read_prompt(inputs: &Inputs, acc: &mut Accumulator) {
    let Some(text) = inputs.get("text").and_then(coerce::to_text) else {
        return;
    };
    if acc.positive.is_none() {
        debug!("positive prompt found");
        acc.positive = Some(text.to_string());
    } else if acc.negative.is_none() {
        debug!("negative prompt found");
        acc.negative = Some(text.to_string());
    }
}

fn read_seed(inputs: &Inputs, acc: &mut Accumulator) {
    let seed = match inputs.get("noise_seed") {
        None => return,
        // Linked seed: `[source_node, output_index]`; the head is the best guess.
        Some(Value::Array(link)) => link.first().and_then(coerce::to_integer::<i128>),
        Some(value) => coerce::to_integer::<i128>(value),
    };
    match seed {
        Some(seed) => {
            debug!(seed = %seed, "seed found");
            acc.seed = Some(seed);
        }
        None => debug!(value = ?inputs.get("noise_seed"), "unreadable noise_seed skipped"),
    }
}

fn read_sampler(inputs: &Inputs, acc: &mut Accumulator) {
    if let Some(name) = inputs.get("sampler_name").and_then(coerce::to_text) {
        debug!(sampler = name, "sampler found");
        acc.sampler = Some(name.to_string());
    }
}

fn read_steps(inputs: &Inputs, acc: &mut Accumulator) {
    let Some(value) = inputs.get("steps") else {
        return;
    };
    match coerce::to_integer::<i64>(value) {
        Some(steps) => {
            debug!(steps, "steps found");
            acc.steps = Some(steps);
        }
        None => debug!(value = ?value, "unreadable steps skipped"),
    }
}

fn read_cfg(inputs: &Inputs, acc: &mut Accumulator) {
    let Some(value) = inputs.get("cfg") else {
        return;
    };
    match coerce::to_float(value) {
        Some(cfg) => {
            debug!(cfg, "cfg found");
            acc.cfg = Some(cfg);
        }
        None => debug!(value = ?value, "unreadable cfg skipped"),
    }
}

/// Pick the workflow graph out of a record.
///
/// `prompt` wins whenever the key exists, even if it turns out unusable;
/// `comment` (written by video muxers) is only consulted when it decoded to
/// a mapping.
pub fn select_graph(record: &RawRecord) -> Option<&Map<String, Value>> {
    let candidate = match record.get("prompt") {
        Some(prompt) => prompt,
        None => record.get("comment")?,
    };
    candidate.as_object().filter(|graph| !graph.is_empty())
}

/// Normalize a raw record into the fixed result schema.
pub fn normalize(record: &RawRecord) -> ExtractionResult {
    let metadata_json = serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string());
    let file_info = describe_file(record);

    let Some(graph) = select_graph(record) else {
        debug!("record carries no workflow graph");
        return ExtractionResult {
            metadata_json,
            file_info,
            ..Default::default()
        };
    };

    debug!(nodes = graph.len(), "parsing workflow graph");
    let empty = Inputs::new();
    let mut acc = Accumulator::default();
    for (node_id, node) in graph {
        let Some(node) = node.as_object() else {
            continue;
        };
        let Some(class_type) = node.get("class_type").and_then(Value::as_str) else {
            debug!(node_id = node_id.as_str(), "node without class_type skipped");
            continue;
        };
        let inputs = node.get("inputs").and_then(Value::as_object).unwrap_or(&empty);
        NodeKind::from_class_type(class_type).rule()(inputs, &mut acc);
    }

    ExtractionResult {
        positive_prompt: acc.positive.unwrap_or_default(),
        negative_prompt: acc.negative.unwrap_or_default(),
        seed: acc.seed.unwrap_or_default(),
        steps: acc.steps.unwrap_or_default(),
        cfg: acc.cfg.unwrap_or_default(),
        sampler: acc.sampler.unwrap_or_default(),
        scheduler: String::new(),
        metadata_json,
        file_info,
    }
}

/// One-line summary of the container properties a video loader injected,
/// e.g. `1920x1080 | 24.00 FPS | 5.50s`. Records without any of them are
/// reported as still images.
pub fn describe_file(record: &RawRecord) -> String {
    let mut parts = Vec::new();
    if let Some(width) = record.get("video_width") {
        let height = record
            .get("video_height")
            .map(coerce::to_display)
            .unwrap_or_else(|| "0".to_string());
        parts.push(format!("{}x{}", coerce::to_display(width), height));
    }
    if let Some(fps) = record.get("video_fps").and_then(coerce::to_float) {
        parts.push(format!("{:.2} FPS", fps));
    }
    if let Some(duration) = record.get("video_duration").and_then(coerce::to_float) {
        parts.push(format!("{:.2}s", duration));
    }

    if parts.is_empty() {
        STILL_IMAGE_INFO.to_string()
    } else {
        parts.join(" | ")
    }
}
