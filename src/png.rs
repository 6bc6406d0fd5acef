//! PNG text chunk reader.
//!
//! Image workflows are saved as `tEXt` / `zTXt` / `iTXt` chunks keyed
//! `prompt` and `workflow`, each holding a JSON document. Chunks are walked
//! natively: 4-byte big-endian length, 4-byte type, `length` bytes of data,
//! 4-byte CRC (not verified). Compressed text is zlib (method 0) and is
//! inflated with `flate2`.

use std::collections::HashMap;
use std::io::Read;

use flate2::read::ZlibDecoder;

use tracing::debug;

use crate::models::RawRecord;

/// PNG file signature (8 bytes).
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Chunk keywords decoded into the record, in record order.
pub const WORKFLOW_KEYS: &[&str] = &["workflow", "prompt"];

/// Collect all uncompressed text chunks as keyword → text.
///
/// Anything that is not a PNG yields an empty map; a truncated file yields
/// whatever was read before the cut.
pub fn text_chunks(bytes: &[u8]) -> HashMap<String, String> {
    let mut chunks = HashMap::new();
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return chunks;
    }

    let mut offset = PNG_SIGNATURE.len();
    while offset + 8 <= bytes.len() {
        let len = u32::from_be_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ]) as usize;
        let kind = &bytes[offset + 4..offset + 8];
        let data_start = offset + 8;
        let Some(data_end) = data_start.checked_add(len).filter(|end| *end <= bytes.len()) else {
            debug!(offset, "truncated PNG chunk");
            break;
        };
        let data = &bytes[data_start..data_end];

        match kind {
            b"IEND" => break,
            b"tEXt" => parse_text_chunk(data, &mut chunks),
            b"zTXt" => parse_ztxt_chunk(data, &mut chunks),
            b"iTXt" => parse_itxt_chunk(data, &mut chunks),
            _ => {}
        }

        // data + CRC
        offset = data_end + 4;
    }

    chunks
}

/// `tEXt`: keyword\0text, both Latin-1.
fn parse_text_chunk(data: &[u8], chunks: &mut HashMap<String, String>) {
    let Some(nul) = data.iter().position(|&b| b == 0) else {
        return;
    };
    let keyword = latin1(&data[..nul]);
    if !keyword.is_empty() {
        chunks.insert(keyword, latin1(&data[nul + 1..]));
    }
}

/// `zTXt`: keyword\0 method zlib(text), text Latin-1.
fn parse_ztxt_chunk(data: &[u8], chunks: &mut HashMap<String, String>) {
    let Some(nul) = data.iter().position(|&b| b == 0) else {
        return;
    };
    let keyword = latin1(&data[..nul]);
    let rest = &data[nul + 1..];
    if keyword.is_empty() || rest.is_empty() {
        return;
    }
    if let Some(text) = inflate(&keyword, rest[0], &rest[1..]) {
        chunks.insert(keyword, latin1(&text));
    }
}

/// `iTXt`: keyword\0 flag method language\0 translated\0 text (UTF-8,
/// zlib-compressed when flag is 1).
fn parse_itxt_chunk(data: &[u8], chunks: &mut HashMap<String, String>) {
    let Some(nul) = data.iter().position(|&b| b == 0) else {
        return;
    };
    let keyword = String::from_utf8_lossy(&data[..nul]).into_owned();
    let rest = &data[nul + 1..];
    if keyword.is_empty() || rest.len() < 2 {
        return;
    }
    let (compressed, method) = (rest[0] != 0, rest[1]);

    // Skip language tag and translated keyword.
    let mut text = &rest[2..];
    for _ in 0..2 {
        let Some(nul) = text.iter().position(|&b| b == 0) else {
            return;
        };
        text = &text[nul + 1..];
    }

    if compressed {
        if let Some(inflated) = inflate(&keyword, method, text) {
            chunks.insert(keyword, String::from_utf8_lossy(&inflated).into_owned());
        }
    } else {
        chunks.insert(keyword, String::from_utf8_lossy(text).into_owned());
    }
}

fn inflate(keyword: &str, method: u8, data: &[u8]) -> Option<Vec<u8>> {
    if method != 0 {
        debug!(keyword, method, "unknown text compression method");
        return None;
    }
    let mut out = Vec::new();
    match ZlibDecoder::new(data).read_to_end(&mut out) {
        Ok(_) => Some(out),
        Err(e) => {
            debug!(keyword, error = %e, "corrupt compressed text chunk");
            None
        }
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Build a raw record from a file's text chunks.
///
/// Only the workflow keys are kept, and only when their text parses as JSON;
/// a malformed chunk is left out rather than failing the file.
pub fn record_from_chunks(chunks: &HashMap<String, String>) -> RawRecord {
    let mut record = RawRecord::new();
    for key in WORKFLOW_KEYS {
        let Some(text) = chunks.get(*key) else {
            continue;
        };
        match serde_json::from_str(text) {
            Ok(value) => {
                debug!(chunk = *key, "decoded text chunk");
                record.insert(key.to_string(), value);
            }
            Err(e) => debug!(chunk = *key, error = %e, "text chunk is not JSON"),
        }
    }
    record
}
