//! Character map (CMap) construction and decoding for composite fonts.
//!
//! A CMap buckets declared codespace ranges by byte width and carries a
//! fully unrolled code-to-replacement map built from `bfrange`/`bfchar`
//! blocks. Decoding walks the input, probing widths against the declared
//! ranges, and reconstructs one Unicode scalar per replacement group.

use crate::error::{RenderError, Result};
use std::collections::HashMap;

/// An inclusive codespace range; low and high have equal byte width.
#[derive(Debug, Clone)]
struct ByteRange {
    low: Vec<u8>,
    high: Vec<u8>,
}

impl ByteRange {
    fn width(&self) -> usize {
        self.low.len()
    }

    fn contains(&self, code: &[u8]) -> bool {
        self.low.as_slice() <= code && code <= self.high.as_slice()
    }
}

/// Character map for a composite font.
#[derive(Debug, Default)]
pub struct CMap {
    /// Codespace ranges bucketed by byte width.
    ranges: HashMap<usize, Vec<ByteRange>>,
    /// Unrolled code -> replacement byte-string map.
    cid_map: HashMap<Vec<u8>, Vec<u8>>,
    /// True when exactly one code width exists, enabling fixed-stride
    /// decoding.
    uniform: bool,
    /// Largest declared code width, in bytes.
    max_range_length: usize,
}

impl CMap {
    /// Build a CMap from a ToUnicode-style program.
    ///
    /// An absent or empty program yields the identity default: uniform
    /// two-byte codes with an empty replacement map.
    pub fn parse(program: Option<&[u8]>) -> Self {
        let mut cmap = Self::default();

        let Some(data) = program else {
            cmap.uniform = true;
            cmap.max_range_length = 2;
            return cmap;
        };
        if data.is_empty() {
            cmap.uniform = true;
            cmap.max_range_length = 2;
            return cmap;
        }

        let text = String::from_utf8_lossy(data);
        let mut in_codespace = false;
        let mut in_bfrange = false;
        let mut in_bfchar = false;

        for line in text.split(['\r', '\n']) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let last = line.split_whitespace().last().unwrap_or("");

            if last == "endcodespacerange" {
                in_codespace = false;
            } else if in_codespace {
                cmap.add_codespace_line(line);
            } else if last == "begincodespacerange" {
                in_codespace = true;
            }

            if last == "endbfrange" {
                in_bfrange = false;
            } else if in_bfrange {
                cmap.add_bfrange_line(line);
            } else if last == "beginbfrange" {
                in_bfrange = true;
            }

            if last == "endbfchar" {
                in_bfchar = false;
            } else if in_bfchar {
                cmap.add_bfchar_line(line);
            } else if last == "beginbfchar" {
                in_bfchar = true;
            }
        }

        if cmap.ranges.is_empty() {
            cmap.uniform = true;
            cmap.max_range_length = 2;
        } else if cmap.ranges.len() == 1 {
            cmap.uniform = true;
        }

        cmap
    }

    fn add_codespace_line(&mut self, line: &str) {
        let hex = extract_hex_sequences(line);
        if hex.len() < 2 {
            return;
        }
        let (Some(low), Some(high)) = (parse_hex_bytes(hex[0]), parse_hex_bytes(hex[hex.len() - 1]))
        else {
            return;
        };
        let range = ByteRange { low, high };
        let width = range.width();
        if width == 0 {
            return;
        }
        self.max_range_length = self.max_range_length.max(width);
        self.ranges.entry(width).or_default().push(range);
    }

    fn add_bfrange_line(&mut self, line: &str) {
        let hex = extract_hex_sequences(line);
        if hex.len() < 3 {
            return;
        }
        let (Some(start), Some(end)) = (parse_hex_value(hex[0]), parse_hex_value(hex[1])) else {
            return;
        };
        if end < start {
            return;
        }

        if line.contains('[') {
            // Bracketed list: one explicit replacement per code.
            for (i, hex_str) in hex[2..].iter().enumerate() {
                let code = start + i as u32;
                if code > end {
                    break;
                }
                if let Some(replacement) = parse_hex_bytes(hex_str) {
                    self.cid_map.insert(byte_string(code), replacement);
                }
            }
        } else {
            // Contiguous run starting at the base value, fully unrolled.
            let Some(base) = parse_hex_value(hex[2]) else {
                return;
            };
            for offset in 0..=(end - start) {
                self.cid_map
                    .insert(byte_string(start + offset), byte_string(base + offset));
            }
        }
    }

    fn add_bfchar_line(&mut self, line: &str) {
        let hex = extract_hex_sequences(line);
        for pair in hex.chunks(2) {
            if pair.len() != 2 {
                continue;
            }
            if let (Some(code), Some(replacement)) =
                (parse_hex_bytes(pair[0]), parse_hex_bytes(pair[1]))
            {
                self.cid_map.insert(code, replacement);
            }
        }
    }

    /// True when exactly one code width is in use.
    pub const fn is_uniform(&self) -> bool {
        self.uniform
    }

    /// Largest declared code width in bytes.
    pub const fn max_range_length(&self) -> usize {
        self.max_range_length
    }

    /// Decode a raw text-show byte string to Unicode.
    pub fn decode(&self, code: &[u8]) -> Result<String> {
        let mut output = String::new();
        let mut idx = 0;

        while idx < code.len() {
            let width = self.chunk_width(code, idx)?;
            if width == 0 || idx + width > code.len() {
                return Err(RenderError::UndecodableByteSequence { offset: idx });
            }
            let chunk = &code[idx..idx + width];

            match self.cid_map.get(chunk) {
                Some(replacement) => {
                    // A replacement may encode several code units; it is
                    // re-sliced at the matched width.
                    for group in replacement.chunks(width) {
                        push_scalar(&mut output, group);
                    }
                }
                None => push_scalar(&mut output, chunk),
            }

            idx += width;
        }

        Ok(output)
    }

    /// Width of the chunk starting at `idx`.
    fn chunk_width(&self, code: &[u8], idx: usize) -> Result<usize> {
        if self.uniform {
            return Ok(self.max_range_length);
        }
        for width in 1..=self.max_range_length {
            if idx + width > code.len() {
                break;
            }
            let candidate = &code[idx..idx + width];
            if let Some(ranges) = self.ranges.get(&width)
                && ranges.iter().any(|r| r.contains(candidate))
            {
                return Ok(width);
            }
        }
        Err(RenderError::UndecodableByteSequence { offset: idx })
    }
}

/// Reconstruct one Unicode scalar from a replacement byte group.
///
/// Bytes are reversed, then each byte contributes `value << (index * 8)`.
/// Scalars outside the valid range are dropped.
fn push_scalar(output: &mut String, group: &[u8]) {
    // Only the low four bytes can contribute to a scalar.
    let value: u32 = group
        .iter()
        .rev()
        .take(4)
        .enumerate()
        .map(|(i, &b)| (b as u32) << (i * 8))
        .sum();
    match char::from_u32(value) {
        Some(ch) => output.push(ch),
        None => tracing::debug!(value, "dropping invalid scalar from CMap decode"),
    }
}

/// Big-endian byte string for an integer, padded to at least two bytes.
fn byte_string(value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(bytes.len())
        .min(2);
    bytes[skip..].to_vec()
}

/// Extract all `<...>` hex sequences from a line.
fn extract_hex_sequences(line: &str) -> Vec<&str> {
    let mut results = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some(end) = bytes[i + 1..].iter().position(|&b| b == b'>') {
                results.push(&line[i + 1..i + 1 + end]);
                i += end + 2;
                continue;
            }
            break;
        }
        i += 1;
    }
    results
}

/// Parse a hex sequence body to an integer value.
fn parse_hex_value(s: &str) -> Option<u32> {
    u32::from_str_radix(s.trim(), 16).ok()
}

/// Parse a hex sequence body to bytes; hex digit count / 2 gives the
/// declared byte width.
fn parse_hex_bytes(s: &str) -> Option<Vec<u8>> {
    let s = s.trim();
    if s.is_empty() || !s.len().is_multiple_of(2) {
        return None;
    }
    let mut bytes = Vec::with_capacity(s.len() / 2);
    let digits = s.as_bytes();
    for pair in digits.chunks(2) {
        let hi = hex_digit(pair[0])?;
        let lo = hex_digit(pair[1])?;
        bytes.push((hi << 4) | lo);
    }
    Some(bytes)
}

const fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
