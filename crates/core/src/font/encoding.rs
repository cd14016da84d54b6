//! Glyph-name to Unicode conversion and Differences-based encodings.
//!
//! Follows the Adobe glyph naming convention: a name is stripped of any
//! `.suffix`, split on `_` into components, and each component resolves
//! through the `uni`/`u` hex forms or the static glyph table.

use crate::error::{RenderError, Result};
use crate::model::objects::Object;
use std::collections::HashMap;

use super::glyphlist::glyphname2unicode;

/// Placeholder for glyph names that cannot be resolved to Unicode.
pub const REPLACEMENT: char = '?';

/// Check if a string contains only hexadecimal characters.
fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Check if a codepoint is in the surrogate range (invalid in `uni` form).
const fn is_surrogate(cp: u32) -> bool {
    cp >= 0xD800 && cp <= 0xDFFF
}

/// Decode a single component of a glyph name.
fn decode_component(name: &str) -> Result<String> {
    // "uni" + 4*N hex digits
    if let Some(hex) = name.strip_prefix("uni")
        && hex.len() >= 4
        && hex.len() % 4 == 0
        && is_hex(hex)
    {
        let mut result = String::new();
        for chunk in hex.as_bytes().chunks(4) {
            let hex_str = std::str::from_utf8(chunk)
                .map_err(|_| RenderError::UnknownGlyph(name.to_string()))?;
            let cp = u32::from_str_radix(hex_str, 16)
                .map_err(|_| RenderError::UnknownGlyph(name.to_string()))?;
            if is_surrogate(cp) {
                return Err(RenderError::UnknownGlyph(name.to_string()));
            }
            match char::from_u32(cp) {
                Some(ch) => result.push(ch),
                None => return Err(RenderError::UnknownGlyph(name.to_string())),
            }
        }
        return Ok(result);
    }

    // "u" + 4-6 hex digits
    if let Some(hex) = name.strip_prefix('u')
        && (4..=6).contains(&hex.len())
        && is_hex(hex)
    {
        let cp = u32::from_str_radix(hex, 16)
            .map_err(|_| RenderError::UnknownGlyph(name.to_string()))?;
        if !is_surrogate(cp)
            && let Some(ch) = char::from_u32(cp)
        {
            return Ok(ch.to_string());
        }
        return Err(RenderError::UnknownGlyph(name.to_string()));
    }

    // Static table lookup
    if let Some(&ch) = glyphname2unicode().get(name) {
        return Ok(ch.to_string());
    }

    Err(RenderError::UnknownGlyph(name.to_string()))
}

/// Convert an Adobe glyph name to a Unicode string.
pub fn name2unicode(name: &str) -> Result<String> {
    let name = match name.find('.') {
        Some(idx) => &name[..idx],
        None => name,
    };

    if name.is_empty() || name == "notdef" {
        return Err(RenderError::UnknownGlyph(name.to_string()));
    }

    let mut result = String::new();
    for part in name.split('_') {
        result.push_str(&decode_component(part)?);
    }
    Ok(result)
}

/// A per-byte glyph-name table built from an `Encoding` dictionary's
/// `Differences` array.
///
/// The array alternates base char codes with ordered glyph-name runs:
/// `[32 /space /exclam 65 /A]` places `space` at 32, `exclam` at 33 and
/// `A` at 65.
pub fn differences_table(differences: &[Object]) -> HashMap<u8, String> {
    let mut table = HashMap::new();
    let mut current_code: Option<u8> = None;

    for entry in differences {
        match entry {
            Object::Int(n) => {
                current_code = u8::try_from(*n).ok();
            }
            Object::Real(n) => {
                current_code = u8::try_from(*n as i64).ok();
            }
            Object::Name(glyph_name) => {
                if let Some(code) = current_code {
                    table.insert(code, glyph_name.clone());
                    current_code = code.checked_add(1);
                }
                // A name with no preceding code is ignored.
            }
            _ => {}
        }
    }

    table
}

/// Resolve a per-byte glyph-name table to Unicode characters.
///
/// Unresolved names decode to the placeholder; bytes without an entry
/// keep their identity widening.
pub fn resolve_differences(table: &HashMap<u8, String>) -> HashMap<u8, char> {
    let mut resolved = HashMap::with_capacity(table.len());
    for (&code, glyph_name) in table {
        let ch = match name2unicode(glyph_name) {
            Ok(s) => s.chars().next().unwrap_or(REPLACEMENT),
            Err(_) => {
                tracing::warn!(glyph = %glyph_name, code, "unresolvable glyph name");
                REPLACEMENT
            }
        };
        resolved.insert(code, ch);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        assert_eq!(name2unicode("A").unwrap(), "A");
        assert_eq!(name2unicode("eacute").unwrap(), "\u{00E9}");
    }

    #[test]
    fn test_uni_form() {
        assert_eq!(name2unicode("uni0041").unwrap(), "A");
        assert_eq!(name2unicode("uni00410042").unwrap(), "AB");
        assert!(name2unicode("uniD800").is_err());
    }

    #[test]
    fn test_u_form() {
        assert_eq!(name2unicode("u0041").unwrap(), "A");
        assert_eq!(name2unicode("u1F600").unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_suffix_and_composites() {
        assert_eq!(name2unicode("A.sc").unwrap(), "A");
        assert_eq!(name2unicode("f_i").unwrap(), "fi");
        assert!(name2unicode(".notdef").is_err());
    }

    #[test]
    fn test_differences_table() {
        let diffs = vec![
            Object::Int(32),
            Object::Name("space".into()),
            Object::Name("exclam".into()),
            Object::Int(65),
            Object::Name("A".into()),
        ];
        let table = differences_table(&diffs);
        assert_eq!(table.get(&32), Some(&"space".to_string()));
        assert_eq!(table.get(&33), Some(&"exclam".to_string()));
        assert_eq!(table.get(&65), Some(&"A".to_string()));

        let resolved = resolve_differences(&table);
        assert_eq!(resolved.get(&32), Some(&' '));
        assert_eq!(resolved.get(&65), Some(&'A'));
    }
}
