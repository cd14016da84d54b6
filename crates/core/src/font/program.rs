//! Font-program capability interface.
//!
//! Embedded font parsing is a collaborator concern; this core consumes
//! font programs only through these traits. The loader decides which
//! container formats it supports; callers surface
//! `UnsupportedFontFileFormat` for anything else.

use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// A parsed font program exposing header and per-glyph metrics.
pub trait FontProgram: Send + Sync {
    /// Design units per em from the font header.
    fn units_per_em(&self) -> f64;

    /// Font-wide bounding box `(x_min, y_min, x_max, y_max)` in design
    /// units.
    fn bbox(&self) -> [f64; 4];

    /// Glyph id for a Unicode character, from the font's cmap.
    fn glyph_id(&self, c: char) -> Option<u32>;

    /// Horizontal advance width for a glyph id, in design units.
    fn advance_width(&self, gid: u32) -> Option<f64>;

    /// Kerning between a glyph pair, in design units.
    fn kerning(&self, left: u32, right: u32) -> Option<f64>;

    /// Outline bounding box for a glyph id, in design units.
    fn glyph_bbox(&self, gid: u32) -> Option<[f64; 4]>;
}

/// Loader for font programs from embedded bytes or font files.
pub trait FontProgramLoader: Send + Sync {
    /// Parse an embedded font program.
    fn load_bytes(&self, data: &[u8]) -> Result<Arc<dyn FontProgram>>;

    /// Open and parse a font file on disk.
    fn load_file(&self, path: &Path) -> Result<Arc<dyn FontProgram>>;
}
