//! Font capability interface and its variants.
//!
//! Every font resource resolves to one uniform interface: text decoding
//! plus per-glyph metric queries. Built-in and simple fonts decode by
//! byte widening (or a Differences table), composite fonts delegate to a
//! CMap, and Type3 procedural glyphs carry no reliable Unicode mapping
//! at all.
//!
//! Metric queries need a resolved font program. Resolution is lazy and
//! memoized: an embedded program wins, otherwise the base font name is
//! mapped through an alias table and handed to the system matcher.

use crate::error::{RenderError, Result};
use crate::model::objects::{Object, Resolver, resolve};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock, OnceLock};

use super::cmap::CMap;
use super::encoding::{REPLACEMENT, differences_table, resolve_differences};
use super::matcher::FontMatcher;
use super::program::{FontProgram, FontProgramLoader};

/// External collaborators needed to resolve font programs.
#[derive(Clone)]
pub struct FontServices {
    pub loader: Arc<dyn FontProgramLoader>,
    pub matcher: Arc<dyn FontMatcher>,
}

/// Uniform font capability interface.
pub trait Font: Send + Sync {
    /// The PDF base font name (subset tag included, if any).
    fn base_font_name(&self) -> &str;

    /// Decode raw text-show operand bytes into Unicode.
    fn decode_text(&self, bytes: &[u8]) -> Result<String>;

    /// Design units per em.
    fn units_per_em(&self) -> Result<f64>;

    /// Font-wide bounding box in design units.
    fn bbox(&self) -> Result<[f64; 4]>;

    /// Advance width for a character, in design units. `None` when the
    /// font has no metric for the glyph.
    fn glyph_advance(&self, c: char) -> Result<Option<f64>>;

    /// Outline bounding box for a character, in design units.
    fn glyph_bbox(&self, c: char) -> Result<Option<[f64; 4]>>;

    /// Kerning between a character pair, in design units; 0 when the
    /// font has no kerning data.
    fn glyph_kerning(&self, first: char, second: char) -> Result<f64>;
}

/// Style classification for system font matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

const BOLD_KEYWORDS: &[&str] = &["bold", "demi", "black", "bd", "heavy"];
const ITALIC_KEYWORDS: &[&str] = &["it", "oblique"];

impl FontStyle {
    /// Classify a style suffix with the keyword sets.
    ///
    /// Synonymous regular spellings (normal, plain, book) carry none of
    /// the keywords and classify as regular by default.
    pub fn classify(style: &str) -> Self {
        let lower = style.to_ascii_lowercase();
        let bold = BOLD_KEYWORDS.iter().any(|kw| lower.contains(kw));
        let italic = ITALIC_KEYWORDS.iter().any(|kw| lower.contains(kw));
        match (bold, italic) {
            (true, true) => Self::BoldItalic,
            (true, false) => Self::Bold,
            (false, true) => Self::Italic,
            (false, false) => Self::Regular,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Bold => "bold",
            Self::Italic => "italics",
            Self::BoldItalic => "bold italics",
        }
    }
}

/// Known problematic family names mapped to concrete substitutes before
/// querying the matcher.
const FAMILY_ALIASES: &[(&str, &str)] = &[
    ("Symbol", "StandardSymbolsPS"),
    ("ZapfDingbats", "D050000L"),
];

static SUBSET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{6}\+").expect("subset tag pattern"));
static INTERNAL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^T\d+_\d+$").expect("internal name pattern"));

fn is_truetype_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttf"))
}

/// Memoized resolution failure; kept cloneable so repeated queries
/// reproduce the original error.
#[derive(Debug, Clone)]
enum ResolveFailure {
    UnsupportedFormat(String),
    Resolution(String),
}

impl ResolveFailure {
    fn to_error(&self) -> RenderError {
        match self {
            Self::UnsupportedFormat(msg) => RenderError::UnsupportedFontFileFormat(msg.clone()),
            Self::Resolution(msg) => RenderError::FontResolution(msg.clone()),
        }
    }
}

/// Shared program-resolution state embedded by the font variants.
pub(crate) struct ProgramResolver {
    base_font_name: String,
    embedded: Option<Vec<u8>>,
    services: FontServices,
    program: OnceLock<std::result::Result<Arc<dyn FontProgram>, ResolveFailure>>,
}

impl ProgramResolver {
    fn new(base_font_name: String, embedded: Option<Vec<u8>>, services: FontServices) -> Self {
        Self {
            base_font_name,
            embedded,
            services,
            program: OnceLock::new(),
        }
    }

    /// Family name derived from the base font name.
    ///
    /// Strips a 6-character subset tag (`ABCDEF+`), splits the style
    /// suffix away, and drops a leading `*`. Internal placeholder names
    /// (`T3_12` and friends) yield no family at all.
    fn family_name(&self) -> Option<String> {
        let name = SUBSET_TAG.replace(&self.base_font_name, "");
        if INTERNAL_NAME.is_match(&name) {
            return None;
        }
        let family = name.split('-').next().unwrap_or("");
        let family = family.strip_prefix('*').unwrap_or(family);
        if family.is_empty() {
            None
        } else {
            Some(family.to_string())
        }
    }

    /// Style classified from the suffix after the family name.
    fn style(&self) -> FontStyle {
        let name = SUBSET_TAG.replace(&self.base_font_name, "");
        match name.split_once('-') {
            Some((_, suffix)) => FontStyle::classify(suffix),
            None => FontStyle::Regular,
        }
    }

    /// The resolved font program, loading it on first use.
    fn program(&self) -> Result<Arc<dyn FontProgram>> {
        self.program
            .get_or_init(|| self.load())
            .clone()
            .map_err(|failure| failure.to_error())
    }

    fn load(&self) -> std::result::Result<Arc<dyn FontProgram>, ResolveFailure> {
        if let Some(data) = &self.embedded {
            return self.services.loader.load_bytes(data).map_err(|e| match e {
                RenderError::UnsupportedFontFileFormat(msg) => ResolveFailure::UnsupportedFormat(msg),
                other => ResolveFailure::Resolution(format!("{}: {other}", self.base_font_name)),
            });
        }

        let family = self
            .family_name()
            .ok_or_else(|| ResolveFailure::Resolution(self.base_font_name.clone()))?;
        let family = FAMILY_ALIASES
            .iter()
            .find(|(from, _)| *from == family)
            .map_or(family, |(_, to)| (*to).to_string());

        tracing::debug!(
            font = %self.base_font_name,
            family = %family,
            "no embedded program, querying system fonts"
        );

        let files = self
            .services
            .matcher
            .resolve_family(&family)
            .map_err(|e| ResolveFailure::Resolution(format!("{}: {e}", self.base_font_name)))?;

        let candidates: Vec<_> = files
            .iter()
            .filter(|f| is_truetype_file(&f.path))
            .collect();
        if candidates.is_empty() {
            let shown = files
                .first()
                .map_or_else(|| family.clone(), |f| f.path.display().to_string());
            return Err(ResolveFailure::UnsupportedFormat(shown));
        }

        let wanted = self.style();
        let chosen = candidates
            .iter()
            .find(|f| FontStyle::classify(&f.style) == wanted)
            .ok_or_else(|| {
                ResolveFailure::Resolution(format!(
                    "{}: no {} variant of {family}",
                    self.base_font_name,
                    wanted.label()
                ))
            })?;

        tracing::warn!(
            font = %self.base_font_name,
            file = %chosen.path.display(),
            "substituting system font"
        );

        self.services
            .loader
            .load_file(&chosen.path)
            .map_err(|e| ResolveFailure::Resolution(format!("{}: {e}", self.base_font_name)))
    }

    fn units_per_em(&self) -> Result<f64> {
        Ok(self.program()?.units_per_em())
    }

    fn bbox(&self) -> Result<[f64; 4]> {
        Ok(self.program()?.bbox())
    }

    fn glyph_advance(&self, c: char) -> Result<Option<f64>> {
        let program = self.program()?;
        Ok(program.glyph_id(c).and_then(|gid| program.advance_width(gid)))
    }

    fn glyph_bbox(&self, c: char) -> Result<Option<[f64; 4]>> {
        // A space has no visible outline; its box is defined from the
        // em size and advance instead.
        if c == ' ' {
            let advance = self.glyph_advance(c)?.unwrap_or(0.0);
            return Ok(Some([0.0, 0.0, self.units_per_em()?, advance]));
        }
        let program = self.program()?;
        match program.glyph_id(c).and_then(|gid| program.glyph_bbox(gid)) {
            Some(bbox) => Ok(Some(bbox)),
            None => {
                tracing::warn!(font = %self.base_font_name, ?c, "no outline for glyph");
                Ok(None)
            }
        }
    }

    fn glyph_kerning(&self, first: char, second: char) -> Result<f64> {
        let program = self.program()?;
        match (program.glyph_id(first), program.glyph_id(second)) {
            (Some(left), Some(right)) => Ok(program.kerning(left, right).unwrap_or(0.0)),
            _ => Ok(0.0),
        }
    }
}

/// Each byte becomes one Unicode scalar; the simple-font "one byte, one
/// glyph code" model before any name-based remap.
fn widen_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// A standard font addressed by name only, with no spec dictionary.
pub struct BuiltInFont {
    resolver: ProgramResolver,
}

impl BuiltInFont {
    pub fn new(name: &str, services: FontServices) -> Self {
        Self {
            resolver: ProgramResolver::new(name.to_string(), None, services),
        }
    }
}

impl Font for BuiltInFont {
    fn base_font_name(&self) -> &str {
        &self.resolver.base_font_name
    }

    fn decode_text(&self, bytes: &[u8]) -> Result<String> {
        Ok(widen_bytes(bytes))
    }

    fn units_per_em(&self) -> Result<f64> {
        self.resolver.units_per_em()
    }

    fn bbox(&self) -> Result<[f64; 4]> {
        self.resolver.bbox()
    }

    fn glyph_advance(&self, c: char) -> Result<Option<f64>> {
        self.resolver.glyph_advance(c)
    }

    fn glyph_bbox(&self, c: char) -> Result<Option<[f64; 4]>> {
        self.resolver.glyph_bbox(c)
    }

    fn glyph_kerning(&self, first: char, second: char) -> Result<f64> {
        self.resolver.glyph_kerning(first, second)
    }
}

/// Which simple-font flavor a spec dictionary declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleFontKind {
    Type1,
    TrueType,
}

/// A single-byte-addressed font (Type1 or TrueType).
pub struct SimpleFont {
    kind: SimpleFontKind,
    resolver: ProgramResolver,
    /// Raw Differences array from the Encoding dictionary, if any.
    differences: Option<Vec<Object>>,
    /// Per-byte decode table, built once on first use.
    decode_table: OnceLock<HashMap<u8, char>>,
}

impl SimpleFont {
    fn decode_table(&self) -> Option<&HashMap<u8, char>> {
        let differences = self.differences.as_ref()?;
        Some(
            self.decode_table
                .get_or_init(|| resolve_differences(&differences_table(differences))),
        )
    }
}

impl Font for SimpleFont {
    fn base_font_name(&self) -> &str {
        &self.resolver.base_font_name
    }

    fn decode_text(&self, bytes: &[u8]) -> Result<String> {
        // Only TrueType fonts with an explicit Differences encoding get
        // the name-based remap; everything else widens bytes directly.
        if self.kind == SimpleFontKind::TrueType
            && let Some(table) = self.decode_table()
        {
            return Ok(bytes
                .iter()
                .map(|b| table.get(b).copied().unwrap_or(*b as char))
                .collect());
        }
        Ok(widen_bytes(bytes))
    }

    fn units_per_em(&self) -> Result<f64> {
        self.resolver.units_per_em()
    }

    fn bbox(&self) -> Result<[f64; 4]> {
        self.resolver.bbox()
    }

    fn glyph_advance(&self, c: char) -> Result<Option<f64>> {
        self.resolver.glyph_advance(c)
    }

    fn glyph_bbox(&self, c: char) -> Result<Option<[f64; 4]>> {
        self.resolver.glyph_bbox(c)
    }

    fn glyph_kerning(&self, first: char, second: char) -> Result<f64> {
        self.resolver.glyph_kerning(first, second)
    }
}

/// Type3 procedural-glyph font. Glyphs are arbitrary content streams,
/// so decoded text is always the placeholder.
pub struct Type3Font {
    name: String,
    font_bbox: Option<[f64; 4]>,
}

impl Font for Type3Font {
    fn base_font_name(&self) -> &str {
        &self.name
    }

    fn decode_text(&self, bytes: &[u8]) -> Result<String> {
        Ok(bytes.iter().map(|_| REPLACEMENT).collect())
    }

    fn units_per_em(&self) -> Result<f64> {
        Ok(1000.0)
    }

    fn bbox(&self) -> Result<[f64; 4]> {
        Ok(self.font_bbox.unwrap_or([0.0, 0.0, 1000.0, 1000.0]))
    }

    fn glyph_advance(&self, _c: char) -> Result<Option<f64>> {
        Ok(None)
    }

    fn glyph_bbox(&self, _c: char) -> Result<Option<[f64; 4]>> {
        Ok(None)
    }

    fn glyph_kerning(&self, _first: char, _second: char) -> Result<f64> {
        Ok(0.0)
    }
}

/// A composite (Type0) font: multi-byte codes decoded through a CMap,
/// metrics delegated to the owned descendant font.
pub struct CompositeFont {
    base_font_name: String,
    descendant: SimpleFont,
    identity: bool,
    tounicode: Option<Vec<u8>>,
    cmap: OnceLock<CMap>,
}

impl CompositeFont {
    /// The CMap, built at most once for the font's lifetime.
    fn cmap(&self) -> Result<&CMap> {
        if !self.identity {
            return Err(RenderError::UnsupportedCMap(self.base_font_name.clone()));
        }
        Ok(self
            .cmap
            .get_or_init(|| CMap::parse(self.tounicode.as_deref())))
    }
}

impl Font for CompositeFont {
    fn base_font_name(&self) -> &str {
        &self.base_font_name
    }

    fn decode_text(&self, bytes: &[u8]) -> Result<String> {
        self.cmap()?.decode(bytes)
    }

    fn units_per_em(&self) -> Result<f64> {
        self.descendant.units_per_em()
    }

    fn bbox(&self) -> Result<[f64; 4]> {
        self.descendant.bbox()
    }

    fn glyph_advance(&self, c: char) -> Result<Option<f64>> {
        self.descendant.glyph_advance(c)
    }

    fn glyph_bbox(&self, c: char) -> Result<Option<[f64; 4]>> {
        self.descendant.glyph_bbox(c)
    }

    fn glyph_kerning(&self, first: char, second: char) -> Result<f64> {
        self.descendant.glyph_kerning(first, second)
    }
}

/// Resolve a font resource dictionary to a font capability.
pub fn load_font(
    spec: &HashMap<String, Object>,
    resolver: Option<&dyn Resolver>,
    services: &FontServices,
) -> Result<Arc<dyn Font>> {
    let subtype = spec
        .get("Subtype")
        .and_then(|o| o.as_name().ok())
        .unwrap_or("");

    match subtype {
        "Type0" => Ok(Arc::new(load_composite(spec, resolver, services)?)),
        "Type3" => Ok(Arc::new(Type3Font {
            name: base_font_name(spec, resolver).unwrap_or_else(|| "Type3".to_string()),
            font_bbox: spec.get("FontBBox").and_then(number_array4),
        })),
        _ => Ok(Arc::new(load_simple(spec, resolver, services)?)),
    }
}

fn load_simple(
    spec: &HashMap<String, Object>,
    resolver: Option<&dyn Resolver>,
    services: &FontServices,
) -> Result<SimpleFont> {
    let kind = match spec.get("Subtype").and_then(|o| o.as_name().ok()) {
        Some("TrueType") => SimpleFontKind::TrueType,
        _ => SimpleFontKind::Type1,
    };

    let name = base_font_name(spec, resolver)
        .ok_or_else(|| RenderError::FontResolution("font with no name".to_string()))?;
    let embedded = embedded_program(spec, resolver);
    let differences = encoding_differences(spec, resolver);

    Ok(SimpleFont {
        kind,
        resolver: ProgramResolver::new(name, embedded, services.clone()),
        differences,
        decode_table: OnceLock::new(),
    })
}

fn load_composite(
    spec: &HashMap<String, Object>,
    resolver: Option<&dyn Resolver>,
    services: &FontServices,
) -> Result<CompositeFont> {
    let name = base_font_name(spec, resolver)
        .ok_or_else(|| RenderError::FontResolution("font with no name".to_string()))?;

    let descendant_spec = spec
        .get("DescendantFonts")
        .map(|o| resolve(o.clone(), resolver))
        .and_then(|o| match o {
            Object::Array(items) => items
                .into_iter()
                .next()
                .map(|item| resolve(item, resolver)),
            _ => None,
        })
        .and_then(|o| match o {
            Object::Dict(d) => Some(d),
            _ => None,
        });

    // Identity ordering is declared either on the font's Encoding name
    // or on the descendant's CIDSystemInfo.
    let encoding_identity = spec
        .get("Encoding")
        .and_then(|o| o.as_name().ok())
        .is_some_and(|n| n == "Identity-H" || n == "Identity-V");
    let ordering_identity = descendant_spec
        .as_ref()
        .and_then(|d| d.get("CIDSystemInfo"))
        .map(|o| resolve(o.clone(), resolver))
        .and_then(|o| match o {
            Object::Dict(d) => d.get("Ordering").cloned(),
            _ => None,
        })
        .is_some_and(|ordering| match ordering {
            Object::String(s) => s.eq_ignore_ascii_case(b"identity"),
            Object::Name(s) => s.eq_ignore_ascii_case("identity"),
            _ => false,
        });

    let tounicode = spec
        .get("ToUnicode")
        .map(|o| resolve(o.clone(), resolver))
        .and_then(|o| match o {
            Object::Stream(s) => Some(s.data().to_vec()),
            _ => None,
        });

    let descendant = match &descendant_spec {
        Some(d) => load_simple(d, resolver, services)?,
        // No descendant: fall back to the Type0 dict itself so metrics
        // still resolve through the base font name.
        None => load_simple(spec, resolver, services)?,
    };

    Ok(CompositeFont {
        base_font_name: name,
        descendant,
        identity: encoding_identity || ordering_identity,
        tounicode,
        cmap: OnceLock::new(),
    })
}

fn base_font_name(spec: &HashMap<String, Object>, resolver: Option<&dyn Resolver>) -> Option<String> {
    if let Some(Object::Name(name)) = spec.get("BaseFont") {
        return Some(name.clone());
    }
    descriptor(spec, resolver)?
        .get("FontName")
        .and_then(|o| o.as_name().ok().map(str::to_string))
}

fn descriptor(
    spec: &HashMap<String, Object>,
    resolver: Option<&dyn Resolver>,
) -> Option<HashMap<String, Object>> {
    match resolve(spec.get("FontDescriptor")?.clone(), resolver) {
        Object::Dict(d) => Some(d),
        _ => None,
    }
}

fn embedded_program(
    spec: &HashMap<String, Object>,
    resolver: Option<&dyn Resolver>,
) -> Option<Vec<u8>> {
    let descriptor = descriptor(spec, resolver)?;
    let stream = descriptor
        .get_any_of(&["FontFile2", "FontFile", "FontFile3"])?
        .clone();
    match resolve(stream, resolver) {
        Object::Stream(s) => Some(s.data().to_vec()),
        _ => None,
    }
}

fn encoding_differences(
    spec: &HashMap<String, Object>,
    resolver: Option<&dyn Resolver>,
) -> Option<Vec<Object>> {
    match resolve(spec.get("Encoding")?.clone(), resolver) {
        Object::Dict(d) => match resolve(d.get("Differences")?.clone(), resolver) {
            Object::Array(items) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

fn number_array4(obj: &Object) -> Option<[f64; 4]> {
    let arr = obj.as_array().ok()?;
    if arr.len() < 4 {
        return None;
    }
    Some([
        arr[0].as_num().ok()?,
        arr[1].as_num().ok()?,
        arr[2].as_num().ok()?,
        arr[3].as_num().ok()?,
    ])
}

trait GetAnyOf {
    fn get_any_of(&self, names: &[&str]) -> Option<&Object>;
}

impl GetAnyOf for HashMap<String, Object> {
    fn get_any_of(&self, names: &[&str]) -> Option<&Object> {
        names.iter().find_map(|name| self.get(*name))
    }
}

/// Synthetic resource names some producers use for the standard fonts.
const SYNTHETIC_NAMES: &[(&str, &str)] = &[
    ("Helv", "Helvetica"),
    ("HeBo", "Helvetica-Bold"),
    ("HeOb", "Helvetica-Oblique"),
    ("TiRo", "Times-Roman"),
    ("TiBo", "Times-Bold"),
    ("TiIt", "Times-Italic"),
    ("Cour", "Courier"),
    ("CoBo", "Courier-Bold"),
    ("Symb", "Symbol"),
    ("ZaDb", "ZapfDingbats"),
];

/// The 14 standard Type1 base font names.
pub const STANDARD_FONTS: &[&str] = &[
    "Times-Roman",
    "Helvetica",
    "Courier",
    "Symbol",
    "Times-Bold",
    "Helvetica-Bold",
    "Courier-Bold",
    "ZapfDingbats",
    "Times-Italic",
    "Helvetica-Oblique",
    "Courier-Oblique",
    "Times-BoldItalic",
    "Helvetica-BoldOblique",
    "Courier-BoldOblique",
];

/// Built-in standard-font fallback keyed by the font resource name.
pub fn builtin_fallback(resource_name: &str, services: &FontServices) -> Option<Arc<dyn Font>> {
    let base = SYNTHETIC_NAMES
        .iter()
        .find(|(synthetic, _)| *synthetic == resource_name)
        .map(|(_, full)| *full)
        .or_else(|| {
            STANDARD_FONTS
                .iter()
                .copied()
                .find(|name| *name == resource_name)
        })?;
    Some(Arc::new(BuiltInFont::new(base, services.clone())))
}
