//! Font loading, decoding, and resolution policy.

mod common;

use caracas_core::error::RenderError;
use caracas_core::font::{FontServices, load_font};
use caracas_core::model::objects::{Object, StreamObject};
use common::{EmptyMatcher, FixedLoader, test_services};
use std::collections::HashMap;
use std::sync::Arc;

fn dict(entries: &[(&str, Object)]) -> HashMap<String, Object> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn stream(entries: &[(&str, Object)], data: &[u8]) -> Object {
    Object::Stream(Box::new(StreamObject::new(dict(entries), data.to_vec())))
}

fn simple_spec(name: &str) -> HashMap<String, Object> {
    dict(&[
        ("Subtype", Object::Name("Type1".into())),
        ("BaseFont", Object::Name(name.into())),
    ])
}

#[test]
fn test_simple_font_identity_decode() {
    let font = load_font(&simple_spec("TestSans"), None, &test_services()).unwrap();
    assert_eq!(font.decode_text(b"Hi!").unwrap(), "Hi!");
    // Bytes above 0x7F widen to their Latin-1 codepoints.
    assert_eq!(font.decode_text(&[0xE9]).unwrap(), "\u{00E9}");
}

#[test]
fn test_simple_font_metrics_through_system_match() {
    let font = load_font(&simple_spec("TestSans"), None, &test_services()).unwrap();
    assert_eq!(font.units_per_em().unwrap(), 1000.0);
    assert_eq!(font.glyph_advance('H').unwrap(), Some(500.0));
    assert_eq!(font.glyph_kerning('A', 'V').unwrap(), 0.0);
}

#[test]
fn test_space_bbox_convention() {
    let font = load_font(&simple_spec("TestSans"), None, &test_services()).unwrap();
    // (0, 0, units_per_em, advance) for the invisible space outline.
    assert_eq!(font.glyph_bbox(' ').unwrap(), Some([0.0, 0.0, 1000.0, 500.0]));
}

#[test]
fn test_truetype_differences_decode() {
    let spec = dict(&[
        ("Subtype", Object::Name("TrueType".into())),
        ("BaseFont", Object::Name("TestSans".into())),
        (
            "Encoding",
            Object::Dict(dict(&[(
                "Differences",
                Object::Array(vec![
                    Object::Int(65),
                    Object::Name("eacute".into()),
                    Object::Name("notarealglyph".into()),
                ]),
            )])),
        ),
    ]);
    let font = load_font(&spec, None, &test_services()).unwrap();

    // 65 remaps through the table, 66 has an unresolvable name, 67 is
    // not in the table at all and keeps its identity.
    assert_eq!(font.decode_text(&[65, 66, 67]).unwrap(), "\u{00E9}?C");
}

#[test]
fn test_type1_ignores_differences() {
    let spec = dict(&[
        ("Subtype", Object::Name("Type1".into())),
        ("BaseFont", Object::Name("TestSerif".into())),
        (
            "Encoding",
            Object::Dict(dict(&[(
                "Differences",
                Object::Array(vec![Object::Int(65), Object::Name("eacute".into())]),
            )])),
        ),
    ]);
    let font = load_font(&spec, None, &test_services()).unwrap();
    assert_eq!(font.decode_text(&[65]).unwrap(), "A");
}

#[test]
fn test_type3_decodes_to_placeholder() {
    let spec = dict(&[
        ("Subtype", Object::Name("Type3".into())),
        ("FontBBox", Object::Array(vec![
            Object::Int(0),
            Object::Int(0),
            Object::Int(500),
            Object::Int(500),
        ])),
    ]);
    let font = load_font(&spec, None, &test_services()).unwrap();
    assert_eq!(font.decode_text(b"abc").unwrap(), "???");
    assert_eq!(font.glyph_advance('a').unwrap(), None);
}

#[test]
fn test_composite_identity_h_decodes_through_cmap() {
    let tounicode = b"\
1 begincodespacerange\n\
<0000> <FFFF>\n\
endcodespacerange\n\
2 beginbfchar\n\
<0001> <0048>\n\
<0002> <0069>\n\
endbfchar\n";
    let spec = dict(&[
        ("Subtype", Object::Name("Type0".into())),
        ("BaseFont", Object::Name("ABCDEF+TestCJK".into())),
        ("Encoding", Object::Name("Identity-H".into())),
        (
            "DescendantFonts",
            Object::Array(vec![Object::Dict(dict(&[
                ("Subtype", Object::Name("CIDFontType2".into())),
                ("BaseFont", Object::Name("TestCJK".into())),
            ]))]),
        ),
        ("ToUnicode", stream(&[], tounicode)),
    ]);
    let font = load_font(&spec, None, &test_services()).unwrap();
    assert_eq!(font.decode_text(&[0x00, 0x01, 0x00, 0x02]).unwrap(), "Hi");
}

#[test]
fn test_composite_descendant_ordering_identity() {
    let spec = dict(&[
        ("Subtype", Object::Name("Type0".into())),
        ("BaseFont", Object::Name("TestCJK".into())),
        (
            "DescendantFonts",
            Object::Array(vec![Object::Dict(dict(&[
                ("BaseFont", Object::Name("TestCJK".into())),
                (
                    "CIDSystemInfo",
                    Object::Dict(dict(&[(
                        "Ordering",
                        Object::String(b"Identity".to_vec()),
                    )])),
                ),
            ]))]),
        ),
    ]);
    let font = load_font(&spec, None, &test_services()).unwrap();
    // No ToUnicode: identity pass-through of 2-byte codes.
    assert_eq!(font.decode_text(&[0x00, 0x41]).unwrap(), "A");
}

#[test]
fn test_composite_non_identity_ordering_is_unsupported() {
    let spec = dict(&[
        ("Subtype", Object::Name("Type0".into())),
        ("BaseFont", Object::Name("TestCJK".into())),
        ("Encoding", Object::Name("UniJIS-UCS2-H".into())),
        (
            "DescendantFonts",
            Object::Array(vec![Object::Dict(dict(&[
                ("BaseFont", Object::Name("TestCJK".into())),
                (
                    "CIDSystemInfo",
                    Object::Dict(dict(&[(
                        "Ordering",
                        Object::String(b"Japan1".to_vec()),
                    )])),
                ),
            ]))]),
        ),
    ]);
    let font = load_font(&spec, None, &test_services()).unwrap();
    let err = font.decode_text(&[0x00, 0x41]).unwrap_err();
    assert!(matches!(err, RenderError::UnsupportedCMap(name) if name == "TestCJK"));
}

#[test]
fn test_embedded_program_wins_over_matcher() {
    let spec = dict(&[
        ("Subtype", Object::Name("Type1".into())),
        ("BaseFont", Object::Name("ABCDEF+Anything".into())),
        (
            "FontDescriptor",
            Object::Dict(dict(&[
                ("FontName", Object::Name("ABCDEF+Anything".into())),
                ("FontFile2", stream(&[], b"\x00\x01\x00\x00fake")),
            ])),
        ),
    ]);
    // The matcher would fail, but the embedded program short-circuits it.
    let services = FontServices {
        loader: Arc::new(FixedLoader),
        matcher: Arc::new(EmptyMatcher),
    };
    let font = load_font(&spec, None, &services).unwrap();
    assert_eq!(font.units_per_em().unwrap(), 1000.0);
}

#[test]
fn test_internal_name_without_program_fails() {
    let font = load_font(&simple_spec("T3_12"), None, &test_services()).unwrap();
    let err = font.units_per_em().unwrap_err();
    assert!(matches!(err, RenderError::FontResolution(_)));
}

#[test]
fn test_resolution_failure_is_memoized() {
    let services = FontServices {
        loader: Arc::new(FixedLoader),
        matcher: Arc::new(EmptyMatcher),
    };
    let font = load_font(&simple_spec("NoSuchFamily"), None, &services).unwrap();
    let first = font.units_per_em().unwrap_err();
    let second = font.units_per_em().unwrap_err();
    assert!(matches!(first, RenderError::FontResolution(_)));
    assert!(matches!(second, RenderError::FontResolution(_)));
}

#[test]
fn test_bold_style_selects_bold_file() {
    // StaticMatcher offers Regular and Bold variants; a -Bold base name
    // must resolve (to the bold file) rather than fail.
    let font = load_font(&simple_spec("TestSans-Bold"), None, &test_services()).unwrap();
    assert_eq!(font.units_per_em().unwrap(), 1000.0);
}

#[test]
fn test_missing_style_variant_fails() {
    let font = load_font(&simple_spec("TestSans-BoldItalic"), None, &test_services()).unwrap();
    let err = font.glyph_advance('a').unwrap_err();
    assert!(matches!(err, RenderError::FontResolution(_)));
}

#[test]
fn test_subset_tag_is_stripped_for_matching() {
    let font = load_font(&simple_spec("ABCDEF+TestSans"), None, &test_services()).unwrap();
    assert_eq!(font.base_font_name(), "ABCDEF+TestSans");
    assert_eq!(font.units_per_em().unwrap(), 1000.0);
}
