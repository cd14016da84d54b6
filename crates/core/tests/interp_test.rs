//! Dispatcher end-to-end: state tracking plus canvas call stream.

mod common;

use caracas_core::error::RenderError;
use caracas_core::geometry::{AffineMatrix, Point};
use caracas_core::interp::device::TextCollector;
use caracas_core::interp::interpreter::{Interpreter, InterpreterOptions};
use caracas_core::model::objects::{Object, StreamObject};
use caracas_core::page::Page;
use common::{Call, RecordingCanvas, test_services};
use std::collections::HashMap;

fn dict(entries: &[(&str, Object)]) -> HashMap<String, Object> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn simple_font_spec(name: &str) -> Object {
    Object::Dict(dict(&[
        ("Subtype", Object::Name("Type1".into())),
        ("BaseFont", Object::Name(name.into())),
    ]))
}

fn page_with_f1() -> Page {
    Page::new(dict(&[(
        "Font",
        Object::Dict(dict(&[("F1", simple_font_spec("TestSans"))])),
    )]))
}

#[test]
fn test_end_to_end_text_block() {
    let page = page_with_f1();
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    interp.run(b"BT /F1 12 Tf 100 700 Td (Hi) Tj ET").unwrap();

    // Both text matrices are cleared after ET.
    let state = interp.manager().current();
    assert!(state.text.text_matrix.is_none());
    assert!(state.text.text_line_matrix.is_none());

    assert_eq!(
        canvas.calls,
        vec![
            Call::Bt,
            Call::Tf("TestSans".into(), 12.0),
            Call::Td(Point::new(100.0, 700.0)),
            Call::Tj("Hi".into(), Point::new(100.0, 700.0)),
            Call::Et,
        ]
    );
}

#[test]
fn test_glyph_advance_displaces_text_matrix() {
    let page = page_with_f1();
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    // 500/1000 em at size 12 -> 6.0 per glyph.
    interp.run(b"BT /F1 12 Tf (H) Tj").unwrap();
    let tm = interp.manager().current().text.text_matrix.unwrap();
    assert!((tm.e - 6.0).abs() < 1e-9);

    interp.run(b"(i) Tj").unwrap();
    let tm = interp.manager().current().text.text_matrix.unwrap();
    assert!((tm.e - 12.0).abs() < 1e-9);
}

#[test]
fn test_tj_adjustments_pair_with_runs() {
    let page = page_with_f1();
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    interp.run(b"BT /F1 12 Tf [(A) 1000 (B)] TJ").unwrap();

    // +6 for A, -12 for the adjustment, +6 for B.
    let tm = interp.manager().current().text.text_matrix.unwrap();
    assert!(tm.e.abs() < 1e-9);

    let tj_calls: Vec<_> = canvas
        .calls
        .iter()
        .filter(|c| matches!(c, Call::TJ(..)))
        .collect();
    assert_eq!(
        tj_calls,
        vec![
            &Call::TJ("A".into(), Some(1000.0)),
            &Call::TJ("B".into(), None),
        ]
    );
}

#[test]
fn test_word_spacing_applies_at_spaces() {
    let page = page_with_f1();
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    interp.run(b"BT /F1 10 Tf 4 Tw ( ) Tj").unwrap();
    // advance 5.0 + word spacing 4.0
    let tm = interp.manager().current().text.text_matrix.unwrap();
    assert!((tm.e - 9.0).abs() < 1e-9);
}

#[test]
fn test_no_active_font_is_terminal() {
    let page = page_with_f1();
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    let err = interp.run(b"BT (Hi) Tj ET").unwrap_err();
    assert!(matches!(err, RenderError::NoActiveFont));
}

#[test]
fn test_font_not_found_after_full_chain() {
    let page = Page::new(HashMap::new());
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    let err = interp.run(b"BT /Missing 10 Tf").unwrap_err();
    assert!(matches!(err, RenderError::FontNotFound(name) if name == "Missing"));
}

#[test]
fn test_synthetic_name_falls_back_to_builtin() {
    let page = Page::new(HashMap::new());
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    interp.run(b"BT /Helv 10 Tf (ok) Tj ET").unwrap();
    assert!(
        canvas
            .calls
            .contains(&Call::Tf("Helvetica".into(), 10.0))
    );
}

#[test]
fn test_inherited_resources_resolve_fonts() {
    let inherited = dict(&[(
        "Font",
        Object::Dict(dict(&[("F9", simple_font_spec("TestSans"))])),
    )]);
    let page = Page::with_inherited(HashMap::new(), inherited);
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    interp.run(b"BT /F9 8 Tf (x) Tj ET").unwrap();
    assert!(canvas.calls.contains(&Call::Tf("TestSans".into(), 8.0)));
}

#[test]
fn test_cm_prepends_and_rectangle_resolves() {
    let page = Page::new(HashMap::new());
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    interp.run(b"2 0 0 2 0 0 cm 10 20 30 40 re").unwrap();

    assert_eq!(
        canvas.calls,
        vec![
            Call::Cm(AffineMatrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0)),
            // corners scaled by the CTM: top-right then bottom-left
            Call::Re(Point::new(80.0, 120.0), Point::new(20.0, 40.0)),
        ]
    );
}

#[test]
fn test_q_restores_ctm_and_text_state() {
    let page = Page::new(HashMap::new());
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    interp.run(b"q 3 0 0 3 0 0 cm 2 Tc Q").unwrap();

    let state = interp.manager().current();
    assert_eq!(state.ctm, AffineMatrix::IDENTITY);
    assert_eq!(state.text.char_spacing, 0.0);
    assert_eq!(interp.manager().depth(), 1);
}

#[test]
fn test_form_xobject_replays_with_context_and_restores() {
    let form_content = b"BT /F2 10 Tf 0 0 Td (In) Tj ET".to_vec();
    let form_resources = dict(&[(
        "Font",
        Object::Dict(dict(&[("F2", simple_font_spec("TestSans"))])),
    )]);
    let form = StreamObject::new(
        dict(&[
            ("Subtype", Object::Name("Form".into())),
            ("Resources", Object::Dict(form_resources)),
            (
                "Matrix",
                Object::Array(vec![
                    Object::Int(1),
                    Object::Int(0),
                    Object::Int(0),
                    Object::Int(1),
                    Object::Int(50),
                    Object::Int(60),
                ]),
            ),
        ]),
        form_content,
    );
    let page = Page::new(dict(&[(
        "XObject",
        Object::Dict(dict(&[("X1", Object::Stream(Box::new(form)))])),
    )]));

    let mut canvas = TextCollector::new();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());
    interp.run(b"/X1 Do").unwrap();

    // State restored after the form replay.
    assert_eq!(interp.manager().depth(), 1);
    assert_eq!(interp.manager().current().ctm, AffineMatrix::IDENTITY);

    assert_eq!(canvas.spans().len(), 1);
    let span = &canvas.spans()[0];
    assert_eq!(span.text, "In");
    // The form matrix translated the text origin.
    assert_eq!(span.origin, Point::new(50.0, 60.0));
}

#[test]
fn test_self_referential_form_is_skipped() {
    let form = StreamObject::new(
        dict(&[("Subtype", Object::Name("Form".into()))]),
        b"/X1 Do".to_vec(),
    );
    let page = Page::new(dict(&[(
        "XObject",
        Object::Dict(dict(&[("X1", Object::Stream(Box::new(form)))])),
    )]));

    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    // Must terminate rather than recurse forever.
    interp.run(b"/X1 Do").unwrap();
    assert_eq!(canvas.calls, vec![Call::Do("X1".into())]);
}

#[test]
fn test_form_depth_bound() {
    // X1 invokes X2, X2 invokes X1: the cycle guard catches the repeat,
    // and a tight depth bound cuts even acyclic chains.
    let x1 = StreamObject::new(
        dict(&[("Subtype", Object::Name("Form".into()))]),
        b"/X2 Do".to_vec(),
    );
    let x2 = StreamObject::new(
        dict(&[("Subtype", Object::Name("Form".into()))]),
        b"/X1 Do".to_vec(),
    );
    let page = Page::new(dict(&[(
        "XObject",
        Object::Dict(dict(&[
            ("X1", Object::Stream(Box::new(x1))),
            ("X2", Object::Stream(Box::new(x2))),
        ])),
    )]));

    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services())
        .with_options(InterpreterOptions { max_form_depth: 4 });

    interp.run(b"/X1 Do").unwrap();
    assert_eq!(interp.manager().depth(), 1);
}

#[test]
fn test_quote_and_leading() {
    let page = page_with_f1();
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    interp
        .run(b"BT /F1 12 Tf 14 TL 0 100 Td (a) ' ET")
        .unwrap();

    // ' moved down one leading before showing.
    let tj = canvas
        .calls
        .iter()
        .find_map(|c| match c {
            Call::Tj(text, origin) => Some((text.clone(), *origin)),
            _ => None,
        })
        .expect("no Tj call");
    assert_eq!(tj.0, "a");
    assert_eq!(tj.1, Point::new(0.0, 86.0));
}

#[test]
fn test_text_positioning_outside_bt_fails() {
    let page = page_with_f1();
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    let err = interp.run(b"10 10 Td").unwrap_err();
    assert!(matches!(err, RenderError::OutsideTextObject("Td")));
}

#[test]
fn test_inline_image_reaches_canvas() {
    let page = Page::new(HashMap::new());
    let mut canvas = RecordingCanvas::default();
    let mut interp = Interpreter::new(&page, &mut canvas, test_services());

    interp.run(b"BI /W 2 /H 1 ID \xAA\xBB EI").unwrap();
    assert_eq!(canvas.calls, vec![Call::InlineImage(2)]);
}
