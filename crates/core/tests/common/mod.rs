//! Shared test doubles for the external collaborators.
#![allow(dead_code)]

use caracas_core::error::{RenderError, Result};
use caracas_core::font::matcher::{FontFile, FontMatcher};
use caracas_core::font::program::{FontProgram, FontProgramLoader};
use caracas_core::font::FontServices;
use caracas_core::geometry::{AffineMatrix, Point};
use caracas_core::interp::device::Canvas;
use caracas_core::model::state::GraphicsState;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fixed-table font program: 1000 units per em, every glyph 500 wide.
pub struct FixedProgram;

impl FontProgram for FixedProgram {
    fn units_per_em(&self) -> f64 {
        1000.0
    }

    fn bbox(&self) -> [f64; 4] {
        [0.0, -200.0, 1000.0, 800.0]
    }

    fn glyph_id(&self, c: char) -> Option<u32> {
        Some(c as u32)
    }

    fn advance_width(&self, _gid: u32) -> Option<f64> {
        Some(500.0)
    }

    fn kerning(&self, _left: u32, _right: u32) -> Option<f64> {
        None
    }

    fn glyph_bbox(&self, _gid: u32) -> Option<[f64; 4]> {
        Some([0.0, 0.0, 500.0, 700.0])
    }
}

/// Loader that accepts anything and returns the fixed program.
pub struct FixedLoader;

impl FontProgramLoader for FixedLoader {
    fn load_bytes(&self, _data: &[u8]) -> Result<Arc<dyn FontProgram>> {
        Ok(Arc::new(FixedProgram))
    }

    fn load_file(&self, _path: &Path) -> Result<Arc<dyn FontProgram>> {
        Ok(Arc::new(FixedProgram))
    }
}

/// Loader that rejects everything, for resolution-failure tests.
pub struct RejectingLoader;

impl FontProgramLoader for RejectingLoader {
    fn load_bytes(&self, _data: &[u8]) -> Result<Arc<dyn FontProgram>> {
        Err(RenderError::UnsupportedFontFileFormat("embedded".into()))
    }

    fn load_file(&self, path: &Path) -> Result<Arc<dyn FontProgram>> {
        Err(RenderError::UnsupportedFontFileFormat(
            path.display().to_string(),
        ))
    }
}

/// Matcher returning a fixed regular/bold TrueType listing for any
/// family.
pub struct StaticMatcher;

impl FontMatcher for StaticMatcher {
    fn resolve_family(&self, family: &str) -> Result<Vec<FontFile>> {
        Ok(vec![
            FontFile {
                path: PathBuf::from(format!("/fonts/{family}-Regular.ttf")),
                family: family.to_string(),
                style: "Regular".to_string(),
            },
            FontFile {
                path: PathBuf::from(format!("/fonts/{family}-Bold.ttf")),
                family: family.to_string(),
                style: "Bold".to_string(),
            },
        ])
    }
}

/// Matcher that finds nothing.
pub struct EmptyMatcher;

impl FontMatcher for EmptyMatcher {
    fn resolve_family(&self, family: &str) -> Result<Vec<FontFile>> {
        Err(RenderError::FontMatcher {
            family: family.to_string(),
            msg: "no such family".into(),
        })
    }
}

pub fn test_services() -> FontServices {
    FontServices {
        loader: Arc::new(FixedLoader),
        matcher: Arc::new(StaticMatcher),
    }
}

/// A canvas call recorded by name with the data the test cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Cm(AffineMatrix),
    Q,
    QRestore,
    Re(Point, Point),
    Bt,
    Et,
    Gray(f64),
    Td(Point),
    Tm(AffineMatrix),
    TStar,
    Tf(String, f64),
    Tj(String, Point),
    TJ(String, Option<f64>),
    Do(String),
    InlineImage(usize),
}

/// Canvas double recording every call in order.
#[derive(Default)]
pub struct RecordingCanvas {
    pub calls: Vec<Call>,
}

#[allow(non_snake_case)]
impl Canvas for RecordingCanvas {
    fn command_cm(&mut self, ctm: &AffineMatrix) {
        self.calls.push(Call::Cm(*ctm));
    }

    fn command_q(&mut self) {
        self.calls.push(Call::Q);
    }

    fn command_Q(&mut self) {
        self.calls.push(Call::QRestore);
    }

    fn command_re(&mut self, top_right: Point, bottom_left: Point) {
        self.calls.push(Call::Re(top_right, bottom_left));
    }

    fn command_BT(&mut self) {
        self.calls.push(Call::Bt);
    }

    fn command_ET(&mut self) {
        self.calls.push(Call::Et);
    }

    fn command_g(&mut self, gray: f64) {
        self.calls.push(Call::Gray(gray));
    }

    fn command_Td(&mut self, offset: Point) {
        self.calls.push(Call::Td(offset));
    }

    fn command_Tm(&mut self, matrix: &AffineMatrix) {
        self.calls.push(Call::Tm(*matrix));
    }

    fn command_T_star(&mut self) {
        self.calls.push(Call::TStar);
    }

    fn command_Tf(&mut self, state: &GraphicsState) {
        let name = state
            .text
            .font
            .as_ref()
            .map(|f| f.base_font_name().to_string())
            .unwrap_or_default();
        self.calls.push(Call::Tf(name, state.text.font_size));
    }

    fn command_Tj(&mut self, text: &str, state: &GraphicsState) {
        let origin = state.text_origin().unwrap_or_default();
        self.calls.push(Call::Tj(text.to_string(), origin));
    }

    fn command_TJ(&mut self, text: &str, adjust: Option<f64>, _state: &GraphicsState) {
        self.calls.push(Call::TJ(text.to_string(), adjust));
    }

    fn command_do(&mut self, name: &str) {
        self.calls.push(Call::Do(name.to_string()));
    }

    fn command_bi(
        &mut self,
        _attributes: &std::collections::HashMap<String, caracas_core::model::objects::Object>,
        data: &[u8],
    ) {
        self.calls.push(Call::InlineImage(data.len()));
    }
}
