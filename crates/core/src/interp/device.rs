//! Canvas - output interface for content-stream execution.
//!
//! The interpreter delivers drawing calls with already-resolved geometry
//! and the live graphics state; a canvas renders, collects, or ignores
//! them. Every method defaults to a no-op so implementations override
//! only what they consume.

use crate::geometry::{AffineMatrix, Point};
use crate::model::objects::Object;
use crate::model::state::GraphicsState;
use std::collections::HashMap;

/// Rendering collaborator receiving semantic drawing calls.
#[allow(non_snake_case)]
pub trait Canvas {
    /// CTM changed; receives the updated matrix.
    fn command_cm(&mut self, _ctm: &AffineMatrix) {}

    /// Graphics state pushed.
    fn command_q(&mut self) {}

    /// Graphics state popped.
    fn command_Q(&mut self) {}

    /// Rectangle, as page-space corner points (top-right, bottom-left).
    fn command_re(&mut self, _top_right: Point, _bottom_left: Point) {}

    /// Text object begins.
    fn command_BT(&mut self) {}

    /// Text object ends.
    fn command_ET(&mut self) {}

    /// Non-stroking grayscale color.
    fn command_g(&mut self, _gray: f64) {}

    /// Text cursor moved to the next line at `offset`.
    fn command_Td(&mut self, _offset: Point) {}

    /// Text matrix set directly.
    fn command_Tm(&mut self, _matrix: &AffineMatrix) {}

    /// Text cursor moved down one leading.
    fn command_T_star(&mut self) {}

    /// Font selected; the state carries the handle and size.
    fn command_Tf(&mut self, _state: &GraphicsState) {}

    /// Decoded text shown. The state is live: positioning and metrics
    /// can be queried lazily.
    fn command_Tj(&mut self, _text: &str, _state: &GraphicsState) {}

    /// One `TJ` element: decoded text plus the adjustment that follows
    /// it in the array, if any.
    fn command_TJ(&mut self, _text: &str, _adjust: Option<f64>, _state: &GraphicsState) {}

    /// Named XObject invoked (a form begins replay, an image is drawn).
    fn command_do(&mut self, _name: &str) {}

    /// Inline image with its attribute pairs and raw data.
    fn command_bi(&mut self, _attributes: &HashMap<String, Object>, _data: &[u8]) {}
}

/// One shown text run with its page-space origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub origin: Point,
}

/// A canvas that collects decoded text runs; the built-in device for
/// text extraction and tests.
#[derive(Default)]
pub struct TextCollector {
    spans: Vec<TextSpan>,
}

impl TextCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    /// All collected text, in content-stream order.
    pub fn text(&self) -> String {
        self.spans
            .iter()
            .map(|span| span.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }

    fn push(&mut self, text: &str, state: &GraphicsState) {
        if text.is_empty() {
            return;
        }
        self.spans.push(TextSpan {
            text: text.to_string(),
            origin: state.text_origin().unwrap_or_default(),
        });
    }
}

#[allow(non_snake_case)]
impl Canvas for TextCollector {
    fn command_Tj(&mut self, text: &str, state: &GraphicsState) {
        self.push(text, state);
    }

    fn command_TJ(&mut self, text: &str, _adjust: Option<f64>, state: &GraphicsState) {
        self.push(text, state);
    }
}
