//! Graphics and text state.
//!
//! A [`GraphicsManager`] is an always-non-empty stack of
//! [`GraphicsState`] entries; the bottom entry is the page-level state.
//! Text state follows the PDF model: the text and text-line matrices
//! exist only between `BT` and `ET`, and every text-positioning operator
//! outside that window is a caller contract violation.

use crate::error::{RenderError, Result};
use crate::font::Font;
use crate::geometry::{AffineMatrix, Point};
use crate::page::FormXObject;
use std::sync::Arc;

/// Text-state parameters, copied by value on `q`.
#[derive(Clone)]
pub struct TextState {
    pub char_spacing: f64,
    pub word_spacing: f64,
    /// Horizontal scaling, in percent (100 = normal).
    pub horizontal_scaling: f64,
    pub leading: f64,
    pub font: Option<Arc<dyn Font>>,
    pub font_size: f64,
    pub rendering_mode: i32,
    pub rise: f64,
    /// Present only between BT and ET.
    pub text_matrix: Option<AffineMatrix>,
    /// Present only between BT and ET.
    pub text_line_matrix: Option<AffineMatrix>,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            leading: 0.0,
            font: None,
            font_size: 0.0,
            rendering_mode: 0,
            rise: 0.0,
            text_matrix: None,
            text_line_matrix: None,
        }
    }
}

/// One entry in the graphics state stack.
#[derive(Clone, Default)]
pub struct GraphicsState {
    /// Current transformation matrix.
    pub ctm: AffineMatrix,
    /// Enclosing Form XObject, used to scope resource lookup.
    pub context: Option<Arc<FormXObject>>,
    pub text: TextState,
}

#[allow(non_snake_case)]
impl GraphicsState {
    /// Prepend a matrix to the CTM (`cm`).
    pub fn command_cm(&mut self, m: AffineMatrix) {
        self.ctm = m * self.ctm;
    }

    /// Enter a text object (`BT`): both text matrices become identity.
    pub fn command_BT(&mut self) {
        self.text.text_matrix = Some(AffineMatrix::IDENTITY);
        self.text.text_line_matrix = Some(AffineMatrix::IDENTITY);
    }

    /// Leave a text object (`ET`): both text matrices are cleared.
    pub fn command_ET(&mut self) {
        self.text.text_matrix = None;
        self.text.text_line_matrix = None;
    }

    /// Move to the start of the next line (`Td`).
    pub fn command_Td(&mut self, offset: Point) -> Result<()> {
        let line = self
            .text
            .text_line_matrix
            .ok_or(RenderError::OutsideTextObject("Td"))?;
        let moved = AffineMatrix::translation(offset.x, offset.y) * line;
        self.text.text_line_matrix = Some(moved);
        self.text.text_matrix = Some(moved);
        Ok(())
    }

    /// `TD`: set leading to `-y`, then move as `Td`.
    pub fn command_TD(&mut self, offset: Point) -> Result<()> {
        self.command_TL(-offset.y);
        self.command_Td(offset)
    }

    /// `T*`: move to the next line using the current leading.
    pub fn command_T_star(&mut self) -> Result<()> {
        self.command_Td(Point::new(0.0, -self.text.leading))
    }

    /// `Tm`: set both text matrices directly, no composition.
    pub fn command_Tm(&mut self, m: AffineMatrix) -> Result<()> {
        if self.text.text_matrix.is_none() {
            return Err(RenderError::OutsideTextObject("Tm"));
        }
        self.text.text_matrix = Some(m);
        self.text.text_line_matrix = Some(m);
        Ok(())
    }

    pub fn command_Tc(&mut self, char_spacing: f64) {
        self.text.char_spacing = char_spacing;
    }

    pub fn command_Tw(&mut self, word_spacing: f64) {
        self.text.word_spacing = word_spacing;
    }

    pub fn command_Tz(&mut self, scaling: f64) {
        self.text.horizontal_scaling = scaling;
    }

    pub fn command_TL(&mut self, leading: f64) {
        self.text.leading = leading;
    }

    pub fn command_Tr(&mut self, mode: i32) {
        self.text.rendering_mode = mode;
    }

    pub fn command_Ts(&mut self, rise: f64) {
        self.text.rise = rise;
    }

    /// `Tf`: set the active font handle and size.
    pub fn command_Tf(&mut self, font: Arc<dyn Font>, size: f64) {
        self.text.font = Some(font);
        self.text.font_size = size;
    }

    /// Displace the text cursor horizontally by `amount` text-space
    /// units.
    ///
    /// The amount is combined with character spacing (and word spacing
    /// at word boundaries), scaled by the horizontal scaling percentage,
    /// projected through the text matrix as a direction vector, and
    /// accumulated into the matrix's translation column.
    pub fn text_displace_x(&mut self, amount: f64, word_boundary: bool) -> Result<()> {
        let word = if word_boundary {
            self.text.word_spacing
        } else {
            0.0
        };
        let scaled =
            (amount + self.text.char_spacing + word) * self.text.horizontal_scaling / 100.0;

        let Some(m) = self.text.text_matrix.as_mut() else {
            return Err(RenderError::OutsideTextObject("text displacement"));
        };
        let v = m.transform(Point::new(scaled, 0.0), true);
        m.e += v.x;
        m.f += v.y;
        Ok(())
    }

    /// Install a Form XObject as the active resource scope, applying its
    /// matrix via the `cm` rule when it declares one.
    pub fn set_context(&mut self, form: Arc<FormXObject>) {
        if let Some(m) = form.matrix {
            self.command_cm(m);
        }
        self.context = Some(form);
    }

    /// Convert a point in current user space to page default space.
    pub fn resolve(&self, p: Point) -> Point {
        self.ctm.transform(p, false)
    }

    /// The text origin in page space: the translation of text matrix
    /// composed with the CTM.
    pub fn text_origin(&self) -> Result<Point> {
        let tm = self
            .text
            .text_matrix
            .ok_or(RenderError::OutsideTextObject("text origin"))?;
        Ok((tm * self.ctm).origin())
    }

    fn active_font(&self) -> Result<&Arc<dyn Font>> {
        self.text.font.as_ref().ok_or(RenderError::NoActiveFont)
    }

    /// Scaled advance width for a character, in text-space units.
    ///
    /// Falls back to half the font size when the font has no metric for
    /// the glyph.
    pub fn glyph_advance(&self, c: char) -> Result<f64> {
        let font = self.active_font()?;
        let per_em = font.units_per_em()?;
        match font.glyph_advance(c)? {
            Some(advance) => Ok(advance * self.text.font_size / per_em),
            None => Ok(self.text.font_size / 2.0),
        }
    }

    /// Scaled kerning between a character pair; 0 when absent.
    pub fn glyph_kerning(&self, first: char, second: char) -> Result<f64> {
        let font = self.active_font()?;
        let per_em = font.units_per_em()?;
        Ok(font.glyph_kerning(first, second)? * self.text.font_size / per_em)
    }

    /// Scaled bounding box for a character as (bottom-left, top-right).
    ///
    /// Falls back to the font-wide box when the glyph has no outline.
    pub fn glyph_bbox(&self, c: char) -> Result<(Point, Point)> {
        let font = self.active_font()?;
        let per_em = font.units_per_em()?;
        let scale = self.text.font_size / per_em;
        match font.glyph_bbox(c)? {
            Some([x0, y0, x1, y1]) => Ok((
                Point::new(x0 * scale, y0 * scale),
                Point::new(x1 * scale, y1 * scale),
            )),
            None => self.font_bbox(),
        }
    }

    /// Scaled font-wide bounding box as (bottom-left, top-right).
    pub fn font_bbox(&self) -> Result<(Point, Point)> {
        let font = self.active_font()?;
        let per_em = font.units_per_em()?;
        let scale = self.text.font_size / per_em;
        let [x0, y0, x1, y1] = font.bbox()?;
        Ok((
            Point::new(x0 * scale, y0 * scale),
            Point::new(x1 * scale, y1 * scale),
        ))
    }
}

/// Always-non-empty stack of graphics states.
pub struct GraphicsManager {
    states: Vec<GraphicsState>,
}

impl Default for GraphicsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(non_snake_case)]
impl GraphicsManager {
    /// A manager with one page-level state and identity CTM.
    pub fn new() -> Self {
        Self {
            states: vec![GraphicsState::default()],
        }
    }

    /// `q`: push a copy of the current state.
    pub fn command_q(&mut self) {
        let top = self.current().clone();
        self.states.push(top);
    }

    /// `Q`: pop. Popping the sole remaining state is a no-op.
    pub fn command_Q(&mut self) {
        if self.states.len() > 1 {
            self.states.pop();
        }
    }

    /// `cm` applied to the current state.
    pub fn command_cm(&mut self, m: AffineMatrix) {
        self.current_mut().command_cm(m);
    }

    pub fn current(&self) -> &GraphicsState {
        self.states.last().expect("state stack is never empty")
    }

    pub fn current_mut(&mut self) -> &mut GraphicsState {
        self.states.last_mut().expect("state stack is never empty")
    }

    /// Convert a point through the current CTM.
    pub fn resolve(&self, p: Point) -> Point {
        self.current().resolve(p)
    }

    /// Stack depth, page-level state included.
    pub fn depth(&self) -> usize {
        self.states.len()
    }
}
