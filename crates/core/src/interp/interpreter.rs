//! Content-stream instruction dispatcher.
//!
//! Executes instructions in content-stream order against the graphics
//! state stack, emitting drawing calls to the canvas. Form XObjects are
//! replayed recursively under a saved state, never flattened into the
//! parent instruction list.

use crate::error::{RenderError, Result};
use crate::font::{Font, FontServices, builtin_fallback, load_font};
use crate::geometry::Point;
use crate::interp::device::Canvas;
use crate::model::objects::{Object, Resolver};
use crate::model::state::GraphicsManager;
use crate::page::{FormXObject, Page, lookup_resource};
use crate::parser::{Instruction, TextItem, parse_instructions};
use std::collections::HashMap;
use std::sync::Arc;

/// Execution limits.
#[derive(Debug, Clone)]
pub struct InterpreterOptions {
    /// Maximum Form XObject nesting depth; deeper invocations are
    /// skipped. Guards against pathological resource graphs.
    pub max_form_depth: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        Self { max_form_depth: 32 }
    }
}

/// Executes instructions for one page-rendering pass.
pub struct Interpreter<'a, C: Canvas> {
    page: &'a Page,
    canvas: &'a mut C,
    services: FontServices,
    resolver: Option<&'a dyn Resolver>,
    options: InterpreterOptions,
    manager: GraphicsManager,
    /// Fonts resolved so far, keyed by resource name.
    fontmap: HashMap<String, Arc<dyn Font>>,
    /// Names of forms currently being replayed.
    form_stack: Vec<String>,
}

impl<'a, C: Canvas> Interpreter<'a, C> {
    pub fn new(page: &'a Page, canvas: &'a mut C, services: FontServices) -> Self {
        Self {
            page,
            canvas,
            services,
            resolver: None,
            options: InterpreterOptions::default(),
            manager: GraphicsManager::new(),
            fontmap: HashMap::new(),
            form_stack: Vec::new(),
        }
    }

    pub fn with_resolver(mut self, resolver: &'a dyn Resolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_options(mut self, options: InterpreterOptions) -> Self {
        self.options = options;
        self
    }

    /// The live graphics state stack.
    pub fn manager(&self) -> &GraphicsManager {
        &self.manager
    }

    /// Parse and execute a full content stream.
    pub fn run(&mut self, content: &[u8]) -> Result<()> {
        let instructions = parse_instructions(content, self.resolver)?;
        self.execute(&instructions)
    }

    /// Execute instructions in order.
    pub fn execute(&mut self, instructions: &[Instruction]) -> Result<()> {
        for instruction in instructions {
            self.execute_instruction(instruction)?;
        }
        Ok(())
    }

    /// Execute one instruction: mutate state and/or call the canvas.
    pub fn execute_instruction(&mut self, instruction: &Instruction) -> Result<()> {
        match instruction {
            Instruction::SaveState => {
                self.manager.command_q();
                self.canvas.command_q();
            }
            Instruction::RestoreState => {
                self.manager.command_Q();
                self.canvas.command_Q();
            }
            Instruction::ConcatMatrix(m) => {
                self.manager.command_cm(*m);
                self.canvas.command_cm(&self.manager.current().ctm);
            }
            Instruction::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                let bottom_left = self.manager.resolve(Point::new(*x, *y));
                let top_right = self.manager.resolve(Point::new(x + width, y + height));
                self.canvas.command_re(top_right, bottom_left);
            }
            Instruction::BeginText => {
                self.manager.current_mut().command_BT();
                self.canvas.command_BT();
            }
            Instruction::EndText => {
                self.manager.current_mut().command_ET();
                self.canvas.command_ET();
            }
            Instruction::SetGray(gray) => {
                self.canvas.command_g(*gray);
            }
            Instruction::MoveText(offset) => {
                self.manager.current_mut().command_Td(*offset)?;
                self.canvas.command_Td(*offset);
            }
            Instruction::MoveTextSetLeading(offset) => {
                self.manager.current_mut().command_TD(*offset)?;
                self.canvas.command_Td(*offset);
            }
            Instruction::SetCharSpacing(v) => self.manager.current_mut().command_Tc(*v),
            Instruction::SetWordSpacing(v) => self.manager.current_mut().command_Tw(*v),
            Instruction::SetHorizontalScaling(v) => self.manager.current_mut().command_Tz(*v),
            Instruction::SetLeading(v) => self.manager.current_mut().command_TL(*v),
            Instruction::SetRenderingMode(v) => self.manager.current_mut().command_Tr(*v),
            Instruction::SetRise(v) => self.manager.current_mut().command_Ts(*v),
            Instruction::SetTextMatrix(m) => {
                self.manager.current_mut().command_Tm(*m)?;
                self.canvas.command_Tm(m);
            }
            Instruction::NextLine => {
                self.manager.current_mut().command_T_star()?;
                self.canvas.command_T_star();
            }
            Instruction::SelectFont { name, size } => {
                let font = self.lookup_font(name)?;
                self.manager.current_mut().command_Tf(font, *size);
                self.canvas.command_Tf(self.manager.current());
            }
            Instruction::ShowText(bytes) => {
                self.show_text(bytes)?;
            }
            Instruction::ShowTextAdjusted(items) => {
                self.show_text_adjusted(items)?;
            }
            Instruction::MoveShowText(bytes) => {
                self.manager.current_mut().command_T_star()?;
                self.canvas.command_T_star();
                self.show_text(bytes)?;
            }
            Instruction::MoveSetSpacingShowText {
                word_spacing,
                char_spacing,
                text,
            } => {
                self.manager.current_mut().command_T_star()?;
                self.canvas.command_T_star();
                self.manager.current_mut().command_Tw(*word_spacing);
                self.manager.current_mut().command_Tc(*char_spacing);
                self.show_text(text)?;
            }
            Instruction::InvokeXObject(name) => {
                self.invoke_xobject(name)?;
            }
            Instruction::InlineImage { attributes, data } => {
                self.canvas.command_bi(attributes, data);
            }
            Instruction::Inert(_) => {}
        }
        Ok(())
    }

    fn decode_active(&self, bytes: &[u8]) -> Result<String> {
        let state = self.manager.current();
        let font = state.text.font.as_ref().ok_or(RenderError::NoActiveFont)?;
        font.decode_text(bytes)
    }

    /// Advance the text cursor past each shown glyph.
    fn advance_glyphs(&mut self, decoded: &str) -> Result<()> {
        for ch in decoded.chars() {
            let advance = self.manager.current().glyph_advance(ch)?;
            self.manager
                .current_mut()
                .text_displace_x(advance, ch == ' ')?;
        }
        Ok(())
    }

    fn show_text(&mut self, bytes: &[u8]) -> Result<()> {
        let decoded = self.decode_active(bytes)?;
        self.canvas.command_Tj(&decoded, self.manager.current());
        self.advance_glyphs(&decoded)
    }

    fn show_text_adjusted(&mut self, items: &[TextItem]) -> Result<()> {
        let mut iter = items.iter().peekable();
        while let Some(item) = iter.next() {
            match item {
                TextItem::Text(bytes) => {
                    let decoded = self.decode_active(bytes)?;
                    // The canvas sees each run with the adjustment that
                    // follows it in the array.
                    let adjust = match iter.peek() {
                        Some(TextItem::Adjust(a)) => Some(*a),
                        _ => None,
                    };
                    self.canvas
                        .command_TJ(&decoded, adjust, self.manager.current());
                    self.advance_glyphs(&decoded)?;
                }
                TextItem::Adjust(amount) => {
                    // Adjustments are thousandths of text space, scaled
                    // by the font size, and move the cursor backwards
                    // when positive.
                    let size = self.manager.current().text.font_size;
                    self.manager
                        .current_mut()
                        .text_displace_x(-amount / 1000.0 * size, false)?;
                }
            }
        }
        Ok(())
    }

    fn lookup_font(&mut self, name: &str) -> Result<Arc<dyn Font>> {
        if let Some(font) = self.fontmap.get(name) {
            return Ok(font.clone());
        }

        let font = match self.font_resource(name) {
            Some(Object::Dict(dict)) => load_font(&dict, self.resolver, &self.services)?,
            Some(Object::Stream(stream)) => {
                load_font(&stream.attrs, self.resolver, &self.services)?
            }
            _ => builtin_fallback(name, &self.services)
                .ok_or_else(|| RenderError::FontNotFound(name.to_string()))?,
        };

        self.fontmap.insert(name.to_string(), font.clone());
        Ok(font)
    }

    /// Font lookup chain: form context, page, inherited ancestors.
    fn font_resource(&self, name: &str) -> Option<Object> {
        self.named_resource("Font", name)
    }

    fn named_resource(&self, category: &str, name: &str) -> Option<Object> {
        if let Some(context) = &self.manager.current().context
            && let Some(resources) = &context.resources
            && let Some(obj) = lookup_resource(resources, category, name, self.resolver)
        {
            return Some(obj);
        }
        if let Some(obj) = lookup_resource(&self.page.resources, category, name, self.resolver) {
            return Some(obj);
        }
        if let Some(inherited) = &self.page.inherited_resources
            && let Some(obj) = lookup_resource(inherited, category, name, self.resolver)
        {
            return Some(obj);
        }
        None
    }

    /// `Do`: replay a form under saved state, or draw an image.
    fn invoke_xobject(&mut self, name: &str) -> Result<()> {
        let Some(Object::Stream(stream)) = self.named_resource("XObject", name) else {
            tracing::debug!(name, "XObject not found, skipping");
            return Ok(());
        };

        if !FormXObject::is_form(&stream) {
            self.canvas.command_do(name);
            return Ok(());
        }

        if self.form_stack.iter().any(|n| n == name) {
            tracing::warn!(name, "skipping self-referential form XObject");
            return Ok(());
        }
        if self.form_stack.len() >= self.options.max_form_depth {
            tracing::warn!(
                name,
                depth = self.form_stack.len(),
                "form nesting too deep, skipping"
            );
            return Ok(());
        }

        let form = Arc::new(FormXObject::from_stream(&stream, self.resolver));
        let instructions = parse_instructions(&form.content, self.resolver)?;

        self.manager.command_q();
        self.manager.current_mut().set_context(form);
        self.canvas.command_do(name);
        self.form_stack.push(name.to_string());
        // Fonts resolved inside the form must not leak out: the form's
        // dictionary may reuse page font names.
        let saved_fonts = std::mem::take(&mut self.fontmap);

        let result = self.execute(&instructions);

        self.fontmap = saved_fonts;
        self.form_stack.pop();
        self.manager.command_Q();
        result
    }
}
