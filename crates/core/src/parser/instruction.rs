//! Instruction construction and glued-operator recovery.
//!
//! Turns accumulated operand values plus a trailing bare operator token
//! into validated instructions. Operand counts are checked against the
//! registered grammar at construction, so the dispatcher can match on
//! typed variants without re-validating.

use crate::error::{RenderError, Result};
use crate::geometry::{AffineMatrix, Point};
use crate::model::objects::{Object, Resolver, resolve};
use crate::parser::operators::{Arity, Opcode, segment};
use std::collections::HashMap;

/// One element of a `TJ` show sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum TextItem {
    /// Horizontal adjustment in thousandths of text space.
    Adjust(f64),
    /// Raw string bytes to show.
    Text(Vec<u8>),
}

/// A validated content-stream instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// q
    SaveState,
    /// Q
    RestoreState,
    /// cm
    ConcatMatrix(AffineMatrix),
    /// re
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// BT
    BeginText,
    /// ET
    EndText,
    /// g
    SetGray(f64),
    /// Td
    MoveText(Point),
    /// TD
    MoveTextSetLeading(Point),
    /// Tc
    SetCharSpacing(f64),
    /// Tw
    SetWordSpacing(f64),
    /// Tz
    SetHorizontalScaling(f64),
    /// TL
    SetLeading(f64),
    /// Tr
    SetRenderingMode(i32),
    /// Ts
    SetRise(f64),
    /// Tm
    SetTextMatrix(AffineMatrix),
    /// T*
    NextLine,
    /// Tf
    SelectFont { name: String, size: f64 },
    /// Tj
    ShowText(Vec<u8>),
    /// TJ
    ShowTextAdjusted(Vec<TextItem>),
    /// '
    MoveShowText(Vec<u8>),
    /// "
    MoveSetSpacingShowText {
        word_spacing: f64,
        char_spacing: f64,
        text: Vec<u8>,
    },
    /// Do
    InvokeXObject(String),
    /// BI .. ID .. EI
    InlineImage {
        attributes: HashMap<String, Object>,
        data: Vec<u8>,
    },
    /// Recognized operator with no semantic action in this core.
    Inert(Opcode),
}

impl Instruction {
    /// The operator token this instruction was built from, for reporting.
    pub const fn operator(&self) -> &'static str {
        match self {
            Self::SaveState => "q",
            Self::RestoreState => "Q",
            Self::ConcatMatrix(_) => "cm",
            Self::Rectangle { .. } => "re",
            Self::BeginText => "BT",
            Self::EndText => "ET",
            Self::SetGray(_) => "g",
            Self::MoveText(_) => "Td",
            Self::MoveTextSetLeading(_) => "TD",
            Self::SetCharSpacing(_) => "Tc",
            Self::SetWordSpacing(_) => "Tw",
            Self::SetHorizontalScaling(_) => "Tz",
            Self::SetLeading(_) => "TL",
            Self::SetRenderingMode(_) => "Tr",
            Self::SetRise(_) => "Ts",
            Self::SetTextMatrix(_) => "Tm",
            Self::NextLine => "T*",
            Self::SelectFont { .. } => "Tf",
            Self::ShowText(_) => "Tj",
            Self::ShowTextAdjusted(_) => "TJ",
            Self::MoveShowText(_) => "'",
            Self::MoveSetSpacingShowText { .. } => "\"",
            Self::InvokeXObject(_) => "Do",
            Self::InlineImage { .. } => "BI",
            Self::Inert(op) => op.token(),
        }
    }

    /// Build one instruction from an operator and its operands.
    ///
    /// Fails with `MalformedInstruction` when the operand count does not
    /// match the operator's registered arity.
    pub fn from_operands(op: Opcode, operands: Vec<Object>) -> Result<Self> {
        if let Arity::Fixed(expected) = op.arity()
            && expected != operands.len()
        {
            return Err(RenderError::MalformedInstruction {
                operator: op.token(),
                expected,
                got: operands.len(),
            });
        }

        Ok(match op {
            Opcode::Qq => Self::SaveState,
            Opcode::Q => Self::RestoreState,
            Opcode::Cm => Self::ConcatMatrix(take_matrix(op, &operands)?),
            Opcode::Re => Self::Rectangle {
                x: take_num(op, &operands, 0)?,
                y: take_num(op, &operands, 1)?,
                width: take_num(op, &operands, 2)?,
                height: take_num(op, &operands, 3)?,
            },
            Opcode::BT => Self::BeginText,
            Opcode::ET => Self::EndText,
            Opcode::Gg => Self::SetGray(take_num(op, &operands, 0)?),
            Opcode::Td => Self::MoveText(take_point(op, &operands)?),
            Opcode::TD => Self::MoveTextSetLeading(take_point(op, &operands)?),
            Opcode::Tc => Self::SetCharSpacing(take_num(op, &operands, 0)?),
            Opcode::Tw => Self::SetWordSpacing(take_num(op, &operands, 0)?),
            Opcode::Tz => Self::SetHorizontalScaling(take_num(op, &operands, 0)?),
            Opcode::TL => Self::SetLeading(take_num(op, &operands, 0)?),
            Opcode::Tr => Self::SetRenderingMode(take_num(op, &operands, 0)? as i32),
            Opcode::Ts => Self::SetRise(take_num(op, &operands, 0)?),
            Opcode::Tm => Self::SetTextMatrix(take_matrix(op, &operands)?),
            Opcode::TStar => Self::NextLine,
            Opcode::Tf => Self::SelectFont {
                name: take_name(op, &operands, 0)?,
                size: take_num(op, &operands, 1)?,
            },
            Opcode::Tj => Self::ShowText(take_string(op, &operands, 0)?),
            Opcode::TJ => Self::ShowTextAdjusted(take_text_seq(op, &operands)?),
            Opcode::Quote => Self::MoveShowText(take_string(op, &operands, 0)?),
            Opcode::DoubleQuote => Self::MoveSetSpacingShowText {
                word_spacing: take_num(op, &operands, 0)?,
                char_spacing: take_num(op, &operands, 1)?,
                text: take_string(op, &operands, 2)?,
            },
            Opcode::Do => Self::InvokeXObject(take_name(op, &operands, 0)?),
            _ => Self::Inert(op),
        })
    }
}

fn operand<'a>(op: Opcode, operands: &'a [Object], index: usize) -> Result<&'a Object> {
    operands
        .get(index)
        .ok_or(RenderError::MalformedInstruction {
            operator: op.token(),
            expected: index + 1,
            got: operands.len(),
        })
}

fn take_num(op: Opcode, operands: &[Object], index: usize) -> Result<f64> {
    operand(op, operands, index)?.as_num()
}

fn take_name(op: Opcode, operands: &[Object], index: usize) -> Result<String> {
    Ok(operand(op, operands, index)?.as_name()?.to_string())
}

fn take_string(op: Opcode, operands: &[Object], index: usize) -> Result<Vec<u8>> {
    Ok(operand(op, operands, index)?.as_string()?.to_vec())
}

fn take_point(op: Opcode, operands: &[Object]) -> Result<Point> {
    Ok(Point::new(
        take_num(op, operands, 0)?,
        take_num(op, operands, 1)?,
    ))
}

fn take_matrix(op: Opcode, operands: &[Object]) -> Result<AffineMatrix> {
    Ok(AffineMatrix::new(
        take_num(op, operands, 0)?,
        take_num(op, operands, 1)?,
        take_num(op, operands, 2)?,
        take_num(op, operands, 3)?,
        take_num(op, operands, 4)?,
        take_num(op, operands, 5)?,
    ))
}

fn take_text_seq(op: Opcode, operands: &[Object]) -> Result<Vec<TextItem>> {
    let arr = operand(op, operands, 0)?.as_array()?;
    Ok(arr
        .iter()
        .filter_map(|item| match item {
            Object::Int(n) => Some(TextItem::Adjust(*n as f64)),
            Object::Real(n) => Some(TextItem::Adjust(*n)),
            Object::String(s) => Some(TextItem::Text(s.clone())),
            _ => None,
        })
        .collect())
}

/// Build one or more instructions from operands and a raw operator token.
///
/// The token may contain several operators glued together; recovery
/// segments it greedily and attaches all operands to the first segment.
/// Later segments must be nullary. Reference-like operands are unwrapped
/// through the resolver before storage.
pub fn build_instructions(
    token: &[u8],
    operands: Vec<Object>,
    resolver: Option<&dyn Resolver>,
) -> Result<Vec<Instruction>> {
    let opcodes = segment(token).ok_or_else(|| unknown_operator(token))?;

    let operands: Vec<Object> = operands
        .into_iter()
        .map(|o| resolve(o, resolver))
        .collect();

    // Operands belong to the first segment; later segments must be
    // nullary, which from_operands enforces.
    let mut operands = Some(operands);
    let mut out = Vec::with_capacity(opcodes.len());
    for op in opcodes {
        let args = operands.take().unwrap_or_default();
        out.push(Instruction::from_operands(op, args)?);
    }
    Ok(out)
}

/// Name the unparsed remainder of a token that failed segmentation.
fn unknown_operator(token: &[u8]) -> RenderError {
    // Report the suffix left over after greedily consuming known
    // operators, which is the part a reader needs to see.
    let mut pos = 0;
    'outer: while pos < token.len() {
        let longest = (token.len() - pos).min(3);
        for len in (1..=longest).rev() {
            if Opcode::from_token(&token[pos..pos + len]).is_some() {
                pos += len;
                continue 'outer;
            }
        }
        break;
    }
    let remainder = &token[pos..];
    let shown = if remainder.is_empty() { token } else { remainder };
    RenderError::UnknownOperator(String::from_utf8_lossy(shown).into_owned())
}
