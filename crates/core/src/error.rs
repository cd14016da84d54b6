//! Error types for the caracas content-stream core.

use thiserror::Error;

/// Primary error type for content-stream execution.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("operand count mismatch for {operator}: expected {expected}, got {got}")]
    MalformedInstruction {
        operator: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("no operator given for {0} trailing operand(s)")]
    DanglingOperands(usize),

    #[error("invalid token at position {pos}: {msg}")]
    Syntax { pos: usize, msg: String },

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("unsupported CMap ordering for {0}")]
    UnsupportedCMap(String),

    #[error("no codespace range matches code bytes at offset {offset}")]
    UndecodableByteSequence { offset: usize },

    #[error("unknown glyph name: {0}")]
    UnknownGlyph(String),

    #[error("cannot resolve a font file for {0}")]
    FontResolution(String),

    #[error("font resource not found: {0}")]
    FontNotFound(String),

    #[error("text-show operator with no active font")]
    NoActiveFont,

    #[error("{0} used outside a BT..ET text object")]
    OutsideTextObject(&'static str),

    #[error("unsupported font file format: {0}")]
    UnsupportedFontFileFormat(String),

    #[error("font matcher failed for {family}: {msg}")]
    FontMatcher { family: String, msg: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias for RenderError.
pub type Result<T> = std::result::Result<T, RenderError>;
