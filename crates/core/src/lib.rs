//! caracas - PDF content-stream execution core.
//!
//! Turns a decoded page content stream into a tracked graphics/text
//! state plus a stream of semantic drawing calls delivered to a
//! [`Canvas`] collaborator. The outer document parser, the actual
//! rasterizer, and embedded font-program parsing are consumed through
//! narrow interfaces and live elsewhere.

pub mod error;
pub mod font;
pub mod geometry;
pub mod interp;
pub mod model;
pub mod page;
pub mod parser;

pub use error::{RenderError, Result};
pub use geometry::{AffineMatrix, Point};
pub use interp::device::{Canvas, TextCollector};
pub use interp::interpreter::{Interpreter, InterpreterOptions};
pub use model::state::{GraphicsManager, GraphicsState, TextState};
pub use parser::{ContentParser, Instruction, Opcode, parse_instructions};
