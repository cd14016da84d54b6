//! Instruction execution: dispatcher and canvas interface.

pub mod device;
pub mod interpreter;

pub use device::{Canvas, TextCollector, TextSpan};
pub use interpreter::{Interpreter, InterpreterOptions};
