//! Data model: operand values and graphics/text state.

pub mod objects;
pub mod state;

pub use objects::{ObjRef, Object, Resolver, StreamObject};
pub use state::{GraphicsManager, GraphicsState, TextState};
