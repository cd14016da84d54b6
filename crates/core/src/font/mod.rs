//! Font abstraction and text decoding.
//!
//! A font resource resolves to the uniform [`Font`](face::Font)
//! capability; composite fonts decode through a [`CMap`](cmap::CMap),
//! simple fonts through byte widening or a Differences table.

pub mod cmap;
pub mod encoding;
pub mod face;
pub mod glyphlist;
pub mod matcher;
pub mod program;

pub use cmap::CMap;
pub use face::{
    BuiltInFont, CompositeFont, Font, FontServices, FontStyle, STANDARD_FONTS, SimpleFont,
    Type3Font, builtin_fallback, load_font,
};
pub use matcher::{FcFontMatcher, FontFile, FontMatcher};
pub use program::{FontProgram, FontProgramLoader};
