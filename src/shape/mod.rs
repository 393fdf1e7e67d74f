// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

/*!
Glyph buffer handoff for shaping layers.

This module carries the glyph-info sequence a shaper exchanges with the
AAT drivers. Substitution runs entirely here; positioning policy beyond
plain advance kerning belongs to the shaper on top.
*/

mod buffer;

pub mod aat;

pub use buffer::{Buffer, GlyphInfo, DELETED_GLYPH};
