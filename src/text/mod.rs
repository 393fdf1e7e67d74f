// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

/*!
Character properties and text segmentation.

Implements the UAX #29 grapheme cluster and word boundary rules over
codepoint sequences, enough to feed clusters to a shaper. The property
tables are compiled into sorted ranges and queried by binary search;
the segmenters themselves are table-free state machines.
*/

mod tables;

pub mod grapheme;
pub mod word;

pub use grapheme::{
    boundaries as grapheme_boundaries, count_graphemes, split_graphemes, GraphemeState, Graphemes,
};
pub use tables::{grapheme_break, is_extended_pictographic, word_break, GraphemeBreak, WordBreak};
pub use word::{boundaries as word_boundaries, split_words};

/// Extension trait exposing break properties on `char`.
pub trait Codepoint: Sized + Copy {
    /// Returns the grapheme cluster break property.
    fn grapheme_break(self) -> GraphemeBreak;

    /// Returns the word break property.
    fn word_break(self) -> WordBreak;

    /// Returns true for Extended_Pictographic codepoints.
    fn is_extended_pictographic(self) -> bool;
}

impl Codepoint for char {
    fn grapheme_break(self) -> GraphemeBreak {
        grapheme_break(self as u32)
    }

    fn word_break(self) -> WordBreak {
        word_break(self as u32)
    }

    fn is_extended_pictographic(self) -> bool {
        is_extended_pictographic(self as u32)
    }
}
