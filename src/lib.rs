// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

/*!
Font parsing and introspection.

Gavea decodes SFNT (TrueType and OpenType) and WOFF2 font files and
exposes the data a text stack needs on top of them: character to glyph
mapping, horizontal and vertical metrics, glyph outlines for both
TrueType and CFF flavors, variable font deltas, OpenType layout
structure, AAT metamorphosis, and UAX #29 text segmentation for feeding
a shaper.

The entry point is [`Face`], which owns a font buffer and caches decoded
tables. [`FontRef`] is the borrowed, zero-copy view the decoders operate
on.

Rasterization, hinting execution and shaping policy live in higher
layers.
*/

#![allow(clippy::float_cmp)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]

#[macro_use]
mod macros;

mod attributes;
mod charmap;
mod error;
mod face;
mod font;
mod internal;
mod metrics;
mod outline;
mod setting;
mod strings;
mod tag;
mod variation;

pub mod shape;
pub mod text;
pub mod woff2;

pub use attributes::{Attributes, Stretch, Style, Weight};
pub use charmap::Charmap;
pub use error::Error;
pub use face::{Face, FaceOptions, TableLoading};
pub use font::{FontDataRef, FontDirectory, FontRef, TableRecord};
pub use metrics::{EmbeddingPermission, GlyphMetrics, Metrics};
pub use outline::{Bounds, Contour, Outline, Point};
pub use setting::Setting;
pub use strings::{LocalizedString, StringId};
pub use tag::{tag_from_bytes, tag_from_str_lossy, DisplayTag, Tag};
pub use variation::{Instance, Variation};

/// Decoded OpenType layout structure, exposed for a shaping layer.
pub mod layout {
    pub use crate::internal::at::{
        Anchor, ClassDef, ClassPairAdjust, Coverage, CursiveAttach, FeatureRecord, Gdef,
        GposLookup, GposSubtable, GsubLookup, GsubSubtable, LangSys, LayoutTable, LigatureSubst,
        LookupFlags, MarkAttach, PairAdjust, ScriptRecord, SequenceSubst, SingleValues,
        ValueRecord,
    };
}

/// Apple advanced typography structures: metamorphosis chains, kerning
/// state machines, tracking and feature names.
pub mod aat {
    pub use crate::internal::aat::{
        feat, kern, kerx, language_index, lookup, morx, trak, Entry, ExtendedStateTable,
        StateTable,
    };
}

/// Baseline and mathematical typesetting tables.
pub mod baseline {
    pub use crate::internal::base::{Base, BaseAxis, BaseScript, Math};
}

/// Bitmap strike surfaces.
pub mod bitmap {
    pub use crate::internal::strike::{Cblc, Sbix, Strike};
}

/// Color palettes, layered outlines and SVG documents.
pub mod color {
    pub use crate::internal::color::{Color, Colr, Cpal, Layer, Layers, Svg};
}

/// Collection of various iterators over metadata contained in a font.
pub mod iter {
    pub use crate::strings::LocalizedStrings;
    pub use crate::variation::{Instances, Variations};
}

/// Glyph identifier. Zero is always the missing glyph.
pub type GlyphId = u16;

/// Normalized variation coordinate in 2.14 fixed point format.
pub type NormalizedCoord = i16;

/// Result alias for face-level operations.
pub type Result<T> = core::result::Result<T, Error>;
