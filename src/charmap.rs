// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

/*!
Mapping characters to nominal glyph identifiers.
*/

use crate::font::FontRef;
use crate::internal::cmap::{self, MapVariant};
use crate::GlyphId;

/// Proxy for rematerializing a character map: selected subtable offset,
/// format, symbol flag, and the offset of the format 14 subtable if any.
#[derive(Copy, Clone, Default, Debug)]
pub struct CharmapProxy {
    subtable: u32,
    format: u8,
    is_symbol: bool,
    variants: u32,
}

impl CharmapProxy {
    /// Creates a character map proxy from the specified font.
    pub fn from_font(font: &FontRef) -> Self {
        let (subtable, format, is_symbol) =
            cmap::subtable(font).unwrap_or((0, 0, false));
        Self {
            subtable,
            format,
            is_symbol,
            variants: cmap::variant_subtable(font).unwrap_or(0),
        }
    }

    /// Materializes a character map from the specified font. This proxy
    /// must have been created from the same font.
    pub fn materialize<'a>(&self, font: &FontRef<'a>) -> Charmap<'a> {
        Charmap {
            data: font.data,
            proxy: *self,
        }
    }
}

/// Maps characters to nominal glyph identifiers.
#[derive(Copy, Clone)]
pub struct Charmap<'a> {
    data: &'a [u8],
    proxy: CharmapProxy,
}

impl<'a> Charmap<'a> {
    /// Creates a character map from the specified font.
    pub fn from_font(font: &FontRef<'a>) -> Self {
        CharmapProxy::from_font(font).materialize(font)
    }

    /// Returns the associated proxy.
    pub fn proxy(&self) -> CharmapProxy {
        self.proxy
    }

    /// Returns true if a usable mapping subtable was found.
    pub fn is_mapped(&self) -> bool {
        self.proxy.subtable != 0
    }

    /// Returns a nominal glyph identifier for the specified codepoint.
    /// Unmapped codepoints yield glyph zero.
    pub fn map(&self, codepoint: impl Into<u32>) -> GlyphId {
        let codepoint = codepoint.into();
        let proxy = &self.proxy;
        let glyph_id = cmap::map(self.data, proxy.subtable, proxy.format, codepoint)
            .unwrap_or(0);
        // Remap U+0000..=U+00FF to U+F000..=U+F0FF for symbol encodings.
        if glyph_id == 0 && proxy.is_symbol && codepoint <= 0x00FF {
            return cmap::map(self.data, proxy.subtable, proxy.format, codepoint + 0xF000)
                .unwrap_or(0);
        }
        glyph_id
    }

    /// Maps a codepoint modified by a variation selector. The format 14
    /// subtable is consulted only here; it never influences [`map`].
    ///
    /// [`map`]: Self::map
    pub fn map_variant(
        &self,
        codepoint: impl Into<u32>,
        variation_selector: impl Into<u32>,
    ) -> Option<MapVariant> {
        cmap::map_variant(
            self.data,
            self.proxy.variants,
            codepoint.into(),
            variation_selector.into(),
        )
    }

    /// Invokes the specified closure with all codepoint/glyph identifier
    /// pairs in the character map.
    pub fn enumerate(&self, f: impl FnMut(u32, GlyphId)) {
        cmap::enumerate(self.data, self.proxy.subtable, f);
    }
}
