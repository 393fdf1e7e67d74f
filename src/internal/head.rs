//! Font header tables.

use super::{raw_tag, Bytes, RawFont, RawTag};

pub const HEAD: RawTag = raw_tag(b"head");
pub const OS_2: RawTag = raw_tag(b"OS/2");
pub const POST: RawTag = raw_tag(b"post");
pub const MAXP: RawTag = raw_tag(b"maxp");
pub const HHEA: RawTag = raw_tag(b"hhea");
pub const VHEA: RawTag = raw_tag(b"vhea");

/// Font header table.
#[derive(Copy, Clone)]
pub struct Head<'a>(Bytes<'a>);

impl<'a> Head<'a> {
    /// The expected value of the 'magic' field in the header table.
    pub const MAGIC: u32 = 0x5F0F3CF5;

    /// Creates a font header table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates a font header table from the specified font.
    /// Returns `None` if the font does not contain a `head` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(HEAD)?))
    }

    /// Checks the magic number and the units per em range. Used when the
    /// face is constructed; individual accessors stay infallible.
    pub fn validate(&self) -> Option<()> {
        if self.magic() != Self::MAGIC {
            return None;
        }
        let upem = self.units_per_em();
        if !(16..=16384).contains(&upem) {
            return None;
        }
        if self.index_to_location_format() > 1 {
            return None;
        }
        Some(())
    }

    /// Returns a revision value. Set by font manufacturer.
    pub fn revision(&self) -> u32 {
        self.0.read_or_default(4)
    }

    /// Returns a magic number for validation. Set to 0x5F0F3CF5.
    pub fn magic(&self) -> u32 {
        self.0.read_or_default(12)
    }

    /// Returns a set of header bit flags.
    pub fn flags(&self) -> u16 {
        self.0.read_or_default(16)
    }

    /// Returns the design units per em. Valid values are 16..=16384.
    pub fn units_per_em(&self) -> u16 {
        self.0.read_or_default(18)
    }

    /// Returns the union of all glyph bounding boxes as
    /// `[(x_min, y_min), (x_max, y_max)]`.
    pub fn bounds(&self) -> [(i16, i16); 2] {
        [
            (self.0.read_or_default(36), self.0.read_or_default(38)),
            (self.0.read_or_default(40), self.0.read_or_default(42)),
        ]
    }

    /// Returns the mac style bit flags.
    /// - 0: Bold
    /// - 1: Italic
    /// - 2: Underline
    /// - 3: Outline
    /// - 4: Shadow
    /// - 5: Condensed
    /// - 6: Extended
    pub fn mac_style(&self) -> u16 {
        self.0.read_or_default(44)
    }

    /// Returns the smallest readable size in pixels.
    pub fn lowest_recommended_ppem(&self) -> u16 {
        self.0.read_or_default(46)
    }

    /// Returns the format of the offset array in the `loca` table.
    /// - 0: 16-bit offsets (divided by 2)
    /// - 1: 32-bit offsets
    pub fn index_to_location_format(&self) -> u16 {
        self.0.read_or_default(50)
    }
}

/// Maximum profile table.
#[derive(Copy, Clone)]
pub struct Maxp<'a>(Bytes<'a>);

impl<'a> Maxp<'a> {
    /// Creates a maximum profile table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates a maximum profile table from the specified font.
    /// Returns `None` if the font does not contain a `maxp` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(MAXP)?))
    }

    /// Returns the version of the table.
    /// - 0x00005000: Version 0.5 - only `glyph_count` is meaningful.
    /// - 0x00010000: Version 1.0
    pub fn version(&self) -> u32 {
        self.0.read_or_default(0)
    }

    /// Returns the authoritative number of glyphs in the font.
    pub fn glyph_count(&self) -> u16 {
        self.0.read_or_default(4)
    }

    /// Returns true if the 'max_' methods will return meaningful values--
    /// specifically, if the table version is 1.0 (0x00010000).
    pub fn is_truetype(&self) -> bool {
        self.version() == 0x00010000
    }

    /// Returns the maximum points in a simple glyph.
    pub fn max_points(&self) -> u16 {
        self.0.read_or_default(6)
    }

    /// Returns the maximum contours in a simple glyph.
    pub fn max_contours(&self) -> u16 {
        self.0.read_or_default(8)
    }

    /// Returns the maximum number of components for a single composite
    /// glyph.
    pub fn max_component_elements(&self) -> u16 {
        self.0.read_or_default(28)
    }

    /// Returns the maximum nesting level for any composite glyph.
    pub fn max_component_depth(&self) -> u16 {
        self.0.read_or_default(30)
    }
}

/// Embedding permission from the OS/2 fsType field, reduced to the most
/// restrictive applicable level.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum EmbeddingPermission {
    /// No embedding restrictions.
    #[default]
    Installable,
    /// Must not be modified, embedded or exchanged without permission.
    Restricted,
    /// May be embedded for preview and print only.
    Preview,
    /// May be embedded in editable documents.
    Editable,
}

/// OS/2 and Windows metrics table.
#[derive(Copy, Clone)]
pub struct Os2<'a>(Bytes<'a>);

impl<'a> Os2<'a> {
    /// Creates an OS/2 table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates an OS/2 table from the specified font.
    /// Returns `None` if the font does not contain an `OS/2` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(OS_2)?))
    }

    /// Returns the version number for the OS/2 table: 0x0000 to 0x0005.
    pub fn version(&self) -> u16 {
        self.0.read_or_default(0)
    }

    /// Returns the average advance width of all non-zero width glyphs.
    pub fn average_char_width(&self) -> i16 {
        self.0.read_or_default(2)
    }

    /// Returns the visual weight class on a scale from 1 to 1000.
    pub fn weight_class(&self) -> u16 {
        self.0.read_or_default(4)
    }

    /// Returns the visual width class from 1 (ultra-condensed) to
    /// 9 (ultra-expanded).
    pub fn width_class(&self) -> u16 {
        self.0.read_or_default(6)
    }

    /// Returns the raw font type bit flags.
    pub fn type_flags(&self) -> u16 {
        self.0.read_or_default(8)
    }

    /// Returns the embedding permission derived from the type flags.
    pub fn embedding_permission(&self) -> EmbeddingPermission {
        match self.type_flags() & 0xF {
            0x2 => EmbeddingPermission::Restricted,
            0x4 => EmbeddingPermission::Preview,
            0x8 => EmbeddingPermission::Editable,
            _ => EmbeddingPermission::Installable,
        }
    }

    /// Returns the suggested position of the top of the strikeout stroke
    /// from the baseline.
    pub fn strikeout_position(&self) -> i16 {
        self.0.read_or_default(28)
    }

    /// Returns the suggested thickness for the strikeout stroke.
    pub fn strikeout_size(&self) -> i16 {
        self.0.read_or_default(26)
    }

    /// Returns a 128-bit value describing the Unicode blocks supported by
    /// the font.
    pub fn unicode_range(&self) -> (u32, u32, u32, u32) {
        (
            self.0.read_or_default(42),
            self.0.read_or_default(46),
            self.0.read_or_default(50),
            self.0.read_or_default(54),
        )
    }

    /// Returns the font selection bit flags.
    pub fn selection_flags(&self) -> SelectionFlags {
        SelectionFlags(self.0.read_or_default(62))
    }

    /// Returns the typographic ascender.
    pub fn typographic_ascender(&self) -> i16 {
        self.0.read_or_default(68)
    }

    /// Returns the typographic descender.
    pub fn typographic_descender(&self) -> i16 {
        self.0.read_or_default(70)
    }

    /// Returns the typographic line gap.
    pub fn typographic_line_gap(&self) -> i16 {
        self.0.read_or_default(72)
    }

    /// Returns a Windows specific value that defines the upper extent of
    /// the clipping region.
    pub fn win_ascent(&self) -> u16 {
        self.0.read_or_default(74)
    }

    /// Returns a Windows specific value that defines the lower extent of
    /// the clipping region.
    pub fn win_descent(&self) -> u16 {
        self.0.read_or_default(76)
    }

    /// Returns Windows specific code page ranges supported by the font.
    /// (table version >= 1)
    pub fn code_page_range(&self) -> (u32, u32) {
        if self.version() < 1 {
            return (0, 0);
        }
        (self.0.read_or_default(78), self.0.read_or_default(82))
    }

    /// Returns the approximate distance above the baseline for
    /// non-descending lowercase letters. (table version >= 2)
    pub fn x_height(&self) -> i16 {
        if self.version() < 2 {
            return 0;
        }
        self.0.read_or_default(86)
    }

    /// Returns the approximate distance above the baseline for uppercase
    /// letters. (table version >= 2)
    pub fn cap_height(&self) -> i16 {
        if self.version() < 2 {
            return 0;
        }
        self.0.read_or_default(88)
    }

    /// Returns a Unicode codepoint for the default character to use if a
    /// requested character is not supported by the font. (table version >= 2)
    pub fn default_char(&self) -> u16 {
        if self.version() < 2 {
            return 0;
        }
        self.0.read_or_default(90)
    }

    /// Returns a Unicode codepoint for the default character used to
    /// separate words and justify text. (table version >= 2)
    pub fn break_char(&self) -> u16 {
        if self.version() < 2 {
            return 0;
        }
        self.0.read_or_default(92)
    }

    /// Returns the maximum length of a target glyph context for any
    /// feature in the font. (table version >= 2)
    pub fn max_context(&self) -> u16 {
        if self.version() < 2 {
            return 0;
        }
        self.0.read_or_default(94)
    }

    /// Returns the optical size range for which the font was designed, in
    /// TWIPs. (table version >= 5)
    pub fn optical_size_range(&self) -> (u16, u16) {
        if self.version() < 5 {
            return (0, 0);
        }
        (self.0.read_or_default(96), self.0.read_or_default(98))
    }
}

/// OS/2 selection flags.
#[derive(Copy, Clone)]
pub struct SelectionFlags(pub u16);

impl SelectionFlags {
    /// Font contains italic glyphs.
    pub fn italic(self) -> bool {
        self.bit(0)
    }

    /// Glyphs are emboldened.
    pub fn bold(self) -> bool {
        self.bit(5)
    }

    /// Glyphs are in the standard weight/style for the font.
    pub fn regular(self) -> bool {
        self.bit(6)
    }

    /// Typographic metrics are recommended for default line spacing.
    pub fn use_typographic_metrics(self) -> bool {
        self.bit(7)
    }

    /// Font contains oblique glyphs.
    pub fn oblique(self) -> bool {
        self.bit(9)
    }

    fn bit(self, bit: u16) -> bool {
        self.0 & 1 << bit != 0
    }
}

/// PostScript table.
#[derive(Copy, Clone)]
pub struct Post<'a>(Bytes<'a>);

impl<'a> Post<'a> {
    /// Creates a PostScript table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates a PostScript table from the specified font.
    /// Returns `None` if the font does not contain a `post` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(POST)?))
    }

    /// Returns the version of the PostScript table.
    pub fn version(&self) -> u32 {
        self.0.read_or_default(0)
    }

    /// Returns the italic angle in counter-clockwise degrees from the
    /// vertical, in 16.16 fixed point.
    pub fn italic_angle(&self) -> i32 {
        self.0.read_or_default(4)
    }

    /// Returns the suggested position of the top of the underline stroke
    /// from the baseline.
    pub fn underline_position(&self) -> i16 {
        self.0.read_or_default(8)
    }

    /// Returns the suggested thickness for the underline stroke.
    pub fn underline_size(&self) -> i16 {
        self.0.read_or_default(10)
    }

    /// Returns true if the font is not proportionally spaced.
    pub fn is_fixed_pitch(&self) -> bool {
        self.0.read_or_default::<u32>(12) != 0
    }

    /// Returns true if the table can provide glyph names. Only versions
    /// 1.0 (0x00010000) and 2.0 (0x00020000).
    pub fn has_names(&self) -> bool {
        let v = self.version();
        v == 0x10000 || v == 0x20000
    }

    /// Returns the name of the specified glyph id if available.
    pub fn name(&self, glyph_id: u16) -> Option<&'a str> {
        match self.version() {
            0x10000 => DEFAULT_GLYPH_NAMES.get(glyph_id as usize).copied(),
            0x20000 => {
                let b = &self.0;
                let count = b.read::<u16>(32)?;
                if glyph_id >= count {
                    return None;
                }
                let mut index = b.read::<u16>(34 + glyph_id as usize * 2)? as usize;
                if index < 258 {
                    return Some(DEFAULT_GLYPH_NAMES[index]);
                }
                index -= 258;
                // Pascal strings; walk to the requested one.
                let mut base = 34 + count as usize * 2;
                for _ in 0..index {
                    let len = b.read_u8(base)? as usize;
                    base += len + 1;
                }
                let len = b.read_u8(base)? as usize;
                core::str::from_utf8(b.read_bytes(base + 1, len)?).ok()
            }
            _ => None,
        }
    }
}

/// Horizontal header table.
#[derive(Copy, Clone)]
pub struct Hhea<'a>(Bytes<'a>);

impl<'a> Hhea<'a> {
    /// Creates a horizontal header table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates a horizontal header table from the specified font.
    /// Returns `None` if the font does not contain an `hhea` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(HHEA)?))
    }

    /// Returns the typographic ascender.
    pub fn ascender(&self) -> i16 {
        self.0.read_or_default(4)
    }

    /// Returns the typographic descender.
    pub fn descender(&self) -> i16 {
        self.0.read_or_default(6)
    }

    /// Returns the typographic line gap.
    pub fn line_gap(&self) -> i16 {
        self.0.read_or_default(8)
    }

    /// Returns the maximum advance width.
    pub fn max_advance(&self) -> u16 {
        self.0.read_or_default(10)
    }

    /// Returns the minimum left sidebearing.
    pub fn min_lsb(&self) -> i16 {
        self.0.read_or_default(12)
    }

    /// Returns the slope of the cursor in the form (rise, run).
    pub fn caret_slope(&self) -> (i16, i16) {
        (self.0.read_or_default(18), self.0.read_or_default(20))
    }

    /// Returns the amount by which a slanted highlight on a glyph should
    /// be shifted.
    pub fn caret_offset(&self) -> i16 {
        self.0.read_or_default(22)
    }

    /// Returns the number of "long" metric entries in the horizontal
    /// metrics table.
    pub fn num_long_metrics(&self) -> u16 {
        self.0.read_or_default(34)
    }
}

/// Vertical header table.
#[derive(Copy, Clone)]
pub struct Vhea<'a>(Bytes<'a>);

impl<'a> Vhea<'a> {
    /// Creates a vertical header table wrapping the specified data.
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Creates a vertical header table from the specified font.
    /// Returns `None` if the font does not contain a `vhea` table.
    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(VHEA)?))
    }

    /// Returns the distance in design units from the centerline to the
    /// previous line's descent.
    pub fn ascender(&self) -> i16 {
        self.0.read_or_default(4)
    }

    /// Returns the distance in design units from the centerline to the
    /// next line's ascent.
    pub fn descender(&self) -> i16 {
        self.0.read_or_default(6)
    }

    /// Recommended additional spacing between columns of vertical text.
    pub fn line_gap(&self) -> i16 {
        self.0.read_or_default(8)
    }

    /// Returns the maximum advance height.
    pub fn max_advance(&self) -> u16 {
        self.0.read_or_default(10)
    }

    /// Returns the number of "long" metric entries in the vertical
    /// metrics table.
    pub fn num_long_metrics(&self) -> u16 {
        self.0.read_or_default(34)
    }
}

#[rustfmt::skip]
const DEFAULT_GLYPH_NAMES: [&str; 258] = [
    ".notdef", ".null", "nonmarkingreturn", "space", "exclam", "quotedbl", "numbersign", "dollar",
    "percent", "ampersand", "quotesingle", "parenleft", "parenright", "asterisk", "plus", "comma",
    "hyphen", "period", "slash", "zero", "one", "two", "three", "four", "five", "six", "seven",
    "eight", "nine", "colon", "semicolon", "less", "equal", "greater", "question", "at", "A", "B",
    "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "U",
    "V", "W", "X", "Y", "Z", "bracketleft", "backslash", "bracketright", "asciicircum",
    "underscore", "grave", "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n",
    "o", "p", "q", "r", "s", "t", "u", "v", "w", "x", "y", "z", "braceleft", "bar", "braceright",
    "asciitilde", "Adieresis", "Aring", "Ccedilla", "Eacute", "Ntilde", "Odieresis", "Udieresis",
    "aacute", "agrave", "acircumflex", "adieresis", "atilde", "aring", "ccedilla", "eacute",
    "egrave", "ecircumflex", "edieresis", "iacute", "igrave", "icircumflex", "idieresis", "ntilde",
    "oacute", "ograve", "ocircumflex", "odieresis", "otilde", "uacute", "ugrave", "ucircumflex",
    "udieresis", "dagger", "degree", "cent", "sterling", "section", "bullet", "paragraph",
    "germandbls", "registered", "copyright", "trademark", "acute", "dieresis", "notequal", "AE",
    "Oslash", "infinity", "plusminus", "lessequal", "greaterequal", "yen", "mu", "partialdiff",
    "summation", "product", "pi", "integral", "ordfeminine", "ordmasculine", "Omega", "ae",
    "oslash", "questiondown", "exclamdown", "logicalnot", "radical", "florin", "approxequal",
    "Delta", "guillemotleft", "guillemotright", "ellipsis", "nonbreakingspace", "Agrave", "Atilde",
    "Otilde", "OE", "oe", "endash", "emdash", "quotedblleft", "quotedblright", "quoteleft",
    "quoteright", "divide", "lozenge", "ydieresis", "Ydieresis", "fraction", "currency",
    "guilsinglleft", "guilsinglright", "fi", "fl", "daggerdbl", "periodcentered", "quotesinglbase",
    "quotedblbase", "perthousand", "Acircumflex", "Ecircumflex", "Aacute", "Edieresis", "Egrave",
    "Iacute", "Icircumflex", "Idieresis", "Igrave", "Oacute", "Ocircumflex", "apple", "Ograve",
    "Uacute", "Ucircumflex", "Ugrave", "dotlessi", "circumflex", "tilde", "macron", "breve",
    "dotaccent", "ring", "cedilla", "hungarumlaut", "ogonek", "caron", "Lslash", "lslash",
    "Scaron", "scaron", "Zcaron", "zcaron", "brokenbar", "Eth", "eth", "Yacute", "yacute", "Thorn",
    "thorn", "minus", "multiply", "onesuperior", "twosuperior", "threesuperior", "onehalf",
    "onequarter", "threequarters", "franc", "Gbreve", "gbreve", "Idotaccent", "Scedilla",
    "scedilla", "Cacute", "cacute", "Ccaron", "ccaron", "dcroat",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn head_bytes(magic: u32, upem: u16, loca_fmt: i16) -> Vec<u8> {
        let mut data = vec![0u8; 54];
        data[12..16].copy_from_slice(&magic.to_be_bytes());
        data[18..20].copy_from_slice(&upem.to_be_bytes());
        data[50..52].copy_from_slice(&loca_fmt.to_be_bytes());
        data
    }

    #[test]
    fn head_validation() {
        let data = head_bytes(Head::MAGIC, 1000, 1);
        let head = Head::new(&data);
        assert!(head.validate().is_some());
        assert_eq!(head.units_per_em(), 1000);
        assert_eq!(head.index_to_location_format(), 1);

        assert!(Head::new(&head_bytes(0xDEADBEEF, 1000, 0)).validate().is_none());
        assert!(Head::new(&head_bytes(Head::MAGIC, 8, 0)).validate().is_none());
        assert!(Head::new(&head_bytes(Head::MAGIC, 1000, 2)).validate().is_none());
    }

    #[test]
    fn os2_embedding_permission() {
        let mut data = vec![0u8; 78];
        data[9] = 0x2;
        assert_eq!(
            Os2::new(&data).embedding_permission(),
            EmbeddingPermission::Restricted
        );
        data[9] = 0x8;
        assert_eq!(
            Os2::new(&data).embedding_permission(),
            EmbeddingPermission::Editable
        );
        data[9] = 0x0;
        assert_eq!(
            Os2::new(&data).embedding_permission(),
            EmbeddingPermission::Installable
        );
    }

    #[test]
    fn os2_versioned_fields_absent_below_version() {
        let mut data = vec![0u8; 100];
        data[1] = 0; // version 0
        data[86..88].copy_from_slice(&500i16.to_be_bytes());
        assert_eq!(Os2::new(&data).x_height(), 0);
        data[1] = 2;
        assert_eq!(Os2::new(&data).x_height(), 500);
    }

    #[test]
    fn post_standard_names() {
        let mut data = vec![0u8; 32];
        data[..4].copy_from_slice(&0x10000u32.to_be_bytes());
        let post = Post::new(&data);
        assert_eq!(post.name(0), Some(".notdef"));
        assert_eq!(post.name(3), Some("space"));
        assert_eq!(post.name(258), None);
    }

    #[test]
    fn post_embedded_names() {
        // Version 2.0 with two glyphs: standard index 3 and one custom name.
        let mut data = vec![0u8; 32];
        data[..4].copy_from_slice(&0x20000u32.to_be_bytes());
        data.extend_from_slice(&2u16.to_be_bytes()); // numGlyphs
        data.extend_from_slice(&3u16.to_be_bytes()); // glyph 0 -> "space"
        data.extend_from_slice(&258u16.to_be_bytes()); // glyph 1 -> first pascal string
        data.extend_from_slice(&[5]);
        data.extend_from_slice(b"alpha");
        let post = Post::new(&data);
        assert_eq!(post.name(0), Some("space"));
        assert_eq!(post.name(1), Some("alpha"));
        assert_eq!(post.name(2), None);
    }
}
