// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

/*!
Owning face facade with cached table decoding.
*/

use parking_lot::RwLock;

use crate::charmap::{Charmap, CharmapProxy};
use crate::error::Error;
use crate::font::{FontDirectory, FontRef};
use crate::internal::cmap::MapVariant;
use crate::internal::{aat, at, base, cff, color, glyf, head, raw_data, strike, var, RawFont};
use crate::metrics::{GlyphMetrics, Metrics, MetricsProxy};
use crate::outline::{self, Bounds, Outline, TrueTypeTables};
use crate::setting::Setting;
use crate::shape::{aat as aat_apply, Buffer, GlyphInfo};
use crate::strings::LocalizedStrings;
use crate::tag::{DisplayTag, Tag};
use crate::variation::{Instances, Variations};
use crate::{Attributes, GlyphId, NormalizedCoord};

/// Controls when tables are decoded.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum TableLoading {
    /// Decode proxies on first use; the per-slot cache is publish-once,
    /// so concurrent readers are safe.
    #[default]
    Lazy,
    /// Decode everything during construction, trading startup cost for
    /// a fully immutable face.
    Eager,
}

/// Options for face construction.
#[derive(Copy, Clone, Default, Debug)]
pub struct FaceOptions {
    pub loading: TableLoading,
}

// Double-checked publish-once cache slot.
struct Slot<T>(RwLock<Option<T>>);

impl<T: Copy> Slot<T> {
    fn new() -> Self {
        Self(RwLock::new(None))
    }

    fn get_or_init(&self, init: impl FnOnce() -> T) -> T {
        if let Some(value) = *self.0.read() {
            return value;
        }
        let mut guard = self.0.write();
        match *guard {
            Some(value) => value,
            None => {
                let value = init();
                *guard = Some(value);
                value
            }
        }
    }
}

/// Sources of glyph outlines in the face.
#[derive(Copy, Clone)]
enum OutlineSource {
    None,
    TrueType(TrueTypeTables),
    Cff { offset: u32, length: u32, is_cff2: bool },
}

/// An owned, validated font face.
///
/// The face owns the font buffer; all decoded structures borrow from it
/// and are rebuilt from compact proxies. One face may be used freely
/// from one thread; shared readers rely on the publish-once slots of
/// the lazy cache.
pub struct Face {
    data: Vec<u8>,
    directory: FontDirectory,
    outlines: OutlineSource,
    charmap: Slot<CharmapProxy>,
    metrics: Slot<MetricsProxy>,
}

impl Face {
    /// Loads a face from a bare SFNT buffer. WOFF1, WOFF2 and
    /// collections are rejected; use [`load`](Self::load) to transcode
    /// WOFF2 transparently.
    pub fn from_sfnt(data: Vec<u8>) -> Result<Self, Error> {
        Self::with_options(data, FaceOptions::default())
    }

    /// Loads a face from an SFNT or WOFF2 buffer.
    pub fn load(data: Vec<u8>) -> Result<Self, Error> {
        let data = if raw_data::is_woff2(&data) {
            crate::woff2::decompress(&data)?
        } else {
            data
        };
        Self::with_options(data, FaceOptions::default())
    }

    /// Loads a face with explicit options.
    pub fn with_options(data: Vec<u8>, options: FaceOptions) -> Result<Self, Error> {
        let directory = FontDirectory::parse(&data)?;
        let font = FontRef {
            data: &data,
            offset: 0,
        };
        // The five required tables fail the face; everything else
        // degrades to absence.
        for tag in [
            head::HEAD,
            head::MAXP,
            head::HHEA,
            crate::internal::xmtx::HMTX,
            crate::internal::cmap::CMAP,
        ] {
            if !directory.contains(tag) {
                return Err(Error::MissingRequiredTable(tag));
            }
        }
        let head = font.head().ok_or(Error::MissingRequiredTable(head::HEAD))?;
        head.validate()
            .ok_or(Error::malformed(head::HEAD, "bad magic or units per em"))?;
        let outlines = Self::detect_outlines(&directory, head.index_to_location_format());
        let face = Self {
            data,
            directory,
            outlines,
            charmap: Slot::new(),
            metrics: Slot::new(),
        };
        if options.loading == TableLoading::Eager {
            face.warm();
        }
        Ok(face)
    }

    fn detect_outlines(directory: &FontDirectory, loca_fmt: u16) -> OutlineSource {
        if let (Some(loca), Some(glyf_rec)) = (
            directory.get(glyf::LOCA),
            directory.get(glyf::GLYF),
        ) {
            return OutlineSource::TrueType(TrueTypeTables {
                loca_fmt: loca_fmt as u8,
                loca: loca.offset,
                glyf: glyf_rec.offset,
                gvar: directory.get(var::GVAR).map(|r| r.offset).unwrap_or(0),
            });
        }
        for (tag, is_cff2) in [(cff::CFF2, true), (cff::CFF, false)] {
            if let Some(record) = directory.get(tag) {
                return OutlineSource::Cff {
                    offset: record.offset,
                    length: record.length,
                    is_cff2,
                };
            }
        }
        OutlineSource::None
    }

    // Decode every proxy up front. Optional tables that fail to parse
    // are surfaced as warnings and treated as absent.
    fn warm(&self) {
        let font = self.font();
        self.charmap.get_or_init(|| CharmapProxy::from_font(&font));
        self.metrics.get_or_init(|| MetricsProxy::from_font(&font));
        if let OutlineSource::Cff { .. } = self.outlines {
            if self.cff_font().is_none() {
                tracing::warn!("CFF table failed to parse; outlines disabled");
            }
        }
        for tag in [at::GSUB, at::GPOS] {
            if self.directory.contains(tag) && self.layout_table(tag).is_none() {
                tracing::warn!(tag = %DisplayTag(tag), "layout table failed to parse");
            }
        }
        if self.directory.contains(at::GDEF) && self.gdef().is_none() {
            tracing::warn!("GDEF table failed to parse");
        }
        if self.directory.contains(base::BASE) && self.base().is_none() {
            tracing::warn!("BASE table failed to parse");
        }
        if self.directory.contains(base::MATH) && self.math().is_none() {
            tracing::warn!("MATH table failed to parse");
        }
    }

    /// Returns the borrowed reference the decoders operate on.
    pub fn font(&self) -> FontRef<'_> {
        FontRef {
            data: &self.data,
            offset: 0,
        }
    }

    /// Returns the raw bytes backing the face.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the validated table directory.
    pub fn directory(&self) -> &FontDirectory {
        &self.directory
    }

    /// Returns true if a table with the specified tag is present.
    pub fn has_table(&self, tag: Tag) -> bool {
        self.directory.contains(tag)
    }

    /// Returns the authoritative glyph count.
    pub fn glyph_count(&self) -> u16 {
        self.font().maxp().map(|m| m.glyph_count()).unwrap_or(0)
    }

    /// Returns the design units per em.
    pub fn units_per_em(&self) -> u16 {
        self.font().head().map(|h| h.units_per_em()).unwrap_or(0)
    }

    // -- capability predicates ------------------------------------------

    /// Returns true if the face can produce glyph outlines.
    pub fn has_outlines(&self) -> bool {
        !matches!(self.outlines, OutlineSource::None)
    }

    /// Returns true if the face declares variation axes.
    pub fn is_variable(&self) -> bool {
        self.directory.contains(var::FVAR)
    }

    /// Returns true if the face carries layered color outlines.
    pub fn has_color(&self) -> bool {
        self.directory.contains(color::COLR) && self.directory.contains(color::CPAL)
    }

    /// Returns true if the face carries bitmap strikes.
    pub fn has_bitmaps(&self) -> bool {
        [strike::SBIX, strike::CBLC, strike::EBLC]
            .iter()
            .any(|tag| self.directory.contains(*tag))
    }

    /// Returns true if the face carries AAT metamorphosis chains.
    pub fn has_morx(&self) -> bool {
        self.directory.contains(aat::MORX)
    }

    /// Returns true if the face carries OpenType layout tables.
    pub fn has_layout(&self) -> bool {
        self.directory.contains(at::GSUB) || self.directory.contains(at::GPOS)
    }

    // -- character mapping ----------------------------------------------

    /// Returns the character map.
    pub fn charmap(&self) -> Charmap<'_> {
        let font = self.font();
        self.charmap
            .get_or_init(|| CharmapProxy::from_font(&font))
            .materialize(&font)
    }

    /// Returns the nominal glyph identifier for a codepoint; zero when
    /// unmapped.
    pub fn glyph_id_for(&self, codepoint: impl Into<u32>) -> GlyphId {
        self.charmap().map(codepoint.into())
    }

    /// Maps a codepoint with a variation selector through the format 14
    /// subtable.
    pub fn glyph_variant(
        &self,
        codepoint: impl Into<u32>,
        selector: impl Into<u32>,
    ) -> Option<MapVariant> {
        self.charmap().map_variant(codepoint.into(), selector.into())
    }

    // -- metrics --------------------------------------------------------

    /// Returns global metrics at the specified coordinates.
    pub fn metrics(&self, coords: &[NormalizedCoord]) -> Metrics {
        let font = self.font();
        self.metrics
            .get_or_init(|| MetricsProxy::from_font(&font))
            .materialize_metrics(&font, coords)
    }

    /// Returns per-glyph metrics at the specified coordinates.
    pub fn glyph_metrics<'a>(&'a self, coords: &'a [NormalizedCoord]) -> GlyphMetrics<'a> {
        let font = self.font();
        self.metrics
            .get_or_init(|| MetricsProxy::from_font(&font))
            .materialize_glyph_metrics(&font, coords)
    }

    /// Returns the advance width in design units, with `HVAR` deltas
    /// applied when coordinates are supplied.
    pub fn advance_width(&self, glyph_id: GlyphId, coords: &[NormalizedCoord]) -> f32 {
        self.glyph_metrics(coords).advance_width(glyph_id)
    }

    // -- outlines -------------------------------------------------------

    /// Returns the outline for the specified glyph, applying variation
    /// deltas when coordinates are supplied. Per-glyph failures are
    /// errors; they never poison the face.
    pub fn glyph_outline(
        &self,
        glyph_id: GlyphId,
        coords: &[NormalizedCoord],
    ) -> Result<Outline, Error> {
        if glyph_id >= self.glyph_count() {
            return Ok(Outline::default());
        }
        match &self.outlines {
            OutlineSource::None => Ok(Outline::default()),
            OutlineSource::TrueType(tables) => {
                outline::truetype_outline(&self.data, tables, glyph_id, coords)
            }
            OutlineSource::Cff { .. } => {
                let font = self.cff_font().ok_or(Error::malformed(
                    cff::CFF,
                    "charstring index failed to parse",
                ))?;
                outline::cff_outline(&font, glyph_id, coords)
            }
        }
    }

    /// Returns the contours for the specified glyph, folding per-glyph
    /// failures into a blank outline.
    pub fn glyph_contours(&self, glyph_id: GlyphId, coords: &[NormalizedCoord]) -> Outline {
        self.glyph_outline(glyph_id, coords).unwrap_or_else(|err| {
            tracing::warn!(glyph_id, %err, "glyph outline failed");
            Outline::default()
        })
    }

    /// Returns the bounding box computed by scanning the outline, or
    /// `None` for blank glyphs.
    pub fn glyph_bounds(&self, glyph_id: GlyphId, coords: &[NormalizedCoord]) -> Option<Bounds> {
        self.glyph_outline(glyph_id, coords).ok()?.bounds()
    }

    fn cff_font(&self) -> Option<cff::CffFont<'_>> {
        match self.outlines {
            OutlineSource::Cff {
                offset,
                length,
                is_cff2,
            } => {
                let data = self
                    .data
                    .get(offset as usize..(offset + length) as usize)?;
                if is_cff2 {
                    cff::CffFont::parse_cff2(data)
                } else {
                    cff::CffFont::parse_cff(data)
                }
            }
            _ => None,
        }
    }

    // -- variations -----------------------------------------------------

    /// Returns an iterator over the variation axes.
    pub fn variations(&self) -> Variations<'_> {
        Variations::from_font(&self.font())
    }

    /// Returns an iterator over the named instances.
    pub fn instances(&self) -> Instances<'_> {
        Instances::from_font(&self.font())
    }

    /// Returns the dense normalized coordinate vector for the specified
    /// user space settings.
    pub fn normalized_coords<I>(&self, settings: I) -> Vec<NormalizedCoord>
    where
        I: IntoIterator,
        I::Item: Into<Setting<f32>>,
    {
        self.variations().normalized_coords(settings)
    }

    // -- names and attributes -------------------------------------------

    /// Returns an iterator over the localized strings.
    pub fn localized_strings(&self) -> LocalizedStrings<'_> {
        LocalizedStrings::from_font(&self.font())
    }

    /// Returns the primary attributes.
    pub fn attributes(&self) -> Attributes {
        Attributes::from_font(&self.font())
    }

    /// Returns the name for the specified glyph from the `post` table.
    pub fn glyph_name(&self, glyph_id: GlyphId) -> Option<&str> {
        self.font().post()?.name(glyph_id)
    }

    // -- AAT ------------------------------------------------------------

    /// Applies every `morx` chain to the glyph sequence and returns the
    /// transformed sequence. `selectors` is a sorted list of (feature,
    /// setting) pairs.
    pub fn apply_morx(
        &self,
        glyphs: Vec<GlyphInfo>,
        is_rtl: bool,
        selectors: &[(u16, u16)],
    ) -> Vec<GlyphInfo> {
        let morx = self.font().table_offset(aat::MORX);
        if morx == 0 {
            return glyphs;
        }
        let mut buffer = Buffer::new(glyphs, is_rtl);
        aat_apply::apply_morx(&self.data, morx, &mut buffer, selectors);
        buffer.compact();
        buffer.into_glyphs()
    }

    /// Applies a single `morx` chain by index.
    pub fn apply_morx_chain(
        &self,
        chain_index: usize,
        glyphs: Vec<GlyphInfo>,
        is_rtl: bool,
        selectors: &[(u16, u16)],
    ) -> Vec<GlyphInfo> {
        let morx = self.font().table_offset(aat::MORX);
        if morx == 0 {
            return glyphs;
        }
        let mut buffer = Buffer::new(glyphs, is_rtl);
        if let Some(chain) = aat::morx::chains(&self.data, morx).nth(chain_index) {
            aat_apply::apply_chain(&chain, &mut buffer, selectors);
            buffer.compact();
        }
        buffer.into_glyphs()
    }

    /// Computes per-glyph advance adjustments from `kerx`, falling back
    /// to the legacy `kern` table. The result is parallel to `glyphs`.
    pub fn kerning_adjustments(&self, glyphs: &[GlyphInfo], is_rtl: bool) -> Vec<f32> {
        let font = self.font();
        let mut buffer = Buffer::new(glyphs.to_vec(), is_rtl);
        let kerx = font.table_offset(aat::KERX);
        if kerx != 0 {
            let ankr = font.table_offset(aat::ANKR);
            aat_apply::apply_kerx(&self.data, kerx, ankr, &mut buffer);
        } else {
            let kern = font.table_offset(aat::KERN);
            if kern != 0 {
                aat_apply::apply_kern(&self.data, kern, &mut buffer);
            }
        }
        buffer.ensure_order(false);
        buffer.kerning
    }

    /// Returns the tracking adjustment in design units for the
    /// specified track and point size.
    pub fn tracking(&self, track: f32, point_size: f32) -> Option<i32> {
        let data = self.font().table_data(aat::TRAK)?;
        use crate::internal::fixed::Fixed;
        aat::trak::Trak::new(data)
            .horizontal()?
            .tracking(Fixed::from_f32(track), Fixed::from_f32(point_size))
    }

    /// Returns the AAT feature names table.
    pub fn feature_names(&self) -> Option<aat::feat::Feat<'_>> {
        Some(aat::feat::Feat::new(self.font().table_data(aat::FEAT)?))
    }

    // -- OpenType layout ------------------------------------------------

    fn layout_table(&self, tag: Tag) -> Option<at::LayoutTable<'_>> {
        at::LayoutTable::new(self.font().table_data(tag)?)
    }

    /// Returns the decoded `GSUB` structure.
    pub fn gsub(&self) -> Option<at::LayoutTable<'_>> {
        self.layout_table(at::GSUB)
    }

    /// Returns the decoded `GPOS` structure.
    pub fn gpos(&self) -> Option<at::LayoutTable<'_>> {
        self.layout_table(at::GPOS)
    }

    /// Returns the glyph definition table.
    pub fn gdef(&self) -> Option<at::Gdef<'_>> {
        at::Gdef::new(self.font().table_data(at::GDEF)?)
    }

    /// Returns the baseline table.
    pub fn base(&self) -> Option<base::Base<'_>> {
        base::Base::new(self.font().table_data(base::BASE)?)
    }

    /// Returns the mathematical typesetting table.
    pub fn math(&self) -> Option<base::Math<'_>> {
        base::Math::new(self.font().table_data(base::MATH)?)
    }

    // -- color and bitmaps ----------------------------------------------

    /// Returns the color palette table.
    pub fn color_palettes(&self) -> Option<color::Cpal<'_>> {
        Some(color::Cpal::new(self.font().table_data(color::CPAL)?))
    }

    /// Returns the layered color outline table.
    pub fn color_layers(&self) -> Option<color::Colr<'_>> {
        Some(color::Colr::new(self.font().table_data(color::COLR)?))
    }

    /// Returns the Apple bitmap table.
    pub fn sbix(&self) -> Option<strike::Sbix<'_>> {
        Some(strike::Sbix::new(
            self.font().table_data(strike::SBIX)?,
            self.glyph_count(),
        ))
    }

    /// Returns the color bitmap location table (CBLC or EBLC).
    pub fn bitmap_strikes(&self) -> Option<strike::Cblc<'_>> {
        let font = self.font();
        let data = font
            .table_data(strike::CBLC)
            .or_else(|| font.table_data(strike::EBLC))?;
        Some(strike::Cblc::new(data))
    }

    /// Returns the SVG document covering the specified glyph.
    pub fn svg_document(&self, glyph_id: GlyphId) -> Option<&[u8]> {
        color::Svg::new(self.font().table_data(color::SVG)?).document(glyph_id)
    }

    // -- segmentation ---------------------------------------------------

    /// Splits text into grapheme clusters. Purely functional; exposed on
    /// the face for convenience when driving a shaper.
    pub fn segment_graphemes<'t>(&self, text: &'t str) -> Vec<&'t str> {
        crate::text::split_graphemes(text)
    }

    /// Splits text into words, dropping whitespace-only segments.
    pub fn segment_words<'t>(&self, text: &'t str) -> Vec<&'t str> {
        crate::text::split_words(text)
    }
}

impl core::fmt::Debug for Face {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Face")
            .field("tables", &self.directory.len())
            .field("glyphs", &self.glyph_count())
            .field("variable", &self.is_variable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::raw_tag;

    // Extends the metrics test font with a cmap so the face loads.
    fn face_font() -> Vec<u8> {
        let tables: [(&[u8; 4], Vec<u8>); 5] = [
            (b"cmap", {
                let mut cmap = Vec::new();
                cmap.extend_from_slice(&0u16.to_be_bytes());
                cmap.extend_from_slice(&1u16.to_be_bytes());
                cmap.extend_from_slice(&3u16.to_be_bytes()); // windows
                cmap.extend_from_slice(&1u16.to_be_bytes()); // unicode bmp
                cmap.extend_from_slice(&12u32.to_be_bytes());
                cmap.extend_from_slice(&crate::internal::cmap::tests::format4());
                cmap
            }),
            (b"head", {
                let mut head = vec![0u8; 54];
                head[12..16]
                    .copy_from_slice(&crate::internal::head::Head::MAGIC.to_be_bytes());
                head[18..20].copy_from_slice(&1000u16.to_be_bytes());
                head
            }),
            (b"hhea", {
                let mut hhea = vec![0u8; 36];
                hhea[4..6].copy_from_slice(&800i16.to_be_bytes());
                hhea[34..36].copy_from_slice(&2u16.to_be_bytes());
                hhea
            }),
            (b"hmtx", {
                let mut hmtx = Vec::new();
                for (adv, sb) in [(500u16, 10i16), (600, 20)] {
                    hmtx.extend_from_slice(&adv.to_be_bytes());
                    hmtx.extend_from_slice(&sb.to_be_bytes());
                }
                hmtx.extend_from_slice(&30i16.to_be_bytes());
                hmtx.extend_from_slice(&0i16.to_be_bytes());
                hmtx
            }),
            (b"maxp", {
                let mut maxp = vec![0u8; 6];
                maxp[..4].copy_from_slice(&0x00010000u32.to_be_bytes());
                maxp[4..6].copy_from_slice(&4u16.to_be_bytes());
                maxp
            }),
        ];
        let mut data = Vec::new();
        data.extend_from_slice(&0x00010000u32.to_be_bytes());
        data.extend_from_slice(&(tables.len() as u16).to_be_bytes());
        data.extend_from_slice(&[0; 6]);
        let mut offset = 12 + tables.len() * 16;
        for (tag, bytes) in &tables {
            data.extend_from_slice(*tag);
            data.extend_from_slice(&0u32.to_be_bytes());
            data.extend_from_slice(&(offset as u32).to_be_bytes());
            data.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            offset += bytes.len();
        }
        for (_, bytes) in &tables {
            data.extend_from_slice(bytes);
        }
        data
    }

    #[test]
    fn loads_and_maps() {
        let face = Face::from_sfnt(face_font()).unwrap();
        assert_eq!(face.glyph_count(), 4);
        assert_eq!(face.units_per_em(), 1000);
        assert!(face.has_table(raw_tag(b"cmap")));
        assert!(!face.has_table(raw_tag(b"glyf")));
        // Mapped and unmapped codepoints.
        assert_eq!(face.glyph_id_for('A'), 1);
        assert_eq!(face.glyph_id_for('Z'), 0);
        assert_eq!(face.glyph_id_for(0x10FFFFu32), 0);
    }

    #[test]
    fn missing_required_table_fails() {
        // Directory with only a head table.
        let mut data = Vec::new();
        data.extend_from_slice(&0x00010000u32.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&[0; 6]);
        data.extend_from_slice(b"head");
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&28u32.to_be_bytes());
        data.extend_from_slice(&54u32.to_be_bytes());
        data.extend_from_slice(&vec![0u8; 54]);
        let err = Face::from_sfnt(data).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredTable(_)));
    }

    #[test]
    fn mapping_then_advance_never_fails() {
        let face = Face::from_sfnt(face_font()).unwrap();
        for cp in [0u32, 'A' as u32, 'z' as u32, 0x10FFFF] {
            let gid = face.glyph_id_for(cp);
            let advance = face.advance_width(gid, &[]);
            assert!(advance >= 0.);
        }
    }

    #[test]
    fn eager_and_lazy_agree() {
        let lazy = Face::from_sfnt(face_font()).unwrap();
        let eager = Face::with_options(
            face_font(),
            FaceOptions {
                loading: TableLoading::Eager,
            },
        )
        .unwrap();
        for cp in ['A', 'B', 'C'] {
            assert_eq!(lazy.glyph_id_for(cp), eager.glyph_id_for(cp));
        }
        assert_eq!(
            lazy.advance_width(2, &[]),
            eager.advance_width(2, &[])
        );
    }

    #[test]
    fn blank_outline_for_glyph_without_source() {
        let face = Face::from_sfnt(face_font()).unwrap();
        assert!(!face.has_outlines());
        let outline = face.glyph_contours(1, &[]);
        assert!(outline.is_empty());
        assert!(face.glyph_bounds(1, &[]).is_none());
    }

    #[test]
    fn morx_is_identity_without_table() {
        let face = Face::from_sfnt(face_font()).unwrap();
        let glyphs = vec![GlyphInfo::new(1, 0), GlyphInfo::new(2, 1)];
        let shaped = face.apply_morx(glyphs.clone(), false, &[]);
        assert_eq!(shaped, glyphs);
        let kerning = face.kerning_adjustments(&glyphs, false);
        assert_eq!(kerning, [0., 0.]);
    }
}
