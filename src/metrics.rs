// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

/*!
Font and glyph metrics.
*/

use crate::font::FontRef;
use crate::internal::{head, var, xmtx, RawFont};
use crate::{FontDirectory, GlyphId, NormalizedCoord};

pub use crate::internal::head::EmbeddingPermission;

/// Proxy for rematerializing metrics without re-walking the directory.
#[derive(Copy, Clone, Default)]
pub struct MetricsProxy {
    units_per_em: u16,
    glyph_count: u16,
    is_monospace: bool,
    has_vertical_metrics: bool,
    use_typographic: bool,
    ascent: i16,
    descent: i16,
    leading: i16,
    vertical_ascent: i16,
    vertical_descent: i16,
    cap_height: i16,
    x_height: i16,
    underline_offset: i16,
    underline_size: i16,
    strikeout_offset: i16,
    strikeout_size: i16,
    hmtx: u32,
    hmtx_count: u16,
    vmtx: u32,
    vmtx_count: u16,
    hvar: u32,
    vvar: u32,
    mvar: u32,
    vorg: u32,
}

impl MetricsProxy {
    /// Creates a metrics proxy for the specified font.
    pub fn from_font(font: &FontRef) -> Self {
        let mut proxy = Self {
            units_per_em: 1,
            ..Self::default()
        };
        if let Some(head) = font.head() {
            proxy.units_per_em = head.units_per_em().max(1);
        }
        if let Some(maxp) = font.maxp() {
            proxy.glyph_count = maxp.glyph_count();
        }
        if let Some(hhea) = font.hhea() {
            proxy.ascent = hhea.ascender();
            proxy.descent = -hhea.descender();
            proxy.leading = hhea.line_gap();
            proxy.hmtx_count = hhea.num_long_metrics();
        }
        if let Some(os2) = font.os2() {
            proxy.use_typographic = os2.selection_flags().use_typographic_metrics();
            if proxy.use_typographic || proxy.ascent == 0 {
                proxy.ascent = os2.typographic_ascender();
                proxy.descent = -os2.typographic_descender();
                proxy.leading = os2.typographic_line_gap();
            }
            proxy.cap_height = os2.cap_height();
            proxy.x_height = os2.x_height();
            proxy.strikeout_offset = os2.strikeout_position();
            proxy.strikeout_size = os2.strikeout_size();
        }
        if let Some(post) = font.post() {
            proxy.is_monospace = post.is_fixed_pitch();
            proxy.underline_offset = post.underline_position();
            proxy.underline_size = post.underline_size();
        }
        if let Some(vhea) = font.vhea() {
            proxy.has_vertical_metrics = true;
            proxy.vertical_ascent = vhea.ascender();
            proxy.vertical_descent = -vhea.descender();
            proxy.vmtx_count = vhea.num_long_metrics();
        }
        proxy.hmtx = font.table_offset(xmtx::HMTX);
        proxy.vmtx = font.table_offset(xmtx::VMTX);
        proxy.hvar = font.table_offset(var::HVAR);
        proxy.vvar = font.table_offset(var::VVAR);
        proxy.mvar = font.table_offset(var::MVAR);
        proxy.vorg = font.table_offset(crate::internal::cff::VORG);
        proxy
    }

    /// Materializes font wide metrics for the specified normalized
    /// variation coordinates.
    pub fn materialize_metrics(&self, font: &FontRef, coords: &[NormalizedCoord]) -> Metrics {
        let mut m = Metrics {
            units_per_em: self.units_per_em,
            glyph_count: self.glyph_count,
            is_monospace: self.is_monospace,
            has_vertical_metrics: self.has_vertical_metrics,
            ascent: self.ascent as f32,
            descent: self.descent as f32,
            leading: self.leading as f32,
            vertical_ascent: self.vertical_ascent as f32,
            vertical_descent: self.vertical_descent as f32,
            cap_height: self.cap_height as f32,
            x_height: self.x_height as f32,
            underline_offset: self.underline_offset as f32,
            strikeout_offset: self.strikeout_offset as f32,
            stroke_size: self.underline_size.max(self.strikeout_size) as f32,
        };
        if self.mvar != 0 && !coords.is_empty() {
            if let Some(v) = var::Mvar::new(font.data, self.mvar, coords) {
                use var::mvar_tags::*;
                m.ascent += v.delta(HASC);
                m.descent -= v.delta(HDSC);
                m.leading += v.delta(HLGP);
                if self.has_vertical_metrics {
                    m.vertical_ascent += v.delta(VASC);
                    m.vertical_descent -= v.delta(VDSC);
                }
                m.cap_height += v.delta(CPHT);
                m.x_height += v.delta(XHGT);
                m.underline_offset += v.delta(UNDO);
                m.strikeout_offset += v.delta(STRO);
                m.stroke_size += v.delta(UNDS);
            }
        }
        m
    }

    /// Materializes per-glyph metrics for the specified normalized
    /// variation coordinates.
    pub fn materialize_glyph_metrics<'a>(
        &self,
        font: &FontRef<'a>,
        coords: &'a [NormalizedCoord],
    ) -> GlyphMetrics<'a> {
        GlyphMetrics {
            data: font.data,
            proxy: *self,
            coords,
        }
    }
}

/// Global font metrics in design units.
#[derive(Copy, Clone, Default, Debug)]
pub struct Metrics {
    pub units_per_em: u16,
    pub glyph_count: u16,
    pub is_monospace: bool,
    pub has_vertical_metrics: bool,
    pub ascent: f32,
    pub descent: f32,
    pub leading: f32,
    pub vertical_ascent: f32,
    pub vertical_descent: f32,
    pub cap_height: f32,
    pub x_height: f32,
    pub underline_offset: f32,
    pub strikeout_offset: f32,
    pub stroke_size: f32,
}

impl Metrics {
    pub(crate) fn from_font(font: &FontRef, coords: &[NormalizedCoord]) -> Self {
        MetricsProxy::from_font(font).materialize_metrics(font, coords)
    }

    /// Returns the metrics scaled for the specified pixels per em.
    pub fn scale(&self, ppem: f32) -> Self {
        self.linear_scale(ppem / self.units_per_em.max(1) as f32)
    }

    fn linear_scale(&self, s: f32) -> Self {
        Self {
            units_per_em: self.units_per_em,
            glyph_count: self.glyph_count,
            is_monospace: self.is_monospace,
            has_vertical_metrics: self.has_vertical_metrics,
            ascent: self.ascent * s,
            descent: self.descent * s,
            leading: self.leading * s,
            vertical_ascent: self.vertical_ascent * s,
            vertical_descent: self.vertical_descent * s,
            cap_height: self.cap_height * s,
            x_height: self.x_height * s,
            underline_offset: self.underline_offset * s,
            strikeout_offset: self.strikeout_offset * s,
            stroke_size: self.stroke_size * s,
        }
    }
}

/// Per-glyph advances and side bearings with variation deltas applied.
#[derive(Copy, Clone)]
pub struct GlyphMetrics<'a> {
    data: &'a [u8],
    proxy: MetricsProxy,
    coords: &'a [NormalizedCoord],
}

impl<'a> GlyphMetrics<'a> {
    pub(crate) fn from_font(font: &FontRef<'a>, coords: &'a [NormalizedCoord]) -> Self {
        MetricsProxy::from_font(font).materialize_glyph_metrics(font, coords)
    }

    /// Returns the number of glyphs.
    pub fn glyph_count(&self) -> u16 {
        self.proxy.glyph_count
    }

    /// Returns true when metric variations will be applied.
    pub fn has_variations(&self) -> bool {
        !self.coords.is_empty() && (self.proxy.hvar != 0 || self.proxy.vvar != 0)
    }

    /// Returns the advance width in design units for the specified
    /// glyph.
    pub fn advance_width(&self, glyph_id: GlyphId) -> f32 {
        if glyph_id >= self.proxy.glyph_count || self.proxy.hmtx == 0 {
            return 0.;
        }
        let mut advance =
            xmtx::advance(self.data, self.proxy.hmtx, self.proxy.hmtx_count, glyph_id) as f32;
        if self.proxy.hvar != 0 && !self.coords.is_empty() {
            advance += var::advance_delta(self.data, self.proxy.hvar, glyph_id, self.coords)
                .round();
        }
        advance
    }

    /// Returns the left side bearing in design units for the specified
    /// glyph.
    pub fn lsb(&self, glyph_id: GlyphId) -> f32 {
        if glyph_id >= self.proxy.glyph_count || self.proxy.hmtx == 0 {
            return 0.;
        }
        let mut sb =
            xmtx::side_bearing(self.data, self.proxy.hmtx, self.proxy.hmtx_count, glyph_id)
                as f32;
        if self.proxy.hvar != 0 && !self.coords.is_empty() {
            sb += var::sb_delta(self.data, self.proxy.hvar, glyph_id, self.coords).round();
        }
        sb
    }

    /// Returns the advance height in design units for the specified
    /// glyph. Falls back to the em size when the font carries no
    /// vertical metrics.
    pub fn advance_height(&self, glyph_id: GlyphId) -> f32 {
        if glyph_id >= self.proxy.glyph_count {
            return 0.;
        }
        if self.proxy.vmtx == 0 {
            return self.proxy.units_per_em as f32;
        }
        let mut advance =
            xmtx::advance(self.data, self.proxy.vmtx, self.proxy.vmtx_count, glyph_id) as f32;
        if self.proxy.vvar != 0 && !self.coords.is_empty() {
            advance += var::advance_delta(self.data, self.proxy.vvar, glyph_id, self.coords)
                .round();
        }
        advance
    }

    /// Returns the top side bearing in design units for the specified
    /// glyph.
    pub fn tsb(&self, glyph_id: GlyphId) -> f32 {
        if glyph_id >= self.proxy.glyph_count || self.proxy.vmtx == 0 {
            return 0.;
        }
        let mut sb =
            xmtx::side_bearing(self.data, self.proxy.vmtx, self.proxy.vmtx_count, glyph_id)
                as f32;
        if self.proxy.vvar != 0 && !self.coords.is_empty() {
            sb += var::sb_delta(self.data, self.proxy.vvar, glyph_id, self.coords).round();
        }
        sb
    }

    /// Returns the y coordinate of the vertical origin for the
    /// specified glyph, from `VORG` when present.
    pub fn vertical_origin(&self, glyph_id: GlyphId) -> f32 {
        if self.proxy.vorg != 0 {
            if let Some(data) = self.data.get(self.proxy.vorg as usize..) {
                return crate::internal::cff::Vorg::new(data).vertical_origin(glyph_id) as f32;
            }
        }
        self.proxy.ascent as f32
    }
}

/// Returns true if the directory carries everything needed for metrics.
pub(crate) fn has_required_tables(directory: &FontDirectory) -> bool {
    [head::HEAD, head::MAXP, head::HHEA, xmtx::HMTX]
        .iter()
        .all(|tag| directory.contains(*tag))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // An SFNT with head, maxp, hhea and hmtx: two long metrics plus one
    // trailing side bearing.
    pub(crate) fn metrics_font() -> Vec<u8> {
        let tables: [(&[u8; 4], Vec<u8>); 4] = [
            (b"head", {
                let mut head = vec![0u8; 54];
                head[12..16].copy_from_slice(&crate::internal::head::Head::MAGIC.to_be_bytes());
                head[18..20].copy_from_slice(&1000u16.to_be_bytes());
                head
            }),
            (b"hhea", {
                let mut hhea = vec![0u8; 36];
                hhea[4..6].copy_from_slice(&800i16.to_be_bytes());
                hhea[6..8].copy_from_slice(&(-200i16).to_be_bytes());
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
                hmtx
            }),
            (b"maxp", {
                let mut maxp = vec![0u8; 6];
                maxp[..4].copy_from_slice(&0x00010000u32.to_be_bytes());
                maxp[4..6].copy_from_slice(&3u16.to_be_bytes());
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
    fn advances_and_bearings() {
        let data = metrics_font();
        let font = FontRef::new(&data).unwrap();
        let metrics = GlyphMetrics::from_font(&font, &[]);
        assert_eq!(metrics.glyph_count(), 3);
        assert_eq!(metrics.advance_width(0), 500.);
        assert_eq!(metrics.advance_width(1), 600.);
        // The tail repeats the last advance with its own side bearing.
        assert_eq!(metrics.advance_width(2), 600.);
        assert_eq!(metrics.lsb(2), 30.);
        // Out of range glyphs yield the neutral value.
        assert_eq!(metrics.advance_width(9), 0.);
    }

    #[test]
    fn global_metrics() {
        let data = metrics_font();
        let font = FontRef::new(&data).unwrap();
        let metrics = Metrics::from_font(&font, &[]);
        assert_eq!(metrics.units_per_em, 1000);
        assert_eq!(metrics.ascent, 800.);
        assert_eq!(metrics.descent, 200.);
        let scaled = metrics.scale(500.);
        assert_eq!(scaled.ascent, 400.);
    }

    #[test]
    fn advance_is_never_negative_without_deltas() {
        let data = metrics_font();
        let font = FontRef::new(&data).unwrap();
        let metrics = GlyphMetrics::from_font(&font, &[]);
        for gid in 0..metrics.glyph_count() {
            assert!(metrics.advance_width(gid) >= 0.);
        }
    }

    #[test]
    fn required_table_check() {
        let data = metrics_font();
        let directory = FontDirectory::parse(&data).unwrap();
        assert!(has_required_tables(&directory));
    }
}
