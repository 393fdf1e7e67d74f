// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

use crate::GlyphId;

/// Placeholder identifier for glyphs scheduled for removal.
pub const DELETED_GLYPH: GlyphId = 0xFFFF;

/// Glyph flag: replaced by a substitution.
pub const SUBSTITUTED: u16 = 1;
/// Glyph flag: produced by a ligature composition.
pub const LIGATED: u16 = 2;
/// Glyph flag: collapsed into a preceding ligature.
pub const COMPONENT: u16 = 4;
/// Glyph flag: inserted by an insertion subtable.
pub const INSERTED: u16 = 8;

/// Glyph plus the cluster bookkeeping a shaper needs.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct GlyphInfo {
    pub id: GlyphId,
    /// Source index (byte or codepoint, the caller decides) that
    /// produced this glyph. Several glyphs may share a cluster after
    /// ligation or decomposition.
    pub cluster: u32,
    /// Source codepoint; zero for inserted glyphs.
    pub codepoint: u32,
    /// Caller controlled mask, untouched by the drivers.
    pub mask: u32,
    pub flags: u16,
}

impl GlyphInfo {
    /// Creates a glyph info for the specified glyph and cluster.
    pub fn new(id: GlyphId, cluster: u32) -> Self {
        Self {
            id,
            cluster,
            ..Default::default()
        }
    }

    /// Returns true if the glyph was collapsed into a ligature.
    pub fn is_component(&self) -> bool {
        self.flags & COMPONENT != 0
    }
}

/// Ordered glyph sequence the AAT drivers operate on.
#[derive(Clone, Default, Debug)]
pub struct Buffer {
    pub glyphs: Vec<GlyphInfo>,
    /// Per-glyph advance adjustments from kerning, parallel to
    /// `glyphs`.
    pub kerning: Vec<f32>,
    /// True when the source run is right-to-left.
    pub is_rtl: bool,
    reversed: bool,
}

impl Buffer {
    /// Creates a buffer over the specified glyph infos.
    pub fn new(glyphs: Vec<GlyphInfo>, is_rtl: bool) -> Self {
        let kerning = vec![0.; glyphs.len()];
        Self {
            glyphs,
            kerning,
            is_rtl,
            reversed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Reverses the buffer when the requested order differs from the
    /// current one. Subtables declare whether they process in layout or
    /// logical order.
    pub fn ensure_order(&mut self, reversed: bool) {
        if reversed != self.reversed {
            self.glyphs.reverse();
            self.kerning.reverse();
            self.reversed = reversed;
        }
    }

    /// Replaces the glyph at the specified index.
    pub fn substitute(&mut self, index: usize, id: GlyphId) {
        if let Some(g) = self.glyphs.get_mut(index) {
            g.id = id;
            g.flags |= SUBSTITUTED;
        }
    }

    /// Collapses `components` into a ligature at `index`. The ligature
    /// takes the minimum cluster of everything it absorbed; component
    /// slots are left behind as deleted glyphs until [`compact`] runs.
    ///
    /// [`compact`]: Self::compact
    pub fn substitute_ligature(&mut self, index: usize, id: GlyphId, components: &[usize]) {
        let Some(g) = self.glyphs.get_mut(index) else {
            return;
        };
        g.id = id;
        g.flags |= SUBSTITUTED | LIGATED;
        let mut cluster = g.cluster;
        for &component in components {
            if let Some(c) = self.glyphs.get_mut(component) {
                cluster = cluster.min(c.cluster);
                c.id = DELETED_GLYPH;
                c.flags |= COMPONENT;
            }
        }
        for &component in components {
            if let Some(c) = self.glyphs.get_mut(component) {
                c.cluster = cluster;
            }
        }
        self.glyphs[index].cluster = cluster;
    }

    /// Opens `count` insertion slots at the specified index. Inserted
    /// glyphs copy the neighbor's cluster.
    pub fn multiply(&mut self, index: usize, count: usize) {
        let template = self
            .glyphs
            .get(index.min(self.glyphs.len().saturating_sub(1)))
            .copied()
            .unwrap_or_default();
        let mut slot = template;
        slot.codepoint = 0;
        slot.flags = INSERTED;
        let index = index.min(self.glyphs.len());
        self.glyphs.splice(index..index, (0..count).map(|_| slot));
        self.kerning.splice(index..index, (0..count).map(|_| 0.));
    }

    /// Removes deleted glyphs after all chains have been applied.
    pub fn compact(&mut self) {
        let mut kerning = self.kerning.iter().copied();
        let mut kept = Vec::with_capacity(self.kerning.len());
        self.glyphs.retain(|g| {
            let kern = kerning.next().unwrap_or(0.);
            let keep = g.id != DELETED_GLYPH;
            if keep {
                kept.push(kern);
            }
            keep
        });
        self.kerning = kept;
    }

    /// Returns the glyphs in logical order, consuming the buffer.
    pub fn into_glyphs(mut self) -> Vec<GlyphInfo> {
        self.ensure_order(false);
        self.glyphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(ids: &[u16]) -> Buffer {
        Buffer::new(
            ids.iter()
                .enumerate()
                .map(|(i, &id)| GlyphInfo::new(id, i as u32))
                .collect(),
            false,
        )
    }

    #[test]
    fn ligature_takes_min_cluster() {
        let mut b = buffer(&[10, 20, 30]);
        b.substitute_ligature(0, 99, &[1, 2]);
        assert_eq!(b.glyphs[0].id, 99);
        assert_eq!(b.glyphs[0].cluster, 0);
        assert!(b.glyphs[1].is_component());
        assert_eq!(b.glyphs[1].cluster, 0);
        b.compact();
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn multiply_copies_cluster() {
        let mut b = buffer(&[10, 20]);
        b.multiply(1, 2);
        assert_eq!(b.len(), 4);
        assert_eq!(b.glyphs[1].cluster, 1);
        assert_eq!(b.glyphs[1].flags, INSERTED);
        assert_eq!(b.kerning.len(), 4);
    }

    #[test]
    fn order_flips_once() {
        let mut b = buffer(&[1, 2, 3]);
        b.ensure_order(true);
        assert_eq!(b.glyphs[0].id, 3);
        b.ensure_order(true);
        assert_eq!(b.glyphs[0].id, 3);
        let glyphs = b.into_glyphs();
        assert_eq!(glyphs[0].id, 1);
    }
}
