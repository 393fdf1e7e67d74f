//! OpenType advanced typography tables.
//!
//! This crate decodes the layout structure (scripts, features, lookups
//! and their subtables) and exposes it as typed variants; applying
//! lookups at the cluster level is the shaper's job.

use super::var;
use super::{raw_tag, Array, Bytes, Offset16, Offset32, RawTag};

pub const GDEF: RawTag = raw_tag(b"GDEF");
pub const GSUB: RawTag = raw_tag(b"GSUB");
pub const GPOS: RawTag = raw_tag(b"GPOS");
pub const BASE: RawTag = raw_tag(b"BASE");
pub const JSTF: RawTag = raw_tag(b"JSTF");
pub const MATH: RawTag = raw_tag(b"MATH");

pub const DFLT: RawTag = raw_tag(b"DFLT");

/// Glyph definition table.
#[derive(Copy, Clone)]
pub struct Gdef<'a> {
    data: Bytes<'a>,
    classes: u16,
    mark_classes: u16,
    mark_sets: u16,
    var_store: u32,
}

impl<'a> Gdef<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        let b = Bytes::new(data);
        let major = b.read::<u16>(0)?;
        let minor = b.read::<u16>(2)?;
        let classes = b.read::<u16>(4)?;
        let mark_classes = b.read::<u16>(10)?;
        let mark_sets = if major > 1 || minor >= 2 {
            b.read_or_default::<u16>(12)
        } else {
            0
        };
        let var_store = if major > 1 || minor >= 3 {
            b.read_or_default::<u32>(14)
        } else {
            0
        };
        Some(Self {
            data: b,
            classes,
            mark_classes,
            mark_sets,
            var_store,
        })
    }

    /// Returns true if glyph classes are available.
    pub fn has_classes(&self) -> bool {
        self.classes != 0
    }

    /// Returns the class for the specified glyph id: 1 base, 2 ligature,
    /// 3 mark, 4 component.
    pub fn class(&self, glyph_id: u16) -> u16 {
        ClassDef::new(self.data, self.classes as u32).get(glyph_id)
    }

    /// Returns the mark attachment class for the specified glyph id.
    pub fn mark_class(&self, glyph_id: u16) -> u16 {
        ClassDef::new(self.data, self.mark_classes as u32).get(glyph_id)
    }

    /// Returns true if the glyph is a member of the specified mark
    /// filtering set.
    pub fn mark_set_contains(&self, set_index: u16, glyph_id: u16) -> bool {
        let Some(offset) = self.mark_set_offset(set_index) else {
            return false;
        };
        Coverage::new(self.data, offset).index(glyph_id).is_some()
    }

    fn mark_set_offset(&self, set_index: u16) -> Option<u32> {
        if self.mark_sets == 0 {
            return None;
        }
        let base = self.mark_sets as usize;
        let len = self.data.read::<u16>(base + 2)? as usize;
        if set_index as usize >= len {
            return None;
        }
        let offset = self
            .data
            .read::<Offset32>(base + 4 + set_index as usize * 4)?
            .to_usize()?;
        Some(self.mark_sets as u32 + offset as u32)
    }

    /// Returns true if an item variation store is present.
    pub fn has_var_store(&self) -> bool {
        self.var_store != 0
    }

    /// Returns a delta from the embedded item variation store.
    pub fn delta(&self, outer: u16, inner: u16, coords: &[i16]) -> f32 {
        if self.var_store == 0 {
            return 0.;
        }
        var::item_delta(self.data.data(), self.var_store, outer, inner, coords)
            .map(|d| d.to_f32())
            .unwrap_or(0.)
    }
}

/// Coverage table mapping glyphs to coverage indices.
#[derive(Copy, Clone)]
pub struct Coverage<'a> {
    data: Bytes<'a>,
    offset: u32,
}

impl<'a> Coverage<'a> {
    pub fn new(data: Bytes<'a>, offset: u32) -> Self {
        Self { data, offset }
    }

    /// Returns the coverage index for the specified glyph.
    pub fn index(&self, glyph_id: u16) -> Option<u16> {
        let base = self.offset as usize;
        let b = &self.data;
        match b.read::<u16>(base)? {
            1 => {
                let len = b.read::<u16>(base + 2)? as usize;
                let arr = b.read_array::<u16>(base + 4, len)?;
                arr.binary_search_by(|g| g.cmp(&glyph_id))
                    .map(|(index, _)| index as u16)
            }
            2 => {
                let len = b.read::<u16>(base + 2)? as usize;
                let mut lo = 0;
                let mut hi = len;
                while lo < hi {
                    let i = (lo + hi) / 2;
                    let rec = base + 4 + i * 6;
                    let start = b.read::<u16>(rec)?;
                    if glyph_id < start {
                        hi = i;
                    } else if glyph_id > b.read::<u16>(rec + 2)? {
                        lo = i + 1;
                    } else {
                        let index = b.read::<u16>(rec + 4)?;
                        return Some(index + glyph_id - start);
                    }
                }
                None
            }
            _ => None,
        }
    }

    /// Returns true if the glyph is covered.
    pub fn contains(&self, glyph_id: u16) -> bool {
        self.index(glyph_id).is_some()
    }
}

/// Class definition table.
#[derive(Copy, Clone)]
pub struct ClassDef<'a> {
    data: Bytes<'a>,
    offset: u32,
}

impl<'a> ClassDef<'a> {
    pub fn new(data: Bytes<'a>, offset: u32) -> Self {
        Self { data, offset }
    }

    /// Returns the class for the specified glyph; unlisted glyphs are
    /// class zero.
    pub fn get(&self, glyph_id: u16) -> u16 {
        self.get_impl(glyph_id).unwrap_or(0)
    }

    fn get_impl(&self, glyph_id: u16) -> Option<u16> {
        if self.offset == 0 {
            return None;
        }
        let base = self.offset as usize;
        let b = &self.data;
        match b.read::<u16>(base)? {
            1 => {
                let first = b.read::<u16>(base + 2)?;
                let len = b.read::<u16>(base + 4)?;
                let index = glyph_id.checked_sub(first)?;
                if index >= len {
                    return None;
                }
                b.read::<u16>(base + 6 + index as usize * 2)
            }
            2 => {
                let len = b.read::<u16>(base + 2)? as usize;
                let mut lo = 0;
                let mut hi = len;
                while lo < hi {
                    let i = (lo + hi) / 2;
                    let rec = base + 4 + i * 6;
                    let start = b.read::<u16>(rec)?;
                    if glyph_id < start {
                        hi = i;
                    } else if glyph_id > b.read::<u16>(rec + 2)? {
                        lo = i + 1;
                    } else {
                        return b.read::<u16>(rec + 4);
                    }
                }
                None
            }
            _ => None,
        }
    }
}

/// Lookup qualifiers from the lookup flag word.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct LookupFlags(pub u16);

impl LookupFlags {
    pub fn right_to_left(self) -> bool {
        self.0 & 0x0001 != 0
    }
    pub fn ignore_base_glyphs(self) -> bool {
        self.0 & 0x0002 != 0
    }
    pub fn ignore_ligatures(self) -> bool {
        self.0 & 0x0004 != 0
    }
    pub fn ignore_marks(self) -> bool {
        self.0 & 0x0008 != 0
    }
    pub fn use_mark_filtering_set(self) -> bool {
        self.0 & 0x0010 != 0
    }
    pub fn mark_attachment_class(self) -> u16 {
        self.0 >> 8
    }
}

/// Script record: a script tag plus its table offset.
#[derive(Copy, Clone, Debug)]
pub struct ScriptRecord {
    pub tag: RawTag,
    offset: u16,
}

/// Feature record: a feature tag plus the lookup indices it activates.
#[derive(Copy, Clone)]
pub struct FeatureRecord<'a> {
    pub tag: RawTag,
    pub lookup_indices: Array<'a, u16>,
}

/// Language system: feature indices for one script/language pair.
#[derive(Copy, Clone)]
pub struct LangSys<'a> {
    pub required_feature: Option<u16>,
    pub feature_indices: Array<'a, u16>,
}

/// A `GSUB` or `GPOS` table: script list, feature list and lookup list.
#[derive(Copy, Clone)]
pub struct LayoutTable<'a> {
    data: Bytes<'a>,
    scripts: u16,
    features: u16,
    lookups: u16,
}

impl<'a> LayoutTable<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        let b = Bytes::new(data);
        b.read::<u16>(0)?;
        Some(Self {
            data: b,
            scripts: b.read::<u16>(4)?,
            features: b.read::<u16>(6)?,
            lookups: b.read::<u16>(8)?,
        })
    }

    /// Returns the number of scripts.
    pub fn script_count(&self) -> u16 {
        self.data
            .read_or_default::<u16>(self.scripts as usize)
    }

    /// Returns the script record at the specified index.
    pub fn script(&self, index: u16) -> Option<ScriptRecord> {
        if index >= self.script_count() {
            return None;
        }
        let rec = self.scripts as usize + 2 + index as usize * 6;
        Some(ScriptRecord {
            tag: self.data.read::<u32>(rec)?,
            offset: self.data.read::<u16>(rec + 4)?,
        })
    }

    /// Returns the script record for the specified tag, falling back to
    /// `DFLT`.
    pub fn script_by_tag(&self, tag: RawTag) -> Option<ScriptRecord> {
        let mut dflt = None;
        for i in 0..self.script_count() {
            let script = self.script(i)?;
            if script.tag == tag {
                return Some(script);
            }
            if script.tag == DFLT {
                dflt = Some(script);
            }
        }
        dflt
    }

    /// Returns the default language system for the specified script.
    pub fn default_lang_sys(&self, script: ScriptRecord) -> Option<LangSys<'a>> {
        let base = self.scripts as usize + script.offset as usize;
        let offset = self.data.read::<Offset16>(base)?.to_usize()?;
        self.lang_sys_at(base + offset)
    }

    /// Returns the language system with the specified tag.
    pub fn lang_sys_by_tag(&self, script: ScriptRecord, tag: RawTag) -> Option<LangSys<'a>> {
        let base = self.scripts as usize + script.offset as usize;
        let count = self.data.read::<u16>(base + 2)? as usize;
        for i in 0..count {
            let rec = base + 4 + i * 6;
            if self.data.read::<u32>(rec)? == tag {
                let offset = self.data.read::<u16>(rec + 4)? as usize;
                return self.lang_sys_at(base + offset);
            }
        }
        self.default_lang_sys(script)
    }

    fn lang_sys_at(&self, base: usize) -> Option<LangSys<'a>> {
        let required = self.data.read::<u16>(base + 2)?;
        let count = self.data.read::<u16>(base + 4)? as usize;
        Some(LangSys {
            required_feature: (required != 0xFFFF).then_some(required),
            feature_indices: self.data.read_array::<u16>(base + 6, count)?,
        })
    }

    /// Returns the number of features.
    pub fn feature_count(&self) -> u16 {
        self.data.read_or_default::<u16>(self.features as usize)
    }

    /// Returns the feature record at the specified index.
    pub fn feature(&self, index: u16) -> Option<FeatureRecord<'a>> {
        if index >= self.feature_count() {
            return None;
        }
        let base = self.features as usize;
        let rec = base + 2 + index as usize * 6;
        let tag = self.data.read::<u32>(rec)?;
        let table = base + self.data.read::<u16>(rec + 4)? as usize;
        let count = self.data.read::<u16>(table + 2)? as usize;
        Some(FeatureRecord {
            tag,
            lookup_indices: self.data.read_array::<u16>(table + 4, count)?,
        })
    }

    /// Returns the number of lookups.
    pub fn lookup_count(&self) -> u16 {
        self.data.read_or_default::<u16>(self.lookups as usize)
    }

    fn lookup_base(&self, index: u16) -> Option<usize> {
        if index >= self.lookup_count() {
            return None;
        }
        let base = self.lookups as usize;
        let offset = self.data.read::<u16>(base + 2 + index as usize * 2)? as usize;
        Some(base + offset)
    }

    fn lookup_header(&self, index: u16) -> Option<(u16, LookupFlags, Option<u16>, usize, usize)> {
        let base = self.lookup_base(index)?;
        let kind = self.data.read::<u16>(base)?;
        let flags = LookupFlags(self.data.read::<u16>(base + 2)?);
        let count = self.data.read::<u16>(base + 4)? as usize;
        let mark_set = if flags.use_mark_filtering_set() {
            Some(self.data.read::<u16>(base + 6 + count * 2)?)
        } else {
            None
        };
        Some((kind, flags, mark_set, base, count))
    }

    fn subtable_offset(&self, base: usize, index: usize) -> Option<usize> {
        let offset = self.data.read::<u16>(base + 6 + index * 2)? as usize;
        Some(base + offset)
    }

    /// Returns the decoded substitution lookup at the specified index.
    pub fn gsub_lookup(&self, index: u16) -> Option<GsubLookup<'a>> {
        let (kind, flags, mark_set, base, count) = self.lookup_header(index)?;
        Some(GsubLookup {
            table: *self,
            kind,
            flags,
            mark_filtering_set: mark_set,
            base,
            subtable_count: count as u16,
        })
    }

    /// Returns the decoded positioning lookup at the specified index.
    pub fn gpos_lookup(&self, index: u16) -> Option<GposLookup<'a>> {
        let (kind, flags, mark_set, base, count) = self.lookup_header(index)?;
        Some(GposLookup {
            table: *self,
            kind,
            flags,
            mark_filtering_set: mark_set,
            base,
            subtable_count: count as u16,
        })
    }
}

/// Substitution lookup.
#[derive(Copy, Clone)]
pub struct GsubLookup<'a> {
    table: LayoutTable<'a>,
    pub kind: u16,
    pub flags: LookupFlags,
    pub mark_filtering_set: Option<u16>,
    base: usize,
    subtable_count: u16,
}

impl<'a> GsubLookup<'a> {
    pub fn subtable_count(&self) -> u16 {
        self.subtable_count
    }

    /// Returns the typed subtable at the specified index, resolving
    /// extension wrappers.
    pub fn subtable(&self, index: u16) -> Option<GsubSubtable<'a>> {
        if index >= self.subtable_count {
            return None;
        }
        let b = self.table.data;
        let mut offset = self.table.subtable_offset(self.base, index as usize)?;
        let mut kind = self.kind;
        if kind == 7 {
            kind = b.read::<u16>(offset + 2)?;
            offset += b.read::<u32>(offset + 4)? as usize;
        }
        let fmt = b.read::<u16>(offset)?;
        let coverage = || {
            let c = b.read::<u16>(offset + 2).unwrap_or(0);
            Coverage::new(b, offset as u32 + c as u32)
        };
        Some(match (kind, fmt) {
            (1, 1) => GsubSubtable::SingleDelta {
                coverage: coverage(),
                delta: b.read::<i16>(offset + 4)?,
            },
            (1, 2) => {
                let count = b.read::<u16>(offset + 4)? as usize;
                GsubSubtable::Single {
                    coverage: coverage(),
                    substitutes: b.read_array::<u16>(offset + 6, count)?,
                }
            }
            (2, 1) => GsubSubtable::Multiple(SequenceSubst { data: b, offset }),
            (3, 1) => GsubSubtable::Alternate(SequenceSubst { data: b, offset }),
            (4, 1) => GsubSubtable::Ligature(LigatureSubst { data: b, offset }),
            (5, _) => GsubSubtable::Context {
                format: fmt,
                offset: offset as u32,
            },
            (6, _) => GsubSubtable::ChainContext {
                format: fmt,
                offset: offset as u32,
            },
            (8, 1) => GsubSubtable::ReverseChain {
                coverage: coverage(),
                offset: offset as u32,
            },
            _ => return None,
        })
    }
}

/// Typed substitution subtable.
#[derive(Copy, Clone)]
pub enum GsubSubtable<'a> {
    /// Format 1 single substitution: add a delta to the glyph id.
    SingleDelta {
        coverage: Coverage<'a>,
        delta: i16,
    },
    /// Format 2 single substitution: parallel substitute array.
    Single {
        coverage: Coverage<'a>,
        substitutes: Array<'a, u16>,
    },
    /// One-to-many substitution.
    Multiple(SequenceSubst<'a>),
    /// Alternate selection.
    Alternate(SequenceSubst<'a>),
    /// Many-to-one ligature substitution.
    Ligature(LigatureSubst<'a>),
    /// Contextual rules; raw table surfaced for the shaping layer.
    Context {
        format: u16,
        offset: u32,
    },
    ChainContext {
        format: u16,
        offset: u32,
    },
    ReverseChain {
        coverage: Coverage<'a>,
        offset: u32,
    },
}

/// Shared layout of multiple and alternate substitutions: coverage plus
/// per-glyph sequences.
#[derive(Copy, Clone)]
pub struct SequenceSubst<'a> {
    data: Bytes<'a>,
    offset: usize,
}

impl<'a> SequenceSubst<'a> {
    pub fn coverage(&self) -> Coverage<'a> {
        let c = self.data.read_or_default::<u16>(self.offset + 2);
        Coverage::new(self.data, self.offset as u32 + c as u32)
    }

    /// Returns the sequence for the specified coverage index.
    pub fn sequence(&self, coverage_index: u16) -> Option<Array<'a, u16>> {
        let count = self.data.read::<u16>(self.offset + 4)?;
        if coverage_index >= count {
            return None;
        }
        let table = self.offset
            + self
                .data
                .read::<u16>(self.offset + 6 + coverage_index as usize * 2)? as usize;
        let len = self.data.read::<u16>(table)? as usize;
        self.data.read_array::<u16>(table + 2, len)
    }
}

/// Ligature substitution subtable.
#[derive(Copy, Clone)]
pub struct LigatureSubst<'a> {
    data: Bytes<'a>,
    offset: usize,
}

impl<'a> LigatureSubst<'a> {
    pub fn coverage(&self) -> Coverage<'a> {
        let c = self.data.read_or_default::<u16>(self.offset + 2);
        Coverage::new(self.data, self.offset as u32 + c as u32)
    }

    /// Returns the number of ligatures in the set for the specified
    /// coverage index.
    pub fn ligature_count(&self, coverage_index: u16) -> u16 {
        self.set(coverage_index)
            .and_then(|set| self.data.read::<u16>(set))
            .unwrap_or(0)
    }

    fn set(&self, coverage_index: u16) -> Option<usize> {
        let count = self.data.read::<u16>(self.offset + 4)?;
        if coverage_index >= count {
            return None;
        }
        let offset = self
            .data
            .read::<u16>(self.offset + 6 + coverage_index as usize * 2)?;
        Some(self.offset + offset as usize)
    }

    /// Returns (ligature glyph, component glyphs after the first) for
    /// the specified set and ligature index.
    pub fn ligature(
        &self,
        coverage_index: u16,
        ligature_index: u16,
    ) -> Option<(u16, Array<'a, u16>)> {
        let set = self.set(coverage_index)?;
        let count = self.data.read::<u16>(set)?;
        if ligature_index >= count {
            return None;
        }
        let table = set + self.data.read::<u16>(set + 2 + ligature_index as usize * 2)? as usize;
        let glyph = self.data.read::<u16>(table)?;
        let component_count = (self.data.read::<u16>(table + 2)? as usize).max(1) - 1;
        Some((glyph, self.data.read_array::<u16>(table + 4, component_count)?))
    }
}

/// Positioning value record. Device/variation index entries are
/// surfaced as raw offsets for delta resolution by the consumer.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct ValueRecord {
    pub x_placement: i16,
    pub y_placement: i16,
    pub x_advance: i16,
    pub y_advance: i16,
    pub x_placement_device: u16,
    pub y_placement_device: u16,
    pub x_advance_device: u16,
    pub y_advance_device: u16,
}

impl ValueRecord {
    /// Number of bytes occupied for the specified value format.
    pub fn size(format: u16) -> usize {
        (format & 0xFF).count_ones() as usize * 2
    }

    pub fn parse(b: &Bytes, offset: usize, format: u16) -> Option<(Self, usize)> {
        let mut record = Self::default();
        let mut cursor = offset;
        let mut read_i16 = |cursor: &mut usize| -> Option<i16> {
            let v = b.read::<i16>(*cursor)?;
            *cursor += 2;
            Some(v)
        };
        if format & 0x01 != 0 {
            record.x_placement = read_i16(&mut cursor)?;
        }
        if format & 0x02 != 0 {
            record.y_placement = read_i16(&mut cursor)?;
        }
        if format & 0x04 != 0 {
            record.x_advance = read_i16(&mut cursor)?;
        }
        if format & 0x08 != 0 {
            record.y_advance = read_i16(&mut cursor)?;
        }
        if format & 0x10 != 0 {
            record.x_placement_device = read_i16(&mut cursor)? as u16;
        }
        if format & 0x20 != 0 {
            record.y_placement_device = read_i16(&mut cursor)? as u16;
        }
        if format & 0x40 != 0 {
            record.x_advance_device = read_i16(&mut cursor)? as u16;
        }
        if format & 0x80 != 0 {
            record.y_advance_device = read_i16(&mut cursor)? as u16;
        }
        Some((record, cursor - offset))
    }
}

/// Anchor point for attachment positioning.
#[derive(Copy, Clone, Default, PartialEq, Eq, Debug)]
pub struct Anchor {
    pub x: i16,
    pub y: i16,
    /// Contour point index for format 2 anchors.
    pub contour_point: Option<u16>,
    /// Device or variation index table offsets for format 3 anchors.
    pub x_device: u16,
    pub y_device: u16,
}

impl Anchor {
    pub fn parse(b: &Bytes, offset: usize) -> Option<Self> {
        let format = b.read::<u16>(offset)?;
        let mut anchor = Self {
            x: b.read::<i16>(offset + 2)?,
            y: b.read::<i16>(offset + 4)?,
            ..Self::default()
        };
        match format {
            1 => {}
            2 => anchor.contour_point = Some(b.read::<u16>(offset + 6)?),
            3 => {
                anchor.x_device = b.read_or_default::<u16>(offset + 6);
                anchor.y_device = b.read_or_default::<u16>(offset + 8);
            }
            _ => return None,
        }
        Some(anchor)
    }
}

/// Positioning lookup.
#[derive(Copy, Clone)]
pub struct GposLookup<'a> {
    table: LayoutTable<'a>,
    pub kind: u16,
    pub flags: LookupFlags,
    pub mark_filtering_set: Option<u16>,
    base: usize,
    subtable_count: u16,
}

impl<'a> GposLookup<'a> {
    pub fn subtable_count(&self) -> u16 {
        self.subtable_count
    }

    /// Returns the typed subtable at the specified index, resolving
    /// extension wrappers.
    pub fn subtable(&self, index: u16) -> Option<GposSubtable<'a>> {
        if index >= self.subtable_count {
            return None;
        }
        let b = self.table.data;
        let mut offset = self.table.subtable_offset(self.base, index as usize)?;
        let mut kind = self.kind;
        if kind == 9 {
            kind = b.read::<u16>(offset + 2)?;
            offset += b.read::<u32>(offset + 4)? as usize;
        }
        let fmt = b.read::<u16>(offset)?;
        let coverage = || {
            let c = b.read::<u16>(offset + 2).unwrap_or(0);
            Coverage::new(b, offset as u32 + c as u32)
        };
        Some(match (kind, fmt) {
            (1, 1) => {
                let format = b.read::<u16>(offset + 4)?;
                let (value, _) = ValueRecord::parse(&b, offset + 6, format)?;
                GposSubtable::Single {
                    coverage: coverage(),
                    value,
                }
            }
            (1, 2) => GposSubtable::SingleArray(SingleValues {
                data: b,
                offset,
            }),
            (2, 1) => GposSubtable::Pairs(PairAdjust { data: b, offset }),
            (2, 2) => GposSubtable::ClassPairs(ClassPairAdjust { data: b, offset }),
            (3, 1) => GposSubtable::Cursive(CursiveAttach { data: b, offset }),
            (4, 1) => GposSubtable::MarkToBase(MarkAttach { data: b, offset }),
            (5, 1) => GposSubtable::MarkToLigature(MarkAttach { data: b, offset }),
            (6, 1) => GposSubtable::MarkToMark(MarkAttach { data: b, offset }),
            (7, _) => GposSubtable::Context {
                format: fmt,
                offset: offset as u32,
            },
            (8, _) => GposSubtable::ChainContext {
                format: fmt,
                offset: offset as u32,
            },
            _ => return None,
        })
    }
}

/// Typed positioning subtable.
#[derive(Copy, Clone)]
pub enum GposSubtable<'a> {
    /// Format 1 single adjustment: one value for every covered glyph.
    Single {
        coverage: Coverage<'a>,
        value: ValueRecord,
    },
    /// Format 2 single adjustment: per-glyph values.
    SingleArray(SingleValues<'a>),
    /// Glyph pair adjustment.
    Pairs(PairAdjust<'a>),
    /// Class pair adjustment.
    ClassPairs(ClassPairAdjust<'a>),
    /// Cursive entry/exit attachment.
    Cursive(CursiveAttach<'a>),
    MarkToBase(MarkAttach<'a>),
    MarkToLigature(MarkAttach<'a>),
    MarkToMark(MarkAttach<'a>),
    Context {
        format: u16,
        offset: u32,
    },
    ChainContext {
        format: u16,
        offset: u32,
    },
}

/// Single adjustment format 2: a value record per covered glyph.
#[derive(Copy, Clone)]
pub struct SingleValues<'a> {
    data: Bytes<'a>,
    offset: usize,
}

impl<'a> SingleValues<'a> {
    pub fn coverage(&self) -> Coverage<'a> {
        let c = self.data.read_or_default::<u16>(self.offset + 2);
        Coverage::new(self.data, self.offset as u32 + c as u32)
    }

    pub fn value(&self, coverage_index: u16) -> Option<ValueRecord> {
        let format = self.data.read::<u16>(self.offset + 4)?;
        let count = self.data.read::<u16>(self.offset + 6)?;
        if coverage_index >= count {
            return None;
        }
        let size = ValueRecord::size(format);
        let (value, _) = ValueRecord::parse(
            &self.data,
            self.offset + 8 + coverage_index as usize * size,
            format,
        )?;
        Some(value)
    }
}

/// Pair adjustment format 1.
#[derive(Copy, Clone)]
pub struct PairAdjust<'a> {
    data: Bytes<'a>,
    offset: usize,
}

impl<'a> PairAdjust<'a> {
    pub fn coverage(&self) -> Coverage<'a> {
        let c = self.data.read_or_default::<u16>(self.offset + 2);
        Coverage::new(self.data, self.offset as u32 + c as u32)
    }

    /// Returns the pair of value records for (first coverage index,
    /// second glyph).
    pub fn get(&self, coverage_index: u16, second: u16) -> Option<(ValueRecord, ValueRecord)> {
        let b = &self.data;
        let format1 = b.read::<u16>(self.offset + 4)?;
        let format2 = b.read::<u16>(self.offset + 6)?;
        let set_count = b.read::<u16>(self.offset + 8)?;
        if coverage_index >= set_count {
            return None;
        }
        let set = self.offset
            + b.read::<u16>(self.offset + 10 + coverage_index as usize * 2)? as usize;
        let count = b.read::<u16>(set)? as usize;
        let record_size = 2 + ValueRecord::size(format1) + ValueRecord::size(format2);
        let mut lo = 0;
        let mut hi = count;
        while lo < hi {
            let i = (lo + hi) / 2;
            let rec = set + 2 + i * record_size;
            let glyph = b.read::<u16>(rec)?;
            use core::cmp::Ordering::*;
            match second.cmp(&glyph) {
                Less => hi = i,
                Greater => lo = i + 1,
                Equal => {
                    let (first, used) = ValueRecord::parse(b, rec + 2, format1)?;
                    let (second, _) = ValueRecord::parse(b, rec + 2 + used, format2)?;
                    return Some((first, second));
                }
            }
        }
        None
    }
}

/// Pair adjustment format 2: class matrix.
#[derive(Copy, Clone)]
pub struct ClassPairAdjust<'a> {
    data: Bytes<'a>,
    offset: usize,
}

impl<'a> ClassPairAdjust<'a> {
    pub fn coverage(&self) -> Coverage<'a> {
        let c = self.data.read_or_default::<u16>(self.offset + 2);
        Coverage::new(self.data, self.offset as u32 + c as u32)
    }

    /// Returns the pair of value records for the specified glyphs.
    pub fn get(&self, first: u16, second: u16) -> Option<(ValueRecord, ValueRecord)> {
        let b = &self.data;
        let format1 = b.read::<u16>(self.offset + 4)?;
        let format2 = b.read::<u16>(self.offset + 6)?;
        let class1 = ClassDef::new(
            *b,
            self.offset as u32 + b.read::<u16>(self.offset + 8)? as u32,
        )
        .get(first) as usize;
        let class2 = ClassDef::new(
            *b,
            self.offset as u32 + b.read::<u16>(self.offset + 10)? as u32,
        )
        .get(second) as usize;
        let class1_count = b.read::<u16>(self.offset + 12)? as usize;
        let class2_count = b.read::<u16>(self.offset + 14)? as usize;
        if class1 >= class1_count || class2 >= class2_count {
            return None;
        }
        let record_size = ValueRecord::size(format1) + ValueRecord::size(format2);
        let rec = self.offset + 16 + (class1 * class2_count + class2) * record_size;
        let (first, used) = ValueRecord::parse(b, rec, format1)?;
        let (second, _) = ValueRecord::parse(b, rec + used, format2)?;
        Some((first, second))
    }
}

/// Cursive attachment subtable.
#[derive(Copy, Clone)]
pub struct CursiveAttach<'a> {
    data: Bytes<'a>,
    offset: usize,
}

impl<'a> CursiveAttach<'a> {
    pub fn coverage(&self) -> Coverage<'a> {
        let c = self.data.read_or_default::<u16>(self.offset + 2);
        Coverage::new(self.data, self.offset as u32 + c as u32)
    }

    /// Returns (entry, exit) anchors for the specified coverage index.
    pub fn entry_exit(&self, coverage_index: u16) -> (Option<Anchor>, Option<Anchor>) {
        let resolve = |at: usize| -> Option<Anchor> {
            let offset = self.data.read::<u16>(at).filter(|o| *o != 0)?;
            Anchor::parse(&self.data, self.offset + offset as usize)
        };
        let rec = self.offset + 6 + coverage_index as usize * 4;
        (resolve(rec), resolve(rec + 2))
    }
}

/// Mark attachment subtable, shared by mark-to-base, mark-to-ligature
/// and mark-to-mark.
#[derive(Copy, Clone)]
pub struct MarkAttach<'a> {
    data: Bytes<'a>,
    offset: usize,
}

impl<'a> MarkAttach<'a> {
    pub fn mark_coverage(&self) -> Coverage<'a> {
        let c = self.data.read_or_default::<u16>(self.offset + 2);
        Coverage::new(self.data, self.offset as u32 + c as u32)
    }

    pub fn base_coverage(&self) -> Coverage<'a> {
        let c = self.data.read_or_default::<u16>(self.offset + 4);
        Coverage::new(self.data, self.offset as u32 + c as u32)
    }

    pub fn mark_class_count(&self) -> u16 {
        self.data.read_or_default::<u16>(self.offset + 6)
    }

    /// Returns (class, anchor) for the mark at the specified coverage
    /// index.
    pub fn mark_anchor(&self, mark_index: u16) -> Option<(u16, Anchor)> {
        let array = self.offset + self.data.read::<u16>(self.offset + 8)? as usize;
        let count = self.data.read::<u16>(array)?;
        if mark_index >= count {
            return None;
        }
        let rec = array + 2 + mark_index as usize * 4;
        let class = self.data.read::<u16>(rec)?;
        let anchor_offset = self.data.read::<u16>(rec + 2)? as usize;
        Some((class, Anchor::parse(&self.data, array + anchor_offset)?))
    }

    /// Returns the base anchor for (base coverage index, mark class).
    pub fn base_anchor(&self, base_index: u16, class: u16) -> Option<Anchor> {
        let class_count = self.mark_class_count() as usize;
        let array = self.offset + self.data.read::<u16>(self.offset + 10)? as usize;
        let count = self.data.read::<u16>(array)?;
        if base_index >= count || class as usize >= class_count {
            return None;
        }
        let rec = array + 2 + (base_index as usize * class_count + class as usize) * 2;
        let anchor_offset = self.data.read::<u16>(rec).filter(|o| *o != 0)? as usize;
        Anchor::parse(&self.data, array + anchor_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage_format1(glyphs: &[u16]) -> Vec<u8> {
        let mut d = Vec::new();
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(&(glyphs.len() as u16).to_be_bytes());
        for g in glyphs {
            d.extend_from_slice(&g.to_be_bytes());
        }
        d
    }

    #[test]
    fn coverage_lookup() {
        let d = coverage_format1(&[3, 7, 20]);
        let coverage = Coverage::new(Bytes::new(&d), 0);
        assert_eq!(coverage.index(3), Some(0));
        assert_eq!(coverage.index(20), Some(2));
        assert_eq!(coverage.index(8), None);

        // Format 2 ranges.
        let mut d = Vec::new();
        d.extend_from_slice(&2u16.to_be_bytes());
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(&10u16.to_be_bytes()); // start
        d.extend_from_slice(&14u16.to_be_bytes()); // end
        d.extend_from_slice(&5u16.to_be_bytes()); // start index
        let coverage = Coverage::new(Bytes::new(&d), 0);
        assert_eq!(coverage.index(12), Some(7));
        assert_eq!(coverage.index(15), None);
    }

    #[test]
    fn classdef_ranges() {
        let mut d = Vec::new();
        d.extend_from_slice(&2u16.to_be_bytes());
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(&5u16.to_be_bytes());
        d.extend_from_slice(&9u16.to_be_bytes());
        d.extend_from_slice(&3u16.to_be_bytes());
        let classes = ClassDef::new(Bytes::new(&d), 0);
        assert_eq!(classes.get(7), 3);
        assert_eq!(classes.get(10), 0);
    }

    // Minimal GSUB with one single substitution (format 1) lookup.
    fn gsub_single_delta() -> Vec<u8> {
        let mut d = Vec::new();
        d.extend_from_slice(&0x00010000u32.to_be_bytes());
        d.extend_from_slice(&10u16.to_be_bytes()); // script list
        d.extend_from_slice(&12u16.to_be_bytes()); // feature list
        d.extend_from_slice(&14u16.to_be_bytes()); // lookup list
        d.extend_from_slice(&0u16.to_be_bytes()); // empty script list @10
        d.extend_from_slice(&0u16.to_be_bytes()); // empty feature list @12
        // lookup list @14
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(&4u16.to_be_bytes()); // lookup @18
        // lookup @18: type 1, flags 0, one subtable @8 (relative)
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(&0u16.to_be_bytes());
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(&8u16.to_be_bytes());
        // subtable @26: format 1, coverage @6, delta +1
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(&6u16.to_be_bytes());
        d.extend_from_slice(&1i16.to_be_bytes());
        d.extend_from_slice(&coverage_format1(&[5, 6]));
        d
    }

    #[test]
    fn gsub_single_lookup() {
        let d = gsub_single_delta();
        let table = LayoutTable::new(&d).unwrap();
        assert_eq!(table.lookup_count(), 1);
        let lookup = table.gsub_lookup(0).unwrap();
        assert_eq!(lookup.kind, 1);
        let subtable = lookup.subtable(0).unwrap();
        match subtable {
            GsubSubtable::SingleDelta { coverage, delta } => {
                assert_eq!(delta, 1);
                assert!(coverage.contains(5));
                assert!(!coverage.contains(7));
            }
            _ => panic!("expected a single substitution"),
        }
    }

    #[test]
    fn value_record_sizes() {
        assert_eq!(ValueRecord::size(0x0001), 2);
        assert_eq!(ValueRecord::size(0x000F), 8);
        let bytes = [0u8, 10, 0xFF, 0xF6]; // x_placement 10, x_advance -10
        let b = Bytes::new(&bytes);
        let (record, used) = ValueRecord::parse(&b, 0, 0x0005).unwrap();
        assert_eq!(used, 4);
        assert_eq!(record.x_placement, 10);
        assert_eq!(record.x_advance, -10);
        assert_eq!(record.y_advance, 0);
    }
}
