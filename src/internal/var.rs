//! Font and metric variation tables.

use super::{fixed::Fixed, raw_tag, Array, Bytes, RawFont, RawTag, U24};

pub const FVAR: RawTag = raw_tag(b"fvar");
pub const AVAR: RawTag = raw_tag(b"avar");
pub const HVAR: RawTag = raw_tag(b"HVAR");
pub const VVAR: RawTag = raw_tag(b"VVAR");
pub const MVAR: RawTag = raw_tag(b"MVAR");
pub const GVAR: RawTag = raw_tag(b"gvar");

/// Font variations table.
#[derive(Copy, Clone)]
pub struct Fvar<'a> {
    data: Bytes<'a>,
    axis_offset: u16,
    axis_count: u16,
    axis_size: u16,
    inst_count: u16,
    inst_size: u16,
}

impl<'a> Fvar<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let b = Bytes::new(data);
        Self {
            data: b,
            axis_offset: b.read_or_default(4),
            axis_count: b.read_or_default(8),
            axis_size: b.read_or_default(10),
            inst_count: b.read_or_default(12),
            inst_size: b.read_or_default(14),
        }
    }

    pub fn from_font(font: impl RawFont<'a>) -> Option<Self> {
        Some(Self::new(font.table_data(FVAR)?))
    }

    pub fn axis_count(&self) -> u16 {
        self.axis_count
    }

    pub fn get_axis(&self, index: u16) -> Option<VarAxis> {
        if index >= self.axis_count {
            return None;
        }
        let b = &self.data;
        let offset = self.axis_offset as usize + index as usize * self.axis_size as usize;
        Some(VarAxis {
            index,
            tag: b.read(offset)?,
            min: b.read::<Fixed>(offset + 4)?,
            default: b.read::<Fixed>(offset + 8)?,
            max: b.read::<Fixed>(offset + 12)?,
            flags: b.read(offset + 16)?,
            name_id: b.read(offset + 18)?,
        })
    }

    pub fn get_axis_by_tag(&self, tag: RawTag) -> Option<VarAxis> {
        (0..self.axis_count)
            .filter_map(|i| self.get_axis(i))
            .find(|axis| axis.tag == tag)
    }

    pub fn instance_count(&self) -> u16 {
        self.inst_count
    }

    pub fn get_instance(&self, index: u16) -> Option<VarInstance<'a>> {
        if index >= self.inst_count {
            return None;
        }
        let b = &self.data;
        let base =
            self.axis_offset as usize + self.axis_count as usize * self.axis_size as usize;
        let offset = base + index as usize * self.inst_size as usize;
        let name_id = b.read::<u16>(offset)?;
        let values = b.read_array::<Fixed>(offset + 4, self.axis_count as usize)?;
        // The PostScript name id is present only when the instance record
        // size leaves room for it past the coordinate array.
        let ps_offset = 4 + self.axis_count as usize * 4;
        let postscript_name_id = if ps_offset + 2 == self.inst_size as usize {
            b.read::<u16>(offset + ps_offset)
        } else {
            None
        };
        Some(VarInstance {
            index,
            name_id,
            postscript_name_id,
            values,
        })
    }
}

/// Axis of variation in a variable font.
#[derive(Copy, Clone, Default)]
pub struct VarAxis {
    pub index: u16,
    pub tag: RawTag,
    pub name_id: u16,
    pub flags: u16,
    pub min: Fixed,
    pub default: Fixed,
    pub max: Fixed,
}

impl VarAxis {
    /// Returns true if the axis should be hidden in a user interface.
    pub fn is_hidden(&self) -> bool {
        self.flags & 1 != 0
    }

    /// Returns a normalized axis coordinate for the specified user space
    /// value in 2.14 fixed point format, applying the `avar` mapping when
    /// one is supplied as `(font_data, avar_offset)`.
    pub fn normalized_coord(&self, value: Fixed, avar: Option<(&[u8], u32)>) -> i16 {
        use core::cmp::Ordering::*;
        let value = value.clamp(self.min, self.max);
        let value = match value.cmp(&self.default) {
            // Either side collapses to zero when default meets the bound.
            Less if self.default > self.min => {
                -((self.default - value) / (self.default - self.min))
            }
            Greater if self.max > self.default => {
                (value - self.default) / (self.max - self.default)
            }
            _ => Fixed::ZERO,
        };
        let value = value.clamp(-Fixed::ONE, Fixed::ONE);
        avar.and_then(|(data, offset)| adjust_axis(data, offset, self.index, value))
            .unwrap_or(value)
            .clamp(-Fixed::ONE, Fixed::ONE)
            .to_f2dot14()
    }
}

/// Named instance in a variable font.
#[derive(Copy, Clone)]
pub struct VarInstance<'a> {
    pub index: u16,
    pub name_id: u16,
    pub postscript_name_id: Option<u16>,
    pub values: Array<'a, Fixed>,
}

/// Applies the piecewise linear remap from the axis variation table to an
/// already normalized coordinate.
pub fn adjust_axis(data: &[u8], avar: u32, axis: u16, coord: Fixed) -> Option<Fixed> {
    if avar == 0 {
        return None;
    }
    let b = Bytes::with_offset(data, avar as usize)?;
    if b.read_u16(0)? != 1 {
        return None;
    }
    let axis_count = b.read_u16(6)?;
    if axis >= axis_count {
        return None;
    }
    // Segment maps are variable length; walk to the requested axis.
    let mut offset = 8usize;
    for _ in 0..axis {
        let count = b.read_u16(offset)? as usize;
        offset += 2 + count * 4;
    }
    let count = b.read_u16(offset)? as usize;
    let maps = b.read_array::<i16>(offset + 2, count * 2)?;
    if count == 0 {
        return Some(coord);
    }
    let from = |i: usize| Fixed::from_f2dot14(maps.get_or(i * 2, 0));
    let to = |i: usize| Fixed::from_f2dot14(maps.get_or(i * 2 + 1, 0));
    if coord <= from(0) {
        return Some(to(0));
    }
    for i in 1..count {
        let start = from(i - 1);
        let end = from(i);
        if coord == end {
            return Some(to(i));
        }
        if coord < end {
            if end == start {
                return Some(to(i));
            }
            let t = (coord - start) / (end - start);
            return Some(to(i - 1) + t * (to(i) - to(i - 1)));
        }
    }
    Some(to(count - 1))
}

/// Computes the scalar contribution of one region axis given the
/// normalized coordinate `coord` and the region triple. Mirrors the tuple
/// scalar rules: a zero peak never participates.
fn axis_scalar(coord: Fixed, start: Fixed, peak: Fixed, end: Fixed) -> Option<Fixed> {
    const ZERO: Fixed = Fixed::ZERO;
    if peak == ZERO || start > peak || peak > end {
        return Some(Fixed::ONE);
    }
    // Regions straddling zero are rejected by the spec.
    if start < ZERO && end > ZERO {
        return Some(Fixed::ONE);
    }
    if coord < start || coord > end {
        return None;
    }
    Some(if coord == peak {
        Fixed::ONE
    } else if coord < peak {
        (coord - start) / (peak - start)
    } else {
        (end - coord) / (end - peak)
    })
}

/// Returns a delta from an item variation store.
///
/// `offset` addresses the store itself within `data`; `(outer, inner)`
/// select the delta set. Deltas are weighted by each referenced region's
/// scalar at `coords` and summed.
pub fn item_delta(
    data: &[u8],
    offset: u32,
    outer: u16,
    inner: u16,
    coords: &[i16],
) -> Option<Fixed> {
    if offset == 0 {
        return None;
    }
    let b = Bytes::new(data);
    let store = offset as usize;
    if outer >= b.read::<u16>(store + 6)? {
        return None;
    }
    let region_base = store + b.read::<u32>(store + 2)? as usize;
    let axis_count = b.read::<u16>(region_base)? as usize;
    let region_count = b.read::<u16>(region_base + 2)? as usize;
    let region_record_size = axis_count * 6;
    let data_base = store + b.read::<u32>(store + 8 + outer as usize * 4)? as usize;
    let item_count = b.read::<u16>(data_base)?;
    if inner >= item_count {
        return None;
    }
    let word_info = b.read::<u16>(data_base + 2)?;
    let long_words = word_info & 0x8000 != 0;
    let word_count = (word_info & 0x7FFF) as usize;
    let region_index_count = b.read::<u16>(data_base + 4)? as usize;
    let region_index_base = data_base + 6;
    let (word_size, short_size) = if long_words { (4, 2) } else { (2, 1) };
    let row_size = word_count * word_size + region_index_count.checked_sub(word_count)? * short_size;
    let row_base = region_index_base + region_index_count * 2 + inner as usize * row_size;
    let mut delta = Fixed::ZERO;
    let mut cursor = row_base;
    for i in 0..region_index_count {
        let value = if i < word_count {
            let v = if long_words {
                b.read::<i32>(cursor)?
            } else {
                b.read::<i16>(cursor)? as i32
            };
            cursor += word_size;
            v
        } else {
            let v = if long_words {
                b.read::<i16>(cursor)? as i32
            } else {
                b.read::<i8>(cursor)? as i32
            };
            cursor += short_size;
            v
        };
        let region_index = b.read::<u16>(region_index_base + i * 2)? as usize;
        if region_index >= region_count {
            return None;
        }
        let region_offset = region_base + 4 + region_index * region_record_size;
        let mut scalar = Fixed::ONE;
        for axis in 0..axis_count {
            let rec = region_offset + axis * 6;
            let start = Fixed::from_f2dot14(b.read::<i16>(rec)?);
            let peak = Fixed::from_f2dot14(b.read::<i16>(rec + 2)?);
            let end = Fixed::from_f2dot14(b.read::<i16>(rec + 4)?);
            let coord = coords
                .get(axis)
                .map(|c| Fixed::from_f2dot14(*c))
                .unwrap_or(Fixed::ZERO);
            match axis_scalar(coord, start, peak, end) {
                Some(factor) => scalar = scalar * factor,
                None => {
                    scalar = Fixed::ZERO;
                    break;
                }
            }
        }
        delta += scalar * Fixed::from_i32(value);
    }
    Some(delta)
}

/// Returns the per-region scalars for the item variation data subtable at
/// the specified outer index. The CFF2 blend operator weights its delta
/// operands with these.
pub fn region_scalars(
    data: &[u8],
    offset: u32,
    outer: u16,
    coords: &[i16],
) -> Option<Vec<Fixed>> {
    if offset == 0 {
        return None;
    }
    let b = Bytes::new(data);
    let store = offset as usize;
    if outer >= b.read::<u16>(store + 6)? {
        return None;
    }
    let region_base = store + b.read::<u32>(store + 2)? as usize;
    let axis_count = b.read::<u16>(region_base)? as usize;
    let region_count = b.read::<u16>(region_base + 2)? as usize;
    let data_base = store + b.read::<u32>(store + 8 + outer as usize * 4)? as usize;
    let region_index_count = b.read::<u16>(data_base + 4)? as usize;
    let mut scalars = Vec::with_capacity(region_index_count);
    for i in 0..region_index_count {
        let region_index = b.read::<u16>(data_base + 6 + i * 2)? as usize;
        if region_index >= region_count {
            return None;
        }
        let region_offset = region_base + 4 + region_index * axis_count * 6;
        let mut scalar = Fixed::ONE;
        for axis in 0..axis_count {
            let rec = region_offset + axis * 6;
            let start = Fixed::from_f2dot14(b.read::<i16>(rec)?);
            let peak = Fixed::from_f2dot14(b.read::<i16>(rec + 2)?);
            let end = Fixed::from_f2dot14(b.read::<i16>(rec + 4)?);
            let coord = coords
                .get(axis)
                .map(|c| Fixed::from_f2dot14(*c))
                .unwrap_or(Fixed::ZERO);
            match axis_scalar(coord, start, peak, end) {
                Some(factor) => scalar = scalar * factor,
                None => {
                    scalar = Fixed::ZERO;
                    break;
                }
            }
        }
        scalars.push(scalar);
    }
    Some(scalars)
}

/// Returns the advance delta for the specified glyph from an `HVAR` or
/// `VVAR` table.
pub fn advance_delta(data: &[u8], xvar: u32, glyph_id: u16, coords: &[i16]) -> f32 {
    metric_delta(data, xvar, 8, glyph_id, coords)
        .map(|d| d.to_f32())
        .unwrap_or(0.)
}

/// Returns the side bearing delta for the specified glyph from an `HVAR`
/// or `VVAR` table.
pub fn sb_delta(data: &[u8], xvar: u32, glyph_id: u16, coords: &[i16]) -> f32 {
    metric_delta(data, xvar, 12, glyph_id, coords)
        .map(|d| d.to_f32())
        .unwrap_or(0.)
}

fn metric_delta(
    data: &[u8],
    base: u32,
    which: usize,
    glyph_id: u16,
    coords: &[i16],
) -> Option<Fixed> {
    if base == 0 {
        return None;
    }
    let b = Bytes::new(data);
    let store = base.checked_add(b.read::<u32>(base as usize + 4)?)?;
    if store == base {
        return None;
    }
    let map_offset = b.read::<u32>(base as usize + which)? as usize;
    if map_offset == 0 {
        // Advances fall back to direct glyph id indexing; side bearings
        // require an index map.
        if which == 8 {
            return item_delta(data, store, 0, glyph_id, coords);
        }
        return None;
    }
    let map = base as usize + map_offset;
    let format = b.read::<u16>(map)? as u32;
    let count = b.read::<u16>(map + 2)?;
    if count == 0 {
        return None;
    }
    let bit_count = (format & 0xF) + 1;
    let entry_size = ((format & 0x30) >> 4) + 1;
    let index = glyph_id.min(count - 1) as usize;
    let entry_base = map + 4;
    let entry = match entry_size {
        1 => b.read::<u8>(entry_base + index)? as u32,
        2 => b.read::<u16>(entry_base + index * 2)? as u32,
        3 => b.read::<U24>(entry_base + index * 3)?.0,
        4 => b.read::<u32>(entry_base + index * 4)?,
        _ => return None,
    };
    let outer = entry >> bit_count;
    let inner = entry & ((1 << bit_count) - 1);
    item_delta(data, store, outer as u16, inner as u16, coords)
}

/// Metrics variation table.
pub struct Mvar<'a> {
    data: Bytes<'a>,
    coords: &'a [i16],
    rec_size: usize,
    rec_count: usize,
    store: u32,
}

impl<'a> Mvar<'a> {
    pub fn new(data: &'a [u8], mvar: u32, coords: &'a [i16]) -> Option<Self> {
        let b = Bytes::with_offset(data, mvar as usize)?;
        let rec_size = b.read::<u16>(6)? as usize;
        let rec_count = b.read::<u16>(8)? as usize;
        let store = b.read::<u16>(10)? as u32;
        if rec_count == 0 || store == 0 || rec_size < 8 {
            return None;
        }
        Some(Self {
            data: b,
            coords,
            rec_size,
            rec_count,
            store,
        })
    }

    /// Returns the delta for the specified metric tag, or zero when the
    /// metric does not vary.
    pub fn delta(&self, metric: RawTag) -> f32 {
        self.read_delta(metric).map(|d| d.to_f32()).unwrap_or(0.)
    }

    fn read_delta(&self, metric: RawTag) -> Option<Fixed> {
        use core::cmp::Ordering::*;
        let base = 12;
        let b = &self.data;
        let mut lo = 0;
        let mut hi = self.rec_count;
        while lo < hi {
            let i = (lo + hi) / 2;
            let offset = base + i * self.rec_size;
            match metric.cmp(&b.read::<u32>(offset)?) {
                Less => hi = i,
                Greater => lo = i + 1,
                Equal => {
                    let inner = b.read::<u16>(offset + 4)?;
                    let outer = b.read::<u16>(offset + 6)?;
                    return item_delta(b.data(), self.store, outer, inner, self.coords);
                }
            }
        }
        None
    }
}

/// Tags for metrics from the `MVAR` table.
pub mod mvar_tags {
    use super::{raw_tag, RawTag};

    /// Horizontal ascender.
    pub const HASC: RawTag = raw_tag(b"hasc");
    /// Horizontal descender.
    pub const HDSC: RawTag = raw_tag(b"hdsc");
    /// Horizontal line gap.
    pub const HLGP: RawTag = raw_tag(b"hlgp");
    /// Horizontal clipping ascent.
    pub const HCLA: RawTag = raw_tag(b"hcla");
    /// Horizontal clipping descent.
    pub const HCLD: RawTag = raw_tag(b"hcld");
    /// Vertical ascender.
    pub const VASC: RawTag = raw_tag(b"vasc");
    /// Vertical descender.
    pub const VDSC: RawTag = raw_tag(b"vdsc");
    /// Vertical line gap.
    pub const VLGP: RawTag = raw_tag(b"vlgp");
    /// X-height.
    pub const XHGT: RawTag = raw_tag(b"xhgt");
    /// Cap height.
    pub const CPHT: RawTag = raw_tag(b"cpht");
    /// Underline offset.
    pub const UNDO: RawTag = raw_tag(b"undo");
    /// Underline size.
    pub const UNDS: RawTag = raw_tag(b"unds");
    /// Strikeout offset.
    pub const STRO: RawTag = raw_tag(b"stro");
    /// Strikeout size.
    pub const STRS: RawTag = raw_tag(b"strs");
}

/// Per-glyph tuple variations from the `gvar` table.
pub mod gvar {
    use super::*;
    use crate::internal::Stream;

    const EMBEDDED_PEAK_TUPLE: u16 = 0x8000;
    const INTERMEDIATE_REGION: u16 = 0x4000;
    const PRIVATE_POINT_NUMBERS: u16 = 0x2000;
    const TUPLE_INDEX_MASK: u16 = 0x0FFF;

    const SHARED_POINT_NUMBERS: u16 = 0x8000;
    const TUPLE_COUNT_MASK: u16 = 0x0FFF;

    /// Accumulated per-point deltas for one glyph at one position in
    /// design space. Indices cover the glyph's points plus the four
    /// phantom points.
    pub type Deltas = Vec<(Fixed, Fixed)>;

    /// Computes the scalar for a single tuple given peaks and the
    /// optional intermediate region, per axis.
    pub fn tuple_scalar(
        coords: &[i16],
        peaks: Array<i16>,
        intermediate: Option<(Array<i16>, Array<i16>)>,
    ) -> Fixed {
        let mut scalar = Fixed::ONE;
        for (axis, peak) in peaks.iter().enumerate() {
            let peak = Fixed::from_f2dot14(peak);
            if peak == Fixed::ZERO {
                continue;
            }
            let coord = coords
                .get(axis)
                .map(|c| Fixed::from_f2dot14(*c))
                .unwrap_or(Fixed::ZERO);
            let (start, end) = match &intermediate {
                Some((starts, ends)) => (
                    Fixed::from_f2dot14(starts.get_or(axis, 0)),
                    Fixed::from_f2dot14(ends.get_or(axis, 0)),
                ),
                None => (peak.min(Fixed::ZERO), peak.max(Fixed::ZERO)),
            };
            match axis_scalar(coord, start, peak, end) {
                Some(factor) => scalar = scalar * factor,
                None => return Fixed::ZERO,
            }
        }
        scalar
    }

    /// Accumulates outline deltas for the specified glyph at the
    /// specified normalized coordinates. `point_count` is the glyph's
    /// point count without the four phantom points. Returns `None` when
    /// the glyph carries no variation data.
    pub fn deltas(
        data: &[u8],
        gvar: u32,
        glyph_id: u16,
        coords: &[i16],
        point_count: usize,
    ) -> Option<Deltas> {
        if gvar == 0 || coords.is_empty() {
            return None;
        }
        let b = Bytes::with_offset(data, gvar as usize)?;
        let axis_count = b.read::<u16>(4)? as usize;
        let shared_tuple_count = b.read::<u16>(6)? as usize;
        let shared_tuples = b.read::<u32>(8)? as usize;
        let glyph_count = b.read::<u16>(12)? as usize;
        let flags = b.read::<u16>(14)?;
        let glyph_data_base = b.read::<u32>(16)? as usize;
        if glyph_id as usize >= glyph_count {
            return None;
        }
        // Offsets array is short (x2) or long depending on bit zero.
        let (start, end) = if flags & 1 == 0 {
            let base = 20 + glyph_id as usize * 2;
            (
                b.read::<u16>(base)? as usize * 2,
                b.read::<u16>(base + 2)? as usize * 2,
            )
        } else {
            let base = 20 + glyph_id as usize * 4;
            (b.read::<u32>(base)? as usize, b.read::<u32>(base + 4)? as usize)
        };
        if end <= start {
            return None;
        }
        let glyph_var = Bytes::with_range(
            b.data(),
            glyph_data_base + start..glyph_data_base + end,
        )?;
        let tuple_info = glyph_var.read::<u16>(0)?;
        let tuple_count = (tuple_info & TUPLE_COUNT_MASK) as usize;
        let mut serialized = glyph_var.read::<u16>(2)? as usize;
        let total = point_count + 4;
        let mut deltas = vec![(Fixed::ZERO, Fixed::ZERO); total];
        let mut shared_points: Option<Vec<u16>> = None;
        if tuple_info & SHARED_POINT_NUMBERS != 0 {
            let mut s = glyph_var.stream_at(serialized)?;
            shared_points = Some(read_packed_points(&mut s, total)?);
            serialized += s.offset();
        }
        let mut header = glyph_var.stream_at(4)?;
        let mut data_offset = serialized;
        for _ in 0..tuple_count {
            let size = header.read_u16()? as usize;
            let index = header.read_u16()?;
            let peaks = if index & EMBEDDED_PEAK_TUPLE != 0 {
                header.read_array::<i16>(axis_count)?
            } else {
                let shared = (index & TUPLE_INDEX_MASK) as usize;
                if shared >= shared_tuple_count {
                    return None;
                }
                b.read_array::<i16>(shared_tuples + shared * axis_count * 2, axis_count)?
            };
            let intermediate = if index & INTERMEDIATE_REGION != 0 {
                let starts = header.read_array::<i16>(axis_count)?;
                let ends = header.read_array::<i16>(axis_count)?;
                Some((starts, ends))
            } else {
                None
            };
            let scalar = tuple_scalar(coords, peaks, intermediate);
            let mut body = glyph_var.stream_at(data_offset)?;
            data_offset += size;
            if scalar == Fixed::ZERO {
                continue;
            }
            let private_points;
            let points: Option<&[u16]> = if index & PRIVATE_POINT_NUMBERS != 0 {
                private_points = read_packed_points(&mut body, total)?;
                if private_points.is_empty() {
                    None
                } else {
                    Some(&private_points)
                }
            } else {
                match &shared_points {
                    Some(points) if !points.is_empty() => Some(points),
                    _ => None,
                }
            };
            let delta_count = points.map(|p| p.len()).unwrap_or(total);
            let x_deltas = read_packed_deltas(&mut body, delta_count)?;
            let y_deltas = read_packed_deltas(&mut body, delta_count)?;
            match points {
                Some(points) => {
                    for (i, &point) in points.iter().enumerate() {
                        if let Some(slot) = deltas.get_mut(point as usize) {
                            slot.0 += scalar * Fixed::from_i32(x_deltas[i] as i32);
                            slot.1 += scalar * Fixed::from_i32(y_deltas[i] as i32);
                        }
                    }
                }
                None => {
                    for (i, slot) in deltas.iter_mut().enumerate() {
                        slot.0 += scalar * Fixed::from_i32(x_deltas[i] as i32);
                        slot.1 += scalar * Fixed::from_i32(y_deltas[i] as i32);
                    }
                }
            }
        }
        Some(deltas)
    }

    /// Decodes a packed point number list. An initial count of zero means
    /// "all points" and yields an empty list.
    pub fn read_packed_points(s: &mut Stream, max_points: usize) -> Option<Vec<u16>> {
        const POINTS_ARE_WORDS: u8 = 0x80;
        let first = s.read_u8()?;
        let count = if first & POINTS_ARE_WORDS != 0 {
            ((first & 0x7F) as usize) << 8 | s.read_u8()? as usize
        } else {
            first as usize
        };
        if count == 0 {
            return Some(Vec::new());
        }
        if count > max_points {
            return None;
        }
        let mut points = Vec::with_capacity(count);
        let mut last = 0u16;
        while points.len() < count {
            let control = s.read_u8()?;
            let run_len = (control & 0x7F) as usize + 1;
            let words = control & POINTS_ARE_WORDS != 0;
            for _ in 0..run_len {
                if points.len() >= count {
                    break;
                }
                let delta = if words {
                    s.read_u16()?
                } else {
                    s.read_u8()? as u16
                };
                last = last.checked_add(delta)?;
                points.push(last);
            }
        }
        Some(points)
    }

    /// Decodes a packed delta stream of exactly `count` values.
    pub fn read_packed_deltas(s: &mut Stream, count: usize) -> Option<Vec<i16>> {
        const DELTAS_ARE_ZERO: u8 = 0x80;
        const DELTAS_ARE_WORDS: u8 = 0x40;
        const DELTA_RUN_COUNT_MASK: u8 = 0x3F;
        let mut deltas = Vec::with_capacity(count);
        while deltas.len() < count {
            let control = s.read_u8()?;
            let run_len = (control & DELTA_RUN_COUNT_MASK) as usize + 1;
            for _ in 0..run_len {
                if deltas.len() >= count {
                    // A run must not extend past the declared count.
                    return None;
                }
                let value = if control & DELTAS_ARE_ZERO != 0 {
                    0
                } else if control & DELTAS_ARE_WORDS != 0 {
                    s.read_i16()?
                } else {
                    s.read_i8()? as i16
                };
                deltas.push(value);
            }
        }
        Some(deltas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::Stream;

    fn f2(v: f32) -> i16 {
        (v * 16384.) as i16
    }

    fn axis(min: f32, default: f32, max: f32) -> VarAxis {
        VarAxis {
            min: Fixed::from_f32(min),
            default: Fixed::from_f32(default),
            max: Fixed::from_f32(max),
            ..Default::default()
        }
    }

    #[test]
    fn normalization() {
        let wdth = axis(30., 100., 150.);
        let coord = wdth.normalized_coord(Fixed::from_f32(75.), None);
        let value = coord as f32 / 16384.;
        assert!((value + 0.357142).abs() < 1e-3, "{value}");
        assert_eq!(wdth.normalized_coord(Fixed::from_f32(100.), None), 0);
        assert_eq!(wdth.normalized_coord(Fixed::from_f32(30.), None), -16384);
        assert_eq!(wdth.normalized_coord(Fixed::from_f32(150.), None), 16384);
        // Clamped outside the range.
        assert_eq!(wdth.normalized_coord(Fixed::from_f32(1000.), None), 16384);
    }

    #[test]
    fn degenerate_axis_halves() {
        let a = axis(100., 100., 150.);
        assert_eq!(a.normalized_coord(Fixed::from_f32(100.), None), 0);
        let b = axis(30., 100., 100.);
        assert_eq!(b.normalized_coord(Fixed::from_f32(100.), None), 0);
    }

    fn peaks(values: &[f32]) -> Vec<u8> {
        values
            .iter()
            .flat_map(|v| f2(*v).to_be_bytes())
            .collect()
    }

    #[test]
    fn tuple_scalar_simple() {
        let peak_bytes = peaks(&[1.0, 0.0, 0.0]);
        let peak = Array::<i16>::new(&peak_bytes);
        let coords = [f2(0.5), 0, 0];
        let scalar = gvar::tuple_scalar(&coords, peak, None);
        assert!((scalar.to_f32() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn tuple_scalar_product_across_axes() {
        let peak_bytes = peaks(&[1.0, 1.0, 0.0]);
        let peak = Array::<i16>::new(&peak_bytes);
        let coords = [f2(0.5), f2(0.5), 0];
        let scalar = gvar::tuple_scalar(&coords, peak, None);
        assert!((scalar.to_f32() - 0.25).abs() < 1e-3);
    }

    #[test]
    fn tuple_scalar_at_peak_is_one() {
        let peak_bytes = peaks(&[0.75, -0.5]);
        let peak = Array::<i16>::new(&peak_bytes);
        let coords = [f2(0.75), f2(-0.5)];
        assert_eq!(gvar::tuple_scalar(&coords, peak, None), Fixed::ONE);
    }

    #[test]
    fn tuple_scalar_at_origin_is_zero() {
        let peak_bytes = peaks(&[0.75]);
        let peak = Array::<i16>::new(&peak_bytes);
        assert_eq!(gvar::tuple_scalar(&[0], peak, None), Fixed::ZERO);
        // Opposite sign of the peak.
        assert_eq!(gvar::tuple_scalar(&[f2(-0.25)], peak, None), Fixed::ZERO);
    }

    #[test]
    fn packed_deltas_zero_run() {
        let bytes = [0x82u8];
        let mut s = Stream::new(&bytes);
        let deltas = gvar::read_packed_deltas(&mut s, 3).unwrap();
        assert_eq!(deltas, [0, 0, 0]);
        assert_eq!(s.offset(), 1);
    }

    #[test]
    fn packed_deltas_mixed_runs() {
        // Two byte deltas, then two word deltas, then one zero run.
        let bytes = [0x01, 0x05, 0xFB, 0x41, 0x01, 0x00, 0xFF, 0x9C, 0x80];
        let mut s = Stream::new(&bytes);
        let deltas = gvar::read_packed_deltas(&mut s, 5).unwrap();
        assert_eq!(deltas, [5, -5, 256, -100, 0]);
        assert_eq!(s.offset(), bytes.len());
    }

    #[test]
    fn packed_deltas_overrun_rejected() {
        // Declares a run of 4 but only 3 deltas are expected.
        let bytes = [0x03, 1, 2, 3, 4];
        let mut s = Stream::new(&bytes);
        assert!(gvar::read_packed_deltas(&mut s, 3).is_none());
    }

    #[test]
    fn packed_points() {
        // count=3, one byte run: deltas 2, 3, 4 -> points 2, 5, 9.
        let bytes = [0x03, 0x02, 2, 3, 4];
        let mut s = Stream::new(&bytes);
        let points = gvar::read_packed_points(&mut s, 16).unwrap();
        assert_eq!(points, [2, 5, 9]);
        // Zero count means all points.
        let bytes = [0x00];
        let mut s = Stream::new(&bytes);
        assert!(gvar::read_packed_points(&mut s, 16).unwrap().is_empty());
    }

    fn store_with_one_region() -> Vec<u8> {
        // Item variation store at offset 0: one axis, one region peaking
        // at wght=1.0, one item data with a single int16 delta of 120.
        let mut d = Vec::new();
        d.extend_from_slice(&1u16.to_be_bytes()); // format
        d.extend_from_slice(&16u32.to_be_bytes()); // region list offset
        d.extend_from_slice(&1u16.to_be_bytes()); // data count
        d.extend_from_slice(&26u32.to_be_bytes()); // data[0] offset
        d.extend_from_slice(&[0; 4]); // padding to 16
        assert_eq!(d.len(), 16);
        // Region list
        d.extend_from_slice(&1u16.to_be_bytes()); // axis count
        d.extend_from_slice(&1u16.to_be_bytes()); // region count
        d.extend_from_slice(&0i16.to_be_bytes()); // start
        d.extend_from_slice(&16384i16.to_be_bytes()); // peak
        d.extend_from_slice(&16384i16.to_be_bytes()); // end
        assert_eq!(d.len(), 26);
        // Item variation data
        d.extend_from_slice(&1u16.to_be_bytes()); // item count
        d.extend_from_slice(&1u16.to_be_bytes()); // word delta count
        d.extend_from_slice(&1u16.to_be_bytes()); // region index count
        d.extend_from_slice(&0u16.to_be_bytes()); // region index 0
        d.extend_from_slice(&120i16.to_be_bytes()); // delta
        d
    }

    #[test]
    fn item_store_delta() {
        let d = store_with_one_region();
        let full = item_delta(&d, 0, 0, 0, &[16384]).unwrap();
        assert_eq!(full.to_i32(), 120);
        let half = item_delta(&d, 0, 0, 0, &[8192]).unwrap();
        assert_eq!(half.to_i32(), 60);
        let none = item_delta(&d, 0, 0, 0, &[0]).unwrap();
        assert_eq!(none.to_i32(), 0);
        // Out of range indices are rejected.
        assert!(item_delta(&d, 0, 1, 0, &[16384]).is_none());
        assert!(item_delta(&d, 0, 0, 1, &[16384]).is_none());
    }

    fn avar_table(maps: &[(f32, f32)]) -> Vec<u8> {
        let mut d = Vec::new();
        d.extend_from_slice(&1u16.to_be_bytes()); // major
        d.extend_from_slice(&0u16.to_be_bytes()); // minor
        d.extend_from_slice(&0u16.to_be_bytes()); // reserved
        d.extend_from_slice(&1u16.to_be_bytes()); // axis count
        d.extend_from_slice(&(maps.len() as u16).to_be_bytes());
        for (from, to) in maps {
            d.extend_from_slice(&f2(*from).to_be_bytes());
            d.extend_from_slice(&f2(*to).to_be_bytes());
        }
        d
    }

    #[test]
    fn avar_remap() {
        // Offset zero is the "no avar" sentinel, so place the table at 4.
        let mut d = vec![0u8; 4];
        d.extend_from_slice(&avar_table(&[(-1., -1.), (0., 0.), (0.5, 0.25), (1., 1.)]));
        // Default maps to zero.
        assert_eq!(adjust_axis(&d, 4, 0, Fixed::ZERO), Some(Fixed::ZERO));
        // Exact segment point.
        let v = adjust_axis(&d, 4, 0, Fixed::from_f32(0.5)).unwrap();
        assert!((v.to_f32() - 0.25).abs() < 1e-3);
        // Interpolated between 0.5 and 1.0: 0.75 -> 0.625.
        let v = adjust_axis(&d, 4, 0, Fixed::from_f32(0.75)).unwrap();
        assert!((v.to_f32() - 0.625).abs() < 1e-3);
        // Out of declared axis range.
        assert!(adjust_axis(&d, 4, 1, Fixed::ZERO).is_none());
        assert!(adjust_axis(&d, 0, 0, Fixed::ZERO).is_none());
    }
}
