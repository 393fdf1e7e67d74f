//! Character to glyph mapping table.

use super::{raw_tag, Bytes, RawFont, RawTag, Stream};

pub const CMAP: RawTag = raw_tag(b"cmap");

/// Supported subtable formats.
const SUPPORTED: [u16; 6] = [0, 4, 6, 10, 12, 13];

/// Selected subtable: offset from the start of the font data, format, and
/// whether the encoding is the Windows symbol encoding.
pub type SelectedSubtable = (u32, u8, bool);

/// Returns true for the Windows platform, symbol encoding (3, 0).
fn is_symbol(platform: u16, encoding: u16) -> bool {
    platform == 3 && encoding == 0
}

/// Returns true for the Unicode platform (0, *) or the Windows platform's
/// BMP (3, 1) and full repertoire (3, 10) Unicode encodings.
fn is_unicode(platform: u16, encoding: u16) -> bool {
    platform == 0 || (platform == 3 && (encoding == 1 || encoding == 10))
}

/// Finds a suitable character map subtable for the specified font.
///
/// Preference: a symbol encoding wins outright; otherwise a full
/// repertoire Unicode mapping (format 12/13), then a BMP Unicode mapping,
/// then anything else supported.
pub fn subtable<'a>(font: impl RawFont<'a>) -> Option<SelectedSubtable> {
    let cmap = font.table_offset(CMAP);
    if cmap == 0 {
        return None;
    }
    let data = font.data();
    let mut s = Stream::with_offset(data, cmap as usize)?;
    s.skip(2)?;
    let len = s.read_u16()? as usize;
    let b = Bytes::new(data);
    let mut best: Option<(u32, SelectedSubtable)> = None;
    for _ in 0..len {
        let platform = s.read_u16()?;
        let encoding = s.read_u16()?;
        let offset = cmap.checked_add(s.read_u32()?)?;
        let format = b.read_u16(offset as usize)?;
        if !SUPPORTED.contains(&format) {
            continue;
        }
        if is_symbol(platform, encoding) {
            return Some((offset, format as u8, true));
        }
        let rank = match (is_unicode(platform, encoding), format) {
            (true, 12) | (true, 13) => 4,
            (true, _) => 3,
            (false, _) => 1,
        };
        if best.map(|(r, _)| rank > r).unwrap_or(true) {
            best = Some((rank, (offset, format as u8, false)));
        }
    }
    best.map(|(_, selected)| selected)
}

/// Finds the format 14 variation selector subtable, if present.
pub fn variant_subtable<'a>(font: impl RawFont<'a>) -> Option<u32> {
    let cmap = font.table_offset(CMAP);
    if cmap == 0 {
        return None;
    }
    let data = font.data();
    let mut s = Stream::with_offset(data, cmap as usize)?;
    s.skip(2)?;
    let len = s.read_u16()? as usize;
    let b = Bytes::new(data);
    for _ in 0..len {
        let platform = s.read_u16()?;
        let encoding = s.read_u16()?;
        let offset = cmap.checked_add(s.read_u32()?)?;
        if platform == 0 && encoding == 5 && b.read_u16(offset as usize) == Some(14) {
            return Some(offset);
        }
    }
    None
}

/// Maps a codepoint to a glyph identifier using the subtable at the
/// specified offset. Returns `None` for unmapped codepoints; the facade
/// folds that into glyph zero.
pub fn map(data: &[u8], subtable: u32, format: u8, codepoint: u32) -> Option<u16> {
    if subtable == 0 {
        return None;
    }
    let b = Bytes::with_offset(data, subtable as usize)?;
    match format {
        0 => map_format0(&b, codepoint),
        4 => map_format4(&b, codepoint),
        6 => map_format6(&b, codepoint),
        10 => map_format10(&b, codepoint),
        12 => map_format12(&b, codepoint),
        13 => map_format13(&b, codepoint),
        _ => None,
    }
}

fn map_format0(b: &Bytes, codepoint: u32) -> Option<u16> {
    if codepoint > 255 {
        return None;
    }
    Some(b.read_u8(6 + codepoint as usize)? as u16)
}

fn map_format4(b: &Bytes, codepoint: u32) -> Option<u16> {
    if codepoint > 0xFFFF {
        return None;
    }
    let c = codepoint as u16;
    let segcount_x2 = b.read_u16(6)? as usize;
    let segcount = segcount_x2 / 2;
    b.ensure_range(0, 16 + segcount_x2 * 4)?;
    let end_codes = 14;
    let start_codes = end_codes + segcount_x2 + 2;
    let mut lo = 0;
    let mut hi = segcount;
    while lo < hi {
        let i = (lo + hi) / 2;
        let i2 = i * 2;
        let start = b.read_u16(start_codes + i2)?;
        if c < start {
            hi = i;
        } else if c > b.read_u16(end_codes + i2)? {
            lo = i + 1;
        } else {
            let deltas = start_codes + segcount_x2;
            let ranges = deltas + segcount_x2;
            let delta = b.read_i16(deltas + i2)? as i32;
            let range = b.read_u16(ranges + i2)? as usize;
            if range == 0 {
                return Some((codepoint as i32 + delta) as u16);
            }
            let index_offset = ranges + i2 + range + (c - start) as usize * 2;
            let id = b.read_u16(index_offset).unwrap_or(0);
            return Some(if id != 0 { (id as i32 + delta) as u16 } else { 0 });
        }
    }
    None
}

fn map_format6(b: &Bytes, codepoint: u32) -> Option<u16> {
    let first = b.read_u16(6)? as u32;
    let count = b.read_u16(8)? as u32;
    let index = codepoint.checked_sub(first)?;
    if index >= count {
        return None;
    }
    b.read_u16(10 + index as usize * 2)
}

fn map_format10(b: &Bytes, codepoint: u32) -> Option<u16> {
    let first = b.read_u32(12)?;
    let count = b.read_u32(16)?;
    let index = codepoint.checked_sub(first)?;
    if index >= count {
        return None;
    }
    b.read_u16(20 + index as usize * 2)
}

fn map_format12(b: &Bytes, codepoint: u32) -> Option<u16> {
    let base = 16;
    let len = b.read_u32(base - 4).unwrap_or(0) as usize;
    b.ensure_range(base, len.checked_mul(12)?)?;
    let mut lo = 0;
    let mut hi = len;
    while lo < hi {
        let i = (lo + hi) / 2;
        let rec = base + i * 12;
        let start = b.read_u32(rec)?;
        if codepoint < start {
            hi = i;
        } else if codepoint > b.read_u32(rec + 4)? {
            lo = i + 1;
        } else {
            let glyph = b.read_u32(rec + 8)?;
            return Some((codepoint - start + glyph) as u16);
        }
    }
    None
}

fn map_format13(b: &Bytes, codepoint: u32) -> Option<u16> {
    let base = 16;
    let len = b.read_u32(base - 4).unwrap_or(0) as usize;
    b.ensure_range(base, len.checked_mul(12)?)?;
    let mut lo = 0;
    let mut hi = len;
    while lo < hi {
        let i = (lo + hi) / 2;
        let rec = base + i * 12;
        let start = b.read_u32(rec)?;
        if codepoint < start {
            hi = i;
        } else if codepoint > b.read_u32(rec + 4)? {
            lo = i + 1;
        } else {
            // Many-to-one: the whole range maps to the same glyph.
            return Some(b.read_u32(rec + 8)? as u16);
        }
    }
    None
}

/// Invokes the specified closure with all codepoint/glyph identifier
/// pairs in the subtable. Only the segment mapped formats participate.
pub fn enumerate(data: &[u8], subtable: u32, mut f: impl FnMut(u32, u16)) {
    let b = match Bytes::with_offset(data, subtable as usize) {
        Some(b) if subtable != 0 => b,
        _ => return,
    };
    match b.read_or_default::<u16>(0) {
        4 => {
            let segcount_x2 = b.read_or_default::<u16>(6) as usize;
            let segcount = segcount_x2 / 2;
            if !b.check_range(0, 16 + segcount_x2 * 4) {
                return;
            }
            let end_codes = 14;
            let start_codes = end_codes + segcount_x2 + 2;
            for i in 0..segcount {
                let i2 = i * 2;
                let (start, end) = match (b.read_u16(start_codes + i2), b.read_u16(end_codes + i2))
                {
                    (Some(s), Some(e)) if s <= e && s != 0xFFFF => (s, e),
                    _ => continue,
                };
                for codepoint in start..=end {
                    if let Some(glyph) = map_format4(&b, codepoint as u32) {
                        if glyph != 0 {
                            f(codepoint as u32, glyph);
                        }
                    }
                }
            }
        }
        12 => {
            let len = b.read_or_default::<u32>(12) as usize;
            if !b.check_range(16, len.saturating_mul(12)) {
                return;
            }
            for i in 0..len {
                let rec = 16 + i * 12;
                let (start, end, glyph) = match (
                    b.read_u32(rec),
                    b.read_u32(rec + 4),
                    b.read_u32(rec + 8),
                ) {
                    (Some(s), Some(e), Some(g)) if s <= e => (s, e, g),
                    _ => continue,
                };
                for codepoint in start..=end.min(start.saturating_add(0x10FFFF)) {
                    let id = (glyph + (codepoint - start)) as u16;
                    if id != 0 {
                        f(codepoint, id);
                    }
                }
            }
        }
        _ => {}
    }
}

/// Result of mapping a codepoint with a variation selector.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MapVariant {
    /// Use the default glyph mapping.
    UseDefault,
    /// Use the specified variant.
    Variant(u16),
}

/// Maps a codepoint with a variation selector to a glyph identifier
/// using the format 14 subtable at the specified offset in data.
pub fn map_variant(
    data: &[u8],
    offset: u32,
    codepoint: u32,
    variation_selector: u32,
) -> Option<MapVariant> {
    use core::cmp::Ordering;
    let b = Bytes::with_offset(data, offset as usize)?;
    let len = b.read_u32(6)? as usize;
    let base = 10;
    let mut lo = 0;
    let mut hi = len;
    let mut default_uvs = 0;
    let mut non_default_uvs = 0;
    while lo < hi {
        let i = (lo + hi) / 2;
        let rec = base + i * 11;
        let vs = b.read_u24(rec)?;
        match variation_selector.cmp(&vs) {
            Ordering::Less => hi = i,
            Ordering::Greater => lo = i + 1,
            Ordering::Equal => {
                default_uvs = b.read_u32(rec + 3)? as usize;
                non_default_uvs = b.read_u32(rec + 7)? as usize;
                break;
            }
        }
    }
    if default_uvs != 0 {
        let len = b.read_u32(default_uvs)? as usize;
        let mut lo = 0;
        let mut hi = len;
        while lo < hi {
            let i = (lo + hi) / 2;
            let rec = default_uvs + 4 + i * 4;
            let start = b.read_u24(rec)?;
            if codepoint < start {
                hi = i;
            } else if codepoint > start + b.read_u8(rec + 3)? as u32 {
                lo = i + 1;
            } else {
                return Some(MapVariant::UseDefault);
            }
        }
    }
    if non_default_uvs != 0 {
        let len = b.read_u32(non_default_uvs)? as usize;
        let mut lo = 0;
        let mut hi = len;
        while lo < hi {
            let i = (lo + hi) / 2;
            let rec = non_default_uvs + 4 + i * 5;
            let value = b.read_u24(rec)?;
            match codepoint.cmp(&value) {
                Ordering::Less => hi = i,
                Ordering::Greater => lo = i + 1,
                Ordering::Equal => return Some(MapVariant::Variant(b.read_u16(rec + 3)?)),
            }
        }
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // Format 4 with segments [65..=67] -> delta so A maps to glyph 1,
    // plus the required 0xFFFF terminator segment.
    pub(crate) fn format4() -> Vec<u8> {
        let mut d = Vec::new();
        let segments: [(u16, u16, i16); 2] = [(65, 67, -64), (0xFFFF, 0xFFFF, 1)];
        let segcount = segments.len() as u16;
        d.extend_from_slice(&4u16.to_be_bytes());
        d.extend_from_slice(&(16 + segcount * 8).to_be_bytes()); // length
        d.extend_from_slice(&0u16.to_be_bytes()); // language
        d.extend_from_slice(&(segcount * 2).to_be_bytes());
        d.extend_from_slice(&[0; 6]); // search params
        for (_, end, _) in &segments {
            d.extend_from_slice(&end.to_be_bytes());
        }
        d.extend_from_slice(&0u16.to_be_bytes()); // reserved pad
        for (start, _, _) in &segments {
            d.extend_from_slice(&start.to_be_bytes());
        }
        for (_, _, delta) in &segments {
            d.extend_from_slice(&delta.to_be_bytes());
        }
        for _ in &segments {
            d.extend_from_slice(&0u16.to_be_bytes()); // idRangeOffset
        }
        d
    }

    #[test]
    fn format4_lookup() {
        let d = format4();
        let b = Bytes::new(&d);
        assert_eq!(map_format4(&b, 'A' as u32), Some(1));
        assert_eq!(map_format4(&b, 'C' as u32), Some(3));
        assert_eq!(map_format4(&b, 'D' as u32), None);
        assert_eq!(map_format4(&b, 0x10400), None);
    }

    #[test]
    fn format0_lookup() {
        let mut d = vec![0u8; 6 + 256];
        d[1] = 0;
        d[6 + 65] = 9;
        let b = Bytes::new(&d);
        assert_eq!(map_format0(&b, 65), Some(9));
        assert_eq!(map_format0(&b, 66), Some(0));
        assert_eq!(map_format0(&b, 300), None);
    }

    #[test]
    fn format6_lookup() {
        let mut d = Vec::new();
        d.extend_from_slice(&6u16.to_be_bytes());
        d.extend_from_slice(&[0; 4]); // length, language
        d.extend_from_slice(&0x20u16.to_be_bytes()); // first
        d.extend_from_slice(&2u16.to_be_bytes()); // count
        d.extend_from_slice(&7u16.to_be_bytes());
        d.extend_from_slice(&8u16.to_be_bytes());
        let b = Bytes::new(&d);
        assert_eq!(map_format6(&b, 0x20), Some(7));
        assert_eq!(map_format6(&b, 0x21), Some(8));
        assert_eq!(map_format6(&b, 0x22), None);
        assert_eq!(map_format6(&b, 0x1F), None);
    }

    fn sequential_groups(format: u16, groups: &[(u32, u32, u32)]) -> Vec<u8> {
        let mut d = Vec::new();
        d.extend_from_slice(&format.to_be_bytes());
        d.extend_from_slice(&[0; 2]); // reserved
        d.extend_from_slice(&(16 + groups.len() as u32 * 12).to_be_bytes());
        d.extend_from_slice(&[0; 4]); // language
        d.extend_from_slice(&(groups.len() as u32).to_be_bytes());
        for (start, end, glyph) in groups {
            d.extend_from_slice(&start.to_be_bytes());
            d.extend_from_slice(&end.to_be_bytes());
            d.extend_from_slice(&glyph.to_be_bytes());
        }
        d
    }

    #[test]
    fn format12_lookup() {
        let d = sequential_groups(12, &[(0x1F600, 0x1F603, 100)]);
        let b = Bytes::new(&d);
        assert_eq!(map_format12(&b, 0x1F600), Some(100));
        assert_eq!(map_format12(&b, 0x1F603), Some(103));
        assert_eq!(map_format12(&b, 0x1F604), None);
    }

    #[test]
    fn format13_is_many_to_one() {
        let d = sequential_groups(13, &[(0x2000, 0x20FF, 5)]);
        let b = Bytes::new(&d);
        assert_eq!(map_format13(&b, 0x2000), Some(5));
        assert_eq!(map_format13(&b, 0x20FF), Some(5));
        assert_eq!(map_format13(&b, 0x2100), None);
    }

    #[test]
    fn variant_selectors() {
        // One variation selector record (U+FE01) with a non-default UVS
        // mapping U+4E00 to glyph 42.
        let mut d = Vec::new();
        d.extend_from_slice(&14u16.to_be_bytes());
        d.extend_from_slice(&[0; 4]); // length
        d.extend_from_slice(&1u32.to_be_bytes()); // record count
        // record: varSelector (u24), defaultUVSOffset, nonDefaultUVSOffset
        d.extend_from_slice(&[0x00, 0xFE, 0x01]);
        d.extend_from_slice(&0u32.to_be_bytes());
        d.extend_from_slice(&21u32.to_be_bytes());
        // non-default UVS table at offset 21
        d.extend_from_slice(&1u32.to_be_bytes());
        d.extend_from_slice(&[0x00, 0x4E, 0x00]);
        d.extend_from_slice(&42u16.to_be_bytes());
        assert_eq!(
            map_variant(&d, 0, 0x4E00, 0xFE01),
            Some(MapVariant::Variant(42))
        );
        assert_eq!(map_variant(&d, 0, 0x4E01, 0xFE01), None);
        assert_eq!(map_variant(&d, 0, 0x4E00, 0xFE02), None);
    }
}
