//! Bitmap strike tables.
//!
//! Enumeration and per-glyph data ranges only; image decoding belongs
//! to a rendering layer.

use super::{raw_tag, Bytes, RawTag};

pub const SBIX: RawTag = raw_tag(b"sbix");
pub const CBLC: RawTag = raw_tag(b"CBLC");
pub const CBDT: RawTag = raw_tag(b"CBDT");
pub const EBLC: RawTag = raw_tag(b"EBLC");
pub const EBDT: RawTag = raw_tag(b"EBDT");

pub const PNG_: RawTag = raw_tag(b"png ");

/// A bitmap strike: one pixel-size rendition of the glyph set.
#[derive(Copy, Clone, Debug)]
pub struct Strike {
    pub index: u16,
    pub ppem: u16,
    pub ppi: u16,
    pub bit_depth: u8,
}

/// Apple standard bitmap table.
#[derive(Copy, Clone)]
pub struct Sbix<'a> {
    data: Bytes<'a>,
    num_glyphs: u16,
}

impl<'a> Sbix<'a> {
    pub fn new(data: &'a [u8], num_glyphs: u16) -> Self {
        Self {
            data: Bytes::new(data),
            num_glyphs,
        }
    }

    /// Returns the number of strikes.
    pub fn strike_count(&self) -> u16 {
        self.data.read_or_default::<u32>(4) as u16
    }

    /// Returns the strike at the specified index.
    pub fn strike(&self, index: u16) -> Option<Strike> {
        if index >= self.strike_count() {
            return None;
        }
        let offset = self.data.read::<u32>(8 + index as usize * 4)? as usize;
        Some(Strike {
            index,
            ppem: self.data.read::<u16>(offset)?,
            ppi: self.data.read::<u16>(offset + 2)?,
            bit_depth: 32,
        })
    }

    /// Returns the strike whose size most closely matches the requested
    /// pixels per em.
    pub fn best_strike(&self, ppem: u16) -> Option<Strike> {
        let mut best: Option<Strike> = None;
        for i in 0..self.strike_count() {
            let strike = self.strike(i)?;
            let better = match &best {
                Some(current) => {
                    (strike.ppem as i32 - ppem as i32).abs()
                        < (current.ppem as i32 - ppem as i32).abs()
                }
                None => true,
            };
            if better {
                best = Some(strike);
            }
        }
        best
    }

    /// Returns (graphic type, data) for the specified glyph in the
    /// specified strike. Dupe records are followed one level.
    pub fn glyph_data(&self, strike: &Strike, glyph_id: u16) -> Option<(RawTag, &'a [u8])> {
        self.glyph_data_impl(strike, glyph_id, 0)
    }

    fn glyph_data_impl(
        &self,
        strike: &Strike,
        glyph_id: u16,
        depth: u32,
    ) -> Option<(RawTag, &'a [u8])> {
        if glyph_id >= self.num_glyphs || depth > 1 {
            return None;
        }
        let strike_offset = self.data.read::<u32>(8 + strike.index as usize * 4)? as usize;
        let glyph_base = strike_offset + 4;
        let start = self.data.read::<u32>(glyph_base + glyph_id as usize * 4)? as usize;
        let end = self.data.read::<u32>(glyph_base + glyph_id as usize * 4 + 4)? as usize;
        if end <= start {
            // An empty range is a glyph with no bitmap.
            return None;
        }
        let record = strike_offset + start;
        let graphic_type = self.data.read::<u32>(record + 4)?;
        let data = self
            .data
            .read_bytes(record + 8, end.checked_sub(start)?.checked_sub(8)?)?;
        if graphic_type == raw_tag(b"dupe") {
            let target = Bytes::new(data).read_u16(0)?;
            return self.glyph_data_impl(strike, target, depth + 1);
        }
        Some((graphic_type, data))
    }
}

/// Color bitmap location table (CBLC/EBLC share the layout).
#[derive(Copy, Clone)]
pub struct Cblc<'a> {
    data: Bytes<'a>,
}

impl<'a> Cblc<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data: Bytes::new(data),
        }
    }

    /// Returns the number of strikes.
    pub fn strike_count(&self) -> u16 {
        self.data.read_or_default::<u32>(4) as u16
    }

    /// Returns the strike at the specified index. BitmapSize records
    /// are 48 bytes.
    pub fn strike(&self, index: u16) -> Option<Strike> {
        if index >= self.strike_count() {
            return None;
        }
        let rec = 8 + index as usize * 48;
        Some(Strike {
            index,
            ppem: self.data.read_u8(rec + 45)? as u16,
            ppi: 72,
            bit_depth: self.data.read_u8(rec + 46)?,
        })
    }

    /// Returns the strike whose size most closely matches the requested
    /// pixels per em.
    pub fn best_strike(&self, ppem: u16) -> Option<Strike> {
        let mut best: Option<Strike> = None;
        for i in 0..self.strike_count() {
            let strike = self.strike(i)?;
            let better = match &best {
                Some(current) => {
                    (strike.ppem as i32 - ppem as i32).abs()
                        < (current.ppem as i32 - ppem as i32).abs()
                }
                None => true,
            };
            if better {
                best = Some(strike);
            }
        }
        best
    }

    /// Returns the (format, offset, length) of the glyph's image data
    /// within the companion CBDT/EBDT table.
    pub fn glyph_data(&self, strike: &Strike, glyph_id: u16) -> Option<(u16, u32, u32)> {
        let rec = 8 + strike.index as usize * 48;
        let subtable_array = self.data.read::<u32>(rec)? as usize;
        let subtable_count = self.data.read::<u32>(rec + 8)? as usize;
        for i in 0..subtable_count {
            let index_rec = subtable_array + i * 8;
            let first = self.data.read::<u16>(index_rec)?;
            let last = self.data.read::<u16>(index_rec + 2)?;
            if !(first..=last).contains(&glyph_id) {
                continue;
            }
            let subtable = subtable_array + self.data.read::<u32>(index_rec + 4)? as usize;
            let index_format = self.data.read::<u16>(subtable)?;
            let image_format = self.data.read::<u16>(subtable + 2)?;
            let image_data = self.data.read::<u32>(subtable + 4)?;
            let entry = (glyph_id - first) as usize;
            match index_format {
                1 => {
                    let start = self.data.read::<u32>(subtable + 8 + entry * 4)?;
                    let end = self.data.read::<u32>(subtable + 8 + entry * 4 + 4)?;
                    if end <= start {
                        return None;
                    }
                    return Some((image_format, image_data + start, end - start));
                }
                2 => {
                    let image_size = self.data.read::<u32>(subtable + 8)?;
                    let start = image_size.checked_mul(entry as u32)?;
                    return Some((image_format, image_data + start, image_size));
                }
                3 => {
                    let start = self.data.read::<u16>(subtable + 8 + entry * 2)? as u32;
                    let end = self.data.read::<u16>(subtable + 8 + entry * 2 + 2)? as u32;
                    if end <= start {
                        return None;
                    }
                    return Some((image_format, image_data + start, end - start));
                }
                _ => return None,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sbix_with_one_glyph() -> Vec<u8> {
        // One strike, two glyphs; glyph 0 has a 4-byte png payload,
        // glyph 1 is empty.
        let mut d = Vec::new();
        d.extend_from_slice(&1u16.to_be_bytes()); // version
        d.extend_from_slice(&1u16.to_be_bytes()); // flags
        d.extend_from_slice(&1u32.to_be_bytes()); // strike count
        d.extend_from_slice(&12u32.to_be_bytes()); // strike offset
        // strike @12: ppem 16, ppi 72
        d.extend_from_slice(&16u16.to_be_bytes());
        d.extend_from_slice(&72u16.to_be_bytes());
        // glyph offsets (3 entries): 16, 28, 28 relative to strike
        d.extend_from_slice(&16u32.to_be_bytes());
        d.extend_from_slice(&28u32.to_be_bytes());
        d.extend_from_slice(&28u32.to_be_bytes());
        // glyph record @ strike+16: origin (0,0), type png, 4 bytes
        d.extend_from_slice(&0u16.to_be_bytes());
        d.extend_from_slice(&0u16.to_be_bytes());
        d.extend_from_slice(b"png ");
        d.extend_from_slice(&[1, 2, 3, 4]);
        d
    }

    #[test]
    fn sbix_strikes_and_data() {
        let d = sbix_with_one_glyph();
        let sbix = Sbix::new(&d, 2);
        assert_eq!(sbix.strike_count(), 1);
        let strike = sbix.best_strike(20).unwrap();
        assert_eq!(strike.ppem, 16);
        let (kind, data) = sbix.glyph_data(&strike, 0).unwrap();
        assert_eq!(kind, PNG_);
        assert_eq!(data, [1, 2, 3, 4]);
        assert!(sbix.glyph_data(&strike, 1).is_none());
        assert!(sbix.glyph_data(&strike, 5).is_none());
    }
}
