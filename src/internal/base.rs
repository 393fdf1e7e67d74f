//! Baseline and mathematical typesetting tables.

use super::at;
use super::{Bytes, RawTag};

pub use at::{BASE, JSTF, MATH};

/// Baseline table: per-script baseline tags and coordinates.
#[derive(Copy, Clone)]
pub struct Base<'a> {
    data: Bytes<'a>,
    horizontal: u16,
    vertical: u16,
}

impl<'a> Base<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        let b = Bytes::new(data);
        b.read::<u32>(0)?;
        Some(Self {
            data: b,
            horizontal: b.read::<u16>(4)?,
            vertical: b.read::<u16>(6)?,
        })
    }

    /// Returns the horizontal axis baselines.
    pub fn horizontal(&self) -> Option<BaseAxis<'a>> {
        self.axis(self.horizontal)
    }

    /// Returns the vertical axis baselines.
    pub fn vertical(&self) -> Option<BaseAxis<'a>> {
        self.axis(self.vertical)
    }

    fn axis(&self, offset: u16) -> Option<BaseAxis<'a>> {
        if offset == 0 {
            return None;
        }
        let base = offset as usize;
        let tag_list = self.data.read::<u16>(base)? as usize;
        let script_list = self.data.read::<u16>(base + 2)? as usize;
        Some(BaseAxis {
            data: self.data,
            tag_list: base + tag_list,
            script_list: base + script_list,
        })
    }
}

/// One axis of the baseline table.
#[derive(Copy, Clone)]
pub struct BaseAxis<'a> {
    data: Bytes<'a>,
    tag_list: usize,
    script_list: usize,
}

impl<'a> BaseAxis<'a> {
    /// Returns the declared baseline tags, in order.
    pub fn tags(&self) -> impl Iterator<Item = RawTag> + 'a {
        let data = self.data;
        let base = self.tag_list;
        let count = data.read_or_default::<u16>(base) as usize;
        (0..count).filter_map(move |i| data.read::<u32>(base + 2 + i * 4))
    }

    /// Returns the baseline coordinates for the specified script: the
    /// default baseline index and per-tag coordinates in font units.
    pub fn script(&self, script: RawTag) -> Option<BaseScript> {
        let count = self.data.read::<u16>(self.script_list)? as usize;
        for i in 0..count {
            let rec = self.script_list + 2 + i * 6;
            if self.data.read::<u32>(rec)? != script {
                continue;
            }
            let script_base = self.script_list + self.data.read::<u16>(rec + 4)? as usize;
            let values = self.data.read::<u16>(script_base)? as usize;
            if values == 0 {
                return None;
            }
            let values_base = script_base + values;
            let default_index = self.data.read::<u16>(values_base)?;
            let coord_count = self.data.read::<u16>(values_base + 2)? as usize;
            let mut coords = [0i16; 8];
            for (j, slot) in coords.iter_mut().enumerate().take(coord_count.min(8)) {
                let coord_offset = self.data.read::<u16>(values_base + 4 + j * 2)? as usize;
                // BaseCoord format 1..3 all start with the coordinate.
                *slot = self.data.read::<i16>(values_base + coord_offset + 2)?;
            }
            return Some(BaseScript {
                default_index,
                coord_count: coord_count.min(8) as u16,
                coords,
            });
        }
        None
    }
}

/// Baseline values for one script.
#[derive(Copy, Clone, Debug)]
pub struct BaseScript {
    /// Index of the default baseline into the axis tag list.
    pub default_index: u16,
    pub coord_count: u16,
    coords: [i16; 8],
}

impl BaseScript {
    /// Returns the coordinate for the baseline at the specified tag
    /// index.
    pub fn coord(&self, index: u16) -> Option<i16> {
        (index < self.coord_count).then(|| self.coords[index as usize])
    }
}

/// Mathematical typesetting table: constants plus per-glyph corrections.
#[derive(Copy, Clone)]
pub struct Math<'a> {
    data: Bytes<'a>,
    constants: usize,
    glyph_info: usize,
}

impl<'a> Math<'a> {
    pub fn new(data: &'a [u8]) -> Option<Self> {
        let b = Bytes::new(data);
        if b.read::<u16>(0)? != 1 {
            return None;
        }
        Some(Self {
            data: b,
            constants: b.read::<u16>(4)? as usize,
            glyph_info: b.read::<u16>(6)? as usize,
        })
    }

    /// Returns the constant at the specified index of the constants
    /// table. The first two constants are percentages, the following two
    /// are integers and the remainder are math value records.
    pub fn constant(&self, index: u16) -> Option<i32> {
        let base = self.constants;
        let value = match index {
            0..=1 => self.data.read::<i16>(base + index as usize * 2)? as i32,
            2..=3 => self.data.read::<u16>(base + index as usize * 2)? as i32,
            4..=55 => {
                // Math value record: value plus a device table offset.
                let rec = base + 8 + (index as usize - 4) * 4;
                self.data.read::<i16>(rec)? as i32
            }
            _ => return None,
        };
        Some(value)
    }

    /// Returns the italics correction for the specified glyph.
    pub fn italics_correction(&self, glyph_id: u16) -> Option<i16> {
        self.glyph_value(0, glyph_id)
    }

    /// Returns the top accent attachment for the specified glyph.
    pub fn top_accent_attachment(&self, glyph_id: u16) -> Option<i16> {
        self.glyph_value(2, glyph_id)
    }

    fn glyph_value(&self, which: usize, glyph_id: u16) -> Option<i16> {
        if self.glyph_info == 0 {
            return None;
        }
        let table = self.glyph_info + self.data.read::<u16>(self.glyph_info + which)? as usize;
        let coverage_offset = self.data.read::<u16>(table)? as u32;
        let coverage = at::Coverage::new(self.data, table as u32 + coverage_offset);
        let index = coverage.index(glyph_id)? as usize;
        let count = self.data.read::<u16>(table + 2)? as usize;
        if index >= count {
            return None;
        }
        self.data.read::<i16>(table + 4 + index * 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_script_lookup() {
        let mut d = Vec::new();
        d.extend_from_slice(&0x00010000u32.to_be_bytes());
        d.extend_from_slice(&8u16.to_be_bytes()); // horiz axis
        d.extend_from_slice(&0u16.to_be_bytes()); // no vert axis
        // axis @8: tag list @4 (=12), script list @10 (=18)
        d.extend_from_slice(&4u16.to_be_bytes());
        d.extend_from_slice(&10u16.to_be_bytes());
        // tag list @12: one tag "romn"
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(b"romn");
        // script list @18: one record, tag "latn", offset 8 (-> @26)
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(b"latn");
        d.extend_from_slice(&8u16.to_be_bytes());
        // base script @26: values offset 4 (-> @30)
        d.extend_from_slice(&4u16.to_be_bytes());
        d.extend_from_slice(&0u16.to_be_bytes());
        // base values @30: default 0, 1 coord, offset 8 (-> @38)
        d.extend_from_slice(&0u16.to_be_bytes());
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(&8u16.to_be_bytes());
        d.extend_from_slice(&0u16.to_be_bytes()); // padding
        // base coord @38: format 1, value 120
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(&120i16.to_be_bytes());
        let base = Base::new(&d).unwrap();
        let axis = base.horizontal().unwrap();
        assert_eq!(axis.tags().collect::<Vec<_>>(), [u32::from_be_bytes(*b"romn")]);
        let script = axis.script(u32::from_be_bytes(*b"latn")).unwrap();
        assert_eq!(script.default_index, 0);
        assert_eq!(script.coord(0), Some(120));
        assert!(base.vertical().is_none());
    }
}
