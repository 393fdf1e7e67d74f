// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

/*!
Variable font axes and named instances.
*/

use crate::font::FontRef;
use crate::internal::fixed::Fixed;
use crate::internal::var::{adjust_axis, Fvar, VarAxis, VarInstance, AVAR};
use crate::internal::RawFont;
use crate::setting::Setting;
use crate::strings::{LocalizedString, StringId};
use crate::{NormalizedCoord, Tag};

/// Iterator over the axes of variation in a font.
#[derive(Copy, Clone)]
pub struct Variations<'a> {
    font: FontRef<'a>,
    fvar: Fvar<'a>,
    avar: u32,
    len: usize,
    pos: usize,
}

impl<'a> Variations<'a> {
    pub(crate) fn from_font(font: &FontRef<'a>) -> Self {
        let fvar = Fvar::from_font(font).unwrap_or_else(|| Fvar::new(&[]));
        Self {
            font: *font,
            fvar,
            avar: font.table_offset(AVAR),
            len: fvar.axis_count() as usize,
            pos: 0,
        }
    }

    fn get(&self, index: usize) -> Option<Variation<'a>> {
        Some(Variation {
            font: self.font,
            axis: self.fvar.get_axis(index as u16)?,
            avar: self.avar,
        })
    }

    /// Searches for a variation axis with the specified tag.
    ///
    /// ## Iteration behavior
    /// This function searches the entire collection without regard for the
    /// current state of the iterator.
    pub fn find_by_tag(&self, tag: Tag) -> Option<Variation<'a>> {
        (0..self.len).filter_map(|i| self.get(i)).find(|v| v.tag() == tag)
    }

    /// Returns the dense vector of normalized coordinates corresponding to
    /// the specified variation settings, in axis declaration order. Absent
    /// axes stay at zero.
    pub fn normalized_coords<I>(&self, settings: I) -> Vec<NormalizedCoord>
    where
        I: IntoIterator,
        I::Item: Into<Setting<f32>>,
    {
        let mut coords = vec![0i16; self.len];
        for setting in settings {
            let setting = setting.into();
            if let Some(var) = self.find_by_tag(setting.tag) {
                coords[var.index()] = var.normalize(setting.value);
            }
        }
        coords
    }
}

impl_iter!(Variations, Variation);

/// Axis of variation in a variable font.
#[derive(Copy, Clone)]
pub struct Variation<'a> {
    font: FontRef<'a>,
    axis: VarAxis,
    avar: u32,
}

impl<'a> Variation<'a> {
    /// Returns the index of the axis.
    pub fn index(&self) -> usize {
        self.axis.index as usize
    }

    /// Returns the tag that identifies the axis.
    pub fn tag(&self) -> Tag {
        self.axis.tag
    }

    /// Returns the name identifier for the axis.
    pub fn name_id(&self) -> StringId {
        StringId::Other(self.axis.name_id)
    }

    /// Returns the name for the axis, optionally for a particular
    /// language.
    pub fn name(&self, language: Option<&str>) -> Option<LocalizedString<'a>> {
        crate::strings::LocalizedStrings::from_font(&self.font)
            .find_by_id(self.name_id(), language)
    }

    /// Returns true if the axis should be hidden from users.
    pub fn is_hidden(&self) -> bool {
        self.axis.is_hidden()
    }

    /// Returns the minimum value of the axis.
    pub fn min_value(&self) -> f32 {
        self.axis.min.to_f32()
    }

    /// Returns the maximum value of the axis.
    pub fn max_value(&self) -> f32 {
        self.axis.max.to_f32()
    }

    /// Returns the default value of the axis.
    pub fn default_value(&self) -> f32 {
        self.axis.default.to_f32()
    }

    /// Computes a normalized coordinate for the specified user space
    /// value, applying the `avar` remap when present.
    pub fn normalize(&self, value: f32) -> NormalizedCoord {
        let avar = (self.avar != 0).then_some((self.font.data, self.avar));
        self.axis.normalized_coord(Fixed::from_f32(value), avar)
    }
}

/// Iterator over the named instances in a variable font.
#[derive(Copy, Clone)]
pub struct Instances<'a> {
    font: FontRef<'a>,
    fvar: Fvar<'a>,
    avar: u32,
    len: usize,
    pos: usize,
}

impl<'a> Instances<'a> {
    pub(crate) fn from_font(font: &FontRef<'a>) -> Self {
        let fvar = Fvar::from_font(font).unwrap_or_else(|| Fvar::new(&[]));
        Self {
            font: *font,
            fvar,
            avar: font.table_offset(AVAR),
            len: fvar.instance_count() as usize,
            pos: 0,
        }
    }

    fn get(&self, index: usize) -> Option<Instance<'a>> {
        Some(Instance {
            parent: *self,
            inner: self.fvar.get_instance(index as u16)?,
        })
    }

    /// Searches for an instance with the specified name.
    ///
    /// ## Iteration behavior
    /// This function searches the entire collection without regard for the
    /// current state of the iterator.
    pub fn find_by_name(&self, name: &str) -> Option<Instance<'a>> {
        let strings = crate::strings::LocalizedStrings::from_font(&self.font);
        (0..self.len).filter_map(|i| self.get(i)).find(|instance| {
            strings
                .find_by_id(instance.name_id(), None)
                .map(|s| s.chars().eq(name.chars()))
                .unwrap_or(false)
        })
    }
}

impl_iter!(Instances, Instance);

/// Named instance in a variable font.
#[derive(Copy, Clone)]
pub struct Instance<'a> {
    parent: Instances<'a>,
    inner: VarInstance<'a>,
}

impl<'a> Instance<'a> {
    /// Returns the index of the instance.
    pub fn index(&self) -> usize {
        self.inner.index as usize
    }

    /// Returns the name identifier for the instance.
    pub fn name_id(&self) -> StringId {
        StringId::Other(self.inner.name_id)
    }

    /// Returns the name for the instance, optionally for a particular
    /// language.
    pub fn name(&self, language: Option<&str>) -> Option<LocalizedString<'a>> {
        crate::strings::LocalizedStrings::from_font(&self.parent.font)
            .find_by_id(self.name_id(), language)
    }

    /// Returns the PostScript name identifier for the instance, if
    /// declared.
    pub fn postscript_name_id(&self) -> Option<StringId> {
        self.inner.postscript_name_id.map(StringId::Other)
    }

    /// Returns an iterator over the user space coordinate values of the
    /// instance, in axis declaration order.
    pub fn values(&self) -> impl Iterator<Item = f32> + 'a {
        self.inner.values.iter().map(|v| v.to_f32())
    }

    /// Returns the normalized coordinates for the instance.
    pub fn normalized_coords(&self) -> Vec<NormalizedCoord> {
        let avar = (self.parent.avar != 0)
            .then_some((self.parent.font.data, self.parent.avar));
        let fvar = self.parent.fvar;
        (0..fvar.axis_count())
            .map(|i| fvar.get_axis(i).unwrap_or_default())
            .zip(self.inner.values.iter())
            .map(|(axis, value)| axis.normalized_coord(value, avar))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::fixed::Fixed;

    // Build a font whose directory carries only an fvar table with the
    // specified axes and instances.
    fn fvar_font(axes: &[(&[u8; 4], f32, f32, f32)], instances: &[&[f32]]) -> Vec<u8> {
        let axis_count = axes.len() as u16;
        let mut fvar = Vec::new();
        fvar.extend_from_slice(&1u16.to_be_bytes()); // major
        fvar.extend_from_slice(&0u16.to_be_bytes()); // minor
        fvar.extend_from_slice(&16u16.to_be_bytes()); // axes offset
        fvar.extend_from_slice(&2u16.to_be_bytes()); // reserved
        fvar.extend_from_slice(&axis_count.to_be_bytes());
        fvar.extend_from_slice(&20u16.to_be_bytes()); // axis size
        fvar.extend_from_slice(&(instances.len() as u16).to_be_bytes());
        let inst_size = 4 + axes.len() as u16 * 4;
        fvar.extend_from_slice(&inst_size.to_be_bytes());
        for (tag, min, default, max) in axes {
            fvar.extend_from_slice(*tag);
            fvar.extend_from_slice(&Fixed::from_f32(*min).0.to_be_bytes());
            fvar.extend_from_slice(&Fixed::from_f32(*default).0.to_be_bytes());
            fvar.extend_from_slice(&Fixed::from_f32(*max).0.to_be_bytes());
            fvar.extend_from_slice(&0u16.to_be_bytes()); // flags
            fvar.extend_from_slice(&256u16.to_be_bytes()); // name id
        }
        for (i, values) in instances.iter().enumerate() {
            fvar.extend_from_slice(&(300 + i as u16).to_be_bytes()); // name id
            fvar.extend_from_slice(&0u16.to_be_bytes()); // flags
            for v in *values {
                fvar.extend_from_slice(&Fixed::from_f32(*v).0.to_be_bytes());
            }
        }
        // SFNT wrapper with a single table record.
        let mut data = Vec::new();
        data.extend_from_slice(&0x00010000u32.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&[0; 6]);
        data.extend_from_slice(b"fvar");
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&28u32.to_be_bytes());
        data.extend_from_slice(&(fvar.len() as u32).to_be_bytes());
        data.extend_from_slice(&fvar);
        data
    }

    #[test]
    fn axes_and_normalization() {
        let data = fvar_font(
            &[(b"wght", 100., 400., 900.), (b"wdth", 30., 100., 150.)],
            &[],
        );
        let font = FontRef::new(&data).unwrap();
        let variations = Variations::from_font(&font);
        assert_eq!(variations.len(), 2);
        let wdth = variations.find_by_tag(tag_from_bytes(b"wdth")).unwrap();
        assert_eq!(wdth.default_value(), 100.);
        let coord = wdth.normalize(75.) as f32 / 16384.;
        assert!((coord + 0.357142).abs() < 1e-3);
        let coords =
            variations.normalized_coords([(b"wght", 900.0f32), (b"wdth", 75.0f32)]);
        assert_eq!(coords.len(), 2);
        assert_eq!(coords[0], 16384);
    }

    #[test]
    fn instance_coords_stay_in_range() {
        let data = fvar_font(
            &[(b"wght", 100., 400., 900.)],
            &[&[100.], &[400.], &[900.], &[2000.]],
        );
        let font = FontRef::new(&data).unwrap();
        for instance in Instances::from_font(&font) {
            for coord in instance.normalized_coords() {
                assert!(coord.abs() <= 16384);
            }
        }
    }

    use crate::tag::tag_from_bytes;
}
