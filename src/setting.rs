// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

use crate::tag::{tag_from_bytes, tag_from_str_lossy, Tag};

/// Setting combining a tag and a value for features and variations.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Setting<T> {
    /// The tag that identifies the target of the setting.
    pub tag: Tag,
    /// The value for the setting.
    pub value: T,
}

impl<T> Setting<T> {
    /// Creates a new setting from a tag and a value.
    pub fn new(tag: Tag, value: T) -> Self {
        Self { tag, value }
    }
}

impl<T: Copy> From<(Tag, T)> for Setting<T> {
    fn from(v: (Tag, T)) -> Self {
        Self {
            tag: v.0,
            value: v.1,
        }
    }
}

impl<T: Copy> From<(&[u8; 4], T)> for Setting<T> {
    fn from(v: (&[u8; 4], T)) -> Self {
        Self {
            tag: tag_from_bytes(v.0),
            value: v.1,
        }
    }
}

impl<T: Copy> From<(&str, T)> for Setting<T> {
    fn from(v: (&str, T)) -> Self {
        Self {
            tag: tag_from_str_lossy(v.0),
            value: v.1,
        }
    }
}
