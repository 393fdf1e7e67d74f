// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

/*!
Font attributes: stretch, weight and style.
*/

use core::fmt;

use crate::font::FontRef;
use crate::internal::{var, RawFont};
use crate::tag::tag_from_bytes;

pub use crate::internal::head::EmbeddingPermission;

const WDTH: u32 = tag_from_bytes(b"wdth");
const WGHT: u32 = tag_from_bytes(b"wght");
const SLNT: u32 = tag_from_bytes(b"slnt");
const ITAL: u32 = tag_from_bytes(b"ital");

/// Primary attributes for font classification: stretch, weight and
/// style, packed into a single value.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Attributes {
    pub stretch: Stretch,
    pub weight: Weight,
    pub style: Style,
}

impl Attributes {
    /// Creates new attributes from the specified parts.
    pub fn new(stretch: Stretch, weight: Weight, style: Style) -> Self {
        Self {
            stretch,
            weight,
            style,
        }
    }

    pub(crate) fn from_font(font: &FontRef) -> Self {
        let mut attrs = match font.os2() {
            Some(os2) => {
                let flags = os2.selection_flags();
                let style = if flags.italic() {
                    Style::Italic
                } else if flags.oblique() {
                    Style::Oblique
                } else {
                    Style::Normal
                };
                Self {
                    stretch: Stretch::from_class(os2.width_class()),
                    weight: Weight(os2.weight_class().clamp(1, 1000)),
                    style,
                }
            }
            None => {
                // Fall back to the mac style bits.
                let mac_style = font.head().map(|h| h.mac_style()).unwrap_or(0);
                Self {
                    stretch: Stretch::NORMAL,
                    weight: if mac_style & 1 != 0 {
                        Weight::BOLD
                    } else {
                        Weight::NORMAL
                    },
                    style: if mac_style & 2 != 0 {
                        Style::Italic
                    } else {
                        Style::Normal
                    },
                }
            }
        };
        // Variable fonts refine the defaults from their axes.
        if let Some(fvar) = var::Fvar::from_font(font) {
            for i in 0..fvar.axis_count() {
                let Some(axis) = fvar.get_axis(i) else {
                    continue;
                };
                let default = axis.default.to_f32();
                match axis.tag {
                    WGHT => attrs.weight = Weight(default.clamp(1., 1000.) as u16),
                    WDTH => attrs.stretch = Stretch::from_percentage(default),
                    SLNT if default != 0. && attrs.style == Style::Normal => {
                        attrs.style = Style::Oblique;
                    }
                    ITAL if default != 0. => attrs.style = Style::Italic,
                    _ => {}
                }
            }
        }
        attrs
    }

    /// Returns the embedding permission declared by the font.
    pub fn embedding_permission(font: &FontRef) -> EmbeddingPermission {
        font.os2()
            .map(|os2| os2.embedding_permission())
            .unwrap_or_default()
    }

    /// Returns true when the font should use typographic metrics for
    /// line spacing.
    pub fn use_typographic_metrics(font: &FontRef) -> bool {
        font.os2()
            .map(|os2| os2.selection_flags().use_typographic_metrics())
            .unwrap_or(false)
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.stretch, self.weight, self.style)
    }
}

/// Visual width of a font: a relative change from the normal aspect
/// ratio, stored as a percentage times two.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Stretch(pub u16);

impl Stretch {
    pub const ULTRA_CONDENSED: Self = Self(100);
    pub const EXTRA_CONDENSED: Self = Self(125);
    pub const CONDENSED: Self = Self(150);
    pub const SEMI_CONDENSED: Self = Self(175);
    pub const NORMAL: Self = Self(200);
    pub const SEMI_EXPANDED: Self = Self(225);
    pub const EXPANDED: Self = Self(250);
    pub const EXTRA_EXPANDED: Self = Self(300);
    pub const ULTRA_EXPANDED: Self = Self(400);

    /// Creates a stretch from an OS/2 width class (1..=9).
    pub fn from_class(class: u16) -> Self {
        match class {
            1 => Self::ULTRA_CONDENSED,
            2 => Self::EXTRA_CONDENSED,
            3 => Self::CONDENSED,
            4 => Self::SEMI_CONDENSED,
            6 => Self::SEMI_EXPANDED,
            7 => Self::EXPANDED,
            8 => Self::EXTRA_EXPANDED,
            9 => Self::ULTRA_EXPANDED,
            _ => Self::NORMAL,
        }
    }

    /// Creates a stretch from a `wdth` axis percentage.
    pub fn from_percentage(percentage: f32) -> Self {
        Self((percentage.clamp(50., 200.) * 2.) as u16)
    }

    /// Returns the stretch as a percentage of normal width.
    pub fn to_percentage(self) -> f32 {
        self.0 as f32 / 2.
    }
}

impl Default for Stretch {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Stretch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Self::ULTRA_CONDENSED => "ultra-condensed",
            Self::EXTRA_CONDENSED => "extra-condensed",
            Self::CONDENSED => "condensed",
            Self::SEMI_CONDENSED => "semi-condensed",
            Self::NORMAL => "normal",
            Self::SEMI_EXPANDED => "semi-expanded",
            Self::EXPANDED => "expanded",
            Self::EXTRA_EXPANDED => "extra-expanded",
            Self::ULTRA_EXPANDED => "ultra-expanded",
            _ => return write!(f, "{}%", self.to_percentage()),
        };
        f.write_str(name)
    }
}

/// Visual weight on a scale from 1 to 1000.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Weight(pub u16);

impl Weight {
    pub const THIN: Self = Self(100);
    pub const EXTRA_LIGHT: Self = Self(200);
    pub const LIGHT: Self = Self(300);
    pub const NORMAL: Self = Self(400);
    pub const MEDIUM: Self = Self(500);
    pub const SEMI_BOLD: Self = Self(600);
    pub const BOLD: Self = Self(700);
    pub const EXTRA_BOLD: Self = Self(800);
    pub const BLACK: Self = Self(900);
}

impl Default for Weight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Self::THIN => "thin",
            Self::EXTRA_LIGHT => "extra-light",
            Self::LIGHT => "light",
            Self::NORMAL => "normal",
            Self::MEDIUM => "medium",
            Self::SEMI_BOLD => "semi-bold",
            Self::BOLD => "bold",
            Self::EXTRA_BOLD => "extra-bold",
            Self::BLACK => "black",
            _ => return write!(f, "{}", self.0),
        };
        f.write_str(name)
    }
}

/// Visual style or slope.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub enum Style {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Normal => "normal",
            Self::Italic => "italic",
            Self::Oblique => "oblique",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretch_classes() {
        assert_eq!(Stretch::from_class(5), Stretch::NORMAL);
        assert_eq!(Stretch::from_class(1), Stretch::ULTRA_CONDENSED);
        assert_eq!(Stretch::from_percentage(100.), Stretch::NORMAL);
        assert_eq!(Stretch::from_percentage(75.), Stretch::CONDENSED);
    }

    #[test]
    fn display() {
        let attrs = Attributes::new(Stretch::NORMAL, Weight::BOLD, Style::Italic);
        assert_eq!(attrs.to_string(), "normal bold italic");
        assert_eq!(Weight(450).to_string(), "450");
    }
}
