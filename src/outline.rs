// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

/*!
Glyph outlines in font units.
*/

use smallvec::SmallVec;

use crate::error::Error;
use crate::internal::cff::{CffFont, CommandSink, CsError};
use crate::internal::glyf::{self, Glyph};
use crate::internal::var::gvar;
use crate::{GlyphId, NormalizedCoord};

/// Composite expansion depth bound.
const MAX_COMPONENT_DEPTH: u32 = 8;

/// A point in an outline, in integer font units.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Point {
    pub x: i32,
    pub y: i32,
    /// False for control points. TrueType control points are quadratic;
    /// CFF emits two cubic controls between on-curve points.
    pub on_curve: bool,
}

/// A closed sequence of points.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Contour {
    pub points: Vec<Point>,
}

/// A glyph outline: an ordered sequence of contours. An empty sequence
/// denotes a blank glyph.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Outline {
    pub contours: Vec<Contour>,
}

/// Bounding rectangle of an outline in font units.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Bounds {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl Outline {
    /// Returns true if the outline has no contours.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Returns the total number of points.
    pub fn point_count(&self) -> usize {
        self.contours.iter().map(|c| c.points.len()).sum()
    }

    /// Returns the bounding rectangle computed by scanning every point,
    /// or `None` for a blank glyph.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.contours.iter().flat_map(|c| c.points.iter());
        let first = points.next()?;
        let mut bounds = Bounds {
            x_min: first.x,
            y_min: first.y,
            x_max: first.x,
            y_max: first.y,
        };
        for point in points {
            bounds.x_min = bounds.x_min.min(point.x);
            bounds.y_min = bounds.y_min.min(point.y);
            bounds.x_max = bounds.x_max.max(point.x);
            bounds.y_max = bounds.y_max.max(point.y);
        }
        Some(bounds)
    }
}

/// Table offsets needed to build TrueType outlines.
#[derive(Copy, Clone, Default)]
pub(crate) struct TrueTypeTables {
    pub loca_fmt: u8,
    pub loca: u32,
    pub glyf: u32,
    pub gvar: u32,
}

/// Builds the outline for a TrueType glyph, applying gvar deltas when
/// coordinates are supplied.
pub(crate) fn truetype_outline(
    data: &[u8],
    tables: &TrueTypeTables,
    glyph_id: GlyphId,
    coords: &[NormalizedCoord],
) -> Result<Outline, Error> {
    let mut outline = Outline::default();
    let mut visited = SmallVec::<[GlyphId; 8]>::new();
    resolve(
        data,
        tables,
        glyph_id,
        coords,
        0,
        &mut visited,
        [1., 0., 0., 1., 0., 0.],
        &mut outline,
    )?;
    Ok(outline)
}

// Transform layout: [xx, xy, yx, yy, dx, dy];
// (x, y) -> (xx*x + yx*y + dx, xy*x + yy*y + dy).
fn apply(t: &[f32; 6], x: f32, y: f32) -> (f32, f32) {
    (t[0] * x + t[2] * y + t[4], t[1] * x + t[3] * y + t[5])
}

fn compose(parent: &[f32; 6], child: &[f32; 6]) -> [f32; 6] {
    let (dx, dy) = apply(parent, child[4], child[5]);
    [
        parent[0] * child[0] + parent[2] * child[1],
        parent[1] * child[0] + parent[3] * child[1],
        parent[0] * child[2] + parent[2] * child[3],
        parent[1] * child[2] + parent[3] * child[3],
        dx,
        dy,
    ]
}

fn resolve(
    data: &[u8],
    tables: &TrueTypeTables,
    glyph_id: GlyphId,
    coords: &[NormalizedCoord],
    depth: u32,
    visited: &mut SmallVec<[GlyphId; 8]>,
    transform: [f32; 6],
    outline: &mut Outline,
) -> Result<(), Error> {
    if depth > MAX_COMPONENT_DEPTH || visited.contains(&glyph_id) {
        return Err(Error::CycleDetected);
    }
    let glyph_data = glyf::get(data, tables.loca_fmt, tables.loca, tables.glyf, glyph_id)
        .unwrap_or(&[]);
    match glyf::parse(glyph_data).ok_or(Error::OutOfBounds)? {
        Glyph::Empty => Ok(()),
        Glyph::Simple(simple) => {
            let deltas = if !coords.is_empty() {
                gvar::deltas(data, tables.gvar, glyph_id, coords, simple.points.len())
            } else {
                None
            };
            let mut start = 0usize;
            for end in simple.contour_ends.iter() {
                let end = *end as usize + 1;
                let mut contour = Contour {
                    points: Vec::with_capacity(end - start),
                };
                for (i, point) in simple.points.get(start..end).unwrap_or(&[]).iter().enumerate() {
                    let (mut x, mut y) = (point.x as f32, point.y as f32);
                    if let Some(deltas) = &deltas {
                        if let Some((dx, dy)) = deltas.get(start + i) {
                            // Deltas land in integer space before any
                            // component transform.
                            x = (x + dx.to_f32()).round();
                            y = (y + dy.to_f32()).round();
                        }
                    }
                    let (x, y) = apply(&transform, x, y);
                    contour.points.push(Point {
                        x: x.round() as i32,
                        y: y.round() as i32,
                        on_curve: point.on_curve,
                    });
                }
                if !contour.points.is_empty() {
                    outline.contours.push(contour);
                }
                start = end;
            }
            Ok(())
        }
        Glyph::Composite(composite) => {
            visited.push(glyph_id);
            let base_contour = outline.contours.len();
            let components: Vec<_> = composite.components().collect();
            let deltas = if !coords.is_empty() {
                gvar::deltas(data, tables.gvar, glyph_id, coords, components.len())
            } else {
                None
            };
            for (i, component) in components.iter().enumerate() {
                let (mut dx, mut dy) = (component.dx as f32, component.dy as f32);
                if component.anchor.is_none() {
                    if let Some(deltas) = &deltas {
                        if let Some((ddx, ddy)) = deltas.get(i) {
                            dx = (dx + ddx.to_f32()).round();
                            dy = (dy + ddy.to_f32()).round();
                        }
                    }
                }
                let x = component.xform;
                let local = [x[0], x[1], x[2], x[3], dx, dy];
                let combined = compose(&transform, &local);
                let first_new = outline.contours.len();
                resolve(
                    data,
                    tables,
                    component.glyph_id,
                    coords,
                    depth + 1,
                    visited,
                    combined,
                    outline,
                )?;
                // Point matching: shift the component so its anchor point
                // lands on the parent's.
                if let Some((parent_index, child_index)) = component.anchor {
                    let parent_point =
                        nth_point(&outline.contours[base_contour..first_new], parent_index);
                    let child_point = nth_point(&outline.contours[first_new..], child_index);
                    if let (Some(p), Some(c)) = (parent_point, child_point) {
                        let (sx, sy) = (p.x - c.x, p.y - c.y);
                        for contour in &mut outline.contours[first_new..] {
                            for point in &mut contour.points {
                                point.x += sx;
                                point.y += sy;
                            }
                        }
                    }
                }
            }
            visited.pop();
            Ok(())
        }
    }
}

fn nth_point(contours: &[Contour], index: u16) -> Option<Point> {
    let mut remaining = index as usize;
    for contour in contours {
        if remaining < contour.points.len() {
            return Some(contour.points[remaining]);
        }
        remaining -= contour.points.len();
    }
    None
}

/// Sink that collects charstring commands into contours, storing cubic
/// controls as off-curve points.
#[derive(Default)]
pub(crate) struct OutlineSink {
    outline: Outline,
    current: Vec<Point>,
}

impl OutlineSink {
    pub fn finish(mut self) -> Outline {
        self.flush();
        self.outline
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.outline.contours.push(Contour {
                points: core::mem::take(&mut self.current),
            });
        }
    }

    fn point(x: f32, y: f32, on_curve: bool) -> Point {
        Point {
            x: x.round() as i32,
            y: y.round() as i32,
            on_curve,
        }
    }
}

impl CommandSink for OutlineSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.flush();
        self.current.push(Self::point(x, y, true));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.current.push(Self::point(x, y, true));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.current.push(Self::point(x1, y1, false));
        self.current.push(Self::point(x2, y2, false));
        self.current.push(Self::point(x, y, true));
    }

    fn close(&mut self) {
        self.flush();
    }
}

/// Builds the outline for a CFF or CFF2 glyph.
pub(crate) fn cff_outline(
    font: &CffFont,
    glyph_id: GlyphId,
    coords: &[NormalizedCoord],
) -> Result<Outline, Error> {
    let mut sink = OutlineSink::default();
    match font.evaluate(glyph_id, coords, &mut sink) {
        Ok(()) => Ok(sink.finish()),
        Err(CsError::Limit) => Err(Error::CharstringLimit),
        Err(CsError::Invalid) => Err(Error::OutOfBounds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_tables() -> (Vec<u8>, TrueTypeTables) {
        // Glyph 0: empty. Glyph 1: the unit square from the glyf tests.
        // Glyph 2: composite of two glyph-1 copies.
        let simple = crate::internal::glyf::tests::simple_glyph_bytes();
        let composite = crate::internal::glyf::tests::composite_glyph_bytes();
        let mut glyf = Vec::new();
        glyf.extend_from_slice(&simple);
        glyf.extend_from_slice(&composite);
        // Short loca: 0, 0, len(simple), len(simple)+len(composite)
        let offsets = [0usize, 0, simple.len(), simple.len() + composite.len()];
        let mut data = Vec::new();
        for off in offsets {
            data.extend_from_slice(&((off / 2) as u16).to_be_bytes());
        }
        let loca_len = data.len();
        data.extend_from_slice(&glyf);
        (
            data,
            TrueTypeTables {
                loca_fmt: 0,
                loca: 0,
                glyf: loca_len as u32,
                gvar: 0,
            },
        )
    }

    #[test]
    fn empty_glyph_is_blank() {
        let (data, tables) = square_tables();
        let outline = truetype_outline(&data, &tables, 0, &[]).unwrap();
        assert!(outline.is_empty());
        assert!(outline.bounds().is_none());
    }

    #[test]
    fn simple_outline_and_bounds() {
        let (data, tables) = square_tables();
        let outline = truetype_outline(&data, &tables, 1, &[]).unwrap();
        assert_eq!(outline.contours.len(), 1);
        assert_eq!(outline.point_count(), 4);
        assert_eq!(
            outline.bounds(),
            Some(Bounds {
                x_min: 0,
                y_min: 0,
                x_max: 100,
                y_max: 100
            })
        );
    }

    #[test]
    fn composite_translation() {
        let (data, tables) = square_tables();
        let outline = truetype_outline(&data, &tables, 2, &[]).unwrap();
        assert_eq!(outline.contours.len(), 2);
        // Second component is translated by (250, 10).
        assert_eq!(outline.contours[1].points[0], Point { x: 250, y: 10, on_curve: true });
        assert_eq!(outline.bounds().unwrap().x_max, 350);
    }

    #[test]
    fn self_referential_composite_detected() {
        // Composite glyph that references itself.
        let mut glyph = Vec::new();
        glyph.extend_from_slice(&(-1i16).to_be_bytes());
        glyph.extend_from_slice(&[0; 8]);
        glyph.extend_from_slice(&0x0003u16.to_be_bytes()); // words | xy args
        glyph.extend_from_slice(&0u16.to_be_bytes()); // itself
        glyph.extend_from_slice(&[0; 4]);
        let mut data = Vec::new();
        for off in [0usize, glyph.len()] {
            data.extend_from_slice(&((off / 2) as u16).to_be_bytes());
        }
        let loca_len = data.len();
        data.extend_from_slice(&glyph);
        let tables = TrueTypeTables {
            loca_fmt: 0,
            loca: 0,
            glyf: loca_len as u32,
            gvar: 0,
        };
        assert_eq!(
            truetype_outline(&data, &tables, 0, &[]),
            Err(Error::CycleDetected)
        );
    }
}
