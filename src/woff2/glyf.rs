//! Reconstruction of the transformed `glyf`/`loca` and `hmtx` tables.

use super::triplet::{decode_triplets, read_255_u16, Point};
use crate::internal::Stream;

const ON_CURVE: u8 = 0x01;
const X_SHORT: u8 = 0x02;
const Y_SHORT: u8 = 0x04;
const REPEAT: u8 = 0x08;
const X_SAME_OR_POSITIVE: u8 = 0x10;
const Y_SAME_OR_POSITIVE: u8 = 0x20;
const OVERLAP_SIMPLE: u8 = 0x40;

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;
const WE_HAVE_INSTRUCTIONS: u16 = 0x0100;

const FLAG_OVERLAP_SIMPLE_BITMAP: u16 = 0x0001;

/// Output of glyf/loca reconstruction.
pub struct ReconstructedGlyf {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
    pub num_glyphs: u16,
    /// Per-glyph x-min values, needed to rebuild a transformed `hmtx`.
    pub x_mins: Vec<i16>,
}

/// Rebuilds native `glyf` and `loca` tables from the transformed stream.
/// `loca_orig_length` is validated against the declared index format.
pub fn reconstruct_glyf(data: &[u8], loca_orig_length: u32) -> Option<ReconstructedGlyf> {
    let mut header = Stream::new(data);
    header.skip(2)?; // reserved
    let option_flags = header.read_u16()?;
    let num_glyphs = header.read_u16()?;
    let index_format = header.read_u16()?;
    let expected_loca = (if index_format != 0 { 4 } else { 2 }) * (num_glyphs as u32 + 1);
    if loca_orig_length != expected_loca {
        return None;
    }
    // Seven substreams follow the fixed header.
    let mut offset = (2 + 7) * 4;
    let mut substreams = [&data[0..0]; 7];
    for slot in substreams.iter_mut() {
        let size = header.read_u32()? as usize;
        *slot = data.get(offset..offset + size)?;
        offset += size;
    }
    let [n_contours_data, n_points_data, flags_data, glyphs_data, composites_data, bbox_data, instructions_data] =
        substreams;
    let overlap_bitmap = if option_flags & FLAG_OVERLAP_SIMPLE_BITMAP != 0 {
        let len = (num_glyphs as usize + 7) >> 3;
        Some(data.get(offset..offset + len)?)
    } else {
        None
    };
    let mut n_contours = Stream::new(n_contours_data);
    let mut n_points = Stream::new(n_points_data);
    let mut flags = Stream::new(flags_data);
    let mut glyphs = Stream::new(glyphs_data);
    let mut composites = Stream::new(composites_data);
    let mut instructions = Stream::new(instructions_data);
    // The bbox stream leads with a bitmap marking glyphs that carry an
    // explicit bounding box.
    let bbox_bitmap_len = ((num_glyphs as usize + 31) >> 5) << 2;
    let bbox_bitmap = bbox_data.get(..bbox_bitmap_len)?;
    let mut bboxes = Stream::with_offset(bbox_data, bbox_bitmap_len)?;

    let mut glyf = Vec::new();
    let mut loca_values = Vec::with_capacity(num_glyphs as usize + 1);
    let mut x_mins = vec![0i16; num_glyphs as usize];
    for i in 0..num_glyphs as usize {
        loca_values.push(glyf.len() as u32);
        let contour_count = n_contours.read_u16()?;
        let has_bbox = bbox_bitmap[i >> 3] & (0x80 >> (i & 7)) != 0;
        if contour_count == 0xFFFF {
            // Composite: the component stream carries native records.
            if !has_bbox {
                return None;
            }
            let (size, has_instructions) = composite_size(&composites)?;
            glyf.extend_from_slice(&(-1i16).to_be_bytes());
            glyf.extend_from_slice(bboxes.read_bytes(8)?);
            glyf.extend_from_slice(composites.read_bytes(size)?);
            if has_instructions {
                let ins_len = read_255_u16(&mut glyphs)? as usize;
                glyf.extend_from_slice(&(ins_len as u16).to_be_bytes());
                glyf.extend_from_slice(instructions.read_bytes(ins_len)?);
            }
        } else if contour_count > 0 {
            // Simple glyph from the triplet streams.
            let mut ends = Vec::with_capacity(contour_count as usize);
            let mut total_points = 0usize;
            for _ in 0..contour_count {
                let count = read_255_u16(&mut n_points)? as usize;
                total_points = total_points.checked_add(count)?;
                if total_points > 0xFFFF {
                    return None;
                }
                ends.push(total_points.checked_sub(1)? as u16);
            }
            let flag_bytes = flags.read_bytes(total_points)?;
            let (points, consumed) =
                decode_triplets(flag_bytes, glyphs.data().get(glyphs.offset()..)?)?;
            glyphs.skip(consumed)?;
            let ins_len = read_255_u16(&mut glyphs)? as usize;
            glyf.extend_from_slice(&(contour_count as i16).to_be_bytes());
            if has_bbox {
                glyf.extend_from_slice(bboxes.read_bytes(8)?);
            } else {
                push_bbox(&points, &mut glyf);
            }
            x_mins[i] = i16::from_be_bytes([glyf[loca_values[i] as usize + 2], glyf[loca_values[i] as usize + 3]]);
            for end in &ends {
                glyf.extend_from_slice(&end.to_be_bytes());
            }
            glyf.extend_from_slice(&(ins_len as u16).to_be_bytes());
            glyf.extend_from_slice(instructions.read_bytes(ins_len)?);
            let overlap = overlap_bitmap
                .map(|bitmap| bitmap[i >> 3] & (0x80 >> (i & 7)) != 0)
                .unwrap_or(false);
            push_points(&points, overlap, &mut glyf);
        } else {
            // Empty glyph; the spec forbids a bbox here.
            if has_bbox {
                return None;
            }
        }
        // Keep glyph records aligned so checksums are stable.
        while glyf.len() % 4 != 0 {
            glyf.push(0);
        }
    }
    loca_values.push(glyf.len() as u32);
    let mut loca = Vec::with_capacity(loca_values.len() * 4);
    for value in &loca_values {
        if index_format != 0 {
            loca.extend_from_slice(&value.to_be_bytes());
        } else {
            loca.extend_from_slice(&((value / 2) as u16).to_be_bytes());
        }
    }
    Some(ReconstructedGlyf {
        glyf,
        loca,
        num_glyphs,
        x_mins,
    })
}

// Measures one composite record without consuming the stream.
fn composite_size(composites: &Stream) -> Option<(usize, bool)> {
    let mut probe = *composites;
    let mut size = 0usize;
    let mut has_instructions = false;
    loop {
        let flags = probe.read_u16()?;
        probe.skip(2)?; // glyph index
        let mut arg_size = if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            arg_size += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            arg_size += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            arg_size += 8;
        }
        probe.skip(arg_size)?;
        size += 4 + arg_size;
        if flags & WE_HAVE_INSTRUCTIONS != 0 {
            has_instructions = true;
        }
        if flags & MORE_COMPONENTS == 0 {
            return Some((size, has_instructions));
        }
    }
}

fn push_bbox(points: &[Point], out: &mut Vec<u8>) {
    let mut x_min = 0;
    let mut y_min = 0;
    let mut x_max = 0;
    let mut y_max = 0;
    if let Some(first) = points.first() {
        x_min = first.x;
        x_max = first.x;
        y_min = first.y;
        y_max = first.y;
    }
    for p in points {
        x_min = x_min.min(p.x);
        x_max = x_max.max(p.x);
        y_min = y_min.min(p.y);
        y_max = y_max.max(p.y);
    }
    for v in [x_min, y_min, x_max, y_max] {
        out.extend_from_slice(&(v as i16).to_be_bytes());
    }
}

// Re-encodes points with the native flag/coordinate packing, including
// repeat compression.
fn push_points(points: &[Point], overlap: bool, out: &mut Vec<u8>) {
    let mut flags = Vec::with_capacity(points.len());
    let mut x_bytes = Vec::new();
    let mut y_bytes = Vec::new();
    let mut last_x = 0i32;
    let mut last_y = 0i32;
    for (i, point) in points.iter().enumerate() {
        let mut flag = if point.on_curve { ON_CURVE } else { 0 };
        if overlap && i == 0 {
            flag |= OVERLAP_SIMPLE;
        }
        let dx = point.x - last_x;
        let dy = point.y - last_y;
        if dx == 0 {
            flag |= X_SAME_OR_POSITIVE;
        } else if (-255..=255).contains(&dx) {
            flag |= X_SHORT;
            if dx > 0 {
                flag |= X_SAME_OR_POSITIVE;
            }
            x_bytes.push(dx.unsigned_abs() as u8);
        } else {
            x_bytes.extend_from_slice(&(dx as i16).to_be_bytes());
        }
        if dy == 0 {
            flag |= Y_SAME_OR_POSITIVE;
        } else if (-255..=255).contains(&dy) {
            flag |= Y_SHORT;
            if dy > 0 {
                flag |= Y_SAME_OR_POSITIVE;
            }
            y_bytes.push(dy.unsigned_abs() as u8);
        } else {
            y_bytes.extend_from_slice(&(dy as i16).to_be_bytes());
        }
        last_x = point.x;
        last_y = point.y;
        flags.push(flag);
    }
    // Compress runs of identical flags.
    let mut i = 0;
    while i < flags.len() {
        let flag = flags[i];
        let mut run = 1usize;
        while i + run < flags.len() && flags[i + run] == flag && run < 256 {
            run += 1;
        }
        if run > 1 {
            out.push(flag | REPEAT);
            out.push((run - 1) as u8);
        } else {
            out.push(flag);
        }
        i += run;
    }
    out.extend_from_slice(&x_bytes);
    out.extend_from_slice(&y_bytes);
}

/// Rebuilds a transformed `hmtx` table. The transform drops side
/// bearings that can be recovered from glyph x-min values.
pub fn reconstruct_hmtx(
    data: &[u8],
    num_glyphs: u16,
    num_hmetrics: u16,
    x_mins: &[i16],
) -> Option<Vec<u8>> {
    let mut s = Stream::new(data);
    let flags = s.read_u8()?;
    let has_proportional_lsbs = flags & 1 == 0;
    let has_monospace_lsbs = flags & 2 == 0;
    if flags & 0xFC != 0 || (has_proportional_lsbs && has_monospace_lsbs) {
        return None;
    }
    if num_hmetrics > num_glyphs || num_hmetrics < 1 || x_mins.len() != num_glyphs as usize {
        return None;
    }
    let mut advances = Vec::with_capacity(num_hmetrics as usize);
    for _ in 0..num_hmetrics {
        advances.push(s.read_u16()?);
    }
    let mut lsbs = Vec::with_capacity(num_glyphs as usize);
    for i in 0..num_glyphs as usize {
        let explicit = if i < num_hmetrics as usize {
            has_proportional_lsbs
        } else {
            has_monospace_lsbs
        };
        lsbs.push(if explicit { s.read_i16()? } else { x_mins[i] });
    }
    let mut out = Vec::with_capacity(num_glyphs as usize * 2 + num_hmetrics as usize * 2);
    for (i, lsb) in lsbs.iter().enumerate() {
        if i < num_hmetrics as usize {
            out.extend_from_slice(&advances[i].to_be_bytes());
        }
        out.extend_from_slice(&lsb.to_be_bytes());
    }
    Some(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    // Transformed stream with one simple triangle glyph and no bbox.
    pub(crate) fn transformed_glyf() -> Vec<u8> {
        let n_contours: Vec<u8> = 1u16.to_be_bytes().to_vec();
        let n_points = vec![3u8]; // one contour, three points
        // Triplet flags/data: three one-byte dx moves (flag 11).
        let flags = vec![11u8, 11, 9];
        // glyph stream: triplet data then instruction length 0.
        let glyph_stream = vec![10u8, 20, 30, 0];
        let bbox = vec![0u8; 4]; // bitmap only, no explicit bbox
        let streams: [&[u8]; 7] = [
            &n_contours,
            &n_points,
            &flags,
            &glyph_stream,
            &[],
            &bbox,
            &[],
        ];
        let mut d = Vec::new();
        d.extend_from_slice(&0u16.to_be_bytes()); // reserved
        d.extend_from_slice(&0u16.to_be_bytes()); // option flags
        d.extend_from_slice(&1u16.to_be_bytes()); // num glyphs
        d.extend_from_slice(&0u16.to_be_bytes()); // short loca
        for s in streams {
            d.extend_from_slice(&(s.len() as u32).to_be_bytes());
        }
        for s in streams {
            d.extend_from_slice(s);
        }
        d
    }

    #[test]
    fn simple_glyph_roundtrip() {
        let d = transformed_glyf();
        let rebuilt = reconstruct_glyf(&d, 4).unwrap();
        assert_eq!(rebuilt.num_glyphs, 1);
        // Decode the rebuilt glyph with the native parser.
        let glyph = crate::internal::glyf::parse(&rebuilt.glyf).unwrap();
        let simple = match glyph {
            crate::internal::glyf::Glyph::Simple(simple) => simple,
            _ => panic!("expected a simple glyph"),
        };
        assert_eq!(simple.contour_ends, [2]);
        let coords: Vec<(i32, i32)> = simple.points.iter().map(|p| (p.x, p.y)).collect();
        // dx +10, +20 then flag 9 is a one-byte dy: ((9 & 14) << 7) + 30
        // positive.
        assert_eq!(coords, [(10, 0), (30, 0), (30, 1054)]);
        assert_eq!(rebuilt.x_mins, [10]);
        // loca: short format, halved offsets, final entry is the length.
        assert_eq!(rebuilt.loca.len(), 4);
    }

    #[test]
    fn loca_length_mismatch_rejected() {
        let d = transformed_glyf();
        assert!(reconstruct_glyf(&d, 8).is_none());
    }

    #[test]
    fn hmtx_reconstruction() {
        // flags 0b11: both lsb streams omitted.
        let mut d = vec![0b11u8];
        d.extend_from_slice(&500u16.to_be_bytes());
        let out = reconstruct_hmtx(&d, 2, 1, &[25, -3]).unwrap();
        // glyph 0: advance 500, lsb 25; glyph 1: lsb -3.
        assert_eq!(
            out,
            [1, 244, 0, 25, 255, 253]
        );
    }
}
