/*!
WOFF2 to SFNT transcoding.

The only consumer of the Brotli decoder lives here; everything else in
the crate assumes decompressed SFNT input.
*/

mod glyf;
mod triplet;

use brotli_decompressor::{brotli_decode, BrotliResult};

use crate::error::Error;
use crate::internal::{raw_data, raw_tag, RawTag, Stream};
use crate::tag::Tag;
use triplet::read_base128;

const TRANSFORMED_HMTX: Tag = raw_tag(b"hmtx");
const GLYF: Tag = raw_tag(b"glyf");
const LOCA: Tag = raw_tag(b"loca");
const HEAD: Tag = raw_tag(b"head");
const HHEA: Tag = raw_tag(b"hhea");
const MAXP: Tag = raw_tag(b"maxp");

// Fonts compress at ~4:1 in practice; far past that suggests a forged
// uncompressed size.
const MAX_PLAUSIBLE_COMPRESSION_RATIO: u32 = 100;

#[derive(Clone)]
struct Entry {
    tag: Tag,
    orig_length: u32,
    /// Length within the decompressed stream.
    src_length: u32,
    src_offset: u32,
    transformed: bool,
}

/// Transcodes a WOFF2 container into an equivalent SFNT buffer.
///
/// WOFF1 and collections are rejected with distinct errors; callers can
/// feed the result straight into [`FontDirectory::parse`].
///
/// [`FontDirectory::parse`]: crate::FontDirectory::parse
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Error> {
    if raw_data::is_woff(data) {
        return Err(Error::UnsupportedContainer("woff1"));
    }
    if !raw_data::is_woff2(data) {
        return Err(Error::UnsupportedContainer("not woff2"));
    }
    let malformed = |reason| Error::MalformedDirectory(reason);
    let mut s = Stream::new(data);
    s.skip(4).ok_or(malformed("truncated header"))?;
    let flavor = s.read_u32().ok_or(malformed("truncated header"))?;
    if flavor == raw_data::TTCF {
        return Err(Error::UnsupportedContainer("font collection"));
    }
    s.skip(4).ok_or(malformed("truncated header"))?; // file length
    let num_tables = s.read_u16().ok_or(malformed("truncated header"))? as usize;
    s.skip(2).ok_or(malformed("truncated header"))?; // reserved
    let total_sfnt_size = s.read_u32().ok_or(malformed("truncated header"))?;
    let total_compressed_size = s.read_u32().ok_or(malformed("truncated header"))? as usize;
    // version, metadata and private blocks are irrelevant here.
    s.skip(24).ok_or(malformed("truncated header"))?;
    if total_sfnt_size == 0
        || total_sfnt_size / (data.len().max(1) as u32).max(1) > MAX_PLAUSIBLE_COMPRESSION_RATIO
    {
        return Err(malformed("implausible uncompressed size"));
    }

    let mut entries = Vec::with_capacity(num_tables);
    let mut src_offset = 0u32;
    for _ in 0..num_tables {
        let flags = s.read_u8().ok_or(malformed("truncated table record"))?;
        let tag_index = flags & 0x3F;
        let transform_version = flags >> 6;
        let tag = if tag_index == 63 {
            s.read_u32().ok_or(malformed("truncated table record"))?
        } else {
            KNOWN_TAGS[tag_index as usize]
        };
        let orig_length =
            read_base128(&mut s).ok_or(malformed("bad base-128 length"))?;
        // glyf and loca invert the transform flag: version zero means
        // transformed.
        let transformed = if tag == GLYF || tag == LOCA {
            transform_version == 0
        } else {
            transform_version != 0
        };
        let src_length = if transformed {
            read_base128(&mut s).ok_or(malformed("bad base-128 length"))?
        } else {
            orig_length
        };
        if transformed && tag == LOCA && src_length != 0 {
            return Err(malformed("transformed loca must be empty"));
        }
        entries.push(Entry {
            tag,
            orig_length,
            src_length,
            src_offset,
            transformed,
        });
        src_offset = src_offset
            .checked_add(src_length)
            .ok_or(malformed("table stream overflows"))?;
    }

    let compressed = data
        .get(s.offset()..s.offset() + total_compressed_size)
        .ok_or(malformed("compressed body extends past buffer"))?;
    let mut decompressed = vec![0u8; src_offset as usize];
    let info = brotli_decode(compressed, &mut decompressed);
    if !matches!(info.result, BrotliResult::ResultSuccess)
        || info.decoded_size != decompressed.len()
    {
        return Err(malformed("brotli stream is corrupt"));
    }

    assemble(&entries, &decompressed)
}

// Builds the output SFNT: directory sorted by tag, table data in source
// order, checksums recomputed.
fn assemble(entries: &[Entry], stream: &[u8]) -> Result<Vec<u8>, Error> {
    let truncated = |reason| Error::MalformedDirectory(reason);
    let malformed = |reason| Error::MalformedTable {
        tag: GLYF,
        reason,
    };
    let src =
        |entry: &Entry| stream.get(entry.src_offset as usize..(entry.src_offset + entry.src_length) as usize);
    // Reconstruct transformed tables up front.
    let mut rebuilt_glyf: Option<glyf::ReconstructedGlyf> = None;
    let loca_orig = entries
        .iter()
        .find(|e| e.tag == LOCA)
        .map(|e| e.orig_length)
        .unwrap_or(0);
    let num_hmetrics = entries
        .iter()
        .find(|e| e.tag == HHEA)
        .and_then(|e| {
            let data = src(e)?;
            crate::internal::Bytes::new(data).read_u16(34)
        })
        .unwrap_or(0);
    for entry in entries {
        if entry.tag == GLYF && entry.transformed {
            let data = src(entry).ok_or(malformed("glyph stream out of range"))?;
            rebuilt_glyf = Some(
                glyf::reconstruct_glyf(data, loca_orig)
                    .ok_or(malformed("glyf reconstruction failed"))?,
            );
        }
    }
    let mut tables: Vec<(Tag, Vec<u8>)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let data = src(entry).ok_or(truncated("table out of range"))?;
        let bytes = match entry.tag {
            tag if tag == GLYF && entry.transformed => rebuilt_glyf
                .as_ref()
                .ok_or(malformed("glyf reconstruction failed"))?
                .glyf
                .clone(),
            tag if tag == LOCA && entry.transformed => rebuilt_glyf
                .as_ref()
                .ok_or(malformed("loca without glyf"))?
                .loca
                .clone(),
            tag if tag == TRANSFORMED_HMTX && entry.transformed => {
                let rebuilt = rebuilt_glyf
                    .as_ref()
                    .ok_or(malformed("hmtx transform without glyf"))?;
                glyf::reconstruct_hmtx(
                    data,
                    rebuilt.num_glyphs,
                    num_hmetrics,
                    &rebuilt.x_mins,
                )
                .ok_or(malformed("hmtx reconstruction failed"))?
            }
            _ => data.to_vec(),
        };
        tables.push((entry.tag, bytes));
    }

    // SFNT header and directory.
    let num_tables = tables.len() as u16;
    let flavor = if tables.iter().any(|(tag, _)| *tag == GLYF) {
        0x00010000u32
    } else {
        raw_tag(b"OTTO")
    };
    let entry_selector = (num_tables.max(1) as f32).log2() as u16;
    let search_range = 16 * (1 << entry_selector);
    let range_shift = num_tables * 16 - search_range;
    let mut out = Vec::new();
    out.extend_from_slice(&flavor.to_be_bytes());
    out.extend_from_slice(&num_tables.to_be_bytes());
    out.extend_from_slice(&search_range.to_be_bytes());
    out.extend_from_slice(&entry_selector.to_be_bytes());
    out.extend_from_slice(&range_shift.to_be_bytes());

    let mut order: Vec<usize> = (0..tables.len()).collect();
    order.sort_by_key(|&i| tables[i].0);
    // Assign offsets in physical order, 4-byte aligned.
    let directory_len = 12 + tables.len() * 16;
    let mut offsets = vec![0u32; tables.len()];
    let mut running = directory_len as u32;
    for (i, (_, bytes)) in tables.iter().enumerate() {
        offsets[i] = running;
        running = running
            .checked_add((bytes.len() as u32 + 3) & !3)
            .ok_or(truncated("font too large"))?;
    }
    let mut head_offset = None;
    for &i in &order {
        let (tag, bytes) = &tables[i];
        let mut checksum_bytes = bytes.clone();
        if *tag == HEAD {
            head_offset = Some(offsets[i] as usize);
            // checkSumAdjustment participates as zero.
            if checksum_bytes.len() >= 12 {
                checksum_bytes[8..12].fill(0);
            }
        }
        out.extend_from_slice(&tag.to_be_bytes());
        out.extend_from_slice(&checksum(&checksum_bytes).to_be_bytes());
        out.extend_from_slice(&offsets[i].to_be_bytes());
        out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    }
    for (_, bytes) in &tables {
        out.extend_from_slice(bytes);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }
    // File checksum lands in head.checkSumAdjustment.
    if let Some(head) = head_offset {
        if out.len() >= head + 12 {
            out[head + 8..head + 12].fill(0);
            let adjustment = 0xB1B0AFBAu32.wrapping_sub(checksum(&out));
            out[head + 8..head + 12].copy_from_slice(&adjustment.to_be_bytes());
        }
    }
    // maxp glyph count must agree with the reconstructed loca.
    if let (Some(rebuilt), Some(maxp)) = (
        &rebuilt_glyf,
        entries.iter().position(|e| e.tag == MAXP),
    ) {
        let offset = offsets[maxp] as usize + 4;
        if out.len() >= offset + 2 {
            let declared = u16::from_be_bytes([out[offset], out[offset + 1]]);
            if declared != rebuilt.num_glyphs {
                return Err(malformed("glyph count mismatch"));
            }
        }
    }
    Ok(out)
}

fn checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        sum = sum.wrapping_add(u32::from_be_bytes(chunk.try_into().unwrap()));
    }
    let mut tail = [0u8; 4];
    tail[..chunks.remainder().len()].copy_from_slice(chunks.remainder());
    sum.wrapping_add(u32::from_be_bytes(tail))
}

// Tag dictionary from the WOFF2 specification; index 63 signals an
// explicit tag.
#[rustfmt::skip]
const KNOWN_TAGS: [RawTag; 63] = [
    raw_tag(b"cmap"), raw_tag(b"head"), raw_tag(b"hhea"), raw_tag(b"hmtx"),
    raw_tag(b"maxp"), raw_tag(b"name"), raw_tag(b"OS/2"), raw_tag(b"post"),
    raw_tag(b"cvt "), raw_tag(b"fpgm"), raw_tag(b"glyf"), raw_tag(b"loca"),
    raw_tag(b"prep"), raw_tag(b"CFF "), raw_tag(b"VORG"), raw_tag(b"EBDT"),
    raw_tag(b"EBLC"), raw_tag(b"gasp"), raw_tag(b"hdmx"), raw_tag(b"kern"),
    raw_tag(b"LTSH"), raw_tag(b"PCLT"), raw_tag(b"VDMX"), raw_tag(b"vhea"),
    raw_tag(b"vmtx"), raw_tag(b"BASE"), raw_tag(b"GDEF"), raw_tag(b"GPOS"),
    raw_tag(b"GSUB"), raw_tag(b"EBSC"), raw_tag(b"JSTF"), raw_tag(b"MATH"),
    raw_tag(b"CBDT"), raw_tag(b"CBLC"), raw_tag(b"COLR"), raw_tag(b"CPAL"),
    raw_tag(b"SVG "), raw_tag(b"sbix"), raw_tag(b"acnt"), raw_tag(b"avar"),
    raw_tag(b"bdat"), raw_tag(b"bloc"), raw_tag(b"bsln"), raw_tag(b"cvar"),
    raw_tag(b"fdsc"), raw_tag(b"feat"), raw_tag(b"fmtx"), raw_tag(b"fvar"),
    raw_tag(b"gvar"), raw_tag(b"hsty"), raw_tag(b"just"), raw_tag(b"lcar"),
    raw_tag(b"mort"), raw_tag(b"morx"), raw_tag(b"opbd"), raw_tag(b"prop"),
    raw_tag(b"trak"), raw_tag(b"zapf"), raw_tag(b"Silf"), raw_tag(b"Glat"),
    raw_tag(b"Gloc"), raw_tag(b"Feat"), raw_tag(b"Sill"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_other_containers() {
        let mut woff1 = vec![0u8; 48];
        woff1[..4].copy_from_slice(b"wOFF");
        assert_eq!(
            decompress(&woff1).unwrap_err(),
            Error::UnsupportedContainer("woff1")
        );
        let mut sfnt = vec![0u8; 48];
        sfnt[..4].copy_from_slice(&0x00010000u32.to_be_bytes());
        assert_eq!(
            decompress(&sfnt).unwrap_err(),
            Error::UnsupportedContainer("not woff2")
        );
        let mut ttc = vec![0u8; 48];
        ttc[..4].copy_from_slice(b"wOF2");
        ttc[4..8].copy_from_slice(b"ttcf");
        assert_eq!(
            decompress(&ttc).unwrap_err(),
            Error::UnsupportedContainer("font collection")
        );
    }

    #[test]
    fn assembles_untransformed_tables() {
        // Skip the brotli layer and drive table assembly directly: two
        // untransformed tables become a valid SFNT with a sorted
        // directory.
        let entries = vec![
            Entry {
                tag: raw_tag(b"maxp"),
                orig_length: 6,
                src_length: 6,
                src_offset: 0,
                transformed: false,
            },
            Entry {
                tag: raw_tag(b"cmap"),
                orig_length: 4,
                src_length: 4,
                src_offset: 6,
                transformed: false,
            },
        ];
        let stream = [0u8, 0, 0x50, 0, 0, 7, 9, 9, 9, 9];
        let out = assemble(&entries, &stream).unwrap();
        let dir = crate::font::FontDirectory::parse(&out).unwrap();
        assert_eq!(dir.len(), 2);
        let maxp = dir.get(raw_tag(b"maxp")).unwrap();
        assert_eq!(maxp.length, 6);
        assert_eq!(
            &out[maxp.offset as usize..maxp.offset as usize + 6],
            &stream[..6]
        );
        // cmap sorts before maxp in the directory.
        let first_tag = u32::from_be_bytes(out[12..16].try_into().unwrap());
        assert_eq!(first_tag, raw_tag(b"cmap"));
    }

    #[test]
    fn glyf_loca_roundtrip_through_assembly() {
        let glyf_stream = super::glyf::tests::transformed_glyf();
        let mut maxp = vec![0u8; 6];
        maxp[..4].copy_from_slice(&0x00010000u32.to_be_bytes());
        maxp[4..6].copy_from_slice(&1u16.to_be_bytes());
        let mut stream = Vec::new();
        stream.extend_from_slice(&maxp);
        stream.extend_from_slice(&glyf_stream);
        let entries = vec![
            Entry {
                tag: raw_tag(b"maxp"),
                orig_length: 6,
                src_length: 6,
                src_offset: 0,
                transformed: false,
            },
            Entry {
                tag: GLYF,
                orig_length: 0,
                src_length: glyf_stream.len() as u32,
                src_offset: 6,
                transformed: true,
            },
            Entry {
                tag: LOCA,
                orig_length: 4,
                src_length: 0,
                src_offset: 6 + glyf_stream.len() as u32,
                transformed: true,
            },
        ];
        let out = assemble(&entries, &stream).unwrap();
        let dir = crate::font::FontDirectory::parse(&out).unwrap();
        assert!(dir.contains(GLYF));
        assert_eq!(dir.get(LOCA).unwrap().length, 4);
    }
}
