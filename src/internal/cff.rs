//! Compact font format tables and the Type 2 charstring interpreter.
//!
//! Covers both the CFF table of OpenType fonts and the trimmed CFF2 form
//! used by variable fonts. Hints are consumed and discarded; the
//! interpreter only produces geometry.

use super::var;
use super::{raw_tag, Bytes, RawTag, Stream};

pub const CFF: RawTag = raw_tag(b"CFF ");
pub const CFF2: RawTag = raw_tag(b"CFF2");
pub const VORG: RawTag = raw_tag(b"VORG");

/// Subroutine call depth bound.
pub const MAX_SUBR_DEPTH: u32 = 10;
/// Total operator budget for one charstring evaluation.
pub const MAX_OPS: u32 = 65536;
const MAX_STACK: usize = 513;

/// Failure modes of charstring evaluation.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CsError {
    /// Subroutine depth or operator budget exceeded.
    Limit,
    /// Structurally invalid charstring or index.
    Invalid,
}

/// INDEX structure: a packed array of variable sized objects.
#[derive(Copy, Clone)]
pub struct Index<'a> {
    data: Bytes<'a>,
    count: u32,
    off_size: u8,
    offset_base: usize,
    payload_base: usize,
    end: usize,
}

impl<'a> Index<'a> {
    /// Returns an empty index.
    pub fn empty() -> Self {
        Self {
            data: Bytes::new(&[]),
            count: 0,
            off_size: 0,
            offset_base: 0,
            payload_base: 0,
            end: 0,
        }
    }

    /// Parses an index at the specified offset. CFF2 widens the count
    /// field to 32 bits.
    pub fn parse(data: Bytes<'a>, offset: usize, cff2: bool) -> Option<Self> {
        let (count, mut cursor) = if cff2 {
            (data.read_u32(offset)?, offset + 4)
        } else {
            (data.read_u16(offset)? as u32, offset + 2)
        };
        if count == 0 {
            return Some(Self {
                data,
                count: 0,
                off_size: 0,
                offset_base: 0,
                payload_base: 0,
                end: cursor,
            });
        }
        let off_size = data.read_u8(cursor)?;
        if !(1..=4).contains(&off_size) {
            return None;
        }
        cursor += 1;
        let offset_base = cursor;
        let offsets_len = (count as usize + 1) * off_size as usize;
        data.ensure_range(offset_base, offsets_len)?;
        // The object area starts one byte before the first (1-based)
        // offset lands.
        let payload_base = offset_base + offsets_len - 1;
        let index = Self {
            data,
            count,
            off_size,
            offset_base,
            payload_base,
            end: 0,
        };
        let last = index.raw_offset(count as usize)?;
        let end = payload_base.checked_add(last)?;
        data.ensure_range(payload_base + 1, last.checked_sub(1)?)?;
        Some(Self { end, ..index })
    }

    fn raw_offset(&self, index: usize) -> Option<usize> {
        let base = self.offset_base + index * self.off_size as usize;
        Some(match self.off_size {
            1 => self.data.read_u8(base)? as usize,
            2 => self.data.read_u16(base)? as usize,
            3 => self.data.read_u24(base)? as usize,
            4 => self.data.read_u32(base)? as usize,
            _ => return None,
        })
    }

    /// Returns the number of objects.
    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the offset just past the end of the index.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the object at the specified index.
    pub fn get(&self, index: u32) -> Option<&'a [u8]> {
        if index >= self.count {
            return None;
        }
        let start = self.raw_offset(index as usize)?;
        let end = self.raw_offset(index as usize + 1)?;
        if end < start || start == 0 {
            return None;
        }
        self.data
            .read_bytes(self.payload_base + start, end - start)
    }
}

/// Operator and operands from a DICT.
struct DictEntry {
    op: u16,
    operands: [f64; 8],
    len: usize,
}

impl DictEntry {
    fn first(&self) -> Option<f64> {
        (self.len > 0).then(|| self.operands[0])
    }

    fn pair(&self) -> Option<(f64, f64)> {
        (self.len > 1).then(|| (self.operands[0], self.operands[1]))
    }
}

/// Iterates the entries of a DICT.
fn parse_dict(data: &[u8], mut f: impl FnMut(&DictEntry)) -> Option<()> {
    let mut s = Stream::new(data);
    let mut operands = [0f64; 8];
    let mut len = 0usize;
    while s.remaining() > 0 {
        let b0 = s.read_u8()?;
        match b0 {
            0..=21 => {
                let op = if b0 == 12 {
                    0x0C00 | s.read_u8()? as u16
                } else {
                    b0 as u16
                };
                f(&DictEntry { op, operands, len });
                len = 0;
            }
            28 => push_operand(&mut operands, &mut len, s.read_i16()? as f64),
            29 => push_operand(&mut operands, &mut len, s.read_i32()? as f64),
            30 => push_operand(&mut operands, &mut len, parse_real(&mut s)?),
            32..=246 => push_operand(&mut operands, &mut len, b0 as f64 - 139.),
            247..=250 => {
                let b1 = s.read_u8()? as f64;
                push_operand(&mut operands, &mut len, (b0 as f64 - 247.) * 256. + b1 + 108.);
            }
            251..=254 => {
                let b1 = s.read_u8()? as f64;
                push_operand(
                    &mut operands,
                    &mut len,
                    -(b0 as f64 - 251.) * 256. - b1 - 108.,
                );
            }
            _ => return None,
        }
    }
    Some(())
}

fn push_operand(operands: &mut [f64; 8], len: &mut usize, value: f64) {
    // DICT operators of interest take at most two operands; keep the
    // trailing window.
    if *len == operands.len() {
        operands.rotate_left(1);
        operands[7] = value;
    } else {
        operands[*len] = value;
        *len += 1;
    }
}

/// Binary coded decimal real; precision past f64 is discarded.
fn parse_real(s: &mut Stream) -> Option<f64> {
    let mut text = String::new();
    loop {
        let byte = s.read_u8()?;
        for nibble in [byte >> 4, byte & 0xF] {
            match nibble {
                0..=9 => text.push((b'0' + nibble) as char),
                0xA => text.push('.'),
                0xB => text.push('E'),
                0xC => text.push_str("E-"),
                0xE => text.push('-'),
                0xF => return text.parse().ok().or(Some(0.)),
                _ => return None,
            }
        }
    }
}

/// FDSelect mapping from glyphs to font dicts in CID-keyed fonts.
#[derive(Copy, Clone)]
struct FdSelect {
    offset: usize,
}

impl FdSelect {
    fn font_index(&self, data: &Bytes, glyph_id: u16) -> Option<u8> {
        let b = data;
        match b.read_u8(self.offset)? {
            0 => b.read_u8(self.offset + 1 + glyph_id as usize),
            3 => {
                let count = b.read_u16(self.offset + 1)? as usize;
                let base = self.offset + 3;
                let mut lo = 0;
                let mut hi = count;
                while lo < hi {
                    let i = (lo + hi) / 2;
                    let first = b.read_u16(base + i * 3)?;
                    let next = b.read_u16(base + (i + 1) * 3)?;
                    if glyph_id < first {
                        hi = i;
                    } else if glyph_id >= next {
                        lo = i + 1;
                    } else {
                        return b.read_u8(base + i * 3 + 2);
                    }
                }
                None
            }
            _ => None,
        }
    }
}

/// Private DICT state needed for evaluation.
#[derive(Copy, Clone, Default)]
struct Private<'a> {
    subrs: Option<Index<'a>>,
}

/// Decoded CFF or CFF2 table sufficient for charstring evaluation.
#[derive(Copy, Clone)]
pub struct CffFont<'a> {
    data: Bytes<'a>,
    is_cff2: bool,
    charstrings: Index<'a>,
    global_subrs: Index<'a>,
    private: Private<'a>,
    fd_array: Option<Index<'a>>,
    fd_select: Option<FdSelect>,
    /// Offset of the item variation store within the table, past the
    /// CFF2 length prefix. Zero when absent.
    vstore: u32,
}

impl<'a> CffFont<'a> {
    /// Parses a `CFF ` table.
    pub fn parse_cff(data: &'a [u8]) -> Option<Self> {
        let b = Bytes::new(data);
        let header_size = b.read_u8(2)? as usize;
        let name_index = Index::parse(b, header_size, false)?;
        let top_dicts = Index::parse(b, name_index.end(), false)?;
        let string_index = Index::parse(b, top_dicts.end(), false)?;
        let global_subrs = Index::parse(b, string_index.end(), false)?;
        let top_dict = top_dicts.get(0)?;
        let mut charstrings_offset = 0usize;
        let mut private_range = None;
        let mut fd_array_offset = None;
        let mut fd_select_offset = None;
        parse_dict(top_dict, |entry| match entry.op {
            17 => charstrings_offset = entry.first().unwrap_or(0.) as usize,
            18 => private_range = entry.pair(),
            0x0C24 => fd_array_offset = entry.first(),
            0x0C25 => fd_select_offset = entry.first(),
            _ => {}
        })?;
        if charstrings_offset == 0 {
            return None;
        }
        let charstrings = Index::parse(b, charstrings_offset, false)?;
        let private = private_range
            .and_then(|(size, offset)| Self::parse_private(b, offset as usize, size as usize))
            .unwrap_or_default();
        let fd_array = match fd_array_offset {
            Some(offset) => Some(Index::parse(b, offset as usize, false)?),
            None => None,
        };
        let fd_select = fd_select_offset.map(|offset| FdSelect {
            offset: offset as usize,
        });
        Some(Self {
            data: b,
            is_cff2: false,
            charstrings,
            global_subrs,
            private,
            fd_array,
            fd_select,
            vstore: 0,
        })
    }

    /// Parses a `CFF2` table.
    pub fn parse_cff2(data: &'a [u8]) -> Option<Self> {
        let b = Bytes::new(data);
        if b.read_u8(0)? != 2 {
            return None;
        }
        let header_size = b.read_u8(2)? as usize;
        let top_dict_len = b.read_u16(3)? as usize;
        let top_dict = b.read_bytes(header_size, top_dict_len)?;
        let global_subrs = Index::parse(b, header_size + top_dict_len, true)?;
        let mut charstrings_offset = 0usize;
        let mut fd_array_offset = None;
        let mut fd_select_offset = None;
        let mut vstore = 0u32;
        parse_dict(top_dict, |entry| match entry.op {
            17 => charstrings_offset = entry.first().unwrap_or(0.) as usize,
            24 => vstore = entry.first().unwrap_or(0.) as u32,
            0x0C24 => fd_array_offset = entry.first(),
            0x0C25 => fd_select_offset = entry.first(),
            _ => {}
        })?;
        if charstrings_offset == 0 {
            return None;
        }
        let charstrings = Index::parse(b, charstrings_offset, true)?;
        let fd_array = match fd_array_offset {
            Some(offset) => Some(Index::parse(b, offset as usize, true)?),
            None => None,
        };
        let fd_select = fd_select_offset.map(|offset| FdSelect {
            offset: offset as usize,
        });
        // The store is prefixed with a 16-bit length in CFF2.
        let vstore = if vstore != 0 { vstore + 2 } else { 0 };
        Some(Self {
            data: b,
            is_cff2: true,
            charstrings,
            global_subrs,
            private: Private::default(),
            fd_array,
            fd_select,
            vstore,
        })
    }

    fn parse_private(data: Bytes<'a>, offset: usize, size: usize) -> Option<Private<'a>> {
        let dict = data.read_bytes(offset, size)?;
        let mut subrs_offset = None;
        parse_dict(dict, |entry| {
            if entry.op == 19 {
                subrs_offset = entry.first();
            }
        })?;
        let subrs = match subrs_offset {
            // Subrs offsets are relative to the private dict.
            Some(rel) => Some(Index::parse(data, offset + rel as usize, false)?),
            None => None,
        };
        Some(Private { subrs })
    }

    /// Returns the number of charstrings.
    pub fn glyph_count(&self) -> u32 {
        self.charstrings.len()
    }

    fn private_for(&self, glyph_id: u16) -> Option<Private<'a>> {
        let (fd_array, fd_select) = match (&self.fd_array, &self.fd_select) {
            (Some(fd_array), _) => (fd_array, self.fd_select),
            _ => return Some(self.private),
        };
        let fd = match fd_select {
            Some(select) => select.font_index(&self.data, glyph_id)? as u32,
            None => 0,
        };
        let dict = fd_array.get(fd)?;
        let mut private_range = None;
        parse_dict(dict, |entry| {
            if entry.op == 18 {
                private_range = entry.pair();
            }
        })?;
        match private_range {
            Some((size, offset)) => {
                Self::parse_private(self.data, offset as usize, size as usize)
            }
            None => Some(Private::default()),
        }
    }

    /// Evaluates the charstring for the specified glyph, feeding path
    /// commands to the sink. Coordinates participate only for CFF2 via
    /// the blend operator.
    pub fn evaluate(
        &self,
        glyph_id: u16,
        coords: &[i16],
        sink: &mut impl CommandSink,
    ) -> Result<(), CsError> {
        let charstring = self
            .charstrings
            .get(glyph_id as u32)
            .ok_or(CsError::Invalid)?;
        let private = self.private_for(glyph_id).ok_or(CsError::Invalid)?;
        let mut eval = Eval {
            font: self,
            coords,
            local_subrs: private.subrs,
            stack: Vec::with_capacity(48),
            x: 0.,
            y: 0.,
            stems: 0,
            width_parsed: self.is_cff2,
            open: false,
            ops: 0,
            vsindex: 0,
            scalars: None,
            done: false,
        };
        eval.execute(charstring, 0, sink)?;
        if eval.open {
            sink.close();
        }
        Ok(())
    }
}

/// Receiver for charstring path commands.
pub trait CommandSink {
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32);
    fn close(&mut self);
}

struct Eval<'a, 'b> {
    font: &'b CffFont<'a>,
    coords: &'b [i16],
    local_subrs: Option<Index<'a>>,
    stack: Vec<f32>,
    x: f32,
    y: f32,
    stems: usize,
    width_parsed: bool,
    open: bool,
    ops: u32,
    vsindex: u16,
    scalars: Option<Vec<f32>>,
    done: bool,
}

fn bias(count: u32) -> i32 {
    if count < 1240 {
        107
    } else if count < 33900 {
        1131
    } else {
        32768
    }
}

impl<'a, 'b> Eval<'a, 'b> {
    fn push(&mut self, value: f32) -> Result<(), CsError> {
        if self.stack.len() >= MAX_STACK {
            return Err(CsError::Limit);
        }
        self.stack.push(value);
        Ok(())
    }

    fn move_to(&mut self, sink: &mut impl CommandSink, dx: f32, dy: f32) {
        if self.open {
            sink.close();
        }
        self.x += dx;
        self.y += dy;
        self.open = true;
        sink.move_to(self.x, self.y);
    }

    fn line_to(&mut self, sink: &mut impl CommandSink, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
        sink.line_to(self.x, self.y);
    }

    fn curve_to(
        &mut self,
        sink: &mut impl CommandSink,
        dx1: f32,
        dy1: f32,
        dx2: f32,
        dy2: f32,
        dx3: f32,
        dy3: f32,
    ) {
        let x1 = self.x + dx1;
        let y1 = self.y + dy1;
        let x2 = x1 + dx2;
        let y2 = y1 + dy2;
        self.x = x2 + dx3;
        self.y = y2 + dy3;
        sink.curve_to(x1, y1, x2, y2, self.x, self.y);
    }

    // Stem operators take an even number of operands; an odd count
    // carries a leading width.
    fn take_width_stem(&mut self) {
        if !self.width_parsed {
            self.width_parsed = true;
            if self.stack.len() % 2 == 1 {
                self.stack.remove(0);
            }
        }
    }

    fn take_width_count(&mut self, nominal: usize) {
        if !self.width_parsed {
            self.width_parsed = true;
            if self.stack.len() > nominal {
                self.stack.remove(0);
            }
        }
    }

    fn add_stems(&mut self) {
        self.stems += self.stack.len() / 2;
        self.stack.clear();
    }

    fn region_scalars(&mut self) -> Result<&[f32], CsError> {
        if self.scalars.is_none() {
            let scalars = var::region_scalars(
                self.font.data.data(),
                self.font.vstore,
                self.vsindex,
                self.coords,
            )
            .ok_or(CsError::Invalid)?;
            self.scalars = Some(scalars.iter().map(|s| s.to_f32()).collect());
        }
        Ok(self.scalars.as_ref().unwrap())
    }

    fn execute(
        &mut self,
        charstring: &[u8],
        depth: u32,
        sink: &mut impl CommandSink,
    ) -> Result<(), CsError> {
        if depth > MAX_SUBR_DEPTH {
            return Err(CsError::Limit);
        }
        let mut s = Stream::new(charstring);
        while s.remaining() > 0 && !self.done {
            self.ops += 1;
            if self.ops > MAX_OPS {
                return Err(CsError::Limit);
            }
            let b0 = s.read_u8().ok_or(CsError::Invalid)?;
            match b0 {
                // Numbers first; operators below.
                28 => self.push(s.read_i16().ok_or(CsError::Invalid)? as f32)?,
                32..=246 => self.push(b0 as f32 - 139.)?,
                247..=250 => {
                    let b1 = s.read_u8().ok_or(CsError::Invalid)? as f32;
                    self.push((b0 as f32 - 247.) * 256. + b1 + 108.)?;
                }
                251..=254 => {
                    let b1 = s.read_u8().ok_or(CsError::Invalid)? as f32;
                    self.push(-(b0 as f32 - 251.) * 256. - b1 - 108.)?;
                }
                255 => {
                    let v = s.read_i32().ok_or(CsError::Invalid)?;
                    self.push(v as f32 / 65536.)?;
                }
                1 | 3 | 18 | 23 => {
                    // hstem/vstem families: consumed, not applied.
                    self.take_width_stem();
                    self.add_stems();
                }
                19 | 20 => {
                    // hintmask/cntrmask with an implicit vstem.
                    self.take_width_stem();
                    self.add_stems();
                    let mask_len = self.stems.div_ceil(8);
                    s.skip(mask_len).ok_or(CsError::Invalid)?;
                }
                21 => {
                    self.take_width_count(2);
                    if self.stack.len() < 2 {
                        return Err(CsError::Invalid);
                    }
                    let dy = self.stack.pop().unwrap();
                    let dx = self.stack.pop().unwrap();
                    self.stack.clear();
                    self.move_to(sink, dx, dy);
                }
                22 => {
                    self.take_width_count(1);
                    let dx = self.stack.pop().ok_or(CsError::Invalid)?;
                    self.stack.clear();
                    self.move_to(sink, dx, 0.);
                }
                4 => {
                    self.take_width_count(1);
                    let dy = self.stack.pop().ok_or(CsError::Invalid)?;
                    self.stack.clear();
                    self.move_to(sink, 0., dy);
                }
                5 => {
                    for pair in self.stack.clone().chunks_exact(2) {
                        self.line_to(sink, pair[0], pair[1]);
                    }
                    self.stack.clear();
                }
                6 | 7 => {
                    // Alternating horizontal/vertical lines.
                    let mut horizontal = b0 == 6;
                    for value in self.stack.clone() {
                        if horizontal {
                            self.line_to(sink, value, 0.);
                        } else {
                            self.line_to(sink, 0., value);
                        }
                        horizontal = !horizontal;
                    }
                    self.stack.clear();
                }
                8 => {
                    for c in self.stack.clone().chunks_exact(6) {
                        self.curve_to(sink, c[0], c[1], c[2], c[3], c[4], c[5]);
                    }
                    self.stack.clear();
                }
                24 => {
                    // rcurveline: curves then one line.
                    let args = self.stack.clone();
                    if args.len() < 2 {
                        return Err(CsError::Invalid);
                    }
                    let (curves, line) = args.split_at(args.len() - 2);
                    for c in curves.chunks_exact(6) {
                        self.curve_to(sink, c[0], c[1], c[2], c[3], c[4], c[5]);
                    }
                    self.line_to(sink, line[0], line[1]);
                    self.stack.clear();
                }
                25 => {
                    // rlinecurve: lines then one curve.
                    let args = self.stack.clone();
                    if args.len() < 6 {
                        return Err(CsError::Invalid);
                    }
                    let (lines, curve) = args.split_at(args.len() - 6);
                    for pair in lines.chunks_exact(2) {
                        self.line_to(sink, pair[0], pair[1]);
                    }
                    self.curve_to(sink, curve[0], curve[1], curve[2], curve[3], curve[4], curve[5]);
                    self.stack.clear();
                }
                26 | 27 => {
                    // vvcurveto/hhcurveto with an optional leading cross
                    // delta.
                    let args = self.stack.clone();
                    let mut iter = args.as_slice();
                    let mut cross = 0.;
                    if iter.len() % 4 == 1 {
                        cross = iter[0];
                        iter = &iter[1..];
                    }
                    for c in iter.chunks_exact(4) {
                        if b0 == 26 {
                            self.curve_to(sink, cross, c[0], c[1], c[2], 0., c[3]);
                        } else {
                            self.curve_to(sink, c[0], cross, c[1], c[2], c[3], 0.);
                        }
                        cross = 0.;
                    }
                    self.stack.clear();
                }
                30 | 31 => {
                    // vhcurveto/hvcurveto alternate the tangent direction;
                    // the final curve may carry a fifth delta.
                    let args = self.stack.clone();
                    let mut horizontal = b0 == 31;
                    let mut i = 0;
                    while args.len() - i >= 4 {
                        let last = args.len() - i == 5;
                        let c = &args[i..];
                        if horizontal {
                            let dlast = if last { c[4] } else { 0. };
                            self.curve_to(sink, c[0], 0., c[1], c[2], dlast, c[3]);
                        } else {
                            let dlast = if last { c[4] } else { 0. };
                            self.curve_to(sink, 0., c[0], c[1], c[2], c[3], dlast);
                        }
                        horizontal = !horizontal;
                        i += 4;
                    }
                    self.stack.clear();
                }
                10 => {
                    let index = self.stack.pop().ok_or(CsError::Invalid)? as i32;
                    let subrs = self.local_subrs.ok_or(CsError::Invalid)?;
                    let index = index + bias(subrs.len());
                    let subr = subrs
                        .get(u32::try_from(index).map_err(|_| CsError::Invalid)?)
                        .ok_or(CsError::Invalid)?;
                    self.execute(subr, depth + 1, sink)?;
                }
                29 => {
                    let index = self.stack.pop().ok_or(CsError::Invalid)? as i32;
                    let subrs = self.font.global_subrs;
                    let index = index + bias(subrs.len());
                    let subr = subrs
                        .get(u32::try_from(index).map_err(|_| CsError::Invalid)?)
                        .ok_or(CsError::Invalid)?;
                    self.execute(subr, depth + 1, sink)?;
                }
                11 => return Ok(()),
                14 => {
                    // endchar. CFF2 charstrings simply run out of bytes.
                    if self.font.is_cff2 {
                        return Err(CsError::Invalid);
                    }
                    self.take_width_count(0);
                    self.done = true;
                    return Ok(());
                }
                15 => {
                    if !self.font.is_cff2 {
                        return Err(CsError::Invalid);
                    }
                    self.vsindex =
                        self.stack.pop().ok_or(CsError::Invalid)? as u16;
                    self.scalars = None;
                }
                16 => {
                    if !self.font.is_cff2 {
                        return Err(CsError::Invalid);
                    }
                    let n = self.stack.pop().ok_or(CsError::Invalid)? as usize;
                    let scalars = self.region_scalars()?.to_vec();
                    let k = scalars.len();
                    let total = n.checked_mul(k + 1).ok_or(CsError::Invalid)?;
                    if self.stack.len() < total {
                        return Err(CsError::Invalid);
                    }
                    let base = self.stack.len() - total;
                    for i in 0..n {
                        let mut value = self.stack[base + i];
                        for (j, scalar) in scalars.iter().enumerate() {
                            value += self.stack[base + n + i * k + j] * scalar;
                        }
                        self.stack[base + i] = value;
                    }
                    self.stack.truncate(base + n);
                }
                12 => {
                    let b1 = s.read_u8().ok_or(CsError::Invalid)?;
                    self.flex(b1, sink)?;
                }
                _ => return Err(CsError::Invalid),
            }
        }
        Ok(())
    }

    fn flex(&mut self, op: u8, sink: &mut impl CommandSink) -> Result<(), CsError> {
        let args = self.stack.clone();
        self.stack.clear();
        let a = |i: usize| args.get(i).copied().unwrap_or(0.);
        match op {
            // flex: two unconstrained curves, final operand is fd.
            35 => {
                if args.len() < 13 {
                    return Err(CsError::Invalid);
                }
                self.curve_to(sink, a(0), a(1), a(2), a(3), a(4), a(5));
                self.curve_to(sink, a(6), a(7), a(8), a(9), a(10), a(11));
            }
            // hflex: both curves share the starting y.
            34 => {
                if args.len() < 7 {
                    return Err(CsError::Invalid);
                }
                let dy2 = a(2);
                self.curve_to(sink, a(0), 0., a(1), dy2, a(3), 0.);
                self.curve_to(sink, a(4), 0., a(5), -dy2, a(6), 0.);
            }
            // hflex1: ends on the starting y.
            36 => {
                if args.len() < 9 {
                    return Err(CsError::Invalid);
                }
                let start_y = self.y;
                self.curve_to(sink, a(0), a(1), a(2), a(3), a(4), 0.);
                let dy6 = start_y - (self.y + a(7));
                self.curve_to(sink, a(5), 0., a(6), a(7), a(8), dy6);
            }
            // flex1: the last delta is inferred on the smaller axis.
            37 => {
                if args.len() < 11 {
                    return Err(CsError::Invalid);
                }
                let start_x = self.x;
                let start_y = self.y;
                let dx = a(0) + a(2) + a(4) + a(6) + a(8);
                let dy = a(1) + a(3) + a(5) + a(7) + a(9);
                self.curve_to(sink, a(0), a(1), a(2), a(3), a(4), a(5));
                if dx.abs() > dy.abs() {
                    let x1 = self.x + a(6);
                    let y1 = self.y + a(7);
                    let x2 = x1 + a(8);
                    let y2 = y1 + a(9);
                    self.x = x2 + a(10);
                    self.y = start_y;
                    sink.curve_to(x1, y1, x2, y2, self.x, self.y);
                } else {
                    let x1 = self.x + a(6);
                    let y1 = self.y + a(7);
                    let x2 = x1 + a(8);
                    let y2 = y1 + a(9);
                    self.x = start_x;
                    self.y = y2 + a(10);
                    sink.curve_to(x1, y1, x2, y2, self.x, self.y);
                }
            }
            _ => return Err(CsError::Invalid),
        }
        Ok(())
    }
}

/// Vertical origin table for CFF flavored fonts.
#[derive(Copy, Clone)]
pub struct Vorg<'a>(Bytes<'a>);

impl<'a> Vorg<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self(Bytes::new(data))
    }

    /// Returns the y coordinate of the vertical origin for the glyph.
    pub fn vertical_origin(&self, glyph_id: u16) -> i16 {
        let b = &self.0;
        let default = b.read_or_default::<i16>(4);
        let count = b.read_or_default::<u16>(6) as usize;
        let base = 8;
        let mut lo = 0;
        let mut hi = count;
        while lo < hi {
            let i = (lo + hi) / 2;
            let rec = base + i * 4;
            match b.read_u16(rec) {
                Some(gid) if glyph_id > gid => lo = i + 1,
                Some(gid) if glyph_id < gid => hi = i,
                Some(_) => return b.read_i16(rec + 2).unwrap_or(default),
                None => break,
            }
        }
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        commands: Vec<String>,
    }

    impl CommandSink for RecordingSink {
        fn move_to(&mut self, x: f32, y: f32) {
            self.commands.push(format!("M {x} {y}"));
        }
        fn line_to(&mut self, x: f32, y: f32) {
            self.commands.push(format!("L {x} {y}"));
        }
        fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
            self.commands
                .push(format!("C {x1} {y1} {x2} {y2} {x} {y}"));
        }
        fn close(&mut self) {
            self.commands.push("Z".into());
        }
    }

    fn index_bytes(cff2: bool, items: &[&[u8]]) -> Vec<u8> {
        let mut d = Vec::new();
        if cff2 {
            d.extend_from_slice(&(items.len() as u32).to_be_bytes());
        } else {
            d.extend_from_slice(&(items.len() as u16).to_be_bytes());
        }
        if items.is_empty() {
            return d;
        }
        d.push(1); // offSize
        let mut offset = 1u8;
        d.push(offset);
        for item in items {
            offset += item.len() as u8;
            d.push(offset);
        }
        for item in items {
            d.extend_from_slice(item);
        }
        d
    }

    // Assembles a minimal CFF table: header, name index, top dict index,
    // string index, global subrs, then charstrings.
    fn cff_table(charstrings: &[&[u8]], gsubrs: &[&[u8]]) -> Vec<u8> {
        let name = index_bytes(false, &[b"A"]);
        let strings = index_bytes(false, &[]);
        let gsubr_index = index_bytes(false, gsubrs);
        // Top dict: charstrings offset as a 5-byte number so the dict
        // length is independent of the value.
        let mut top = Vec::new();
        top.push(29);
        top.extend_from_slice(&0i32.to_be_bytes());
        top.push(17);
        let top_index = index_bytes(false, &[&top]);
        let header = [1u8, 0, 4, 1];
        let cs_offset =
            header.len() + name.len() + top_index.len() + strings.len() + gsubr_index.len();
        // Patch the charstrings offset into the top dict copy.
        let mut top = Vec::new();
        top.push(29);
        top.extend_from_slice(&(cs_offset as i32).to_be_bytes());
        top.push(17);
        let top_index = index_bytes(false, &[&top]);
        let mut d = Vec::new();
        d.extend_from_slice(&header);
        d.extend_from_slice(&name);
        d.extend_from_slice(&top_index);
        d.extend_from_slice(&strings);
        d.extend_from_slice(&gsubr_index);
        d.extend_from_slice(&index_bytes(false, charstrings));
        d
    }

    fn num(v: i32) -> u8 {
        (v + 139) as u8
    }

    #[test]
    fn index_roundtrip() {
        let d = index_bytes(false, &[b"ab", b"", b"xyz"]);
        let index = Index::parse(Bytes::new(&d), 0, false).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(0), Some(b"ab".as_ref()));
        assert_eq!(index.get(1), Some(b"".as_ref()));
        assert_eq!(index.get(2), Some(b"xyz".as_ref()));
        assert_eq!(index.get(3), None);
        assert_eq!(index.end(), d.len());
        let empty = index_bytes(false, &[]);
        let index = Index::parse(Bytes::new(&empty), 0, false).unwrap();
        assert_eq!(index.len(), 0);
        assert_eq!(index.end(), 2);
    }

    #[test]
    fn square_charstring() {
        // 100 100 rmoveto 100 hlineto 100 vlineto -100 hlineto endchar
        let cs = [
            num(100),
            num(100),
            21,
            num(100),
            6,
            num(100),
            7,
            num(-100),
            6,
            14,
        ];
        let table = cff_table(&[&cs], &[]);
        let font = CffFont::parse_cff(&table).unwrap();
        assert_eq!(font.glyph_count(), 1);
        let mut sink = RecordingSink::default();
        font.evaluate(0, &[], &mut sink).unwrap();
        assert_eq!(
            sink.commands,
            ["M 100 100", "L 200 100", "L 200 200", "L 100 200", "Z"]
        );
    }

    #[test]
    fn curves_and_width() {
        // A leading width operand before rmoveto must be discarded.
        let cs = [
            num(42), // width
            num(0),
            num(0),
            21,
            num(10),
            num(0),
            num(10),
            num(10),
            num(0),
            num(10),
            8, // rrcurveto
            14,
        ];
        let table = cff_table(&[&cs], &[]);
        let font = CffFont::parse_cff(&table).unwrap();
        let mut sink = RecordingSink::default();
        font.evaluate(0, &[], &mut sink).unwrap();
        assert_eq!(sink.commands[0], "M 0 0");
        assert_eq!(sink.commands[1], "C 10 0 20 10 20 20");
    }

    #[test]
    fn runaway_subrs_hit_the_limit() {
        // Global subr zero calls itself forever. Bias for a single-entry
        // index is 107, so push -107 first.
        let subr = [num(-107), 29];
        let cs = [num(-107), 29, 14];
        let table = cff_table(&[&cs], &[&subr]);
        let font = CffFont::parse_cff(&table).unwrap();
        let mut sink = RecordingSink::default();
        assert_eq!(font.evaluate(0, &[], &mut sink), Err(CsError::Limit));
    }

    #[test]
    fn vorg_lookup() {
        let mut d = Vec::new();
        d.extend_from_slice(&1u16.to_be_bytes());
        d.extend_from_slice(&0u16.to_be_bytes());
        d.extend_from_slice(&880i16.to_be_bytes()); // default
        d.extend_from_slice(&1u16.to_be_bytes()); // one record
        d.extend_from_slice(&7u16.to_be_bytes());
        d.extend_from_slice(&900i16.to_be_bytes());
        let vorg = Vorg::new(&d);
        assert_eq!(vorg.vertical_origin(7), 900);
        assert_eq!(vorg.vertical_origin(8), 880);
    }
}
