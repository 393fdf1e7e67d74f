//! Naming table records and string decoding.

use super::{raw_tag, Bytes, RawTag};

pub const NAME: RawTag = raw_tag(b"name");

/// Naming table wrapper.
#[derive(Copy, Clone)]
pub struct NameTable<'a> {
    data: Bytes<'a>,
    count: usize,
    storage: usize,
}

impl<'a> NameTable<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let data = Bytes::new(data);
        Self {
            data,
            count: data.read_or_default::<u16>(2) as usize,
            storage: data.read_or_default::<u16>(4) as usize,
        }
    }

    /// Returns the number of name records.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the record at the specified index.
    pub fn record(&self, index: usize) -> Option<NameRecord<'a>> {
        if index >= self.count {
            return None;
        }
        let offset = 6 + index * 12;
        self.data.ensure_range(offset, 12)?;
        Some(NameRecord {
            data: self.data,
            storage: self.storage,
            offset,
        })
    }
}

/// Record in the naming table, keyed by platform, encoding, language and
/// name identifiers.
#[derive(Copy, Clone)]
pub struct NameRecord<'a> {
    data: Bytes<'a>,
    storage: usize,
    offset: usize,
}

impl<'a> NameRecord<'a> {
    pub fn platform_id(&self) -> u16 {
        self.data.read_or_default(self.offset)
    }

    pub fn encoding_id(&self) -> u16 {
        self.data.read_or_default(self.offset + 2)
    }

    pub fn language_id(&self) -> u16 {
        self.data.read_or_default(self.offset + 4)
    }

    pub fn name_id(&self) -> u16 {
        self.data.read::<u16>(self.offset + 6).unwrap_or(0xFFFF)
    }

    /// Returns the encoding classification for the record.
    pub fn encoding(&self) -> Encoding {
        Encoding::from_raw_parts(self.platform_id(), self.encoding_id())
    }

    /// Returns a lowercase BCP 47-ish language code for the record, or an
    /// empty string when the platform does not scope by language.
    pub fn language(&self) -> &'static str {
        language_code(self.platform_id(), self.language_id())
    }

    /// Returns the raw encoded bytes of the string.
    pub fn bytes(&self) -> Option<&'a [u8]> {
        let len = self.data.read::<u16>(self.offset + 8)? as usize;
        let offset = self.data.read::<u16>(self.offset + 10)? as usize + self.storage;
        self.data.read_bytes(offset, len)
    }

    /// Returns an iterator over the decoded characters of the string.
    /// Undecodable encodings produce an empty sequence.
    pub fn chars(&self) -> Chars<'a> {
        let encoding = self.encoding();
        let bytes = if encoding.is_decodable() {
            self.bytes().unwrap_or(&[])
        } else {
            &[]
        };
        Chars {
            bytes,
            encoding,
            cur: 0,
        }
    }
}

/// Iterator over the characters of a name record.
#[derive(Copy, Clone)]
pub struct Chars<'a> {
    bytes: &'a [u8],
    encoding: Encoding,
    cur: usize,
}

impl<'a> Iterator for Chars<'a> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let rep = core::char::REPLACEMENT_CHARACTER;
        match self.encoding {
            Encoding::Unicode => {
                let b = Bytes::new(self.bytes);
                let mut c = b.read_u16(self.cur)? as u32;
                self.cur += 2;
                if (0xD800..0xDC00).contains(&c) {
                    // Surrogate pair; an unpaired high surrogate decodes
                    // to the replacement character.
                    match b.read_u16(self.cur) {
                        Some(lo) if (0xDC00..0xE000).contains(&(lo as u32)) => {
                            self.cur += 2;
                            c = ((c & 0x3FF) << 10) + (lo as u32 & 0x3FF) + 0x10000;
                        }
                        _ => return Some(rep),
                    }
                }
                Some(char::from_u32(c).unwrap_or(rep))
            }
            Encoding::MacRoman => {
                let c = *self.bytes.get(self.cur)? as u32;
                self.cur += 1;
                if c > 127 {
                    Some(char::from_u32(MAC_ROMAN[c as usize - 128] as u32).unwrap_or(rep))
                } else {
                    Some(char::from_u32(c).unwrap_or(rep))
                }
            }
            Encoding::Other { .. } => None,
        }
    }
}

/// Encoding of a name record. Only the encodings we decode are
/// enumerated; everything else is dropped.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Encoding {
    /// UTF-16BE: the Unicode platform and the Windows Unicode encodings.
    Unicode,
    /// Macintosh platform, Roman encoding.
    MacRoman,
    Other {
        platform_id: u16,
        encoding_id: u16,
    },
}

impl Encoding {
    pub fn from_raw_parts(platform_id: u16, encoding_id: u16) -> Self {
        match (platform_id, encoding_id) {
            (0, _) | (3, 0) | (3, 1) | (3, 10) => Self::Unicode,
            (1, 0) => Self::MacRoman,
            _ => Self::Other {
                platform_id,
                encoding_id,
            },
        }
    }

    /// Returns true if this encoding can be turned into a string.
    pub fn is_decodable(&self) -> bool {
        !matches!(self, Self::Other { .. })
    }
}

#[rustfmt::skip]
const MAC_ROMAN: [u16; 128] = [
    196, 197, 199, 201, 209, 214, 220, 225, 224, 226, 228, 227, 229, 231, 233,
    232, 234, 235, 237, 236, 238, 239, 241, 243, 242, 244, 246, 245, 250, 249,
    251, 252, 8224, 176, 162, 163, 167, 8226, 182, 223, 174, 169, 8482, 180,
    168, 8800, 198, 216, 8734, 177, 8804, 8805, 165, 181, 8706, 8721, 8719,
    960, 8747, 170, 186, 937, 230, 248, 191, 161, 172, 8730, 402, 8776, 8710,
    171, 187, 8230, 160, 192, 195, 213, 338, 339, 8211, 8212, 8220, 8221, 8216,
    8217, 247, 9674, 255, 376, 8260, 8364, 8249, 8250, 64257, 64258, 8225, 183,
    8218, 8222, 8240, 194, 202, 193, 203, 200, 205, 206, 207, 204, 211, 212,
    63743, 210, 218, 219, 217, 305, 710, 732, 175, 728, 729, 730, 184, 733,
    731, 711,
];

// Macintosh language codes.
#[rustfmt::skip]
const MAC_LANGUAGES: [(u16, &str); 34] = [
    (0, "en"), (1, "fr"), (2, "de"), (3, "it"), (4, "nl"), (5, "sv"),
    (6, "es"), (7, "da"), (8, "pt"), (9, "no"), (10, "he"), (11, "ja"),
    (12, "ar"), (13, "fi"), (14, "el"), (15, "is"), (17, "tr"), (18, "hr"),
    (19, "zh-tw"), (21, "hi"), (22, "th"), (23, "ko"), (24, "lt"), (25, "pl"),
    (26, "hu"), (29, "lv"), (32, "ru"), (33, "zh-cn"), (37, "ro"), (38, "cs"),
    (39, "sk"), (45, "sq"), (80, "vi"), (81, "id"),
];

// Windows primary language identifiers (low ten bits of the LCID).
#[rustfmt::skip]
const WIN_LANGUAGES: [(u16, &str); 36] = [
    (0x01, "ar"), (0x02, "bg"), (0x03, "ca"), (0x04, "zh"), (0x05, "cs"),
    (0x06, "da"), (0x07, "de"), (0x08, "el"), (0x09, "en"), (0x0A, "es"),
    (0x0B, "fi"), (0x0C, "fr"), (0x0D, "he"), (0x0E, "hu"), (0x0F, "is"),
    (0x10, "it"), (0x11, "ja"), (0x12, "ko"), (0x13, "nl"), (0x14, "no"),
    (0x15, "pl"), (0x16, "pt"), (0x18, "ro"), (0x19, "ru"), (0x1A, "hr"),
    (0x1B, "sk"), (0x1D, "sv"), (0x1E, "th"), (0x1F, "tr"), (0x21, "id"),
    (0x22, "uk"), (0x25, "et"), (0x26, "lv"), (0x27, "lt"), (0x2A, "vi"),
    (0x39, "hi"),
];

fn language_code(platform_id: u16, language_id: u16) -> &'static str {
    let (table, key): (&[(u16, &str)], u16) = match platform_id {
        0 => return "",
        1 => (&MAC_LANGUAGES, language_id),
        3 => (&WIN_LANGUAGES, language_id & 0x3FF),
        _ => return "zz",
    };
    match table.binary_search_by(|entry| entry.0.cmp(&key)) {
        Ok(index) => table[index].1,
        _ => "zz",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn name_table(records: &[(u16, u16, u16, u16, &[u8])]) -> Vec<u8> {
        let mut data = vec![0u8; 6];
        data[2..4].copy_from_slice(&(records.len() as u16).to_be_bytes());
        let storage = 6 + records.len() * 12;
        data[4..6].copy_from_slice(&(storage as u16).to_be_bytes());
        let mut strings = Vec::new();
        for (platform, encoding, language, name, value) in records {
            data.extend_from_slice(&platform.to_be_bytes());
            data.extend_from_slice(&encoding.to_be_bytes());
            data.extend_from_slice(&language.to_be_bytes());
            data.extend_from_slice(&name.to_be_bytes());
            data.extend_from_slice(&(value.len() as u16).to_be_bytes());
            data.extend_from_slice(&(strings.len() as u16).to_be_bytes());
            strings.extend_from_slice(value);
        }
        data.extend_from_slice(&strings);
        data
    }

    fn utf16be(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
    }

    #[test]
    fn windows_unicode_decoding() {
        let value = utf16be("Fonte Carioca 🎨");
        let data = name_table(&[(3, 1, 0x0409, 1, &value)]);
        let table = NameTable::new(&data);
        let record = table.record(0).unwrap();
        assert_eq!(record.name_id(), 1);
        assert_eq!(record.language(), "en");
        assert_eq!(record.chars().collect::<String>(), "Fonte Carioca 🎨");
    }

    #[test]
    fn mac_roman_decoding() {
        // 0x8E is e-acute in MacRoman.
        let data = name_table(&[(1, 0, 0, 4, &[b'C', b'a', b'f', 0x8E])]);
        let record = NameTable::new(&data).record(0).unwrap();
        assert_eq!(record.chars().collect::<String>(), "Caf\u{e9}");
    }

    #[test]
    fn undecodable_encoding_is_empty() {
        let data = name_table(&[(3, 4, 0x0409, 1, &[1, 2, 3, 4])]);
        let record = NameTable::new(&data).record(0).unwrap();
        assert!(!record.encoding().is_decodable());
        assert_eq!(record.chars().count(), 0);
    }

    #[test]
    fn unpaired_surrogate_is_replaced() {
        let data = name_table(&[(0, 3, 0, 1, &[0xD8, 0x00, 0x00, 0x41])]);
        let record = NameTable::new(&data).record(0).unwrap();
        let chars: Vec<char> = record.chars().collect();
        assert_eq!(chars, ['\u{FFFD}', 'A']);
    }
}
