// font_introspector was retired from https://github.com/dfrg/swash
// which is licensed under MIT license

/*!
Localized names and other metadata.
*/

use core::fmt::Write;

use crate::internal::name::{Chars, Encoding, NameRecord, NameTable, NAME};
use crate::internal::RawFont;
use crate::font::FontRef;

/// Identifier for well-known localized strings in a font.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StringId {
    Copyright,
    Family,
    SubFamily,
    UniqueId,
    Full,
    Version,
    PostScript,
    Trademark,
    Manufacturer,
    Designer,
    Description,
    VendorUrl,
    DesignerUrl,
    License,
    LicenseUrl,
    TypographicFamily,
    TypographicSubFamily,
    CompatibleFull,
    SampleText,
    PostScriptCid,
    WwsFamily,
    WwsSubFamily,
    LightBackgroundPalette,
    DarkBackgroundPalette,
    VariationsPostScriptNamePrefix,
    Other(u16),
}

impl StringId {
    pub fn from_raw(value: u16) -> Self {
        use StringId::*;
        match value {
            0 => Copyright,
            1 => Family,
            2 => SubFamily,
            3 => UniqueId,
            4 => Full,
            5 => Version,
            6 => PostScript,
            7 => Trademark,
            8 => Manufacturer,
            9 => Designer,
            10 => Description,
            11 => VendorUrl,
            12 => DesignerUrl,
            13 => License,
            14 => LicenseUrl,
            16 => TypographicFamily,
            17 => TypographicSubFamily,
            18 => CompatibleFull,
            19 => SampleText,
            20 => PostScriptCid,
            21 => WwsFamily,
            22 => WwsSubFamily,
            23 => LightBackgroundPalette,
            24 => DarkBackgroundPalette,
            25 => VariationsPostScriptNamePrefix,
            _ => Other(value),
        }
    }

    pub fn to_raw(self) -> u16 {
        use StringId::*;
        match self {
            Other(id) => id,
            Copyright => 0,
            Family => 1,
            SubFamily => 2,
            UniqueId => 3,
            Full => 4,
            Version => 5,
            PostScript => 6,
            Trademark => 7,
            Manufacturer => 8,
            Designer => 9,
            Description => 10,
            VendorUrl => 11,
            DesignerUrl => 12,
            License => 13,
            LicenseUrl => 14,
            TypographicFamily => 16,
            TypographicSubFamily => 17,
            CompatibleFull => 18,
            SampleText => 19,
            PostScriptCid => 20,
            WwsFamily => 21,
            WwsSubFamily => 22,
            LightBackgroundPalette => 23,
            DarkBackgroundPalette => 24,
            VariationsPostScriptNamePrefix => 25,
        }
    }
}

/// Iterator over a collection of localized strings.
#[derive(Copy, Clone)]
pub struct LocalizedStrings<'a> {
    table: NameTable<'a>,
    len: usize,
    pos: usize,
}

impl<'a> LocalizedStrings<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        let table = NameTable::new(data);
        Self {
            table,
            len: table.len(),
            pos: 0,
        }
    }

    pub(crate) fn from_font(font: &FontRef<'a>) -> Self {
        Self::new(font.table_data(NAME).unwrap_or(&[]))
    }

    /// Searches for a string with the specified identifier, and if
    /// specified, language.
    ///
    /// Preference order: a Windows or Unicode platform UTF-16 record wins;
    /// any other decodable record is the fallback; undecodable records are
    /// skipped entirely.
    ///
    /// ## Iteration behavior
    /// This function searches the entire string collection without regard
    /// for the current state of the iterator.
    pub fn find_by_id(
        &self,
        id: StringId,
        language: Option<&str>,
    ) -> Option<LocalizedString<'a>> {
        let raw_id = id.to_raw();
        let mut fallback = None;
        for i in 0..self.len {
            let record = match self.table.record(i) {
                Some(record) if record.name_id() == raw_id => record,
                _ => continue,
            };
            let matches_language = match language {
                Some(lang) => record.language().starts_with(lang),
                None => true,
            };
            if !matches_language {
                continue;
            }
            match record.encoding() {
                Encoding::Unicode => return Some(LocalizedString { record }),
                encoding if encoding.is_decodable() && fallback.is_none() => {
                    fallback = Some(LocalizedString { record });
                }
                _ => {}
            }
        }
        fallback
    }

    /// Returns the family name, preferring the typographic family
    /// (name identifier 16) over the basic family.
    pub fn family_name(&self) -> Option<LocalizedString<'a>> {
        self.find_by_id(StringId::TypographicFamily, None)
            .or_else(|| self.find_by_id(StringId::Family, None))
    }

    fn get(&self, index: usize) -> Option<LocalizedString<'a>> {
        Some(LocalizedString {
            record: self.table.record(index)?,
        })
    }
}

impl_iter!(LocalizedStrings, LocalizedString);

/// Represents a single localized string in a font.
///
/// A string with a particular identifier can appear multiple times in a
/// font with various languages and encodings.
#[derive(Copy, Clone)]
pub struct LocalizedString<'a> {
    record: NameRecord<'a>,
}

impl<'a> LocalizedString<'a> {
    /// Returns the string identifier.
    pub fn id(&self) -> StringId {
        StringId::from_raw(self.record.name_id())
    }

    /// Returns the language of the string.
    pub fn language(&self) -> &'static str {
        self.record.language()
    }

    /// Returns true if the encoding for the string is unicode.
    pub fn is_unicode(&self) -> bool {
        self.record.encoding() == Encoding::Unicode
    }

    /// Returns true if the string can be decoded.
    pub fn is_decodable(&self) -> bool {
        self.record.encoding().is_decodable()
    }

    /// Returns an iterator over the sequence of characters representing
    /// the decoded string if the encoding is known. Will generate an empty
    /// sequence otherwise.
    pub fn chars(&self) -> Chars<'a> {
        self.record.chars()
    }
}

impl<'a> core::fmt::Display for LocalizedString<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for c in self.chars() {
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for LocalizedString<'a> {
    type IntoIter = Chars<'a>;
    type Item = char;

    fn into_iter(self) -> Self::IntoIter {
        self.chars()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16be(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
    }

    fn name_table(records: &[(u16, u16, u16, u16, Vec<u8>)]) -> Vec<u8> {
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

    #[test]
    fn unicode_preferred_over_mac() {
        let data = name_table(&[
            (1, 0, 0, 1, b"Mac Family".to_vec()),
            (3, 1, 0x0409, 1, utf16be("Win Family")),
        ]);
        let strings = LocalizedStrings::new(&data);
        let found = strings.find_by_id(StringId::Family, None).unwrap();
        assert!(found.is_unicode());
        assert_eq!(found.to_string(), "Win Family");
    }

    #[test]
    fn typographic_family_preferred() {
        let data = name_table(&[
            (3, 1, 0x0409, 1, utf16be("Basic")),
            (3, 1, 0x0409, 16, utf16be("Typographic")),
        ]);
        let strings = LocalizedStrings::new(&data);
        assert_eq!(strings.family_name().unwrap().to_string(), "Typographic");
    }

    #[test]
    fn family_fallback_when_no_typographic() {
        let data = name_table(&[(3, 1, 0x0409, 1, utf16be("Basic"))]);
        let strings = LocalizedStrings::new(&data);
        assert_eq!(strings.family_name().unwrap().to_string(), "Basic");
    }

    #[test]
    fn language_filter() {
        let data = name_table(&[
            (3, 1, 0x0409, 2, utf16be("Regular")),
            (3, 1, 0x0416, 2, utf16be("Regular (pt)")),
        ]);
        let strings = LocalizedStrings::new(&data);
        let found = strings.find_by_id(StringId::SubFamily, Some("pt")).unwrap();
        assert_eq!(found.to_string(), "Regular (pt)");
        assert!(strings.find_by_id(StringId::SubFamily, Some("ja")).is_none());
    }
}
