//! UAX #29 word boundary segmentation.

use super::tables::{word_break, WordBreak};

fn is_ah_letter(p: WordBreak) -> bool {
    matches!(p, WordBreak::ALetter | WordBreak::HebrewLetter)
}

fn is_mid_letterish(p: WordBreak) -> bool {
    matches!(
        p,
        WordBreak::MidLetter | WordBreak::MidNumLet | WordBreak::SingleQuote
    )
}

fn is_mid_numish(p: WordBreak) -> bool {
    matches!(
        p,
        WordBreak::MidNum | WordBreak::MidNumLet | WordBreak::SingleQuote
    )
}

fn is_ignorable(p: WordBreak) -> bool {
    matches!(p, WordBreak::Extend | WordBreak::Format | WordBreak::Zwj)
}

/// Returns the byte indices at which a new word starts, including zero
/// for non-empty input, plus the break property of the codepoint at
/// each boundary.
pub fn boundaries(text: &str) -> Vec<(usize, WordBreak)> {
    // Rules look both backwards and forwards across ignorable
    // characters, so segment over a materialized property list.
    let chars: Vec<(usize, u32, WordBreak)> = text
        .char_indices()
        .map(|(offset, ch)| (offset, ch as u32, word_break(ch as u32)))
        .collect();
    let mut result = Vec::new();
    let mut ri_parity = 0u32;
    for i in 0..chars.len() {
        let (offset, _, prop) = chars[i];
        if word_boundary_at(&chars, i, &mut ri_parity) {
            result.push((offset, prop));
        }
    }
    result
}

// Decides whether a boundary precedes position `i`.
fn word_boundary_at(chars: &[(usize, u32, WordBreak)], i: usize, ri_parity: &mut u32) -> bool {
    use WordBreak::*;
    let prop = chars[i].2;
    // WB1: break at the start of text.
    if i == 0 {
        if prop == RegionalIndicator {
            *ri_parity = 1;
        }
        return true;
    }
    let raw_prev = chars[i - 1].2;
    // WB3/WB3a/WB3b: newlines break everywhere except inside CRLF.
    if raw_prev == Cr && prop == Lf {
        return false;
    }
    if matches!(raw_prev, Cr | Lf | Newline) || matches!(prop, Cr | Lf | Newline) {
        *ri_parity = (prop == RegionalIndicator) as u32;
        return true;
    }
    // WB3c: ZWJ glues an upcoming pictograph.
    if raw_prev == Zwj && super::tables::is_extended_pictographic(chars[i].1) {
        return false;
    }
    // WB3d: keep runs of spaces together.
    if raw_prev == WSegSpace && prop == WSegSpace {
        return false;
    }
    // WB4: ignore Extend/Format/ZWJ after a non-breaking character.
    if is_ignorable(prop) {
        return false;
    }
    // Effective previous property skips ignorables (WB4).
    let mut back = i;
    let prev = loop {
        if back == 0 {
            // Only ignorables behind us; boundary follows WB1 logic.
            if prop == RegionalIndicator {
                *ri_parity = 1;
            }
            return true;
        }
        back -= 1;
        let p = chars[back].2;
        if !is_ignorable(p) {
            break p;
        }
    };
    // Effective next property after `i`, also skipping ignorables.
    let next = chars[i + 1..]
        .iter()
        .map(|c| c.2)
        .find(|p| !is_ignorable(*p));
    let boundary = if is_ah_letter(prev) && is_ah_letter(prop) {
        false // WB5
    } else if is_ah_letter(prev) && is_mid_letterish(prop) && next.map(is_ah_letter) == Some(true)
    {
        false // WB6
    } else if is_mid_letterish(prev) && is_ah_letter(prop) {
        // WB7 needs a letter before the mid character.
        let mut j = back;
        let before = loop {
            if j == 0 {
                break None;
            }
            j -= 1;
            let p = chars[j].2;
            if !is_ignorable(p) {
                break Some(p);
            }
        };
        !matches!(before, Some(p) if is_ah_letter(p))
    } else if prev == HebrewLetter && prop == SingleQuote {
        false // WB7a
    } else if prev == HebrewLetter && prop == DoubleQuote && next == Some(HebrewLetter) {
        false // WB7b
    } else if prev == DoubleQuote && prop == HebrewLetter {
        let mut j = back;
        let before = loop {
            if j == 0 {
                break None;
            }
            j -= 1;
            let p = chars[j].2;
            if !is_ignorable(p) {
                break Some(p);
            }
        };
        !matches!(before, Some(HebrewLetter)) // WB7c
    } else if prev == Numeric && prop == Numeric {
        false // WB8
    } else if is_ah_letter(prev) && prop == Numeric {
        false // WB9
    } else if prev == Numeric && is_ah_letter(prop) {
        false // WB10
    } else if is_mid_numish(prev) && prop == Numeric {
        // WB11: numeric on both sides of the mid character.
        let mut j = back;
        let before = loop {
            if j == 0 {
                break None;
            }
            j -= 1;
            let p = chars[j].2;
            if !is_ignorable(p) {
                break Some(p);
            }
        };
        !matches!(before, Some(Numeric))
    } else if prev == Numeric && is_mid_numish(prop) && next == Some(Numeric) {
        false // WB12
    } else if prev == Katakana && prop == Katakana {
        false // WB13
    } else if matches!(prev, ALetter | HebrewLetter | Numeric | Katakana | ExtendNumLet)
        && prop == ExtendNumLet
    {
        false // WB13a
    } else if prev == ExtendNumLet && matches!(prop, ALetter | HebrewLetter | Numeric | Katakana)
    {
        false // WB13b
    } else if prev == RegionalIndicator && prop == RegionalIndicator {
        // WB15/WB16.
        *ri_parity % 2 == 0
    } else {
        true // WB999
    };
    if prop == RegionalIndicator {
        *ri_parity = if boundary { 1 } else { *ri_parity + 1 };
    } else {
        *ri_parity = 0;
    }
    boundary
}

/// Splits a string at word boundaries, dropping segments that contain
/// only whitespace.
pub fn split_words(text: &str) -> Vec<&str> {
    let starts = boundaries(text);
    let mut words = Vec::with_capacity(starts.len());
    for (i, (start, _)) in starts.iter().enumerate() {
        let end = starts
            .get(i + 1)
            .map(|(offset, _)| *offset)
            .unwrap_or(text.len());
        let segment = &text[*start..end];
        if segment.chars().any(|c| !c.is_whitespace()) {
            words.push(segment);
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_words() {
        assert_eq!(split_words("The quick brown fox"), ["The", "quick", "brown", "fox"]);
        assert_eq!(split_words("  leading  spaces"), ["leading", "spaces"]);
        assert_eq!(split_words(""), Vec::<&str>::new());
    }

    #[test]
    fn punctuation_splits() {
        assert_eq!(split_words("Hello, world!"), ["Hello", ",", "world", "!"]);
    }

    #[test]
    fn mid_letter_joins() {
        assert_eq!(split_words("can't"), ["can't"]);
        assert_eq!(split_words("a:b"), ["a:b"]);
        // A trailing mid character does not join.
        assert_eq!(split_words("can'"), ["can", "'"]);
    }

    #[test]
    fn numbers() {
        assert_eq!(split_words("3.14 meters"), ["3.14", "meters"]);
        assert_eq!(split_words("1,024"), ["1,024"]);
        assert_eq!(split_words("A4 paper"), ["A4", "paper"]);
        assert_eq!(split_words("snake_case_42"), ["snake_case_42"]);
    }

    #[test]
    fn katakana_runs() {
        assert_eq!(split_words("カタカナ test"), ["カタカナ", "test"]);
    }

    #[test]
    fn newlines_always_break() {
        assert_eq!(split_words("one\r\ntwo"), ["one", "two"]);
    }

    #[test]
    fn ignorables_are_transparent() {
        // A zero width joiner inside a word does not split it.
        assert_eq!(split_words("ab\u{200D}cd"), ["ab\u{200D}cd"]);
        // Soft hyphen is Format.
        assert_eq!(split_words("hy\u{AD}phen"), ["hy\u{AD}phen"]);
    }

    #[test]
    fn boundary_offsets() {
        let b = boundaries("ab cd");
        let offsets: Vec<usize> = b.iter().map(|(o, _)| *o).collect();
        assert_eq!(offsets, [0, 2, 3]);
        assert_eq!(b[0].1, WordBreak::ALetter);
        assert_eq!(b[1].1, WordBreak::WSegSpace);
    }
}
