// File: src/core/phonetic.rs
//! Phonetic normalization of drug names.
//!
//! OCR misreads on Hangul are local to a single stroke group, so a misread
//! syllable usually differs from the intended one in only its leading
//! consonant, vowel, or trailing consonant. Names are therefore compared as
//! flat sequences of compatibility jamo rather than as syllables.

use serde::{Deserialize, Serialize};
use std::fmt;

const SYLLABLE_BASE: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;
const VOWEL_COUNT: u32 = 21;
const TAIL_COUNT: u32 = 28;

const LEADS: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ', 'ㅋ',
    'ㅌ', 'ㅍ', 'ㅎ',
];
const VOWELS: [char; 21] = [
    'ㅏ', 'ㅐ', 'ㅑ', 'ㅒ', 'ㅓ', 'ㅔ', 'ㅕ', 'ㅖ', 'ㅗ', 'ㅘ', 'ㅙ', 'ㅚ', 'ㅛ', 'ㅜ', 'ㅝ', 'ㅞ',
    'ㅟ', 'ㅠ', 'ㅡ', 'ㅢ', 'ㅣ',
];
// Index 0 of the trailing slot means "no trailing consonant".
const TAILS: [char; 27] = [
    'ㄱ', 'ㄲ', 'ㄳ', 'ㄴ', 'ㄵ', 'ㄶ', 'ㄷ', 'ㄹ', 'ㄺ', 'ㄻ', 'ㄼ', 'ㄽ', 'ㄾ', 'ㄿ', 'ㅀ', 'ㅁ',
    'ㅂ', 'ㅄ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅊ', 'ㅋ', 'ㅌ', 'ㅍ', 'ㅎ',
];

/// Native-script unit spellings and the Latin abbreviation they collapse to.
/// Longer spellings come first so that no variant is shadowed by a shorter one.
const UNIT_VARIANTS: &[(&str, &str)] = &[
    ("마이크로그램", "mcg"),
    ("밀리그램", "mg"),
    ("밀리그람", "mg"),
    ("미리그램", "mg"),
    ("밀리리터", "ml"),
    ("미리리터", "ml"),
];

/// A name reduced to the symbol sequence the fuzzy index works over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedForm {
    symbols: Vec<char>,
}

impl NormalizedForm {
    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl fmt::Display for NormalizedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.symbols {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl From<Vec<char>> for NormalizedForm {
    fn from(symbols: Vec<char>) -> Self {
        Self { symbols }
    }
}

/// Normalizes a raw name: whitespace removed, ASCII lower-cased, unit
/// spellings unified, Hangul syllables split into jamo.
///
/// Pure and total; `normalize(&normalize(x).to_string()) == normalize(x)`.
pub fn normalize(raw: &str) -> NormalizedForm {
    let canonical = canonicalize_units(raw);
    let mut symbols = Vec::with_capacity(canonical.chars().count() * 3);
    for c in canonical.chars() {
        push_phonetic_symbols(c, &mut symbols);
    }
    NormalizedForm { symbols }
}

/// Strips whitespace, lower-cases ASCII and rewrites native unit spellings
/// to their Latin abbreviation. Hangul is left composed.
pub fn canonicalize_units(raw: &str) -> String {
    let mut text: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    for (variant, unit) in UNIT_VARIANTS {
        if text.contains(variant) {
            text = text.replace(variant, unit);
        }
    }
    text
}

/// Splits a precomposed syllable into (lead, vowel, optional tail).
pub fn decompose_syllable(c: char) -> Option<(char, char, Option<char>)> {
    let code = c as u32;
    if !(SYLLABLE_BASE..=SYLLABLE_LAST).contains(&code) {
        return None;
    }
    let index = code - SYLLABLE_BASE;
    let lead = index / (VOWEL_COUNT * TAIL_COUNT);
    let vowel = (index % (VOWEL_COUNT * TAIL_COUNT)) / TAIL_COUNT;
    let tail = index % TAIL_COUNT;
    let tail = if tail == 0 {
        None
    } else {
        Some(TAILS[tail as usize - 1])
    };
    Some((LEADS[lead as usize], VOWELS[vowel as usize], tail))
}

fn push_phonetic_symbols(c: char, out: &mut Vec<char>) {
    if let Some((lead, vowel, tail)) = decompose_syllable(c) {
        out.push(lead);
        out.push(vowel);
        if let Some(tail) = tail {
            out.push(tail);
        }
        return;
    }
    out.push(conjoining_to_compatibility(c).unwrap_or(c));
}

/// Maps decomposed (conjoining) jamo, as found in NFD text, onto the
/// compatibility jamo used for syllable decomposition.
fn conjoining_to_compatibility(c: char) -> Option<char> {
    let code = c as u32;
    match code {
        0x1100..=0x1112 => Some(LEADS[(code - 0x1100) as usize]),
        0x1161..=0x1175 => Some(VOWELS[(code - 0x1161) as usize]),
        0x11A8..=0x11C2 => Some(TAILS[(code - 0x11A8) as usize]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_syllables_into_jamo() {
        assert_eq!(normalize("정").to_string(), "ㅈㅓㅇ");
        assert_eq!(normalize("타이레놀").to_string(), "ㅌㅏㅇㅣㄹㅔㄴㅗㄹ");
        assert_eq!(decompose_syllable('가'), Some(('ㄱ', 'ㅏ', None)));
        assert_eq!(decompose_syllable('힣'), Some(('ㅎ', 'ㅣ', Some('ㅎ'))));
        assert_eq!(decompose_syllable('a'), None);
    }

    #[test]
    fn unifies_unit_spellings() {
        assert_eq!(normalize("500밀리그램"), normalize("500mg"));
        assert_eq!(normalize("500밀리그람"), normalize("500 MG"));
        assert_eq!(canonicalize_units("시럽 5 밀리리터"), "시럽5ml");
    }

    #[test]
    fn strips_whitespace_and_lowercases_ascii() {
        assert_eq!(normalize(" Tylenol  500MG ").to_string(), "tylenol500mg");
    }

    #[test]
    fn one_stroke_misread_is_one_symbol() {
        let intended = normalize("타이레놀정");
        let misread = normalize("타이레놀전");
        assert_eq!(intended.len(), misread.len());
        let differing = intended
            .symbols()
            .iter()
            .zip(misread.symbols())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(differing, 1);
    }

    #[test]
    fn conjoining_jamo_match_precomposed() {
        // "가" in NFD form
        assert_eq!(normalize("\u{1100}\u{1161}"), normalize("가"));
        assert_eq!(normalize("\u{1100}\u{1161}\u{11A8}"), normalize("각"));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \t").is_empty());
    }

    #[test]
    fn normalization_is_idempotent() {
        let corpus = [
            "",
            "타이레놀정500밀리그램(아세트아미노펜)",
            "Aspirin 100mg",
            "DrugX(extended release) 50mg",
            "게보린 정",
            "시럽 5 밀리리터",
            "\u{1100}\u{1161}\u{11A8}",
            "ㅌㅏ 이레놀",
            "MIXED 한글 Text 2.5MG",
        ];
        for raw in corpus {
            let once = normalize(raw);
            let twice = normalize(&once.to_string());
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }
}
