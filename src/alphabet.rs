//! The reference alphabet used as the de-obfuscation key.
//!
//! The site's obfuscation fonts draw their glyphs in a fixed order: glyph 1 is
//! always the first character below, glyph 2 the second, and so on. Only the
//! codepoints pointing at those glyphs change from font to font. The sequence
//! was recovered once by comparing rendered glyphs and is treated as a
//! versioned constant.

use lazy_static::lazy_static;

/// Glyph-order key: digits, Latin letters, then high-frequency ideographs.
pub const REFERENCE_ALPHABET: &str = concat!(
    "0123456789",
    "abcdefghijklmnopqrstuvwxyz",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "的一是了我不人在他有这个上们来到时",
    "大地为子中你说生国年着就那和要她出也得里",
    "后自以会家可下而过天去能对小多然于心学么",
    "之都好看起发当没成只如事把还用第样道想作",
    "种开美总从无情己面最女但现前些所同日手又",
    "行意动方期它头经长儿回位分爱老因很给名法",
    "间斯知世什两次使身者被高已亲其进此话常与",
    "活正感见明问力理尔点文几定本公特做外孩相",
    "西果走将月十实向声车全信重三机工物气每并",
    "别真打太新比才便夫再书部水像眼等体却加电",
    "主界门利海受听表德少克代员许稜先口由死安",
    "写性马光白或住难望教命花结乐色更拉东神记",
    "处让母父应直字场平报友关放至张认接告入笑",
    "内英军候民岁往何度山觉路带万男边风解叫任",
    "金快原吃妈变通师立象数四失满战远格士音轻",
    "目条呢",
);

lazy_static! {
    static ref STANDARD: ReferenceAlphabet = ReferenceAlphabet::new(REFERENCE_ALPHABET);
}

/// An immutable, indexable view of a reference alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAlphabet {
    chars: Vec<char>,
}

impl ReferenceAlphabet {
    /// Build an alphabet from an ordered character sequence.
    pub fn new(sequence: &str) -> Self {
        Self {
            chars: sequence.chars().collect(),
        }
    }

    /// The site alphabet, shared by every font resolution in the process.
    pub fn standard() -> &'static ReferenceAlphabet {
        &STANDARD
    }

    /// Character at `index`, or `None` past the end.
    #[inline]
    pub fn get(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the alphabet has no characters.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// All characters in key order.
    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_standard_alphabet_length() {
        assert_eq!(ReferenceAlphabet::standard().len(), 362);
    }

    #[test]
    fn test_standard_alphabet_has_no_duplicates() {
        let alphabet = ReferenceAlphabet::standard();
        let unique: HashSet<char> = alphabet.as_slice().iter().copied().collect();
        assert_eq!(unique.len(), alphabet.len());
    }

    #[test]
    fn test_standard_alphabet_prefix_and_suffix() {
        let alphabet = ReferenceAlphabet::standard();
        assert_eq!(alphabet.get(0), Some('0'));
        assert_eq!(alphabet.get(10), Some('a'));
        assert_eq!(alphabet.get(36), Some('A'));
        assert_eq!(alphabet.get(62), Some('的'));
        assert_eq!(alphabet.get(361), Some('呢'));
        assert_eq!(alphabet.get(362), None);
    }

    #[test]
    fn test_standard_is_shared() {
        let a = ReferenceAlphabet::standard() as *const ReferenceAlphabet;
        let b = ReferenceAlphabet::standard() as *const ReferenceAlphabet;
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_alphabet() {
        let alphabet = ReferenceAlphabet::new("XY");
        assert_eq!(alphabet.len(), 2);
        assert_eq!(alphabet.get(1), Some('Y'));
        assert!(!alphabet.is_empty());
        assert!(ReferenceAlphabet::new("").is_empty());
    }
}
