//! Diacritics normalization for accent-insensitive matching.
//!
//! The same functions run over indexed labels and over user queries, so
//! `"dýchací"` and `"dychaci"` produce identical tokens.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Strips diacritics and lowercases.
///
/// Decomposes to NFD, drops combining marks and lowercases the rest:
/// `é -> e`, `č -> c`, `ř -> r`, `ů -> u`.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Normalizes text for matching: trims surrounding whitespace, then strips
/// diacritics and lowercases.
///
/// # Example
///
/// ```
/// use mkn_loader::normalize;
///
/// assert_eq!(normalize("  Café "), "cafe");
/// assert_eq!(normalize("cafe"), "cafe");
/// ```
pub fn normalize(text: &str) -> String {
    strip_diacritics(text.trim())
}

/// Normalizes text and splits it on whitespace, keeping tokens of at
/// least `min_len` characters.
pub fn tokenize(text: &str, min_len: usize) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|word| word.chars().count() >= min_len)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize("café"), "cafe");
        assert_eq!(normalize("café"), normalize("cafe"));
    }

    #[test]
    fn test_normalize_czech_alphabet() {
        assert_eq!(normalize("ČĎĚŇŘŠŤŽÚ"), "cdenrstzu");
        assert_eq!(normalize("áéíóúůý"), "aeiouuy");
    }

    #[test]
    fn test_normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Dýchací SOUSTAVA \n"), "dychaci soustava");
    }

    #[test]
    fn test_normalize_precomposed_and_decomposed_agree() {
        // "ř" precomposed vs "r" + combining caron
        assert_eq!(normalize("\u{159}"), normalize("r\u{30C}"));
    }

    #[test]
    fn test_tokenize_drops_short_words() {
        let tokens = tokenize("Akutní infekce horních cest dýchacích NS a v", 2);
        assert_eq!(
            tokens,
            vec!["akutni", "infekce", "hornich", "cest", "dychacich", "ns"]
        );
    }

    #[test]
    fn test_tokenize_symmetry_with_and_without_diacritics() {
        assert_eq!(tokenize("dýchací", 2), tokenize("dychaci", 2));
        assert_eq!(tokenize("Nemoci dýchací soustavy", 2), tokenize("nemoci DYCHACI soustavy", 2));
    }

    #[test]
    fn test_tokenize_counts_characters_not_bytes() {
        // "ž" is two bytes in UTF-8 but normalizes to a single char
        assert!(tokenize("ž", 2).is_empty());
        assert_eq!(tokenize("že", 2), vec!["ze"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("", 2).is_empty());
        assert!(tokenize("   ", 2).is_empty());
    }
}
