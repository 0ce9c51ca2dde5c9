//! Character vocabulary, encoding and padding.
//!
//! Domains are fed to the model one character per position. The alphabet is
//! fixed at compile time and matches the one the model was trained against:
//!
//! ```text
//! $abcdefghijklmnopqrstuvwxyz0123456789-_.
//! ```
//!
//! Index 0 (`$`) doubles as the padding value. Characters outside the
//! alphabet also encode to 0, so an unknown character and an empty slot look
//! the same to the model. This mirrors the training data and must not change.
//!
//! # Example
//!
//! ```rust
//! use dgascan_core::vocab::{encode, pad, MAX_DOMAIN_LEN};
//!
//! let encoded = encode("Ab.c");
//! assert_eq!(encoded, vec![1, 2, 39, 3]);
//!
//! let padded = pad(&encoded, MAX_DOMAIN_LEN);
//! assert_eq!(padded.len(), 45);
//! assert!(padded[4..].iter().all(|&id| id == 0));
//! ```

/// The model alphabet, in index order.
pub const ALPHABET: &str = "$abcdefghijklmnopqrstuvwxyz0123456789-_.";

/// Number of symbols in the alphabet.
pub const VOCAB_SIZE: usize = 40;

/// Fixed sequence length the model consumes.
pub const MAX_DOMAIN_LEN: usize = 45;

/// Token id of the sentinel/padding symbol.
pub const PAD_ID: u32 = 0;

/// Process-wide vocabulary instance.
pub static VOCAB: Vocabulary = Vocabulary::new();

/// Immutable character-to-index table over [`ALPHABET`].
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    /// ASCII lookup: byte value -> token id (0 when absent).
    table: [u8; 128],
}

impl Vocabulary {
    /// Build the lookup table. Evaluated at compile time for [`VOCAB`].
    pub const fn new() -> Self {
        let bytes = ALPHABET.as_bytes();
        let mut table = [0u8; 128];
        let mut i = 0;
        while i < bytes.len() {
            table[bytes[i] as usize] = i as u8;
            i += 1;
        }
        Self { table }
    }

    /// Token id for a single (already lower-cased) character.
    #[inline]
    pub fn id_of(&self, c: char) -> u32 {
        if c.is_ascii() {
            self.table[c as usize] as u32
        } else {
            PAD_ID
        }
    }

    /// Character for a token id, if the id is in range.
    pub fn symbol(&self, id: u32) -> Option<char> {
        ALPHABET.as_bytes().get(id as usize).map(|&b| b as char)
    }

    /// Number of symbols.
    pub const fn len(&self) -> usize {
        VOCAB_SIZE
    }

    /// Always false; the alphabet is fixed.
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a domain into one token id per lower-cased character.
///
/// Total: every input yields a sequence, unknown characters become 0.
pub fn encode(domain: &str) -> Vec<u32> {
    domain
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| VOCAB.id_of(c))
        .collect()
}

/// Fix a sequence to exactly `target_len` entries.
///
/// Longer sequences keep their first `target_len` ids; shorter ones are
/// right-padded with [`PAD_ID`].
pub fn pad(sequence: &[u32], target_len: usize) -> Vec<u32> {
    let mut padded = Vec::with_capacity(target_len);
    padded.extend(sequence.iter().take(target_len).copied());
    padded.resize(target_len, PAD_ID);
    padded
}

/// Encode and pad to [`MAX_DOMAIN_LEN`] in one step.
pub fn encode_padded(domain: &str) -> Vec<u32> {
    pad(&encode(domain), MAX_DOMAIN_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_has_forty_unique_symbols() {
        assert_eq!(ALPHABET.len(), VOCAB_SIZE);
        assert_eq!(VOCAB.len(), VOCAB_SIZE);

        for (i, c) in ALPHABET.chars().enumerate() {
            assert_eq!(VOCAB.id_of(c), i as u32, "symbol {c:?}");
            assert_eq!(VOCAB.symbol(i as u32), Some(c));
        }
        assert_eq!(VOCAB.symbol(40), None);
    }

    #[test]
    fn encode_known_symbols() {
        assert_eq!(encode("a"), vec![1]);
        assert_eq!(encode("z"), vec![26]);
        assert_eq!(encode("0"), vec![27]);
        assert_eq!(encode("9"), vec![36]);
        assert_eq!(encode("-_."), vec![37, 38, 39]);
    }

    #[test]
    fn encode_google() {
        let encoded = encode("google.com");
        assert_eq!(encoded.len(), 10);
        assert_eq!(encoded, vec![7, 15, 15, 7, 12, 5, 39, 3, 15, 13]);
        assert_eq!(encode_padded("google.com").len(), MAX_DOMAIN_LEN);
    }

    #[test]
    fn encode_lowercases() {
        assert_eq!(encode("GOOGLE.COM"), encode("google.com"));
        assert_eq!(encode("XK29FJZ81.NET"), encode("xk29fjz81.net"));
    }

    #[test]
    fn unknown_characters_map_to_sentinel() {
        assert_eq!(encode("a b"), vec![1, 0, 2]);
        assert_eq!(encode("$"), vec![0]);
        assert_eq!(encode("ü"), vec![0]);
        assert_eq!(encode("例え.jp"), vec![0, 0, 39, 10, 16]);
        assert_eq!(encode("a/b:c"), vec![1, 0, 2, 0, 3]);
    }

    #[test]
    fn encode_empty() {
        assert!(encode("").is_empty());
        assert_eq!(encode_padded(""), vec![0; MAX_DOMAIN_LEN]);
    }

    #[test]
    fn pad_short_sequence() {
        let padded = pad(&[5, 6, 7], 6);
        assert_eq!(padded, vec![5, 6, 7, 0, 0, 0]);
    }

    #[test]
    fn pad_exact_length_is_identity() {
        let seq: Vec<u32> = (1..=45).collect();
        assert_eq!(pad(&seq, 45), seq);
    }

    #[test]
    fn pad_truncates_from_the_right() {
        let seq: Vec<u32> = (0..60).collect();
        let padded = pad(&seq, 45);
        assert_eq!(padded.len(), 45);
        assert_eq!(padded, (0..45).collect::<Vec<u32>>());
    }

    #[test]
    fn sixty_char_domain_only_first_45_matter() {
        let head = "a".repeat(45);
        let d1 = format!("{head}{}", "b".repeat(15));
        let d2 = format!("{head}{}", "9".repeat(15));
        assert_eq!(d1.len(), 60);

        assert_eq!(encode_padded(&d1), encode_padded(&d2));
        assert_eq!(encode_padded(&d1), vec![1; 45]);
    }
}
