//! Byte-level alphabet shared by the vocabulary and the merge loop.
//!
//! GPT-2 vocabularies never store raw bytes. Every byte is first projected onto
//! a printable Unicode character so that control bytes, spaces and partial
//! UTF-8 sequences can live inside ordinary JSON strings:
//!
//! - Bytes 33-126 (`!` to `~`) map to themselves.
//! - Bytes 161-172 (`¡` to `¬`) and 174-255 (`®` to `ÿ`) map to themselves.
//! - The remaining 68 bytes (0-32, 127-160, 173) map to U+0100 onwards, in
//!   ascending byte order.
//!
//! The table must match the one used to train the vocabulary; a space becomes
//! `Ġ` (U+0120) and a newline `Ċ` (U+010A).

use std::{collections::HashMap, sync::LazyLock};

use crate::error::DecodeError;

/// First code point handed out to bytes that do not map to themselves.
const SHIFTED_BASE: char = '\u{100}';

static SHARED: LazyLock<ByteUnicodeMap> = LazyLock::new(ByteUnicodeMap::build);

/// Bijection between the 256 byte values and their printable stand-ins.
#[derive(Debug, Clone)]
pub struct ByteUnicodeMap {
    /// Indexed by byte value.
    forward: [char; 256],
    inverse: HashMap<char, u8>,
}

impl ByteUnicodeMap {
    /// Returns the process-wide table, building it on first use.
    pub fn shared() -> &'static ByteUnicodeMap {
        &SHARED
    }

    fn build() -> Self {
        let (kept, shifted): (Vec<u8>, Vec<u8>) =
            (0..=u8::MAX).partition(|&b| keeps_own_code_point(b));

        let mut forward = ['\0'; 256];
        for b in kept {
            forward[usize::from(b)] = char::from(b);
        }
        for (b, ch) in shifted.into_iter().zip(SHIFTED_BASE..) {
            forward[usize::from(b)] = ch;
        }

        let inverse = forward
            .iter()
            .enumerate()
            .filter_map(|(b, &ch)| u8::try_from(b).ok().map(|b| (ch, b)))
            .collect();

        Self { forward, inverse }
    }

    /// Maps one byte to its byte-level character.
    #[inline]
    pub fn char_of(&self, byte: u8) -> char {
        self.forward[usize::from(byte)]
    }

    /// Maps a byte-level character back to the byte it stands for.
    #[inline]
    pub fn byte_of(&self, ch: char) -> Option<u8> {
        self.inverse.get(&ch).copied()
    }

    /// Projects raw bytes onto the byte-level alphabet, one character per byte.
    pub fn encode(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|&b| self.char_of(b)).collect()
    }

    /// Recovers the raw bytes behind a byte-level string.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::NotByteLevel`] on the first character that is
    /// not part of the alphabet.
    pub fn decode(&self, text: &str) -> Result<Vec<u8>, DecodeError> {
        text.chars()
            .map(|ch| self.byte_of(ch).ok_or(DecodeError::NotByteLevel(ch)))
            .collect()
    }
}

/// Bytes that are printable in Latin-1 keep their own code point.
fn keeps_own_code_point(byte: u8) -> bool {
    matches!(byte, b'!'..=b'~' | 0xA1..=0xAC | 0xAE..=0xFF)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_printable_bytes_map_to_themselves() {
        let map = ByteUnicodeMap::shared();
        assert_eq!(map.char_of(b'!'), '!');
        assert_eq!(map.char_of(b'~'), '~');
        assert_eq!(map.char_of(0xA1), '¡');
        assert_eq!(map.char_of(0xAC), '¬');
        assert_eq!(map.char_of(0xAE), '®');
        assert_eq!(map.char_of(0xFF), 'ÿ');
    }

    #[test]
    fn test_shifted_bytes_follow_byte_order() {
        let map = ByteUnicodeMap::shared();
        assert_eq!(map.char_of(0x00), '\u{100}');
        assert_eq!(map.char_of(b'\n'), 'Ċ');
        assert_eq!(map.char_of(b' '), 'Ġ');
        // DEL follows the 33 low bytes
        assert_eq!(map.char_of(0x7F), '\u{121}');
        // soft hyphen is the last of the 68 shifted bytes
        assert_eq!(map.char_of(0xAD), '\u{143}');
    }

    #[test]
    fn test_table_is_a_bijection() {
        let map = ByteUnicodeMap::shared();
        let chars: HashSet<char> = (0..=u8::MAX).map(|b| map.char_of(b)).collect();
        assert_eq!(chars.len(), 256);
        for b in 0..=u8::MAX {
            assert_eq!(map.byte_of(map.char_of(b)), Some(b));
        }
    }

    #[test]
    fn test_encode_multibyte_utf8() {
        let map = ByteUnicodeMap::shared();
        // 'é' is [0xC3, 0xA9]; both bytes keep their own code point
        assert_eq!(map.encode("é".as_bytes()), "Ã©");
        assert_eq!(map.encode(b" hi"), "Ġhi");
    }

    #[test]
    fn test_decode_inverts_encode() {
        let map = ByteUnicodeMap::shared();
        let raw = "tab\there, 猫\n".as_bytes();
        let decoded = map.decode(&map.encode(raw)).expect("alphabet should decode");
        assert_eq!(decoded, raw);
    }

    #[test]
    fn test_decode_rejects_foreign_char() {
        let map = ByteUnicodeMap::shared();
        match map.decode("a\u{2603}") {
            Err(DecodeError::NotByteLevel(ch)) => assert_eq!(ch, '\u{2603}'),
            other => panic!("expected NotByteLevel, got {other:?}"),
        }
    }
}
