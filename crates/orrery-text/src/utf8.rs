//! Byte-at-a-time UTF-8 decoding for the overlay stream.
//!
//! Accepts the legacy 5 and 6 byte forms. Invalid lead bytes are dropped
//! without touching the decoder state; a bad continuation byte abandons the
//! sequence in progress and is itself dropped. Sequences that decode to a
//! value outside the Unicode scalar range are dropped as well.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecodeState {
    #[default]
    Start,
    Multibyte {
        value: u32,
        shift: u32,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Utf8StreamDecoder {
    state: DecodeState,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte, returning a character once a sequence completes.
    pub fn push(&mut self, byte: u8) -> Option<char> {
        let c = byte as u32;
        match self.state {
            DecodeState::Start => {
                if c < 0x80 {
                    return Some(byte as char);
                }

                let count = if c & 0xe0 == 0xc0 {
                    2
                } else if c & 0xf0 == 0xe0 {
                    3
                } else if c & 0xf8 == 0xf0 {
                    4
                } else if c & 0xfc == 0xf8 {
                    5
                } else if c & 0xfe == 0xfc {
                    6
                } else {
                    tracing::trace!("Skipping invalid UTF-8 lead byte {:#x}", byte);
                    return None;
                };

                let mask = (1u32 << (7 - count)) - 1;
                let shift = (count - 1) * 6;
                self.state = DecodeState::Multibyte {
                    value: (c & mask) << shift,
                    shift,
                };
                None
            }
            DecodeState::Multibyte { value, shift } => {
                if c & 0xc0 != 0x80 {
                    tracing::trace!("Bad UTF-8 continuation byte {:#x}, resetting", byte);
                    self.state = DecodeState::Start;
                    return None;
                }

                let shift = shift - 6;
                let value = value | ((c & 0x3f) << shift);
                if shift > 0 {
                    self.state = DecodeState::Multibyte { value, shift };
                    return None;
                }

                self.state = DecodeState::Start;
                let decoded = char::from_u32(value);
                if decoded.is_none() {
                    tracing::trace!("Dropping non-scalar code point {:#x}", value);
                }
                decoded
            }
        }
    }

    /// Decode a run of bytes, carrying partial sequences across calls.
    pub fn decode<'a>(&'a mut self, bytes: &'a [u8]) -> impl Iterator<Item = char> + 'a {
        bytes.iter().filter_map(move |&b| self.push(b))
    }

    /// True while a multibyte sequence is incomplete.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, DecodeState::Multibyte { .. })
    }

    pub fn reset(&mut self) {
        self.state = DecodeState::Start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> String {
        Utf8StreamDecoder::new().decode(bytes).collect()
    }

    #[test]
    fn test_ascii_and_multibyte() {
        assert_eq!(decode("Hello".as_bytes()), "Hello");
        assert_eq!(decode("αβγ €1 😀".as_bytes()), "αβγ €1 😀");
    }

    #[test]
    fn test_split_across_calls() {
        let bytes = "é".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.push(bytes[0]), None);
        assert!(decoder.is_pending());
        assert_eq!(decoder.push(bytes[1]), Some('é'));
        assert!(!decoder.is_pending());
    }

    #[test]
    fn test_invalid_lead_skipped() {
        assert_eq!(decode(&[b'a', 0x80, 0xff, b'b']), "ab");
    }

    #[test]
    fn test_bad_continuation_resets() {
        // The byte that breaks the sequence is consumed with it.
        assert_eq!(decode(&[0xce, b'x', b'y']), "y");
        assert_eq!(decode(&[0xe2, 0x82, 0xce, 0xb1]), "");
    }

    #[test]
    fn test_legacy_long_forms() {
        // Five byte encoding of U+0041, over-long but accepted.
        assert_eq!(decode(&[0xf8, 0x80, 0x80, 0x81, 0x81]), "A");
        // Six byte form of a value past U+10FFFF is dropped.
        assert_eq!(decode(&[0xfd, 0xbf, 0xbf, 0xbf, 0xbf, 0xbf]), "");
    }
}
