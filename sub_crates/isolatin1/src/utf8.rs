//! Helpers for picking apart utf8 input that may be malformed or cut off
//! at a buffer boundary.

/// The outcome of decoding a single character from the front of a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Decoded {
    /// A character and its length in bytes.
    Char(char, usize),
    /// The buffer ends partway through a character that more bytes could
    /// complete.
    Incomplete,
    /// The buffer starts with malformed utf8.
    Invalid,
}

/// What follows the valid utf8 at the front of a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Tail {
    /// Malformed utf8 of the given length in bytes.
    Invalid(usize),
    /// A truncated character running to the end of the buffer.
    Incomplete,
}

/// Decodes the first character of `bytes`.
pub(crate) fn decode_char(bytes: &[u8]) -> Decoded {
    // No character is longer than 4 bytes.
    let head = &bytes[..bytes.len().min(4)];
    let (text, tail) = split_valid(head);
    match text.chars().next() {
        Some(c) => Decoded::Char(c, c.len_utf8()),
        None => match tail {
            Some(Tail::Invalid(_)) => Decoded::Invalid,
            _ => Decoded::Incomplete,
        },
    }
}

/// Splits off the longest valid utf8 prefix of `bytes`, along with a
/// description of what stopped it (if anything).
pub(crate) fn split_valid(bytes: &[u8]) -> (&str, Option<Tail>) {
    match core::str::from_utf8(bytes) {
        Ok(text) => (text, None),
        Err(e) => {
            let text = unsafe { core::str::from_utf8_unchecked(&bytes[..e.valid_up_to()]) };
            let tail = match e.error_len() {
                Some(len) => Tail::Invalid(len),
                None => Tail::Incomplete,
            };
            (text, Some(tail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_01() {
        assert_eq!(decode_char(b"abc"), Decoded::Char('a', 1));
        assert_eq!(decode_char(&[0xC3, 0xA9, 0x41]), Decoded::Char('é', 2));
        assert_eq!(decode_char(&[0xE2, 0x82, 0xAC]), Decoded::Char('€', 3));
        assert_eq!(decode_char(&[0xF0, 0x9F, 0x98, 0x80, 0x41]), Decoded::Char('😀', 4));
    }

    #[test]
    fn decode_02() {
        // Truncated sequences.
        assert_eq!(decode_char(&[0xC3]), Decoded::Incomplete);
        assert_eq!(decode_char(&[0xE2, 0x82]), Decoded::Incomplete);
        assert_eq!(decode_char(&[0xF0, 0x9F, 0x98]), Decoded::Incomplete);
        assert_eq!(decode_char(&[]), Decoded::Incomplete);
    }

    #[test]
    fn decode_03() {
        // Continuation byte with no leading byte.
        assert_eq!(decode_char(&[0x80, 0x41]), Decoded::Invalid);
        // Too few continuation bytes, but followed by more data.
        assert_eq!(decode_char(&[0xE2, 0x82, 0x41]), Decoded::Invalid);
        // Overlong encoding.
        assert_eq!(decode_char(&[0xC0, 0x80]), Decoded::Invalid);
        // Surrogate.
        assert_eq!(decode_char(&[0xED, 0xA0, 0x80]), Decoded::Invalid);
        // Out of unicode range.
        assert_eq!(decode_char(&[0xF4, 0x90, 0x80, 0x80]), Decoded::Invalid);
        // Invalid bit pattern.
        assert_eq!(decode_char(&[0xF8, 0x82, 0x93]), Decoded::Invalid);
    }

    #[test]
    fn split_01() {
        assert_eq!(split_valid(b"hello"), ("hello", None));
        assert_eq!(split_valid(&[0x61, 0xC3]), ("a", Some(Tail::Incomplete)));
        assert_eq!(
            split_valid(&[0x61, 0x80, 0x62]),
            ("a", Some(Tail::Invalid(1)))
        );
        assert_eq!(
            split_valid(&[0x61, 0xE2, 0x82, 0x62]),
            ("a", Some(Tail::Invalid(2)))
        );
    }
}
