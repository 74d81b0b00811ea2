//! Encoding functions for restricted latin1, which conveniently maps 1-to-1
//! to the first 256 unicode scalar values.  Encoding a character is a
//! matter of narrowing its scalar value to a byte, after making sure it's
//! below 256 and lands in one of the printable ranges.
//!
//! Ascii passes through untouched, control characters included.  Everything
//! else must satisfy `is_valid()`.

use crate::utf8::{decode_char, Decoded};
use crate::{
    is_valid, InvalidCharacterError, InvalidPolicy, Transform, TransformError, TransformResult,
};

/// Maps a char to its byte in the target encoding.
///
/// Returns `None` for characters with no representation.
#[inline(always)]
pub(crate) fn encode_char(c: char) -> Option<u8> {
    let code = c as u32;
    if code < 0x80 || (code <= 0xFF && is_valid(code as u8)) {
        Some(code as u8)
    } else {
        None
    }
}

/// Encodes utf8 to restricted latin1.
///
/// This is stateless: everything a caller needs to resume is in the
/// returned counts.  It progresses one character at a time, checking for
/// room in the destination before decoding each character, so a
/// `ShortDestination` stop never consumes a character it didn't write.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Latin1Encoder {
    policy: InvalidPolicy,
}

impl Latin1Encoder {
    pub fn new(policy: InvalidPolicy) -> Latin1Encoder {
        Latin1Encoder { policy }
    }

    pub fn policy(&self) -> InvalidPolicy {
        self.policy
    }

    /// Encodes as much of `src` into `dst` as will fit.
    ///
    /// Equivalent to `Transform::transform()`, but doesn't need a mutable
    /// encoder.
    pub fn transform(&self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult {
        if dst.is_empty() {
            return TransformResult::new(0, 0, Err(TransformError::ShortDestination));
        }

        let mut src_i = 0;
        let mut dst_i = 0;
        while src_i < src.len() {
            if dst_i >= dst.len() {
                return TransformResult::new(src_i, dst_i, Err(TransformError::ShortDestination));
            }

            // Ascii fast path.
            let byte = src[src_i];
            if byte < 0x80 {
                dst[dst_i] = byte;
                src_i += 1;
                dst_i += 1;
                continue;
            }

            let c = match decode_char(&src[src_i..]) {
                Decoded::Char(c, len) => {
                    src_i += len;
                    c
                }
                Decoded::Incomplete if !at_eof => {
                    return TransformResult::new(src_i, dst_i, Err(TransformError::ShortSource));
                }
                Decoded::Incomplete | Decoded::Invalid => {
                    return TransformResult::new(src_i, dst_i, Err(TransformError::InvalidUtf8));
                }
            };

            match encode_char(c) {
                Some(byte) => {
                    dst[dst_i] = byte;
                    dst_i += 1;
                }
                None => match self.policy {
                    InvalidPolicy::Skip => {}
                    InvalidPolicy::Error => {
                        return TransformResult::new(
                            src_i,
                            dst_i,
                            Err(TransformError::Unrepresentable(InvalidCharacterError {
                                character: c,
                            })),
                        );
                    }
                },
            }
        }

        TransformResult::new(src_i, dst_i, Ok(()))
    }
}

impl Transform for Latin1Encoder {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult {
        Latin1Encoder::transform(self, dst, src, at_eof)
    }

    fn reset(&mut self) {}
}

/// Decoding from restricted latin1 back to utf8 isn't supported.  Every
/// call fails with `TransformError::NotImplemented` and produces nothing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Latin1Decoder;

impl Transform for Latin1Decoder {
    fn transform(&mut self, _dst: &mut [u8], _src: &[u8], _at_eof: bool) -> TransformResult {
        TransformResult::new(0, 0, Err(TransformError::NotImplemented))
    }

    fn reset(&mut self) {}
}
