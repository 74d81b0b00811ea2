#![no_std]

//! A library for incrementally encoding utf8 text to a restricted variant of
//! ISO/IEC 8859-1 (or "latin1"): the printable ascii range (32-126) plus the
//! upper printable latin1 range (160-255).  The C1 control range (127-159)
//! has no representation.
//!
//! All transforms work on caller-supplied buffers, one chunk at a time.  The
//! core encoder never holds on to unread input: any bytes it reports as not
//! consumed must be presented again at the start of the next call.
//!
//! Decoding back to utf8 is not supported.

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod latin1;
mod normalize;
mod utf8;

use alloc::vec::Vec;
use core::fmt;

use unicode_normalization::UnicodeNormalization;

pub use latin1::{Latin1Decoder, Latin1Encoder};
pub use normalize::{Encoder, Normalizer};

/// Returns whether `byte` is a printable character in the target encoding,
/// i.e. in the range 32-126 or 160-255.
///
/// This only classifies bytes.  Scalar values above 255 are never
/// representable, so they must be ruled out before narrowing to a byte.
#[inline(always)]
pub fn is_valid(byte: u8) -> bool {
    (byte >= 32 && byte <= 126) || byte >= 160
}

/// What to do with characters that have no representation in the target
/// encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InvalidPolicy {
    /// Stop and report the character.
    Error,
    /// Drop the character and carry on.
    Skip,
}

impl Default for InvalidPolicy {
    fn default() -> InvalidPolicy {
        InvalidPolicy::Error
    }
}

/// The restricted latin1 encoding, configured with an `InvalidPolicy`.
///
/// This carries no per-stream state, so a single instance can hand out
/// encoders for any number of independent streams.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Latin1 {
    policy: InvalidPolicy,
}

impl Latin1 {
    pub fn new(policy: InvalidPolicy) -> Latin1 {
        Latin1 { policy }
    }

    pub fn policy(&self) -> InvalidPolicy {
        self.policy
    }

    /// The bare encoder, without normalization in front of it.
    pub fn encoder(&self) -> Latin1Encoder {
        Latin1Encoder::new(self.policy)
    }

    /// A new encoder that composes its input to NFC before encoding it.
    pub fn new_encoder(&self) -> Encoder {
        Encoder::new(self.policy)
    }

    /// A new decoder.  It fails on every call.
    pub fn new_decoder(&self) -> Latin1Decoder {
        Latin1Decoder
    }

    /// Normalizes and encodes a complete piece of text in one go.
    ///
    /// The error range refers to byte offsets in the NFC form of `text`,
    /// which is the text the encoder actually sees.  With
    /// `InvalidPolicy::Skip` this never fails.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, EncodeError> {
        let mut output = Vec::with_capacity(text.len());
        let mut offset = 0;
        for c in text.nfc() {
            match latin1::encode_char(c) {
                Some(byte) => output.push(byte),
                None if self.policy == InvalidPolicy::Skip => {}
                None => {
                    return Err(EncodeError {
                        character: c,
                        error_range: (offset, offset + c.len_utf8()),
                        output_bytes_written: output.len(),
                    });
                }
            }
            offset += c.len_utf8();
        }
        Ok(output)
    }
}

/// A chunked transform from one byte stream to another.
///
/// Each call transforms as much of `src` into `dst` as it can and reports
/// how far it got.  Bytes of `src` past `read` were not consumed, and must
/// be presented again at the start of `src` on the next call.  `at_eof`
/// tells the transform that no more input follows `src`.
pub trait Transform {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult;

    /// Drops any state, readying the transform for a new stream.
    fn reset(&mut self);
}

/// The result of a single `Transform::transform()` call.
///
/// `read` never exceeds the length of the source buffer given to the call,
/// and `written` never exceeds the length of the destination buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub read: usize,
    pub written: usize,
    pub outcome: Result<(), TransformError>,
}

impl TransformResult {
    pub fn new(read: usize, written: usize, outcome: Result<(), TransformError>) -> TransformResult {
        TransformResult { read, written, outcome }
    }
}

/// Why a transform call stopped before consuming all of its input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The destination buffer is full.  Call again with more room.
    ShortDestination,
    /// The source ends partway through a character and `at_eof` was false.
    /// Call again with more input appended.
    ShortSource,
    /// The source contains malformed utf8 at `read`.
    InvalidUtf8,
    /// A character with no representation was hit under
    /// `InvalidPolicy::Error`.  It is included in `read`.
    Unrepresentable(InvalidCharacterError),
    /// The transform doesn't exist.
    NotImplemented,
}

impl TransformError {
    /// Whether calling again with more buffer space or input can make
    /// progress.
    pub fn is_recoverable(&self) -> bool {
        match *self {
            TransformError::ShortDestination | TransformError::ShortSource => true,
            _ => false,
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TransformError::ShortDestination => f.write_str("isolatin1: short destination buffer"),
            TransformError::ShortSource => f.write_str("isolatin1: short source buffer"),
            TransformError::InvalidUtf8 => f.write_str("isolatin1: invalid UTF-8 input"),
            TransformError::Unrepresentable(ref e) => fmt::Display::fmt(e, f),
            TransformError::NotImplemented => f.write_str("isolatin1: decoder not implemented"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            TransformError::Unrepresentable(ref e) => Some(e),
            _ => None,
        }
    }
}

/// A character that the target encoding can't represent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InvalidCharacterError {
    pub character: char,
}

impl fmt::Display for InvalidCharacterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let code = self.character as u32;
        if self.character.is_control() {
            write!(f, "isolatin1: invalid character U+{:04X} ({:X})", code, code)
        } else {
            write!(
                f,
                "isolatin1: invalid character U+{:04X} '{}' ({:X})",
                code, self.character, code
            )
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidCharacterError {}

/// Represents an error when encoding a complete string with
/// `Latin1::encode()`.
///
/// The problematic character, the byte index range of that character in the
/// normalized input, and the number of bytes already encoded are provided.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EncodeError {
    pub character: char,
    pub error_range: (usize, usize),
    pub output_bytes_written: usize,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} at bytes {}..{}",
            InvalidCharacterError {
                character: self.character,
            },
            self.error_range.0,
            self.error_range.1
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}
