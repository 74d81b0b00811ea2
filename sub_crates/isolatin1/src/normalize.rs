//! Canonical composition (NFC) ahead of the encoder, so that a base
//! character followed by combining marks reaches it as a single
//! precomposed character wherever one exists.
//!
//! Composition can only join characters within a grapheme cluster, so
//! input is released in whole clusters.  Until the end of input is known,
//! the last cluster of a chunk is held back: combining marks at the start
//! of the next chunk could still extend it.

use alloc::vec::Vec;

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::latin1::Latin1Encoder;
use crate::utf8::{split_valid, Tail};
use crate::{InvalidPolicy, Transform, TransformError, TransformResult};

/// Appends the NFC form of as much of `src` as can be composed to `out`,
/// returning the number of bytes read.
///
/// Malformed utf8 is copied through verbatim, for the encoder to report.
/// So is a truncated character at the end of input.
pub(crate) fn compose(
    src: &[u8],
    at_eof: bool,
    out: &mut Vec<u8>,
) -> (usize, Result<(), TransformError>) {
    let mut read = 0;
    while read < src.len() {
        let rest = &src[read..];
        let (text, tail) = split_valid(rest);
        match tail {
            Some(Tail::Invalid(len)) => {
                // The malformed bytes end any cluster in progress.
                push_nfc(text, out);
                out.extend_from_slice(&rest[text.len()..(text.len() + len)]);
                read += text.len() + len;
            }
            _ if at_eof => {
                push_nfc(text, out);
                out.extend_from_slice(&rest[text.len()..]);
                read = src.len();
            }
            _ => {
                let end = last_cluster_start(text);
                push_nfc(&text[..end], out);
                read += end;
                return (read, Err(TransformError::ShortSource));
            }
        }
    }

    (read, Ok(()))
}

fn last_cluster_start(text: &str) -> usize {
    text.grapheme_indices(true)
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn push_nfc(text: &str, out: &mut Vec<u8>) {
    if text.is_ascii() {
        out.extend_from_slice(text.as_bytes());
        return;
    }
    let mut buf = [0u8; 4];
    for c in text.nfc() {
        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
    }
}

/// A queue of bytes that have been produced but not yet handed on.
#[derive(Debug, Clone, Default)]
struct Pending {
    bytes: Vec<u8>,
    start: usize,
}

impl Pending {
    fn as_slice(&self) -> &[u8] {
        &self.bytes[self.start..]
    }

    fn is_empty(&self) -> bool {
        self.start == self.bytes.len()
    }

    fn consume(&mut self, n: usize) {
        self.start += n;
        if self.is_empty() {
            self.clear();
        }
    }

    fn clear(&mut self) {
        self.bytes.clear();
        self.start = 0;
    }

    /// Copies as much as fits into `dst`, returning the number of bytes
    /// copied.
    fn flush(&mut self, dst: &mut [u8]) -> usize {
        let n = self.as_slice().len().min(dst.len());
        dst[..n].copy_from_slice(&self.as_slice()[..n]);
        self.consume(n);
        n
    }
}

/// Transforms utf8 to its NFC form.
///
/// Composed text that doesn't fit in the destination is kept, and is
/// written out first on the next call.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    pending: Pending,
}

impl Normalizer {
    pub fn new() -> Normalizer {
        Normalizer {
            pending: Pending::default(),
        }
    }
}

impl Transform for Normalizer {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult {
        if dst.is_empty() {
            return TransformResult::new(0, 0, Err(TransformError::ShortDestination));
        }

        let mut written = self.pending.flush(dst);
        if !self.pending.is_empty() {
            return TransformResult::new(0, written, Err(TransformError::ShortDestination));
        }

        let (read, outcome) = compose(src, at_eof, &mut self.pending.bytes);
        written += self.pending.flush(&mut dst[written..]);
        if !self.pending.is_empty() {
            return TransformResult::new(read, written, Err(TransformError::ShortDestination));
        }

        TransformResult::new(read, written, outcome)
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}

/// Encodes utf8 to restricted latin1, composing it to NFC first.
///
/// Input is composed and encoded one grapheme cluster at a time, so `read`
/// always ends on a cluster boundary.  A cluster is read only once its
/// output has been written, or queued when it is too big for even an empty
/// destination.  An encoding error counts the cluster holding the offending
/// character as read.  Malformed input is never read.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    encoder: Latin1Encoder,
    pending: Pending,  // Encoded output waiting for room.
    composed: Vec<u8>, // Scratch space for one composed cluster.
    encoded: Vec<u8>,  // Scratch space for its encoding.
}

impl Encoder {
    pub fn new(policy: InvalidPolicy) -> Encoder {
        Encoder {
            encoder: Latin1Encoder::new(policy),
            pending: Pending::default(),
            composed: Vec::new(),
            encoded: Vec::new(),
        }
    }

    pub fn policy(&self) -> InvalidPolicy {
        self.encoder.policy()
    }

    /// Composes and encodes one grapheme cluster into `dst`.
    ///
    /// The cluster's output is written whole or not at all, unless nothing
    /// has been written to the caller's destination yet (`whole_dst`).
    /// Then whatever doesn't fit is queued instead.  The result's `read` is either zero or the whole
    /// cluster.
    fn encode_cluster(
        &mut self,
        dst: &mut [u8],
        cluster: &str,
        whole_dst: bool,
    ) -> TransformResult {
        self.composed.clear();
        push_nfc(cluster, &mut self.composed);

        // Never more than one byte out per character in.
        self.encoded.resize(self.composed.len(), 0);
        let r = self.encoder.transform(&mut self.encoded, &self.composed, true);
        let out = &self.encoded[..r.written];

        if out.len() > dst.len() && !whole_dst {
            return TransformResult::new(0, 0, Err(TransformError::ShortDestination));
        }

        let n = out.len().min(dst.len());
        dst[..n].copy_from_slice(&out[..n]);
        self.pending.bytes.extend_from_slice(&out[n..]);

        let outcome = match r.outcome {
            Ok(()) if !self.pending.is_empty() => Err(TransformError::ShortDestination),
            outcome => outcome,
        };
        TransformResult::new(cluster.len(), n, outcome)
    }
}

impl Transform for Encoder {
    fn transform(&mut self, dst: &mut [u8], src: &[u8], at_eof: bool) -> TransformResult {
        if dst.is_empty() {
            return TransformResult::new(0, 0, Err(TransformError::ShortDestination));
        }

        let mut written = self.pending.flush(dst);
        if !self.pending.is_empty() {
            return TransformResult::new(0, written, Err(TransformError::ShortDestination));
        }

        let (text, tail) = split_valid(src);
        let end = match tail {
            Some(Tail::Invalid(_)) => text.len(),
            _ if at_eof => text.len(),
            _ => last_cluster_start(text),
        };

        for (start, cluster) in text[..end].grapheme_indices(true) {
            let r = self.encode_cluster(&mut dst[written..], cluster, written == 0);
            written += r.written;
            if r.outcome.is_err() {
                return TransformResult::new(start + r.read, written, r.outcome);
            }
        }

        // Malformed bytes stay unread, as does anything held back.
        let outcome = match tail {
            Some(Tail::Invalid(_)) => Err(TransformError::InvalidUtf8),
            Some(Tail::Incomplete) if at_eof => Err(TransformError::InvalidUtf8),
            _ if end < src.len() => Err(TransformError::ShortSource),
            _ => Ok(()),
        };
        TransformResult::new(end, written, outcome)
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}
