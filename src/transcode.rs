use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use isolatin1::{Transform, TransformError};
use log::trace;

/// Byte counts for a finished run.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Stats {
    pub bytes_read: usize,
    pub bytes_written: usize,
}

/// Runs `transform` over everything in `reader`, writing its output to
/// `writer`.
///
/// Input is read `chunk_size` bytes at a time.  Whatever the transform
/// leaves unconsumed is moved to the front of the source buffer and
/// presented again along with the next chunk.  If a single character needs
/// more than the whole buffer, the buffer grows.
///
/// Fatal transform errors come back with the `TransformError` as their
/// root cause.
pub fn transcode<T, R, W>(
    transform: &mut T,
    mut reader: R,
    mut writer: W,
    chunk_size: usize,
) -> Result<Stats>
where
    T: Transform + ?Sized,
    R: Read,
    W: Write,
{
    let mut src = vec![0u8; chunk_size.max(1)];
    let mut dst = vec![0u8; chunk_size.max(1)];
    let mut src_len = 0; // Bytes in `src` not yet consumed.
    let mut consumed = 0; // Total bytes consumed so far.
    let mut at_eof = false;
    let mut want_input = true;
    let mut stats = Stats::default();

    loop {
        // Top up the source buffer.
        if want_input && !at_eof {
            if src_len == src.len() {
                let new_len = src.len() * 2;
                src.resize(new_len, 0);
            }
            let n = read_some(&mut reader, &mut src[src_len..]).context("failed to read input")?;
            if n == 0 {
                at_eof = true;
            }
            src_len += n;
            stats.bytes_read += n;
            trace!("read {} bytes, {} pending", n, src_len);
        }

        let r = transform.transform(&mut dst, &src[..src_len], at_eof);

        writer
            .write_all(&dst[..r.written])
            .context("failed to write output")?;
        stats.bytes_written += r.written;

        src.copy_within(r.read..src_len, 0);
        src_len -= r.read;
        consumed += r.read;
        trace!("consumed {} bytes, wrote {} bytes", r.read, r.written);

        want_input = match r.outcome {
            Ok(()) if at_eof => break,
            Ok(()) | Err(TransformError::ShortSource) => true,
            Err(TransformError::ShortDestination) => false,
            Err(e) => {
                return Err(anyhow::Error::new(e))
                    .with_context(|| format!("encoding stopped after input byte {}", consumed));
            }
        };
    }

    Ok(stats)
}

/// Like `Read::read()`, but retries on interruption.
fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isolatin1::{InvalidCharacterError, InvalidPolicy, Latin1};

    /// A reader that hands out at most one byte per read.
    struct Trickle<'a>(&'a [u8]);

    impl<'a> Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    fn run<T: Transform>(transform: &mut T, input: &[u8], chunk_size: usize) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        transcode(transform, input, &mut output, chunk_size)?;
        Ok(output)
    }

    #[test]
    fn transcode_01() {
        let input = "Hello world!\n".as_bytes();
        for &chunk_size in &[1, 2, 5, 4096] {
            let mut enc = Latin1::new(InvalidPolicy::Error).encoder();
            assert_eq!(run(&mut enc, input, chunk_size).unwrap(), input);
        }
    }

    #[test]
    fn transcode_02() {
        // A two-byte character doesn't fit a one-byte buffer, so it grows.
        let input = "café".as_bytes();
        let mut enc = Latin1::new(InvalidPolicy::Error).encoder();
        assert_eq!(run(&mut enc, input, 1).unwrap(), b"caf\xE9");
    }

    #[test]
    fn transcode_03() {
        let input = "cafe\u{0301} cre\u{0300}me brûlée".as_bytes();
        let mut enc = Latin1::new(InvalidPolicy::Error).new_encoder();
        let mut output = Vec::new();
        let stats = transcode(&mut enc, Trickle(input), &mut output, 3).unwrap();
        assert_eq!(&output[..], b"caf\xE9 cr\xE8me br\xFBl\xE9e");
        assert_eq!(
            stats,
            Stats {
                bytes_read: input.len(),
                bytes_written: output.len(),
            }
        );
    }

    #[test]
    fn transcode_04() {
        let input = "10€ or 10¢".as_bytes();
        let mut enc = Latin1::new(InvalidPolicy::Skip).new_encoder();
        assert_eq!(run(&mut enc, input, 4).unwrap(), b"10 or 10\xA2");
    }

    #[test]
    fn transcode_05() {
        let input = "ab€cd".as_bytes();
        let mut enc = Latin1::new(InvalidPolicy::Error).encoder();
        let mut output = Vec::new();
        let err = transcode(&mut enc, input, &mut output, 2).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TransformError>(),
            Some(&TransformError::Unrepresentable(InvalidCharacterError {
                character: '€'
            }))
        );
        assert_eq!(&output[..], b"ab");
    }

    #[test]
    fn transcode_06() {
        let input = [0x61, 0x62, 0xFF, 0x63];
        let mut enc = Latin1::new(InvalidPolicy::Skip).new_encoder();
        let err = run(&mut enc, &input, 16).unwrap_err();
        assert_eq!(err.downcast_ref::<TransformError>(), Some(&TransformError::InvalidUtf8));
    }

    #[test]
    fn transcode_07() {
        // Truncated character at the end of input.
        let input = [0x61, 0xC3];
        let mut enc = Latin1::new(InvalidPolicy::Skip).encoder();
        let err = run(&mut enc, &input, 1).unwrap_err();
        assert_eq!(err.downcast_ref::<TransformError>(), Some(&TransformError::InvalidUtf8));
    }

    #[test]
    fn transcode_08() {
        let mut enc = Latin1::new(InvalidPolicy::Error).new_encoder();
        assert_eq!(run(&mut enc, &[], 8).unwrap(), b"");
    }

    #[test]
    fn transcode_09() {
        // The reported offset ends right after the offending character.
        let input = "ab€cd".as_bytes();
        for &chunk_size in &[1, 2, 16] {
            let mut enc = Latin1::new(InvalidPolicy::Error).new_encoder();
            let mut output = Vec::new();
            let err = transcode(&mut enc, input, &mut output, chunk_size).unwrap_err();
            assert_eq!(err.to_string(), "encoding stopped after input byte 5");
            assert_eq!(&output[..], b"ab");
        }
    }

    #[test]
    fn transcode_10() {
        let input = [0x61, 0x62, 0xFF, 0x63];
        let mut enc = Latin1::new(InvalidPolicy::Skip).new_encoder();
        let mut output = Vec::new();
        let err = transcode(&mut enc, &input[..], &mut output, 16).unwrap_err();
        assert_eq!(err.to_string(), "encoding stopped after input byte 2");
        assert_eq!(&output[..], b"ab");
    }

    #[test]
    fn transcode_decoder() {
        let mut dec = Latin1::new(InvalidPolicy::Error).new_decoder();
        let err = run(&mut dec, b"abc", 8).unwrap_err();
        assert_eq!(err.downcast_ref::<TransformError>(), Some(&TransformError::NotImplemented));
    }
}
