//! Sequential JPEG marker segment scanner.
//!
//! Walks the structural header region of a JPEG stream one marker segment
//! at a time, modeled after a zip-entry reader: each segment appears to end
//! until [`MarkerScanner::next_marker`] advances to the next one. No random
//! access, no rewind; advancing implicitly discards any unread remainder of
//! the current segment.
//!
//! The start-of-scan marker is terminal for this scanner: it is followed by
//! an unbounded entropy-coded data region that is not segment-structured,
//! so callers must stop once [`marker::SOS`] is reported.

use std::io::Read;

use thiserror::Error;

/// Well-known JPEG marker codes.
pub mod marker {
    /// Start of image. No length field, zero payload.
    pub const SOI: u16 = 0xFFD8;
    /// End of image. No length field, zero payload.
    pub const EOI: u16 = 0xFFD9;
    /// Start of scan. Terminal: entropy-coded data follows its header.
    pub const SOS: u16 = 0xFFDA;
    /// JFIF application segment.
    pub const APP0: u16 = 0xFFE0;
    /// Exif application segment (embedded thumbnails live here).
    pub const APP1: u16 = 0xFFE1;
    /// ICC profile application segment.
    pub const APP2: u16 = 0xFFE2;
    /// Photoshop IRB application segment.
    pub const APP13: u16 = 0xFFED;
    /// Comment segment.
    pub const COM: u16 = 0xFFFE;
    /// Quantization table definition.
    pub const DQT: u16 = 0xFFDB;
    /// Baseline frame header.
    pub const SOF0: u16 = 0xFFC0;
    /// Huffman table definition.
    pub const DHT: u16 = 0xFFC4;
}

pub type JpegResult<T> = Result<T, JpegError>;

/// Errors produced while scanning a JPEG stream.
#[derive(Debug, Error)]
pub enum JpegError {
    /// End of stream reached while marker bytes, a length field, or a
    /// declared payload remainder were still expected. Distinct from a
    /// normal end-of-image marker.
    #[error("truncated JPEG stream while reading {context}")]
    Truncated { context: &'static str },

    /// `next_marker` was called after the start-of-scan marker. The region
    /// past SOS is entropy-coded image data, not marker segments.
    #[error("scanner is past start-of-scan; entropy-coded data follows")]
    EntropyCodedData,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One structurally delimited segment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// Two-byte marker code, e.g. `0xFFD8`.
    pub code: u16,
    /// Payload bytes following the length field (declared length minus the
    /// 2 bytes of the length field itself; zero for SOI/EOI).
    pub payload_len: usize,
}

/// Sequential scanner over the marker segments of a JPEG stream.
pub struct MarkerScanner<R: Read> {
    inner: R,
    /// Unread bytes of the current segment's payload.
    remaining: usize,
    /// Set once SOS has been reported; the scanner is done being useful.
    at_scan_data: bool,
    /// Total bytes consumed from the underlying stream.
    consumed: u64,
}

impl<R: Read> MarkerScanner<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            remaining: 0,
            at_scan_data: false,
            consumed: 0,
        }
    }

    /// Advance to the next marker, discarding any unread remainder of the
    /// current segment's payload.
    ///
    /// SOI and EOI carry no length field and zero payload; every other
    /// marker is followed by a 2-byte big-endian length whose value
    /// includes itself, so `payload_len = declared - 2`.
    pub fn next_marker(&mut self) -> JpegResult<Marker> {
        if self.at_scan_data {
            return Err(JpegError::EntropyCodedData);
        }
        self.skip_remaining()?;

        let code = self.read_u16_be("marker code")?;
        let payload_len = match code {
            marker::SOI | marker::EOI => 0,
            _ => {
                let declared = self.read_u16_be("segment length field")? as usize;
                declared.saturating_sub(2)
            }
        };
        self.remaining = payload_len;
        if code == marker::SOS {
            self.at_scan_data = true;
        }
        Ok(Marker { code, payload_len })
    }

    /// Unread bytes left in the current segment's payload.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Total bytes consumed from the underlying stream so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    /// Read payload bytes into `buf`, never past the current segment.
    ///
    /// Returns the number of bytes read; 0 once the segment is exhausted.
    pub fn read_payload(&mut self, buf: &mut [u8]) -> JpegResult<usize> {
        let want = buf.len().min(self.remaining);
        if want == 0 {
            return Ok(0);
        }
        let n = self.inner.read(&mut buf[..want])?;
        self.remaining -= n;
        self.consumed += n as u64;
        Ok(n)
    }

    /// Read the entire unread payload of the current segment.
    pub fn read_payload_to_vec(&mut self) -> JpegResult<Vec<u8>> {
        let mut out = vec![0u8; self.remaining];
        let mut filled = 0;
        while filled < out.len() {
            let n = self.read_payload(&mut out[filled..])?;
            if n == 0 {
                return Err(JpegError::Truncated {
                    context: "segment payload",
                });
            }
            filled += n;
        }
        Ok(out)
    }

    /// Discard the unread remainder of the current segment.
    fn skip_remaining(&mut self) -> JpegResult<()> {
        let mut scratch = [0u8; 256];
        while self.remaining > 0 {
            let n = self.read_payload(&mut scratch)?;
            if n == 0 {
                return Err(JpegError::Truncated {
                    context: "segment payload",
                });
            }
        }
        Ok(())
    }

    fn read_u16_be(&mut self, context: &'static str) -> JpegResult<u16> {
        let mut buf = [0u8; 2];
        let mut filled = 0;
        while filled < 2 {
            let n = self.inner.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(JpegError::Truncated { context });
            }
            filled += n;
        }
        self.consumed += 2;
        Ok(u16::from_be_bytes(buf))
    }
}
