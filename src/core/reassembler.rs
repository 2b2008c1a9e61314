//! # Frame Reassembler
//!
//! Turns an arbitrarily fragmented byte stream into complete frames.
//!
//! The reassembler owns one receive buffer. Unconsumed bytes always sit at the
//! front of it; a socket read appends after them, every complete frame is
//! sliced off in order, and whatever partial frame is left is moved back to
//! the front (compaction) before the next read.
//!
//! ## Limits
//! - A frame whose declared size exceeds `max_frame_size` fails with
//!   [`ProtocolError::FrameTooLarge`] as soon as its length field is visible.
//! - A declared size smaller than the header fails with
//!   [`ProtocolError::InvalidFrameLength`].
//!
//! Both are fatal: the reassembler is poisoned and every later call repeats
//! the error, so no byte after a bad frame is ever delivered.
//!
//! After compaction at most one partial frame (shorter than `max_frame_size`)
//! remains, so a buffer at least `max_frame_size` long never needs to grow.
//!
//! ## Usage
//! ```rust
//! use packet_frame::core::reassembler::FrameReassembler;
//!
//! let mut reassembler = FrameReassembler::new();
//! let mut frames = Vec::new();
//!
//! // A 6-byte frame split across two reads
//! reassembler.feed(&[6, 0, 0xC1, 0x02], |f| frames.push(f.to_vec())).unwrap();
//! reassembler.feed(&[0, 1], |f| frames.push(f.to_vec())).unwrap();
//!
//! assert_eq!(frames, vec![vec![6, 0, 0xC1, 0x02, 0, 1]]);
//! ```

use crate::core::header::{declared_frame_len, HEADER_SIZE};
use crate::core::{MAX_BUFFER, MAX_PACKET_SIZE};
use crate::error::{constants, ProtocolError, Result};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy)]
enum Poison {
    TooLarge(usize),
    TooShort(usize),
}

impl Poison {
    fn to_error(self) -> ProtocolError {
        match self {
            Poison::TooLarge(len) => ProtocolError::FrameTooLarge(len),
            Poison::TooShort(len) => ProtocolError::InvalidFrameLength(len),
        }
    }
}

/// Accumulates stream bytes and extracts complete frames.
#[derive(Debug)]
pub struct FrameReassembler {
    buf: Vec<u8>,
    /// Bytes at the front of `buf` holding received data.
    filled: usize,
    /// Bytes of the filled region already handed out as frames.
    consumed: usize,
    max_frame_size: usize,
    poison: Option<Poison>,
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReassembler {
    /// 4 KB receive buffer, 1 KB frame cap.
    pub fn new() -> Self {
        Self::with_limits(MAX_BUFFER, MAX_PACKET_SIZE)
    }

    /// Custom buffer size and frame cap.
    ///
    /// The buffer is never smaller than `max_frame_size`, and the cap never
    /// smaller than one header.
    pub fn with_limits(buffer_size: usize, max_frame_size: usize) -> Self {
        let max_frame_size = max_frame_size.max(HEADER_SIZE);
        Self {
            buf: vec![0u8; buffer_size.max(max_frame_size)],
            filled: 0,
            consumed: 0,
            max_frame_size,
            poison: None,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes received but not yet handed out as frames.
    pub fn readable(&self) -> usize {
        self.filled - self.consumed
    }

    /// Whether a fatal framing error has been hit.
    pub fn is_poisoned(&self) -> bool {
        self.poison.is_some()
    }

    /// Writable tail of the receive buffer for the next stream read.
    ///
    /// Compacts first, and grows the buffer if it is somehow full.
    pub fn spare_capacity_mut(&mut self) -> &mut [u8] {
        self.compact();
        if self.filled == self.buf.len() {
            let new_len = self.buf.len() * 2;
            self.buf.resize(new_len, 0);
        }
        &mut self.buf[self.filled..]
    }

    /// Mark `n` bytes written into [`spare_capacity_mut`](Self::spare_capacity_mut) as received.
    pub fn commit(&mut self, n: usize) {
        self.filled = (self.filled + n).min(self.buf.len());
    }

    /// Slice off the next complete frame, header included.
    ///
    /// `Ok(None)` means more bytes are needed. The returned slice is only
    /// valid until the next call that mutates the reassembler.
    pub fn next_frame(&mut self) -> Result<Option<&[u8]>> {
        if let Some(poison) = self.poison {
            return Err(poison.to_error());
        }

        let pending = &self.buf[self.consumed..self.filled];
        let required = match declared_frame_len(pending, self.max_frame_size) {
            Ok(Some(required)) => required,
            Ok(None) => return Ok(None),
            Err(e) => {
                self.poison_with(&e);
                return Err(e);
            }
        };

        if pending.len() < required {
            trace!(
                readable = pending.len(),
                required,
                "Partial frame, waiting for more data"
            );
            return Ok(None);
        }

        let start = self.consumed;
        self.consumed += required;
        Ok(Some(&self.buf[start..start + required]))
    }

    fn poison_with(&mut self, err: &ProtocolError) {
        self.poison = match *err {
            ProtocolError::FrameTooLarge(declared) => {
                warn!(declared, max = self.max_frame_size, "{}", constants::ERR_FRAME_TOO_LARGE);
                Some(Poison::TooLarge(declared))
            }
            ProtocolError::InvalidFrameLength(declared) => {
                warn!(declared, "{}", constants::ERR_INVALID_FRAME_LENGTH);
                Some(Poison::TooShort(declared))
            }
            _ => None,
        };
    }

    /// Move unconsumed bytes to the front of the buffer.
    ///
    /// Returns the number of bytes kept, which is also the offset the next
    /// read starts at.
    pub fn compact(&mut self) -> usize {
        if self.consumed > 0 {
            self.buf.copy_within(self.consumed..self.filled, 0);
            self.filled -= self.consumed;
            self.consumed = 0;
        }
        self.filled
    }

    /// Process `n` freshly read bytes sitting in the spare capacity.
    ///
    /// Every complete frame is passed to `on_frame` in stream order, then the
    /// residue is compacted. Returns the number of bytes carried over.
    pub fn on_read<F>(&mut self, n: usize, mut on_frame: F) -> Result<usize>
    where
        F: FnMut(&[u8]),
    {
        self.commit(n);
        while let Some(frame) = self.next_frame()? {
            on_frame(frame);
        }
        Ok(self.compact())
    }

    /// Append `data` and deliver every frame it completes.
    ///
    /// Large inputs are copied in buffer-sized chunks, so memory stays bounded
    /// by the receive buffer whatever the size of `data`.
    pub fn feed<F>(&mut self, mut data: &[u8], mut on_frame: F) -> Result<usize>
    where
        F: FnMut(&[u8]),
    {
        if let Some(poison) = self.poison {
            return Err(poison.to_error());
        }

        loop {
            let spare = self.spare_capacity_mut();
            let n = spare.len().min(data.len());
            spare[..n].copy_from_slice(&data[..n]);
            data = &data[n..];

            let carried = self.on_read(n, &mut on_frame)?;
            if data.is_empty() {
                return Ok(carried);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn frame(id: i16, body: &[u8]) -> Vec<u8> {
        let total = (HEADER_SIZE + body.len()) as u16;
        let mut out = total.to_le_bytes().to_vec();
        out.extend_from_slice(&id.to_le_bytes());
        out.push(0);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn test_single_complete_frame() {
        let mut r = FrameReassembler::new();
        let f = frame(702, &[0, 0]);
        let mut got = Vec::new();
        let carried = r.feed(&f, |b| got.push(b.to_vec())).unwrap();
        assert_eq!(carried, 0);
        assert_eq!(got, vec![f]);
    }

    #[test]
    fn test_multiple_frames_in_one_read() {
        let mut r = FrameReassembler::new();
        let a = frame(702, &[1, 0]);
        let b = frame(705, &[1]);
        let c = frame(704, &[0, 0]);
        let mut stream = a.clone();
        stream.extend_from_slice(&b);
        stream.extend_from_slice(&c);

        let mut got = Vec::new();
        r.feed(&stream, |f| got.push(f.to_vec())).unwrap();
        assert_eq!(got, vec![a, b, c]);
        assert_eq!(r.readable(), 0);
    }

    #[test]
    fn test_split_inside_header() {
        let mut r = FrameReassembler::new();
        let f = frame(701, &[7; 32]);
        let mut got = Vec::new();

        assert_eq!(r.feed(&f[..3], |x| got.push(x.to_vec())).unwrap(), 3);
        assert!(got.is_empty());
        assert_eq!(r.feed(&f[3..20], |x| got.push(x.to_vec())).unwrap(), 20);
        assert!(got.is_empty());
        assert_eq!(r.feed(&f[20..], |x| got.push(x.to_vec())).unwrap(), 0);
        assert_eq!(got, vec![f]);
    }

    #[test]
    fn test_residue_is_compacted_to_front() {
        let mut r = FrameReassembler::new();
        let a = frame(702, &[0, 0]);
        let b = frame(706, &[8]);
        let mut stream = a.clone();
        stream.extend_from_slice(&b[..4]);

        let mut got = Vec::new();
        let carried = r.feed(&stream, |f| got.push(f.to_vec())).unwrap();
        assert_eq!(carried, 4);
        assert_eq!(got, vec![a]);

        // The next read lands right after the carried bytes
        let spare = r.spare_capacity_mut();
        spare[0] = b[4];
        spare[1] = b[5];
        let carried = r.on_read(2, |f| got.push(f.to_vec())).unwrap();
        assert_eq!(carried, 0);
        assert_eq!(got[1], b);
    }

    #[test]
    fn test_frame_at_exact_limit_is_accepted() {
        let mut r = FrameReassembler::new();
        let f = frame(1, &vec![0xAB; MAX_PACKET_SIZE - HEADER_SIZE]);
        assert_eq!(f.len(), MAX_PACKET_SIZE);
        let mut count = 0;
        r.feed(&f, |_| count += 1).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_oversized_declaration_rejected_from_header_alone() {
        let mut r = FrameReassembler::new();
        let declared = (MAX_PACKET_SIZE + 1) as u16;
        let mut bytes = declared.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0xBD, 0x02, 0]);

        let mut count = 0;
        let err = r.feed(&bytes, |_| count += 1).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge(1025)));
        assert_eq!(count, 0);
        assert!(r.is_poisoned());

        // Poisoned: later valid data is never delivered
        let err = r.feed(&frame(702, &[0, 0]), |_| count += 1).unwrap_err();
        assert!(matches!(err, ProtocolError::FrameTooLarge(1025)));
        assert_eq!(count, 0);
    }

    #[test]
    fn test_burst_of_small_frames_beyond_cap_is_fine() {
        // Cumulative readable bytes well above the cap, every frame within it
        let mut r = FrameReassembler::new();
        let f = frame(705, &[1]);
        let stream: Vec<u8> = f.iter().copied().cycle().take(f.len() * 500).collect();
        assert!(stream.len() > MAX_PACKET_SIZE);

        let mut count = 0;
        r.feed(&stream, |x| {
            assert_eq!(x, &f[..]);
            count += 1;
        })
        .unwrap();
        assert_eq!(count, 500);
    }

    #[test]
    fn test_zero_length_declaration_is_fatal() {
        let mut r = FrameReassembler::new();
        let err = r.feed(&[0, 0, 0, 0, 0, 0], |_| {}).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidFrameLength(0)));
        assert!(r.is_poisoned());
    }

    #[test]
    fn test_header_only_frame() {
        let mut r = FrameReassembler::new();
        let f = frame(900, &[]);
        let mut got = Vec::new();
        r.feed(&f, |x| got.push(x.to_vec())).unwrap();
        assert_eq!(got, vec![f]);
    }

    #[test]
    fn test_small_buffer_is_raised_to_frame_cap() {
        let r = FrameReassembler::with_limits(16, 64);
        assert_eq!(r.capacity(), 64);
        assert_eq!(r.max_frame_size(), 64);
    }

    #[test]
    fn test_large_feed_keeps_buffer_bounded() {
        let mut r = FrameReassembler::with_limits(64, 64);
        let f = frame(704, &[0, 0]);
        let stream: Vec<u8> = f.iter().copied().cycle().take(f.len() * 1000).collect();
        let mut count = 0;
        r.feed(&stream, |_| count += 1).unwrap();
        assert_eq!(count, 1000);
        assert_eq!(r.capacity(), 64);
    }
}
