//! # Frame Header
//!
//! Every frame starts with a fixed 5-byte little-endian header:
//!
//! ```text
//! offset 0: total_size  u16   (header + body)
//! offset 2: id          i16
//! offset 4: packet_type i8    (0 = normal, 1 = compress, 2 = secure)
//! ```
//!
//! The header size is a compile-time constant built from the field widths
//! below, so nothing has to be computed or cached at startup.

use crate::core::cursor::{Reader, Writer};
use crate::error::{ProtocolError, Result};

/// Width in bytes of each header field, in wire order.
pub const HEADER_FIELD_WIDTHS: [usize; 3] = [
    std::mem::size_of::<i16>(), // total_size
    std::mem::size_of::<i16>(), // id
    std::mem::size_of::<i8>(),  // packet_type
];

const fn sum_widths(widths: &[usize]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < widths.len() {
        total += widths[i];
        i += 1;
    }
    total
}

/// Encoded header length (5 bytes).
pub const HEADER_SIZE: usize = sum_widths(&HEADER_FIELD_WIDTHS);

const ID_OFFSET: usize = HEADER_FIELD_WIDTHS[0];

/// Header length, for callers that prefer a function.
#[inline]
pub const fn header_size() -> usize {
    HEADER_SIZE
}

/// Reserved packet-type tag. Carried on the wire, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i8)]
pub enum PacketType {
    #[default]
    Normal = 0,
    Compress = 1,
    Secure = 2,
}

impl PacketType {
    pub fn as_i8(self) -> i8 {
        self as i8
    }
}

impl TryFrom<i8> for PacketType {
    type Error = i8;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(PacketType::Normal),
            1 => Ok(PacketType::Compress),
            2 => Ok(PacketType::Secure),
            other => Err(other),
        }
    }
}

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub total_size: i16,
    pub id: i16,
    /// Raw tag; see [`Header::kind`] for the typed view.
    pub packet_type: i8,
}

impl Header {
    pub fn kind(&self) -> Option<PacketType> {
        PacketType::try_from(self.packet_type).ok()
    }

    /// Body length implied by `total_size`; non-positive means "no body".
    pub fn body_size(&self) -> i16 {
        self.total_size.wrapping_sub(HEADER_SIZE as i16)
    }
}

/// Write the three header fields in wire order.
pub fn encode_header(writer: &mut Writer<'_>, total_size: i16, id: i16, packet_type: i8) -> Result<()> {
    writer.write_i16(total_size)?;
    writer.write_i16(id)?;
    writer.write_i8(packet_type)
}

/// Parse a header from the front of `bytes` (always little-endian).
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    let mut reader = Reader::little_endian(bytes);
    Ok(Header {
        total_size: reader.read_i16()?,
        id: reader.read_i16()?,
        packet_type: reader.read_i8()?,
    })
}

/// Declared total frame size from the first two bytes.
///
/// Returns `None` when fewer than two bytes are available.
#[inline]
pub fn peek_total_size(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

/// Validate a declared total frame size against the frame cap.
///
/// Above the cap is [`ProtocolError::FrameTooLarge`]; below one header is
/// [`ProtocolError::InvalidFrameLength`]. Both are fatal to a stream.
pub fn check_declared(required: usize, max_frame_size: usize) -> Result<()> {
    if required > max_frame_size {
        return Err(ProtocolError::FrameTooLarge(required));
    }
    if required < HEADER_SIZE {
        return Err(ProtocolError::InvalidFrameLength(required));
    }
    Ok(())
}

/// Declared size of the frame at the front of `pending`, validated.
///
/// `Ok(None)` until a whole header is visible. The frame is complete once
/// `pending.len()` reaches the returned size.
pub fn declared_frame_len(pending: &[u8], max_frame_size: usize) -> Result<Option<usize>> {
    if pending.len() < HEADER_SIZE {
        return Ok(None);
    }
    let required = match peek_total_size(pending) {
        Some(size) => size as usize,
        None => return Ok(None),
    };
    check_declared(required, max_frame_size)?;
    Ok(Some(required))
}

/// Message id of a raw frame, read in place at offset 2.
///
/// The caller guarantees a full header is present (the reassembler only hands
/// out complete frames); a shorter slice yields `0`.
#[inline]
pub fn peek_id(raw_frame: &[u8]) -> i16 {
    match raw_frame.get(ID_OFFSET..ID_OFFSET + 2) {
        Some(&[lo, hi]) => i16::from_le_bytes([lo, hi]),
        _ => 0,
    }
}

/// Body size and body slice of a raw frame.
///
/// The size is `total_size - HEADER_SIZE` as declared in the header. When it is
/// zero or negative the slice is empty and the size is returned unchanged, so
/// callers treat it as "no body" rather than an error.
pub fn peek_body(raw_frame: &[u8]) -> (i16, &[u8]) {
    let total = peek_total_size(raw_frame).unwrap_or(0) as i16;
    let body_size = total.wrapping_sub(HEADER_SIZE as i16);

    if body_size <= 0 {
        return (body_size, &[]);
    }

    let start = HEADER_SIZE.min(raw_frame.len());
    let end = (HEADER_SIZE + body_size as usize).min(raw_frame.len());
    (body_size, &raw_frame[start..end])
}
