//! # Frame Codec
//!
//! `tokio_util::codec` adapter applying the framing rules of
//! [`FrameReassembler`](crate::core::reassembler::FrameReassembler) to a
//! `BytesMut` read buffer, so a stream can also be driven with `Framed`.
//!
//! Decoded items are [`RawFrame`]s (header included). Encoding accepts either
//! a typed [`Message`] or an already encoded [`RawFrame`].

use crate::core::header::{self, declared_frame_len, Header, HEADER_SIZE};
use crate::core::MAX_PACKET_SIZE;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::Message;
use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// One complete frame as it appeared on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame(Bytes);

impl RawFrame {
    /// Wrap bytes that already form exactly one frame.
    pub fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    pub fn id(&self) -> i16 {
        header::peek_id(&self.0)
    }

    pub fn header(&self) -> Result<Header> {
        header::decode_header(&self.0)
    }

    pub fn body(&self) -> &[u8] {
        header::peek_body(&self.0).1
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl AsRef<[u8]> for RawFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Length-prefixed frame codec with a maximum frame size.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    max_frame_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::with_max_frame_size(MAX_PACKET_SIZE)
    }

    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size: max_frame_size.max(HEADER_SIZE),
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Decoder for FrameCodec {
    type Item = RawFrame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let required = match declared_frame_len(&src[..], self.max_frame_size)? {
            Some(required) => required,
            None => return Ok(None),
        };

        if src.len() < required {
            src.reserve(required - src.len());
            return Ok(None);
        }

        Ok(Some(RawFrame(src.split_to(required).freeze())))
    }
}

impl Encoder<RawFrame> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: RawFrame, dst: &mut BytesMut) -> Result<()> {
        if item.len() > self.max_frame_size {
            return Err(ProtocolError::FrameTooLarge(item.len()));
        }
        dst.extend_from_slice(item.as_ref());
        Ok(())
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        let bytes = item.encode()?;
        Encoder::<RawFrame>::encode(self, RawFrame(bytes), dst)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::protocol::message::{LoginRes, PingReq};

    #[test]
    fn test_decode_waits_for_complete_frame() {
        let mut codec = FrameCodec::new();
        let bytes = Message::from(LoginRes { error_code: 3 }).encode().unwrap();

        let mut buf = BytesMut::from(&bytes[..4]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 4);

        buf.extend_from_slice(&bytes[4..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.id(), 702);
        assert_eq!(frame.body(), &[3, 0]);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_rejects_oversized() {
        let mut codec = FrameCodec::with_max_frame_size(16);
        let mut buf = BytesMut::from(&[17u8, 0, 1, 0, 0][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::FrameTooLarge(17))
        ));
    }

    #[test]
    fn test_encode_message_then_decode() {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(Message::PingReq(PingReq { ping: 1 }), &mut buf)
            .unwrap();
        codec
            .encode(Message::LoginRes(LoginRes { error_code: 0 }), &mut buf)
            .unwrap();

        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.id(), 705);
        assert_eq!(second.id(), 702);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
