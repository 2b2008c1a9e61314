//! # Message Records
//!
//! Fixed-layout request/response records and their wire ids.
//!
//! Every record implements [`Packet`]: a fixed id, a fixed body size, and body
//! fields written and read in one declared order. Encoding allocates exactly
//! `HEADER_SIZE + BODY_SIZE` bytes. Decoding refuses any body whose length is
//! not exactly `BODY_SIZE`.
//!
//! | Record   | Id  | Body                                   |
//! |----------|-----|----------------------------------------|
//! | LoginReq | 701 | user_id[16] password[16]               |
//! | LoginRes | 702 | error_code: i16                        |
//! | JoinReq  | 703 | user_id[16] password[16] user_name[16] |
//! | JoinRes  | 704 | error_code: i16                        |
//! | PingReq  | 705 | ping: i8                               |
//! | PingRes  | 706 | pong: i8                               |
//!
//! ## Fixed-length fields
//! User ids, passwords and names are zero-padded byte arrays, not strings.
//! [`FixedBytes::new`] silently truncates longer input to the field capacity,
//! matching what existing peers expect. [`FixedBytes::try_new`] rejects it with
//! [`ProtocolError::FieldTooLong`] instead.

use crate::core::cursor::{Reader, Writer};
use crate::core::header::{encode_header, PacketType, HEADER_SIZE};
use crate::error::{ProtocolError, Result};
use bytes::Bytes;
use std::fmt;

pub const PACKET_ID_LOGIN_REQ: i16 = 701;
pub const PACKET_ID_LOGIN_RES: i16 = 702;
pub const PACKET_ID_JOIN_REQ: i16 = 703;
pub const PACKET_ID_JOIN_RES: i16 = 704;
pub const PACKET_ID_PING_REQ: i16 = 705;
pub const PACKET_ID_PING_RES: i16 = 706;

pub const MAX_USER_ID_BYTE_LENGTH: usize = 16;
pub const MAX_USER_PW_BYTE_LENGTH: usize = 16;
pub const MAX_USER_NAME_BYTE_LENGTH: usize = 16;
/// Reserved for chat messages; no record uses it yet.
pub const MAX_CHAT_MESSAGE_BYTE_LENGTH: usize = 126;

pub const PING: i8 = 1;
pub const PONG: i8 = 8;

pub const ERROR_CODE_NONE: i16 = 0;

/// Zero-padded fixed-capacity byte field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedBytes<const N: usize>([u8; N]);

pub type UserId = FixedBytes<MAX_USER_ID_BYTE_LENGTH>;
pub type Password = FixedBytes<MAX_USER_PW_BYTE_LENGTH>;
pub type UserName = FixedBytes<MAX_USER_NAME_BYTE_LENGTH>;

impl<const N: usize> FixedBytes<N> {
    pub const CAPACITY: usize = N;

    /// Copy at most `N` bytes of `value`; anything beyond is dropped.
    pub fn new(value: impl AsRef<[u8]>) -> Self {
        let src = value.as_ref();
        let mut out = [0u8; N];
        let len = src.len().min(N);
        out[..len].copy_from_slice(&src[..len]);
        Self(out)
    }

    /// Like [`new`](Self::new) but fails when `value` does not fit.
    pub fn try_new(field: &'static str, value: impl AsRef<[u8]>) -> Result<Self> {
        let src = value.as_ref();
        if src.len() > N {
            return Err(ProtocolError::FieldTooLong {
                field,
                max: N,
                actual: src.len(),
            });
        }
        Ok(Self::new(src))
    }

    pub fn from_array(raw: [u8; N]) -> Self {
        Self(raw)
    }

    /// All `N` bytes, padding included.
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Bytes up to the first zero.
    pub fn trimmed(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(N);
        &self.0[..end]
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.trimmed()).into_owned()
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        Self([0u8; N])
    }
}

impl<const N: usize> From<&str> for FixedBytes<N> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<const N: usize> fmt::Debug for FixedBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

/// A fixed-layout record with a wire id.
pub trait Packet: Sized {
    const ID: i16;
    const BODY_SIZE: usize;
    const NAME: &'static str;

    fn write_body(&self, writer: &mut Writer<'_>) -> Result<()>;

    fn read_body(reader: &mut Reader<'_>) -> Result<Self>;

    /// Encoded frame length, header included.
    fn total_size() -> usize {
        HEADER_SIZE + Self::BODY_SIZE
    }

    /// Header plus body, in a buffer sized exactly to the frame.
    fn encode(&self) -> Result<Bytes> {
        let total = Self::total_size();
        let mut buf = vec![0u8; total];
        let mut writer = Writer::little_endian(&mut buf);
        encode_header(&mut writer, total as i16, Self::ID, PacketType::Normal.as_i8())?;
        self.write_body(&mut writer)?;
        Ok(Bytes::from(buf))
    }

    /// Decode a body (header already stripped) of exactly `BODY_SIZE` bytes.
    fn decode(body: &[u8]) -> Result<Self> {
        if body.len() != Self::BODY_SIZE {
            return Err(ProtocolError::MalformedBody {
                id: Self::ID,
                expected: Self::BODY_SIZE,
                actual: body.len(),
            });
        }
        let mut reader = Reader::little_endian(body);
        Self::read_body(&mut reader)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginReq {
    pub user_id: UserId,
    pub password: Password,
}

impl LoginReq {
    /// Truncates over-long values to 16 bytes.
    pub fn new(user_id: &str, password: &str) -> Self {
        Self {
            user_id: UserId::new(user_id),
            password: Password::new(password),
        }
    }

    pub fn try_new(user_id: &str, password: &str) -> Result<Self> {
        Ok(Self {
            user_id: UserId::try_new("user_id", user_id)?,
            password: Password::try_new("password", password)?,
        })
    }
}

impl Packet for LoginReq {
    const ID: i16 = PACKET_ID_LOGIN_REQ;
    const BODY_SIZE: usize = MAX_USER_ID_BYTE_LENGTH + MAX_USER_PW_BYTE_LENGTH;
    const NAME: &'static str = "LoginReq";

    fn write_body(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_bytes(self.user_id.as_bytes())?;
        writer.write_bytes(self.password.as_bytes())
    }

    fn read_body(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            user_id: FixedBytes::from_array(reader.read_array()?),
            password: FixedBytes::from_array(reader.read_array()?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoginRes {
    pub error_code: i16,
}

impl LoginRes {
    pub fn is_success(&self) -> bool {
        self.error_code == ERROR_CODE_NONE
    }
}

impl Packet for LoginRes {
    const ID: i16 = PACKET_ID_LOGIN_RES;
    const BODY_SIZE: usize = 2;
    const NAME: &'static str = "LoginRes";

    fn write_body(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_i16(self.error_code)
    }

    fn read_body(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            error_code: reader.read_i16()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JoinReq {
    pub user_id: UserId,
    pub password: Password,
    pub user_name: UserName,
}

impl JoinReq {
    /// Truncates over-long values to 16 bytes.
    pub fn new(user_id: &str, password: &str, user_name: &str) -> Self {
        Self {
            user_id: UserId::new(user_id),
            password: Password::new(password),
            user_name: UserName::new(user_name),
        }
    }

    pub fn try_new(user_id: &str, password: &str, user_name: &str) -> Result<Self> {
        Ok(Self {
            user_id: UserId::try_new("user_id", user_id)?,
            password: Password::try_new("password", password)?,
            user_name: UserName::try_new("user_name", user_name)?,
        })
    }
}

impl Packet for JoinReq {
    const ID: i16 = PACKET_ID_JOIN_REQ;
    const BODY_SIZE: usize =
        MAX_USER_ID_BYTE_LENGTH + MAX_USER_PW_BYTE_LENGTH + MAX_USER_NAME_BYTE_LENGTH;
    const NAME: &'static str = "JoinReq";

    fn write_body(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_bytes(self.user_id.as_bytes())?;
        writer.write_bytes(self.password.as_bytes())?;
        writer.write_bytes(self.user_name.as_bytes())
    }

    fn read_body(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            user_id: FixedBytes::from_array(reader.read_array()?),
            password: FixedBytes::from_array(reader.read_array()?),
            user_name: FixedBytes::from_array(reader.read_array()?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinRes {
    pub error_code: i16,
}

impl JoinRes {
    pub fn is_success(&self) -> bool {
        self.error_code == ERROR_CODE_NONE
    }
}

impl Packet for JoinRes {
    const ID: i16 = PACKET_ID_JOIN_RES;
    const BODY_SIZE: usize = 2;
    const NAME: &'static str = "JoinRes";

    fn write_body(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_i16(self.error_code)
    }

    fn read_body(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            error_code: reader.read_i16()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingReq {
    pub ping: i8,
}

impl Default for PingReq {
    fn default() -> Self {
        Self { ping: PING }
    }
}

impl Packet for PingReq {
    const ID: i16 = PACKET_ID_PING_REQ;
    const BODY_SIZE: usize = std::mem::size_of::<i8>();
    const NAME: &'static str = "PingReq";

    fn write_body(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_i8(self.ping)
    }

    fn read_body(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            ping: reader.read_i8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingRes {
    pub pong: i8,
}

impl Default for PingRes {
    fn default() -> Self {
        Self { pong: PONG }
    }
}

impl Packet for PingRes {
    const ID: i16 = PACKET_ID_PING_RES;
    const BODY_SIZE: usize = std::mem::size_of::<i8>();
    const NAME: &'static str = "PingRes";

    fn write_body(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_i8(self.pong)
    }

    fn read_body(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            pong: reader.read_i8()?,
        })
    }
}

/// Any known record, tagged by its wire id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    LoginReq(LoginReq),
    LoginRes(LoginRes),
    JoinReq(JoinReq),
    JoinRes(JoinRes),
    PingReq(PingReq),
    PingRes(PingRes),
}

impl Message {
    pub fn id(&self) -> i16 {
        match self {
            Message::LoginReq(_) => LoginReq::ID,
            Message::LoginRes(_) => LoginRes::ID,
            Message::JoinReq(_) => JoinReq::ID,
            Message::JoinRes(_) => JoinRes::ID,
            Message::PingReq(_) => PingReq::ID,
            Message::PingRes(_) => PingRes::ID,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Message::LoginReq(_) => LoginReq::NAME,
            Message::LoginRes(_) => LoginRes::NAME,
            Message::JoinReq(_) => JoinReq::NAME,
            Message::JoinRes(_) => JoinRes::NAME,
            Message::PingReq(_) => PingReq::NAME,
            Message::PingRes(_) => PingRes::NAME,
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        match self {
            Message::LoginReq(m) => m.encode(),
            Message::LoginRes(m) => m.encode(),
            Message::JoinReq(m) => m.encode(),
            Message::JoinRes(m) => m.encode(),
            Message::PingReq(m) => m.encode(),
            Message::PingRes(m) => m.encode(),
        }
    }

    /// Decode a body according to `id`.
    pub fn decode(id: i16, body: &[u8]) -> Result<Self> {
        match id {
            PACKET_ID_LOGIN_REQ => LoginReq::decode(body).map(Message::LoginReq),
            PACKET_ID_LOGIN_RES => LoginRes::decode(body).map(Message::LoginRes),
            PACKET_ID_JOIN_REQ => JoinReq::decode(body).map(Message::JoinReq),
            PACKET_ID_JOIN_RES => JoinRes::decode(body).map(Message::JoinRes),
            PACKET_ID_PING_REQ => PingReq::decode(body).map(Message::PingReq),
            PACKET_ID_PING_RES => PingRes::decode(body).map(Message::PingRes),
            other => Err(ProtocolError::UnknownMessageId(other)),
        }
    }

    /// Body size registered for `id`, if the id is known.
    pub fn body_size_of(id: i16) -> Option<usize> {
        match id {
            PACKET_ID_LOGIN_REQ => Some(LoginReq::BODY_SIZE),
            PACKET_ID_LOGIN_RES => Some(LoginRes::BODY_SIZE),
            PACKET_ID_JOIN_REQ => Some(JoinReq::BODY_SIZE),
            PACKET_ID_JOIN_RES => Some(JoinRes::BODY_SIZE),
            PACKET_ID_PING_REQ => Some(PingReq::BODY_SIZE),
            PACKET_ID_PING_RES => Some(PingRes::BODY_SIZE),
            _ => None,
        }
    }
}

macro_rules! impl_from_record {
    ($($record:ident),+) => {
        $(
            impl From<$record> for Message {
                fn from(value: $record) -> Self {
                    Message::$record(value)
                }
            }
        )+
    };
}

impl_from_record!(LoginReq, LoginRes, JoinReq, JoinRes, PingReq, PingRes);
