//! # Byte Cursor
//!
//! Positioned, bounds-checked views over a fixed byte buffer.
//!
//! [`Reader`] borrows a buffer immutably and [`Writer`] borrows one mutably;
//! neither allocates. Each cursor carries a [`ByteOrder`] chosen at
//! construction and fixed for its lifetime.
//!
//! A failed read or write never moves the position, so a caller can inspect
//! the cursor after an error and retry with a larger buffer.
//!
//! ## Strings
//! Strings are a `u16` length prefix (in the cursor's byte order) followed by
//! that many UTF-8 bytes. [`Writer::write_string`] produces exactly what
//! [`Reader::read_string`] consumes.

use crate::error::{ProtocolError, Result};

/// Byte order used for multi-byte integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Least significant byte first (the wire order of every frame)
    #[default]
    Little,
    /// Most significant byte first
    Big,
}

macro_rules! read_int {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self) -> Result<$ty> {
            const N: usize = std::mem::size_of::<$ty>();
            let raw: [u8; N] = self.take::<N>()?;
            Ok(match self.order {
                ByteOrder::Little => <$ty>::from_le_bytes(raw),
                ByteOrder::Big => <$ty>::from_be_bytes(raw),
            })
        }
    };
}

macro_rules! write_int {
    ($(#[$doc:meta])* $name:ident, $ty:ty) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, value: $ty) -> Result<()> {
            let raw = match self.order {
                ByteOrder::Little => value.to_le_bytes(),
                ByteOrder::Big => value.to_be_bytes(),
            };
            self.write_bytes(&raw)
        }
    };
}

/// Sequential reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8], order: ByteOrder) -> Self {
        Self { buf, pos: 0, order }
    }

    /// Little-endian reader, the layout used for every frame on the wire.
    pub fn little_endian(buf: &'a [u8]) -> Self {
        Self::new(buf, ByteOrder::Little)
    }

    pub fn big_endian(buf: &'a [u8]) -> Self {
        Self::new(buf, ByteOrder::Big)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// The whole underlying buffer, independent of position.
    pub fn get_ref(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(ProtocolError::BufferUnderflow { needed, remaining });
        }
        Ok(())
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buf[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    read_int!(read_u16, u16);
    read_int!(read_i16, i16);
    read_int!(read_u32, u32);
    read_int!(read_i32, i32);
    read_int!(read_u64, u64);
    read_int!(read_i64, i64);

    /// True only when the next byte is exactly `1`.
    ///
    /// Any other value, and a read past the end, yields `false`. The position
    /// advances only when a byte was actually available.
    pub fn read_bool(&mut self) -> bool {
        matches!(self.read_u8(), Ok(1))
    }

    /// Borrow the next `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Read a fixed-size array, e.g. a zero-padded name field.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.take::<N>()
    }

    /// Length-prefixed UTF-8 string.
    ///
    /// Leaves the position untouched if either the prefix or the payload is
    /// incomplete.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let start = self.pos;
        let len = self.read_u16()? as usize;
        let bytes = match self.read_bytes(len) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.pos = start;
                return Err(e);
            }
        };
        std::str::from_utf8(bytes).map_err(|_| {
            self.pos = start;
            ProtocolError::InvalidUtf8
        })
    }
}

/// Sequential writer over a borrowed, pre-sized mutable buffer.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8], order: ByteOrder) -> Self {
        Self { buf, pos: 0, order }
    }

    pub fn little_endian(buf: &'a mut [u8]) -> Self {
        Self::new(buf, ByteOrder::Little)
    }

    pub fn big_endian(buf: &'a mut [u8]) -> Self {
        Self::new(buf, ByteOrder::Big)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// True once every byte of the buffer has been written.
    pub fn is_full(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Copy `bytes` verbatim at the current position.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let remaining = self.remaining();
        if bytes.len() > remaining {
            return Err(ProtocolError::BufferOverflow {
                needed: bytes.len(),
                remaining,
            });
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    #[inline]
    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_u8(value as u8)
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    write_int!(write_u16, u16);
    write_int!(write_i16, i16);
    write_int!(write_u32, u32);
    write_int!(write_i32, i32);
    write_int!(write_u64, u64);
    write_int!(write_i64, i64);

    /// Length-prefixed string, the inverse of [`Reader::read_string`].
    ///
    /// Fails without writing anything if the prefix and payload do not both
    /// fit, or if the string is longer than a `u16` prefix can describe.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let len = u16::try_from(value.len()).map_err(|_| ProtocolError::FieldTooLong {
            field: "string",
            max: u16::MAX as usize,
            actual: value.len(),
        })?;
        let needed = 2 + value.len();
        let remaining = self.remaining();
        if needed > remaining {
            return Err(ProtocolError::BufferOverflow { needed, remaining });
        }
        self.write_u16(len)?;
        self.write_bytes(value.as_bytes())
    }
}
