//! # Core Framing Components
//!
//! Low-level byte handling, frame headers and stream reassembly.
//!
//! ## Components
//! - **Cursor**: bounds-checked, endianness-explicit reads and writes
//! - **Header**: the fixed 5-byte frame header
//! - **Reassembler**: fragmented stream bytes in, complete frames out
//! - **Codec**: the same framing as a `tokio_util` codec
//!
//! ## Wire Format
//! ```text
//! [TotalSize(2, LE)] [Id(2, LE)] [Type(1)] [Body(TotalSize - 5)]
//! ```
//!
//! ## Limits
//! - Maximum frame size: 1024 bytes, header included
//! - Receive buffer: 4096 bytes, compacted after every read

pub mod codec;
pub mod cursor;
pub mod header;
pub mod reassembler;

/// Largest frame accepted from the stream, header included.
pub const MAX_PACKET_SIZE: usize = 1024;

/// Default receive buffer size.
pub const MAX_BUFFER: usize = 4096;
