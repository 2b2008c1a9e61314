//! # Error Types
//!
//! Error handling for the framing layer, the packet codec and the session.
//!
//! ## Error Categories
//! - **Cursor errors**: reads or writes past the end of a buffer
//! - **Framing errors**: oversized or impossible frame lengths (fatal to a session)
//! - **Message errors**: wrong body size, unknown id (the message is dropped)
//! - **Transport errors**: stream read/write failures (fatal to a session)
//! - **Configuration errors**: invalid or unreadable settings
//!
//! Framing and transport errors end a session. Message errors are recovered
//! locally by dropping the offending envelope; [`ProtocolError::is_fatal`]
//! tells the two classes apart.
//!
//! ## Example Usage
//! ```rust
//! use packet_frame::core::cursor::{ByteOrder, Reader};
//! use packet_frame::error::ProtocolError;
//!
//! let mut reader = Reader::new(&[0x01], ByteOrder::Little);
//! match reader.read_u16() {
//!     Err(ProtocolError::BufferUnderflow { needed, remaining }) => {
//!         assert_eq!((needed, remaining), (2, 1));
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Static messages shared by log lines and error paths.
pub mod constants {
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    pub const ERR_FRAME_TOO_LARGE: &str = "Frame exceeds maximum packet size";
    pub const ERR_INVALID_FRAME_LENGTH: &str = "Frame length shorter than header";
}

/// Primary error type for all framing, codec and session operations.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Buffer underflow: needed {needed} bytes, {remaining} remaining")]
    BufferUnderflow { needed: usize, remaining: usize },

    #[error("Buffer overflow: needed {needed} bytes, {remaining} remaining")]
    BufferOverflow { needed: usize, remaining: usize },

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("Invalid frame length: {0} bytes")]
    InvalidFrameLength(usize),

    #[error("Malformed body for message {id}: expected {expected} bytes, got {actual}")]
    MalformedBody {
        id: i16,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown message id: {0}")]
    UnknownMessageId(i16),

    #[error("Field {field} too long: {actual} bytes (max {max})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("Stream read error: {0}")]
    StreamRead(#[source] io::Error),

    #[error("Stream write error: {0}")]
    StreamWrite(#[source] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Dispatch queue closed")]
    QueueClosed,

    #[error("Outbound queue full")]
    Backpressure,

    #[error("Timeout occurred")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl ProtocolError {
    /// Whether this error terminates the session that produced it.
    ///
    /// Framing and transport failures are fatal. Per-message failures are
    /// recovered by dropping the message.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ProtocolError::BufferUnderflow { .. }
                | ProtocolError::MalformedBody { .. }
                | ProtocolError::UnknownMessageId(_)
                | ProtocolError::FieldTooLong { .. }
                | ProtocolError::InvalidUtf8
                | ProtocolError::Backpressure
                | ProtocolError::Custom(_)
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(ProtocolError::FrameTooLarge(2048).is_fatal());
        assert!(ProtocolError::InvalidFrameLength(3).is_fatal());
        assert!(ProtocolError::StreamRead(io::ErrorKind::BrokenPipe.into()).is_fatal());
        assert!(ProtocolError::ConnectionClosed.is_fatal());

        assert!(!ProtocolError::UnknownMessageId(999).is_fatal());
        assert!(!ProtocolError::MalformedBody {
            id: 702,
            expected: 2,
            actual: 3
        }
        .is_fatal());
        assert!(!ProtocolError::BufferUnderflow {
            needed: 2,
            remaining: 0
        }
        .is_fatal());
    }

    #[test]
    fn test_display_messages() {
        let err = ProtocolError::MalformedBody {
            id: 701,
            expected: 32,
            actual: 31,
        };
        assert_eq!(
            err.to_string(),
            "Malformed body for message 701: expected 32 bytes, got 31"
        );
        assert_eq!(
            ProtocolError::FrameTooLarge(1025).to_string(),
            "Frame too large: 1025 bytes"
        );
    }
}
