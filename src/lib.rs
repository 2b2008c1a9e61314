//! # Packet Frame
//!
//! Length-prefixed binary framing over TCP with fixed-layout records.
//!
//! Every frame starts with a 5-byte little-endian header:
//!
//! | offset | type | field                          |
//! |--------|------|--------------------------------|
//! | 0      | u16  | total size (header + body)     |
//! | 2      | i16  | message id                     |
//! | 4      | i8   | packet type (0 normal)         |
//!
//! ## Layers
//! - [`core::cursor`]: bounds-checked reads and writes over byte slices
//! - [`core::header`]: header encode/decode and zero-copy peeks
//! - [`core::reassembler`]: turns a byte stream into whole frames
//! - [`core::codec`]: the same framing as a `tokio_util` codec
//! - [`protocol::message`]: the record set and its id registry
//! - [`protocol::envelope`] / [`protocol::dispatcher`]: the single-producer,
//!   single-consumer hand-off from the read loop to message handlers
//! - [`transport`]: TCP connect and the per-connection [`Session`]
//!
//! ## Example
//! ```no_run
//! use packet_frame::config::NetworkConfig;
//! use packet_frame::protocol::dispatcher::Dispatcher;
//! use packet_frame::protocol::message::LoginRes;
//! use packet_frame::transport::tcp;
//!
//! # async fn demo() -> packet_frame::Result<()> {
//! let config = NetworkConfig::default();
//! let dispatcher = Dispatcher::new();
//! dispatcher.on::<LoginRes, _>(|res| {
//!     tracing::info!(success = res.is_success(), "Login result");
//!     Ok(())
//! })?;
//!
//! let session = tcp::connect_session(&config, dispatcher).await?;
//! session.run(()).await
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use error::{ProtocolError, Result};
pub use transport::{Session, SessionHandler, SessionSender};
