//! # Transport Layer
//!
//! TCP connection setup and the per-connection session that ties the
//! reassembler, dispatch queue and writer together.

pub mod session;
pub mod shutdown;
pub mod tcp;

pub use session::{Session, SessionHandler, SessionSender};
pub use shutdown::{Shutdown, ShutdownSignal};
