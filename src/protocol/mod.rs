//! # Protocol Layer
//!
//! Message records, the envelope queue between the read and dispatch loops,
//! and the id-keyed dispatcher.

pub mod dispatcher;
pub mod envelope;
pub mod message;

#[cfg(test)]
mod tests;
