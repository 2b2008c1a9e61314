//! # Envelopes and the Dispatch Queue
//!
//! An [`Envelope`] is a frame's id and body copied off the receive buffer, so
//! the reassembler can compact and reuse that buffer while the envelope waits
//! in the queue.
//!
//! The dispatch queue is a bounded FIFO with exactly one producer (the read
//! loop) and one consumer (the dispatch loop). A push waits while the queue is
//! full, which holds back the read loop until the consumer catches up.

use crate::core::header::{peek_body, peek_id};
use crate::error::{ProtocolError, Result};
use bytes::Bytes;
use tokio::sync::mpsc;

/// Default number of envelopes the queue holds before pushes wait.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// A frame's id and an owned copy of its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub id: i16,
    /// Declared body size; zero or negative means "no body".
    pub body_size: i16,
    pub body: Bytes,
}

impl Envelope {
    /// Copy id and body out of a complete raw frame.
    pub fn from_frame(raw_frame: &[u8]) -> Self {
        let id = peek_id(raw_frame);
        let (body_size, body) = peek_body(raw_frame);
        Self {
            id,
            body_size,
            body: Bytes::copy_from_slice(body),
        }
    }

    pub fn has_body(&self) -> bool {
        self.body_size > 0
    }
}

/// Create a bounded dispatch queue.
pub fn dispatch_queue(capacity: usize) -> (EnvelopeProducer, EnvelopeConsumer) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EnvelopeProducer { tx }, EnvelopeConsumer { rx })
}

/// Producer half, owned by the read loop.
#[derive(Debug)]
pub struct EnvelopeProducer {
    tx: mpsc::Sender<Envelope>,
}

impl EnvelopeProducer {
    /// Push in FIFO order, waiting while the queue is full.
    pub async fn push(&self, envelope: Envelope) -> Result<()> {
        self.tx
            .send(envelope)
            .await
            .map_err(|_| ProtocolError::QueueClosed)
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer half, owned by the dispatch loop.
#[derive(Debug)]
pub struct EnvelopeConsumer {
    rx: mpsc::Receiver<Envelope>,
}

impl EnvelopeConsumer {
    /// Next envelope in push order; `None` once the producer is gone and the
    /// queue is drained.
    pub async fn pop(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    pub fn try_pop(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }
}
