//! Session Metrics
//!
//! Atomic counters for one session: traffic in both directions, dispatch
//! outcomes and fatal errors. A [`Session`](crate::transport::session::Session)
//! owns one `Arc<Metrics>` shared by its read, dispatch and write tasks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

#[derive(Debug)]
pub struct Metrics {
    /// Frames extracted by the reassembler
    pub frames_received: AtomicU64,
    /// Raw bytes read from the stream
    pub bytes_received: AtomicU64,
    /// Frames written to the stream
    pub frames_sent: AtomicU64,
    /// Bytes written to the stream
    pub bytes_sent: AtomicU64,
    /// Envelopes handled successfully
    pub envelopes_dispatched: AtomicU64,
    /// Envelopes dropped for lack of a handler
    pub unknown_ids: AtomicU64,
    /// Envelopes dropped for a wrong body size
    pub malformed_bodies: AtomicU64,
    /// Handlers that returned an error
    pub handler_errors: AtomicU64,
    /// Framing or transport errors that ended the session
    pub fatal_errors: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            frames_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            envelopes_dispatched: AtomicU64::new(0),
            unknown_ids: AtomicU64::new(0),
            malformed_bodies: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
            fatal_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn bytes_read(&self, byte_count: u64) {
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_sent(&self, byte_count: u64) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn envelope_dispatched(&self) {
        self.envelopes_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unknown_id(&self) {
        self.unknown_ids.fetch_add(1, Ordering::Relaxed);
    }

    pub fn malformed_body(&self) {
        self.malformed_bodies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fatal_error(&self) {
        self.fatal_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            envelopes_dispatched: self.envelopes_dispatched.load(Ordering::Relaxed),
            unknown_ids: self.unknown_ids.load(Ordering::Relaxed),
            malformed_bodies: self.malformed_bodies.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            fatal_errors: self.fatal_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            frames_received = snapshot.frames_received,
            bytes_received = snapshot.bytes_received,
            frames_sent = snapshot.frames_sent,
            bytes_sent = snapshot.bytes_sent,
            envelopes_dispatched = snapshot.envelopes_dispatched,
            unknown_ids = snapshot.unknown_ids,
            malformed_bodies = snapshot.malformed_bodies,
            handler_errors = snapshot.handler_errors,
            fatal_errors = snapshot.fatal_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Session metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub bytes_received: u64,
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub envelopes_dispatched: u64,
    pub unknown_ids: u64,
    pub malformed_bodies: u64,
    pub handler_errors: u64,
    pub fatal_errors: u64,
    pub uptime_seconds: u64,
}
