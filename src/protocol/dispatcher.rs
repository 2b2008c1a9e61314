use crate::error::{constants, ProtocolError, Result};
use crate::protocol::envelope::{Envelope, EnvelopeConsumer};
use crate::protocol::message::Packet;
use crate::transport::shutdown::Shutdown;
use crate::utils::metrics::Metrics;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, warn};

type HandlerFn = dyn Fn(&Envelope) -> Result<()> + Send + Sync + 'static;

/// Routes envelopes to handlers by message id.
///
/// Cloning is cheap; clones share one handler table.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<i16, Arc<HandlerFn>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a raw handler for `id`, replacing any previous one.
    ///
    /// Handlers may register or replace handlers themselves; the table lock
    /// is not held while a handler runs.
    pub fn register<F>(&self, id: i16, handler: F) -> Result<()>
    where
        F: Fn(&Envelope) -> Result<()> + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().map_err(|_| {
            ProtocolError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string())
        })?;

        handlers.insert(id, Arc::new(handler));
        Ok(())
    }

    /// Register a typed handler; the body is decoded as `T` first.
    pub fn on<T, F>(&self, handler: F) -> Result<()>
    where
        T: Packet + 'static,
        F: Fn(T) -> Result<()> + Send + Sync + 'static,
    {
        self.register(T::ID, move |envelope| handler(T::decode(&envelope.body)?))
    }

    pub fn is_registered(&self, id: i16) -> bool {
        self.handlers
            .read()
            .map(|handlers| handlers.contains_key(&id))
            .unwrap_or(false)
    }

    /// Run the handler registered for the envelope's id.
    pub fn dispatch(&self, envelope: &Envelope) -> Result<()> {
        let handler = {
            let handlers = self.handlers.read().map_err(|_| {
                ProtocolError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string())
            })?;
            handlers
                .get(&envelope.id)
                .cloned()
                .ok_or(ProtocolError::UnknownMessageId(envelope.id))?
        };

        handler(envelope)
    }

    /// Dispatch one envelope, logging and counting anything that goes wrong.
    ///
    /// Never fails: a bad message is dropped and the next one proceeds.
    pub fn handle(&self, envelope: &Envelope, metrics: &Metrics) {
        match self.dispatch(envelope) {
            Ok(()) => metrics.envelope_dispatched(),
            Err(ProtocolError::UnknownMessageId(id)) => {
                metrics.unknown_id();
                warn!(id, body_size = envelope.body_size, "No handler for message, dropped");
            }
            Err(e @ ProtocolError::MalformedBody { .. }) => {
                metrics.malformed_body();
                warn!(id = envelope.id, error = %e, "Malformed body, dropped");
            }
            Err(e) => {
                metrics.handler_error();
                error!(id = envelope.id, error = %e, "Handler failed");
            }
        }
    }

    /// Consumer loop: pop envelopes in order until the queue closes or
    /// shutdown is signalled.
    pub async fn run(&self, mut queue: EnvelopeConsumer, mut shutdown: Shutdown, metrics: Arc<Metrics>) {
        loop {
            let envelope = tokio::select! {
                _ = shutdown.recv() => {
                    debug!("Dispatch loop stopping on shutdown");
                    break;
                }
                next = queue.pop() => match next {
                    Some(envelope) => envelope,
                    None => {
                        debug!("Dispatch queue closed and drained");
                        break;
                    }
                },
            };

            self.handle(&envelope, &metrics);
        }
    }
}
