//! # Client Session
//!
//! A session drives one connected stream with three tasks:
//!
//! - the **read loop** (the calling task) reads into the reassembler's free
//!   space, extracts every complete frame and pushes an [`Envelope`] per frame
//!   onto the dispatch queue;
//! - the **dispatch loop** pops envelopes in order and runs the registered
//!   handler for each;
//! - the **writer** owns the write half and sends encoded frames queued through
//!   a [`SessionSender`], one at a time, so frames never interleave.
//!
//! Every blocking point (read, push, pop, outbound receive) also waits on the
//! session's [`ShutdownSignal`], so a trigger from anywhere stops all three.
//! Frames already accepted by a [`SessionSender`] are still written before
//! the writer closes the stream.
//! Framing and transport errors end the session and are returned from
//! [`Session::run`]; message-level errors only drop the one message.

use crate::config::TransportConfig;
use crate::core::reassembler::FrameReassembler;
use crate::error::{ProtocolError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::protocol::envelope::{dispatch_queue, Envelope, EnvelopeProducer};
use crate::protocol::message::{Message, Packet};
use crate::transport::shutdown::{Shutdown, ShutdownSignal};
use crate::utils::metrics::Metrics;
use bytes::Bytes;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, trace, warn};

/// Connection-level callbacks.
///
/// `on_connect` runs once, after the writer and dispatch loop are up and
/// before the first read. `on_receive` sees every raw frame on the read task,
/// in stream order, before it is queued for dispatch.
pub trait SessionHandler: Send {
    fn on_connect(&mut self, _sender: &SessionSender) -> Result<()> {
        Ok(())
    }

    fn on_receive(&mut self, _raw_frame: &[u8]) {}
}

impl SessionHandler for () {}

/// Cloneable handle for queueing outbound frames.
#[derive(Debug, Clone)]
pub struct SessionSender {
    tx: mpsc::Sender<Bytes>,
    signal: ShutdownSignal,
}

impl SessionSender {
    /// Encode and queue a record, waiting while the outbound queue is full.
    pub async fn send<P: Packet>(&self, packet: &P) -> Result<()> {
        self.send_raw(packet.encode()?).await
    }

    pub async fn send_message(&self, message: &Message) -> Result<()> {
        self.send_raw(message.encode()?).await
    }

    /// Queue an already-encoded frame.
    pub async fn send_raw(&self, frame: Bytes) -> Result<()> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| ProtocolError::ConnectionClosed)
    }

    /// Encode and queue without waiting; for use from synchronous handlers.
    ///
    /// Fails with [`ProtocolError::Backpressure`] when the outbound queue is
    /// full.
    pub fn try_send<P: Packet>(&self, packet: &P) -> Result<()> {
        self.try_send_raw(packet.encode()?)
    }

    pub fn try_send_raw(&self, frame: Bytes) -> Result<()> {
        self.tx.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ProtocolError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => ProtocolError::ConnectionClosed,
        })
    }

    /// Ask the whole session to stop.
    pub fn close(&self) {
        self.signal.trigger();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One connected stream plus the tasks that serve it.
pub struct Session<S> {
    stream: S,
    dispatcher: Dispatcher,
    config: TransportConfig,
    metrics: Arc<Metrics>,
    signal: ShutdownSignal,
    sender: SessionSender,
    outbound: mpsc::Receiver<Bytes>,
    // Subscribed up front so a trigger before `run` is not missed.
    read_shutdown: Shutdown,
    dispatch_shutdown: Shutdown,
    write_shutdown: Shutdown,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(stream: S, dispatcher: Dispatcher) -> Self {
        Self::with_config(stream, dispatcher, &TransportConfig::default())
    }

    pub fn with_config(stream: S, dispatcher: Dispatcher, config: &TransportConfig) -> Self {
        let signal = ShutdownSignal::new();
        let (tx, outbound) = mpsc::channel(config.outbound_queue_capacity.max(1));
        let sender = SessionSender {
            tx,
            signal: signal.clone(),
        };

        Self {
            stream,
            dispatcher,
            config: config.clone(),
            metrics: Arc::new(Metrics::new()),
            read_shutdown: signal.subscribe(),
            dispatch_shutdown: signal.subscribe(),
            write_shutdown: signal.subscribe(),
            signal,
            sender,
            outbound,
        }
    }

    pub fn sender(&self) -> SessionSender {
        self.sender.clone()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Serve the stream until the peer closes it, shutdown is signalled or a
    /// fatal error occurs.
    ///
    /// Returns `Ok(())` for a clean close or shutdown. Envelopes already
    /// queued when the read loop stops are still dispatched, unless the stop
    /// was a shutdown.
    #[instrument(skip_all, name = "session")]
    pub async fn run<H: SessionHandler>(self, mut handler: H) -> Result<()> {
        let Session {
            stream,
            dispatcher,
            config,
            metrics,
            signal,
            sender,
            outbound,
            read_shutdown,
            dispatch_shutdown,
            write_shutdown,
        } = self;

        let (reader, writer) = tokio::io::split(stream);

        let writer_task = tokio::spawn(write_loop(
            writer,
            outbound,
            write_shutdown,
            signal.clone(),
            metrics.clone(),
        ));

        let (producer, consumer) = dispatch_queue(config.dispatch_queue_capacity);
        let dispatch_task = {
            let metrics = metrics.clone();
            tokio::spawn(async move { dispatcher.run(consumer, dispatch_shutdown, metrics).await })
        };

        let reassembler =
            FrameReassembler::with_limits(config.recv_buffer_size, config.max_packet_size);

        let read_result = match handler.on_connect(&sender) {
            Ok(()) => {
                debug!("Connected handler ran, starting read loop");
                read_loop(reader, reassembler, producer, &mut handler, read_shutdown, &metrics).await
            }
            Err(e) => {
                drop(producer);
                Err(e)
            }
        };

        if let Err(e) = &read_result {
            metrics.fatal_error();
            error!(error = %e, "Session terminated");
        }

        // The producer is gone, so the dispatch loop drains what was queued
        // and exits.
        if let Err(e) = dispatch_task.await {
            error!(error = %e, "Dispatch task panicked");
        }

        signal.trigger();
        let write_result = match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(ProtocolError::Custom(format!("Writer task panicked: {e}"))),
        };

        metrics.log_metrics();
        info!("Session closed");
        read_result.and(write_result)
    }
}

async fn read_loop<S, H>(
    mut reader: ReadHalf<S>,
    mut reassembler: FrameReassembler,
    producer: EnvelopeProducer,
    handler: &mut H,
    mut shutdown: Shutdown,
    metrics: &Metrics,
) -> Result<()>
where
    S: AsyncRead,
    H: SessionHandler,
{
    loop {
        let n = {
            let spare = reassembler.spare_capacity_mut();
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("Read loop stopping on shutdown");
                    return Ok(());
                }
                read = reader.read(spare) => read.map_err(ProtocolError::StreamRead)?,
            }
        };

        if n == 0 {
            if reassembler.readable() > 0 {
                warn!(pending = reassembler.readable(), "Peer closed mid-frame");
                return Err(ProtocolError::ConnectionClosed);
            }
            info!("Peer closed connection");
            return Ok(());
        }

        metrics.bytes_read(n as u64);
        reassembler.commit(n);

        loop {
            let envelope = match reassembler.next_frame()? {
                Some(frame) => {
                    handler.on_receive(frame);
                    metrics.frame_received();
                    Envelope::from_frame(frame)
                }
                None => break,
            };
            debug!(id = envelope.id, body_size = envelope.body_size, "Frame extracted");

            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("Read loop stopping on shutdown");
                    return Ok(());
                }
                pushed = producer.push(envelope) => pushed?,
            }
        }

        reassembler.compact();
    }
}

async fn write_loop<S: AsyncWrite>(
    mut writer: WriteHalf<S>,
    mut outbound: mpsc::Receiver<Bytes>,
    mut shutdown: Shutdown,
    signal: ShutdownSignal,
    metrics: Arc<Metrics>,
) -> Result<()> {
    let mut draining = false;
    loop {
        let next = if draining {
            outbound.recv().await
        } else {
            tokio::select! {
                biased;
                next = outbound.recv() => next,
                _ = shutdown.recv() => {
                    // Refuse new frames but still write the accepted ones.
                    outbound.close();
                    draining = true;
                    continue;
                }
            }
        };
        let Some(frame) = next else { break };

        let written = async {
            writer.write_all(&frame).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = written {
            metrics.fatal_error();
            error!(error = %e, "Write failed, closing session");
            signal.trigger();
            return Err(ProtocolError::StreamWrite(e));
        }
        metrics.frame_sent(frame.len() as u64);
        trace!(len = frame.len(), "Frame written");
    }

    if draining {
        debug!("Outbound queue drained after shutdown");
    }
    if let Err(e) = writer.shutdown().await {
        debug!(error = %e, "Write half shutdown failed");
    }
    Ok(())
}
