use crate::config::{ClientConfig, NetworkConfig};
use crate::core::codec::FrameCodec;
use crate::error::{ProtocolError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::transport::session::Session;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{info, instrument};

/// Dial the configured server once. No retry.
#[instrument(skip(config), fields(address = %config.address))]
pub async fn connect(config: &ClientConfig) -> Result<TcpStream> {
    let stream = timeout(config.connection_timeout, TcpStream::connect(&config.address))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    stream.set_nodelay(config.nodelay)?;
    info!("Connected");
    Ok(stream)
}

/// Dial and wrap the stream in a [`FrameCodec`] for `Stream`/`Sink` use.
pub async fn connect_framed(config: &ClientConfig) -> Result<Framed<TcpStream, FrameCodec>> {
    let stream = connect(config).await?;
    Ok(Framed::new(stream, FrameCodec::new()))
}

/// Dial and build a session around the stream; call
/// [`Session::run`] to start serving it.
pub async fn connect_session(
    config: &NetworkConfig,
    dispatcher: Dispatcher,
) -> Result<Session<TcpStream>> {
    let stream = connect(&config.client).await?;
    Ok(Session::with_config(stream, dispatcher, &config.transport))
}
