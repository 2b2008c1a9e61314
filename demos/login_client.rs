//! Login client
//!
//! Connects to the configured server, sends a join request as soon as the
//! connection is up, logs in once the join succeeds and answers pings until
//! CTRL+C.
//!
//! ```text
//! cargo run --example login_client -- [config.toml]
//! ```

use packet_frame::config::NetworkConfig;
use packet_frame::error::Result;
use packet_frame::protocol::dispatcher::Dispatcher;
use packet_frame::protocol::message::{JoinReq, JoinRes, LoginReq, LoginRes, PingReq, PingRes};
use packet_frame::transport::tcp;
use packet_frame::utils::logging::init_logging;
use packet_frame::{SessionHandler, SessionSender};
use tracing::{error, info, warn};

const USER_ID: &str = "tuuna2983";
const PASSWORD: &str = "password";
const USER_NAME: &str = "tuuna";

struct LoginClient;

impl SessionHandler for LoginClient {
    fn on_connect(&mut self, sender: &SessionSender) -> Result<()> {
        info!(user = USER_ID, "Connected, sending join request");
        sender.try_send(&JoinReq::try_new(USER_ID, PASSWORD, USER_NAME)?)
    }
}

fn register_handlers(dispatcher: &Dispatcher, sender: &SessionSender) -> Result<()> {
    let login_sender = sender.clone();
    dispatcher.on::<JoinRes, _>(move |res| {
        if !res.is_success() {
            warn!(error_code = res.error_code, "Join rejected");
            return Ok(());
        }
        info!("Joined, logging in");
        login_sender.try_send(&LoginReq::try_new(USER_ID, PASSWORD)?)
    })?;

    dispatcher.on::<LoginRes, _>(|res| {
        if res.is_success() {
            info!("Login succeeded");
        } else {
            warn!(error_code = res.error_code, "Login failed");
        }
        Ok(())
    })?;

    let pong_sender = sender.clone();
    dispatcher.on::<PingReq, _>(move |req| {
        info!(ping = req.ping, "Ping");
        pong_sender.try_send(&PingRes::default())
    })?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => NetworkConfig::from_file(path)?,
        None => NetworkConfig::from_env()?,
    };
    config.validate_strict()?;

    let _guard = init_logging(&config.logging)?;

    let dispatcher = Dispatcher::new();
    let session = tcp::connect_session(&config, dispatcher.clone()).await?;
    register_handlers(&dispatcher, &session.sender())?;

    let signal = session.shutdown_signal();
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received CTRL+C signal, shutting down");
            signal.trigger();
        }
    });

    if let Err(e) = session.run(LoginClient).await {
        error!(error = %e, "Session ended with error");
        return Err(e);
    }
    Ok(())
}
