use tokio::sync::broadcast;
use tracing::debug;

/// Shared trigger; every [`Shutdown`] subscribed to it observes one call to
/// [`trigger`](ShutdownSignal::trigger).
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    notify: broadcast::Sender<()>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self { notify }
    }

    /// Listener for this signal. Subscribe before the signal can fire.
    pub fn subscribe(&self) -> Shutdown {
        Shutdown::new(self.notify.subscribe())
    }

    pub fn trigger(&self) {
        debug!("Shutdown signalled");
        let _ = self.notify.send(());
    }
}

/// Per-task shutdown listener.
#[derive(Debug)]
pub struct Shutdown {
    is_shutdown: bool,
    notify: broadcast::Receiver<()>,
}

impl Shutdown {
    pub fn new(notify: broadcast::Receiver<()>) -> Shutdown {
        Shutdown {
            is_shutdown: false,
            notify,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown
    }

    /// Wait for the signal. Returns immediately once it has been seen, and
    /// also when every trigger has been dropped.
    pub async fn recv(&mut self) {
        if self.is_shutdown {
            return;
        }
        let _ = self.notify.recv().await;
        self.is_shutdown = true;
    }
}
