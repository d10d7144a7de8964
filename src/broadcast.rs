//! Process-wide logout signal. The request client emits on it when a refresh
//! fails; the session store subscribes and ends the local session. Neither side
//! holds a reference to the other.

use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogoutReason {
    /// The refresh call failed; the server no longer recognizes the session.
    RefreshFailed,
    /// Some component asked for the session to end.
    Requested,
}

/// Cloneable publish/subscribe handle for forced logouts.
#[derive(Clone, Debug)]
pub struct LogoutBroadcast {
    sender: broadcast::Sender<LogoutReason>,
}

impl Default for LogoutBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl LogoutBroadcast {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publishes a logout event and returns how many subscribers were reached.
    /// Emitting with no subscribers is not an error.
    pub fn emit(&self, reason: LogoutReason) -> usize {
        let delivered = self.sender.send(reason).unwrap_or(0);
        debug!(?reason, delivered, "logout broadcast emitted");
        delivered
    }

    /// Subscribes to events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LogoutReason> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
