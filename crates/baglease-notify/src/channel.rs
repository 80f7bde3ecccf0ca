use baglease_core::ActorId;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{Notice, Notifier, NotifyError};

/// In-process notifier that hands notices to per-actor tokio channels.
///
/// Sending never blocks: channels are unbounded and the send path is
/// synchronous, so it is safe to call from the arbitrator's request
/// threads.
#[derive(Debug, Default)]
pub struct ChannelNotifier {
    inboxes: DashMap<ActorId, UnboundedSender<Notice>>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `actor` reachable. A second connect replaces the first inbox.
    pub fn connect(&self, actor: ActorId) -> Inbox {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.inboxes.insert(actor, tx).is_some() {
            tracing::debug!(%actor, "replaced existing inbox");
        }
        Inbox { actor, rx }
    }

    pub fn disconnect(&self, actor: ActorId) {
        self.inboxes.remove(&actor);
    }

    pub fn is_connected(&self, actor: ActorId) -> bool {
        self.inboxes
            .get(&actor)
            .is_some_and(|tx| !tx.is_closed())
    }

    pub fn connected_count(&self) -> usize {
        self.inboxes.len()
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, recipient: ActorId, notice: &Notice) -> Result<(), NotifyError> {
        let sent = match self.inboxes.get(&recipient) {
            Some(tx) => tx.send(notice.clone()).is_ok(),
            None => return Err(NotifyError::Unreachable(recipient)),
        };

        if sent {
            Ok(())
        } else {
            // Receiver dropped without disconnecting; forget the stale sender.
            self.inboxes.remove_if(&recipient, |_, tx| tx.is_closed());
            Err(NotifyError::Disconnected(recipient))
        }
    }
}

/// Receiving end handed to a connected actor.
#[derive(Debug)]
pub struct Inbox {
    actor: ActorId,
    rx: UnboundedReceiver<Notice>,
}

impl Inbox {
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    /// Waits for the next notice. `None` once the notifier side is gone.
    pub async fn recv(&mut self) -> Option<Notice> {
        self.rx.recv().await
    }

    /// Returns a queued notice without waiting.
    pub fn try_recv(&mut self) -> Option<Notice> {
        self.rx.try_recv().ok()
    }

    /// Drains everything currently queued.
    pub fn drain(&mut self) -> Vec<Notice> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
