mod channel;
mod notice;

pub use channel::{ChannelNotifier, Inbox};
pub use notice::{Notice, NoticeKind};

use baglease_core::ActorId;
use thiserror::Error;

/// Why a notice could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// The actor has no delivery endpoint (offline, never connected).
    #[error("actor {0} is not reachable")]
    Unreachable(ActorId),

    /// The actor connected once but its receiving end is gone.
    #[error("actor {0} disconnected")]
    Disconnected(ActorId),
}

/// Outbound capability used by the arbitrator to reach one actor.
///
/// Implementations must return promptly: the arbitrator calls this on a
/// request thread and discards any error.
pub trait Notifier: Send + Sync {
    fn notify(&self, recipient: ActorId, notice: &Notice) -> Result<(), NotifyError>;
}

/// Drops every notice. The default when no delivery mechanism is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _recipient: ActorId, _notice: &Notice) -> Result<(), NotifyError> {
        Ok(())
    }
}
