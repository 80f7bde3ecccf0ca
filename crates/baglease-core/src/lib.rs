mod clock;
mod decision;
mod error;
mod identity;
mod lease;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decision::{AccessDecision, AccessMode};
pub use error::KeyError;
pub use identity::{ActorId, ResourceKey};
pub use lease::{LeaseInfo, LeaseKind};
