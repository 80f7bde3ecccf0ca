use serde::{Deserialize, Serialize};

use crate::lease::{LeaseInfo, LeaseKind};

/// The access right a caller should open its view with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Full read/write.
    Edit,
    /// Observation only; the owner is active on this page.
    ReadOnly,
}

impl AccessMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::ReadOnly => "read_only",
        }
    }
}

/// Outcome of an access request.
///
/// Contention is never an error: a denied request is still a well-formed
/// decision carrying the lease that caused it. Three shapes exist and the
/// constructors below are the only way to build them.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    granted: bool,
    mode: Option<AccessMode>,
    message: Option<String>,
    conflicting_lease: Option<LeaseInfo>,
}

impl AccessDecision {
    /// Full edit rights, nothing to explain.
    pub fn edit_granted() -> Self {
        Self {
            granted: true,
            mode: Some(AccessMode::Edit),
            message: None,
            conflicting_lease: None,
        }
    }

    /// Read-only view because `owner_lease` is active.
    pub fn read_only(owner_lease: LeaseInfo) -> Self {
        let message = format!(
            "This bag is in use by {}; opened in read-only mode.",
            owner_lease.holder_name
        );
        Self {
            granted: true,
            mode: Some(AccessMode::ReadOnly),
            message: Some(message),
            conflicting_lease: Some(owner_lease),
        }
    }

    /// Denied because `lease` holds the page.
    pub fn blocked(lease: LeaseInfo) -> Self {
        let message = match lease.kind {
            LeaseKind::Admin => format!(
                "This bag is being edited by admin {}; please try again later.",
                lease.holder_name
            ),
            LeaseKind::Owner => format!(
                "This bag is in use by {}; please try again later.",
                lease.holder_name
            ),
        };
        Self {
            granted: false,
            mode: None,
            message: Some(message),
            conflicting_lease: Some(lease),
        }
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }

    /// Granted mode; `None` when blocked.
    pub fn mode(&self) -> Option<AccessMode> {
        self.mode
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn conflicting_lease(&self) -> Option<&LeaseInfo> {
        self.conflicting_lease.as_ref()
    }

    pub fn is_edit_mode(&self) -> bool {
        self.granted && self.mode == Some(AccessMode::Edit)
    }

    pub fn is_read_only_mode(&self) -> bool {
        self.granted && self.mode == Some(AccessMode::ReadOnly)
    }

    pub fn is_blocked(&self) -> bool {
        !self.granted
    }

    /// Metric label for this decision.
    pub fn outcome_label(&self) -> &'static str {
        match self.mode {
            Some(mode) if self.granted => mode.as_str(),
            _ => "blocked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ActorId;

    fn lease(kind: LeaseKind) -> LeaseInfo {
        LeaseInfo::new(ActorId(3), "Alex", kind, 0)
    }

    #[test]
    fn test_edit_granted_shape() {
        let decision = AccessDecision::edit_granted();
        assert!(decision.is_granted());
        assert!(decision.is_edit_mode());
        assert!(!decision.is_read_only_mode());
        assert!(decision.message().is_none());
        assert!(decision.conflicting_lease().is_none());
        assert_eq!(decision.outcome_label(), "edit");
    }

    #[test]
    fn test_read_only_names_owner() {
        let decision = AccessDecision::read_only(lease(LeaseKind::Owner));
        assert!(decision.is_read_only_mode());
        assert!(decision.message().unwrap().contains("Alex"));
        assert_eq!(decision.conflicting_lease().unwrap().holder_id, ActorId(3));
        assert_eq!(decision.outcome_label(), "read_only");
    }

    #[test]
    fn test_blocked_message_depends_on_kind() {
        let by_admin = AccessDecision::blocked(lease(LeaseKind::Admin));
        let by_owner = AccessDecision::blocked(lease(LeaseKind::Owner));

        assert!(by_admin.is_blocked());
        assert_eq!(by_admin.mode(), None);
        assert!(by_admin.message().unwrap().contains("admin Alex"));
        assert!(!by_owner.message().unwrap().contains("admin"));
        assert_eq!(by_owner.outcome_label(), "blocked");
    }

    #[test]
    fn test_decision_json_field_names() {
        let decision = AccessDecision::read_only(lease(LeaseKind::Owner));
        let value = serde_json::to_value(decision).unwrap();
        assert_eq!(value["granted"], true);
        assert_eq!(value["mode"], "read_only");
        assert_eq!(value["conflicting_lease"]["kind"], "owner");
    }
}
