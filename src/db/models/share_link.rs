use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Operation classes a share link can authorize. Quantity adjustment is
/// governed by `Edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Edit,
    Delete,
    Toggle,
}

/// The four independent permission bits carried by a share link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub add: bool,
    pub edit: bool,
    pub delete: bool,
    pub toggle: bool,
}

impl CapabilitySet {
    pub fn allows(&self, op: Operation) -> bool {
        match op {
            Operation::Add => self.add,
            Operation::Edit => self.edit,
            Operation::Delete => self.delete,
            Operation::Toggle => self.toggle,
        }
    }
}

/// Capability-scoped expiring bearer token for one list. Whoever holds the
/// token gets the link's rights until `expires_at`; the link stores nothing
/// about its bearers. Expiry is computed, never stored.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShareLink {
    pub id: String,
    pub list_id: String,
    pub token: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub can_add: bool,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_toggle: bool,
}

impl ShareLink {
    pub fn is_active(&self, now: NaiveDateTime) -> bool {
        now < self.expires_at
    }

    pub fn capabilities(&self) -> CapabilitySet {
        CapabilitySet {
            add: self.can_add,
            edit: self.can_edit,
            delete: self.can_delete,
            toggle: self.can_toggle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_set_maps_each_operation() {
        let caps = CapabilitySet {
            add: true,
            toggle: true,
            ..Default::default()
        };
        assert!(caps.allows(Operation::Add));
        assert!(caps.allows(Operation::Toggle));
        assert!(!caps.allows(Operation::Edit));
        assert!(!caps.allows(Operation::Delete));
    }

    #[test]
    fn link_activity_is_computed_from_expiry() {
        let now = chrono::Utc::now().naive_utc();
        let link = ShareLink {
            id: "l1".into(),
            list_id: "lst".into(),
            token: "tok".into(),
            created_at: now,
            expires_at: now + chrono::Duration::minutes(1),
            can_add: false,
            can_edit: false,
            can_delete: false,
            can_toggle: false,
        };
        assert!(link.is_active(now));
        assert!(!link.is_active(now + chrono::Duration::minutes(2)));
        // Boundary: a link is inactive exactly at expires_at
        assert!(!link.is_active(link.expires_at));
    }
}
