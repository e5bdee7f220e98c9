//! Notifications published by the view coordinator.

use shared::domain::TagSeverity;

/// A transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub severity: TagSeverity,
    pub summary: String,
    pub detail: String,
    pub life_ms: u64,
}

impl Toast {
    pub fn success(detail: impl Into<String>, life_ms: u64) -> Self {
        Self {
            severity: TagSeverity::Success,
            summary: "Successful".into(),
            detail: detail.into(),
            life_ms,
        }
    }

    pub fn error(detail: impl Into<String>, life_ms: u64) -> Self {
        Self {
            severity: TagSeverity::Danger,
            summary: "Error".into(),
            detail: detail.into(),
            life_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// Store contents changed; carries the new entry count.
    EntriesChanged { count: usize },
    Toast(Toast),
}
