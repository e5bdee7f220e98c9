use shared::domain::{CatalogEntry, EntryId};
use tracing::info;

use crate::store::CatalogStore;

#[derive(Debug, Clone, PartialEq)]
pub enum DeletionTarget {
    Single(CatalogEntry),
    /// Snapshot of the selection taken when confirmation was requested.
    Selection(Vec<EntryId>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DeletionState {
    #[default]
    Idle,
    ConfirmPending(DeletionTarget),
}

/// Confirm-then-delete flow for a single row or the current selection.
#[derive(Debug, Default)]
pub struct DeletionController {
    state: DeletionState,
}

impl DeletionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DeletionState {
        &self.state
    }

    pub fn pending(&self) -> Option<&DeletionTarget> {
        match &self.state {
            DeletionState::ConfirmPending(target) => Some(target),
            DeletionState::Idle => None,
        }
    }

    pub fn request_single(&mut self, entry: &CatalogEntry) {
        self.state = DeletionState::ConfirmPending(DeletionTarget::Single(entry.clone()));
    }

    /// Returns `false` and stays idle when nothing is selected.
    pub fn request_selection(&mut self, store: &CatalogStore) -> bool {
        let ids = store.selected_ids();
        if ids.is_empty() {
            return false;
        }
        self.state = DeletionState::ConfirmPending(DeletionTarget::Selection(ids));
        true
    }

    pub fn cancel(&mut self) {
        self.state = DeletionState::Idle;
    }

    pub fn confirmation_message(&self) -> Option<String> {
        match self.pending()? {
            DeletionTarget::Single(entry) => {
                Some(format!("Are you sure you want to delete {}?", entry.name))
            }
            DeletionTarget::Selection(_) => {
                Some("Are you sure you want to delete the selected products?".to_string())
            }
        }
    }

    /// Applies the pending deletion and returns the ids actually removed.
    pub fn confirm(&mut self, store: &mut CatalogStore) -> Vec<EntryId> {
        let DeletionState::ConfirmPending(target) = std::mem::take(&mut self.state) else {
            return Vec::new();
        };

        match target {
            DeletionTarget::Single(entry) => {
                let Some(id) = entry.id else {
                    return Vec::new();
                };
                if store.remove_by_id(&id) {
                    info!(%id, "deletion: entry removed");
                    vec![id]
                } else {
                    Vec::new()
                }
            }
            DeletionTarget::Selection(ids) => {
                let removed: Vec<EntryId> =
                    ids.into_iter().filter(|id| store.contains(id)).collect();
                store.remove_many(&removed);
                store.clear_selection();
                info!(count = removed.len(), "deletion: selected entries removed");
                removed
            }
        }
    }
}
