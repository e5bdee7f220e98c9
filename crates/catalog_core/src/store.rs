use std::collections::HashSet;

use shared::domain::{CatalogEntry, EntryId};
use tracing::warn;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

/// In-memory catalog for one screen session.
///
/// Entries keep insertion order. Every stored entry has an id and ids are
/// unique. The selection is always a subset of the stored ids.
#[derive(Debug, Default)]
pub struct CatalogStore {
    entries: Vec<CatalogEntry>,
    selection: Vec<EntryId>,
    in_edit: Option<EntryId>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all entries, the selection and the edit marker.
    pub fn dispose(&mut self) {
        self.entries.clear();
        self.selection.clear();
        self.in_edit = None;
    }

    /// Replaces the contents with `entries`, skipping ones without an id, ones
    /// with a negative or non-finite price, and later duplicates of an id
    /// already loaded.
    pub fn load(&mut self, entries: Vec<CatalogEntry>) {
        let mut seen = HashSet::with_capacity(entries.len());
        let mut loaded = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(id) = entry.id.clone() else {
                warn!(name = %entry.name, "store: skipping entry without id");
                continue;
            };
            if !valid_price(entry.price) {
                warn!(%id, price = entry.price, "store: skipping entry with invalid price");
                continue;
            }
            if !seen.insert(id.clone()) {
                warn!(%id, "store: skipping duplicate entry id");
                continue;
            }
            loaded.push(entry);
        }
        self.entries = loaded;
        self.prune();
    }

    /// Replaces the entry with the same id in place, or appends it.
    pub fn upsert(&mut self, entry: CatalogEntry) -> Result<UpsertOutcome, StoreError> {
        let id = entry.id.as_ref().ok_or(StoreError::MissingId)?;
        if !valid_price(entry.price) {
            return Err(StoreError::InvalidPrice(id.clone()));
        }
        match self.position(id) {
            Some(index) => {
                self.entries[index] = entry;
                Ok(UpsertOutcome::Replaced)
            }
            None => {
                self.entries.push(entry);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    /// Returns whether anything was removed. Unknown ids are ignored.
    pub fn remove_by_id(&mut self, id: &EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id.as_ref() != Some(id));
        let removed = self.entries.len() != before;
        if removed {
            self.prune();
        }
        removed
    }

    /// Returns how many entries were removed. Unknown ids are ignored.
    pub fn remove_many(&mut self, ids: &[EntryId]) -> usize {
        let targets: HashSet<&EntryId> = ids.iter().collect();
        let before = self.entries.len();
        self.entries.retain(|entry| {
            entry
                .id
                .as_ref()
                .map_or(true, |id| !targets.contains(id))
        });
        let removed = before - self.entries.len();
        if removed > 0 {
            self.prune();
        }
        removed
    }

    /// Replaces the selection. Ids not in the store are dropped.
    pub fn select(&mut self, ids: &[EntryId]) {
        let mut selection = Vec::with_capacity(ids.len());
        for id in ids {
            if self.contains(id) && !selection.contains(id) {
                selection.push(id.clone());
            }
        }
        self.selection = selection;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn all(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Selected entries in store order.
    pub fn selected(&self) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .id
                    .as_ref()
                    .is_some_and(|id| self.selection.contains(id))
            })
            .collect()
    }

    pub fn selected_ids(&self) -> Vec<EntryId> {
        self.selected()
            .into_iter()
            .filter_map(|entry| entry.id.clone())
            .collect()
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn get(&self, id: &EntryId) -> Option<&CatalogEntry> {
        self.position(id).map(|index| &self.entries[index])
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.position(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntryId> {
        self.entries.iter().filter_map(|entry| entry.id.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_in_edit(&mut self, id: Option<EntryId>) {
        self.in_edit = id;
    }

    pub fn in_edit(&self) -> Option<&EntryId> {
        self.in_edit.as_ref()
    }

    fn position(&self, id: &EntryId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id.as_ref() == Some(id))
    }

    fn prune(&mut self) {
        let present: HashSet<EntryId> = self.ids().cloned().collect();
        self.selection.retain(|id| present.contains(id));
        if self
            .in_edit
            .as_ref()
            .is_some_and(|id| !present.contains(id))
        {
            self.in_edit = None;
        }
    }
}

fn valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}
