use std::{io, sync::Arc};

use shared::domain::{CatalogEntry, EntryId};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    client::CatalogService,
    config::ClientSettings,
    deletion::{DeletionController, DeletionTarget},
    editor::{EntryEditController, RemoteSave},
    error::{CatalogError, SubmitError, ViewError},
    events::{CatalogEvent, Toast},
    store::CatalogStore,
    table::{self, PageWindow, SortSpec, PAGE_SIZE_OPTIONS},
};

const EVENT_CAPACITY: usize = 64;

/// One catalog screen session.
///
/// Owns the store and both dialog controllers, turns user intents into store
/// mutations, and derives the visible table rows.
pub struct ViewCoordinator {
    store: CatalogStore,
    editor: EntryEditController,
    deletion: DeletionController,
    service: Arc<dyn CatalogService>,
    settings: ClientSettings,
    filter: String,
    sort: Option<SortSpec>,
    page: usize,
    rows_per_page: usize,
    events: broadcast::Sender<CatalogEvent>,
}

impl ViewCoordinator {
    pub fn new(service: Arc<dyn CatalogService>, settings: ClientSettings) -> Self {
        Self::with_editor(service, settings, EntryEditController::new())
    }

    pub fn with_editor(
        service: Arc<dyn CatalogService>,
        settings: ClientSettings,
        editor: EntryEditController,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let rows_per_page = if PAGE_SIZE_OPTIONS.contains(&settings.rows_per_page) {
            settings.rows_per_page
        } else {
            table::DEFAULT_PAGE_SIZE
        };
        Self {
            store: CatalogStore::new(),
            editor,
            deletion: DeletionController::new(),
            service,
            settings,
            filter: String::new(),
            sort: None,
            page: 0,
            rows_per_page,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Initial load. On failure the store keeps its previous contents.
    pub async fn init(&mut self) -> Result<usize, CatalogError> {
        match self.service.fetch_all().await {
            Ok(entries) => {
                self.store.load(entries);
                info!(count = self.store.len(), "view: catalog loaded");
                self.entries_changed();
                Ok(self.store.len())
            }
            Err(err) => {
                error!(error = %err, "view: failed to fetch catalog");
                Err(err)
            }
        }
    }

    pub fn dispose(&mut self) {
        self.editor.cancel();
        self.deletion.cancel();
        self.store.dispose();
        self.filter.clear();
        self.sort = None;
        self.page = 0;
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn editor(&self) -> &EntryEditController {
        &self.editor
    }

    /// Field edits go straight to the draft.
    pub fn editor_mut(&mut self) -> &mut EntryEditController {
        &mut self.editor
    }

    pub fn deletion(&self) -> &DeletionController {
        &self.deletion
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    // ---- derived view ----

    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
        self.page = 0;
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    pub fn set_rows_per_page(&mut self, rows: usize) -> Result<(), ViewError> {
        if !PAGE_SIZE_OPTIONS.contains(&rows) {
            return Err(ViewError::UnsupportedPageSize(rows));
        }
        self.rows_per_page = rows;
        self.page = 0;
        Ok(())
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// Zero-based; clamped to the last page.
    pub fn set_page(&mut self, page: usize) {
        let last = self.page_count() - 1;
        self.page = page.min(last);
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// All rows matching the filter, sorted; ignores paging.
    pub fn rows(&self) -> Vec<&CatalogEntry> {
        table::visible_rows(self.store.all(), &self.filter, self.sort)
    }

    pub fn page_window(&self) -> PageWindow {
        PageWindow {
            page: self.page,
            rows_per_page: self.rows_per_page,
            total: self.rows().len(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_window().page_count()
    }

    pub fn page_rows(&self) -> Vec<&CatalogEntry> {
        let rows = self.rows();
        let range = self.page_window().range();
        rows[range].to_vec()
    }

    pub fn page_report(&self) -> String {
        self.page_window().report()
    }

    /// Writes the filtered rows (every page) as CSV; returns the row count.
    pub fn export_csv<W: io::Write>(&self, writer: W) -> Result<usize, csv::Error> {
        let rows = self.rows();
        table::write_csv(writer, &rows)?;
        debug!(rows = rows.len(), filter = %self.filter, "view: exported csv");
        Ok(rows.len())
    }

    // ---- intents ----

    pub fn select(&mut self, ids: &[EntryId]) {
        self.store.select(ids);
    }

    pub fn open_new(&mut self) {
        self.store.set_in_edit(None);
        self.editor.open_for_create();
    }

    pub fn edit(&mut self, id: &EntryId) -> Result<(), ViewError> {
        let entry = self
            .store
            .get(id)
            .ok_or_else(|| ViewError::UnknownEntry(id.clone()))?;
        self.editor.open_for_edit(entry);
        self.store.set_in_edit(Some(id.clone()));
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editor.cancel();
        self.store.set_in_edit(None);
    }

    /// Saves the draft locally.
    pub fn save(&mut self) -> Result<CatalogEntry, SubmitError> {
        let is_update = self.draft_is_update();
        let saved = self.editor.submit(&mut self.store)?;
        self.after_save(is_update);
        Ok(saved)
    }

    /// Creates the draft through the catalog service.
    pub async fn save_remote(&mut self) -> Result<RemoteSave, SubmitError> {
        let is_update = self.draft_is_update();
        let result = self
            .editor
            .submit_remote(
                &mut self.store,
                self.service.as_ref(),
                self.settings.reconcile,
            )
            .await;

        match result {
            Ok(saved) => {
                self.after_save(is_update);
                Ok(saved)
            }
            Err(err @ SubmitError::Remote(_)) => {
                error!(error = %err, "view: failed to save product");
                self.notify(Toast::error(
                    "Failed to save product",
                    self.settings.toast_life_ms,
                ));
                Err(err)
            }
            Err(SubmitError::Validation(errors)) => Err(SubmitError::Validation(errors)),
            Err(err) => {
                warn!(error = %err, "view: draft not saved");
                Err(err)
            }
        }
    }

    pub fn confirm_delete(&mut self, id: &EntryId) -> Result<(), ViewError> {
        let entry = self
            .store
            .get(id)
            .ok_or_else(|| ViewError::UnknownEntry(id.clone()))?;
        self.deletion.request_single(entry);
        Ok(())
    }

    /// Returns `false` when nothing is selected.
    pub fn confirm_delete_selected(&mut self) -> bool {
        self.deletion.request_selection(&self.store)
    }

    pub fn reject_deletion(&mut self) {
        self.deletion.cancel();
    }

    /// Removes the pending target locally, then tells the service if enabled.
    /// Closes the edit dialog when its entry is among the removed ones.
    ///
    /// Local removal never waits on or depends on the remote result.
    pub async fn accept_deletion(&mut self) -> Vec<EntryId> {
        let plural = matches!(self.deletion.pending(), Some(DeletionTarget::Selection(_)));
        let removed = self.deletion.confirm(&mut self.store);
        if removed.is_empty() {
            return removed;
        }

        let editing_removed = self
            .editor
            .draft()
            .and_then(|draft| draft.id.as_ref())
            .is_some_and(|id| removed.contains(id));
        if editing_removed {
            debug!("view: entry under edit was deleted; closing the dialog");
            self.editor.cancel();
        }
        self.set_page(self.page);
        self.entries_changed();
        let detail = if plural {
            "Products Deleted"
        } else {
            "Product Deleted"
        };
        self.notify(Toast::success(detail, self.settings.toast_life_ms));

        if !self.settings.remote_delete {
            debug!(count = removed.len(), "view: remote delete disabled; removed locally only");
            return removed;
        }
        for id in &removed {
            match self.service.remove(id).await {
                Ok(()) => info!(%id, "view: remote delete acknowledged"),
                Err(err) => {
                    warn!(%id, error = %err, "view: remote delete failed");
                    self.notify(Toast::error(
                        format!("Failed to delete product {id}"),
                        self.settings.toast_life_ms,
                    ));
                }
            }
        }
        removed
    }

    fn draft_is_update(&self) -> bool {
        self.editor
            .draft()
            .is_some_and(|draft| draft.is_persisted())
    }

    fn after_save(&mut self, is_update: bool) {
        self.store.set_in_edit(None);
        self.entries_changed();
        let detail = if is_update {
            "Product Updated"
        } else {
            "Product Created"
        };
        self.notify(Toast::success(detail, self.settings.toast_life_ms));
    }

    fn entries_changed(&self) {
        let _ = self.events.send(CatalogEvent::EntriesChanged {
            count: self.store.len(),
        });
    }

    fn notify(&self, toast: Toast) {
        let _ = self.events.send(CatalogEvent::Toast(toast));
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
