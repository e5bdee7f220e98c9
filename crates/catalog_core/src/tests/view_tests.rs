use super::*;
use crate::editor::TextField;
use async_trait::async_trait;
use shared::{
    domain::{InventoryStatus, TagSeverity},
    protocol::{ImageUpload, NewEntryPayload},
};
use tokio::sync::{broadcast::error::TryRecvError, Mutex};

struct StubCatalogService {
    listing: Vec<CatalogEntry>,
    unreachable: bool,
    removed: Mutex<Vec<EntryId>>,
}

impl StubCatalogService {
    fn with(listing: Vec<CatalogEntry>) -> Self {
        Self {
            listing,
            unreachable: false,
            removed: Mutex::new(Vec::new()),
        }
    }

    fn unreachable() -> Self {
        Self {
            listing: Vec::new(),
            unreachable: true,
            removed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CatalogService for StubCatalogService {
    async fn fetch_all(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        if self.unreachable {
            return Err(CatalogError::Network("connection refused".into()));
        }
        Ok(self.listing.clone())
    }

    async fn create(
        &self,
        _payload: NewEntryPayload,
    ) -> Result<Option<CatalogEntry>, CatalogError> {
        if self.unreachable {
            return Err(CatalogError::Network("connection refused".into()));
        }
        Ok(None)
    }

    async fn remove(&self, id: &EntryId) -> Result<(), CatalogError> {
        if self.unreachable {
            return Err(CatalogError::Network("connection refused".into()));
        }
        self.removed.lock().await.push(id.clone());
        Ok(())
    }
}

fn entry(id: &str, name: &str) -> CatalogEntry {
    CatalogEntry {
        id: Some(EntryId::new(id)),
        name: name.into(),
        ..CatalogEntry::empty()
    }
}

fn numbered(count: usize) -> Vec<CatalogEntry> {
    (1..=count)
        .map(|n| entry(&format!("P{n:02}"), &format!("Product {n}")))
        .collect()
}

async fn loaded(listing: Vec<CatalogEntry>) -> ViewCoordinator {
    let mut view = ViewCoordinator::new(
        Arc::new(StubCatalogService::with(listing)),
        ClientSettings::default(),
    );
    view.init().await.expect("init");
    view
}

fn drain(rx: &mut broadcast::Receiver<CatalogEvent>) -> Vec<CatalogEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            Err(TryRecvError::Lagged(_)) => continue,
        }
    }
    events
}

fn toasts(events: &[CatalogEvent]) -> Vec<(TagSeverity, String)> {
    events
        .iter()
        .filter_map(|event| match event {
            CatalogEvent::Toast(toast) => Some((toast.severity, toast.detail.clone())),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn init_populates_store_and_announces_it() {
    let mut view = ViewCoordinator::new(
        Arc::new(StubCatalogService::with(numbered(3))),
        ClientSettings::default(),
    );
    let mut rx = view.subscribe_events();

    assert_eq!(view.init().await.expect("init"), 3);

    assert_eq!(view.store().len(), 3);
    assert_eq!(drain(&mut rx), vec![CatalogEvent::EntriesChanged { count: 3 }]);
}

#[tokio::test]
async fn failed_init_leaves_store_empty() {
    let mut view = ViewCoordinator::new(
        Arc::new(StubCatalogService::unreachable()),
        ClientSettings::default(),
    );
    let mut rx = view.subscribe_events();

    let err = view.init().await.expect_err("should fail");

    assert!(matches!(err, CatalogError::Network(_)));
    assert!(view.store().is_empty());
    assert_eq!(view.page_report(), "Showing 0 to 0 of 0 products");
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn filter_narrows_rows_case_insensitively() {
    let mut view = loaded(vec![entry("1", "Widget"), entry("2", "Gadget")]).await;

    view.set_filter("wid");

    let names: Vec<_> = view.rows().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, vec!["Widget"]);
    assert_eq!(view.store().len(), 2);
}

#[tokio::test]
async fn paging_uses_default_size_and_rejects_unknown_sizes() {
    let mut view = loaded(numbered(23)).await;
    assert_eq!(view.rows_per_page(), 10);
    assert_eq!(view.page_count(), 3);

    view.set_page(2);
    assert_eq!(view.page_rows().len(), 3);
    assert_eq!(view.page_report(), "Showing 21 to 23 of 23 products");

    assert_eq!(
        view.set_rows_per_page(7),
        Err(ViewError::UnsupportedPageSize(7))
    );
    view.set_rows_per_page(25).expect("page size");
    assert_eq!(view.page(), 0);
    assert_eq!(view.page_rows().len(), 23);

    view.set_page(99);
    assert_eq!(view.page(), 0);
}

#[tokio::test]
async fn changing_filter_returns_to_first_page() {
    let mut view = loaded(numbered(12)).await;
    view.set_rows_per_page(5).expect("page size");
    view.set_page(2);
    assert_eq!(view.page(), 2);

    view.set_filter("product 1");

    assert_eq!(view.page(), 0);
    assert_eq!(view.page_report(), "Showing 1 to 4 of 4 products");
}

#[tokio::test]
async fn sort_orders_visible_rows() {
    let mut view = loaded(vec![entry("b", "Banana"), entry("a", "apple"), entry("c", "Cherry")]).await;
    view.set_sort(SortSpec::parse("name:desc"));
    let names: Vec<_> = view.rows().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, vec!["Cherry", "Banana", "apple"]);

    view.clear_sort();
    assert_eq!(view.rows()[0].name, "Banana");
}

#[tokio::test]
async fn export_covers_filtered_rows_across_pages() {
    let mut listing = numbered(12);
    listing[0].inventory_status = InventoryStatus::OutOfStock;
    listing.push(entry("X1", "Gizmo"));
    let mut view = loaded(listing).await;
    view.set_rows_per_page(5).expect("page size");
    view.set_filter("product");

    let mut out = Vec::new();
    let written = view.export_csv(&mut out).expect("export");

    assert_eq!(written, 12);
    assert_eq!(view.page_rows().len(), 5);
    let text = String::from_utf8(out).expect("utf8");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "Code,Name,Status");
    assert_eq!(lines[1], "P01,Product 1,OUTOFSTOCK");
    assert_eq!(lines.len(), 13);
    assert!(!text.contains("Gizmo"));
}

#[tokio::test]
async fn bulk_delete_of_selection_clears_it() {
    let mut view = loaded(vec![entry("A1", "Widget"), entry("B2", "Gadget")]).await;
    let mut rx = view.subscribe_events();

    assert!(!view.confirm_delete_selected());
    view.select(&[EntryId::new("A1")]);
    assert!(view.confirm_delete_selected());
    let removed = view.accept_deletion().await;

    assert_eq!(removed, vec![EntryId::new("A1")]);
    assert!(view.store().all().iter().all(|e| e.id != Some(EntryId::new("A1"))));
    assert!(view.store().selected().is_empty());
    let events = drain(&mut rx);
    assert_eq!(toasts(&events), vec![(TagSeverity::Success, "Products Deleted".to_string())]);
}

#[tokio::test]
async fn rejected_deletion_keeps_entry() {
    let mut view = loaded(vec![entry("A1", "Widget")]).await;
    view.confirm_delete(&EntryId::new("A1")).expect("request");
    view.reject_deletion();

    assert!(view.accept_deletion().await.is_empty());
    assert_eq!(view.store().len(), 1);
    assert_eq!(
        view.confirm_delete(&EntryId::new("missing")),
        Err(ViewError::UnknownEntry(EntryId::new("missing")))
    );
}

#[tokio::test]
async fn remote_delete_is_sent_when_enabled() {
    let service = Arc::new(StubCatalogService::with(vec![entry("A1", "Widget")]));
    let settings = ClientSettings {
        remote_delete: true,
        ..ClientSettings::default()
    };
    let mut view = ViewCoordinator::new(service.clone(), settings);
    view.init().await.expect("init");

    view.confirm_delete(&EntryId::new("A1")).expect("request");
    view.accept_deletion().await;

    assert_eq!(*service.removed.lock().await, vec![EntryId::new("A1")]);
}

#[tokio::test]
async fn failed_remote_delete_still_removes_locally_and_warns() {
    let settings = ClientSettings {
        remote_delete: true,
        ..ClientSettings::default()
    };
    let mut view = ViewCoordinator::new(Arc::new(StubCatalogService::unreachable()), settings);
    view.editor_mut().open_for_create();
    view.editor_mut().set_text(TextField::Name, "Offline");
    let saved = view.save().expect("local save");
    let id = saved.id.expect("id");
    let mut rx = view.subscribe_events();

    view.confirm_delete(&id).expect("request");
    let removed = view.accept_deletion().await;

    assert_eq!(removed, vec![id.clone()]);
    assert!(view.store().is_empty());
    assert_eq!(
        toasts(&drain(&mut rx)),
        vec![
            (TagSeverity::Success, "Product Deleted".to_string()),
            (TagSeverity::Danger, format!("Failed to delete product {id}")),
        ]
    );
}

#[tokio::test]
async fn save_announces_create_and_update() {
    let mut view = loaded(vec![entry("A1", "Widget")]).await;
    let mut rx = view.subscribe_events();

    view.edit(&EntryId::new("A1")).expect("edit");
    assert_eq!(view.store().in_edit(), Some(&EntryId::new("A1")));
    view.editor_mut().set_text(TextField::Name, "Widget Pro");
    view.save().expect("update");
    assert!(view.store().in_edit().is_none());

    view.open_new();
    view.editor_mut().set_text(TextField::Name, "Gadget");
    view.save().expect("create");

    let names: Vec<_> = view.store().all().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, vec!["Widget Pro", "Gadget"]);
    assert_eq!(
        toasts(&drain(&mut rx)),
        vec![
            (TagSeverity::Success, "Product Updated".to_string()),
            (TagSeverity::Success, "Product Created".to_string()),
        ]
    );
}

#[tokio::test]
async fn validation_failure_has_no_toast() {
    let mut view = loaded(Vec::new()).await;
    let mut rx = view.subscribe_events();
    view.open_new();

    assert!(matches!(view.save(), Err(SubmitError::Validation(_))));

    assert!(view.editor().is_open());
    assert!(toasts(&drain(&mut rx)).is_empty());
}

#[tokio::test]
async fn remote_save_failure_shows_error_toast() {
    let mut view = ViewCoordinator::new(
        Arc::new(StubCatalogService::unreachable()),
        ClientSettings::default(),
    );
    let mut rx = view.subscribe_events();
    view.open_new();
    view.editor_mut().set_text(TextField::Name, "Shoes");
    view.editor_mut()
        .attach_image(ImageUpload::new("shoes.png", "image/png", vec![1, 2, 3]));

    let err = view.save_remote().await.expect_err("should fail");

    assert!(matches!(err, SubmitError::Remote(_)));
    assert!(view.editor().is_open());
    assert_eq!(
        toasts(&drain(&mut rx)),
        vec![(TagSeverity::Danger, "Failed to save product".to_string())]
    );
}

#[tokio::test]
async fn remote_save_without_open_dialog_has_no_toast() {
    let mut view = loaded(Vec::new()).await;
    let mut rx = view.subscribe_events();

    let err = view.save_remote().await.expect_err("should fail");

    assert!(matches!(err, SubmitError::NotOpen));
    assert!(toasts(&drain(&mut rx)).is_empty());
}

#[tokio::test]
async fn deleting_entry_under_edit_closes_dialog() {
    let mut view = loaded(vec![entry("A1", "Widget"), entry("B2", "Gadget")]).await;
    view.edit(&EntryId::new("A1")).expect("edit");
    view.editor_mut().set_text(TextField::Name, "Widget Pro");

    view.confirm_delete(&EntryId::new("A1")).expect("confirm");
    view.accept_deletion().await;

    assert!(!view.editor().is_open());
    assert!(matches!(view.save(), Err(SubmitError::NotOpen)));
    let names: Vec<_> = view.store().all().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, vec!["Gadget"]);
}

#[tokio::test]
async fn deleting_other_entry_keeps_dialog_open() {
    let mut view = loaded(vec![entry("A1", "Widget"), entry("B2", "Gadget")]).await;
    view.edit(&EntryId::new("A1")).expect("edit");

    view.confirm_delete(&EntryId::new("B2")).expect("confirm");
    view.accept_deletion().await;

    assert!(view.editor().is_open());
}

#[tokio::test]
async fn dispose_resets_session() {
    let mut view = loaded(numbered(4)).await;
    view.set_filter("product");
    view.open_new();

    view.dispose();

    assert!(view.store().is_empty());
    assert!(!view.editor().is_open());
    assert_eq!(view.filter(), "");
}
