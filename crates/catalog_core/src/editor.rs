//! Create/edit dialog lifecycle.
//!
//! The controller owns a private copy of the entry under edit; nothing reaches
//! the store until a submit succeeds.

use std::mem;

use rand::Rng;
use shared::{
    domain::{CatalogEntry, EntryId, InventoryStatus},
    protocol::{ImageUpload, NewEntryPayload, ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES},
};
use tracing::{info, warn};

use crate::{
    client::CatalogService,
    config::ReconcilePolicy,
    error::{CatalogError, FormField, SubmitError, ValidationErrors},
    store::CatalogStore,
};

pub const ID_LENGTH: usize = 5;
pub const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
pub const PLACEHOLDER_IMAGE: &str = "product-placeholder.svg";
/// Redraws allowed when a generated id is already taken.
pub const MAX_ID_ATTEMPTS: usize = 16;

pub trait IdGenerator: Send {
    fn next_id(&mut self) -> EntryId;
}

/// Draws `ID_LENGTH` characters uniformly from `ID_ALPHABET`.
#[derive(Debug, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&mut self) -> EntryId {
        generate_id(&mut rand::thread_rng())
    }
}

pub fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> EntryId {
    let id: String = (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    EntryId(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Description,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Price,
    Quantity,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rules {
    /// Name only; used by the local save path.
    Local,
    /// Name plus a valid image; used when creating through the service.
    Upload,
}

#[derive(Debug, Clone)]
pub struct Draft {
    entry: CatalogEntry,
    upload: Option<ImageUpload>,
    submitted: bool,
    rules: Rules,
    server_errors: ValidationErrors,
}

impl Draft {
    fn new(entry: CatalogEntry) -> Self {
        Self {
            entry,
            upload: None,
            submitted: false,
            rules: Rules::Local,
            server_errors: ValidationErrors::default(),
        }
    }

    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    pub fn upload(&self) -> Option<&ImageUpload> {
        self.upload.as_ref()
    }

    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if self.entry.name.trim().is_empty() {
            errors.push(FormField::Name, "Name is required.");
        }
        if self.rules == Rules::Upload {
            match &self.upload {
                None => errors.push(FormField::Image, "Image is required."),
                Some(upload) if upload.bytes.is_empty() => {
                    errors.push(FormField::Image, "Image is required.")
                }
                Some(upload) if upload.size_bytes() > MAX_IMAGE_BYTES => {
                    errors.push(FormField::Image, "Image must not exceed 4MB.")
                }
                Some(upload) if !upload.has_allowed_type() => errors.push(
                    FormField::Image,
                    format!(
                        "Image must be one of: {}.",
                        ALLOWED_IMAGE_TYPES.join(", ")
                    ),
                ),
                Some(_) => {}
            }
        }
        errors
    }
}

#[derive(Debug, Clone, Default)]
pub enum EditState {
    #[default]
    Closed,
    Open(Draft),
    Submitting(Draft),
}

/// Result of a create through the catalog service.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteSave {
    /// A single entry was written to the store.
    Stored(CatalogEntry),
    /// The store was reloaded from the service.
    Reloaded { entries: usize },
}

pub struct EntryEditController {
    state: EditState,
    ids: Box<dyn IdGenerator>,
}

impl Default for EntryEditController {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryEditController {
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(RandomIdGenerator))
    }

    pub fn with_id_generator(ids: Box<dyn IdGenerator>) -> Self {
        Self {
            state: EditState::Closed,
            ids,
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, EditState::Closed)
    }

    pub fn draft(&self) -> Option<&CatalogEntry> {
        match &self.state {
            EditState::Open(draft) | EditState::Submitting(draft) => Some(draft.entry()),
            EditState::Closed => None,
        }
    }

    pub fn upload(&self) -> Option<&ImageUpload> {
        match &self.state {
            EditState::Open(draft) | EditState::Submitting(draft) => draft.upload(),
            EditState::Closed => None,
        }
    }

    pub fn open_for_create(&mut self) {
        self.state = EditState::Open(Draft::new(CatalogEntry::empty()));
    }

    /// Edits a copy; the stored entry is untouched until submit succeeds.
    pub fn open_for_edit(&mut self, entry: &CatalogEntry) {
        self.state = EditState::Open(Draft::new(entry.clone()));
    }

    pub fn cancel(&mut self) {
        self.state = EditState::Closed;
    }

    pub fn set_text(&mut self, field: TextField, value: impl Into<String>) -> bool {
        let value = value.into();
        self.edit(|entry| match field {
            TextField::Name => entry.name = value,
            TextField::Description => entry.description = value,
            TextField::Image => entry.image = (!value.is_empty()).then_some(value),
        })
    }

    pub fn set_category(&mut self, category: Option<String>) -> bool {
        self.edit(|entry| entry.category = category)
    }

    /// Non-numeric, negative or non-finite input becomes `0`.
    pub fn set_numeric(&mut self, field: NumericField, raw: &str) -> bool {
        let value = coerce_number(raw);
        self.edit(|entry| match field {
            NumericField::Price => entry.price = value,
            NumericField::Quantity => entry.quantity = value as u32,
            NumericField::Rating => entry.rating = value as u32,
        })
    }

    pub fn set_inventory_status(&mut self, status: InventoryStatus) -> bool {
        self.edit(|entry| entry.inventory_status = status)
    }

    pub fn attach_image(&mut self, upload: ImageUpload) -> bool {
        match &mut self.state {
            EditState::Open(draft) => {
                draft.entry.image = Some(upload.file_name.clone());
                draft.upload = Some(upload);
                draft.server_errors = ValidationErrors::default();
                true
            }
            _ => false,
        }
    }

    /// Inline errors to render. Empty until the form has been submitted once.
    pub fn field_errors(&self) -> ValidationErrors {
        let EditState::Open(draft) = &self.state else {
            return ValidationErrors::default();
        };
        if !draft.submitted {
            return ValidationErrors::default();
        }
        let mut errors = draft.validate();
        for error in &draft.server_errors.0 {
            if errors.for_field(&error.field).is_none() {
                errors.push(error.field.clone(), error.message.clone());
            }
        }
        errors
    }

    /// Saves the draft into the store without contacting the service.
    ///
    /// A draft with an id replaces the stored entry; one without gets a fresh
    /// id and the placeholder image and is appended.
    pub fn submit(&mut self, store: &mut CatalogStore) -> Result<CatalogEntry, SubmitError> {
        let EditState::Open(draft) = &mut self.state else {
            return Err(SubmitError::NotOpen);
        };
        draft.submitted = true;
        draft.rules = Rules::Local;
        draft.validate().into_result()?;

        let entry = draft.entry.clone();
        let saved = commit_local(self.ids.as_mut(), entry, store)?;
        self.state = EditState::Closed;
        Ok(saved)
    }

    /// Creates the draft through `service`, then merges per `policy`.
    ///
    /// Drafts that already have an id are updates, which the service has no
    /// endpoint for; they are saved locally as in [`submit`](Self::submit).
    pub async fn submit_remote(
        &mut self,
        store: &mut CatalogStore,
        service: &dyn CatalogService,
        policy: ReconcilePolicy,
    ) -> Result<RemoteSave, SubmitError> {
        let EditState::Open(draft) = &mut self.state else {
            return Err(SubmitError::NotOpen);
        };
        if draft.entry.is_persisted() {
            return self.submit(store).map(RemoteSave::Stored);
        }

        draft.submitted = true;
        draft.rules = Rules::Upload;
        draft.server_errors = ValidationErrors::default();
        draft.validate().into_result()?;
        let Some(image) = draft.upload.clone() else {
            return Err(SubmitError::NotOpen);
        };
        let payload = NewEntryPayload {
            name: draft.entry.name.clone(),
            image,
        };

        let EditState::Open(draft) = mem::take(&mut self.state) else {
            return Err(SubmitError::NotOpen);
        };
        self.state = EditState::Submitting(draft);

        let created = match service.create(payload).await {
            Ok(created) => created,
            Err(err) => {
                self.reopen(|draft| {
                    if let CatalogError::Validation(errors) = &err {
                        draft.server_errors = errors.clone();
                    }
                });
                return Err(err.into());
            }
        };

        let draft_entry = match &self.state {
            EditState::Submitting(draft) => draft.entry.clone(),
            _ => return Err(SubmitError::NotOpen),
        };

        let outcome = match policy {
            ReconcilePolicy::KeepDraft => {
                commit_local(self.ids.as_mut(), draft_entry, store).map(RemoteSave::Stored)
            }
            ReconcilePolicy::AdoptServerEntry => match created {
                Some(entry) if entry.is_persisted() => store
                    .upsert(entry.clone())
                    .map(|_| RemoteSave::Stored(entry))
                    .map_err(SubmitError::from),
                _ => {
                    warn!("editor: service returned no usable entry; keeping local draft");
                    commit_local(self.ids.as_mut(), draft_entry, store).map(RemoteSave::Stored)
                }
            },
            ReconcilePolicy::Refetch => match service.fetch_all().await {
                Ok(entries) => {
                    store.load(entries);
                    Ok(RemoteSave::Reloaded {
                        entries: store.len(),
                    })
                }
                Err(err) => {
                    warn!(error = %err, "editor: reload after create failed; keeping local draft");
                    commit_local(self.ids.as_mut(), draft_entry, store).map(RemoteSave::Stored)
                }
            },
        };

        match outcome {
            Ok(saved) => {
                self.state = EditState::Closed;
                Ok(saved)
            }
            Err(err) => {
                self.reopen(|_| {});
                Err(err)
            }
        }
    }

    fn reopen(&mut self, adjust: impl FnOnce(&mut Draft)) {
        if let EditState::Submitting(mut draft) = mem::take(&mut self.state) {
            adjust(&mut draft);
            self.state = EditState::Open(draft);
        }
    }

    fn edit(&mut self, apply: impl FnOnce(&mut CatalogEntry)) -> bool {
        match &mut self.state {
            EditState::Open(draft) => {
                apply(&mut draft.entry);
                draft.server_errors = ValidationErrors::default();
                true
            }
            _ => false,
        }
    }
}

fn commit_local(
    ids: &mut dyn IdGenerator,
    mut entry: CatalogEntry,
    store: &mut CatalogStore,
) -> Result<CatalogEntry, SubmitError> {
    if entry.id.is_none() {
        entry.id = Some(unused_id(ids, store)?);
        entry.image = Some(PLACEHOLDER_IMAGE.to_string());
    }
    let outcome = store.upsert(entry.clone())?;
    info!(id = ?entry.id, ?outcome, "editor: draft saved");
    Ok(entry)
}

fn unused_id(ids: &mut dyn IdGenerator, store: &CatalogStore) -> Result<EntryId, SubmitError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = ids.next_id();
        if !store.contains(&candidate) {
            return Ok(candidate);
        }
        warn!(id = %candidate, "editor: generated id already in use; drawing again");
    }
    Err(SubmitError::IdSpaceExhausted {
        attempts: MAX_ID_ATTEMPTS,
    })
}

fn coerce_number(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod tests;
