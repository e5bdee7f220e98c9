use std::fmt;

use shared::domain::EntryId;
use thiserror::Error;

/// Form fields that can carry an inline validation message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormField {
    Name,
    Image,
    /// A field the catalog service complained about that the form does not model.
    Other(String),
}

impl FormField {
    pub fn from_wire(name: &str) -> Self {
        match name {
            "name" => FormField::Name,
            "image" => FormField::Image,
            other => FormField::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormField::Name => f.write_str("name"),
            FormField::Image => f.write_str("image"),
            FormField::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FormField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: FormField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Inline form errors. Rendered next to their fields, never as notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid form: {}", summarize(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, field: FormField, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn for_field(&self, field: &FormField) -> Option<&str> {
        self.0
            .iter()
            .find(|error| &error.field == field)
            .map(|error| error.message.as_str())
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures talking to the remote catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog service unreachable: {0}")]
    Network(String),
    #[error("malformed catalog response: {0}")]
    Decode(String),
    #[error("catalog service rejected request: {0}")]
    Validation(ValidationErrors),
}

impl From<reqwest::Error> for CatalogError {
    fn from(value: reqwest::Error) -> Self {
        CatalogError::Network(value.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(value: serde_json::Error) -> Self {
        CatalogError::Decode(value.to_string())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("entry has no id and cannot be stored")]
    MissingId,
    #[error("entry {0} has a negative or non-finite price")]
    InvalidPrice(EntryId),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no entry is open for editing")]
    NotOpen,
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("could not generate an unused id after {attempts} attempts")]
    IdSpaceExhausted { attempts: usize },
    #[error(transparent)]
    Remote(CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CatalogError> for SubmitError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::Validation(errors) => SubmitError::Validation(errors),
            other => SubmitError::Remote(other),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("unsupported page size {0}; expected one of 5, 10, 25")]
    UnsupportedPageSize(usize),
    #[error("no catalog entry with id {0}")]
    UnknownEntry(EntryId),
}
