use serde::{Deserialize, Serialize};

use crate::domain::CatalogEntry;

/// Largest image the catalog service accepts, in bytes.
pub const MAX_IMAGE_BYTES: usize = 4096 * 1024;

pub const ALLOWED_IMAGE_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/jpg",
    "image/ico",
    "image/webp",
];

/// Binary image attached to a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn has_allowed_type(&self) -> bool {
        let mime = self.mime_type.trim().to_ascii_lowercase();
        ALLOWED_IMAGE_TYPES.contains(&mime.as_str())
    }
}

/// Multipart body of `POST /category`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntryPayload {
    pub name: String,
    pub image: ImageUpload,
}

/// `GET /category` body: either a bare array or a `{ "data": [...] }` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryListResponse {
    Bare(Vec<CatalogEntry>),
    Wrapped { data: Vec<CatalogEntry> },
}

impl EntryListResponse {
    pub fn into_entries(self) -> Vec<CatalogEntry> {
        match self {
            EntryListResponse::Bare(entries) | EntryListResponse::Wrapped { data: entries } => {
                entries
            }
        }
    }
}

/// `POST /category` body when the service echoes the created entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatedEntryResponse {
    Wrapped { data: CatalogEntry },
    Bare(CatalogEntry),
}

impl CreatedEntryResponse {
    pub fn into_entry(self) -> CatalogEntry {
        match self {
            CreatedEntryResponse::Wrapped { data } | CreatedEntryResponse::Bare(data) => data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_accepts_envelope_and_bare_array() {
        let bare: EntryListResponse =
            serde_json::from_str(r#"[{"id": 1, "name": "Shoes"}]"#).expect("bare");
        let wrapped: EntryListResponse =
            serde_json::from_str(r#"{"data": [{"id": 1, "name": "Shoes"}]}"#).expect("wrapped");
        assert_eq!(bare.into_entries().len(), 1);
        assert_eq!(wrapped.into_entries()[0].name, "Shoes");
    }

    #[test]
    fn created_response_prefers_data_envelope() {
        let created: CreatedEntryResponse =
            serde_json::from_str(r#"{"data": {"id": 9, "name": "Bags"}}"#).expect("wrapped");
        assert_eq!(created.into_entry().name, "Bags");
    }

    #[test]
    fn image_type_check_is_case_insensitive() {
        let upload = ImageUpload::new("a.PNG", "IMAGE/PNG", vec![1, 2, 3]);
        assert!(upload.has_allowed_type());
        assert!(!ImageUpload::new("a.txt", "text/plain", vec![1]).has_allowed_type());
    }
}
