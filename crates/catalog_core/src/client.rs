use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response, StatusCode,
};
use shared::{
    domain::{CatalogEntry, EntryId},
    error::ApiError,
    protocol::{CreatedEntryResponse, EntryListResponse, NewEntryPayload},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::ClientSettings,
    error::{CatalogError, FormField, ValidationErrors},
};

const CATEGORY_PATH: &str = "category";

/// Remote catalog collaborator. All network access of the crate goes through here.
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<CatalogEntry>, CatalogError>;

    /// Returns the created entry when the service echoes one back.
    async fn create(&self, payload: NewEntryPayload)
        -> Result<Option<CatalogEntry>, CatalogError>;

    async fn remove(&self, id: &EntryId) -> Result<(), CatalogError>;
}

/// Stand-in used when no catalog endpoint is configured.
pub struct MissingCatalogService;

#[async_trait]
impl CatalogService for MissingCatalogService {
    async fn fetch_all(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        Err(CatalogError::Network(
            "catalog service is unavailable".into(),
        ))
    }

    async fn create(
        &self,
        _payload: NewEntryPayload,
    ) -> Result<Option<CatalogEntry>, CatalogError> {
        Err(CatalogError::Network(
            "catalog service is unavailable".into(),
        ))
    }

    async fn remove(&self, id: &EntryId) -> Result<(), CatalogError> {
        Err(CatalogError::Network(format!(
            "catalog service is unavailable; cannot delete {id}"
        )))
    }
}

pub struct HttpCatalogClient {
    http: Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn category_url(&self) -> String {
        format!("{}/{CATEGORY_PATH}", self.base_url)
    }

    /// `{base}/category/{id}` with the id percent-encoded as a single segment.
    fn entry_url(&self, id: &EntryId) -> Result<Url, CatalogError> {
        let invalid = || CatalogError::Network(format!("invalid catalog url {}", self.base_url));
        let mut url = Url::parse(&self.category_url()).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .push(id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl CatalogService for HttpCatalogClient {
    async fn fetch_all(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let response = self.http.get(self.category_url()).send().await?;
        let body = checked_body(response).await?;
        let entries = serde_json::from_slice::<EntryListResponse>(&body)?.into_entries();
        debug!(count = entries.len(), "catalog: fetched entries");
        Ok(entries)
    }

    async fn create(
        &self,
        payload: NewEntryPayload,
    ) -> Result<Option<CatalogEntry>, CatalogError> {
        let image = payload.image;
        let size_bytes = image.size_bytes();
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)
            .map_err(|e| {
                let mut errors = ValidationErrors::default();
                errors.push(FormField::Image, format!("invalid image type: {e}"));
                CatalogError::Validation(errors)
            })?;
        let form = Form::new().text("name", payload.name.clone()).part("image", part);

        let response = self
            .http
            .post(self.category_url())
            .multipart(form)
            .send()
            .await?;
        let body = checked_body(response).await?;
        info!(
            name = %payload.name,
            image = %image.file_name,
            size_bytes,
            "catalog: entry created"
        );

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        match serde_json::from_slice::<CreatedEntryResponse>(&body) {
            Ok(created) => Ok(Some(created.into_entry())),
            Err(err) => {
                debug!(error = %err, "catalog: create response carried no entry");
                Ok(None)
            }
        }
    }

    async fn remove(&self, id: &EntryId) -> Result<(), CatalogError> {
        let response = self
            .http
            .delete(self.entry_url(id)?)
            .send()
            .await?;
        checked_body(response).await?;
        Ok(())
    }
}

/// Maps the status line onto the error taxonomy and returns the raw body.
async fn checked_body(response: Response) -> Result<Vec<u8>, CatalogError> {
    let status = response.status();
    let body = response.bytes().await?;

    if status.is_success() {
        return Ok(body.to_vec());
    }
    if status.is_client_error() {
        return Err(CatalogError::Validation(rejection_errors(status, &body)));
    }

    warn!(%status, "catalog: service error");
    Err(CatalogError::Network(format!(
        "catalog service returned {status}"
    )))
}

fn rejection_errors(status: StatusCode, body: &[u8]) -> ValidationErrors {
    let api_error = serde_json::from_slice::<ApiError>(body).unwrap_or_default();
    let mut errors = ValidationErrors::default();
    for (field, message) in api_error.field_messages() {
        errors.push(FormField::from_wire(field), message);
    }
    if errors.is_empty() {
        let message = if api_error.message.is_empty() {
            format!("request rejected with status {status}")
        } else {
            api_error.message
        };
        errors.push(FormField::Other("request".into()), message);
    }
    errors
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
