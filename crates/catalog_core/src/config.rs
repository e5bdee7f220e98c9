use std::{collections::HashMap, fs, path::Path, time::Duration};

use url::Url;

use crate::table::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};

pub const SETTINGS_FILE: &str = "catalog.toml";

/// How a successfully created entry is merged back into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// Keep the local draft under a client-generated id; ignore the response.
    KeepDraft,
    /// Store the entry the service echoed back, falling back to the draft.
    AdoptServerEntry,
    /// Reload the whole list from the service.
    #[default]
    Refetch,
}

impl ReconcilePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_draft" => Some(ReconcilePolicy::KeepDraft),
            "adopt_server_entry" | "adopt" => Some(ReconcilePolicy::AdoptServerEntry),
            "refetch" => Some(ReconcilePolicy::Refetch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub rows_per_page: usize,
    pub reconcile: ReconcilePolicy,
    pub remote_delete: bool,
    pub toast_life_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api".into(),
            request_timeout_secs: 10,
            rows_per_page: DEFAULT_PAGE_SIZE,
            reconcile: ReconcilePolicy::Refetch,
            remote_delete: false,
            toast_life_ms: 3000,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Reads `path` (if present) and then applies overrides from `env`.
///
/// Unparsable values are ignored and the previous value kept.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                for (key, value) in file_cfg {
                    let value = match value {
                        toml::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    apply(&mut settings, &key, &value);
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("CATALOG_API_URL") {
        apply(&mut settings, "api_base_url", &v);
    }
    for (var, key) in [
        ("APP__API_BASE_URL", "api_base_url"),
        ("APP__REQUEST_TIMEOUT_SECS", "request_timeout_secs"),
        ("APP__ROWS_PER_PAGE", "rows_per_page"),
        ("APP__RECONCILE", "reconcile"),
        ("APP__REMOTE_DELETE", "remote_delete"),
        ("APP__TOAST_LIFE_MS", "toast_life_ms"),
    ] {
        if let Some(v) = env(var) {
            apply(&mut settings, key, &v);
        }
    }

    settings
}

fn apply(settings: &mut ClientSettings, key: &str, value: &str) {
    match key {
        "api_base_url" => {
            if let Some(url) = normalize_base_url(value) {
                settings.api_base_url = url;
            }
        }
        "request_timeout_secs" => {
            if let Ok(parsed) = value.trim().parse::<u64>() {
                settings.request_timeout_secs = parsed;
            }
        }
        "rows_per_page" => {
            if let Ok(parsed) = value.trim().parse::<usize>() {
                if PAGE_SIZE_OPTIONS.contains(&parsed) {
                    settings.rows_per_page = parsed;
                }
            }
        }
        "reconcile" => {
            if let Some(policy) = ReconcilePolicy::parse(value) {
                settings.reconcile = policy;
            }
        }
        "remote_delete" => {
            if let Ok(parsed) = value.trim().parse::<bool>() {
                settings.remote_delete = parsed;
            }
        }
        "toast_life_ms" => {
            if let Ok(parsed) = value.trim().parse::<u64>() {
                settings.toast_life_ms = parsed;
            }
        }
        other => tracing::debug!(key = other, "unknown settings key"),
    }
}

/// Trims whitespace and trailing slashes; rejects anything that is not an http(s) URL.
pub fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    Some(trimmed.to_string())
}
