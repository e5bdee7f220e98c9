use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a catalog entry.
///
/// Locally generated ids are short alphanumeric strings while REST backends
/// usually hand out integer keys, so both JSON strings and integers are
/// accepted and normalised to their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => EntryId(text),
            RawId::Signed(n) => EntryId(n.to_string()),
            RawId::Unsigned(n) => EntryId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InventoryStatus {
    #[default]
    InStock,
    LowStock,
    OutOfStock,
}

impl InventoryStatus {
    pub const ALL: [InventoryStatus; 3] = [
        InventoryStatus::InStock,
        InventoryStatus::LowStock,
        InventoryStatus::OutOfStock,
    ];

    /// Wire label, also used for display and filtering.
    pub fn label(self) -> &'static str {
        match self {
            InventoryStatus::InStock => "INSTOCK",
            InventoryStatus::LowStock => "LOWSTOCK",
            InventoryStatus::OutOfStock => "OUTOFSTOCK",
        }
    }

    pub fn severity(self) -> TagSeverity {
        match self {
            InventoryStatus::InStock => TagSeverity::Success,
            InventoryStatus::LowStock => TagSeverity::Warning,
            InventoryStatus::OutOfStock => TagSeverity::Danger,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for InventoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSeverity {
    Success,
    Info,
    Warning,
    Danger,
}

/// One product/category record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogEntry {
    pub id: Option<EntryId>,
    pub name: String,
    pub image: Option<String>,
    pub description: String,
    pub category: Option<String>,
    pub price: f64,
    #[serde(deserialize_with = "non_negative_count")]
    pub quantity: u32,
    #[serde(deserialize_with = "non_negative_count")]
    pub rating: u32,
    pub inventory_status: InventoryStatus,
}

/// Counts below zero are clamped to `0` so one bad row cannot fail a listing.
fn non_negative_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Whole(i64),
        Fraction(f64),
    }

    Ok(match RawCount::deserialize(deserializer)? {
        RawCount::Whole(n) => n.clamp(0, i64::from(u32::MAX)) as u32,
        RawCount::Fraction(f) if f.is_finite() && f > 0.0 => f.min(f64::from(u32::MAX)) as u32,
        RawCount::Fraction(_) => 0,
    })
}

impl Default for CatalogEntry {
    fn default() -> Self {
        Self::empty()
    }
}

impl CatalogEntry {
    /// The blank template a create dialog starts from.
    pub fn empty() -> Self {
        Self {
            id: None,
            name: String::new(),
            image: None,
            description: String::new(),
            category: None,
            price: 0.0,
            quantity: 0,
            rating: 0,
            inventory_status: InventoryStatus::InStock,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
