//! Derived table view: filtering, sorting, paging and CSV export over store rows.

use std::{cmp::Ordering, io};

use shared::domain::{CatalogEntry, EntryId};

pub const PAGE_SIZE_OPTIONS: [usize; 3] = [5, 10, 25];
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Columns written by [`write_csv`], in order.
pub const EXPORT_COLUMNS: [Column; 3] = [Column::Code, Column::Name, Column::Status];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Code,
    Name,
    Status,
    Price,
    Quantity,
    Rating,
}

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::Code => "Code",
            Column::Name => "Name",
            Column::Status => "Status",
            Column::Price => "Price",
            Column::Quantity => "Quantity",
            Column::Rating => "Rating",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "code" | "id" => Some(Column::Code),
            "name" => Some(Column::Name),
            "status" | "inventorystatus" => Some(Column::Status),
            "price" => Some(Column::Price),
            "quantity" => Some(Column::Quantity),
            "rating" => Some(Column::Rating),
            _ => None,
        }
    }

    pub fn cell(self, entry: &CatalogEntry) -> String {
        match self {
            Column::Code => entry
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            Column::Name => entry.name.clone(),
            Column::Status => entry.inventory_status.label().to_string(),
            Column::Price => format!("{:.2}", entry.price),
            Column::Quantity => entry.quantity.to_string(),
            Column::Rating => entry.rating.to_string(),
        }
    }

    fn compare(self, a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
        match self {
            Column::Code => compare_codes(a.id.as_ref(), b.id.as_ref()),
            Column::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
            Column::Status => a
                .inventory_status
                .label()
                .cmp(b.inventory_status.label()),
            Column::Price => a.price.total_cmp(&b.price),
            Column::Quantity => a.quantity.cmp(&b.quantity),
            Column::Rating => a.rating.cmp(&b.rating),
        }
    }
}

/// Integer codes sort by value and before any non-numeric code; the rest sort as text.
fn compare_codes(a: Option<&EntryId>, b: Option<&EntryId>) -> Ordering {
    let numeric = |id: Option<&EntryId>| id.and_then(|id| id.as_str().parse::<u64>().ok());
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(&b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: Column,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parses `column` or `column:desc` / `column:asc`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (column, direction) = match raw.split_once(':') {
            Some((column, direction)) => {
                let direction = match direction.trim().to_ascii_lowercase().as_str() {
                    "asc" => SortDirection::Ascending,
                    "desc" => SortDirection::Descending,
                    _ => return None,
                };
                (column, direction)
            }
            None => (raw, SortDirection::Ascending),
        };
        Some(Self {
            column: Column::parse(column)?,
            direction,
        })
    }
}

/// Case-insensitive substring match over the row's text fields.
pub fn matches_filter(entry: &CatalogEntry, filter: &str) -> bool {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let id = entry.id.as_ref().map(|id| id.as_str()).unwrap_or_default();
    [
        id,
        entry.name.as_str(),
        entry.description.as_str(),
        entry.category.as_deref().unwrap_or_default(),
        entry.inventory_status.label(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Filtered rows in store order, then stably sorted if `sort` is set.
pub fn visible_rows<'a>(
    entries: &'a [CatalogEntry],
    filter: &str,
    sort: Option<SortSpec>,
) -> Vec<&'a CatalogEntry> {
    let mut rows: Vec<&CatalogEntry> = entries
        .iter()
        .filter(|entry| matches_filter(entry, filter))
        .collect();
    if let Some(spec) = sort {
        rows.sort_by(|a, b| {
            let ordering = spec.column.compare(a, b);
            match spec.direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
    }
    rows
}

/// Zero-based page window over `total` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: usize,
    pub rows_per_page: usize,
    pub total: usize,
}

impl PageWindow {
    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.rows_per_page.max(1)).max(1)
    }

    /// Index range of the page, clamped to the data.
    pub fn range(&self) -> std::ops::Range<usize> {
        let page = self.page.min(self.page_count() - 1);
        let start = (page * self.rows_per_page).min(self.total);
        let end = (start + self.rows_per_page).min(self.total);
        start..end
    }

    pub fn report(&self) -> String {
        let range = self.range();
        let first = if self.total == 0 { 0 } else { range.start + 1 };
        format!(
            "Showing {first} to {} of {} products",
            range.end, self.total
        )
    }
}

pub fn write_csv<W: io::Write>(writer: W, rows: &[&CatalogEntry]) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(EXPORT_COLUMNS.iter().map(|column| column.header()))?;
    for entry in rows {
        out.write_record(EXPORT_COLUMNS.iter().map(|column| column.cell(entry)))?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use shared::domain::InventoryStatus;

    use super::*;

    fn entry(id: &str, name: &str, price: f64, status: InventoryStatus) -> CatalogEntry {
        CatalogEntry {
            id: Some(EntryId::new(id)),
            name: name.into(),
            price,
            inventory_status: status,
            ..CatalogEntry::empty()
        }
    }

    fn sample() -> Vec<CatalogEntry> {
        vec![
            entry("b2", "Widget", 10.0, InventoryStatus::InStock),
            entry("a1", "Gadget", 25.0, InventoryStatus::LowStock),
            entry("c3", "widget stand", 5.0, InventoryStatus::OutOfStock),
        ]
    }

    fn names(rows: &[&CatalogEntry]) -> Vec<String> {
        rows.iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let entries = vec![
            entry("1", "Widget", 1.0, InventoryStatus::InStock),
            entry("2", "Gadget", 1.0, InventoryStatus::InStock),
        ];
        let rows = visible_rows(&entries, "wid", None);
        assert_eq!(names(&rows), vec!["Widget"]);
    }

    #[test]
    fn filter_matches_status_and_category() {
        let mut entries = sample();
        entries[1].category = Some("Accessories".into());
        assert_eq!(names(&visible_rows(&entries, "lowstock", None)), vec!["Gadget"]);
        assert_eq!(names(&visible_rows(&entries, "ACCESS", None)), vec!["Gadget"]);
        assert_eq!(visible_rows(&entries, "  ", None).len(), 3);
    }

    #[test]
    fn sorts_stably_in_both_directions() {
        let entries = sample();
        let by_price = visible_rows(
            &entries,
            "",
            Some(SortSpec {
                column: Column::Price,
                direction: SortDirection::Descending,
            }),
        );
        assert_eq!(names(&by_price), vec!["Gadget", "Widget", "widget stand"]);

        let by_code = visible_rows(&entries, "", SortSpec::parse("code"));
        assert_eq!(names(&by_code), vec!["Gadget", "Widget", "widget stand"]);
    }

    #[test]
    fn integer_codes_sort_by_value() {
        let entries = vec![
            entry("10", "Ten", 1.0, InventoryStatus::InStock),
            entry("9", "Nine", 1.0, InventoryStatus::InStock),
            entry("x1", "Text", 1.0, InventoryStatus::InStock),
            entry("2", "Two", 1.0, InventoryStatus::InStock),
        ];
        let codes = |rows: Vec<&CatalogEntry>| -> Vec<String> {
            rows.iter().map(|e| Column::Code.cell(e)).collect()
        };

        let ascending = visible_rows(&entries, "", SortSpec::parse("code"));
        assert_eq!(codes(ascending), vec!["2", "9", "10", "x1"]);

        let descending = visible_rows(&entries, "", SortSpec::parse("code:desc"));
        assert_eq!(codes(descending), vec!["x1", "10", "9", "2"]);
    }

    #[test]
    fn sort_spec_parsing() {
        assert_eq!(
            SortSpec::parse("name:desc"),
            Some(SortSpec {
                column: Column::Name,
                direction: SortDirection::Descending
            })
        );
        assert_eq!(SortSpec::parse("name:sideways"), None);
        assert_eq!(SortSpec::parse("colour"), None);
    }

    #[test]
    fn page_window_report_matches_paginator_text() {
        let window = PageWindow {
            page: 1,
            rows_per_page: 10,
            total: 23,
        };
        assert_eq!(window.page_count(), 3);
        assert_eq!(window.range(), 10..20);
        assert_eq!(window.report(), "Showing 11 to 20 of 23 products");

        let empty = PageWindow {
            page: 0,
            rows_per_page: 10,
            total: 0,
        };
        assert_eq!(empty.range(), 0..0);
        assert_eq!(empty.report(), "Showing 0 to 0 of 0 products");
    }

    #[test]
    fn page_past_the_end_clamps_to_last_page() {
        let window = PageWindow {
            page: 9,
            rows_per_page: 5,
            total: 12,
        };
        assert_eq!(window.range(), 10..12);
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let entries = vec![entry("1", "Nuts, bolts", 1.0, InventoryStatus::LowStock)];
        let rows: Vec<&CatalogEntry> = entries.iter().collect();
        let mut out = Vec::new();
        write_csv(&mut out, &rows).expect("csv");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "Code,Name,Status\n1,\"Nuts, bolts\",LOWSTOCK\n");
    }
}
