//! Derived views: filter and sort descriptors over a resource collection.
//!
//! `select_filtered` is a pure function: no side effects, deterministic for
//! identical inputs, stable order for equal sort keys.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{AnalyticsSnapshot, Campaign, MetaTag, SitemapEntry};

/// A record field viewed through the filter/sort machinery.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
}

/// Exposes named fields of a record to filtering and sorting.
///
/// Field names follow the Rust struct fields (`"budget"`, `"start_date"`).
/// `None` means the record has no value for that field.
pub trait Queryable {
    fn field(&self, name: &str) -> Option<FieldValue>;
}

/// Inclusive numeric range, e.g. a budget band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRange {
    pub min: f64,
    pub max: f64,
}

impl NumberRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Inclusive date range over a record's date field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn contains(&self, value: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| value >= from) && self.to.map_or(true, |to| value <= to)
    }
}

/// UI-driven filter criteria; transient and recomputed on every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterDescriptor {
    /// Exact match on the `platform` field
    pub platform: Option<String>,
    /// Exact match on the `status` field
    pub status: Option<String>,
    /// Inclusive range over the `budget` field
    pub budget_range: Option<NumberRange>,
    /// Inclusive range over the `date` field
    pub date_range: Option<DateRange>,
    /// Case-insensitive substring match over the record's text fields
    pub search: Option<String>,
}

impl FilterDescriptor {
    pub fn matches<R: Queryable>(&self, record: &R) -> bool {
        if let Some(platform) = &self.platform {
            match record.field("platform") {
                Some(FieldValue::Text(p)) if p == *platform => {}
                _ => return false,
            }
        }
        if let Some(status) = &self.status {
            match record.field("status") {
                Some(FieldValue::Text(s)) if s == *status => {}
                _ => return false,
            }
        }
        if let Some(range) = &self.budget_range {
            match record.field("budget").and_then(as_number) {
                Some(budget) if range.contains(budget) => {}
                _ => return false,
            }
        }
        if let Some(range) = &self.date_range {
            match record.field("date") {
                Some(FieldValue::Date(date)) if range.contains(date) => {}
                _ => return false,
            }
        }
        if let Some(term) = &self.search {
            let needle = term.to_lowercase();
            let hit = ["name", "url", "title"].iter().any(|field| {
                matches!(record.field(field),
                    Some(FieldValue::Text(text)) if text.to_lowercase().contains(&needle))
            });
            if !hit {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// UI-driven sort criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct SortDescriptor {
    pub field: String,
    pub direction: SortDirection,
}

/// Filter then stable-sort a collection snapshot.
///
/// Tie-break policy per field type: text compares lexicographically, numeric
/// and currency-formatted text compares numerically after stripping
/// non-numeric characters, dates compare by timestamp. Equal keys keep the
/// collection's insertion order; records missing the sort field go last.
pub fn select_filtered<R: Queryable + Clone>(
    records: &[R],
    filter: &FilterDescriptor,
    sort: Option<&SortDescriptor>,
) -> Vec<R> {
    let mut selected: Vec<R> = records
        .iter()
        .filter(|r| filter.matches(*r))
        .cloned()
        .collect();

    if let Some(sort) = sort {
        selected.sort_by(|a, b| {
            // Records missing the sort field go last in either direction.
            match (a.field(&sort.field), b.field(&sort.field)) {
                (Some(a), Some(b)) => {
                    let ordering = compare_values(&a, &b);
                    match sort.direction {
                        SortDirection::Ascending => ordering,
                        SortDirection::Descending => ordering.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    selected
}

fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Number(x), FieldValue::Number(y)) => {
            x.partial_cmp(y).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Date(x), FieldValue::Date(y)) => x.cmp(y),
        (FieldValue::Text(x), FieldValue::Text(y)) => {
            // Currency/numeric strings sort numerically when both sides parse.
            match (parse_numeric(x), parse_numeric(y)) {
                (Some(nx), Some(ny)) => nx.partial_cmp(&ny).unwrap_or(Ordering::Equal),
                _ => x.cmp(y),
            }
        }
        // Mixed types carry no meaningful order; preserve collection order.
        _ => Ordering::Equal,
    }
}

fn as_number(value: FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(n),
        FieldValue::Text(s) => parse_numeric(&s),
        FieldValue::Date(_) => None,
    }
}

/// Parse a number out of free-form numeric text, stripping currency symbols
/// and thousands separators (`"$2,000"` → 2000.0).
pub fn parse_numeric(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        Utc,
    ))
}

impl Queryable for Campaign {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "name" => Some(FieldValue::Text(self.name.clone())),
            "platform" => Some(FieldValue::Text(self.platform.clone())),
            "status" => Some(FieldValue::Text(self.status.as_str().to_string())),
            "budget" => Some(FieldValue::Number(self.budget)),
            "spend" => self.spend.map(FieldValue::Number),
            "date" | "start_date" => {
                self.start_date.as_deref().and_then(parse_date).map(FieldValue::Date)
            }
            "end_date" => self.end_date.as_deref().and_then(parse_date).map(FieldValue::Date),
            _ => None,
        }
    }
}

impl Queryable for MetaTag {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "url" => Some(FieldValue::Text(self.url.clone())),
            "title" => Some(FieldValue::Text(self.title.clone())),
            "date" | "updated_at" => {
                self.updated_at.as_deref().and_then(parse_date).map(FieldValue::Date)
            }
            _ => None,
        }
    }
}

impl Queryable for SitemapEntry {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "url" => Some(FieldValue::Text(self.url.clone())),
            "priority" => Some(FieldValue::Number(self.priority)),
            "changefreq" => Some(FieldValue::Text(self.changefreq.as_str().to_string())),
            "date" | "lastmod" => {
                self.lastmod.as_deref().and_then(parse_date).map(FieldValue::Date)
            }
            _ => None,
        }
    }
}

impl Queryable for AnalyticsSnapshot {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "date" | "captured_at" => parse_date(&self.captured_at).map(FieldValue::Date),
            "visitors" => Some(FieldValue::Number(self.visitors as f64)),
            "page_views" => Some(FieldValue::Number(self.page_views as f64)),
            "bounce_rate" => Some(FieldValue::Number(self.bounce_rate)),
            "conversions" => Some(FieldValue::Number(self.conversions as f64)),
            _ => None,
        }
    }
}
