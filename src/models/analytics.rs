//! Analytics snapshot models.
//!
//! Snapshots are produced server-side on a schedule; the client only reads them.

use serde::{Deserialize, Serialize};

use super::Keyed;

/// Search ranking datum for one tracked keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordStat {
    pub keyword: String,
    /// Current organic ranking position
    pub position: u32,
    /// Estimated monthly search volume
    pub volume: u64,
}

/// A point-in-time capture of site analytics, keyed by server-assigned ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub id: String,
    /// RFC 3339 capture timestamp
    pub captured_at: String,
    pub visitors: u64,
    pub page_views: u64,
    /// Fraction of single-page sessions, 0.0 to 1.0
    pub bounce_rate: f64,
    pub conversions: u64,
    #[serde(default)]
    pub keywords: Vec<KeywordStat>,
}

impl Keyed for AnalyticsSnapshot {
    fn key(&self) -> &str {
        &self.id
    }
}
