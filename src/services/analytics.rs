//! Analytics snapshot service.
//!
//! Snapshots are produced server-side; the write half of the service contract
//! stays at its read-only defaults.

use super::ResourceService;
use crate::errors::ApiError;
use crate::http::HttpClient;
use crate::models::AnalyticsSnapshot;

/// Snapshot reads against `/analytics/snapshots`.
#[derive(Clone)]
pub struct AnalyticsService {
    http: HttpClient,
}

impl AnalyticsService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// GET /analytics/snapshots/:id
    pub async fn get(&self, id: &str) -> Result<AnalyticsSnapshot, ApiError> {
        self.http.get(&format!("/analytics/snapshots/{}", id)).await
    }
}

impl ResourceService for AnalyticsService {
    type Record = AnalyticsSnapshot;

    fn resource_name(&self) -> &'static str {
        "analytics snapshot"
    }

    /// GET /analytics/snapshots
    async fn list(&self) -> Result<Vec<AnalyticsSnapshot>, ApiError> {
        self.http.get("/analytics/snapshots").await
    }
}
