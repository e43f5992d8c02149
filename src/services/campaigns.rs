//! Ad campaign service.

use super::ResourceService;
use crate::errors::ApiError;
use crate::http::HttpClient;
use crate::models::Campaign;

/// Campaign CRUD against `/campaigns`.
#[derive(Clone)]
pub struct CampaignService {
    http: HttpClient,
}

impl CampaignService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// GET /campaigns/:id
    pub async fn get(&self, id: &str) -> Result<Campaign, ApiError> {
        self.http.get(&format!("/campaigns/{}", id)).await
    }

    fn validate(record: &Campaign) -> Result<(), ApiError> {
        if record.name.trim().is_empty() {
            return Err(ApiError::Validation("Campaign name is required".to_string()));
        }
        if !record.budget.is_finite() || record.budget < 0.0 {
            return Err(ApiError::Validation(format!(
                "Budget must be a non-negative amount, got {}",
                record.budget
            )));
        }
        Ok(())
    }
}

impl ResourceService for CampaignService {
    type Record = Campaign;

    fn resource_name(&self) -> &'static str {
        "campaign"
    }

    /// GET /campaigns
    async fn list(&self) -> Result<Vec<Campaign>, ApiError> {
        self.http.get("/campaigns").await
    }

    /// POST /campaigns for new records, PUT /campaigns/:id for existing ones.
    /// The server assigns the ID on creation.
    async fn upsert(&self, record: &Campaign) -> Result<Campaign, ApiError> {
        Self::validate(record)?;
        if record.id.is_empty() {
            self.http.post("/campaigns", record).await
        } else {
            self.http
                .put(&format!("/campaigns/{}", record.id), record)
                .await
        }
    }

    /// DELETE /campaigns/:id
    async fn remove(&self, key: &str) -> Result<(), ApiError> {
        self.http.delete(&format!("/campaigns/{}", key)).await
    }
}
