//! Ad campaign model matching the frontend Campaign interface.

use serde::{Deserialize, Serialize};

use super::Keyed;

/// Lifecycle state of an ad campaign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(CampaignStatus::Draft),
            "active" => Some(CampaignStatus::Active),
            "paused" => Some(CampaignStatus::Paused),
            "completed" => Some(CampaignStatus::Completed),
            _ => None,
        }
    }
}

/// An ad campaign, keyed by server-assigned ID.
///
/// The server is the source of truth for `id` and timestamps; a record sent
/// for creation leaves `id` empty and uses the server-confirmed echo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Delivery platform (e.g. `google`, `facebook`, `linkedin`)
    pub platform: String,
    pub status: CampaignStatus,
    /// Total budget in account currency units
    pub budget: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spend: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Keyed for Campaign {
    fn key(&self) -> &str {
        &self.id
    }
}
