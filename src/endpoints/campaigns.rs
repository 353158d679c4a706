//! Seller campaigns

use crate::api_client::{AllowRefreshRetry, ApiClient, ApiRequest};
use crate::endpoints::products::Product;
use crate::error::Result;
use crate::types::Paginated;
use serde::{Deserialize, Serialize};

/// Status the backend reports for a live campaign
pub const CAMPAIGN_STATUS_ACTIVE: &str = "ACTIVE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `DRAFT`, `ACTIVE`, `PAUSED`, `COMPLETED` or `CANCELLED`
    pub status: String,
    pub total_slots: u32,
    #[serde(default)]
    pub used_slots: u32,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Campaign {
    pub fn is_active(&self) -> bool {
        self.status == CAMPAIGN_STATUS_ACTIVE
    }

    pub fn remaining_slots(&self) -> u32 {
        self.total_slots.saturating_sub(self.used_slots)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignProduct {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaign {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ISO-8601 timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub total_slots: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<CampaignProduct>>,
}

/// Fields the backend accepts on campaign edit
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCampaign {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_slots: Option<u32>,
}

impl ApiClient {
    /// Campaigns owned by the current seller (pages start at 1)
    pub async fn get_my_campaigns(&self, page: u32, limit: u32) -> Result<Paginated<Campaign>> {
        let endpoint = format!("/campaigns/my-campaigns?page={page}&limit={limit}");
        self.request(ApiRequest::get(endpoint), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn get_campaign(&self, id: &str) -> Result<Campaign> {
        self.request(ApiRequest::get(format!("/campaigns/{id}")), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn create_campaign(&self, data: &CreateCampaign) -> Result<Campaign> {
        let request = ApiRequest::post("/campaigns").json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    pub async fn update_campaign(&self, id: &str, data: &UpdateCampaign) -> Result<Campaign> {
        let request = ApiRequest::patch(format!("/campaigns/{id}")).json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    pub async fn delete_campaign(&self, id: &str) -> Result<()> {
        self.request_unit(
            ApiRequest::delete(format!("/campaigns/{id}")),
            AllowRefreshRetry::Yes,
        )
        .await
    }
}
