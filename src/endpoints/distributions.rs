//! Campaign distribution schedule

use crate::api_client::{AllowRefreshRetry, ApiClient, ApiRequest};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionType {
    /// Every week on `day_of_week`
    Recurring,
    /// Once, on `specific_date`
    SpecificDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub id: String,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: DistributionType,
    /// 0 = Sunday .. 6 = Saturday
    #[serde(default)]
    pub day_of_week: Option<u8>,
    #[serde(default)]
    pub specific_date: Option<String>,
    pub max_units: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDistribution {
    #[serde(rename = "type")]
    pub kind: DistributionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_date: Option<String>,
    pub max_units: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl CreateDistribution {
    pub fn recurring(day_of_week: u8, max_units: u32) -> Self {
        Self {
            kind: DistributionType::Recurring,
            day_of_week: Some(day_of_week),
            specific_date: None,
            max_units,
            is_active: None,
        }
    }

    /// `date` is an ISO-8601 date or timestamp
    pub fn specific_date(date: impl Into<String>, max_units: u32) -> Self {
        Self {
            kind: DistributionType::SpecificDate,
            day_of_week: None,
            specific_date: Some(date.into()),
            max_units,
            is_active: None,
        }
    }
}

impl From<&Distribution> for CreateDistribution {
    fn from(distribution: &Distribution) -> Self {
        Self {
            kind: distribution.kind,
            day_of_week: distribution.day_of_week,
            specific_date: distribution.specific_date.clone(),
            max_units: distribution.max_units,
            is_active: Some(distribution.is_active),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDistribution {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<DistributionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_units: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
struct BatchDistributions<'a> {
    distributions: &'a [CreateDistribution],
}

impl ApiClient {
    pub async fn get_distributions(&self, campaign_id: &str) -> Result<Vec<Distribution>> {
        let endpoint = format!("/campaigns/{campaign_id}/distributions");
        self.request(ApiRequest::get(endpoint), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn get_distribution(&self, campaign_id: &str, id: &str) -> Result<Distribution> {
        let endpoint = format!("/campaigns/{campaign_id}/distributions/{id}");
        self.request(ApiRequest::get(endpoint), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn create_distribution(
        &self,
        campaign_id: &str,
        data: &CreateDistribution,
    ) -> Result<Distribution> {
        let request =
            ApiRequest::post(format!("/campaigns/{campaign_id}/distributions")).json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    /// Create several distributions in one call
    pub async fn create_distributions(
        &self,
        campaign_id: &str,
        distributions: &[CreateDistribution],
    ) -> Result<Vec<Distribution>> {
        let request = ApiRequest::post(format!("/campaigns/{campaign_id}/distributions/batch"))
            .json(&BatchDistributions { distributions })?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    pub async fn update_distribution(
        &self,
        campaign_id: &str,
        id: &str,
        data: &UpdateDistribution,
    ) -> Result<Distribution> {
        let request = ApiRequest::patch(format!("/campaigns/{campaign_id}/distributions/{id}"))
            .json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    pub async fn delete_distribution(&self, campaign_id: &str, id: &str) -> Result<()> {
        let endpoint = format!("/campaigns/{campaign_id}/distributions/{id}");
        self.request_unit(ApiRequest::delete(endpoint), AllowRefreshRetry::Yes)
            .await
    }

    /// Replace the whole distribution schedule of a campaign
    ///
    /// Deletes every existing distribution, then batch-creates `distributions`.
    /// Stops at the first failure.
    pub async fn replace_distributions(
        &self,
        campaign_id: &str,
        distributions: &[CreateDistribution],
    ) -> Result<Vec<Distribution>> {
        let existing = self.get_distributions(campaign_id).await?;
        debug!(
            campaign_id = %campaign_id,
            removed = existing.len(),
            added = distributions.len(),
            "Replacing distributions"
        );

        for distribution in &existing {
            self.delete_distribution(campaign_id, &distribution.id).await?;
        }

        if distributions.is_empty() {
            return Ok(Vec::new());
        }
        self.create_distributions(campaign_id, distributions).await
    }
}
