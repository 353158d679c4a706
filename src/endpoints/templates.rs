//! Reusable procedure templates

use crate::api_client::{AllowRefreshRetry, ApiClient, ApiRequest};
use crate::endpoints::procedures::{Procedure, Step, StepInput};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureTemplate {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcedureTemplate {
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepInput>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProcedureTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepInput>>,
}

#[derive(Debug, Serialize)]
struct CopyToCampaign {
    order: u32,
}

impl ApiClient {
    pub async fn get_procedure_templates(&self) -> Result<Vec<ProcedureTemplate>> {
        self.request(ApiRequest::get("/procedure-templates"), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn get_procedure_template(&self, id: &str) -> Result<ProcedureTemplate> {
        let endpoint = format!("/procedure-templates/{id}");
        self.request(ApiRequest::get(endpoint), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn create_procedure_template(
        &self,
        data: &CreateProcedureTemplate,
    ) -> Result<ProcedureTemplate> {
        let request = ApiRequest::post("/procedure-templates").json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    pub async fn update_procedure_template(
        &self,
        id: &str,
        data: &UpdateProcedureTemplate,
    ) -> Result<ProcedureTemplate> {
        let request = ApiRequest::patch(format!("/procedure-templates/{id}")).json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    pub async fn delete_procedure_template(&self, id: &str) -> Result<()> {
        let endpoint = format!("/procedure-templates/{id}");
        self.request_unit(ApiRequest::delete(endpoint), AllowRefreshRetry::Yes)
            .await
    }

    /// Instantiate a template as a new procedure of `campaign_id` at position `order`
    pub async fn copy_template_to_campaign(
        &self,
        template_id: &str,
        campaign_id: &str,
        order: u32,
    ) -> Result<Procedure> {
        let request = ApiRequest::post(format!(
            "/procedure-templates/{template_id}/copy-to-campaign/{campaign_id}"
        ))
        .json(&CopyToCampaign { order })?;
        self.request(request, AllowRefreshRetry::Yes).await
    }
}
