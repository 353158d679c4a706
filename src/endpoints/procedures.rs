//! Campaign testing procedures and their steps

use crate::api_client::{AllowRefreshRetry, ApiClient, ApiRequest};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    Text,
    Photo,
    Video,
    Checklist,
    Rating,
    PriceValidation,
}

/// A step as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: StepType,
    pub order: u32,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub checklist_items: Option<Vec<String>>,
}

/// A step to create, in a procedure or a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: StepType,
    pub order: u32,
    pub is_required: bool,
    /// Only meaningful for [`StepType::Checklist`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checklist_items: Option<Vec<String>>,
}

impl StepInput {
    pub fn new(title: impl Into<String>, kind: StepType, order: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            kind,
            order,
            is_required: true,
            checklist_items: None,
        }
    }
}

impl From<&Step> for StepInput {
    fn from(step: &Step) -> Self {
        Self {
            title: step.title.clone(),
            description: step.description.clone(),
            kind: step.kind,
            order: step.order,
            is_required: step.is_required,
            checklist_items: step.checklist_items.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub id: String,
    #[serde(default)]
    pub campaign_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub order: u32,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcedure {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub order: u32,
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepInput>,
}

impl From<&Procedure> for CreateProcedure {
    fn from(procedure: &Procedure) -> Self {
        Self {
            title: procedure.title.clone(),
            description: procedure.description.clone(),
            order: procedure.order,
            is_required: procedure.is_required,
            steps: procedure.steps.iter().map(StepInput::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProcedure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<StepInput>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReorderProcedures<'a> {
    procedure_ids: &'a [String],
}

impl ApiClient {
    pub async fn get_procedures(&self, campaign_id: &str) -> Result<Vec<Procedure>> {
        let endpoint = format!("/campaigns/{campaign_id}/procedures");
        self.request(ApiRequest::get(endpoint), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn get_procedure(&self, campaign_id: &str, id: &str) -> Result<Procedure> {
        let endpoint = format!("/campaigns/{campaign_id}/procedures/{id}");
        self.request(ApiRequest::get(endpoint), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn create_procedure(
        &self,
        campaign_id: &str,
        data: &CreateProcedure,
    ) -> Result<Procedure> {
        let request =
            ApiRequest::post(format!("/campaigns/{campaign_id}/procedures")).json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    pub async fn update_procedure(
        &self,
        campaign_id: &str,
        id: &str,
        data: &UpdateProcedure,
    ) -> Result<Procedure> {
        let request =
            ApiRequest::patch(format!("/campaigns/{campaign_id}/procedures/{id}")).json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    pub async fn delete_procedure(&self, campaign_id: &str, id: &str) -> Result<()> {
        let endpoint = format!("/campaigns/{campaign_id}/procedures/{id}");
        self.request_unit(ApiRequest::delete(endpoint), AllowRefreshRetry::Yes)
            .await
    }

    /// Set the procedure order; `procedure_ids` lists every procedure, first to last
    pub async fn reorder_procedures(
        &self,
        campaign_id: &str,
        procedure_ids: &[String],
    ) -> Result<Vec<Procedure>> {
        let request = ApiRequest::patch(format!("/campaigns/{campaign_id}/procedures/reorder"))
            .json(&ReorderProcedures { procedure_ids })?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    /// Replace every procedure of a campaign with `procedures`
    ///
    /// Existing procedures are deleted first, then the new set is created in
    /// order. Stops at the first failure, which may leave the campaign with a
    /// partial set.
    pub async fn replace_procedures(
        &self,
        campaign_id: &str,
        procedures: &[CreateProcedure],
    ) -> Result<Vec<Procedure>> {
        let existing = self.get_procedures(campaign_id).await?;
        debug!(
            campaign_id = %campaign_id,
            removed = existing.len(),
            added = procedures.len(),
            "Replacing procedures"
        );

        for procedure in &existing {
            self.delete_procedure(campaign_id, &procedure.id).await?;
        }

        let mut created = Vec::with_capacity(procedures.len());
        for procedure in procedures {
            created.push(self.create_procedure(campaign_id, procedure).await?);
        }
        Ok(created)
    }
}
