//! Testing sessions

use crate::api_client::{AllowRefreshRetry, ApiClient, ApiRequest};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a testing session
///
/// Unknown states from newer backends are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionStatus {
    Pending,
    Accepted,
    PurchaseSubmitted,
    InProgress,
    Completed,
    Rejected,
    Cancelled,
    Other(String),
}

impl SessionStatus {
    /// Accepted but not finished yet
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::PurchaseSubmitted | Self::InProgress
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::PurchaseSubmitted => "PURCHASE_SUBMITTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for SessionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "PENDING" => Self::Pending,
            "ACCEPTED" => Self::Accepted,
            "PURCHASE_SUBMITTED" => Self::PurchaseSubmitted,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "REJECTED" => Self::Rejected,
            "CANCELLED" => Self::Cancelled,
            _ => Self::Other(value),
        }
    }
}

impl From<SessionStatus> for String {
    fn from(value: SessionStatus) -> Self {
        match value {
            SessionStatus::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub status: SessionStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub campaign: Option<SessionCampaign>,
    #[serde(default)]
    pub tester: Option<SessionTester>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCampaign {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTester {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl ApiClient {
    /// Sessions visible to the current user (as tester or campaign owner)
    pub async fn get_sessions(&self) -> Result<Vec<Session>> {
        self.request(ApiRequest::get("/sessions"), AllowRefreshRetry::Yes)
            .await
    }
}
