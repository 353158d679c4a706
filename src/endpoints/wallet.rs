//! Wallet balance and history

use crate::api_client::{AllowRefreshRetry, ApiClient, ApiRequest};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Number of transactions fetched when the caller has no preference
pub const DEFAULT_TRANSACTIONS_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub balance: f64,
    pub currency: String,
}

impl Default for WalletBalance {
    fn default() -> Self {
        Self {
            balance: 0.0,
            currency: "EUR".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionsPage {
    pub transactions: Vec<Transaction>,
    pub total: u64,
}

impl ApiClient {
    pub async fn get_wallet_balance(&self) -> Result<WalletBalance> {
        self.request(ApiRequest::get("/wallets/me/balance"), AllowRefreshRetry::Yes)
            .await
    }

    /// Most recent transactions, at most `limit`
    pub async fn get_transactions(&self, limit: u32) -> Result<TransactionsPage> {
        let endpoint = format!("/wallets/me/transactions?limit={limit}");
        self.request(ApiRequest::get(endpoint), AllowRefreshRetry::Yes)
            .await
    }
}
