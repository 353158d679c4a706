//! Dashboard summary counts
//!
//! Both aggregates fan out their sub-requests concurrently. A failing
//! sub-request is logged and replaced by an empty default, so the summary
//! is always returned.

use crate::api_client::ApiClient;
use crate::endpoints::campaigns::Campaign;
use crate::endpoints::sessions::{Session, SessionStatus};
use crate::endpoints::wallet::WalletBalance;
use crate::error::Result;
use crate::types::Paginated;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Page size used when counting a seller's campaigns and products
pub const DASHBOARD_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_sessions: usize,
    pub active_sessions: usize,
    pub completed_sessions: usize,
    pub pending_sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_campaigns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_campaigns: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_products: Option<u64>,
    pub balance: f64,
}

impl DashboardStats {
    fn from_sessions(sessions: &[Session], balance: &WalletBalance) -> Self {
        let count = |wanted: SessionStatus| sessions.iter().filter(|s| s.status == wanted).count();

        Self {
            total_sessions: sessions.len(),
            active_sessions: sessions.iter().filter(|s| s.status.is_active()).count(),
            completed_sessions: count(SessionStatus::Completed),
            pending_sessions: count(SessionStatus::Pending),
            balance: balance.balance,
            ..Self::default()
        }
    }
}

fn or_default<T: Default>(result: Result<T>, source: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!(source = %source, error = %e, "Dashboard sub-request failed, using empty default");
        T::default()
    })
}

impl ApiClient {
    /// Tester dashboard: session counts and wallet balance
    pub async fn get_dashboard_stats(&self) -> DashboardStats {
        let (sessions, balance) = tokio::join!(self.get_sessions(), self.get_wallet_balance());

        let sessions = or_default(sessions, "sessions");
        let balance = or_default(balance, "wallet balance");

        DashboardStats::from_sessions(&sessions, &balance)
    }

    /// Seller dashboard: session counts plus campaign and product totals
    pub async fn get_pro_dashboard_stats(&self) -> DashboardStats {
        let (sessions, campaigns, products, balance) = tokio::join!(
            self.get_sessions(),
            self.get_my_campaigns(1, DASHBOARD_PAGE_LIMIT),
            self.get_my_products(1, DASHBOARD_PAGE_LIMIT),
            self.get_wallet_balance(),
        );

        let sessions = or_default(sessions, "sessions");
        let campaigns = or_default(campaigns, "campaigns");
        let products = or_default(products, "products");
        let balance = or_default(balance, "wallet balance");

        let active_campaigns = self.count_active_campaigns(&campaigns).await;

        DashboardStats {
            total_campaigns: Some(page_total(&campaigns)),
            active_campaigns: Some(active_campaigns),
            total_products: Some(page_total(&products)),
            ..DashboardStats::from_sessions(&sessions, &balance)
        }
    }

    /// `ACTIVE` campaigns over every page, starting from the already fetched first one
    ///
    /// A failing later page stops the walk; the count so far is returned.
    async fn count_active_campaigns(&self, first: &Paginated<Campaign>) -> usize {
        let mut active = count_active(&first.data);

        for page in 2..=first.meta.total_pages {
            match self.get_my_campaigns(page, DASHBOARD_PAGE_LIMIT).await {
                Ok(next) => active += count_active(&next.data),
                Err(e) => {
                    warn!(page, error = %e, "Campaign page failed, active count is partial");
                    break;
                }
            }
        }

        active
    }
}

fn count_active(campaigns: &[Campaign]) -> usize {
    campaigns.iter().filter(|c| c.is_active()).count()
}

/// Server-reported total, or the fetched count when `meta` is missing it
fn page_total<T>(page: &Paginated<T>) -> u64 {
    page.meta.total.max(page.data.len() as u64)
}
