//! Sign in and print the dashboard summary
//!
//! Usage:
//!   SUPERTRY_EMAIL=... SUPERTRY_PASSWORD=... cargo run --example dashboard_stats
//!
//! `SUPERTRY_API_URL`, `SUPERTRY_HTTP_TIMEOUT_SECS` and `SUPERTRY_TOKEN_FILE`
//! are honoured too; a `.env` file in the working directory is loaded first.

use supertry_client::{ApiClient, SignInData};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let client = ApiClient::from_env()?;
    println!("API: {}", client.base_url());

    let credentials = SignInData {
        email: std::env::var("SUPERTRY_EMAIL")?,
        password: std::env::var("SUPERTRY_PASSWORD")?,
    };

    let auth = client.sign_in(&credentials).await?;
    println!("Signed in as {} ({:?})", auth.profile.email, auth.profile.role);

    let stats = if auth.profile.is_pro() {
        client.get_pro_dashboard_stats().await
    } else {
        client.get_dashboard_stats().await
    };

    println!("{}", serde_json::to_string_pretty(&stats)?);

    let history = client
        .get_transactions(supertry_client::endpoints::wallet::DEFAULT_TRANSACTIONS_LIMIT)
        .await?;
    println!("{} wallet transactions", history.total);

    Ok(())
}
