//! Authentication API client methods

use crate::api_client::{AllowRefreshRetry, ApiClient, ApiRequest};
use crate::error::Result;
use crate::types::{
    AuthResponse, ChangePasswordData, SignInData, SignUpData, TokenVerification, UpdateEmailData,
};
use tracing::info;

impl ApiClient {
    /// Create an account and start a session with the returned tokens
    pub async fn sign_up(&self, data: &SignUpData) -> Result<AuthResponse> {
        let request = ApiRequest::post("/auth/signup").json(data)?;
        let response: AuthResponse = self.request(request, AllowRefreshRetry::No).await?;
        self.store_session(&response);
        info!(user_id = %response.profile.id, role = ?response.profile.role, "Signed up");
        Ok(response)
    }

    /// Sign in and start a session with the returned tokens
    ///
    /// Rejected credentials surface as [`ClientError::Api`](crate::ClientError::Api)
    /// with the server's message, never as an expired session.
    pub async fn sign_in(&self, data: &SignInData) -> Result<AuthResponse> {
        let request = ApiRequest::post("/auth/login").json(data)?;
        let response: AuthResponse = self.request(request, AllowRefreshRetry::No).await?;
        self.store_session(&response);
        info!(user_id = %response.profile.id, role = ?response.profile.role, "Signed in");
        Ok(response)
    }

    /// Forget both tokens. Purely local; the server is not contacted.
    pub fn sign_out(&self) {
        self.token_store().clear();
        info!("Signed out");
    }

    pub async fn verify_token(&self) -> Result<TokenVerification> {
        self.request(ApiRequest::get("/auth/verify"), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
        let request = ApiRequest::patch("/auth/change-password").json(&ChangePasswordData {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        })?;
        self.request_unit(request, AllowRefreshRetry::Yes).await
    }

    /// Change the account email; the current password is required
    pub async fn update_email(&self, email: &str, password: &str) -> Result<()> {
        let request = ApiRequest::patch("/auth/update-email").json(&UpdateEmailData {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        self.request_unit(request, AllowRefreshRetry::Yes).await
    }

    fn store_session(&self, response: &AuthResponse) {
        self.set_access_token(Some(response.access_token.clone()));
        self.set_refresh_token(Some(response.refresh_token.clone()));
    }
}
