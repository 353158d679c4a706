//! Current-user profile

use crate::api_client::{AllowRefreshRetry, ApiClient, ApiRequest};
use crate::error::Result;
use crate::types::{Profile, UpdateProfile};

impl ApiClient {
    pub async fn get_me(&self) -> Result<Profile> {
        self.request(ApiRequest::get("/users/me"), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn update_profile(&self, data: &UpdateProfile) -> Result<Profile> {
        let request = ApiRequest::patch("/users/me").json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }
}
