//! Seller product catalog

use crate::api_client::{AllowRefreshRetry, ApiClient, ApiRequest};
use crate::error::Result;
use crate::types::Paginated;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub amazon_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProduct {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amazon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProduct {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amazon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ApiClient {
    pub async fn get_products(&self) -> Result<Vec<Product>> {
        self.request(ApiRequest::get("/products"), AllowRefreshRetry::Yes)
            .await
    }

    /// Products owned by the current seller, one page at a time (pages start at 1)
    pub async fn get_my_products(&self, page: u32, limit: u32) -> Result<Paginated<Product>> {
        let endpoint = format!("/products/my-products?page={page}&limit={limit}");
        self.request(ApiRequest::get(endpoint), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn get_product(&self, id: &str) -> Result<Product> {
        self.request(ApiRequest::get(format!("/products/{id}")), AllowRefreshRetry::Yes)
            .await
    }

    pub async fn create_product(&self, data: &CreateProduct) -> Result<Product> {
        let request = ApiRequest::post("/products").json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    pub async fn update_product(&self, id: &str, data: &UpdateProduct) -> Result<Product> {
        let request = ApiRequest::patch(format!("/products/{id}")).json(data)?;
        self.request(request, AllowRefreshRetry::Yes).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<()> {
        self.request_unit(
            ApiRequest::delete(format!("/products/{id}")),
            AllowRefreshRetry::Yes,
        )
        .await
    }
}
