//! Typed wrappers over [`ApiClient::request`](crate::ApiClient::request), one module per resource

pub mod auth;
pub mod campaigns;
pub mod dashboard;
pub mod distributions;
pub mod procedures;
pub mod products;
pub mod sessions;
pub mod templates;
pub mod users;
pub mod wallet;
