//! SuperTry Rust Client
//!
//! A client library for the SuperTry marketplace API. It keeps the
//! access/refresh token pair, attaches bearer authentication to every call,
//! and recovers from access-token expiry with a single shared refresh.

pub mod api_client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod token_store;
pub mod types;

pub use api_client::{AllowRefreshRetry, ApiClient, ApiClientBuilder, ApiRequest};
pub use config::ClientConfig;
pub use endpoints::campaigns::{Campaign, CampaignProduct, CreateCampaign, UpdateCampaign};
pub use endpoints::dashboard::DashboardStats;
pub use endpoints::distributions::{
    CreateDistribution, Distribution, DistributionType, UpdateDistribution,
};
pub use endpoints::procedures::{CreateProcedure, Procedure, Step, StepInput, StepType, UpdateProcedure};
pub use endpoints::products::{CreateProduct, Product, UpdateProduct};
pub use endpoints::sessions::{Session, SessionStatus};
pub use endpoints::templates::{
    CreateProcedureTemplate, ProcedureTemplate, UpdateProcedureTemplate,
};
pub use endpoints::wallet::{Transaction, TransactionsPage, WalletBalance};
pub use error::{ClientError, Result};
pub use token_store::{FileTokenStorage, MemoryTokenStorage, TokenStorage, TokenStore};
pub use types::{AuthResponse, Paginated, PageMeta, Profile, Role, SignInData, SignUpData};
