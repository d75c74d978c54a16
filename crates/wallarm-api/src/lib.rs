//! # wallarm-api
//!
//! Async client for the Wallarm rule ("hint") and action endpoints.
//!
//! The [`RulesApi`] trait is the seam the rule lifecycle is written against;
//! [`WallarmClient`] implements it over HTTPS with token or uuid/secret
//! authentication and exponential backoff on transient failures.
//!
//! ```ignore
//! use wallarm_api::{Credentials, HintRead, WallarmClient, read_all_rules};
//!
//! let client = WallarmClient::builder()
//!     .base_url("https://us1.api.wallarm.com")
//!     .credentials(Credentials::Token(token))
//!     .build()?;
//! let rules = read_all_rules(&client, &HintRead::for_client(42)).await?;
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod paginate;
pub mod retry;

pub use api::RulesApi;
pub use auth::Credentials;
pub use client::{DEFAULT_API_HOST, WallarmClient, WallarmClientBuilder};
pub use error::{ApiError, Result};
pub use models::{
    ActionRead, ActionSummary, HintCreate, HintDelete, HintRead, PAGE_SIZE, UserDetails,
};
pub use paginate::{read_all_actions, read_all_rules};
pub use retry::RetryPolicy;
