//! Core library for ragclass - a native client for the RagClass education
//! platform API.
//!
//! The platform connects teachers and students around AI-assisted
//! critical-thinking exercises. This crate provides the authenticated API
//! session layer every caller funnels through:
//!
//! - `auth::TokenStore`: two-tier credential storage (persistent / per-session)
//! - `api::HttpClient`: bearer-token attachment with one-shot refresh on 401
//! - `auth::SessionController`: the `{status, user, error}` state machine
//!
//! plus typed endpoint modules, a disk cache for slowly-changing server data,
//! and application configuration.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;

pub use api::{ApiError, AuthApi, ClassesApi, HttpClient, ProfileApi};
pub use auth::{AuthOutcome, Persistence, SessionController, SessionStatus, TokenStore};
pub use cache::CacheManager;
pub use config::Config;
pub use models::CurrentUser;
