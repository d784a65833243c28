//! REST API client module for the RagClass platform services.
//!
//! This module provides the `HttpClient` choke point that every outbound
//! request funnels through, plus thin typed wrappers for the endpoint
//! families the client consumes.
//!
//! The API uses JWT bearer token authentication with a refresh-token
//! exchange; expired access tokens are renewed transparently on 401.

pub mod auth;
pub mod classes;
pub mod error;
pub mod http;
pub mod profile;

pub use auth::AuthApi;
pub use classes::ClassesApi;
pub use error::ApiError;
pub use http::HttpClient;
pub use profile::ProfileApi;
