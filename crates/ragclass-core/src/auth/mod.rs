//! Authentication module: credential storage and the session state machine.
//!
//! This module provides:
//! - `TokenStore`: two-tier (persistent / per-session) storage for the
//!   access/refresh token pair
//! - `SessionController`: the reactive `{status, user, error}` state machine
//!   driving sign-in, sign-out, and session rehydration

pub mod controller;
pub mod store;

pub use controller::{AuthOutcome, SessionController, SessionState, SessionStatus};
pub use store::{Persistence, Tier, TokenStore};
