//! Session state controller: the one owner of the `{status, user, error}`
//! triple and the only component that drives login/register/logout/refresh
//! against the backend.
//!
//! Constructed once by the composition root and shared with whatever front
//! end consumes it; there is no global singleton. Routine authentication
//! failures (bad password, duplicate email) come back as an `AuthOutcome`
//! value, not an error - consumers branch on the result.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::api::auth::{IssuedTokens, LoginRequest, RegisterRequest};
use crate::api::{ApiError, AuthApi, HttpClient};
use crate::models::CurrentUser;

use super::{Persistence, TokenStore};

/// How long the best-effort logout notification may take before we give up
/// and clear local state anyway.
const LOGOUT_NOTIFY_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Cloneable snapshot of the session state.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub status: SessionStatus,
    pub user: CurrentUser,
    pub error: Option<Arc<ApiError>>,
}

impl SessionState {
    fn idle() -> Self {
        Self {
            status: SessionStatus::Idle,
            user: CurrentUser::anonymous(),
            error: None,
        }
    }
}

/// Discriminated result of a login or register attempt.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Success { user: CurrentUser },
    Failure { error: Arc<ApiError> },
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            AuthOutcome::Success { .. } => None,
            AuthOutcome::Failure { error } => Some(error),
        }
    }
}

pub struct SessionController {
    tokens: Arc<TokenStore>,
    auth: AuthApi,
    state: RwLock<SessionState>,
}

impl SessionController {
    pub fn new(http: HttpClient) -> Self {
        let tokens = http.token_store().clone();
        Self {
            tokens,
            auth: AuthApi::new(http),
            state: RwLock::new(SessionState::idle()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.read_state().clone()
    }

    pub fn current_user(&self) -> CurrentUser {
        self.read_state().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().status == SessionStatus::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.read_state().status == SessionStatus::Loading
    }

    /// Rehydrate the session on startup. A stored access token is only a
    /// hint to attempt rehydration; the identity endpoint is authoritative.
    /// With no stored token this resolves without any network call.
    pub async fn bootstrap(&self) {
        debug!("Bootstrapping session from stored credentials");
        self.sync_identity().await;
    }

    /// Re-run the identity fetch to resynchronize `user` after profile
    /// mutations elsewhere in the application.
    pub async fn refresh(&self) {
        self.sync_identity().await;
    }

    pub async fn login(&self, request: &LoginRequest, persist: Option<bool>) -> AuthOutcome {
        self.set_loading();
        match self.auth.login(request).await {
            Ok(issued) => self.complete_sign_in(issued, persist).await,
            Err(error) => self.fail_sign_in(error),
        }
    }

    pub async fn register(&self, request: &RegisterRequest, persist: Option<bool>) -> AuthOutcome {
        self.set_loading();
        match self.auth.register(request).await {
            Ok(issued) => self.complete_sign_in(issued, persist).await,
            Err(error) => self.fail_sign_in(error),
        }
    }

    /// Notify the backend on a best-effort basis, then always clear the
    /// token store and reset to anonymous. Idempotent: logging out while
    /// already unauthenticated still clears storage.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.tokens.refresh_token() {
            let notify = self.auth.logout(&refresh_token);
            let deadline = Duration::from_secs(LOGOUT_NOTIFY_TIMEOUT_SECS);
            match tokio::time::timeout(deadline, notify).await {
                Ok(Ok(())) => debug!("Backend logout notification delivered"),
                Ok(Err(error)) => debug!(%error, "Logout notification failed; clearing local session anyway"),
                Err(_) => warn!("Logout notification timed out; clearing local session anyway"),
            }
        }
        self.tokens.clear_tokens();
        self.set_state(SessionStatus::Unauthenticated, CurrentUser::anonymous(), None);
    }

    async fn sync_identity(&self) {
        if self.tokens.access_token().is_none() {
            self.set_state(SessionStatus::Unauthenticated, CurrentUser::anonymous(), None);
            return;
        }
        self.set_loading();
        let _ = self.fetch_identity().await;
    }

    /// Authenticated path shared by bootstrap and sign-in: ask the backend
    /// who we are. Failure clears the stored tokens and resolves to
    /// `Unauthenticated` with the error recorded for inspection.
    async fn fetch_identity(&self) -> Result<CurrentUser, Arc<ApiError>> {
        match self.auth.me().await {
            Ok(identity) => {
                let user = CurrentUser::from(identity);
                self.set_state(SessionStatus::Authenticated, user.clone(), None);
                Ok(user)
            }
            Err(error) => {
                let error = Arc::new(error);
                self.tokens.clear_tokens();
                self.set_state(
                    SessionStatus::Unauthenticated,
                    CurrentUser::anonymous(),
                    Some(error.clone()),
                );
                Err(error)
            }
        }
    }

    async fn complete_sign_in(&self, issued: IssuedTokens, persist: Option<bool>) -> AuthOutcome {
        let persist = persist
            .unwrap_or_else(|| self.tokens.persist_preference() == Persistence::Local);
        self.tokens
            .set_tokens(&issued.access_token, &issued.refresh_token, persist);
        match self.fetch_identity().await {
            Ok(user) => AuthOutcome::Success { user },
            Err(error) => AuthOutcome::Failure { error },
        }
    }

    fn fail_sign_in(&self, error: ApiError) -> AuthOutcome {
        let error = Arc::new(error);
        self.set_state(
            SessionStatus::Unauthenticated,
            CurrentUser::anonymous(),
            Some(error.clone()),
        );
        AuthOutcome::Failure { error }
    }

    fn set_loading(&self) {
        let mut state = self.write_state();
        state.status = SessionStatus::Loading;
    }

    fn set_state(&self, status: SessionStatus, user: CurrentUser, error: Option<Arc<ApiError>>) {
        let mut state = self.write_state();
        *state = SessionState { status, user, error };
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
