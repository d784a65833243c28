//! Single choke point for outbound calls to the RagClass backend.
//!
//! Every typed endpoint module funnels through `HttpClient`, which attaches
//! the stored access token as a bearer credential and transparently performs
//! a one-shot refresh-and-retry when a request comes back 401.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::{Persistence, TokenStore};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshedTokens {
    access_token: String,
    refresh_token: String,
}

/// HTTP client wrapper for the RagClass API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    tokens: Arc<TokenStore>,
}

impl HttpClient {
    /// Create a client targeting `base_url`, reading credentials from
    /// `tokens` before every request.
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenStore>) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn token_store(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        Self::decode(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Self::decode(response).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        Self::decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    /// POST where the response body is ignored (e.g. logout notification).
    pub async fn post_empty<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        self.send(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    /// Run the request pipeline: attach the current access token, and on a
    /// 401 perform the refresh exchange and resubmit the original request
    /// exactly once. Concurrent 401s each refresh independently; there is no
    /// shared in-flight-refresh lock.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.dispatch(method.clone(), &url, body).await?;
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            self.refresh_and_store().await?;
            debug!(url = %url, "Retrying request with refreshed access token");
            self.dispatch(method, &url, body).await?
        } else {
            response
        };

        Self::check_response(response).await
    }

    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let mut request = self.client.request(method, url);
        if let Some(token) = self.tokens.access_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Exchange the stored refresh token for a new pair and persist it under
    /// the last-known durability preference. With no refresh token on hand
    /// the original 401 stands; a failed exchange clears all credentials and
    /// surfaces as a distinct session-expired condition.
    async fn refresh_and_store(&self) -> Result<(), ApiError> {
        let Some(refresh_token) = self.tokens.refresh_token() else {
            return Err(ApiError::Unauthorized);
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(pair) => {
                let persist = self.tokens.persist_preference() == Persistence::Local;
                self.tokens
                    .set_tokens(&pair.access_token, &pair.refresh_token, persist);
                Ok(())
            }
            Err(error) => {
                warn!(%error, "Refresh token exchange failed; clearing stored credentials");
                self.tokens.clear_tokens();
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Call the refresh endpoint on the inner client directly, bypassing the
    /// request pipeline to avoid recursive interception.
    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<RefreshedTokens, ApiError> {
        let url = format!("{}/auth/refresh", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::decode(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}
