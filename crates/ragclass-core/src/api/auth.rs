//! Typed wrappers for the `/auth` endpoint family.

use serde::{Deserialize, Serialize};

use super::{ApiError, HttpClient};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Credential pair plus identity hints issued by login and register.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// The authoritative "who am I" answer from the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<IssuedTokens, ApiError> {
        self.http.post("/auth/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<IssuedTokens, ApiError> {
        self.http.post("/auth/register", request).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        self.http
            .post("/auth/refresh", &serde_json::json!({ "refreshToken": refresh_token }))
            .await
    }

    /// Response body is ignored; the backend only needs the refresh token to
    /// revoke it.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), ApiError> {
        self.http
            .post_empty("/auth/logout", &serde_json::json!({ "refreshToken": refresh_token }))
            .await
    }

    pub async fn me(&self) -> Result<Identity, ApiError> {
        self.http.get("/auth/me").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_omits_absent_names() {
        let request = RegisterRequest {
            email: "a@b.com".to_string(),
            password: "secret".to_string(),
            first_name: None,
            last_name: None,
        };
        let json = serde_json::to_string(&request).expect("serialize register request");
        assert!(!json.contains("firstName"));
        assert!(!json.contains("lastName"));
    }

    #[test]
    fn test_identity_roles_default_to_empty() {
        let identity: Identity =
            serde_json::from_str(r#"{"userId":"u1","email":"a@b.com"}"#).expect("parse identity");
        assert_eq!(identity.user_id, "u1");
        assert!(identity.roles.is_empty());
    }

    #[test]
    fn test_issued_tokens_parse_wire_format() {
        let issued: IssuedTokens = serde_json::from_str(
            r#"{"accessToken":"acc","refreshToken":"ref","userId":"u1","email":"a@b.com"}"#,
        )
        .expect("parse issued tokens");
        assert_eq!(issued.access_token, "acc");
        assert_eq!(issued.refresh_token, "ref");
    }
}
