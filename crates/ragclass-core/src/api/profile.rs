//! Typed wrappers for the `/v1/me` endpoint family.

use serde::Serialize;

use crate::models::UserProfile;

use super::{ApiError, HttpClient};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Clone)]
pub struct ProfileApi {
    http: HttpClient,
}

impl ProfileApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn fetch(&self) -> Result<UserProfile, ApiError> {
        self.http.get("/v1/me/profile").await
    }

    pub async fn update(&self, request: &UpdateProfileRequest) -> Result<UserProfile, ApiError> {
        self.http.put("/v1/me/profile", request).await
    }
}
