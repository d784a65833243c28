//! Typed wrappers for the teacher-side class endpoints.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::warn;

use crate::models::{ClassDetail, ClassMember, ClassSummary};

use super::{ApiError, HttpClient};

/// Maximum concurrent member-list requests when prefetching rosters.
/// Keeps the fan-out polite to the backend without serializing everything.
const MAX_CONCURRENT_REQUESTS: usize = 4;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct ClassesApi {
    http: HttpClient,
}

impl ClassesApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub async fn list(&self) -> Result<Vec<ClassSummary>, ApiError> {
        self.http.get("/v1/teachers/classes").await
    }

    pub async fn create(&self, request: &CreateClassRequest) -> Result<ClassDetail, ApiError> {
        self.http.post("/v1/teachers/classes", request).await
    }

    pub async fn fetch(&self, class_id: &str) -> Result<ClassDetail, ApiError> {
        self.http
            .get(&format!("/v1/teachers/classes/{}", class_id))
            .await
    }

    pub async fn members(&self, class_id: &str) -> Result<Vec<ClassMember>, ApiError> {
        self.http
            .get(&format!("/v1/classes/{}/members", class_id))
            .await
    }

    /// Fetch the rosters for a set of classes with bounded concurrency.
    /// Classes whose member list fails to load are logged and omitted rather
    /// than failing the whole batch.
    pub async fn fetch_all_members(
        &self,
        classes: &[ClassSummary],
    ) -> HashMap<String, Vec<ClassMember>> {
        let results: Vec<(String, Result<Vec<ClassMember>, ApiError>)> =
            stream::iter(classes.iter().map(|class| {
                let class_id = class.class_id.clone();
                async move {
                    let members = self.members(&class_id).await;
                    (class_id, members)
                }
            }))
            .buffer_unordered(MAX_CONCURRENT_REQUESTS)
            .collect()
            .await;

        let mut rosters = HashMap::new();
        for (class_id, result) in results {
            match result {
                Ok(members) => {
                    rosters.insert(class_id, members);
                }
                Err(error) => {
                    warn!(class_id = %class_id, %error, "Failed to fetch class members");
                }
            }
        }
        rosters
    }
}
