use serde::{Deserialize, Serialize};

use crate::api::auth::Identity;

/// The signed-in user as the session controller sees it.
///
/// An anonymous user is a sentinel with empty identity fields rather than an
/// `Option<CurrentUser>`, so consumers never have to null-check before
/// reading `roles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl CurrentUser {
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            email: None,
            roles: Vec::new(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl From<Identity> for CurrentUser {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: Some(identity.user_id),
            email: Some(identity.email),
            roles: identity.roles,
        }
    }
}

/// Profile record behind `/v1/me/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserProfile {
    /// "First Last", falling back to the email when no name is set.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_user_is_never_null() {
        let user = CurrentUser::anonymous();
        assert!(user.is_anonymous());
        assert!(user.roles.is_empty());
        assert!(!user.has_role("Teacher"));
    }

    #[test]
    fn test_current_user_from_identity() {
        let identity = Identity {
            user_id: "u1".to_string(),
            email: "a@b.com".to_string(),
            roles: vec!["Teacher".to_string()],
        };
        let user = CurrentUser::from(identity);
        assert!(!user.is_anonymous());
        assert!(user.has_role("Teacher"));
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_profile_display_name_fallback() {
        let mut profile = UserProfile {
            user_id: "u1".to_string(),
            email: "a@b.com".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            roles: vec![],
        };
        assert_eq!(profile.display_name(), "Ada Lovelace");

        profile.first_name = None;
        profile.last_name = None;
        assert_eq!(profile.display_name(), "a@b.com");
    }
}
