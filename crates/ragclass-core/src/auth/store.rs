//! Two-tier credential storage for the access/refresh token pair.
//!
//! The platform lets a user choose whether a sign-in should survive beyond
//! the current run ("remember me"). The persistent tier is a JSON file under
//! the state directory; the per-session tier lives in process memory and
//! dies with it. At most one tier holds the pair at any time.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Token file name in the state directory
const TOKEN_FILE: &str = "tokens.json";

/// Storage tier for the credential pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Survives process restarts (token file on disk).
    Persistent,
    /// Lives for the current process only.
    PerSession,
}

/// Durability preference recorded alongside the tokens. Sticky across
/// sign-ins: a login without an explicit choice reuses the previous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persistence {
    Local,
    Session,
}

impl Persistence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persistence::Local => "local",
            Persistence::Session => "session",
        }
    }

    /// Parse a recorded preference, defaulting to `Local` for anything
    /// unrecognized.
    pub fn parse(value: &str) -> Self {
        match value {
            "session" => Persistence::Session,
            _ => Persistence::Local,
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            Persistence::Local => Tier::Persistent,
            Persistence::Session => Tier::PerSession,
        }
    }
}

/// On-disk shape of the persistent tier. Field names match the storage keys
/// the platform has always used.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedTokens {
    #[serde(rename = "auth.accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(rename = "auth.refreshToken", skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(rename = "auth.persistence", skip_serializing_if = "Option::is_none")]
    persistence: Option<Persistence>,
}

#[derive(Debug, Default)]
struct SessionSlots {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Durable key/value storage for the credential pair.
///
/// All methods take `&self`; the per-session tier sits behind a lock so the
/// store can be shared across tasks. `set_tokens` and `clear_tokens` are the
/// only mutators and both act as clear-then-write, so the one-tier invariant
/// holds for any reader on the same store.
pub struct TokenStore {
    token_path: PathBuf,
    session: RwLock<SessionSlots>,
}

impl TokenStore {
    /// Create a store backed by `<state_dir>/tokens.json`. The directory is
    /// created lazily on first write.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            token_path: state_dir.into().join(TOKEN_FILE),
            session: RwLock::new(SessionSlots::default()),
        }
    }

    /// Write the pair into the tier selected by `persist` (true → persistent,
    /// false → per-session), clearing the other tier first, and record the
    /// durability preference. Storage failures are logged and swallowed: a
    /// failed write must not take down an otherwise-successful sign-in.
    pub fn set_tokens(&self, access_token: &str, refresh_token: &str, persist: bool) {
        let mode = if persist {
            Persistence::Local
        } else {
            Persistence::Session
        };

        let mut slots = self.write_slots();
        slots.access_token = None;
        slots.refresh_token = None;

        let mut file = self.load_file();
        file.access_token = None;
        file.refresh_token = None;
        file.persistence = Some(mode);
        match mode.tier() {
            Tier::Persistent => {
                file.access_token = Some(access_token.to_owned());
                file.refresh_token = Some(refresh_token.to_owned());
            }
            Tier::PerSession => {
                slots.access_token = Some(access_token.to_owned());
                slots.refresh_token = Some(refresh_token.to_owned());
            }
        }
        self.save_file(&file);
    }

    /// Remove the pair from both tiers. Idempotent; the recorded durability
    /// preference is kept.
    pub fn clear_tokens(&self) {
        let mut slots = self.write_slots();
        slots.access_token = None;
        slots.refresh_token = None;

        let mut file = self.load_file();
        if file.access_token.is_some() || file.refresh_token.is_some() {
            file.access_token = None;
            file.refresh_token = None;
            self.save_file(&file);
        }
    }

    /// Read-through accessor: persistent tier first, then per-session.
    pub fn access_token(&self) -> Option<String> {
        if let Some(token) = self.load_file().access_token {
            return Some(token);
        }
        self.read_slots().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        if let Some(token) = self.load_file().refresh_token {
            return Some(token);
        }
        self.read_slots().refresh_token.clone()
    }

    /// Last recorded durability preference, defaulting to `Local`.
    pub fn persist_preference(&self) -> Persistence {
        self.load_file().persistence.unwrap_or(Persistence::Local)
    }

    fn load_file(&self) -> PersistedTokens {
        match std::fs::read_to_string(&self.token_path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => PersistedTokens::default(),
        }
    }

    fn save_file(&self, file: &PersistedTokens) {
        if let Err(error) = self.try_save_file(file) {
            warn!(path = %self.token_path.display(), %error, "Failed to write token file");
        }
    }

    fn try_save_file(&self, file: &PersistedTokens) -> std::io::Result<()> {
        if let Some(parent) = self.token_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.token_path, contents)
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    fn read_slots(&self) -> RwLockReadGuard<'_, SessionSlots> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slots(&self) -> RwLockWriteGuard<'_, SessionSlots> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static TEST_DIR_SEQ: AtomicUsize = AtomicUsize::new(0);

    fn test_dir() -> PathBuf {
        let seq = TEST_DIR_SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "ragclass-store-test-{}-{}",
            std::process::id(),
            seq
        ))
    }

    #[test]
    fn test_default_preference_is_local() {
        let store = TokenStore::new(test_dir());
        assert_eq!(store.persist_preference(), Persistence::Local);
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn test_persistent_tier_round_trip() {
        let dir = test_dir();
        let store = TokenStore::new(&dir);
        store.set_tokens("access-local", "refresh-local", true);

        assert_eq!(store.access_token().as_deref(), Some("access-local"));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-local"));
        assert_eq!(store.persist_preference(), Persistence::Local);

        // A fresh store over the same directory sees the persistent tier.
        let reopened = TokenStore::new(&dir);
        assert_eq!(reopened.access_token().as_deref(), Some("access-local"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("refresh-local"));
    }

    #[test]
    fn test_session_tier_does_not_persist() {
        let dir = test_dir();
        let store = TokenStore::new(&dir);
        store.set_tokens("access-session", "refresh-session", false);

        assert_eq!(store.access_token().as_deref(), Some("access-session"));
        assert_eq!(store.persist_preference(), Persistence::Session);

        // The per-session tier dies with the store instance.
        let reopened = TokenStore::new(&dir);
        assert_eq!(reopened.access_token(), None);
        assert_eq!(reopened.refresh_token(), None);
        // But the preference is recorded in the persistent tier.
        assert_eq!(reopened.persist_preference(), Persistence::Session);
    }

    #[test]
    fn test_tiers_are_mutually_exclusive() {
        let dir = test_dir();
        let store = TokenStore::new(&dir);
        store.set_tokens("first", "first-refresh", true);
        store.set_tokens("second", "second-refresh", false);

        // Last write wins; the persistent tier was cleared.
        assert_eq!(store.access_token().as_deref(), Some("second"));
        let reopened = TokenStore::new(&dir);
        assert_eq!(reopened.access_token(), None);

        // And back the other way.
        store.set_tokens("third", "third-refresh", true);
        assert_eq!(store.access_token().as_deref(), Some("third"));
        assert_eq!(store.persist_preference(), Persistence::Local);
    }

    #[test]
    fn test_clear_tokens_is_idempotent() {
        let dir = test_dir();
        let store = TokenStore::new(&dir);
        store.set_tokens("token", "refresh", true);
        store.set_tokens("session-token", "session-refresh", false);

        store.clear_tokens();
        store.clear_tokens();

        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
        // Preference survives a clear.
        assert_eq!(store.persist_preference(), Persistence::Session);
    }

    #[test]
    fn test_persistence_string_forms() {
        assert_eq!(Persistence::Local.as_str(), "local");
        assert_eq!(Persistence::Session.as_str(), "session");
        assert_eq!(Persistence::parse("session"), Persistence::Session);
        assert_eq!(Persistence::parse("local"), Persistence::Local);
        assert_eq!(Persistence::parse("garbage"), Persistence::Local);
        assert_eq!(Persistence::Local.tier(), Tier::Persistent);
        assert_eq!(Persistence::Session.tier(), Tier::PerSession);
    }
}
