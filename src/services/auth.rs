//! Authentication service
//!
//! Client-side auth state: the persisted GitHub user with a rolling expiry,
//! the advisory bearer token attached to admin calls, and a persisted
//! login-attempt limiter. None of this is a security boundary; the backend
//! re-checks authorization on every request.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::models::{AuthUser, TokenClaims};
use crate::storage::StoragePort;
use crate::utils::errors::{Result, VinsmokeError};

const USER_KEY: &str = "user";
const ATTEMPTS_KEY_PREFIX: &str = "login_attempts_";

/// Expiring envelope around every persisted auth item
#[derive(Debug, Serialize, Deserialize)]
struct StoredItem {
    value: serde_json::Value,
    /// Epoch milliseconds at write time
    timestamp: i64,
    /// Lifetime in milliseconds
    expiry: i64,
}

/// Persisted failed-login counter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AttemptRecord {
    count: u32,
    /// Epoch milliseconds of the latest failure
    last_attempt: i64,
}

/// Outcome of recording a login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptStatus {
    pub allowed: bool,
    pub remaining: u32,
    /// Epoch milliseconds until which the identifier is locked out
    pub locked_until: Option<i64>,
}

/// Authentication service for client-side auth state
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn StoragePort>,
    settings: Settings,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(store: Arc<dyn StoragePort>, settings: Settings) -> Self {
        Self { store, settings }
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.settings.cache.prefix, key)
    }

    /// Persist an item under the namespace with a lifetime
    fn set_expiring<T: Serialize>(&self, key: &str, value: &T, expiry_ms: i64) -> Result<()> {
        let item = StoredItem {
            value: serde_json::to_value(value)?,
            timestamp: Utc::now().timestamp_millis(),
            expiry: expiry_ms,
        };
        self.store
            .set_item(&self.full_key(key), &serde_json::to_string(&item)?)
    }

    /// Read an item back; expired or unreadable entries are removed
    fn get_expiring<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.full_key(key);
        let raw = self.store.get_item(&full_key).ok().flatten()?;

        let item: StoredItem = match serde_json::from_str(&raw) {
            Ok(item) => item,
            Err(e) => {
                warn!(key = %full_key, error = %e, "Removing unreadable auth item");
                let _ = self.store.remove_item(&full_key);
                return None;
            }
        };

        if item.timestamp + item.expiry < Utc::now().timestamp_millis() {
            debug!(key = %full_key, "Auth item expired");
            let _ = self.store.remove_item(&full_key);
            return None;
        }

        serde_json::from_value(item.value).ok()
    }

    // User persistence

    /// Persist the signed-in user with the rolling expiry window
    pub fn store_user(&self, user: &AuthUser) -> Result<()> {
        if !user.is_valid() {
            return Err(VinsmokeError::InvalidInput(
                "Invalid user data".to_string(),
            ));
        }
        let expiry_ms = (self.settings.auth.user_ttl_seconds as i64) * 1000;
        self.set_expiring(USER_KEY, user, expiry_ms)?;
        info!(login = %user.login, "User persisted");
        Ok(())
    }

    /// The signed-in user, if any and not expired
    pub fn current_user(&self) -> Option<AuthUser> {
        let user: AuthUser = self.get_expiring(USER_KEY)?;
        if user.is_valid() {
            Some(user)
        } else {
            let _ = self.store.remove_item(&self.full_key(USER_KEY));
            None
        }
    }

    /// Drop all client-side auth and cache state
    pub fn logout(&self) {
        match self.store.clear_prefix(&self.settings.cache.prefix) {
            Ok(removed) => info!(removed = removed, "Local auth state cleared"),
            Err(e) => warn!(error = %e, "Failed to clear local auth state"),
        }
    }

    /// 401 handling: identical wipe, different log line
    pub fn handle_auth_expired(&self) {
        warn!("Authentication expired, clearing local state");
        self.logout();
    }

    // Admin checks (advisory only)

    /// Check the configured admin list. Advisory; the backend decides.
    pub fn is_admin(&self, user: &AuthUser) -> bool {
        self.settings
            .auth
            .admin_logins
            .iter()
            .any(|login| login.eq_ignore_ascii_case(&user.login))
    }

    /// Bearer token for admin calls: base64 JSON of `{id, login, timestamp}`
    pub fn auth_token(&self) -> Result<String> {
        let user = self.current_user().ok_or(VinsmokeError::NotAuthenticated)?;

        if !self.is_admin(&user) {
            return Err(VinsmokeError::PermissionDenied(format!(
                "{} is not in the admin list",
                user.login
            )));
        }

        let claims = TokenClaims {
            id: user.id,
            login: user.login,
            timestamp: Utc::now().timestamp_millis(),
        };
        Ok(BASE64.encode(serde_json::to_vec(&claims)?))
    }

    /// Decode and structurally validate a bearer token
    pub fn decode_token(&self, token: &str) -> Option<TokenClaims> {
        let bytes = BASE64.decode(token).ok()?;
        let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
        if claims.id > 0 && !claims.login.is_empty() {
            Some(claims)
        } else {
            None
        }
    }

    /// Consume the user object delivered by the OAuth callback: gate on
    /// the lockout window, validate, persist, reset the attempt counter
    pub fn complete_login(&self, user: &AuthUser) -> Result<()> {
        self.ensure_not_locked(&user.login)?;

        if !user.is_valid() {
            self.record_login_attempt(&user.login, false);
            return Err(VinsmokeError::InvalidInput("Invalid user data".to_string()));
        }

        self.store_user(user)?;
        self.record_login_attempt(&user.login, true);
        Ok(())
    }

    /// OAuth entry point; the backend handles the GitHub redirect dance
    pub fn github_login_url(&self) -> String {
        format!(
            "{}/auth/github",
            self.settings.api.base_url.trim_end_matches('/')
        )
    }

    // Login limiter

    fn attempts_key(identifier: &str) -> String {
        format!("{}{}", ATTEMPTS_KEY_PREFIX, identifier)
    }

    fn attempts(&self, identifier: &str) -> AttemptRecord {
        self.get_expiring(&Self::attempts_key(identifier))
            .unwrap_or_default()
    }

    /// Record a login attempt; failures count toward the lockout window,
    /// success resets the counter
    pub fn record_login_attempt(&self, identifier: &str, success: bool) -> AttemptStatus {
        let max = self.settings.auth.max_login_attempts;
        let lockout_ms = (self.settings.auth.lockout_seconds as i64) * 1000;

        if success {
            let _ = self
                .store
                .remove_item(&self.full_key(&Self::attempts_key(identifier)));
            return AttemptStatus {
                allowed: true,
                remaining: max,
                locked_until: None,
            };
        }

        let previous = self.attempts(identifier);
        let record = AttemptRecord {
            count: previous.count + 1,
            last_attempt: Utc::now().timestamp_millis(),
        };

        if let Err(e) = self.set_expiring(&Self::attempts_key(identifier), &record, lockout_ms) {
            warn!(identifier = identifier, error = %e, "Failed to persist login attempts");
        }

        let locked = record.count >= max;
        if locked {
            warn!(identifier = identifier, count = record.count, "Login identifier locked out");
        }

        AttemptStatus {
            allowed: !locked,
            remaining: max.saturating_sub(record.count),
            locked_until: locked.then(|| record.last_attempt + lockout_ms),
        }
    }

    /// Check whether an identifier is currently locked out
    pub fn is_locked(&self, identifier: &str) -> bool {
        let record = self.attempts(identifier);
        if record.count < self.settings.auth.max_login_attempts {
            return false;
        }
        let lockout_ms = (self.settings.auth.lockout_seconds as i64) * 1000;
        Utc::now().timestamp_millis() < record.last_attempt + lockout_ms
    }

    /// Gate a login attempt on the lockout window
    pub fn ensure_not_locked(&self, identifier: &str) -> Result<()> {
        if !self.is_locked(identifier) {
            return Ok(());
        }
        let record = self.attempts(identifier);
        let lockout_ms = (self.settings.auth.lockout_seconds as i64) * 1000;
        let seconds_remaining =
            (record.last_attempt + lockout_ms - Utc::now().timestamp_millis()).max(0) / 1000;
        Err(VinsmokeError::LoginLocked { seconds_remaining })
    }

    /// Random base64 nonce (16 bytes)
    pub fn generate_nonce(&self) -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        BASE64.encode(bytes)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("prefix", &self.settings.cache.prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn test_service(admin_logins: Vec<String>) -> AuthService {
        let mut settings = Settings::default();
        settings.auth.admin_logins = admin_logins;
        AuthService::new(Arc::new(MemoryStore::new()), settings)
    }

    fn sample_user() -> AuthUser {
        AuthUser {
            id: 42,
            login: "sanji".to_string(),
            avatar_url: "https://avatars.githubusercontent.com/u/42".to_string(),
        }
    }

    #[test]
    fn test_user_roundtrip() {
        let service = test_service(vec![]);
        service.store_user(&sample_user()).unwrap();
        assert_eq!(service.current_user(), Some(sample_user()));

        service.logout();
        assert_eq!(service.current_user(), None);
    }

    #[test]
    fn test_token_requires_admin() {
        let service = test_service(vec![]);
        service.store_user(&sample_user()).unwrap();
        assert!(matches!(
            service.auth_token(),
            Err(VinsmokeError::PermissionDenied(_))
        ));

        let admin = test_service(vec!["sanji".to_string()]);
        admin.store_user(&sample_user()).unwrap();
        let token = admin.auth_token().unwrap();

        let claims = admin.decode_token(&token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.login, "sanji");
    }

    #[test]
    fn test_token_without_user() {
        let service = test_service(vec!["sanji".to_string()]);
        assert!(matches!(
            service.auth_token(),
            Err(VinsmokeError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let service = test_service(vec![]);
        assert!(service.decode_token("not base64!!").is_none());
        assert!(service.decode_token(&BASE64.encode(b"{\"id\":0,\"login\":\"\",\"timestamp\":1}")).is_none());
    }

    #[test]
    fn test_lockout_after_max_failures() {
        let service = test_service(vec![]);

        for _ in 0..4 {
            let status = service.record_login_attempt("sanji", false);
            assert!(status.allowed);
        }
        assert!(!service.is_locked("sanji"));

        let status = service.record_login_attempt("sanji", false);
        assert!(!status.allowed);
        assert_eq!(status.remaining, 0);
        assert!(status.locked_until.is_some());
        assert!(service.is_locked("sanji"));

        // Success resets the counter
        let status = service.record_login_attempt("sanji", true);
        assert!(status.allowed);
        assert!(!service.is_locked("sanji"));
    }

    #[test]
    fn test_locked_identifier_cannot_complete_login() {
        let service = test_service(vec![]);
        for _ in 0..5 {
            service.record_login_attempt("sanji", false);
        }

        let err = service.complete_login(&sample_user()).unwrap_err();
        assert!(matches!(err, VinsmokeError::LoginLocked { seconds_remaining } if seconds_remaining > 0));
        assert!(service.current_user().is_none());
    }

    #[test]
    fn test_complete_login_persists_and_resets_counter() {
        let service = test_service(vec![]);
        service.record_login_attempt("sanji", false);

        service.complete_login(&sample_user()).unwrap();
        assert!(service.current_user().is_some());
        assert!(!service.is_locked("sanji"));
    }

    #[test]
    fn test_nonce_is_random() {
        let service = test_service(vec![]);
        assert_ne!(service.generate_nonce(), service.generate_nonce());
    }

    #[test]
    fn test_github_login_url() {
        let service = test_service(vec![]);
        assert_eq!(service.github_login_url(), "http://localhost:8080/auth/github");
    }
}
