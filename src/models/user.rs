//! Authenticated user model

use serde::{Deserialize, Serialize};

/// GitHub user as delivered by the OAuth callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub login: String,
    pub avatar_url: String,
}

impl AuthUser {
    /// Structural validation applied before the user is trusted client-side
    pub fn is_valid(&self) -> bool {
        self.id > 0 && !self.login.is_empty() && url::Url::parse(&self.avatar_url).is_ok()
    }
}

/// Claims packed into the advisory bearer token. The token is plain
/// base64 JSON; the server re-checks authorization on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub id: i64,
    pub login: String,
    /// Epoch milliseconds at token construction
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_validation() {
        let valid = AuthUser {
            id: 42,
            login: "sanji".to_string(),
            avatar_url: "https://avatars.githubusercontent.com/u/42".to_string(),
        };
        assert!(valid.is_valid());

        let bad_id = AuthUser { id: 0, ..valid.clone() };
        assert!(!bad_id.is_valid());

        let bad_url = AuthUser {
            avatar_url: "not a url".to_string(),
            ..valid.clone()
        };
        assert!(!bad_url.is_valid());

        let empty_login = AuthUser {
            login: String::new(),
            ..valid
        };
        assert!(!empty_login.is_valid());
    }
}
