//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub api: ApiConfig,
    pub socket: SocketConfig,
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub session: SessionConfig,
    pub likes: LikesConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// Backend REST API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// Push-event channel configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SocketConfig {
    /// WebSocket URL of the push-event endpoint; defaults to the API base
    pub url: Option<String>,
}

/// Local cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Namespace prefix applied to every storage key
    pub prefix: String,
    /// TTL window for cached data snapshots
    pub ttl_seconds: u64,
    /// Directory holding the file-backed store; in-memory when unset
    pub dir: Option<String>,
}

/// Client-side authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// GitHub logins granted (advisory) admin access
    pub admin_logins: Vec<String>,
    /// Rolling expiry for the persisted user
    pub user_ttl_seconds: u64,
    pub max_login_attempts: u32,
    pub lockout_seconds: u64,
}

/// Session-linking configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Seconds a QR code stays scannable before the flow resets
    pub qr_timeout_seconds: u32,
    /// Session ids carrying this prefix are fully connected bot sessions
    pub connected_prefix: String,
}

/// Like batching configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LikesConfig {
    /// Delay before pending likes are flushed to the backend
    pub batch_delay_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub max_files: u32,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    /// Pairing-code flow is degraded backend-side; surface a soft warning
    pub pairing_maintenance_notice: bool,
    pub admin_panel: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("VINSMOKE"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::VinsmokeError> {
        super::validation::validate_settings(self)
    }

    /// Resolved push-event channel URL (falls back to the API base)
    pub fn socket_url(&self) -> String {
        self.socket
            .url
            .clone()
            .unwrap_or_else(|| self.api.base_url.clone())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout_seconds: 30,
            },
            socket: SocketConfig { url: None },
            cache: CacheConfig {
                prefix: "vinsmoke_".to_string(),
                ttl_seconds: 30 * 60,
                dir: None,
            },
            auth: AuthConfig {
                admin_logins: vec![],
                user_ttl_seconds: 24 * 60 * 60,
                max_login_attempts: 5,
                lockout_seconds: 15 * 60,
            },
            session: SessionConfig {
                qr_timeout_seconds: 60,
                connected_prefix: "VINSMOKEm@".to_string(),
            },
            likes: LikesConfig {
                batch_delay_seconds: 5 * 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "./logs".to_string(),
                max_files: 5,
            },
            features: FeaturesConfig {
                pairing_maintenance_notice: true,
                admin_panel: true,
            },
        }
    }
}
