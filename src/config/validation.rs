//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{Result, VinsmokeError};

use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_api_config(&settings.api)?;
    validate_socket_config(settings)?;
    validate_cache_config(&settings.cache)?;
    validate_auth_config(&settings.auth)?;
    validate_session_config(&settings.session)?;
    validate_likes_config(&settings.likes)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate API configuration
fn validate_api_config(config: &super::ApiConfig) -> Result<()> {
    if config.base_url.is_empty() {
        return Err(VinsmokeError::Config("API base URL is required".to_string()));
    }

    url::Url::parse(&config.base_url)
        .map_err(|e| VinsmokeError::Config(format!("Invalid API base URL: {}", e)))?;

    if config.timeout_seconds == 0 {
        return Err(VinsmokeError::Config(
            "API timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate push-event channel configuration
fn validate_socket_config(settings: &Settings) -> Result<()> {
    url::Url::parse(&settings.socket_url())
        .map_err(|e| VinsmokeError::Config(format!("Invalid socket URL: {}", e)))?;
    Ok(())
}

/// Validate cache configuration
fn validate_cache_config(config: &super::CacheConfig) -> Result<()> {
    if config.prefix.is_empty() {
        return Err(VinsmokeError::Config(
            "Cache key prefix is required".to_string(),
        ));
    }

    if config.ttl_seconds == 0 {
        return Err(VinsmokeError::Config(
            "Cache TTL must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate auth configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.max_login_attempts == 0 {
        return Err(VinsmokeError::Config(
            "Max login attempts must be greater than 0".to_string(),
        ));
    }

    if config.user_ttl_seconds == 0 {
        return Err(VinsmokeError::Config(
            "User TTL must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate session-linking configuration
fn validate_session_config(config: &super::SessionConfig) -> Result<()> {
    if config.qr_timeout_seconds == 0 {
        return Err(VinsmokeError::Config(
            "QR timeout must be greater than 0".to_string(),
        ));
    }

    if config.connected_prefix.is_empty() {
        return Err(VinsmokeError::Config(
            "Connected-session prefix is required".to_string(),
        ));
    }

    Ok(())
}

/// Validate like batching configuration
fn validate_likes_config(config: &super::LikesConfig) -> Result<()> {
    if config.batch_delay_seconds == 0 {
        return Err(VinsmokeError::Config(
            "Like batch delay must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(VinsmokeError::Config("Logging level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    let base_level = config.level.split(',').next().unwrap_or("");
    if !valid_levels.contains(&base_level) && !base_level.contains('=') {
        return Err(VinsmokeError::Config(format!(
            "Invalid logging level: {}",
            config.level
        )));
    }

    Ok(())
}
