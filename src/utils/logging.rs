//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Vinsmoke console.

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "vinsmoke-console.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(())
}

/// Log API errors with context, without payloads
pub fn log_api_error(endpoint: &str, status: Option<u16>, error: &str) {
    error!(
        endpoint = endpoint,
        status = status,
        error = error,
        "API error occurred"
    );
}

/// Log admin actions (edits, saves, deletions)
pub fn log_admin_action(login: &str, action: &str, target: Option<&str>) {
    warn!(
        login = login,
        action = action,
        target = target,
        "Admin action performed"
    );
}

/// Log session-linking lifecycle events
pub fn log_link_event(session_id: Option<&str>, event: &str, detail: Option<&str>) {
    info!(
        session_id = session_id,
        event = event,
        detail = detail,
        "Link flow event"
    );
}

/// Log like-batching activity
pub fn log_like_batch(pending: usize, flushed: usize, success: bool) {
    if success {
        info!(pending = pending, flushed = flushed, "Like batch processed");
    } else {
        warn!(
            pending = pending,
            flushed = flushed,
            "Like batch failed, entries restored"
        );
    }
}
