//! Vinsmoke Console
//!
//! Client core and headless admin console for the Vinsmoke WhatsApp bot
//! hosting platform. This library provides the cached data providers, the
//! admin pending-edit overlay, the like batching queue and the QR /
//! pairing session-linking flow that the console surfaces are built on.

pub mod api;
pub mod cache;
pub mod config;
pub mod link;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, VinsmokeError};

// Re-export main components for easy access
pub use cache::DataCache;
pub use link::{LinkFlow, LinkMachine, LinkMode, LinkState};
pub use services::{AdminDataProvider, AuthService, LikeQueue, PublicDataProvider, ServiceFactory};
pub use storage::{FileStore, MemoryStore, StoragePort};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
