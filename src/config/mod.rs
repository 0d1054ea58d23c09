//! Configuration module
//!
//! Settings loading, structure definitions and validation.

pub mod settings;
pub mod validation;

pub use settings::{
    ApiConfig, AuthConfig, CacheConfig, FeaturesConfig, LikesConfig, LoggingConfig,
    SessionConfig, Settings, SocketConfig,
};
