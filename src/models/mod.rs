//! Data models
//!
//! Wire-facing types shared between the REST client, the providers and the
//! admin pending-edit overlay.

pub mod faq;
pub mod plugin;
pub mod session;
pub mod user;

pub use faq::{Faq, FaqDraft, FaqPatch};
pub use plugin::{Plugin, PluginDraft, PluginPatch, PluginStatus, PluginType};
pub use session::{Session, SessionFile, SessionPatch};
pub use user::{AuthUser, TokenClaims};

use serde::{Deserialize, Serialize};

/// Aggregate counters shown on the admin dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default)]
    pub total_plugins: u64,
    #[serde(default)]
    pub pending_plugins: u64,
    // The backend spells this one with FAQ fully capitalized
    #[serde(default, rename = "totalFAQs")]
    pub total_faqs: u64,
}

/// Authoritative last-fetched-from-server admin state.
/// Replaced wholesale on refresh, never mutated in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminSnapshot {
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub plugins: Vec<Plugin>,
    #[serde(default)]
    pub faqs: Vec<Faq>,
}

/// Aggregate payload of the public-data endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicData {
    #[serde(default)]
    pub faqs: Vec<Faq>,
    #[serde(default)]
    pub plugins: Vec<Plugin>,
    #[serde(default)]
    pub categories: Vec<String>,
}
