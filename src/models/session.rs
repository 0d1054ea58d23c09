//! WhatsApp link session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WhatsApp linking or bot session as reported by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Session ids carrying the connected prefix are finished bot sessions,
    /// everything else is an in-progress linking id
    pub fn is_connected(&self, connected_prefix: &str) -> bool {
        self.session_id.starts_with(connected_prefix)
    }
}

/// A file stored under a session, as listed by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// Pending edit for a session; sessions only support deferred deletion,
/// so the patch carries no fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionPatch {}
