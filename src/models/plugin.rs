//! Plugin model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Plugin categories offered in the gallery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Sticker,
    Media,
    Fun,
}

/// Moderation status; submissions start out pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    pub author: String,
    pub gist_link: String,
    #[serde(default)]
    pub status: PluginStatus,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub liked_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields a plugin submission carries before the server assigns an id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDraft {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub plugin_type: PluginType,
    pub author: String,
    pub gist_link: String,
}

/// Field-wise pending edit applied over a snapshot plugin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub plugin_type: Option<PluginType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gist_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PluginStatus>,
}

impl PluginPatch {
    /// Later patch fields override earlier ones, untouched fields survive
    pub fn merge(mut self, other: PluginPatch) -> PluginPatch {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.description.is_some() {
            self.description = other.description;
        }
        if other.plugin_type.is_some() {
            self.plugin_type = other.plugin_type;
        }
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.gist_link.is_some() {
            self.gist_link = other.gist_link;
        }
        if other.status.is_some() {
            self.status = other.status;
        }
        self
    }

    /// Apply the patch to a snapshot plugin, yielding the effective record
    pub fn apply(&self, base: &Plugin) -> Plugin {
        let mut merged = base.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(plugin_type) = self.plugin_type {
            merged.plugin_type = plugin_type;
        }
        if let Some(author) = &self.author {
            merged.author = author.clone();
        }
        if let Some(gist_link) = &self.gist_link {
            merged.gist_link = gist_link.clone();
        }
        if let Some(status) = self.status {
            merged.status = status;
        }
        merged
    }

    /// Patch that only changes the moderation status
    pub fn status(status: PluginStatus) -> PluginPatch {
        PluginPatch {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plugin() -> Plugin {
        Plugin {
            id: "plg_1".to_string(),
            name: "Sticker Maker".to_string(),
            description: "Turns images into stickers".to_string(),
            plugin_type: PluginType::Sticker,
            author: "sanji".to_string(),
            gist_link: "https://gist.github.com/sanji/abc".to_string(),
            status: PluginStatus::Pending,
            likes: 2,
            liked_by: vec!["u1".to_string(), "u2".to_string()],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_apply_overrides_only_given_fields() {
        let plugin = sample_plugin();
        let patch = PluginPatch {
            status: Some(PluginStatus::Approved),
            ..Default::default()
        };

        let effective = patch.apply(&plugin);
        assert_eq!(effective.status, PluginStatus::Approved);
        assert_eq!(effective.name, plugin.name);
        assert_eq!(effective.likes, plugin.likes);
    }

    #[test]
    fn test_patch_merge_last_write_wins() {
        let first = PluginPatch {
            name: Some("Old".to_string()),
            status: Some(PluginStatus::Rejected),
            ..Default::default()
        };
        let second = PluginPatch {
            name: Some("New".to_string()),
            ..Default::default()
        };

        let merged = first.merge(second);
        assert_eq!(merged.name.as_deref(), Some("New"));
        assert_eq!(merged.status, Some(PluginStatus::Rejected));
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(sample_plugin()).unwrap();
        assert!(json.get("gistLink").is_some());
        assert!(json.get("likedBy").is_some());
        assert_eq!(json["type"], "sticker");
    }
}
