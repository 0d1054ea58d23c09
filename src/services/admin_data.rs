//! Admin data provider
//!
//! Holds the authoritative admin snapshot plus a typed pending-edit overlay.
//! Edits, deletions and additions accumulate client-side and are applied
//! server-side as one batched change-set; the UI only ever sees effective
//! records (snapshot merged with pending changes), never the raw snapshot.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::api::{AdminApi, ChangeOp, EntityKind};
use crate::cache::{self, DataCache};
use crate::models::{
    AdminSnapshot, Faq, FaqDraft, FaqPatch, Plugin, PluginPatch, Session, SessionPatch, Stats,
};
use crate::utils::errors::Result;
use crate::utils::helpers::generate_temp_id;

/// A client-side change not yet confirmed by the server
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange<P> {
    /// Field-wise edit of a snapshot entity
    Update(P),
    /// Tombstone; the snapshot entity stays put until save
    Delete,
    /// Client-only entity under a temporary id
    Create(P),
}

/// Patch types that can absorb a later patch
pub trait PatchMerge: Sized {
    fn merge_with(self, other: Self) -> Self;
}

impl PatchMerge for FaqPatch {
    fn merge_with(self, other: Self) -> Self {
        self.merge(other)
    }
}

impl PatchMerge for PluginPatch {
    fn merge_with(self, other: Self) -> Self {
        self.merge(other)
    }
}

impl PatchMerge for SessionPatch {
    fn merge_with(self, _other: Self) -> Self {
        self
    }
}

/// Unsaved changes per entity family, keyed by entity id
#[derive(Debug, Default)]
pub struct PendingChanges {
    pub faqs: HashMap<String, PendingChange<FaqPatch>>,
    pub plugins: HashMap<String, PendingChange<PluginPatch>>,
    pub sessions: HashMap<String, PendingChange<SessionPatch>>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.faqs.is_empty() && self.plugins.is_empty() && self.sessions.is_empty()
    }

    pub fn count(&self) -> usize {
        self.faqs.len() + self.plugins.len() + self.sessions.len()
    }

    fn clear(&mut self) {
        self.faqs.clear();
        self.plugins.clear();
        self.sessions.clear();
    }
}

/// Merge a new edit into a pending map. A tombstoned id becomes an update
/// again (undelete + edit); an unsaved creation keeps accumulating fields.
fn merge_update<P: PatchMerge>(
    map: &mut HashMap<String, PendingChange<P>>,
    id: &str,
    patch: P,
) {
    let next = match map.remove(id) {
        Some(PendingChange::Update(prev)) => PendingChange::Update(prev.merge_with(patch)),
        Some(PendingChange::Create(prev)) => PendingChange::Create(prev.merge_with(patch)),
        Some(PendingChange::Delete) | None => PendingChange::Update(patch),
    };
    map.insert(id.to_string(), next);
}

/// Tombstone an id. Deleting an unsaved creation removes it outright,
/// deleting twice stays a single tombstone.
fn merge_delete<P>(map: &mut HashMap<String, PendingChange<P>>, id: &str) {
    match map.remove(id) {
        Some(PendingChange::Create(_)) => {}
        _ => {
            map.insert(id.to_string(), PendingChange::Delete);
        }
    }
}

/// Provider for the admin dashboard dataset
pub struct AdminDataProvider {
    api: AdminApi,
    cache: DataCache,
    snapshot: AdminSnapshot,
    pending: PendingChanges,
    has_unsaved: bool,
    loaded: bool,
}

impl AdminDataProvider {
    pub fn new(api: AdminApi, cache: DataCache) -> Self {
        Self {
            api,
            cache,
            snapshot: AdminSnapshot::default(),
            pending: PendingChanges::default(),
            has_unsaved: false,
            loaded: false,
        }
    }

    /// Fetch the bulk snapshot and replace local state wholesale. All
    /// pending changes are dropped; with `force == false` a live cached
    /// snapshot short-circuits the network call.
    pub async fn refresh(&mut self, force: bool) -> Result<()> {
        if !force {
            if let Some(cached) = self.cache.get::<AdminSnapshot>(cache::ADMIN_DATA) {
                info!("Admin snapshot served from cache");
                self.replace_snapshot(cached);
                return Ok(());
            }
        }

        let snapshot = self.api.admin_data().await?;
        self.cache.set(cache::ADMIN_DATA, &snapshot);
        info!(
            sessions = snapshot.sessions.len(),
            plugins = snapshot.plugins.len(),
            faqs = snapshot.faqs.len(),
            "Admin snapshot fetched"
        );
        self.replace_snapshot(snapshot);
        Ok(())
    }

    fn replace_snapshot(&mut self, snapshot: AdminSnapshot) {
        self.snapshot = snapshot;
        self.pending.clear();
        self.has_unsaved = false;
        self.loaded = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn stats(&self) -> &Stats {
        &self.snapshot.stats
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved
    }

    pub fn pending_count(&self) -> usize {
        self.pending.count()
    }

    // Edit operations

    pub fn update_faq(&mut self, id: &str, patch: FaqPatch) {
        merge_update(&mut self.pending.faqs, id, patch);
        self.has_unsaved = true;
        debug!(id = id, "FAQ edit buffered");
    }

    pub fn delete_faq(&mut self, id: &str) {
        merge_delete(&mut self.pending.faqs, id);
        self.has_unsaved = !self.pending.is_empty();
        debug!(id = id, "FAQ deletion buffered");
    }

    /// Buffer a brand-new FAQ under a temporary id; returns the id so the
    /// caller can keep editing the entry before saving
    pub fn add_faq(&mut self, draft: FaqDraft) -> String {
        let temp_id = generate_temp_id();
        self.pending.faqs.insert(
            temp_id.clone(),
            PendingChange::Create(FaqPatch::from_draft(&draft)),
        );
        self.has_unsaved = true;
        debug!(id = %temp_id, "FAQ creation buffered");
        temp_id
    }

    pub fn update_plugin(&mut self, id: &str, patch: PluginPatch) {
        merge_update(&mut self.pending.plugins, id, patch);
        self.has_unsaved = true;
        debug!(id = id, "Plugin edit buffered");
    }

    pub fn delete_plugin(&mut self, id: &str) {
        merge_delete(&mut self.pending.plugins, id);
        self.has_unsaved = !self.pending.is_empty();
        debug!(id = id, "Plugin deletion buffered");
    }

    pub fn delete_session(&mut self, session_id: &str) {
        merge_delete(&mut self.pending.sessions, session_id);
        self.has_unsaved = !self.pending.is_empty();
        debug!(session_id = session_id, "Session deletion buffered");
    }

    // Effective views, recomputed on every read

    /// FAQs as they will look after a save: pending edits merged in,
    /// tombstoned entries dropped, unsaved creations appended
    pub fn effective_faqs(&self) -> Vec<Faq> {
        let mut result = Vec::new();
        for faq in &self.snapshot.faqs {
            match self.pending.faqs.get(&faq.id) {
                Some(PendingChange::Delete) => continue,
                Some(PendingChange::Update(patch)) | Some(PendingChange::Create(patch)) => {
                    result.push(patch.apply(faq))
                }
                None => result.push(faq.clone()),
            }
        }

        let mut created: Vec<(&String, &FaqPatch)> = self
            .pending
            .faqs
            .iter()
            .filter_map(|(id, change)| match change {
                PendingChange::Create(patch)
                    if !self.snapshot.faqs.iter().any(|f| &f.id == id) =>
                {
                    Some((id, patch))
                }
                _ => None,
            })
            .collect();
        created.sort_by(|a, b| a.0.cmp(b.0));

        for (id, patch) in created {
            result.push(Faq {
                id: id.clone(),
                category: patch.category.clone().unwrap_or_default(),
                question: patch.question.clone().unwrap_or_default(),
                answer: patch.answer.clone().unwrap_or_default(),
                tags: patch.tags.clone().unwrap_or_default(),
            });
        }

        result
    }

    /// Plugins as they will look after a save
    pub fn effective_plugins(&self) -> Vec<Plugin> {
        self.snapshot
            .plugins
            .iter()
            .filter_map(|plugin| match self.pending.plugins.get(&plugin.id) {
                Some(PendingChange::Delete) => None,
                Some(PendingChange::Update(patch)) | Some(PendingChange::Create(patch)) => {
                    Some(patch.apply(plugin))
                }
                None => Some(plugin.clone()),
            })
            .collect()
    }

    /// Sessions as they will look after a save
    pub fn effective_sessions(&self) -> Vec<Session> {
        self.snapshot
            .sessions
            .iter()
            .filter(|session| {
                !matches!(
                    self.pending.sessions.get(&session.session_id),
                    Some(PendingChange::Delete)
                )
            })
            .cloned()
            .collect()
    }

    /// Translate the pending maps into the ordered operation list sent to
    /// the bulk-save endpoint
    pub fn pending_operations(&self) -> Result<Vec<ChangeOp>> {
        let mut ops = Vec::new();

        let mut faq_ids: Vec<&String> = self.pending.faqs.keys().collect();
        faq_ids.sort();

        for id in &faq_ids {
            if matches!(self.pending.faqs[*id], PendingChange::Delete) {
                ops.push(ChangeOp::Delete {
                    entity: EntityKind::Faq,
                    id: (*id).clone(),
                });
            }
        }
        for id in &faq_ids {
            if let PendingChange::Update(patch) = &self.pending.faqs[*id] {
                ops.push(ChangeOp::Update {
                    entity: EntityKind::Faq,
                    id: (*id).clone(),
                    fields: serde_json::to_value(patch)?,
                });
            }
        }
        for id in &faq_ids {
            if let PendingChange::Create(patch) = &self.pending.faqs[*id] {
                ops.push(ChangeOp::Create {
                    entity: EntityKind::Faq,
                    fields: serde_json::to_value(patch)?,
                });
            }
        }

        let mut plugin_ids: Vec<&String> = self.pending.plugins.keys().collect();
        plugin_ids.sort();

        for id in &plugin_ids {
            if let PendingChange::Update(patch) = &self.pending.plugins[*id] {
                ops.push(ChangeOp::Update {
                    entity: EntityKind::Plugin,
                    id: (*id).clone(),
                    fields: serde_json::to_value(patch)?,
                });
            }
        }
        for id in &plugin_ids {
            if matches!(self.pending.plugins[*id], PendingChange::Delete) {
                ops.push(ChangeOp::Delete {
                    entity: EntityKind::Plugin,
                    id: (*id).clone(),
                });
            }
        }

        let mut session_ids: Vec<&String> = self.pending.sessions.keys().collect();
        session_ids.sort();

        for id in &session_ids {
            if matches!(self.pending.sessions[*id], PendingChange::Delete) {
                ops.push(ChangeOp::Delete {
                    entity: EntityKind::Session,
                    id: (*id).clone(),
                });
            }
        }

        Ok(ops)
    }

    /// Submit all pending changes as one batched request. On success the
    /// snapshot is re-fetched (which clears the pending state); on failure
    /// the pending state is left intact so the caller can retry.
    pub async fn save_all_changes(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            debug!("Save requested with no pending changes");
            return Ok(());
        }

        let ops = self.pending_operations()?;
        info!(operations = ops.len(), "Submitting batched change-set");

        if let Err(e) = self.api.bulk_save(&ops).await {
            warn!(error = %e, pending = self.pending.count(), "Bulk save failed, pending changes preserved");
            return Err(e);
        }

        self.refresh(true).await
    }

    /// Drop all pending changes without contacting the server. Calling it
    /// twice, or with nothing pending, is a no-op.
    pub fn discard_changes(&mut self) {
        if !self.pending.is_empty() {
            info!(discarded = self.pending.count(), "Pending changes discarded");
        }
        self.pending.clear();
        self.has_unsaved = false;
    }
}

impl std::fmt::Debug for AdminDataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminDataProvider")
            .field("loaded", &self.loaded)
            .field("has_unsaved", &self.has_unsaved)
            .field("pending", &self.pending.count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::config::Settings;
    use crate::models::{PluginStatus, PluginType};
    use crate::services::auth::AuthService;
    use crate::storage::MemoryStore;
    use chrono::Utc;
    use std::sync::Arc;

    fn test_provider() -> AdminDataProvider {
        let settings = Settings::default();
        let store = Arc::new(MemoryStore::new());
        let client = ApiClient::new(&settings.api).unwrap();
        let auth = Arc::new(AuthService::new(store.clone(), settings.clone()));
        let cache = DataCache::new(store, &settings.cache.prefix, settings.cache.ttl_seconds);
        let mut provider = AdminDataProvider::new(AdminApi::new(client, auth), cache);
        provider.snapshot = sample_snapshot();
        provider.loaded = true;
        provider
    }

    fn sample_snapshot() -> AdminSnapshot {
        AdminSnapshot {
            stats: Stats {
                total_sessions: 1,
                total_plugins: 1,
                pending_plugins: 1,
                total_faqs: 2,
            },
            sessions: vec![Session {
                session_id: "VINSMOKEm@live1".to_string(),
                created_at: Utc::now(),
                expires_at: None,
            }],
            plugins: vec![Plugin {
                id: "plg_1".to_string(),
                name: "Sticker Maker".to_string(),
                description: "Turns images into stickers".to_string(),
                plugin_type: PluginType::Sticker,
                author: "sanji".to_string(),
                gist_link: "https://gist.github.com/sanji/abc".to_string(),
                status: PluginStatus::Pending,
                likes: 0,
                liked_by: vec![],
                created_at: Utc::now(),
            }],
            faqs: vec![
                Faq {
                    id: "faq_1".to_string(),
                    category: "General".to_string(),
                    question: "What is Vinsmoke?".to_string(),
                    answer: "A bot hosting platform".to_string(),
                    tags: vec![],
                },
                Faq {
                    id: "faq_2".to_string(),
                    category: "Billing".to_string(),
                    question: "Cost?".to_string(),
                    answer: "Free tier available".to_string(),
                    tags: vec![],
                },
            ],
        }
    }

    #[test]
    fn test_pending_update_overlays_snapshot() {
        let mut provider = test_provider();
        provider.update_faq(
            "faq_1",
            FaqPatch {
                answer: Some("Edited answer".to_string()),
                ..Default::default()
            },
        );

        let effective = provider.effective_faqs();
        let edited = effective.iter().find(|f| f.id == "faq_1").unwrap();
        assert_eq!(edited.answer, "Edited answer");
        // Untouched fields come from the snapshot
        assert_eq!(edited.question, "What is Vinsmoke?");
        assert!(provider.has_unsaved_changes());
    }

    #[test]
    fn test_delete_wins_over_pending_update() {
        let mut provider = test_provider();
        provider.update_faq(
            "faq_1",
            FaqPatch {
                answer: Some("Edited".to_string()),
                ..Default::default()
            },
        );
        provider.delete_faq("faq_1");

        let effective = provider.effective_faqs();
        assert!(effective.iter().all(|f| f.id != "faq_1"));
        // The snapshot itself is untouched until save
        assert_eq!(provider.snapshot.faqs.len(), 2);
    }

    #[test]
    fn test_update_after_delete_undeletes() {
        let mut provider = test_provider();
        provider.delete_faq("faq_1");
        provider.update_faq(
            "faq_1",
            FaqPatch {
                answer: Some("Back again".to_string()),
                ..Default::default()
            },
        );

        let effective = provider.effective_faqs();
        let revived = effective.iter().find(|f| f.id == "faq_1").unwrap();
        assert_eq!(revived.answer, "Back again");

        // The wire ops must carry the update, not the delete
        let ops = provider.pending_operations().unwrap();
        assert!(ops.iter().all(|op| !matches!(
            op,
            ChangeOp::Delete { entity: EntityKind::Faq, id } if id == "faq_1"
        )));
    }

    #[test]
    fn test_added_faq_appears_with_temp_id() {
        let mut provider = test_provider();
        let temp_id = provider.add_faq(FaqDraft {
            category: "New".to_string(),
            question: "Fresh?".to_string(),
            answer: "Yes".to_string(),
            tags: vec![],
        });
        assert!(temp_id.starts_with("temp_"));

        let effective = provider.effective_faqs();
        assert_eq!(effective.len(), 3);
        let added = effective.iter().find(|f| f.id == temp_id).unwrap();
        assert_eq!(added.question, "Fresh?");
    }

    #[test]
    fn test_deleting_unsaved_creation_removes_it() {
        let mut provider = test_provider();
        let temp_id = provider.add_faq(FaqDraft {
            category: "New".to_string(),
            question: "Fresh?".to_string(),
            answer: "Yes".to_string(),
            tags: vec![],
        });
        provider.delete_faq(&temp_id);

        assert_eq!(provider.effective_faqs().len(), 2);
        assert!(provider.pending_operations().unwrap().is_empty());
    }

    #[test]
    fn test_operation_ordering() {
        let mut provider = test_provider();
        provider.add_faq(FaqDraft {
            category: "New".to_string(),
            question: "Q".to_string(),
            answer: "A".to_string(),
            tags: vec![],
        });
        provider.update_faq(
            "faq_2",
            FaqPatch {
                question: Some("Edited".to_string()),
                ..Default::default()
            },
        );
        provider.delete_faq("faq_1");
        provider.update_plugin("plg_1", PluginPatch::status(PluginStatus::Approved));
        provider.delete_session("VINSMOKEm@live1");

        let ops = provider.pending_operations().unwrap();
        let kinds: Vec<&'static str> = ops
            .iter()
            .map(|op| match op {
                ChangeOp::Delete { entity: EntityKind::Faq, .. } => "faq_delete",
                ChangeOp::Update { entity: EntityKind::Faq, .. } => "faq_update",
                ChangeOp::Create { entity: EntityKind::Faq, .. } => "faq_create",
                ChangeOp::Update { entity: EntityKind::Plugin, .. } => "plugin_update",
                ChangeOp::Delete { entity: EntityKind::Plugin, .. } => "plugin_delete",
                ChangeOp::Delete { entity: EntityKind::Session, .. } => "session_delete",
                _ => "other",
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                "faq_delete",
                "faq_update",
                "faq_create",
                "plugin_update",
                "session_delete"
            ]
        );
    }

    #[test]
    fn test_plugin_status_overlay() {
        let mut provider = test_provider();
        provider.update_plugin("plg_1", PluginPatch::status(PluginStatus::Approved));

        let effective = provider.effective_plugins();
        assert_eq!(effective[0].status, PluginStatus::Approved);
        assert_eq!(provider.snapshot.plugins[0].status, PluginStatus::Pending);
    }

    #[test]
    fn test_session_tombstone_hides_entry() {
        let mut provider = test_provider();
        provider.delete_session("VINSMOKEm@live1");
        assert!(provider.effective_sessions().is_empty());
        assert_eq!(provider.snapshot.sessions.len(), 1);
    }

    #[test]
    fn test_discard_is_idempotent() {
        let mut provider = test_provider();
        provider.update_faq(
            "faq_1",
            FaqPatch {
                answer: Some("Edited".to_string()),
                ..Default::default()
            },
        );
        assert!(provider.has_unsaved_changes());

        provider.discard_changes();
        assert!(!provider.has_unsaved_changes());
        assert_eq!(provider.effective_faqs().len(), 2);

        // Second discard, and discard with nothing pending, are no-ops
        provider.discard_changes();
        assert!(!provider.has_unsaved_changes());
        assert_eq!(provider.pending_count(), 0);
    }
}
