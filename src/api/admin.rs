//! Admin API surface
//!
//! Authenticated wrapper over the admin endpoint family. Every call carries
//! the advisory bearer token; a 401 wipes the local auth/cache namespace
//! before the error is propagated.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use tracing::warn;

use crate::models::{AdminSnapshot, Faq, FaqDraft, FaqPatch, Plugin, PluginPatch, Session};
use crate::services::auth::AuthService;
use crate::utils::errors::{Result, VinsmokeError};

use super::{bearer_headers, ApiClient};

/// Entity family a change operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Faq,
    Plugin,
    Session,
}

/// One batched change submitted to the bulk-save endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ChangeOp {
    Create {
        entity: EntityKind,
        fields: serde_json::Value,
    },
    Update {
        entity: EntityKind,
        id: String,
        fields: serde_json::Value,
    },
    Delete {
        entity: EntityKind,
        id: String,
    },
}

/// Client for the admin endpoint family
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: ApiClient,
    auth: Arc<AuthService>,
}

impl AdminApi {
    pub fn new(client: ApiClient, auth: Arc<AuthService>) -> Self {
        Self { client, auth }
    }

    /// Fetch the bulk admin snapshot
    pub async fn admin_data(&self) -> Result<AdminSnapshot> {
        self.get("/api/admin-data").await
    }

    /// Submit a batched change-set in one round trip
    pub async fn bulk_save(&self, changes: &[ChangeOp]) -> Result<()> {
        let body = serde_json::json!({ "changes": changes });
        let _: serde_json::Value = self.post("/api/admin/bulk-save", &body).await?;
        Ok(())
    }

    // FAQs

    pub async fn get_faqs(&self) -> Result<Vec<Faq>> {
        #[derive(serde::Deserialize)]
        struct FaqsResponse {
            #[serde(default)]
            faqs: Vec<Faq>,
        }
        let response: FaqsResponse = self.get("/api/admin/faqs").await?;
        Ok(response.faqs)
    }

    pub async fn add_faq(&self, draft: &FaqDraft) -> Result<Faq> {
        let body = serde_json::to_value(draft)?;
        self.post("/api/admin/faqs", &body).await
    }

    pub async fn update_faq(&self, id: &str, patch: &FaqPatch) -> Result<()> {
        let path = format!("/api/admin/faqs/{}", urlencoding::encode(id));
        let body = serde_json::to_value(patch)?;
        let _: serde_json::Value = self.put(&path, &body).await?;
        Ok(())
    }

    pub async fn delete_faq(&self, id: &str) -> Result<()> {
        let path = format!("/api/admin/faqs/{}", urlencoding::encode(id));
        self.delete(&path).await
    }

    pub async fn download_faqs(&self) -> Result<Vec<u8>> {
        self.download("/api/admin/faqs/download").await
    }

    // Plugins

    pub async fn get_plugins(&self) -> Result<Vec<Plugin>> {
        #[derive(serde::Deserialize)]
        struct PluginsResponse {
            #[serde(default)]
            plugins: Vec<Plugin>,
        }
        let response: PluginsResponse = self.get("/api/admin/plugins").await?;
        Ok(response.plugins)
    }

    pub async fn update_plugin(&self, id: &str, patch: &PluginPatch) -> Result<()> {
        let path = format!("/api/admin/plugins/{}", urlencoding::encode(id));
        let body = serde_json::to_value(patch)?;
        let _: serde_json::Value = self.put(&path, &body).await?;
        Ok(())
    }

    pub async fn delete_plugin(&self, id: &str) -> Result<()> {
        let path = format!("/api/admin/plugins/{}", urlencoding::encode(id));
        self.delete(&path).await
    }

    pub async fn download_plugins(&self) -> Result<Vec<u8>> {
        self.download("/api/admin/plugins/download").await
    }

    // Sessions

    pub async fn get_sessions(&self) -> Result<Vec<Session>> {
        #[derive(serde::Deserialize)]
        struct SessionsResponse {
            #[serde(default)]
            sessions: Vec<Session>,
        }
        let response: SessionsResponse = self.get("/api/admin/sessions").await?;
        Ok(response.sessions)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let path = format!("/api/admin/sessions/{}", urlencoding::encode(session_id));
        self.delete(&path).await
    }

    pub async fn download_sessions(&self) -> Result<Vec<u8>> {
        self.download("/api/admin/sessions/download").await
    }

    // Support

    /// Fetch the support-page configuration. The shape is owned by the
    /// backend, so it stays an opaque JSON value client-side.
    pub async fn support(&self) -> Result<serde_json::Value> {
        self.get("/api/admin/support").await
    }

    pub async fn update_support(&self, data: &serde_json::Value) -> Result<()> {
        let _: serde_json::Value = self.put("/api/admin/support", data).await?;
        Ok(())
    }

    // Request plumbing

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let headers = bearer_headers(&self.auth.auth_token()?)?;
        self.watch_auth(
            self.client
                .request_json(Method::GET, path, None, Some(headers))
                .await,
        )
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let headers = bearer_headers(&self.auth.auth_token()?)?;
        self.watch_auth(
            self.client
                .request_json(Method::POST, path, Some(body), Some(headers))
                .await,
        )
    }

    async fn put<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let headers = bearer_headers(&self.auth.auth_token()?)?;
        self.watch_auth(
            self.client
                .request_json(Method::PUT, path, Some(body), Some(headers))
                .await,
        )
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let headers = bearer_headers(&self.auth.auth_token()?)?;
        let result: Result<serde_json::Value> = self
            .client
            .request_json(Method::DELETE, path, None, Some(headers))
            .await;
        self.watch_auth(result).map(|_| ())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        let headers = bearer_headers(&self.auth.auth_token()?)?;
        self.watch_auth(
            self.client
                .request_bytes(Method::GET, path, Some(headers))
                .await,
        )
    }

    /// An expired session invalidates everything kept client-side
    fn watch_auth<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(VinsmokeError::AuthExpired) = &result {
            warn!("Authentication expired, wiping local auth state");
            self.auth.handle_auth_expired();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_op_wire_format() {
        let op = ChangeOp::Update {
            entity: EntityKind::Faq,
            id: "faq_1".to_string(),
            fields: serde_json::json!({"answer": "updated"}),
        };

        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "update");
        assert_eq!(json["entity"], "faq");
        assert_eq!(json["id"], "faq_1");
        assert_eq!(json["fields"]["answer"], "updated");
    }

    #[test]
    fn test_delete_op_has_no_fields() {
        let op = ChangeOp::Delete {
            entity: EntityKind::Session,
            id: "s1".to_string(),
        };

        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op"], "delete");
        assert_eq!(json["entity"], "session");
        assert!(json.get("fields").is_none());
    }
}
