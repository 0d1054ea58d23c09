//! Public (unauthenticated) API surface

use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use crate::models::{Plugin, PluginDraft, PublicData};
use crate::utils::errors::Result;

use super::ApiClient;

/// Client for the public endpoint family
#[derive(Debug, Clone)]
pub struct PublicApi {
    client: ApiClient,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LikeRequest<'a> {
    user_id: &'a str,
}

impl PublicApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Backend reachability probe
    pub async fn health(&self) -> Result<()> {
        let _: serde_json::Value = self
            .client
            .request_json(Method::GET, "/api/health", None, None)
            .await?;
        Ok(())
    }

    /// Fetch the aggregate public dataset (FAQs, plugins, categories)
    pub async fn public_data(&self) -> Result<PublicData> {
        self.client
            .request_json(Method::GET, "/api/public-data", None, None)
            .await
    }

    /// Submit a new plugin to the gallery; it lands in pending status
    pub async fn submit_plugin(&self, draft: &PluginDraft) -> Result<Plugin> {
        let body = serde_json::to_value(draft)?;
        self.client
            .request_json(Method::POST, "/api/plugins", Some(&body), None)
            .await
    }

    /// Toggle a like for a plugin on behalf of a user
    pub async fn like_plugin(&self, plugin_id: &str, user_id: &str) -> Result<()> {
        let path = format!("/api/plugins/{}/like", urlencoding::encode(plugin_id));
        let body = serde_json::to_value(LikeRequest { user_id })?;
        let _: serde_json::Value = self
            .client
            .request_json(Method::POST, &path, Some(&body), None)
            .await?;
        debug!(plugin_id = plugin_id, "Like request delivered");
        Ok(())
    }
}
