//! Services module
//!
//! This module contains the client-side business logic services.

pub mod admin_data;
pub mod auth;
pub mod likes;
pub mod public_data;

// Re-export commonly used services
pub use admin_data::{AdminDataProvider, PendingChange, PendingChanges};
pub use auth::{AttemptStatus, AuthService};
pub use likes::{LikeQueue, PendingLike};
pub use public_data::PublicDataProvider;

use std::sync::Arc;
use std::time::Duration;

use crate::api::{AdminApi, ApiClient, PublicApi, SessionApi};
use crate::cache::DataCache;
use crate::config::Settings;
use crate::link::{LinkFlow, LinkMode, WsConnector};
use crate::storage::StoragePort;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub settings: Settings,
    pub cache: DataCache,
    pub auth_service: Arc<AuthService>,
    pub public_api: PublicApi,
    pub session_api: SessionApi,
    pub admin_api: AdminApi,
    pub like_queue: Arc<LikeQueue>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: Settings, store: Arc<dyn StoragePort>) -> Result<Self> {
        let client = ApiClient::new(&settings.api)?;
        let cache = DataCache::new(
            store.clone(),
            &settings.cache.prefix,
            settings.cache.ttl_seconds,
        );
        let auth_service = Arc::new(AuthService::new(store, settings.clone()));
        let public_api = PublicApi::new(client.clone());
        let session_api = SessionApi::new(client.clone());
        let admin_api = AdminApi::new(client, auth_service.clone());
        let like_queue = LikeQueue::new(
            public_api.clone(),
            Duration::from_secs(settings.likes.batch_delay_seconds),
        );

        Ok(Self {
            settings,
            cache,
            auth_service,
            public_api,
            session_api,
            admin_api,
            like_queue,
        })
    }

    /// Fresh provider over the public dataset
    pub fn public_data_provider(&self) -> PublicDataProvider {
        PublicDataProvider::new(self.public_api.clone(), self.cache.clone())
    }

    /// Fresh provider over the admin dataset with its pending-edit overlay
    pub fn admin_data_provider(&self) -> AdminDataProvider {
        AdminDataProvider::new(self.admin_api.clone(), self.cache.clone())
    }

    /// Fresh linking flow against the configured push-event endpoint
    pub fn link_flow(&self, mode: LinkMode) -> LinkFlow<WsConnector> {
        LinkFlow::new(
            mode,
            &self.settings,
            WsConnector::new(&self.settings.socket_url()),
        )
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let api_reachable = self.public_api.health().await.is_ok();
        let authenticated = self.auth_service.current_user().is_some();
        let is_admin = self
            .auth_service
            .current_user()
            .map(|u| self.auth_service.is_admin(&u))
            .unwrap_or(false);

        ServiceHealthStatus {
            api_reachable,
            authenticated,
            is_admin,
        }
    }
}

impl std::fmt::Debug for ServiceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFactory")
            .field("base_url", &self.settings.api.base_url)
            .finish_non_exhaustive()
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub api_reachable: bool,
    pub authenticated: bool,
    pub is_admin: bool,
}

impl ServiceHealthStatus {
    /// Check if the console can do anything useful right now
    pub fn is_healthy(&self) -> bool {
        self.api_reachable
    }

    /// Get list of current issues
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.api_reachable {
            issues.push("Backend API unreachable".to_string());
        }
        if !self.authenticated {
            issues.push("No user signed in".to_string());
        }

        issues
    }
}
