//! Public data provider
//!
//! Cache-first access to the aggregate public dataset (FAQs, plugins,
//! categories). A successful fetch resets the cache TTL window; a failed
//! fetch falls back to a stale cache entry before surfacing an error.

use tracing::{info, warn};

use crate::api::PublicApi;
use crate::cache::{self, DataCache};
use crate::models::{Faq, Plugin, PublicData};
use crate::utils::errors::Result;

/// Provider for the public dataset
#[derive(Debug)]
pub struct PublicDataProvider {
    api: PublicApi,
    cache: DataCache,
    data: Option<PublicData>,
    error: Option<String>,
}

impl PublicDataProvider {
    pub fn new(api: PublicApi, cache: DataCache) -> Self {
        Self {
            api,
            cache,
            data: None,
            error: None,
        }
    }

    /// Refresh the dataset. With `force == false` a live cache entry is
    /// used without touching the network; otherwise one fetch is issued.
    /// On fetch failure a stale cache copy is preferred over no data.
    pub async fn refresh(&mut self, force: bool) -> Result<()> {
        if !force {
            if let Some(cached) = self.cache.get::<PublicData>(cache::PUBLIC_DATA) {
                info!("Public data served from cache");
                self.data = Some(cached);
                self.error = None;
                return Ok(());
            }
        }

        match self.api.public_data().await {
            Ok(data) => {
                self.cache.set(cache::PUBLIC_DATA, &data);
                info!(
                    faqs = data.faqs.len(),
                    plugins = data.plugins.len(),
                    "Public data fetched"
                );
                self.data = Some(data);
                self.error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Public data fetch failed");
                if let Some(stale) = self.cache.get_stale::<PublicData>(cache::PUBLIC_DATA) {
                    warn!("Falling back to stale public data");
                    self.data = Some(stale);
                    self.error = None;
                    return Ok(());
                }
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Last surfaced error message, if the provider holds no data
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    // Derived views, defaulted when nothing is loaded

    pub fn faqs(&self) -> &[Faq] {
        self.data.as_ref().map(|d| d.faqs.as_slice()).unwrap_or(&[])
    }

    pub fn plugins(&self) -> &[Plugin] {
        self.data.as_ref().map(|d| d.plugins.as_slice()).unwrap_or(&[])
    }

    pub fn categories(&self) -> Vec<String> {
        match self.data.as_ref() {
            Some(data) if !data.categories.is_empty() => data.categories.clone(),
            _ => vec!["All".to_string()],
        }
    }
}
