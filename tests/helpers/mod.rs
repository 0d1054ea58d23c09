//! Shared test infrastructure
//!
//! Scripted push-event channel, settings pointed at a wiremock server and
//! a signed-in admin fixture.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use vinsmoke_console::config::Settings;
use vinsmoke_console::link::{Connect, EventChannel, PushEvent};
use vinsmoke_console::models::AuthUser;
use vinsmoke_console::services::ServiceFactory;
use vinsmoke_console::storage::MemoryStore;
use vinsmoke_console::utils::errors::Result;

/// Channel fed by the test through an mpsc sender
pub struct ScriptedChannel {
    rx: mpsc::UnboundedReceiver<PushEvent>,
    joined: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl EventChannel for ScriptedChannel {
    async fn join_session(&mut self, session_id: &str) -> Result<()> {
        self.joined.lock().unwrap().push(session_id.to_string());
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<PushEvent>> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.rx.close();
        Ok(())
    }
}

/// Connector handing out one scripted channel and counting connects
pub struct ScriptedConnector {
    rx: Mutex<Option<mpsc::UnboundedReceiver<PushEvent>>>,
    pub joined: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
    pub connect_count: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    /// Build a connector plus the sender the test scripts events with
    pub fn new() -> (Self, mpsc::UnboundedSender<PushEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Self {
            rx: Mutex::new(Some(rx)),
            joined: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
            connect_count: Arc::new(AtomicUsize::new(0)),
        };
        (connector, tx)
    }

    pub fn joined_sessions(&self) -> Vec<String> {
        self.joined.lock().unwrap().clone()
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.connect_count.load(Ordering::SeqCst)
    }
}

impl Connect for ScriptedConnector {
    type Channel = ScriptedChannel;

    async fn connect(&self) -> Result<ScriptedChannel> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        let rx = self
            .rx
            .lock()
            .unwrap()
            .take()
            .expect("scripted channel connected twice");
        Ok(ScriptedChannel {
            rx,
            joined: self.joined.clone(),
            closed: self.closed.clone(),
        })
    }
}

/// Settings pointed at a wiremock server, with fast timeouts
pub fn test_settings(base_url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.api.base_url = base_url.to_string();
    settings.api.timeout_seconds = 5;
    settings.auth.admin_logins = vec!["sanji".to_string()];
    settings
}

/// The admin fixture every authenticated test signs in as
pub fn admin_user() -> AuthUser {
    AuthUser {
        id: 42,
        login: "sanji".to_string(),
        avatar_url: "https://avatars.githubusercontent.com/u/42".to_string(),
    }
}

/// Factory over in-memory storage with the admin fixture signed in
pub fn admin_factory(base_url: &str) -> ServiceFactory {
    let factory =
        ServiceFactory::new(test_settings(base_url), Arc::new(MemoryStore::new())).unwrap();
    factory.auth_service.store_user(&admin_user()).unwrap();
    factory
}
