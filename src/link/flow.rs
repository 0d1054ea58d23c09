//! Linking flow driver
//!
//! Owns a state machine, the lazily-created push channel and the local
//! countdown, and wires them to the session REST endpoints. The reducer
//! stays pure; everything effectful (channel lifecycle, notices, timers)
//! happens here.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::SessionApi;
use crate::config::Settings;
use crate::link::channel::{Connect, EventChannel};
use crate::link::events::PushEvent;
use crate::link::machine::{
    Effect, LinkInput, LinkMachine, LinkMode, LinkState, MachineConfig, Notice,
};
use crate::utils::errors::{Result, VinsmokeError};
use crate::utils::helpers::validate_phone_number;

/// Drives one QR or pairing linking flow end to end
pub struct LinkFlow<F: Connect> {
    connector: F,
    machine: LinkMachine,
    channel: Option<F::Channel>,
    session_id: Option<String>,
    notices: Vec<Notice>,
}

impl<F: Connect> LinkFlow<F> {
    pub fn new(mode: LinkMode, settings: &Settings, connector: F) -> Self {
        let config = MachineConfig {
            qr_timeout_seconds: settings.session.qr_timeout_seconds,
            connected_prefix: settings.session.connected_prefix.clone(),
        };
        Self {
            connector,
            machine: LinkMachine::new(mode, config),
            channel: None,
            session_id: None,
            notices: Vec::new(),
        }
    }

    pub fn state(&self) -> &LinkState {
        self.machine.state()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Drain the user-facing notices accumulated since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Start the QR flow: open the channel if needed, create the linking
    /// session, join its event room. The first QR may arrive in the REST
    /// response or later over the channel.
    pub async fn generate_qr(&mut self, api: &SessionApi) -> Result<()> {
        if self.machine.mode() != LinkMode::Qr {
            return Err(VinsmokeError::InvalidStateTransition {
                from: "pairing".to_string(),
                to: "qr-generate".to_string(),
            });
        }

        self.machine.apply(&LinkInput::Generate);
        if let Err(e) = self.start_session(api, None).await {
            self.fail_reset().await;
            return Err(e);
        }
        Ok(())
    }

    /// Start the pairing flow. The phone number is validated before any
    /// channel or network activity; backend maintenance surfaces as a
    /// notice on top of the returned error.
    pub async fn generate_pairing(&mut self, api: &SessionApi, phone_number: &str) -> Result<()> {
        if self.machine.mode() != LinkMode::Pairing {
            return Err(VinsmokeError::InvalidStateTransition {
                from: "qr".to_string(),
                to: "pairing-generate".to_string(),
            });
        }

        validate_phone_number(phone_number)?;

        self.machine.apply(&LinkInput::Generate);
        match self.start_session(api, Some(phone_number)).await {
            Ok(()) => Ok(()),
            Err(VinsmokeError::Maintenance(message)) => {
                self.notices.push(Notice::Maintenance {
                    message: message.clone(),
                });
                self.fail_reset().await;
                Err(VinsmokeError::Maintenance(message))
            }
            Err(e) => {
                self.fail_reset().await;
                Err(e)
            }
        }
    }

    async fn start_session(&mut self, api: &SessionApi, phone_number: Option<&str>) -> Result<()> {
        if self.channel.is_none() {
            self.channel = Some(self.connector.connect().await?);
            debug!("Push-event channel opened");
        }

        let response = match phone_number {
            Some(phone) => api.create_pairing_session(phone).await?,
            None => api.create_qr_session().await?,
        };

        self.session_id = Some(response.session_id.clone());
        if let Some(channel) = self.channel.as_mut() {
            channel.join_session(&response.session_id).await?;
        }
        info!(session_id = %response.session_id, "Joined session room");

        // The first payload may ride along on the REST response
        if let Some(qr_code) = response.qr_code {
            let effects = self.machine.apply(&LinkInput::Push(PushEvent::QrCode {
                qr_code,
                qr_count: 1,
            }));
            self.run_effects(effects).await;
        }
        if let Some(pairing_code) = response.pairing_code {
            let effects = self
                .machine
                .apply(&LinkInput::Push(PushEvent::PairingCode { pairing_code }));
            self.run_effects(effects).await;
        }

        Ok(())
    }

    /// Advance the flow by one input: the next channel event or, if a full
    /// second passes first, a local countdown tick
    pub async fn step(&mut self) -> Result<()> {
        let input = match self.channel.as_mut() {
            Some(channel) => {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(1)) => LinkInput::Tick,
                    event = channel.next_event() => match event {
                        Ok(Some(event)) => LinkInput::Push(event),
                        Ok(None) => {
                            debug!("Push-event channel ended");
                            LinkInput::Reset
                        }
                        Err(e) => {
                            warn!(error = %e, "Push-event channel failed, resetting flow");
                            LinkInput::Reset
                        }
                    },
                }
            }
            None => {
                tokio::time::sleep(Duration::from_secs(1)).await;
                LinkInput::Tick
            }
        };

        let effects = self.machine.apply(&input);
        self.run_effects(effects).await;
        Ok(())
    }

    /// Drive the flow until it terminates in `Connected` or falls back to
    /// `Idle` (expiry, channel loss)
    pub async fn run_until_settled(&mut self) -> Result<LinkState> {
        while !self.machine.is_idle() && !self.machine.is_connected() {
            self.step().await?;
        }
        Ok(self.machine.state().clone())
    }

    /// Full reset, as on unmount or tab switch. Safe to call repeatedly.
    pub async fn reset(&mut self) {
        let effects = self.machine.apply(&LinkInput::Reset);
        self.run_effects(effects).await;
    }

    /// Switch between the QR and pairing flows; state resets like a tab change
    pub async fn switch_mode(&mut self, mode: LinkMode) {
        let effects = self.machine.switch_mode(mode);
        self.run_effects(effects).await;
    }

    async fn fail_reset(&mut self) {
        let effects = self.machine.apply(&LinkInput::Reset);
        self.run_effects(effects).await;
    }

    async fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::TeardownChannel => {
                    if let Some(mut channel) = self.channel.take() {
                        let _ = channel.close().await;
                        debug!("Push-event channel torn down");
                    }
                }
                Effect::Notify(notice) => {
                    match &notice {
                        Notice::Expired { message } => info!(message = %message, "Link flow expired"),
                        Notice::Connected { session_id } => {
                            info!(session_id = %session_id, "Link flow connected")
                        }
                        Notice::QrRotated { qr_count } => {
                            debug!(qr_count = qr_count, "QR rotated")
                        }
                        Notice::QrScanned => info!("QR scanned"),
                        Notice::Maintenance { message } => warn!(message = %message, "Maintenance notice"),
                    }
                    self.notices.push(notice);
                }
            }
        }

        // Falling back to Idle forgets the superseded session entirely
        if self.machine.is_idle() {
            self.session_id = None;
        }
    }
}

impl<F: Connect> std::fmt::Debug for LinkFlow<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkFlow")
            .field("state", self.machine.state())
            .field("session_id", &self.session_id)
            .field("channel_open", &self.channel.is_some())
            .finish_non_exhaustive()
    }
}
