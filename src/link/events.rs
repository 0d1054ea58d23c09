//! Push-event wire format
//!
//! The linking flow is driven by JSON text frames of the shape
//! `{"event": "...", "data": {...}}`. Parsing is tolerant: unknown events
//! and malformed payloads are skipped by the channel, never fatal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Server-to-client linking events
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// A (possibly rotated) QR image; `qr_count` starts at 1
    QrCode { qr_code: String, qr_count: u32 },
    /// Server-side countdown sync
    QrTimer { time_left: u32 },
    /// The QR was scanned on the phone; connection is being established
    QrScanned,
    /// The QR window closed server-side
    QrExpired { message: Option<String> },
    /// Pairing code to type into the phone
    PairingCode { pairing_code: String },
    /// Final session id; the flow is complete
    SessionConnected { session_id: String },
}

#[derive(Debug, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QrCodePayload {
    qr_code: String,
    #[serde(default = "default_qr_count")]
    qr_count: u32,
}

fn default_qr_count() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QrTimerPayload {
    time_left: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QrExpiredPayload {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairingCodePayload {
    pairing_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionConnectedPayload {
    session_id: String,
}

impl PushEvent {
    /// Parse one text frame. Returns `None` for unknown event names and
    /// payloads that do not match their event.
    pub fn from_frame(raw: &str) -> Option<PushEvent> {
        let frame: Frame = serde_json::from_str(raw).ok()?;
        Self::from_parts(&frame.event, frame.data)
    }

    /// Parse an already-split (event, payload) pair
    pub fn from_parts(event: &str, data: Value) -> Option<PushEvent> {
        let parsed = match event {
            "qr-code" => serde_json::from_value::<QrCodePayload>(data)
                .map(|p| PushEvent::QrCode {
                    qr_code: p.qr_code,
                    qr_count: p.qr_count,
                })
                .ok(),
            "qr-timer" => serde_json::from_value::<QrTimerPayload>(data)
                .map(|p| PushEvent::QrTimer {
                    time_left: p.time_left,
                })
                .ok(),
            "qr-scanned" => Some(PushEvent::QrScanned),
            "qr-expired" => {
                let payload: QrExpiredPayload =
                    serde_json::from_value(data).unwrap_or(QrExpiredPayload { message: None });
                Some(PushEvent::QrExpired {
                    message: payload.message,
                })
            }
            "pairing-code" => serde_json::from_value::<PairingCodePayload>(data)
                .map(|p| PushEvent::PairingCode {
                    pairing_code: p.pairing_code,
                })
                .ok(),
            "session-connected" => serde_json::from_value::<SessionConnectedPayload>(data)
                .map(|p| PushEvent::SessionConnected {
                    session_id: p.session_id,
                })
                .ok(),
            other => {
                debug!(event = other, "Skipping unknown push event");
                None
            }
        };
        parsed
    }

    /// Serialize back into a text frame (used by tests and fakes)
    pub fn to_frame(&self) -> String {
        let (event, data) = match self {
            PushEvent::QrCode { qr_code, qr_count } => (
                "qr-code",
                serde_json::json!({"qrCode": qr_code, "qrCount": qr_count}),
            ),
            PushEvent::QrTimer { time_left } => {
                ("qr-timer", serde_json::json!({"timeLeft": time_left}))
            }
            PushEvent::QrScanned => ("qr-scanned", Value::Null),
            PushEvent::QrExpired { message } => {
                ("qr-expired", serde_json::json!({"message": message}))
            }
            PushEvent::PairingCode { pairing_code } => {
                ("pairing-code", serde_json::json!({"pairingCode": pairing_code}))
            }
            PushEvent::SessionConnected { session_id } => (
                "session-connected",
                serde_json::json!({"sessionId": session_id}),
            ),
        };
        serde_json::json!({"event": event, "data": data}).to_string()
    }
}

/// Client-to-server frames
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ClientEvent {
    JoinSession { session_id: String },
}

impl ClientEvent {
    pub fn to_frame(&self) -> String {
        match self {
            ClientEvent::JoinSession { session_id } => serde_json::json!({
                "event": "join-session",
                "data": {"sessionId": session_id},
            })
            .to_string(),
        }
    }
}
