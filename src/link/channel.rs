//! Push-event channel
//!
//! One persistent server-to-client event stream per active linking flow.
//! The channel is created lazily on the first generate action and torn
//! down on expiry or unmount so superseded sessions cannot write stale
//! state into the machine.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::utils::errors::{Result, VinsmokeError};

use super::events::{ClientEvent, PushEvent};

/// Transport abstraction for the linking event stream, swappable for a
/// scripted fake in tests
#[allow(async_fn_in_trait)]
pub trait EventChannel: Send {
    /// Enter the per-session event room
    async fn join_session(&mut self, session_id: &str) -> Result<()>;

    /// Next linking event; `None` once the server closes the stream
    async fn next_event(&mut self) -> Result<Option<PushEvent>>;

    /// Tear the stream down; must be safe to call on a dead connection
    async fn close(&mut self) -> Result<()>;
}

/// Connection factory, injected so flows can be driven without a network
#[allow(async_fn_in_trait)]
pub trait Connect: Send {
    type Channel: EventChannel;

    async fn connect(&self) -> Result<Self::Channel>;
}

/// WebSocket-backed channel speaking the JSON frame protocol
pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketChannel {
    /// Open the channel against an http(s) or ws(s) endpoint
    pub async fn connect(url: &str) -> Result<Self> {
        let ws_url = to_ws_url(url)?;
        info!(url = %ws_url, "Connecting push-event channel");
        let (stream, _) = connect_async(ws_url.as_str()).await?;
        Ok(Self { stream })
    }
}

/// Map the configured base URL onto the WebSocket scheme
fn to_ws_url(url: &str) -> Result<String> {
    let mut parsed = url::Url::parse(url)?;
    let scheme = match parsed.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(VinsmokeError::Config(format!(
                "Unsupported socket scheme: {}",
                other
            )))
        }
    };
    parsed
        .set_scheme(scheme)
        .map_err(|_| VinsmokeError::Config("Cannot derive socket URL".to_string()))?;
    Ok(parsed.to_string())
}

impl EventChannel for WebSocketChannel {
    async fn join_session(&mut self, session_id: &str) -> Result<()> {
        let frame = ClientEvent::JoinSession {
            session_id: session_id.to_string(),
        }
        .to_frame();
        self.stream.send(Message::Text(frame)).await?;
        debug!(session_id = session_id, "Joined session event room");
        Ok(())
    }

    async fn next_event(&mut self) -> Result<Option<PushEvent>> {
        loop {
            match self.stream.next().await {
                None => return Ok(None),
                Some(Ok(Message::Text(raw))) => {
                    match PushEvent::from_frame(&raw) {
                        Some(event) => return Ok(Some(event)),
                        // Unknown events are skipped, not errors
                        None => continue,
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    debug!("Push-event channel closed by server");
                    return Ok(None);
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!(error = %e, "Push-event channel read failed");
                    return Err(e.into());
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Channel close on dead connection");
        }
        Ok(())
    }
}

/// Default connector pointed at the configured socket URL
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

impl Connect for WsConnector {
    type Channel = WebSocketChannel;

    async fn connect(&self) -> Result<WebSocketChannel> {
        WebSocketChannel::connect(&self.url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_mapping() {
        assert_eq!(to_ws_url("http://localhost:8080").unwrap(), "ws://localhost:8080/");
        assert_eq!(
            to_ws_url("https://vnsmk-back.onrender.com").unwrap(),
            "wss://vnsmk-back.onrender.com/"
        );
        assert_eq!(to_ws_url("wss://example.com/ws").unwrap(), "wss://example.com/ws");
        assert!(to_ws_url("ftp://example.com").is_err());
    }
}
