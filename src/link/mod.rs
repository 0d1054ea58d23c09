//! Session-linking subsystem
//!
//! QR and pairing-code flows: wire events, the pure state-machine reducer,
//! the push-event channel and the flow driver tying them together.

pub mod channel;
pub mod events;
pub mod flow;
pub mod machine;

pub use channel::{Connect, EventChannel, WebSocketChannel, WsConnector};
pub use events::{ClientEvent, PushEvent};
pub use flow::LinkFlow;
pub use machine::{Effect, LinkInput, LinkMachine, LinkMode, LinkState, MachineConfig, Notice};
