//! Session-linking state machine
//!
//! Pure reducer over the linking lifecycle. Two independent expiry
//! triggers (the local 1-second countdown and the server `qr-expired`
//! push) feed the same transition, so the reducer is written to be
//! idempotent: resetting an already-idle machine produces no effects.

use super::events::PushEvent;

/// Which linking flow a machine instance drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    Qr,
    Pairing,
}

/// Linking lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum LinkState {
    /// Nothing in progress; the user has to press generate
    Idle,
    /// REST call issued, waiting for the first QR / pairing payload
    Generating,
    /// QR on screen, counting down until rotation or expiry
    AwaitingScan {
        qr_code: String,
        qr_count: u32,
        seconds_left: u32,
    },
    /// Pairing code on screen, waiting for the user to type it in
    AwaitingEntry { pairing_code: String },
    /// QR scanned on the phone; connection being established
    Scanned,
    /// Final session id delivered
    Connected { session_id: String },
}

impl LinkState {
    /// States that an expiry trigger may reset
    fn is_waiting(&self) -> bool {
        matches!(
            self,
            LinkState::Generating | LinkState::AwaitingScan { .. } | LinkState::AwaitingEntry { .. }
        )
    }
}

/// Inputs feeding the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum LinkInput {
    /// User pressed generate
    Generate,
    /// Event delivered over the push channel
    Push(PushEvent),
    /// Local 1-second countdown tick
    Tick,
    /// Tab switch, unmount, or channel loss
    Reset,
}

/// Side effects the surrounding flow must execute
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Close the push channel and drop its event stream
    TeardownChannel,
    /// Surface a user-facing notice
    Notify(Notice),
}

/// User-facing notices emitted by transitions (and, for maintenance, by
/// the surrounding flow)
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    QrRotated { qr_count: u32 },
    QrScanned,
    Expired { message: String },
    Connected { session_id: String },
    Maintenance { message: String },
}

/// Static reducer parameters
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Fresh countdown value applied with every QR payload
    pub qr_timeout_seconds: u32,
    /// Session ids carrying this prefix retire the push channel
    pub connected_prefix: String,
}

const DEFAULT_EXPIRY_MESSAGE: &str = "QR Code expired. Click Generate to create a new one.";

/// Pure transition function; both expiry triggers converge here
pub fn reduce(
    config: &MachineConfig,
    mode: LinkMode,
    state: &LinkState,
    input: &LinkInput,
) -> (LinkState, Vec<Effect>) {
    match input {
        // Generate always restarts the flow, even mid-wait
        LinkInput::Generate => (LinkState::Generating, vec![]),

        LinkInput::Reset => reset(state, None, false),

        LinkInput::Tick => match state {
            LinkState::AwaitingScan {
                qr_code,
                qr_count,
                seconds_left,
            } => {
                if *seconds_left == 0 {
                    // The zero was shown for one tick; now fully reset
                    reset(state, None, true)
                } else {
                    (
                        LinkState::AwaitingScan {
                            qr_code: qr_code.clone(),
                            qr_count: *qr_count,
                            seconds_left: seconds_left - 1,
                        },
                        vec![],
                    )
                }
            }
            _ => (state.clone(), vec![]),
        },

        LinkInput::Push(event) => reduce_push(config, mode, state, event),
    }
}

fn reduce_push(
    config: &MachineConfig,
    mode: LinkMode,
    state: &LinkState,
    event: &PushEvent,
) -> (LinkState, Vec<Effect>) {
    match event {
        PushEvent::QrCode { qr_code, qr_count } => {
            if mode != LinkMode::Qr {
                return (state.clone(), vec![]);
            }
            match state {
                // Rotation while waiting is a normal refresh; the countdown
                // restarts and any scanned flag is cleared by construction
                LinkState::Generating | LinkState::AwaitingScan { .. } => {
                    let mut effects = vec![];
                    if *qr_count > 1 {
                        effects.push(Effect::Notify(Notice::QrRotated {
                            qr_count: *qr_count,
                        }));
                    }
                    (
                        LinkState::AwaitingScan {
                            qr_code: qr_code.clone(),
                            qr_count: *qr_count,
                            seconds_left: config.qr_timeout_seconds,
                        },
                        effects,
                    )
                }
                _ => (state.clone(), vec![]),
            }
        }

        PushEvent::QrTimer { time_left } => match state {
            LinkState::AwaitingScan {
                qr_code, qr_count, ..
            } => (
                LinkState::AwaitingScan {
                    qr_code: qr_code.clone(),
                    qr_count: *qr_count,
                    seconds_left: *time_left,
                },
                vec![],
            ),
            _ => (state.clone(), vec![]),
        },

        PushEvent::QrScanned => match state {
            LinkState::AwaitingScan { .. } => {
                (LinkState::Scanned, vec![Effect::Notify(Notice::QrScanned)])
            }
            _ => (state.clone(), vec![]),
        },

        PushEvent::QrExpired { message } => {
            if state.is_waiting() {
                reset(state, message.clone(), true)
            } else {
                // Late or duplicate expiry; nothing left to reset
                (state.clone(), vec![])
            }
        }

        PushEvent::PairingCode { pairing_code } => {
            if mode != LinkMode::Pairing {
                return (state.clone(), vec![]);
            }
            match state {
                LinkState::Generating | LinkState::AwaitingEntry { .. } => (
                    LinkState::AwaitingEntry {
                        pairing_code: pairing_code.clone(),
                    },
                    vec![],
                ),
                _ => (state.clone(), vec![]),
            }
        }

        PushEvent::SessionConnected { session_id } => match state {
            LinkState::Scanned
            | LinkState::AwaitingScan { .. }
            | LinkState::AwaitingEntry { .. }
            | LinkState::Generating => {
                let mut effects = vec![Effect::Notify(Notice::Connected {
                    session_id: session_id.clone(),
                })];
                // A final id means no further QR rotation is coming
                if session_id.starts_with(&config.connected_prefix) {
                    effects.push(Effect::TeardownChannel);
                }
                (
                    LinkState::Connected {
                        session_id: session_id.clone(),
                    },
                    effects,
                )
            }
            _ => (state.clone(), vec![]),
        },
    }
}

/// Common full reset. Idempotent: resetting an idle machine emits nothing.
fn reset(state: &LinkState, message: Option<String>, notify: bool) -> (LinkState, Vec<Effect>) {
    if matches!(state, LinkState::Idle) {
        return (LinkState::Idle, vec![]);
    }

    let mut effects = vec![Effect::TeardownChannel];
    if notify {
        effects.push(Effect::Notify(Notice::Expired {
            message: message.unwrap_or_else(|| DEFAULT_EXPIRY_MESSAGE.to_string()),
        }));
    }
    (LinkState::Idle, effects)
}

/// Stateful wrapper around the reducer
#[derive(Debug, Clone)]
pub struct LinkMachine {
    mode: LinkMode,
    state: LinkState,
    config: MachineConfig,
}

impl LinkMachine {
    pub fn new(mode: LinkMode, config: MachineConfig) -> Self {
        Self {
            mode,
            state: LinkState::Idle,
            config,
        }
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, LinkState::Idle)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, LinkState::Connected { .. })
    }

    /// Apply one input and return the effects to execute
    pub fn apply(&mut self, input: &LinkInput) -> Vec<Effect> {
        let (next, effects) = reduce(&self.config, self.mode, &self.state, input);
        self.state = next;
        effects
    }

    /// Switching flows resets everything, like changing tabs
    pub fn switch_mode(&mut self, mode: LinkMode) -> Vec<Effect> {
        let effects = self.apply(&LinkInput::Reset);
        self.mode = mode;
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MachineConfig {
        MachineConfig {
            qr_timeout_seconds: 60,
            connected_prefix: "VINSMOKEm@".to_string(),
        }
    }

    fn qr_machine() -> LinkMachine {
        LinkMachine::new(LinkMode::Qr, config())
    }

    fn awaiting_scan(machine: &mut LinkMachine) {
        machine.apply(&LinkInput::Generate);
        machine.apply(&LinkInput::Push(PushEvent::QrCode {
            qr_code: "data:image/png;base64,AAA".to_string(),
            qr_count: 1,
        }));
    }

    #[test]
    fn test_happy_path_qr_flow() {
        let mut machine = qr_machine();
        assert!(machine.is_idle());

        machine.apply(&LinkInput::Generate);
        assert_eq!(machine.state(), &LinkState::Generating);

        let effects = machine.apply(&LinkInput::Push(PushEvent::QrCode {
            qr_code: "data:qr1".to_string(),
            qr_count: 1,
        }));
        assert!(effects.is_empty());
        assert_eq!(
            machine.state(),
            &LinkState::AwaitingScan {
                qr_code: "data:qr1".to_string(),
                qr_count: 1,
                seconds_left: 60
            }
        );

        let effects = machine.apply(&LinkInput::Push(PushEvent::QrScanned));
        assert_eq!(machine.state(), &LinkState::Scanned);
        assert_eq!(effects, vec![Effect::Notify(Notice::QrScanned)]);

        let effects = machine.apply(&LinkInput::Push(PushEvent::SessionConnected {
            session_id: "VINSMOKEm@abc123".to_string(),
        }));
        assert!(machine.is_connected());
        assert!(effects.contains(&Effect::TeardownChannel));
        assert!(effects.contains(&Effect::Notify(Notice::Connected {
            session_id: "VINSMOKEm@abc123".to_string()
        })));
    }

    #[test]
    fn test_qr_rotation_resets_countdown_and_notifies() {
        let mut machine = qr_machine();
        awaiting_scan(&mut machine);

        // Burn some of the countdown
        machine.apply(&LinkInput::Tick);
        machine.apply(&LinkInput::Tick);

        let effects = machine.apply(&LinkInput::Push(PushEvent::QrCode {
            qr_code: "data:qr2".to_string(),
            qr_count: 2,
        }));
        assert_eq!(
            effects,
            vec![Effect::Notify(Notice::QrRotated { qr_count: 2 })]
        );
        assert_eq!(
            machine.state(),
            &LinkState::AwaitingScan {
                qr_code: "data:qr2".to_string(),
                qr_count: 2,
                seconds_left: 60
            }
        );
    }

    #[test]
    fn test_countdown_expiry_resets_to_idle() {
        let mut machine = qr_machine();
        awaiting_scan(&mut machine);

        // 60 ticks bring the countdown to zero, the next one expires
        for _ in 0..60 {
            let effects = machine.apply(&LinkInput::Tick);
            assert!(effects.is_empty());
        }
        assert!(matches!(
            machine.state(),
            LinkState::AwaitingScan { seconds_left: 0, .. }
        ));

        let effects = machine.apply(&LinkInput::Tick);
        assert!(machine.is_idle());
        assert!(effects.contains(&Effect::TeardownChannel));
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::Notify(Notice::Expired { .. }))));
    }

    #[test]
    fn test_double_expiry_is_idempotent() {
        let mut machine = qr_machine();
        awaiting_scan(&mut machine);

        let first = machine.apply(&LinkInput::Push(PushEvent::QrExpired {
            message: Some("expired".to_string()),
        }));
        assert!(machine.is_idle());
        assert_eq!(
            first
                .iter()
                .filter(|e| matches!(e, Effect::Notify(Notice::Expired { .. })))
                .count(),
            1
        );

        // The racing local trigger lands after the server push; the second
        // reset must be observable as a no-op
        let second = machine.apply(&LinkInput::Tick);
        assert!(machine.is_idle());
        assert!(second.is_empty());

        let third = machine.apply(&LinkInput::Push(PushEvent::QrExpired { message: None }));
        assert!(third.is_empty());
    }

    #[test]
    fn test_scanned_stops_countdown() {
        let mut machine = qr_machine();
        awaiting_scan(&mut machine);
        machine.apply(&LinkInput::Push(PushEvent::QrScanned));

        // Ticks no longer count anything down once scanned
        let effects = machine.apply(&LinkInput::Tick);
        assert!(effects.is_empty());
        assert_eq!(machine.state(), &LinkState::Scanned);
    }

    #[test]
    fn test_pairing_flow() {
        let mut machine = LinkMachine::new(LinkMode::Pairing, config());
        machine.apply(&LinkInput::Generate);

        machine.apply(&LinkInput::Push(PushEvent::PairingCode {
            pairing_code: "ABCD-1234".to_string(),
        }));
        assert_eq!(
            machine.state(),
            &LinkState::AwaitingEntry {
                pairing_code: "ABCD-1234".to_string()
            }
        );

        machine.apply(&LinkInput::Push(PushEvent::SessionConnected {
            session_id: "VINSMOKEm@xyz".to_string(),
        }));
        assert!(machine.is_connected());
    }

    #[test]
    fn test_mode_mismatched_events_are_ignored() {
        let mut machine = LinkMachine::new(LinkMode::Pairing, config());
        machine.apply(&LinkInput::Generate);

        let effects = machine.apply(&LinkInput::Push(PushEvent::QrCode {
            qr_code: "data:qr".to_string(),
            qr_count: 1,
        }));
        assert!(effects.is_empty());
        assert_eq!(machine.state(), &LinkState::Generating);
    }

    #[test]
    fn test_switch_mode_resets() {
        let mut machine = qr_machine();
        awaiting_scan(&mut machine);

        let effects = machine.switch_mode(LinkMode::Pairing);
        assert!(machine.is_idle());
        assert_eq!(machine.mode(), LinkMode::Pairing);
        assert!(effects.contains(&Effect::TeardownChannel));
    }

    #[test]
    fn test_server_timer_sync_overrides_local_countdown() {
        let mut machine = qr_machine();
        awaiting_scan(&mut machine);

        machine.apply(&LinkInput::Push(PushEvent::QrTimer { time_left: 12 }));
        assert!(matches!(
            machine.state(),
            LinkState::AwaitingScan { seconds_left: 12, .. }
        ));
    }

    #[test]
    fn test_expiry_ignored_once_connected() {
        let mut machine = qr_machine();
        awaiting_scan(&mut machine);
        machine.apply(&LinkInput::Push(PushEvent::QrScanned));
        machine.apply(&LinkInput::Push(PushEvent::SessionConnected {
            session_id: "VINSMOKEm@abc".to_string(),
        }));

        let effects = machine.apply(&LinkInput::Push(PushEvent::QrExpired { message: None }));
        assert!(effects.is_empty());
        assert!(machine.is_connected());
    }
}
