/// Phase of the handshake/session, owned and mutated only by
/// [`crate::handshake::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connected,
    KeysPartial,
    Paired,
}

/// Per-client session state. Each [`crate::client::Client`] owns exactly one
/// of these; it is never shared across clients.
pub struct SessionState {
    pub phase: Phase,
    /// 16 random bytes generated once per client instance.
    pub app_key: [u8; 16],
    /// Received in the INIT reply.
    pub device_key: Option<[u8; 16]>,
    /// Received in the INIT reply (everything after the first 16 bytes);
    /// echoed back verbatim in PAIR. Its length is never validated.
    pub device_serial: Vec<u8>,
    /// The advertised BLE name, or `b"Unnamed"` if the device had none.
    pub device_name: Vec<u8>,
}

impl SessionState {
    pub fn new(app_key: [u8; 16]) -> Self {
        SessionState {
            phase: Phase::Disconnected,
            app_key,
            device_key: None,
            device_serial: Vec::new(),
            device_name: b"Unnamed".to_vec(),
        }
    }
}
