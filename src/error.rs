use thiserror::Error;

/// Everything that can go wrong talking to a scooter.
///
/// Framing errors are normally swallowed at the transport layer (see
/// [`crate::transport::ReceiveBuffer`]) and never reach a caller; the other
/// variants are the ones [`crate::client::Client`] methods actually return.
#[derive(Debug, Error)]
pub enum NbError {
    #[error("malformed frame: {0}")]
    Framing(&'static str),

    #[error("failed to decode register value: {0}")]
    Decode(String),

    #[error("timed out waiting for a response")]
    Timeout,

    #[error("session error: {0}")]
    Session(String),

    #[error("ble error: {0}")]
    Ble(String),
}

impl From<btleplug::Error> for NbError {
    fn from(e: btleplug::Error) -> Self {
        NbError::Ble(e.to_string())
    }
}
