use std::time::Duration;

/// Tunables for a [`crate::client::Client`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Outer deadline for [`crate::engine::RequestEngine::request`] (5s).
    pub request_timeout: Duration,
    /// Deadline for a single [`crate::engine::RequestEngine::receive`] call (1s).
    pub receive_timeout: Duration,
    /// Sleep between PAIR retries while waiting for the scooter's power
    /// button (1s).
    pub pairing_retry_interval: Duration,
    /// Outer deadline for the whole pairing loop.
    pub pairing_timeout: Duration,
    /// BLE write MTU; ciphertext is chunked to at most this many bytes.
    pub chunk_size: usize,
    /// Capacity of the bounded receive queue.
    pub receive_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            request_timeout: Duration::from_secs(5),
            receive_timeout: Duration::from_secs(1),
            pairing_retry_interval: Duration::from_secs(1),
            pairing_timeout: Duration::from_secs(60),
            chunk_size: crate::transport::CHUNK_SIZE,
            receive_queue_capacity: 100,
        }
    }
}
