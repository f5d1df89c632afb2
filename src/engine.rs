use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use tokio::sync::{mpsc, Mutex};

use crate::ble::UartLink;
use crate::cipher::SessionCipher;
use crate::error::NbError;
use crate::packet::Packet;
use crate::transport;

/// Drives one request/reply transaction at a time with retries. Owns
/// nothing BLE-specific: it writes through [`UartLink`] and reads completed
/// packets off a channel fed by whoever is draining notifications (see
/// `Client::connect`).
pub struct RequestEngine {
    link: Arc<dyn UartLink>,
    cipher: Arc<Mutex<dyn SessionCipher>>,
    queue: mpsc::Receiver<Packet>,
    chunk_size: usize,
}

impl RequestEngine {
    pub fn new(link: Arc<dyn UartLink>, cipher: Arc<Mutex<dyn SessionCipher>>, queue: mpsc::Receiver<Packet>) -> Self {
        Self::with_chunk_size(link, cipher, queue, transport::CHUNK_SIZE)
    }

    pub fn with_chunk_size(
        link: Arc<dyn UartLink>,
        cipher: Arc<Mutex<dyn SessionCipher>>,
        queue: mpsc::Receiver<Packet>,
        chunk_size: usize,
    ) -> Self {
        RequestEngine { link, cipher, queue, chunk_size }
    }

    /// Encrypt, chunk and write one packet to the RX characteristic. Writes
    /// are serialized: the next chunk is only written once the previous
    /// `write_chunk` future resolves.
    pub async fn send(&self, packet: &Packet) -> Result<(), NbError> {
        debug!("sending {packet:?}");
        let framed = packet.pack();
        let ciphertext = {
            let mut cipher = self.cipher.lock().await;
            cipher.encrypt(&framed)?
        };
        for piece in transport::chunk(&ciphertext, self.chunk_size) {
            self.link.write_chunk(piece).await?;
        }
        Ok(())
    }

    /// Returns the next packet from the receive queue, or [`NbError::Timeout`]
    /// if none arrives within `timeout`.
    pub async fn receive(&mut self, timeout: Duration) -> Result<Packet, NbError> {
        match tokio::time::timeout(timeout, self.queue.recv()).await {
            Ok(Some(packet)) => Ok(packet),
            Ok(None) => Err(NbError::Session("receive queue closed".into())),
            Err(_) => Err(NbError::Timeout),
        }
    }

    /// Sends `request` and returns its matching reply, retrying the send
    /// until `timeout` (the outer deadline) elapses. Non-matching packets
    /// seen while draining the queue are discarded; they are either stale
    /// retries or out-of-band notifications.
    pub async fn request(&mut self, request: Packet, timeout: Duration) -> Result<Packet, NbError> {
        let deadline = Instant::now() + timeout;

        while Instant::now() < deadline {
            self.send(&request).await?;

            while Instant::now() < deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let sub_timeout = remaining.min(Duration::from_secs(1));
                match self.receive(sub_timeout).await {
                    Ok(reply) if request.matches_reply(&reply) => return Ok(reply),
                    Ok(_non_matching) => continue,
                    Err(NbError::Timeout) => break,
                    Err(e) => return Err(e),
                }
            }
        }

        Err(NbError::Timeout)
    }
}
