use log::warn;

use crate::cipher::SessionCipher;
use crate::error::NbError;
use crate::packet::{Packet, MAGIC};

/// BLE write MTU assumed for the RX characteristic.
pub const CHUNK_SIZE: usize = 20;

/// Split a ciphertext blob into `<= chunk_size`-byte slices, preserving
/// order. Each returned chunk is written to the RX characteristic in turn;
/// writes must be serialized by the caller (see [`crate::ble::UartLink`]).
pub fn chunk(data: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    if data.is_empty() {
        return vec![];
    }
    data.chunks(chunk_size).map(|c| c.to_vec()).collect()
}

/// Reassembles BLE-UART notifications into whole decrypted [`Packet`]s.
///
/// Maintains a single rolling buffer. A notification starting with the
/// magic preamble restarts the buffer; otherwise it is appended. This is
/// the only framing indicator available at this layer, so it is
/// intentionally lenient: a malformed or over-long frame just resets the
/// buffer rather than failing the session.
#[derive(Default)]
pub struct ReceiveBuffer {
    buf: Vec<u8>,
}

impl ReceiveBuffer {
    pub fn new() -> Self {
        ReceiveBuffer { buf: Vec::new() }
    }

    /// Feed one BLE notification. Returns `Some(packet)` once a full frame
    /// has been reassembled, decrypted and decoded; `None` while a frame is
    /// still incomplete or was discarded as junk.
    pub fn on_notification(&mut self, notification: &[u8], cipher: &mut dyn SessionCipher) -> Result<Option<Packet>, NbError> {
        if notification.len() >= 2 && notification[0..2] == MAGIC {
            self.buf = notification.to_vec();
        } else {
            self.buf.extend_from_slice(notification);
        }

        let decrypted = cipher.decrypt(&self.buf)?;

        if decrypted.len() < 3 {
            // Not even enough to know the declared length yet.
            return Ok(None);
        }

        let declared_len = decrypted[2] as usize + 7;

        if decrypted.len() == declared_len {
            self.buf.clear();
            match Packet::unpack(&decrypted) {
                Ok(packet) => Ok(Some(packet)),
                Err(e) => {
                    warn!("failed to decode reassembled frame: {e}");
                    Ok(None)
                }
            }
        } else if decrypted.len() > declared_len {
            warn!(
                "malformed frame: expected {declared_len} bytes, buffer holds {}",
                decrypted.len()
            );
            self.buf.clear();
            Ok(None)
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::NullCipher;
    use crate::packet::{Command, DeviceId};

    #[test]
    fn chunking_preserves_order_and_size() {
        let data: Vec<u8> = (0..77u16).map(|i| (i % 256) as u8).collect();
        let chunks = chunk(&data, CHUNK_SIZE);
        assert_eq!(chunks.len(), 4); // ceil(77/20)
        for c in &chunks[..chunks.len() - 1] {
            assert_eq!(c.len(), CHUNK_SIZE);
        }
        let reassembled: Vec<u8> = chunks.into_iter().flatten().collect();
        assert_eq!(reassembled, data);
    }

    #[test]
    fn chunking_empty_buffer() {
        assert_eq!(chunk(&[], CHUNK_SIZE), Vec::<Vec<u8>>::new());
    }

    #[test]
    fn reassembly_single_notification() {
        let p = Packet::new(DeviceId::EsControl, DeviceId::Pc, Command::ReadAck, 0x1A, vec![0x34, 0x12]);
        let frame = p.pack();

        let mut rb = ReceiveBuffer::new();
        let mut cipher = NullCipher;
        let got = rb.on_notification(&frame, &mut cipher).unwrap();
        assert_eq!(got, Some(p));
    }

    #[test]
    fn reassembly_split_across_notifications() {
        let p = Packet::new(DeviceId::EsControl, DeviceId::Pc, Command::ReadAck, 0x1A, vec![0xAA; 30]);
        let frame = p.pack();

        let mut rb = ReceiveBuffer::new();
        let mut cipher = NullCipher;

        let mut got = None;
        for piece in frame.chunks(9) {
            got = rb.on_notification(piece, &mut cipher).unwrap();
        }
        assert_eq!(got, Some(p));
    }

    #[test]
    fn junk_before_magic_is_discarded() {
        let p = Packet::new(DeviceId::EsControl, DeviceId::Pc, Command::ReadAck, 0x1A, vec![0x01, 0x02]);
        let frame = p.pack();

        let mut rb = ReceiveBuffer::new();
        let mut cipher = NullCipher;

        // Truncated junk with no magic prefix.
        assert_eq!(rb.on_notification(&[0xDE, 0xAD, 0xBE, 0xEF], &mut cipher).unwrap(), None);
        // A magic-prefixed full frame restarts the buffer and completes.
        let got = rb.on_notification(&frame, &mut cipher).unwrap();
        assert_eq!(got, Some(p));
    }

    #[test]
    fn malformed_notification_resets_buffer() {
        let mut rb = ReceiveBuffer::new();
        let mut cipher = NullCipher;

        // Declares a 0-byte payload (total_len = 7) but carries more.
        let bogus = vec![0x5A, 0xA5, 0x00, 0x3D, 0x20, 0x01, 0x00, 0xFF, 0xFF, 0xFF];
        assert_eq!(rb.on_notification(&bogus, &mut cipher).unwrap(), None);

        // A subsequent valid notification works normally, proving the buffer was reset.
        let p = Packet::new(DeviceId::Pc, DeviceId::EsControl, Command::Read, 0x1A, vec![2]);
        let frame = p.pack();
        let got = rb.on_notification(&frame, &mut cipher).unwrap();
        assert_eq!(got, Some(p));
    }
}
