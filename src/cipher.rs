use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::NbError;

/// Black-box contract for the session cipher.
///
/// Wraps and unwraps framed bytes on the wire; owns all key material. The
/// real Ninebot/Segway cipher is proprietary and is deliberately not
/// reconstructed here (see [`NbCrypto`]'s docs) — anything implementing this
/// trait can be swapped in via [`crate::client::Client::with_cipher`].
pub trait SessionCipher: Send {
    /// Called once, before the handshake, with the BLE advertised name (or
    /// `b"Unnamed"` if the device didn't advertise one).
    fn set_device_name(&mut self, name: &[u8]);

    /// Called after the INIT reply is received.
    fn set_device_key(&mut self, key: [u8; 16]);

    /// Called after PING succeeds (i.e. once we learn the app key was
    /// accepted or the device confirms pairing).
    fn set_app_key(&mut self, key: [u8; 16]);

    /// Wrap a plaintext frame. Length-preserving.
    fn encrypt(&mut self, buf: &[u8]) -> Result<Vec<u8>, NbError>;

    /// Unwrap a ciphertext frame. Length-preserving.
    fn decrypt(&mut self, buf: &[u8]) -> Result<Vec<u8>, NbError>;
}

/// Placeholder implementation of the [`SessionCipher`] contract.
///
/// The genuine on-device cipher is undocumented and reverse-engineering it
/// is explicitly out of scope. This type exists so the rest of the stack
/// (chunking, reassembly, the handshake, register reads) has something real
/// to encrypt/decrypt against in tests and in a from-scratch build: it
/// derives a keystream with HKDF-SHA256 from whatever key material has been
/// installed so far (device name, then device key, then app key) and XORs it
/// with the frame. Each call derives the keystream fresh from position zero,
/// so `decrypt` stays correct when called repeatedly on a growing prefix of
/// the same frame (see [`crate::transport::ReceiveBuffer`]), and
/// `encrypt`/`decrypt` are exact inverses of one another given the same key
/// material.
pub struct NbCrypto {
    device_name: Vec<u8>,
    device_key: Option<[u8; 16]>,
    app_key: Option<[u8; 16]>,
}

impl NbCrypto {
    pub fn new() -> Self {
        NbCrypto {
            device_name: b"Unnamed".to_vec(),
            device_key: None,
            app_key: None,
        }
    }

    fn keystream(&self, len: usize) -> Result<Vec<u8>, NbError> {
        let mut ikm = Vec::with_capacity(self.device_name.len() + 32);
        ikm.extend_from_slice(&self.device_name);
        ikm.extend_from_slice(&self.device_key.unwrap_or([0u8; 16]));
        ikm.extend_from_slice(&self.app_key.unwrap_or([0u8; 16]));

        let hk = Hkdf::<Sha256>::new(None, &ikm);
        let mut out = vec![0u8; len];
        hk.expand(b"ninebot-ble keystream", &mut out)
            .map_err(|_| NbError::Session("keystream expansion exceeded HKDF output limit".into()))?;
        Ok(out)
    }
}

impl Default for NbCrypto {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCipher for NbCrypto {
    fn set_device_name(&mut self, name: &[u8]) {
        self.device_name = if name.is_empty() { b"Unnamed".to_vec() } else { name.to_vec() };
    }

    fn set_device_key(&mut self, key: [u8; 16]) {
        self.device_key = Some(key);
    }

    fn set_app_key(&mut self, key: [u8; 16]) {
        self.app_key = Some(key);
    }

    fn encrypt(&mut self, buf: &[u8]) -> Result<Vec<u8>, NbError> {
        let ks = self.keystream(buf.len())?;
        Ok(buf.iter().zip(ks.iter()).map(|(b, k)| b ^ k).collect())
    }

    fn decrypt(&mut self, buf: &[u8]) -> Result<Vec<u8>, NbError> {
        // XOR is its own inverse; decrypt and encrypt share an implementation.
        self.encrypt(buf)
    }
}

/// A cipher that does not transform bytes at all. Used by tests that want to
/// exercise framing/chunking/reassembly without involving key material.
#[cfg(test)]
pub(crate) struct NullCipher;

#[cfg(test)]
impl SessionCipher for NullCipher {
    fn set_device_name(&mut self, _name: &[u8]) {}
    fn set_device_key(&mut self, _key: [u8; 16]) {}
    fn set_app_key(&mut self, _key: [u8; 16]) {}
    fn encrypt(&mut self, buf: &[u8]) -> Result<Vec<u8>, NbError> {
        Ok(buf.to_vec())
    }
    fn decrypt(&mut self, buf: &[u8]) -> Result<Vec<u8>, NbError> {
        Ok(buf.to_vec())
    }
}

#[test]
fn encrypt_decrypt_roundtrip() {
    let mut c = NbCrypto::new();
    c.set_device_name(b"nbscooter-1234");
    c.set_device_key([0x11; 16]);
    c.set_app_key([0x22; 16]);

    let plaintext = b"hello scooter".to_vec();
    let ciphertext = c.encrypt(&plaintext).unwrap();
    assert_eq!(ciphertext.len(), plaintext.len());
    assert_ne!(ciphertext, plaintext);

    let mut c2 = NbCrypto::new();
    c2.set_device_name(b"nbscooter-1234");
    c2.set_device_key([0x11; 16]);
    c2.set_app_key([0x22; 16]);
    assert_eq!(c2.decrypt(&ciphertext).unwrap(), plaintext);
}

#[test]
fn decrypt_is_stable_on_growing_prefix() {
    let mut c = NbCrypto::new();
    c.set_device_key([0x42; 16]);

    let full = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    let enc = c.encrypt(&full).unwrap();

    let mut c2 = NbCrypto::new();
    c2.set_device_key([0x42; 16]);
    let partial = c2.decrypt(&enc[0..4]).unwrap();

    let mut c3 = NbCrypto::new();
    c3.set_device_key([0x42; 16]);
    let whole = c3.decrypt(&enc).unwrap();

    assert_eq!(&whole[0..4], &partial[..]);
}
