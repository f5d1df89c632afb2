use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use tokio::sync::Mutex;

use crate::cipher::SessionCipher;
use crate::config::Config;
use crate::engine::RequestEngine;
use crate::error::NbError;
use crate::packet::{Command, DeviceId, Packet};
use crate::session::{Phase, SessionState};

/// Runs the INIT → PING → (wait-for-button) → PAIR handshake, mutating
/// `session` and feeding key material to `cipher` along the way.
/// `session.phase` must be [`Phase::Connected`] on entry.
pub async fn run(
    engine: &mut RequestEngine,
    cipher: &Arc<Mutex<dyn SessionCipher>>,
    session: &mut SessionState,
    config: &Config,
) -> Result<(), NbError> {
    debug_assert_eq!(session.phase, Phase::Connected);

    // 1. INIT
    let init_reply = engine
        .request(Packet::new(DeviceId::Pc, DeviceId::EsBle, Command::Init, 0, vec![]), config.request_timeout)
        .await?;
    if init_reply.data.len() < 16 {
        return Err(NbError::Session("INIT reply shorter than the 16-byte device key".into()));
    }
    let mut device_key = [0u8; 16];
    device_key.copy_from_slice(&init_reply.data[0..16]);
    // Everything after the key is the device serial; its length is not
    // validated and is passed through opaquely to PAIR.
    let device_serial = init_reply.data[16..].to_vec();

    debug!("device key: {}", hex::encode_upper(device_key));
    debug!("device serial: {}", String::from_utf8_lossy(&device_serial));

    session.device_key = Some(device_key);
    session.device_serial = device_serial.clone();
    {
        let mut c = cipher.lock().await;
        c.set_device_key(device_key);
    }
    session.phase = Phase::KeysPartial;

    // 2. PING (first)
    let ping_reply = engine
        .request(
            Packet::new(DeviceId::Pc, DeviceId::EsBle, Command::Ping, 0, session.app_key.to_vec()),
            config.request_timeout,
        )
        .await?;

    let mut already_paired = false;
    if ping_reply.data_index == 1 {
        // Already paired; install the app key and skip the pairing loop.
        let mut c = cipher.lock().await;
        c.set_app_key(session.app_key);
        already_paired = true;
    }

    if !already_paired {
        // 3. Pairing loop: sends PAIR fire-and-forget and accepts either a
        // PING(data_index=1) or PAIR(data_index=1) as "paired". This
        // asymmetry is the scooter firmware's and is preserved literally.
        let pairing_deadline = Instant::now() + config.pairing_timeout;
        loop {
            if Instant::now() >= pairing_deadline {
                return Err(NbError::Timeout);
            }

            tokio::time::sleep(config.pairing_retry_interval).await;
            engine
                .send(&Packet::new(DeviceId::Pc, DeviceId::EsBle, Command::Pair, 0, device_serial.clone()))
                .await?;

            let received = match engine.receive(config.receive_timeout).await {
                Ok(p) => Some(p),
                Err(NbError::Timeout) => None,
                Err(e) => return Err(e),
            };

            match received {
                Some(p) if p.command == Command::Ping && p.data_index == 1 => {
                    let mut c = cipher.lock().await;
                    c.set_app_key(session.app_key);
                    break;
                }
                Some(p) if p.command == Command::Pair && p.data_index == 1 => {
                    break;
                }
                _ => {
                    info!("please press power button on scooter!");
                }
            }
        }
    }

    // 4. PAIR confirm
    engine
        .request(
            Packet::new(DeviceId::Pc, DeviceId::EsBle, Command::Pair, 0, device_serial),
            config.request_timeout,
        )
        .await?;

    session.phase = Phase::Paired;
    debug!("handshake complete, session paired");
    Ok(())
}
