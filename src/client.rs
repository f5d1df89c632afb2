use std::sync::Arc;
use std::time::Duration;

use btleplug::api::Peripheral as _;
use futures_util::StreamExt;
use log::{debug, warn};
use rand_core::{OsRng, RngCore};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::ble::{scan_for_scooter, BtleplugLink, UartLink};
use crate::cipher::{NbCrypto, SessionCipher};
use crate::config::Config;
use crate::engine::RequestEngine;
use crate::error::NbError;
use crate::handshake;
use crate::packet::{Command, DeviceId, Packet};
use crate::register::{descriptor, target, RegisterId, RegisterValue};
use crate::session::{Phase, SessionState};
use crate::transport::ReceiveBuffer;

/// Top-level handle to one scooter connection.
///
/// Owns the BLE link, the session/cipher state, the request engine and the
/// background task draining BLE notifications into the engine's receive
/// queue. Generalized from a single fixed request/response pair to the
/// full handshake and register catalog.
pub struct Client {
    link: Arc<BtleplugLink>,
    cipher: Arc<Mutex<dyn SessionCipher>>,
    engine: RequestEngine,
    session: SessionState,
    config: Config,
    notify_task: Option<JoinHandle<()>>,
}

impl Client {
    /// Builds a client with the default [`NbCrypto`] placeholder cipher and
    /// a freshly generated random app key, generated once per client
    /// instance.
    pub fn new(config: Config) -> ClientBuilder {
        ClientBuilder {
            config,
            cipher: Arc::new(Mutex::new(NbCrypto::new())),
        }
    }

    /// Builds a client with a caller-supplied cipher, e.g. a test double or
    /// a reverse-engineered implementation of the real on-device algorithm.
    pub fn with_cipher(config: Config, cipher: Arc<Mutex<dyn SessionCipher>>) -> ClientBuilder {
        ClientBuilder { config, cipher }
    }

    pub fn is_connected(&self) -> bool {
        self.session.phase == Phase::Paired
    }

    /// Reads one register and returns its decoded (and scaled) value.
    ///
    /// Sends a `READ` request for the register's address range and collects
    /// `index_len` consecutive `READ_ACK` replies, concatenating their
    /// payloads before handing them to the catalog's decoder.
    pub async fn read_reg(&mut self, id: impl Into<RegisterId>) -> Result<RegisterValue, NbError> {
        let id = id.into();
        let desc = descriptor(id);
        let target_device = target(id);

        let mut raw = Vec::with_capacity(desc.index_len as usize * desc.read_len as usize);
        for offset in 0..desc.index_len {
            let addr = desc.index_start.wrapping_add(offset);
            let request = Packet::new(DeviceId::Pc, target_device, Command::Read, addr, vec![desc.read_len]);
            let reply = self.engine.request(request, self.config.request_timeout).await?;
            raw.extend_from_slice(&reply.data);
        }

        desc.resolve(&raw)
    }

    pub async fn disconnect(&mut self) -> Result<(), NbError> {
        if let Some(task) = self.notify_task.take() {
            task.abort();
        }
        self.link.unsubscribe().await.ok();
        self.link.disconnect().await?;
        self.session.phase = Phase::Disconnected;
        Ok(())
    }
}

/// Staged construction: a [`Client`] only exists once it has scanned,
/// connected and completed the handshake, so there is no half-built
/// `Client` for callers to misuse.
pub struct ClientBuilder {
    config: Config,
    cipher: Arc<Mutex<dyn SessionCipher>>,
}

impl ClientBuilder {
    /// Scans for a nearby scooter, connects, subscribes to notifications and
    /// runs the handshake. Returns a [`Client`] in [`Phase::Paired`].
    pub async fn connect(self, scan_timeout: Duration) -> Result<Client, NbError> {
        let peripheral = scan_for_scooter(scan_timeout).await?;
        let device_name = peripheral
            .properties()
            .await?
            .and_then(|p| p.local_name)
            .unwrap_or_else(|| "Unnamed".to_string());

        let link = Arc::new(BtleplugLink::connect(peripheral).await?);
        link.subscribe().await?;

        {
            let mut c = self.cipher.lock().await;
            c.set_device_name(device_name.as_bytes());
        }

        let mut app_key = [0u8; 16];
        OsRng.fill_bytes(&mut app_key);
        let mut session = SessionState::new(app_key);
        session.device_name = device_name.into_bytes();
        session.phase = Phase::Connected;

        let (tx, rx) = mpsc::channel(self.config.receive_queue_capacity);
        let notify_task = spawn_notification_drain(link.clone(), self.cipher.clone(), tx);

        let dyn_link: Arc<dyn UartLink> = link.clone();
        let mut engine = RequestEngine::with_chunk_size(dyn_link, self.cipher.clone(), rx, self.config.chunk_size);

        handshake::run(&mut engine, &self.cipher, &mut session, &self.config).await?;

        Ok(Client {
            link,
            cipher: self.cipher,
            engine,
            session,
            config: self.config,
            notify_task: Some(notify_task),
        })
    }
}

/// Drains the BLE notify characteristic into `tx`, reassembling frames with
/// a private [`ReceiveBuffer`]. This is the single producer feeding the
/// engine's bounded channel; the engine is the single consumer.
fn spawn_notification_drain(
    link: Arc<BtleplugLink>,
    cipher: Arc<Mutex<dyn SessionCipher>>,
    tx: mpsc::Sender<Packet>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut notifications = match link.peripheral().notifications().await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("failed to subscribe to notification stream: {e}");
                return;
            }
        };

        let mut buffer = ReceiveBuffer::new();
        while let Some(notification) = notifications.next().await {
            if notification.uuid != link.notify_char.uuid {
                continue;
            }
            let mut cipher = cipher.lock().await;
            match buffer.on_notification(&notification.value, &mut *cipher) {
                Ok(Some(packet)) => {
                    debug!("received {packet:?}");
                    if tx.send(packet).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("dropping unparsable notification: {e}"),
            }
        }
        debug!("notification stream ended");
    })
}
