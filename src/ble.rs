//! The one part of this crate that is *not* part of the protocol proper:
//! BLE discovery/scan and the raw GATT write/notify primitives are assumed
//! collaborators. This module is the concrete adapter between that
//! assumption and a real BLE stack (`btleplug`), driving
//! scan → connect → discover-services → subscribe.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use btleplug::api::{Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Manager, Peripheral};
use log::debug;
use uuid::Uuid;

use crate::error::NbError;

pub const NORDIC_UART_SERVICE_UUID: Uuid = Uuid::from_u128(0x6e400001_b5a3_f393_e0a9_e50e24dcca9e);
pub const NORDIC_UART_RX_UUID: Uuid = Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e);
pub const NORDIC_UART_TX_UUID: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

/// A manufacturer-data identifier assumed to be present in a scooter's
/// advertisement.
pub const NINEBOT_MANUFACTURER_ID: u16 = 0x057E;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Capability the core protocol stack needs from a connected BLE link:
/// write one chunk of bytes to the scooter's RX characteristic. Everything
/// above this (scanning, connecting, subscribing) lives outside the
/// protocol core; everything below it (chunking, framing, ciphering) does
/// not know or care that this is BLE at all.
pub trait UartLink: Send + Sync {
    fn write_chunk(&self, chunk: Vec<u8>) -> BoxFuture<'_, Result<(), NbError>>;
}

/// Scans for a device whose advertised name contains `"nbscooter"`
/// (case-insensitive). Returns [`NbError::Ble`] if nothing matches before
/// `timeout` elapses.
pub async fn scan_for_scooter(timeout: Duration) -> Result<Peripheral, NbError> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    let central = adapters
        .into_iter()
        .next()
        .ok_or_else(|| NbError::Ble("no bluetooth adapter found".into()))?;

    central.start_scan(ScanFilter::default()).await?;

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        for peripheral in central.peripherals().await? {
            if let Some(props) = peripheral.properties().await? {
                if let Some(name) = &props.local_name {
                    if name.to_lowercase().contains("nbscooter") {
                        return Ok(peripheral);
                    }
                }
                if props.manufacturer_data.contains_key(&NINEBOT_MANUFACTURER_ID) {
                    return Ok(peripheral);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    Err(NbError::Ble("no scooter found before scan timeout".into()))
}

/// A `btleplug`-backed [`UartLink`], plus the resolved notify characteristic
/// callers should subscribe to.
pub struct BtleplugLink {
    peripheral: Peripheral,
    write_char: Characteristic,
    pub notify_char: Characteristic,
}

impl BtleplugLink {
    /// Connects to `peripheral`, discovers services and resolves the NUS
    /// characteristics. Does not subscribe; the caller (`Client::connect`)
    /// does that once it is ready to start draining notifications.
    pub async fn connect(peripheral: Peripheral) -> Result<Self, NbError> {
        if !peripheral.is_connected().await? {
            peripheral.connect().await?;
        }
        peripheral.discover_services().await?;

        let chars = peripheral.characteristics();
        let write_char = chars
            .iter()
            .find(|c| c.uuid == NORDIC_UART_RX_UUID)
            .cloned()
            .ok_or_else(|| NbError::Ble("NUS write characteristic not found".into()))?;
        let notify_char = chars
            .iter()
            .find(|c| c.uuid == NORDIC_UART_TX_UUID)
            .cloned()
            .ok_or_else(|| NbError::Ble("NUS notify characteristic not found".into()))?;

        debug!("resolved NUS characteristics: write={:?} notify={:?}", write_char.uuid, notify_char.uuid);

        Ok(BtleplugLink {
            peripheral,
            write_char,
            notify_char,
        })
    }

    pub fn peripheral(&self) -> &Peripheral {
        &self.peripheral
    }

    pub async fn subscribe(&self) -> Result<(), NbError> {
        self.peripheral.subscribe(&self.notify_char).await?;
        Ok(())
    }

    pub async fn unsubscribe(&self) -> Result<(), NbError> {
        self.peripheral.unsubscribe(&self.notify_char).await?;
        Ok(())
    }

    pub async fn disconnect(&self) -> Result<(), NbError> {
        if self.peripheral.is_connected().await? {
            self.peripheral.disconnect().await?;
        }
        Ok(())
    }
}

impl UartLink for BtleplugLink {
    fn write_chunk(&self, chunk: Vec<u8>) -> BoxFuture<'_, Result<(), NbError>> {
        Box::pin(async move {
            let write_type = if self.write_char.properties.contains(CharPropFlags::WRITE_WITHOUT_RESPONSE) {
                WriteType::WithoutResponse
            } else {
                WriteType::WithResponse
            };
            self.peripheral.write(&self.write_char, &chunk, write_type).await?;
            Ok(())
        })
    }
}
