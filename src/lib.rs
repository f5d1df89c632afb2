//! Client for Ninebot/Segway electric scooters over Bluetooth Low Energy.
//!
//! Performs the proprietary INIT/PING/PAIR handshake, establishes an
//! authenticated encrypted session and reads typed register values from the
//! scooter's master controller and battery management system.
//!
//! BLE discovery/scan and the raw GATT write/notify primitives are provided
//! by [`ble`] (built on `btleplug`); the real on-device cipher is a
//! proprietary black box and is represented here by a placeholder
//! implementation (see [`cipher::NbCrypto`]) behind the [`cipher::SessionCipher`]
//! trait so a real implementation can be swapped in via
//! [`client::Client::with_cipher`].
//!
//! # Example
//!
//! ```no_run
//! # use std::time::Duration;
//! # use ninebot_ble::{Client, Config};
//! # use ninebot_ble::register::CtrlReg;
//! #
//! # #[tokio::main]
//! # pub async fn main() -> anyhow::Result<()> {
//! let mut client = Client::new(Config::default()).connect(Duration::from_secs(10)).await?;
//! let version = client.read_reg(CtrlReg::NbFwVer).await?;
//! println!("{version:?}");
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod ble;
pub mod cipher;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod handshake;
pub mod packet;
pub mod register;
pub mod serial;
pub mod session;
pub mod transport;

pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use error::NbError;
