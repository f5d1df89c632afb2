use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use ninebot_ble::register::{by_name, catalog_names};
use ninebot_ble::serial::ScooterSerial;
use ninebot_ble::{Client, Config};

/// Read telemetry and configuration registers from a Ninebot/Segway scooter
/// over Bluetooth Low Energy.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Register to read, by its catalog name (e.g. `nb-fw-ver`). May be
    /// given more than once. With none given, every known register is read.
    #[arg(long = "register", value_name = "NAME")]
    registers: Vec<String>,

    /// How long to scan for a nearby scooter before giving up.
    #[arg(long, default_value = "20", value_name = "SECONDS")]
    scan_timeout: u64,

    /// Decode and print the product line for the controller serial number
    /// (NB_INF_SN) instead of the raw string.
    #[arg(long)]
    decode_serial: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let selected: Vec<(String, _)> = if args.registers.is_empty() {
        catalog_names().into_iter().map(|(name, id)| (name.to_string(), id)).collect()
    } else {
        args.registers
            .iter()
            .map(|name| by_name(name).map(|id| (name.clone(), id)).ok_or_else(|| anyhow::anyhow!("unknown register {name:?}")))
            .collect::<Result<Vec<_>>>()?
    };

    info!("scanning for a scooter (timeout {}s)...", args.scan_timeout);
    let mut client = Client::new(Config::default())
        .connect(Duration::from_secs(args.scan_timeout))
        .await
        .context("failed to connect and pair with scooter")?;

    for (name, id) in selected {
        match client.read_reg(id).await {
            Ok(value) => {
                if args.decode_serial && name == "nb-inf-sn" {
                    match ScooterSerial::parse(&value.to_string()) {
                        Ok(serial) => println!("{name} = {serial} (produced {})", serial.production_date()),
                        Err(e) => println!("{name} = {value} (serial decode failed: {e})"),
                    }
                } else {
                    println!("{name} = {value}");
                }
            }
            Err(e) => eprintln!("{name}: read failed: {e}"),
        }
    }

    client.disconnect().await.context("failed to disconnect cleanly")?;
    Ok(())
}
