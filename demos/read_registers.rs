use std::time::Duration;

use ninebot_ble::register::{BmsReg, CtrlReg};
use ninebot_ble::{Client, Config};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut client = Client::new(Config::default()).connect(Duration::from_secs(20)).await?;

    loop {
        let fw_ver = client.read_reg(CtrlReg::NbFwVer).await?;
        let mileage = client.read_reg(CtrlReg::NbInfRidMil).await?;
        let soc = client.read_reg(BmsReg::BatRemainingCapPercent).await?;
        println!("firmware {fw_ver}, total mileage {mileage} km, battery {soc}%");
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}
