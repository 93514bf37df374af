//! Dump the sensor OTP area

use goodix::Device;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let product_id = std::env::var("GOODIX_PID")
        .ok()
        .and_then(|pid| u16::from_str_radix(pid.trim_start_matches("0x"), 16).ok())
        .unwrap_or(0x5110);

    let mut device = Device::usb(product_id);
    device.connect().await?;

    // Wake the MCU up before talking to it
    device.nop().await?;

    let otp = device.read_otp().await?;
    println!("OTP ({} bytes): {}", otp.len(), hex::encode(&otp));

    device.disconnect().await?;
    Ok(())
}
