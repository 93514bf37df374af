//! Print firmware version and MCU state of a connected sensor

use goodix::Device;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> goodix::Result<()> {
    // Initialize logging (RUST_LOG=goodix=trace for frame dumps)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Change to your sensor's product id
    let product_id = std::env::var("GOODIX_PID")
        .ok()
        .and_then(|pid| u16::from_str_radix(pid.trim_start_matches("0x"), 16).ok())
        .unwrap_or(0x5110);

    println!("Waiting for 27c6:{:04x}...", product_id);

    let mut device = Device::usb(product_id);

    device.connect().await?;
    println!("✓ Connected!");

    let info = device.get_device_info().await?;
    println!("✓ Device: {}", info);

    let state = info.state;
    println!("  Version: {}", state.version);
    println!("  Image valid: {}", state.is_image_valid());
    println!("  TLS connected: {}", state.is_tls_connected());
    println!("  Locked: {}", state.is_locked());
    println!("  Wake up to POV: {} ms", state.wake_up_to_pov_time);

    device.disconnect().await?;
    println!("✓ Disconnected");

    Ok(())
}
