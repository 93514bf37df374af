//! # goodix
//!
//! Host-side driver for Goodix USB fingerprint sensors.
//!
//! ## Features
//!
//! - Bit-exact message pack and message protocol framing
//! - One typed async method per sensor command
//! - Per-command ack and response validation
//! - USB transport over `nusb`, plus a scripted in-memory transport
//!
//! ## Quick Start
//!
//! ```no_run
//! use goodix::Device;
//!
//! #[tokio::main]
//! async fn main() -> goodix::Result<()> {
//!     // Wait for 27c6:5110 to report ready
//!     let mut device = Device::usb(0x5110);
//!     device.connect().await?;
//!
//!     // Firmware version and MCU state
//!     let info = device.get_device_info().await?;
//!     println!("{}", info);
//!
//!     device.disconnect().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;

// Re-exports
pub use device::{Device, Reply};
pub use error::{Error, ErrorKind, Result};

// Re-export types
pub use goodix_core::{
    Command, RegisterRead, RegisterValues, RegisterWrite, Request, ResetFlags, image,
};
pub use goodix_transport::{MemoryHandle, MemoryTransport, Transport, UsbTransport};
pub use goodix_types::{DeviceInfo, McuState, McuStatus};
