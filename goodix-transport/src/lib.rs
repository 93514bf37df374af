//! Transport layer for Goodix sensors
//!
//! Provides USB bulk communication with devices, and an in-memory scripted
//! transport for tests and simulations.

pub mod error;
pub mod memory;
pub mod usb;

pub use error::{Error, Result};
pub use memory::{Inbound, MemoryHandle, MemoryTransport};
pub use usb::UsbTransport;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send + Sync {
    /// Wait for the device to appear and report ready
    async fn connect(&mut self) -> Result<()>;

    /// Release the device
    async fn disconnect(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Send one frame
    async fn send(&mut self, data: &[u8], timeout: Duration) -> Result<()>;

    /// Receive up to `max_size` bytes, waiting forever when `timeout` is `None`
    async fn receive(&mut self, max_size: usize, timeout: Option<Duration>) -> Result<Bytes>;

    /// Wait for the device to go away (after erase or reset)
    async fn wait_disconnect(&mut self, timeout: Duration) -> Result<()>;

    /// Human readable device description
    fn description(&self) -> String;
}
