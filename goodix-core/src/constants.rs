//! Protocol constants

use std::time::Duration;

/// Goodix USB vendor identifier
pub const VENDOR_ID: u16 = 0x27c6;

/// Message pack flags: payload is a message protocol frame
pub const FLAGS_MESSAGE_PROTOCOL: u8 = 0xa0;

/// Message pack flags: payload is TLS-framed (image data, TLS handshake)
pub const FLAGS_TRANSPORT_LAYER_SECURITY: u8 = 0xb0;

/// Trailer byte of a message protocol frame sent without checksum
pub const NO_CHECKSUM_TRAILER: u8 = 0x88;

/// Seed of the message protocol checksum (`seed - sum`)
pub const CHECKSUM_SEED: u8 = 0xaa;

/// USB bulk OUT chunk size, the last chunk is zero-padded
pub const CHUNK_SIZE: usize = 0x40;

/// Default bulk IN read size
pub const READ_SIZE: usize = 0x2000;

/// Size of the second read of a split image transfer
pub const CONTINUATION_READ_SIZE: usize = 0x1000;

/// GET_STATUS value reported by a device that is ready for commands
pub const READY_STATUS: u16 = 0x0001;

/// USB interface class carrying the bulk data endpoints (CDC data)
pub const INTERFACE_CLASS_DATA: u8 = 0x0a;

/// Default read/write timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Grace period for the optional NOP ack
pub const DEFAULT_NOP_TIMEOUT: Duration = Duration::from_millis(100);

/// Read timeout used while draining stale frames
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_millis(100);

/// Deadline for the device to appear and report ready
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for the device to disappear after erase or reset
pub const DEFAULT_DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval between device status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default sleep time for idle mode and reset (ms)
pub const DEFAULT_SLEEP_TIME: u8 = 20;

/// Default power-down scan frequency
pub const DEFAULT_POWERDOWN_SCAN_FREQUENCY: u16 = 100;

/// Single-byte success sentinels found at the start of responses
pub mod sentinels {
    /// Most commands report success with 0x01
    pub const SUCCESS: u8 = 0x01;

    /// Preset PSK commands report success with 0x00
    pub const PSK_SUCCESS: u8 = 0x00;
}

/// Register access modes (leading byte of register requests)
pub mod register_modes {
    pub const SINGLE: u8 = 0x00;
    pub const BATCH: u8 = 0x01;
}

/// Fixed request payloads
pub mod payloads {
    pub const NOP: &[u8] = &[0x00, 0x00, 0x00, 0x00];
    pub const GET_IMAGE: &[u8] = &[0x01, 0x00];
    pub const NAV_0: &[u8] = &[0x01, 0x00];
    pub const QUERY_MCU_STATE: &[u8] = &[0x55];
    pub const EMPTY: &[u8] = &[0x00, 0x00];
}
