//! Transport errors

use std::io::ErrorKind;

use nusb::transfer::TransferError;

/// `EIO` and `ENODEV`
const GONE_ERRNO: [i32; 2] = [5, 19];

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Device {vendor_id:04x}:{product_id:04x} found but not ready")]
    DeviceNotReady { vendor_id: u16, product_id: u16 },

    #[error("Transfer timeout")]
    Timeout,

    #[error("Device disconnected")]
    Disconnected,

    #[error("Device still connected")]
    StillConnected,

    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("No interface of class 0x{0:02x}")]
    InterfaceNotFound(u8),

    #[error("No bulk {0} endpoint")]
    EndpointNotFound(&'static str),

    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    #[error("Transfer error: {0}")]
    Transfer(TransferError),
}

impl From<TransferError> for Error {
    fn from(error: TransferError) -> Self {
        match error {
            TransferError::Disconnected => Self::Disconnected,
            other => Self::Transfer(other),
        }
    }
}

impl Error {
    /// Check if a deadline expired
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::DeviceNotFound { .. } | Self::DeviceNotReady { .. }
        )
    }

    /// Check if the device went away or the link failed at the I/O level
    ///
    /// These are the only failures tolerated while polling for a device or
    /// waiting for it to leave. Anything else (permissions, missing
    /// interfaces, stalls, timeouts) is a real error.
    pub fn is_gone(&self) -> bool {
        match self {
            Self::Disconnected | Self::Transfer(TransferError::Fault) => true,
            Self::Usb(e) => {
                e.kind() == ErrorKind::NotFound
                    || e.raw_os_error().is_some_and(|errno| GONE_ERRNO.contains(&errno))
            }
            _ => false,
        }
    }
}
