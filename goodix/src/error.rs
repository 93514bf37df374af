//! High-level error types

use goodix_transport::Error as TransportError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] goodix_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] goodix_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] goodix_types::Error),

    #[error("Device not connected")]
    NotConnected,
}

/// Failure categories callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Checksum, trailer or ack validity failure
    MalformedFrame,
    /// Valid frame for another command, or with other flags
    UnexpectedFrame,
    /// Response of the wrong length or without its success sentinel
    ResponseShape,
    /// Transfer deadline exceeded
    Timeout,
    /// Device never appeared while connecting
    DeviceNotFound,
    /// Device appeared but never reported ready
    DeviceNotReady,
    /// Device went away
    Disconnected,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use goodix_core::Error as CoreError;

        match self {
            Self::Core(CoreError::MalformedFrame { .. }) => ErrorKind::MalformedFrame,
            Self::Core(CoreError::UnexpectedFrame { .. }) => ErrorKind::UnexpectedFrame,
            Self::Core(CoreError::ResponseShape { .. }) | Self::Types(_) => ErrorKind::ResponseShape,
            Self::Transport(TransportError::Timeout) => ErrorKind::Timeout,
            Self::Transport(TransportError::DeviceNotFound { .. }) => ErrorKind::DeviceNotFound,
            Self::Transport(TransportError::DeviceNotReady { .. }) => ErrorKind::DeviceNotReady,
            Self::Transport(TransportError::Disconnected) => ErrorKind::Disconnected,
            _ => ErrorKind::Other,
        }
    }

    /// Check if a deadline expired, including while connecting
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Check if the device handle should be reset before reuse
    ///
    /// A timed-out exchange may leave the device mid-command.
    pub fn requires_reconnect(&self) -> bool {
        matches!(self.kind(), ErrorKind::Timeout | ErrorKind::Disconnected)
    }
}
