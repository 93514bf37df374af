//! Message pack: the outer transport frame

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    constants::FLAGS_MESSAGE_PROTOCOL,
    error::{Error, FrameFault, Layer, Mismatch, Result},
};

/// Outer transport frame
///
/// # Frame Structure
///
/// ```text
/// ┌─────────┬─────────────┬──────────┬─────────────┐
/// │  Flags  │   Length    │ Checksum │   Payload   │
/// │ 1 byte  │   2 bytes   │  1 byte  │ Length bytes│
/// │  (u8)   │  (LE u16)   │   (u8)   │   (bytes)   │
/// └─────────┴─────────────┴──────────┴─────────────┘
/// ```
///
/// The checksum covers the three header bytes only. Flags are `0xa0` for a
/// message protocol payload and `0xb0` for TLS-framed data.
///
/// # Examples
///
/// ```
/// use goodix_core::MessagePack;
/// use goodix_core::constants::FLAGS_MESSAGE_PROTOCOL;
///
/// let pack = MessagePack::new(FLAGS_MESSAGE_PROTOCOL, vec![1, 2, 3]).unwrap();
/// let encoded = pack.encode();
///
/// let decoded = MessagePack::decode(encoded.freeze()).unwrap();
/// assert_eq!(decoded, pack);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct MessagePack {
    /// Payload kind
    pub flags: u8,

    /// Declared payload length
    pub length: u16,

    /// Payload bytes (may be shorter than `length` after a truncated read)
    pub payload: Bytes,
}

impl MessagePack {
    /// Header size in bytes
    pub const HEADER_SIZE: usize = 4;

    /// Maximum payload size
    pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

    /// Create a frame declaring the payload's own length
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload does not fit the
    /// 16-bit length field.
    pub fn new(flags: u8, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        let length = u16::try_from(payload.len()).map_err(|_| Error::PayloadTooLarge {
            size: payload.len(),
            max: Self::MAX_PAYLOAD_SIZE,
        })?;

        Ok(Self {
            flags,
            length,
            payload,
        })
    }

    /// Override the declared length
    pub fn with_length(mut self, length: u16) -> Self {
        self.length = length;
        self
    }

    /// Header checksum for this frame
    pub fn checksum(&self) -> u8 {
        checksum::message_pack(self.flags, self.length)
    }

    /// Check if the captured payload covers the declared length
    pub fn is_complete(&self) -> bool {
        self.payload.len() >= self.length as usize
    }

    /// Encode frame to bytes
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(Self::HEADER_SIZE + self.payload.len());

        buf.put_u8(self.flags);
        buf.put_u16_le(self.length);
        buf.put_u8(self.checksum());
        buf.put_slice(&self.payload);

        buf
    }

    /// Decode a frame from bytes
    ///
    /// The payload is cut at the declared length; trailing bytes (USB
    /// padding) are ignored. A payload shorter than declared is kept as is,
    /// see [`MessagePack::check`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedFrame`] if the buffer is shorter than the
    /// header or the header checksum does not match.
    pub fn decode(mut buf: Bytes) -> Result<Self> {
        if buf.len() < Self::HEADER_SIZE {
            return Err(Error::malformed(
                Layer::MessagePack,
                FrameFault::TooShort {
                    expected: Self::HEADER_SIZE,
                    actual: buf.len(),
                },
            ));
        }

        let flags = buf.get_u8();
        let length = buf.get_u16_le();
        let checksum_received = buf.get_u8();

        let checksum_calculated = checksum::message_pack(flags, length);
        if checksum_calculated != checksum_received {
            return Err(Error::malformed(
                Layer::MessagePack,
                FrameFault::Checksum {
                    expected: checksum_calculated,
                    received: checksum_received,
                },
            ));
        }

        buf.truncate(length as usize);

        Ok(Self {
            flags,
            length,
            payload: buf,
        })
    }

    /// Decode a frame and make sure it carries `flags` and is complete
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedFrame`] on a flags mismatch or when fewer
    /// bytes were captured than the frame declares.
    pub fn check(buf: Bytes, flags: u8) -> Result<Bytes> {
        let pack = Self::decode(buf)?;

        if pack.flags != flags {
            return Err(Error::unexpected(
                Layer::MessagePack,
                Mismatch::Flags {
                    expected: flags,
                    actual: pack.flags,
                },
            ));
        }

        if !pack.is_complete() {
            return Err(Error::unexpected(
                Layer::MessagePack,
                Mismatch::Incomplete {
                    declared: pack.length as usize,
                    actual: pack.payload.len(),
                },
            ));
        }

        Ok(pack.payload)
    }

    /// Wrap a message protocol frame
    pub fn wrap(payload: impl Into<Bytes>) -> Result<Self> {
        Self::new(FLAGS_MESSAGE_PROTOCOL, payload)
    }

    /// Get total frame size
    pub fn size(&self) -> usize {
        Self::HEADER_SIZE + self.payload.len()
    }
}

impl fmt::Debug for MessagePack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagePack")
            .field("flags", &format!("0x{:02X}", self.flags))
            .field("length", &self.length)
            .field("checksum", &format!("0x{:02X}", self.checksum()))
            .field("payload", &hex::encode(&self.payload[..self.payload.len().min(32)]))
            .finish()
    }
}

impl fmt::Display for MessagePack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MessagePack[0x{:02X}](len={}, captured={})",
            self.flags,
            self.length,
            self.payload.len()
        )
    }
}
