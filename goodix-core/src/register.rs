//! Sensor register access payloads
//!
//! Register requests start with a mode byte: `0x00` addresses a single
//! register, `0x01` a batch. Batch values are always two bytes wide.

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::register_modes;

/// Width of one batch register value
pub const VALUE_SIZE: usize = 2;

/// Register write request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterWrite {
    /// One register, raw value
    Single { address: u16, value: Bytes },

    /// Several registers, two bytes each
    Batch { pairs: Vec<(u16, [u8; VALUE_SIZE])> },
}

impl RegisterWrite {
    pub fn single(address: u16, value: impl Into<Bytes>) -> Self {
        Self::Single {
            address,
            value: value.into(),
        }
    }

    pub fn batch(pairs: impl IntoIterator<Item = (u16, [u8; VALUE_SIZE])>) -> Self {
        Self::Batch {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Encode the request payload
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        match self {
            Self::Single { address, value } => {
                buf.put_u8(register_modes::SINGLE);
                buf.put_u16_le(*address);
                buf.put_slice(value);
            }
            Self::Batch { pairs } => {
                buf.put_u8(register_modes::BATCH);
                for (address, value) in pairs {
                    buf.put_u16_le(*address);
                    buf.put_slice(value);
                }
            }
        }

        buf.freeze()
    }
}

/// Register read request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterRead {
    /// `length` bytes starting at one register
    Single { address: u16, length: u8 },

    /// Two bytes from each register
    Batch { addresses: Vec<u16> },
}

impl RegisterRead {
    pub fn single(address: u16, length: u8) -> Self {
        Self::Single { address, length }
    }

    pub fn batch(addresses: impl IntoIterator<Item = u16>) -> Self {
        Self::Batch {
            addresses: addresses.into_iter().collect(),
        }
    }

    /// Encode the request payload
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        match self {
            Self::Single { address, length } => {
                buf.put_u8(register_modes::SINGLE);
                buf.put_u16_le(*address);
                buf.put_u8(*length);
            }
            Self::Batch { addresses } => {
                buf.put_u8(register_modes::BATCH);
                for address in addresses {
                    buf.put_u16_le(*address);
                }
                buf.put_u8(VALUE_SIZE as u8);
            }
        }

        buf.freeze()
    }

    /// Exact response length this request asks for
    pub fn response_len(&self) -> usize {
        match self {
            Self::Single { length, .. } => *length as usize,
            // batch replies carry one trailing byte after the values
            Self::Batch { addresses } => addresses.len() * VALUE_SIZE + 1,
        }
    }

    /// Split a length-checked response into values
    pub fn split(&self, data: Bytes) -> RegisterValues {
        match self {
            Self::Single { .. } => RegisterValues::Single(data),
            Self::Batch { addresses } => RegisterValues::Batch(
                data.chunks_exact(VALUE_SIZE)
                    .take(addresses.len())
                    .map(|chunk| [chunk[0], chunk[1]])
                    .collect(),
            ),
        }
    }
}

/// Register read result, shaped like its request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterValues {
    Single(Bytes),
    Batch(Vec<[u8; VALUE_SIZE]>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_write() {
        let request = RegisterWrite::single(0x0220, vec![0x12, 0x34]);
        assert_eq!(request.encode().as_ref(), &[0x00, 0x20, 0x02, 0x12, 0x34]);
    }

    #[test]
    fn test_batch_write() {
        let request = RegisterWrite::batch([(0x0220, [0x01, 0x02]), (0x0236, [0x03, 0x04])]);

        assert_eq!(
            request.encode().as_ref(),
            &[0x01, 0x20, 0x02, 0x01, 0x02, 0x36, 0x02, 0x03, 0x04]
        );
    }

    #[test]
    fn test_single_read() {
        let request = RegisterRead::single(0x0000, 4);

        assert_eq!(request.encode().as_ref(), &[0x00, 0x00, 0x00, 0x04]);
        assert_eq!(request.response_len(), 4);
    }

    #[test]
    fn test_batch_read() {
        let request = RegisterRead::batch([0x0220, 0x0236, 0x0238]);

        assert_eq!(
            request.encode().as_ref(),
            &[0x01, 0x20, 0x02, 0x36, 0x02, 0x38, 0x02, 0x02]
        );
        assert_eq!(request.response_len(), 7);
    }

    #[test]
    fn test_split() {
        let request = RegisterRead::batch([1, 2]);
        let values = request.split(Bytes::from_static(&[0xaa, 0xbb, 0xcc, 0xdd, 0x00]));

        assert_eq!(values, RegisterValues::Batch(vec![[0xaa, 0xbb], [0xcc, 0xdd]]));

        let request = RegisterRead::single(1, 3);
        let values = request.split(Bytes::from_static(&[1, 2, 3]));
        assert_eq!(values, RegisterValues::Single(Bytes::from_static(&[1, 2, 3])));
    }
}
