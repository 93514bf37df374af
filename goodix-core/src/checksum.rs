//! Goodix frame checksums
//!
//! The two frame layers use different schemes:
//!
//! - Message pack: `(flags + length_lo + length_hi) & 0xff`, covering the
//!   header only. The payload is protected by the inner layer.
//! - Message protocol: `(0xaa - (command + length_lo + length_hi + data)) & 0xff`,
//!   or the fixed trailer `0x88` when the frame is sent without checksum.

use tracing::trace;

use crate::constants::{CHECKSUM_SEED, NO_CHECKSUM_TRAILER};

fn sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// Calculate the message pack header checksum
///
/// # Examples
///
/// ```
/// use goodix_core::checksum;
///
/// assert_eq!(checksum::message_pack(0xa0, 6), 0xa6);
/// ```
pub fn message_pack(flags: u8, length: u16) -> u8 {
    let [lo, hi] = length.to_le_bytes();
    let checksum = sum(&[flags, lo, hi]);

    trace!(
        flags = format!("0x{:02X}", flags),
        length = length,
        checksum = format!("0x{:02X}", checksum),
        "Calculated message pack checksum"
    );

    checksum
}

/// Calculate the message protocol trailer
///
/// `length` is the on-wire length field (data length + 1). When `use_checksum`
/// is false the trailer is the fixed sentinel `0x88`.
pub fn message_protocol(command: u8, length: u16, data: &[u8], use_checksum: bool) -> u8 {
    if !use_checksum {
        return NO_CHECKSUM_TRAILER;
    }

    let [lo, hi] = length.to_le_bytes();
    let trailer = CHECKSUM_SEED.wrapping_sub(sum(&[command, lo, hi]).wrapping_add(sum(data)));

    trace!(
        command = format!("0x{:02X}", command),
        length = length,
        data_len = data.len(),
        trailer = format!("0x{:02X}", trailer),
        "Calculated message protocol checksum"
    );

    trailer
}

/// Verify a message pack header checksum
pub fn verify_message_pack(flags: u8, length: u16, expected: u8) -> bool {
    message_pack(flags, length) == expected
}

/// Verify a message protocol trailer
pub fn verify_message_protocol(
    command: u8,
    length: u16,
    data: &[u8],
    use_checksum: bool,
    expected: u8,
) -> bool {
    message_protocol(command, length, data, use_checksum) == expected
}
