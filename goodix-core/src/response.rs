//! Response unwrapping and validation
//!
//! A data response travels in its own message pack. Depending on the
//! command it carries either a message protocol frame addressed to the
//! request command or raw TLS-framed bytes:
//!
//! ```text
//! ┌──────────────── message pack (flags 0xa0 / 0xb0) ───────────────┐
//! │ flags │ length │ cksum │ ┌── message protocol ──────────────┐   │
//! │       │        │       │ │ cmd │ length │ data │ trailer    │   │
//! │       │        │       │ └──────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! After unwrapping, [`validate`] applies the command's length policy and
//! success sentinel.

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use tracing::trace;

use crate::{
    catalog::{ResponseLayer, ResponseSpec, Shape},
    command::Command,
    error::{Error, Result, ShapeFault},
    pack::MessagePack,
    protocol::MessageProtocol,
};

/// Strip the framing layers of a raw response
///
/// # Errors
///
/// Returns [`Error::MalformedFrame`] or [`Error::UnexpectedFrame`] from the
/// pack and protocol codecs.
pub fn unwrap(command: Command, spec: &ResponseSpec, raw: Bytes) -> Result<Bytes> {
    let payload = MessagePack::check(raw, spec.flags)?;

    match spec.layer {
        ResponseLayer::Protocol { checksum } => MessageProtocol::check(payload, command, checksum),
        ResponseLayer::Raw => Ok(payload),
    }
}

/// Apply the length policy and success sentinel of a response
///
/// `requested` resolves [`Shape::Requested`].
///
/// # Errors
///
/// Returns [`Error::ResponseShape`] on a length or sentinel mismatch.
pub fn validate(
    command: Command,
    spec: &ResponseSpec,
    data: &[u8],
    requested: Option<usize>,
) -> Result<()> {
    let shape = spec.shape.resolve(requested);
    if !shape.accepts(data.len()) {
        return Err(Error::shape(
            command,
            ShapeFault::Length {
                expected: shape,
                actual: data.len(),
            },
        ));
    }

    if let Some(expected) = spec.sentinel {
        let Some(&actual) = data.first() else {
            return Err(Error::shape(
                command,
                ShapeFault::Length {
                    expected: Shape::AtLeast(1),
                    actual: 0,
                },
            ));
        };

        if actual != expected {
            return Err(Error::shape(command, ShapeFault::Sentinel { expected, actual }));
        }
    }

    trace!("{} response accepted: {} bytes", command, data.len());
    Ok(())
}

/// Number reported by a sensor reset
pub fn decode_reset(data: &[u8]) -> Result<u16> {
    match data.get(1..3) {
        Some(number) => Ok(LittleEndian::read_u16(number)),
        None => Err(Error::shape(
            Command::Reset,
            ShapeFault::Length {
                expected: Shape::Exact(3),
                actual: data.len(),
            },
        )),
    }
}

/// Firmware version text, trailing NUL padding removed
pub fn decode_firmware_version(data: &[u8]) -> Result<String> {
    let end = data
        .iter()
        .rposition(|byte| *byte != 0)
        .map_or(0, |index| index + 1);

    String::from_utf8(data[..end].to_vec())
        .map_err(|e| Error::shape(Command::FirmwareVersion, ShapeFault::Text(e.to_string())))
}

/// Key material of a preset PSK read
///
/// ```text
/// ┌────────┬─────────────┬──────────────┬──────────────┐
/// │ status │ address u32 │ length u32   │ key material │
/// └────────┴─────────────┴──────────────┴──────────────┘
/// ```
///
/// Bytes past the declared key length are ignored.
pub fn decode_psk(data: Bytes, address: u32) -> Result<Bytes> {
    const HEADER: usize = 9;
    let command = Command::PresetPskReadR;

    if data.len() < HEADER {
        return Err(Error::shape(
            command,
            ShapeFault::Length {
                expected: Shape::AtLeast(HEADER),
                actual: data.len(),
            },
        ));
    }

    let declared = LittleEndian::read_u32(&data[5..HEADER]) as usize;
    let available = data.len() - HEADER;
    if declared > available {
        return Err(Error::shape(
            command,
            ShapeFault::KeyLength {
                declared,
                available,
            },
        ));
    }

    let echo = LittleEndian::read_u32(&data[1..5]);
    if echo != address {
        return Err(Error::shape(
            command,
            ShapeFault::AddressEcho {
                expected: address,
                actual: echo,
            },
        ));
    }

    Ok(data.slice(HEADER..HEADER + declared))
}
