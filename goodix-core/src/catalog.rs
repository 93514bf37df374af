//! Command registry
//!
//! Every request command has one [`CommandSpec`] describing its device quirks:
//! the request checksum policy, whether the ack may be absent, and the shape
//! of the data response (flags, inner layer, split reads, length policy,
//! success sentinel). The exchange engine reads these fields instead of
//! hard-coding per-command behavior.

use std::fmt;

use crate::{
    command::Command,
    constants::{
        CONTINUATION_READ_SIZE, FLAGS_MESSAGE_PROTOCOL, FLAGS_TRANSPORT_LAYER_SECURITY,
        sentinels,
    },
    error::{Error, Result},
};

/// Response length policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Any length
    Any,
    /// Exactly `n` bytes
    Exact(usize),
    /// At most `n` bytes
    AtMost(usize),
    /// At least `n` bytes
    AtLeast(usize),
    /// Exactly the length the request asked for
    Requested,
}

impl Shape {
    /// Replace [`Shape::Requested`] with the per-request length
    ///
    /// A request that does not state its length accepts any length.
    pub fn resolve(self, requested: Option<usize>) -> Self {
        match (self, requested) {
            (Self::Requested, Some(len)) => Self::Exact(len),
            (Self::Requested, None) => Self::Any,
            (shape, _) => shape,
        }
    }

    /// Check a response length against this policy
    pub fn accepts(self, len: usize) -> bool {
        match self {
            Self::Any | Self::Requested => true,
            Self::Exact(n) => len == n,
            Self::AtMost(n) => len <= n,
            Self::AtLeast(n) => len >= n,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any length"),
            Self::Exact(n) => write!(f, "exactly {}", n),
            Self::AtMost(n) => write!(f, "at most {}", n),
            Self::AtLeast(n) => write!(f, "at least {}", n),
            Self::Requested => f.write_str("the requested length"),
        }
    }
}

/// Whether the ack must arrive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckPolicy {
    /// Missing ack is a timeout failure
    Required,
    /// Device may stay silent within the grace timeout
    Optional,
}

/// How long to wait for the data response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Regular read timeout
    Timeout,
    /// No deadline (finger events)
    Unbounded,
}

/// What sits inside the response message pack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseLayer {
    /// Message protocol frame addressed to the request command
    Protocol { checksum: bool },
    /// Opaque TLS-framed bytes
    Raw,
}

/// Data response contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSpec {
    /// Expected message pack flags
    pub flags: u8,

    /// Inner layer
    pub layer: ResponseLayer,

    /// Size of a second read concatenated to the first
    pub continuation: Option<usize>,

    /// Read deadline
    pub wait: Wait,

    /// Length policy
    pub shape: Shape,

    /// Required value of the first response byte
    pub sentinel: Option<u8>,
}

/// Request command contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: Command,

    /// Request trailer is a checksum (else the 0x88 sentinel)
    pub checksum: bool,

    pub ack: AckPolicy,

    /// `None` for ack-only commands
    pub response: Option<ResponseSpec>,
}

impl CommandSpec {
    /// Check if a data response follows the ack
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }
}

const fn reply(shape: Shape) -> ResponseSpec {
    ResponseSpec {
        flags: FLAGS_MESSAGE_PROTOCOL,
        layer: ResponseLayer::Protocol { checksum: true },
        continuation: None,
        wait: Wait::Timeout,
        shape,
        sentinel: None,
    }
}

const fn status(shape: Shape, sentinel: u8) -> ResponseSpec {
    ResponseSpec {
        sentinel: Some(sentinel),
        ..reply(shape)
    }
}

const fn tls(continuation: Option<usize>) -> ResponseSpec {
    ResponseSpec {
        flags: FLAGS_TRANSPORT_LAYER_SECURITY,
        layer: ResponseLayer::Raw,
        continuation,
        ..reply(Shape::Any)
    }
}

const fn finger_event() -> ResponseSpec {
    ResponseSpec {
        wait: Wait::Unbounded,
        ..reply(Shape::Exact(16))
    }
}

const fn ack_only(command: Command) -> CommandSpec {
    CommandSpec {
        command,
        checksum: true,
        ack: AckPolicy::Required,
        response: None,
    }
}

const fn with_response(command: Command, response: ResponseSpec) -> CommandSpec {
    CommandSpec {
        command,
        checksum: true,
        ack: AckPolicy::Required,
        response: Some(response),
    }
}

/// The command table
pub static CATALOG: [CommandSpec; 24] = [
    CommandSpec {
        command: Command::Nop,
        checksum: false,
        ack: AckPolicy::Optional,
        response: None,
    },
    with_response(Command::McuGetImage, tls(Some(CONTINUATION_READ_SIZE))),
    with_response(Command::McuSwitchToFdtDown, finger_event()),
    with_response(Command::McuSwitchToFdtUp, finger_event()),
    with_response(Command::McuSwitchToFdtMode, reply(Shape::Exact(16))),
    with_response(
        Command::Nav0,
        ResponseSpec {
            layer: ResponseLayer::Protocol { checksum: false },
            ..reply(Shape::Any)
        },
    ),
    ack_only(Command::McuSwitchToIdleMode),
    ack_only(Command::WriteSensorRegister),
    with_response(Command::ReadSensorRegister, reply(Shape::Requested)),
    with_response(
        Command::UploadConfigMcu,
        status(Shape::Exact(2), sentinels::SUCCESS),
    ),
    with_response(
        Command::SetPowerdownScanFrequency,
        status(Shape::Exact(2), sentinels::SUCCESS),
    ),
    ack_only(Command::EnableChip),
    with_response(Command::Reset, status(Shape::Exact(3), sentinels::SUCCESS)),
    ack_only(Command::McuEraseApp),
    with_response(Command::ReadOtp, reply(Shape::Any)),
    with_response(Command::FirmwareVersion, reply(Shape::Any)),
    with_response(Command::QueryMcuState, reply(Shape::Exact(16))),
    with_response(Command::RequestTlsConnection, tls(None)),
    ack_only(Command::TlsSuccessfullyEstablished),
    with_response(
        Command::PresetPskWriteR,
        status(Shape::AtMost(2), sentinels::PSK_SUCCESS),
    ),
    with_response(
        Command::PresetPskReadR,
        status(Shape::AtLeast(9), sentinels::PSK_SUCCESS),
    ),
    with_response(
        Command::WriteFirmware,
        status(Shape::Exact(2), sentinels::SUCCESS),
    ),
    with_response(Command::ReadFirmware, reply(Shape::Requested)),
    with_response(
        Command::CheckFirmware,
        status(Shape::Exact(2), sentinels::SUCCESS),
    ),
];

/// Look up the contract of a request command
///
/// # Errors
///
/// Returns [`Error::UnknownCommand`] for commands the host never sends
/// ([`Command::Ack`]).
pub fn lookup(command: Command) -> Result<&'static CommandSpec> {
    CATALOG
        .iter()
        .find(|spec| spec.command == command)
        .ok_or(Error::UnknownCommand(command.id()))
}
