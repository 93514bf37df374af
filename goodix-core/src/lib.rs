//! # goodix-core
//!
//! Wire protocol of Goodix USB fingerprint sensors.
//!
//! This crate has no I/O. It provides:
//! - The message pack (outer) and message protocol (inner) frame codecs
//! - Checksum calculation for both layers
//! - Command identifiers and the per-command registry
//! - Ack records, request encoders and response validators
//! - 12-bit image and sensor register sub-codecs
//! - The exchange state machine every command follows

pub mod ack;
pub mod catalog;
pub mod checksum;
pub mod command;
pub mod constants;
pub mod error;
pub mod exchange;
pub mod image;
pub mod pack;
pub mod protocol;
pub mod register;
pub mod request;
pub mod response;

pub use ack::Ack;
pub use catalog::{CommandSpec, ResponseSpec, Shape};
pub use command::Command;
pub use error::{Error, Result};
pub use exchange::{Exchange, ExchangeState};
pub use pack::MessagePack;
pub use protocol::MessageProtocol;
pub use register::{RegisterRead, RegisterValues, RegisterWrite};
pub use request::{Request, ResetFlags};
