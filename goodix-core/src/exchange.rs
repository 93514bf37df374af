//! Command exchange state machine
//!
//! Every command walks the same path:
//!
//! ```text
//! Idle → Sent → AckAwaited → AckReceived ─────────────────────────────────→ Idle
//!                                 └→ ResponseAwaited → ResponseReceived ──→ Idle
//! ```
//!
//! The response branch is only legal for commands expecting a data
//! response. A command whose ack is optional may also go back to `Idle`
//! straight from `AckAwaited`.

use std::fmt;

use tracing::trace;

use crate::{
    catalog::{AckPolicy, CommandSpec},
    command::Command,
    error::{Error, Result},
};

/// Exchange state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    /// Nothing in flight
    Idle,

    /// Request written
    Sent,

    /// Waiting for the ack frame
    AckAwaited,

    /// Ack checked against the request command
    AckReceived,

    /// Waiting for the data response
    ResponseAwaited,

    /// Data response unwrapped
    ResponseReceived,
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One in-flight command exchange
#[derive(Debug, Clone)]
pub struct Exchange {
    command: Command,
    ack: AckPolicy,
    expects_response: bool,
    state: ExchangeState,
}

impl Exchange {
    /// Start an idle exchange for a command
    pub fn new(spec: &CommandSpec, expects_response: bool) -> Self {
        Self {
            command: spec.command,
            ack: spec.ack,
            expects_response,
            state: ExchangeState::Idle,
        }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn expects_response(&self) -> bool {
        self.expects_response
    }

    /// Check if nothing is in flight
    pub fn is_idle(&self) -> bool {
        self.state == ExchangeState::Idle
    }

    /// Move to `next`
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidExchangeState`] if the transition is illegal
    /// for this command. The state is left unchanged.
    pub fn advance(&mut self, next: ExchangeState) -> Result<()> {
        use ExchangeState::*;

        let legal = match (self.state, next) {
            (Idle, Sent) | (Sent, AckAwaited) | (AckAwaited, AckReceived) => true,
            (AckAwaited, Idle) => self.ack == AckPolicy::Optional,
            (AckReceived, ResponseAwaited) => self.expects_response,
            (AckReceived, Idle) => !self.expects_response,
            (ResponseAwaited, ResponseReceived) | (ResponseReceived, Idle) => true,
            _ => false,
        };

        if !legal {
            return Err(Error::InvalidExchangeState(format!(
                "{}: cannot move from {} to {}",
                self.command, self.state, next
            )));
        }

        trace!("{}: {} -> {}", self.command, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Return to `Idle` after a failure, whatever the current state
    pub fn abort(&mut self) {
        if self.state != ExchangeState::Idle {
            trace!("{}: {} aborted", self.command, self.state);
            self.state = ExchangeState::Idle;
        }
    }
}
