//! In-memory scripted transport
//!
//! Plays back a queue of inbound events and records every outbound frame.
//! The [`MemoryHandle`] shares that state with the test driving the
//! transport, so frames can be scripted and inspected after the transport
//! moved into a device.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use goodix_core::constants::DEFAULT_POLL_INTERVAL;
use parking_lot::Mutex;
use tokio::time::{Instant, sleep};
use tracing::trace;

use crate::{Transport, error::*};

/// Scripted inbound event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Next read returns these bytes
    Frame(Bytes),

    /// Next read times out
    Timeout,

    /// Next read finds the device gone
    Disconnected,
}

#[derive(Debug)]
struct State {
    present: bool,
    ready: bool,
    connected: bool,
    inbound: VecDeque<Inbound>,
    outbound: Vec<Bytes>,
}

/// Shared view of a [`MemoryTransport`]
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    state: Arc<Mutex<State>>,
}

impl MemoryHandle {
    /// Queue a frame for a later read
    pub fn push_frame(&self, frame: impl Into<Bytes>) {
        self.state.lock().inbound.push_back(Inbound::Frame(frame.into()));
    }

    /// Queue a read timeout
    pub fn push_timeout(&self) {
        self.state.lock().inbound.push_back(Inbound::Timeout);
    }

    /// Queue a disconnect
    pub fn push_disconnect(&self) {
        self.state.lock().inbound.push_back(Inbound::Disconnected);
    }

    /// Frames sent so far, in order
    pub fn sent(&self) -> Vec<Bytes> {
        self.state.lock().outbound.clone()
    }

    /// Drain the recorded frames
    pub fn take_sent(&self) -> Vec<Bytes> {
        std::mem::take(&mut self.state.lock().outbound)
    }

    /// Number of inbound events not read yet
    pub fn pending(&self) -> usize {
        self.state.lock().inbound.len()
    }

    /// Make the device appear or vanish
    pub fn set_present(&self, present: bool) {
        self.state.lock().present = present;
    }

    /// Make the device report ready or busy
    pub fn set_ready(&self, ready: bool) {
        self.state.lock().ready = ready;
    }
}

/// Scripted transport for tests and simulations
///
/// # Examples
///
/// ```
/// use goodix_transport::{MemoryTransport, Transport};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (mut transport, handle) = MemoryTransport::new();
/// handle.push_frame(vec![0xa0, 0x00, 0x00, 0xa0]);
///
/// transport.connect().await.unwrap();
/// let frame = transport.receive(0x2000, Some(Duration::from_secs(1))).await.unwrap();
/// assert_eq!(frame.as_ref(), &[0xa0, 0x00, 0x00, 0xa0]);
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
    poll_interval: Duration,
}

impl MemoryTransport {
    /// Create a transport for a present, ready device with nothing queued
    pub fn new() -> (Self, MemoryHandle) {
        let state = Arc::new(Mutex::new(State {
            present: true,
            ready: true,
            connected: false,
            inbound: VecDeque::new(),
            outbound: Vec::new(),
        }));

        let transport = Self {
            state: Arc::clone(&state),
            poll_interval: DEFAULT_POLL_INTERVAL,
        };

        (transport, MemoryHandle { state })
    }

    /// Set the device polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&mut self) -> Result<()> {
        let mut state = self.state.lock();

        if state.connected {
            return Err(Error::AlreadyConnected);
        }
        if !state.present {
            return Err(Error::DeviceNotFound {
                vendor_id: 0,
                product_id: 0,
            });
        }
        if !state.ready {
            return Err(Error::DeviceNotReady {
                vendor_id: 0,
                product_id: 0,
            });
        }

        state.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.state.lock().connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    async fn send(&mut self, data: &[u8], _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock();

        if !state.connected {
            return Err(Error::NotConnected);
        }

        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(16)]);
        state.outbound.push(Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn receive(&mut self, max_size: usize, _timeout: Option<Duration>) -> Result<Bytes> {
        let mut state = self.state.lock();

        if !state.connected {
            return Err(Error::NotConnected);
        }

        // an exhausted script behaves like a silent device
        match state.inbound.pop_front().unwrap_or(Inbound::Timeout) {
            Inbound::Frame(mut frame) => {
                frame.truncate(max_size);
                trace!("Received {} bytes: {:02X?}", frame.len(), &frame[..frame.len().min(16)]);
                Ok(frame)
            }
            Inbound::Timeout => Err(Error::Timeout),
            Inbound::Disconnected => {
                state.connected = false;
                state.present = false;
                Err(Error::Disconnected)
            }
        }
    }

    async fn wait_disconnect(&mut self, timeout: Duration) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let until = Instant::now() + timeout;

        loop {
            {
                let mut state = self.state.lock();
                if !state.present {
                    state.connected = false;
                    return Ok(());
                }
            }

            if Instant::now() >= until {
                return Err(Error::StillConnected);
            }

            sleep(self.poll_interval).await;
        }
    }

    fn description(&self) -> String {
        "memory".to_string()
    }
}
