//! High-level device interface

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tracing::{debug, info, trace, warn};

use goodix_core::{
    Ack, Command, CommandSpec, Exchange, ExchangeState, MessagePack, MessageProtocol,
    RegisterRead, RegisterValues, RegisterWrite, Request, ResetFlags, ResponseSpec,
    catalog::{AckPolicy, Wait},
    constants::{
        DEFAULT_DRAIN_TIMEOUT, DEFAULT_NOP_TIMEOUT, DEFAULT_TIMEOUT, FLAGS_MESSAGE_PROTOCOL,
        READ_SIZE, VENDOR_ID,
    },
    response,
};
use goodix_transport::{Error as TransportError, Transport, UsbTransport};
use goodix_types::{DeviceInfo, McuState};

use crate::error::{Error, Result};

/// Outcome of one command exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// The ack reported that the MCU has no configuration loaded
    pub has_no_config: bool,

    /// Unwrapped and validated data response (empty for ack-only commands)
    pub payload: Bytes,
}

/// Goodix fingerprint sensor
///
/// Drives every command through the same exchange: write the request, read
/// and check the ack, then read and validate the data response if the
/// command has one. Exchanges are strictly sequential; share a device
/// between tasks behind a mutex.
///
/// # Examples
///
/// ```no_run
/// use goodix::Device;
///
/// #[tokio::main]
/// async fn main() -> goodix::Result<()> {
///     let mut device = Device::usb(0x5110);
///
///     device.connect().await?;
///
///     let info = device.get_device_info().await?;
///     println!("Device: {}", info);
///
///     device.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Device {
    transport: Box<dyn Transport>,
    timeout: Duration,
    nop_timeout: Duration,
    drain_timeout: Duration,
}

impl Device {
    /// Create a device over any transport
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            timeout: DEFAULT_TIMEOUT,
            nop_timeout: DEFAULT_NOP_TIMEOUT,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Create a device for a Goodix USB product
    pub fn usb(product_id: u16) -> Self {
        Self::new(UsbTransport::new(VENDOR_ID, product_id))
    }

    /// Set read/write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how long to wait for the optional NOP ack
    pub fn with_nop_timeout(mut self, timeout: Duration) -> Self {
        self.nop_timeout = timeout;
        self
    }

    /// Set the read timeout used to drain stale frames on connect
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Connect to device
    ///
    /// Waits for the device to report ready, then discards any frames left
    /// over from a previous session.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The device never appears, or never reports ready
    /// - A stale read fails with anything but a timeout
    pub async fn connect(&mut self) -> Result<()> {
        info!("Connecting to {}...", self.transport.description());

        self.transport.connect().await?;

        let drained = self.drain().await?;
        if drained > 0 {
            debug!("Discarded {} stale frames", drained);
        }

        info!("Connected to {}", self.transport.description());
        Ok(())
    }

    /// Disconnect from device
    pub async fn disconnect(&mut self) -> Result<()> {
        if !self.is_connected() {
            return Ok(());
        }

        info!("Disconnecting from {}...", self.transport.description());
        self.transport.disconnect().await?;

        info!("Disconnected");
        Ok(())
    }

    /// Wait for the device to drop off the bus (after erase or reset)
    pub async fn wait_disconnect(&mut self, timeout: Duration) -> Result<()> {
        self.ensure_connected()?;

        debug!("Waiting for {} to disconnect...", self.transport.description());
        self.transport.wait_disconnect(timeout).await?;

        Ok(())
    }

    /// Get device information
    ///
    /// Combines the transport description, firmware version and MCU state.
    pub async fn get_device_info(&mut self) -> Result<DeviceInfo> {
        debug!("Getting device info...");

        let firmware_version = self.firmware_version().await?;
        let state = self.query_mcu_state().await?;

        let info = DeviceInfo::new(self.transport.description(), firmware_version, state);
        debug!("Device info: {}", info);

        Ok(info)
    }

    /// Run one command exchange
    ///
    /// Nothing is retried: the protocol has no idempotent retry contract. A
    /// missing NOP ack is the only absorbed failure.
    ///
    /// # Errors
    ///
    /// Returns the first failure of any layer: transport, framing, ack or
    /// response shape.
    pub async fn execute(&mut self, request: &Request) -> Result<Reply> {
        self.ensure_connected()?;

        let spec = request.spec()?;
        let mut exchange = Exchange::new(spec, request.expects_response(spec));

        let result = self.run(request, spec, &mut exchange).await;
        if let Err(e) = &result {
            warn!("{} aborted in state {}: {}", request.command(), exchange.state(), e);
            exchange.abort();
        }

        result
    }

    async fn run(
        &mut self,
        request: &Request,
        spec: &CommandSpec,
        exchange: &mut Exchange,
    ) -> Result<Reply> {
        let command = request.command();
        debug!("Executing {:?}", request);

        let frame = request.encode()?;
        self.transport.send(&frame, self.timeout).await?;
        exchange.advance(ExchangeState::Sent)?;
        exchange.advance(ExchangeState::AckAwaited)?;

        let has_no_config = match spec.ack {
            AckPolicy::Required => self.read_ack(command, self.timeout).await?,
            AckPolicy::Optional => match self.read_ack(command, self.nop_timeout).await {
                Ok(has_no_config) => has_no_config,
                Err(Error::Transport(TransportError::Timeout)) => {
                    trace!("{}: no ack", command);
                    exchange.advance(ExchangeState::Idle)?;
                    return Ok(Reply {
                        has_no_config: false,
                        payload: Bytes::new(),
                    });
                }
                Err(e) => return Err(e),
            },
        };
        exchange.advance(ExchangeState::AckReceived)?;

        if has_no_config {
            warn!("{}: MCU has no configuration loaded", command);
        }

        let contract = match spec.response {
            Some(contract) if exchange.expects_response() => contract,
            _ => {
                exchange.advance(ExchangeState::Idle)?;
                return Ok(Reply {
                    has_no_config,
                    payload: Bytes::new(),
                });
            }
        };

        exchange.advance(ExchangeState::ResponseAwaited)?;
        let raw = self.read_response(&contract).await?;
        let payload = response::unwrap(command, &contract, raw)?;
        exchange.advance(ExchangeState::ResponseReceived)?;

        response::validate(command, &contract, &payload, request.response_len())?;
        exchange.advance(ExchangeState::Idle)?;

        debug!("{} returned {} bytes", command, payload.len());
        Ok(Reply {
            has_no_config,
            payload,
        })
    }

    pub async fn nop(&mut self) -> Result<()> {
        self.execute(&Request::nop()).await?;
        Ok(())
    }

    /// Raw TLS-framed image block
    pub async fn mcu_get_image(&mut self) -> Result<Bytes> {
        self.payload(Request::mcu_get_image()).await
    }

    /// Arm finger-down detection and wait for the event (no deadline)
    pub async fn mcu_switch_to_fdt_down(&mut self, mode: &[u8]) -> Result<Bytes> {
        self.payload(Request::mcu_switch_to_fdt_down(Bytes::copy_from_slice(mode)))
            .await
    }

    /// Arm finger-up detection and wait for the event (no deadline)
    pub async fn mcu_switch_to_fdt_up(&mut self, mode: &[u8]) -> Result<Bytes> {
        self.payload(Request::mcu_switch_to_fdt_up(Bytes::copy_from_slice(mode)))
            .await
    }

    pub async fn mcu_switch_to_fdt_mode(&mut self, mode: &[u8]) -> Result<Bytes> {
        self.payload(Request::mcu_switch_to_fdt_mode(Bytes::copy_from_slice(mode)))
            .await
    }

    pub async fn nav_0(&mut self) -> Result<Bytes> {
        self.payload(Request::nav_0()).await
    }

    pub async fn mcu_switch_to_idle_mode(&mut self, sleep_time: u8) -> Result<()> {
        self.execute(&Request::mcu_switch_to_idle_mode(sleep_time))
            .await?;
        Ok(())
    }

    pub async fn write_sensor_register(&mut self, write: &RegisterWrite) -> Result<()> {
        self.execute(&Request::write_sensor_register(write)).await?;
        Ok(())
    }

    /// Read a register range or a batch of 2-byte registers
    pub async fn read_sensor_register(&mut self, read: &RegisterRead) -> Result<RegisterValues> {
        let payload = self.payload(Request::read_sensor_register(read)).await?;
        Ok(read.split(payload))
    }

    pub async fn upload_config_mcu(&mut self, config: &[u8]) -> Result<()> {
        self.execute(&Request::upload_config_mcu(Bytes::copy_from_slice(config)))
            .await?;
        Ok(())
    }

    pub async fn set_powerdown_scan_frequency(&mut self, frequency: u16) -> Result<()> {
        self.execute(&Request::set_powerdown_scan_frequency(frequency))
            .await?;
        Ok(())
    }

    pub async fn enable_chip(&mut self, enable: bool) -> Result<()> {
        self.execute(&Request::enable_chip(enable)).await?;
        Ok(())
    }

    /// Reset the sensor and/or the MCU
    ///
    /// A sensor reset reports a 16-bit number. A soft MCU reset answers with
    /// the ack only, and `None` is returned.
    pub async fn reset(&mut self, flags: ResetFlags, sleep_time: u8) -> Result<Option<u16>> {
        let request = Request::reset(flags, sleep_time);
        let reply = self.execute(&request).await?;

        if !request.expects_response(request.spec()?) {
            return Ok(None);
        }

        Ok(Some(response::decode_reset(&reply.payload)?))
    }

    /// Erase the MCU application, the device re-enumerates afterwards
    pub async fn mcu_erase_app(&mut self, sleep_time: u8) -> Result<()> {
        self.execute(&Request::mcu_erase_app(sleep_time)).await?;
        Ok(())
    }

    pub async fn read_otp(&mut self) -> Result<Bytes> {
        self.payload(Request::read_otp()).await
    }

    pub async fn firmware_version(&mut self) -> Result<String> {
        let payload = self.payload(Request::firmware_version()).await?;
        Ok(response::decode_firmware_version(&payload)?)
    }

    pub async fn query_mcu_state(&mut self) -> Result<McuState> {
        let payload = self.payload(Request::query_mcu_state()).await?;
        Ok(McuState::try_from(payload.as_ref())?)
    }

    /// Opaque TLS handshake record
    pub async fn request_tls_connection(&mut self) -> Result<Bytes> {
        self.payload(Request::request_tls_connection()).await
    }

    pub async fn tls_successfully_established(&mut self) -> Result<()> {
        self.execute(&Request::tls_successfully_established())
            .await?;
        Ok(())
    }

    pub async fn preset_psk_write_r(&mut self, address: u32, length: u32, data: &[u8]) -> Result<()> {
        self.execute(&Request::preset_psk_write_r(address, length, data))
            .await?;
        Ok(())
    }

    /// Read preset PSK material stored at `address`
    pub async fn preset_psk_read_r(&mut self, address: u32, length: u32) -> Result<Bytes> {
        let payload = self
            .payload(Request::preset_psk_read_r(address, length))
            .await?;
        Ok(response::decode_psk(payload, address)?)
    }

    pub async fn write_firmware(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        self.execute(&Request::write_firmware(offset, data)).await?;
        Ok(())
    }

    pub async fn read_firmware(&mut self, offset: u32, length: u32) -> Result<Bytes> {
        self.payload(Request::read_firmware(offset, length)).await
    }

    pub async fn check_firmware(
        &mut self,
        offset: u32,
        length: u32,
        checksum: u32,
        data: Option<&[u8]>,
    ) -> Result<()> {
        self.execute(&Request::check_firmware(offset, length, checksum, data))
            .await?;
        Ok(())
    }

    // Helper methods

    fn ensure_connected(&self) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    async fn payload(&mut self, request: Request) -> Result<Bytes> {
        Ok(self.execute(&request).await?.payload)
    }

    /// Read until a read times out, returning how many frames were dropped
    async fn drain(&mut self) -> Result<usize> {
        let mut drained = 0;

        loop {
            match self
                .transport
                .receive(READ_SIZE, Some(self.drain_timeout))
                .await
            {
                Ok(frame) => {
                    trace!("Stale frame: {:02X?}", &frame[..frame.len().min(16)]);
                    drained += 1;
                }
                Err(TransportError::Timeout) => return Ok(drained),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read the ack frame and check it acknowledges `command`
    async fn read_ack(&mut self, command: Command, timeout: Duration) -> Result<bool> {
        let raw = self.transport.receive(READ_SIZE, Some(timeout)).await?;
        trace!("Ack frame: {:02X?}", &raw[..raw.len().min(16)]);

        let payload = MessagePack::check(raw, FLAGS_MESSAGE_PROTOCOL)?;
        let record = MessageProtocol::check(payload, Command::Ack, true)?;

        Ok(Ack::check(&record, command)?)
    }

    /// Read the response frame, concatenating a second read for split transfers
    async fn read_response(&mut self, contract: &ResponseSpec) -> Result<Bytes> {
        let timeout = match contract.wait {
            Wait::Timeout => Some(self.timeout),
            Wait::Unbounded => None,
        };

        let first = self.transport.receive(READ_SIZE, timeout).await?;

        let Some(size) = contract.continuation else {
            return Ok(first);
        };

        let second = self.transport.receive(size, timeout).await?;
        trace!("Joined {} + {} bytes", first.len(), second.len());

        let mut joined = BytesMut::with_capacity(first.len() + second.len());
        joined.extend_from_slice(&first);
        joined.extend_from_slice(&second);

        Ok(joined.freeze())
    }
}
