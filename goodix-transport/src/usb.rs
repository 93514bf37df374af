//! USB bulk transport

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use goodix_core::constants::{
    CHUNK_SIZE, DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT,
    INTERFACE_CLASS_DATA, READY_STATUS,
};
use nusb::transfer::{ControlIn, ControlType, Direction, EndpointType, Recipient, RequestBuffer};
use nusb::{DeviceInfo, Interface};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, trace, warn};

use crate::{Transport, error::*};

/// Standard GET_STATUS request
const GET_STATUS: u8 = 0x00;

/// Opened device with its data interface claimed
struct Link {
    interface: Interface,
    endpoint_in: u8,
    endpoint_out: u8,
    bus: u8,
    address: u8,
}

/// USB transport for Goodix sensors
pub struct UsbTransport {
    vendor_id: u16,
    product_id: u16,
    link: Option<Link>,
    connect_timeout: Duration,
    poll_interval: Duration,
    status_timeout: Duration,
}

impl UsbTransport {
    /// Create new USB transport
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            link: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            status_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set how long to wait for the device to become ready
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the device polling interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the GET_STATUS control transfer timeout
    pub fn with_status_timeout(mut self, timeout: Duration) -> Self {
        self.status_timeout = timeout;
        self
    }

    fn find(&self) -> Result<Option<DeviceInfo>> {
        Ok(nusb::list_devices()?
            .find(|d| d.vendor_id() == self.vendor_id && d.product_id() == self.product_id))
    }

    /// Open the device and claim its data interface
    ///
    /// Returns `None` while the device does not report ready.
    async fn open(&self, device_info: &DeviceInfo) -> Result<Option<Link>> {
        let device = device_info.open()?;

        let configuration = device
            .active_configuration()
            .map_err(|_| Error::InterfaceNotFound(INTERFACE_CLASS_DATA))?;

        let setting = configuration
            .interface_alt_settings()
            .find(|setting| setting.class() == INTERFACE_CLASS_DATA)
            .ok_or(Error::InterfaceNotFound(INTERFACE_CLASS_DATA))?;

        let bulk = |direction: Direction| {
            setting
                .endpoints()
                .find(|ep| ep.direction() == direction && ep.transfer_type() == EndpointType::Bulk)
                .map(|ep| ep.address())
        };
        let endpoint_in = bulk(Direction::In).ok_or(Error::EndpointNotFound("IN"))?;
        let endpoint_out = bulk(Direction::Out).ok_or(Error::EndpointNotFound("OUT"))?;

        let interface = device.claim_interface(setting.interface_number())?;

        let status = get_status(&interface, self.status_timeout).await?;
        if status != READY_STATUS {
            trace!("Device status 0x{:04X}, not ready", status);
            return Ok(None);
        }

        debug!(
            "Interface {} claimed, endpoints IN 0x{:02X} OUT 0x{:02X}",
            setting.interface_number(),
            endpoint_in,
            endpoint_out
        );

        Ok(Some(Link {
            interface,
            endpoint_in,
            endpoint_out,
            bus: device_info.bus_number(),
            address: device_info.device_address(),
        }))
    }
}

async fn get_status(interface: &Interface, deadline: Duration) -> Result<u16> {
    let request = ControlIn {
        control_type: ControlType::Standard,
        recipient: Recipient::Device,
        request: GET_STATUS,
        value: 0,
        index: 0,
        length: 2,
    };

    let data = timeout(deadline, interface.control_in(request))
        .await
        .map_err(|_| Error::Timeout)?
        .into_result()?;

    match data.as_slice() {
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Ok(0),
    }
}

/// Treat a device that vanished mid-open like one that is not ready yet
fn tolerate_gone<T>(result: Result<Option<T>>) -> Result<Option<T>> {
    match result {
        Err(e) if e.is_gone() => {
            trace!("Device not usable yet: {}", e);
            Ok(None)
        }
        other => other,
    }
}

#[async_trait]
impl Transport for UsbTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        debug!(
            "Waiting for {:04x}:{:04x}...",
            self.vendor_id, self.product_id
        );

        let deadline = Instant::now() + self.connect_timeout;
        let mut found = false;

        loop {
            if let Some(device_info) = self.find()? {
                found = true;

                match tolerate_gone(self.open(&device_info).await)? {
                    Some(link) => {
                        info!(
                            "Connected to {:04x}:{:04x} on bus {} addr {}",
                            self.vendor_id, self.product_id, link.bus, link.address
                        );
                        self.link = Some(link);
                        return Ok(());
                    }
                    None => {}
                }
            }

            if Instant::now() >= deadline {
                return Err(if found {
                    Error::DeviceNotReady {
                        vendor_id: self.vendor_id,
                        product_id: self.product_id,
                    }
                } else {
                    Error::DeviceNotFound {
                        vendor_id: self.vendor_id,
                        product_id: self.product_id,
                    }
                });
            }

            sleep(self.poll_interval).await;
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.link.take().is_some() {
            debug!("Released {}", self.description());
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    async fn send(&mut self, data: &[u8], deadline: Duration) -> Result<()> {
        let link = self.link.as_ref().ok_or(Error::NotConnected)?;

        trace!("Sending {} bytes: {:02X?}", data.len(), &data[..data.len().min(16)]);

        for chunk in data.chunks(CHUNK_SIZE) {
            let mut packet = chunk.to_vec();
            packet.resize(CHUNK_SIZE, 0x00);

            timeout(deadline, link.interface.bulk_out(link.endpoint_out, packet))
                .await
                .map_err(|_| Error::Timeout)?
                .into_result()?;
        }

        Ok(())
    }

    async fn receive(&mut self, max_size: usize, deadline: Option<Duration>) -> Result<Bytes> {
        let link = self.link.as_ref().ok_or(Error::NotConnected)?;

        let transfer = link
            .interface
            .bulk_in(link.endpoint_in, RequestBuffer::new(max_size));

        let completion = match deadline {
            Some(deadline) => timeout(deadline, transfer)
                .await
                .map_err(|_| Error::Timeout)?,
            None => transfer.await,
        };
        let data = completion.into_result()?;

        trace!("Received {} bytes: {:02X?}", data.len(), &data[..data.len().min(16)]);

        Ok(Bytes::from(data))
    }

    async fn wait_disconnect(&mut self, deadline: Duration) -> Result<()> {
        let link = self.link.as_ref().ok_or(Error::NotConnected)?;
        let until = Instant::now() + deadline;

        loop {
            match get_status(&link.interface, self.status_timeout).await {
                Ok(_) => {}
                Err(e) if e.is_gone() => {
                    info!("{} disconnected", self.description());
                    self.link = None;
                    return Ok(());
                }
                Err(e) => return Err(e),
            }

            if Instant::now() >= until {
                return Err(Error::StillConnected);
            }

            sleep(self.poll_interval).await;
        }
    }

    fn description(&self) -> String {
        match &self.link {
            Some(link) => format!(
                "USB {:04x}:{:04x} (bus {} addr {})",
                self.vendor_id, self.product_id, link.bus, link.address
            ),
            None => format!("USB {:04x}:{:04x}", self.vendor_id, self.product_id),
        }
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!("USB transport dropped while still connected");
        }
    }
}
