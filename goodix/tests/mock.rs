//! Exact outbound bytes and read parameters, checked with a mocked transport

mod common;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use goodix::{Command, Device, ErrorKind, Transport};
use goodix_transport::{Error as TransportError, Result};
use mockall::{Sequence, mock, predicate::eq};

use common::*;

mock! {
    pub Sensor {}

    #[async_trait]
    impl Transport for Sensor {
        async fn connect(&mut self) -> Result<()>;
        async fn disconnect(&mut self) -> Result<()>;
        fn is_connected(&self) -> bool;
        async fn send(&mut self, data: &[u8], timeout: Duration) -> Result<()>;
        async fn receive(&mut self, max_size: usize, timeout: Option<Duration>) -> Result<Bytes>;
        async fn wait_disconnect(&mut self, timeout: Duration) -> Result<()>;
        fn description(&self) -> String;
    }
}

const NOP_FRAME: [u8; 12] = [
    0xa0, 0x08, 0x00, 0xa8, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x88,
];

fn online() -> MockSensor {
    let mut sensor = MockSensor::new();
    sensor.expect_is_connected().return_const(true);
    sensor.expect_description().return_const("mock".to_string());
    sensor
}

#[tokio::test]
async fn test_nop_ack_grace_timeout() {
    let mut sensor = online();
    let mut seq = Sequence::new();

    sensor
        .expect_send()
        .withf(|data, timeout| data == &NOP_FRAME[..] && *timeout == Duration::from_secs(1))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    sensor
        .expect_receive()
        .with(eq(0x2000), eq(Some(Duration::from_millis(100))))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Err(TransportError::Timeout));

    let mut device = Device::new(sensor);
    device.nop().await.unwrap();
}

#[tokio::test]
async fn test_custom_timeouts() {
    let mut sensor = online();

    sensor
        .expect_send()
        .withf(|_, timeout| *timeout == Duration::from_millis(250))
        .returning(|_, _| Ok(()));
    sensor
        .expect_receive()
        .with(eq(0x2000), eq(Some(Duration::from_millis(20))))
        .times(1)
        .returning(|_, _| Err(TransportError::Timeout));

    let mut device = Device::new(sensor)
        .with_timeout(Duration::from_millis(250))
        .with_nop_timeout(Duration::from_millis(20));
    device.nop().await.unwrap();
}

#[tokio::test]
async fn test_finger_down_waits_without_deadline() {
    let mut sensor = online();
    let mut seq = Sequence::new();

    sensor.expect_send().returning(|_, _| Ok(()));
    sensor
        .expect_receive()
        .with(eq(0x2000), eq(Some(Duration::from_secs(1))))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(ack_frame(Command::McuSwitchToFdtDown, false)));
    sensor
        .expect_receive()
        .with(eq(0x2000), eq(None))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(response_frame(Command::McuSwitchToFdtDown, &[0x11; 16])));

    let mut device = Device::new(sensor);
    let event = device.mcu_switch_to_fdt_down(&[0x0c, 0x01]).await.unwrap();

    assert_eq!(event.as_ref(), &[0x11; 16]);
}

#[tokio::test]
async fn test_image_continuation_read_size() {
    let mut sensor = online();
    let mut seq = Sequence::new();
    let raw = tls_frame(&[0x5a; 0x30]);

    // ack, then the first half of the image
    let mut frames = vec![
        ack_frame(Command::McuGetImage, false),
        raw.slice(..0x10),
    ]
    .into_iter();
    let tail = raw.slice(0x10..);

    sensor.expect_send().returning(|_, _| Ok(()));
    sensor
        .expect_receive()
        .with(eq(0x2000), eq(Some(Duration::from_secs(1))))
        .times(2)
        .in_sequence(&mut seq)
        .returning(move |_, _| frames.next().ok_or(TransportError::Timeout));
    sensor
        .expect_receive()
        .with(eq(0x1000), eq(Some(Duration::from_secs(1))))
        .times(1)
        .in_sequence(&mut seq)
        .returning(move |_, _| Ok(tail.clone()));

    let mut device = Device::new(sensor);
    assert_eq!(device.mcu_get_image().await.unwrap().len(), 0x30);
}

#[tokio::test]
async fn test_send_failure_aborts_exchange() {
    let mut sensor = online();

    sensor
        .expect_send()
        .returning(|_, _| Err(TransportError::Disconnected));
    sensor.expect_receive().never();

    let mut device = Device::new(sensor);
    let err = device.read_otp().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Disconnected);
}
