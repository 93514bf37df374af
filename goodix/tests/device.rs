//! Command exchanges against the scripted transport

mod common;

use std::time::Duration;

use bytes::Bytes;
use goodix::{Command, ErrorKind, RegisterRead, RegisterValues, Request, ResetFlags};
use goodix_core::{MessagePack, MessageProtocol};
use pretty_assertions::assert_eq;

use common::*;

#[tokio::test]
async fn test_read_otp_returns_payload_unmodified() {
    let (mut device, handle) = connected().await;
    let otp: Vec<u8> = (0..32).collect();
    script_reply(&handle, Command::ReadOtp, &otp);

    assert_eq!(device.read_otp().await.unwrap().as_ref(), otp.as_slice());
    assert_eq!(
        handle.sent(),
        vec![Bytes::from_static(&[
            0xa0, 0x06, 0x00, 0xa6, 0xa6, 0x03, 0x00, 0x00, 0x00, 0x01
        ])]
    );
}

#[tokio::test]
async fn test_empty_psk_at_boundary_length() {
    let (mut device, handle) = connected().await;
    script_reply(
        &handle,
        Command::PresetPskReadR,
        &[0x00, 0x03, 0x00, 0x02, 0xbb, 0x00, 0x00, 0x00, 0x00],
    );

    let psk = device.preset_psk_read_r(0xbb020003, 0).await.unwrap();
    assert!(psk.is_empty());
}

#[tokio::test]
async fn test_psk_read_with_material() {
    let (mut device, handle) = connected().await;
    script_reply(
        &handle,
        Command::PresetPskReadR,
        &[0x00, 0x03, 0x00, 0x02, 0xbb, 0x03, 0x00, 0x00, 0x00, 0xaa, 0xbb, 0xcc],
    );

    let psk = device.preset_psk_read_r(0xbb020003, 3).await.unwrap();
    assert_eq!(psk.as_ref(), &[0xaa, 0xbb, 0xcc]);
}

#[tokio::test]
async fn test_short_firmware_read_is_rejected() {
    let (mut device, handle) = connected().await;
    script_reply(&handle, Command::ReadFirmware, &[0x5a; 99]);

    let err = device.read_firmware(0, 100).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseShape);
}

#[tokio::test]
async fn test_nop_without_ack() {
    let (mut device, handle) = connected().await;
    handle.push_timeout();

    device.nop().await.unwrap();
    assert_eq!(
        handle.sent()[0].as_ref(),
        &[0xa0, 0x08, 0x00, 0xa8, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x88]
    );
}

#[tokio::test]
async fn test_nop_with_ack() {
    let (mut device, handle) = connected().await;
    handle.push_frame(ack_frame(Command::Nop, false));

    device.nop().await.unwrap();
    assert_eq!(handle.pending(), 0);
}

#[tokio::test]
async fn test_missing_ack_is_fatal() {
    let (mut device, handle) = connected().await;
    handle.push_timeout();

    let err = device.read_otp().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.requires_reconnect());
}

#[tokio::test]
async fn test_ack_for_other_command() {
    let (mut device, handle) = connected().await;
    handle.push_frame(ack_frame(Command::FirmwareVersion, false));

    let err = device.read_otp().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedFrame);
}

#[tokio::test]
async fn test_corrupted_ack() {
    let (mut device, handle) = connected().await;

    let mut frame = ack_frame(Command::ReadOtp, false).to_vec();
    let last = frame.len() - 1;
    frame[last] ^= 0xff;
    handle.push_frame(frame);

    let err = device.read_otp().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedFrame);
}

#[tokio::test]
async fn test_ack_without_valid_bit() {
    let (mut device, handle) = connected().await;
    handle.push_frame(response_frame(Command::Ack, &[0xa6, 0x00]));

    let err = device.read_otp().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedFrame);
}

#[tokio::test]
async fn test_response_for_other_command() {
    let (mut device, handle) = connected().await;
    handle.push_frame(ack_frame(Command::ReadOtp, false));
    handle.push_frame(response_frame(Command::FirmwareVersion, &[0; 4]));

    let err = device.read_otp().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedFrame);
}

#[tokio::test]
async fn test_disconnect_mid_exchange() {
    let (mut device, handle) = connected().await;
    handle.push_frame(ack_frame(Command::ReadOtp, false));
    handle.push_disconnect();

    let err = device.read_otp().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Disconnected);
    assert!(!device.is_connected());
}

#[tokio::test]
async fn test_no_config_flag() {
    let (mut device, handle) = connected().await;
    handle.push_frame(ack_frame(Command::EnableChip, true));

    let reply = device.execute(&Request::enable_chip(true)).await.unwrap();
    assert!(reply.has_no_config);
    assert!(reply.payload.is_empty());
}

#[tokio::test]
async fn test_image_spans_two_reads() {
    let (mut device, handle) = connected().await;
    let image: Vec<u8> = (0..60).collect();
    let raw = tls_frame(&image);

    handle.push_frame(ack_frame(Command::McuGetImage, false));
    handle.push_frame(raw.slice(..20));
    handle.push_frame(raw.slice(20..));

    let payload = device.mcu_get_image().await.unwrap();
    assert_eq!(payload.as_ref(), image.as_slice());
    assert_eq!(goodix::image::decode(&payload).unwrap().len(), 40);
}

#[tokio::test]
async fn test_image_missing_continuation() {
    let (mut device, handle) = connected().await;
    let raw = tls_frame(&[0; 60]);

    handle.push_frame(ack_frame(Command::McuGetImage, false));
    handle.push_frame(raw.slice(..20));
    handle.push_frame(Bytes::new());

    let err = device.mcu_get_image().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedFrame);
}

#[tokio::test]
async fn test_query_mcu_state() {
    let (mut device, handle) = connected().await;
    script_reply(
        &handle,
        Command::QueryMcuState,
        &[0x01, 0x03, 0x20, 0, 0, 0, 0, 0, 0, 0x04, 0x10, 0x00, 0x02, 0x00, 0, 0],
    );

    let state = device.query_mcu_state().await.unwrap();
    assert!(state.is_image_valid());
    assert!(state.is_tls_connected());
    assert!(!state.is_locked());
    assert_eq!(state.captured, 2);
    assert_eq!(state.ec_falling_count, 4);
    assert_eq!(state.wake_up_to_pov_time, 0x10);
    assert_eq!(state.wake_up_source, 2);
}

#[tokio::test]
async fn test_fdt_mode_length() {
    let (mut device, handle) = connected().await;
    script_reply(&handle, Command::McuSwitchToFdtMode, &[0; 15]);

    let err = device.mcu_switch_to_fdt_mode(&[0x0d, 0x01]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseShape);
}

#[tokio::test]
async fn test_nav_0_without_checksum() {
    let (mut device, handle) = connected().await;
    let inner = MessageProtocol::new(Command::Nav0, vec![1, 2, 3])
        .unwrap()
        .encode(false);

    handle.push_frame(ack_frame(Command::Nav0, false));
    handle.push_frame(MessagePack::wrap(inner.freeze()).unwrap().encode().freeze());

    assert_eq!(device.nav_0().await.unwrap().as_ref(), &[1, 2, 3]);
}

#[tokio::test]
async fn test_sensor_reset() {
    let (mut device, handle) = connected().await;
    script_reply(&handle, Command::Reset, &[0x01, 0x00, 0x01]);

    let number = device.reset(ResetFlags::RESET_SENSOR, 20).await.unwrap();
    assert_eq!(number, Some(0x0100));
}

#[tokio::test]
async fn test_soft_mcu_reset_has_no_response() {
    let (mut device, handle) = connected().await;
    handle.push_frame(ack_frame(Command::Reset, false));

    let number = device.reset(ResetFlags::SOFT_RESET_MCU, 20).await.unwrap();
    assert_eq!(number, None);
    assert_eq!(handle.pending(), 0);
}

#[tokio::test]
async fn test_batch_register_read() {
    let (mut device, handle) = connected().await;
    script_reply(&handle, Command::ReadSensorRegister, &[1, 2, 3, 4, 0x00]);

    let values = device
        .read_sensor_register(&RegisterRead::batch([0x0220, 0x0236]))
        .await
        .unwrap();
    assert_eq!(values, RegisterValues::Batch(vec![[1, 2], [3, 4]]));
}

#[tokio::test]
async fn test_batch_register_count_mismatch() {
    let (mut device, handle) = connected().await;
    script_reply(&handle, Command::ReadSensorRegister, &[1, 2, 3, 4]);

    let err = device
        .read_sensor_register(&RegisterRead::batch([0x0220, 0x0236]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseShape);
}

#[tokio::test]
async fn test_write_firmware_failure_status() {
    let (mut device, handle) = connected().await;
    script_reply(&handle, Command::WriteFirmware, &[0x00, 0x00]);

    let err = device.write_firmware(0, &[0xff; 16]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseShape);
}

#[tokio::test]
async fn test_status_commands() {
    let (mut device, handle) = connected().await;
    script_reply(&handle, Command::UploadConfigMcu, &[0x01, 0x00]);
    script_reply(&handle, Command::SetPowerdownScanFrequency, &[0x01, 0x00]);
    script_reply(&handle, Command::CheckFirmware, &[0x01, 0x00]);
    script_reply(&handle, Command::PresetPskWriteR, &[0x00]);

    device.upload_config_mcu(&[0x70, 0x11]).await.unwrap();
    device.set_powerdown_scan_frequency(100).await.unwrap();
    device.check_firmware(0, 0x100, 0x1234, None).await.unwrap();
    device
        .preset_psk_write_r(0xbb010002, 2, &[0xaa, 0xbb])
        .await
        .unwrap();

    assert_eq!(handle.sent().len(), 4);
}

#[tokio::test]
async fn test_psk_write_empty_reply() {
    let (mut device, handle) = connected().await;
    script_reply(&handle, Command::PresetPskWriteR, &[]);

    let err = device
        .preset_psk_write_r(0xbb010002, 2, &[0xaa, 0xbb])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseShape);
}

#[tokio::test]
async fn test_ack_only_commands() {
    let (mut device, handle) = connected().await;
    for command in [
        Command::McuSwitchToIdleMode,
        Command::WriteSensorRegister,
        Command::EnableChip,
        Command::TlsSuccessfullyEstablished,
    ] {
        handle.push_frame(ack_frame(command, false));
    }

    device.mcu_switch_to_idle_mode(20).await.unwrap();
    device
        .write_sensor_register(&goodix::RegisterWrite::single(0x0220, vec![0x01, 0x00]))
        .await
        .unwrap();
    device.enable_chip(true).await.unwrap();
    device.tls_successfully_established().await.unwrap();

    assert_eq!(handle.pending(), 0);
}

#[tokio::test]
async fn test_tls_handshake_passthrough() {
    let (mut device, handle) = connected().await;
    handle.push_frame(ack_frame(Command::RequestTlsConnection, false));
    handle.push_frame(tls_frame(&[0x16, 0x03, 0x03, 0x00, 0x01, 0x00]));

    let hello = device.request_tls_connection().await.unwrap();
    assert_eq!(hello.as_ref(), &[0x16, 0x03, 0x03, 0x00, 0x01, 0x00]);
}

#[tokio::test]
async fn test_get_device_info() {
    let (mut device, handle) = connected().await;
    script_reply(&handle, Command::FirmwareVersion, b"GF3268_RTSEC_APP_10041\0\0");
    script_reply(&handle, Command::QueryMcuState, &[0x01; 16]);

    let info = device.get_device_info().await.unwrap();
    assert_eq!(info.transport, "memory");
    assert_eq!(info.firmware_version, "GF3268_RTSEC_APP_10041");
    assert_eq!(info.state.version, 1);
}

#[tokio::test]
async fn test_erase_then_wait_disconnect() {
    let (mut device, handle) = connected().await;
    handle.push_frame(ack_frame(Command::McuEraseApp, false));

    device.mcu_erase_app(0).await.unwrap();
    handle.set_present(false);

    device
        .wait_disconnect(Duration::from_secs(5))
        .await
        .unwrap();
    assert!(!device.is_connected());
}

#[tokio::test]
async fn test_connect_reports_missing_device() {
    let (transport, handle) = goodix::MemoryTransport::new();
    handle.set_present(false);

    let mut device = goodix::Device::new(transport);
    let err = device.connect().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DeviceNotFound);
    assert!(err.is_timeout());
}
