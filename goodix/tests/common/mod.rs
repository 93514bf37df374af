//! Frame builders and a connected device over the scripted transport

#![allow(dead_code)]

use bytes::Bytes;
use goodix::{Device, MemoryHandle, MemoryTransport};
use goodix_core::{Ack, Command, MessagePack, MessageProtocol};

/// Ack frame as the device sends it
pub fn ack_frame(command: Command, has_no_config: bool) -> Bytes {
    let record = Ack::new(command, has_no_config).encode();
    response_frame(Command::Ack, &record)
}

/// Checksummed message protocol response inside a `0xa0` pack
pub fn response_frame(command: Command, data: &[u8]) -> Bytes {
    let inner = MessageProtocol::new(command, data.to_vec())
        .unwrap()
        .encode(true);
    MessagePack::wrap(inner.freeze()).unwrap().encode().freeze()
}

/// TLS-framed response inside a `0xb0` pack
pub fn tls_frame(data: &[u8]) -> Bytes {
    MessagePack::new(0xb0, data.to_vec())
        .unwrap()
        .encode()
        .freeze()
}

/// Queue an ack and a data response for `command`
pub fn script_reply(handle: &MemoryHandle, command: Command, data: &[u8]) {
    handle.push_frame(ack_frame(command, false));
    handle.push_frame(response_frame(command, data));
}

pub async fn connected() -> (Device, MemoryHandle) {
    let (transport, handle) = MemoryTransport::new();

    let mut device = Device::new(transport);
    device.connect().await.unwrap();

    (device, handle)
}
