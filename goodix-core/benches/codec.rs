use bytes::Bytes;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use goodix_core::{Command, MessagePack, MessageProtocol, Request, image};

fn bench_encode(c: &mut Criterion) {
    let request = Request::write_firmware(0, &[0x5a; 256]);

    c.bench_function("encode write_firmware", |b| {
        b.iter(|| black_box(&request).encode().unwrap())
    });
}

fn bench_decode(c: &mut Criterion) {
    let inner = MessageProtocol::new(Command::ReadFirmware, vec![0xa5; 0x1000])
        .unwrap()
        .encode(true);
    let frame = MessagePack::wrap(inner.freeze()).unwrap().encode().freeze();

    c.bench_function("decode read_firmware response", |b| {
        b.iter(|| {
            let payload = MessagePack::check(black_box(frame.clone()), 0xa0).unwrap();
            MessageProtocol::check(payload, Command::ReadFirmware, true).unwrap()
        })
    });
}

fn bench_image(c: &mut Criterion) {
    let raw = Bytes::from((0..=255u8).cycle().take(6 * 4096).collect::<Vec<_>>());

    c.bench_function("decode image", |b| {
        b.iter(|| image::decode(black_box(&raw)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_image);
criterion_main!(benches);
