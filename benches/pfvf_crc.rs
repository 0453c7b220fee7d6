use cohesix_pfvf::{blkmsg_crc, BlockMessage, CsrCodec, NullSink, PfvfMessage, CSR_GEN4_FMT};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn make_block() -> BlockMessage {
    let payload: Vec<u8> = (0..126u8).map(|i| i.wrapping_mul(31)).collect();
    BlockMessage::new(3, &payload).unwrap()
}

fn bench_blkmsg_crc(c: &mut Criterion) {
    let block = make_block();
    c.bench_function("blkmsg_crc_128", |b| {
        b.iter(|| blkmsg_crc(black_box(block.as_bytes())));
    });
}

fn bench_csr_codec(c: &mut Criterion) {
    let codec = CsrCodec::with_sink(CSR_GEN4_FMT, NullSink);
    c.bench_function("csr_encode_decode", |b| {
        b.iter(|| {
            let word = codec.encode(black_box(PfvfMessage::new(0x10, 0x00AB_CDEF))).unwrap();
            codec.decode(black_box(word))
        });
    });
}

criterion_group!(benches, bench_blkmsg_crc, bench_csr_codec);
criterion_main!(benches);
