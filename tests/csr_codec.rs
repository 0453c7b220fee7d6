// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Validate control word encoding, decoding and range rejection.
// Author: Lukas Bower
#![forbid(unsafe_code)]

mod common;

use cohesix_pfvf::{
    csr_msg_of, csr_msg_or_sentinel, message_of, CsrCodec, CsrFormat, FieldFormat,
    HwGeneration, NullSink, Pf2VfMsgType, PfvfError, PfvfMessage, Vf2PfMsgType, CSR_GEN2_FMT,
    CSR_GEN4_FMT, PFVF_MSGORIGIN_SYSTEM, PFVF_MSG_NO_RESPONSE,
};
use common::{init_logging, RecordingSink};
use log::Level;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ORIGIN_HIGH: u32 = 1 << 31;

fn low_type_format() -> CsrFormat {
    CsrFormat::new(FieldFormat::new(0, 0xFF), FieldFormat::new(8, 0xFFFF)).with_origin(ORIGIN_HIGH)
}

#[test]
fn encodes_type_and_data_under_origin_tag() {
    let fmt = low_type_format();
    fmt.validate().expect("layout is disjoint");
    let sink = RecordingSink::default();

    let word = csr_msg_of(PfvfMessage::new(5, 1000), &fmt, &sink).expect("encode");
    assert_eq!(word, ORIGIN_HIGH | 5 | (1000 << 8));
    assert_eq!(message_of(word, &fmt, &sink), PfvfMessage::new(5, 1000));
    assert_eq!(sink.count(), 0);
}

#[test]
fn system_origin_overlaps_low_type_field() {
    let fmt = CsrFormat::new(FieldFormat::new(0, 0xFF), FieldFormat::new(8, 0xFFFF));
    let word = csr_msg_of(PfvfMessage::new(5, 1000), &fmt, &NullSink).expect("encode");
    assert_eq!(word, PFVF_MSGORIGIN_SYSTEM | 5 | (1000 << 8));
    assert_eq!(
        fmt.validate(),
        Err(PfvfError::OverlappingFields {
            overlap: PFVF_MSGORIGIN_SYSTEM
        })
    );
}

#[test]
fn rejects_type_wider_than_field() {
    init_logging();
    let sink = RecordingSink::default();
    let msg = PfvfMessage::new(300, 0);

    let err = csr_msg_of(msg, &low_type_format(), &sink).expect_err("type overflows");
    assert_eq!(err, PfvfError::FieldOutOfRange { value: 300, mask: 0xFF });
    assert_eq!(csr_msg_or_sentinel(msg, &low_type_format(), &sink), PFVF_MSG_NO_RESPONSE);

    let entries = sink.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, Level::Error);
    assert!(entries[0].1.contains("0x12C"), "diagnostic: {}", entries[0].1);
    assert!(entries[0].1.contains("255"), "diagnostic: {}", entries[0].1);
}

#[test]
fn rejects_data_wider_than_field() {
    let sink = RecordingSink::default();
    let err = csr_msg_of(PfvfMessage::new(1, 0x400), &CSR_GEN2_FMT, &sink).expect_err("data");
    assert_eq!(err, PfvfError::FieldOutOfRange { value: 0x400, mask: 0x3FF });
    assert_eq!(sink.count(), 1);
}

#[test]
fn stops_at_first_bad_field() {
    let sink = RecordingSink::default();
    let err = csr_msg_of(PfvfMessage::new(0x10, u32::MAX), &CSR_GEN2_FMT, &sink)
        .expect_err("type overflows");
    assert_eq!(err, PfvfError::FieldOutOfRange { value: 0x10, mask: 0x0F });
    assert_eq!(sink.count(), 1, "data must not be inspected after a type failure");
}

#[test]
fn reserved_type_is_never_encoded() {
    let sink = RecordingSink::default();
    let msg = PfvfMessage::new(0, 7);
    assert_eq!(csr_msg_of(msg, &CSR_GEN4_FMT, &sink), Err(PfvfError::ReservedType));
    assert_eq!(csr_msg_or_sentinel(msg, &CSR_GEN4_FMT, &sink), PFVF_MSG_NO_RESPONSE);
    assert!(sink.entries().iter().all(|(level, _)| *level == Level::Error));
}

#[test]
fn zero_type_decodes_with_warning() {
    let sink = RecordingSink::default();
    let word = (0x2A << 6) | PFVF_MSGORIGIN_SYSTEM;

    let msg = message_of(word, &CSR_GEN2_FMT, &sink);
    assert_eq!(msg, PfvfMessage::new(0, 0x2A));

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, Level::Warn);
    assert!(entries[0].1.contains("no type"));
}

#[test]
fn generation_layouts_match_hardware() {
    let restarting = PfvfMessage::from(Pf2VfMsgType::Restarting);
    assert_eq!(csr_msg_of(restarting, &CSR_GEN2_FMT, &NullSink), Ok(0x06));

    let init = PfvfMessage::new(Vf2PfMsgType::Init.into(), 0x3FF);
    assert_eq!(
        csr_msg_of(init, &CSR_GEN2_FMT, &NullSink),
        Ok((0x3FF << 6) | (0x03 << 2) | PFVF_MSGORIGIN_SYSTEM)
    );

    let reset = PfvfMessage::new(Vf2PfMsgType::RpReset.into(), 0xAB_CDEF);
    assert_eq!(
        csr_msg_of(reset, &CSR_GEN4_FMT, &NullSink),
        Ok((0xAB_CDEF << 8) | (0x10 << 2) | PFVF_MSGORIGIN_SYSTEM)
    );
    assert!(matches!(
        csr_msg_of(reset, &CSR_GEN2_FMT, &NullSink),
        Err(PfvfError::FieldOutOfRange { value: 0x10, .. })
    ));

    for generation in HwGeneration::ALL {
        generation.csr_format().validate().expect("hardware layout");
    }
}

#[test]
fn random_messages_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x5F_F0_0D);
    for generation in HwGeneration::ALL {
        let codec = CsrCodec::with_sink(generation.csr_format(), NullSink);
        let fmt = *codec.format();
        for _ in 0..2048 {
            let msg = PfvfMessage::new(
                rng.random_range(1..=fmt.ty.max()),
                rng.random_range(0..=fmt.data.max()),
            );
            let word = codec.encode(msg).expect("in-range message");
            assert_ne!(word, PFVF_MSG_NO_RESPONSE);
            assert_eq!(word & fmt.origin, fmt.origin);
            assert_eq!(codec.decode(word), msg, "{generation} word {word:#010x}");
        }
    }
}

#[test]
fn decode_accepts_any_word() {
    let mut rng = StdRng::seed_from_u64(0xC0DEC0DE);
    for _ in 0..4096 {
        let word: u32 = rng.random();
        let msg = message_of(word, &CSR_GEN4_FMT, &NullSink);
        assert!(msg.ty <= CSR_GEN4_FMT.ty.max());
        assert!(msg.data <= CSR_GEN4_FMT.data.max());
    }
}

#[test]
fn codec_is_shareable_across_threads() {
    let codec = CsrCodec::with_sink(CSR_GEN4_FMT, NullSink);
    std::thread::scope(|scope| {
        for worker in 1..=4u32 {
            let codec = &codec;
            scope.spawn(move || {
                for data in 0..512u32 {
                    let msg = PfvfMessage::new(worker, data * worker);
                    let word = codec.encode(msg).expect("encode");
                    assert_eq!(codec.decode(word), msg);
                }
            });
        }
    });
}

#[test]
fn default_codec_logs_through_facade() {
    init_logging();
    let codec = CsrCodec::for_generation(HwGeneration::Gen2);
    assert_eq!(codec.encode_or_sentinel(PfvfMessage::new(99, 0)), PFVF_MSG_NO_RESPONSE);
    assert_eq!(codec.decode(0).ty, 0);
}

#[test]
fn generation_names_parse() {
    assert_eq!("gen2".parse::<HwGeneration>(), Ok(HwGeneration::Gen2));
    assert_eq!(" GEN4 ".parse::<HwGeneration>(), Ok(HwGeneration::Gen4));
    assert_eq!("4".parse::<HwGeneration>(), Ok(HwGeneration::Gen4));
    assert_eq!(
        "gen9".parse::<HwGeneration>(),
        Err(PfvfError::UnknownGeneration("gen9".to_owned()))
    );
    assert_eq!(HwGeneration::Gen4.to_string(), "gen4");
    assert_eq!(HwGeneration::default(), HwGeneration::Gen2);
}

#[test]
fn format_without_origin_is_rejected() {
    let fmt = CSR_GEN2_FMT.with_origin(0);
    assert_eq!(fmt.validate(), Err(PfvfError::MissingOriginTag));
}

#[test]
fn data_spilling_past_bit_31_is_rejected() {
    let fmt = CsrFormat::new(FieldFormat::new(2, 0x0F), FieldFormat::new(28, 0xFF)).with_origin(1);
    let sink = RecordingSink::default();

    assert_eq!(
        csr_msg_of(PfvfMessage::new(1, 0xFF), &fmt, &sink),
        Err(PfvfError::InvalidField {
            offset: 28,
            mask: 0xFF
        })
    );
    assert_eq!(csr_msg_or_sentinel(PfvfMessage::new(1, 0xFF), &fmt, &sink), PFVF_MSG_NO_RESPONSE);
    assert_eq!(sink.count(), 2);
    assert_eq!(sink.entries()[0].0, Level::Error);

    let word = csr_msg_of(PfvfMessage::new(1, 0x0F), &fmt, &sink).expect("fits in word");
    assert_eq!(message_of(word, &fmt, &sink), PfvfMessage::new(1, 0x0F));
}
