//! Edge case integration tests for the decoder and encoder.
//!
//! - **Schema evolution**: readers ignore fields they do not know and fall
//!   back to defaults for fields the writer did not send.
//! - **Type mismatches**: a getter that does not fit the stored size class
//!   fails with `UnknownType`, or reads as missing when configured to.
//! - **Malformed input**: truncated or inconsistent bytes produce errors,
//!   never panics.
//! - **Limits**: element counts and buffer sizes above the configured
//!   ceilings are rejected on both sides.

use packable_decoder::{ArrayElement, DecodeError, PackConfig, PackDecoder};
use packable_encoder::{EncodeError, PackAdapter, PackEncoder};
use packable_tests::{DataAdapter, ItemAdapter, ProfileAdapter, sample_data, sample_profile};
use packable_wire::{SizeClass, WireError};

fn encode(write: impl FnOnce(&mut PackEncoder)) -> Vec<u8> {
    let mut encoder = PackEncoder::new();
    write(&mut encoder);
    encoder.finish()
}

/// Writes `1` at each listed index.
struct IndexSet;

impl PackAdapter<Vec<u8>> for IndexSet {
    fn encode(&self, encoder: &mut PackEncoder, value: &Vec<u8>) -> Result<(), EncodeError> {
        for &index in value {
            encoder.put_int(index, 1)?;
        }
        Ok(())
    }
}

// ── Schema evolution ────────────────────────────────────────────────────────

#[test]
fn unknown_fields_are_skipped() {
    let data = sample_data();
    let mut encoder = PackEncoder::new();
    DataAdapter.encode(&mut encoder, &data).unwrap();
    encoder
        .put_str(9, "added later")
        .unwrap()
        .put_long(200, -1)
        .unwrap()
        .put_bytes(2, &[1, 2, 3])
        .unwrap();
    let bytes = encoder.finish();

    assert_eq!(PackDecoder::unmarshal(&bytes, &DataAdapter).unwrap(), data);
}

#[test]
fn missing_fields_read_as_none() {
    let bytes = encode(|e| {
        e.put_int(5, 1).unwrap();
    });
    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert!(!decoder.contains(0).unwrap());
    assert_eq!(decoder.get_str(0).unwrap(), None);
    assert_eq!(decoder.get_int_array(4).unwrap(), None);
    assert_eq!(decoder.get_object(6, &ItemAdapter).unwrap(), None);
    assert_eq!(decoder.get_long(255).unwrap(), None);
}

#[test]
fn zero_fields_are_present() {
    let bytes = encode(|e| {
        e.put_int(3, 0).unwrap().put_str(4, "").unwrap();
    });
    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert!(decoder.contains(3).unwrap());
    assert_eq!(decoder.get_int(3).unwrap(), Some(0));
    assert_eq!(decoder.get_double(3).unwrap(), Some(0.0));
    assert_eq!(decoder.get_str(4).unwrap(), Some(""));
    assert_eq!(decoder.get_bytes(4).unwrap(), Some(&[][..]));
}

#[test]
fn empty_input_has_no_fields() {
    let mut decoder = PackDecoder::new(&[]).unwrap();
    assert!(!decoder.contains(0).unwrap());
    assert_eq!(decoder.get_int(0).unwrap(), None);
    assert_eq!(decoder.get_str_array(1).unwrap(), None);
}

#[test]
fn duplicate_index_last_write_wins() {
    let bytes = encode(|e| {
        e.put_int(0, 1).unwrap().put_int(0, 2).unwrap();
    });
    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert_eq!(decoder.get_int(0).unwrap(), Some(2));
}

#[test]
fn reused_child_does_not_see_previous_fields() {
    let records = vec![vec![0, 1, 2, 3, 4, 5], vec![5], vec![1, 3]];
    let bytes = encode(|e| {
        e.put_object_array(0, &records, &IndexSet).unwrap();
    });

    let mut decoder = PackDecoder::new(&bytes).unwrap();
    let mut array = decoder.get_decoder_array(0).unwrap().unwrap();
    let mut seen = Vec::new();
    while let Some(element) = array.next_element().unwrap() {
        let ArrayElement::Record(child) = element else {
            panic!("unexpected null element");
        };
        let present: Vec<u8> = (0..=6).filter(|&i| child.contains(i).unwrap()).collect();
        seen.push(present);
    }
    assert_eq!(seen, records);
}

// ── Type mismatches ─────────────────────────────────────────────────────────

#[test]
fn mismatched_getter_is_unknown_type() {
    let bytes = encode(|e| {
        e.put_str(0, "text").unwrap().put_int(1, 7).unwrap();
    });
    let mut decoder = PackDecoder::new(&bytes).unwrap();

    let err = decoder.get_int(0).unwrap_err();
    assert!(
        matches!(err, DecodeError::UnknownType { index: 0, size_class: SizeClass::Var8 }),
        "{err:?}"
    );
    let err = decoder.get_str(1).unwrap_err();
    assert!(
        matches!(err, DecodeError::UnknownType { index: 1, size_class: SizeClass::Num8 }),
        "{err:?}"
    );
    // The matching getters still work afterwards.
    assert_eq!(decoder.get_str(0).unwrap(), Some("text"));
}

#[test]
fn ignore_unknown_types_reads_mismatches_as_missing() {
    let bytes = encode(|e| {
        e.put_str(0, "text").unwrap().put_long(1, -5).unwrap();
    });
    let config = PackConfig {
        ignore_unknown_types: true,
        ..PackConfig::default()
    };
    let mut decoder = PackDecoder::with_config(&bytes, config).unwrap();
    assert_eq!(decoder.get_int(0).unwrap(), None);
    assert_eq!(decoder.get_bytes(1).unwrap(), None);
    assert_eq!(decoder.get_long(1).unwrap(), Some(-5));
}

// ── Malformed input ─────────────────────────────────────────────────────────

#[test]
fn truncated_payload_is_corrupt() {
    let mut decoder = PackDecoder::new(&[0x50, 0x05, 0x61]).unwrap();
    let err = decoder.get_str(0).unwrap_err();
    assert!(matches!(err, DecodeError::Corrupt { offset: 1, .. }), "{err:?}");
}

#[test]
fn truncated_tag_is_corrupt() {
    let mut decoder = PackDecoder::new(&[0x10, 0x01, 0x80]).unwrap();
    let err = decoder.get_int(0).unwrap_err();
    assert!(matches!(err, DecodeError::Corrupt { offset: 2, .. }), "{err:?}");
}

#[test]
fn truncated_scalar_is_corrupt() {
    let mut decoder = PackDecoder::new(&[0x43, 0x00, 0x00, 0x00]).unwrap();
    assert!(matches!(decoder.contains(3), Err(DecodeError::Corrupt { .. })));
}

#[test]
fn every_prefix_of_a_record_fails_cleanly() {
    let bytes = PackEncoder::marshal(&sample_profile(5), &ProfileAdapter).unwrap();
    for len in 0..bytes.len() {
        // Any outcome is fine as long as nothing panics.
        let _ = PackDecoder::unmarshal(&bytes[..len], &ProfileAdapter);
    }
    let err = PackDecoder::unmarshal(&bytes[..bytes.len() - 1], &ProfileAdapter).unwrap_err();
    assert!(matches!(err, DecodeError::Corrupt { .. }), "{err:?}");
}

#[test]
fn invalid_utf8() {
    let mut decoder = PackDecoder::new(&[0x50, 0x02, 0xC3, 0x28]).unwrap();
    let err = decoder.get_str(0).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidUtf8 { offset: 2 }), "{err:?}");

    let mut decoder = PackDecoder::new(&[0x50, 0x04, 0x01, 0x02, 0xC3, 0x28]).unwrap();
    let err = decoder.get_str_array(0).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidUtf8 { offset: 4 }), "{err:?}");
}

#[test]
fn ragged_fixed_width_array() {
    let mut decoder = PackDecoder::new(&[0x50, 0x03, 0x01, 0x02, 0x03]).unwrap();
    let err = decoder.get_int_array(0).unwrap_err();
    assert!(
        matches!(err, DecodeError::InvalidArrayLength { index: 0, len: 3, width: 4 }),
        "{err:?}"
    );
}

#[test]
fn nulls_rejected_by_non_nullable_getters() {
    let bytes = encode(|e| {
        e.put_nullable_str_array(0, &[Some("a"), None])
            .unwrap()
            .put_nullable_object_array(1, &[None, Some(sample_data())], &DataAdapter)
            .unwrap();
    });
    let mut decoder = PackDecoder::new(&bytes).unwrap();
    let err = decoder.get_str_array(0).unwrap_err();
    assert!(matches!(err, DecodeError::NullElement { position: 1 }), "{err:?}");
    let err = decoder.get_object_array(1, &DataAdapter).unwrap_err();
    assert!(matches!(err, DecodeError::NullElement { position: 0 }), "{err:?}");
}

#[test]
fn trailing_bytes_after_elements() {
    let mut decoder = PackDecoder::new(&[0x50, 0x04, 0x01, 0x01, 0x61, 0xAA]).unwrap();
    let err = decoder.get_str_array(0).unwrap_err();
    assert!(matches!(err, DecodeError::Corrupt { .. }), "{err:?}");
}

#[test]
fn trailing_bytes_after_decoder_array() {
    // One record element {1: 5}, then a stray byte inside the field.
    let bytes = [0x50, 0x06, 0x01, 0x02, 0x00, 0x11, 0x05, 0xAA];
    let mut decoder = PackDecoder::new(&bytes).unwrap();
    let mut array = decoder.get_decoder_array(0).unwrap().unwrap();
    match array.next_element().unwrap() {
        Some(ArrayElement::Record(child)) => assert_eq!(child.get_int(1).unwrap(), Some(5)),
        _ => panic!("expected a record element"),
    }
    let err = array.next_element().err().unwrap();
    assert!(matches!(err, DecodeError::Corrupt { .. }), "{err:?}");

    // Without the stray byte the walk ends cleanly.
    let bytes = [0x50, 0x05, 0x01, 0x02, 0x00, 0x11, 0x05];
    let mut decoder = PackDecoder::new(&bytes).unwrap();
    let mut array = decoder.get_decoder_array(0).unwrap().unwrap();
    assert!(matches!(array.next_element().unwrap(), Some(ArrayElement::Record(_))));
    assert!(array.next_element().unwrap().is_none());
}

#[test]
fn element_length_past_the_field() {
    // One record element claiming 16 bytes with only 2 present.
    let mut decoder = PackDecoder::new(&[0x50, 0x05, 0x01, 0x10, 0x00, 0x10, 0x01]).unwrap();
    assert!(decoder.get_object_array(0, &ItemAdapter).is_err());
}

#[test]
fn oversized_varint_count() {
    let mut decoder = PackDecoder::new(&[0x50, 0x06, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F]).unwrap();
    let err = decoder.get_str_array(0).unwrap_err();
    assert!(matches!(err, DecodeError::Wire(WireError::VarintTooLong)), "{err:?}");
}

// ── Limits ─────────────────────────────────────────────────────────────────

#[test]
fn element_count_limit() {
    let config = PackConfig {
        max_element_count: 2,
        ..PackConfig::default()
    };

    let mut encoder = PackEncoder::with_config(config);
    let err = encoder.put_str_array(0, &["a", "b", "c"]).unwrap_err();
    assert!(matches!(err, EncodeError::ElementCountExceeded { count: 3, limit: 2 }), "{err:?}");

    let bytes = encode(|e| {
        e.put_str_array(0, &["a", "b", "c"]).unwrap();
    });
    let mut decoder = PackDecoder::with_config(&bytes, config).unwrap();
    let err = decoder.get_str_array(0).unwrap_err();
    assert!(matches!(err, DecodeError::ElementCountExceeded { count: 3, limit: 2 }), "{err:?}");

    let mut decoder = PackDecoder::new(&[0x50, 0x05, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F]).unwrap();
    let err = decoder.get_str_array(0).unwrap_err();
    assert!(matches!(err, DecodeError::ElementCountExceeded { .. }), "{err:?}");
}

#[test]
fn buffer_limits() {
    let config = PackConfig {
        max_buffer_size: 64,
        ..PackConfig::default()
    };

    let mut encoder = PackEncoder::with_config(config);
    let err = encoder.put_bytes(0, &[0; 100]).unwrap_err();
    assert!(
        matches!(err, EncodeError::Wire(WireError::CapacityExceeded { limit: 64, .. })),
        "{err:?}"
    );

    let err = PackDecoder::with_config(&[0; 65], config).err().unwrap();
    assert!(
        matches!(err, DecodeError::Wire(WireError::CapacityExceeded { requested: 65, limit: 64 })),
        "{err:?}"
    );
}
