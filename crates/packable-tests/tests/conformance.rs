//! Conformance tests: fixed records encoded and pinned as hex snapshots.
//!
//! Every snapshot is the exact wire image of a record, written inline so a
//! format change shows up as a diff right next to the code that produced
//! it. A deliberate change is accepted with `cargo insta review`; any other
//! diff is a regression.
//!
//! Each test also decodes its bytes again, so a snapshot can't drift away
//! from what the decoder accepts.

use std::collections::BTreeMap;

use insta::assert_snapshot;
use packable_compact::{CompactDecoderExt, CompactEncoderExt};
use packable_decoder::PackDecoder;
use packable_encoder::PackEncoder;
use packable_tests::{Data, DataAdapter, Item, ItemAdapter, sample_data};

fn encode(write: impl FnOnce(&mut PackEncoder)) -> Vec<u8> {
    let mut encoder = PackEncoder::new();
    write(&mut encoder);
    encoder.finish()
}

// ── Records ─────────────────────────────────────────────────────────────────

#[test]
fn data_record() {
    let bytes = PackEncoder::marshal(&sample_data(), &DataAdapter).unwrap();
    assert_snapshot!(hex::encode(&bytes), @"50076d6573736167655107010400106411c8");
    assert_eq!(PackDecoder::unmarshal(&bytes, &DataAdapter).unwrap(), sample_data());
}

#[test]
fn scalar_size_classes() {
    let bytes = encode(|e| {
        e.put_bool(0, true)
            .unwrap()
            .put_int(1, -1)
            .unwrap()
            .put_long(2, 1 << 40)
            .unwrap()
            .put_c_double(3, 1.5)
            .unwrap()
            .put_str(4, "")
            .unwrap()
            .put_sint(5, -2)
            .unwrap();
    });
    assert_snapshot!(hex::encode(&bytes), @"100131ffffffff420000000000010000330000f83f041503");

    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert_eq!(decoder.get_bool(0).unwrap(), Some(true));
    assert_eq!(decoder.get_int(1).unwrap(), Some(-1));
    assert_eq!(decoder.get_long(2).unwrap(), Some(1 << 40));
    assert_eq!(decoder.get_c_double(3).unwrap(), Some(1.5));
    assert_eq!(decoder.get_str(4).unwrap(), Some(""));
    assert_eq!(decoder.get_sint(5).unwrap(), Some(-2));
}

#[test]
fn two_byte_tags() {
    let bytes = encode(|e| {
        e.put_int(200, 5).unwrap().put_str(16, "a").unwrap();
    });
    assert_snapshot!(hex::encode(&bytes), @"90c805d0100161");

    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert_eq!(decoder.get_int(200).unwrap(), Some(5));
    assert_eq!(decoder.get_str(16).unwrap(), Some("a"));
}

#[test]
fn sixteen_bit_length_prefix() {
    let bytes = encode(|e| {
        e.put_bytes(0, &[7; 256]).unwrap();
    });
    assert_eq!(bytes.len(), 3 + 256);
    assert_snapshot!(hex::encode(&bytes[..3]), @"600001");
}

#[test]
fn empty_nested_record_is_a_zero_tag() {
    let bytes = encode(|e| {
        e.put_object(0, &Data::default(), &DataAdapter).unwrap();
    });
    assert_snapshot!(hex::encode(&bytes), @"00");

    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert_eq!(decoder.get_object(0, &DataAdapter).unwrap(), Some(Data::default()));
}

// ── Collections ────────────────────────────────────────────────────────────

#[test]
fn string_keyed_map() {
    let map = BTreeMap::from([("a".to_owned(), 1), ("b".to_owned(), 2)]);
    let bytes = encode(|e| {
        e.put_map(0, &map).unwrap();
    });
    assert_snapshot!(hex::encode(&bytes), @"500d02016101000000016202000000");

    let mut decoder = PackDecoder::new(&bytes).unwrap();
    let back: BTreeMap<String, i32> = decoder.get_map(0).unwrap().unwrap();
    assert_eq!(back, map);
}

#[test]
fn nullable_string_array() {
    let bytes = encode(|e| {
        e.put_nullable_str_array(0, &[Some("x"), None]).unwrap();
    });
    assert_snapshot!(hex::encode(&bytes), @"5008020178ffffffff0f");

    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert_eq!(decoder.get_nullable_str_array(0).unwrap().unwrap(), [Some("x"), None]);
}

#[test]
fn nullable_object_array() {
    let friends = [Some(Item::new(1, 0)), None];
    let bytes = encode(|e| {
        e.put_nullable_object_array(0, &friends, &ItemAdapter).unwrap();
    });
    assert_snapshot!(hex::encode(&bytes), @"5008020300100101ffff");

    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert_eq!(
        decoder.get_nullable_object_array(0, &ItemAdapter).unwrap().unwrap(),
        friends
    );
}

// ── Compact arrays ─────────────────────────────────────────────────────────

#[test]
fn compact_arrays() {
    let bytes = encode(|e| {
        e.put_bool_array(2, &[true, false, true])
            .unwrap()
            .put_enum_array(3, &[1, 0, 3, 2])
            .unwrap()
            .put_compact_int_array(4, &[0, 0, 0, 300, 0])
            .unwrap();
    });
    assert_snapshot!(hex::encode(&bytes), @"520165530208b154050580002c01");

    let mut decoder = PackDecoder::new(&bytes).unwrap();
    assert_eq!(decoder.get_bool_array(2).unwrap().unwrap(), [true, false, true]);
    assert_eq!(decoder.get_enum_array(3).unwrap().unwrap(), [1, 0, 3, 2]);
    assert_eq!(decoder.get_compact_int_array(4).unwrap().unwrap(), [0, 0, 0, 300, 0]);
}
