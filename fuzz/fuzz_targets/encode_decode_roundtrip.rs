#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use packable_compact::{CompactDecoderExt, CompactEncoderExt};
use packable_decoder::PackDecoder;
use packable_encoder::PackEncoder;

#[derive(Debug, Arbitrary)]
enum FuzzField {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    CDouble(f64),
    SInt(i32),
    Str(String),
    Bytes(Vec<u8>),
    IntArray(Vec<i32>),
    StrArray(Vec<Option<String>>),
    BoolArray(Vec<bool>),
    EnumArray(Vec<u8>),
    CompactLongs(Vec<i64>),
    CompactDoubles(Vec<f64>),
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    fields: Vec<(u8, FuzzField)>,
}

fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

// Fuzz target: PackEncoder -> PackDecoder roundtrip.
//
// Writes each generated field at its index, keeping only the first field
// per index, then reads every field back with the matching getter.
// The decoder must return exactly what the encoder wrote.
fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(input) = FuzzInput::arbitrary(&mut u) else {
        return;
    };

    let mut seen = [false; 256];
    let fields: Vec<_> = input
        .fields
        .into_iter()
        .filter(|(index, _)| !std::mem::replace(&mut seen[usize::from(*index)], true))
        .take(64)
        .collect();

    let mut encoder = PackEncoder::new();
    for (index, field) in &fields {
        let index = *index;
        let written = match field {
            FuzzField::Bool(v) => encoder.put_bool(index, *v).map(drop),
            FuzzField::Int(v) => encoder.put_int(index, *v).map(drop),
            FuzzField::Long(v) => encoder.put_long(index, *v).map(drop),
            FuzzField::Double(v) => encoder.put_double(index, *v).map(drop),
            FuzzField::CDouble(v) => encoder.put_c_double(index, *v).map(drop),
            FuzzField::SInt(v) => encoder.put_sint(index, *v).map(drop),
            FuzzField::Str(v) => encoder.put_str(index, v).map(drop),
            FuzzField::Bytes(v) => encoder.put_bytes(index, v).map(drop),
            FuzzField::IntArray(v) => encoder.put_int_array(index, v).map(drop),
            FuzzField::StrArray(v) => encoder.put_nullable_str_array(index, v).map(drop),
            FuzzField::BoolArray(v) => encoder.put_bool_array(index, v).map(drop),
            FuzzField::EnumArray(v) => {
                let ordinals: Vec<u32> = v.iter().map(|&b| u32::from(b)).collect();
                encoder.put_enum_array(index, &ordinals).map(drop)
            }
            FuzzField::CompactLongs(v) => encoder.put_compact_long_array(index, v).map(drop),
            FuzzField::CompactDoubles(v) => encoder.put_compact_double_array(index, v).map(drop),
        };
        written.unwrap();
    }
    let payload = encoder.finish();

    let mut decoder = PackDecoder::new(&payload).unwrap();
    for (index, field) in &fields {
        let index = *index;
        match field {
            FuzzField::Bool(v) => assert_eq!(decoder.get_bool(index).unwrap(), Some(*v)),
            FuzzField::Int(v) => assert_eq!(decoder.get_int(index).unwrap(), Some(*v)),
            FuzzField::Long(v) => assert_eq!(decoder.get_long(index).unwrap(), Some(*v)),
            FuzzField::Double(v) => {
                let read = decoder.get_double(index).unwrap().map(f64::to_bits);
                assert_eq!(read, Some(v.to_bits()));
            }
            FuzzField::CDouble(v) => {
                let read = decoder.get_c_double(index).unwrap().map(f64::to_bits);
                assert_eq!(read, Some(v.to_bits()));
            }
            FuzzField::SInt(v) => assert_eq!(decoder.get_sint(index).unwrap(), Some(*v)),
            FuzzField::Str(v) => assert_eq!(decoder.get_str(index).unwrap(), Some(v.as_str())),
            FuzzField::Bytes(v) => assert_eq!(decoder.get_bytes(index).unwrap(), Some(v.as_slice())),
            FuzzField::IntArray(v) => assert_eq!(decoder.get_int_array(index).unwrap().as_ref(), Some(v)),
            FuzzField::StrArray(v) => {
                let read = decoder.get_nullable_str_array(index).unwrap().unwrap();
                let expected: Vec<Option<&str>> = v.iter().map(Option::as_deref).collect();
                assert_eq!(read, expected);
            }
            FuzzField::BoolArray(v) => assert_eq!(decoder.get_bool_array(index).unwrap().as_ref(), Some(v)),
            FuzzField::EnumArray(v) => {
                let read = decoder.get_enum_array(index).unwrap().unwrap();
                assert!(read.iter().copied().eq(v.iter().map(|&b| u32::from(b))));
            }
            FuzzField::CompactLongs(v) => {
                assert_eq!(decoder.get_compact_long_array(index).unwrap().as_ref(), Some(v));
            }
            FuzzField::CompactDoubles(v) => {
                let read = decoder.get_compact_double_array(index).unwrap().unwrap();
                assert_eq!(bits(&read), bits(v));
            }
        }
    }
});
