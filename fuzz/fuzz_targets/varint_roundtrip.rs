#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: varint32 encode->decode roundtrip.
//
// Takes 4 bytes of fuzz input as a u32, encodes it, decodes it and
// asserts the value and length match.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let value = u32::from_le_bytes(data[..4].try_into().unwrap());

    let mut buf = [0u8; 5];
    let encoded_len = packable_wire::varint::encode_varint32(value, &mut buf).unwrap();
    assert_eq!(encoded_len, packable_wire::varint::varint32_size(value));

    let (decoded, decoded_len) = packable_wire::varint::decode_varint32(&buf[..encoded_len]).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(decoded_len, encoded_len);
});
