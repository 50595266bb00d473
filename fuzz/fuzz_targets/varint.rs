#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: decode_varint32.
//
// Catches bugs in:
// - VarintTooLong (5th byte with continuation or high bits)
// - Zero-length input
// - Truncated continuation chains
fuzz_target!(|data: &[u8]| {
    if let Ok((_, consumed)) = packable_wire::varint::decode_varint32(data) {
        assert!(consumed >= 1 && consumed <= 5 && consumed <= data.len());
    }
});
