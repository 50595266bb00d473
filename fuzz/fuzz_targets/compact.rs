#![no_main]

use libfuzzer_sys::fuzz_target;
use packable_compact::CompactDecoderExt;
use packable_decoder::PackDecoder;

// Fuzz target: compact array getters on an arbitrary field payload.
//
// The input is wrapped as the payload of field 0 (Var16 length class),
// so every byte string reaches the compact layouts.
//
// Catches bugs in:
// - Bool and enum header validation
// - Element counts derived from remainder bits
// - Flag groups pointing past the payload
// - Trailing bytes after number arrays
fuzz_target!(|data: &[u8]| {
    if data.len() > 0xFFFF {
        return;
    }
    let mut record = Vec::with_capacity(data.len() + 3);
    record.push(0x60);
    record.extend_from_slice(&(data.len() as u16).to_le_bytes());
    record.extend_from_slice(data);

    let Ok(mut decoder) = PackDecoder::new(&record) else {
        return;
    };
    let _ = decoder.get_bool_array(0);
    let _ = decoder.get_enum_array(0);
    let _ = decoder.get_compact_int_array(0);
    let _ = decoder.get_compact_long_array(0);
    let _ = decoder.get_compact_double_array(0);
});
