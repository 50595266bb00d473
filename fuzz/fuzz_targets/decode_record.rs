#![no_main]

use libfuzzer_sys::fuzz_target;
use packable_decoder::{ArrayElement, PackDecoder};

// Fuzz target: every PackDecoder getter on arbitrary input.
//
// Input format:
//   byte 0:    field index to query
//   bytes 1..: the record
//
// Catches bugs in:
// - The record scan (truncated tags and payloads, length classes)
// - Info table reuse across indices
// - Element streams (counts, null markers, escalated record lengths)
// - Child decoder binding and pooling
fuzz_target!(|data: &[u8]| {
    let Some((&index, record)) = data.split_first() else {
        return;
    };
    let Ok(mut decoder) = PackDecoder::new(record) else {
        return;
    };

    let _ = decoder.contains(index);
    let _ = decoder.get_bool(index);
    let _ = decoder.get_long(index);
    let _ = decoder.get_double(index);
    let _ = decoder.get_c_double(index);
    let _ = decoder.get_slong(index);
    let _ = decoder.get_str(index);
    let _ = decoder.get_bytes(index);
    let _ = decoder.get_int_array(index);
    let _ = decoder.get_double_array(index);
    let _ = decoder.get_str_array(index);
    let _ = decoder.get_nullable_str_array(index);
    let _ = decoder.get_map::<String, i64, Vec<_>>(index);

    if let Ok(Some(mut child)) = decoder.get_decoder(index) {
        let _ = child.get_str(0);
        let _ = child.get_long(1);
        child.recycle();
    }

    if let Ok(Some(mut array)) = decoder.get_decoder_array(index) {
        let mut steps = 0;
        while let Ok(Some(element)) = array.next_element() {
            if let ArrayElement::Record(child) = element {
                let _ = child.get_int(0);
                let _ = child.get_str(1);
            }
            steps += 1;
            if steps > 1024 {
                break;
            }
        }
    }

    let _ = PackDecoder::decode_str_list(record);
    let _ = PackDecoder::decode_long_array(record);
});
