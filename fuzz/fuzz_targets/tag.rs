#![no_main]

use libfuzzer_sys::fuzz_target;
use packable_wire::Tag;

// Fuzz target: Tag::read_from, and write_to on whatever it accepted.
//
// A parsed tag must survive a write->read cycle. Non-canonical two-byte
// tags for small indices are accepted and rewritten in the short form.
fuzz_target!(|data: &[u8]| {
    let Ok((tag, consumed)) = Tag::read_from(data) else {
        return;
    };
    let mut out = [0u8; 2];
    let written = tag.write_to(&mut out).unwrap();
    assert_eq!(written, Tag::encoded_len(tag.index));
    let (again, _) = Tag::read_from(&out[..written]).unwrap();
    assert_eq!(again, tag);
    assert!(consumed <= data.len());
});
