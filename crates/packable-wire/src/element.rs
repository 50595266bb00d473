//! Markers naming the layout of keys and values inside element streams.
//!
//! Map entries and array elements carry no per-element tag, so both sides
//! must agree on each element's layout up front. The encoder and decoder
//! crates implement their element traits for these two markers.

/// Built-in element layouts.
///
/// | Type           | Bytes                                   |
/// |----------------|-----------------------------------------|
/// | `bool`         | 1 (0 or 1)                              |
/// | `i32` / `f32`  | 4, little-endian                        |
/// | `i64` / `f64`  | 8, little-endian                        |
/// | `str`/`String` | varint byte length, then UTF-8          |
#[derive(Clone, Copy, Debug, Default)]
pub struct Primitive;

/// Element framed as a length-prefixed nested record and handled by an
/// adapter.
///
/// The prefix is 2 bytes, or 4 bytes when the record passes 0x7FFF bytes
/// (flagged by the top bit of the first word). `0xFFFF` is a null element.
pub struct Nested<'a, A: ?Sized>(pub &'a A);
