#![warn(clippy::pedantic)]

pub mod adapter;
pub mod decoder;
pub mod elements;
pub mod error;

mod info;

pub use adapter::{ElementDecoder, UnpackAdapter};
pub use decoder::{CHILD_POOL_CAPACITY, PackDecoder};
pub use elements::{ArrayElement, DecoderArray, ElementReader};
pub use error::DecodeError;
pub use packable_wire::{DecodeBuffer, Nested, PackConfig, Primitive};
