#![warn(clippy::pedantic)]

pub mod config;
pub mod decode_buffer;
pub mod element;
pub mod encode_buffer;
pub mod error;
pub mod pool;
pub mod tag;
pub mod varint;

pub use config::PackConfig;
pub use decode_buffer::DecodeBuffer;
pub use element::{Nested, Primitive};
pub use encode_buffer::EncodeBuffer;
pub use error::WireError;
pub use pool::{BufferPool, InfoPool};
pub use tag::{SizeClass, Tag};
