#![warn(clippy::pedantic)]

pub mod adapter;
pub mod encoder;
pub mod error;

pub use adapter::{ElementEncoder, PackAdapter};
pub use encoder::PackEncoder;
pub use error::EncodeError;
pub use packable_wire::{Nested, PackConfig, Primitive};
