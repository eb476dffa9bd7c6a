//! # Tandem Serde
//! Byte-oriented wire codec shared by every tandem crate.
//!
//! Scalars are fixed-width little-endian, counts are LEB128 var-ints and
//! blobs carry a `length + 1` prefix with `0` meaning null.

mod byte_counter;
mod byte_reader;
mod byte_writer;
mod error;
mod impls;
mod serde;
mod varint;

pub use byte_counter::ByteCounter;
pub use byte_reader::ByteReader;
pub use byte_writer::{ByteWrite, ByteWriter};
pub use error::SerdeErr;
pub use impls::{read_blob, write_blob};
pub use serde::Serde;
pub use varint::{read_count, read_var_u64, write_count, write_var_u64, VarUint};
