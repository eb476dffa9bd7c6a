mod blob;
mod scalars;
mod tuples;

pub use blob::{read_blob, write_blob};
