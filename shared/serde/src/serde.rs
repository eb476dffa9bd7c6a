use crate::{byte_counter::ByteCounter, byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr};

/// A type that can be written to and read from the wire
pub trait Serde: Sized + Clone + PartialEq {
    /// Encodes the value into the writer
    fn ser(&self, writer: &mut dyn ByteWrite);

    /// Decodes a value from the reader, or fails without producing one
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;

    /// Number of bytes `ser` would write
    fn byte_length(&self) -> u32 {
        let mut counter = ByteCounter::new();
        self.ser(&mut counter);
        counter.count()
    }
}
