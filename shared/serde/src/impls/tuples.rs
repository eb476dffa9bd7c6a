use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr, serde::Serde};

impl<A: Serde, B: Serde> Serde for (A, B) {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.0.ser(writer);
        self.1.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let a = A::de(reader)?;
        let b = B::de(reader)?;
        Ok((a, b))
    }

    fn byte_length(&self) -> u32 {
        self.0.byte_length() + self.1.byte_length()
    }
}

impl<A: Serde, B: Serde, C: Serde> Serde for (A, B, C) {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.0.ser(writer);
        self.1.ser(writer);
        self.2.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let a = A::de(reader)?;
        let b = B::de(reader)?;
        let c = C::de(reader)?;
        Ok((a, b, c))
    }

    fn byte_length(&self) -> u32 {
        self.0.byte_length() + self.1.byte_length() + self.2.byte_length()
    }
}
