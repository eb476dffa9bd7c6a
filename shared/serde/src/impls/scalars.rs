use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr, serde::Serde};

// All fixed-width scalars are little-endian.
macro_rules! impl_serde_le {
    ($($type:ty),*) => {
        $(
            impl Serde for $type {
                fn ser(&self, writer: &mut dyn ByteWrite) {
                    writer.write_bytes(&self.to_le_bytes());
                }

                fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                    let bytes = reader.read_array::<{ std::mem::size_of::<$type>() }>()?;
                    Ok(<$type>::from_le_bytes(bytes))
                }

                fn byte_length(&self) -> u32 {
                    std::mem::size_of::<$type>() as u32
                }
            }
        )*
    };
}

impl_serde_le!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Serde for bool {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(SerdeErr::InvalidValue {
                type_name: "bool",
                value,
            }),
        }
    }

    fn byte_length(&self) -> u32 {
        1
    }
}

impl Serde for () {
    fn ser(&self, _: &mut dyn ByteWrite) {}

    fn de(_: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(())
    }

    fn byte_length(&self) -> u32 {
        0
    }
}
