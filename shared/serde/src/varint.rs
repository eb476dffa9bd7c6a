use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr, serde::Serde};

const MAX_VARINT_BYTES: usize = 10;

/// Writes `value` as an unsigned LEB128 integer: seven bits per byte, least
/// significant group first, high bit set while more bytes follow.
pub fn write_var_u64(writer: &mut dyn ByteWrite, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            writer.write_byte(byte);
            return;
        }
        writer.write_byte(byte | 0x80);
    }
}

pub fn read_var_u64(reader: &mut ByteReader) -> Result<u64, SerdeErr> {
    let mut output: u64 = 0;
    for index in 0..MAX_VARINT_BYTES {
        let byte = reader.read_byte()?;
        let group = u64::from(byte & 0x7F);
        let shift = 7 * index as u32;

        // the tenth byte may only carry the single top bit
        if index == MAX_VARINT_BYTES - 1 && group > 1 {
            return Err(SerdeErr::VarIntOverflow);
        }
        output |= group << shift;

        if byte & 0x80 == 0 {
            return Ok(output);
        }
    }
    Err(SerdeErr::VarIntOverflow)
}

/// Reads a var-int count and checks it against `limit`.
pub fn read_count(reader: &mut ByteReader, limit: usize) -> Result<usize, SerdeErr> {
    let declared = read_var_u64(reader)?;
    if declared > limit as u64 {
        return Err(SerdeErr::TooManyEntries { declared, limit });
    }
    Ok(declared as usize)
}

/// Writes a length or count field.
pub fn write_count(writer: &mut dyn ByteWrite, count: usize) {
    write_var_u64(writer, count as u64);
}

/// Unsigned integer encoded with a variable number of bytes.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct VarUint(pub u64);

impl VarUint {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VarUint {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Serde for VarUint {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        write_var_u64(writer, self.0);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(read_var_u64(reader)?))
    }
}
