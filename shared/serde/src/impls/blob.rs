use crate::{
    byte_reader::ByteReader,
    byte_writer::ByteWrite,
    error::SerdeErr,
    serde::Serde,
    varint::{read_var_u64, write_var_u64},
};

/// Writes a length-prefixed blob. The prefix is `length + 1`, with `0`
/// reserved for null, so an empty blob and a null one stay distinct.
pub fn write_blob(writer: &mut dyn ByteWrite, blob: Option<&[u8]>) {
    match blob {
        None => write_var_u64(writer, 0),
        Some(bytes) => {
            write_var_u64(writer, bytes.len() as u64 + 1);
            writer.write_bytes(bytes);
        }
    }
}

/// Reads a length-prefixed blob, checking the declared length against the
/// remaining input before touching it.
pub fn read_blob<'b>(reader: &mut ByteReader<'b>) -> Result<Option<&'b [u8]>, SerdeErr> {
    let prefix = read_var_u64(reader)?;
    if prefix == 0 {
        return Ok(None);
    }
    let length = reader.check_declared_length(prefix - 1)?;
    Ok(Some(reader.read_bytes(length)?))
}

fn read_text(reader: &mut ByteReader) -> Result<Option<String>, SerdeErr> {
    let Some(bytes) = read_blob(reader)? else {
        return Ok(None);
    };
    let text = std::str::from_utf8(bytes).map_err(|_| SerdeErr::InvalidUtf8)?;
    Ok(Some(text.to_owned()))
}

impl Serde for String {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        write_blob(writer, Some(self.as_bytes()));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        read_text(reader)?.ok_or(SerdeErr::UnexpectedNull { type_name: "String" })
    }
}

impl Serde for Option<String> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        write_blob(writer, self.as_ref().map(|text| text.as_bytes()));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        read_text(reader)
    }
}

impl Serde for Vec<u8> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        write_blob(writer, Some(self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match read_blob(reader)? {
            Some(bytes) => Ok(bytes.to_vec()),
            None => Err(SerdeErr::UnexpectedNull { type_name: "Vec<u8>" }),
        }
    }
}

impl Serde for Option<Vec<u8>> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        write_blob(writer, self.as_deref());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(read_blob(reader)?.map(|bytes| bytes.to_vec()))
    }
}
