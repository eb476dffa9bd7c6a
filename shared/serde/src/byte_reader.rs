use crate::error::SerdeErr;

/// A bounds-checked cursor over an input buffer.
///
/// Every read is checked against the bytes that remain, so a short or lying
/// buffer yields an error instead of garbage.
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    position: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let Some(byte) = self.buffer.get(self.position) else {
            return Err(SerdeErr::Truncated {
                requested: 1,
                remaining: 0,
            });
        };
        self.position += 1;
        Ok(*byte)
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'b [u8], SerdeErr> {
        let remaining = self.remaining();
        if length > remaining {
            return Err(SerdeErr::Truncated {
                requested: length,
                remaining,
            });
        }
        let buffer = self.buffer;
        let start = self.position;
        self.position += length;
        Ok(&buffer[start..self.position])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SerdeErr> {
        let bytes = self.read_bytes(N)?;
        let mut output = [0u8; N];
        output.copy_from_slice(bytes);
        Ok(output)
    }

    /// Validates a length prefix against the bytes actually left in the
    /// buffer. Must be called before allocating for a length-prefixed read.
    pub fn check_declared_length(&self, declared: u64) -> Result<usize, SerdeErr> {
        let remaining = self.remaining();
        if declared > remaining as u64 {
            return Err(SerdeErr::LengthOverrun {
                declared,
                remaining,
            });
        }
        Ok(declared as usize)
    }
}
