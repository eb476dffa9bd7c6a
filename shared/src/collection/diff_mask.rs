use tandem_serde::{read_count, write_count, ByteReader, ByteWrite, Serde, SerdeErr};

// enough for the 256 fields a u8 index can address
const MAX_MASK_BYTES: usize = 32;

/// One bit per replicated field of an owner. A set bit means the field has
/// unflushed changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffMask {
    mask: Vec<u8>,
}

impl DiffMask {
    /// Create a new DiffMask with a given number of bytes
    pub fn new(bytes: u8) -> Self {
        Self {
            mask: vec![0; bytes as usize],
        }
    }

    /// Smallest mask able to hold `field_count` bits
    pub fn for_fields(field_count: u8) -> Self {
        Self::new(field_count.div_ceil(8))
    }

    pub fn bit(&self, index: u8) -> Option<bool> {
        let byte = self.mask.get((index / 8) as usize)?;
        Some(byte & (1 << (index % 8)) != 0)
    }

    /// Sets a bit. Indices beyond the mask are ignored and return false.
    pub fn set_bit(&mut self, index: u8, value: bool) -> bool {
        let Some(byte) = self.mask.get_mut((index / 8) as usize) else {
            return false;
        };
        let bit = 1 << (index % 8);
        if value {
            *byte |= bit;
        } else {
            *byte &= !bit;
        }
        true
    }

    pub fn clear(&mut self) {
        self.mask.iter_mut().for_each(|byte| *byte = 0);
    }

    pub fn is_clear(&self) -> bool {
        self.mask.iter().all(|byte| *byte == 0)
    }

    pub fn byte_count(&self) -> usize {
        self.mask.len()
    }

    /// Indices of every set bit, lowest first
    pub fn set_bits(&self) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX)
            .take(self.mask.len() * 8)
            .filter(|index| self.bit(*index).unwrap_or(false))
    }

    pub fn or(&mut self, other: &DiffMask) {
        for (byte, other_byte) in self.mask.iter_mut().zip(other.mask.iter()) {
            *byte |= *other_byte;
        }
    }
}

impl Serde for DiffMask {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        write_count(writer, self.mask.len());
        writer.write_bytes(&self.mask);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = read_count(reader, MAX_MASK_BYTES)?;
        let mask = reader.read_bytes(length)?.to_vec();
        Ok(Self { mask })
    }
}
