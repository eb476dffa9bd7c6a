use std::fmt;

use tandem_serde::{read_var_u64, write_var_u64, ByteReader, ByteWrite, Serde, SerdeErr};

/// Network-wide identifier of a replicated object
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct NetId(u64);

impl NetId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NetId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serde for NetId {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        write_var_u64(writer, self.0);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(read_var_u64(reader)?))
    }
}
