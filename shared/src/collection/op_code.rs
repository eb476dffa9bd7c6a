use tandem_serde::ByteWrite;

/// Wire tag of a change operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    Add = 0,
    Set = 1,
    Remove = 2,
    Clear = 3,
    Insert = 4,
    RemoveAt = 5,
}

impl OpCode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(OpCode::Add),
            1 => Some(OpCode::Set),
            2 => Some(OpCode::Remove),
            3 => Some(OpCode::Clear),
            4 => Some(OpCode::Insert),
            5 => Some(OpCode::RemoveAt),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

/// A recorded mutation that can be written into a delta message
pub trait ChangeOperation {
    fn op_code(&self) -> OpCode;

    /// Writes the address and value of the operation. The op code byte is
    /// written by the caller.
    fn write_body(&self, writer: &mut dyn ByteWrite);
}
