use log::warn;

use tandem_serde::{write_count, ByteWrite};

use super::op_code::ChangeOperation;

/// Ordered operations recorded since the last flush
pub struct ChangeLog<Op> {
    operations: Vec<Op>,
    warn_len: usize,
    warned: bool,
}

impl<Op> ChangeLog<Op> {
    pub fn new(warn_len: usize) -> Self {
        Self {
            operations: Vec::new(),
            warn_len,
            warned: false,
        }
    }

    pub fn push(&mut self, operation: Op) {
        self.operations.push(operation);
        if !self.warned && self.operations.len() >= self.warn_len {
            warn!(
                "Change log holds {} unflushed operations. Is the collection being flushed every tick?",
                self.operations.len()
            );
            self.warned = true;
        }
    }

    pub fn last(&self) -> Option<&Op> {
        self.operations.last()
    }

    pub fn as_slice(&self) -> &[Op] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Drops every operation, keeping the allocation
    pub fn clear(&mut self) {
        self.operations.clear();
        self.warned = false;
    }
}

impl<Op: ChangeOperation> ChangeLog<Op> {
    /// Writes `[op count][op code, body]*` in recorded order
    pub fn write(&self, writer: &mut dyn ByteWrite) {
        write_count(writer, self.operations.len());
        for operation in &self.operations {
            writer.write_byte(operation.op_code().to_byte());
            operation.write_body(writer);
        }
    }
}
