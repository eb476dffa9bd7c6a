use thiserror::Error;

use tandem_serde::SerdeErr;

use super::op_code::OpCode;

/// Errors that can occur while mutating or synchronizing a replicated
/// collection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicaError {
    /// A mutation was attempted while the host policy marks the collection
    /// read-only
    #[error("{collection} is read-only, cannot {operation}")]
    ReadOnly {
        collection: &'static str,
        operation: &'static str,
    },

    /// An index argument does not address an entry
    #[error("Index {index} is out of range for {collection} of length {len}")]
    IndexOutOfRange {
        collection: &'static str,
        index: usize,
        len: usize,
    },

    /// Destination slice is too short for a copy
    #[error("Destination has room for {available} entries but {required} must be copied")]
    InsufficientCapacity { required: usize, available: usize },

    /// The wire data could not be decoded
    #[error("Malformed wire data: {0}")]
    MalformedWireData(#[from] SerdeErr),

    /// Op code byte is unknown, or not valid for this kind of collection
    #[error("Malformed wire data: op code {op_code} is not valid for {collection}")]
    UnknownOpCode {
        collection: &'static str,
        op_code: u8,
    },

    /// A delta operation addresses an index the replica does not have
    #[error("Malformed wire data: {op_code:?} at index {index} does not fit {collection} of length {len}")]
    InvalidDeltaIndex {
        collection: &'static str,
        op_code: OpCode,
        index: usize,
        len: usize,
    },

    /// A snapshot repeats a key or value the collection can hold only once
    #[error("Malformed wire data: snapshot for {collection} repeats an entry")]
    DuplicateEntry { collection: &'static str },

    /// A mutation would grow the collection past what a snapshot may declare
    #[error("{collection} cannot {operation}: it would hold more than {limit} entries")]
    CapacityExceeded {
        collection: &'static str,
        operation: &'static str,
        limit: usize,
    },

    /// A mutation would leave more unflushed operations than a delta may carry
    #[error("{collection} cannot {operation}: more than {limit} operations are waiting to be flushed")]
    ChangeLogFull {
        collection: &'static str,
        operation: &'static str,
        limit: usize,
    },
}

impl ReplicaError {
    /// Whether the error means the peer sent bad data, which a host should
    /// answer with a resync or disconnect
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ReplicaError::MalformedWireData(_)
                | ReplicaError::UnknownOpCode { .. }
                | ReplicaError::InvalidDeltaIndex { .. }
                | ReplicaError::DuplicateEntry { .. }
        )
    }
}

/// Errors raised by a [`DirtyChannel`](super::DirtyChannel)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirtyChannelError {
    /// The mask lock was poisoned by a panic while held
    #[error("Dirty mask lock is poisoned")]
    LockPoisoned,

    /// The field index does not fit in the mask
    #[error("Field index {field_index} does not fit in a dirty mask of {byte_count} bytes")]
    FieldOutOfRange { field_index: u8, byte_count: usize },
}
