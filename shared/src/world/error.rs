use thiserror::Error;

use crate::collection::ReplicaError;

use super::net_id::NetId;

/// Why an [`ObjectRef`](super::ObjectRef) could not be followed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The id is reserved by a spawn that has not finished decoding
    #[error("Object {0} is reserved but has not finished spawning")]
    Pending(NetId),

    /// Nothing with this id is known to the arena
    #[error("Object {0} does not exist")]
    NotFound(NetId),
}

/// Errors raised by an [`ObjectArena`](super::ObjectArena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The id is already live or reserved
    #[error("Object {id} is already present in the arena")]
    AlreadyPresent { id: NetId },
}

/// Errors raised while applying a [`SpawnBatch`](super::SpawnBatch). A
/// failed batch leaves no reservation behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// The batch names an id that is already in use
    #[error("Cannot spawn object {id}: id is already in use")]
    DuplicateId { id: NetId },

    /// The host decoder rejected an object's payload
    #[error("Failed to decode spawn payload of object {id}: {source}")]
    Decode { id: NetId, source: ReplicaError },
}

impl From<ArenaError> for SpawnError {
    fn from(error: ArenaError) -> Self {
        match error {
            ArenaError::AlreadyPresent { id } => SpawnError::DuplicateId { id },
        }
    }
}
