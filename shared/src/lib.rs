//! # Tandem Shared
//! Replicated list, map and set collections kept in sync between one
//! authoritative copy and any number of mirrors, through full snapshots and
//! ordered deltas.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use tandem_serde::{
    read_blob, read_count, read_var_u64, write_blob, write_count, write_var_u64, ByteCounter,
    ByteReader, ByteWrite, ByteWriter, Serde, SerdeErr, VarUint,
};

mod collection;
mod config;
mod world;

pub use collection::{
    ChangeLog, ChangeOperation, DecodedListDelta, DecodedMapDelta, DecodedSetDelta, DiffMask,
    DirtyChannel, DirtyChannelError, FieldMutate, FieldMutator, ListOp, MapOp, OpCode,
    ReplicaError, ReplicatedList, ReplicatedMap, ReplicatedSet, SetOp, SyncPolicy,
};
pub use config::SyncConfig;
pub use world::{
    ArenaError, NetId, ObjectArena, ObjectRef, ResolveError, SpawnBatch, SpawnError,
};
