mod change_log;
mod diff_mask;
mod dirty_channel;
mod error;
mod field_mutate;
mod op_code;
mod policy;
mod replica_core;
mod replicated_list;
mod replicated_map;
mod replicated_set;

pub use change_log::ChangeLog;
pub use diff_mask::DiffMask;
pub use dirty_channel::DirtyChannel;
pub use error::{DirtyChannelError, ReplicaError};
pub use field_mutate::{FieldMutate, FieldMutator};
pub use op_code::{ChangeOperation, OpCode};
pub use policy::SyncPolicy;
pub use replicated_list::{DecodedListDelta, ListOp, ReplicatedList};
pub use replicated_map::{DecodedMapDelta, MapOp, ReplicatedMap};
pub use replicated_set::{DecodedSetDelta, ReplicatedSet, SetOp};
