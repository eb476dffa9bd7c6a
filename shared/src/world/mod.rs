mod error;
mod net_id;
mod object_arena;
mod object_ref;
mod spawn_batch;

pub use error::{ArenaError, ResolveError, SpawnError};
pub use net_id::NetId;
pub use object_arena::ObjectArena;
pub use object_ref::ObjectRef;
pub use spawn_batch::SpawnBatch;
