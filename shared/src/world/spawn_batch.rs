use log::{debug, warn};

use crate::collection::ReplicaError;

use super::{error::SpawnError, net_id::NetId, object_arena::ObjectArena};

/// Objects received together in one spawn message.
///
/// Applying the batch reserves every id, decodes every payload, inserts the
/// decoded objects and only then runs the startup hook of each one, in batch
/// order. A startup hook can therefore resolve references to any object of
/// the same batch, including ones listed after it.
pub struct SpawnBatch<P> {
    pending: Vec<(NetId, P)>,
}

impl<P> SpawnBatch<P> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, id: NetId, payload: P) {
        self.pending.push((id, payload));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NetId> + '_ {
        self.pending.iter().map(|(id, _)| *id)
    }

    /// Spawns the batch into `arena`, returning the spawned ids in batch
    /// order.
    ///
    /// `decode` builds an object from its payload without firing any
    /// listener. `startup` runs once per object after the whole batch is in
    /// the arena; it is where listeners are registered and
    /// `replay_initial` is called. While its own hook runs an object reads as
    /// pending to lookups.
    ///
    /// If an id is taken or a payload fails to decode nothing is spawned and
    /// every reservation made by the batch is released.
    pub fn apply<T>(
        self,
        arena: &mut ObjectArena<T>,
        mut decode: impl FnMut(NetId, &P) -> Result<T, ReplicaError>,
        mut startup: impl FnMut(NetId, &mut T, &ObjectArena<T>),
    ) -> Result<Vec<NetId>, SpawnError> {
        let mut reserved = Vec::with_capacity(self.pending.len());
        for (id, _) in &self.pending {
            if let Err(error) = arena.reserve(*id) {
                release_all(arena, &reserved);
                return Err(error.into());
            }
            reserved.push(*id);
        }

        let mut decoded = Vec::with_capacity(self.pending.len());
        for (id, payload) in &self.pending {
            match decode(*id, payload) {
                Ok(object) => decoded.push((*id, object)),
                Err(source) => {
                    warn!("Spawn batch aborted, object {} failed to decode: {}", id, source);
                    release_all(arena, &reserved);
                    return Err(SpawnError::Decode { id: *id, source });
                }
            }
        }

        for (id, object) in decoded {
            arena.insert(id, object)?;
        }
        debug!("Spawned batch of {} objects", reserved.len());

        for id in &reserved {
            let Some(mut object) = arena.detach(id) else {
                continue;
            };
            startup(*id, &mut object, arena);
            arena.insert(*id, object)?;
        }

        Ok(reserved)
    }
}

impl<P> Default for SpawnBatch<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn release_all<T>(arena: &mut ObjectArena<T>, ids: &[NetId]) {
    for id in ids {
        arena.release(id);
    }
}
