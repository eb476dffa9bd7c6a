use std::{
    cell::Cell,
    hash::{Hash, Hasher},
};

use tandem_serde::{ByteReader, ByteWrite, Serde, SerdeErr};

use super::{error::ResolveError, net_id::NetId, object_arena::ObjectArena};

/// A reference to a replicated object by [`NetId`].
///
/// The target may not exist yet when the reference is decoded. It is looked
/// up lazily on [`resolve`](Self::resolve) and the arena slot is cached for
/// later lookups. Two references are equal when they name the same id.
#[derive(Clone, Debug)]
pub struct ObjectRef {
    id: NetId,
    cached_slot: Cell<Option<usize>>,
}

impl ObjectRef {
    pub fn new(id: NetId) -> Self {
        Self {
            id,
            cached_slot: Cell::new(None),
        }
    }

    pub fn id(&self) -> NetId {
        self.id
    }

    /// Whether a previous lookup succeeded
    pub fn is_resolved(&self) -> bool {
        self.cached_slot.get().is_some()
    }

    fn locate<T>(&self, arena: &ObjectArena<T>) -> Result<usize, ResolveError> {
        match arena.locate(self.id, self.cached_slot.get()) {
            Ok(index) => {
                self.cached_slot.set(Some(index));
                Ok(index)
            }
            Err(error) => {
                self.cached_slot.set(None);
                Err(error)
            }
        }
    }

    pub fn resolve<'a, T>(&self, arena: &'a ObjectArena<T>) -> Result<&'a T, ResolveError> {
        let index = self.locate(arena)?;
        arena.at(index).ok_or(ResolveError::NotFound(self.id))
    }

    pub fn resolve_mut<'a, T>(
        &self,
        arena: &'a mut ObjectArena<T>,
    ) -> Result<&'a mut T, ResolveError> {
        let index = self.locate(arena)?;
        arena.at_mut(index).ok_or(ResolveError::NotFound(self.id))
    }
}

impl From<NetId> for ObjectRef {
    fn from(id: NetId) -> Self {
        Self::new(id)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Serde for ObjectRef {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.id.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self::new(NetId::de(reader)?))
    }
}
