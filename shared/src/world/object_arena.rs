use std::collections::HashMap;

use super::{
    error::{ArenaError, ResolveError},
    net_id::NetId,
};

enum Slot<T> {
    Free,
    Reserved(NetId),
    Live(NetId, T),
}

/// Indirection table from [`NetId`] to the objects spawned on this side.
///
/// An id can be reserved before its object exists so that references to it
/// decoded earlier in a spawn batch have something to wait on. Slots freed by
/// [`remove`](Self::remove) are reused.
pub struct ObjectArena<T> {
    slots: Vec<Slot<T>>,
    slot_by_id: HashMap<NetId, usize>,
    free_slots: Vec<usize>,
    live_count: usize,
}

impl<T> ObjectArena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            slot_by_id: HashMap::new(),
            free_slots: Vec::new(),
            live_count: 0,
        }
    }

    fn allocate(&mut self, slot: Slot<T>) -> usize {
        if let Some(index) = self.free_slots.pop() {
            if let Some(free) = self.slots.get_mut(index) {
                *free = slot;
                return index;
            }
        }
        self.slots.push(slot);
        self.slots.len() - 1
    }

    fn release_slot(&mut self, id: &NetId, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Slot::Free;
        }
        self.slot_by_id.remove(id);
        self.free_slots.push(index);
    }

    /// Claims `id` for an object that is still being decoded
    pub fn reserve(&mut self, id: NetId) -> Result<(), ArenaError> {
        if self.slot_by_id.contains_key(&id) {
            return Err(ArenaError::AlreadyPresent { id });
        }
        let index = self.allocate(Slot::Reserved(id));
        self.slot_by_id.insert(id, index);
        Ok(())
    }

    /// Stores an object under `id`, filling its reservation if there is one
    pub fn insert(&mut self, id: NetId, object: T) -> Result<(), ArenaError> {
        let reserved = self
            .slot_by_id
            .get(&id)
            .and_then(|index| self.slots.get_mut(*index));
        if let Some(slot) = reserved {
            if !matches!(slot, Slot::Reserved(_)) {
                return Err(ArenaError::AlreadyPresent { id });
            }
            *slot = Slot::Live(id, object);
            self.live_count += 1;
            return Ok(());
        }

        let index = self.allocate(Slot::Live(id, object));
        self.slot_by_id.insert(id, index);
        self.live_count += 1;
        Ok(())
    }

    /// Removes a live object. Reservations are left alone, see
    /// [`release`](Self::release).
    pub fn remove(&mut self, id: &NetId) -> Option<T> {
        let index = *self.slot_by_id.get(id)?;
        let slot = self.slots.get_mut(index)?;
        if !matches!(slot, Slot::Live(..)) {
            return None;
        }
        let Slot::Live(_, object) = std::mem::replace(slot, Slot::Free) else {
            return None;
        };
        self.release_slot(id, index);
        self.live_count -= 1;
        Some(object)
    }

    /// Drops a reservation whose object will never arrive
    pub fn release(&mut self, id: &NetId) -> bool {
        if !self.is_reserved(id) {
            return false;
        }
        if let Some(index) = self.slot_by_id.get(id).copied() {
            self.release_slot(id, index);
        }
        true
    }

    /// Takes a live object out while keeping its id reserved
    pub(crate) fn detach(&mut self, id: &NetId) -> Option<T> {
        let index = *self.slot_by_id.get(id)?;
        let slot = self.slots.get_mut(index)?;
        if !matches!(slot, Slot::Live(..)) {
            return None;
        }
        let Slot::Live(_, object) = std::mem::replace(slot, Slot::Reserved(*id)) else {
            return None;
        };
        self.live_count -= 1;
        Some(object)
    }

    pub fn get(&self, id: &NetId) -> Option<&T> {
        let index = *self.slot_by_id.get(id)?;
        self.at(index)
    }

    pub fn get_mut(&mut self, id: &NetId) -> Option<&mut T> {
        let index = *self.slot_by_id.get(id)?;
        self.at_mut(index)
    }

    pub fn contains(&self, id: &NetId) -> bool {
        self.get(id).is_some()
    }

    pub fn is_reserved(&self, id: &NetId) -> bool {
        self.slot_by_id
            .get(id)
            .and_then(|index| self.slots.get(*index))
            .is_some_and(|slot| matches!(slot, Slot::Reserved(_)))
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.live_count
    }

    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (NetId, &T)> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Live(id, object) => Some((*id, object)),
            _ => None,
        })
    }

    /// Finds the slot of a live object, trying `hint` first
    pub(crate) fn locate(&self, id: NetId, hint: Option<usize>) -> Result<usize, ResolveError> {
        if let Some(index) = hint {
            if matches!(self.slots.get(index), Some(Slot::Live(slot_id, _)) if *slot_id == id) {
                return Ok(index);
            }
        }
        let Some(index) = self.slot_by_id.get(&id).copied() else {
            return Err(ResolveError::NotFound(id));
        };
        match self.slots.get(index) {
            Some(Slot::Live(..)) => Ok(index),
            Some(Slot::Reserved(_)) => Err(ResolveError::Pending(id)),
            _ => Err(ResolveError::NotFound(id)),
        }
    }

    pub(crate) fn at(&self, index: usize) -> Option<&T> {
        match self.slots.get(index) {
            Some(Slot::Live(_, object)) => Some(object),
            _ => None,
        }
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> Option<&mut T> {
        match self.slots.get_mut(index) {
            Some(Slot::Live(_, object)) => Some(object),
            _ => None,
        }
    }
}

impl<T> Default for ObjectArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
