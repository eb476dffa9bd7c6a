use std::ops::Deref;

use tandem_serde::{read_count, write_count, ByteReader, ByteWrite, ByteWriter, Serde};

use crate::config::SyncConfig;

use super::{
    error::ReplicaError,
    field_mutate::FieldMutator,
    op_code::{ChangeOperation, OpCode},
    policy::SyncPolicy,
    replica_core::{copy_target, ReplicaCore},
};

const COLLECTION: &str = "ReplicatedList";

/// A mutation of a [`ReplicatedList`]
#[derive(Debug, Clone, PartialEq)]
pub enum ListOp<T> {
    /// `value` was appended and now sits at `index`
    Add { index: usize, value: T },
    Set { index: usize, previous: T, value: T },
    Insert { index: usize, value: T },
    RemoveAt { index: usize, previous: T },
    Clear,
}

impl<T: Serde> ChangeOperation for ListOp<T> {
    fn op_code(&self) -> OpCode {
        match self {
            ListOp::Add { .. } => OpCode::Add,
            ListOp::Set { .. } => OpCode::Set,
            ListOp::Insert { .. } => OpCode::Insert,
            ListOp::RemoveAt { .. } => OpCode::RemoveAt,
            ListOp::Clear => OpCode::Clear,
        }
    }

    fn write_body(&self, writer: &mut dyn ByteWrite) {
        match self {
            ListOp::Add { value, .. } => value.ser(writer),
            ListOp::Set { index, value, .. } | ListOp::Insert { index, value } => {
                write_count(writer, *index);
                value.ser(writer);
            }
            ListOp::RemoveAt { index, .. } => write_count(writer, *index),
            ListOp::Clear => {}
        }
    }
}

// An operation as read off the wire, before the replica knows the values it
// replaces
enum ListDelta<T> {
    Add(T),
    Set(usize, T),
    Insert(usize, T),
    RemoveAt(usize),
    Clear,
}

/// A list delta that decoded cleanly and has not been applied yet
pub struct DecodedListDelta<T> {
    deltas: Vec<ListDelta<T>>,
}

impl<T> DecodedListDelta<T> {
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

type AddListener<T> = Box<dyn FnMut(usize, &T)>;
type SetListener<T> = Box<dyn FnMut(usize, &T, &T)>;

struct ListListeners<T> {
    on_add: Option<AddListener<T>>,
    on_set: Option<SetListener<T>>,
    on_remove: Option<AddListener<T>>,
    on_clear: Option<Box<dyn FnMut()>>,
}

impl<T> ListListeners<T> {
    fn new() -> Self {
        Self {
            on_add: None,
            on_set: None,
            on_remove: None,
            on_clear: None,
        }
    }

    fn dispatch(&mut self, operation: &ListOp<T>) {
        match operation {
            ListOp::Add { index, value } | ListOp::Insert { index, value } => {
                if let Some(on_add) = self.on_add.as_mut() {
                    on_add(*index, value);
                }
            }
            ListOp::Set {
                index,
                previous,
                value,
            } => {
                if let Some(on_set) = self.on_set.as_mut() {
                    on_set(*index, previous, value);
                }
            }
            ListOp::RemoveAt { index, previous } => {
                if let Some(on_remove) = self.on_remove.as_mut() {
                    on_remove(*index, previous);
                }
            }
            ListOp::Clear => {
                if let Some(on_clear) = self.on_clear.as_mut() {
                    on_clear();
                }
            }
        }
    }
}

/// An ordered sequence kept in sync between an authoritative copy and its
/// mirrors.
///
/// Reads go through `Deref<Target = [T]>`. Mutations are checked against the
/// [`SyncPolicy`], recorded in the change log when the policy is recording,
/// and announced to the registered listeners.
pub struct ReplicatedList<T: Serde> {
    entries: Vec<T>,
    core: ReplicaCore<ListOp<T>>,
    listeners: ListListeners<T>,
}

impl<T: Serde> ReplicatedList<T> {
    pub fn new(policy: SyncPolicy) -> Self {
        Self::with_config(policy, SyncConfig::default())
    }

    pub fn with_config(policy: SyncPolicy, config: SyncConfig) -> Self {
        Self {
            entries: Vec::new(),
            core: ReplicaCore::new(COLLECTION, policy, config),
            listeners: ListListeners::new(),
        }
    }

    /// Create the authoritative copy
    pub fn host_owned() -> Self {
        Self::new(SyncPolicy::authority())
    }

    /// Create a mirrored copy, fed only by decoded snapshots and deltas
    pub fn remote_owned() -> Self {
        Self::new(SyncPolicy::mirror())
    }

    pub fn set_policy(&mut self, policy: SyncPolicy) {
        self.core.set_policy(policy);
    }

    /// Routes the dirty signal to `mutator` as field `field_index` of the
    /// owner
    pub fn set_mutator(&mut self, field_index: u8, mutator: &FieldMutator) {
        self.core.set_mutator(field_index, mutator);
    }

    // Listeners

    /// Called with the index and value of every appended or inserted entry
    pub fn on_add(&mut self, listener: impl FnMut(usize, &T) + 'static) {
        self.listeners.on_add = Some(Box::new(listener));
    }

    /// Called with index, previous value and new value
    pub fn on_set(&mut self, listener: impl FnMut(usize, &T, &T) + 'static) {
        self.listeners.on_set = Some(Box::new(listener));
    }

    /// Called with the index and value of every removed entry
    pub fn on_remove(&mut self, listener: impl FnMut(usize, &T) + 'static) {
        self.listeners.on_remove = Some(Box::new(listener));
    }

    pub fn on_clear(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.on_clear = Some(Box::new(listener));
    }

    /// Called after the specific listener for every operation
    pub fn on_change(&mut self, listener: impl FnMut(&ListOp<T>) + 'static) {
        self.core.set_on_change(Box::new(listener));
    }

    /// Called once each time the list goes from clean to dirty
    pub fn on_dirty(&mut self, listener: impl FnMut() + 'static) {
        self.core.set_on_dirty(Box::new(listener));
    }

    // Mutation

    pub fn push(&mut self, value: T) -> Result<(), ReplicaError> {
        self.core.check_writable("push")?;
        self.core.check_limits("push", self.entries.len() + 1, 1)?;
        self.entries.push(value.clone());
        let index = self.entries.len() - 1;
        self.commit(ListOp::Add { index, value });
        Ok(())
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = T>) -> Result<(), ReplicaError> {
        self.core.check_writable("extend")?;
        let values: Vec<T> = values.into_iter().collect();
        self.core
            .check_limits("extend", self.entries.len() + values.len(), values.len())?;
        for value in values {
            self.push(value)?;
        }
        Ok(())
    }

    /// Replaces the entry at `index`. An equal value is still recorded and
    /// announced.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), ReplicaError> {
        self.core.check_writable("set")?;
        self.core.check_limits("set", self.entries.len(), 1)?;
        let slot = self.slot_mut(index)?;
        let previous = std::mem::replace(slot, value.clone());
        self.commit(ListOp::Set {
            index,
            previous,
            value,
        });
        Ok(())
    }

    pub fn insert(&mut self, index: usize, value: T) -> Result<(), ReplicaError> {
        self.core.check_writable("insert")?;
        if index > self.entries.len() {
            return Err(self.out_of_range(index));
        }
        self.core.check_limits("insert", self.entries.len() + 1, 1)?;
        self.entries.insert(index, value.clone());
        self.commit(ListOp::Insert { index, value });
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<(), ReplicaError> {
        self.core.check_writable("remove_at")?;
        if index >= self.entries.len() {
            return Err(self.out_of_range(index));
        }
        self.core.check_limits("remove_at", self.entries.len() - 1, 1)?;
        let previous = self.entries.remove(index);
        self.commit(ListOp::RemoveAt { index, previous });
        Ok(())
    }

    /// Removes the first entry equal to `value`. Returns `false`, recording
    /// nothing, when there is none.
    pub fn remove(&mut self, value: &T) -> Result<bool, ReplicaError> {
        self.core.check_writable("remove")?;
        let Some(index) = self.index_of(value) else {
            return Ok(false);
        };
        self.remove_at(index)?;
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), ReplicaError> {
        self.core.check_writable("clear")?;
        self.core.check_limits("clear", 0, 1)?;
        self.entries.clear();
        self.commit(ListOp::Clear);
        Ok(())
    }

    fn commit(&mut self, operation: ListOp<T>) {
        let listeners = &mut self.listeners;
        self.core
            .commit(operation, |operation| listeners.dispatch(operation));
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut T, ReplicaError> {
        let len = self.entries.len();
        self.entries
            .get_mut(index)
            .ok_or(ReplicaError::IndexOutOfRange {
                collection: COLLECTION,
                index,
                len,
            })
    }

    fn out_of_range(&self, index: usize) -> ReplicaError {
        ReplicaError::IndexOutOfRange {
            collection: COLLECTION,
            index,
            len: self.entries.len(),
        }
    }

    // Reads

    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.entries.iter().position(|entry| entry == value)
    }

    /// Copies every entry into `destination`, starting at `start`
    pub fn copy_to(&self, destination: &mut [T], start: usize) -> Result<(), ReplicaError> {
        let target = copy_target(destination, start, self.entries.len())?;
        target.clone_from_slice(&self.entries);
        Ok(())
    }

    // Serialization

    /// Writes `[count][value]*` in list order
    pub fn write_full(&self, writer: &mut dyn ByteWrite) {
        write_count(writer, self.entries.len());
        for value in &self.entries {
            value.ser(writer);
        }
    }

    /// Replaces every entry with a decoded snapshot. Fires no listeners and
    /// records nothing; call [`replay_initial`](Self::replay_initial) once
    /// listeners are registered.
    pub fn read_full(&mut self, reader: &mut ByteReader) -> Result<(), ReplicaError> {
        let entries = self.core.read_snapshot(reader, |reader| Ok(T::de(reader)?))?;
        self.entries = entries;
        self.core.begin_replay_window();
        Ok(())
    }

    /// Writes every operation recorded since the last flush
    pub fn write_delta(&self, writer: &mut dyn ByteWrite) {
        self.core.write_delta(writer);
    }

    /// Applies a decoded delta, announcing each operation as it lands. The
    /// whole delta is decoded and validated first, so a malformed message
    /// leaves the list untouched.
    pub fn read_delta(&mut self, reader: &mut ByteReader) -> Result<(), ReplicaError> {
        let delta = self.decode_delta(reader)?;
        self.apply_delta(delta)
    }

    /// Decodes a delta and checks its indices against the current entries
    /// without applying it
    pub fn decode_delta(
        &self,
        reader: &mut ByteReader,
    ) -> Result<DecodedListDelta<T>, ReplicaError> {
        let deltas = self.core.read_delta(reader, |op_code, reader| {
            Ok(match op_code {
                OpCode::Add => ListDelta::Add(T::de(reader)?),
                OpCode::Set => ListDelta::Set(read_count(reader, usize::MAX)?, T::de(reader)?),
                OpCode::Insert => {
                    ListDelta::Insert(read_count(reader, usize::MAX)?, T::de(reader)?)
                }
                OpCode::RemoveAt => ListDelta::RemoveAt(read_count(reader, usize::MAX)?),
                OpCode::Clear => ListDelta::Clear,
                OpCode::Remove => {
                    return Err(ReplicaError::UnknownOpCode {
                        collection: COLLECTION,
                        op_code: op_code.to_byte(),
                    })
                }
            })
        })?;
        validate_deltas(&deltas, self.entries.len())?;
        Ok(DecodedListDelta { deltas })
    }

    /// Applies a delta from [`decode_delta`](Self::decode_delta). Indices are
    /// checked again, so a delta that no longer fits applies nothing.
    pub fn apply_delta(&mut self, delta: DecodedListDelta<T>) -> Result<(), ReplicaError> {
        validate_deltas(&delta.deltas, self.entries.len())?;
        for delta in delta.deltas {
            let operation = self.apply(delta);
            let listeners = &mut self.listeners;
            self.core
                .announce(&operation, |operation| listeners.dispatch(operation));
        }
        Ok(())
    }

    // indices were checked by validate_deltas
    fn apply(&mut self, delta: ListDelta<T>) -> ListOp<T> {
        match delta {
            ListDelta::Add(value) => {
                self.entries.push(value.clone());
                ListOp::Add {
                    index: self.entries.len() - 1,
                    value,
                }
            }
            ListDelta::Set(index, value) => {
                let previous = std::mem::replace(&mut self.entries[index], value.clone());
                ListOp::Set {
                    index,
                    previous,
                    value,
                }
            }
            ListDelta::Insert(index, value) => {
                self.entries.insert(index, value.clone());
                ListOp::Insert { index, value }
            }
            ListDelta::RemoveAt(index) => {
                let previous = self.entries.remove(index);
                ListOp::RemoveAt { index, previous }
            }
            ListDelta::Clear => {
                self.entries.clear();
                ListOp::Clear
            }
        }
    }

    /// Discards the change log. The next delta carries zero operations.
    pub fn flush_changes(&mut self) {
        self.core.flush_changes();
    }

    pub fn is_dirty(&self) -> bool {
        self.core.is_dirty()
    }

    pub fn pending_changes(&self) -> &[ListOp<T>] {
        self.core.pending_changes()
    }

    /// Announces one `Add` per entry, in list order, to the listeners
    /// registered since the snapshot was read
    pub fn replay_initial(&mut self) {
        let listeners = &mut self.listeners;
        for (index, value) in self.entries.iter().enumerate() {
            let operation = ListOp::Add {
                index,
                value: value.clone(),
            };
            self.core
                .announce(&operation, |operation| listeners.dispatch(operation));
        }
        self.core.end_replay_window();
    }

    /// Whether a snapshot was read and not yet replayed
    pub fn awaiting_replay(&self) -> bool {
        self.core.awaiting_replay()
    }

    /// Empties the list for reuse by a new owner. Listeners and policy are
    /// kept.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.core.reset();
    }

    pub fn full_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.core.config().writer_capacity);
        self.write_full(&mut writer);
        writer.to_bytes()
    }

    pub fn delta_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.core.config().writer_capacity);
        self.write_delta(&mut writer);
        writer.to_bytes()
    }
}

impl<T: Serde> Deref for ReplicatedList<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

// Replays the deltas against a simulated length so that no delta is applied
// unless all of them fit
fn validate_deltas<T>(deltas: &[ListDelta<T>], len: usize) -> Result<(), ReplicaError> {
    let mut len = len;
    for delta in deltas {
        let (op_code, index, fits) = match delta {
            ListDelta::Add(_) => (OpCode::Add, len, true),
            ListDelta::Set(index, _) => (OpCode::Set, *index, *index < len),
            ListDelta::Insert(index, _) => (OpCode::Insert, *index, *index <= len),
            ListDelta::RemoveAt(index) => (OpCode::RemoveAt, *index, *index < len),
            ListDelta::Clear => (OpCode::Clear, 0, true),
        };
        if !fits {
            return Err(ReplicaError::InvalidDeltaIndex {
                collection: COLLECTION,
                op_code,
                index,
                len,
            });
        }
        match delta {
            ListDelta::Add(_) | ListDelta::Insert(..) => len += 1,
            ListDelta::RemoveAt(_) => len -= 1,
            ListDelta::Clear => len = 0,
            ListDelta::Set(..) => {}
        }
    }
    Ok(())
}
