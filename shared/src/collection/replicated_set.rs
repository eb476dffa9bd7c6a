use std::{
    collections::{hash_set, HashSet},
    hash::Hash,
};

use tandem_serde::{write_count, ByteReader, ByteWrite, ByteWriter, Serde};

use crate::config::SyncConfig;

use super::{
    error::ReplicaError,
    field_mutate::FieldMutator,
    op_code::{ChangeOperation, OpCode},
    policy::SyncPolicy,
    replica_core::{copy_target, ReplicaCore},
};

const COLLECTION: &str = "ReplicatedSet";

/// A mutation of a [`ReplicatedSet`]
#[derive(Debug, Clone, PartialEq)]
pub enum SetOp<T> {
    Add { value: T },
    Remove { value: T },
    Clear,
}

impl<T: Serde> ChangeOperation for SetOp<T> {
    fn op_code(&self) -> OpCode {
        match self {
            SetOp::Add { .. } => OpCode::Add,
            SetOp::Remove { .. } => OpCode::Remove,
            SetOp::Clear => OpCode::Clear,
        }
    }

    fn write_body(&self, writer: &mut dyn ByteWrite) {
        match self {
            SetOp::Add { value } | SetOp::Remove { value } => value.ser(writer),
            SetOp::Clear => {}
        }
    }
}

/// A set delta that decoded cleanly and has not been applied yet
pub struct DecodedSetDelta<T> {
    operations: Vec<SetOp<T>>,
}

impl<T> DecodedSetDelta<T> {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

type ValueListener<T> = Box<dyn FnMut(&T)>;

struct SetListeners<T> {
    on_add: Option<ValueListener<T>>,
    on_remove: Option<ValueListener<T>>,
    on_clear: Option<Box<dyn FnMut()>>,
}

impl<T> SetListeners<T> {
    fn new() -> Self {
        Self {
            on_add: None,
            on_remove: None,
            on_clear: None,
        }
    }

    fn dispatch(&mut self, operation: &SetOp<T>) {
        let (listener, value) = match operation {
            SetOp::Add { value } => (self.on_add.as_mut(), value),
            SetOp::Remove { value } => (self.on_remove.as_mut(), value),
            SetOp::Clear => {
                if let Some(on_clear) = self.on_clear.as_mut() {
                    on_clear();
                }
                return;
            }
        };
        if let Some(listener) = listener {
            listener(value);
        }
    }
}

/// A collection of unique values kept in sync between an authoritative copy
/// and its mirrors.
pub struct ReplicatedSet<T: Serde + Eq + Hash> {
    entries: HashSet<T>,
    core: ReplicaCore<SetOp<T>>,
    listeners: SetListeners<T>,
}

impl<T: Serde + Eq + Hash> ReplicatedSet<T> {
    pub fn new(policy: SyncPolicy) -> Self {
        Self::with_config(policy, SyncConfig::default())
    }

    pub fn with_config(policy: SyncPolicy, config: SyncConfig) -> Self {
        Self {
            entries: HashSet::new(),
            core: ReplicaCore::new(COLLECTION, policy, config),
            listeners: SetListeners::new(),
        }
    }

    pub fn host_owned() -> Self {
        Self::new(SyncPolicy::authority())
    }

    pub fn remote_owned() -> Self {
        Self::new(SyncPolicy::mirror())
    }

    pub fn set_policy(&mut self, policy: SyncPolicy) {
        self.core.set_policy(policy);
    }

    pub fn set_mutator(&mut self, field_index: u8, mutator: &FieldMutator) {
        self.core.set_mutator(field_index, mutator);
    }

    // Listeners

    pub fn on_add(&mut self, listener: impl FnMut(&T) + 'static) {
        self.listeners.on_add = Some(Box::new(listener));
    }

    pub fn on_remove(&mut self, listener: impl FnMut(&T) + 'static) {
        self.listeners.on_remove = Some(Box::new(listener));
    }

    pub fn on_clear(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.on_clear = Some(Box::new(listener));
    }

    pub fn on_change(&mut self, listener: impl FnMut(&SetOp<T>) + 'static) {
        self.core.set_on_change(Box::new(listener));
    }

    pub fn on_dirty(&mut self, listener: impl FnMut() + 'static) {
        self.core.set_on_dirty(Box::new(listener));
    }

    // Mutation

    /// Adds `value`. Returns `false`, recording nothing, if it is already
    /// present.
    pub fn insert(&mut self, value: T) -> Result<bool, ReplicaError> {
        self.core.check_writable("insert")?;
        if self.entries.contains(&value) {
            return Ok(false);
        }
        self.core.check_limits("insert", self.entries.len() + 1, 1)?;
        self.entries.insert(value.clone());
        self.commit(SetOp::Add { value });
        Ok(true)
    }

    /// Removes `value`. Returns `false`, recording nothing, when it is
    /// absent.
    pub fn remove(&mut self, value: &T) -> Result<bool, ReplicaError> {
        self.core.check_writable("remove")?;
        if !self.entries.contains(value) {
            return Ok(false);
        }
        self.core.check_limits("remove", self.entries.len() - 1, 1)?;
        let Some(value) = self.entries.take(value) else {
            return Ok(false);
        };
        self.commit(SetOp::Remove { value });
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), ReplicaError> {
        self.core.check_writable("clear")?;
        self.core.check_limits("clear", 0, 1)?;
        self.entries.clear();
        self.commit(SetOp::Clear);
        Ok(())
    }

    /// Adds every value of `other`, recording one `Add` per new value
    pub fn union_with<'a>(
        &mut self,
        other: impl IntoIterator<Item = &'a T>,
    ) -> Result<(), ReplicaError>
    where
        T: 'a,
    {
        self.core.check_writable("union_with")?;
        let added: HashSet<&T> = other
            .into_iter()
            .filter(|value| !self.entries.contains(*value))
            .collect();
        self.core
            .check_limits("union_with", self.entries.len() + added.len(), added.len())?;
        for value in added {
            self.insert(value.clone())?;
        }
        Ok(())
    }

    /// Removes every value of `other`, recording one `Remove` per value
    /// that was present
    pub fn except_with<'a>(
        &mut self,
        other: impl IntoIterator<Item = &'a T>,
    ) -> Result<(), ReplicaError>
    where
        T: 'a,
    {
        self.core.check_writable("except_with")?;
        let removed: HashSet<&T> = other
            .into_iter()
            .filter(|value| self.entries.contains(*value))
            .collect();
        self.core
            .check_limits("except_with", self.entries.len() - removed.len(), removed.len())?;
        for value in removed {
            self.remove(value)?;
        }
        Ok(())
    }

    /// Keeps only values also present in `other`, recording one `Remove` per
    /// dropped value
    pub fn intersect_with(&mut self, other: &HashSet<T>) -> Result<(), ReplicaError> {
        self.core.check_writable("intersect_with")?;
        let dropped: Vec<T> = self
            .entries
            .iter()
            .filter(|value| !other.contains(*value))
            .cloned()
            .collect();
        self.core.check_limits(
            "intersect_with",
            self.entries.len() - dropped.len(),
            dropped.len(),
        )?;
        for value in dropped {
            self.remove(&value)?;
        }
        Ok(())
    }

    fn commit(&mut self, operation: SetOp<T>) {
        let listeners = &mut self.listeners;
        self.core
            .commit(operation, |operation| listeners.dispatch(operation));
    }

    // Reads

    pub fn contains(&self, value: &T) -> bool {
        self.entries.contains(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn is_subset(&self, other: &HashSet<T>) -> bool {
        self.entries.is_subset(other)
    }

    pub fn is_superset(&self, other: &HashSet<T>) -> bool {
        self.entries.is_superset(other)
    }

    pub fn copy_to(&self, destination: &mut [T], start: usize) -> Result<(), ReplicaError> {
        let target = copy_target(destination, start, self.entries.len())?;
        for (slot, value) in target.iter_mut().zip(self.entries.iter()) {
            *slot = value.clone();
        }
        Ok(())
    }

    // Serialization

    pub fn write_full(&self, writer: &mut dyn ByteWrite) {
        write_count(writer, self.entries.len());
        for value in &self.entries {
            value.ser(writer);
        }
    }

    /// Replaces every value with a decoded snapshot without firing
    /// listeners. A snapshot that repeats a value is rejected.
    pub fn read_full(&mut self, reader: &mut ByteReader) -> Result<(), ReplicaError> {
        let decoded = self.core.read_snapshot(reader, |reader| Ok(T::de(reader)?))?;
        let mut entries = HashSet::with_capacity(decoded.len());
        for value in decoded {
            if !entries.insert(value) {
                return Err(ReplicaError::DuplicateEntry {
                    collection: COLLECTION,
                });
            }
        }
        self.entries = entries;
        self.core.begin_replay_window();
        Ok(())
    }

    pub fn write_delta(&self, writer: &mut dyn ByteWrite) {
        self.core.write_delta(writer);
    }

    /// Applies a decoded delta. Adding a present value or removing an absent
    /// one changes nothing and announces nothing.
    pub fn read_delta(&mut self, reader: &mut ByteReader) -> Result<(), ReplicaError> {
        let delta = self.decode_delta(reader)?;
        self.apply_delta(delta);
        Ok(())
    }

    /// Decodes a delta without applying it
    pub fn decode_delta(
        &self,
        reader: &mut ByteReader,
    ) -> Result<DecodedSetDelta<T>, ReplicaError> {
        let operations = self.core.read_delta(reader, |op_code, reader| {
            Ok(match op_code {
                OpCode::Add => SetOp::Add {
                    value: T::de(reader)?,
                },
                OpCode::Remove => SetOp::Remove {
                    value: T::de(reader)?,
                },
                OpCode::Clear => SetOp::Clear,
                OpCode::Set | OpCode::Insert | OpCode::RemoveAt => {
                    return Err(ReplicaError::UnknownOpCode {
                        collection: COLLECTION,
                        op_code: op_code.to_byte(),
                    })
                }
            })
        })?;
        Ok(DecodedSetDelta { operations })
    }

    pub fn apply_delta(&mut self, delta: DecodedSetDelta<T>) {
        for operation in delta.operations {
            let changed = match &operation {
                SetOp::Add { value } => self.entries.insert(value.clone()),
                SetOp::Remove { value } => self.entries.remove(value),
                SetOp::Clear => {
                    self.entries.clear();
                    true
                }
            };
            if !changed {
                continue;
            }
            let listeners = &mut self.listeners;
            self.core
                .announce(&operation, |operation| listeners.dispatch(operation));
        }
    }

    pub fn flush_changes(&mut self) {
        self.core.flush_changes();
    }

    pub fn is_dirty(&self) -> bool {
        self.core.is_dirty()
    }

    pub fn pending_changes(&self) -> &[SetOp<T>] {
        self.core.pending_changes()
    }

    pub fn replay_initial(&mut self) {
        let listeners = &mut self.listeners;
        for value in self.entries.iter() {
            let operation = SetOp::Add {
                value: value.clone(),
            };
            self.core
                .announce(&operation, |operation| listeners.dispatch(operation));
        }
        self.core.end_replay_window();
    }

    pub fn awaiting_replay(&self) -> bool {
        self.core.awaiting_replay()
    }

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
