use std::{
    collections::{hash_map, HashMap},
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

const COLLECTION: &str = "ReplicatedMap";

/// A mutation of a [`ReplicatedMap`]
#[derive(Debug, Clone, PartialEq)]
pub enum MapOp<K, V> {
    Add { key: K, value: V },
    Set { key: K, previous: V, value: V },
    Remove { key: K, previous: V },
    Clear,
}

impl<K: Serde, V: Serde> ChangeOperation for MapOp<K, V> {
    fn op_code(&self) -> OpCode {
        match self {
            MapOp::Add { .. } => OpCode::Add,
            MapOp::Set { .. } => OpCode::Set,
            MapOp::Remove { .. } => OpCode::Remove,
            MapOp::Clear => OpCode::Clear,
        }
    }

    fn write_body(&self, writer: &mut dyn ByteWrite) {
        match self {
            MapOp::Add { key, value } | MapOp::Set { key, value, .. } => {
                key.ser(writer);
                value.ser(writer);
            }
            MapOp::Remove { key, .. } => key.ser(writer),
            MapOp::Clear => {}
        }
    }
}

enum MapDelta<K, V> {
    Upsert(K, V),
    Remove(K),
    Clear,
}

/// A map delta that decoded cleanly and has not been applied yet
pub struct DecodedMapDelta<K, V> {
    deltas: Vec<MapDelta<K, V>>,
}

impl<K, V> DecodedMapDelta<K, V> {
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

type EntryListener<K, V> = Box<dyn FnMut(&K, &V)>;

struct MapListeners<K, V> {
    on_add: Option<EntryListener<K, V>>,
    on_set: Option<Box<dyn FnMut(&K, &V, &V)>>,
    on_remove: Option<EntryListener<K, V>>,
    on_clear: Option<Box<dyn FnMut()>>,
}

impl<K, V> MapListeners<K, V> {
    fn new() -> Self {
        Self {
            on_add: None,
            on_set: None,
            on_remove: None,
            on_clear: None,
        }
    }

    fn dispatch(&mut self, operation: &MapOp<K, V>) {
        match operation {
            MapOp::Add { key, value } => {
                if let Some(on_add) = self.on_add.as_mut() {
                    on_add(key, value);
                }
            }
            MapOp::Set {
                key,
                previous,
                value,
            } => {
                if let Some(on_set) = self.on_set.as_mut() {
                    on_set(key, previous, value);
                }
            }
            MapOp::Remove { key, previous } => {
                if let Some(on_remove) = self.on_remove.as_mut() {
                    on_remove(key, previous);
                }
            }
            MapOp::Clear => {
                if let Some(on_clear) = self.on_clear.as_mut() {
                    on_clear();
                }
            }
        }
    }
}

/// A key-value mapping kept in sync between an authoritative copy and its
/// mirrors.
pub struct ReplicatedMap<K: Serde + Eq + Hash, V: Serde> {
    entries: HashMap<K, V>,
    core: ReplicaCore<MapOp<K, V>>,
    listeners: MapListeners<K, V>,
}

impl<K: Serde + Eq + Hash, V: Serde> ReplicatedMap<K, V> {
    pub fn new(policy: SyncPolicy) -> Self {
        Self::with_config(policy, SyncConfig::default())
    }

    pub fn with_config(policy: SyncPolicy, config: SyncConfig) -> Self {
        Self {
            entries: HashMap::new(),
            core: ReplicaCore::new(COLLECTION, policy, config),
            listeners: MapListeners::new(),
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

    pub fn on_add(&mut self, listener: impl FnMut(&K, &V) + 'static) {
        self.listeners.on_add = Some(Box::new(listener));
    }

    /// Called with key, previous value and new value
    pub fn on_set(&mut self, listener: impl FnMut(&K, &V, &V) + 'static) {
        self.listeners.on_set = Some(Box::new(listener));
    }

    pub fn on_remove(&mut self, listener: impl FnMut(&K, &V) + 'static) {
        self.listeners.on_remove = Some(Box::new(listener));
    }

    pub fn on_clear(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.on_clear = Some(Box::new(listener));
    }

    pub fn on_change(&mut self, listener: impl FnMut(&MapOp<K, V>) + 'static) {
        self.core.set_on_change(Box::new(listener));
    }

    pub fn on_dirty(&mut self, listener: impl FnMut() + 'static) {
        self.core.set_on_dirty(Box::new(listener));
    }

    // Mutation

    /// Adds `key`, or replaces its value if present. A replaced value is
    /// recorded as a `Set` even when it is equal to the new one.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), ReplicaError> {
        self.core.check_writable("insert")?;
        let len_after = if self.entries.contains_key(&key) {
            self.entries.len()
        } else {
            self.entries.len() + 1
        };
        self.core.check_limits("insert", len_after, 1)?;
        let operation = match self.entries.insert(key.clone(), value.clone()) {
            Some(previous) => MapOp::Set {
                key,
                previous,
                value,
            },
            None => MapOp::Add { key, value },
        };
        self.commit(operation);
        Ok(())
    }

    /// Removes `key`. Returns `false`, recording nothing, when it is absent.
    pub fn remove(&mut self, key: &K) -> Result<bool, ReplicaError> {
        self.core.check_writable("remove")?;
        if !self.entries.contains_key(key) {
            return Ok(false);
        }
        self.core.check_limits("remove", self.entries.len() - 1, 1)?;
        let Some((key, previous)) = self.entries.remove_entry(key) else {
            return Ok(false);
        };
        self.commit(MapOp::Remove { key, previous });
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), ReplicaError> {
        self.core.check_writable("clear")?;
        self.core.check_limits("clear", 0, 1)?;
        self.entries.clear();
        self.commit(MapOp::Clear);
        Ok(())
    }

    fn commit(&mut self, operation: MapOp<K, V>) {
        let listeners = &mut self.listeners;
        self.core
            .commit(operation, |operation| listeners.dispatch(operation));
    }

    // Reads

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, K, V> {
        self.entries.keys()
    }

    pub fn values(&self) -> hash_map::Values<'_, K, V> {
        self.entries.values()
    }

    /// Copies every entry, in iteration order, into `destination` starting
    /// at `start`
    pub fn copy_to(&self, destination: &mut [(K, V)], start: usize) -> Result<(), ReplicaError> {
        let target = copy_target(destination, start, self.entries.len())?;
        for (slot, (key, value)) in target.iter_mut().zip(self.entries.iter()) {
            *slot = (key.clone(), value.clone());
        }
        Ok(())
    }

    // Serialization

    /// Writes `[count][key value]*` in iteration order
    pub fn write_full(&self, writer: &mut dyn ByteWrite) {
        write_count(writer, self.entries.len());
        for (key, value) in &self.entries {
            key.ser(writer);
            value.ser(writer);
        }
    }

    /// Replaces every entry with a decoded snapshot without firing listeners.
    /// A snapshot that repeats a key is rejected.
    pub fn read_full(&mut self, reader: &mut ByteReader) -> Result<(), ReplicaError> {
        let decoded = self.core.read_snapshot(reader, |reader| {
            let key = K::de(reader)?;
            let value = V::de(reader)?;
            Ok((key, value))
        })?;
        let mut entries = HashMap::with_capacity(decoded.len());
        for (key, value) in decoded {
            if entries.insert(key, value).is_some() {
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

    /// Applies a decoded delta, announcing each operation as it lands.
    /// Removing an absent key announces nothing.
    pub fn read_delta(&mut self, reader: &mut ByteReader) -> Result<(), ReplicaError> {
        let delta = self.decode_delta(reader)?;
        self.apply_delta(delta);
        Ok(())
    }

    /// Decodes a delta without applying it
    pub fn decode_delta(
        &self,
        reader: &mut ByteReader,
    ) -> Result<DecodedMapDelta<K, V>, ReplicaError> {
        let deltas = self.core.read_delta(reader, |op_code, reader| {
            Ok(match op_code {
                OpCode::Add | OpCode::Set => {
                    let key = K::de(reader)?;
                    let value = V::de(reader)?;
                    MapDelta::Upsert(key, value)
                }
                OpCode::Remove => MapDelta::Remove(K::de(reader)?),
                OpCode::Clear => MapDelta::Clear,
                OpCode::Insert | OpCode::RemoveAt => {
                    return Err(ReplicaError::UnknownOpCode {
                        collection: COLLECTION,
                        op_code: op_code.to_byte(),
                    })
                }
            })
        })?;
        Ok(DecodedMapDelta { deltas })
    }

    pub fn apply_delta(&mut self, delta: DecodedMapDelta<K, V>) {
        for delta in delta.deltas {
            let Some(operation) = self.apply(delta) else {
                continue;
            };
            let listeners = &mut self.listeners;
            self.core
                .announce(&operation, |operation| listeners.dispatch(operation));
        }
    }

    // An Add and a Set both land as an upsert, announced by whether the key
    // was present locally
    fn apply(&mut self, delta: MapDelta<K, V>) -> Option<MapOp<K, V>> {
        match delta {
            MapDelta::Upsert(key, value) => {
                Some(match self.entries.insert(key.clone(), value.clone()) {
                    Some(previous) => MapOp::Set {
                        key,
                        previous,
                        value,
                    },
                    None => MapOp::Add { key, value },
                })
            }
            MapDelta::Remove(key) => {
                let (key, previous) = self.entries.remove_entry(&key)?;
                Some(MapOp::Remove { key, previous })
            }
            MapDelta::Clear => {
                self.entries.clear();
                Some(MapOp::Clear)
            }
        }
    }

    pub fn flush_changes(&mut self) {
        self.core.flush_changes();
    }

    pub fn is_dirty(&self) -> bool {
        self.core.is_dirty()
    }

    pub fn pending_changes(&self) -> &[MapOp<K, V>] {
        self.core.pending_changes()
    }

    /// Announces one `Add` per entry, in iteration order
    pub fn replay_initial(&mut self) {
        let listeners = &mut self.listeners;
        for (key, value) in self.entries.iter() {
            let operation = MapOp::Add {
                key: key.clone(),
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
