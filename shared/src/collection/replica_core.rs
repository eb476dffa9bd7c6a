use log::{debug, warn};

use tandem_serde::{read_count, ByteReader, ByteWrite};

use crate::config::SyncConfig;

use super::{
    change_log::ChangeLog,
    error::ReplicaError,
    field_mutate::FieldMutator,
    op_code::{ChangeOperation, OpCode},
    policy::SyncPolicy,
};

/// State shared by every replicated collection: policy, change log, dirty
/// flag, the generic change listener and the pending-replay flag.
///
/// The collections own their entries and their specific listeners and hand
/// operations here to be checked, recorded and announced.
pub struct ReplicaCore<Op> {
    collection: &'static str,
    policy: SyncPolicy,
    config: SyncConfig,
    changes: ChangeLog<Op>,
    dirty: bool,
    awaiting_replay: bool,
    mutator: Option<(u8, FieldMutator)>,
    on_dirty: Option<Box<dyn FnMut()>>,
    on_change: Option<Box<dyn FnMut(&Op)>>,
}

impl<Op: ChangeOperation> ReplicaCore<Op> {
    pub(crate) fn new(collection: &'static str, policy: SyncPolicy, config: SyncConfig) -> Self {
        let changes = ChangeLog::new(config.change_log_warn_len);
        Self {
            collection,
            policy,
            config,
            changes,
            dirty: false,
            awaiting_replay: false,
            mutator: None,
            on_dirty: None,
            on_change: None,
        }
    }

    pub(crate) fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub(crate) fn set_policy(&mut self, policy: SyncPolicy) {
        self.policy = policy;
    }

    pub(crate) fn set_mutator(&mut self, field_index: u8, mutator: &FieldMutator) {
        self.mutator = Some((field_index, mutator.clone_new()));
    }

    pub(crate) fn set_on_dirty(&mut self, listener: Box<dyn FnMut()>) {
        self.on_dirty = Some(listener);
    }

    pub(crate) fn set_on_change(&mut self, listener: Box<dyn FnMut(&Op)>) {
        self.on_change = Some(listener);
    }

    pub(crate) fn check_writable(&self, operation: &'static str) -> Result<(), ReplicaError> {
        if self.policy.is_writable() {
            return Ok(());
        }
        Err(ReplicaError::ReadOnly {
            collection: self.collection,
            operation,
        })
    }

    /// Refuses a mutation whose result mirrors could not decode: `len_after`
    /// entries in a snapshot, or `operations` more pending operations in the
    /// next delta, past `max_decoded_entries`.
    pub(crate) fn check_limits(
        &self,
        operation: &'static str,
        len_after: usize,
        operations: usize,
    ) -> Result<(), ReplicaError> {
        let limit = self.config.max_decoded_entries;
        if len_after > limit {
            return Err(ReplicaError::CapacityExceeded {
                collection: self.collection,
                operation,
                limit,
            });
        }
        if self.policy.is_recording() && self.changes.len().saturating_add(operations) > limit {
            return Err(ReplicaError::ChangeLogFull {
                collection: self.collection,
                operation,
                limit,
            });
        }
        Ok(())
    }

    /// Records a mutation already applied to the entries, then announces it
    /// through `dispatch` (the specific listener) and the change listener.
    pub(crate) fn commit(&mut self, operation: Op, dispatch: impl FnOnce(&Op)) {
        if !self.policy.is_recording() {
            self.announce(&operation, dispatch);
            return;
        }

        self.changes.push(operation);
        self.mark_dirty();
        if let Some(operation) = self.changes.last() {
            dispatch(operation);
            if let Some(on_change) = self.on_change.as_mut() {
                on_change(operation);
            }
        }
    }

    /// Announces an operation without recording it. Used for decoded deltas
    /// and synthetic replay.
    pub(crate) fn announce(&mut self, operation: &Op, dispatch: impl FnOnce(&Op)) {
        dispatch(operation);
        if let Some(on_change) = self.on_change.as_mut() {
            on_change(operation);
        }
    }

    fn mark_dirty(&mut self) {
        if self.dirty {
            return;
        }
        self.dirty = true;
        if let Some((field_index, mutator)) = self.mutator.as_mut() {
            if !mutator.mutate(*field_index) {
                warn!(
                    "{} could not deliver dirty signal for field {}",
                    self.collection, field_index
                );
            }
        }
        if let Some(on_dirty) = self.on_dirty.as_mut() {
            on_dirty();
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn pending_changes(&self) -> &[Op] {
        self.changes.as_slice()
    }

    pub(crate) fn write_delta(&self, writer: &mut dyn ByteWrite) {
        self.changes.write(writer);
    }

    pub(crate) fn flush_changes(&mut self) {
        if !self.changes.is_empty() {
            debug!("{} flushed {} operations", self.collection, self.changes.len());
        }
        self.changes.clear();
        self.dirty = false;
    }

    /// Decodes a whole snapshot frame. Nothing is returned unless every entry
    /// decoded.
    pub(crate) fn read_snapshot<E>(
        &self,
        reader: &mut ByteReader,
        mut read_entry: impl FnMut(&mut ByteReader) -> Result<E, ReplicaError>,
    ) -> Result<Vec<E>, ReplicaError> {
        let count = read_count(reader, self.config.max_decoded_entries)?;
        let mut entries = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            entries.push(read_entry(reader)?);
        }
        Ok(entries)
    }

    /// Decodes a whole delta frame. Nothing is returned unless every
    /// operation decoded.
    pub(crate) fn read_delta<W>(
        &self,
        reader: &mut ByteReader,
        mut read_op: impl FnMut(OpCode, &mut ByteReader) -> Result<W, ReplicaError>,
    ) -> Result<Vec<W>, ReplicaError> {
        let count = read_count(reader, self.config.max_decoded_entries)?;
        let mut operations = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            let byte = reader.read_byte()?;
            let Some(op_code) = OpCode::from_byte(byte) else {
                return Err(self.unknown_op_code(byte));
            };
            operations.push(read_op(op_code, reader)?);
        }

        if self.awaiting_replay && !operations.is_empty() {
            warn!(
                "{} received a delta before its initial contents were replayed. Call replay_initial() during startup.",
                self.collection
            );
        }
        Ok(operations)
    }

    pub(crate) fn unknown_op_code(&self, op_code: u8) -> ReplicaError {
        ReplicaError::UnknownOpCode {
            collection: self.collection,
            op_code,
        }
    }

    pub(crate) fn begin_replay_window(&mut self) {
        self.awaiting_replay = true;
    }

    pub(crate) fn end_replay_window(&mut self) {
        if !self.awaiting_replay {
            debug!("{} replaying contents that were not loaded from a snapshot", self.collection);
        }
        self.awaiting_replay = false;
    }

    pub(crate) fn awaiting_replay(&self) -> bool {
        self.awaiting_replay
    }

    pub(crate) fn reset(&mut self) {
        self.changes.clear();
        self.dirty = false;
        self.awaiting_replay = false;
    }
}

/// Checks that `count` entries fit in `destination` from `start` on and
/// returns the slots to fill
pub(crate) fn copy_target<T>(
    destination: &mut [T],
    start: usize,
    count: usize,
) -> Result<&mut [T], ReplicaError> {
    if start > destination.len() {
        return Err(ReplicaError::IndexOutOfRange {
            collection: "destination",
            index: start,
            len: destination.len(),
        });
    }
    let available = destination.len() - start;
    if available < count {
        return Err(ReplicaError::InsufficientCapacity {
            required: count,
            available,
        });
    }
    Ok(&mut destination[start..start + count])
}
