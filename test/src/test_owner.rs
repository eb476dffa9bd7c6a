use tandem_shared::{
    ByteReader, ByteWrite, DiffMask, DirtyChannel, ObjectArena, ObjectRef, ReplicaError,
    ReplicatedList, ReplicatedMap, ReplicatedSet, ResolveError, Serde, SerdeErr, SyncPolicy,
};

use crate::helpers::EventLog;

const ITEMS: u8 = 0;
const STATS: u8 = 1;
const TAGS: u8 = 2;
const PARTY: u8 = 3;
const FIELD_COUNT: u8 = 4;

/// An owner object with one replicated field of each kind, plus a list of
/// references to other owners
pub struct TestOwner {
    pub items: ReplicatedList<String>,
    pub stats: ReplicatedMap<String, u32>,
    pub tags: ReplicatedSet<String>,
    pub party: ReplicatedList<ObjectRef>,
    dirty: DirtyChannel,
}

impl TestOwner {
    pub fn authority() -> Self {
        Self::with_policy(SyncPolicy::authority)
    }

    pub fn mirror() -> Self {
        Self::with_policy(SyncPolicy::mirror)
    }

    fn with_policy(policy: fn() -> SyncPolicy) -> Self {
        let dirty = DirtyChannel::new(FIELD_COUNT);
        let mutator = dirty.mutator();

        let mut items = ReplicatedList::new(policy());
        items.set_mutator(ITEMS, &mutator);
        let mut stats = ReplicatedMap::new(policy());
        stats.set_mutator(STATS, &mutator);
        let mut tags = ReplicatedSet::new(policy());
        tags.set_mutator(TAGS, &mutator);
        let mut party = ReplicatedList::new(policy());
        party.set_mutator(PARTY, &mutator);

        Self {
            items,
            stats,
            tags,
            party,
            dirty,
        }
    }

    pub fn dirty_channel(&self) -> &DirtyChannel {
        &self.dirty
    }

    /// Writes a full snapshot of every field, in field order
    pub fn write_spawn(&self, writer: &mut dyn ByteWrite) {
        self.items.write_full(writer);
        self.stats.write_full(writer);
        self.tags.write_full(writer);
        self.party.write_full(writer);
    }

    /// Builds a mirror from a spawn payload. No listener fires.
    pub fn read_spawn(reader: &mut ByteReader) -> Result<Self, ReplicaError> {
        let mut owner = Self::mirror();
        owner.items.read_full(reader)?;
        owner.stats.read_full(reader)?;
        owner.tags.read_full(reader)?;
        owner.party.read_full(reader)?;
        Ok(owner)
    }

    /// Writes `mask` followed by the delta of each field it marks
    pub fn write_update(&self, mask: &DiffMask, writer: &mut dyn ByteWrite) {
        mask.ser(writer);
        for field in mask.set_bits() {
            match field {
                ITEMS => self.items.write_delta(writer),
                STATS => self.stats.write_delta(writer),
                TAGS => self.tags.write_delta(writer),
                PARTY => self.party.write_delta(writer),
                _ => {}
            }
        }
    }

    /// Decodes the delta of every field `mask` marks before applying any of
    /// them, so one malformed field leaves the whole owner untouched
    pub fn read_update(&mut self, reader: &mut ByteReader) -> Result<(), ReplicaError> {
        let mask = DiffMask::de(reader)?;
        let mut items = None;
        let mut stats = None;
        let mut tags = None;
        let mut party = None;
        for field in mask.set_bits() {
            match field {
                ITEMS => items = Some(self.items.decode_delta(reader)?),
                STATS => stats = Some(self.stats.decode_delta(reader)?),
                TAGS => tags = Some(self.tags.decode_delta(reader)?),
                PARTY => party = Some(self.party.decode_delta(reader)?),
                value => {
                    return Err(SerdeErr::InvalidValue {
                        type_name: "field index",
                        value,
                    }
                    .into())
                }
            }
        }

        if let Some(delta) = items {
            self.items.apply_delta(delta)?;
        }
        if let Some(delta) = stats {
            self.stats.apply_delta(delta);
        }
        if let Some(delta) = tags {
            self.tags.apply_delta(delta);
        }
        if let Some(delta) = party {
            self.party.apply_delta(delta)?;
        }
        Ok(())
    }

    pub fn flush_fields(&mut self, mask: &DiffMask) {
        for field in mask.set_bits() {
            match field {
                ITEMS => self.items.flush_changes(),
                STATS => self.stats.flush_changes(),
                TAGS => self.tags.flush_changes(),
                PARTY => self.party.flush_changes(),
                _ => {}
            }
        }
    }

    /// Registers listeners that write into `events`, then replays the
    /// spawned contents through them
    pub fn startup(&mut self, events: &EventLog) {
        let log = events.clone();
        self.items
            .on_add(move |index, value| log.record(format!("items add {index} {value}")));
        let log = events.clone();
        self.items.on_set(move |index, previous, value| {
            log.record(format!("items set {index} {previous} -> {value}"))
        });
        let log = events.clone();
        self.items
            .on_remove(move |index, value| log.record(format!("items remove {index} {value}")));
        let log = events.clone();
        self.items.on_clear(move || log.record("items clear"));

        let log = events.clone();
        self.stats
            .on_add(move |key, value| log.record(format!("stats add {key} {value}")));
        let log = events.clone();
        self.stats.on_set(move |key, previous, value| {
            log.record(format!("stats set {key} {previous} -> {value}"))
        });
        let log = events.clone();
        self.stats
            .on_remove(move |key, value| log.record(format!("stats remove {key} {value}")));

        let log = events.clone();
        self.tags
            .on_add(move |value| log.record(format!("tags add {value}")));
        let log = events.clone();
        self.tags
            .on_remove(move |value| log.record(format!("tags remove {value}")));

        let log = events.clone();
        self.party.on_add(move |index, member| {
            log.record(format!("party add {index} {}", member.id()))
        });

        self.items.replay_initial();
        self.stats.replay_initial();
        self.tags.replay_initial();
        self.party.replay_initial();
    }

    /// Names of the party members that resolve in `arena`, in party order.
    /// Unresolved members show up as `pending` or `missing`.
    pub fn party_names(&self, arena: &ObjectArena<TestOwner>) -> Vec<String> {
        self.party
            .iter()
            .map(|member| match member.resolve(arena) {
                Ok(owner) => owner
                    .items
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "unnamed".to_string()),
                Err(ResolveError::Pending(_)) => "pending".to_string(),
                Err(ResolveError::NotFound(_)) => "missing".to_string(),
            })
            .collect()
    }
}
