/// Dirty signals, recording policy and the per-tick scheduler

use std::{cell::Cell, rc::Rc};

use tandem_shared::{
    ByteReader, ByteWrite, ByteWriter, DiffMask, DirtyChannel, NetId, ObjectArena, ReplicaError,
    ReplicatedList, ReplicatedSet, Serde, SyncPolicy,
};
use tandem_test::{apply_spawn, apply_updates, EventLog, TestOwner, TickScheduler};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn counted_list() -> (ReplicatedList<u32>, Rc<Cell<usize>>) {
    let mut list = ReplicatedList::host_owned();
    let signals = Rc::new(Cell::new(0));
    let counter = signals.clone();
    list.on_dirty(move || counter.set(counter.get() + 1));
    (list, signals)
}

#[test]
fn test_many_mutations_raise_one_signal() {
    let (mut list, signals) = counted_list();

    for value in 0..10 {
        list.push(value).unwrap();
    }
    list.set(0, 99).unwrap();
    list.remove_at(1).unwrap();

    assert_eq!(signals.get(), 1);
    assert_eq!(list.pending_changes().len(), 12);
}

#[test]
fn test_flush_rearms_signal() {
    let (mut list, signals) = counted_list();
    list.push(1).unwrap();
    list.push(2).unwrap();

    list.flush_changes();
    list.push(3).unwrap();

    assert_eq!(signals.get(), 2);
    assert!(list.is_dirty());
}

#[test]
fn test_non_recording_policy_applies_without_history() {
    let recording = Rc::new(Cell::new(false));
    let flag = recording.clone();
    let mut set = ReplicatedSet::new(SyncPolicy::new(|| true, move || flag.get()));

    set.insert("quiet".to_string()).unwrap();
    assert!(set.contains(&"quiet".to_string()));
    assert!(!set.is_dirty());
    assert!(set.pending_changes().is_empty());

    recording.set(true);
    set.insert("loud".to_string()).unwrap();
    assert!(set.is_dirty());
    assert_eq!(set.pending_changes().len(), 1);
}

#[test]
fn test_fields_share_one_channel() {
    let channel = DirtyChannel::new(2);
    let mutator = channel.mutator();
    let mut first: ReplicatedList<u8> = ReplicatedList::host_owned();
    let mut second: ReplicatedList<u8> = ReplicatedList::host_owned();
    first.set_mutator(0, &mutator);
    second.set_mutator(1, &mutator);

    second.push(1).unwrap();
    second.push(2).unwrap();

    let mask = channel.mask().unwrap();
    assert_eq!(mask.bit(0), Some(false));
    assert_eq!(mask.bit(1), Some(true));

    first.push(1).unwrap();
    let mask = channel.take().unwrap();
    assert_eq!(mask.set_bits().collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(channel.is_clear(), Ok(true));
}

#[test]
fn test_scheduler_sends_only_dirty_owners() {
    init_logger();
    let mut authorities = ObjectArena::new();
    authorities.insert(NetId::new(1), TestOwner::authority()).unwrap();
    authorities.insert(NetId::new(2), TestOwner::authority()).unwrap();
    let mut mirrors = ObjectArena::new();
    let events = EventLog::new();
    let batch = TickScheduler::spawn_batch(&mut authorities, &[NetId::new(1), NetId::new(2)]).unwrap();
    apply_spawn(batch, &mut mirrors, &events).unwrap();
    let mut scheduler = TickScheduler::new();

    assert!(scheduler.tick(&mut authorities).unwrap().is_empty());

    if let Some(owner) = authorities.get_mut(&NetId::new(2)) {
        owner.items.push("sword".to_string()).unwrap();
        owner.stats.insert("gold".to_string(), 5).unwrap();
        owner.stats.insert("gold".to_string(), 6).unwrap();
    }
    let updates = scheduler.tick(&mut authorities).unwrap();

    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].id, NetId::new(2));
    events.take();
    apply_updates(&updates, &mut mirrors).unwrap();
    assert_eq!(
        events.events(),
        vec![
            "items add 0 sword",
            "stats add gold 5",
            "stats set gold 5 -> 6"
        ]
    );

    let mirror = mirrors.get(&NetId::new(2)).unwrap();
    assert_eq!(mirror.items.to_vec(), vec!["sword".to_string()]);
    assert_eq!(mirror.stats.get(&"gold".to_string()), Some(&6));

    // everything was flushed
    assert!(scheduler.tick(&mut authorities).unwrap().is_empty());
    assert_eq!(scheduler.current_tick(), 3);
}

#[test]
fn test_malformed_field_rejects_whole_update() {
    init_logger();
    let mut mirror = TestOwner::mirror();
    let mut items: ReplicatedList<String> = ReplicatedList::host_owned();
    items.push("sword".to_string()).unwrap();

    let mut mask = DiffMask::for_fields(4);
    mask.set_bit(0, true);
    mask.set_bit(1, true);
    let mut writer = ByteWriter::new();
    mask.ser(&mut writer);
    writer.write_bytes(&items.delta_bytes());
    // one stats operation with an op code no collection uses
    writer.write_bytes(&[1, 9]);
    let bytes = writer.to_bytes();

    let result = mirror.read_update(&mut ByteReader::new(&bytes));

    assert_eq!(
        result,
        Err(ReplicaError::UnknownOpCode {
            collection: "ReplicatedMap",
            op_code: 9
        })
    );
    assert!(mirror.items.is_empty());
    assert!(mirror.stats.is_empty());
}
