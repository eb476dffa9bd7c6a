/// Listener registration during startup and the synthetic replay that
/// follows a snapshot

use tandem_shared::{ListOp, ReplicatedList, ReplicatedMap};
use tandem_test::{EventLog, Pair};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_snapshot_fires_no_listener() {
    let mut pair: Pair<ReplicatedList<String>> = Pair::new();
    pair.authority
        .extend(["Hello", "World"].map(String::from))
        .unwrap();
    let events = EventLog::new();
    let log = events.clone();
    pair.mirror
        .on_add(move |index, value| log.record(format!("add {index} {value}")));

    pair.spawn().unwrap();

    assert!(events.is_empty());
    assert_eq!(pair.mirror.len(), 2);
    assert!(pair.mirror.awaiting_replay());
}

#[test]
fn test_replay_precedes_live_deltas() {
    init_logger();
    let mut pair: Pair<ReplicatedList<String>> = Pair::new();
    pair.authority
        .extend(["Hello", "World"].map(String::from))
        .unwrap();
    pair.spawn().unwrap();

    // startup: register then replay
    let events = EventLog::new();
    let log = events.clone();
    pair.mirror
        .on_add(move |index, value| log.record(format!("add {index} {value}")));
    let log = events.clone();
    pair.mirror.on_change(move |operation| {
        if let ListOp::Add { index, .. } = operation {
            log.record(format!("change add {index}"));
        }
    });
    pair.mirror.replay_initial();

    pair.authority.push("!".to_string()).unwrap();
    pair.sync().unwrap();

    assert_eq!(
        events.events(),
        vec![
            "add 0 Hello",
            "change add 0",
            "add 1 World",
            "change add 1",
            "add 2 !",
            "change add 2",
        ]
    );
    assert!(!pair.mirror.awaiting_replay());
}

#[test]
fn test_replay_fires_once_per_entry() {
    let mut pair: Pair<ReplicatedMap<u8, u8>> = Pair::new();
    for key in 0..5 {
        pair.authority.insert(key, key * 2).unwrap();
    }
    pair.spawn().unwrap();
    let events = EventLog::new();
    let log = events.clone();
    pair.mirror
        .on_add(move |key, value| log.record(format!("{key}={value}")));

    pair.mirror.replay_initial();

    let mut replayed = events.take();
    replayed.sort();
    assert_eq!(replayed, vec!["0=0", "1=2", "2=4", "3=6", "4=8"]);
    assert!(!pair.mirror.is_dirty());
    assert!(pair.mirror.pending_changes().is_empty());
}

#[test]
fn test_delta_before_replay_is_still_applied() {
    init_logger();
    let mut pair: Pair<ReplicatedList<u16>> = Pair::new();
    pair.authority.push(1).unwrap();
    pair.spawn().unwrap();

    pair.authority.push(2).unwrap();
    pair.sync().unwrap();

    assert_eq!(pair.mirror.to_vec(), vec![1, 2]);
    assert!(pair.mirror.awaiting_replay());
}

#[test]
fn test_authority_listeners_fire_on_local_mutation() {
    let mut list: ReplicatedList<String> = ReplicatedList::host_owned();
    let events = EventLog::new();
    let log = events.clone();
    list.on_set(move |index, previous: &String, value: &String| {
        log.record(format!("set {index} {previous} -> {value}"))
    });
    let log = events.clone();
    list.on_change(move |_| log.record("change"));
    list.push("a".to_string()).unwrap();

    list.set(0, "a".to_string()).unwrap();

    // the push only reaches on_change, the equal-value set reaches both
    assert_eq!(events.events(), vec!["change", "set 0 a -> a", "change"]);
}
