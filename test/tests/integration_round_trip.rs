/// Snapshot round trips and delta sync between an authority and a mirror

use std::collections::HashSet;

use tandem_shared::{ReplicatedList, ReplicatedMap, ReplicatedSet};
use tandem_test::Pair;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_list_round_trip_keeps_order() {
    init_logger();
    let mut pair: Pair<ReplicatedList<String>> = Pair::new();
    pair.authority
        .extend(["a", "b", "c"].map(String::from))
        .unwrap();
    pair.authority.insert(1, "x".to_string()).unwrap();
    pair.authority.remove_at(3).unwrap();

    pair.spawn_and_replay().unwrap();

    assert_eq!(&*pair.mirror, &*pair.authority);
    assert_eq!(pair.mirror.to_vec(), vec!["a", "x", "b"]);
}

#[test]
fn test_map_round_trip() {
    init_logger();
    let mut pair: Pair<ReplicatedMap<u32, String>> = Pair::new();
    pair.authority.insert(0, "Hello".to_string()).unwrap();
    pair.authority.insert(1, "World".to_string()).unwrap();
    pair.authority.insert(2, "!".to_string()).unwrap();

    pair.spawn_and_replay().unwrap();

    assert_eq!(pair.mirror.len(), 3);
    assert_eq!(pair.mirror.get(&0).map(String::as_str), Some("Hello"));
    assert_eq!(pair.mirror.get(&1).map(String::as_str), Some("World"));
    assert_eq!(pair.mirror.get(&2).map(String::as_str), Some("!"));
}

#[test]
fn test_set_round_trip() {
    init_logger();
    let mut pair: Pair<ReplicatedSet<(u8, String)>> = Pair::new();
    pair.authority.insert((1, "one".to_string())).unwrap();
    pair.authority.insert((2, "two".to_string())).unwrap();

    pair.spawn_and_replay().unwrap();

    let mirrored: HashSet<_> = pair.mirror.iter().cloned().collect();
    let authority: HashSet<_> = pair.authority.iter().cloned().collect();
    assert_eq!(mirrored, authority);
}

#[test]
fn test_empty_containers_round_trip() {
    let mut pair: Pair<ReplicatedList<u64>> = Pair::new();

    pair.spawn_and_replay().unwrap();

    assert!(pair.mirror.is_empty());
}

#[test]
fn test_deltas_keep_mirror_in_step() {
    init_logger();
    let mut pair: Pair<ReplicatedMap<String, i32>> = Pair::new();
    pair.authority.insert("hp".to_string(), 10).unwrap();
    pair.spawn_and_replay().unwrap();

    pair.authority.insert("hp".to_string(), 7).unwrap();
    pair.authority.insert("mp".to_string(), 3).unwrap();
    pair.sync().unwrap();
    pair.authority.remove(&"hp".to_string()).unwrap();
    pair.sync().unwrap();

    assert_eq!(pair.mirror.len(), 1);
    assert_eq!(pair.mirror.get(&"mp".to_string()), Some(&3));
    assert!(!pair.mirror.contains_key(&"hp".to_string()));
}

#[test]
fn test_flush_is_idempotent() {
    let mut pair: Pair<ReplicatedList<u8>> = Pair::new();
    pair.authority.push(1).unwrap();
    pair.authority.push(2).unwrap();

    pair.authority.flush_changes();
    pair.authority.flush_changes();

    assert!(pair.authority.pending_changes().is_empty());
    assert!(!pair.authority.is_dirty());
    // an empty delta is a single zero count
    assert_eq!(pair.authority.delta_bytes(), vec![0]);
    assert_eq!(pair.sync().unwrap(), 1);
}

#[test]
fn test_mirror_rejects_writes_and_keeps_contents() {
    let mut pair: Pair<ReplicatedList<String>> = Pair::new();
    pair.authority.push("kept".to_string()).unwrap();
    pair.spawn_and_replay().unwrap();

    assert!(pair.mirror.push("extra".to_string()).is_err());
    assert!(pair.mirror.set(0, "changed".to_string()).is_err());
    assert!(pair.mirror.remove_at(0).is_err());
    assert!(pair.mirror.clear().is_err());

    assert_eq!(pair.mirror.to_vec(), vec!["kept".to_string()]);
    assert!(!pair.mirror.is_dirty());
}

#[test]
fn test_reset_reuses_container() {
    let mut pair: Pair<ReplicatedList<String>> = Pair::new();
    pair.authority.push("old".to_string()).unwrap();
    pair.spawn().unwrap();
    assert!(pair.mirror.awaiting_replay());

    pair.mirror.reset();
    pair.authority.reset();

    assert!(pair.mirror.is_empty());
    assert!(!pair.mirror.awaiting_replay());
    assert!(!pair.authority.is_dirty());
    pair.authority.push("new".to_string()).unwrap();
    pair.spawn_and_replay().unwrap();
    assert_eq!(pair.mirror.to_vec(), vec!["new".to_string()]);
}
