/// End-to-end scenarios over the byte-level protocol

use tandem_shared::{
    ByteReader, ByteWrite, ByteWriter, OpCode, ReplicaError, ReplicatedList, ReplicatedMap,
    Serde,
};
use tandem_test::{EventLog, Pair};

fn hello_world_pair() -> Pair<ReplicatedList<String>> {
    let mut pair: Pair<ReplicatedList<String>> = Pair::new();
    pair.authority
        .extend(["Hello", "World", "!"].map(String::from))
        .unwrap();
    pair.spawn_and_replay().unwrap();
    pair
}

#[test]
fn test_set_by_index_reaches_mirror_listener() {
    let mut pair = hello_world_pair();
    let events = EventLog::new();
    let log = events.clone();
    pair.mirror.on_set(move |index, previous, value| {
        log.record(format!("{index} {previous} -> {value}"))
    });

    pair.authority.set(1, "yay".to_string()).unwrap();
    pair.sync().unwrap();

    assert_eq!(pair.mirror[1], "yay");
    assert_eq!(events.events(), vec!["1 World -> yay"]);
}

#[test]
fn test_set_delta_bytes() {
    let mut pair = hello_world_pair();

    pair.authority.set(1, "yay".to_string()).unwrap();

    // one op, Set, index 1, "yay" with its length + 1 prefix
    assert_eq!(
        pair.authority.delta_bytes(),
        vec![1, OpCode::Set.to_byte(), 1, 4, b'y', b'a', b'y']
    );
}

#[test]
fn test_remove_of_unknown_key_on_mirror() {
    let mut pair: Pair<ReplicatedMap<u32, String>> = Pair::new();
    pair.authority.insert(0, "Hello".to_string()).unwrap();
    pair.authority.insert(1, "World".to_string()).unwrap();
    pair.authority.insert(2, "!".to_string()).unwrap();
    pair.spawn_and_replay().unwrap();
    let events = EventLog::new();
    let log = events.clone();
    pair.mirror
        .on_remove(move |key, _| log.record(format!("remove {key}")));

    let mut writer = ByteWriter::new();
    writer.write_bytes(&[1, OpCode::Remove.to_byte()]);
    99_u32.ser(&mut writer);
    let bytes = writer.to_bytes();
    let result = pair.mirror.read_delta(&mut ByteReader::new(&bytes));

    assert_eq!(result, Ok(()));
    assert_eq!(pair.mirror.len(), 3);
    assert!(events.is_empty());
}

#[test]
fn test_copy_map_into_short_destination() {
    let mut map = ReplicatedMap::host_owned();
    map.insert(0_u32, "Hello".to_string()).unwrap();
    map.insert(1, "World".to_string()).unwrap();
    map.insert(2, "!".to_string()).unwrap();
    let mut destination = vec![(0_u32, String::new()); 2];

    let result = map.copy_to(&mut destination, 2);

    assert!(matches!(
        result,
        Err(ReplicaError::InsufficientCapacity { required: 3, .. })
    ));
    assert!(destination.iter().all(|(_, value)| value.is_empty()));
}

#[test]
fn test_truncated_delta_leaves_mirror_untouched() {
    let mut pair = hello_world_pair();
    pair.authority.push("more".to_string()).unwrap();
    pair.authority.set(0, "Bye".to_string()).unwrap();
    let delta = pair.authority.delta_bytes();

    for cut in 1..delta.len() {
        let result = pair.mirror.read_delta(&mut ByteReader::new(&delta[..cut]));
        assert!(result.is_err(), "prefix of {cut} bytes decoded");
        assert_eq!(pair.mirror.to_vec(), vec!["Hello", "World", "!"]);
    }

    pair.mirror.read_delta(&mut ByteReader::new(&delta)).unwrap();
    assert_eq!(pair.mirror.to_vec(), vec!["Bye", "World", "!", "more"]);
}

#[test]
fn test_overrun_snapshot_leaves_mirror_untouched() {
    let mut pair = hello_world_pair();
    // count 1, then a text claiming 50 bytes
    let bytes = [1, 51, b'x'];

    let result = pair.mirror.read_full(&mut ByteReader::new(&bytes));

    assert!(matches!(result, Err(ReplicaError::MalformedWireData(_))));
    assert_eq!(pair.mirror.to_vec(), vec!["Hello", "World", "!"]);
}
