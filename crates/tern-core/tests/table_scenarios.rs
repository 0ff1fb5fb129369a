//! End-to-end table behavior: growth, collision handling, deletion,
//! iteration, and allocation-pressure recovery.

use std::collections::HashMap;

use tern_core::{Config, Runtime, SystemAllocator, TableId, Value, VmError, str_hash};

fn rt() -> Runtime {
    Runtime::new(Config::default()).expect("runtime")
}

/// The collision invariant: every entry sitting outside its main position
/// exists only because the occupant of that main position owns it.
fn assert_collision_invariant(rt: &Runtime, t: TableId) {
    let tbl = &rt.g.heap.tables[t];
    let strings = &rt.g.heap.strings;
    for i in 0..tbl.hash_size() {
        let (key, _) = tbl.node_entry(i);
        if key.is_nil() || matches!(key, Value::DeadKey(_)) {
            continue;
        }
        let mp = tbl.main_position_of(strings, &key).expect("hash part");
        if mp != i {
            let (occupant, _) = tbl.node_entry(mp);
            assert!(!occupant.is_nil(), "disputed main position left empty");
            assert_eq!(
                tbl.main_position_of(strings, &occupant).unwrap(),
                mp,
                "occupant of a disputed main position must own it"
            );
        }
    }
}

fn iter_entries(rt: &Runtime, t: TableId) -> Vec<(Value, Value)> {
    let mut out = Vec::new();
    let mut key = Value::Nil;
    while let Some((k, v)) = rt.g.table_next(t, &key).expect("valid iteration key") {
        out.push((k, v));
        key = k;
    }
    out
}

#[test]
fn insert_grow_iterate() {
    // dense integer keys land in the array part, in order
    let mut rt = rt();
    let t = rt.g.new_table().unwrap();
    for i in 1..=16 {
        rt.g.table_set_int(t, i, Value::Number(i as f64)).unwrap();
    }
    assert_eq!(rt.g.table_len(t), 16);
    assert_eq!(rt.g.heap.tables[t].array_size(), 16);
    assert_eq!(rt.g.heap.tables[t].hash_size(), 0);

    let entries = iter_entries(&rt, t);
    assert_eq!(entries.len(), 16);
    for (i, (k, v)) in entries.iter().enumerate() {
        assert_eq!(k.as_number(), Some((i + 1) as f64));
        assert_eq!(v.as_number(), Some((i + 1) as f64));
    }
}

#[test]
fn sparse_integer_key_stays_in_hash() {
    let mut rt = rt();
    let t = rt.g.new_table().unwrap();
    let v = rt.g.new_string(b"x").unwrap();
    rt.g.table_set_int(t, 1_000_000, v).unwrap();
    assert_eq!(rt.g.heap.tables[t].array_size(), 0);
    assert_eq!(rt.g.heap.tables[t].hash_size(), 1);
    assert_eq!(
        rt.g.str_bytes(&rt.g.table_get_int(t, 1_000_000)),
        Some(&b"x"[..])
    );
    assert_eq!(rt.g.table_len(t), 0);
}

#[test]
fn colliding_string_chain_keeps_invariant() {
    let mut rt = rt();
    let seed = rt.g.seed;

    // find 8 short strings that share a main position at every table size
    // up to 64 nodes, computed from this runtime's actual seed
    let mut groups: HashMap<u32, Vec<String>> = HashMap::new();
    let mut chosen: Vec<String> = Vec::new();
    for i in 0..1_000_000 {
        let s = format!("c{i}");
        let bucket = str_hash(s.as_bytes(), seed) % 64;
        let group = groups.entry(bucket).or_default();
        group.push(s);
        if group.len() == 8 {
            chosen = group.clone();
            break;
        }
    }
    assert_eq!(chosen.len(), 8, "collision search exhausted");

    let t = rt.g.new_table().unwrap();
    for (i, s) in chosen.iter().enumerate() {
        let key = rt.g.new_string(s.as_bytes()).unwrap();
        rt.g.table_set(t, &key, Value::Number(i as f64)).unwrap();
        assert_collision_invariant(&rt, t);
    }
    // every key still resolves after all the displacement
    for (i, s) in chosen.iter().enumerate() {
        let key = rt.g.new_string(s.as_bytes()).unwrap();
        assert_eq!(rt.g.table_get(t, &key).as_number(), Some(i as f64));
    }
}

#[test]
fn delete_and_reinsert() {
    let mut rt = rt();
    let t = rt.g.new_table().unwrap();
    let a = rt.g.new_string(b"a").unwrap();
    let b = rt.g.new_string(b"b").unwrap();
    let c = rt.g.new_string(b"c").unwrap();
    rt.g.table_set(t, &a, Value::Number(1.0)).unwrap();
    rt.g.table_set(t, &b, Value::Number(2.0)).unwrap();
    rt.g.table_set(t, &c, Value::Number(3.0)).unwrap();

    rt.g.table_set(t, &b, Value::Nil).unwrap();
    assert!(rt.g.table_get(t, &b).is_nil());

    let keys: Vec<Vec<u8>> = iter_entries(&rt, t)
        .iter()
        .map(|(k, _)| rt.g.str_bytes(k).unwrap().to_vec())
        .collect();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&b"a".to_vec()));
    assert!(keys.contains(&b"c".to_vec()));

    rt.g.table_set(t, &b, Value::Number(20.0)).unwrap();
    assert_eq!(rt.g.table_get(t, &b).as_number(), Some(20.0));
}

#[test]
fn rehash_under_allocation_pressure() {
    // an allocator that refuses to grow past a small budget
    let mut rt = Runtime::with_allocator(
        Box::new(SystemAllocator::new(64 * 1024)),
        Config::default(),
    )
    .expect("runtime fits the budget");
    let t = rt.g.new_table().unwrap();

    let mut inserted: i64 = 0;
    let failure = loop {
        match rt
            .g
            .table_set_int(t, inserted + 1, Value::Number(inserted as f64))
        {
            Ok(()) => inserted += 1,
            Err(e) => break e,
        }
        assert!(inserted < 1_000_000, "budget never exhausted");
    };
    assert!(matches!(failure, VmError::OutOfMemory));
    assert!(inserted > 0);
    // the emergency collection was attempted before giving up
    assert!(rt.g.gc.emergency_runs() > 0);

    // every previously inserted key is still there, exactly once
    for i in 1..=inserted {
        assert_eq!(
            rt.g.table_get_int(t, i).as_number(),
            Some((i - 1) as f64),
            "key {i} lost after failed growth"
        );
    }
    assert_eq!(iter_entries(&rt, t).len(), inserted as usize);
}

#[test]
fn array_density_after_rehash() {
    // after a rehash, at least half of the array part is populated
    let mut rt = rt();
    let t = rt.g.new_table().unwrap();
    for i in [1i64, 2, 3, 5, 9, 17, 33, 40, 41, 42] {
        rt.g.table_set_int(t, i, Value::Boolean(true)).unwrap();
    }
    let asize = rt.g.heap.tables[t].array_size();
    if asize > 0 {
        let live = (1..=asize as i64)
            .filter(|&i| !rt.g.table_get_int(t, i).is_nil())
            .count();
        assert!(
            live * 2 >= asize,
            "array part {asize} with only {live} live slots"
        );
    }
}

#[test]
fn iteration_visits_each_entry_once() {
    let mut rt = rt();
    let t = rt.g.new_table().unwrap();
    for i in 1..=40 {
        rt.g.table_set_int(t, i * 7, Value::Number(i as f64)).unwrap();
    }
    let mut seen = std::collections::HashSet::new();
    let mut key = Value::Nil;
    while let Some((k, _)) = rt.g.table_next(t, &key).unwrap() {
        let kk = k.as_number().unwrap() as i64;
        assert!(seen.insert(kk), "key {kk} visited twice");
        // updating existing keys mid-iteration is allowed
        rt.g.table_set(t, &k, Value::Number(-1.0)).unwrap();
        key = k;
    }
    assert_eq!(seen.len(), 40);
    for i in 1..=40i64 {
        assert_eq!(rt.g.table_get_int(t, i * 7).as_number(), Some(-1.0));
    }
}

#[test]
fn mixed_key_types_round_trip() {
    let mut rt = rt();
    let t = rt.g.new_table().unwrap();
    let s = rt.g.new_string(b"name").unwrap();
    let long = rt.g.new_string(&[b'y'; 100]).unwrap();
    let keys = [
        s,
        long,
        Value::Boolean(true),
        Value::Boolean(false),
        Value::Number(2.5),
        Value::LightUserdata(0x1000),
    ];
    for (i, k) in keys.iter().enumerate() {
        rt.g.table_set(t, k, Value::Number(i as f64)).unwrap();
    }
    for (i, k) in keys.iter().enumerate() {
        assert_eq!(rt.g.table_get(t, k).as_number(), Some(i as f64));
    }
    // a long string with equal content is an equal key
    let long2 = rt.g.new_string(&[b'y'; 100]).unwrap();
    assert_eq!(rt.g.table_get(t, &long2).as_number(), Some(1.0));
}

#[test]
fn accounting_balances_over_table_lifetime() {
    let mut rt = rt();
    let before = rt.g.mem.total_bytes();
    let t = rt.g.new_table().unwrap();
    for i in 1..=100 {
        rt.g.table_set_int(t, i, Value::Number(i as f64)).unwrap();
    }
    assert!(rt.g.mem.total_bytes() > before);
    rt.g.free_table(t);
    assert_eq!(rt.g.mem.total_bytes(), before);
    rt.close(); // teardown re-checks that the ledger drains completely
}
