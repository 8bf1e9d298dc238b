// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

use std::collections::HashMap;

use proptest::prelude::*;

use super::Table;
use crate::types::ObjectId;

fn key(i: usize) -> ObjectId {
    ObjectId::new(i)
}

#[test]
fn set_then_get_round_trips() {
    let mut table = Table::new();
    let k = key(1);
    table.set(k, 42, Some(key(2)));
    assert_eq!(table.get(k, 42), Some(Some(key(2))));
}

#[test]
fn get_on_empty_table_is_none() {
    let table = Table::new();
    assert_eq!(table.get(key(0), 0), None);
}

#[test]
fn delete_turns_the_slot_into_a_tombstone_that_probing_still_passes() {
    let mut table = Table::new();
    // Same hash, different keys: forces both into the same probe chain.
    table.set(key(1), 5, Some(None));
    table.set(key(2), 5, Some(None));
    assert!(table.delete(key(1), 5));
    // key(2) must still be reachable even though key(1)'s slot came first.
    assert_eq!(table.get(key(2), 5), Some(Some(None)));
}

#[test]
fn overwriting_an_existing_key_reports_no_new_entry() {
    let mut table = Table::new();
    let k = key(7);
    assert!(table.set(k, 9, None));
    assert!(!table.set(k, 9, Some(key(0))));
    assert_eq!(table.get(k, 9), Some(Some(key(0))));
}

#[test]
fn growth_preserves_every_live_entry() {
    let mut table = Table::new();
    for i in 0..200 {
        table.set(key(i), i as u32, Some(key(i)));
    }
    for i in 0..200 {
        assert_eq!(table.get(key(i), i as u32), Some(Some(key(i))));
    }
}

#[derive(Debug, Clone)]
enum Op {
    Set(usize, FuncRefSpec),
    Delete(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FuncRefSpec(Option<usize>);

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..16, proptest::option::of(0usize..16))
            .prop_map(|(k, v)| Op::Set(k, FuncRefSpec(v))),
        (0usize..16).prop_map(Op::Delete),
    ]
}

proptest! {
    #[test]
    fn matches_a_hashmap_oracle(ops in proptest::collection::vec(op_strategy(), 0..200)) {
        let mut table = Table::new();
        let mut oracle: HashMap<usize, FuncRefSpec> = HashMap::new();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    table.set(key(k), k as u32, v.0.map(key));
                    oracle.insert(k, v);
                }
                Op::Delete(k) => {
                    table.delete(key(k), k as u32);
                    oracle.remove(&k);
                }
            }
        }

        for k in 0..16 {
            let expected = oracle.get(&k).map(|v| v.0.map(key));
            let actual = table.get(key(k), k as u32);
            prop_assert_eq!(actual, expected);
        }
    }
}
