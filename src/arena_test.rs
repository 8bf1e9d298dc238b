// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

use proptest::prelude::*;

use super::Arena;
use crate::object::Object;

#[test]
fn interning_the_same_text_twice_returns_the_same_id() {
    let mut arena = Arena::new();
    let a = arena.intern("hello");
    let b = arena.intern("hello");
    assert_eq!(a, b);
}

#[test]
fn interning_different_text_returns_different_ids() {
    let mut arena = Arena::new();
    let a = arena.intern("hello");
    let b = arena.intern("world");
    assert_ne!(a, b);
}

#[test]
fn interned_string_preserves_its_bytes() {
    let mut arena = Arena::new();
    let id = arena.intern("roundtrip");
    let Object::Str(s) = arena.get(id) else {
        panic!("expected a Str object");
    };
    assert_eq!(s.as_str(), "roundtrip");
}

proptest! {
    #[test]
    fn intern_is_idempotent_for_arbitrary_strings(s in "\\PC{0,32}") {
        let mut arena = Arena::new();
        let a = arena.intern(&s);
        let b = arena.intern(&s);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn distinct_strings_intern_to_distinct_ids(s in "\\PC{1,16}", t in "\\PC{1,16}") {
        prop_assume!(s != t);
        let mut arena = Arena::new();
        let a = arena.intern(&s);
        let b = arena.intern(&t);
        prop_assert_ne!(a, b);
    }
}
