// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

//! Open-addressed hash table with linear probing and tombstones (C2).
//!
//! Used for the string intern table, the VM's globals, and each call
//! frame's locals. Keys are interned strings compared by identity; the
//! hash used for probing is the key's own precomputed FNV-1a hash, so
//! callers that already hold a key's hash (every caller here does, since
//! it came from [`crate::arena::Arena::intern`]) pass it in rather than
//! have the table look the key back up in the arena.

#[cfg(test)]
mod table_test;

use tracing::trace;

use crate::object::Object;
use crate::types::{FuncRef, ObjectId};

const INITIAL_CAPACITY: usize = 8;
const MAX_LOAD: f64 = 0.75;

enum Slot {
    Empty,
    Tombstone,
    Occupied {
        key: ObjectId,
        hash: u32,
        value: FuncRef,
    },
}

/// A name-to-function map with open addressing.
///
/// The original C encodes "empty" and "tombstone" as two states of the
/// same `(key, value)` pair (`key == NULL` with `value` as the
/// discriminator). Modeling slots as a three-way `enum` makes that
/// distinction a type-level invariant instead of a convention callers
/// have to uphold by hand.
pub struct Table {
    slots: Vec<Slot>,
    /// Occupied entries plus tombstones, matching the original's `count`
    /// field (used for the load-factor check, not for `get`'s early-out).
    count: usize,
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            count: 0,
        }
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn find_slot(slots: &[Slot], capacity: usize, key: ObjectId, hash: u32) -> usize {
        let mut index = (hash as usize) % capacity;
        let mut tombstone = None;

        loop {
            match &slots[index] {
                Slot::Empty => return tombstone.unwrap_or(index),
                Slot::Tombstone => {
                    if tombstone.is_none() {
                        tombstone = Some(index);
                    }
                }
                Slot::Occupied { key: k, .. } if *k == key => return index,
                Slot::Occupied { .. } => {}
            }

            index = (index + 1) % capacity;
        }
    }

    fn grow(&mut self, new_capacity: usize) {
        trace!(old_capacity = self.capacity(), new_capacity, "growing table");
        let mut new_slots = Vec::with_capacity(new_capacity);
        new_slots.resize_with(new_capacity, || Slot::Empty);

        let mut new_count = 0;
        for slot in &self.slots {
            if let Slot::Occupied { key, hash, value } = slot {
                let index = Self::find_slot(&new_slots, new_capacity, *key, *hash);
                new_slots[index] = Slot::Occupied {
                    key: *key,
                    hash: *hash,
                    value: *value,
                };
                new_count += 1;
            }
        }

        self.slots = new_slots;
        self.count = new_count;
    }

    /// Insert or overwrite `key`'s binding. `hash` must be the key
    /// string's own FNV-1a hash. Returns `true` if this created a new
    /// entry rather than overwriting one.
    pub fn set(&mut self, key: ObjectId, hash: u32, value: FuncRef) -> bool {
        if self.capacity() == 0 || (self.count + 1) as f64 > self.capacity() as f64 * MAX_LOAD {
            let new_capacity = if self.capacity() < INITIAL_CAPACITY {
                INITIAL_CAPACITY
            } else {
                self.capacity() * 2
            };
            self.grow(new_capacity);
        }

        let index = Self::find_slot(&self.slots, self.capacity(), key, hash);
        let is_new = !matches!(self.slots[index], Slot::Occupied { .. });

        if is_new && matches!(self.slots[index], Slot::Empty) {
            self.count += 1;
        }

        self.slots[index] = Slot::Occupied { key, hash, value };
        is_new
    }

    /// Look up `key`. Returns `None` if no binding exists; otherwise
    /// `Some(value)` — note `value` is itself a `FuncRef` that may be
    /// the null reference, which is a legitimate bound value.
    #[must_use]
    pub fn get(&self, key: ObjectId, hash: u32) -> Option<FuncRef> {
        if self.capacity() == 0 {
            return None;
        }

        let index = Self::find_slot(&self.slots, self.capacity(), key, hash);
        match self.slots[index] {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Empty | Slot::Tombstone => None,
        }
    }

    /// Turn `key`'s slot into a tombstone so later probes keep walking
    /// past it. Does not decrement `count`.
    pub fn delete(&mut self, key: ObjectId, hash: u32) -> bool {
        if self.capacity() == 0 {
            return false;
        }

        let index = Self::find_slot(&self.slots, self.capacity(), key, hash);
        if matches!(self.slots[index], Slot::Occupied { .. }) {
            self.slots[index] = Slot::Tombstone;
            true
        } else {
            false
        }
    }

    /// Specialized probe used only by interning: compares candidate keys
    /// by length, hash and byte content rather than by identity, since
    /// identity is exactly what interning is establishing.
    #[must_use]
    pub fn find_string(&self, objects: &[Object], hash: u32, chars: &str) -> Option<ObjectId> {
        if self.capacity() == 0 {
            return None;
        }

        let mut index = (hash as usize) % self.capacity();

        loop {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied { key, hash: h, .. } if *h == hash => {
                    if let Object::Str(s) = &objects[key.index()] {
                        if s.as_str() == chars {
                            return Some(*key);
                        }
                    }
                }
                Slot::Occupied { .. } | Slot::Tombstone => {}
            }

            index = (index + 1) % self.capacity();
        }
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
