// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 funcvm contributors

//! Object arena and string interning (C1).
//!
//! The original implementation threads every allocated object onto a
//! singly linked intrusive list so teardown can walk and free it. A
//! `Vec<Object>` gives the same "every live object is reachable from one
//! place, exactly once" invariant without a raw self-referential chain:
//! objects are appended, never removed, and dropped in one shot when the
//! arena itself is dropped.

#[cfg(test)]
mod arena_test;

use crate::object::{BasicFunction, NativeFunction, Object, StrObject};
use crate::table::Table;
use crate::types::ObjectId;

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1a hash over a byte sequence, per spec.
#[must_use]
pub fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Owns every heap object ever allocated by a VM.
pub struct Arena {
    objects: Vec<Object>,
    strings: Table,
}

impl Arena {
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            strings: Table::new(),
        }
    }

    fn alloc(&mut self, object: Object) -> ObjectId {
        let id = ObjectId::new(self.objects.len());
        self.objects.push(object);
        id
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> &Object {
        &self.objects[id.index()]
    }

    pub fn get_mut(&mut self, id: ObjectId) -> &mut Object {
        &mut self.objects[id.index()]
    }

    /// Intern a byte sequence, returning the unique `StrObject` for it.
    ///
    /// Probes the string table by hash, length and content; on a miss,
    /// allocates a new `StrObject` and registers it keyed and valued by
    /// itself.
    pub fn intern(&mut self, chars: &str) -> ObjectId {
        let hash = fnv1a(chars.as_bytes());

        if let Some(existing) = self.strings.find_string(&self.objects, hash, chars) {
            return existing;
        }

        let id = self.alloc(Object::Str(StrObject {
            bytes: chars.into(),
            hash,
        }));
        self.strings.set(id, hash, Some(id));
        id
    }

    pub fn alloc_basic_function(&mut self, function: BasicFunction) -> ObjectId {
        self.alloc(Object::Basic(function))
    }

    pub fn alloc_native_function(&mut self, function: NativeFunction) -> ObjectId {
        self.alloc(Object::Native(function))
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}
