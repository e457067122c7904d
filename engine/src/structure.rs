// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hidden classes (`spec.md` §3 "Structure", §4.2).
//!
//! A [`Structure`] is a shared, (usually) immutable ordered map from
//! property name to `(slot, descriptor)`, plus a transition table used to
//! share layouts between objects that gain properties in the same order.
//! No single teacher file implements this directly (`nova_vm` gives every
//! object its own `PropertyKeyVec` instead of sharing layouts) — this
//! module is grounded in `spec.md` §4.2 directly, built in the teacher's
//! idiom: an `ahash`-backed side table for fast lookup above a small-size
//! threshold, following the shape of
//! `ecmascript/types/language/object/property_key_set.rs`.

use crate::object::property_key::PropertyKey;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Side-hash threshold above which `lookup` switches from a linear scan to
/// the `index` map (`spec.md` §4.2).
const HASH_THRESHOLD: usize = 8;

/// Compact per-slot attribute bitset (`spec.md` §3 "PropertyDescriptor
/// (in-structure)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotAttributes {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
    pub is_accessor: bool,
}

impl SlotAttributes {
    pub const DATA_DEFAULT: SlotAttributes = SlotAttributes {
        writable: true,
        enumerable: true,
        configurable: true,
        is_accessor: false,
    };

    pub const ACCESSOR_DEFAULT: SlotAttributes = SlotAttributes {
        writable: false,
        enumerable: true,
        configurable: true,
        is_accessor: true,
    };
}

#[derive(Debug, Clone)]
struct Entry {
    key: PropertyKey,
    attrs: SlotAttributes,
}

#[derive(Debug)]
struct StructureInner {
    properties: Vec<Entry>,
    index: Option<AHashMap<PropertyKey, u32>>,
    transitions: AHashMap<(PropertyKey, SlotAttributes), Rc<RefCell<StructureInner>>>,
    in_transition_mode: bool,
}

impl StructureInner {
    fn rebuild_index(&mut self) {
        if self.properties.len() >= HASH_THRESHOLD {
            let mut map = AHashMap::with_capacity(self.properties.len());
            for (i, e) in self.properties.iter().enumerate() {
                map.insert(e.key.clone(), i as u32);
            }
            self.index = Some(map);
        }
    }

    fn lookup(&self, key: &PropertyKey) -> Option<u32> {
        if let Some(map) = &self.index {
            return map.get(key).copied();
        }
        self.properties
            .iter()
            .position(|e| &e.key == key)
            .map(|i| i as u32)
    }
}

/// A hidden class. Cheap to clone (`Rc`); equality is reference identity,
/// which is exactly what inline caches key on (`spec.md` §4.2 "Inline
/// caches are keyed on `structure_id`").
#[derive(Debug, Clone)]
pub struct Structure(Rc<RefCell<StructureInner>>);

impl PartialEq for Structure {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Structure {}

impl Default for Structure {
    fn default() -> Self {
        Structure::empty()
    }
}

impl Structure {
    pub fn empty() -> Structure {
        Structure(Rc::new(RefCell::new(StructureInner {
            properties: Vec::new(),
            index: None,
            transitions: AHashMap::new(),
            in_transition_mode: true,
        })))
    }

    /// A stable identity for inline-cache comparisons.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn slot_count(&self) -> usize {
        self.0.borrow().properties.len()
    }

    pub fn lookup(&self, key: &PropertyKey) -> Option<u32> {
        self.0.borrow().lookup(key)
    }

    pub fn attributes_at(&self, slot: u32) -> SlotAttributes {
        self.0.borrow().properties[slot as usize].attrs
    }

    pub fn key_at(&self, slot: u32) -> PropertyKey {
        self.0.borrow().properties[slot as usize].key.clone()
    }

    pub fn own_keys_in_order(&self) -> Vec<PropertyKey> {
        let inner = self.0.borrow();
        let mut indices: Vec<u32> = (0..inner.properties.len() as u32).collect();
        indices.sort_by_key(|i| {
            let key = &inner.properties[*i as usize].key;
            match key {
                PropertyKey::Index(n) => (0u8, *n as u64, 0u64),
                // Preserve insertion order among string keys by using the
                // slot index itself as the secondary sort key.
                PropertyKey::String(_) => (1u8, 0u64, *i as u64),
            }
        });
        indices
            .into_iter()
            .map(|i| inner.properties[i as usize].key.clone())
            .collect()
    }

    /// `add(name, attrs) -> Structure`: follows an existing transition edge
    /// or allocates a new successor and installs the edge (`spec.md` §4.2).
    /// If `self` is already in fast-access mode, the new property is
    /// appended in place instead (transitions never apply to fast-access
    /// structures, matching "leaving transition mode switches to in-place
    /// mutation").
    pub fn add(&self, key: PropertyKey, attrs: SlotAttributes) -> Structure {
        let in_transition = self.0.borrow().in_transition_mode;
        if !in_transition {
            self.0.borrow_mut().properties.push(Entry {
                key,
                attrs,
            });
            self.0.borrow_mut().rebuild_index();
            return self.clone();
        }

        if let Some(target) = self.0.borrow().transitions.get(&(key.clone(), attrs)) {
            return Structure(target.clone());
        }

        let mut new_properties = self.0.borrow().properties.clone();
        new_properties.push(Entry {
            key: key.clone(),
            attrs,
        });
        let mut new_inner = StructureInner {
            properties: new_properties,
            index: None,
            transitions: AHashMap::new(),
            in_transition_mode: true,
        };
        new_inner.rebuild_index();
        let new_rc = Rc::new(RefCell::new(new_inner));
        self.0.borrow_mut().transitions.insert((key, attrs), new_rc.clone());
        Structure(new_rc)
    }

    /// `remove(name) -> Structure`: always produces a non-shared,
    /// fast-access structure (transitions would explode combinatorially).
    pub fn remove(&self, key: &PropertyKey) -> Structure {
        let mut properties: Vec<Entry> = self
            .0
            .borrow()
            .properties
            .iter()
            .filter(|e| &e.key != key)
            .cloned()
            .collect();
        properties.shrink_to_fit();
        let mut inner = StructureInner {
            properties,
            index: None,
            transitions: AHashMap::new(),
            in_transition_mode: false,
        };
        inner.rebuild_index();
        Structure(Rc::new(RefCell::new(inner)))
    }

    /// `change_attributes(slot, new) -> Structure`: same non-shared,
    /// fast-access contract as `remove`.
    pub fn change_attributes(&self, slot: u32, attrs: SlotAttributes) -> Structure {
        let mut properties = self.0.borrow().properties.clone();
        properties[slot as usize].attrs = attrs;
        let mut inner = StructureInner {
            properties,
            index: None,
            transitions: AHashMap::new(),
            in_transition_mode: false,
        };
        inner.rebuild_index();
        Structure(Rc::new(RefCell::new(inner)))
    }

    /// Leaves transition mode. If this structure is still shared (strong
    /// count > 1, i.e. more than the caller's own handle), returns a
    /// private fast-access clone instead of mutating the shared one —
    /// otherwise a later in-place edit would corrupt sibling objects that
    /// still point at the same layout.
    pub fn convert_to_fast_access(&self) -> Structure {
        if Rc::strong_count(&self.0) > 1 {
            let properties = self.0.borrow().properties.clone();
            let mut inner = StructureInner {
                properties,
                index: None,
                transitions: AHashMap::new(),
                in_transition_mode: false,
            };
            inner.rebuild_index();
            return Structure(Rc::new(RefCell::new(inner)));
        }
        self.0.borrow_mut().in_transition_mode = false;
        self.0.borrow_mut().transitions.clear();
        self.clone()
    }

    pub fn is_in_transition_mode(&self) -> bool {
        self.0.borrow().in_transition_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PropertyKey {
        PropertyKey::from_str(s)
    }

    #[test]
    fn identical_add_sequences_share_structure() {
        let root = Structure::empty();
        let a1 = root.add(key("x"), SlotAttributes::DATA_DEFAULT);
        let a2 = root.add(key("x"), SlotAttributes::DATA_DEFAULT);
        assert_eq!(a1, a2);
        assert_eq!(a1.slot_count(), 1);
    }

    #[test]
    fn divergent_sequences_produce_distinct_structures() {
        let root = Structure::empty();
        let a = root.add(key("x"), SlotAttributes::DATA_DEFAULT);
        let b = root.add(key("y"), SlotAttributes::DATA_DEFAULT);
        assert_ne!(a, b);
    }

    #[test]
    fn remove_never_shares_a_transition() {
        let root = Structure::empty();
        let a = root.add(key("x"), SlotAttributes::DATA_DEFAULT);
        let b = a.add(key("y"), SlotAttributes::DATA_DEFAULT);
        let c = b.remove(&key("x"));
        assert_eq!(c.slot_count(), 1);
        assert!(!c.is_in_transition_mode());
    }

    #[test]
    fn lookup_above_threshold_uses_index() {
        let mut s = Structure::empty();
        for i in 0..16 {
            s = s.add(key(&format!("p{i}")), SlotAttributes::DATA_DEFAULT);
        }
        assert_eq!(s.lookup(&key("p15")), Some(15));
        assert!(s.0.borrow().index.is_some());
    }
}
