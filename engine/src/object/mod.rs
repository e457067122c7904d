// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The ordinary object representation (`spec.md` §3 "Object", §4.3).
//!
//! An [`Object`] pairs a [`Structure`] (the shared layout) with a flat
//! `Vec<Slot>` of per-object storage; the structure's slot index is the
//! vector index. `spec.md` §4.3 calls for array fast-paths and a RegExp
//! builtin kind to live alongside the ordinary shape, so `Object` carries an
//! [`ObjectKind`] the way `ecmascript/types/language/object.rs`'s `Object`
//! heap data is really a family of specialized records (`ArrayHeapData`,
//! `RegExpHeapData`, ...) behind one `Value::Object` tag — collapsed here
//! into a single struct with a kind enum rather than nova's per-kind heap
//! vector, since this crate has one GC (the `gc` crate) rather than an
//! arena-indexed heap.

pub mod internal_methods;
pub mod property_descriptor;
pub mod property_key;

pub use property_key::PropertyKey;

use crate::structure::{SlotAttributes, Structure};
use crate::value::{JsString, Value};
use gc::{Finalize, Gc, GcCell, GcCellRef, GcCellRefMut, Trace};
use std::cell::Cell;
use std::rc::Rc;

thread_local! {
    static NEXT_OBJECT_ID: Cell<u64> = const { Cell::new(1) };
}

fn next_object_id() -> u64 {
    NEXT_OBJECT_ID.with(|c| {
        let id = c.get();
        c.set(id + 1);
        id
    })
}

/// A single object's storage cell. Shared structures mean two objects can
/// point at the same [`Structure`] while each keeps its own `values` vector.
///
/// A thin newtype over `Gc<GcCell<Object>>` rather than a bare alias: `gc`'s
/// `Gc<T>` derives `PartialEq` by comparing the pointee, which is wrong for
/// object identity (`===`, inline-cache keys, `Map`/`Set` keying all need
/// "same object", not "structurally equal object"). `Object::id` is the
/// identity this type compares on.
#[derive(Clone, Trace, Finalize)]
pub struct ObjectHandle(pub Gc<GcCell<Object>>);

impl ObjectHandle {
    pub fn new(obj: Object) -> ObjectHandle {
        ObjectHandle(Gc::new(GcCell::new(obj)))
    }

    pub fn borrow(&self) -> GcCellRef<'_, Object> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> GcCellRefMut<'_, Object> {
        self.0.borrow_mut()
    }
}

impl std::fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ObjectHandle").field(&self.0.borrow().id).finish()
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.borrow().id == other.0.borrow().id
    }
}
impl Eq for ObjectHandle {}

impl std::hash::Hash for ObjectHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.borrow().id.hash(state);
    }
}

/// A native function callback (`spec.md` §6 "native function callback
/// signature"). Not traced: a native function must not close over `Gc`
/// values that are otherwise unreachable, the same restriction
/// `ecmascript/builtins/Behaviour` imposes on Escargot's native callbacks.
pub type NativeFunction = Rc<dyn Fn(&mut crate::agent::Agent, Value, &[Value]) -> crate::error::JsResult<Value>>;

/// A slot's content: a plain data value, or an accessor pair. Mirrors the
/// structure-level `is_accessor` flag in `SlotAttributes`.
#[derive(Clone, Trace, Finalize)]
pub enum Slot {
    Data(Value),
    Accessor { get: Value, set: Value },
}

impl Slot {
    pub fn data(&self) -> Option<&Value> {
        match self {
            Slot::Data(v) => Some(v),
            Slot::Accessor { .. } => None,
        }
    }
}

/// Dense/sparse split for `Array` exotic objects (`spec.md` §4.3, §11
/// "array hole / fast-sparse split" supplemented from Escargot's
/// `ArrayObject.cpp`). Indices below `dense.len()` live in `dense`
/// (`Value::Empty` marking a hole); anything at or beyond that, or any
/// index that would make `dense` pathologically sparse, is demoted into
/// `overflow`.
#[derive(Clone, Trace, Finalize)]
pub struct ArrayStorage {
    pub dense: Vec<Value>,
    pub overflow: std::collections::BTreeMap<u32, Value>,
    pub length: u32,
}

impl ArrayStorage {
    /// Above this occupancy ratio, a sparse access pattern stops being
    /// worth a dense `Vec` and new high indices fall into `overflow`.
    const MAX_DENSE_HOLE_RATIO: f64 = 4.0;

    pub fn new() -> ArrayStorage {
        ArrayStorage {
            dense: Vec::new(),
            overflow: std::collections::BTreeMap::new(),
            length: 0,
        }
    }

    pub fn get(&self, index: u32) -> Option<&Value> {
        if (index as usize) < self.dense.len() {
            let v = &self.dense[index as usize];
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        } else {
            self.overflow.get(&index)
        }
    }

    /// Whether `index` should be demoted straight into `overflow` instead of
    /// growing `dense` up to it.
    pub fn should_go_sparse(&self, index: u32) -> bool {
        let would_be_len = index as usize + 1;
        would_be_len > 1024 && would_be_len as f64 > (self.dense.len() as f64 + 1.0) * Self::MAX_DENSE_HOLE_RATIO
    }

    pub fn set_dense(&mut self, index: u32, value: Value) {
        let idx = index as usize;
        if idx >= self.dense.len() {
            self.dense.resize(idx + 1, Value::Empty);
        }
        self.dense[idx] = value;
        if index >= self.length {
            self.length = index + 1;
        }
    }

    pub fn set_overflow(&mut self, index: u32, value: Value) {
        self.overflow.insert(index, value);
        if index >= self.length {
            self.length = index + 1;
        }
    }

    pub fn delete(&mut self, index: u32) {
        if (index as usize) < self.dense.len() {
            self.dense[index as usize] = Value::Empty;
        } else {
            self.overflow.remove(&index);
        }
    }

    /// All present (non-hole) indices in ascending order, as `[[OwnPropertyKeys]]`
    /// requires for integer-indexed keys.
    pub fn present_indices(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self
            .dense
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_empty())
            .map(|(i, _)| i as u32)
            .collect();
        indices.extend(self.overflow.keys().copied());
        indices
    }
}

impl Default for ArrayStorage {
    fn default() -> Self {
        ArrayStorage::new()
    }
}

/// Compiled-regex cache key plus the user-observable flag/source state
/// (`spec.md` §4.7 supplemental). The compiled `regex::Regex` itself lives
/// in the agent's regex cache, keyed by `(source, flags)`, not here —
/// cloning a `RegExpObject` (e.g. via structured operations) must not
/// require recompiling.
#[derive(Clone, Trace, Finalize)]
pub struct RegExpData {
    #[unsafe_ignore_trace]
    pub source: Rc<str>,
    #[unsafe_ignore_trace]
    pub flags: Rc<str>,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub sticky: bool,
    pub unicode: bool,
}

/// A function object's callable behavior (`spec.md` §4.6 "closures").
#[derive(Clone, Trace, Finalize)]
pub enum FunctionData {
    Native {
        #[unsafe_ignore_trace]
        name: Rc<str>,
        #[unsafe_ignore_trace]
        behavior: NativeFunction,
        length: u32,
    },
    Bytecode {
        #[unsafe_ignore_trace]
        block: Rc<crate::bytecode::block::BytecodeBlock>,
        environment: crate::environment::EnvironmentHandle,
        #[unsafe_ignore_trace]
        name: Rc<str>,
        length: u32,
    },
}

impl FunctionData {
    pub fn name(&self) -> &str {
        match self {
            FunctionData::Native { name, .. } => name,
            FunctionData::Bytecode { name, .. } => name,
        }
    }

    pub fn length(&self) -> u32 {
        match self {
            FunctionData::Native { length, .. } => *length,
            FunctionData::Bytecode { length, .. } => *length,
        }
    }
}

/// Data that only a minority of objects need, kept out of the common
/// `Object` struct to avoid growing every ordinary object's footprint.
#[derive(Clone, Trace, Finalize)]
pub enum ObjectRareData {
    Array(ArrayStorage),
    Function(FunctionData),
    RegExp(RegExpData),
    StringWrapper(Gc<JsString>),
    NumberWrapper(f64),
    BooleanWrapper(bool),
    /// The object's own bound `[[ErrorData]]` marker; message/stack live in
    /// ordinary slots.
    Error,
}

#[derive(Clone, Trace, Finalize)]
pub struct Object {
    #[unsafe_ignore_trace]
    pub id: u64,
    #[unsafe_ignore_trace]
    pub structure: Structure,
    pub values: Vec<Slot>,
    pub prototype: Option<ObjectHandle>,
    pub extensible: bool,
    pub rare: Option<Box<ObjectRareData>>,
}

impl Object {
    pub fn new(prototype: Option<ObjectHandle>) -> Object {
        Object {
            id: next_object_id(),
            structure: Structure::empty(),
            values: Vec::new(),
            prototype,
            extensible: true,
            rare: None,
        }
    }

    pub fn new_with_kind(prototype: Option<ObjectHandle>, rare: ObjectRareData) -> Object {
        Object {
            id: next_object_id(),
            structure: Structure::empty(),
            values: Vec::new(),
            prototype,
            extensible: true,
            rare: Some(Box::new(rare)),
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.rare.as_deref(), Some(ObjectRareData::Function(_)))
    }

    pub fn as_array(&self) -> Option<&ArrayStorage> {
        match self.rare.as_deref() {
            Some(ObjectRareData::Array(a)) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ArrayStorage> {
        match self.rare.as_deref_mut() {
            Some(ObjectRareData::Array(a)) => Some(a),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionData> {
        match self.rare.as_deref() {
            Some(ObjectRareData::Function(f)) => Some(f),
            _ => None,
        }
    }

    pub fn as_regexp(&self) -> Option<&RegExpData> {
        match self.rare.as_deref() {
            Some(ObjectRareData::RegExp(r)) => Some(r),
            _ => None,
        }
    }

    /// Raw slot storage lookup — does not walk the prototype chain or run
    /// accessors; see `internal_methods::get` for the full `[[Get]]`.
    pub fn get_own_slot(&self, key: &PropertyKey) -> Option<(&Slot, SlotAttributes)> {
        let index = self.structure.lookup(key)?;
        Some((&self.values[index as usize], self.structure.attributes_at(index)))
    }

    pub fn own_keys_in_order(&self) -> Vec<PropertyKey> {
        self.structure.own_keys_in_order()
    }

    /// Adds a brand-new own data property, following a structure transition.
    /// Caller must ensure `key` is not already present.
    pub fn add_data_property(&mut self, key: PropertyKey, value: Value, attrs: SlotAttributes) {
        self.structure = self.structure.add(key, attrs);
        self.values.push(Slot::Data(value));
    }

    pub fn add_accessor_property(&mut self, key: PropertyKey, get: Value, set: Value, attrs: SlotAttributes) {
        self.structure = self.structure.add(key, attrs);
        self.values.push(Slot::Accessor { get, set });
    }

    /// Overwrites an existing slot's content without touching attributes.
    pub fn set_slot_value(&mut self, index: u32, slot: Slot) {
        self.values[index as usize] = slot;
    }

    pub fn delete_own(&mut self, key: &PropertyKey) {
        if let Some(index) = self.structure.lookup(key) {
            self.structure = self.structure.remove(key);
            self.values.remove(index as usize);
        }
    }

    pub fn change_attributes(&mut self, key: &PropertyKey, attrs: SlotAttributes) {
        if let Some(index) = self.structure.lookup(key) {
            self.structure = self.structure.change_attributes(index, attrs);
        }
    }
}

pub fn new_handle(obj: Object) -> ObjectHandle {
    ObjectHandle::new(obj)
}
