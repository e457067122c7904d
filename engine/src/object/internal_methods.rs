// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordinary object internal methods (`spec.md` §4.3 "Essential internal
//! methods"), grounded in ES5 §8.12 / ES6 §9.1 and laid out in the free-
//! function style `ecmascript/abstract_operations/operations_on_objects.rs`
//! uses for `Get`/`Set`/`OrdinaryDefineOwnProperty` rather than as trait
//! methods on `Object` — these need `&mut Agent` to invoke accessors, which
//! can run arbitrary script and recurse into the interpreter.

use crate::agent::Agent;
use crate::error::{ErrorKind, JsResult};
use crate::object::property_descriptor::PropertyDescriptor;
use crate::object::property_key::PropertyKey;
use crate::object::{ObjectHandle, Slot};
use crate::structure::SlotAttributes;
use crate::value::Value;

/// ### [\[\[GetOwnProperty\]\] ( P )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-getownproperty-p)
pub fn get_own_property(obj: &ObjectHandle, key: &PropertyKey) -> Option<PropertyDescriptor> {
    let o = obj.borrow();
    if let Some(array) = o.as_array() {
        if let Some(index) = key.as_index() {
            return array.get(index).map(|v| {
                PropertyDescriptor::data(v.clone(), true, true, true)
            });
        }
        if matches!(key, PropertyKey::String(s) if &**s == "length") {
            return Some(PropertyDescriptor::data(Value::number(array.length as f64), true, false, false));
        }
    }

    let (slot, attrs) = o.get_own_slot(key)?;
    Some(match slot {
        Slot::Data(v) => PropertyDescriptor::Data {
            value: Some(v.clone()),
            writable: Some(attrs.writable),
            enumerable: Some(attrs.enumerable),
            configurable: Some(attrs.configurable),
        },
        Slot::Accessor { get, set } => PropertyDescriptor::Accessor {
            get: Some(get.clone()),
            set: Some(set.clone()),
            enumerable: Some(attrs.enumerable),
            configurable: Some(attrs.configurable),
        },
    })
}

pub fn has_own_property(obj: &ObjectHandle, key: &PropertyKey) -> bool {
    get_own_property(obj, key).is_some()
}

/// ### [\[\[HasProperty\]\] ( P )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-hasproperty-p)
pub fn has_property(agent: &mut Agent, obj: &ObjectHandle, key: &PropertyKey) -> JsResult<bool> {
    let mut current = obj.clone();
    loop {
        if has_own_property(&current, key) {
            return Ok(true);
        }
        let proto = get_prototype_of(agent, &current);
        match proto {
            Some(p) => current = p,
            None => return Ok(false),
        }
    }
}

/// ### [\[\[Get\]\] ( P, Receiver )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-get-p-receiver)
pub fn get(agent: &mut Agent, obj: &ObjectHandle, key: &PropertyKey, receiver: &Value) -> JsResult<Value> {
    let mut current = obj.clone();
    loop {
        if let Some(desc) = get_own_property(&current, key) {
            return match desc {
                PropertyDescriptor::Data { value, .. } => Ok(value.unwrap_or(Value::Undefined)),
                PropertyDescriptor::Accessor { get: Some(g), .. } if !g.is_undefined() => {
                    agent.call(&g, receiver.clone(), &[])
                }
                PropertyDescriptor::Accessor { .. } => Ok(Value::Undefined),
                PropertyDescriptor::Generic { .. } => Ok(Value::Undefined),
            };
        }
        match get_prototype_of(agent, &current) {
            Some(p) => current = p,
            None => return Ok(Value::Undefined),
        }
    }
}

/// ### [\[\[Set\]\] ( P, V, Receiver )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-set-p-v-receiver)
pub fn set(agent: &mut Agent, obj: &ObjectHandle, key: &PropertyKey, value: Value, receiver: &Value) -> JsResult<bool> {
    if let Some(index) = key.as_index() {
        if obj.borrow().as_array().is_some() {
            return set_indexed(agent, obj, index, value);
        }
    }

    if let Some(own) = get_own_property(obj, key) {
        return match own {
            PropertyDescriptor::Data { writable: Some(false), .. } => Ok(false),
            PropertyDescriptor::Data { .. } => {
                if let Some(receiver_obj) = receiver.as_object() {
                    if receiver_obj == obj {
                        let index = obj.borrow().structure.lookup(key).expect("own property must have a slot");
                        obj.borrow_mut().set_slot_value(index, Slot::Data(value));
                        return Ok(true);
                    }
                }
                define_own_property(agent, receiver.as_object().unwrap_or(obj), key, PropertyDescriptor::Data {
                    value: Some(value),
                    writable: None,
                    enumerable: None,
                    configurable: None,
                })
            }
            PropertyDescriptor::Accessor { set: Some(s), .. } if !s.is_undefined() => {
                agent.call(&s, receiver.clone(), &[value])?;
                Ok(true)
            }
            PropertyDescriptor::Accessor { .. } => Ok(false),
            PropertyDescriptor::Generic { .. } => Ok(false),
        };
    }

    match get_prototype_of(agent, obj) {
        Some(parent) => set(agent, &parent, key, value, receiver),
        None => {
            if let Some(receiver_obj) = receiver.as_object() {
                define_own_property(
                    agent,
                    receiver_obj,
                    key,
                    PropertyDescriptor::data(value, true, true, true),
                )
            } else {
                Ok(false)
            }
        }
    }
}

/// ### [\[\[Delete\]\] ( P )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-delete-p)
pub fn delete(obj: &ObjectHandle, key: &PropertyKey) -> bool {
    if let Some(index) = key.as_index() {
        if obj.borrow().as_array().is_some() {
            obj.borrow_mut().as_array_mut().unwrap().delete(index);
            return true;
        }
    }
    match get_own_property(obj, key) {
        None => true,
        Some(desc) if desc.configurable() == Some(false) => false,
        Some(_) => {
            obj.borrow_mut().delete_own(key);
            true
        }
    }
}

/// ### [OrdinaryDefineOwnProperty ( O, P, Desc )](https://tc39.es/ecma262/#sec-ordinarydefineownproperty)
///
/// Implements the full ES5 §8.12.9 validation table: a configurable
/// property accepts any compatible change; a non-configurable data property
/// only accepts a `writable: true -> false` narrowing or a same-value
/// rewrite; switching between data and accessor requires configurability.
pub fn define_own_property(
    agent: &mut Agent,
    obj: &ObjectHandle,
    key: &PropertyKey,
    desc: PropertyDescriptor,
) -> JsResult<bool> {
    if let Some(index) = key.as_index() {
        if obj.borrow().as_array().is_some() {
            return define_array_index(agent, obj, index, desc);
        }
    }

    let current = get_own_property(obj, key);
    validate_and_apply_own_property(agent, obj, key, current, desc)
}

fn validate_and_apply_own_property(
    agent: &mut Agent,
    obj: &ObjectHandle,
    key: &PropertyKey,
    current: Option<PropertyDescriptor>,
    desc: PropertyDescriptor,
) -> JsResult<bool> {
    let extensible = obj.borrow().extensible;

    let Some(current) = current else {
        if !extensible {
            return Ok(false);
        }
        install_new_property(obj, key.clone(), desc);
        return Ok(true);
    };

    if current.configurable() == Some(false) {
        if desc.configurable() == Some(true) {
            return Ok(false);
        }
        if let (Some(ce), Some(de)) = (current.enumerable(), desc.enumerable()) {
            if ce != de {
                return Ok(false);
            }
        }
        if current.is_accessor() != desc.is_accessor() {
            return Ok(false);
        }
        if !current.is_accessor() {
            if let PropertyDescriptor::Data { writable: Some(false), value: Some(cur_val), .. } = &current {
                if let PropertyDescriptor::Data { writable: Some(true), .. } = &desc {
                    return Ok(false);
                }
                if let PropertyDescriptor::Data { value: Some(new_val), .. } = &desc {
                    if !crate::value::convert::strict_equals(cur_val, new_val) {
                        return Ok(false);
                    }
                }
            }
        } else if let (
            PropertyDescriptor::Accessor { get: cg, set: cs, .. },
            PropertyDescriptor::Accessor { get: dg, set: ds, .. },
        ) = (&current, &desc)
        {
            if let Some(dg) = dg {
                if !same_getter_setter(cg.as_ref(), Some(dg)) {
                    return Ok(false);
                }
            }
            if let Some(ds) = ds {
                if !same_getter_setter(cs.as_ref(), Some(ds)) {
                    return Ok(false);
                }
            }
        }
    }

    let merged = merge_descriptor(current, desc);
    overwrite_property(agent, obj, key, merged);
    Ok(true)
}

fn same_getter_setter(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => crate::value::convert::strict_equals(a, b),
        _ => false,
    }
}

/// Applies `desc`'s present fields on top of `current`, per the final
/// "set each field of current to the corresponding field of Desc" steps
/// spread across ES5 §8.12.9's branches. A data/accessor switch drops the
/// half that no longer applies instead of carrying it over as dead state.
fn merge_descriptor(current: PropertyDescriptor, desc: PropertyDescriptor) -> PropertyDescriptor {
    let enumerable = desc.enumerable().or(current.enumerable());
    let configurable = desc.configurable().or(current.configurable());

    if desc.is_accessor() {
        let PropertyDescriptor::Accessor { get, set, .. } = desc else { unreachable!() };
        let (current_get, current_set) = match &current {
            PropertyDescriptor::Accessor { get, set, .. } => (get.clone(), set.clone()),
            _ => (None, None),
        };
        return PropertyDescriptor::Accessor {
            get: get.or(current_get),
            set: set.or(current_set),
            enumerable,
            configurable,
        };
    }

    if let PropertyDescriptor::Data { value, writable, .. } = desc {
        let (current_value, current_writable) = match &current {
            PropertyDescriptor::Data { value, writable, .. } => (value.clone(), *writable),
            _ => (None, None),
        };
        return PropertyDescriptor::Data {
            value: value.or(current_value),
            writable: writable.or(current_writable),
            enumerable,
            configurable,
        };
    }

    // desc is Generic: keep current's kind, only touch enumerable/configurable.
    match current {
        PropertyDescriptor::Data { value, writable, .. } => {
            PropertyDescriptor::Data { value, writable, enumerable, configurable }
        }
        PropertyDescriptor::Accessor { get, set, .. } => {
            PropertyDescriptor::Accessor { get, set, enumerable, configurable }
        }
        PropertyDescriptor::Generic { .. } => PropertyDescriptor::Generic { enumerable, configurable },
    }
}

fn install_new_property(obj: &ObjectHandle, key: PropertyKey, desc: PropertyDescriptor) {
    match desc {
        PropertyDescriptor::Data { value, writable, enumerable, configurable } => {
            let attrs = SlotAttributes {
                writable: writable.unwrap_or(false),
                enumerable: enumerable.unwrap_or(false),
                configurable: configurable.unwrap_or(false),
                is_accessor: false,
            };
            obj.borrow_mut().add_data_property(key, value.unwrap_or(Value::Undefined), attrs);
        }
        PropertyDescriptor::Accessor { get, set, enumerable, configurable } => {
            let attrs = SlotAttributes {
                writable: false,
                enumerable: enumerable.unwrap_or(false),
                configurable: configurable.unwrap_or(false),
                is_accessor: true,
            };
            obj.borrow_mut()
                .add_accessor_property(key, get.unwrap_or(Value::Undefined), set.unwrap_or(Value::Undefined), attrs);
        }
        PropertyDescriptor::Generic { enumerable, configurable } => {
            let attrs = SlotAttributes {
                writable: false,
                enumerable: enumerable.unwrap_or(false),
                configurable: configurable.unwrap_or(false),
                is_accessor: false,
            };
            obj.borrow_mut().add_data_property(key, Value::Undefined, attrs);
        }
    }
}

/// Updates an already-present own property in place, preserving its
/// position in `[[OwnPropertyKeys]]` insertion order. Delete-then-reinsert
/// would re-append the key at the end of the structure once it leaves
/// transition mode.
fn overwrite_property(_agent: &mut Agent, obj: &ObjectHandle, key: &PropertyKey, desc: PropertyDescriptor) {
    let (attrs, slot) = match desc {
        PropertyDescriptor::Data { value, writable, enumerable, configurable } => {
            let attrs = SlotAttributes {
                writable: writable.unwrap_or(false),
                enumerable: enumerable.unwrap_or(false),
                configurable: configurable.unwrap_or(false),
                is_accessor: false,
            };
            (attrs, Slot::Data(value.unwrap_or(Value::Undefined)))
        }
        PropertyDescriptor::Accessor { get, set, enumerable, configurable } => {
            let attrs = SlotAttributes {
                writable: false,
                enumerable: enumerable.unwrap_or(false),
                configurable: configurable.unwrap_or(false),
                is_accessor: true,
            };
            (attrs, Slot::Accessor { get: get.unwrap_or(Value::Undefined), set: set.unwrap_or(Value::Undefined) })
        }
        PropertyDescriptor::Generic { enumerable, configurable } => {
            let attrs = SlotAttributes {
                writable: false,
                enumerable: enumerable.unwrap_or(false),
                configurable: configurable.unwrap_or(false),
                is_accessor: false,
            };
            (attrs, Slot::Data(Value::Undefined))
        }
    };
    let mut o = obj.borrow_mut();
    o.change_attributes(key, attrs);
    if let Some(index) = o.structure.lookup(key) {
        o.set_slot_value(index, slot);
    }
}

/// Array exotic `[[DefineOwnProperty]]` for an integer index (ES5 §15.4.5.1
/// steps 4.a-4.e, simplified to this crate's dense/sparse split).
fn define_array_index(_agent: &mut Agent, obj: &ObjectHandle, index: u32, desc: PropertyDescriptor) -> JsResult<bool> {
    let value = match &desc {
        PropertyDescriptor::Data { value: Some(v), .. } => v.clone(),
        PropertyDescriptor::Data { .. } | PropertyDescriptor::Generic { .. } => Value::Undefined,
        PropertyDescriptor::Accessor { .. } => {
            return Ok(false); // Array exotic elements do not support accessors in this engine.
        }
    };
    set_indexed_desc(obj, index, value);
    Ok(true)
}

fn set_indexed_desc(obj: &ObjectHandle, index: u32, value: Value) {
    let mut o = obj.borrow_mut();
    let array = o.as_array_mut().expect("define_array_index called on non-array object");
    if array.should_go_sparse(index) {
        array.set_overflow(index, value);
    } else {
        array.set_dense(index, value);
    }
}

/// `spec.md` §4.3 "fast-path indexed get/set": bypasses structure lookup
/// entirely for array objects.
pub fn get_indexed(obj: &ObjectHandle, index: u32) -> Option<Value> {
    obj.borrow().as_array().and_then(|a| a.get(index).cloned())
}

pub fn set_indexed(_agent: &mut Agent, obj: &ObjectHandle, index: u32, value: Value) -> JsResult<bool> {
    set_indexed_desc(obj, index, value);
    Ok(true)
}

pub fn array_length(obj: &ObjectHandle) -> Option<u32> {
    obj.borrow().as_array().map(|a| a.length)
}

/// ### [\[\[OwnPropertyKeys\]\]](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-ownpropertykeys)
///
/// ES6 ordering: integer indices ascending, then string keys in creation
/// order (`spec.md` §4.3).
pub fn own_property_keys(obj: &ObjectHandle) -> Vec<PropertyKey> {
    let o = obj.borrow();
    let mut keys = Vec::new();
    if let Some(array) = o.as_array() {
        keys.extend(array.present_indices().into_iter().map(PropertyKey::Index));
    }
    keys.extend(o.own_keys_in_order());
    keys
}

/// ### [\[\[GetPrototypeOf\]\]](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-getprototypeof)
pub fn get_prototype_of(_agent: &mut Agent, obj: &ObjectHandle) -> Option<ObjectHandle> {
    obj.borrow().prototype.clone()
}

/// ### [\[\[SetPrototypeOf\]\] ( V )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-setprototypeof-v)
///
/// Rejects cycles by walking the candidate chain first, per ES6 §9.1.2
/// step 7.
pub fn set_prototype_of(obj: &ObjectHandle, proto: Option<ObjectHandle>) -> bool {
    if obj.borrow().prototype == proto {
        return true;
    }
    if !obj.borrow().extensible {
        return false;
    }
    let mut cursor = proto.clone();
    while let Some(p) = cursor {
        if &p == obj {
            return false;
        }
        cursor = p.borrow().prototype.clone();
    }
    obj.borrow_mut().prototype = proto;
    true
}

pub fn is_extensible(obj: &ObjectHandle) -> bool {
    obj.borrow().extensible
}

pub fn prevent_extensions(obj: &ObjectHandle) -> bool {
    obj.borrow_mut().extensible = false;
    true
}

/// Non-standard convenience used throughout the builtins layer: read a
/// property by a plain `&str` name, skipping `PropertyKey` construction at
/// call sites. Errors the same way `get` would.
pub fn get_str(agent: &mut Agent, obj: &ObjectHandle, name: &str) -> JsResult<Value> {
    get(agent, obj, &PropertyKey::from_str(name), &Value::Object(obj.clone()))
}

pub fn define_data_property(obj: &ObjectHandle, key: PropertyKey, value: Value, attrs: SlotAttributes) {
    obj.borrow_mut().delete_own(&key);
    obj.borrow_mut().add_data_property(key, value, attrs);
}

#[allow(clippy::too_many_arguments)]
pub fn throw_if_not_extensible(agent: &mut Agent, obj: &ObjectHandle) -> JsResult<()> {
    if !is_extensible(obj) {
        return Err(agent.throw_error(ErrorKind::Type, "Object is not extensible"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::object::{Object, ObjectHandle};

    #[test]
    fn redefining_an_existing_property_keeps_its_position_in_own_key_order() {
        let mut agent = Agent::new();
        let obj = ObjectHandle::new(Object::new(None));
        let a = PropertyKey::from_str("a");
        let b = PropertyKey::from_str("b");

        define_own_property(&mut agent, &obj, &a, PropertyDescriptor::data(Value::from(1), true, true, true)).unwrap();
        define_own_property(&mut agent, &obj, &b, PropertyDescriptor::data(Value::from(2), true, true, true)).unwrap();
        define_own_property(
            &mut agent,
            &obj,
            &a,
            PropertyDescriptor::Data { value: Some(Value::from(99)), writable: None, enumerable: None, configurable: None },
        )
        .unwrap();

        assert_eq!(own_property_keys(&obj), vec![a.clone(), b.clone()]);
        let PropertyDescriptor::Data { value, .. } = get_own_property(&obj, &a).unwrap() else {
            panic!("expected a data property");
        };
        assert!(matches!(value, Some(Value::Int32(99))));
    }
}
