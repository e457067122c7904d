// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User-facing property descriptors (`spec.md` §3 "PropertyDescriptor
//! (user-facing)"), normalized per ES5 §8.10.4/§8.10.5.
//!
//! Shaped after `ecmascript/types/spec/property_descriptor.rs`'s
//! `Option`-per-field record, collapsed here into the three disjoint forms
//! `spec.md` calls out (data / accessor / generic) since this crate keeps
//! descriptors as an enum rather than a single flat struct with six
//! independently-optional fields.

use crate::agent::Agent;
use crate::error::{ErrorKind, JsResult};
use crate::object::ObjectHandle;
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum PropertyDescriptor {
    Data {
        value: Option<Value>,
        writable: Option<bool>,
        enumerable: Option<bool>,
        configurable: Option<bool>,
    },
    Accessor {
        get: Option<Value>,
        set: Option<Value>,
        enumerable: Option<bool>,
        configurable: Option<bool>,
    },
    Generic {
        enumerable: Option<bool>,
        configurable: Option<bool>,
    },
}

impl PropertyDescriptor {
    pub fn data(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
        PropertyDescriptor::Data {
            value: Some(value),
            writable: Some(writable),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    pub fn enumerable(&self) -> Option<bool> {
        match self {
            PropertyDescriptor::Data { enumerable, .. } => *enumerable,
            PropertyDescriptor::Accessor { enumerable, .. } => *enumerable,
            PropertyDescriptor::Generic { enumerable, .. } => *enumerable,
        }
    }

    pub fn configurable(&self) -> Option<bool> {
        match self {
            PropertyDescriptor::Data { configurable, .. } => *configurable,
            PropertyDescriptor::Accessor { configurable, .. } => *configurable,
            PropertyDescriptor::Generic { configurable, .. } => *configurable,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, PropertyDescriptor::Accessor { .. })
    }
}

/// Raw fields read off a descriptor-shaped object, before the ES5 §8.10.5
/// disjointness check runs.
#[derive(Default)]
struct RawFields {
    value: Option<Value>,
    writable: Option<bool>,
    get: Option<Value>,
    set: Option<Value>,
    enumerable: Option<bool>,
    configurable: Option<bool>,
    has_value: bool,
    has_writable: bool,
    has_get: bool,
    has_set: bool,
}

/// ### [ToPropertyDescriptor ( Obj )](https://tc39.es/ecma262/#sec-topropertydescriptor)
///
/// `spec.md` §3: "It is a structural error for a single descriptor to mix
/// data and accessor fields" — that check lives here, before any
/// `[[DefineOwnProperty]]` call sees the result.
pub fn to_property_descriptor(agent: &mut Agent, obj: &ObjectHandle) -> JsResult<PropertyDescriptor> {
    let mut raw = RawFields::default();

    if agent.has_property(obj, "value")? {
        raw.value = Some(agent.get(obj, "value")?);
        raw.has_value = true;
    }
    if agent.has_property(obj, "writable")? {
        raw.writable = Some(agent.get(obj, "writable")?.to_boolean());
        raw.has_writable = true;
    }
    if agent.has_property(obj, "get")? {
        let g = agent.get(obj, "get")?;
        if !g.is_undefined() && !agent.is_callable(&g) {
            return Err(agent.throw_error(ErrorKind::Type, "Getter must be a function"));
        }
        raw.get = Some(g);
        raw.has_get = true;
    }
    if agent.has_property(obj, "set")? {
        let s = agent.get(obj, "set")?;
        if !s.is_undefined() && !agent.is_callable(&s) {
            return Err(agent.throw_error(ErrorKind::Type, "Setter must be a function"));
        }
        raw.set = Some(s);
        raw.has_set = true;
    }
    if agent.has_property(obj, "enumerable")? {
        raw.enumerable = Some(agent.get(obj, "enumerable")?.to_boolean());
    }
    if agent.has_property(obj, "configurable")? {
        raw.configurable = Some(agent.get(obj, "configurable")?.to_boolean());
    }

    let has_data = raw.has_value || raw.has_writable;
    let has_accessor = raw.has_get || raw.has_set;

    if has_data && has_accessor {
        return Err(agent.throw_error(
            ErrorKind::Type,
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
        ));
    }

    Ok(if has_accessor {
        PropertyDescriptor::Accessor {
            get: raw.get,
            set: raw.set,
            enumerable: raw.enumerable,
            configurable: raw.configurable,
        }
    } else if has_data {
        PropertyDescriptor::Data {
            value: raw.value,
            writable: raw.writable,
            enumerable: raw.enumerable,
            configurable: raw.configurable,
        }
    } else {
        PropertyDescriptor::Generic {
            enumerable: raw.enumerable,
            configurable: raw.configurable,
        }
    })
}
