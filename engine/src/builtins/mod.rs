// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in prototypes and constructors installed into every fresh
//! [`crate::agent::Agent`]'s realm. `spec.md` §4 names `Number` as the one
//! builtin given full algorithmic treatment; `Object`/`Function`/`Array`/
//! `String`/`Boolean`/`Error`/`RegExp` get the minimal-but-functional
//! surface the rest of the engine's abstract operations already assume
//! exists (`ToPrimitive`'s `toString`/`valueOf` lookup, `instanceof`'s
//! `.prototype` read, `Object.defineProperty`'s validation path), without
//! full standard-library method coverage.

pub mod number;

use crate::agent::Agent;
use crate::error::{ErrorKind, JsResult};
use crate::object::property_descriptor::{to_property_descriptor, PropertyDescriptor};
use crate::object::{internal_methods, NativeFunction, Object, ObjectHandle, ObjectRareData, PropertyKey};
use crate::structure::SlotAttributes;
use crate::value::convert;
use crate::value::Value;
use std::rc::Rc;

const METHOD_ATTRS: SlotAttributes = SlotAttributes { writable: true, enumerable: false, configurable: true, is_accessor: false };
const CONST_ATTRS: SlotAttributes = SlotAttributes { writable: false, enumerable: false, configurable: false, is_accessor: false };

pub(crate) fn install_method(agent: &mut Agent, target: &ObjectHandle, name: &str, length: u32, f: NativeFunction) {
    let func = agent.new_native_function(name, length, f);
    internal_methods::define_data_property(target, PropertyKey::from_str(name), Value::Object(func), METHOD_ATTRS);
}

pub(crate) fn install_value(target: &ObjectHandle, name: &str, value: Value, attrs: SlotAttributes) {
    internal_methods::define_data_property(target, PropertyKey::from_str(name), value, attrs);
}

/// Builds a constructor function object whose `.prototype` is `prototype`
/// and whose `prototype.constructor` points back at it, mirroring what
/// `Context::define_native_function`-style setup does for every global
/// constructor (`Object`, `Array`, ...).
fn make_constructor(agent: &mut Agent, name: &str, length: u32, prototype: &ObjectHandle, behavior: NativeFunction) -> ObjectHandle {
    let ctor = agent.new_native_function(name, length, behavior);
    install_value(&ctor, "prototype", Value::Object(prototype.clone()), CONST_ATTRS);
    install_value(prototype, "constructor", Value::Object(ctor.clone()), METHOD_ATTRS);
    let global = agent.global_object();
    install_value(&global, name, Value::Object(ctor.clone()), METHOD_ATTRS);
    ctor
}

fn expect_this_object(agent: &mut Agent, this: &Value) -> JsResult<ObjectHandle> {
    convert::to_object(agent, this)
}

pub fn initialize_realm(agent: &mut Agent) {
    install_object(agent);
    install_function(agent);
    install_array(agent);
    install_string(agent);
    number::install(agent);
    install_boolean(agent);
    install_error(agent);
    install_regexp(agent);
    install_global_functions(agent);
}

// ---- Object ----------------------------------------------------------

fn install_object(agent: &mut Agent) {
    let object_prototype = agent.object_prototype();

    install_method(agent, &object_prototype, "toString", 0, Rc::new(|agent, this, _args| {
        if this.is_undefined() {
            return Ok(Value::from_str("[object Undefined]"));
        }
        if this.is_null() {
            return Ok(Value::from_str("[object Null]"));
        }
        let obj = expect_this_object(agent, &this)?;
        let tag = if obj.borrow().is_callable() {
            "Function"
        } else if obj.borrow().as_array().is_some() {
            "Array"
        } else if obj.borrow().as_regexp().is_some() {
            "RegExp"
        } else {
            "Object"
        };
        Ok(Value::from_str(&format!("[object {tag}]")))
    }));

    install_method(agent, &object_prototype, "valueOf", 0, Rc::new(|agent, this, _args| {
        Ok(Value::Object(expect_this_object(agent, &this)?))
    }));

    install_method(agent, &object_prototype, "hasOwnProperty", 1, Rc::new(|agent, this, args| {
        let obj = expect_this_object(agent, &this)?;
        let key = convert::to_property_key(agent, args.first().unwrap_or(&Value::Undefined))?;
        Ok(Value::Bool(internal_methods::has_own_property(&obj, &key)))
    }));

    install_method(agent, &object_prototype, "isPrototypeOf", 1, Rc::new(|agent, this, args| {
        let Some(mut candidate) = args.first().and_then(|v| v.as_object()).cloned() else {
            return Ok(Value::Bool(false));
        };
        let self_obj = expect_this_object(agent, &this)?;
        loop {
            match internal_methods::get_prototype_of(agent, &candidate) {
                Some(p) => {
                    if p == self_obj {
                        return Ok(Value::Bool(true));
                    }
                    candidate = p;
                }
                None => return Ok(Value::Bool(false)),
            }
        }
    }));

    install_method(agent, &object_prototype, "propertyIsEnumerable", 1, Rc::new(|agent, this, args| {
        let obj = expect_this_object(agent, &this)?;
        let key = convert::to_property_key(agent, args.first().unwrap_or(&Value::Undefined))?;
        let enumerable = internal_methods::get_own_property(&obj, &key).and_then(|d| d.enumerable()).unwrap_or(false);
        Ok(Value::Bool(enumerable))
    }));

    let object_prototype_for_ctor = object_prototype.clone();
    let ctor = make_constructor(agent, "Object", 1, &object_prototype, Rc::new(move |agent, _this, args| {
        match args.first() {
            Some(v) if !v.is_nullish() => Ok(Value::Object(convert::to_object(agent, v)?)),
            _ => Ok(Value::Object(ObjectHandle::new(Object::new(Some(object_prototype_for_ctor.clone()))))),
        }
    }));

    install_method(agent, &ctor, "keys", 1, Rc::new(|agent, _this, args| {
        let obj = convert::to_object(agent, args.first().unwrap_or(&Value::Undefined))?;
        let keys: Vec<Value> = internal_methods::own_property_keys(&obj)
            .into_iter()
            .filter(|k| internal_methods::get_own_property(&obj, k).and_then(|d| d.enumerable()).unwrap_or(false))
            .map(|k| Value::from_str(&k.to_display_string()))
            .collect();
        Ok(Value::Object(array_from_values(agent, keys)))
    }));

    install_method(agent, &ctor, "getPrototypeOf", 1, Rc::new(|agent, _this, args| {
        let obj = convert::to_object(agent, args.first().unwrap_or(&Value::Undefined))?;
        Ok(internal_methods::get_prototype_of(agent, &obj).map(Value::Object).unwrap_or(Value::Null))
    }));

    install_method(agent, &ctor, "defineProperty", 3, Rc::new(|agent, _this, args| {
        let Some(target) = args.first().and_then(|v| v.as_object()).cloned() else {
            return Err(agent.throw_error(ErrorKind::Type, "Object.defineProperty called on non-object"));
        };
        let key = convert::to_property_key(agent, args.get(1).unwrap_or(&Value::Undefined))?;
        let Some(descriptor_obj) = args.get(2).and_then(|v| v.as_object()).cloned() else {
            return Err(agent.throw_error(ErrorKind::Type, "Property description must be an object"));
        };
        let desc = to_property_descriptor(agent, &descriptor_obj)?;
        if !internal_methods::define_own_property(agent, &target, &key, desc)? {
            return Err(agent.throw_error(ErrorKind::Type, "Cannot define property, object is not extensible"));
        }
        Ok(Value::Object(target))
    }));

    install_method(agent, &ctor, "freeze", 1, Rc::new(|agent, _this, args| {
        let Some(obj) = args.first().and_then(|v| v.as_object()).cloned() else {
            return Ok(args.first().cloned().unwrap_or(Value::Undefined));
        };
        internal_methods::prevent_extensions(&obj);
        for key in internal_methods::own_property_keys(&obj) {
            if let Some(desc) = internal_methods::get_own_property(&obj, &key) {
                let frozen = match desc {
                    PropertyDescriptor::Data { value, enumerable, configurable, .. } => {
                        PropertyDescriptor::Data { value, writable: Some(false), enumerable, configurable: configurable.map(|_| false) }
                    }
                    PropertyDescriptor::Accessor { get, set, enumerable, configurable } => {
                        PropertyDescriptor::Accessor { get, set, enumerable, configurable: configurable.map(|_| false) }
                    }
                    other => other,
                };
                internal_methods::define_own_property(agent, &obj, &key, frozen)?;
            }
        }
        Ok(Value::Object(obj))
    }));
}

fn array_from_values(agent: &mut Agent, values: Vec<Value>) -> ObjectHandle {
    let arr = agent.new_array();
    for (i, v) in values.into_iter().enumerate() {
        if let Some(a) = arr.borrow_mut().as_array_mut() {
            a.set_dense(i as u32, v);
        }
    }
    arr
}

// ---- Function ----------------------------------------------------------

fn install_function(agent: &mut Agent) {
    let function_prototype = agent.function_prototype();

    install_method(agent, &function_prototype, "call", 1, Rc::new(|agent, this, args| {
        let bound_this = args.first().cloned().unwrap_or(Value::Undefined);
        agent.call(&this, bound_this, args.get(1..).unwrap_or(&[]))
    }));

    install_method(agent, &function_prototype, "apply", 2, Rc::new(|agent, this, args| {
        let bound_this = args.first().cloned().unwrap_or(Value::Undefined);
        let call_args = match args.get(1) {
            Some(Value::Object(arr)) => {
                let len = internal_methods::array_length(arr).unwrap_or(0);
                (0..len).map(|i| internal_methods::get_indexed(arr, i).unwrap_or(Value::Undefined)).collect::<Vec<_>>()
            }
            _ => Vec::new(),
        };
        agent.call(&this, bound_this, &call_args)
    }));

    install_method(agent, &function_prototype, "toString", 0, Rc::new(|agent, this, _args| {
        let obj = expect_this_object(agent, &this)?;
        let name = obj.borrow().as_function().map(|f| f.name().to_string()).unwrap_or_default();
        Ok(Value::from_str(&format!("function {name}() {{ [native code] }}")))
    }));
}

// ---- Array ----------------------------------------------------------

fn install_array(agent: &mut Agent) {
    let array_prototype = agent.array_prototype();

    install_method(agent, &array_prototype, "push", 1, Rc::new(|agent, this, args| {
        let obj = expect_this_object(agent, &this)?;
        let mut len = internal_methods::array_length(&obj).unwrap_or(0);
        for arg in args {
            internal_methods::set_indexed(agent, &obj, len, arg.clone())?;
            len += 1;
        }
        Ok(Value::number(len as f64))
    }));

    install_method(agent, &array_prototype, "pop", 0, Rc::new(|agent, this, _args| {
        let obj = expect_this_object(agent, &this)?;
        let len = internal_methods::array_length(&obj).unwrap_or(0);
        if len == 0 {
            return Ok(Value::Undefined);
        }
        let last = internal_methods::get_indexed(&obj, len - 1).unwrap_or(Value::Undefined);
        if let Some(a) = obj.borrow_mut().as_array_mut() {
            a.delete(len - 1);
            a.length = len - 1;
        }
        Ok(last)
    }));

    install_method(agent, &array_prototype, "join", 1, Rc::new(|agent, this, args| {
        let obj = expect_this_object(agent, &this)?;
        let separator = match args.first() {
            Some(v) if !v.is_undefined() => convert::to_string(agent, v)?.to_string_lossy(),
            _ => ",".to_string(),
        };
        let len = internal_methods::array_length(&obj).unwrap_or(0);
        let mut parts = Vec::with_capacity(len as usize);
        for i in 0..len {
            let v = internal_methods::get_indexed(&obj, i).unwrap_or(Value::Undefined);
            parts.push(if v.is_nullish() { String::new() } else { convert::to_string(agent, &v)?.to_string_lossy() });
        }
        Ok(Value::from_str(&parts.join(&separator)))
    }));

    install_method(agent, &array_prototype, "indexOf", 1, Rc::new(|agent, this, args| {
        let obj = expect_this_object(agent, &this)?;
        let target = args.first().cloned().unwrap_or(Value::Undefined);
        let len = internal_methods::array_length(&obj).unwrap_or(0);
        for i in 0..len {
            let v = internal_methods::get_indexed(&obj, i).unwrap_or(Value::Undefined);
            if convert::strict_equals(&v, &target) {
                return Ok(Value::number(i as f64));
            }
        }
        Ok(Value::number(-1.0))
    }));

    install_method(agent, &array_prototype, "slice", 2, Rc::new(|agent, this, args| {
        let obj = expect_this_object(agent, &this)?;
        let len = internal_methods::array_length(&obj).unwrap_or(0) as i64;
        let clamp = |n: f64, len: i64| -> i64 {
            let n = crate::value::number::to_integer_or_infinity(n);
            if n < 0.0 {
                (len + n as i64).max(0)
            } else {
                (n as i64).min(len)
            }
        };
        let start = match args.first() {
            Some(v) => clamp(convert::to_number(agent, v)?, len),
            None => 0,
        };
        let end = match args.get(1) {
            Some(v) if !v.is_undefined() => clamp(convert::to_number(agent, v)?, len),
            _ => len,
        };
        let mut result = Vec::new();
        let mut i = start;
        while i < end {
            result.push(internal_methods::get_indexed(&obj, i as u32).unwrap_or(Value::Undefined));
            i += 1;
        }
        Ok(Value::Object(array_from_values(agent, result)))
    }));

    let array_prototype_for_ctor = array_prototype.clone();
    make_constructor(agent, "Array", 1, &array_prototype, Rc::new(move |agent, _this, args| {
        let arr = ObjectHandle::new(Object::new_with_kind(
            Some(array_prototype_for_ctor.clone()),
            ObjectRareData::Array(crate::object::ArrayStorage::new()),
        ));
        if args.len() == 1 {
            if let Value::Int32(_) | Value::Double(_) = &args[0] {
                let len = crate::value::number::to_index(convert::to_number(agent, &args[0])?)
                    .map_err(|_| agent.throw_error(ErrorKind::Range, "Invalid array length"))?;
                if let Some(a) = arr.borrow_mut().as_array_mut() {
                    a.length = len as u32;
                }
                return Ok(Value::Object(arr));
            }
        }
        for (i, v) in args.iter().enumerate() {
            if let Some(a) = arr.borrow_mut().as_array_mut() {
                a.set_dense(i as u32, v.clone());
            }
        }
        Ok(Value::Object(arr))
    }));
}

// ---- String ----------------------------------------------------------

fn install_string(agent: &mut Agent) {
    let string_prototype = agent.realm.string_prototype.clone();

    install_method(agent, &string_prototype, "toString", 0, Rc::new(|agent, this, _args| {
        Ok(Value::string(string_this_value(agent, &this)?))
    }));
    install_method(agent, &string_prototype, "valueOf", 0, Rc::new(|agent, this, _args| {
        Ok(Value::string(string_this_value(agent, &this)?))
    }));
    install_method(agent, &string_prototype, "charAt", 1, Rc::new(|agent, this, args| {
        let s = string_this_value(agent, &this)?;
        let index = convert::to_number(agent, args.first().unwrap_or(&Value::number(0.0)))?;
        let index = crate::value::number::to_integer_or_infinity(index);
        if index < 0.0 || index >= s.len() as f64 {
            return Ok(Value::from_str(""));
        }
        let unit = s.code_unit_at(index as usize).unwrap();
        Ok(Value::string(crate::value::JsString::from_utf16(vec![unit])))
    }));
    install_method(agent, &string_prototype, "charCodeAt", 1, Rc::new(|agent, this, args| {
        let s = string_this_value(agent, &this)?;
        let index = convert::to_number(agent, args.first().unwrap_or(&Value::number(0.0)))?;
        let index = crate::value::number::to_integer_or_infinity(index);
        if index < 0.0 || index >= s.len() as f64 {
            return Ok(Value::Double(f64::NAN));
        }
        Ok(Value::number(s.code_unit_at(index as usize).unwrap() as f64))
    }));
    install_method(agent, &string_prototype, "indexOf", 1, Rc::new(|agent, this, args| {
        let s = string_this_value(agent, &this)?.to_string_lossy();
        let needle = convert::to_string(agent, args.first().unwrap_or(&Value::Undefined))?.to_string_lossy();
        Ok(Value::number(match s.find(&needle) {
            Some(byte_idx) => s[..byte_idx].chars().count() as f64,
            None => -1.0,
        }))
    }));
    install_method(agent, &string_prototype, "slice", 2, Rc::new(|agent, this, args| {
        let s = string_this_value(agent, &this)?;
        let units = s.to_utf16();
        let len = units.len() as i64;
        let clamp = |n: f64| -> i64 {
            let n = crate::value::number::to_integer_or_infinity(n);
            if n < 0.0 { (len + n as i64).max(0) } else { (n as i64).min(len) }
        };
        let start = match args.first() { Some(v) => clamp(convert::to_number(agent, v)?), None => 0 };
        let end = match args.get(1) { Some(v) if !v.is_undefined() => clamp(convert::to_number(agent, v)?), _ => len };
        let slice = if start < end { units[start as usize..end as usize].to_vec() } else { Vec::new() };
        Ok(Value::string(crate::value::JsString::from_utf16(slice)))
    }));
    install_method(agent, &string_prototype, "concat", 1, Rc::new(|agent, this, args| {
        let mut s = string_this_value(agent, &this)?;
        for arg in args {
            s = s.concat(&convert::to_string(agent, arg)?);
        }
        Ok(Value::string(s))
    }));

    make_constructor(agent, "String", 1, &string_prototype, Rc::new(|agent, _this, args| {
        let s = match args.first() {
            Some(v) => convert::to_string(agent, v)?,
            None => crate::value::JsString::from_utf8(""),
        };
        Ok(Value::string(s))
    }));
}

fn string_this_value(agent: &mut Agent, this: &Value) -> JsResult<crate::value::JsString> {
    match this {
        Value::String(s) => Ok((**s).clone()),
        Value::Object(o) => match &o.borrow().rare.as_deref() {
            Some(ObjectRareData::StringWrapper(s)) => Ok((**s).clone()),
            _ => Err(agent.throw_error(ErrorKind::Type, "String.prototype method called on incompatible receiver")),
        },
        _ => Err(agent.throw_error(ErrorKind::Type, "String.prototype method called on incompatible receiver")),
    }
}

// ---- Boolean ----------------------------------------------------------

fn install_boolean(agent: &mut Agent) {
    let boolean_prototype = agent.realm.boolean_prototype.clone();

    install_method(agent, &boolean_prototype, "toString", 0, Rc::new(|agent, this, _args| {
        Ok(Value::from_str(if boolean_this_value(agent, &this)? { "true" } else { "false" }))
    }));
    install_method(agent, &boolean_prototype, "valueOf", 0, Rc::new(|agent, this, _args| {
        Ok(Value::Bool(boolean_this_value(agent, &this)?))
    }));

    make_constructor(agent, "Boolean", 1, &boolean_prototype, Rc::new(|_agent, _this, args| {
        Ok(Value::Bool(args.first().map(|v| v.to_boolean()).unwrap_or(false)))
    }));
}

fn boolean_this_value(agent: &mut Agent, this: &Value) -> JsResult<bool> {
    match this {
        Value::Bool(b) => Ok(*b),
        Value::Object(o) => match &o.borrow().rare.as_deref() {
            Some(ObjectRareData::BooleanWrapper(b)) => Ok(*b),
            _ => Err(agent.throw_error(ErrorKind::Type, "Boolean.prototype method called on incompatible receiver")),
        },
        _ => Err(agent.throw_error(ErrorKind::Type, "Boolean.prototype method called on incompatible receiver")),
    }
}

// ---- Error ----------------------------------------------------------

fn install_error(agent: &mut Agent) {
    let error_prototype = agent.realm.error_prototype.clone();
    install_value(&error_prototype, "name", Value::from_str("Error"), METHOD_ATTRS);
    install_value(&error_prototype, "message", Value::from_str(""), METHOD_ATTRS);

    install_method(agent, &error_prototype, "toString", 0, Rc::new(|agent, this, _args| {
        let obj = expect_this_object(agent, &this)?;
        let name = agent.get(&obj, "name")?;
        let name = if name.is_undefined() { "Error".to_string() } else { convert::to_string(agent, &name)?.to_string_lossy() };
        let message = agent.get(&obj, "message")?;
        let message = if message.is_undefined() { String::new() } else { convert::to_string(agent, &message)?.to_string_lossy() };
        Ok(Value::from_str(&if message.is_empty() { name } else { format!("{name}: {message}") }))
    }));

    make_error_kind(agent, "Error", &error_prototype);
    for kind in ["TypeError", "RangeError", "ReferenceError", "SyntaxError", "EvalError", "URIError"] {
        let proto = ObjectHandle::new(Object::new(Some(error_prototype.clone())));
        install_value(&proto, "name", Value::from_str(kind), METHOD_ATTRS);
        install_value(&proto, "message", Value::from_str(""), METHOD_ATTRS);
        make_error_kind(agent, kind, &proto);
    }
}

fn make_error_kind(agent: &mut Agent, name: &'static str, prototype: &ObjectHandle) {
    let prototype_for_ctor = prototype.clone();
    make_constructor(agent, name, 1, prototype, Rc::new(move |agent, _this, args| {
        let obj = ObjectHandle::new(Object::new_with_kind(Some(prototype_for_ctor.clone()), ObjectRareData::Error));
        if let Some(message) = args.first() {
            if !message.is_undefined() {
                let message = convert::to_string(agent, message)?;
                internal_methods::define_data_property(&obj, PropertyKey::from_str("message"), Value::string(message), METHOD_ATTRS);
            }
        }
        Ok(Value::Object(obj))
    }));
}

// ---- RegExp ----------------------------------------------------------

fn install_regexp(agent: &mut Agent) {
    let regexp_prototype = agent.realm.regexp_prototype.clone();

    install_method(agent, &regexp_prototype, "exec", 1, Rc::new(|agent, this, args| {
        regexp_exec(agent, &this, args.first().unwrap_or(&Value::Undefined))
    }));
    install_method(agent, &regexp_prototype, "test", 1, Rc::new(|agent, this, args| {
        let result = regexp_exec(agent, &this, args.first().unwrap_or(&Value::Undefined))?;
        Ok(Value::Bool(!result.is_null()))
    }));
    install_method(agent, &regexp_prototype, "toString", 0, Rc::new(|agent, this, _args| {
        let obj = expect_this_object(agent, &this)?;
        let o = obj.borrow();
        let Some(data) = o.as_regexp() else {
            return Err(agent.throw_error(ErrorKind::Type, "not a RegExp object"));
        };
        Ok(Value::from_str(&format!("/{}/{}", data.source, data.flags)))
    }));

    let regexp_prototype_for_ctor = regexp_prototype.clone();
    make_constructor(agent, "RegExp", 2, &regexp_prototype, Rc::new(move |agent, _this, args| {
        let source = match args.first() {
            Some(v) => convert::to_string(agent, v)?.to_string_lossy(),
            None => String::new(),
        };
        let flags = match args.get(1) {
            Some(v) if !v.is_undefined() => convert::to_string(agent, v)?.to_string_lossy(),
            _ => String::new(),
        };
        make_regexp_object(agent, &regexp_prototype_for_ctor, &source, &flags)
    }));
}

/// Validates the flag string eagerly, rejecting unknown or repeated flags
/// with a `SyntaxError` before the pattern is ever compiled (`spec.md` §4.7).
fn make_regexp_object(agent: &mut Agent, prototype: &ObjectHandle, source: &str, flags: &str) -> JsResult<Value> {
    let mut global = false;
    let mut ignore_case = false;
    let mut multiline = false;
    let mut sticky = false;
    let mut unicode = false;
    for c in flags.chars() {
        let seen = match c {
            'g' => &mut global,
            'i' => &mut ignore_case,
            'm' => &mut multiline,
            'y' => &mut sticky,
            'u' => &mut unicode,
            other => return Err(agent.throw_error(ErrorKind::Syntax, &format!("Invalid regular expression flag: {other}"))),
        };
        if *seen {
            return Err(agent.throw_error(ErrorKind::Syntax, &format!("Duplicate regular expression flag: {c}")));
        }
        *seen = true;
    }

    let mut crate_flags = String::new();
    if ignore_case {
        crate_flags.push('i');
    }
    if multiline {
        crate_flags.push('m');
    }
    agent.compile_regex(source, &crate_flags)?;

    let obj = ObjectHandle::new(Object::new_with_kind(
        Some(prototype.clone()),
        ObjectRareData::RegExp(crate::object::RegExpData {
            source: Rc::from(source),
            flags: Rc::from(flags),
            global,
            ignore_case,
            multiline,
            sticky,
            unicode,
        }),
    ));
    internal_methods::define_data_property(
        &obj,
        PropertyKey::from_str("lastIndex"),
        Value::number(0.0),
        SlotAttributes { writable: true, enumerable: false, configurable: false, is_accessor: false },
    );
    Ok(Value::Object(obj))
}

/// ### [RegExp.prototype.exec ( string )](https://tc39.es/ecma262/#sec-regexp.prototype.exec)
///
/// simplified: no named/numbered capture-group object beyond group 0, since
/// user-observable capture groups are out of this crate's scope.
fn regexp_exec(agent: &mut Agent, this: &Value, input: &Value) -> JsResult<Value> {
    let obj = expect_this_object(agent, this)?;
    let (source, crate_flags, global, sticky) = {
        let o = obj.borrow();
        let Some(data) = o.as_regexp() else {
            return Err(agent.throw_error(ErrorKind::Type, "not a RegExp object"));
        };
        let mut crate_flags = String::new();
        if data.ignore_case {
            crate_flags.push('i');
        }
        if data.multiline {
            crate_flags.push('m');
        }
        (data.source.to_string(), crate_flags, data.global, data.sticky)
    };
    let haystack = convert::to_string(agent, input)?.to_string_lossy();
    let regex = agent.compile_regex(&source, &crate_flags)?;

    let start = if global || sticky {
        let last_index = agent.get(&obj, "lastIndex")?;
        convert::to_number(agent, &last_index)? as usize
    } else {
        0
    };

    let found = if start <= haystack.len() { regex.find_at(&haystack, start) } else { None };
    match found {
        Some(m) if !sticky || m.start() == start => {
            if global || sticky {
                internal_methods::define_data_property(
                    &obj,
                    PropertyKey::from_str("lastIndex"),
                    Value::number(m.end() as f64),
                    SlotAttributes { writable: true, enumerable: false, configurable: false, is_accessor: false },
                );
            }
            let result = array_from_values(agent, vec![Value::from_str(m.as_str())]);
            install_value(&result, "index", Value::number(m.start() as f64), SlotAttributes::DATA_DEFAULT);
            install_value(&result, "input", Value::from_str(&haystack), SlotAttributes::DATA_DEFAULT);
            Ok(Value::Object(result))
        }
        _ => {
            if global || sticky {
                internal_methods::define_data_property(
                    &obj,
                    PropertyKey::from_str("lastIndex"),
                    Value::number(0.0),
                    SlotAttributes { writable: true, enumerable: false, configurable: false, is_accessor: false },
                );
            }
            Ok(Value::Null)
        }
    }
}

// ---- Global functions ----------------------------------------------------------

fn install_global_functions(agent: &mut Agent) {
    let global = agent.global_object();

    install_value(&global, "NaN", Value::Double(f64::NAN), CONST_ATTRS);
    install_value(&global, "Infinity", Value::Double(f64::INFINITY), CONST_ATTRS);
    install_value(&global, "undefined", Value::Undefined, CONST_ATTRS);

    install_method(agent, &global, "isNaN", 1, Rc::new(|agent, _this, args| {
        Ok(Value::Bool(convert::to_number(agent, args.first().unwrap_or(&Value::Undefined))?.is_nan()))
    }));
    install_method(agent, &global, "isFinite", 1, Rc::new(|agent, _this, args| {
        Ok(Value::Bool(convert::to_number(agent, args.first().unwrap_or(&Value::Undefined))?.is_finite()))
    }));
    install_method(agent, &global, "parseInt", 2, Rc::new(|agent, _this, args| {
        let s = convert::to_string(agent, args.first().unwrap_or(&Value::Undefined))?.to_string_lossy();
        let radix = match args.get(1) {
            Some(v) if !v.is_undefined() => convert::to_number(agent, v)? as u32,
            _ => 10,
        };
        Ok(Value::number(parse_int(s.trim(), if radix == 0 { 10 } else { radix })))
    }));
    install_method(agent, &global, "parseFloat", 1, Rc::new(|agent, _this, args| {
        let s = convert::to_string(agent, args.first().unwrap_or(&Value::Undefined))?.to_string_lossy();
        let s = s.trim_start();
        let end = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-' || c == 'e' || c == 'E'))
            .unwrap_or(s.len());
        Ok(Value::number(s[..end].parse::<f64>().unwrap_or(f64::NAN)))
    }));
}

fn parse_int(s: &str, radix: u32) -> f64 {
    let (neg, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, s) = if radix == 16 {
        (16, s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s))
    } else {
        (radix, s)
    };
    let end = s.find(|c: char| !c.is_digit(radix)).unwrap_or(s.len());
    if end == 0 {
        return f64::NAN;
    }
    match i64::from_str_radix(&s[..end], radix) {
        Ok(n) => if neg { -(n as f64) } else { n as f64 },
        Err(_) => f64::NAN,
    }
}
