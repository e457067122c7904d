// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ToPrimitive`/`ToNumber`/`ToString`/`ToObject`/`ToPropertyKey` and the
//! equality abstract operations (`spec.md` §4.1 "Conversions & comparisons").
//!
//! These need an [`Agent`] (not just the bare `Value`) because converting an
//! object can run user-defined `valueOf`/`toString` methods, which can
//! throw, recurse into the interpreter, or observe the agent's pending
//! exception slot — grounded in
//! `ecmascript/abstract_operations/type_conversion.rs`'s split between
//! pure `Value`-only helpers and agent-taking abstract operations.

use crate::agent::Agent;
use crate::error::{ErrorKind, JsResult};
use crate::object::property_key::PropertyKey;
use crate::object::ObjectHandle;
use crate::value::number::parse_string_numeric_literal;
use crate::value::{JsString, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Default,
    Number,
    String,
}

/// ### [ToPrimitive ( input \[ , preferredType \] )](https://tc39.es/ecma262/#sec-toprimitive)
pub fn to_primitive(agent: &mut Agent, value: &Value, hint: PreferredType) -> JsResult<Value> {
    let obj = match value {
        Value::Object(o) => o,
        other => return Ok(other.clone()),
    };

    let method_names: [&str; 2] = match hint {
        PreferredType::String => ["toString", "valueOf"],
        PreferredType::Number | PreferredType::Default => ["valueOf", "toString"],
    };

    for name in method_names {
        let method = agent.get(obj, name)?;
        if agent.is_callable(&method) {
            let result = agent.call(&method, Value::Object(obj.clone()), &[])?;
            if !result.is_object() {
                return Ok(result);
            }
        }
    }

    Err(agent.throw_error(ErrorKind::Type, "Cannot convert object to primitive value"))
}

/// ### [ToNumeric ( value )](https://tc39.es/ecma262/#sec-tonumeric) restricted
/// to the Number half (no BigInt support; see `spec.md` §1 Non-goals).
pub fn to_number(agent: &mut Agent, value: &Value) -> JsResult<f64> {
    match value {
        Value::Undefined | Value::Empty => Ok(f64::NAN),
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Int32(i) => Ok(*i as f64),
        Value::Double(d) => Ok(*d),
        Value::String(s) => Ok(string_to_number(s)),
        Value::Object(_) => {
            let primitive = to_primitive(agent, value, PreferredType::Number)?;
            to_number(agent, &primitive)
        }
    }
}

/// ### [StringToNumber ( str )](https://tc39.es/ecma262/#sec-stringtonumber)
pub fn string_to_number(s: &JsString) -> f64 {
    let text = s.to_string_lossy();
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if trimmed.is_empty() {
        return 0.0;
    }
    parse_string_numeric_literal(trimmed).unwrap_or(f64::NAN)
}

/// ### [ToString ( argument )](https://tc39.es/ecma262/#sec-tostring)
pub fn to_string(agent: &mut Agent, value: &Value) -> JsResult<JsString> {
    match value {
        Value::Undefined => Ok(JsString::from_utf8("undefined")),
        Value::Null => Ok(JsString::from_utf8("null")),
        Value::Empty => Ok(JsString::from_utf8("undefined")),
        Value::Bool(b) => Ok(JsString::from_utf8(if *b { "true" } else { "false" })),
        Value::Int32(i) => Ok(JsString::from_utf8(&i.to_string())),
        Value::Double(d) => Ok(JsString::from_utf8(&crate::value::number::to_exact_string(*d))),
        Value::String(s) => Ok((**s).clone()),
        Value::Object(_) => {
            let primitive = to_primitive(agent, value, PreferredType::String)?;
            to_string(agent, &primitive)
        }
    }
}

/// ### [ToObject ( argument )](https://tc39.es/ecma262/#sec-toobject)
///
/// Wrapping primitives as objects (`new Number(1)`-style boxes) is handled
/// by `crate::object`'s wrapper constructors; this just dispatches and
/// rejects `null`/`undefined`.
pub fn to_object(agent: &mut Agent, value: &Value) -> JsResult<ObjectHandle> {
    match value {
        Value::Undefined | Value::Null | Value::Empty => {
            Err(agent.throw_error(ErrorKind::Type, "Cannot convert undefined or null to object"))
        }
        Value::Object(o) => Ok(o.clone()),
        Value::Bool(b) => Ok(agent.new_boolean_wrapper(*b)),
        Value::Int32(i) => Ok(agent.new_number_wrapper(*i as f64)),
        Value::Double(d) => Ok(agent.new_number_wrapper(*d)),
        Value::String(s) => Ok(agent.new_string_wrapper((**s).clone())),
    }
}

/// ### [ToPropertyKey ( argument )](https://tc39.es/ecma262/#sec-topropertykey)
///
/// The primitive cases delegate to [`PropertyKey::from_primitive`]; an
/// object argument is converted via `ToPrimitive` with a `String` hint
/// first, since that can run user code and throw.
pub fn to_property_key(agent: &mut Agent, value: &Value) -> JsResult<PropertyKey> {
    match value {
        Value::Object(_) => {
            let primitive = to_primitive(agent, value, PreferredType::String)?;
            Ok(PropertyKey::from_primitive(&primitive))
        }
        primitive => Ok(PropertyKey::from_primitive(primitive)),
    }
}

/// ### [IsLooselyEqual ( x, y )](https://tc39.es/ecma262/#sec-islooselyequal)
pub fn loose_equals(agent: &mut Agent, x: &Value, y: &Value) -> JsResult<bool> {
    use Value::*;
    match (x, y) {
        (Undefined | Null | Empty, Undefined | Null | Empty) => Ok(true),
        (Int32(_) | Double(_), Int32(_) | Double(_)) => {
            Ok(crate::value::number::number_equal(x.as_f64_unchecked(), y.as_f64_unchecked()))
        }
        (String(a), String(b)) => Ok(a == b),
        (Bool(a), Bool(b)) => Ok(a == b),
        (Object(a), Object(b)) => Ok(a == b),

        (Int32(_) | Double(_), String(_)) => {
            let n = to_number(agent, y)?;
            loose_equals(agent, x, &Value::Double(n))
        }
        (String(_), Int32(_) | Double(_)) => {
            let n = to_number(agent, x)?;
            loose_equals(agent, &Value::Double(n), y)
        }

        (Bool(_), _) => {
            let n = to_number(agent, x)?;
            loose_equals(agent, &Value::Double(n), y)
        }
        (_, Bool(_)) => {
            let n = to_number(agent, y)?;
            loose_equals(agent, x, &Value::Double(n))
        }

        (Int32(_) | Double(_) | String(_), Object(_)) => {
            let primitive = to_primitive(agent, y, PreferredType::Default)?;
            loose_equals(agent, x, &primitive)
        }
        (Object(_), Int32(_) | Double(_) | String(_)) => {
            let primitive = to_primitive(agent, x, PreferredType::Default)?;
            loose_equals(agent, &primitive, y)
        }

        _ => Ok(false),
    }
}

/// ### [IsStrictlyEqual ( x, y )](https://tc39.es/ecma262/#sec-isstrictlyequal)
pub fn strict_equals(x: &Value, y: &Value) -> bool {
    use Value::*;
    match (x, y) {
        (Undefined, Undefined) | (Null, Null) | (Empty, Empty) => true,
        (Int32(_) | Double(_), Int32(_) | Double(_)) => {
            crate::value::number::number_equal(x.as_f64_unchecked(), y.as_f64_unchecked())
        }
        (String(a), String(b)) => a == b,
        (Bool(a), Bool(b)) => a == b,
        (Object(a), Object(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_to_number_parses_and_falls_back_to_nan() {
        assert_eq!(string_to_number(&JsString::from_utf8("  42 ")), 42.0);
        assert!(string_to_number(&JsString::from_utf8("abc")).is_nan());
        assert_eq!(string_to_number(&JsString::from_utf8("")), 0.0);
    }

    #[test]
    fn strict_equals_distinguishes_types() {
        assert!(strict_equals(&Value::Int32(1), &Value::Double(1.0)));
        assert!(!strict_equals(&Value::Int32(0), &Value::from_str("0")));
        assert!(!strict_equals(&Value::Null, &Value::Undefined));
    }
}
