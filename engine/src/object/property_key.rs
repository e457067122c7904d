// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonicalized property names used as `Structure`/`Object` map keys.
//!
//! `spec.md`'s `HeapPointer` payload list has no `Symbol` variant (the
//! engine targets ES5.1/6, where well-known symbols are not yet part of
//! the surface this crate implements), so a property key is either an
//! array index or a string — canonicalized to `Rc<str>` so structures can
//! cheaply clone and hash keys without re-copying the underlying bytes,
//! the way `ecmascript/types/language/object/property_key.rs` interns
//! names in the teacher codebase.

use crate::value::{JsString, Value};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum PropertyKey {
    /// A canonical array index, i.e. a string key matching `ToString(i)`
    /// for some `i` in `[0, 2^32 - 2]`.
    Index(u32),
    String(Rc<str>),
}

impl PropertyKey {
    pub fn from_str(s: &str) -> PropertyKey {
        if let Some(index) = canonical_index(s) {
            PropertyKey::Index(index)
        } else {
            PropertyKey::String(Rc::from(s))
        }
    }

    pub fn from_js_string(s: &JsString) -> PropertyKey {
        PropertyKey::from_str(&s.to_string_lossy())
    }

    pub fn from_index(i: u32) -> PropertyKey {
        PropertyKey::Index(i)
    }

    /// ### [ToPropertyKey ( argument )](https://tc39.es/ecma262/#sec-topropertykey),
    /// restricted to primitive inputs (string/number/bool/null/undefined).
    /// Object keys need `ToPrimitive` first, which requires an `Agent` —
    /// see `crate::value::convert::to_property_key`.
    pub fn from_primitive(v: &Value) -> PropertyKey {
        match v {
            Value::String(s) => PropertyKey::from_js_string(s),
            Value::Int32(i) if *i >= 0 => PropertyKey::Index(*i as u32),
            Value::Int32(i) => PropertyKey::from_str(&i.to_string()),
            Value::Double(d) => PropertyKey::from_str(&crate::value::number::to_string_radix(*d, 10)),
            Value::Bool(b) => PropertyKey::from_str(if *b { "true" } else { "false" }),
            Value::Null => PropertyKey::from_str("null"),
            Value::Undefined | Value::Empty => PropertyKey::from_str("undefined"),
            Value::Object(_) => panic!("from_primitive called with an Object value"),
        }
    }

    pub fn to_display_string(&self) -> String {
        match self {
            PropertyKey::Index(i) => i.to_string(),
            PropertyKey::String(s) => s.to_string(),
        }
    }

    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Index(i) => Some(*i),
            PropertyKey::String(_) => None,
        }
    }
}

impl PartialEq for PropertyKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyKey::Index(a), PropertyKey::Index(b)) => a == b,
            (PropertyKey::String(a), PropertyKey::String(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for PropertyKey {}

impl std::hash::Hash for PropertyKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            PropertyKey::Index(i) => {
                state.write_u8(0);
                state.write_u32(*i);
            }
            PropertyKey::String(s) => {
                state.write_u8(1);
                s.hash(state);
            }
        }
    }
}

/// A string is a canonical numeric index iff it round-trips through
/// decimal formatting without leading zeros (except `"0"` itself) and fits
/// `u32` below the array-length ceiling, per the `IsArrayIndex` abstract
/// operation ES5 §15.4 relies on.
fn canonical_index(s: &str) -> Option<u32> {
    if s == "0" {
        return Some(0);
    }
    if s.is_empty() || s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u64 = s.parse().ok()?;
    if n < u32::MAX as u64 {
        Some(n as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_indices_round_trip() {
        assert_eq!(PropertyKey::from_str("0"), PropertyKey::Index(0));
        assert_eq!(PropertyKey::from_str("42"), PropertyKey::Index(42));
        assert!(matches!(PropertyKey::from_str("042"), PropertyKey::String(_)));
        assert!(matches!(PropertyKey::from_str("-1"), PropertyKey::String(_)));
    }
}
