// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error taxonomy and the pending-exception result channel.
//!
//! Every fallible operation in the crate returns [`JsResult<T>`]. There is
//! no separate "fatal" channel: a stack-depth or fuel exhaustion is raised
//! as a `RangeError` through the same path (`spec.md` §7).

use crate::value::Value;
use std::fmt;

/// One of the seven `Error.prototype.name` values the core can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Reference,
    Type,
    Range,
    Uri,
    Eval,
    Generic,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Reference => "ReferenceError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Range => "RangeError",
            ErrorKind::Uri => "URIError",
            ErrorKind::Eval => "EvalError",
            ErrorKind::Generic => "Error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A thrown ECMAScript value, wrapped so it can travel through `Result`.
///
/// Mirrors the teacher's `JsError(Value)` newtype: the pending exception is
/// just a `Value` (almost always an `Error` object, but `throw 3` is legal
/// too), never a Rust-level error type of its own.
#[derive(Debug, Clone)]
pub struct JsError(pub Value);

impl JsError {
    pub fn new(value: Value) -> Self {
        JsError(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

pub type JsResult<T> = Result<T, JsError>;
