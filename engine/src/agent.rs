// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-evaluation execution state (`spec.md` §5, §6), grounded in
//! `ecmascript/execution/agent.rs`'s `Agent`: the pending-exception slot,
//! the realm's built-in prototypes, the microtask queue, the evaluation
//! fuel counter, and the regex compile cache all live here rather than
//! being threaded as separate parameters through every call.

use crate::environment::{self, EnvironmentHandle};
use crate::error::{ErrorKind, JsError, JsResult};
use crate::object::{internal_methods, FunctionData, Object, ObjectHandle, ObjectRareData, PropertyKey};
use crate::structure::SlotAttributes;
use crate::value::{JsString, Value};
use ahash::AHashMap;
use std::collections::VecDeque;
use std::rc::Rc;

/// A `Promise`-style reaction queued by built-in code. `spec.md` §5 asks
/// only that microtasks drain to completion after the active top-level
/// frame returns; no `Promise` object itself is in scope, so this is kept
/// as a bare callback record rather than a full job-queue abstraction.
pub struct Microtask {
    pub callback: Value,
    pub this: Value,
    pub args: Vec<Value>,
}

/// The built-in prototypes and global scope shared by every piece of code
/// running under one [`Agent`] (`spec.md` §6 "realm").
pub struct Realm {
    pub object_prototype: ObjectHandle,
    pub function_prototype: ObjectHandle,
    pub array_prototype: ObjectHandle,
    pub string_prototype: ObjectHandle,
    pub number_prototype: ObjectHandle,
    pub boolean_prototype: ObjectHandle,
    pub error_prototype: ObjectHandle,
    pub regexp_prototype: ObjectHandle,
    pub global_object: ObjectHandle,
    pub global_environment: EnvironmentHandle,
}

/// Above this many entries the regex compile cache is cleared in one pass
/// rather than evicted by LRU (`spec.md` §5 "Shared resources").
const REGEX_CACHE_CAP: usize = 256;

pub struct Agent {
    pub realm: Realm,
    pending_exception: Option<Value>,
    microtasks: VecDeque<Microtask>,
    /// `None` means unlimited; `Some(n)` is decremented once per dispatch
    /// loop iteration (`spec.md` §5 "Cancellation").
    fuel: Option<u64>,
    regex_cache: AHashMap<(Rc<str>, Rc<str>), Rc<regex::Regex>>,
}

impl Agent {
    pub fn new() -> Agent {
        let object_prototype = ObjectHandle::new(Object::new(None));
        let function_prototype = ObjectHandle::new(Object::new_with_kind(
            Some(object_prototype.clone()),
            ObjectRareData::Function(FunctionData::Native {
                name: Rc::from(""),
                behavior: Rc::new(|_agent, _this, _args| Ok(Value::Undefined)),
                length: 0,
            }),
        ));
        let array_prototype = ObjectHandle::new(Object::new_with_kind(
            Some(object_prototype.clone()),
            ObjectRareData::Array(crate::object::ArrayStorage::new()),
        ));
        let string_prototype = ObjectHandle::new(Object::new(Some(object_prototype.clone())));
        let number_prototype = ObjectHandle::new(Object::new(Some(object_prototype.clone())));
        let boolean_prototype = ObjectHandle::new(Object::new(Some(object_prototype.clone())));
        let error_prototype = ObjectHandle::new(Object::new(Some(object_prototype.clone())));
        let regexp_prototype = ObjectHandle::new(Object::new(Some(object_prototype.clone())));

        let global_object = ObjectHandle::new(Object::new(Some(object_prototype.clone())));
        let global_environment = environment::new_object_environment(global_object.clone(), false, None);

        let mut agent = Agent {
            realm: Realm {
                object_prototype,
                function_prototype,
                array_prototype,
                string_prototype,
                number_prototype,
                boolean_prototype,
                error_prototype,
                regexp_prototype,
                global_object,
                global_environment,
            },
            pending_exception: None,
            microtasks: VecDeque::new(),
            fuel: None,
            regex_cache: AHashMap::new(),
        };
        crate::builtins::initialize_realm(&mut agent);
        agent
    }

    pub fn set_fuel_limit(&mut self, limit: Option<u64>) {
        self.fuel = limit;
    }

    pub fn consume_fuel(&mut self) -> JsResult<()> {
        match &mut self.fuel {
            None => Ok(()),
            Some(0) => Err(self.throw_error(ErrorKind::Range, "script ran out of execution fuel")),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
        }
    }

    pub fn object_prototype(&self) -> ObjectHandle {
        self.realm.object_prototype.clone()
    }
    pub fn function_prototype(&self) -> ObjectHandle {
        self.realm.function_prototype.clone()
    }
    pub fn array_prototype(&self) -> ObjectHandle {
        self.realm.array_prototype.clone()
    }
    pub fn global_object(&self) -> ObjectHandle {
        self.realm.global_object.clone()
    }
    pub fn global_environment(&self) -> EnvironmentHandle {
        self.realm.global_environment.clone()
    }

    pub fn set_pending_exception(&mut self, value: Value) {
        self.pending_exception = Some(value);
    }

    pub fn take_pending_exception(&mut self) -> Option<Value> {
        self.pending_exception.take()
    }

    pub fn queue_microtask(&mut self, callback: Value, this: Value, args: Vec<Value>) {
        self.microtasks.push_back(Microtask { callback, this, args });
    }

    /// Drains the microtask queue to completion, per `spec.md` §5's
    /// "drained after the top-level frame returns" rule. A microtask that
    /// throws does not stop the rest of the queue from running — its
    /// exception is simply dropped, since there is no unhandled-rejection
    /// host hook in scope.
    pub fn run_microtasks(&mut self) {
        while let Some(task) = self.microtasks.pop_front() {
            let _ = self.call(&task.callback, task.this, &task.args);
        }
    }

    pub fn is_callable(&self, value: &Value) -> bool {
        value.as_object().map(|o| o.borrow().is_callable()).unwrap_or(false)
    }

    /// Convenience string-keyed `[[Get]]`, used by abstract operations that
    /// only ever look up well-known property names.
    pub fn get(&mut self, obj: &ObjectHandle, name: &str) -> JsResult<Value> {
        internal_methods::get_str(self, obj, name)
    }

    pub fn has_property(&mut self, obj: &ObjectHandle, name: &str) -> JsResult<bool> {
        let key = PropertyKey::from_str(name);
        internal_methods::has_property(self, obj, &key)
    }

    pub fn new_boolean_wrapper(&mut self, value: bool) -> ObjectHandle {
        ObjectHandle::new(Object::new_with_kind(
            Some(self.realm.boolean_prototype.clone()),
            ObjectRareData::BooleanWrapper(value),
        ))
    }

    pub fn new_number_wrapper(&mut self, value: f64) -> ObjectHandle {
        ObjectHandle::new(Object::new_with_kind(
            Some(self.realm.number_prototype.clone()),
            ObjectRareData::NumberWrapper(value),
        ))
    }

    pub fn new_string_wrapper(&mut self, value: JsString) -> ObjectHandle {
        ObjectHandle::new(Object::new_with_kind(
            Some(self.realm.string_prototype.clone()),
            ObjectRareData::StringWrapper(gc::Gc::new(value)),
        ))
    }

    pub fn new_array(&mut self) -> ObjectHandle {
        ObjectHandle::new(Object::new_with_kind(
            Some(self.realm.array_prototype.clone()),
            ObjectRareData::Array(crate::object::ArrayStorage::new()),
        ))
    }

    pub fn new_native_function(&mut self, name: &str, length: u32, behavior: crate::object::NativeFunction) -> ObjectHandle {
        ObjectHandle::new(Object::new_with_kind(
            Some(self.realm.function_prototype.clone()),
            ObjectRareData::Function(FunctionData::Native { name: Rc::from(name), behavior, length }),
        ))
    }

    /// Compiles (or looks up) a regex for `(source, flags)`. Clears the
    /// whole cache on overflow rather than evicting by LRU, matching
    /// `spec.md` §5's "Shared resources" policy exactly.
    pub fn compile_regex(&mut self, source: &str, flags_for_regex_crate: &str) -> JsResult<Rc<regex::Regex>> {
        let key = (Rc::from(source), Rc::from(flags_for_regex_crate));
        if let Some(cached) = self.regex_cache.get(&key) {
            return Ok(Rc::clone(cached));
        }
        if self.regex_cache.len() >= REGEX_CACHE_CAP {
            self.regex_cache.clear();
        }
        let pattern = format!("(?{flags_for_regex_crate}){source}");
        let compiled = regex::Regex::new(&pattern)
            .map_err(|e| self.throw_error(ErrorKind::Syntax, &format!("Invalid regular expression: {e}")))?;
        let compiled = Rc::new(compiled);
        self.regex_cache.insert(key, Rc::clone(&compiled));
        Ok(compiled)
    }

    /// ### [Call ( F, V \[ , argumentsList \] )](https://tc39.es/ecma262/#sec-call)
    pub fn call(&mut self, callee: &Value, this: Value, args: &[Value]) -> JsResult<Value> {
        let Some(obj) = callee.as_object().cloned() else {
            return Err(self.throw_error(ErrorKind::Type, "value is not a function"));
        };
        let function_data = obj.borrow().as_function().cloned();
        let Some(function_data) = function_data else {
            return Err(self.throw_error(ErrorKind::Type, "value is not a function"));
        };
        match function_data {
            FunctionData::Native { ref behavior, .. } => (behavior.clone())(self, this, args),
            FunctionData::Bytecode { ref block, ref environment, .. } => {
                crate::interpreter::call_bytecode_function(self, block, environment, this, args)
            }
        }
    }

    /// ### [Construct ( F \[ , argumentsList \[ , newTarget \] \] )](https://tc39.es/ecma262/#sec-construct)
    ///
    /// Ordinary-object allocation only: no `@@species`/subclassing support,
    /// since classes are out of scope (`spec.md` §1 Non-goals).
    pub fn construct(&mut self, callee: &Value, args: &[Value]) -> JsResult<Value> {
        let Some(obj) = callee.as_object().cloned() else {
            return Err(self.throw_error(ErrorKind::Type, "value is not a constructor"));
        };
        if !obj.borrow().is_callable() {
            return Err(self.throw_error(ErrorKind::Type, "value is not a constructor"));
        }
        let proto_value = self.get(&obj, "prototype")?;
        let proto = proto_value.as_object().cloned().unwrap_or_else(|| self.realm.object_prototype.clone());
        let new_object = ObjectHandle::new(Object::new(Some(proto)));
        let result = self.call(callee, Value::Object(new_object.clone()), args)?;
        match result {
            Value::Object(ref o) => Ok(Value::Object(o.clone())),
            _ => Ok(Value::Object(new_object)),
        }
    }

    /// ### [InstanceofOperator ( V, target )](https://tc39.es/ecma262/#sec-instanceofoperator)
    pub fn instance_of(&mut self, value: &Value, target: &Value) -> JsResult<Value> {
        let Some(target_obj) = target.as_object() else {
            return Err(self.throw_error(ErrorKind::Type, "Right-hand side of 'instanceof' is not callable"));
        };
        if !target_obj.borrow().is_callable() {
            return Err(self.throw_error(ErrorKind::Type, "Right-hand side of 'instanceof' is not callable"));
        }
        let Some(mut current) = value.as_object().cloned() else {
            return Ok(Value::Bool(false));
        };
        let proto_value = self.get(target_obj, "prototype")?;
        let Some(target_proto) = proto_value.as_object() else {
            return Err(self.throw_error(ErrorKind::Type, "prototype is not an object"));
        };
        loop {
            let next = internal_methods::get_prototype_of(self, &current);
            match next {
                Some(p) => {
                    if &p == target_proto {
                        return Ok(Value::Bool(true));
                    }
                    current = p;
                }
                None => return Ok(Value::Bool(false)),
            }
        }
    }

    /// Constructs an `Error`-shaped object with `name`/`message` own
    /// properties and returns it wrapped for propagation through
    /// `JsResult`. Mirrors `ecmascript/execution/agent.rs`'s
    /// `throw_error`, collapsed to a single kind-to-prototype mapping
    /// since per-kind constructor functions are out of this crate's scope.
    pub fn throw_error(&mut self, kind: ErrorKind, message: &str) -> JsError {
        let obj = ObjectHandle::new(Object::new_with_kind(Some(self.realm.error_prototype.clone()), ObjectRareData::Error));
        {
            let mut borrowed = obj.borrow_mut();
            borrowed.add_data_property(
                PropertyKey::from_str("name"),
                Value::from_str(kind.name()),
                SlotAttributes { writable: true, enumerable: false, configurable: true, is_accessor: false },
            );
            borrowed.add_data_property(
                PropertyKey::from_str("message"),
                Value::from_str(message),
                SlotAttributes { writable: true, enumerable: false, configurable: true, is_accessor: false },
            );
        }
        JsError::new(Value::Object(obj))
    }
}

impl Default for Agent {
    fn default() -> Self {
        Agent::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throw_error_builds_a_named_error_object() {
        let mut agent = Agent::new();
        let err = agent.throw_error(ErrorKind::Type, "oops");
        let obj = err.value().as_object().unwrap().clone();
        assert_eq!(agent.get(&obj, "name").unwrap().type_of(), "string");
        assert_eq!(agent.get(&obj, "message").unwrap().to_boolean(), true);
    }

    #[test]
    fn fuel_exhaustion_raises_range_error() {
        let mut agent = Agent::new();
        agent.set_fuel_limit(Some(1));
        assert!(agent.consume_fuel().is_ok());
        assert!(agent.consume_fuel().is_err());
    }
}
