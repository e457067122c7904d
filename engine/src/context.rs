// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The embedding API (`spec.md` §6). [`Context`] is the sole entry point a
//! host application touches: it owns an [`Agent`], parses source text with
//! `oxc_parser`, lowers it with [`crate::bytecode::BytecodeGenerator`], and
//! runs the result through [`crate::interpreter`] — mirroring the way the
//! teacher's own embedding surface wraps agent/realm setup behind a single
//! handle rather than exposing the pieces directly.

use crate::agent::Agent;
use crate::bytecode::BytecodeGenerator;
use crate::error::{ErrorKind, JsResult};
use crate::interpreter;
use crate::object::internal_methods;
use crate::object::{NativeFunction, ObjectHandle, PropertyKey};
use crate::structure::SlotAttributes;
use crate::value::Value;
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::rc::Rc;

const GLOBAL_FUNCTION_ATTRS: SlotAttributes =
    SlotAttributes { writable: true, enumerable: false, configurable: true, is_accessor: false };

/// A single ECMAScript execution environment: one realm, one agent, any
/// number of `evaluate`/`call` round-trips.
pub struct Context {
    agent: Agent,
}

impl Context {
    /// Builds a fresh context with no instruction budget (`spec.md` §5
    /// "Cancellation" is opt-in, not a default every script pays for).
    pub fn new() -> Context {
        Context { agent: Agent::new() }
    }

    /// Builds a context whose every `evaluate`/`call` shares the same fuel
    /// budget, decremented once per dispatch-loop iteration; `None` means
    /// unlimited. This is the one piece of "configuration" the engine
    /// exposes (`spec.md` §10.2).
    pub fn with_fuel_limit(fuel: Option<u64>) -> Context {
        let mut agent = Agent::new();
        agent.set_fuel_limit(fuel);
        Context { agent }
    }

    /// Parses `source` as a script and runs it as the top-level program,
    /// with `this` bound to the global object, then drains the microtask
    /// queue before returning.
    pub fn evaluate(&mut self, source: &str) -> JsResult<Value> {
        let block = Rc::new(compile_script(&mut self.agent, source)?);
        let global_environment = self.agent.global_environment();
        let this = Value::Object(self.agent.global_object());
        let result = interpreter::call_bytecode_function(&mut self.agent, &block, &global_environment, this, &[]);
        self.agent.run_microtasks();
        result
    }

    /// Invokes an already-obtained callable value (e.g. a function handed
    /// back by a prior `evaluate`), the way a host calls back into script
    /// after wiring up a native callback.
    pub fn call(&mut self, callee: &Value, this: Value, args: &[Value]) -> JsResult<Value> {
        let result = self.agent.call(callee, this, args);
        self.agent.run_microtasks();
        result
    }

    /// Installs a Rust closure as a global function, the primary way a host
    /// extends the environment script code runs in.
    pub fn define_native_function(&mut self, name: &str, length: u32, behavior: NativeFunction) {
        let func = self.agent.new_native_function(name, length, behavior);
        let global = self.agent.global_object();
        internal_methods::define_data_property(
            &global,
            PropertyKey::from_str(name),
            Value::Object(func),
            GLOBAL_FUNCTION_ATTRS,
        );
    }

    pub fn global_object(&mut self) -> ObjectHandle {
        self.agent.global_object()
    }

    /// The agent's pending-exception slot, for hosts that want to inspect a
    /// thrown value beyond its [`crate::error::JsError`] wrapper (e.g. to
    /// read a caught error's `.stack`-equivalent fields).
    pub fn take_pending_exception(&mut self) -> Option<Value> {
        self.agent.take_pending_exception()
    }

    pub fn agent(&mut self) -> &mut Agent {
        &mut self.agent
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

fn compile_script(agent: &mut Agent, source: &str) -> JsResult<crate::bytecode::BytecodeBlock> {
    let allocator = Allocator::default();
    let source_type = SourceType::default();
    let parser_result = Parser::new(&allocator, source, source_type).parse();

    if parser_result.panicked || !parser_result.errors.is_empty() {
        let message = parser_result
            .errors
            .first()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "failed to parse script".to_string());
        return Err(agent.throw_error(ErrorKind::Syntax, &message));
    }

    let generator = BytecodeGenerator::new(false);
    generator
        .generate_script(&parser_result.program)
        .map_err(|e| agent.throw_error(ErrorKind::Syntax, &e.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_a_simple_expression_statement() {
        let mut ctx = Context::new();
        let result = ctx.evaluate("1 + 2;").unwrap();
        assert!(matches!(result, Value::Int32(3) | Value::Double(3.0)));
    }

    #[test]
    fn surfaces_a_thrown_error_as_a_js_result_err() {
        let mut ctx = Context::new();
        let err = ctx.evaluate("throw new TypeError('boom');").unwrap_err();
        assert!(err.value().is_object());
    }

    #[test]
    fn fuel_exhaustion_surfaces_as_a_range_error() {
        let mut ctx = Context::with_fuel_limit(Some(1));
        let result = ctx.evaluate("let x = 1; let y = 2; x + y;");
        assert!(result.is_err());
    }

    #[test]
    fn define_native_function_is_callable_from_script() {
        let mut ctx = Context::new();
        ctx.define_native_function("double", 1, Rc::new(|agent, _this, args| {
            let n = crate::value::convert::to_number(agent, args.first().unwrap_or(&Value::Undefined))?;
            Ok(Value::number(n * 2.0))
        }));
        let result = ctx.evaluate("double(21);").unwrap();
        assert!(matches!(result, Value::Int32(42)));
    }
}
