// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The bytecode dispatch loop (`spec.md` §4.5).
//!
//! Grounded in `execution_context.rs`'s split between an `Agent`'s shared
//! state and the per-activation `ExecutionContext`: a [`Frame`] here plays
//! the role of that `ExecutionContext`, but carries a register file instead
//! of an environment-record-only evaluation state, since expression
//! intermediates live in registers rather than on an operand stack.

use crate::agent::Agent;
use crate::bytecode::block::{BytecodeBlock, FunctionKind};
use crate::bytecode::opcode::{BinaryOp, Instruction, InstrOffset, Reg, UnaryOp, UpdateOp};
use crate::environment::{self, EnvironmentHandle};
use crate::error::{ErrorKind, JsError, JsResult};
use crate::object::internal_methods;
use crate::object::property_key::PropertyKey;
use crate::object::{FunctionData, Object, ObjectHandle, ObjectRareData, Slot};
use crate::value::convert;
use crate::value::Value;
use std::rc::Rc;

/// A single activation record. `registers` is sized to
/// `BytecodeBlock::register_count` up front; `PushTryRegion`'s catch target
/// is looked up lazily from `block.try_regions` rather than maintained as a
/// runtime stack, since a `BytecodeBlock`'s regions already carry their own
/// nesting via `(start, end)` ranges (`spec.md` §4.4 "try-region exception
/// handling"). `inline_cache` is indexed by `GetProperty`/`SetProperty`'s
/// `ic_slot` and records `(structure_id, slot_index)` of the last object
/// shape that instruction saw (`spec.md` §4.4 "inline caches").
struct Frame {
    block: Rc<BytecodeBlock>,
    registers: Vec<Value>,
    environment: EnvironmentHandle,
    inline_cache: Vec<Option<(usize, u32)>>,
    pc: InstrOffset,
}

impl Frame {
    fn new(block: Rc<BytecodeBlock>, environment: EnvironmentHandle) -> Frame {
        let registers = vec![Value::Undefined; block.register_count as usize];
        let inline_cache = vec![None; block.ic_slot_count as usize];
        Frame { block, registers, environment, inline_cache, pc: 0 }
    }

    fn get(&self, r: Reg) -> Value {
        self.registers[r as usize].clone()
    }

    fn set(&mut self, r: Reg, v: Value) {
        self.registers[r as usize] = v;
    }
}

pub fn call_bytecode_function(
    agent: &mut Agent,
    block: &Rc<BytecodeBlock>,
    closure_environment: &EnvironmentHandle,
    this: Value,
    args: &[Value],
) -> JsResult<Value> {
    let call_environment = environment::new_declarative_environment(Some(closure_environment.clone()));
    // An arrow function's body never shadows the lexically enclosing
    // function's `this`/`arguments` — both resolve through the unchanged
    // name-based tier, walking past this environment to the one the arrow
    // closed over (`spec.md` §4.6 "Scope & closures").
    if block.kind != FunctionKind::Arrow {
        let this_name: Rc<str> = Rc::from("this");
        environment::create_immutable_binding(&call_environment, this_name.clone());
        environment::initialize_binding(&call_environment, &this_name, this);

        let arguments_name: Rc<str> = Rc::from("arguments");
        environment::create_mutable_binding(&call_environment, arguments_name.clone(), true);
        let arguments_object = build_arguments_object(agent, args);
        environment::initialize_binding(&call_environment, &arguments_name, Value::Object(arguments_object));
    }

    let mut frame = Frame::new(Rc::clone(block), call_environment.clone());
    for i in 0..block.param_count as usize {
        let value = args.get(i).cloned().unwrap_or(Value::Undefined);
        frame.set(i as Reg, value);
    }

    run_frame(agent, &mut frame)
}

fn build_arguments_object(agent: &mut Agent, args: &[Value]) -> ObjectHandle {
    let proto = agent.object_prototype();
    let obj = ObjectHandle::new(Object::new_with_kind(
        Some(proto),
        ObjectRareData::Array(crate::object::ArrayStorage::new()),
    ));
    for (i, arg) in args.iter().enumerate() {
        if let Some(array) = obj.borrow_mut().as_array_mut() {
            array.set_dense(i as u32, arg.clone());
        }
    }
    obj
}

/// Runs `frame` to completion, returning the value of the `Return`
/// instruction that ends it, or propagating a thrown exception after
/// consulting the frame's `try_regions` for a handler.
fn run_frame(agent: &mut Agent, frame: &mut Frame) -> JsResult<Value> {
    loop {
        match step(agent, frame) {
            Ok(Some(return_value)) => return Ok(return_value),
            Ok(None) => continue,
            Err(err) => {
                if let Some(region) = frame.block.try_region_for(frame.pc) {
                    if let Some(catch_target) = region.catch_target {
                        agent.set_pending_exception(err.into_value());
                        frame.pc = catch_target;
                        continue;
                    }
                    if let Some(finally_target) = region.finally_target {
                        frame.pc = finally_target;
                        continue;
                    }
                }
                return Err(err);
            }
        }
    }
}

/// Executes one instruction. Returns `Ok(Some(value))` on `Return`,
/// `Ok(None)` to keep looping, `Err` to unwind.
fn step(agent: &mut Agent, frame: &mut Frame) -> JsResult<Option<Value>> {
    agent.consume_fuel()?;

    let pc = frame.pc as usize;
    let instr = frame.block.instructions[pc].clone();
    frame.pc += 1;

    match instr {
        Instruction::LoadConst { dst, constant } => {
            let value = load_constant(&frame.block, constant);
            frame.set(dst, value);
        }
        Instruction::LoadUndefined { dst } => frame.set(dst, Value::Undefined),
        Instruction::LoadNull { dst } => frame.set(dst, Value::Null),
        Instruction::LoadTrue { dst } => frame.set(dst, Value::Bool(true)),
        Instruction::LoadFalse { dst } => frame.set(dst, Value::Bool(false)),
        Instruction::Move { dst, src } => frame.set(dst, frame.get(src)),

        Instruction::GetVariable { dst, name } => {
            let name = constant_name(&frame.block, name);
            let owner = environment::resolve_binding(agent, &frame.environment, &name)?;
            let target = owner.unwrap_or_else(|| frame.environment.clone());
            let value = environment::get_binding_value(agent, &target, &name, frame.block.is_strict)?;
            frame.set(dst, value);
        }
        Instruction::SetVariable { name, value, strict } => {
            let name = constant_name(&frame.block, name);
            let value = frame.get(value);
            let owner = environment::resolve_binding(agent, &frame.environment, &name)?;
            let target = owner.unwrap_or_else(|| frame.environment.clone());
            environment::set_mutable_binding(agent, &target, &name, value, strict)?;
        }
        Instruction::LoadByStackIndex { dst, slot } => {
            let value = frame.get(slot);
            frame.set(dst, value);
        }
        Instruction::StoreByStackIndex { slot, value } => {
            let value = frame.get(value);
            frame.set(slot, value);
        }
        Instruction::LoadByHeapIndex { dst, depth, name } => {
            let name = constant_name(&frame.block, name);
            let target = environment::environment_at_depth(&frame.environment, depth);
            let value = environment::get_binding_value(agent, &target, &name, frame.block.is_strict)?;
            frame.set(dst, value);
        }
        Instruction::StoreByHeapIndex { depth, name, value, strict } => {
            let name = constant_name(&frame.block, name);
            let value = frame.get(value);
            let target = environment::environment_at_depth(&frame.environment, depth);
            environment::set_mutable_binding(agent, &target, &name, value, strict)?;
        }
        Instruction::DeclareBinding { name, mutable } => {
            let name = constant_name(&frame.block, name);
            if mutable {
                environment::create_mutable_binding(&frame.environment, Rc::from(name.as_str()), false);
            } else {
                environment::create_immutable_binding(&frame.environment, Rc::from(name.as_str()));
            }
        }
        Instruction::InitializeBinding { name, value } => {
            let name = constant_name(&frame.block, name);
            let value = frame.get(value);
            environment::initialize_binding(&frame.environment, &name, value);
        }

        Instruction::NewObject { dst } => {
            let proto = agent.object_prototype();
            let obj = ObjectHandle::new(Object::new(Some(proto)));
            frame.set(dst, Value::Object(obj));
        }
        Instruction::NewArray { dst } => {
            let proto = agent.array_prototype();
            let obj = ObjectHandle::new(Object::new_with_kind(Some(proto), ObjectRareData::Array(crate::object::ArrayStorage::new())));
            frame.set(dst, Value::Object(obj));
        }
        Instruction::ArrayPush { array, value } => {
            let array_value = frame.get(array);
            let value = frame.get(value);
            let Some(obj) = array_value.as_object() else {
                return Err(agent.throw_error(ErrorKind::Type, "ArrayPush target is not an object"));
            };
            let index = obj.borrow().as_array().map(|a| a.length).unwrap_or(0);
            internal_methods::set_indexed(agent, obj, index, value)?;
        }
        Instruction::ArrayElision { array } => {
            let array_value = frame.get(array);
            let Some(obj) = array_value.as_object() else {
                return Err(agent.throw_error(ErrorKind::Type, "ArrayPush target is not an object"));
            };
            if let Some(storage) = obj.borrow_mut().as_array_mut() {
                storage.length += 1;
            };
        }

        Instruction::GetProperty { dst, object, key, ic_slot } => {
            let object_value = frame.get(object);
            let key_name = constant_name(&frame.block, key);
            let value = match object_value.as_object() {
                Some(obj) => {
                    let cached = ic_lookup(frame, ic_slot, obj)
                        .filter(|&slot_index| !obj.borrow().structure.attributes_at(slot_index).is_accessor);
                    if let Some(slot_index) = cached {
                        obj.borrow().values[slot_index as usize].data().cloned().unwrap_or(Value::Undefined)
                    } else {
                        let key = PropertyKey::from_str(&key_name);
                        let value = internal_methods::get(agent, obj, &key, &object_value)?;
                        if let Some(slot_index) = obj.borrow().structure.lookup(&key) {
                            if !obj.borrow().structure.attributes_at(slot_index).is_accessor {
                                ic_record(frame, ic_slot, obj, slot_index);
                            }
                        }
                        value
                    }
                }
                None => {
                    let key = PropertyKey::from_str(&key_name);
                    let obj = convert::to_object(agent, &object_value)?;
                    internal_methods::get(agent, &obj, &key, &object_value)?
                }
            };
            frame.set(dst, value);
        }
        Instruction::GetPropertyComputed { dst, object, key } => {
            let object_value = frame.get(object);
            let key_value = frame.get(key);
            let key = convert::to_property_key(agent, &key_value)?;
            let obj = convert::to_object(agent, &object_value)?;
            let value = internal_methods::get(agent, &obj, &key, &object_value)?;
            frame.set(dst, value);
        }
        Instruction::SetProperty { object, key, value, ic_slot } => {
            let object_value = frame.get(object);
            let key_name = constant_name(&frame.block, key);
            let value = frame.get(value);
            let Some(obj) = object_value.as_object() else {
                return Err(agent.throw_error(ErrorKind::Type, "cannot set property of a non-object"));
            };
            let cached = ic_lookup(frame, ic_slot, obj).filter(|&slot_index| {
                let attrs = obj.borrow().structure.attributes_at(slot_index);
                attrs.writable && !attrs.is_accessor
            });
            if let Some(slot_index) = cached {
                ic_store(obj, slot_index, value);
            } else {
                let key = PropertyKey::from_str(&key_name);
                internal_methods::set(agent, obj, &key, value, &object_value)?;
                if let Some(slot_index) = obj.borrow().structure.lookup(&key) {
                    let attrs = obj.borrow().structure.attributes_at(slot_index);
                    if attrs.writable && !attrs.is_accessor {
                        ic_record(frame, ic_slot, obj, slot_index);
                    }
                }
            }
        }
        Instruction::SetPropertyComputed { object, key, value } => {
            let object_value = frame.get(object);
            let key_value = frame.get(key);
            let key = convert::to_property_key(agent, &key_value)?;
            let value = frame.get(value);
            let Some(obj) = object_value.as_object() else {
                return Err(agent.throw_error(ErrorKind::Type, "cannot set property of a non-object"));
            };
            internal_methods::set(agent, obj, &key, value, &object_value)?;
        }
        Instruction::DeleteProperty { dst, object, key } => {
            let object_value = frame.get(object);
            let key = PropertyKey::from_str(&constant_name(&frame.block, key));
            let deleted = match object_value.as_object() {
                Some(obj) => internal_methods::delete(obj, &key),
                None => true,
            };
            frame.set(dst, Value::Bool(deleted));
        }
        Instruction::DeletePropertyComputed { dst, object, key } => {
            let object_value = frame.get(object);
            let key_value = frame.get(key);
            let key = convert::to_property_key(agent, &key_value)?;
            let deleted = match object_value.as_object() {
                Some(obj) => internal_methods::delete(obj, &key),
                None => true,
            };
            frame.set(dst, Value::Bool(deleted));
        }

        Instruction::BinaryOp { op, dst, lhs, rhs } => {
            let lhs = frame.get(lhs);
            let rhs = frame.get(rhs);
            let result = eval_binary_op(agent, op, &lhs, &rhs)?;
            frame.set(dst, result);
        }
        Instruction::UnaryOp { op, dst, operand } => {
            let operand = frame.get(operand);
            let result = eval_unary_op(agent, op, &operand)?;
            frame.set(dst, result);
        }
        Instruction::UpdateOp { op, dst, operand } => {
            let operand = frame.get(operand);
            let n = convert::to_number(agent, &operand)?;
            let result = match op {
                UpdateOp::Inc => n + 1.0,
                UpdateOp::Dec => n - 1.0,
            };
            frame.set(dst, Value::number(result));
        }
        Instruction::ToBoolean { dst, src } => {
            let v = frame.get(src);
            frame.set(dst, Value::Bool(v.to_boolean()));
        }
        Instruction::ToNumeric { dst, src } => {
            let v = frame.get(src);
            let n = convert::to_number(agent, &v)?;
            frame.set(dst, Value::number(n));
        }

        Instruction::Jump { target } => frame.pc = target,
        Instruction::JumpIfTrue { cond, target } => {
            if frame.get(cond).to_boolean() {
                frame.pc = target;
            }
        }
        Instruction::JumpIfFalse { cond, target } => {
            if !frame.get(cond).to_boolean() {
                frame.pc = target;
            }
        }
        Instruction::JumpIfTrueNoPop { cond, target } => {
            if frame.get(cond).to_boolean() {
                frame.pc = target;
            }
        }
        Instruction::JumpIfFalseNoPop { cond, target } => {
            if !frame.get(cond).to_boolean() {
                frame.pc = target;
            }
        }
        Instruction::JumpIfNullish { cond, target } => {
            if frame.get(cond).is_nullish() {
                frame.pc = target;
            }
        }

        Instruction::Call { dst, callee, this, args_start, argc } => {
            let callee_value = frame.get(callee);
            let this_value = frame.get(this);
            let args: Vec<Value> = (0..argc).map(|i| frame.get(args_start + i)).collect();
            let result = agent.call(&callee_value, this_value, &args)?;
            frame.set(dst, result);
        }
        Instruction::New { dst, callee, args_start, argc } => {
            let callee_value = frame.get(callee);
            let args: Vec<Value> = (0..argc).map(|i| frame.get(args_start + i)).collect();
            let result = agent.construct(&callee_value, &args)?;
            frame.set(dst, result);
        }
        Instruction::Return { value } => return Ok(Some(frame.get(value))),

        Instruction::PushTryRegion { .. } | Instruction::PopTryRegion => {
            // Try-region bounds are read directly from `block.try_regions`
            // on unwind; these markers only exist for a disassembler to
            // display source-level nesting and are no-ops at runtime.
        }
        Instruction::Throw { value } => {
            return Err(JsError::new(frame.get(value)));
        }
        Instruction::CatchBind { dst } => {
            let exception = agent.take_pending_exception().unwrap_or(Value::Undefined);
            frame.set(dst, exception);
        }

        Instruction::PushScope { .. } | Instruction::PopScope => {
            // Block-scoped `let`/`const` bindings live directly in
            // `frame.environment`'s declarative environment; nested block
            // scopes are modeled by the generator pushing/popping its own
            // compile-time `ScopeStack`, not a runtime environment swap,
            // since the environment a closure captures is the one live at
            // `MakeFunction` time regardless of later sibling blocks.
        }

        Instruction::MakeFunction { dst, function } => {
            let child = Rc::clone(&frame.block.children[function as usize]);
            let name = Rc::clone(&child.name);
            let length = child.param_count;
            let proto = agent.function_prototype();
            let obj = ObjectHandle::new(Object::new_with_kind(
                Some(proto),
                ObjectRareData::Function(FunctionData::Bytecode {
                    block: child,
                    environment: frame.environment.clone(),
                    name,
                    length,
                }),
            ));
            frame.set(dst, Value::Object(obj));
        }

        Instruction::TypeOf { dst, operand } => {
            let v = frame.get(operand);
            frame.set(dst, Value::from_str(v.type_of()));
        }
        Instruction::StrictEquals { dst, lhs, rhs } => {
            let lhs = frame.get(lhs);
            let rhs = frame.get(rhs);
            frame.set(dst, Value::Bool(convert::strict_equals(&lhs, &rhs)));
        }

        Instruction::Nop => {}
    }

    Ok(None)
}

/// Looks up `ic_slot`'s cached slot index, returning it only if `obj`'s
/// structure still matches the one the cache was recorded against
/// (`spec.md` §4.4 "inline caches"). `Structure::id()` is a pointer
/// identity, not a value comparison, so this is a guard against a
/// *different* shape reusing the slot, not a staleness check on `obj`
/// itself.
fn ic_lookup(frame: &Frame, ic_slot: u32, obj: &ObjectHandle) -> Option<u32> {
    let (structure_id, slot_index) = frame.inline_cache[ic_slot as usize]?;
    if obj.borrow().structure.id() == structure_id {
        Some(slot_index)
    } else {
        None
    }
}

fn ic_record(frame: &mut Frame, ic_slot: u32, obj: &ObjectHandle, slot_index: u32) {
    frame.inline_cache[ic_slot as usize] = Some((obj.borrow().structure.id(), slot_index));
}

/// Overwrites a cached data slot directly, bypassing `[[DefineOwnProperty]]`
/// — valid only because the caller has already rejected accessor slots
/// before reaching here.
fn ic_store(obj: &ObjectHandle, slot_index: u32, value: Value) {
    obj.borrow_mut().set_slot_value(slot_index, Slot::Data(value));
}

fn load_constant(block: &BytecodeBlock, index: u32) -> Value {
    match &block.constants[index as usize] {
        crate::bytecode::block::Constant::Number(n) => Value::number(*n),
        crate::bytecode::block::Constant::String(s) => Value::from_str(s),
    }
}

fn constant_name(block: &BytecodeBlock, index: u32) -> String {
    match &block.constants[index as usize] {
        crate::bytecode::block::Constant::String(s) => s.to_string(),
        crate::bytecode::block::Constant::Number(n) => crate::value::number::to_string_radix(*n, 10),
    }
}

fn eval_binary_op(agent: &mut Agent, op: BinaryOp, lhs: &Value, rhs: &Value) -> JsResult<Value> {
    match op {
        BinaryOp::Add => add(agent, lhs, rhs),
        BinaryOp::Sub => Ok(Value::number(convert::to_number(agent, lhs)? - convert::to_number(agent, rhs)?)),
        BinaryOp::Mul => Ok(Value::number(convert::to_number(agent, lhs)? * convert::to_number(agent, rhs)?)),
        BinaryOp::Div => Ok(Value::number(convert::to_number(agent, lhs)? / convert::to_number(agent, rhs)?)),
        BinaryOp::Mod => Ok(Value::number(convert::to_number(agent, lhs)? % convert::to_number(agent, rhs)?)),
        BinaryOp::Exp => Ok(Value::number(convert::to_number(agent, lhs)?.powf(convert::to_number(agent, rhs)?))),
        BinaryOp::BitAnd => Ok(Value::from(to_int32(agent, lhs)? & to_int32(agent, rhs)?)),
        BinaryOp::BitOr => Ok(Value::from(to_int32(agent, lhs)? | to_int32(agent, rhs)?)),
        BinaryOp::BitXor => Ok(Value::from(to_int32(agent, lhs)? ^ to_int32(agent, rhs)?)),
        BinaryOp::Shl => Ok(Value::from(to_int32(agent, lhs)?.wrapping_shl(to_uint32(agent, rhs)? & 0x1f))),
        BinaryOp::Shr => Ok(Value::from(to_int32(agent, lhs)?.wrapping_shr(to_uint32(agent, rhs)? & 0x1f))),
        BinaryOp::UShr => {
            let l = to_uint32(agent, lhs)?;
            let r = to_uint32(agent, rhs)? & 0x1f;
            Ok(Value::number((l >> r) as f64))
        }
        BinaryOp::Lt => compare(agent, lhs, rhs, |o| o == std::cmp::Ordering::Less),
        BinaryOp::Gt => compare(agent, lhs, rhs, |o| o == std::cmp::Ordering::Greater),
        BinaryOp::Le => compare(agent, lhs, rhs, |o| o != std::cmp::Ordering::Greater),
        BinaryOp::Ge => compare(agent, lhs, rhs, |o| o != std::cmp::Ordering::Less),
        BinaryOp::StrictEq => Ok(Value::Bool(convert::strict_equals(lhs, rhs))),
        BinaryOp::StrictNe => Ok(Value::Bool(!convert::strict_equals(lhs, rhs))),
        BinaryOp::LooseEq => Ok(Value::Bool(convert::loose_equals(agent, lhs, rhs)?)),
        BinaryOp::LooseNe => Ok(Value::Bool(!convert::loose_equals(agent, lhs, rhs)?)),
        BinaryOp::InstanceOf => agent.instance_of(lhs, rhs),
        BinaryOp::In => {
            let Some(obj) = rhs.as_object() else {
                return Err(agent.throw_error(ErrorKind::Type, "cannot use 'in' operator on a non-object"));
            };
            let key = convert::to_property_key(agent, lhs)?;
            Ok(Value::Bool(internal_methods::has_property(agent, obj, &key)?))
        }
    }
}

/// ### [The Addition operator ( + )](https://tc39.es/ecma262/#sec-addition-operator-plus)
fn add(agent: &mut Agent, lhs: &Value, rhs: &Value) -> JsResult<Value> {
    let lprim = convert::to_primitive(agent, lhs, convert::PreferredType::Default)?;
    let rprim = convert::to_primitive(agent, rhs, convert::PreferredType::Default)?;
    if lprim.is_string() || rprim.is_string() {
        let ls = convert::to_string(agent, &lprim)?;
        let rs = convert::to_string(agent, &rprim)?;
        return Ok(Value::string(ls.concat(&rs)));
    }
    Ok(Value::number(convert::to_number(agent, &lprim)? + convert::to_number(agent, &rprim)?))
}

fn compare(agent: &mut Agent, lhs: &Value, rhs: &Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> JsResult<Value> {
    let lprim = convert::to_primitive(agent, lhs, convert::PreferredType::Number)?;
    let rprim = convert::to_primitive(agent, rhs, convert::PreferredType::Number)?;
    if lprim.is_string() && rprim.is_string() {
        let ls = convert::to_string(agent, &lprim)?;
        let rs = convert::to_string(agent, &rprim)?;
        let ordering = ls.to_string_lossy().cmp(&rs.to_string_lossy());
        return Ok(Value::Bool(accept(ordering)));
    }
    let ln = convert::to_number(agent, &lprim)?;
    let rn = convert::to_number(agent, &rprim)?;
    match ln.partial_cmp(&rn) {
        Some(ordering) => Ok(Value::Bool(accept(ordering))),
        None => Ok(Value::Bool(false)),
    }
}

fn eval_unary_op(agent: &mut Agent, op: UnaryOp, operand: &Value) -> JsResult<Value> {
    match op {
        UnaryOp::Neg => Ok(Value::number(-convert::to_number(agent, operand)?)),
        UnaryOp::Plus => Ok(Value::number(convert::to_number(agent, operand)?)),
        UnaryOp::Not => Ok(Value::Bool(!operand.to_boolean())),
        UnaryOp::BitNot => Ok(Value::from(!to_int32(agent, operand)?)),
        UnaryOp::TypeOf => Ok(Value::from_str(operand.type_of())),
        UnaryOp::Void => Ok(Value::Undefined),
        UnaryOp::Delete => Ok(Value::Bool(true)),
    }
}

/// ### [ToInt32 ( argument )](https://tc39.es/ecma262/#sec-toint32)
fn to_int32(agent: &mut Agent, v: &Value) -> JsResult<i32> {
    Ok(to_uint32(agent, v)? as i32)
}

/// ### [ToUint32 ( argument )](https://tc39.es/ecma262/#sec-touint32)
fn to_uint32(agent: &mut Agent, v: &Value) -> JsResult<u32> {
    let n = convert::to_number(agent, v)?;
    if !n.is_finite() || n == 0.0 {
        return Ok(0);
    }
    let n = n.trunc();
    let modulo = n.rem_euclid(4294967296.0);
    Ok(modulo as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint32_wraps_like_ecma_touint32() {
        let mut agent = Agent::new();
        assert_eq!(to_uint32(&mut agent, &Value::number(-1.0)).unwrap(), u32::MAX);
        assert_eq!(to_uint32(&mut agent, &Value::number(4294967296.0)).unwrap(), 0);
    }
}
