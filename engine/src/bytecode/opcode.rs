// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Register-machine instructions (`spec.md` §4.4).
//!
//! `nova_vm`'s own `ByteCompiler` (`src/byte_compiler.rs`) emits a flat
//! `Vec<u32>` opcode-plus-immediates stream and a separate `OpCode` enum for
//! the discriminant. `spec.md` redesigns the target from a stack machine to
//! a register machine, and an instruction set with typed register operands
//! reads far better as a Rust enum than as a hand-packed `u32` stream with a
//! side table of operand widths, so `Instruction` below carries its
//! operands directly. A register is a `u16` index into the current frame's
//! register file.

pub type Reg = u16;

/// An offset into a [`crate::bytecode::block::BytecodeBlock`]'s
/// instruction vector, patched in once a label's target is known.
pub type InstrOffset = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    Lt,
    Gt,
    Le,
    Ge,
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    InstanceOf,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOp {
    Inc,
    Dec,
}

/// Index into [`crate::bytecode::block::BytecodeBlock::constants`].
pub type ConstIndex = u32;

/// Index into [`crate::bytecode::block::BytecodeBlock::children`].
pub type ChildIndex = u32;

#[derive(Debug, Clone)]
pub enum Instruction {
    LoadConst { dst: Reg, constant: ConstIndex },
    LoadUndefined { dst: Reg },
    LoadNull { dst: Reg },
    LoadTrue { dst: Reg },
    LoadFalse { dst: Reg },
    Move { dst: Reg, src: Reg },

    /// Name-based slow path: walks the scope chain looking for the binding
    /// named by `constant`, per `spec.md` §4.4 "resolve address". Used for
    /// every identifier the generator's `resolve_identifier` can't place in
    /// a register or a statically-known enclosing environment — `eval`/
    /// `with` scopes, truly free/global names, and `let`/`const`, whose TDZ
    /// bookkeeping stays on this path.
    GetVariable { dst: Reg, name: ConstIndex },
    SetVariable { name: ConstIndex, value: Reg, strict: bool },
    /// Declares a binding in the current lexical (block/function) scope
    /// without initializing it (`let`/`const` TDZ, or a `var` hoist target).
    DeclareBinding { name: ConstIndex, mutable: bool },
    InitializeBinding { name: ConstIndex, value: Reg },
    /// Fast path for a local `var`/parameter that no nested closure captures:
    /// a direct register-to-register copy that never touches an environment
    /// (`spec.md` §4.4 "three-tier variable resolution", stack tier).
    LoadByStackIndex { dst: Reg, slot: Reg },
    StoreByStackIndex { slot: Reg, value: Reg },
    /// Fast path for a `var`/parameter that a nested closure captures:
    /// `depth` is the statically-known number of enclosing function
    /// activations to walk (`frame.environment.outer`, repeated `depth`
    /// times) before doing one direct, non-probing lookup of `name` in that
    /// environment (`spec.md` §4.4 "three-tier variable resolution", heap
    /// tier). Skips `GetVariable`'s per-level `HasBinding` probing, since the
    /// generator already knows which activation owns the binding.
    LoadByHeapIndex { dst: Reg, depth: u32, name: ConstIndex },
    StoreByHeapIndex { depth: u32, name: ConstIndex, value: Reg, strict: bool },

    NewObject { dst: Reg },
    NewArray { dst: Reg },
    /// Appends `value` to the array in `array` at the next dense index.
    ArrayPush { array: Reg, value: Reg },
    /// Advances the array in `array`'s `length` by one without writing a
    /// value, leaving a true hole (array-literal elision, `[1,,3]`).
    ArrayElision { array: Reg },
    GetProperty { dst: Reg, object: Reg, key: ConstIndex, ic_slot: u32 },
    GetPropertyComputed { dst: Reg, object: Reg, key: Reg },
    SetProperty { object: Reg, key: ConstIndex, value: Reg, ic_slot: u32 },
    SetPropertyComputed { object: Reg, key: Reg, value: Reg },
    DeleteProperty { dst: Reg, object: Reg, key: ConstIndex },
    DeletePropertyComputed { dst: Reg, object: Reg, key: Reg },

    BinaryOp { op: BinaryOp, dst: Reg, lhs: Reg, rhs: Reg },
    UnaryOp { op: UnaryOp, dst: Reg, operand: Reg },
    /// Reads then writes back through the same variable/property reference;
    /// the bytecode generator expands `x++` into the appropriate
    /// `GetVariable`/`GetProperty` + this + `SetVariable`/`SetProperty`.
    UpdateOp { op: UpdateOp, dst: Reg, operand: Reg },
    ToBoolean { dst: Reg, src: Reg },
    ToNumeric { dst: Reg, src: Reg },

    Jump { target: InstrOffset },
    JumpIfTrue { cond: Reg, target: InstrOffset },
    JumpIfFalse { cond: Reg, target: InstrOffset },
    /// Short-circuit helper for `&&`/`||`/`??`: jumps with the condition
    /// register left unmodified, so the generator can reuse it as the
    /// expression's result.
    JumpIfTrueNoPop { cond: Reg, target: InstrOffset },
    JumpIfFalseNoPop { cond: Reg, target: InstrOffset },
    JumpIfNullish { cond: Reg, target: InstrOffset },

    /// `args_start..args_start+argc` is the callee's argument window in the
    /// caller's register file (`spec.md` §4.4 "LIFO register allocator").
    Call { dst: Reg, callee: Reg, this: Reg, args_start: Reg, argc: u16 },
    New { dst: Reg, callee: Reg, args_start: Reg, argc: u16 },
    Return { value: Reg },

    /// Enters a try-region; `catch_target` is where control resumes if an
    /// exception unwinds to this frame while the region is active
    /// (`spec.md` §4.4/§4.5 "try-region exception handling").
    PushTryRegion { catch_target: InstrOffset, finally_target: Option<InstrOffset> },
    PopTryRegion,
    Throw { value: Reg },
    /// Binds the in-flight exception value into `dst` at the start of a
    /// catch block and clears the agent's pending-exception slot.
    CatchBind { dst: Reg },

    PushScope { child: ChildIndex },
    PopScope,

    /// Allocates a new closure over the current scope, from child block
    /// `function`.
    MakeFunction { dst: Reg, function: ChildIndex },

    TypeOf { dst: Reg, operand: Reg },
    StrictEquals { dst: Reg, lhs: Reg, rhs: Reg },

    Nop,
}
