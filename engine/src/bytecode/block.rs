// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A compiled unit of code (`spec.md` §4.4 "BytecodeBlock"): one per
//! function body or the top-level script/`eval` body, plus its nested
//! function children.

use crate::bytecode::opcode::{Instruction, InstrOffset};
use std::rc::Rc;

/// A literal-pool entry. Holds plain Rust data rather than a `Value`
/// directly: a `BytecodeBlock` is reference-counted and shared by every
/// closure over the same source function, while `Value::String`/`Object`
/// carry `Gc` pointers the tracing collector needs to reach from scanning
/// roots. Keeping the pool `Gc`-free means a `BytecodeBlock` never needs to
/// be a trace root itself; `LoadConst` builds a fresh heap value from the
/// constant each time it runs.
#[derive(Debug, Clone)]
pub enum Constant {
    Number(f64),
    String(Rc<str>),
}

/// A source span, carried for error messages and stack traces
/// (`spec.md` §4.4 "source-location table").
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceLocation {
    pub start: u32,
    pub end: u32,
    pub line: u32,
}

/// A `(start, end)` instruction range protected by a try statement, plus
/// where to resume on an exception or on `return`/`break`/`continue`
/// passing through a `finally` (`spec.md` §4.4/§4.5 "try-region exception
/// handling").
#[derive(Debug, Clone, Copy)]
pub struct TryRegion {
    pub start: InstrOffset,
    pub end: InstrOffset,
    pub catch_target: Option<InstrOffset>,
    pub finally_target: Option<InstrOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Normal,
    Arrow,
}

#[derive(Debug)]
pub struct BytecodeBlock {
    pub instructions: Vec<Instruction>,
    pub constants: Vec<Constant>,
    /// Inline-cache slot count; `GetProperty`/`SetProperty` index into a
    /// per-frame IC array sized to this (`spec.md` §4.4 "inline caches").
    pub ic_slot_count: u32,
    /// Size of the register file a frame for this block must allocate.
    pub register_count: u16,
    pub source_locations: Vec<(InstrOffset, SourceLocation)>,
    pub try_regions: Vec<TryRegion>,
    /// Nested function expressions/declarations, referenced by
    /// `Instruction::MakeFunction`'s `ChildIndex`.
    pub children: Vec<Rc<BytecodeBlock>>,
    pub param_count: u32,
    pub is_strict: bool,
    pub kind: FunctionKind,
    /// `true` when this function body declares at least one nested
    /// function/arrow expression, i.e. it may have locals a closure
    /// captures (`spec.md` §4.4/§4.6). The generator's `resolve_identifier`
    /// uses this to decide, for each of the function's own `var`/parameter
    /// bindings, whether it is safe to keep the binding purely in a
    /// register (no nested closure can observe it) or whether it must also
    /// live in `frame.environment` so an inner closure sees the same
    /// mutable cell (`spec.md` §4.4 "three-tier variable resolution").
    pub captures_locals: bool,
    pub name: Rc<str>,
}

impl BytecodeBlock {
    pub fn source_location_for(&self, pc: InstrOffset) -> Option<SourceLocation> {
        self.source_locations
            .iter()
            .rev()
            .find(|(offset, _)| *offset <= pc)
            .map(|(_, loc)| *loc)
    }

    pub fn try_region_for(&self, pc: InstrOffset) -> Option<&TryRegion> {
        self.try_regions
            .iter()
            .filter(|r| r.start <= pc && pc < r.end)
            .min_by_key(|r| r.end - r.start)
    }
}
