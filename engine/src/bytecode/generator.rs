// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lowers an `oxc_ast` tree into a [`BytecodeBlock`] (`spec.md` §4.4).
//!
//! `byte_compiler.rs` matches directly over `oxc_ast::ast::{Expression,
//! Statement, Declaration}` node kinds with no intermediate custom AST —
//! this generator keeps that shape, but targets a register machine instead
//! of `byte_compiler.rs`'s stack machine (`spec.md` §9's redesign), and
//! fills in the expression/statement kinds that file left as `todo!()`.
//! Parsing itself is entirely out of scope (`spec.md` §1 Non-goals) — the
//! generator only ever consumes an already-parsed `oxc_ast::ast::Program`.

use crate::bytecode::block::{BytecodeBlock, Constant, FunctionKind, SourceLocation, TryRegion};
use crate::bytecode::opcode::{BinaryOp, Instruction, InstrOffset, Reg, UnaryOp, UpdateOp};
use crate::bytecode::scope::{BindingKind, ScopeKind, ScopeStack};
use oxc_ast::ast;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct UnsupportedSyntax(pub String);

pub type GenResult<T> = Result<T, UnsupportedSyntax>;

fn unsupported(what: &str) -> UnsupportedSyntax {
    UnsupportedSyntax(format!("unsupported syntax: {what}"))
}

/// Label for a not-yet-resolved jump target; `generator.label()` reserves
/// one, `generator.bind_label()` records where it actually points, and
/// `generator.finish()` rewrites every `Instruction` that referenced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Label(u32);

/// Where a `break`/`continue` targeting statement resolves to, and how deep
/// in `try`-with-`finally` nesting the statement that pushed this entry was
/// (`spec.md` §4.4 "labeled statements"). Every loop pushes one of these
/// (named, if a `LabeledStatement` wraps it directly) around its own body; a
/// `switch` pushes one that supports `break` only; a non-loop
/// `LabeledStatement` pushes one that supports only a *labeled* `break`.
struct LabelEntry {
    name: Option<Rc<str>>,
    break_target: Label,
    continue_target: Option<Label>,
    breakable_without_label: bool,
    try_depth_at_entry: u32,
}

/// Three-tier resolution result for an identifier reference (`spec.md`
/// §4.4 "three-tier variable resolution"): a dedicated register, a direct,
/// depth-known environment lookup that skips scope-chain probing, or the
/// name-based slow path.
enum Resolved {
    Stack(Reg),
    Heap(u32),
    Name,
}

pub struct BytecodeGenerator {
    instructions: Vec<Instruction>,
    constants: Vec<Constant>,
    source_locations: Vec<(InstrOffset, SourceLocation)>,
    try_regions: Vec<TryRegion>,
    children: Vec<Rc<BytecodeBlock>>,
    scopes: ScopeStack,
    /// LIFO register allocator (`spec.md` §4.4): `next_register` only ever
    /// grows during an expression's evaluation and is restored to a saved
    /// checkpoint once the expression's result has been consumed, so
    /// sibling subexpressions reuse the same registers instead of each
    /// claiming new ones. Registers reserved for this function's own
    /// stack-tier locals (see `local_slots`) are never restored past.
    next_register: Reg,
    max_register: Reg,
    labels: Vec<Option<InstrOffset>>,
    pending_patches: Vec<(InstrOffset, Label)>,
    is_strict: bool,
    /// `true` once this function's body is known (via a pre-pass over its
    /// own AST, before any instruction is emitted) to declare a nested
    /// function/arrow expression. Decides, uniformly for every `var`/
    /// parameter/function-name binding this function owns, whether they
    /// live in dedicated registers (`local_slots`) or in `frame.environment`
    /// (`spec.md` §4.4 "three-tier variable resolution"). `let`/`const` and
    /// `this`/`arguments` are unaffected either way — they always resolve
    /// through the name-based tier.
    captures_locals: bool,
    /// Stack-tier register assignment for this function's own `var`/
    /// parameter bindings. Only ever populated when `captures_locals` is
    /// `false`; empty otherwise.
    local_slots: HashMap<Rc<str>, Reg>,
    /// Declared-names sets of enclosing functions, innermost first (index
    /// `i` corresponds to `LoadByHeapIndex`/`StoreByHeapIndex`'s `depth`
    /// `i + 1`). Built once per nested function in `emit_function`/
    /// `emit_arrow_function` by prepending the compiling function's own
    /// declared names. Every entry here belongs to a function whose own
    /// `captures_locals` is necessarily `true` — it has at least the
    /// function currently being compiled as a nested closure.
    enclosing_heap_scopes: Vec<Rc<HashSet<Rc<str>>>>,
    next_ic_slot: u32,
    label_stack: Vec<LabelEntry>,
    /// Count of enclosing `try` regions that have a `finally` block
    /// (`spec.md` §4.4/§4.5). `emit_break`/`emit_continue` compare this
    /// against the target loop/label's depth at the time it was pushed, and
    /// `emit_return` checks it directly; any of the three that would cross a
    /// `try`-with-`finally` boundary is rejected rather than silently
    /// skipping the `finally` block.
    try_depth: u32,
}

impl BytecodeGenerator {
    pub fn new(is_strict: bool) -> BytecodeGenerator {
        let mut scopes = ScopeStack::new();
        scopes.push(ScopeKind::Function, is_strict);
        BytecodeGenerator {
            instructions: Vec::new(),
            constants: Vec::new(),
            source_locations: Vec::new(),
            try_regions: Vec::new(),
            children: Vec::new(),
            scopes,
            next_register: 0,
            max_register: 0,
            labels: Vec::new(),
            pending_patches: Vec::new(),
            is_strict,
            captures_locals: false,
            local_slots: HashMap::new(),
            enclosing_heap_scopes: Vec::new(),
            next_ic_slot: 0,
            label_stack: Vec::new(),
            try_depth: 0,
        }
    }

    // ---- register allocation ----

    fn alloc_register(&mut self) -> Reg {
        let r = self.next_register;
        self.next_register += 1;
        self.max_register = self.max_register.max(self.next_register);
        r
    }

    fn checkpoint(&self) -> Reg {
        self.next_register
    }

    fn restore(&mut self, checkpoint: Reg) {
        self.next_register = checkpoint;
    }

    // ---- constants ----

    fn number_constant(&mut self, n: f64) -> u32 {
        self.constants.push(Constant::Number(n));
        (self.constants.len() - 1) as u32
    }

    fn string_constant(&mut self, s: &str) -> u32 {
        if let Some(i) = self.constants.iter().position(|c| matches!(c, Constant::String(existing) if &**existing == s)) {
            return i as u32;
        }
        self.constants.push(Constant::String(Rc::from(s)));
        (self.constants.len() - 1) as u32
    }

    // ---- inline caches ----

    /// Reserves the next inline-cache slot for a `GetProperty`/`SetProperty`
    /// emission site (`spec.md` §4.4 "inline caches"); each static-key
    /// member access gets its own slot, polled once per activation of this
    /// block.
    fn alloc_ic_slot(&mut self) -> u32 {
        let slot = self.next_ic_slot;
        self.next_ic_slot += 1;
        slot
    }

    // ---- labels ----

    fn new_label(&mut self) -> Label {
        self.labels.push(None);
        Label((self.labels.len() - 1) as u32)
    }

    fn bind_label(&mut self, label: Label) {
        self.labels[label.0 as usize] = Some(self.instructions.len() as InstrOffset);
    }

    fn emit(&mut self, instr: Instruction) -> InstrOffset {
        self.instructions.push(instr);
        (self.instructions.len() - 1) as InstrOffset
    }

    fn emit_jump_to_label(&mut self, make: impl FnOnce(InstrOffset) -> Instruction, label: Label) {
        let offset = self.emit(make(u32::MAX));
        self.pending_patches.push((offset, label));
    }

    fn patch_labels(&mut self) {
        for (offset, label) in std::mem::take(&mut self.pending_patches) {
            let target = self.labels[label.0 as usize].expect("label never bound");
            match &mut self.instructions[offset as usize] {
                Instruction::Jump { target: t }
                | Instruction::JumpIfTrue { target: t, .. }
                | Instruction::JumpIfFalse { target: t, .. }
                | Instruction::JumpIfTrueNoPop { target: t, .. }
                | Instruction::JumpIfFalseNoPop { target: t, .. }
                | Instruction::JumpIfNullish { target: t, .. } => *t = target,
                _ => unreachable!("patch target is not a jump instruction"),
            }
        }
    }

    fn find_break_target(&self, name: Option<&str>) -> GenResult<(Label, u32)> {
        match name {
            Some(n) => self
                .label_stack
                .iter()
                .rev()
                .find(|e| e.name.as_deref() == Some(n))
                .map(|e| (e.break_target, e.try_depth_at_entry))
                .ok_or_else(|| unsupported(&format!("undefined label '{n}'"))),
            None => self
                .label_stack
                .iter()
                .rev()
                .find(|e| e.breakable_without_label)
                .map(|e| (e.break_target, e.try_depth_at_entry))
                .ok_or_else(|| unsupported("break outside of a loop or switch")),
        }
    }

    fn find_continue_target(&self, name: Option<&str>) -> GenResult<(Label, u32)> {
        match name {
            Some(n) => self
                .label_stack
                .iter()
                .rev()
                .find(|e| e.name.as_deref() == Some(n) && e.continue_target.is_some())
                .map(|e| (e.continue_target.unwrap(), e.try_depth_at_entry))
                .ok_or_else(|| unsupported(&format!("undefined label '{n}'"))),
            None => self
                .label_stack
                .iter()
                .rev()
                .find(|e| e.continue_target.is_some())
                .map(|e| (e.continue_target.unwrap(), e.try_depth_at_entry))
                .ok_or_else(|| unsupported("continue outside of a loop")),
        }
    }

    // ---- identifier resolution ----

    /// Picks which of the three tiers an identifier reference resolves
    /// through (`spec.md` §4.4 "three-tier variable resolution"): a scope
    /// containing `eval` forces every enclosed reference to the name-based
    /// tier; otherwise a `var`/parameter/function-name binding this
    /// function (or an enclosing one) owns resolves to a register or a
    /// depth-known environment lookup, and everything else — `let`/`const`,
    /// `this`/`arguments`, and truly free/global names — stays on the
    /// name-based tier.
    fn resolve_identifier(&self, name: &str) -> Resolved {
        if self.scopes.has_eval_in_function() {
            return Resolved::Name;
        }
        if let Some(kind) = self.scopes.lookup(name) {
            if !kind.is_var_or_parameter() {
                return Resolved::Name;
            }
            return if self.captures_locals {
                Resolved::Heap(0)
            } else if let Some(&slot) = self.local_slots.get(name) {
                Resolved::Stack(slot)
            } else {
                Resolved::Name
            };
        }
        for (i, names) in self.enclosing_heap_scopes.iter().enumerate() {
            if names.contains(name) {
                return Resolved::Heap((i + 1) as u32);
            }
        }
        Resolved::Name
    }

    fn emit_load_identifier(&mut self, name: &str) -> Reg {
        match self.resolve_identifier(name) {
            Resolved::Stack(slot) => {
                let dst = self.alloc_register();
                self.emit(Instruction::LoadByStackIndex { dst, slot });
                dst
            }
            Resolved::Heap(depth) => {
                let dst = self.alloc_register();
                let name_const = self.string_constant(name);
                self.emit(Instruction::LoadByHeapIndex { dst, depth, name: name_const });
                dst
            }
            Resolved::Name => {
                let dst = self.alloc_register();
                let name_const = self.string_constant(name);
                self.emit(Instruction::GetVariable { dst, name: name_const });
                dst
            }
        }
    }

    fn emit_store_identifier(&mut self, name: &str, value: Reg) {
        match self.resolve_identifier(name) {
            Resolved::Stack(slot) => {
                self.emit(Instruction::StoreByStackIndex { slot, value });
            }
            Resolved::Heap(depth) => {
                let name_const = self.string_constant(name);
                let strict = self.scopes.is_strict();
                self.emit(Instruction::StoreByHeapIndex { depth, name: name_const, value, strict });
            }
            Resolved::Name => {
                let name_const = self.string_constant(name);
                let strict = self.scopes.is_strict();
                self.emit(Instruction::SetVariable { name: name_const, value, strict });
            }
        }
    }

    // ---- top-level entry points ----

    pub fn generate_script(mut self, program: &ast::Program) -> GenResult<BytecodeBlock> {
        let captures_locals = body_contains_closure(&program.body);
        self.captures_locals = captures_locals;
        self.hoist_statements(&program.body)?;
        for stmt in &program.body {
            self.emit_statement(stmt)?;
        }
        let undef = self.alloc_register();
        self.emit(Instruction::LoadUndefined { dst: undef });
        self.emit(Instruction::Return { value: undef });
        self.restore(self.checkpoint());
        Ok(self.finish("<script>", FunctionKind::Normal, 0, captures_locals))
    }

    fn finish(mut self, name: &str, kind: FunctionKind, param_count: u32, captures_locals: bool) -> BytecodeBlock {
        self.patch_labels();
        let ic_slot_count = self.next_ic_slot;
        BytecodeBlock {
            instructions: self.instructions,
            constants: self.constants,
            ic_slot_count,
            register_count: self.max_register,
            source_locations: self.source_locations,
            try_regions: self.try_regions,
            children: self.children,
            param_count,
            is_strict: self.is_strict,
            kind,
            captures_locals,
            name: Rc::from(name),
        }
    }

    /// ### Hoisting
    ///
    /// `var` declarations and function declarations are registered in the
    /// nearest function scope before any statement runs (`spec.md` §4.4,
    /// ES5 §10.5). For a function whose locals stay register-only, each
    /// hoisted name also claims its dedicated register here, so later
    /// references never have to guess whether the slot exists yet; for a
    /// function whose locals escape to the heap, each hoisted name is
    /// declared and initialized to `undefined` in `frame.environment`
    /// immediately, matching `var`'s lack of a temporal dead zone.
    fn hoist_statements(&mut self, body: &[ast::Statement]) -> GenResult<()> {
        for stmt in body {
            self.hoist_statement(stmt)?;
        }
        Ok(())
    }

    fn hoist_statement(&mut self, stmt: &ast::Statement) -> GenResult<()> {
        match stmt {
            ast::Statement::VariableDeclaration(decl) if decl.kind.is_var() => {
                for d in &decl.declarations {
                    if let Some(name) = binding_identifier_name(&d.id) {
                        self.declare_hoisted(name, BindingKind::Var);
                    }
                }
            }
            ast::Statement::FunctionDeclaration(f) => {
                if let Some(id) = &f.id {
                    self.declare_hoisted(id.name.as_str(), BindingKind::FunctionName);
                }
            }
            ast::Statement::BlockStatement(b) => self.hoist_statements(&b.body)?,
            ast::Statement::IfStatement(s) => {
                self.hoist_statement(&s.consequent)?;
                if let Some(alt) = &s.alternate {
                    self.hoist_statement(alt)?;
                }
            }
            ast::Statement::WhileStatement(s) => self.hoist_statement(&s.body)?,
            ast::Statement::ForStatement(s) => self.hoist_statement(&s.body)?,
            ast::Statement::TryStatement(s) => {
                self.hoist_statements(&s.block.body)?;
                if let Some(handler) = &s.handler {
                    self.hoist_statements(&handler.body.body)?;
                }
                if let Some(finalizer) = &s.finalizer {
                    self.hoist_statements(&finalizer.body)?;
                }
            }
            ast::Statement::SwitchStatement(s) => {
                for case in &s.cases {
                    self.hoist_statements(&case.consequent)?;
                }
            }
            ast::Statement::LabeledStatement(s) => self.hoist_statement(&s.body)?,
            _ => {}
        }
        Ok(())
    }

    fn declare_hoisted(&mut self, name: &str, kind: BindingKind) {
        let new = self.scopes.lookup(name).is_none();
        self.scopes.declare_var(Rc::from(name), kind);
        if self.captures_locals {
            if new {
                let name_const = self.string_constant(name);
                self.emit(Instruction::DeclareBinding { name: name_const, mutable: true });
                let checkpoint = self.checkpoint();
                let undef = self.alloc_register();
                self.emit(Instruction::LoadUndefined { dst: undef });
                self.emit(Instruction::InitializeBinding { name: name_const, value: undef });
                self.restore(checkpoint);
            }
        } else if !self.local_slots.contains_key(name) {
            let reg = self.alloc_register();
            self.local_slots.insert(Rc::from(name), reg);
        }
    }

    // ---- statements ----

    fn emit_statement(&mut self, stmt: &ast::Statement) -> GenResult<()> {
        match stmt {
            ast::Statement::ExpressionStatement(s) => {
                let checkpoint = self.checkpoint();
                self.emit_expression(&s.expression)?;
                self.restore(checkpoint);
                Ok(())
            }
            ast::Statement::VariableDeclaration(decl) => self.emit_variable_declaration(decl),
            ast::Statement::BlockStatement(b) => {
                self.scopes.push(ScopeKind::Block, self.scopes.is_strict());
                self.hoist_statements(&b.body)?;
                for s in &b.body {
                    self.emit_statement(s)?;
                }
                self.scopes.pop();
                Ok(())
            }
            ast::Statement::IfStatement(s) => self.emit_if(s),
            ast::Statement::WhileStatement(s) => self.emit_while(s, None),
            ast::Statement::ForStatement(s) => self.emit_for(s, None),
            ast::Statement::ReturnStatement(s) => self.emit_return(s),
            ast::Statement::ThrowStatement(s) => {
                let checkpoint = self.checkpoint();
                let value = self.emit_expression(&s.argument)?;
                self.emit(Instruction::Throw { value });
                self.restore(checkpoint);
                Ok(())
            }
            ast::Statement::TryStatement(s) => self.emit_try(s),
            ast::Statement::BreakStatement(s) => self.emit_break(s),
            ast::Statement::ContinueStatement(s) => self.emit_continue(s),
            ast::Statement::SwitchStatement(s) => self.emit_switch(s),
            ast::Statement::LabeledStatement(s) => self.emit_labeled(s),
            ast::Statement::FunctionDeclaration(f) => {
                let name = f.id.as_ref().map(|i| i.name.as_str()).unwrap_or("");
                let reg = self.emit_function(f, name)?;
                self.emit_store_identifier(name, reg);
                Ok(())
            }
            ast::Statement::EmptyStatement(_) => Ok(()),
            other => Err(unsupported(&format!("{other:?}"))),
        }
    }

    fn emit_variable_declaration(&mut self, decl: &ast::VariableDeclaration) -> GenResult<()> {
        let is_lexical = !decl.kind.is_var();
        for d in &decl.declarations {
            let Some(name) = binding_identifier_name(&d.id) else {
                return Err(unsupported("destructuring binding pattern"));
            };
            if is_lexical {
                let name_const = self.string_constant(name);
                let kind = if decl.kind.is_const() { BindingKind::Const } else { BindingKind::Let };
                self.scopes.declare_lexical(Rc::from(name), kind);
                self.emit(Instruction::DeclareBinding { name: name_const, mutable: !decl.kind.is_const() });
                let checkpoint = self.checkpoint();
                if let Some(init) = &d.init {
                    let value = self.emit_expression(init)?;
                    self.emit(Instruction::InitializeBinding { name: name_const, value });
                } else {
                    let undef = self.alloc_register();
                    self.emit(Instruction::LoadUndefined { dst: undef });
                    self.emit(Instruction::InitializeBinding { name: name_const, value: undef });
                }
                self.restore(checkpoint);
            } else if let Some(init) = &d.init {
                let checkpoint = self.checkpoint();
                let value = self.emit_expression(init)?;
                self.emit_store_identifier(name, value);
                self.restore(checkpoint);
            }
        }
        Ok(())
    }

    fn emit_if(&mut self, s: &ast::IfStatement) -> GenResult<()> {
        let checkpoint = self.checkpoint();
        let cond = self.emit_expression(&s.test)?;
        let else_label = self.new_label();
        self.emit_jump_to_label(|t| Instruction::JumpIfFalse { cond, target: t }, else_label);
        self.restore(checkpoint);
        self.emit_statement(&s.consequent)?;
        if let Some(alt) = &s.alternate {
            let end_label = self.new_label();
            self.emit_jump_to_label(|t| Instruction::Jump { target: t }, end_label);
            self.bind_label(else_label);
            self.emit_statement(alt)?;
            self.bind_label(end_label);
        } else {
            self.bind_label(else_label);
        }
        Ok(())
    }

    fn emit_while(&mut self, s: &ast::WhileStatement, label: Option<Rc<str>>) -> GenResult<()> {
        let loop_start = self.new_label();
        let loop_end = self.new_label();
        self.bind_label(loop_start);
        let checkpoint = self.checkpoint();
        let cond = self.emit_expression(&s.test)?;
        self.emit_jump_to_label(|t| Instruction::JumpIfFalse { cond, target: t }, loop_end);
        self.restore(checkpoint);
        self.label_stack.push(LabelEntry {
            name: label,
            break_target: loop_end,
            continue_target: Some(loop_start),
            breakable_without_label: true,
            try_depth_at_entry: self.try_depth,
        });
        self.emit_statement(&s.body)?;
        self.label_stack.pop();
        self.emit_jump_to_label(|t| Instruction::Jump { target: t }, loop_start);
        self.bind_label(loop_end);
        Ok(())
    }

    fn emit_for(&mut self, s: &ast::ForStatement, label: Option<Rc<str>>) -> GenResult<()> {
        self.scopes.push(ScopeKind::Block, self.scopes.is_strict());
        let checkpoint = self.checkpoint();
        if let Some(init) = &s.init {
            match init {
                ast::ForStatementInit::VariableDeclaration(decl) => self.emit_variable_declaration(decl)?,
                _ => return Err(unsupported("non-declaration for-statement init")),
            }
        }
        self.restore(checkpoint);

        let loop_start = self.new_label();
        let continue_label = self.new_label();
        let loop_end = self.new_label();
        self.bind_label(loop_start);
        if let Some(test) = &s.test {
            let cp = self.checkpoint();
            let cond = self.emit_expression(test)?;
            self.emit_jump_to_label(|t| Instruction::JumpIfFalse { cond, target: t }, loop_end);
            self.restore(cp);
        }
        self.label_stack.push(LabelEntry {
            name: label,
            break_target: loop_end,
            continue_target: Some(continue_label),
            breakable_without_label: true,
            try_depth_at_entry: self.try_depth,
        });
        self.emit_statement(&s.body)?;
        self.label_stack.pop();
        self.bind_label(continue_label);
        if let Some(update) = &s.update {
            let cp = self.checkpoint();
            self.emit_expression(update)?;
            self.restore(cp);
        }
        self.emit_jump_to_label(|t| Instruction::Jump { target: t }, loop_start);
        self.bind_label(loop_end);
        self.scopes.pop();
        Ok(())
    }

    fn emit_break(&mut self, s: &ast::BreakStatement) -> GenResult<()> {
        let label_name = s.label.as_ref().map(|l| l.name.as_str());
        let (target, target_depth) = self.find_break_target(label_name)?;
        if self.try_depth > target_depth {
            return Err(unsupported("break crossing a try/finally boundary"));
        }
        self.emit_jump_to_label(|t| Instruction::Jump { target: t }, target);
        Ok(())
    }

    fn emit_continue(&mut self, s: &ast::ContinueStatement) -> GenResult<()> {
        let label_name = s.label.as_ref().map(|l| l.name.as_str());
        let (target, target_depth) = self.find_continue_target(label_name)?;
        if self.try_depth > target_depth {
            return Err(unsupported("continue crossing a try/finally boundary"));
        }
        self.emit_jump_to_label(|t| Instruction::Jump { target: t }, target);
        Ok(())
    }

    fn emit_labeled(&mut self, s: &ast::LabeledStatement) -> GenResult<()> {
        let label: Rc<str> = Rc::from(s.label.name.as_str());
        match &s.body {
            ast::Statement::WhileStatement(w) => self.emit_while(w, Some(label)),
            ast::Statement::ForStatement(f) => self.emit_for(f, Some(label)),
            body => {
                let end_label = self.new_label();
                self.label_stack.push(LabelEntry {
                    name: Some(label),
                    break_target: end_label,
                    continue_target: None,
                    breakable_without_label: false,
                    try_depth_at_entry: self.try_depth,
                });
                self.emit_statement(body)?;
                self.label_stack.pop();
                self.bind_label(end_label);
                Ok(())
            }
        }
    }

    fn emit_switch(&mut self, s: &ast::SwitchStatement) -> GenResult<()> {
        self.scopes.push(ScopeKind::Block, self.scopes.is_strict());
        for case in &s.cases {
            self.hoist_statements(&case.consequent)?;
        }

        let checkpoint = self.checkpoint();
        let discriminant = self.emit_expression(&s.discriminant)?;
        self.restore(discriminant + 1);

        let case_labels: Vec<Label> = s.cases.iter().map(|_| self.new_label()).collect();
        let end_label = self.new_label();
        let mut default_label = None;
        for (case, &label) in s.cases.iter().zip(case_labels.iter()) {
            if case.test.is_none() {
                default_label = Some(label);
            }
        }

        for (case, &label) in s.cases.iter().zip(case_labels.iter()) {
            if let Some(test) = &case.test {
                let cp = self.checkpoint();
                let value = self.emit_expression(test)?;
                let eq = self.alloc_register();
                self.emit(Instruction::StrictEquals { dst: eq, lhs: discriminant, rhs: value });
                self.emit_jump_to_label(|t| Instruction::JumpIfTrue { cond: eq, target: t }, label);
                self.restore(cp);
            }
        }
        self.emit_jump_to_label(|t| Instruction::Jump { target: t }, default_label.unwrap_or(end_label));

        self.label_stack.push(LabelEntry {
            name: None,
            break_target: end_label,
            continue_target: None,
            breakable_without_label: true,
            try_depth_at_entry: self.try_depth,
        });
        for (case, &label) in s.cases.iter().zip(case_labels.iter()) {
            self.bind_label(label);
            for stmt in &case.consequent {
                self.emit_statement(stmt)?;
            }
        }
        self.label_stack.pop();

        self.bind_label(end_label);
        self.scopes.pop();
        Ok(())
    }

    fn emit_return(&mut self, s: &ast::ReturnStatement) -> GenResult<()> {
        if self.try_depth > 0 {
            return Err(unsupported("return crossing a try/finally boundary"));
        }
        let checkpoint = self.checkpoint();
        let value = if let Some(arg) = &s.argument {
            self.emit_expression(arg)?
        } else {
            let r = self.alloc_register();
            self.emit(Instruction::LoadUndefined { dst: r });
            r
        };
        self.emit(Instruction::Return { value });
        self.restore(checkpoint);
        Ok(())
    }

    /// Lowers a `try` statement (`spec.md` §4.4/§4.5). A `finally` block
    /// must run on every path out of the `try`/`catch` bodies, not only the
    /// exceptional one `run_frame` handles via `TryRegion::finally_target`:
    /// both bodies' normal-completion jumps target `finally_entry` (when a
    /// `finally` exists) instead of jumping straight past it, so the
    /// `finally` body's own instructions — emitted right after
    /// `finally_entry` is bound — run unconditionally before falling
    /// through to `after_try`.
    fn emit_try(&mut self, s: &ast::TryStatement) -> GenResult<()> {
        let has_finally = s.finalizer.is_some();
        let region_start = self.instructions.len() as InstrOffset;
        let after_try = self.new_label();
        let finally_entry = if has_finally { Some(self.new_label()) } else { None };
        let normal_exit = finally_entry.unwrap_or(after_try);

        if has_finally {
            self.try_depth += 1;
        }

        self.scopes.push(ScopeKind::Block, self.scopes.is_strict());
        for stmt in &s.block.body {
            self.emit_statement(stmt)?;
        }
        self.scopes.pop();
        self.emit_jump_to_label(|t| Instruction::Jump { target: t }, normal_exit);
        let region_end = self.instructions.len() as InstrOffset;

        let catch_target = if let Some(handler) = &s.handler {
            let target = self.instructions.len() as InstrOffset;
            self.scopes.push(ScopeKind::Block, self.scopes.is_strict());
            if let Some(param) = &handler.param {
                if let Some(name) = binding_identifier_name(&param.pattern) {
                    let name_const = self.string_constant(name);
                    self.scopes.declare_lexical(Rc::from(name), BindingKind::Let);
                    self.emit(Instruction::DeclareBinding { name: name_const, mutable: true });
                    let exc = self.alloc_register();
                    self.emit(Instruction::CatchBind { dst: exc });
                    self.emit(Instruction::InitializeBinding { name: name_const, value: exc });
                } else {
                    let exc = self.alloc_register();
                    self.emit(Instruction::CatchBind { dst: exc });
                }
            } else {
                let exc = self.alloc_register();
                self.emit(Instruction::CatchBind { dst: exc });
            }
            for stmt in &handler.body.body {
                self.emit_statement(stmt)?;
            }
            self.scopes.pop();
            self.emit_jump_to_label(|t| Instruction::Jump { target: t }, normal_exit);
            Some(target)
        } else {
            None
        };

        if has_finally {
            self.try_depth -= 1;
        }

        let finally_target = if let Some(finalizer) = &s.finalizer {
            let target = self.instructions.len() as InstrOffset;
            self.bind_label(finally_entry.unwrap());
            self.scopes.push(ScopeKind::Block, self.scopes.is_strict());
            for stmt in &finalizer.body {
                self.emit_statement(stmt)?;
            }
            self.scopes.pop();
            Some(target)
        } else {
            None
        };

        self.try_regions.push(TryRegion { start: region_start, end: region_end, catch_target, finally_target });
        self.bind_label(after_try);
        Ok(())
    }

    fn emit_function(&mut self, f: &ast::Function, name: &str) -> GenResult<Reg> {
        let Some(body) = &f.body else {
            return Err(unsupported("function without a body (declare-only)"));
        };
        let captures_locals = body_contains_closure(&body.statements);
        let mut inner = BytecodeGenerator::new(self.scopes.is_strict());
        inner.captures_locals = captures_locals;
        let mut enclosing = self.enclosing_heap_scopes.clone();
        enclosing.insert(0, Rc::new(self.scopes.function_scope_declared_names()));
        inner.enclosing_heap_scopes = enclosing;

        let mut param_names = Vec::new();
        for param in &f.params.items {
            let Some(pname) = binding_identifier_name(&param.pattern) else {
                return Err(unsupported("destructuring parameter"));
            };
            param_names.push(pname.to_string());
        }
        for pname in &param_names {
            let reg = inner.alloc_register();
            inner.scopes.declare_var(Rc::from(pname.as_str()), BindingKind::Parameter);
            if inner.captures_locals {
                let name_const = inner.string_constant(pname);
                inner.emit(Instruction::DeclareBinding { name: name_const, mutable: true });
                inner.emit(Instruction::InitializeBinding { name: name_const, value: reg });
            } else {
                inner.local_slots.insert(Rc::from(pname.as_str()), reg);
            }
        }
        inner.hoist_statements(&body.statements)?;
        for stmt in &body.statements {
            inner.emit_statement(stmt)?;
        }
        let undef = inner.alloc_register();
        inner.emit(Instruction::LoadUndefined { dst: undef });
        inner.emit(Instruction::Return { value: undef });
        let block = inner.finish(name, FunctionKind::Normal, param_names.len() as u32, captures_locals);

        self.children.push(Rc::new(block));
        let child_index = (self.children.len() - 1) as u32;
        let dst = self.alloc_register();
        self.emit(Instruction::MakeFunction { dst, function: child_index });
        Ok(dst)
    }

    /// Lowers an arrow function. Shares `emit_function`'s tier-assignment
    /// logic for its own parameters, but the emitted block carries
    /// `FunctionKind::Arrow` so `call_bytecode_function` skips creating
    /// fresh `this`/`arguments` bindings for it — an arrow body's `this`
    /// and `arguments` references fall through to the enclosing ordinary
    /// function's, via the existing dynamic scope-chain walk
    /// (`environment::resolve_binding`), which is exactly lexical `this`
    /// (`spec.md` §4.6 "Scope & closures").
    fn emit_arrow_function(&mut self, f: &ast::ArrowFunctionExpression) -> GenResult<Reg> {
        let captures_locals = body_contains_closure(&f.body.statements);
        let mut inner = BytecodeGenerator::new(self.scopes.is_strict());
        inner.captures_locals = captures_locals;
        let mut enclosing = self.enclosing_heap_scopes.clone();
        enclosing.insert(0, Rc::new(self.scopes.function_scope_declared_names()));
        inner.enclosing_heap_scopes = enclosing;

        let mut param_names = Vec::new();
        for param in &f.params.items {
            let Some(pname) = binding_identifier_name(&param.pattern) else {
                return Err(unsupported("destructuring parameter"));
            };
            param_names.push(pname.to_string());
        }
        for pname in &param_names {
            let reg = inner.alloc_register();
            inner.scopes.declare_var(Rc::from(pname.as_str()), BindingKind::Parameter);
            if inner.captures_locals {
                let name_const = inner.string_constant(pname);
                inner.emit(Instruction::DeclareBinding { name: name_const, mutable: true });
                inner.emit(Instruction::InitializeBinding { name: name_const, value: reg });
            } else {
                inner.local_slots.insert(Rc::from(pname.as_str()), reg);
            }
        }

        inner.hoist_statements(&f.body.statements)?;
        if f.expression {
            let ast::Statement::ExpressionStatement(only) = &f.body.statements[0] else {
                return Err(unsupported("arrow function concise body is not an expression"));
            };
            let value = inner.emit_expression(&only.expression)?;
            inner.emit(Instruction::Return { value });
        } else {
            for stmt in &f.body.statements {
                inner.emit_statement(stmt)?;
            }
            let undef = inner.alloc_register();
            inner.emit(Instruction::LoadUndefined { dst: undef });
            inner.emit(Instruction::Return { value: undef });
        }
        let block = inner.finish("", FunctionKind::Arrow, param_names.len() as u32, captures_locals);

        self.children.push(Rc::new(block));
        let child_index = (self.children.len() - 1) as u32;
        let dst = self.alloc_register();
        self.emit(Instruction::MakeFunction { dst, function: child_index });
        Ok(dst)
    }

    // ---- expressions ----

    fn emit_expression(&mut self, expr: &ast::Expression) -> GenResult<Reg> {
        match expr {
            ast::Expression::NumericLiteral(lit) => {
                let dst = self.alloc_register();
                let c = self.number_constant(lit.value);
                self.emit(Instruction::LoadConst { dst, constant: c });
                Ok(dst)
            }
            ast::Expression::StringLiteral(lit) => {
                let dst = self.alloc_register();
                let c = self.string_constant(lit.value.as_str());
                self.emit(Instruction::LoadConst { dst, constant: c });
                Ok(dst)
            }
            ast::Expression::BooleanLiteral(lit) => {
                let dst = self.alloc_register();
                self.emit(if lit.value { Instruction::LoadTrue { dst } } else { Instruction::LoadFalse { dst } });
                Ok(dst)
            }
            ast::Expression::NullLiteral(_) => {
                let dst = self.alloc_register();
                self.emit(Instruction::LoadNull { dst });
                Ok(dst)
            }
            ast::Expression::Identifier(ident) => Ok(self.emit_load_identifier(ident.name.as_str())),
            ast::Expression::ParenthesizedExpression(p) => self.emit_expression(&p.expression),
            ast::Expression::SequenceExpression(seq) => {
                let mut last = None;
                for (i, e) in seq.expressions.iter().enumerate() {
                    let checkpoint = self.checkpoint();
                    let r = self.emit_expression(e)?;
                    if i + 1 == seq.expressions.len() {
                        last = Some(r);
                    } else {
                        self.restore(checkpoint);
                    }
                }
                Ok(last.expect("sequence expression has at least one operand"))
            }
            ast::Expression::BinaryExpression(bin) => self.emit_binary(bin),
            ast::Expression::LogicalExpression(log) => self.emit_logical(log),
            ast::Expression::UnaryExpression(u) => self.emit_unary(u),
            ast::Expression::UpdateExpression(u) => self.emit_update(u),
            ast::Expression::AssignmentExpression(a) => self.emit_assignment(a),
            ast::Expression::ConditionalExpression(c) => self.emit_conditional(c),
            ast::Expression::CallExpression(c) => self.emit_call(c),
            ast::Expression::StaticMemberExpression(m) => {
                let checkpoint = self.checkpoint();
                let object = self.emit_expression(&m.object)?;
                self.restore(checkpoint.max(object + 1));
                let dst = self.alloc_register();
                let key = self.string_constant(m.property.name.as_str());
                let ic_slot = self.alloc_ic_slot();
                self.emit(Instruction::GetProperty { dst, object, key, ic_slot });
                Ok(dst)
            }
            ast::Expression::ComputedMemberExpression(m) => {
                let object = self.emit_expression(&m.object)?;
                let key = self.emit_expression(&m.expression)?;
                let dst = self.alloc_register();
                self.emit(Instruction::GetPropertyComputed { dst, object, key });
                Ok(dst)
            }
            ast::Expression::ObjectExpression(obj) => self.emit_object_literal(obj),
            ast::Expression::ArrayExpression(arr) => self.emit_array_literal(arr),
            ast::Expression::FunctionExpression(f) => self.emit_function(f, f.id.as_ref().map(|i| i.name.as_str()).unwrap_or("")),
            ast::Expression::ArrowFunctionExpression(a) => self.emit_arrow_function(a),
            ast::Expression::ThisExpression(_) => {
                let dst = self.alloc_register();
                let name_const = self.string_constant("this");
                self.emit(Instruction::GetVariable { dst, name: name_const });
                Ok(dst)
            }
            other => Err(unsupported(&format!("{other:?}"))),
        }
    }

    fn emit_binary(&mut self, bin: &ast::BinaryExpression) -> GenResult<Reg> {
        let checkpoint = self.checkpoint();
        let lhs = self.emit_expression(&bin.left)?;
        let rhs = self.emit_expression(&bin.right)?;
        self.restore(checkpoint);
        let dst = self.alloc_register();
        let op = binary_operator(bin.operator).ok_or_else(|| unsupported("binary operator"))?;
        self.emit(Instruction::BinaryOp { op, dst, lhs, rhs });
        Ok(dst)
    }

    fn emit_logical(&mut self, log: &ast::LogicalExpression) -> GenResult<Reg> {
        let lhs = self.emit_expression(&log.left)?;
        let end_label = self.new_label();
        match log.operator {
            ast::LogicalOperator::And => {
                self.emit_jump_to_label(|t| Instruction::JumpIfFalseNoPop { cond: lhs, target: t }, end_label);
            }
            ast::LogicalOperator::Or => {
                self.emit_jump_to_label(|t| Instruction::JumpIfTrueNoPop { cond: lhs, target: t }, end_label);
            }
            ast::LogicalOperator::Coalesce => {
                self.emit_jump_to_label(|t| Instruction::JumpIfNullish { cond: lhs, target: t }, end_label);
                self.bind_label(end_label);
                let rhs = self.emit_expression(&log.right)?;
                self.emit(Instruction::Move { dst: lhs, src: rhs });
                return Ok(lhs);
            }
        }
        let checkpoint = self.checkpoint();
        let rhs = self.emit_expression(&log.right)?;
        self.emit(Instruction::Move { dst: lhs, src: rhs });
        self.restore(checkpoint);
        self.bind_label(end_label);
        Ok(lhs)
    }

    fn emit_unary(&mut self, u: &ast::UnaryExpression) -> GenResult<Reg> {
        if matches!(u.operator, ast::UnaryOperator::Delete) {
            return self.emit_delete(&u.argument);
        }
        let operand = self.emit_expression(&u.argument)?;
        let dst = self.alloc_register();
        let op = match u.operator {
            ast::UnaryOperator::UnaryNegation => UnaryOp::Neg,
            ast::UnaryOperator::UnaryPlus => UnaryOp::Plus,
            ast::UnaryOperator::LogicalNot => UnaryOp::Not,
            ast::UnaryOperator::BitwiseNot => UnaryOp::BitNot,
            ast::UnaryOperator::Typeof => UnaryOp::TypeOf,
            ast::UnaryOperator::Void => UnaryOp::Void,
            ast::UnaryOperator::Delete => unreachable!(),
        };
        self.emit(Instruction::UnaryOp { op, dst, operand });
        Ok(dst)
    }

    fn emit_delete(&mut self, target: &ast::Expression) -> GenResult<Reg> {
        let dst = self.alloc_register();
        match target {
            ast::Expression::StaticMemberExpression(m) => {
                let object = self.emit_expression(&m.object)?;
                let key = self.string_constant(m.property.name.as_str());
                self.emit(Instruction::DeleteProperty { dst, object, key });
            }
            ast::Expression::ComputedMemberExpression(m) => {
                let object = self.emit_expression(&m.object)?;
                let key = self.emit_expression(&m.expression)?;
                self.emit(Instruction::DeletePropertyComputed { dst, object, key });
            }
            _ => {
                self.emit(Instruction::LoadTrue { dst });
            }
        };
        Ok(dst)
    }

    fn emit_update(&mut self, u: &ast::UpdateExpression) -> GenResult<Reg> {
        let op = match u.operator {
            ast::UpdateOperator::Increment => UpdateOp::Inc,
            ast::UpdateOperator::Decrement => UpdateOp::Dec,
        };
        match simple_assignment_target_name(&u.argument) {
            Some(name) => {
                let old = self.emit_load_identifier(name);
                let new = self.alloc_register();
                self.emit(Instruction::UpdateOp { op, dst: new, operand: old });
                self.emit_store_identifier(name, new);
                Ok(if u.prefix { new } else { old })
            }
            None => Err(unsupported("update expression on non-identifier target")),
        }
    }

    fn emit_assignment(&mut self, a: &ast::AssignmentExpression) -> GenResult<Reg> {
        if let ast::AssignmentOperator::Assign = a.operator {
            let value = self.emit_expression(&a.right)?;
            self.emit_assign_to_target(&a.left, value)?;
            return Ok(value);
        }
        let Some(name) = assignment_target_simple_name(&a.left) else {
            return Err(unsupported("compound assignment on non-identifier target"));
        };
        let old = self.emit_load_identifier(name);
        let rhs = self.emit_expression(&a.right)?;
        let dst = self.alloc_register();
        let op = compound_binary_operator(a.operator).ok_or_else(|| unsupported("compound assignment operator"))?;
        self.emit(Instruction::BinaryOp { op, dst, lhs: old, rhs });
        self.emit_store_identifier(name, dst);
        Ok(dst)
    }

    fn emit_assign_to_target(&mut self, target: &ast::AssignmentTarget, value: Reg) -> GenResult<()> {
        match target {
            ast::AssignmentTarget::AssignmentTargetIdentifier(ident) => {
                self.emit_store_identifier(ident.name.as_str(), value);
                Ok(())
            }
            ast::AssignmentTarget::StaticMemberExpression(m) => {
                let object = self.emit_expression(&m.object)?;
                let key = self.string_constant(m.property.name.as_str());
                let ic_slot = self.alloc_ic_slot();
                self.emit(Instruction::SetProperty { object, key, value, ic_slot });
                Ok(())
            }
            ast::AssignmentTarget::ComputedMemberExpression(m) => {
                let object = self.emit_expression(&m.object)?;
                let key = self.emit_expression(&m.expression)?;
                self.emit(Instruction::SetPropertyComputed { object, key, value });
                Ok(())
            }
            _ => Err(unsupported("destructuring assignment target")),
        }
    }

    fn emit_conditional(&mut self, c: &ast::ConditionalExpression) -> GenResult<Reg> {
        let checkpoint = self.checkpoint();
        let cond = self.emit_expression(&c.test)?;
        let else_label = self.new_label();
        let end_label = self.new_label();
        self.emit_jump_to_label(|t| Instruction::JumpIfFalse { cond, target: t }, else_label);
        self.restore(checkpoint);
        let dst = self.alloc_register();
        let consequent = self.emit_expression(&c.consequent)?;
        self.emit(Instruction::Move { dst, src: consequent });
        self.restore(dst + 1);
        self.emit_jump_to_label(|t| Instruction::Jump { target: t }, end_label);
        self.bind_label(else_label);
        self.restore(dst);
        let alternate = self.emit_expression(&c.alternate)?;
        self.emit(Instruction::Move { dst, src: alternate });
        self.restore(dst + 1);
        self.bind_label(end_label);
        Ok(dst)
    }

    fn emit_call(&mut self, c: &ast::CallExpression) -> GenResult<Reg> {
        let checkpoint = self.checkpoint();
        let (callee, this) = match &c.callee {
            ast::Expression::StaticMemberExpression(m) => {
                let object = self.emit_expression(&m.object)?;
                let key = self.string_constant(m.property.name.as_str());
                let dst = self.alloc_register();
                let ic_slot = self.alloc_ic_slot();
                self.emit(Instruction::GetProperty { dst, object, key, ic_slot });
                (dst, object)
            }
            ast::Expression::ComputedMemberExpression(m) => {
                let object = self.emit_expression(&m.object)?;
                let key = self.emit_expression(&m.expression)?;
                let dst = self.alloc_register();
                self.emit(Instruction::GetPropertyComputed { dst, object, key });
                (dst, object)
            }
            other => {
                let callee = self.emit_expression(other)?;
                let undef = self.alloc_register();
                self.emit(Instruction::LoadUndefined { dst: undef });
                (callee, undef)
            }
        };

        let args_start = self.checkpoint();
        let mut argc = 0u16;
        for arg in &c.arguments {
            let Some(expr) = arg.as_expression() else {
                return Err(unsupported("spread arguments"));
            };
            self.emit_expression(expr)?;
            argc += 1;
        }

        let dst = self.alloc_register();
        self.emit(Instruction::Call { dst, callee, this, args_start, argc });
        self.restore(checkpoint.max(dst + 1));
        Ok(dst)
    }

    fn emit_object_literal(&mut self, obj: &ast::ObjectExpression) -> GenResult<Reg> {
        let dst = self.alloc_register();
        self.emit(Instruction::NewObject { dst });
        for prop in &obj.properties {
            let ast::ObjectPropertyKind::ObjectProperty(p) = prop else {
                return Err(unsupported("spread property in object literal"));
            };
            let checkpoint = self.checkpoint();
            let name = match &p.key {
                ast::PropertyKey::StaticIdentifier(id) => Some(id.name.to_string()),
                ast::PropertyKey::StringLiteral(s) => Some(s.value.to_string()),
                ast::PropertyKey::NumericLiteral(n) => Some(crate::value::number::to_string_radix(n.value, 10)),
                _ => None,
            };
            let Some(name) = name else {
                return Err(unsupported("computed property key in object literal"));
            };
            let value = self.emit_expression(&p.value)?;
            let key = self.string_constant(&name);
            let ic_slot = self.alloc_ic_slot();
            self.emit(Instruction::SetProperty { object: dst, key, value, ic_slot });
            self.restore(checkpoint);
        }
        Ok(dst)
    }

    fn emit_array_literal(&mut self, arr: &ast::ArrayExpression) -> GenResult<Reg> {
        let dst = self.alloc_register();
        self.emit(Instruction::NewArray { dst });
        for elem in &arr.elements {
            match elem {
                ast::ArrayExpressionElement::Elision(_) => {
                    self.emit(Instruction::ArrayElision { array: dst });
                }
                other => {
                    let Some(e) = other.as_expression() else {
                        return Err(unsupported("spread in array literal"));
                    };
                    let checkpoint = self.checkpoint();
                    let value = self.emit_expression(e)?;
                    self.emit(Instruction::ArrayPush { array: dst, value });
                    self.restore(checkpoint);
                }
            }
        }
        Ok(dst)
    }
}

/// Coarse, whole-function closure-presence scan (`spec.md` §4.4/§4.6):
/// `true` as soon as any nested function/arrow expression is found
/// anywhere in `stmts`, without tracking which of the function's own
/// bindings that closure actually reads. This is deliberately coarser than
/// per-identifier free-variable capture analysis — it costs a function
/// whose only closure never touches the function's other locals the same
/// heap-tier fallback a capturing one would need — in exchange for being
/// checkable by inspection instead of by running the compiler. Recurses
/// into every statement/expression kind `emit_statement`/`emit_expression`
/// itself handles; stops at each nested function boundary without
/// recursing into its body, since that function's own closures don't
/// affect whether *this* function's locals escape.
fn body_contains_closure(stmts: &[ast::Statement]) -> bool {
    stmts.iter().any(statement_contains_closure)
}

fn statement_contains_closure(stmt: &ast::Statement) -> bool {
    match stmt {
        ast::Statement::FunctionDeclaration(_) => true,
        ast::Statement::ExpressionStatement(s) => expression_contains_closure(&s.expression),
        ast::Statement::VariableDeclaration(d) => {
            d.declarations.iter().any(|decl| decl.init.as_ref().is_some_and(expression_contains_closure))
        }
        ast::Statement::BlockStatement(b) => body_contains_closure(&b.body),
        ast::Statement::IfStatement(s) => {
            expression_contains_closure(&s.test)
                || statement_contains_closure(&s.consequent)
                || s.alternate.as_ref().is_some_and(|a| statement_contains_closure(a))
        }
        ast::Statement::WhileStatement(s) => expression_contains_closure(&s.test) || statement_contains_closure(&s.body),
        ast::Statement::ForStatement(s) => {
            let init = match &s.init {
                Some(ast::ForStatementInit::VariableDeclaration(d)) => {
                    d.declarations.iter().any(|decl| decl.init.as_ref().is_some_and(expression_contains_closure))
                }
                _ => false,
            };
            init
                || s.test.as_ref().is_some_and(expression_contains_closure)
                || s.update.as_ref().is_some_and(expression_contains_closure)
                || statement_contains_closure(&s.body)
        }
        ast::Statement::ReturnStatement(s) => s.argument.as_ref().is_some_and(expression_contains_closure),
        ast::Statement::ThrowStatement(s) => expression_contains_closure(&s.argument),
        ast::Statement::TryStatement(s) => {
            body_contains_closure(&s.block.body)
                || s.handler.as_ref().is_some_and(|h| body_contains_closure(&h.body.body))
                || s.finalizer.as_ref().is_some_and(|f| body_contains_closure(&f.body))
        }
        ast::Statement::SwitchStatement(s) => {
            expression_contains_closure(&s.discriminant) || s.cases.iter().any(|c| body_contains_closure(&c.consequent))
        }
        ast::Statement::LabeledStatement(s) => statement_contains_closure(&s.body),
        _ => false,
    }
}

fn expression_contains_closure(expr: &ast::Expression) -> bool {
    match expr {
        ast::Expression::FunctionExpression(_) | ast::Expression::ArrowFunctionExpression(_) => true,
        ast::Expression::ParenthesizedExpression(p) => expression_contains_closure(&p.expression),
        ast::Expression::SequenceExpression(s) => s.expressions.iter().any(expression_contains_closure),
        ast::Expression::BinaryExpression(b) => expression_contains_closure(&b.left) || expression_contains_closure(&b.right),
        ast::Expression::LogicalExpression(l) => expression_contains_closure(&l.left) || expression_contains_closure(&l.right),
        ast::Expression::UnaryExpression(u) => expression_contains_closure(&u.argument),
        ast::Expression::AssignmentExpression(a) => expression_contains_closure(&a.right),
        ast::Expression::ConditionalExpression(c) => {
            expression_contains_closure(&c.test) || expression_contains_closure(&c.consequent) || expression_contains_closure(&c.alternate)
        }
        ast::Expression::CallExpression(c) => {
            expression_contains_closure(&c.callee) || c.arguments.iter().any(|a| a.as_expression().is_some_and(expression_contains_closure))
        }
        ast::Expression::StaticMemberExpression(m) => expression_contains_closure(&m.object),
        ast::Expression::ComputedMemberExpression(m) => expression_contains_closure(&m.object) || expression_contains_closure(&m.expression),
        ast::Expression::ObjectExpression(o) => o.properties.iter().any(|p| {
            matches!(p, ast::ObjectPropertyKind::ObjectProperty(op) if expression_contains_closure(&op.value))
        }),
        ast::Expression::ArrayExpression(a) => a.elements.iter().any(|e| e.as_expression().is_some_and(expression_contains_closure)),
        _ => false,
    }
}

fn binding_identifier_name<'a>(pattern: &'a ast::BindingPattern<'a>) -> Option<&'a str> {
    match &pattern.kind {
        ast::BindingPatternKind::BindingIdentifier(id) => Some(id.name.as_str()),
        _ => None,
    }
}

fn simple_assignment_target_name<'a>(target: &'a ast::SimpleAssignmentTarget<'a>) -> Option<&'a str> {
    match target {
        ast::SimpleAssignmentTarget::AssignmentTargetIdentifier(id) => Some(id.name.as_str()),
        _ => None,
    }
}

fn assignment_target_simple_name<'a>(target: &'a ast::AssignmentTarget<'a>) -> Option<&'a str> {
    match target {
        ast::AssignmentTarget::AssignmentTargetIdentifier(id) => Some(id.name.as_str()),
        _ => None,
    }
}

fn binary_operator(op: ast::BinaryOperator) -> Option<BinaryOp> {
    use ast::BinaryOperator as B;
    Some(match op {
        B::Addition => BinaryOp::Add,
        B::Subtraction => BinaryOp::Sub,
        B::Multiplication => BinaryOp::Mul,
        B::Division => BinaryOp::Div,
        B::Remainder => BinaryOp::Mod,
        B::Exponential => BinaryOp::Exp,
        B::BitwiseAnd => BinaryOp::BitAnd,
        B::BitwiseOR => BinaryOp::BitOr,
        B::BitwiseXOR => BinaryOp::BitXor,
        B::ShiftLeft => BinaryOp::Shl,
        B::ShiftRight => BinaryOp::Shr,
        B::ShiftRightZeroFill => BinaryOp::UShr,
        B::LessThan => BinaryOp::Lt,
        B::GreaterThan => BinaryOp::Gt,
        B::LessEqualThan => BinaryOp::Le,
        B::GreaterEqualThan => BinaryOp::Ge,
        B::StrictEquality => BinaryOp::StrictEq,
        B::StrictInequality => BinaryOp::StrictNe,
        B::Equality => BinaryOp::LooseEq,
        B::Inequality => BinaryOp::LooseNe,
        B::Instanceof => BinaryOp::InstanceOf,
        B::In => BinaryOp::In,
    })
}

fn compound_binary_operator(op: ast::AssignmentOperator) -> Option<BinaryOp> {
    use ast::AssignmentOperator as A;
    Some(match op {
        A::Addition => BinaryOp::Add,
        A::Subtraction => BinaryOp::Sub,
        A::Multiplication => BinaryOp::Mul,
        A::Division => BinaryOp::Div,
        A::Remainder => BinaryOp::Mod,
        A::Exponential => BinaryOp::Exp,
        A::BitwiseAnd => BinaryOp::BitAnd,
        A::BitwiseOR => BinaryOp::BitOr,
        A::BitwiseXOR => BinaryOp::BitXor,
        A::ShiftLeft => BinaryOp::Shl,
        A::ShiftRight => BinaryOp::Shr,
        A::ShiftRightZeroFill => BinaryOp::UShr,
        _ => return None,
    })
}
