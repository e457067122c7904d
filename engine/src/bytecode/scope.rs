// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compile-time scope tracking for the bytecode generator (`spec.md` §4.4
//! "scope climbing", §3 "ScopeContext (compile-time)"). Grounded in
//! `byte_compiler.rs`'s `Environment` bookkeeping, generalized from a single
//! flat binding table to the nested block/function scopes ES5/ES6
//! `let`/`const`/`var` hoisting needs, plus the per-scope flags and lists
//! `generator.rs`'s variable-resolution tier picker (`resolve_identifier`)
//! consults so it can choose a register, a heap binding one or more calls
//! out, or the name-based slow path.

use std::collections::HashSet;
use std::rc::Rc;

/// Tags how a name entered its scope. `Var`/`Parameter`/`FunctionName`
/// bindings are live (as `undefined`, or the argument/function value) from
/// the moment their scope is entered; `Let`/`Const` are merely hoisted as a
/// placeholder until their declaration statement runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Parameter,
    FunctionName,
}

impl BindingKind {
    pub fn is_var_or_parameter(&self) -> bool {
        matches!(self, BindingKind::Var | BindingKind::Parameter | BindingKind::FunctionName)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Function,
    Block,
}

/// A small, capped pool of numeric literals seen while compiling a scope.
/// Above the cap the pool is discarded and `overflowed` is set instead of
/// growing it unboundedly for a function with a lot of literals.
#[derive(Debug, Default)]
pub struct NumericLiteralPool {
    values: Vec<f64>,
    overflowed: bool,
}

impl NumericLiteralPool {
    const CAP: usize = 64;

    pub fn record(&mut self, n: f64) {
        if self.overflowed {
            return;
        }
        if self.values.len() >= Self::CAP {
            self.values.clear();
            self.overflowed = true;
            return;
        }
        self.values.push(n);
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

/// One compile-time lexical scope. Function-kind scopes are where `var`
/// declarations and function hoisting land; block-kind scopes only ever
/// collect `let`/`const`.
#[derive(Debug)]
pub struct ScopeContext {
    pub kind: ScopeKind,
    pub is_strict: bool,
    /// Set once a direct reference to the identifier `eval` is seen
    /// lexically within this scope (not inside a nested function). Forces
    /// every identifier use in the owning function to the name-based tier,
    /// per "a scope containing `eval` or `with` forces every enclosed
    /// identifier use to the slow path".
    pub has_eval: bool,
    /// Always `false` in this generator: `with` is never lowered
    /// (`emit_statement` has no `WithStatement` arm), but the flag is
    /// tracked for the same reason `has_eval` is — a `with` arm would need
    /// it without changing this struct's shape.
    pub has_with: bool,
    pub has_catch: bool,
    /// Always `false`: generator functions are not lowered by this crate.
    pub has_yield: bool,
    pub in_catch: bool,
    pub in_with: bool,
    declared: Vec<(Rc<str>, BindingKind)>,
    used_names: HashSet<Rc<str>>,
    pub params: Vec<Rc<str>>,
    pub function_name: Option<Rc<str>>,
    /// Names of nested function declarations/expressions compiled while
    /// this scope was current.
    child_scopes: Vec<Rc<str>>,
    pub numeric_literals: NumericLiteralPool,
}

impl ScopeContext {
    pub fn new(kind: ScopeKind, is_strict: bool) -> ScopeContext {
        ScopeContext {
            kind,
            is_strict,
            has_eval: false,
            has_with: false,
            has_catch: false,
            has_yield: false,
            in_catch: false,
            in_with: false,
            declared: Vec::new(),
            used_names: HashSet::new(),
            params: Vec::new(),
            function_name: None,
            child_scopes: Vec::new(),
            numeric_literals: NumericLiteralPool::default(),
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.declared.iter().any(|(n, _)| &**n == name)
    }

    pub fn binding_kind(&self, name: &str) -> Option<BindingKind> {
        self.declared.iter().find(|(n, _)| &**n == name).map(|(_, k)| *k)
    }

    pub fn declare(&mut self, name: Rc<str>, kind: BindingKind) {
        if self.declares(&name) {
            return;
        }
        self.declared.push((name, kind));
    }

    pub fn declared_names(&self) -> impl Iterator<Item = &(Rc<str>, BindingKind)> {
        self.declared.iter()
    }

    pub fn mark_used(&mut self, name: Rc<str>) {
        self.used_names.insert(name);
    }

    pub fn used_names(&self) -> &HashSet<Rc<str>> {
        &self.used_names
    }

    pub fn add_child_scope(&mut self, name: Rc<str>) {
        self.child_scopes.push(name);
    }

    pub fn child_scopes(&self) -> &[Rc<str>] {
        &self.child_scopes
    }
}

/// A stack of nested [`ScopeContext`]s, climbed by the generator when
/// resolving `var` hoist targets (walk up to the nearest function/top-level
/// scope) vs. `let`/`const` (stay in the innermost block scope).
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<ScopeContext>,
}

impl ScopeStack {
    pub fn new() -> ScopeStack {
        ScopeStack { scopes: Vec::new() }
    }

    pub fn push(&mut self, kind: ScopeKind, is_strict: bool) {
        self.scopes.push(ScopeContext::new(kind, is_strict));
    }

    pub fn pop(&mut self) -> ScopeContext {
        self.scopes.pop().expect("scope stack underflow")
    }

    pub fn current_mut(&mut self) -> &mut ScopeContext {
        self.scopes.last_mut().expect("scope stack is empty")
    }

    pub fn current(&self) -> &ScopeContext {
        self.scopes.last().expect("scope stack is empty")
    }

    pub fn is_strict(&self) -> bool {
        self.scopes.iter().any(|s| s.is_strict)
    }

    /// Whether any scope from the innermost out to (and including) the
    /// nearest enclosing function scope has seen a direct `eval` reference.
    pub fn has_eval_in_function(&self) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.has_eval {
                return true;
            }
            if scope.kind == ScopeKind::Function {
                break;
            }
        }
        false
    }

    pub fn mark_eval_seen(&mut self) {
        self.current_mut().has_eval = true;
    }

    /// Declares a `var`/function-hoisted name in the nearest enclosing
    /// function (or top-level) scope, per `spec.md` §4.4 "scope climbing".
    pub fn declare_var(&mut self, name: Rc<str>, kind: BindingKind) {
        for scope in self.scopes.iter_mut().rev() {
            if scope.kind == ScopeKind::Function {
                scope.declare(name, kind);
                return;
            }
        }
        if let Some(top) = self.scopes.first_mut() {
            top.declare(name, kind);
        }
    }

    pub fn declare_lexical(&mut self, name: Rc<str>, kind: BindingKind) {
        self.current_mut().declare(name, kind);
    }

    /// Finds which enclosing scope (searching innermost-out) declares
    /// `name`, and under what kind.
    pub fn lookup(&self, name: &str) -> Option<BindingKind> {
        self.scopes.iter().rev().find_map(|s| s.binding_kind(name))
    }

    /// Declared names of the nearest enclosing function scope — the set a
    /// nested function's free-variable resolution checks against when
    /// deciding whether a name it doesn't declare itself is a captured
    /// binding of *this* function.
    pub fn function_scope_declared_names(&self) -> HashSet<Rc<str>> {
        for scope in self.scopes.iter().rev() {
            if scope.kind == ScopeKind::Function {
                return scope.declared_names().map(|(n, _)| n.clone()).collect();
            }
        }
        HashSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_var_tags_the_binding_kind_and_climbs_to_the_function_scope() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Function, false);
        stack.push(ScopeKind::Block, false);
        stack.declare_var(Rc::from("x"), BindingKind::Var);
        stack.declare_lexical(Rc::from("y"), BindingKind::Let);

        let block = stack.pop();
        assert!(!block.declares("x"));
        assert_eq!(block.binding_kind("y"), Some(BindingKind::Let));

        let func = stack.pop();
        assert_eq!(func.binding_kind("x"), Some(BindingKind::Var));
    }

    #[test]
    fn has_eval_in_function_stops_climbing_at_the_function_boundary() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeKind::Function, false);
        stack.push(ScopeKind::Function, false);
        stack.mark_eval_seen();
        assert!(stack.has_eval_in_function());
        stack.pop();
        assert!(!stack.has_eval_in_function());
    }

    #[test]
    fn numeric_literal_pool_drops_its_contents_once_it_overflows() {
        let mut pool = NumericLiteralPool::default();
        for i in 0..NumericLiteralPool::CAP {
            pool.record(i as f64);
        }
        assert!(!pool.overflowed());
        pool.record(1000.0);
        assert!(pool.overflowed());
        assert!(pool.values().is_empty());
    }
}
