// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Black-box scenarios exercising `Context::evaluate` end-to-end, the way
//! the teacher's own integration tests call into the VM purely through its
//! public API rather than reaching into internals.

use ember_vm::value::convert;
use ember_vm::{Context, Value};
use pretty_assertions::assert_eq;

fn eval_string(ctx: &mut Context, source: &str) -> String {
    let value = ctx.evaluate(source).unwrap_or_else(|e| panic!("{source}: unexpected throw: {:?}", e.value()));
    convert::to_string(ctx.agent(), &value).unwrap().to_string_lossy()
}

fn eval_number(ctx: &mut Context, source: &str) -> f64 {
    let value = ctx.evaluate(source).unwrap_or_else(|e| panic!("{source}: unexpected throw: {:?}", e.value()));
    convert::to_number(ctx.agent(), &value).unwrap()
}

/// S1: array literal holes, `length`, and the `in` operator agree.
#[test]
fn array_holes_report_correct_length_and_presence() {
    let mut ctx = Context::new();
    let result = eval_string(&mut ctx, r#"var a=[1,,3]; a.length + "," + (1 in a) + "," + a[2]"#);
    assert_eq!(result, "3,false,3");
}

/// S2: `Number.prototype.toFixed` rounds to the requested digit count.
#[test]
fn to_fixed_rounds_to_requested_precision() {
    let mut ctx = Context::new();
    let result = eval_string(&mut ctx, "(1234.5678).toFixed(2)");
    assert_eq!(result, "1234.57");
}

/// S3: `Number.prototype.toPrecision` on a classic floating-point sum.
#[test]
fn to_precision_matches_classic_float_rounding() {
    let mut ctx = Context::new();
    let result = eval_string(&mut ctx, "(0.1 + 0.2).toPrecision(2)");
    assert_eq!(result, "0.30");
}

/// S4: mixing `value` and `get` in one descriptor is a structural error.
#[test]
fn defining_a_property_with_mixed_data_and_accessor_fields_throws_type_error() {
    let mut ctx = Context::new();
    let result = eval_string(
        &mut ctx,
        r#"try { Object.defineProperty({}, "x", {value:1, get:function(){}}); "no throw" } catch(e){e.name}"#,
    );
    assert_eq!(result, "TypeError");
}

/// S5: a closure over a `var` binding observes mutations across calls.
#[test]
fn closures_share_mutable_state_across_calls() {
    let mut ctx = Context::new();
    let result = eval_number(
        &mut ctx,
        "function f(){var x=1; return function(){return ++x}} var g=f(); g()+g()",
    );
    assert_eq!(result, 5.0);
}

/// S6: a global-flag RegExp's `exec` advances `lastIndex` past the match.
#[test]
fn global_regexp_exec_advances_last_index() {
    let mut ctx = Context::new();
    let result = eval_number(&mut ctx, r#"var r=/a(b)c/g; r.exec("abcabc"); r.lastIndex"#);
    assert_eq!(result, 3.0);
}

/// Boundary: precision loss above `2^53` still round-trips through `toString`.
#[test]
fn large_integers_lose_precision_past_two_to_the_53() {
    let mut ctx = Context::new();
    assert_eq!(eval_string(&mut ctx, "(9007199254740992).toString()"), "9007199254740992");
    assert_eq!(eval_string(&mut ctx, "(9007199254740993).toString()"), "9007199254740992");
}

/// Boundary: `toFixed(0)` with no fractional digits round-half-away-from-zero.
#[test]
fn to_fixed_zero_digits_rounds_half_away_from_zero() {
    let mut ctx = Context::new();
    assert_eq!(eval_string(&mut ctx, "(0).toFixed(0)"), "0");
    assert_eq!(eval_string(&mut ctx, "(1.5).toFixed(0)"), "2");
}

/// Boundary: `Number(...)` string coercion matches ES5 `StringNumericLiteral`.
#[test]
fn number_coercion_parses_hex_and_whitespace() {
    let mut ctx = Context::new();
    assert_eq!(eval_number(&mut ctx, "Number('0x10')"), 16.0);
    assert_eq!(eval_number(&mut ctx, "Number('')"), 0.0);
    assert_eq!(eval_number(&mut ctx, "Number(' \t12 ')"), 12.0);
}

/// Boundary: a duplicate RegExp flag is a `SyntaxError` at construction.
#[test]
fn duplicate_regexp_flag_throws_syntax_error() {
    let mut ctx = Context::new();
    let result = eval_string(&mut ctx, r#"try { new RegExp("a", "gg"); "no throw" } catch(e){e.name}"#);
    assert_eq!(result, "SyntaxError");
}

/// Round-trip: `get(set(o, k, v), k) == v` for a plain data property.
#[test]
fn property_round_trips_through_get_and_set() {
    let mut ctx = Context::new();
    let result = eval_number(&mut ctx, "var o={}; o.k = 42; o.k");
    assert_eq!(result, 42.0);
}

#[test]
fn a_thrown_value_that_is_not_an_error_object_still_propagates() {
    let mut ctx = Context::new();
    let err = ctx.evaluate("throw 42;").unwrap_err();
    assert!(matches!(err.into_value(), Value::Int32(42)));
}

/// `continue` skips the rest of a loop body but still runs the update step.
#[test]
fn continue_skips_the_rest_of_a_for_loop_body_but_still_updates() {
    let mut ctx = Context::new();
    let result = eval_number(
        &mut ctx,
        "var sum=0; for (var i=0;i<5;i++){ if (i===2) continue; sum += i; } sum",
    );
    assert_eq!(result, 8.0); // 0+1+3+4
}

/// An unlabeled `break` exits only its own loop; a labeled `break` exits the
/// labeled outer loop directly.
#[test]
fn labeled_break_exits_the_outer_loop() {
    let mut ctx = Context::new();
    let result = eval_number(
        &mut ctx,
        r#"
        var hits = 0;
        outer: for (var i=0;i<3;i++) {
            for (var j=0;j<3;j++) {
                if (j === 1) break outer;
                hits++;
            }
        }
        hits
        "#,
    );
    assert_eq!(result, 1.0);
}

/// `switch` falls through case bodies in source order until a `break`.
#[test]
fn switch_falls_through_until_a_break() {
    let mut ctx = Context::new();
    let result = eval_string(
        &mut ctx,
        r#"
        var out = "";
        switch (1) {
            case 0: out += "a";
            case 1: out += "b";
            case 2: out += "c"; break;
            case 3: out += "d";
        }
        out
        "#,
    );
    assert_eq!(result, "bc");
}

/// A `finally` block runs on the try body's normal completion, not only on
/// the exceptional path.
#[test]
fn finally_runs_after_a_try_body_that_does_not_throw() {
    let mut ctx = Context::new();
    let result = eval_string(
        &mut ctx,
        r#"
        var trace = "";
        try { trace += "try"; } finally { trace += "finally"; }
        trace
        "#,
    );
    assert_eq!(result, "tryfinally");
}

/// An arrow function body closes over the enclosing function's `this`
/// instead of binding its own.
#[test]
fn arrow_function_inherits_the_enclosing_this() {
    let mut ctx = Context::new();
    let result = eval_number(
        &mut ctx,
        "var o = {n: 5, get: function(){ var add = (d) => this.n + d; return add(1); }}; o.get()",
    );
    assert_eq!(result, 6.0);
}

/// A function parameter with no corresponding argument still initializes
/// to `undefined` rather than leaving the binding uncreated.
#[test]
fn a_missing_argument_leaves_its_parameter_undefined_not_unbound() {
    let mut ctx = Context::new();
    let result = eval_string(&mut ctx, "function f(a,b){ return typeof b; } f(1)");
    assert_eq!(result, "undefined");
}

/// A `.k` access inside a loop hits the same `GetProperty` inline-cache slot
/// on every iteration; same-shape objects take the cached-slot fast path,
/// and a differently-shaped object among them still reads the right value
/// after the cache miss falls back to a full property lookup.
#[test]
fn inline_cache_hits_on_repeat_shape_and_still_reads_correctly_on_a_shape_change() {
    let mut ctx = Context::new();
    let result = eval_number(
        &mut ctx,
        r#"
        function sumK(objs) {
            var s = 0;
            for (var i = 0; i < objs.length; i++) { s += objs[i].k; }
            return s;
        }
        sumK([{k: 1}, {k: 2}, {x: 0, k: 3}])
        "#,
    );
    assert_eq!(result, 6.0);
}

/// A `return` inside a `try` that has a `finally` is rejected at compile
/// time rather than silently skipping the `finally` on the way out.
#[test]
fn return_crossing_a_try_finally_boundary_is_a_syntax_error() {
    let mut ctx = Context::new();
    let err = ctx.evaluate("function f(){ try { return 1; } finally { } } f();").unwrap_err();
    let obj = err.value().as_object().unwrap().clone();
    let name = ctx.agent().get(&obj, "name").unwrap();
    assert_eq!(convert::to_string(ctx.agent(), &name).unwrap().to_string_lossy(), "SyntaxError");
}

/// A `.k = ...` write inside a loop hits the same `SetProperty` inline-cache
/// slot on every iteration; a differently-shaped object among the targets
/// still gets written correctly after the cache miss falls back to a full
/// `[[Set]]`.
#[test]
fn inline_cached_property_write_is_not_corrupted_by_a_shape_change() {
    let mut ctx = Context::new();
    let result = eval_number(
        &mut ctx,
        r#"
        function bumpAll(objs) {
            for (var i = 0; i < objs.length; i++) { objs[i].k = objs[i].k + 1; }
        }
        var objs = [{k: 1}, {k: 2}, {x: 0, k: 10}];
        bumpAll(objs);
        objs[0].k + objs[1].k + objs[2].k
        "#,
    );
    assert_eq!(result, 16.0); // 2 + 3 + 11
}
