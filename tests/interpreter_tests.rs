// ABOUTME: End-to-end tests for the language surface: definitions, calls,
// scoping, control flow, exceptions and the documented boundary behaviours.

use std::sync::Arc;
use vesper::{EvalError, Scope, Value, Vm};

fn boom(scope: &Arc<Scope>, _args: &[Value]) -> Value {
    scope.throw("kaput");
    Value::Nil
}

fn setup() -> Vm {
    let vm = Vm::with_builtins();
    vm.register("boom", boom);
    vm
}

fn eval_all(vm: &Vm, exprs: &[&str]) -> Result<Value, EvalError> {
    let mut last = Value::Nil;
    for expr in exprs {
        last = vm.eval(expr)?;
    }
    Ok(last)
}

#[test]
fn test_define_and_call() {
    let vm = setup();
    let result = eval_all(
        &vm,
        &[
            "(var x 2)",
            "(var y 3)",
            "(fn add |a b| (+ a b))",
            "(add x y)",
        ],
    )
    .unwrap();
    assert!(matches!(result, Value::Int(5)));
}

#[test]
fn test_variadic_sum_and_spread() {
    let vm = setup();
    vm.eval("(fn sum |...xs| (progn (var s 0) (in xs v (set s (+ s v))) s))")
        .unwrap();
    assert!(matches!(vm.eval("(sum 1 2 3 4)").unwrap(), Value::Int(10)));
    assert!(matches!(vm.eval("(sum ...[1 2 3])").unwrap(), Value::Int(6)));
    assert!(matches!(vm.eval("(sum)").unwrap(), Value::Int(0)));
}

#[test]
fn test_namespace_lexical_scoping() {
    let vm = setup();
    vm.eval("(namespace N (var x 1))").unwrap();
    vm.eval("(var x 2)").unwrap();
    assert!(matches!(vm.eval("N.x").unwrap(), Value::Int(1)));
    assert!(matches!(vm.eval("x").unwrap(), Value::Int(2)));
}

#[test]
fn test_pattern_match() {
    let vm = setup();
    assert!(matches!(
        vm.eval(r#"(match 3 1 "a" 2 "b" 3 "c" _ "d")"#).unwrap(),
        Value::Str(s) if s == "c"
    ));
    assert!(matches!(
        vm.eval(r#"(match 9 1 "a" 2 "b" 3 "c" _ "d")"#).unwrap(),
        Value::Str(s) if s == "d"
    ));
}

#[test]
fn test_exception_raise_and_catch() {
    let vm = setup();
    // A throw inside the catch body is handled there, with the message
    // bound in the handler.
    let result = vm.eval("(catch e (progn (boom) 1))").unwrap();
    assert!(matches!(result, Value::Int(1)));

    // Without a catch the next expression reports the pending exception.
    vm.eval("(boom)").unwrap();
    assert!(matches!(
        vm.eval("(+ 1 1)"),
        Err(EvalError::UnhandledException(msg)) if msg == "kaput"
    ));
    assert!(matches!(
        vm.eval("(catch e e)").unwrap(),
        Value::Str(msg) if msg == "kaput"
    ));
    assert!(matches!(vm.eval("(+ 1 1)").unwrap(), Value::Int(2)));
}

#[test]
fn test_catch_attempts_its_body_once() {
    let vm = setup();
    vm.eval("(var count 0)").unwrap();
    vm.eval("(fn once || (set count (+ count 1)))").unwrap();
    let value = vm.eval("(catch e (progn (once) (boom) 2))").unwrap();
    assert!(matches!(value, Value::Int(2)));
    // The statement before the throw ran exactly once, not again for a
    // handler replay.
    assert!(matches!(vm.eval("count").unwrap(), Value::Int(1)));
}

#[test]
fn test_closures_see_their_namespace_from_outside() {
    let vm = setup();
    vm.eval("(namespace counter (var step 5) (fn bump |n| (+ n step)))")
        .unwrap();
    assert!(matches!(vm.eval("(counter.bump 1)").unwrap(), Value::Int(6)));
}

#[test]
fn test_lambda_as_first_class_value() {
    let vm = setup();
    vm.eval("(fn apply2 |f a b| (f a b))").unwrap();
    assert!(matches!(
        vm.eval("(apply2 (lambda |a b| (* a b)) 6 7)").unwrap(),
        Value::Int(42)
    ));
}

#[test]
fn test_loop_counts_to_ten() {
    let vm = setup();
    eval_all(
        &vm,
        &["(var n 0)", "(loop (< n 10) (set n (+ n 1)))"],
    )
    .unwrap();
    assert!(matches!(vm.eval("n").unwrap(), Value::Int(10)));
}

#[test]
fn test_in_over_map_keys() {
    let vm = setup();
    eval_all(
        &vm,
        &[
            "(var m (map-store (map-store (map-new) 1 \"a\") 2 \"b\"))",
            "(var total 0)",
            "(in m k (set total (+ total k)))",
        ],
    )
    .unwrap();
    assert!(matches!(vm.eval("total").unwrap(), Value::Int(3)));
}

#[test]
fn test_dynamic_eval() {
    let vm = setup();
    assert!(matches!(
        vm.eval(r#"(eval "(var z 4) (* z z)")"#).unwrap(),
        Value::Int(16)
    ));
    // Definitions made by eval land in the calling scope.
    assert!(matches!(vm.eval("z").unwrap(), Value::Int(4)));
}

#[test]
fn test_struct_fields_and_chains() {
    let vm = setup();
    vm.eval(r#"(var user (struct name "ada" address (struct city "london")))"#)
        .unwrap();
    assert!(matches!(
        vm.eval("user:name").unwrap(),
        Value::Str(s) if s == "ada"
    ));
    assert!(matches!(
        vm.eval("user:address:city").unwrap(),
        Value::Str(s) if s == "london"
    ));
}

#[test]
fn test_delete_and_shadowing() {
    let vm = setup();
    vm.eval("(var x 1)").unwrap();
    vm.eval("(fn probe || x)").unwrap();
    assert!(matches!(vm.eval("(probe)").unwrap(), Value::Int(1)));
    vm.eval("(delete x)").unwrap();
    assert!(matches!(vm.eval("(probe)"), Err(EvalError::UndefinedSymbol(_))));
}

// ----- round-trip / idempotence -----

#[test]
fn test_progn_of_one_is_identity() {
    let vm = setup();
    let direct = vm.eval("(+ 2 3)").unwrap();
    let wrapped = vm.eval("(progn (+ 2 3))").unwrap();
    assert!(direct.try_eq(&wrapped).unwrap());
}

#[test]
fn test_eval_of_to_string_is_identity() {
    let vm = setup();
    for expr in ["42", "-3", "2.5", "true", r#""hi\nthere""#, "[1 2 [3]]"] {
        let value = vm.eval(expr).unwrap();
        let round = vm
            .eval(&format!("(eval (to-string {expr}))"))
            .unwrap_or_else(|e| panic!("round-trip of {expr} failed: {e}"));
        assert!(
            value.try_eq(&round).unwrap(),
            "{expr} did not round-trip: {value} vs {round}"
        );
    }
}

#[test]
fn test_struct_serialisation_round_trips() {
    let vm = setup();
    vm.eval(r#"(var s1 (struct a 1 b "x"))"#).unwrap();
    vm.eval("(var s2 (eval (to-string s1)))").unwrap();
    let a = vm.eval("s1").unwrap();
    let b = vm.eval("s2").unwrap();
    assert!(a.try_eq(&b).unwrap());
}

// ----- boundary behaviours -----

#[test]
fn test_empty_expression_is_syntax_error() {
    let vm = setup();
    assert!(matches!(vm.eval("()"), Err(EvalError::Syntax(_))));
    assert!(matches!(vm.eval("  "), Err(EvalError::Syntax(_))));
}

#[test]
fn test_missing_separator_is_syntax_error() {
    let vm = setup();
    assert!(matches!(vm.eval("(+ [1 2]3)"), Err(EvalError::Syntax(_))));
    assert!(matches!(vm.eval(r#"(+ 1(+ 2 3))"#), Err(EvalError::Syntax(_))));
}

#[test]
fn test_variadic_in_non_final_position_rejected() {
    let vm = setup();
    assert!(matches!(
        vm.eval("(fn bad |...xs y| (+ 1 1))"),
        Err(EvalError::Syntax(_))
    ));
}

#[test]
fn test_match_wildcard_must_be_last() {
    let vm = setup();
    assert!(matches!(
        vm.eval(r#"(match 1 _ "d" 1 "a")"#),
        Err(EvalError::Syntax(_))
    ));
}

#[test]
fn test_arity_mismatch_reports_without_side_effects() {
    let vm = setup();
    vm.eval("(var hits 0)").unwrap();
    vm.eval("(fn f |a b| (set hits (+ hits 1)))").unwrap();
    assert!(matches!(vm.eval("(f 1)"), Err(EvalError::Arity { .. })));
    assert!(matches!(vm.eval("hits").unwrap(), Value::Int(0)));
}

#[test]
fn test_bad_escape_is_an_error() {
    let vm = setup();
    assert!(matches!(vm.eval(r#"(var s "a\qb")"#), Err(EvalError::Syntax(_))));
}

#[test]
fn test_load_str_rejects_stray_top_level_text() {
    let vm = setup();
    let err = vm.load_str("(var a 1)\nstray\n").unwrap_err();
    assert!(matches!(err, EvalError::Syntax(_)));
}

#[test]
fn test_load_str_with_comments() {
    let vm = setup();
    vm.load_str("; header\n(var a 1) ; trailing\n(var b (+ a 1))\n")
        .unwrap();
    assert!(matches!(vm.eval("b").unwrap(), Value::Int(2)));
}
