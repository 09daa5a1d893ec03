//! Arithmetic operations: `+`, `-`, `*`, `/`, `%`, `reciprocal`
//!
//! Integer operands stay integers; any float operand promotes the result.
//! Division by zero throws.

use crate::env::Scope;
use crate::value::Value;
use std::sync::Arc;

/// A number coerced out of an argument, or a thrown type failure.
fn number(scope: &Arc<Scope>, name: &str, value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(f) => Some(*f),
        other => {
            scope.throw(format!(
                "{name} : expects a number type argument, got {}",
                other.type_name()
            ));
            None
        }
    }
}

fn all_ints(args: &[Value]) -> bool {
    args.iter().all(|v| matches!(v, Value::Int(_)))
}

/// Returns the sum of all arguments.
///
/// # Examples
///
/// ```lisp
/// (+ 1 2 3)   ; => 6
/// (+ 1 2.5)   ; => 3.5
/// (+)         ; => 0
/// ```
pub fn builtin_add(scope: &Arc<Scope>, args: &[Value]) -> Value {
    if all_ints(args) {
        let mut sum = 0i64;
        for arg in args {
            if let Value::Int(n) = arg {
                sum = sum.wrapping_add(*n);
            }
        }
        return Value::Int(sum);
    }
    let mut sum = 0.0;
    for arg in args {
        match number(scope, "+", arg) {
            Some(n) => sum += n,
            None => return Value::Nil,
        }
    }
    Value::Float(sum)
}

/// Subtracts subsequent arguments from the first; negates a single one.
///
/// # Examples
///
/// ```lisp
/// (- 10 3 2)  ; => 5
/// (- 5)       ; => -5
/// ```
pub fn builtin_sub(scope: &Arc<Scope>, args: &[Value]) -> Value {
    if args.is_empty() {
        scope.throw("- : expected at least one argument");
        return Value::Nil;
    }
    if all_ints(args) {
        let Value::Int(first) = args[0] else {
            unreachable!()
        };
        if args.len() == 1 {
            return Value::Int(first.wrapping_neg());
        }
        let mut result = first;
        for arg in &args[1..] {
            if let Value::Int(n) = arg {
                result = result.wrapping_sub(*n);
            }
        }
        return Value::Int(result);
    }
    let Some(first) = number(scope, "-", &args[0]) else {
        return Value::Nil;
    };
    if args.len() == 1 {
        return Value::Float(-first);
    }
    let mut result = first;
    for arg in &args[1..] {
        match number(scope, "-", arg) {
            Some(n) => result -= n,
            None => return Value::Nil,
        }
    }
    Value::Float(result)
}

/// Returns the product of all arguments.
///
/// # Examples
///
/// ```lisp
/// (* 2 3 4)  ; => 24
/// (*)        ; => 1
/// ```
pub fn builtin_mul(scope: &Arc<Scope>, args: &[Value]) -> Value {
    if all_ints(args) {
        let mut product = 1i64;
        for arg in args {
            if let Value::Int(n) = arg {
                product = product.wrapping_mul(*n);
            }
        }
        return Value::Int(product);
    }
    let mut product = 1.0;
    for arg in args {
        match number(scope, "*", arg) {
            Some(n) => product *= n,
            None => return Value::Nil,
        }
    }
    Value::Float(product)
}

/// Divides the first argument by subsequent arguments. Integer division
/// truncates; any float operand produces a float result.
///
/// # Examples
///
/// ```lisp
/// (/ 20 4)   ; => 5
/// (/ 7 2)    ; => 3
/// (/ 7.0 2)  ; => 3.5
/// ```
pub fn builtin_div(scope: &Arc<Scope>, args: &[Value]) -> Value {
    if args.len() < 2 {
        scope.throw("/ : expected at least two arguments");
        return Value::Nil;
    }
    if all_ints(args) {
        let Value::Int(first) = args[0] else {
            unreachable!()
        };
        let mut result = first;
        for arg in &args[1..] {
            if let Value::Int(n) = arg {
                if *n == 0 {
                    scope.throw("/ : division by zero");
                    return Value::Nil;
                }
                result = result.wrapping_div(*n);
            }
        }
        return Value::Int(result);
    }
    let Some(first) = number(scope, "/", &args[0]) else {
        return Value::Nil;
    };
    let mut result = first;
    for arg in &args[1..] {
        match number(scope, "/", arg) {
            Some(n) => {
                if n == 0.0 {
                    scope.throw("/ : division by zero");
                    return Value::Nil;
                }
                result /= n;
            }
            None => return Value::Nil,
        }
    }
    Value::Float(result)
}

/// Returns the remainder when the first integer is divided by the second.
pub fn builtin_mod(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let (a, b) = match args {
        [Value::Int(a), Value::Int(b)] => (*a, *b),
        [_, _] => {
            scope.throw("% : expected two integer arguments");
            return Value::Nil;
        }
        _ => {
            scope.throw(format!("% : expected two arguments, got {}", args.len()));
            return Value::Nil;
        }
    };
    if b == 0 {
        scope.throw("% : division by zero");
        return Value::Nil;
    }
    Value::Int(a % b)
}

/// Returns 1/x as a float.
pub fn builtin_reciprocal(scope: &Arc<Scope>, args: &[Value]) -> Value {
    if args.len() != 1 {
        scope.throw("reciprocal : wrong number of arguments");
        return Value::Nil;
    }
    let Some(n) = number(scope, "reciprocal", &args[0]) else {
        return Value::Nil;
    };
    if n == 0.0 {
        scope.throw("reciprocal : division by zero");
        return Value::Nil;
    }
    Value::Float(1.0 / n)
}

/// Register all arithmetic builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("+", builtin_add);
    scope.define_native("-", builtin_sub);
    scope.define_native("*", builtin_mul);
    scope.define_native("/", builtin_div);
    scope.define_native("%", builtin_mod);
    scope.define_native("reciprocal", builtin_reciprocal);
}
