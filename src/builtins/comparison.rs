//! Comparison operations: `==`, `!=`, `<`, `>`, `<=`, `>=`
//!
//! Equality is checked equality: both sides must share a variant.
//! Orderings accept two numbers (mixed int/float allowed) or two strings.

use crate::env::Scope;
use crate::value::Value;
use std::cmp::Ordering;
use std::sync::Arc;

/// Value equality across any matching variants.
///
/// # Examples
///
/// ```lisp
/// (== 1 1)         ; => true
/// (== "a" "b")     ; => false
/// (== [1 2] [1 2]) ; => true
/// ```
pub fn builtin_eq(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [a, b] = args else {
        scope.throw(format!("== : expected two arguments, got {}", args.len()));
        return Value::Nil;
    };
    match a.try_eq(b) {
        Ok(equal) => Value::Bool(equal),
        Err(err) => {
            scope.throw(format!("== : {err}"));
            Value::Nil
        }
    }
}

pub fn builtin_neq(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match builtin_eq(scope, args) {
        Value::Bool(equal) => Value::Bool(!equal),
        other => other,
    }
}

fn ordering(scope: &Arc<Scope>, name: &str, args: &[Value]) -> Option<Ordering> {
    let [a, b] = args else {
        scope.throw(format!("{name} : expected two arguments, got {}", args.len()));
        return None;
    };
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => {
            scope.throw(format!(
                "{name} : cannot order {} against {}",
                a.type_name(),
                b.type_name()
            ));
            None
        }
    }
}

pub fn builtin_lt(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match ordering(scope, "<", args) {
        Some(ord) => Value::Bool(ord == Ordering::Less),
        None => Value::Nil,
    }
}

pub fn builtin_gt(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match ordering(scope, ">", args) {
        Some(ord) => Value::Bool(ord == Ordering::Greater),
        None => Value::Nil,
    }
}

pub fn builtin_le(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match ordering(scope, "<=", args) {
        Some(ord) => Value::Bool(ord != Ordering::Greater),
        None => Value::Nil,
    }
}

pub fn builtin_ge(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match ordering(scope, ">=", args) {
        Some(ord) => Value::Bool(ord != Ordering::Less),
        None => Value::Nil,
    }
}

/// Register all comparison builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("==", builtin_eq);
    scope.define_native("!=", builtin_neq);
    scope.define_native("<", builtin_lt);
    scope.define_native(">", builtin_gt);
    scope.define_native("<=", builtin_le);
    scope.define_native(">=", builtin_ge);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Scope;

    #[test]
    fn test_eq_same_variant() {
        let s = Scope::root();
        assert!(matches!(
            builtin_eq(&s, &[Value::Int(1), Value::Int(1)]),
            Value::Bool(true)
        ));
        assert!(matches!(
            builtin_eq(&s, &[Value::Int(1), Value::Int(2)]),
            Value::Bool(false)
        ));
    }

    #[test]
    fn test_eq_mixed_variant_throws() {
        let s = Scope::root();
        assert!(matches!(
            builtin_eq(&s, &[Value::Int(1), Value::Str("1".into())]),
            Value::Nil
        ));
        assert!(s.take_pending().is_some());
    }

    #[test]
    fn test_orderings_promote_numbers() {
        let s = Scope::root();
        assert!(matches!(
            builtin_lt(&s, &[Value::Int(1), Value::Float(1.5)]),
            Value::Bool(true)
        ));
        assert!(matches!(
            builtin_ge(&s, &[Value::Int(2), Value::Int(2)]),
            Value::Bool(true)
        ));
    }

    #[test]
    fn test_string_ordering() {
        let s = Scope::root();
        assert!(matches!(
            builtin_gt(&s, &[Value::Str("b".into()), Value::Str("a".into())]),
            Value::Bool(true)
        ));
    }

    #[test]
    fn test_ordering_rejects_non_ordered_types() {
        let s = Scope::root();
        assert!(matches!(
            builtin_lt(&s, &[Value::Bool(true), Value::Bool(false)]),
            Value::Nil
        ));
        assert!(s.take_pending().is_some());
    }
}
