//! Boolean operations: `and`, `or`, `not`
//!
//! Strictly boolean; there is no truthiness in this language.

use crate::env::Scope;
use crate::value::Value;
use std::sync::Arc;

fn bools(scope: &Arc<Scope>, name: &str, args: &[Value]) -> Option<Vec<bool>> {
    if args.is_empty() {
        scope.throw(format!("{name} : expected at least one argument"));
        return None;
    }
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            Value::Bool(b) => out.push(*b),
            other => {
                scope.throw(format!(
                    "{name} : expected only boolean arguments, got {}",
                    other.type_name()
                ));
                return None;
            }
        }
    }
    Some(out)
}

pub fn builtin_and(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match bools(scope, "and", args) {
        Some(values) => Value::Bool(values.iter().all(|b| *b)),
        None => Value::Nil,
    }
}

pub fn builtin_or(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match bools(scope, "or", args) {
        Some(values) => Value::Bool(values.iter().any(|b| *b)),
        None => Value::Nil,
    }
}

pub fn builtin_not(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Bool(b)] => Value::Bool(!b),
        [other] => {
            scope.throw(format!(
                "not : expected one argument of boolean type, got type {}",
                other.type_name()
            ));
            Value::Nil
        }
        _ => {
            scope.throw(format!(
                "not : expected one argument, got {} argument(s)",
                args.len()
            ));
            Value::Nil
        }
    }
}

/// Register all logic builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("and", builtin_and);
    scope.define_native("or", builtin_or);
    scope.define_native("not", builtin_not);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Scope;

    #[test]
    fn test_and_or_not() {
        let s = Scope::root();
        assert!(matches!(
            builtin_and(&s, &[Value::Bool(true), Value::Bool(false)]),
            Value::Bool(false)
        ));
        assert!(matches!(
            builtin_or(&s, &[Value::Bool(true), Value::Bool(false)]),
            Value::Bool(true)
        ));
        assert!(matches!(builtin_not(&s, &[Value::Bool(true)]), Value::Bool(false)));
    }

    #[test]
    fn test_non_bool_throws() {
        let s = Scope::root();
        assert!(matches!(
            builtin_and(&s, &[Value::Bool(true), Value::Int(1)]),
            Value::Nil
        ));
        assert!(s.take_pending().is_some());
    }
}
