//! Exception and error-value operations: `throw`, `error`, `error?`,
//! `error-msg`
//!
//! `throw` raises on the exception channel (pending slot); `error` builds a
//! value for the data channel. The two are independent.

use crate::env::Scope;
use crate::value::Value;
use std::sync::Arc;

/// Raises a user-level exception; evaluation is blocked until a `catch`.
pub fn builtin_throw(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Str(message)] => scope.throw(message.clone()),
        [other] => scope.throw(other.raw_string()),
        _ => scope.throw(format!("throw : expected one argument, got {}", args.len())),
    }
    Value::Nil
}

/// Builds an error value carrying a message.
pub fn builtin_error(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Str(message)] => Value::Error(message.clone()),
        [other] => Value::Error(other.raw_string()),
        _ => {
            scope.throw(format!("error : expected one argument, got {}", args.len()));
            Value::Nil
        }
    }
}

pub fn builtin_is_error(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [value] => Value::Bool(matches!(value, Value::Error(_))),
        _ => {
            scope.throw(format!("error? : expected one argument, got {}", args.len()));
            Value::Nil
        }
    }
}

pub fn builtin_error_msg(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Error(message)] => Value::Str(message.clone()),
        [other] => {
            scope.throw(format!(
                "error-msg : expected an error value, got {}",
                other.type_name()
            ));
            Value::Nil
        }
        _ => {
            scope.throw(format!(
                "error-msg : expected one argument, got {}",
                args.len()
            ));
            Value::Nil
        }
    }
}

/// Register all error builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("throw", builtin_throw);
    scope.define_native("error", builtin_error);
    scope.define_native("error?", builtin_is_error);
    scope.define_native("error-msg", builtin_error_msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Scope;

    #[test]
    fn test_throw_sets_pending() {
        let s = Scope::root();
        builtin_throw(&s, &[Value::Str("kaput".into())]);
        assert_eq!(s.take_pending(), Some("kaput".to_string()));
    }

    #[test]
    fn test_error_value_round_trip() {
        let s = Scope::root();
        let err = builtin_error(&s, &[Value::Str("disk full".into())]);
        assert!(matches!(builtin_is_error(&s, &[err.clone()]), Value::Bool(true)));
        assert!(matches!(
            builtin_error_msg(&s, &[err]),
            Value::Str(text) if text == "disk full"
        ));
        assert!(matches!(
            builtin_is_error(&s, &[Value::Int(1)]),
            Value::Bool(false)
        ));
        assert_eq!(s.pending(), None);
    }
}
