//! Type introspection and conversion: `type`, `to-string`, `to-int`,
//! `to-float`, `is-nil`

use crate::env::Scope;
use crate::value::Value;
use std::sync::Arc;

/// Returns the type tag of its argument as a string.
pub fn builtin_type(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [value] => Value::Str(value.type_name().to_string()),
        _ => {
            scope.throw(format!("type : expected one argument, got {}", args.len()));
            Value::Nil
        }
    }
}

/// Serialises any value to its source form. Evaluating the result of
/// `to-string` rebuilds an equal value for data (non-callable) variants.
pub fn builtin_to_string(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [value] => Value::Str(value.to_string()),
        _ => {
            scope.throw(format!(
                "to-string : expected one argument, got {}",
                args.len()
            ));
            Value::Nil
        }
    }
}

pub fn builtin_to_int(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Int(n)] => Value::Int(*n),
        [Value::Float(f)] => Value::Int(*f as i64),
        [Value::Str(s)] => match s.trim().parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => {
                scope.throw(format!("to-int : cannot parse \"{s}\" as an integer"));
                Value::Nil
            }
        },
        [other] => {
            scope.throw(format!("to-int : cannot convert {}", other.type_name()));
            Value::Nil
        }
        _ => {
            scope.throw(format!("to-int : expected one argument, got {}", args.len()));
            Value::Nil
        }
    }
}

pub fn builtin_to_float(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Float(f)] => Value::Float(*f),
        [Value::Int(n)] => Value::Float(*n as f64),
        [Value::Str(s)] => match s.trim().parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => {
                scope.throw(format!("to-float : cannot parse \"{s}\" as a float"));
                Value::Nil
            }
        },
        [other] => {
            scope.throw(format!("to-float : cannot convert {}", other.type_name()));
            Value::Nil
        }
        _ => {
            scope.throw(format!(
                "to-float : expected one argument, got {}",
                args.len()
            ));
            Value::Nil
        }
    }
}

pub fn builtin_is_nil(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [value] => Value::Bool(matches!(value, Value::Nil)),
        _ => {
            scope.throw(format!("is-nil : expected one argument, got {}", args.len()));
            Value::Nil
        }
    }
}

/// Register all type builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("type", builtin_type);
    scope.define_native("to-string", builtin_to_string);
    scope.define_native("to-int", builtin_to_int);
    scope.define_native("to-float", builtin_to_float);
    scope.define_native("is-nil", builtin_is_nil);
}
