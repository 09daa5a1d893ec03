//! Array and sequence operations: `len`, `car`, `cdr`, `array-index`,
//! `array-set`, `array-append`, `array-subarray`
//!
//! Values are plain values here: the mutating operations return the
//! updated array instead of changing the argument in place.

use crate::env::Scope;
use crate::value::Value;
use std::sync::Arc;

fn index_of(scope: &Arc<Scope>, name: &str, value: &Value, length: usize) -> Option<usize> {
    let Value::Int(n) = value else {
        scope.throw(format!(
            "{name} : index expected as an int, got {}",
            value.type_name()
        ));
        return None;
    };
    if *n < 0 || *n as usize >= length {
        scope.throw(format!(
            "{name} : index {n} out of range for length {length}"
        ));
        return None;
    }
    Some(*n as usize)
}

/// Length of an array, string (in characters) or map.
pub fn builtin_len(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Array(items)] => Value::Int(items.len() as i64),
        [Value::Str(s)] => Value::Int(s.chars().count() as i64),
        [Value::Map(map)] => Value::Int(map.len() as i64),
        [other] => {
            scope.throw(format!(
                "len : expected an array, string or map, got {}",
                other.type_name()
            ));
            Value::Nil
        }
        _ => {
            scope.throw(format!("len : expected one argument, got {}", args.len()));
            Value::Nil
        }
    }
}

/// First element of an array, or first character of a string; nil when
/// empty.
pub fn builtin_car(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Array(items)] => items.first().cloned().unwrap_or(Value::Nil),
        [Value::Str(s)] => match s.chars().next() {
            Some(ch) => Value::Str(ch.to_string()),
            None => Value::Nil,
        },
        [other] => {
            scope.throw(format!(
                "car : can be done only for array or string type, got {}",
                other.type_name()
            ));
            Value::Nil
        }
        _ => {
            scope.throw("car : can be done for one variable only");
            Value::Nil
        }
    }
}

/// Everything after the first element; nil when fewer than two remain.
pub fn builtin_cdr(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Array(items)] => {
            if items.len() <= 1 {
                Value::Nil
            } else {
                Value::Array(items[1..].to_vec())
            }
        }
        [Value::Str(s)] => {
            let mut chars = s.chars();
            match chars.next() {
                Some(_) => Value::Str(chars.collect()),
                None => Value::Nil,
            }
        }
        [other] => {
            scope.throw(format!(
                "cdr : can be done only for array or string type, got {}",
                other.type_name()
            ));
            Value::Nil
        }
        _ => {
            scope.throw("cdr : can be done for one variable only");
            Value::Nil
        }
    }
}

/// Zero-based element access for arrays and strings.
pub fn builtin_array_index(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [target, index] = args else {
        scope.throw(format!(
            "array-index : require 2 arguments, got {} arguments",
            args.len()
        ));
        return Value::Nil;
    };
    match target {
        Value::Array(items) => match index_of(scope, "array-index", index, items.len()) {
            Some(i) => items[i].clone(),
            None => Value::Nil,
        },
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            match index_of(scope, "array-index", index, chars.len()) {
                Some(i) => Value::Str(chars[i].to_string()),
                None => Value::Nil,
            }
        }
        other => {
            scope.throw(format!(
                "array-index : expected an array or string, got {}",
                other.type_name()
            ));
            Value::Nil
        }
    }
}

/// Returns a copy of the array with one element replaced.
pub fn builtin_array_set(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Array(items), index, value] = args else {
        scope.throw("array-set : require 3 arguments (array, int, value)");
        return Value::Nil;
    };
    match index_of(scope, "array-set", index, items.len()) {
        Some(i) => {
            let mut out = items.clone();
            out[i] = value.clone();
            Value::Array(out)
        }
        None => Value::Nil,
    }
}

/// Appends values to an array, or strings/ints (as code points) to a
/// string, returning the extended copy.
pub fn builtin_array_append(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let Some((target, rest)) = args.split_first() else {
        scope.throw("array-append : wrong no. of arguments to the append function");
        return Value::Nil;
    };
    match target {
        Value::Array(items) => {
            let mut out = items.clone();
            out.extend(rest.iter().cloned());
            Value::Array(out)
        }
        Value::Str(s) => {
            let mut out = s.clone();
            for value in rest {
                match value {
                    Value::Str(part) => out.push_str(part),
                    Value::Int(code) => match u32::try_from(*code).ok().and_then(char::from_u32) {
                        Some(ch) => out.push(ch),
                        None => {
                            scope.throw(format!("array-append : {code} is not a character"));
                            return Value::Nil;
                        }
                    },
                    other => {
                        scope.throw(format!(
                            "array-append : unable to append {} type to string",
                            other.type_name()
                        ));
                        return Value::Nil;
                    }
                }
            }
            Value::Str(out)
        }
        other => {
            scope.throw(format!(
                "array-append : first argument should be of an array type, got {}",
                other.type_name()
            ));
            Value::Nil
        }
    }
}

/// `(array-subarray arr start end)` — the half-open slice `[start, end)`.
pub fn builtin_array_subarray(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Array(items), Value::Int(start), Value::Int(end)] = args else {
        scope.throw(format!(
            "array-subarray : require 3 arguments (array, int, int), got {} arguments",
            args.len()
        ));
        return Value::Nil;
    };
    let (start, end) = (*start, *end);
    if start < 0 || end < start || end as usize > items.len() {
        scope.throw(format!(
            "array-subarray : invalid array index numbers {start} {end} for length {}",
            items.len()
        ));
        return Value::Nil;
    }
    Value::Array(items[start as usize..end as usize].to_vec())
}

/// Register all array builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("len", builtin_len);
    scope.define_native("car", builtin_car);
    scope.define_native("cdr", builtin_cdr);
    scope.define_native("array-index", builtin_array_index);
    scope.define_native("array-set", builtin_array_set);
    scope.define_native("array-append", builtin_array_append);
    scope.define_native("array-subarray", builtin_array_subarray);
}
