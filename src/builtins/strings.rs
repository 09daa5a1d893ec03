//! String operations: `string-split`, `string-replace`, `string-contains`,
//! `string-indexof`, `string-trimspace`, `string-uppercase`,
//! `string-lowercase`, `string-repeat`, `string-fromarray`

use crate::env::Scope;
use crate::value::Value;
use std::sync::Arc;

fn two_strings<'a>(
    scope: &Arc<Scope>,
    name: &str,
    args: &'a [Value],
) -> Option<(&'a str, &'a str)> {
    match args {
        [Value::Str(a), Value::Str(b)] => Some((a.as_str(), b.as_str())),
        _ => {
            scope.throw(format!("{name} : requires 2 string arguments"));
            None
        }
    }
}

/// `(string-split s sep)` — array of the pieces around `sep`.
pub fn builtin_split(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match two_strings(scope, "string-split", args) {
        Some((s, sep)) => {
            let parts: Vec<Value> = if sep.is_empty() {
                s.chars().map(|c| Value::Str(c.to_string())).collect()
            } else {
                s.split(sep).map(|p| Value::Str(p.to_string())).collect()
            };
            Value::Array(parts)
        }
        None => Value::Nil,
    }
}

/// `(string-replace s from to)` — all occurrences replaced.
pub fn builtin_replace(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Str(s), Value::Str(from), Value::Str(to)] => Value::Str(s.replace(from, to)),
        _ => {
            scope.throw("string-replace : requires 3 string arguments");
            Value::Nil
        }
    }
}

pub fn builtin_contains(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match two_strings(scope, "string-contains", args) {
        Some((s, needle)) => Value::Bool(s.contains(needle)),
        None => Value::Nil,
    }
}

/// Character index of the first occurrence, or -1.
pub fn builtin_indexof(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match two_strings(scope, "string-indexof", args) {
        Some((s, needle)) => match s.find(needle) {
            Some(byte_index) => Value::Int(s[..byte_index].chars().count() as i64),
            None => Value::Int(-1),
        },
        None => Value::Nil,
    }
}

pub fn builtin_trimspace(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Str(s)] => Value::Str(s.trim().to_string()),
        _ => {
            scope.throw("string-trimspace : requires 1 string argument");
            Value::Nil
        }
    }
}

pub fn builtin_uppercase(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Str(s)] => Value::Str(s.to_uppercase()),
        _ => {
            scope.throw("string-uppercase : requires 1 string argument");
            Value::Nil
        }
    }
}

pub fn builtin_lowercase(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Str(s)] => Value::Str(s.to_lowercase()),
        _ => {
            scope.throw("string-lowercase : requires 1 string argument");
            Value::Nil
        }
    }
}

pub fn builtin_repeat(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Str(s), Value::Int(n)] if *n >= 0 => Value::Str(s.repeat(*n as usize)),
        [Value::Str(_), Value::Int(n)] => {
            scope.throw(format!("string-repeat : negative count {n}"));
            Value::Nil
        }
        _ => {
            scope.throw("string-repeat : requires a string and an int");
            Value::Nil
        }
    }
}

/// Joins an array of strings into one string.
pub fn builtin_fromarray(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Array(items)] = args else {
        scope.throw("string-fromarray : requires 1 array argument");
        return Value::Nil;
    };
    let mut out = String::new();
    for item in items {
        match item {
            Value::Str(s) => out.push_str(s),
            other => {
                scope.throw(format!(
                    "string-fromarray : expected only strings in the array, got {}",
                    other.type_name()
                ));
                return Value::Nil;
            }
        }
    }
    Value::Str(out)
}

/// Register all string builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("string-split", builtin_split);
    scope.define_native("string-replace", builtin_replace);
    scope.define_native("string-contains", builtin_contains);
    scope.define_native("string-indexof", builtin_indexof);
    scope.define_native("string-trimspace", builtin_trimspace);
    scope.define_native("string-uppercase", builtin_uppercase);
    scope.define_native("string-lowercase", builtin_lowercase);
    scope.define_native("string-repeat", builtin_repeat);
    scope.define_native("string-fromarray", builtin_fromarray);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Scope;

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    #[test]
    fn test_split_and_join() {
        let scope = Scope::root();
        let Value::Array(parts) = builtin_split(&scope, &[s("a,b,c"), s(",")]) else {
            panic!("expected array")
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(
            builtin_fromarray(&scope, &[Value::Array(parts)]),
            Value::Str(text) if text == "abc"
        ));
    }

    #[test]
    fn test_split_empty_separator_yields_chars() {
        let scope = Scope::root();
        let Value::Array(parts) = builtin_split(&scope, &[s("ab"), s("")]) else {
            panic!("expected array")
        };
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn test_replace_contains_indexof() {
        let scope = Scope::root();
        assert!(matches!(
            builtin_replace(&scope, &[s("a-b-c"), s("-"), s("+")]),
            Value::Str(text) if text == "a+b+c"
        ));
        assert!(matches!(
            builtin_contains(&scope, &[s("hello"), s("ell")]),
            Value::Bool(true)
        ));
        assert!(matches!(builtin_indexof(&scope, &[s("hello"), s("lo")]), Value::Int(3)));
        assert!(matches!(builtin_indexof(&scope, &[s("hello"), s("x")]), Value::Int(-1)));
    }

    #[test]
    fn test_case_trim_repeat() {
        let scope = Scope::root();
        assert!(matches!(
            builtin_uppercase(&scope, &[s("ab")]),
            Value::Str(text) if text == "AB"
        ));
        assert!(matches!(
            builtin_trimspace(&scope, &[s("  x ")]),
            Value::Str(text) if text == "x"
        ));
        assert!(matches!(
            builtin_repeat(&scope, &[s("ab"), Value::Int(3)]),
            Value::Str(text) if text == "ababab"
        ));
    }

    #[test]
    fn test_type_failures_throw() {
        let scope = Scope::root();
        assert!(matches!(builtin_split(&scope, &[s("a"), Value::Int(1)]), Value::Nil));
        assert!(scope.take_pending().is_some());
    }
}
