//! Console output: `print`, `println`, `sprintf`
//!
//! Strings print bare (no quotes); everything else prints its serialised
//! form. `sprintf` supports `%d`, `%f`, `%s`, `%v` and `%%`.

use crate::env::Scope;
use crate::value::Value;
use std::sync::Arc;

fn join_raw(args: &[Value]) -> String {
    args.iter()
        .map(Value::raw_string)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn builtin_print(_scope: &Arc<Scope>, args: &[Value]) -> Value {
    print!("{}", join_raw(args));
    Value::Nil
}

pub fn builtin_println(_scope: &Arc<Scope>, args: &[Value]) -> Value {
    println!("{}", join_raw(args));
    Value::Nil
}

/// Formats a string from a format template and arguments.
///
/// # Examples
///
/// ```lisp
/// (sprintf "%d bottles of %s" 99 "beer") ; => "99 bottles of beer"
/// ```
pub fn builtin_sprintf(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let Some((format, rest)) = args.split_first() else {
        scope.throw("sprintf : expected at least one argument");
        return Value::Nil;
    };
    let Value::Str(format) = format else {
        scope.throw("sprintf : format expected as a string type");
        return Value::Nil;
    };
    match format_values(format, rest) {
        Ok(out) => Value::Str(out),
        Err(message) => {
            scope.throw(format!("sprintf : {message}"));
            Value::Nil
        }
    }
}

fn format_values(format: &str, args: &[Value]) -> Result<String, String> {
    let mut out = String::with_capacity(format.len());
    let mut next = args.iter();
    let mut chars = format.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('d') => match next.next() {
                Some(Value::Int(n)) => out.push_str(&n.to_string()),
                Some(other) => return Err(format!("%d expects an int, got {}", other.type_name())),
                None => return Err("not enough arguments for format".to_string()),
            },
            Some('f') => match next.next() {
                Some(Value::Float(f)) => out.push_str(&format!("{f:?}")),
                Some(Value::Int(n)) => out.push_str(&format!("{:?}", *n as f64)),
                Some(other) => {
                    return Err(format!("%f expects a number, got {}", other.type_name()));
                }
                None => return Err("not enough arguments for format".to_string()),
            },
            Some('s') => match next.next() {
                Some(Value::Str(s)) => out.push_str(s),
                Some(other) => {
                    return Err(format!("%s expects a string, got {}", other.type_name()));
                }
                None => return Err("not enough arguments for format".to_string()),
            },
            Some('v') => match next.next() {
                Some(value) => out.push_str(&value.raw_string()),
                None => return Err("not enough arguments for format".to_string()),
            },
            Some(other) => return Err(format!("unknown format verb '%{other}'")),
            None => return Err("dangling '%' at end of format".to_string()),
        }
    }
    if next.next().is_some() {
        return Err("too many arguments for format".to_string());
    }
    Ok(out)
}

/// Register all console builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("print", builtin_print);
    scope.define_native("println", builtin_println);
    scope.define_native("sprintf", builtin_sprintf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Scope;

    #[test]
    fn test_sprintf_verbs() {
        let s = Scope::root();
        let out = builtin_sprintf(
            &s,
            &[
                Value::Str("%d-%s-%v %% %f".into()),
                Value::Int(3),
                Value::Str("x".into()),
                Value::Bool(true),
                Value::Float(1.5),
            ],
        );
        assert!(matches!(out, Value::Str(text) if text == "3-x-true % 1.5"));
    }

    #[test]
    fn test_sprintf_argument_mismatch_throws() {
        let s = Scope::root();
        assert!(matches!(
            builtin_sprintf(&s, &[Value::Str("%d".into())]),
            Value::Nil
        ));
        assert!(s.take_pending().is_some());
        assert!(matches!(
            builtin_sprintf(&s, &[Value::Str("plain".into()), Value::Int(1)]),
            Value::Nil
        ));
        assert!(s.take_pending().is_some());
    }

    #[test]
    fn test_sprintf_wrong_verb_type_throws() {
        let s = Scope::root();
        assert!(matches!(
            builtin_sprintf(&s, &[Value::Str("%d".into()), Value::Str("x".into())]),
            Value::Nil
        ));
        assert!(s.take_pending().is_some());
    }
}
