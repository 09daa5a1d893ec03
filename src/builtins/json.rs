//! JSON bridge: `json-parse`, `json-string`
//!
//! Objects become maps with string keys; integral JSON numbers become
//! ints, others floats; `null` becomes nil.

use crate::env::Scope;
use crate::value::{Key, Value};
use std::collections::HashMap;
use std::sync::Arc;

fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(fields) => {
            let mut map = HashMap::new();
            for (key, value) in fields {
                map.insert(Key::Str(key.clone()), from_json(value));
            }
            Value::Map(map)
        }
    }
}

fn to_json(value: &Value) -> Result<serde_json::Value, String> {
    match value {
        Value::Nil => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Int(n) => Ok(serde_json::Value::from(*n)),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| format!("{f} has no JSON representation")),
        Value::Str(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(to_json(item)?);
            }
            Ok(serde_json::Value::Array(out))
        }
        Value::Map(map) => {
            let mut out = serde_json::Map::new();
            for (key, value) in map {
                let name = match key {
                    Key::Str(s) => s.clone(),
                    other => other.to_value().raw_string(),
                };
                out.insert(name, to_json(value)?);
            }
            Ok(serde_json::Value::Object(out))
        }
        Value::Struct(fields) => {
            let mut out = serde_json::Map::new();
            for (name, value) in fields {
                out.insert(name.clone(), to_json(value)?);
            }
            Ok(serde_json::Value::Object(out))
        }
        other => Err(format!("a {} has no JSON representation", other.type_name())),
    }
}

pub fn builtin_json_parse(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Str(text)] = args else {
        scope.throw("json-parse : requires 1 string argument");
        return Value::Nil;
    };
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(json) => from_json(&json),
        Err(err) => {
            scope.throw(format!("json-parse : {err}"));
            Value::Nil
        }
    }
}

pub fn builtin_json_string(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [value] = args else {
        scope.throw("json-string : requires 1 argument");
        return Value::Nil;
    };
    match to_json(value) {
        Ok(json) => Value::Str(json.to_string()),
        Err(message) => {
            scope.throw(format!("json-string : {message}"));
            Value::Nil
        }
    }
}

/// Register all JSON builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("json-parse", builtin_json_parse);
    scope.define_native("json-string", builtin_json_string);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Scope;

    #[test]
    fn test_parse_object() {
        let s = Scope::root();
        let out = builtin_json_parse(&s, &[Value::Str(r#"{"a": 1, "b": [true, 2.5]}"#.into())]);
        let Value::Map(map) = out else { panic!("expected map") };
        assert!(matches!(map.get(&Key::Str("a".into())), Some(Value::Int(1))));
        assert!(matches!(map.get(&Key::Str("b".into())), Some(Value::Array(_))));
    }

    #[test]
    fn test_parse_failure_throws() {
        let s = Scope::root();
        assert!(matches!(
            builtin_json_parse(&s, &[Value::Str("{nope".into())]),
            Value::Nil
        ));
        assert!(s.take_pending().is_some());
    }

    #[test]
    fn test_string_round_trip() {
        let s = Scope::root();
        let value = Value::Array(vec![Value::Int(1), Value::Nil, Value::Bool(true)]);
        let Value::Str(text) = builtin_json_string(&s, &[value]) else {
            panic!("expected string")
        };
        assert_eq!(text, "[1,null,true]");
    }

    #[test]
    fn test_callable_has_no_json_form() {
        let s = Scope::root();
        assert!(matches!(
            builtin_json_string(&s, &[Value::Native(builtin_json_parse)]),
            Value::Nil
        ));
        assert!(s.take_pending().is_some());
    }
}
