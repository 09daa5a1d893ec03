//! Map operations: `map-new`, `map-store`, `map-get`, `map-delete`,
//! `map-keys`
//!
//! Keys are restricted to the hashable variants (nil, int, float, bool,
//! string). The mutating operations return the updated map.

use crate::env::Scope;
use crate::value::{Key, Value};
use std::collections::HashMap;
use std::sync::Arc;

fn key_of(scope: &Arc<Scope>, name: &str, value: &Value) -> Option<Key> {
    match Key::from_value(value) {
        Some(key) => Some(key),
        None => {
            scope.throw(format!(
                "{name} : a {} cannot be used as a map key",
                value.type_name()
            ));
            None
        }
    }
}

pub fn builtin_map_new(_scope: &Arc<Scope>, _args: &[Value]) -> Value {
    Value::Map(HashMap::new())
}

/// `(map-store m k v)` — returns the map with the entry added.
pub fn builtin_map_store(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Map(map), key, value] = args else {
        scope.throw("map-store : requires 3 arguments (map, key, value)");
        return Value::Nil;
    };
    let Some(key) = key_of(scope, "map-store", key) else {
        return Value::Nil;
    };
    let mut out = map.clone();
    out.insert(key, value.clone());
    Value::Map(out)
}

/// `(map-get m k)` — the stored value, or nil when absent.
pub fn builtin_map_get(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Map(map), key] = args else {
        scope.throw("map-get : requires 2 arguments (map, key)");
        return Value::Nil;
    };
    let Some(key) = key_of(scope, "map-get", key) else {
        return Value::Nil;
    };
    map.get(&key).cloned().unwrap_or(Value::Nil)
}

/// `(map-delete m k)` — returns the map without the entry.
pub fn builtin_map_delete(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Map(map), key] = args else {
        scope.throw("map-delete : requires 2 arguments (map, key)");
        return Value::Nil;
    };
    let Some(key) = key_of(scope, "map-delete", key) else {
        return Value::Nil;
    };
    let mut out = map.clone();
    out.remove(&key);
    Value::Map(out)
}

/// The keys of a map as an array, in sorted order.
pub fn builtin_map_keys(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Map(map)] = args else {
        scope.throw("map-keys : requires 1 argument (map)");
        return Value::Nil;
    };
    let mut keys: Vec<&Key> = map.keys().collect();
    keys.sort();
    Value::Array(keys.into_iter().map(Key::to_value).collect())
}

/// Register all map builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("map-new", builtin_map_new);
    scope.define_native("map-store", builtin_map_store);
    scope.define_native("map-get", builtin_map_get);
    scope.define_native("map-delete", builtin_map_delete);
    scope.define_native("map-keys", builtin_map_keys);
}
