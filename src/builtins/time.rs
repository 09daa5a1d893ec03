//! Time operations: `sleep`

use crate::env::Scope;
use crate::value::Value;
use std::sync::Arc;
use std::time::Duration;

/// `(sleep ms)` — blocks the current task for the given milliseconds.
pub fn builtin_sleep(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Int(ms)] if *ms >= 0 => {
            std::thread::sleep(Duration::from_millis(*ms as u64));
            Value::Nil
        }
        [Value::Int(ms)] => {
            scope.throw(format!("sleep : negative duration {ms}"));
            Value::Nil
        }
        _ => {
            scope.throw("sleep : expected one int argument (milliseconds)");
            Value::Nil
        }
    }
}

/// Register all time builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("sleep", builtin_sleep);
}
