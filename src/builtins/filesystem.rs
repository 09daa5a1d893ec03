//! File text I/O: `read-file`, `write-file`, `file-exists?`
//!
//! Whole-file operations on UTF-8 text. I/O failures throw.

use crate::env::Scope;
use crate::value::Value;
use std::sync::Arc;

pub fn builtin_read_file(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Str(path)] = args else {
        scope.throw("read-file : requires 1 string argument (path)");
        return Value::Nil;
    };
    match std::fs::read_to_string(path) {
        Ok(contents) => Value::Str(contents),
        Err(err) => {
            scope.throw(format!("read-file : {path} : {err}"));
            Value::Nil
        }
    }
}

pub fn builtin_write_file(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Str(path), Value::Str(contents)] = args else {
        scope.throw("write-file : requires 2 string arguments (path, contents)");
        return Value::Nil;
    };
    match std::fs::write(path, contents) {
        Ok(()) => Value::Int(contents.len() as i64),
        Err(err) => {
            scope.throw(format!("write-file : {path} : {err}"));
            Value::Nil
        }
    }
}

pub fn builtin_file_exists(scope: &Arc<Scope>, args: &[Value]) -> Value {
    match args {
        [Value::Str(path)] => Value::Bool(std::path::Path::new(path).exists()),
        _ => {
            scope.throw("file-exists? : requires 1 string argument (path)");
            Value::Nil
        }
    }
}

/// Register all filesystem builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("read-file", builtin_read_file);
    scope.define_native("write-file", builtin_write_file);
    scope.define_native("file-exists?", builtin_file_exists);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Scope;

    #[test]
    fn test_write_then_read() {
        let s = Scope::root();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt").display().to_string();
        assert!(matches!(
            builtin_write_file(&s, &[Value::Str(path.clone()), Value::Str("hello".into())]),
            Value::Int(5)
        ));
        assert!(matches!(
            builtin_file_exists(&s, &[Value::Str(path.clone())]),
            Value::Bool(true)
        ));
        assert!(matches!(
            builtin_read_file(&s, &[Value::Str(path)]),
            Value::Str(contents) if contents == "hello"
        ));
    }

    #[test]
    fn test_read_missing_file_throws() {
        let s = Scope::root();
        assert!(matches!(
            builtin_read_file(&s, &[Value::Str("/no/such/file".into())]),
            Value::Nil
        ));
        assert!(s.take_pending().is_some());
    }
}
