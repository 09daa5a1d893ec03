// ABOUTME: Tagged runtime values: scalars, composites and callables

use crate::env::Scope;
use crate::error::EvalError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Host-provided routine. Receives the calling scope and the already
/// resolved argument list. Recoverable failures are reported either by
/// [`Scope::throw`] followed by a `Nil` return, or by returning a
/// [`Value::Error`] on the data channel.
pub type NativeFn = fn(&Arc<Scope>, &[Value]) -> Value;

/// A user-defined function: ordered formal names (the last may carry the
/// `...` variadic prefix), the unparsed body text, and a retained link to
/// the scope the function was captured in.
#[derive(Clone)]
pub struct UserFn {
    pub params: Vec<String>,
    pub body: String,
    pub env: Arc<Scope>,
}

impl UserFn {
    pub fn is_variadic(&self) -> bool {
        self.params.last().is_some_and(|p| crate::lexer::is_spread(p))
    }
}

impl fmt::Debug for UserFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured scope is omitted: scopes reach back into themselves
        // through namespaces and closures.
        f.debug_struct("UserFn")
            .field("params", &self.params)
            .field("body", &self.body)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Array(Vec<Value>),
    Map(HashMap<Key, Value>),
    Struct(HashMap<String, Value>),
    Native(NativeFn),
    Fn(UserFn),
    Error(String),
}

/// Map keys restricted to the hashable variants. Floats key by bit pattern,
/// so NaN keys compare by representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Nil,
    Int(i64),
    Float(u64),
    Bool(bool),
    Str(String),
}

impl Key {
    /// Projects a value onto the key space. `None` for arrays, maps,
    /// structs, callables and error values.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Nil => Some(Key::Nil),
            Value::Int(n) => Some(Key::Int(*n)),
            Value::Float(f) => Some(Key::Float(f.to_bits())),
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Str(s) => Some(Key::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Nil => Value::Nil,
            Key::Int(n) => Value::Int(*n),
            Key::Float(bits) => Value::Float(f64::from_bits(*bits)),
            Key::Bool(b) => Value::Bool(*b),
            Key::Str(s) => Value::Str(s.clone()),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
            Value::Native(_) | Value::Fn(_) => "func",
            Value::Error(_) => "error",
        }
    }

    /// Checked equality: payloads compare only when the variants match;
    /// comparing across variants is a type error.
    pub fn try_eq(&self, other: &Value) -> Result<bool, EvalError> {
        match (self, other) {
            (Value::Nil, Value::Nil) => Ok(true),
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (Value::Float(a), Value::Float(b)) => Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Error(a), Value::Error(b)) => Ok(a == b),
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.try_eq(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Map(a), Value::Map(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (k, x) in a {
                    match b.get(k) {
                        Some(y) if x.try_eq(y)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            (Value::Struct(a), Value::Struct(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (k, x) in a {
                    match b.get(k) {
                        Some(y) if x.try_eq(y)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            (Value::Native(a), Value::Native(b)) => Ok(std::ptr::fn_addr_eq(*a, *b)),
            (Value::Fn(a), Value::Fn(b)) => Ok(a.params == b.params && a.body == b.body),
            _ => Err(EvalError::type_error("==", self.type_name(), other, 2)),
        }
    }

    /// The bare textual form: strings without their quotes, everything else
    /// the `Display` rendering. Used by the console built-ins.
    pub fn raw_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Re-escapes a string payload for quoted display.
fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in s.chars() {
        match ch {
            '\\' => write!(f, "\\\\")?,
            '"' => write!(f, "\\\"")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            '\u{07}' => write!(f, "\\a")?,
            '\u{08}' => write!(f, "\\b")?,
            '\u{1b}' => write!(f, "\\e")?,
            '\u{0c}' => write!(f, "\\f")?,
            '\u{0b}' => write!(f, "\\v")?,
            other => write!(f, "{other}")?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Int(n) => write!(f, "{n}"),
            // Debug formatting keeps the decimal point on whole floats, so
            // the text re-classifies as a float.
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write_escaped(f, s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|(a, _), (b, _)| a.cmp(b));
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{} {}", key.to_value(), value)?;
                }
                write!(f, "}}")
            }
            Value::Struct(fields) => {
                // Serialised as the expression that builds it back.
                let mut entries: Vec<_> = fields.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                write!(f, "(struct")?;
                for (key, value) in entries {
                    write!(f, " {key} {value}")?;
                }
                write!(f, ")")
            }
            Value::Native(_) => write!(f, "<builtin>"),
            Value::Fn(func) => write!(f, "<fn |{}|>", func.params.join(" ")),
            Value::Error(msg) => write!(f, "<error: {msg}>"),
        }
    }
}
