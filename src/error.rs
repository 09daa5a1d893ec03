// ABOUTME: Error types for evaluation failures in the interpreter

use crate::value::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Malformed source text: unterminated literals, unbalanced delimiters,
    /// bad escapes, missing separators, stray characters between expressions.
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("variable '{0}' not found in scope")]
    UndefinedSymbol(String),

    #[error("function '{0}' not found")]
    FunctionNotFound(String),

    #[error("'{0}' already defined, use \"set\" for updating variables")]
    AlreadyDefined(String),

    /// Type mismatch with operation name, expected type, actual type and
    /// argument position.
    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    TypeMismatch {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    /// Arity error with operation name, expected count/range, and actual count
    #[error("{function}: expected {expected} argument{}, got {actual}", if *.expected == "1" { "" } else { "s" })]
    Arity {
        function: String,
        expected: String, // "2", "3-4", "at least 1"
        actual: usize,
    },

    /// Runtime failure raised with operation context
    #[error("{function}: {message}")]
    Runtime { function: String, message: String },

    /// Returned while the cancellation flag is set; sticky until `resume`.
    #[error("evaluation stopped by signal")]
    Cancelled,

    /// Returned for any gated evaluation while an exception is pending.
    #[error("exception not handled: {0}")]
    UnhandledException(String),
}

impl EvalError {
    /// Create a type mismatch error with full context
    pub fn type_error(function: &str, expected: &str, actual: &Value, position: usize) -> Self {
        EvalError::TypeMismatch {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
            position,
        }
    }

    /// Create an arity error with expected and actual counts
    pub fn arity_error(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::Arity {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    /// Create a runtime error with operation context
    pub fn runtime_error(function: &str, message: impl Into<String>) -> Self {
        EvalError::Runtime {
            function: function.to_string(),
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        EvalError::Syntax(message.into())
    }
}
