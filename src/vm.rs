// ABOUTME: The embedding handle: a root environment plus process control,
// with evaluation, loading, registration and cancellation entry points.

use crate::env::Scope;
use crate::error::EvalError;
use crate::eval::{call_user_fn, eval, split_chunks};
use crate::value::{NativeFn, UserFn, Value};
use std::io::Read;
use std::sync::Arc;

/// A virtual machine: a fresh root scope with its own process control.
///
/// The embedding program registers built-ins by name, then feeds source
/// through [`Vm::eval`] or [`Vm::load_reader`]. `stop`/`resume` drive
/// cooperative cancellation from another thread.
pub struct Vm {
    root: Arc<Scope>,
}

impl Vm {
    /// A bare VM: no built-ins registered.
    pub fn new() -> Self {
        Vm { root: Scope::root() }
    }

    /// A VM with the standard built-in packages registered.
    pub fn with_builtins() -> Self {
        let vm = Self::new();
        crate::builtins::register_all(&vm.root);
        vm
    }

    pub fn root(&self) -> &Arc<Scope> {
        &self.root
    }

    /// Registers a host routine under `name` in the root scope.
    pub fn register(&self, name: &str, f: NativeFn) {
        self.root.define_native(name, f);
    }

    /// Evaluates one expression text and returns its value.
    pub fn eval(&self, text: &str) -> Result<Value, EvalError> {
        eval(&self.root, text)
    }

    /// Evaluates a whole source blob: top-level expressions in order,
    /// stopping at the first error.
    pub fn load_str(&self, src: &str) -> Result<(), EvalError> {
        for chunk in split_chunks(src)? {
            eval(&self.root, &chunk)?;
        }
        Ok(())
    }

    /// Reads a source stream to the end and loads it.
    pub fn load_reader(&self, mut reader: impl Read) -> Result<(), EvalError> {
        let mut src = String::new();
        reader
            .read_to_string(&mut src)
            .map_err(|e| EvalError::runtime_error("load", e.to_string()))?;
        self.load_str(&src)
    }

    /// Signals cancellation; every evaluation returns the cancellation
    /// error until [`Vm::resume`].
    pub fn stop(&self) {
        self.root.control().stop();
    }

    pub fn resume(&self) {
        self.root.control().resume();
    }

    /// Looks up a (possibly dotted) namespace handle under the root.
    pub fn namespace(&self, path: &str) -> Option<Arc<Scope>> {
        let mut scope = self.root.clone();
        for segment in path.split('.') {
            scope = scope.get_namespace_here(segment)?;
        }
        Some(scope)
    }

    /// Invokes a captured user function with host-supplied values.
    pub fn call_fn(&self, func: &UserFn, args: Vec<Value>) -> Result<Value, EvalError> {
        call_user_fn(func, args, "<host call>")
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native_answer(_scope: &Arc<Scope>, _args: &[Value]) -> Value {
        Value::Int(42)
    }

    #[test]
    fn test_register_and_eval() {
        let vm = Vm::new();
        vm.register("answer", native_answer);
        assert!(matches!(vm.eval("(answer)").unwrap(), Value::Int(42)));
    }

    #[test]
    fn test_load_str_stops_at_first_error() {
        let vm = Vm::new();
        vm.register("answer", native_answer);
        let err = vm.load_str("(var a (answer))\n(var a 1)\n(var b 2)").unwrap_err();
        assert!(matches!(err, EvalError::AlreadyDefined(_)));
        assert!(matches!(vm.eval("a").unwrap(), Value::Int(42)));
        assert!(vm.eval("b").is_err());
    }

    #[test]
    fn test_load_reader() {
        let vm = Vm::new();
        vm.load_reader("(var x 5)".as_bytes()).unwrap();
        assert!(matches!(vm.eval("x").unwrap(), Value::Int(5)));
    }

    #[test]
    fn test_namespace_handle_lookup() {
        let vm = Vm::new();
        vm.eval("(namespace a.b (var x 1))").unwrap();
        let ns = vm.namespace("a.b").expect("namespace exists");
        assert!(matches!(ns.get_var_here("x"), Some(Value::Int(1))));
        assert!(vm.namespace("a.c").is_none());
    }

    #[test]
    fn test_call_fn_helper() {
        let vm = Vm::new();
        vm.eval("(var pair (lambda |a b| [a b]))").unwrap();
        let Value::Fn(func) = vm.eval("pair").unwrap() else {
            panic!("expected a function value")
        };
        let out = vm
            .call_fn(&func, vec![Value::Int(1), Value::Int(2)])
            .unwrap();
        assert!(matches!(out, Value::Array(items) if items.len() == 2));
    }

    #[test]
    fn test_stop_resume_round_trip() {
        let vm = Vm::new();
        vm.stop();
        assert!(matches!(vm.eval("1"), Err(EvalError::Cancelled)));
        vm.resume();
        assert!(matches!(vm.eval("1").unwrap(), Value::Int(1)));
    }
}
