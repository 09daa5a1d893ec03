// ABOUTME: Scopes (nested binding environments) and the shared process
// control used for cooperative cancellation.

use crate::value::{NativeFn, UserFn, Value};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation state shared by every scope descended from one
/// root. The evaluator polls `interrupted` at entry and at each loop
/// iteration; `stop` is sticky until `resume`. The mutex serialises the
/// transitions so an external controller observes them deterministically.
#[derive(Debug, Default)]
pub struct ProcessControl {
    interrupt: AtomicBool,
    gate: Mutex<()>,
}

impl ProcessControl {
    pub fn stop(&self) {
        let _guard = self.gate.lock();
        self.interrupt.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        let _guard = self.gate.lock();
        self.interrupt.store(false, Ordering::SeqCst);
    }

    pub fn interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }
}

/// One binding environment. Values, built-ins, user functions and
/// namespaces are independent keyspaces; lookup falls back along the parent
/// chain. Scopes are shared across forked tasks, so every map sits behind a
/// lock.
pub struct Scope {
    vars: RwLock<HashMap<String, Value>>,
    fns: RwLock<HashMap<String, NativeFn>>,
    ufns: RwLock<HashMap<String, UserFn>>,
    namespaces: RwLock<HashMap<String, Arc<Scope>>>,
    parent: Option<Arc<Scope>>,
    is_namespace: bool,
    /// Shared VM-wide: a throw inside a callee must stay visible after the
    /// call frame unwinds.
    pending: Arc<Mutex<Option<String>>>,
    control: Arc<ProcessControl>,
}

impl Scope {
    /// A fresh root environment with its own process control.
    pub fn root() -> Arc<Scope> {
        Arc::new(Scope {
            vars: RwLock::new(HashMap::new()),
            fns: RwLock::new(HashMap::new()),
            ufns: RwLock::new(HashMap::new()),
            namespaces: RwLock::new(HashMap::new()),
            parent: None,
            is_namespace: false,
            pending: Arc::new(Mutex::new(None)),
            control: Arc::new(ProcessControl::default()),
        })
    }

    /// A fresh call/block scope chained to `self`.
    pub fn child(self: &Arc<Self>) -> Arc<Scope> {
        Arc::new(Scope {
            vars: RwLock::new(HashMap::new()),
            fns: RwLock::new(HashMap::new()),
            ufns: RwLock::new(HashMap::new()),
            namespaces: RwLock::new(HashMap::new()),
            parent: Some(self.clone()),
            is_namespace: false,
            pending: self.pending.clone(),
            control: self.control.clone(),
        })
    }

    /// A flat copy of this scope's own maps: same parent, same control and
    /// pending slot. Used by `catch` so handler-local bindings do not leak.
    pub fn clone_flat(self: &Arc<Self>) -> Arc<Scope> {
        Arc::new(Scope {
            vars: RwLock::new(self.vars.read().clone()),
            fns: RwLock::new(self.fns.read().clone()),
            ufns: RwLock::new(self.ufns.read().clone()),
            namespaces: RwLock::new(self.namespaces.read().clone()),
            parent: self.parent.clone(),
            is_namespace: self.is_namespace,
            pending: self.pending.clone(),
            control: self.control.clone(),
        })
    }

    /// Replaces this scope's own maps with `other`'s. Used by `catch` to
    /// commit a clean protected attempt back into the surrounding scope.
    pub fn adopt(&self, other: &Scope) {
        *self.vars.write() = other.vars.read().clone();
        *self.fns.write() = other.fns.read().clone();
        *self.ufns.write() = other.ufns.read().clone();
        *self.namespaces.write() = other.namespaces.read().clone();
    }

    pub fn parent(&self) -> Option<Arc<Scope>> {
        self.parent.clone()
    }

    pub fn is_namespace(&self) -> bool {
        self.is_namespace
    }

    // ----- vars -----

    pub fn define_var(&self, name: &str, value: Value) {
        self.vars.write().insert(name.to_string(), value);
    }

    pub fn get_var_here(&self, name: &str) -> Option<Value> {
        self.vars.read().get(name).cloned()
    }

    pub fn var_defined_here(&self, name: &str) -> bool {
        self.vars.read().contains_key(name)
    }

    /// Assigns to the nearest existing binding, walking the parent chain.
    /// Returns false when no scope holds the name.
    pub fn assign_var(&self, name: &str, value: Value) -> bool {
        if self.var_defined_here(name) {
            self.vars.write().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign_var(name, value),
            None => false,
        }
    }

    pub fn delete_var(&self, name: &str) -> bool {
        self.vars.write().remove(name).is_some()
    }

    /// Walks the chain for the nearest binding of `name`.
    pub fn lookup_var(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.get_var_here(name) {
            return Some(v);
        }
        self.parent.as_ref().and_then(|p| p.lookup_var(name))
    }

    // ----- built-ins -----

    pub fn define_native(&self, name: &str, f: NativeFn) {
        self.fns.write().insert(name.to_string(), f);
    }

    pub fn get_native_here(&self, name: &str) -> Option<NativeFn> {
        self.fns.read().get(name).copied()
    }

    pub fn native_defined_here(&self, name: &str) -> bool {
        self.fns.read().contains_key(name)
    }

    /// Replaces the nearest existing built-in binding; false when absent.
    pub fn assign_native(&self, name: &str, f: NativeFn) -> bool {
        if self.native_defined_here(name) {
            self.fns.write().insert(name.to_string(), f);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign_native(name, f),
            None => false,
        }
    }

    // ----- user functions -----

    pub fn define_ufn(&self, name: &str, f: UserFn) {
        self.ufns.write().insert(name.to_string(), f);
    }

    pub fn get_ufn_here(&self, name: &str) -> Option<UserFn> {
        self.ufns.read().get(name).cloned()
    }

    pub fn ufn_defined_here(&self, name: &str) -> bool {
        self.ufns.read().contains_key(name)
    }

    /// Replaces the nearest existing user-function binding; false when
    /// absent.
    pub fn assign_ufn(&self, name: &str, f: UserFn) -> bool {
        if self.ufn_defined_here(name) {
            self.ufns.write().insert(name.to_string(), f);
            return true;
        }
        match &self.parent {
            Some(parent) => parent.assign_ufn(name, f),
            None => false,
        }
    }

    // ----- namespaces -----

    pub fn get_namespace_here(&self, name: &str) -> Option<Arc<Scope>> {
        self.namespaces.read().get(name).cloned()
    }

    /// Finds or creates the namespace child `name` of this scope. The write
    /// lock spans the check and the insert so concurrent tasks agree on one
    /// namespace scope.
    pub fn namespace_scope(self: &Arc<Self>, name: &str) -> Arc<Scope> {
        let mut namespaces = self.namespaces.write();
        if let Some(existing) = namespaces.get(name) {
            return existing.clone();
        }
        let ns = Arc::new(Scope {
            vars: RwLock::new(HashMap::new()),
            fns: RwLock::new(HashMap::new()),
            ufns: RwLock::new(HashMap::new()),
            namespaces: RwLock::new(HashMap::new()),
            parent: Some(self.clone()),
            is_namespace: true,
            pending: self.pending.clone(),
            control: self.control.clone(),
        });
        namespaces.insert(name.to_string(), ns.clone());
        ns
    }

    // ----- pending exception -----

    /// Records a user-level exception. Evaluation of anything but `catch`
    /// is blocked until the slot is cleared.
    pub fn throw(&self, message: impl Into<String>) {
        *self.pending.lock() = Some(message.into());
    }

    pub fn pending(&self) -> Option<String> {
        self.pending.lock().clone()
    }

    pub fn take_pending(&self) -> Option<String> {
        self.pending.lock().take()
    }

    pub fn clear_pending(&self) {
        *self.pending.lock() = None;
    }

    // ----- cancellation -----

    pub fn control(&self) -> &Arc<ProcessControl> {
        &self.control
    }

    pub fn interrupted(&self) -> bool {
        self.control.interrupted()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Children and parents reference each other; print counts only.
        f.debug_struct("Scope")
            .field("vars", &self.vars.read().len())
            .field("fns", &self.fns.read().len())
            .field("ufns", &self.ufns.read().len())
            .field("namespaces", &self.namespaces.read().len())
            .field("is_namespace", &self.is_namespace)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup() {
        let scope = Scope::root();
        scope.define_var("x", Value::Int(42));
        assert!(matches!(scope.lookup_var("x"), Some(Value::Int(42))));
        assert!(scope.lookup_var("missing").is_none());
    }

    #[test]
    fn test_child_sees_parent_bindings() {
        let parent = Scope::root();
        parent.define_var("x", Value::Int(42));
        let child = parent.child();
        assert!(matches!(child.lookup_var("x"), Some(Value::Int(42))));
    }

    #[test]
    fn test_shadowing_returns_nearest_binding() {
        let parent = Scope::root();
        parent.define_var("x", Value::Int(1));
        let child = parent.child();
        child.define_var("x", Value::Int(2));
        assert!(matches!(child.lookup_var("x"), Some(Value::Int(2))));
        assert!(matches!(parent.lookup_var("x"), Some(Value::Int(1))));
    }

    #[test]
    fn test_assign_walks_to_owning_scope() {
        let parent = Scope::root();
        parent.define_var("x", Value::Int(1));
        let child = parent.child();
        assert!(child.assign_var("x", Value::Int(9)));
        assert!(matches!(parent.get_var_here("x"), Some(Value::Int(9))));
        assert!(!child.var_defined_here("x"));
        assert!(!child.assign_var("missing", Value::Nil));
    }

    #[test]
    fn test_namespace_scope_find_or_create() {
        let root = Scope::root();
        let ns = root.namespace_scope("web");
        ns.define_var("port", Value::Int(8080));
        let again = root.namespace_scope("web");
        assert!(matches!(again.get_var_here("port"), Some(Value::Int(8080))));
        assert!(again.is_namespace());
    }

    #[test]
    fn test_clone_flat_is_independent() {
        let root = Scope::root();
        root.define_var("x", Value::Int(1));
        let copy = root.clone_flat();
        copy.define_var("x", Value::Int(2));
        copy.define_var("y", Value::Int(3));
        assert!(matches!(root.get_var_here("x"), Some(Value::Int(1))));
        assert!(root.get_var_here("y").is_none());
    }

    #[test]
    fn test_pending_exception_slot_is_shared() {
        let root = Scope::root();
        let child = root.child();
        child.throw("kaput");
        assert_eq!(root.pending(), Some("kaput".to_string()));
        assert_eq!(root.take_pending(), Some("kaput".to_string()));
        assert_eq!(child.pending(), None);
    }

    #[test]
    fn test_process_control_stop_resume() {
        let control = ProcessControl::default();
        assert!(!control.interrupted());
        control.stop();
        assert!(control.interrupted());
        control.stop();
        assert!(control.interrupted());
        control.resume();
        assert!(!control.interrupted());
    }
}
