// ABOUTME: Tests for fork-and-forget tasks and cooperative cancellation.

use serial_test::serial;
use std::sync::Arc;
use std::time::{Duration, Instant};
use vesper::{EvalError, Value, Vm};

fn setup() -> Arc<Vm> {
    Arc::new(Vm::with_builtins())
}

/// Polls an expression until it yields the wanted value or the deadline
/// passes. Forked tasks give no completion signal, by design.
fn wait_for_int(vm: &Vm, expr: &str, wanted: i64, deadline: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if let Ok(Value::Int(n)) = vm.eval(expr) {
            if n == wanted {
                return true;
            }
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
#[serial]
fn test_fork_runs_in_background_on_shared_environment() {
    let vm = setup();
    vm.eval("(var done 0)").unwrap();
    vm.eval("(fork (progn (sleep 20) (set done 1)))").unwrap();
    // Fork returns immediately, before the task finishes.
    assert!(matches!(vm.eval("done").unwrap(), Value::Int(0)));
    assert!(wait_for_int(&vm, "done", 1, Duration::from_secs(2)));
}

#[test]
#[serial]
fn test_fork_errors_are_dropped() {
    let vm = setup();
    vm.eval("(fork (no-such-function))").unwrap();
    // The failing task must not poison the main evaluation.
    std::thread::sleep(Duration::from_millis(20));
    assert!(matches!(vm.eval("(+ 1 1)").unwrap(), Value::Int(2)));
}

#[test]
#[serial]
fn test_stop_cancels_a_running_loop() {
    let vm = setup();
    let worker = {
        let vm = vm.clone();
        std::thread::spawn(move || vm.eval("(loop true (progn))"))
    };
    std::thread::sleep(Duration::from_millis(50));
    vm.stop();
    let outcome = worker.join().expect("worker thread must not panic");
    assert!(matches!(outcome, Err(EvalError::Cancelled)));

    // Cancellation is sticky until resume.
    assert!(matches!(vm.eval("(+ 1 1)"), Err(EvalError::Cancelled)));
    vm.resume();
    assert!(matches!(vm.eval("(+ 1 1)").unwrap(), Value::Int(2)));
}

#[test]
#[serial]
fn test_stop_cancels_a_forked_task_too() {
    let vm = setup();
    vm.eval("(var beats 0)").unwrap();
    vm.eval("(fork (loop true (progn (sleep 5) (set beats (+ beats 1)))))")
        .unwrap();
    // Give the task time to start beating.
    std::thread::sleep(Duration::from_millis(50));
    vm.stop();
    std::thread::sleep(Duration::from_millis(50));
    let frozen = match vm.eval("beats") {
        Err(EvalError::Cancelled) => {
            vm.resume();
            match vm.eval("beats").unwrap() {
                Value::Int(n) => n,
                other => panic!("unexpected {other}"),
            }
        }
        Ok(Value::Int(n)) => n,
        other => panic!("unexpected {other:?}"),
    };
    vm.resume();
    // The forked loop observed the flag and stopped mutating.
    std::thread::sleep(Duration::from_millis(50));
    match vm.eval("beats").unwrap() {
        Value::Int(n) => assert_eq!(n, frozen),
        other => panic!("unexpected {other}"),
    }
}

#[test]
#[serial]
fn test_forked_tasks_share_namespaces() {
    let vm = setup();
    vm.eval("(namespace shared (var hits 0))").unwrap();
    vm.eval("(fork (namespace shared (set hits (+ hits 1))))")
        .unwrap();
    assert!(wait_for_int(&vm, "shared.hits", 1, Duration::from_secs(2)));
}
