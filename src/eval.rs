// ABOUTME: The evaluator: token resolution, special-form dispatch, the
// function-call protocol and top-level chunk splitting.

use crate::env::Scope;
use crate::error::EvalError;
use crate::lexer::{
    closure_params, is_float, is_identifier, is_integer, is_spread, match_chars, strip_comments,
    unescape,
};
use crate::parser::scan_tokens;
use crate::value::{UserFn, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Evaluates one expression text against a scope.
///
/// Atoms resolve directly; a parenthesised expression is split into its
/// surface tokens and dispatched on the head token. While an exception is
/// pending, every parenthesised evaluation except `catch` returns the
/// unhandled-exception error; while the cancellation flag is set, every
/// evaluation returns the cancellation error.
pub fn eval(scope: &Arc<Scope>, text: &str) -> Result<Value, EvalError> {
    if scope.interrupted() {
        return Err(EvalError::Cancelled);
    }
    let text = text.trim();
    if text.is_empty() {
        return Err(EvalError::syntax("empty expression"));
    }
    if !text.starts_with('(') {
        return resolve(scope, text);
    }
    let tokens = scan_tokens(text)?;
    if tokens.is_empty() {
        return Err(EvalError::syntax("empty expression: ()"));
    }
    if let Some(message) = scope.pending() {
        if tokens[0] != "catch" {
            return Err(EvalError::UnhandledException(message));
        }
    }
    match tokens[0].as_str() {
        "var" => eval_var(scope, &tokens),
        "set" => eval_set(scope, &tokens),
        "fn" => eval_fn(scope, &tokens),
        "lambda" => eval_lambda(scope, &tokens),
        "return" => eval_return(scope, &tokens),
        "progn" => eval_progn(scope, &tokens),
        "loop" => eval_loop(scope, &tokens),
        "in" => eval_in(scope, &tokens),
        "if" => eval_if(scope, &tokens),
        "match" => eval_match(scope, &tokens),
        "eval" => eval_dynamic(scope, &tokens),
        "fork" => eval_fork(scope, &tokens),
        "delete" => eval_delete(scope, &tokens),
        "namespace" => eval_namespace(scope, &tokens),
        "struct" => eval_struct(scope, &tokens),
        "catch" => eval_catch(scope, &tokens),
        _ => eval_call(scope, &tokens),
    }
}

/// Resolves one surface token to a value.
pub fn resolve(scope: &Arc<Scope>, token: &str) -> Result<Value, EvalError> {
    if token.is_empty() {
        return Err(EvalError::syntax("invalid empty token"));
    }
    if token.starts_with('[') {
        let end = match_chars(token, 0, b'[', b']')
            .ok_or_else(|| EvalError::syntax(format!("'[' not closed correctly: {token}")))?;
        if end != token.len() - 1 {
            return Err(EvalError::syntax(format!(
                "unexpected text after array literal: {token}"
            )));
        }
        let element_tokens = scan_tokens(&format!("({})", &token[1..end]))?;
        let mut items = Vec::with_capacity(element_tokens.len());
        for element in &element_tokens {
            items.push(resolve(scope, element)?);
        }
        return Ok(Value::Array(items));
    }
    if token.starts_with('(') {
        return eval(scope, token);
    }
    if is_integer(token) {
        return token
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| EvalError::syntax(format!("bad integer literal '{token}': {e}")));
    }
    if is_float(token) {
        return token
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| EvalError::syntax(format!("bad float literal '{token}': {e}")));
    }
    if token.starts_with('"') {
        if token.len() < 2 || !token.ends_with('"') {
            return Err(EvalError::syntax(format!(
                "unterminated string literal: {token}"
            )));
        }
        return Ok(Value::Str(unescape(&token[1..token.len() - 1])?));
    }
    if token == "true" {
        return Ok(Value::Bool(true));
    }
    if token == "false" {
        return Ok(Value::Bool(false));
    }
    if token == "nil" {
        return Ok(Value::Nil);
    }
    lookup_symbol(scope, token)
}

/// Walks the scope chain for the nearest binding of `name`, applying the
/// per-level cascade (vars, struct-field chain, namespace qualification,
/// built-ins, user functions).
pub fn lookup_symbol(scope: &Arc<Scope>, name: &str) -> Result<Value, EvalError> {
    let mut current = Some(scope.clone());
    while let Some(s) = current {
        if let Some(value) = lookup_here(&s, name)? {
            return Ok(value);
        }
        current = s.parent();
    }
    Err(EvalError::UndefinedSymbol(name.to_string()))
}

/// One level of the lookup cascade. `Ok(None)` means "not at this level";
/// the caller continues along the parent chain.
fn lookup_here(scope: &Arc<Scope>, name: &str) -> Result<Option<Value>, EvalError> {
    if let Some(value) = scope.get_var_here(name) {
        return Ok(Some(value));
    }
    if name.contains(':') {
        if let Some(value) = resolve_field_chain(scope, name)? {
            return Ok(Some(value));
        }
    }
    if name.contains('.') {
        if let Some(value) = resolve_qualified(scope, name)? {
            return Ok(Some(value));
        }
    }
    if let Some(f) = scope.get_native_here(name) {
        return Ok(Some(Value::Native(f)));
    }
    if let Some(f) = scope.get_ufn_here(name) {
        return Ok(Some(Value::Fn(f)));
    }
    Ok(None)
}

/// `base:field:subfield` — resolves the head, then follows struct fields.
fn resolve_field_chain(scope: &Arc<Scope>, name: &str) -> Result<Option<Value>, EvalError> {
    let (head, rest) = name.split_once(':').expect("caller checked for ':'");
    let base = match scope.get_var_here(head) {
        Some(value) => Some(value),
        None if head.contains('.') => resolve_qualified(scope, head)?,
        None => None,
    };
    let Some(mut value) = base else {
        return Ok(None);
    };
    for field in rest.split(':') {
        if field.is_empty() {
            return Err(EvalError::syntax(format!("empty field name in '{name}'")));
        }
        match value {
            Value::Struct(fields) => {
                value = fields.get(field).cloned().ok_or_else(|| {
                    EvalError::runtime_error(name, format!("no field '{field}' in struct"))
                })?;
            }
            other => return Err(EvalError::type_error(name, "struct", &other, 1)),
        }
    }
    Ok(Some(value))
}

/// `ns.rest` — finds the namespace at this level and resolves the remainder
/// inside it without falling back to the namespace's own parents.
fn resolve_qualified(scope: &Arc<Scope>, name: &str) -> Result<Option<Value>, EvalError> {
    let (ns_name, rest) = name.split_once('.').expect("caller checked for '.'");
    if ns_name.is_empty() || rest.is_empty() {
        return Err(EvalError::syntax(format!("bad qualified name: {name}")));
    }
    match scope.get_namespace_here(ns_name) {
        Some(ns) => match lookup_here(&ns, rest)? {
            Some(value) => Ok(Some(value)),
            None => Err(EvalError::UndefinedSymbol(name.to_string())),
        },
        None => Ok(None),
    }
}

// ----- special forms -----

fn eval_var(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() != 3 {
        return Err(EvalError::arity_error("var", "2", tokens.len() - 1));
    }
    let name = &tokens[1];
    if !is_identifier(name) {
        return Err(EvalError::syntax(format!(
            "bad token in variable name: {name}"
        )));
    }
    match resolve(scope, &tokens[2])? {
        Value::Native(f) => {
            if scope.native_defined_here(name) {
                return Err(EvalError::AlreadyDefined(name.clone()));
            }
            scope.define_native(name, f);
        }
        Value::Fn(f) => {
            if scope.ufn_defined_here(name) {
                return Err(EvalError::AlreadyDefined(name.clone()));
            }
            scope.define_ufn(name, f);
        }
        value => {
            if scope.var_defined_here(name) {
                return Err(EvalError::AlreadyDefined(name.clone()));
            }
            scope.define_var(name, value);
        }
    }
    Ok(Value::Nil)
}

fn eval_set(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() != 3 {
        return Err(EvalError::arity_error("set", "2", tokens.len() - 1));
    }
    let name = &tokens[1];
    if !is_identifier(name) {
        return Err(EvalError::syntax(format!(
            "bad token in variable name: {name}"
        )));
    }
    // A callable value only updates an existing callable binding; it never
    // creates one.
    let updated = match resolve(scope, &tokens[2])? {
        Value::Native(f) => scope.assign_native(name, f),
        Value::Fn(f) => scope.assign_ufn(name, f),
        value => scope.assign_var(name, value),
    };
    if updated {
        Ok(Value::Nil)
    } else {
        Err(EvalError::UndefinedSymbol(name.clone()))
    }
}

fn eval_fn(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() != 4 {
        return Err(EvalError::arity_error("fn", "3", tokens.len() - 1));
    }
    let name = &tokens[1];
    if !is_identifier(name) {
        return Err(EvalError::syntax(format!("bad function name: {name}")));
    }
    if scope.native_defined_here(name) {
        tracing::warn!(name = %name, "function shadows a built-in function");
    }
    if scope.ufn_defined_here(name) {
        tracing::warn!(name = %name, "function shadows an earlier definition");
    }
    let params = closure_params(&tokens[2])?;
    scope.define_ufn(
        name,
        UserFn {
            params,
            body: tokens[3].clone(),
            env: scope.clone(),
        },
    );
    Ok(Value::Nil)
}

fn eval_lambda(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() != 3 {
        return Err(EvalError::arity_error("lambda", "2", tokens.len() - 1));
    }
    let params = closure_params(&tokens[1])?;
    Ok(Value::Fn(UserFn {
        params,
        body: tokens[2].clone(),
        env: scope.clone(),
    }))
}

fn eval_return(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() != 2 {
        return Err(EvalError::arity_error("return", "1", tokens.len() - 1));
    }
    resolve(scope, &tokens[1])
}

fn eval_progn(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    let mut last = Value::Nil;
    for expr in &tokens[1..] {
        last = eval(scope, expr)?;
    }
    Ok(last)
}

fn eval_loop(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() != 3 {
        return Err(EvalError::arity_error("loop", "2", tokens.len() - 1));
    }
    let (condition, body) = (&tokens[1], &tokens[2]);
    loop {
        if scope.interrupted() {
            return Err(EvalError::Cancelled);
        }
        let proceed = match resolve(scope, condition)? {
            Value::Bool(b) => b,
            other => return Err(EvalError::type_error("loop", "bool", &other, 1)),
        };
        if !proceed {
            return Ok(Value::Nil);
        }
        eval(scope, body)?;
    }
}

fn eval_in(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() != 4 {
        return Err(EvalError::arity_error("in", "3", tokens.len() - 1));
    }
    let name = &tokens[2];
    if !is_identifier(name) {
        return Err(EvalError::syntax(format!(
            "bad token in iteration variable name: {name}"
        )));
    }
    let collection = resolve(scope, &tokens[1])?;
    // The binding shadows any existing one for the duration of the loop.
    let saved = scope.get_var_here(name);
    let outcome = run_in(scope, collection, name, &tokens[3]);
    match saved {
        Some(previous) => scope.define_var(name, previous),
        None => {
            scope.delete_var(name);
        }
    }
    outcome.map(|()| Value::Nil)
}

fn run_in(
    scope: &Arc<Scope>,
    collection: Value,
    name: &str,
    body: &str,
) -> Result<(), EvalError> {
    match collection {
        Value::Str(s) => {
            for ch in s.chars() {
                scope.define_var(name, Value::Str(ch.to_string()));
                eval(scope, body)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for item in items {
                scope.define_var(name, item);
                eval(scope, body)?;
            }
            Ok(())
        }
        Value::Map(map) => {
            for key in map.keys() {
                scope.define_var(name, key.to_value());
                eval(scope, body)?;
            }
            Ok(())
        }
        other => Err(EvalError::type_error("in", "string, array or map", &other, 1)),
    }
}

fn eval_if(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() < 3 || tokens.len() > 4 {
        return Err(EvalError::arity_error("if", "2-3", tokens.len() - 1));
    }
    let condition = match resolve(scope, &tokens[1])? {
        Value::Bool(b) => b,
        other => return Err(EvalError::type_error("if", "bool", &other, 1)),
    };
    if condition {
        eval(scope, &tokens[2])
    } else if tokens.len() == 4 {
        eval(scope, &tokens[3])
    } else {
        Ok(Value::Nil)
    }
}

fn eval_match(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() < 4 || tokens.len() % 2 != 0 {
        return Err(EvalError::syntax(
            "match: expected a subject and case/result pairs",
        ));
    }
    let subject = resolve(scope, &tokens[1])?;
    let pairs: Vec<_> = tokens[2..].chunks(2).collect();
    for (index, pair) in pairs.iter().enumerate() {
        let (case_token, result_token) = (&pair[0], &pair[1]);
        if case_token == "_" {
            if index != pairs.len() - 1 {
                return Err(EvalError::syntax("match: '_' case must be last"));
            }
            return eval(scope, result_token);
        }
        let case = resolve(scope, case_token)?;
        if subject.try_eq(&case)? {
            return eval(scope, result_token);
        }
    }
    Ok(Value::Nil)
}

fn eval_dynamic(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() != 2 {
        return Err(EvalError::arity_error("eval", "1", tokens.len() - 1));
    }
    let source = match resolve(scope, &tokens[1])? {
        Value::Str(s) => s,
        other => return Err(EvalError::type_error("eval", "string", &other, 1)),
    };
    // A source with no expression in it is a single serialised atom; this
    // keeps (eval (to-string E)) an identity for literal-valued E.
    let trimmed = source.trim();
    if !trimmed.starts_with('(') {
        return eval(scope, trimmed);
    }
    let mut last = Value::Nil;
    for chunk in split_chunks(&source)? {
        last = eval(scope, &chunk)?;
    }
    Ok(last)
}

fn eval_fork(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() != 2 {
        return Err(EvalError::arity_error("fork", "1", tokens.len() - 1));
    }
    let task_scope = scope.clone();
    let expr = tokens[1].clone();
    // Fire-and-forget: the task shares the environment, errors are dropped.
    std::thread::spawn(move || {
        if let Err(err) = eval(&task_scope, &expr) {
            tracing::debug!(error = %err, "fork: evaluation error dropped");
        }
    });
    Ok(Value::Nil)
}

fn eval_delete(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() < 2 {
        return Err(EvalError::arity_error("delete", "at least 1", 0));
    }
    for name in &tokens[1..] {
        if !scope.delete_var(name) {
            return Err(EvalError::UndefinedSymbol(name.clone()));
        }
    }
    Ok(Value::Bool(true))
}

fn eval_namespace(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() < 3 {
        return Err(EvalError::arity_error("namespace", "at least 2", tokens.len() - 1));
    }
    let path = &tokens[1];
    let mut ns = scope.clone();
    for segment in path.split('.') {
        if !is_identifier(segment) {
            return Err(EvalError::syntax(format!("bad namespace name: {path}")));
        }
        ns = ns.namespace_scope(segment);
    }
    let mut last = Value::Nil;
    for expr in &tokens[2..] {
        last = eval(&ns, expr)?;
    }
    Ok(last)
}

fn eval_struct(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() < 3 || tokens.len() % 2 == 0 {
        return Err(EvalError::syntax("struct: expected field name/value pairs"));
    }
    let mut fields = HashMap::new();
    for pair in tokens[1..].chunks(2) {
        let key = &pair[0];
        if !is_identifier(key) {
            return Err(EvalError::syntax(format!("struct: bad field name: {key}")));
        }
        fields.insert(key.clone(), resolve(scope, &pair[1])?);
    }
    Ok(Value::Struct(fields))
}

/// `catch` is both the handler for an exception raised by an earlier
/// expression and a protected region around its own body. Either way the
/// body is evaluated exactly once: the protected attempt runs in a scratch
/// copy of the scope taken before evaluation, so a throw discards its
/// partial bindings instead of being replayed.
fn eval_catch(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    if tokens.len() != 3 {
        return Err(EvalError::arity_error("catch", "2", tokens.len() - 1));
    }
    let name = &tokens[1];
    if !is_identifier(name) {
        return Err(EvalError::syntax(format!(
            "bad token in exception variable name: {name}"
        )));
    }
    let body = &tokens[2];
    if let Some(message) = scope.take_pending() {
        return run_handler(scope, name, body, message);
    }
    let attempt = scope.clone_flat();
    let outcome = eval(&attempt, body);
    match scope.take_pending() {
        None => {
            // Clean run: keep what the body defined.
            scope.adopt(&attempt);
            outcome?;
            Ok(Value::Nil)
        }
        Some(_) => {
            // The exception is absorbed and the attempt's bindings are
            // dropped. A body cut short by the pending gate yields nil.
            match outcome {
                Ok(value) => Ok(value),
                Err(EvalError::UnhandledException(_)) => Ok(Value::Nil),
                Err(other) => Err(other),
            }
        }
    }
}

fn run_handler(
    scope: &Arc<Scope>,
    name: &str,
    body: &str,
    message: String,
) -> Result<Value, EvalError> {
    let handler = scope.clone_flat();
    handler.define_var(name, Value::Str(message));
    let value = eval(&handler, body);
    // A re-throw inside the handler must not wedge the VM.
    handler.clear_pending();
    value
}

// ----- general function call -----

fn eval_call(scope: &Arc<Scope>, tokens: &[String]) -> Result<Value, EvalError> {
    let op = &tokens[0];
    let callee = match lookup_symbol(scope, op) {
        Ok(value) => value,
        Err(EvalError::UndefinedSymbol(_)) => {
            return Err(EvalError::FunctionNotFound(op.clone()));
        }
        Err(other) => return Err(other),
    };
    let mut args = Vec::with_capacity(tokens.len() - 1);
    for token in &tokens[1..] {
        if is_spread(token) {
            match resolve(scope, &token[3..])? {
                Value::Array(items) => args.extend(items),
                single => args.push(single),
            }
            continue;
        }
        args.push(resolve(scope, token)?);
    }
    match callee {
        Value::Native(f) => Ok(f(scope, &args)),
        Value::Fn(func) => call_user_fn(&func, args, op),
        other => Err(EvalError::type_error(op, "func", &other, 0)),
    }
}

/// Invokes a user function with already-resolved arguments: arity check,
/// fresh call scope parented on the capture, callable arguments bound as
/// callables, variadic tail collected into an array.
pub fn call_user_fn(func: &UserFn, args: Vec<Value>, fn_name: &str) -> Result<Value, EvalError> {
    let n = func.params.len();
    let variadic = func.is_variadic();
    let fixed = if variadic { n - 1 } else { n };
    if (!variadic && args.len() != n) || (variadic && args.len() < fixed) {
        let expected = if variadic {
            format!("at least {fixed}")
        } else {
            n.to_string()
        };
        return Err(EvalError::arity_error(fn_name, expected, args.len()));
    }
    let call_scope = func.env.child();
    for (param, arg) in func.params.iter().take(fixed).zip(args.iter()) {
        match arg {
            Value::Native(f) => call_scope.define_native(param, *f),
            Value::Fn(f) => call_scope.define_ufn(param, f.clone()),
            value => call_scope.define_var(param, value.clone()),
        }
    }
    if variadic {
        let tail = &func.params[n - 1][3..];
        call_scope.define_var(tail, Value::Array(args[fixed..].to_vec()));
    }
    eval(&call_scope, &func.body)
}

// ----- chunk splitting -----

/// Splits a source blob into its top-level expressions. Comments are
/// stripped first; between expressions only whitespace is permitted.
pub fn split_chunks(src: &str) -> Result<Vec<String>, EvalError> {
    let text = strip_comments(src);
    let bytes = text.as_bytes();
    let mut chunks = Vec::new();
    let mut line = 1usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                let end = match_chars(&text, i, b'(', b')').ok_or_else(|| {
                    EvalError::syntax(format!(
                        "expression not closed correctly near line {line}"
                    ))
                })?;
                chunks.push(text[i..=end].to_string());
                line += text[i..=end].matches('\n').count();
                i = end + 1;
            }
            b' ' | b'\t' => i += 1,
            b'\n' | b'\r' => {
                if bytes[i] == b'\n' {
                    line += 1;
                }
                i += 1;
            }
            _ => {
                let ch = text[i..].chars().next().expect("on a char boundary");
                return Err(EvalError::syntax(format!(
                    "unexpected character at line {line}: {ch}"
                )));
            }
        }
    }
    Ok(chunks)
}
