//! HTTP client operations: `http-get`, `http-post`
//!
//! Blocking requests; the response body comes back as a string. Transport
//! and non-2xx failures throw. Handles are not shared, so forked tasks may
//! call these concurrently.

use crate::env::Scope;
use crate::value::Value;
use std::sync::Arc;

/// `(http-get url)` — fetches a URL and returns the body text.
pub fn builtin_http_get(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let [Value::Str(url)] = args else {
        scope.throw("http-get : requires 1 string argument (url)");
        return Value::Nil;
    };
    match ureq::get(url).call() {
        Ok(response) => match response.into_string() {
            Ok(body) => Value::Str(body),
            Err(err) => {
                scope.throw(format!("http-get : failed reading body : {err}"));
                Value::Nil
            }
        },
        Err(err) => {
            scope.throw(format!("http-get : {err}"));
            Value::Nil
        }
    }
}

/// `(http-post url body)` or `(http-post url body content-type)`.
pub fn builtin_http_post(scope: &Arc<Scope>, args: &[Value]) -> Value {
    let (url, body, content_type) = match args {
        [Value::Str(url), Value::Str(body)] => (url, body, "text/plain"),
        [Value::Str(url), Value::Str(body), Value::Str(ct)] => (url, body, ct.as_str()),
        _ => {
            scope.throw("http-post : requires (url, body) or (url, body, content-type) strings");
            return Value::Nil;
        }
    };
    let request = ureq::post(url).set("Content-Type", content_type);
    match request.send_string(body) {
        Ok(response) => match response.into_string() {
            Ok(text) => Value::Str(text),
            Err(err) => {
                scope.throw(format!("http-post : failed reading body : {err}"));
                Value::Nil
            }
        },
        Err(err) => {
            scope.throw(format!("http-post : {err}"));
            Value::Nil
        }
    }
}

/// Register all network builtins in the scope
pub fn register(scope: &Arc<Scope>) {
    scope.define_native("http-get", builtin_http_get);
    scope.define_native("http-post", builtin_http_post);
}
