//! # Built-in Function Packages
//!
//! Host-provided routines registered into a root scope, organized by
//! category. Every routine follows the same contract: it receives the
//! calling scope and the already-resolved argument list, reports
//! recoverable failures by [`Scope::throw`] + `nil` (or an error value on
//! the data channel), and the evaluator knows nothing about any of them.
//!
//! ## Categories
//!
//! - **[arithmetic]**: `+`, `-`, `*`, `/`, `%`, `reciprocal`
//! - **[comparison]**: `==`, `!=`, `<`, `>`, `<=`, `>=`
//! - **[logic]**: `and`, `or`, `not`
//! - **[console]**: `print`, `println`, `sprintf`
//! - **[types]**: `type`, `to-string`, `to-int`, `to-float`, `is-nil`
//! - **[arrays]**: `len`, `car`, `cdr`, `array-index`, `array-set`,
//!   `array-append`, `array-subarray`
//! - **[maps]**: `map-new`, `map-store`, `map-get`, `map-delete`, `map-keys`
//! - **[strings]**: `string-split`, `string-replace`, `string-contains`,
//!   `string-indexof`, `string-trimspace`, `string-uppercase`,
//!   `string-lowercase`, `string-repeat`, `string-fromarray`
//! - **[errors]**: `throw`, `error`, `error?`, `error-msg`
//! - **[time]**: `sleep`
//! - **[json]**: `json-parse`, `json-string`
//! - **[network]**: `http-get`, `http-post`
//! - **[filesystem]**: `read-file`, `write-file`, `file-exists?`

use crate::env::Scope;
use std::sync::Arc;

pub mod arithmetic;
pub mod arrays;
pub mod comparison;
pub mod console;
pub mod errors;
pub mod filesystem;
pub mod json;
pub mod logic;
pub mod maps;
pub mod network;
pub mod strings;
pub mod time;
pub mod types;

/// Registers every built-in package into the given scope.
pub fn register_all(scope: &Arc<Scope>) {
    arithmetic::register(scope);
    comparison::register(scope);
    logic::register(scope);
    console::register(scope);
    types::register(scope);
    arrays::register(scope);
    maps::register(scope);
    strings::register(scope);
    errors::register(scope);
    time::register(scope);
    json::register(scope);
    network::register(scope);
    filesystem::register(scope);
}
