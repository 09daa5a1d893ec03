// ABOUTME: Character-level lexing: comment stripping, balanced-delimiter
// matching, surface-token classification and string escape processing.

use crate::error::EvalError;
use regex::Regex;
use std::sync::LazyLock;

static R_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").unwrap());
static R_FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?[0-9]*\.[0-9]+$").unwrap());
static R_IDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").unwrap());

/// Strips `;` comments from a source blob. Comments run to end of line; a
/// double quote toggles an in-string flag so quoted semicolons survive.
/// Strings are assumed not to span lines.
pub fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for line in src.split('\n') {
        let mut in_quotes = false;
        for ch in line.chars() {
            if ch == '"' {
                in_quotes = !in_quotes;
                out.push(ch);
                continue;
            }
            if ch == ';' && !in_quotes {
                break;
            }
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

/// Returns the byte offset of the closer matching the opener at `offset`,
/// counting nesting and ignoring anything inside a double-quoted span.
/// `None` when `offset` does not hold the opener or no closer exists.
pub fn match_chars(text: &str, offset: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    if offset >= bytes.len() || bytes[offset] != open {
        return None;
    }
    let mut count = 1;
    let mut in_quotes = false;
    for (i, &b) in bytes.iter().enumerate().skip(offset + 1) {
        if b == b'"' {
            in_quotes = !in_quotes;
        }
        if in_quotes {
            continue;
        }
        if b == open {
            count += 1;
        }
        if b == close {
            count -= 1;
            if count == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Integer grammar: optional sign, one or more decimal digits.
pub fn is_integer(token: &str) -> bool {
    R_INTEGER.is_match(token)
}

/// Float grammar: optional sign, optional digits, a decimal point, digits.
pub fn is_float(token: &str) -> bool {
    R_FLOAT.is_match(token)
}

/// A plain binding name: a letter followed by letters or digits. Namespace
/// (`.`) and struct-field (`:`) qualification is resolved at lookup time and
/// is not legal in a name being bound.
pub fn is_identifier(token: &str) -> bool {
    R_IDENT.is_match(token)
}

/// A spread / variadic marker: `...` followed by a name whose first
/// character is not another dot.
pub fn is_spread(token: &str) -> bool {
    token.len() > 3 && token.starts_with("...") && token.as_bytes()[3] != b'.'
}

/// Replaces escape sequences in the interior of a string literal.
/// An unknown escape or a trailing backslash is a syntax error.
pub fn unescape(raw: &str) -> Result<String, EvalError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('e') => out.push('\u{1b}'),
            Some('f') => out.push('\u{0c}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\u{0b}'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                return Err(EvalError::syntax(format!(
                    "unknown escape sequence '\\{other}' in \"{raw}\""
                )));
            }
            None => {
                return Err(EvalError::syntax(format!(
                    "dangling escape at end of \"{raw}\""
                )));
            }
        }
    }
    Ok(out)
}

/// Extracts the parameter names from a closure parameter-list token
/// (`|a b ...rest|` yields `["a", "b", "...rest"]`). Every name must be an
/// identifier; a variadic `...name` is legal only in final position.
pub fn closure_params(token: &str) -> Result<Vec<String>, EvalError> {
    let interior = token
        .strip_prefix('|')
        .and_then(|t| t.strip_suffix('|'))
        .ok_or_else(|| EvalError::syntax(format!("expected a parameter list, got: {token}")))?;
    let params: Vec<String> = interior.split_whitespace().map(str::to_string).collect();
    for (i, param) in params.iter().enumerate() {
        if is_spread(param) {
            if i != params.len() - 1 {
                return Err(EvalError::syntax(format!(
                    "variadic parameter '{param}' must be last in the parameter list"
                )));
            }
            if !is_identifier(&param[3..]) {
                return Err(EvalError::syntax(format!(
                    "bad parameter name in list: {param}"
                )));
            }
        } else if !is_identifier(param) {
            return Err(EvalError::syntax(format!(
                "bad parameter name in list: {param}"
            )));
        }
    }
    Ok(params)
}
