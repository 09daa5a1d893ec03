// ABOUTME: Splits one parenthesised expression into its ordered flat list of
// surface tokens (atoms, string literals, arrays, sub-expressions, parameter
// lists), delimiters retained.

use crate::error::EvalError;
use crate::lexer::match_chars;

/// Character walker over the interior of one `(…)` expression.
struct Splitter<'a> {
    text: &'a str,
    tokens: Vec<String>,
    current: String,
    in_quotes: bool,
    in_bars: bool,
    i: usize,
}

/// Splits the text of exactly one sub-expression (it must begin with `(` and
/// end with the matching `)`) into its top-level surface tokens.
pub fn scan_tokens(text: &str) -> Result<Vec<String>, EvalError> {
    let text = text.trim();
    if text.len() < 2 {
        return Err(EvalError::syntax(format!(
            "expected at least (), got: {text}"
        )));
    }
    if !text.starts_with('(') {
        return Err(EvalError::syntax(format!(
            "expected '(' at the start of the expression, got: {}",
            &text[..1]
        )));
    }
    if !text.ends_with(')') {
        return Err(EvalError::syntax(format!(
            "expected ')' at the end of the expression: {text}"
        )));
    }

    let mut splitter = Splitter {
        text,
        tokens: Vec::new(),
        current: String::new(),
        in_quotes: false,
        in_bars: false,
        i: 1,
    };
    splitter.run()?;

    if splitter.in_quotes {
        return Err(EvalError::syntax("quote not closed correctly"));
    }
    if splitter.in_bars {
        return Err(EvalError::syntax("parameter list not closed correctly"));
    }
    Ok(splitter.tokens)
}

impl Splitter<'_> {
    fn run(&mut self) -> Result<(), EvalError> {
        while self.i < self.text.len() {
            let ch = self.text[self.i..]
                .chars()
                .next()
                .expect("index is on a char boundary");
            let step = ch.len_utf8();
            match ch {
                ' ' | '\n' | '\r' | '\t' => self.on_whitespace(ch),
                '|' => self.on_bar()?,
                '"' => self.on_quote()?,
                '[' => self.on_open_span(b'[', b']')?,
                '(' => self.on_open_span(b'(', b')')?,
                ')' => self.on_close_paren(ch)?,
                ']' => self.on_close_bracket(ch)?,
                _ => self.current.push(ch),
            }
            // Span handlers reposition the index themselves.
            if !matches!(ch, '[' | '(') || self.in_quotes {
                self.i += step;
            }
        }
        Ok(())
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.tokens.push(std::mem::take(&mut self.current));
        }
    }

    fn on_whitespace(&mut self, ch: char) {
        if self.in_quotes || self.in_bars {
            self.current.push(ch);
        } else {
            self.flush();
        }
    }

    fn on_bar(&mut self) -> Result<(), EvalError> {
        if self.in_bars {
            self.current.push('|');
            self.tokens.push(std::mem::take(&mut self.current));
            self.in_bars = false;
            return Ok(());
        }
        if self.in_quotes {
            self.current.push('|');
            return Ok(());
        }
        if !self.current.is_empty() {
            return Err(EvalError::syntax("parameter list not separated by a space"));
        }
        self.current.push('|');
        self.in_bars = true;
        Ok(())
    }

    fn on_quote(&mut self) -> Result<(), EvalError> {
        if self.in_bars {
            return Err(EvalError::syntax("'\"' not expected inside a parameter list"));
        }
        if !self.in_quotes {
            if !self.current.is_empty() {
                return Err(EvalError::syntax("string literal not separated by a space"));
            }
            self.current.push('"');
            self.in_quotes = true;
            return Ok(());
        }
        self.current.push('"');
        self.tokens.push(std::mem::take(&mut self.current));
        self.in_quotes = false;
        Ok(())
    }

    /// Captures a whole bracketed span (`[…]` or a nested `(…)`) as a single
    /// token and repositions the scan just past the separator check.
    fn on_open_span(&mut self, open: u8, close: u8) -> Result<(), EvalError> {
        let ch = open as char;
        if self.in_bars {
            return Err(EvalError::syntax(format!(
                "'{ch}' not expected inside a parameter list"
            )));
        }
        if self.in_quotes {
            self.current.push(ch);
            return Ok(());
        }
        // A spread marker may sit directly against its span: `...[1 2 3]`.
        if !self.current.is_empty() && self.current != "..." {
            return Err(EvalError::syntax(format!(
                "'{ch}' span not separated by a space"
            )));
        }
        let prefix = std::mem::take(&mut self.current);
        let end = match_chars(self.text, self.i, open, close).ok_or_else(|| {
            EvalError::syntax(format!(
                "'{ch}' not closed correctly: {}",
                &self.text[self.i..]
            ))
        })?;
        self.tokens
            .push(format!("{prefix}{}", &self.text[self.i..=end]));
        // The span must be followed by whitespace or the terminating `)`.
        match self.text.as_bytes().get(end + 1).copied() {
            Some(b' ' | b'\n' | b'\r' | b'\t' | b')') => {}
            Some(other) => {
                return Err(EvalError::syntax(format!(
                    "unexpected character after '{ch}' span: {}",
                    other as char
                )));
            }
            None => {
                return Err(EvalError::syntax(format!(
                    "expected ')' at the end of the expression: {}",
                    self.text
                )));
            }
        }
        self.i = end + 2;
        Ok(())
    }

    fn on_close_paren(&mut self, ch: char) -> Result<(), EvalError> {
        if self.in_bars {
            return Err(EvalError::syntax("')' not expected inside a parameter list"));
        }
        if self.in_quotes {
            self.current.push(ch);
            return Ok(());
        }
        if self.i != self.text.len() - 1 {
            return Err(EvalError::syntax(format!(
                "expected end of expression, got '{}' at offset {}",
                &self.text[self.i + 1..],
                self.i
            )));
        }
        self.flush();
        Ok(())
    }

    fn on_close_bracket(&mut self, ch: char) -> Result<(), EvalError> {
        if self.in_bars {
            return Err(EvalError::syntax("']' not expected inside a parameter list"));
        }
        if self.in_quotes {
            self.current.push(ch);
            return Ok(());
        }
        Err(EvalError::syntax(format!(
            "unexpected ']' at offset {}",
            self.i
        )))
    }
}
