//! Template expressions and `{{ }}` interpolation.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! cond ? a : b    a || b    a && b    a == b / a != b    !a
//! user.name   items.length   items.0   'text'   42   true   null   ( ... )
//! ```
//!
//! Unknown paths evaluate to `null`. Malformed expressions evaluate to
//! `null` as well; they never fail a render.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Path(String),
    Str(String),
    Num(f64),
    Not,
    Eq,
    Ne,
    And,
    Or,
    Question,
    Colon,
    LParen,
    RParen,
}

/// Evaluate an expression against a scope object.
pub fn evaluate(expr: &str, scope: &Value) -> Value {
    let Some(tokens) = tokenize(expr) else {
        log::debug!("Unparseable template expression: {expr}");
        return Value::Null;
    };
    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
        scope,
    };
    match parser.ternary() {
        Some(value) if parser.pos == tokens.len() => value,
        _ => {
            log::debug!("Unparseable template expression: {expr}");
            Value::Null
        }
    }
}

/// JavaScript-style truthiness.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Text form of a value: strings as-is, `null` as empty.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Resolve a dot path. Arrays accept numeric indices; arrays and strings
/// expose `length`.
pub fn lookup(scope: &Value, path: &str) -> Value {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    let last = segments.len() - 1;
    let mut current = scope;
    for (i, seg) in segments.iter().enumerate() {
        match current {
            Value::Object(map) => match map.get(*seg) {
                Some(v) => current = v,
                None => return Value::Null,
            },
            Value::Array(items) if *seg == "length" && i == last => {
                return Value::from(items.len());
            }
            Value::Array(items) => match seg.parse::<usize>().ok().and_then(|n| items.get(n)) {
                Some(v) => current = v,
                None => return Value::Null,
            },
            Value::String(s) if *seg == "length" && i == last => {
                return Value::from(s.chars().count());
            }
            _ => return Value::Null,
        }
    }
    current.clone()
}

/// Escape HTML special characters in text content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Replace `{{ expr }}` (escaped) and `{{{ expr }}}` (raw) in `template`.
pub fn interpolate(template: &str, scope: &Value) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);

        if rest[start..].starts_with("{{{") {
            let after_open = &rest[start + 3..];
            if let Some(end) = after_open.find("}}}") {
                result.push_str(&to_text(&evaluate(&after_open[..end], scope)));
                rest = &after_open[end + 3..];
            } else {
                result.push_str("{{{");
                rest = after_open;
            }
        } else {
            let after_open = &rest[start + 2..];
            if let Some(end) = after_open.find("}}") {
                let value = evaluate(&after_open[..end], scope);
                result.push_str(&escape_html(&to_text(&value)));
                rest = &after_open[end + 2..];
            } else {
                result.push_str("{{");
                rest = after_open;
            }
        }
    }
    result.push_str(rest);
    result
}

fn tokenize(expr: &str) -> Option<Vec<Token>> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            _ if c.is_whitespace() => i += 1,
            '\'' | '"' => {
                let close = chars[i + 1..].iter().position(|&ch| ch == c)? + i + 1;
                tokens.push(Token::Str(chars[i + 1..close].iter().collect()));
                i = close + 1;
            }
            '!' | '=' => {
                let eq_run = chars[i + 1..].iter().take_while(|&&ch| ch == '=').count();
                match (c, eq_run) {
                    ('!', 0) => tokens.push(Token::Not),
                    ('!', 1 | 2) => tokens.push(Token::Ne),
                    ('=', 1 | 2) => tokens.push(Token::Eq),
                    _ => return None,
                }
                i += 1 + eq_run;
            }
            '&' | '|' => {
                if chars.get(i + 1) != Some(&c) {
                    return None;
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
                i += 2;
            }
            '?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            _ if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(char::is_ascii_digit)) => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|ch| !(ch.is_ascii_digit() || *ch == '.'))
                    .map(|p| p + i + 1)
                    .unwrap_or(chars.len());
                let text: String = chars[i..end].iter().collect();
                tokens.push(Token::Num(text.parse().ok()?));
                i = end;
            }
            _ if c.is_alphabetic() || c == '_' || c == '$' => {
                let end = chars[i..]
                    .iter()
                    .position(|ch| !(ch.is_alphanumeric() || matches!(ch, '_' | '$' | '.')))
                    .map(|p| p + i)
                    .unwrap_or(chars.len());
                tokens.push(Token::Path(chars[i..end].iter().collect()));
                i = end;
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    scope: &'a Value,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ternary(&mut self) -> Option<Value> {
        let cond = self.or()?;
        if !self.eat(&Token::Question) {
            return Some(cond);
        }
        let then = self.ternary()?;
        if !self.eat(&Token::Colon) {
            return None;
        }
        let otherwise = self.ternary()?;
        Some(if truthy(&cond) { then } else { otherwise })
    }

    fn or(&mut self) -> Option<Value> {
        let mut left = self.and()?;
        while self.eat(&Token::Or) {
            let right = self.and()?;
            if !truthy(&left) {
                left = right;
            }
        }
        Some(left)
    }

    fn and(&mut self) -> Option<Value> {
        let mut left = self.equality()?;
        while self.eat(&Token::And) {
            let right = self.equality()?;
            if truthy(&left) {
                left = right;
            }
        }
        Some(left)
    }

    fn equality(&mut self) -> Option<Value> {
        let mut left = self.unary()?;
        loop {
            if self.eat(&Token::Eq) {
                let right = self.unary()?;
                left = Value::Bool(loose_eq(&left, &right));
            } else if self.eat(&Token::Ne) {
                let right = self.unary()?;
                left = Value::Bool(!loose_eq(&left, &right));
            } else {
                return Some(left);
            }
        }
    }

    fn unary(&mut self) -> Option<Value> {
        if self.eat(&Token::Not) {
            let value = self.unary()?;
            return Some(Value::Bool(!truthy(&value)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<Value> {
        let token = self.peek()?.clone();
        self.pos += 1;
        match token {
            Token::Str(s) => Some(Value::String(s)),
            Token::Num(n) => Some(number(n)),
            Token::Path(p) => Some(match p.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" | "undefined" => Value::Null,
                _ => lookup(self.scope, &p),
            }),
            Token::LParen => {
                let inner = self.ternary()?;
                self.eat(&Token::RParen).then_some(inner)
            }
            _ => None,
        }
    }
}

fn number(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s.trim().parse::<f64>().ok() == n.as_f64()
        }
        _ => a == b,
    }
}
