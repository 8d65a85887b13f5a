//! Permissive decoder for stringified mappings found in log messages
//!
//! The serving layer may emit its structured message either as JSON or as a
//! Python-style literal (`{'event': 'prediction', 'ok': True}`). This parser
//! accepts both and produces a [`serde_json::Value`]:
//!
//! - strings in single or double quotes, with the usual backslash escapes
//! - `True`/`False`/`None` and `true`/`false`/`null`
//! - integers, floats and exponents; `inf`/`nan` are rejected
//! - dicts, lists and tuples (tuples become arrays), trailing commas allowed
//! - non-string dict keys are converted to their textual form

use serde_json::{Map, Number, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("literal parse error at byte {position}: {message}")]
pub struct LiteralError {
    pub position: usize,
    pub message: String,
}

/// Parse a complete literal; trailing non-whitespace input is an error
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser::new(input);
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < parser.bytes.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// Parse a literal that must be a mapping
pub fn parse_mapping(input: &str) -> Result<Map<String, Value>, LiteralError> {
    match parse_literal(input)? {
        Value::Object(map) => Ok(map),
        _ => Err(LiteralError {
            position: 0,
            message: "literal is not a mapping".to_string(),
        }),
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

const MAX_DEPTH: usize = 64;

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), LiteralError> {
        self.skip_whitespace();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'{') => self.nested(|p| p.parse_dict()),
            Some(b'[') => self.nested(|p| p.parse_sequence(b'[', b']')),
            Some(b'(') => self.nested(|p| p.parse_sequence(b'(', b')')),
            Some(b'\'') | Some(b'"') => self.parse_string().map(Value::String),
            Some(b) if b == b'-' || b == b'+' || b == b'.' || b.is_ascii_digit() => {
                self.parse_number()
            }
            Some(b) if b.is_ascii_alphabetic() => self.parse_keyword(),
            Some(b) => Err(self.error(format!("unexpected character '{}'", b as char))),
        }
    }

    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<Value, LiteralError>,
    ) -> Result<Value, LiteralError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        let value = f(self);
        self.depth -= 1;
        value
    }

    fn parse_dict(&mut self) -> Result<Value, LiteralError> {
        self.expect(b'{')?;
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }

            let key = match self.parse_value()? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(true) => "True".to_string(),
                Value::Bool(false) => "False".to_string(),
                Value::Null => "None".to_string(),
                _ => return Err(self.error("unhashable mapping key")),
            };
            self.expect(b':')?;
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn parse_sequence(&mut self, open: u8, close: u8) -> Result<Value, LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.pos += 1;
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b) if b == close => {}
                _ => return Err(self.error(format!("expected ',' or '{}'", close as char))),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bytes[self.pos];
        self.pos += 1;
        let mut out = String::new();

        loop {
            let rest = &self.src[self.pos..];
            let mut chars = rest.chars();
            let c = chars.next().ok_or_else(|| self.error("unterminated string"))?;
            self.pos += c.len_utf8();

            match c {
                c if c as u32 == quote as u32 => return Ok(out),
                '\\' => out.push(self.parse_escape()?),
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char, LiteralError> {
        let c = self
            .src[self.pos..]
            .chars()
            .next()
            .ok_or_else(|| self.error("unterminated escape"))?;
        self.pos += c.len_utf8();

        let escaped = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            '/' => '/',
            'x' => self.parse_hex_escape(2)?,
            'u' => self.parse_hex_escape(4)?,
            'U' => self.parse_hex_escape(8)?,
            other => return Err(self.error(format!("unknown escape '\\{}'", other))),
        };
        Ok(escaped)
    }

    fn parse_hex_escape(&mut self, digits: usize) -> Result<char, LiteralError> {
        let end = self.pos + digits;
        let hex = self
            .src
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated hex escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid hex escape"))?;
        self.pos = end;

        // JSON-style surrogate pair, e.g. \ud83d\ude00
        if (0xD800..0xDC00).contains(&code) && self.src[self.pos..].starts_with("\\u") {
            let low_hex = self
                .src
                .get(self.pos + 2..self.pos + 6)
                .ok_or_else(|| self.error("truncated surrogate pair"))?;
            let low =
                u32::from_str_radix(low_hex, 16).map_err(|_| self.error("invalid hex escape"))?;
            if (0xDC00..0xE000).contains(&low) {
                self.pos += 6;
                let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                return char::from_u32(combined).ok_or_else(|| self.error("invalid code point"));
            }
        }

        char::from_u32(code).ok_or_else(|| self.error("invalid code point"))
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E' | b'_') {
                self.pos += 1;
            } else {
                break;
            }
        }

        let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        let text = text.strip_prefix('+').unwrap_or(&text);

        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Number(i.into()));
        }
        if let Ok(u) = text.parse::<u64>() {
            return Ok(Value::Number(u.into()));
        }
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| LiteralError {
                position: start,
                message: format!("invalid number '{}'", text),
            })
    }

    fn parse_keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }

        match &self.src[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            other => Err(LiteralError {
                position: start,
                message: format!("unsupported name '{}'", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_python_repr_dict() {
        let value = parse_literal(
            "{'event': 'prediction', 'features': {'State': 'CA', 'Account length': 10}, 'probability': 0.12, 'ok': True, 'note': None}",
        )
        .unwrap();

        assert_eq!(
            value,
            json!({
                "event": "prediction",
                "features": {"State": "CA", "Account length": 10},
                "probability": 0.12,
                "ok": true,
                "note": null
            })
        );
    }

    #[test]
    fn test_json_dict() {
        let value = parse_literal(r#"{"event": "prediction", "features": {"x": -1.5e2}}"#).unwrap();
        assert_eq!(value, json!({"event": "prediction", "features": {"x": -150.0}}));
    }

    #[test]
    fn test_quotes_and_escapes() {
        let value = parse_literal(r#"{'name': "O'Brien", 'path': 'a\\b', 'nl': 'x\ny', 'u': 'é'}"#)
            .unwrap();
        assert_eq!(value["name"], json!("O'Brien"));
        assert_eq!(value["path"], json!("a\\b"));
        assert_eq!(value["nl"], json!("x\ny"));
        assert_eq!(value["u"], json!("é"));
    }

    #[test]
    fn test_tuples_trailing_commas_and_numeric_keys() {
        let value = parse_literal("{1: (1, 2,), 'list': [3, 4,],}").unwrap();
        assert_eq!(value, json!({"1": [1, 2], "list": [3, 4]}));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_literal("not a dict").is_err());
        assert!(parse_literal("{'a': 1").is_err());
        assert!(parse_literal("{'a': 1} trailing").is_err());
        assert!(parse_literal("{'a': nan}").is_err());
        assert!(parse_literal("{'a': datetime(2024, 1, 1)}").is_err());
    }

    #[test]
    fn test_parse_mapping_requires_dict() {
        assert!(parse_mapping("[1, 2]").is_err());
        assert_eq!(parse_mapping("{}").unwrap().len(), 0);
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(MAX_DEPTH + 1) + &"]".repeat(MAX_DEPTH + 1);
        assert!(parse_literal(&deep).is_err());
    }
}
