//! Parser for Python-style value literals, the syntax [`Value`] displays in.
//!
//! Supported: `None`, `True`, `False`, integers (`7`, `7L`), floats
//! (`1.5`, `1e-3`, `inf`, `nan`), complex numbers (`2j`, `1+2j`), strings
//! and bytes in single or double quotes, lists, tuples, dicts, sets and
//! `set()`.

use std::collections::{BTreeMap, BTreeSet};

use num_complex::Complex64;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid literal at offset {offset}: {message}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

/// Parse one literal. Surrounding whitespace is ignored.
pub fn parse(src: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser { src, pos: 0 };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos != src.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(value)
}

enum Number {
    Int(Value),
    Float(f64),
    Imag(f64),
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), LiteralError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected {c:?}")))
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => {
                self.bump();
                Ok(Value::List(self.items(']')?))
            }
            Some('(') => self.paren(),
            Some('{') => self.brace(),
            Some('\'' | '"') => Ok(Value::Str(self.string()?)),
            Some('b') if self.rest()[1..].starts_with(['\'', '"']) => {
                self.bump();
                Ok(Value::Bytes(self.bytes()?))
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => self.number_value(),
            Some(c) if c.is_alphabetic() || c == '_' => self.word(),
            Some(c) => Err(self.error(format!("unexpected {c:?}"))),
        }
    }

    /// Comma-separated values up to `close`; a trailing comma is allowed.
    fn items(&mut self, close: char) -> Result<Vec<Value>, LiteralError> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            if !self.eat(',') {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }

    fn paren(&mut self) -> Result<Value, LiteralError> {
        self.bump();
        if self.eat(')') {
            return Ok(Value::Tuple(Vec::new()));
        }
        let first = self.value()?;
        if self.eat(')') {
            return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        items.extend(self.items(')')?);
        Ok(Value::Tuple(items))
    }

    fn brace(&mut self) -> Result<Value, LiteralError> {
        self.bump();
        if self.eat('}') {
            return Ok(Value::Dict(BTreeMap::new()));
        }
        let first = self.value()?;
        if !self.eat(':') {
            let mut set = BTreeSet::from([first]);
            if self.eat(',') {
                set.extend(self.items('}')?);
            } else {
                self.expect('}')?;
            }
            return Ok(Value::Set(set));
        }
        let mut map = BTreeMap::new();
        map.insert(first, self.value()?);
        loop {
            if !self.eat(',') {
                self.expect('}')?;
                break;
            }
            if self.eat('}') {
                break;
            }
            let key = self.value()?;
            self.expect(':')?;
            map.insert(key, self.value()?);
        }
        Ok(Value::Dict(map))
    }

    fn word(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        let word = &self.src[start..self.pos];
        match word {
            "None" => Ok(Value::None),
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "inf" | "nan" => {
                self.pos = start;
                self.number_value()
            }
            "set" => {
                self.expect('(')?;
                self.expect(')')?;
                Ok(Value::Set(BTreeSet::new()))
            }
            "frozenset" => Err(self.error("frozenset literals are not supported")),
            other => Err(self.error(format!("unknown name {other:?}"))),
        }
    }

    fn number_value(&mut self) -> Result<Value, LiteralError> {
        let first = self.number()?;
        let real = match &first {
            Number::Imag(im) => return Ok(Value::Complex(Complex64::new(0.0, *im))),
            Number::Float(v) => *v,
            Number::Int(v) => as_f64(v),
        };
        // `1+2j`: a real part followed by a signed imaginary part.
        let save = self.pos;
        self.skip_ws();
        if matches!(self.peek(), Some('+' | '-')) {
            if let Ok(Number::Imag(im)) = self.number() {
                return Ok(Value::Complex(Complex64::new(real, im)));
            }
        }
        self.pos = save;
        Ok(match first {
            Number::Int(v) => v,
            Number::Float(v) | Number::Imag(v) => Value::Float(v),
        })
    }

    fn number(&mut self) -> Result<Number, LiteralError> {
        let start = self.pos;
        let mut negative = false;
        if let Some(sign @ ('+' | '-')) = self.peek() {
            negative = sign == '-';
            self.bump();
            self.skip_ws();
        }
        let body_start = self.pos;
        let mut is_float = false;
        if self.rest().starts_with("inf") || self.rest().starts_with("nan") {
            self.pos += 3;
            is_float = true;
        } else {
            while let Some(c) = self.peek() {
                match c {
                    '0'..='9' | '_' => {}
                    '.' => is_float = true,
                    'e' | 'E' => {
                        is_float = true;
                        self.bump();
                        if matches!(self.peek(), Some('+' | '-')) {
                            self.bump();
                        }
                        continue;
                    }
                    _ => break,
                }
                self.bump();
            }
        }
        let body: String = self.src[body_start..self.pos].chars().filter(|&c| c != '_').collect();
        if body.is_empty() || body == "." {
            self.pos = start;
            return Err(self.error("expected a number"));
        }
        let signed = if negative { format!("-{body}") } else { body };
        let bad = |p: &Parser<'_>| p.error(format!("malformed number {signed:?}"));
        match self.peek() {
            Some('j' | 'J') => {
                self.bump();
                signed.parse().map(Number::Imag).map_err(|_| bad(self))
            }
            Some('l' | 'L') if !is_float => {
                self.bump();
                signed.parse().map(|v| Number::Int(Value::Long(v))).map_err(|_| bad(self))
            }
            _ if is_float => signed.parse().map(Number::Float).map_err(|_| bad(self)),
            _ => match signed.parse::<i64>() {
                Ok(v) => Ok(Number::Int(Value::Int(v))),
                Err(_) => signed
                    .parse()
                    .map(|v| Number::Int(Value::Long(v)))
                    .map_err(|_| bad(self)),
            },
        }
    }

    fn escape(&mut self) -> Result<u32, LiteralError> {
        let c = self.bump().ok_or_else(|| self.error("unterminated escape"))?;
        Ok(match c {
            'n' => '\n' as u32,
            't' => '\t' as u32,
            'r' => '\r' as u32,
            '0' => 0,
            'x' => self.hex(2)?,
            'u' => self.hex(4)?,
            other => other as u32,
        })
    }

    fn hex(&mut self, digits: usize) -> Result<u32, LiteralError> {
        let text = self.rest().get(..digits).ok_or_else(|| self.error("short hex escape"))?;
        let code = u32::from_str_radix(text, 16).map_err(|_| self.error("bad hex escape"))?;
        self.pos += digits;
        Ok(code)
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or_else(|| self.error("expected a quote"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let code = self.escape()?;
                    out.push(char::from_u32(code).ok_or_else(|| self.error("bad escape"))?);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn bytes(&mut self) -> Result<Vec<u8>, LiteralError> {
        let quote = self.bump().ok_or_else(|| self.error("expected a quote"))?;
        let mut out = Vec::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated bytes")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => {
                    let code = self.escape()?;
                    let byte = u8::try_from(code)
                        .map_err(|_| self.error("escape out of byte range"))?;

                    out.push(byte);
                }
                Some(c) if c.is_ascii() => out.push(c as u8),
                Some(c) => return Err(self.error(format!("non-ASCII {c:?} in bytes"))),
            }
        }
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(i) => *i as f64,
        Value::Long(l) => *l as f64,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(src: &str) -> Value {
        parse(src).unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(p("None"), Value::None);
        assert_eq!(p(" True "), Value::Bool(true));
        assert_eq!(p("-42"), Value::Int(-42));
        assert_eq!(p("99999999999999999999"), Value::Long(99999999999999999999));
        assert_eq!(p("5L"), Value::Long(5));
        assert_eq!(p("1.5e3"), Value::Float(1500.0));
        assert_eq!(p("-inf"), Value::Float(f64::NEG_INFINITY));
        assert_eq!(p("2j"), Value::Complex(Complex64::new(0.0, 2.0)));
        assert_eq!(p("(1-2.5j)"), Value::Complex(Complex64::new(1.0, -2.5)));
        assert_eq!(p("1 + 2j"), Value::Complex(Complex64::new(1.0, 2.0)));
    }

    #[test]
    fn text() {
        assert_eq!(p(r#"'it\'s'"#), Value::from("it's"));
        assert_eq!(p(r#""tab\tx""#), Value::from("tab\tx"));
        assert_eq!(p(r"b'\x00a'"), Value::Bytes(vec![0, b'a']));
    }

    #[test]
    fn containers() {
        assert_eq!(p("[]"), Value::List(vec![]));
        assert_eq!(p("(1,)"), Value::Tuple(vec![Value::Int(1)]));
        assert_eq!(p("()"), Value::Tuple(vec![]));
        assert_eq!(p("[1, 'a', None,]"), Value::List(vec![Value::Int(1), "a".into(), Value::None]));
        assert_eq!(p("{1, 2, 2}"), Value::Set([Value::Int(1), Value::Int(2)].into()));
        assert_eq!(p("set()"), Value::Set(BTreeSet::new()));
        let mut map = BTreeMap::new();
        map.insert(Value::from("a"), Value::List(vec![Value::Float(1.0)]));
        map.insert(Value::Int(2), Value::Tuple(vec![]));
        assert_eq!(p("{'a': [1.0], 2: ()}"), Value::Dict(map));
        assert_eq!(p("{}"), Value::Dict(BTreeMap::new()));
    }

    #[test]
    fn display_parses_back() {
        let sources = [
            "[1, 2.5, 'x', None, True]",
            "{'k': (1, 2)}",
            "{1, 3}",
            "(1+2j)",
            "b'\\xff'",
            "7L",
        ];
        for src in sources {

            let value = p(src);
            assert_eq!(p(&value.to_string()), value, "{src}");
        }
    }

    #[test]
    fn errors() {
        assert!(parse("[1, 2").is_err());
        assert!(parse("frozenset([1])").is_err());
        assert!(parse("1 2").is_err());
        assert!(parse("spam").is_err());
        assert!(parse("").is_err());
    }
}
