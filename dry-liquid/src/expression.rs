// MIT License
//
// Copyright (c) 2024 Jerome Johnson
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Liquid expression parsing and evaluation
//!
//! Output tokens and tag arguments share one small expression language:
//! - Literals: `'text'`, `"text"`, `42`, `-1.5`, `true`, `false`, `nil`
//! - Ranges: `(1..5)`, `(1..n)`
//! - Variables: `user.name`, `items[0]`, `map["key"]`, `items[i]`
//! - Filters, in outputs only: `name | append: "!", "?" | upcase`
//! - Conditions, in `if`/`unless`: `a == b`, `list contains x`, joined by `and`/`or`
//!
//! Expressions are parsed once when the template is parsed and evaluated against a
//! [`Scope`] each time it is rendered.
//!
//! # Examples
//!
//! ```rust
//! use dry_liquid::{Operand, Options, Scope};
//! use serde_json::json;
//!
//! let data = json!({"user": {"tags": ["a", "b"]}});
//! let scope = Scope::new(data.as_object().cloned().unwrap(), &Options::default());
//! let operand: Operand = "user.tags[1]".parse().unwrap();
//! assert_eq!(operand.evaluate(&scope).unwrap(), json!("b"));
//! ```

use std::borrow::Cow;
use std::fmt::{self, Display};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};
use tracing::trace;

use crate::error::{Error, Result, rcap};
use crate::scope::Scope;
use crate::tokenizer::Token;
use crate::value::{compare, contains, equals, index, is_truthy, property, stringify};

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][\w-]*\??").unwrap());

const PUNCTUATION: [&str; 16] = [
    "..", "==", "!=", "<>", "<=", ">=", "<", ">", "|", ":", ",", "(", ")", "[", "]", ".",
];

/// A lexical unit of an expression
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Lexeme {
    Str(String),
    Number(Number),
    Word(String),
    Punct(&'static str),
}

impl Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lexeme::Str(s) => write!(f, "{:?}", s),
            Lexeme::Number(n) => write!(f, "{}", n),
            Lexeme::Word(w) => f.write_str(w),
            Lexeme::Punct(p) => f.write_str(p),
        }
    }
}

fn number(src: &str) -> std::result::Result<Number, String> {
    let parsed = if src.contains('.') {
        src.parse::<f64>().ok().and_then(Number::from_f64)
    } else {
        src.parse::<i64>().ok().map(Number::from)
    };
    parsed.ok_or_else(|| format!("invalid number {}", src))
}

/// Splits expression text into lexemes
fn lex(src: &str) -> std::result::Result<Vec<Lexeme>, String> {
    let mut lexemes = Vec::new();
    let mut rest = src.trim_start();
    while let Some(c) = rest.chars().next() {
        let len = if c == '"' || c == '\'' {
            let end = rest[1..]
                .find(c)
                .ok_or_else(|| format!("unterminated string near {}", rcap(rest)))?;
            lexemes.push(Lexeme::Str(rest[1..end + 1].to_string()));
            end + 2
        } else if let Some(found) = NUMBER.find(rest) {
            lexemes.push(Lexeme::Number(number(found.as_str())?));
            found.end()
        } else if let Some(found) = WORD.find(rest) {
            lexemes.push(Lexeme::Word(found.as_str().to_string()));
            found.end()
        } else if let Some(punct) = PUNCTUATION.iter().find(|p| rest.starts_with(**p)) {
            lexemes.push(Lexeme::Punct(*punct));
            punct.len()
        } else {
            return Err(format!("unexpected character {:?} near {}", c, rcap(rest)));
        };
        rest = rest[len..].trim_start();
    }
    Ok(lexemes)
}

/// One step of a variable path
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `.name`, or the leading name of the path
    Key(String),
    /// `[operand]`
    Index(Operand),
}

/// A value-producing term
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    Range(Box<Operand>, Box<Operand>),
    Path(Vec<Segment>),
}

/// A filter application inside an output: `| name: arg, arg`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCall {
    pub name: String,
    pub args: Vec<Operand>,
}

/// A parsed output expression
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// The expression source, trimmed
    pub source: String,
    pub operand: Operand,
    pub filters: Vec<FilterCall>,
}

/// Comparison operators usable in conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Contains,
}

/// A boolean expression for conditional tags
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Test(Operand),
    Compare(Operand, Comparison, Operand),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}

/// Reads lexemes of an argument string in order
pub(crate) struct Cursor {
    lexemes: Vec<Lexeme>,
    pos: usize,
}

impl Cursor {
    pub(crate) fn new(src: &str) -> std::result::Result<Self, String> {
        Ok(Self {
            lexemes: lex(src)?,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.pos)
    }

    fn advance(&mut self) -> Option<Lexeme> {
        let lexeme = self.lexemes.get(self.pos).cloned();
        self.pos += 1;
        lexeme
    }

    pub(crate) fn is_done(&self) -> bool {
        self.pos >= self.lexemes.len()
    }

    pub(crate) fn eat_punct(&mut self, punct: &str) -> bool {
        if matches!(self.peek(), Some(Lexeme::Punct(p)) if *p == punct) {
            self.pos += 1;
            return true;
        }
        false
    }

    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Lexeme::Word(w)) if w == word) {
            self.pos += 1;
            return true;
        }
        false
    }

    pub(crate) fn expect_punct(&mut self, punct: &str) -> std::result::Result<(), String> {
        if self.eat_punct(punct) {
            return Ok(());
        }
        Err(match self.peek() {
            Some(found) => format!("expected {} but found {}", punct, found),
            None => format!("expected {}", punct),
        })
    }

    pub(crate) fn word(&mut self) -> std::result::Result<String, String> {
        match self.advance() {
            Some(Lexeme::Word(word)) => Ok(word),
            Some(other) => Err(format!("expected a name but found {}", other)),
            None => Err("expected a name".to_string()),
        }
    }

    /// Fails when lexemes remain
    pub(crate) fn finish(&self) -> std::result::Result<(), String> {
        match self.peek() {
            Some(extra) => Err(format!("unexpected {}", extra)),
            None => Ok(()),
        }
    }

    pub(crate) fn operand(&mut self) -> std::result::Result<Operand, String> {
        match self.advance() {
            Some(Lexeme::Str(s)) => Ok(Operand::Literal(Value::String(s))),
            Some(Lexeme::Number(n)) => Ok(Operand::Literal(Value::Number(n))),
            Some(Lexeme::Punct("(")) => {
                let from = self.operand()?;
                self.expect_punct("..")?;
                let to = self.operand()?;
                self.expect_punct(")")?;
                Ok(Operand::Range(Box::new(from), Box::new(to)))
            }
            Some(Lexeme::Punct("[")) => {
                let key = self.operand()?;
                self.expect_punct("]")?;
                self.path(vec![Segment::Index(key)])
            }
            Some(Lexeme::Word(word)) => match word.as_str() {
                "true" => Ok(Operand::Literal(Value::Bool(true))),
                "false" => Ok(Operand::Literal(Value::Bool(false))),
                "nil" | "null" => Ok(Operand::Literal(Value::Null)),
                _ => self.path(vec![Segment::Key(word)]),
            },
            Some(other) => Err(format!("unexpected {}", other)),
            None => Err("expected a value".to_string()),
        }
    }

    fn path(&mut self, mut segments: Vec<Segment>) -> std::result::Result<Operand, String> {
        loop {
            if self.eat_punct(".") {
                segments.push(Segment::Key(match self.advance() {
                    Some(Lexeme::Word(word)) => word,
                    Some(Lexeme::Number(n)) if n.is_u64() => n.to_string(),
                    Some(other) => return Err(format!("unexpected {} after .", other)),
                    None => return Err("expected a property after .".to_string()),
                }));
            } else if self.eat_punct("[") {
                segments.push(Segment::Index(self.operand()?));
                self.expect_punct("]")?;
            } else {
                return Ok(Operand::Path(segments));
            }
        }
    }

    fn filters(&mut self) -> std::result::Result<Vec<FilterCall>, String> {
        let mut filters = Vec::new();
        while self.eat_punct("|") {
            let name = self.word()?;
            let mut args = Vec::new();
            if self.eat_punct(":") {
                args.push(self.operand()?);
                while self.eat_punct(",") {
                    args.push(self.operand()?);
                }
            }
            filters.push(FilterCall { name, args });
        }
        Ok(filters)
    }

    fn comparison(&mut self) -> Option<Comparison> {
        let comparison = match self.peek()? {
            Lexeme::Punct("==") => Comparison::Eq,
            Lexeme::Punct("!=") | Lexeme::Punct("<>") => Comparison::Ne,
            Lexeme::Punct("<") => Comparison::Lt,
            Lexeme::Punct(">") => Comparison::Gt,
            Lexeme::Punct("<=") => Comparison::Le,
            Lexeme::Punct(">=") => Comparison::Ge,
            Lexeme::Word(w) if w == "contains" => Comparison::Contains,
            _ => return None,
        };
        self.pos += 1;
        Some(comparison)
    }

    /// `and`/`or` bind to the right, so `a or b and c` is `a or (b and c)`
    pub(crate) fn condition(&mut self) -> std::result::Result<Condition, String> {
        let left = self.operand()?;
        let clause = match self.comparison() {
            Some(comparison) => Condition::Compare(left, comparison, self.operand()?),
            None => Condition::Test(left),
        };
        if self.eat_word("and") {
            Ok(Condition::And(Box::new(clause), Box::new(self.condition()?)))
        } else if self.eat_word("or") {
            Ok(Condition::Or(Box::new(clause), Box::new(self.condition()?)))
        } else {
            Ok(clause)
        }
    }
}

fn parse_with<T>(
    src: &str,
    parse: impl FnOnce(&mut Cursor) -> std::result::Result<T, String>,
) -> std::result::Result<T, String> {
    let mut cursor = Cursor::new(src)?;
    let parsed = parse(&mut cursor)?;
    cursor.finish()?;
    Ok(parsed)
}

impl FromStr for Operand {
    type Err = String;

    fn from_str(src: &str) -> std::result::Result<Self, String> {
        parse_with(src, Cursor::operand)
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(src: &str) -> std::result::Result<Self, String> {
        parse_with(src, Cursor::condition)
    }
}

impl Operand {
    /// Parses a single value, reporting failures against `token`
    pub fn parse(src: &str, token: &Token) -> Result<Self> {
        src.parse::<Operand>()
            .map_err(|message| Error::parse(message, token))
    }

    /// Evaluates against `scope`; undefined variables are nil unless strict
    pub fn evaluate(&self, scope: &Scope) -> Result<Value> {
        match self {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Range(from, to) => {
                let from = bound(&from.evaluate(scope)?)?;
                let to = bound(&to.evaluate(scope)?)?;
                Ok(Value::Array((from..=to).map(Value::from).collect()))
            }
            Operand::Path(segments) => match resolve(segments, scope)? {
                Some(value) => Ok(value.into_owned()),
                None if scope.strict_variables() => {
                    Err(Error::render(format!("undefined variable: {}", self)))
                }
                None => {
                    trace!(variable = %self, "undefined variable rendered as nil");
                    Ok(Value::Null)
                }
            },
        }
    }
}

fn bound(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| Error::render(format!("invalid range bound {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| Error::render(format!("invalid range bound {:?}", s))),
        other => Err(Error::render(format!("invalid range bound {}", other))),
    }
}

fn resolve<'s>(segments: &[Segment], scope: &'s Scope) -> Result<Option<Cow<'s, Value>>> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(None);
    };
    let mut current = match first {
        Segment::Key(name) => scope.get(name).map(Cow::Borrowed),
        Segment::Index(key) => scope.get(&stringify(&key.evaluate(scope)?)).map(Cow::Borrowed),
    };
    for segment in rest {
        let Some(value) = current else {
            return Ok(None);
        };
        current = match (value, segment) {
            (Cow::Borrowed(value), Segment::Key(key)) => property(value, key),
            (Cow::Borrowed(value), Segment::Index(key)) => index(value, &key.evaluate(scope)?),
            (Cow::Owned(value), Segment::Key(key)) => {
                property(&value, key).map(|v| Cow::Owned(v.into_owned()))
            }
            (Cow::Owned(value), Segment::Index(key)) => {
                index(&value, &key.evaluate(scope)?).map(|v| Cow::Owned(v.into_owned()))
            }
        };
    }
    Ok(current)
}

impl Output {
    /// Parses `operand | filter: args | ...`
    pub fn parse(src: &str, token: &Token) -> Result<Self> {
        let (operand, filters) = parse_with(src, |cursor| {
            let operand = cursor.operand()?;
            Ok((operand, cursor.filters()?))
        })
        .map_err(|message| Error::parse(message, token))?;
        Ok(Self {
            source: src.trim().to_string(),
            operand,
            filters,
        })
    }

    /// Whether this output is exactly `{{ block.super }}`
    pub fn is_block_super(&self) -> bool {
        self.filters.is_empty()
            && matches!(&self.operand, Operand::Path(segments)
                if matches!(segments.as_slice(),
                    [Segment::Key(a), Segment::Key(b)] if a == "block" && b == "super"))
    }
}

impl Condition {
    pub fn parse(src: &str, token: &Token) -> Result<Self> {
        src.parse::<Condition>()
            .map_err(|message| Error::parse(message, token))
    }

    pub fn evaluate(&self, scope: &Scope) -> Result<bool> {
        Ok(match self {
            Condition::Test(operand) => is_truthy(&operand.evaluate(scope)?),
            Condition::Compare(left, comparison, right) => {
                let left = left.evaluate(scope)?;
                let right = right.evaluate(scope)?;
                match comparison {
                    Comparison::Eq => equals(&left, &right),
                    Comparison::Ne => !equals(&left, &right),
                    Comparison::Lt => compare(&left, &right).is_some_and(|o| o.is_lt()),
                    Comparison::Gt => compare(&left, &right).is_some_and(|o| o.is_gt()),
                    Comparison::Le => compare(&left, &right).is_some_and(|o| o.is_le()),
                    Comparison::Ge => compare(&left, &right).is_some_and(|o| o.is_ge()),
                    Comparison::Contains => contains(&left, &right),
                }
            }
            Condition::And(left, right) => left.evaluate(scope)? && right.evaluate(scope)?,
            Condition::Or(left, right) => left.evaluate(scope)? || right.evaluate(scope)?,
        })
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => write!(f, "{}", value),
            Operand::Range(from, to) => write!(f, "({}..{})", from, to),
            Operand::Path(segments) => {
                for (i, segment) in segments.iter().enumerate() {
                    match segment {
                        Segment::Key(key) if i == 0 => f.write_str(key)?,
                        Segment::Key(key) => write!(f, ".{}", key)?,
                        Segment::Index(key) => write!(f, "[{}]", key)?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// Evaluates a single value expression against a scope
pub fn eval_value(src: &str, scope: &Scope) -> Result<Value> {
    src.parse::<Operand>()
        .map_err(|message| Error::Parse {
            message,
            position: None,
        })?
        .evaluate(scope)
}

/// Evaluates a condition expression against a scope
pub fn eval_exp(src: &str, scope: &Scope) -> Result<bool> {
    src.parse::<Condition>()
        .map_err(|message| Error::Parse {
            message,
            position: None,
        })?
        .evaluate(scope)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::Options;

    fn scope(data: Value) -> Scope {
        Scope::new(data.as_object().cloned().unwrap(), &Options::default())
    }

    fn strict(data: Value) -> Scope {
        let options = Options {
            strict_variables: true,
            ..Options::default()
        };
        Scope::new(data.as_object().cloned().unwrap(), &options)
    }

    #[test]
    fn lexes_mixed_input() {
        let lexemes = lex("a.b[0] | f: 'x', -2.5 == (1..3)").unwrap();
        assert_eq!(lexemes.len(), 18);
        assert_eq!(lexemes[0], Lexeme::Word("a".into()));
        assert_eq!(lexemes[9], Lexeme::Str("x".into()));
        assert_eq!(lexemes[11], Lexeme::Number(Number::from_f64(-2.5).unwrap()));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(lex("'abc").is_err());
        assert!(lex("a ; b").is_err());
    }

    #[test]
    fn parses_paths() {
        let operand: Operand = "user.tags[0][\"k\"]".parse().unwrap();
        assert_eq!(
            operand,
            Operand::Path(vec![
                Segment::Key("user".into()),
                Segment::Key("tags".into()),
                Segment::Index(Operand::Literal(json!(0))),
                Segment::Index(Operand::Literal(json!("k"))),
            ])
        );
        assert_eq!(operand.to_string(), "user.tags[0][\"k\"]");
    }

    #[test]
    fn evaluates_paths_and_special_properties() {
        let scope = scope(json!({"user": {"tags": ["a", "b"], "i": 1}}));
        assert_eq!(eval_value("user.tags[user.i]", &scope).unwrap(), json!("b"));
        assert_eq!(eval_value("user.tags.size", &scope).unwrap(), json!(2));
        assert_eq!(eval_value("user.tags.last", &scope).unwrap(), json!("b"));
        assert_eq!(eval_value("user.missing.deeper", &scope).unwrap(), Value::Null);
    }

    #[test]
    fn ranges_evaluate_inclusively() {
        let scope = scope(json!({"n": 3}));
        assert_eq!(eval_value("(1..n)", &scope).unwrap(), json!([1, 2, 3]));
        assert_eq!(eval_value("(3..1)", &scope).unwrap(), json!([]));
    }

    #[test]
    fn strict_variables_reject_undefined() {
        let scope = strict(json!({"a": {"b": null}}));
        assert_eq!(eval_value("a.b", &scope).unwrap(), Value::Null);
        let err = eval_value("a.c", &scope).unwrap_err();
        assert_eq!(err.to_string(), "undefined variable: a.c");
    }

    #[test]
    fn output_keeps_filters_in_order() {
        let output: Output = Output::parse(
            " name | append: '!', 'x' | upcase ",
            &Token::literal(String::new(), String::new(), Default::default()),
        )
        .unwrap();
        assert_eq!(output.source, "name | append: '!', 'x' | upcase");
        let names: Vec<_> = output.filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["append", "upcase"]);
        assert_eq!(output.filters[0].args.len(), 2);
    }

    #[test]
    fn recognises_block_super() {
        let token = Token::literal(String::new(), String::new(), Default::default());
        assert!(Output::parse("block.super", &token).unwrap().is_block_super());
        assert!(!Output::parse("block.super | upcase", &token).unwrap().is_block_super());
        assert!(!Output::parse("block.other", &token).unwrap().is_block_super());
    }

    #[test]
    fn conditions_follow_liquid_truthiness() {
        let scope = scope(json!({"zero": 0, "empty": "", "no": false, "list": [1, 2]}));
        assert!(eval_exp("zero", &scope).unwrap());
        assert!(eval_exp("empty", &scope).unwrap());
        assert!(!eval_exp("no", &scope).unwrap());
        assert!(!eval_exp("missing", &scope).unwrap());
        assert!(eval_exp("list contains 2", &scope).unwrap());
        assert!(eval_exp("zero < 1 and list.size == 2", &scope).unwrap());
    }

    #[test]
    fn and_or_bind_right_to_left() {
        let scope = scope(json!({}));
        assert!(eval_exp("true or false and false", &scope).unwrap());
        assert!(!eval_exp("false and false or true", &scope).unwrap());
    }

    #[test]
    fn trailing_input_is_rejected() {
        assert!("a b".parse::<Operand>().is_err());
        assert!("a ==".parse::<Condition>().is_err());
    }
}
