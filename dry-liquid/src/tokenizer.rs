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

//! Liquid template tokenization
//!
//! This module splits template source into a flat sequence of [`Token`]s. It only knows the
//! engine-level delimiters:
//! - Literals: any text outside delimiters
//! - Outputs: `{{ expression }}`
//! - Tags: `{% name arguments %}`
//!
//! Argument text is kept unparsed; the parser hands it to the tag implementation or the
//! expression parser. Nesting is the parser's business, the tokenizer produces no structure.
//!
//! # Whitespace control
//!
//! A `-` just inside a delimiter (`{%-`, `-%}`, `{{-`, `-}}`) trims the whitespace of the
//! neighbouring literal. The `trim_left`/`trim_right` options do the same for every tag.
//! Trimming is suspended between `raw` and `endraw`.
//!
//! # Examples
//!
//! ```rust
//! use dry_liquid::{tokenize, Options, TokenKind};
//!
//! let tokens = tokenize("Hello {{ name }}!", &Options::default()).unwrap();
//! assert_eq!(tokens.len(), 3);
//! assert_eq!(tokens[1].kind, TokenKind::Output);
//! assert_eq!(tokens[1].value, "name");
//! ```

use std::fmt::{self, Display};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::Options;
use crate::error::{Error, Result, rcap};

static OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[{%]").unwrap());
static TAG_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+)\s*([\s\S]*)$").unwrap());
static GREEDY_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+$").unwrap());
static GREEDY_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+").unwrap());
static INLINE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\t\r ]*$").unwrap());
static INLINE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\t\r ]*\n?").unwrap());

/// Location of a token in its source, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset of the first character
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in characters
    pub column: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.column)
    }
}

/// Types of tokens produced by [`tokenize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Literal,
    Tag,
    Output,
}

/// A token of template source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Tag name; empty for literals and outputs
    pub name: String,
    /// Unparsed tag arguments; empty for literals and outputs
    pub args: String,
    /// Literal text, output expression or full tag content, with delimiters removed
    pub value: String,
    /// The complete source text including delimiters
    pub raw: String,
    pub position: Position,
    pub(crate) trim_left: bool,
    pub(crate) trim_right: bool,
}

impl Token {
    pub(crate) fn literal(value: String, raw: String, position: Position) -> Self {
        Self {
            kind: TokenKind::Literal,
            name: String::new(),
            args: String::new(),
            value,
            raw,
            position,
            trim_left: false,
            trim_right: false,
        }
    }

    /// Whether this token is the tag `name`
    pub fn is_tag(&self, name: &str) -> bool {
        self.kind == TokenKind::Tag && self.name == name
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Maps byte offsets to lines and columns
struct LineIndex<'a> {
    src: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(src: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { src, starts }
    }

    fn position(&self, offset: usize) -> Position {
        let line = self.starts.partition_point(|&start| start <= offset);
        let start = self.starts[line - 1];
        Position {
            offset,
            line,
            column: self.src[start..offset].chars().count() + 1,
        }
    }
}

/// Finds the closing delimiter of an output or tag opened at `start`
fn close(src: &str, start: usize, end: &'static str) -> Result<usize> {
    match src[start + 2..].find(end) {
        Some(pos) => Ok(start + 2 + pos + end.len()),
        None => Err(Error::tokenization(
            format!(
                "{} not closed near \"{}\"",
                &src[start..start + 2],
                rcap(&src[..(start + 2)])
            ),
            Position::default(),
        )),
    }
}

/// Strips the whitespace control dashes and surrounding blanks from delimiter content
fn strip_markers(inner: &str) -> (bool, &str, bool) {
    let trim_left = inner.starts_with('-');
    let inner = if trim_left { &inner[1..] } else { inner };
    let trim_right = inner.ends_with('-');
    let inner = if trim_right {
        &inner[..inner.len() - 1]
    } else {
        inner
    };
    (trim_left, inner.trim(), trim_right)
}

/// Tokenizes template source
pub fn tokenize(src: &str, options: &Options) -> Result<Vec<Token>> {
    let lines = LineIndex::new(src);
    let mut tokens = Vec::new();
    let mut rest = 0;
    while let Some(open) = OPEN.find_at(src, rest) {
        let start = open.start();
        if start > rest {
            let text = &src[rest..start];
            tokens.push(Token::literal(
                text.to_string(),
                text.to_string(),
                lines.position(rest),
            ));
        }
        let position = lines.position(start);
        let is_tag = open.as_str() == "{%";
        let end = close(src, start, if is_tag { "%}" } else { "}}" }).map_err(|err| match err {
            Error::Tokenization { message, .. } => Error::tokenization(message, position),
            other => other,
        })?;
        let raw = &src[start..end];
        let (trim_left, value, trim_right) = strip_markers(&raw[2..raw.len() - 2]);
        let mut token = Token {
            kind: TokenKind::Output,
            name: String::new(),
            args: String::new(),
            value: value.to_string(),
            raw: raw.to_string(),
            position,
            trim_left,
            trim_right,
        };
        if is_tag {
            let captures = TAG_LINE.captures(value).ok_or_else(|| {
                Error::tokenization(format!("illegal tag syntax near \"{}\"", rcap(raw)), position)
            })?;
            token.kind = TokenKind::Tag;
            token.name = captures[1].to_string();
            token.args = captures[2].to_string();
            token.trim_left |= options.trim_left;
            token.trim_right |= options.trim_right;
        } else if value.is_empty() {
            return Err(Error::tokenization(
                format!("empty output near \"{}\"", rcap(raw)),
                position,
            ));
        }
        tokens.push(token);
        rest = end;
    }
    if rest < src.len() {
        let text = &src[rest..];
        tokens.push(Token::literal(
            text.to_string(),
            text.to_string(),
            lines.position(rest),
        ));
    }
    whitespace_control(&mut tokens, options.greedy);
    Ok(tokens)
}

fn trim_preceding(token: Option<&mut Token>, greedy: bool) {
    if let Some(token) = token.filter(|t| t.kind == TokenKind::Literal) {
        let pattern = if greedy { &GREEDY_END } else { &INLINE_END };
        token.value = pattern.replace(&token.value, "").into_owned();
    }
}

fn trim_following(token: Option<&mut Token>, greedy: bool) {
    if let Some(token) = token.filter(|t| t.kind == TokenKind::Literal) {
        let pattern = if greedy { &GREEDY_START } else { &INLINE_START };
        token.value = pattern.replace(&token.value, "").into_owned();
    }
}

fn whitespace_control(tokens: &mut [Token], greedy: bool) {
    let mut in_raw = false;
    for i in 0..tokens.len() {
        if tokens[i].is_tag("endraw") {
            in_raw = false;
        }
        if !in_raw {
            if tokens[i].trim_left && i > 0 {
                trim_preceding(tokens.get_mut(i - 1), greedy);
            }
            if tokens[i].trim_right {
                trim_following(tokens.get_mut(i + 1), greedy);
            }
        }
        if tokens[i].is_tag("raw") {
            in_raw = true;
        }
    }
}
