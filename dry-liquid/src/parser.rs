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

//! Liquid template parsing
//!
//! The parser turns a token sequence into nodes stored in an [`Arena`]. It does not know the
//! grammar of any tag: literal and output tokens become nodes directly, and a tag token is
//! handed, together with the [`TokenStream`] positioned just after it, to the registered
//! [`TagFactory`]. The factory may pull as many tokens as it needs, typically by calling
//! [`TokenStream::parse_until`] to collect its body up to the matching end tag, and control
//! comes back to the parser at whatever position the factory left the stream.
//!
//! Running out of tokens before a terminator is found is a parse error naming the tag that
//! was left open.

use std::iter::Peekable;
use std::vec::IntoIter;

use crate::ast::{Arena, BodyId, Node, NodeId, NodeKind, TagNode};
use crate::error::{Error, Result};
use crate::expression::Output;
use crate::tag::TagMap;
use crate::tokenizer::{Token, TokenKind};

/// Cursor over the remaining tokens of a template
///
/// Passed by exclusive borrow to tag factories, which advance it and return.
pub struct TokenStream<'a> {
    tags: &'a TagMap,
    tokens: Peekable<IntoIter<Token>>,
    arena: &'a mut Arena,
}

impl<'a> TokenStream<'a> {
    pub fn new(tags: &'a TagMap, tokens: Vec<Token>, arena: &'a mut Arena) -> Self {
        Self {
            tags,
            tokens: tokens.into_iter().peekable(),
            arena,
        }
    }

    /// Takes the next token without parsing it
    pub fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    pub fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek()
    }

    pub fn arena(&mut self) -> &mut Arena {
        self.arena
    }

    /// Parses one token into a node
    pub fn parse_token(&mut self, token: Token) -> Result<NodeId> {
        let kind = match token.kind {
            TokenKind::Literal => NodeKind::Literal(token.value.clone()),
            TokenKind::Output => NodeKind::Output(Output::parse(&token.value, &token)?),
            TokenKind::Tag => {
                let tags = self.tags;
                let factory = tags
                    .get(&token.name)
                    .ok_or_else(|| Error::parse(format!("tag {} not found", token.name), &token))?;
                NodeKind::Tag(TagNode {
                    name: token.name.clone(),
                    tag: factory.parse(&token, self)?,
                })
            }
        };
        Ok(self.arena.alloc(Node { kind, token }))
    }

    /// Parses every remaining token
    pub fn parse_all(&mut self) -> Result<Vec<NodeId>> {
        let mut nodes = Vec::new();
        while let Some(token) = self.next_token() {
            nodes.push(self.parse_token(token)?);
        }
        Ok(nodes)
    }

    /// Parses tokens into a body until a tag named in `ends` is reached
    ///
    /// Returns the body and the terminating tag token, which is consumed but not parsed.
    /// Fails with an error naming `opener` when the input ends first.
    pub fn parse_until(&mut self, opener: &Token, ends: &[&str]) -> Result<(BodyId, Token)> {
        let mut nodes = Vec::new();
        loop {
            let token = self.next_token().ok_or_else(|| Error::unclosed(opener))?;
            if token.kind == TokenKind::Tag && ends.contains(&token.name.as_str()) {
                return Ok((self.arena.alloc_body(nodes), token));
            }
            nodes.push(self.parse_token(token)?);
        }
    }

    /// Parses a body that must be closed by the tag `end`
    pub fn expect_end(&mut self, opener: &Token, end: &str) -> Result<BodyId> {
        self.parse_until(opener, &[end]).map(|(body, _)| body)
    }

    /// Collects raw tokens until a tag named `end`, without parsing them
    pub fn skip_until(&mut self, opener: &Token, end: &str) -> Result<Vec<Token>> {
        let mut skipped = Vec::new();
        loop {
            let token = self.next_token().ok_or_else(|| Error::unclosed(opener))?;
            if token.is_tag(end) {
                return Ok(skipped);
            }
            skipped.push(token);
        }
    }
}

/// Parses token sequences using a set of registered tags
pub struct Parser<'a> {
    tags: &'a TagMap,
}

impl<'a> Parser<'a> {
    pub fn new(tags: &'a TagMap) -> Self {
        Self { tags }
    }

    /// Parses a whole token sequence into a body of `arena`
    pub fn parse(&self, tokens: Vec<Token>, arena: &mut Arena) -> Result<BodyId> {
        let nodes = TokenStream::new(self.tags, tokens, arena).parse_all()?;
        Ok(arena.alloc_body(nodes))
    }
}
