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

//! `raw` and `comment`

use async_trait::async_trait;

use crate::ast::Template;
use crate::error::Result;
use crate::parser::TokenStream;
use crate::render::Context;
use crate::tag::{Tag, TagFactory};
use crate::tokenizer::{Token, TokenKind};

#[derive(Debug)]
struct Raw(String);

#[async_trait]
impl Tag for Raw {
    async fn render(&self, _ctx: &mut Context<'_>, _template: &Template) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub(super) struct RawFty;

impl TagFactory for RawFty {
    fn parse(&self, token: &Token, stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        let text = stream
            .skip_until(token, "endraw")?
            .iter()
            .map(|token| match token.kind {
                TokenKind::Literal => token.value.as_str(),
                _ => token.raw.as_str(),
            })
            .collect();
        Ok(Box::new(Raw(text)))
    }
}

#[derive(Debug)]
struct Comment;

#[async_trait]
impl Tag for Comment {
    async fn render(&self, _ctx: &mut Context<'_>, _template: &Template) -> Result<String> {
        Ok(String::new())
    }
}

pub(super) struct CommentFty;

impl TagFactory for CommentFty {
    fn parse(&self, token: &Token, stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        stream.skip_until(token, "endcomment")?;
        Ok(Box::new(Comment))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::engine::Engine;
    use crate::error::Error;

    #[tokio::test]
    async fn raw_keeps_markup() {
        let engine = Engine::default();
        let out = engine
            .parse_and_render("{% raw %}{{ x }} {% if %}{% endraw %}", &json!({"x": 1}))
            .await
            .unwrap();
        assert_eq!(out, "{{ x }} {% if %}");
    }

    #[tokio::test]
    async fn comment_renders_nothing() {
        let engine = Engine::default();
        let out = engine
            .parse_and_render("a{% comment %}{% nope %}{{ x }}{% endcomment %}b", &json!({}))
            .await
            .unwrap();
        assert_eq!(out, "ab");
    }

    #[test]
    fn unclosed_raw_fails() {
        assert!(matches!(
            Engine::default().parse("{% raw %}text"),
            Err(Error::Parse { .. })
        ));
    }
}
