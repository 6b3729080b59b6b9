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

//! `extends` and `block`

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::ast::{BodyId, Template};
use crate::error::Result;
use crate::parser::TokenStream;
use crate::render::Context;
use crate::tag::{Tag, TagFactory};
use crate::tokenizer::Token;

use super::template_name;

/// Register holding the rendered content of each block by name
const BLOCKS: &str = "blocks";

static BLOCK_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

#[derive(Debug)]
struct Extends {
    layout: String,
}

#[async_trait]
impl Tag for Extends {
    async fn render(&self, _ctx: &mut Context<'_>, _template: &Template) -> Result<String> {
        Ok(String::new())
    }

    fn layout(&self) -> Option<&str> {
        Some(self.layout.as_str())
    }
}

pub(super) struct ExtendsFty;

impl TagFactory for ExtendsFty {
    fn parse(&self, token: &Token, _stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        Ok(Box::new(Extends {
            layout: template_name(token)?,
        }))
    }
}

#[derive(Debug)]
struct Block {
    name: String,
    body: BodyId,
}

#[async_trait]
impl Tag for Block {
    /// Renders the body once per render call; later encounters reuse the stored text
    async fn render(&self, ctx: &mut Context<'_>, template: &Template) -> Result<String> {
        let cached = ctx
            .scope()
            .registers()
            .get(BLOCKS)
            .and_then(|blocks| blocks.get(&self.name))
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(cached) = cached {
            return Ok(cached);
        }
        let out = ctx.render_body(template, self.body).await?;
        ctx.scope_mut()
            .registers_mut()
            .object_mut(BLOCKS)
            .insert(self.name.clone(), Value::String(out.clone()));
        Ok(out)
    }

    fn block(&self) -> Option<(&str, BodyId)> {
        Some((self.name.as_str(), self.body))
    }

    fn bodies(&self) -> Vec<BodyId> {
        vec![self.body]
    }
}

pub(super) struct BlockFty;

impl TagFactory for BlockFty {
    fn parse(&self, token: &Token, stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        // the first word names the block; anything after it is ignored
        let name = BLOCK_NAME
            .find(&token.args)
            .map_or("anonymous", |word| word.as_str())
            .to_string();
        let body = stream.expect_end(token, "endblock")?;
        Ok(Box::new(Block { name, body }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::config::Options;
    use crate::engine::Engine;
    use crate::error::Error;
    use crate::loader::MemoryLoader;

    #[tokio::test]
    async fn block_renders_its_body_in_place() {
        let engine = Engine::default();
        let out = engine
            .parse_and_render("a{% block b %}{{ x }}{% endblock %}c", &json!({"x": 1}))
            .await
            .unwrap();
        assert_eq!(out, "a1c");
    }

    #[tokio::test]
    async fn block_output_is_reused_within_a_render() {
        let engine = Engine::default();
        let src = "{% for i in (1..3) %}{% block b %}{{ i }}{% endblock %}{% endfor %}";
        let out = engine.parse_and_render(src, &json!({})).await.unwrap();
        assert_eq!(out, "111");
    }

    async fn override_in(layout: &str, child: &str) -> String {
        let loader = MemoryLoader::new().with("layout.liquid", layout);
        Engine::with_loader(Options::default(), loader)
            .parse_and_render(child, &json!({}))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn block_name_is_the_first_word() {
        let out = override_in(
            "[{% block title extra %}D{% endblock %}]",
            "{% extends 'layout' %}{% block title %}C{% endblock %}",
        )
        .await;
        assert_eq!(out, "[C]");
    }

    #[tokio::test]
    async fn unnamed_block_is_anonymous() {
        let out = override_in(
            "[{% block %}D{% endblock %}]",
            "{% extends 'layout' %}{% block anonymous %}C{% endblock %}",
        )
        .await;
        assert_eq!(out, "[C]");
    }

    #[test]
    fn block_needs_an_end() {
        let engine = Engine::default();
        assert!(matches!(engine.parse("{% block a %}"), Err(Error::Parse { .. })));
    }

    #[test]
    fn extends_needs_a_name() {
        let engine = Engine::default();
        assert!(matches!(engine.parse("{% extends %}"), Err(Error::Parse { .. })));
    }
}
