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

//! `include`: renders a partial from the loader with the current scope
//!
//! `{% include 'name', key: value %}` binds each `key` in a frame that only the partial
//! sees. The partial name is an expression, so it may come from a variable.

use async_trait::async_trait;
use serde_json::Map;

use crate::ast::Template;
use crate::error::Result;
use crate::expression::Operand;
use crate::parser::TokenStream;
use crate::render::Context;
use crate::tag::{Tag, TagFactory};
use crate::tokenizer::Token;
use crate::value::stringify;

use super::{cursor, syntax};

#[derive(Debug)]
struct Include {
    name: Operand,
    params: Vec<(String, Operand)>,
}

#[async_trait]
impl Tag for Include {
    async fn render(&self, ctx: &mut Context<'_>, _template: &Template) -> Result<String> {
        let name = stringify(&self.name.evaluate(ctx.scope())?);
        let partial = ctx.engine().get_template(&name).await?;
        let mut frame = Map::new();
        for (key, value) in &self.params {
            frame.insert(key.clone(), value.evaluate(ctx.scope())?);
        }
        ctx.scope_mut().push(frame);
        let result = ctx.render_body(&partial, partial.root()).await;
        ctx.scope_mut().pop();
        result
    }
}

pub(super) struct IncludeFty;

impl TagFactory for IncludeFty {
    fn parse(&self, token: &Token, _stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        let mut args = cursor(token)?;
        let name = args.operand().map_err(syntax(token))?;
        let mut params = Vec::new();
        while args.eat_punct(",") {
            let key = args.word().map_err(syntax(token))?;
            args.expect_punct(":").map_err(syntax(token))?;
            params.push((key, args.operand().map_err(syntax(token))?));
        }
        args.finish().map_err(syntax(token))?;
        Ok(Box::new(Include { name, params }))
    }
}
