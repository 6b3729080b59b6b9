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

//! `assign` and `capture`
//!
//! Both bind in the root frame, so a variable assigned inside a loop or a partial is still
//! visible after it.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::ast::{BodyId, Template};
use crate::error::{Error, Result};
use crate::expression::Output;
use crate::parser::TokenStream;
use crate::render::Context;
use crate::tag::{Tag, TagFactory};
use crate::tokenizer::Token;

use super::variable_name;

static ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_][\w-]*)\s*=\s*([\s\S]+)$").unwrap());

#[derive(Debug)]
struct Assign {
    name: String,
    value: Output,
}

#[async_trait]
impl Tag for Assign {
    async fn render(&self, ctx: &mut Context<'_>, _template: &Template) -> Result<String> {
        let value = ctx.evaluate(&self.value)?;
        ctx.scope_mut().set_root(self.name.clone(), value);
        Ok(String::new())
    }
}

pub(super) struct AssignFty;

impl TagFactory for AssignFty {
    fn parse(&self, token: &Token, _stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        let captures = ASSIGNMENT
            .captures(token.args.trim())
            .ok_or_else(|| Error::parse("illegal assignment", token))?;
        Ok(Box::new(Assign {
            name: captures[1].to_string(),
            value: Output::parse(&captures[2], token)?,
        }))
    }
}

#[derive(Debug)]
struct Capture {
    name: String,
    body: BodyId,
}

#[async_trait]
impl Tag for Capture {
    async fn render(&self, ctx: &mut Context<'_>, template: &Template) -> Result<String> {
        let out = ctx.render_body(template, self.body).await?;
        ctx.scope_mut().set_root(self.name.clone(), Value::String(out));
        Ok(String::new())
    }

    fn bodies(&self) -> Vec<BodyId> {
        vec![self.body]
    }
}

pub(super) struct CaptureFty;

impl TagFactory for CaptureFty {
    fn parse(&self, token: &Token, stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        let name = variable_name(&token.args, token)?;
        let body = stream.expect_end(token, "endcapture")?;
        Ok(Box::new(Capture { name, body }))
    }
}
