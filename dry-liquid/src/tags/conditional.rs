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

//! `if`/`elsif`/`else` and `unless`

use async_trait::async_trait;

use crate::ast::{BodyId, Template};
use crate::error::Result;
use crate::expression::Condition;
use crate::parser::TokenStream;
use crate::render::Context;
use crate::tag::{Tag, TagFactory};
use crate::tokenizer::Token;

#[derive(Debug)]
struct If {
    branches: Vec<(Condition, BodyId)>,
    otherwise: Option<BodyId>,
}

#[async_trait]
impl Tag for If {
    async fn render(&self, ctx: &mut Context<'_>, template: &Template) -> Result<String> {
        for (condition, body) in &self.branches {
            if condition.evaluate(ctx.scope())? {
                return ctx.render_body(template, *body).await;
            }
        }
        match self.otherwise {
            Some(body) => ctx.render_body(template, body).await,
            None => Ok(String::new()),
        }
    }

    fn bodies(&self) -> Vec<BodyId> {
        self.branches
            .iter()
            .map(|(_, body)| *body)
            .chain(self.otherwise)
            .collect()
    }
}

pub(super) struct IfFty;

impl TagFactory for IfFty {
    fn parse(&self, token: &Token, stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        let mut branches = Vec::new();
        let mut otherwise = None;
        let mut condition = Condition::parse(&token.args, token)?;
        loop {
            let (body, end) = stream.parse_until(token, &["elsif", "else", "endif"])?;
            branches.push((condition, body));
            match end.name.as_str() {
                "elsif" => condition = Condition::parse(&end.args, &end)?,
                "else" => {
                    otherwise = Some(stream.expect_end(token, "endif")?);
                    break;
                }
                _ => break,
            }
        }
        Ok(Box::new(If {
            branches,
            otherwise,
        }))
    }
}

#[derive(Debug)]
struct Unless {
    condition: Condition,
    body: BodyId,
    otherwise: Option<BodyId>,
}

#[async_trait]
impl Tag for Unless {
    async fn render(&self, ctx: &mut Context<'_>, template: &Template) -> Result<String> {
        if !self.condition.evaluate(ctx.scope())? {
            ctx.render_body(template, self.body).await
        } else if let Some(body) = self.otherwise {
            ctx.render_body(template, body).await
        } else {
            Ok(String::new())
        }
    }

    fn bodies(&self) -> Vec<BodyId> {
        std::iter::once(self.body).chain(self.otherwise).collect()
    }
}

pub(super) struct UnlessFty;

impl TagFactory for UnlessFty {
    fn parse(&self, token: &Token, stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        let condition = Condition::parse(&token.args, token)?;
        let (body, end) = stream.parse_until(token, &["else", "endunless"])?;
        let otherwise = if end.is_tag("else") {
            Some(stream.expect_end(token, "endunless")?)
        } else {
            None
        };
        Ok(Box::new(Unless {
            condition,
            body,
            otherwise,
        }))
    }
}
