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

//! `for`, `break` and `continue`

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::ast::{BodyId, Template};
use crate::error::{Error, Interrupt, LoopControl, Result};
use crate::expression::Operand;
use crate::parser::TokenStream;
use crate::render::Context;
use crate::tag::{Tag, TagFactory};
use crate::tokenizer::Token;
use crate::value::to_items;

use super::{cursor, syntax};

#[derive(Debug)]
struct For {
    variable: String,
    collection: Operand,
    reversed: bool,
    limit: Option<Operand>,
    offset: Option<Operand>,
    body: BodyId,
    otherwise: Option<BodyId>,
}

fn count(operand: Option<&Operand>, ctx: &Context<'_>) -> Result<Option<usize>> {
    let Some(operand) = operand else {
        return Ok(None);
    };
    match operand.evaluate(ctx.scope())? {
        // whole part only; negative counts clamp to zero
        Value::Number(n) => Ok(Some(n.as_f64().unwrap_or(0.0) as usize)),
        Value::Null => Ok(None),
        other => Err(Error::render(format!("expected a number, got {}", other))),
    }
}

fn forloop(index: usize, length: usize) -> Value {
    json!({
        "index": index + 1,
        "index0": index,
        "rindex": length - index,
        "rindex0": length - index - 1,
        "first": index == 0,
        "last": index + 1 == length,
        "length": length,
    })
}

#[async_trait]
impl Tag for For {
    async fn render(&self, ctx: &mut Context<'_>, template: &Template) -> Result<String> {
        let mut items = to_items(&self.collection.evaluate(ctx.scope())?);
        let offset = count(self.offset.as_ref(), ctx)?.unwrap_or(0).min(items.len());
        items.drain(..offset);
        if let Some(limit) = count(self.limit.as_ref(), ctx)? {
            items.truncate(limit);
        }
        if self.reversed {
            items.reverse();
        }
        if items.is_empty() {
            return match self.otherwise {
                Some(body) => ctx.render_body(template, body).await,
                None => Ok(String::new()),
            };
        }

        let length = items.len();
        ctx.scope_mut().push(Map::new());
        let mut out = String::new();
        let mut result = Ok(());
        for (index, item) in items.into_iter().enumerate() {
            ctx.scope_mut().set(self.variable.clone(), item);
            ctx.scope_mut().set("forloop", forloop(index, length));
            match ctx.render_body(template, self.body).await {
                Ok(chunk) => out.push_str(&chunk),
                Err(Error::RenderBreak(interrupt)) => {
                    out.push_str(&interrupt.output);
                    if interrupt.control == LoopControl::Break {
                        break;
                    }
                }
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        ctx.scope_mut().pop();
        result.map(|_| out)
    }

    fn bodies(&self) -> Vec<BodyId> {
        std::iter::once(self.body).chain(self.otherwise).collect()
    }
}

pub(super) struct ForFty;

impl TagFactory for ForFty {
    fn parse(&self, token: &Token, stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        let mut args = cursor(token)?;
        let variable = args.word().map_err(syntax(token))?;
        if !args.eat_word("in") {
            return Err(Error::parse("expected in", token));
        }
        let collection = args.operand().map_err(syntax(token))?;
        let (mut reversed, mut limit, mut offset) = (false, None, None);
        while !args.is_done() {
            if args.eat_word("reversed") {
                reversed = true;
            } else if args.eat_word("limit") {
                args.expect_punct(":").map_err(syntax(token))?;
                limit = Some(args.operand().map_err(syntax(token))?);
            } else if args.eat_word("offset") {
                args.expect_punct(":").map_err(syntax(token))?;
                offset = Some(args.operand().map_err(syntax(token))?);
            } else {
                args.finish().map_err(syntax(token))?;
            }
        }

        let (body, end) = stream.parse_until(token, &["else", "endfor"])?;
        let otherwise = if end.is_tag("else") {
            Some(stream.expect_end(token, "endfor")?)
        } else {
            None
        };
        Ok(Box::new(For {
            variable,
            collection,
            reversed,
            limit,
            offset,
            body,
            otherwise,
        }))
    }
}

#[derive(Debug)]
struct Signal(LoopControl);

#[async_trait]
impl Tag for Signal {
    async fn render(&self, _ctx: &mut Context<'_>, _template: &Template) -> Result<String> {
        Err(Error::RenderBreak(Interrupt::new(self.0)))
    }
}

pub(super) struct BreakFty;

impl TagFactory for BreakFty {
    fn parse(&self, _token: &Token, _stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        Ok(Box::new(Signal(LoopControl::Break)))
    }
}

pub(super) struct ContinueFty;

impl TagFactory for ContinueFty {
    fn parse(&self, _token: &Token, _stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        Ok(Box::new(Signal(LoopControl::Continue)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::engine::Engine;
    use crate::error::Error;

    async fn render(src: &str, data: Value) -> String {
        Engine::default().parse_and_render(src, &data).await.unwrap()
    }

    #[tokio::test]
    async fn iterates_arrays_in_order() {
        let out = render("{% for x in xs %}{{ x }};{% endfor %}", json!({"xs": [1, "a", true]})).await;
        assert_eq!(out, "1;a;true;");
    }

    #[tokio::test]
    async fn ranges_and_modifiers() {
        assert_eq!(render("{% for i in (1..5) limit:2 %}{{ i }}{% endfor %}", json!({})).await, "12");
        assert_eq!(render("{% for i in (1..5) offset:3 %}{{ i }}{% endfor %}", json!({})).await, "45");
        assert_eq!(render("{% for i in (1..3) reversed %}{{ i }}{% endfor %}", json!({})).await, "321");
        assert_eq!(
            render("{% for i in (1..6) offset:1 limit:3 reversed %}{{ i }}{% endfor %}", json!({})).await,
            "432"
        );
    }

    #[tokio::test]
    async fn float_modifiers_are_truncated() {
        let src = "{% for i in (1..5) offset: o limit: n %}{{ i }}{% endfor %}";
        assert_eq!(render(src, json!({"n": 2.0, "o": 1.7})).await, "23");
        assert_eq!(render(src, json!({"n": 2.9, "o": -1})).await, "12");
    }

    #[tokio::test]
    async fn forloop_variables() {
        let src = "{% for x in xs %}{{ forloop.index }}/{{ forloop.length }}{% if forloop.last %}.{% else %},{% endif %}{% endfor %}";
        assert_eq!(render(src, json!({"xs": ["a", "b", "c"]})).await, "1/3,2/3,3/3.");
    }

    #[tokio::test]
    async fn objects_iterate_as_pairs() {
        let src = "{% for pair in obj %}{{ pair[0] }}={{ pair[1] }} {% endfor %}";
        assert_eq!(render(src, json!({"obj": {"a": 1}})).await, "a=1 ");
    }

    #[tokio::test]
    async fn else_renders_for_empty_collections() {
        let src = "{% for x in xs %}{{ x }}{% else %}empty{% endfor %}";
        assert_eq!(render(src, json!({"xs": []})).await, "empty");
        assert_eq!(render(src, json!({})).await, "empty");
    }

    #[tokio::test]
    async fn break_and_continue() {
        let src = "{% for i in (1..5) %}{% if i == 2 %}{% continue %}{% endif %}{% if i == 4 %}{% break %}{% endif %}{{ i }}{% endfor %}";
        assert_eq!(render(src, json!({})).await, "13");
    }

    #[tokio::test]
    async fn output_before_a_signal_is_kept() {
        let src = "{% for i in (1..3) %}<{{ i }}{% if i == 2 %}{% break %}{% endif %}>{% endfor %}";
        assert_eq!(render(src, json!({})).await, "<1><2");
    }

    #[tokio::test]
    async fn signals_only_reach_the_innermost_loop() {
        let src = "{% for i in (1..2) %}{% for j in (1..3) %}{% if j == 2 %}{% break %}{% endif %}{{ i }}{{ j }} {% endfor %}{% endfor %}";
        assert_eq!(render(src, json!({})).await, "11 21 ");
    }

    #[tokio::test]
    async fn loop_variables_do_not_leak() {
        let src = "{% for x in (1..2) %}{% endfor %}[{{ x }}{{ forloop.index }}]";
        assert_eq!(render(src, json!({})).await, "[]");
    }

    #[tokio::test]
    async fn break_outside_a_loop_ends_the_render() {
        assert_eq!(render("a{% break %}b", json!({})).await, "a");
    }

    #[test]
    fn malformed_loops_fail_to_parse() {
        let engine = Engine::default();
        for src in [
            "{% for %}{% endfor %}",
            "{% for x xs %}{% endfor %}",
            "{% for x in xs limit %}{% endfor %}",
            "{% for x in xs bogus %}{% endfor %}",
            "{% for x in xs %}",
        ] {
            assert!(matches!(engine.parse(src), Err(Error::Parse { .. })), "{src}");
        }
    }
}
