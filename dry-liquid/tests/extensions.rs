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

use async_trait::async_trait;
use dry_liquid::{
    BodyId, Context, Engine, Error, FilterError, Operand, Options, Result, Tag, TagFactory,
    Template, Token, TokenKind, TokenStream, arity,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

/// `{% repeat n %}body{% endrepeat %}`
#[derive(Debug)]
struct Repeat {
    times: Operand,
    body: BodyId,
}

#[async_trait]
impl Tag for Repeat {
    async fn render(&self, ctx: &mut Context<'_>, template: &Template) -> Result<String> {
        let times = self.times.evaluate(ctx.scope())?.as_u64().unwrap_or(0);
        let mut out = String::new();
        for _ in 0..times {
            out.push_str(&ctx.render_body(template, self.body).await?);
        }
        Ok(out)
    }

    fn bodies(&self) -> Vec<BodyId> {
        vec![self.body]
    }
}

struct RepeatFty;

impl TagFactory for RepeatFty {
    fn parse(&self, token: &Token, stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        Ok(Box::new(Repeat {
            times: Operand::parse(&token.args, token)?,
            body: stream.expect_end(token, "endrepeat")?,
        }))
    }
}

/// `{% lines %}` swallows the literal that follows it and renders its line count
#[derive(Debug)]
struct Lines(usize);

#[async_trait]
impl Tag for Lines {
    async fn render(&self, _ctx: &mut Context<'_>, _template: &Template) -> Result<String> {
        Ok(self.0.to_string())
    }
}

struct LinesFty;

impl TagFactory for LinesFty {
    fn parse(&self, _token: &Token, stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
        let literal = stream.peek().is_some_and(|next| next.kind == TokenKind::Literal);
        let count = if literal {
            stream.next_token().map(|next| next.value.lines().count()).unwrap_or(0)
        } else {
            0
        };
        Ok(Box::new(Lines(count)))
    }
}

fn engine() -> Engine {
    let mut engine = Engine::new(Options::default());
    engine.register_tag("repeat", RepeatFty).unwrap();
    engine.register_tag("lines", LinesFty).unwrap();
    engine
        .register_filter("wrap", |input: &Value, args: &[Value]| -> std::result::Result<Value, FilterError> {
            arity(args, 1, 1)?;
            let edge = args[0].as_str().ok_or_else(|| FilterError::Invalid("edge must be text".into()))?;
            Ok(json!(format!("{edge}{}{edge}", input.as_str().unwrap_or_default())))
        })
        .unwrap();
    engine
}

#[tokio::test]
async fn custom_tags_claim_their_body() {
    let out = engine()
        .parse_and_render(
            "{% repeat n %}{% if forloop %}never{% endif %}<{{ x }}>{% endrepeat %}!",
            &json!({"n": 3, "x": "y"}),
        )
        .await
        .unwrap();
    assert_eq!(out, "<y><y><y>!");
}

#[tokio::test]
async fn custom_tags_nest_with_builtins() {
    let out = engine()
        .parse_and_render(
            "{% for i in (1..2) %}{% repeat i %}{{ i }}{% endrepeat %};{% endfor %}",
            &json!({}),
        )
        .await
        .unwrap();
    assert_eq!(out, "1;22;");
}

#[tokio::test]
async fn tags_may_consume_following_tokens() {
    let out = engine()
        .parse_and_render("{% lines %}a\nb\nc{{ 'x' }}", &json!({}))
        .await
        .unwrap();
    assert_eq!(out, "3x");
}

#[tokio::test]
async fn custom_filters_report_failures() {
    let engine = engine();
    assert_eq!(
        engine.parse_and_render("{{ 'a' | wrap: '*' }}", &json!({})).await.unwrap(),
        "*a*"
    );
    match engine.parse_and_render("{{ 'a' | wrap: 1 }}", &json!({})).await {
        Err(Error::Filter { name, source }) => {
            assert_eq!(name, "wrap");
            assert_eq!(source, FilterError::Invalid("edge must be text".to_string()));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn unclosed_custom_tag_is_a_parse_error() {
    let err = engine().parse("{% repeat 2 %}x").unwrap_err();
    assert_eq!(err.to_string(), "tag {% repeat 2 %} not closed, line 1, col 1");
}

#[test]
fn names_are_registered_once() {
    let mut engine = engine();
    assert!(matches!(engine.register_tag("repeat", RepeatFty), Err(Error::Registration(_))));
    assert!(matches!(engine.register_tag("for", RepeatFty), Err(Error::Registration(_))));
    assert!(matches!(engine.register_tag("bad name", RepeatFty), Err(Error::Registration(_))));
}
