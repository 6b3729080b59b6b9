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

//! Sequential rendering
//!
//! A [`Context`] carries everything one render call needs: the engine for filters and
//! partials, the render's private [`Scope`] and the effective options. Bodies are rendered
//! node by node; a node is started only once the previous one has finished, including any
//! suspension inside a tag, so later nodes always see the scope and registers left by
//! earlier ones.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::warn;

use crate::ast::{BodyId, NodeKind, Template};
use crate::config::Options;
use crate::engine::Engine;
use crate::error::{Error, FilterError, Result};
use crate::expression::Output;
use crate::scope::Scope;
use crate::value::stringify;

/// State of one render call
pub struct Context<'a> {
    engine: &'a Engine,
    scope: &'a mut Scope,
    options: &'a Options,
}

impl<'a> Context<'a> {
    pub fn new(engine: &'a Engine, scope: &'a mut Scope, options: &'a Options) -> Self {
        Self {
            engine,
            scope,
            options,
        }
    }

    pub fn engine(&self) -> &'a Engine {
        self.engine
    }

    pub fn scope(&self) -> &Scope {
        &*self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut *self.scope
    }

    pub fn options(&self) -> &Options {
        self.options
    }

    /// Renders the top-level nodes of `template`
    pub fn render_template<'c>(&'c mut self, template: &'c Template) -> BoxFuture<'c, Result<String>> {
        self.render_body(template, template.root())
    }

    /// Renders the nodes of `body` in order and concatenates their output
    ///
    /// A `break` or `continue` signal passes through with the output rendered so far
    /// prepended, so the loop that catches it can keep it.
    pub fn render_body<'c>(
        &'c mut self,
        template: &'c Template,
        body: BodyId,
    ) -> BoxFuture<'c, Result<String>> {
        async move {
            let arena = template.arena();
            let mut out = String::new();
            for &id in arena.body(body) {
                let node = arena.node(id);
                let chunk = match &node.kind {
                    NodeKind::Literal(text) => Ok(text.clone()),
                    NodeKind::Output(output) => self.eval_output(output),
                    NodeKind::Tag(tag) => tag.tag.render(self, template).await,
                };
                match chunk {
                    Ok(chunk) => out.push_str(&chunk),
                    Err(Error::RenderBreak(mut interrupt)) => {
                        interrupt.output.insert_str(0, &out);
                        return Err(Error::RenderBreak(interrupt));
                    }
                    Err(err) => return Err(err.at(&node.token)),
                }
            }
            Ok(out)
        }
        .boxed()
    }

    /// Evaluates an output expression and its filters to a value
    pub fn evaluate(&self, output: &Output) -> Result<Value> {
        let mut value = output.operand.evaluate(self.scope())?;
        for call in &output.filters {
            let args = call
                .args
                .iter()
                .map(|arg| arg.evaluate(self.scope()))
                .collect::<Result<Vec<_>>>()?;
            value = self.apply_filter(&call.name, value, &args)?;
        }
        Ok(value)
    }

    /// Evaluates an output expression to text
    pub fn eval_output(&self, output: &Output) -> Result<String> {
        self.evaluate(output).map(|value| stringify(&value))
    }

    fn apply_filter(&self, name: &str, input: Value, args: &[Value]) -> Result<Value> {
        let strict = self.options.strict_filters;
        let Some(filter) = self.engine.filter(name) else {
            if strict {
                return Err(Error::Filter {
                    name: name.to_string(),
                    source: FilterError::Unknown,
                });
            }
            warn!(filter = name, "undefined filter, input passed through");
            return Ok(input);
        };
        match filter.apply(&input, args) {
            Ok(value) => Ok(value),
            Err(FilterError::Arity { min, max, got }) if !strict => {
                warn!(filter = name, min, max, got, "wrong filter arity, input passed through");
                Ok(input)
            }
            Err(source) => Err(Error::Filter {
                name: name.to_string(),
                source,
            }),
        }
    }
}
