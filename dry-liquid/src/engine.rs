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

//! The template engine
//!
//! An [`Engine`] owns the tag and filter registries, the loader and the template cache. It
//! is configured up front and then only read, so one engine can serve any number of
//! concurrent renders; every render gets its own [`Scope`].
//!
//! # Examples
//!
//! ```rust
//! use dry_liquid::{Engine, MemoryLoader, Options};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let loader = MemoryLoader::new()
//!     .with("layout.liquid", "<h1>{% block title %}Untitled{% endblock %}</h1>");
//! let engine = Engine::with_loader(Options::default(), loader);
//! let template = engine
//!     .parse("{% extends 'layout' %}{% block title %}{{ name | upcase }}{% endblock %}")
//!     .unwrap();
//! let html = engine.render(&template, &json!({"name": "tubby"})).await.unwrap();
//! assert_eq!(html, "<h1>TUBBY</h1>");
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::ast::Template;
use crate::config::Options;
use crate::error::{Error, Result};
use crate::expression::Output;
use crate::filter::{Filter, FilterMap};
use crate::inheritance::Resolver;
use crate::loader::{Loader, MemoryLoader};
use crate::render::Context;
use crate::scope::Scope;
use crate::tag::{TagFactory, TagMap};
use crate::tokenizer::{Position, Token, tokenize};
use crate::{filters, tags};

static NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").unwrap());

pub struct Engine {
    options: Options,
    tags: TagMap,
    filters: FilterMap,
    loader: Arc<dyn Loader>,
    cache: RwLock<HashMap<String, Arc<Template>>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Engine {
    /// Creates an engine with the built-in tags and filters and an empty [`MemoryLoader`]
    pub fn new(options: Options) -> Self {
        Self::with_loader(options, MemoryLoader::new())
    }

    pub fn with_loader(options: Options, loader: impl Loader + 'static) -> Self {
        let mut tags = TagMap::new();
        tags::add_builtins(&mut tags);
        let mut filters = FilterMap::new();
        filters::add_builtins(&mut filters);
        Self {
            options,
            tags,
            filters,
            loader: Arc::new(loader),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn loader(&self) -> &dyn Loader {
        self.loader.as_ref()
    }

    pub(crate) fn filter(&self, name: &str) -> Option<&Arc<dyn Filter>> {
        self.filters.get(name)
    }

    /// Registers a tag under `name`
    ///
    /// Fails when the name is not a word or is already taken.
    pub fn register_tag(&mut self, name: &str, factory: impl TagFactory + 'static) -> Result<()> {
        check_name("tag", name, self.tags.contains_key(name))?;
        self.tags.insert(name.to_string(), Arc::new(factory));
        debug!(tag = name, "registered tag");
        Ok(())
    }

    /// Registers a filter under `name`
    pub fn register_filter(&mut self, name: &str, filter: impl Filter + 'static) -> Result<()> {
        check_name("filter", name, self.filters.contains_key(name))?;
        self.filters.insert(name.to_string(), Arc::new(filter));
        debug!(filter = name, "registered filter");
        Ok(())
    }

    /// Parses template source, resolving any layout it extends
    pub fn parse(&self, source: &str) -> Result<Template> {
        self.resolve(source, None)
    }

    /// Parses template source known under `name`
    pub fn parse_named(&self, source: &str, name: &str) -> Result<Template> {
        self.resolve(source, Some(name))
    }

    fn resolve(&self, source: &str, name: Option<&str>) -> Result<Template> {
        debug!(template = name.unwrap_or("<inline>"), "parsing");
        let tokens = tokenize(source, &self.options)?;
        Resolver::new(&self.tags, self.loader.as_ref(), &self.options).resolve(tokens, name)
    }

    pub async fn render<T: Serialize + ?Sized>(&self, template: &Template, data: &T) -> Result<String> {
        self.render_with(template, data, &self.options).await
    }

    /// Renders with `options` in place of the engine's own
    ///
    /// `data` must serialize to an object, or to nil for an empty scope.
    pub async fn render_with<T: Serialize + ?Sized>(
        &self,
        template: &Template,
        data: &T,
        options: &Options,
    ) -> Result<String> {
        let data = match serde_json::to_value(data).map_err(|err| Error::Assertion(err.to_string()))? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(Error::Assertion(format!(
                    "render data must be an object, got {}",
                    other
                )));
            }
        };
        let mut scope = Scope::new(data, options);
        debug!("render start");
        let result = Context::new(self, &mut scope, options)
            .render_template(template)
            .await;
        match result {
            Ok(out) => {
                debug!(len = out.len(), "render finished");
                Ok(out)
            }
            Err(Error::RenderBreak(interrupt)) => {
                debug!(signal = %interrupt, "render ended by loop signal");
                Ok(interrupt.output)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn parse_and_render<T: Serialize + ?Sized>(&self, source: &str, data: &T) -> Result<String> {
        let template = self.parse(source)?;
        self.render(&template, data).await
    }

    /// Loads and parses the template `name`, memoized when `cache` is on
    pub async fn get_template(&self, name: &str) -> Result<Arc<Template>> {
        let name = self.options.resolve_name(name);
        if self.options.cache {
            if let Some(template) = self.cached(&name) {
                debug!(template = %name, "template cache hit");
                return Ok(template);
            }
            debug!(template = %name, "template cache miss");
        }
        let source = self.loader.load(&name).await?;
        let template = Arc::new(self.parse_named(&source, &name)?);
        if self.options.cache {
            self.cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(name, template.clone());
        }
        Ok(template)
    }

    fn cached(&self, name: &str) -> Option<Arc<Template>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub async fn render_file<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<String> {
        let template = self.get_template(name).await?;
        self.render(&template, data).await
    }

    /// Renders a bare output expression, such as `user.name | upcase`, against `scope`
    pub fn eval_output(&self, source: &str, scope: &mut Scope) -> Result<String> {
        let token = Token::literal(source.to_string(), source.to_string(), Position::default());
        let output = Output::parse(source, &token)?;
        Context::new(self, scope, &self.options).eval_output(&output)
    }
}

fn check_name(kind: &str, name: &str, taken: bool) -> Result<()> {
    if !NAME.is_match(name) {
        return Err(Error::Registration(format!("{} {:?}: invalid name", kind, name)));
    }
    if taken {
        return Err(Error::Registration(format!("{} {}: already registered", kind, name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::FilterError;

    #[test]
    fn registration_rejects_bad_and_taken_names() {
        let mut engine = Engine::default();
        let shout = |input: &Value, _: &[Value]| -> std::result::Result<Value, FilterError> {
            Ok(json!(format!("{}!", input.as_str().unwrap_or_default())))
        };
        assert!(engine.register_filter("shout", shout).is_ok());
        assert!(matches!(engine.register_filter("shout", shout), Err(Error::Registration(_))));
        assert!(matches!(engine.register_filter("upcase", shout), Err(Error::Registration(_))));
        assert!(matches!(engine.register_filter("", shout), Err(Error::Registration(_))));
        assert!(matches!(engine.register_filter("a b", shout), Err(Error::Registration(_))));
    }

    #[tokio::test]
    async fn registered_filters_are_used() {
        let mut engine = Engine::default();
        engine
            .register_filter("shout", |input: &Value, _: &[Value]| -> std::result::Result<Value, FilterError> {
                Ok(json!(format!("{}!", input.as_str().unwrap_or_default())))
            })
            .unwrap();
        let out = engine.parse_and_render("{{ 'hey' | shout }}", &json!({})).await.unwrap();
        assert_eq!(out, "hey!");
    }

    #[tokio::test]
    async fn render_data_must_be_an_object() {
        let engine = Engine::default();
        let template = engine.parse("x").unwrap();
        assert_eq!(engine.render(&template, &()).await.unwrap(), "x");
        assert!(matches!(
            engine.render(&template, &json!([1])).await,
            Err(Error::Assertion(_))
        ));
    }

    #[tokio::test]
    async fn render_with_overrides_strictness() {
        let engine = Engine::default();
        let template = engine.parse("{{ nobody }}").unwrap();
        assert_eq!(engine.render(&template, &json!({})).await.unwrap(), "");
        let strict = Options {
            strict_variables: true,
            ..Options::default()
        };
        assert!(matches!(
            engine.render_with(&template, &json!({}), &strict).await,
            Err(Error::Render { .. })
        ));
    }

    #[tokio::test]
    async fn cached_templates_are_shared() {
        let loader = MemoryLoader::new().with("page.liquid", "{{ n }}");
        let options = Options {
            cache: true,
            ..Options::default()
        };
        let engine = Engine::with_loader(options, loader);
        let first = engine.get_template("page").await.unwrap();
        let second = engine.get_template("page.liquid").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.render_file("page", &json!({"n": 3})).await.unwrap(), "3");
    }

    #[tokio::test]
    async fn uncached_templates_are_reparsed() {
        let loader = MemoryLoader::new().with("page.liquid", "p");
        let engine = Engine::with_loader(Options::default(), loader);
        let first = engine.get_template("page").await.unwrap();
        let second = engine.get_template("page").await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn eval_output_uses_an_existing_scope() {
        let engine = Engine::default();
        let options = Options::default();
        let mut scope = Scope::new(Map::new(), &options);
        scope.set("name", json!("tubby"));
        assert_eq!(engine.eval_output("name | capitalize", &mut scope).unwrap(), "Tubby");
        assert!(matches!(engine.eval_output("name |", &mut scope), Err(Error::Parse { .. })));
    }
}
