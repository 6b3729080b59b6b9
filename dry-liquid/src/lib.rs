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

//! Liquid template engine
//!
//! This crate parses Liquid templates into a shared, immutable tree and renders them
//! asynchronously against JSON data.
//!
//! # Features
//!
//! - Literal text, `{{ output | filter: arg }}` and `{% tag args %}` syntax
//! - Whitespace control with `{%-`, `-%}`, `{{-` and `-}}`
//! - Layout inheritance with `extends`, `block` and `{{ block.super }}`
//! - Pluggable tags and filters registered by name
//! - Tags that suspend on I/O while rendering stays strictly in source order
//!
//! # Example
//!
//! ```rust
//! use dry_liquid::{Engine, Options};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = Engine::new(Options::default());
//! let template = engine
//!     .parse("{% for p in people %}{{ p.name | capitalize }}{% unless forloop.last %}, {% endunless %}{% endfor %}")
//!     .unwrap();
//! let out = engine
//!     .render(&template, &json!({"people": [{"name": "king"}, {"name": "tubby"}]}))
//!     .await
//!     .unwrap();
//! assert_eq!(out, "King, Tubby");
//! # }
//! ```
//!
//! # Module Structure
//!
//! - `tokenizer.rs`: Splitting source into literal, output and tag tokens
//! - `expression.rs`: Output and condition expressions
//! - `parser.rs`: Token stream and parser
//! - `inheritance.rs`: Layout chain resolution and block merging
//! - `render.rs`: Sequential rendering
//! - `engine.rs`: Registries, loading, caching and the public entry points
//! - `tags/`, `filters.rs`: Built-in tags and filters

mod ast;
mod config;
mod engine;
mod error;
mod expression;
mod filter;
mod filters;
mod inheritance;
mod loader;
mod parser;
mod render;
mod scope;
mod tag;
mod tags;
mod tokenizer;
mod value;

pub use ast::{Arena, BodyId, Node, NodeId, NodeKind, TagNode, Template};
pub use config::Options;
pub use engine::Engine;
pub use error::{Error, FilterError, Interrupt, LoopControl, Result};
pub use expression::{Comparison, Condition, FilterCall, Operand, Output, Segment, eval_exp, eval_value};
pub use filter::{Filter, FilterMap, arity};
pub use inheritance::Resolver;
pub use loader::{Loader, MemoryLoader};
pub use parser::{Parser, TokenStream};
pub use render::Context;
pub use scope::{Registers, Scope};
pub use tag::{Tag, TagFactory, TagMap};
pub use tokenizer::{Position, Token, TokenKind, tokenize};
pub use value::{is_falsy, is_truthy, stringify};
