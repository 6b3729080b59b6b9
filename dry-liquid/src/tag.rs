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

//! Tag implementation contract
//!
//! A tag is registered under a name as a [`TagFactory`]. When the parser meets
//! `{% name args %}` it hands the token and the live [`TokenStream`] to the factory, which
//! reads its arguments, consumes as many following tokens as it needs (usually up to its
//! end tag) and returns the parsed [`Tag`] state. At render time the engine calls
//! [`Tag::render`], which may suspend on I/O, render nested bodies and read or write the
//! scope and registers.
//!
//! # Examples
//!
//! ```rust
//! use async_trait::async_trait;
//! use dry_liquid::{Context, Engine, Options, Result, Tag, TagFactory, Template, Token, TokenStream};
//!
//! #[derive(Debug)]
//! struct Shout(String);
//!
//! #[async_trait]
//! impl Tag for Shout {
//!     async fn render(&self, _ctx: &mut Context<'_>, _template: &Template) -> Result<String> {
//!         Ok(self.0.to_uppercase())
//!     }
//! }
//!
//! struct ShoutFty;
//!
//! impl TagFactory for ShoutFty {
//!     fn parse(&self, token: &Token, _stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>> {
//!         Ok(Box::new(Shout(token.args.clone())))
//!     }
//! }
//!
//! let mut engine = Engine::new(Options::default());
//! engine.register_tag("shout", ShoutFty).unwrap();
//! ```

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::ast::{BodyId, Template};
use crate::error::Result;
use crate::parser::TokenStream;
use crate::render::Context;
use crate::tokenizer::Token;

/// Parsed state of a tag, rendered once per render call
#[async_trait]
pub trait Tag: Debug + Send + Sync {
    /// Produces this tag's output
    ///
    /// `template` is the template the tag was parsed into; nested bodies are rendered with
    /// [`Context::render_body`].
    async fn render(&self, ctx: &mut Context<'_>, template: &Template) -> Result<String>;

    /// Name and body of an overridable layout region
    ///
    /// The inheritance resolver merges every node that answers here.
    fn block(&self) -> Option<(&str, BodyId)> {
        None
    }

    /// The layout this template extends
    fn layout(&self) -> Option<&str> {
        None
    }

    /// Nested bodies, in source order
    fn bodies(&self) -> Vec<BodyId> {
        Vec::new()
    }
}

/// Parses a tag occurrence into its [`Tag`] state
pub trait TagFactory: Send + Sync {
    fn parse(&self, token: &Token, stream: &mut TokenStream<'_>) -> Result<Box<dyn Tag>>;
}

/// Map of tag names to factories
pub type TagMap = HashMap<String, Arc<dyn TagFactory>>;
