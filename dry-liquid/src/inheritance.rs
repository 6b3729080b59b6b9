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

//! Layout inheritance
//!
//! A template that starts with `{% extends 'layout' %}` is rendered through its layout. The
//! resolver follows the `extends` chain through the loader, parses every level into one
//! shared [`Arena`] and merges the `block` nodes so that the root layout's tree holds the
//! final content of every block.
//!
//! Levels are merged leaf first with one name to body map shared by the whole pass. The
//! first body seen for a name, the most derived one, is canonical. When an ancestor level
//! has a block of the same name, its children replace a `{{ block.super }}` marker in the
//! canonical body, and the ancestor's body is then overwritten with the canonical one. The
//! root layout is returned, its block bodies already holding the merged content.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::ast::{Arena, BodyId, Template};
use crate::config::Options;
use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::parser::{Parser, TokenStream};
use crate::tag::TagMap;
use crate::tokenizer::{Token, tokenize};

/// Resolves `extends` chains into a single template
pub struct Resolver<'a> {
    tags: &'a TagMap,
    loader: &'a dyn Loader,
    options: &'a Options,
}

impl<'a> Resolver<'a> {
    pub fn new(tags: &'a TagMap, loader: &'a dyn Loader, options: &'a Options) -> Self {
        Self {
            tags,
            loader,
            options,
        }
    }

    /// Parses the leaf `tokens` and every layout they extend into one merged template
    ///
    /// `name` is the leaf's own template name, when it has one; a layout chain that leads
    /// back to it is rejected.
    pub fn resolve(&self, tokens: Vec<Token>, name: Option<&str>) -> Result<Template> {
        let mut seen: HashSet<String> = name
            .map(|name| self.options.resolve_name(name))
            .into_iter()
            .collect();
        let (mut layout, tokens) = self.take_extends(tokens)?;
        let mut chain = vec![tokens];
        while let Some(parent) = layout.take() {
            let resolved = self.options.resolve_name(&parent);
            if !seen.insert(resolved.clone()) {
                return Err(Error::Parse {
                    message: format!("circular extends of {}", resolved),
                    position: None,
                });
            }
            let source = self.loader.load_sync(&resolved)?;
            debug!(layout = %resolved, depth = chain.len(), "loaded layout");
            let (next, tokens) = self.take_extends(tokenize(&source, self.options)?)?;
            chain.push(tokens);
            layout = next;
        }

        let mut arena = Arena::default();
        let parser = Parser::new(self.tags);
        let roots = chain
            .into_iter()
            .map(|tokens| {
                let root = parser.parse(tokens, &mut arena)?;
                check_duplicates(&arena, root)?;
                Ok(root)
            })
            .collect::<Result<Vec<_>>>()?;

        if roots.len() > 1 {
            let mut canonical = HashMap::new();
            for &root in &roots {
                merge(&mut arena, root, &mut canonical);
            }
            debug!(levels = roots.len(), blocks = canonical.len(), "merged layout chain");
        }
        let root = roots
            .last()
            .copied()
            .ok_or_else(|| Error::Assertion("empty layout chain".to_string()))?;
        Ok(Template::new(arena, root))
    }

    /// Removes a leading `extends` tag and returns the layout it names
    fn take_extends(&self, mut tokens: Vec<Token>) -> Result<(Option<String>, Vec<Token>)> {
        check_extends(&tokens)?;
        if !tokens.first().is_some_and(|token| token.is_tag("extends")) {
            return Ok((None, tokens));
        }
        let token = tokens.remove(0);
        let mut scratch = Arena::default();
        let id = TokenStream::new(self.tags, Vec::new(), &mut scratch).parse_token(token)?;
        let layout = scratch
            .node(id)
            .as_tag()
            .and_then(|tag| tag.tag.layout())
            .map(str::to_string)
            .ok_or_else(|| Error::Assertion("extends tag names no layout".to_string()))?;
        Ok((Some(layout), tokens))
    }
}

/// Fails on any `extends` that is not the very first token
fn check_extends(tokens: &[Token]) -> Result<()> {
    let mut skipping = None;
    for (i, token) in tokens.iter().enumerate() {
        match skipping {
            Some(end) => {
                if token.is_tag(end) {
                    skipping = None;
                }
            }
            None if token.is_tag("raw") => skipping = Some("endraw"),
            None if token.is_tag("comment") => skipping = Some("endcomment"),
            None if i > 0 && token.is_tag("extends") => {
                return Err(Error::parse(
                    "tag extends must be the first token of a template",
                    token,
                ));
            }
            None => {}
        }
    }
    Ok(())
}

/// Rejects a block name used twice within one template
fn check_duplicates(arena: &Arena, root: BodyId) -> Result<()> {
    let mut names = HashSet::new();
    let mut pending = vec![root];
    while let Some(body) = pending.pop() {
        for &id in arena.body(body) {
            let node = arena.node(id);
            if let Some((name, _)) = node.block() {
                if !names.insert(name) {
                    return Err(Error::parse(format!("block {} defined twice", name), &node.token));
                }
            }
            if let Some(tag) = node.as_tag() {
                pending.extend(tag.tag.bodies());
            }
        }
    }
    Ok(())
}

fn merge(arena: &mut Arena, body: BodyId, canonical: &mut HashMap<String, BodyId>) {
    for id in arena.body(body).to_vec() {
        let node = arena.node(id);
        let Some((name, own)) = node.block().map(|(name, own)| (name.to_string(), own)) else {
            let children = node.as_tag().map(|tag| tag.tag.bodies()).unwrap_or_default();
            for child in children {
                merge(arena, child, canonical);
            }
            continue;
        };
        match canonical.get(&name).copied() {
            None => {
                canonical.insert(name, own);
            }
            Some(target) if target == own => {}
            // reached again through an ancestor body that was already overwritten
            Some(target) if arena.body(own) == arena.body(target) => {}
            Some(target) => {
                let parent = arena.body(own).to_vec();
                if let Some(at) = arena
                    .body(target)
                    .iter()
                    .position(|&id| arena.node(id).is_block_super())
                {
                    arena.body_mut(target).splice(at..=at, parent);
                }
                let merged = arena.body(target).to_vec();
                *arena.body_mut(own) = merged;
                trace!(block = %name, "merged block into ancestor");
            }
        }
        merge(arena, own, canonical);
    }
}
