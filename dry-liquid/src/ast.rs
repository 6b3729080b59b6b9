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

//! Parsed template storage
//!
//! Nodes live in an [`Arena`] and refer to each other through [`NodeId`] and [`BodyId`]
//! handles. A tag that owns a nested sequence of nodes (a `block`, an `if` branch, a loop
//! body) keeps a [`BodyId`]; the inheritance resolver merges layouts by replacing the node
//! list behind a handle, so several levels can share the same child nodes without aliasing.
//!
//! Once a [`Template`] is built it is only read: rendering takes `&Template`, which makes a
//! parsed template safe to cache and render from several tasks at once.

use crate::expression::Output;
use crate::tag::Tag;
use crate::tokenizer::Token;

/// Handle to a node in an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Handle to a node sequence in an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(usize);

/// A tag node: the tag name plus the state its implementation parsed
#[derive(Debug)]
pub struct TagNode {
    pub name: String,
    pub tag: Box<dyn Tag>,
}

#[derive(Debug)]
pub enum NodeKind {
    Literal(String),
    Output(Output),
    Tag(TagNode),
}

/// An AST element and the token it was parsed from
#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub token: Token,
}

impl Node {
    pub fn as_tag(&self) -> Option<&TagNode> {
        match &self.kind {
            NodeKind::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    /// The name and body of a `block` node
    pub fn block(&self) -> Option<(&str, BodyId)> {
        self.as_tag().and_then(|tag| tag.tag.block())
    }

    pub(crate) fn is_block_super(&self) -> bool {
        matches!(&self.kind, NodeKind::Output(output) if output.is_block_super())
    }
}

/// Node storage for one or more parsed templates
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
    bodies: Vec<Vec<NodeId>>,
}

impl Arena {
    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn alloc_body(&mut self, nodes: Vec<NodeId>) -> BodyId {
        self.bodies.push(nodes);
        BodyId(self.bodies.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn body(&self, id: BodyId) -> &[NodeId] {
        &self.bodies[id.0]
    }

    pub(crate) fn body_mut(&mut self, id: BodyId) -> &mut Vec<NodeId> {
        &mut self.bodies[id.0]
    }
}

/// A fully parsed, inheritance-resolved template
#[derive(Debug)]
pub struct Template {
    arena: Arena,
    root: BodyId,
}

impl Template {
    pub(crate) fn new(arena: Arena, root: BodyId) -> Self {
        Self { arena, root }
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn root(&self) -> BodyId {
        self.root
    }

    /// Top-level nodes in source order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.arena.body(self.root).iter().map(|&id| self.arena.node(id))
    }

    /// Indented one-line-per-node listing of the reachable tree, for tests and debugging
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.outline_body(self.root, 0, &mut out);
        out
    }

    fn outline_body(&self, body: BodyId, depth: usize, out: &mut String) {
        for &id in self.arena.body(body) {
            let node = self.arena.node(id);
            out.push_str(&"  ".repeat(depth));
            match &node.kind {
                NodeKind::Literal(text) => out.push_str(&format!("{:?}\n", text)),
                NodeKind::Output(output) => out.push_str(&format!("{{{{{}}}}}\n", output.source)),
                NodeKind::Tag(tag) => {
                    out.push_str(&format!("{{% {} %}}\n", node.token.value));
                    for child in tag.tag.bodies() {
                        self.outline_body(child, depth + 1, out);
                    }
                }
            }
        }
    }
}
