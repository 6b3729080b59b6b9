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

//! Variable scope and render registers
//!
//! A [`Scope`] is created for one render call and dropped when it finishes. Variable lookup
//! walks the frame chain innermost-first. The [`Registers`] namespace sits beside the chain
//! and holds engine bookkeeping that templates cannot read, such as the rendered content of
//! each `block`.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::config::Options;

/// Render-scoped engine state outside the variable chain
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Registers {
    entries: HashMap<String, Value>,
}

impl Registers {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Returns the object stored at `key`, creating it when absent or not an object
    pub fn object_mut(&mut self, key: &str) -> &mut Map<String, Value> {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => map,
            _ => unreachable!("register {key} was just made an object"),
        }
    }
}

/// Chained variable frames plus registers
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    frames: Vec<Map<String, Value>>,
    registers: Registers,
    strict_variables: bool,
}

impl Scope {
    /// Creates a scope whose root frame is `data`
    pub fn new(data: Map<String, Value>, options: &Options) -> Self {
        Self {
            frames: vec![data],
            registers: Registers::default(),
            strict_variables: options.strict_variables,
        }
    }

    /// Looks `name` up, innermost frame first
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Binds `name` in the innermost frame
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }

    /// Binds `name` in the root frame so it outlives every pushed frame
    pub fn set_root(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.first_mut() {
            frame.insert(name.into(), value);
        }
    }

    pub fn push(&mut self, frame: Map<String, Value>) {
        self.frames.push(frame);
    }

    /// Removes the innermost frame; the root frame is never removed
    pub fn pop(&mut self) -> Option<Map<String, Value>> {
        if self.frames.len() > 1 {
            self.frames.pop()
        } else {
            None
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn strict_variables(&self) -> bool {
        self.strict_variables
    }
}
