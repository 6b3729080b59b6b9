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

//! Template source lookup
//!
//! Layout resolution runs while a template is parsed and uses [`Loader::load_sync`]; loading a
//! top-level template or an included partial at render time goes through [`Loader::load`],
//! which an implementation backed by asynchronous I/O can override.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Source of template text by name
#[async_trait]
pub trait Loader: Send + Sync {
    /// Returns the source of `name`, or [`Error::NotFound`]
    fn load_sync(&self, name: &str) -> Result<String>;

    async fn load(&self, name: &str) -> Result<String> {
        self.load_sync(name)
    }
}

/// Loader over sources kept in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    sources: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(name.into(), source.into());
    }

    /// Builder form of [`MemoryLoader::insert`]
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(name, source);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryLoader {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            sources: iter
                .into_iter()
                .map(|(name, source)| (name.into(), source.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl Loader for MemoryLoader {
    fn load_sync(&self, name: &str) -> Result<String> {
        self.sources.get(name).cloned().ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sync_and_async_paths_agree() {
        let loader: MemoryLoader = [("a.liquid", "A")].into_iter().collect();
        assert_eq!(loader.load_sync("a.liquid").unwrap(), "A");
        assert_eq!(loader.load("a.liquid").await.unwrap(), "A");
        assert!(matches!(loader.load("b.liquid").await, Err(Error::NotFound { .. })));
    }
}
