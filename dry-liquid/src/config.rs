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

//! Engine configuration

use std::path::Path;

use serde::Deserialize;

/// Engine options
///
/// Deserializable so an application can keep them next to the rest of its configuration;
/// missing keys take their default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Memoize parsed templates fetched through [`Engine::get_template`](crate::Engine::get_template)
    pub cache: bool,
    /// Suffix appended to template names that have no extension
    pub extname: String,
    /// Trim whitespace before every tag, as if each were written `{%-`
    pub trim_left: bool,
    /// Trim whitespace after every tag, as if each were written `-%}`
    pub trim_right: bool,
    /// Trimming eats all adjacent whitespace; otherwise only blanks up to one newline
    pub greedy: bool,
    /// Fail the render on unknown filters or wrong filter arity
    pub strict_filters: bool,
    /// Fail the render on undefined variables
    pub strict_variables: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cache: false,
            extname: ".liquid".to_string(),
            trim_left: false,
            trim_right: false,
            greedy: true,
            strict_filters: false,
            strict_variables: false,
        }
    }
}

impl Options {
    /// Appends `extname` to a template name without an extension
    pub fn resolve_name(&self, name: &str) -> String {
        if Path::new(name).extension().is_some() {
            name.to_string()
        } else {
            format!("{}{}", name, self.extname)
        }
    }
}
