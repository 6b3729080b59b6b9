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

//! Built-in tags
//!
//! Every built-in goes through the same [`TagFactory`](crate::TagFactory) contract as a tag
//! registered by an application:
//! - `extends`, `block` for layout inheritance
//! - `assign`, `capture` for variables
//! - `if`/`elsif`/`else`, `unless` for conditions
//! - `for`, `break`, `continue` for iteration
//! - `raw`, `comment` for unparsed text
//! - `include` for partials

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::expression::{Cursor, Operand};
use crate::tag::TagMap;
use crate::tokenizer::Token;

mod conditional;
mod include;
mod inheritance;
mod iteration;
mod text;
mod variable;

static TEMPLATE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w./-]+$").unwrap());
static VARIABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][\w-]*$").unwrap());

/// Adds the built-in tags to a map
pub fn add_builtins(map: &mut TagMap) {
    map.insert("extends".to_string(), Arc::new(inheritance::ExtendsFty));
    map.insert("block".to_string(), Arc::new(inheritance::BlockFty));
    map.insert("assign".to_string(), Arc::new(variable::AssignFty));
    map.insert("capture".to_string(), Arc::new(variable::CaptureFty));
    map.insert("if".to_string(), Arc::new(conditional::IfFty));
    map.insert("unless".to_string(), Arc::new(conditional::UnlessFty));
    map.insert("for".to_string(), Arc::new(iteration::ForFty));
    map.insert("break".to_string(), Arc::new(iteration::BreakFty));
    map.insert("continue".to_string(), Arc::new(iteration::ContinueFty));
    map.insert("raw".to_string(), Arc::new(text::RawFty));
    map.insert("comment".to_string(), Arc::new(text::CommentFty));
    map.insert("include".to_string(), Arc::new(include::IncludeFty));
}

/// Maps an expression syntax message onto a parse error at `token`
fn syntax(token: &Token) -> impl FnOnce(String) -> Error + '_ {
    move |message| Error::parse(message, token)
}

/// Opens a cursor over the tag's arguments
fn cursor(token: &Token) -> Result<Cursor> {
    Cursor::new(&token.args).map_err(syntax(token))
}

/// Reads a template name given as a quoted string or a bare word
fn template_name(token: &Token) -> Result<String> {
    let args = token.args.trim();
    match args.parse::<Operand>() {
        Ok(Operand::Literal(Value::String(name))) if !name.is_empty() => Ok(name),
        _ if TEMPLATE_NAME.is_match(args) => Ok(args.to_string()),
        _ => Err(Error::parse(format!("illegal template name {:?}", args), token)),
    }
}

/// Reads a variable name, quoted or not
fn variable_name(src: &str, token: &Token) -> Result<String> {
    let name = src.trim().trim_matches(|c| c == '"' || c == '\'');
    if VARIABLE.is_match(name) {
        Ok(name.to_string())
    } else {
        Err(Error::parse(format!("illegal name {:?}", src.trim()), token))
    }
}
