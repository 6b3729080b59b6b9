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

//! Error handling for the Liquid engine
//!
//! Every stage of the pipeline reports through the single [`Error`] type. Tokenization and
//! parse failures are raised synchronously by [`Engine::parse`](crate::Engine::parse) and never
//! produce a partial template; render failures abort the whole render.
//!
//! [`Error::RenderBreak`] is not a failure: it is the signal a `break` or `continue` tag raises
//! so that the nearest enclosing loop can stop or skip an iteration. It carries the output
//! rendered before the signal so that the loop can keep it.

use std::fmt::{self, Display};

use thiserror::Error;

use crate::tokenizer::{Position, Token};

/// Returns the last 32 characters of a string for error context
pub(crate) fn rcap(src: &str) -> &str {
    const CAP_AT: usize = 32;

    match src.char_indices().rev().nth(CAP_AT - 1) {
        Some((start, _)) => &src[start..],
        None => src,
    }
}

fn located(position: &Option<Position>) -> String {
    match position {
        Some(position) => format!(", {}", position),
        None => String::new(),
    }
}

/// Which loop construct raised an [`Interrupt`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Break,
    Continue,
}

/// Control-flow signal raised by `break` and `continue`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interrupt {
    pub control: LoopControl,
    /// Output rendered by the interrupted sequence before the signal
    pub output: String,
}

impl Interrupt {
    pub fn new(control: LoopControl) -> Self {
        Self {
            control,
            output: String::new(),
        }
    }
}

impl Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.control {
            LoopControl::Break => "break",
            LoopControl::Continue => "continue",
        })
    }
}

/// Failure reported by a filter implementation
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("undefined filter")]
    Unknown,
    #[error("expected {min}..={max} arguments, got {got}")]
    Arity { min: usize, max: usize, got: usize },
    #[error("{0}")]
    Invalid(String),
}

/// Error type for the whole template pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed delimiter syntax
    #[error("{message}, {position}")]
    Tokenization { message: String, position: Position },

    /// Grammar violation: unknown tag, unclosed tag body, misplaced `extends`, bad arguments
    #[error("{message}{}", located(.position))]
    Parse {
        message: String,
        position: Option<Position>,
    },

    /// Failure while evaluating a node
    #[error("{message}{}", located(.position))]
    Render {
        message: String,
        position: Option<Position>,
    },

    /// Loop control signal; caught by the enclosing `for`
    #[error("{0} used outside of a loop")]
    RenderBreak(Interrupt),

    /// Internal precondition violation or malformed integration input
    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("template {name} not found")]
    NotFound { name: String },

    #[error("filter {name}: {source}")]
    Filter {
        name: String,
        #[source]
        source: FilterError,
    },

    #[error("cannot register {0}")]
    Registration(String),
}

impl Error {
    pub fn tokenization(message: impl Into<String>, position: Position) -> Self {
        Self::Tokenization {
            message: message.into(),
            position,
        }
    }

    /// Creates a parse error with context from a token
    pub fn parse(message: impl Display, token: &Token) -> Self {
        Self::Parse {
            message: format!("{} near \"{}\"", message, rcap(&token.raw)),
            position: Some(token.position),
        }
    }

    /// Creates an error for a tag whose body never reaches its end tag
    pub fn unclosed(token: &Token) -> Self {
        Self::Parse {
            message: format!("tag {} not closed", token.raw),
            position: Some(token.position),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            position: None,
        }
    }

    /// Attaches the position of `token` to an error that does not carry one yet
    pub(crate) fn at(self, token: &Token) -> Self {
        match self {
            Self::Render {
                message,
                position: None,
            } => Self::Render {
                message,
                position: Some(token.position),
            },
            Self::Parse {
                message,
                position: None,
            } => Self::Parse {
                message,
                position: Some(token.position),
            },
            other => other,
        }
    }
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, Error>;
