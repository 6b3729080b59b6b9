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

//! Filter implementation contract
//!
//! A filter is a named pure function `(input, args) -> value`, applied with pipe syntax in
//! outputs: `{{ name | append: "!" }}`. Any `Fn(&Value, &[Value]) -> Result<Value, FilterError>`
//! closure is a filter.
//!
//! With `strict_filters` an unknown name or a [`FilterError::Arity`] failure aborts the
//! render. Otherwise both are tolerated and the input passes through unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::FilterError;

pub trait Filter: Send + Sync {
    fn apply(&self, input: &Value, args: &[Value]) -> Result<Value, FilterError>;
}

impl<F> Filter for F
where
    F: Fn(&Value, &[Value]) -> Result<Value, FilterError> + Send + Sync,
{
    fn apply(&self, input: &Value, args: &[Value]) -> Result<Value, FilterError> {
        self(input, args)
    }
}

/// Map of filter names to implementations
pub type FilterMap = HashMap<String, Arc<dyn Filter>>;

/// Checks that a filter received between `min` and `max` arguments
pub fn arity(args: &[Value], min: usize, max: usize) -> Result<(), FilterError> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(FilterError::Arity {
            min,
            max,
            got: args.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn closures_are_filters() {
        let twice = |input: &Value, args: &[Value]| -> Result<Value, FilterError> {
            arity(args, 0, 0)?;
            Ok(json!(format!("{0}{0}", input.as_str().unwrap_or_default())))
        };
        let filter: Arc<dyn Filter> = Arc::new(twice);
        assert_eq!(filter.apply(&json!("ab"), &[]).unwrap(), json!("abab"));
        assert_eq!(
            filter.apply(&json!("ab"), &[json!(1)]),
            Err(FilterError::Arity { min: 0, max: 0, got: 1 })
        );
    }
}
