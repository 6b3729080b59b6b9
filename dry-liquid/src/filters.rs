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

//! Built-in filters

use std::sync::Arc;

use serde_json::{Number, Value};

use crate::error::FilterError;
use crate::filter::{FilterMap, arity};
use crate::value::{is_falsy, stringify};

type FilterResult = Result<Value, FilterError>;

/// Adds the built-in filters to a map
pub fn add_builtins(map: &mut FilterMap) {
    map.insert("append".to_string(), Arc::new(append));
    map.insert("prepend".to_string(), Arc::new(prepend));
    map.insert("upcase".to_string(), Arc::new(upcase));
    map.insert("downcase".to_string(), Arc::new(downcase));
    map.insert("capitalize".to_string(), Arc::new(capitalize));
    map.insert("strip".to_string(), Arc::new(strip));
    map.insert("size".to_string(), Arc::new(size));
    map.insert("default".to_string(), Arc::new(default));
    map.insert("join".to_string(), Arc::new(join));
    map.insert("first".to_string(), Arc::new(first));
    map.insert("last".to_string(), Arc::new(last));
    map.insert("plus".to_string(), Arc::new(plus));
    map.insert("minus".to_string(), Arc::new(minus));
    map.insert("times".to_string(), Arc::new(times));
}

fn append(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 1, 1)?;
    Ok(Value::String(stringify(input) + &stringify(&args[0])))
}

fn prepend(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 1, 1)?;
    Ok(Value::String(stringify(&args[0]) + &stringify(input)))
}

fn upcase(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 0, 0)?;
    Ok(Value::String(stringify(input).to_uppercase()))
}

fn downcase(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 0, 0)?;
    Ok(Value::String(stringify(input).to_lowercase()))
}

fn capitalize(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 0, 0)?;
    let text = stringify(input);
    let mut chars = text.chars();
    Ok(Value::String(match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }))
}

fn strip(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 0, 0)?;
    Ok(Value::String(stringify(input).trim().to_string()))
}

fn size(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 0, 0)?;
    Ok(Value::from(match input {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::String(s) => s.chars().count(),
        _ => 0,
    }))
}

/// Falls back to the argument for nil, false and the empty string
fn default(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 1, 1)?;
    if is_falsy(input) || input.as_str() == Some("") {
        Ok(args[0].clone())
    } else {
        Ok(input.clone())
    }
}

fn join(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 0, 1)?;
    let separator = args.first().map(stringify).unwrap_or_else(|| " ".to_string());
    match input {
        Value::Array(items) => Ok(Value::String(
            items.iter().map(stringify).collect::<Vec<_>>().join(&separator),
        )),
        other => Ok(other.clone()),
    }
}

fn first(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 0, 0)?;
    Ok(match input {
        Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
        Value::String(s) => s.chars().next().map(|c| Value::String(c.to_string())).unwrap_or(Value::Null),
        _ => Value::Null,
    })
}

fn last(input: &Value, args: &[Value]) -> FilterResult {
    arity(args, 0, 0)?;
    Ok(match input {
        Value::Array(items) => items.last().cloned().unwrap_or(Value::Null),
        Value::String(s) => s.chars().last().map(|c| Value::String(c.to_string())).unwrap_or(Value::Null),
        _ => Value::Null,
    })
}

fn number(value: &Value) -> Result<Number, FilterError> {
    let parsed = match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .map(Number::from)
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
        }
        Value::Null => Some(Number::from(0)),
        _ => None,
    };
    parsed.ok_or_else(|| FilterError::Invalid(format!("{} is not a number", value)))
}

/// Integer arithmetic when both sides are integers, float otherwise
fn arithmetic(
    input: &Value,
    args: &[Value],
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> FilterResult {
    arity(args, 1, 1)?;
    let (a, b) = (number(input)?, number(&args[0])?);
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(result) = int(x, y) {
            return Ok(Value::from(result));
        }
    }
    let result = float(a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
    Number::from_f64(result)
        .map(Value::Number)
        .ok_or_else(|| FilterError::Invalid(format!("{} is not a finite number", result)))
}

fn plus(input: &Value, args: &[Value]) -> FilterResult {
    arithmetic(input, args, i64::checked_add, |a, b| a + b)
}

fn minus(input: &Value, args: &[Value]) -> FilterResult {
    arithmetic(input, args, i64::checked_sub, |a, b| a - b)
}

fn times(input: &Value, args: &[Value]) -> FilterResult {
    arithmetic(input, args, i64::checked_mul, |a, b| a * b)
}
