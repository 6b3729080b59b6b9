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

//! Value semantics shared by outputs, conditions and filters
//!
//! Template data is plain [`serde_json::Value`]. Liquid truthiness differs from most
//! languages: only `false` and nil are falsy, so `0` and `""` are truthy.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::Value;

/// Liquid truthiness: everything except `false` and nil
pub fn is_truthy(value: &Value) -> bool {
    !is_falsy(value)
}

pub fn is_falsy(value: &Value) -> bool {
    matches!(value, Value::Null | Value::Bool(false))
}

/// Renders a value the way an output tag prints it
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Reads `key` from a value, including the `size`, `first` and `last` helpers
pub fn property<'v>(value: &'v Value, key: &str) -> Option<Cow<'v, Value>> {
    match value {
        Value::Object(map) => map.get(key).map(Cow::Borrowed).or_else(|| match key {
            "size" => Some(Cow::Owned(Value::from(map.len()))),
            _ => None,
        }),
        Value::Array(items) => match key {
            "size" => Some(Cow::Owned(Value::from(items.len()))),
            "first" => items.first().map(Cow::Borrowed),
            "last" => items.last().map(Cow::Borrowed),
            _ => key.parse::<usize>().ok().and_then(|i| items.get(i)).map(Cow::Borrowed),
        },
        Value::String(s) if key == "size" => Some(Cow::Owned(Value::from(s.chars().count()))),
        _ => None,
    }
}

/// Reads `value[index]`; negative array indexes count from the end
pub fn index<'v>(value: &'v Value, index: &Value) -> Option<Cow<'v, Value>> {
    match (value, index) {
        (Value::Array(items), Value::Number(n)) => {
            let i = n.as_i64()?;
            let i = if i < 0 { items.len() as i64 + i } else { i };
            usize::try_from(i).ok().and_then(|i| items.get(i)).map(Cow::Borrowed)
        }
        (_, Value::String(key)) => property(value, key),
        _ => None,
    }
}

/// Equality with numbers compared by value, so `1 == 1.0`
pub fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| equals(a, b))
        }
        _ => left == right,
    }
}

/// Ordering for `<`, `>`, `<=`, `>=`; only numbers and strings are comparable
pub fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// The `contains` operator
pub fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::String(s) => s.contains(stringify(needle).as_str()),
        Value::Array(items) => items.iter().any(|item| equals(item, needle)),
        Value::Object(map) => map.contains_key(stringify(needle).as_str()),
        _ => false,
    }
}

/// Collects a value into loop items; objects iterate as `[key, value]` pairs
pub fn to_items(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| Value::Array(vec![Value::from(k.as_str()), v.clone()]))
            .collect(),
        Value::Null | Value::Bool(false) => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        other => vec![other.clone()],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn zero_and_empty_string_are_truthy() {
        assert!(is_truthy(&json!(0)));
        assert!(is_truthy(&json!("")));
        assert!(is_truthy(&json!([])));
        assert!(is_falsy(&json!(false)));
        assert!(is_falsy(&Value::Null));
    }

    #[test]
    fn stringify_matches_output_rules() {
        assert_eq!(stringify(&Value::Null), "");
        assert_eq!(stringify(&json!(3)), "3");
        assert_eq!(stringify(&json!(2.5)), "2.5");
        assert_eq!(stringify(&json!(["a", 1, null])), "a,1,");
        assert_eq!(stringify(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn special_properties() {
        let list = json!(["x", "y", "z"]);
        let get = |value: &Value, key: &str| property(value, key).map(Cow::into_owned);
        assert_eq!(get(&list, "size"), Some(json!(3)));
        assert_eq!(get(&list, "first"), Some(json!("x")));
        assert_eq!(get(&list, "last"), Some(json!("z")));
        assert_eq!(get(&list, "1"), Some(json!("y")));
        assert_eq!(get(&json!("héllo"), "size"), Some(json!(5)));
        assert_eq!(get(&json!({"size": "big"}), "size"), Some(json!("big")));
    }

    #[test]
    fn negative_index_counts_from_end() {
        let list = json!([1, 2, 3]);
        assert_eq!(index(&list, &json!(-1)).as_deref(), Some(&json!(3)));
        assert_eq!(index(&list, &json!(5)), None);
    }

    #[test]
    fn comparisons() {
        assert!(equals(&json!(1), &json!(1.0)));
        assert_eq!(compare(&json!(2), &json!(10)), Some(Ordering::Less));
        assert_eq!(compare(&json!("b"), &json!("a")), Some(Ordering::Greater));
        assert_eq!(compare(&json!("1"), &json!(1)), None);
        assert!(contains(&json!("liquid"), &json!("qui")));
        assert!(contains(&json!([1, 2]), &json!(2.0)));
        assert!(!contains(&json!(5), &json!(5)));
    }
}
