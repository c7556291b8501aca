//! Lazy flattening of nested JSON into dot-joined leaf keys.
//!
//! Objects contribute their keys and arrays their indices, so
//! `{"a": {"x": 3}, "b": [true]}` yields `a.x → 3` and `b.0 → true`. Empty
//! objects and arrays yield nothing at all; the branch simply disappears.

use serde_json::{Value, map};

enum Level<'a> {
  Object(map::Iter<'a>),
  Array(std::iter::Enumerate<std::slice::Iter<'a, Value>>),
}

/// Depth-first iterator over the leaves of a JSON value.
pub struct Flatten<'a> {
  scalar: Option<(String, &'a Value)>,
  stack:  Vec<(String, Level<'a>)>,
}

/// Flatten `value` with no prefix. A scalar root yields a single leaf with an
/// empty key.
pub fn flatten(value: &Value) -> Flatten<'_> { flatten_under(String::new(), value) }

/// Flatten `value` as though it sat under `prefix`.
pub fn flatten_under(prefix: String, value: &Value) -> Flatten<'_> {
  let mut it = Flatten { scalar: None, stack: Vec::new() };
  match value {
    Value::Object(map) => it.stack.push((prefix, Level::Object(map.iter()))),
    Value::Array(items) => {
      it.stack.push((prefix, Level::Array(items.iter().enumerate())))
    }
    leaf => it.scalar = Some((prefix, leaf)),
  }
  it
}

impl<'a> Iterator for Flatten<'a> {
  type Item = (String, &'a Value);

  fn next(&mut self) -> Option<Self::Item> {
    if let Some(leaf) = self.scalar.take() {
      return Some(leaf);
    }

    loop {
      let (prefix, level) = self.stack.last_mut()?;
      let next = match level {
        Level::Object(it) => it.next().map(|(k, v)| (k.clone(), v)),
        Level::Array(it) => it.next().map(|(i, v)| (i.to_string(), v)),
      };
      let Some((key, child)) = next else {
        self.stack.pop();
        continue;
      };

      let path = if prefix.is_empty() {
        key
      } else {
        format!("{prefix}.{key}")
      };

      match child {
        Value::Object(map) => self.stack.push((path, Level::Object(map.iter()))),
        Value::Array(items) => {
          self.stack.push((path, Level::Array(items.iter().enumerate())))
        }
        leaf => return Some((path, leaf)),
      }
    }
  }
}
