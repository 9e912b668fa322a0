//! Depth-bounded parsing of raw expression JSON.
//!
//! `serde_json`'s own recursion limit is switched off; nesting is bounded by
//! the decoder's `max_depth` instead. Arrays in argument position count as
//! expression levels, exactly as the tree builder counts them. Containers
//! anywhere else (inside objects, or in the operator slot) are opaque data
//! and get their own budget of `max_depth` levels.
//!
//! A too-deep input is rejected while parsing, before any node is validated.

use crate::error::{ExprError, Result};
use serde::de::{self, DeserializeSeed, Deserializer, Error as _, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::fmt;

/// Parses `bytes` into a JSON value whose nesting stays within `max_depth`.
pub(crate) fn parse(bytes: &[u8], max_depth: usize) -> Result<Value> {
    let guard = Guard {
        max_depth,
        exceeded: Cell::new(false),
        path: RefCell::new(Vec::new()),
    };
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let parsed = Node {
        guard: &guard,
        slot: Slot::Argument(1),
    }
    .deserialize(&mut de)
    .and_then(|value| de.end().map(|()| value));

    match parsed {
        Ok(value) => Ok(value),
        Err(_) if guard.exceeded.get() => {
            // Breadcrumbs were collected innermost first.
            let path = guard.path.into_inner();
            Err(path
                .into_iter()
                .fold(ExprError::MaxDepthExceeded { max: max_depth }, |cause, index| {
                    ExprError::nested(index, cause)
                }))
        }
        Err(e) => Err(ExprError::from(e)),
    }
}

struct Guard {
    max_depth: usize,
    exceeded: Cell<bool>,
    path: RefCell<Vec<usize>>,
}

impl Guard {
    fn exceed<E: de::Error>(&self) -> E {
        self.exceeded.set(true);
        E::custom(format_args!("nesting exceeds maximum depth of {}", self.max_depth))
    }
}

#[derive(Clone, Copy)]
enum Slot {
    /// An array here is an expression at this depth.
    Argument(usize),
    /// Plain data nested this many levels.
    Opaque(usize),
}

struct Node<'g> {
    guard: &'g Guard,
    slot: Slot,
}

impl<'de> DeserializeSeed<'de> for Node<'_> {
    type Value = Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for Node<'_> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let guard = self.guard;
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        match self.slot {
            Slot::Argument(depth) => {
                if depth > guard.max_depth {
                    return Err(guard.exceed());
                }
                loop {
                    let position = items.len();
                    // Position 0 holds the operator, never an expression.
                    let slot = if position == 0 {
                        Slot::Opaque(1)
                    } else {
                        Slot::Argument(depth + 1)
                    };
                    let next = seq.next_element_seed(Node { guard, slot }).inspect_err(|_| {
                        if position > 0 && guard.exceeded.get() {
                            guard.path.borrow_mut().push(position - 1);
                        }
                    })?;
                    match next {
                        Some(item) => items.push(item),
                        None => break,
                    }
                }
            }
            Slot::Opaque(level) => {
                if level > guard.max_depth {
                    return Err(guard.exceed());
                }
                let slot = Slot::Opaque(level + 1);
                while let Some(item) = seq.next_element_seed(Node { guard, slot })? {
                    items.push(item);
                }
            }
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let guard = self.guard;
        let level = match self.slot {
            Slot::Argument(_) => 1,
            Slot::Opaque(level) => level,
        };
        if level > guard.max_depth {
            return Err(guard.exceed());
        }
        let slot = Slot::Opaque(level + 1);
        let mut out = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(Node { guard, slot })?;
            out.insert(key, value);
        }
        Ok(Value::Object(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nested_arrays(depth: usize) -> String {
        let mut s = String::new();
        for _ in 1..depth {
            s.push_str("[\"n\",");
        }
        s.push_str("[\"leaf\"]");
        for _ in 1..depth {
            s.push(']');
        }
        s
    }

    #[test]
    fn test_parse_plain_values() {
        let value = parse(br#"["gt", 1, -2, 0.5, true, null, "s", {"k": [1, {"x": 2}]}]"#, 100)
            .unwrap();
        assert_eq!(
            value,
            json!(["gt", 1, -2, 0.5, true, null, "s", {"k": [1, {"x": 2}]}])
        );
    }

    #[test]
    fn test_parse_preserves_key_order() {
        let value = parse(br#"{"b": 1, "a": 2}"#, 100).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn test_parse_beyond_serde_json_recursion_limit() {
        let value = parse(nested_arrays(300).as_bytes(), 300).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn test_parse_depth_error_carries_path() {
        let err = parse(br#"["a", 1, ["b", ["c"]]]"#, 2).unwrap_err();
        assert_eq!(err.path(), vec![1, 0]);
        assert_eq!(err.root_cause(), &ExprError::MaxDepthExceeded { max: 2 });
    }

    #[test]
    fn test_parse_bounds_opaque_nesting() {
        assert!(parse(br#"["a", {"k": {"k": 1}}]"#, 2).is_ok());
        let err = parse(br#"["a", {"k": {"k": {"k": 1}}}]"#, 2).unwrap_err();
        assert_eq!(err.path(), vec![0]);
        assert_eq!(err.root_cause(), &ExprError::MaxDepthExceeded { max: 2 });
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse(b"[\"a\",", 10), Err(ExprError::MalformedJson(_))));
        assert!(matches!(parse(b"[\"a\"] x", 10), Err(ExprError::MalformedJson(_))));
    }
}
