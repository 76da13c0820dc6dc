//! Helpers for navigating and reshaping the remote's loosely-typed JSON.
//!
//! The transport layer enforces no schema, so every shape assumption lives
//! behind these helpers: dotted-path lookups that return `None` instead of
//! panicking, a flatten/unflatten pair for nested maps, and [`FieldSpec`]
//! for describing display fields as either a key path or a transform.

use serde_json::{Map, Value};

/// Looks up a dotted path (`"a.b.0.c"`) in a JSON value. Numeric segments
/// index into arrays. Returns `None` on any missing key, out-of-range index
/// or scalar-in-the-middle.
pub fn pluck<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

pub fn pluck_i64(value: &Value, path: &str) -> Option<i64> {
    pluck(value, path)?.as_i64()
}

pub fn pluck_str<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    pluck(value, path)?.as_str()
}

pub fn pluck_bool(value: &Value, path: &str) -> Option<bool> {
    pluck(value, path)?.as_bool()
}

pub fn pluck_array<'a>(value: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
    pluck(value, path)?.as_array()
}

pub fn pluck_object<'a>(value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
    pluck(value, path)?.as_object()
}

/// Flattens nested objects into a single-level map with dotted keys:
/// `{"a": {"b": 1}}` becomes `{"a.b": 1}`. Arrays and scalars are kept as
/// leaves.
#[must_use]
pub fn flatten(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(value, String::new(), &mut out);
    out
}

fn flatten_into(value: &Value, prefix: String, out: &mut Map<String, Value>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, inner) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(inner, path, out);
            }
        }
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix, leaf.clone());
            }
        }
    }
}

/// Inverse of [`flatten`]: rebuilds a nested object from dotted keys. Later
/// entries win when a scalar and an object collide on the same path prefix.
#[must_use]
pub fn unflatten(flat: &Map<String, Value>) -> Value {
    let mut root = Value::Object(Map::new());
    for (path, value) in flat {
        let mut cursor = &mut root;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let Value::Object(map) = ({ cursor }) else { break };
            if segments.peek().is_none() {
                map.insert(segment.to_string(), value.clone());
                break;
            } else {
                let slot = map
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                cursor = slot;
            }
        }
    }
    root
}

/// How a display field is produced from a raw payload: either a literal
/// dotted key path or a derived transform over the whole payload.
pub enum FieldSpec {
    Literal(&'static str),
    Derived(fn(&Value) -> Value),
}

impl FieldSpec {
    /// Resolves the field against a payload; a missing literal path yields
    /// `Null` rather than an error.
    #[must_use]
    pub fn resolve(&self, payload: &Value) -> Value {
        match self {
            Self::Literal(path) => pluck(payload, path).cloned().unwrap_or(Value::Null),
            Self::Derived(transform) => transform(payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{flatten, pluck, pluck_i64, pluck_str, unflatten, FieldSpec};
    use serde_json::{json, Value};

    #[test]
    fn pluck_walks_objects_and_arrays() {
        let payload = json!({"a": {"b": [{"c": 7}]}});
        assert_eq!(pluck_i64(&payload, "a.b.0.c"), Some(7));
        assert!(pluck(&payload, "a.b.1.c").is_none());
        assert!(pluck(&payload, "a.missing").is_none());
        assert!(pluck(&payload, "a.b.0.c.deeper").is_none());
    }

    #[test]
    fn pluck_rejects_wrong_types() {
        let payload = json!({"n": 3});
        assert!(pluck_str(&payload, "n").is_none());
        assert_eq!(pluck_i64(&payload, "n"), Some(3));
    }

    #[test]
    fn flatten_produces_dotted_keys() {
        let payload = json!({"a": {"b": 1, "c": {"d": "x"}}, "e": [1, 2]});
        let flat = flatten(&payload);
        assert_eq!(flat.get("a.b"), Some(&json!(1)));
        assert_eq!(flat.get("a.c.d"), Some(&json!("x")));
        assert_eq!(flat.get("e"), Some(&json!([1, 2])));
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn unflatten_round_trips() {
        let payload = json!({"a": {"b": 1}, "c": "x"});
        assert_eq!(unflatten(&flatten(&payload)), payload);
    }

    #[test]
    fn literal_spec_falls_back_to_null() {
        let payload = json!({"streak": {"length": 12}});
        assert_eq!(
            FieldSpec::Literal("streak.length").resolve(&payload),
            json!(12)
        );
        assert_eq!(FieldSpec::Literal("nope").resolve(&payload), Value::Null);
    }

    #[test]
    fn derived_spec_runs_the_transform() {
        let spec = FieldSpec::Derived(|payload| {
            json!(payload["xp"].as_i64().unwrap_or(0) * 2)
        });
        assert_eq!(spec.resolve(&json!({"xp": 21})), json!(42));
    }
}
