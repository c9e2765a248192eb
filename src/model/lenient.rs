//! Tolerant field deserializers for backend report data.
//!
//! A `null` or loosely typed field becomes its default instead of failing
//! the whole report. Numeric strings and floats are accepted for counts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_of(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn count_of(value: &Value) -> Option<u32> {
    number_of(value)
        .filter(|n| *n >= 0.0)
        .map(|n| n.min(f64::from(u32::MAX)) as u32)
}

/// String field; numbers are kept as their decimal text.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Optional string field; empty for `null` or non-scalar values.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(Value::deserialize(deserializer)?))
}

/// Non-negative count; fractions are truncated.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_of(&Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Optional count, `None` when absent or not numeric.
pub fn opt_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_of(&Value::deserialize(deserializer)?))
}

/// Floating point coordinate.
pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_of(&Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Sequence field. Anything but an array is empty; entries that do not
/// fit `T` are skipped.
pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping malformed entry: {}", e);
                None
            }
        })
        .collect())
}

/// Nested object; its default when `null` or not an object.
pub fn object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(opt_object_of(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Optional nested object; `None` when `null` or not an object.
pub fn opt_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(opt_object_of(Value::deserialize(deserializer)?))
}

fn opt_object_of<T: DeserializeOwned>(value: Value) -> Option<T> {
    if !value.is_object() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("Replacing malformed object with defaults: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Sample {
        #[serde(deserialize_with = "string")]
        name: String,
        #[serde(deserialize_with = "opt_string")]
        id: Option<String>,
        #[serde(deserialize_with = "count")]
        age: u32,
        #[serde(deserialize_with = "opt_count")]
        number: Option<u32>,
        #[serde(deserialize_with = "number")]
        x: f64,
        #[serde(deserialize_with = "seq")]
        tags: Vec<String>,
    }

    fn sample(value: Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_nulls_become_defaults() {
        let parsed = sample(json!({
            "name": null, "id": null, "age": null, "number": null, "x": null, "tags": null
        }));
        assert_eq!(parsed.name, "");
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.age, 0);
        assert_eq!(parsed.number, None);
        assert_eq!(parsed.x, 0.0);
        assert!(parsed.tags.is_empty());
    }

    #[test]
    fn test_loose_scalars_are_coerced() {
        let parsed = sample(json!({
            "name": 7, "id": 1042, "age": "42", "number": 11.0, "x": "2.5"
        }));
        assert_eq!(parsed.name, "7");
        assert_eq!(parsed.id.as_deref(), Some("1042"));
        assert_eq!(parsed.age, 42);
        assert_eq!(parsed.number, Some(11));
        assert_eq!(parsed.x, 2.5);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let parsed = sample(json!({
            "name": { "first": "A" }, "age": -3, "number": "eleven", "tags": ["a", 1, "b"]
        }));
        assert_eq!(parsed.name, "");
        assert_eq!(parsed.age, 0);
        assert_eq!(parsed.number, None);
        assert_eq!(parsed.tags, vec!["a", "b"]);
    }
}
