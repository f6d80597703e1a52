//! Lenient field readers for model-generated payloads
//!
//! The backend validates generated challenges loosely: numbers may arrive as
//! floats or strings and list fields as `null`. These `deserialize_with`
//! helpers accept what the backend accepts instead of dropping the record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Numeric reading of a JSON value: numbers, or strings holding a number
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Whole minutes from `30`, `30.0` or `"30"`; anything else is 0
pub fn minutes<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw = number(&value).unwrap_or_default();
    Ok(raw.round().clamp(0.0, u32::MAX as f64) as u32)
}

/// Free text; `null` is empty and scalars are printed
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// List of strings; `null` is empty and a bare string is a one-item list
pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .collect(),
        other => vec![other.to_string()],
    })
}

/// `null` falls back to the type's default like a missing field does
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "minutes")]
        minutes: u32,
        #[serde(default, deserialize_with = "strings")]
        hints: Vec<String>,
        #[serde(default, deserialize_with = "text")]
        title: String,
    }

    fn sample(value: Value) -> Sample {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_minutes_from_float_and_string() {
        assert_eq!(sample(json!({"minutes": 30.0})).minutes, 30);
        assert_eq!(sample(json!({"minutes": "45"})).minutes, 45);
        assert_eq!(sample(json!({"minutes": -5})).minutes, 0);
        assert_eq!(sample(json!({"minutes": null})).minutes, 0);
    }

    #[test]
    fn test_strings_tolerate_null_and_scalars() {
        assert!(sample(json!({"hints": null})).hints.is_empty());
        assert_eq!(sample(json!({"hints": "Use EmailStr"})).hints, vec!["Use EmailStr"]);
        assert_eq!(sample(json!({"hints": ["a", null, 3]})).hints, vec!["a", "3"]);
    }

    #[test]
    fn test_text_null_is_empty() {
        assert_eq!(sample(json!({"title": null})).title, "");
        assert_eq!(sample(json!({"title": 42})).title, "42");
    }
}
