//! Tolerant decoding for catalog API payloads.
//!
//! Portals disagree on field types (`12`, `12.0` and `"12"` all show up for
//! counts). Fields decoded here fall back to `None` instead of failing, and
//! a result entry that still cannot be decoded is skipped on its own rather
//! than failing its page.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Non-negative integer from a number or numeric string; anything else is
/// `None`.
pub fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_u64))
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .and_then(|f| value_as_u64(&Value::from(f)))
            })
        }
        _ => None,
    }
}

/// List of strings. Numbers and booleans in the list are kept as text,
/// other entries are dropped. A value that is not a list is `None`.
pub fn opt_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(entries)) => Some(
            entries
                .into_iter()
                .filter_map(|entry| match entry {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

/// List of objects. Entries that do not decode as `T` are dropped; a value
/// that is not a list is `None`.
pub fn opt_object_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(entries)) => Some(
            entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value(entry).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Decodes each entry of a result list independently.
///
/// Returns the decoded items in order and the number of entries skipped.
pub fn decode_items<T: DeserializeOwned>(values: Vec<Value>, source: &str) -> (Vec<T>, usize) {
    let mut items = Vec::with_capacity(values.len());
    let mut skipped = 0;
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value(value) {
            Ok(item) => items.push(item),
            Err(e) => {
                skipped += 1;
                tracing::warn!(source, index, error = %e, "Skipping undecodable catalog entry");
            }
        }
    }
    (items, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize, Debug, PartialEq)]
    struct Counts {
        #[serde(default, deserialize_with = "opt_u64")]
        count: Option<u64>,
        #[serde(default, deserialize_with = "opt_string_list")]
        tags: Option<Vec<String>>,
    }

    fn counts(value: Value) -> Counts {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_opt_u64_accepts_integral_forms() {
        assert_eq!(counts(json!({"count": 12})).count, Some(12));
        assert_eq!(counts(json!({"count": 12.0})).count, Some(12));
        assert_eq!(counts(json!({"count": " 7 "})).count, Some(7));
        assert_eq!(counts(json!({"count": "3.0"})).count, Some(3));
    }

    #[test]
    fn test_opt_u64_defaults_odd_values() {
        for value in [
            json!({}),
            json!({"count": null}),
            json!({"count": -1}),
            json!({"count": 2.5}),
            json!({"count": "many"}),
            json!({"count": [1]}),
            json!({"count": {"n": 1}}),
        ] {
            assert_eq!(counts(value).count, None);
        }
    }

    #[test]
    fn test_opt_string_list() {
        assert_eq!(
            counts(json!({"tags": ["aire", 2024, true, null, {"x": 1}]})).tags,
            Some(vec!["aire".to_string(), "2024".to_string(), "true".to_string()])
        );
        assert_eq!(counts(json!({"tags": "aire"})).tags, None);
        assert_eq!(counts(json!({"tags": null})).tags, None);
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Named {
        name: String,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Holder {
        #[serde(default, deserialize_with = "opt_object_list")]
        entries: Option<Vec<Named>>,
    }

    #[test]
    fn test_opt_object_list_drops_bad_entries() {
        let holder: Holder =
            serde_json::from_value(json!({"entries": [{"name": "a"}, "b", {"name": 3}]})).unwrap();
        assert_eq!(
            holder.entries,
            Some(vec![Named {
                name: "a".to_string()
            }])
        );

        let holder: Holder = serde_json::from_value(json!({"entries": {"name": "a"}})).unwrap();
        assert!(holder.entries.is_none());
    }

    #[test]
    fn test_decode_items_skips_only_bad_entries() {
        let values = vec![json!({"count": 1}), json!("not an object"), json!({"count": 2})];
        let (items, skipped): (Vec<Counts>, usize) = decode_items(values, "test");
        assert_eq!(skipped, 1);
        assert_eq!(
            items.iter().map(|c| c.count).collect::<Vec<_>>(),
            vec![Some(1), Some(2)]
        );
    }
}
