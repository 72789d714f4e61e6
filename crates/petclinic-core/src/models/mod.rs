//! Domain models for the clinic record client.

mod person;
mod pet;
mod prediction;
mod records;

pub use person::*;
pub use pet::*;
pub use prediction::*;
pub use records::*;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

/// Identifiers arrive as strings from the UUID backend and as integers from
/// the SQLite one. Both are carried as strings and compared as strings.
pub(crate) fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(f) => f.to_string(),
    })
}

/// Optional variant of [`id_string`] for nullable references.
pub(crate) fn opt_id_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "id_string")] String);

    Ok(Option::<Wrap>::deserialize(deserializer)?.map(|w| w.0))
}

/// Numbers entered through free-form inputs. Numeric strings are parsed;
/// null, non-finite and non-numeric values read as `None`.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawNumber {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    let value = match Option::<RawNumber>::deserialize(deserializer)? {
        Some(RawNumber::Number(n)) => Some(n),
        Some(RawNumber::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(RawNumber::Other(_)) | None => None,
    };
    Ok(value.filter(|n| n.is_finite()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Refs {
        #[serde(deserialize_with = "id_string")]
        id: String,
        #[serde(default, deserialize_with = "opt_id_string")]
        owner: Option<String>,
    }

    #[derive(Deserialize)]
    struct Measure {
        #[serde(default, deserialize_with = "lenient_number")]
        value: Option<f64>,
    }

    fn measure(json: &str) -> Option<f64> {
        serde_json::from_str::<Measure>(json).unwrap().value
    }

    #[test]
    fn test_lenient_numbers() {
        assert_eq!(measure(r#"{"value": 3}"#), Some(3.0));
        assert_eq!(measure(r#"{"value": 2.5}"#), Some(2.5));
        assert_eq!(measure(r#"{"value": " 4.5 "}"#), Some(4.5));
        assert_eq!(measure(r#"{"value": null}"#), None);
        assert_eq!(measure(r#"{"value": "abc"}"#), None);
        assert_eq!(measure(r#"{"value": "NaN"}"#), None);
        assert_eq!(measure(r#"{"value": true}"#), None);
        assert_eq!(measure(r#"{}"#), None);
    }

    #[test]
    fn test_numeric_ids_become_strings() {
        let refs: Refs = serde_json::from_str(r#"{"id": 42, "owner": 7}"#).unwrap();
        assert_eq!(refs.id, "42");
        assert_eq!(refs.owner.as_deref(), Some("7"));
    }

    #[test]
    fn test_missing_optional_id() {
        let refs: Refs = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(refs.id, "abc");
        assert_eq!(refs.owner, None);

        let refs: Refs = serde_json::from_str(r#"{"id": "abc", "owner": null}"#).unwrap();
        assert_eq!(refs.owner, None);
    }
}
