//! Wire types for the memory service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of record stored in the memory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    /// A person the caller mentioned, with their relationship.
    Person,
    /// A durable fact about the caller.
    Fact,
    /// A stated preference.
    Preference,
    /// An action item with an optional deadline.
    Commitment,
    /// A rolling-history recap blob (short TTL continuity cache).
    Recap,
}

impl MemoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Person => "person",
            MemoryType::Fact => "fact",
            MemoryType::Preference => "preference",
            MemoryType::Commitment => "commitment",
            MemoryType::Recap => "recap",
        }
    }
}

/// Visibility scope of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryScope {
    /// Visible only to the owning caller.
    #[default]
    User,
    /// Visible to every caller of this agent.
    Shared,
}

/// A stored value as returned by the service.
///
/// The service historically returned plain concatenated strings and newer
/// deployments return structured JSON. Deserialization resolves the split
/// once, here; `Legacy` must come first so plain strings are not swallowed
/// by the catch-all `Structured` arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemoryValue {
    Legacy(String),
    Structured(Value),
}

impl MemoryValue {
    /// Renders the value as display text regardless of shape.
    pub fn as_text(&self) -> String {
        match self {
            MemoryValue::Legacy(s) => s.clone(),
            MemoryValue::Structured(v) => match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }

    /// Returns the structured value, if this record has one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            MemoryValue::Legacy(_) => None,
            MemoryValue::Structured(v) => Some(v),
        }
    }
}

/// A record returned by `search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,

    #[serde(rename = "type")]
    pub record_type: MemoryType,

    #[serde(default)]
    pub key: String,

    pub value: MemoryValue,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub scope: MemoryScope,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_string_value() {
        let record: MemoryRecord = serde_json::from_str(
            r#"{"id":"m1","type":"fact","key":"car","value":"drives a 2019 Outback"}"#,
        )
        .unwrap();
        assert_eq!(record.value, MemoryValue::Legacy("drives a 2019 Outback".into()));
        assert_eq!(record.value.as_text(), "drives a 2019 Outback");
        assert!(record.value.as_json().is_none());
    }

    #[test]
    fn test_structured_value() {
        let record: MemoryRecord = serde_json::from_str(
            r#"{"id":"m2","type":"person","key":"p1","value":{"name":"Ann","relationship":"spouse"}}"#,
        )
        .unwrap();
        let json = record.value.as_json().expect("structured");
        assert_eq!(json["name"], "Ann");
        assert!(record.value.as_text().contains("spouse"));
    }

    #[test]
    fn test_scope_defaults_to_user() {
        let record: MemoryRecord =
            serde_json::from_str(r#"{"id":"m3","type":"fact","value":"x"}"#).unwrap();
        assert_eq!(record.scope, MemoryScope::User);
    }
}
