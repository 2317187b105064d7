//! Typed raw values read from the model for a single variable.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One structured tuple inside a record list, keyed by field name.
/// e.g. `{"relationship": "first_degree_relative", "type": "breast"}`.
pub type Record = BTreeMap<String, String>;

/// A value as produced for one variable by one chunk.
///
/// Enum labels and date strings are carried as `Text`; list-of-enum and
/// list-of-date variables as `TextList`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Bool(bool),
    Integer(i64),
    Text(String),
    TextList(Vec<String>),
    RecordList(Vec<Record>),
}

impl FactValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_text_list(&self) -> Option<&[String]> {
        match self {
            Self::TextList(items) => Some(items),
            _ => None,
        }
    }

    /// Loose truthiness used by activation rules: `false`, `0`, empty text
    /// and empty lists are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Integer(n) => *n != 0,
            Self::Text(s) => !s.is_empty(),
            Self::TextList(items) => !items.is_empty(),
            Self::RecordList(items) => !items.is_empty(),
        }
    }

    /// True when this is a list containing the given label.
    pub fn contains_label(&self, label: &str) -> bool {
        match self {
            Self::TextList(items) => items.iter().any(|i| i == label),
            _ => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_each_shape() {
        let b: FactValue = serde_json::from_str("true").unwrap();
        assert_eq!(b, FactValue::Bool(true));

        let n: FactValue = serde_json::from_str("42").unwrap();
        assert_eq!(n, FactValue::Integer(42));

        let t: FactValue = serde_json::from_str("\"uc\"").unwrap();
        assert_eq!(t, FactValue::Text("uc".into()));

        let l: FactValue = serde_json::from_str(r#"["breast", "lung"]"#).unwrap();
        assert_eq!(l, FactValue::TextList(vec!["breast".into(), "lung".into()]));

        let r: FactValue =
            serde_json::from_str(r#"[{"relationship": "other", "type": "lung"}]"#).unwrap();
        match r {
            FactValue::RecordList(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0]["type"], "lung");
            }
            other => panic!("expected record list, got {other:?}"),
        }
    }

    #[test]
    fn truthiness_matches_loose_semantics() {
        assert!(!FactValue::Bool(false).is_truthy());
        assert!(FactValue::Bool(true).is_truthy());
        assert!(!FactValue::TextList(vec![]).is_truthy());
        assert!(FactValue::Text("x".into()).is_truthy());
        assert!(!FactValue::Integer(0).is_truthy());
    }

    #[test]
    fn contains_label_only_for_lists() {
        let list = FactValue::TextList(vec!["colorectal".into()]);
        assert!(list.contains_label("colorectal"));
        assert!(!FactValue::Text("colorectal".into()).contains_label("colorectal"));
    }
}
