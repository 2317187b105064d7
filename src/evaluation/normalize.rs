//! Raw JSON → comparable values, one normaliser per value shape.
//!
//! Shared by the metric families and the agreement statistics. Nothing here
//! fails: unreadable input becomes the family's "absent" value.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde_json::Value;

use crate::models::{calendar_date, normalize_date, Record};

/// `null` and missing are false; numbers are true when non-zero; strings
/// accept the usual yes/no spellings and are otherwise true when non-empty.
pub fn boolean(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "0" | "false" | "no" | "n" => false,
            _ => true,
        },
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Stringified label; absent is the empty string.
pub fn label(raw: &Value) -> String {
    match raw {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Canonical `YYYY-MM-DD`, or `None` when absent or unparsable.
pub fn date(raw: &Value) -> Option<String> {
    raw.as_str().and_then(normalize_date)
}

/// Calendar date of a raw date string, or `None` when absent or unparsable.
pub fn calendar(raw: &Value) -> Option<NaiveDate> {
    raw.as_str().and_then(calendar_date)
}

pub fn numeric(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Label set. A lone string is a one-element set; `null` is empty.
pub fn label_set(raw: &Value) -> BTreeSet<String> {
    match raw {
        Value::Array(items) => items
            .iter()
            .map(label)
            .filter(|l| !l.is_empty())
            .collect(),
        Value::Null => BTreeSet::new(),
        other => {
            let single = label(other);
            if single.is_empty() {
                BTreeSet::new()
            } else {
                BTreeSet::from([single])
            }
        }
    }
}

/// Parseable dates in chronological order; unparsable entries are dropped.
pub fn date_list(raw: &Value) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(calendar_date)
            .collect(),
        Value::String(s) => calendar_date(s).into_iter().collect(),
        _ => Vec::new(),
    };
    dates.sort();
    dates
}

/// Set of structured records; field values are stringified.
pub fn record_set(raw: &Value) -> BTreeSet<Record> {
    let Value::Array(items) = raw else {
        return BTreeSet::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| (k.clone(), label(v)))
                .collect::<Record>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn boolean_truthiness() {
        assert!(!boolean(&Value::Null));
        assert!(!boolean(&json!(0)));
        assert!(!boolean(&json!("False")));
        assert!(boolean(&json!(1)));
        assert!(boolean(&json!("yes")));
        assert!(boolean(&json!(true)));
    }

    #[test]
    fn label_absent_is_empty_string() {
        assert_eq!(label(&Value::Null), "");
        assert_eq!(label(&json!("uc")), "uc");
        assert_eq!(label(&json!(3)), "3");
    }

    #[test]
    fn dates_normalize_or_vanish() {
        assert_eq!(date(&json!("2020")).as_deref(), Some("2020-01-01"));
        assert_eq!(date(&json!("02/30/2020")), None);
        assert_eq!(date(&Value::Null), None);
    }

    #[test]
    fn date_list_sorted_and_filtered() {
        let dates = date_list(&json!(["2021-03-01", "garbage", "2020-05"]));
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn record_set_ignores_order_and_duplicates() {
        let a = record_set(&json!([
            {"relationship": "father", "type": "breast"},
            {"type": "breast", "relationship": "father"}
        ]));
        assert_eq!(a.len(), 1);
        assert!(record_set(&Value::Null).is_empty());
    }

    #[test]
    fn numeric_accepts_strings() {
        assert_eq!(numeric(&json!("4.5")), Some(4.5));
        assert_eq!(numeric(&json!(3)), Some(3.0));
        assert_eq!(numeric(&json!("n/a")), None);
    }
}
