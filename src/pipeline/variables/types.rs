//! Variable definition types.
//!
//! A variable bundles a declared value type, an optional activation rule,
//! an optional resolution strategy and an optional export mapping. All of
//! these are plain tagged enums so that the registry can live in static
//! data and be dispatched with `match`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::vocab::UNKNOWN_CODE;
use crate::models::{FactValue, Record};

/// Resolved values for one patient, keyed by variable id. Absent
/// variables have no entry.
pub type ResolvedMap = BTreeMap<String, FactValue>;

// ═══════════════════════════════════════════
// Vocabulary terms
// ═══════════════════════════════════════════

/// One label of a closed vocabulary and its export code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub label: &'static str,
    pub code: i64,
}

/// One field of a structured record, e.g. `relationship` or `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordField {
    pub name: &'static str,
    pub terms: &'static [Term],
}

/// Ordered subset rule: applies when every label is in the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsetRule {
    pub labels: &'static [&'static str],
    pub code: i64,
}

fn labels(terms: &[Term]) -> Vec<&'static str> {
    terms.iter().map(|t| t.label).collect()
}

fn code_for(terms: &[Term], label: &str) -> i64 {
    terms
        .iter()
        .find(|t| t.label == label)
        .map(|t| t.code)
        .unwrap_or(UNKNOWN_CODE)
}

// ═══════════════════════════════════════════
// Value types
// ═══════════════════════════════════════════

/// Declared value type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Boolean,
    Text,
    Date,
    Integer,
    Label(&'static [Term]),
    LabelList(&'static [Term]),
    DateList,
    RecordList(&'static [RecordField]),
}

/// Payload-free tag of `ValueType`, used for dispatch and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Boolean,
    Text,
    Date,
    Integer,
    Label,
    LabelList,
    DateList,
    RecordList,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Text => "text",
            Self::Date => "date",
            Self::Integer => "integer",
            Self::Label => "label",
            Self::LabelList => "label_list",
            Self::DateList => "date_list",
            Self::RecordList => "record_list",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ValueType {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean => ValueKind::Boolean,
            Self::Text => ValueKind::Text,
            Self::Date => ValueKind::Date,
            Self::Integer => ValueKind::Integer,
            Self::Label(_) => ValueKind::Label,
            Self::LabelList(_) => ValueKind::LabelList,
            Self::DateList => ValueKind::DateList,
            Self::RecordList(_) => ValueKind::RecordList,
        }
    }

    /// Label space of enum-typed variables (single or list).
    pub fn label_space(&self) -> Option<Vec<&'static str>> {
        match self {
            Self::Label(terms) | Self::LabelList(terms) => Some(labels(terms)),
            _ => None,
        }
    }

    /// Check a raw JSON value against this type and convert it.
    ///
    /// Date strings are not parsed here: a model answer of "2019" is a
    /// valid observation even if it is coarser than a full date.
    pub fn coerce(&self, raw: &Value) -> Result<FactValue, String> {
        match self {
            Self::Boolean => raw
                .as_bool()
                .map(FactValue::Bool)
                .ok_or_else(|| format!("expected boolean, got {raw}")),
            Self::Text | Self::Date => raw
                .as_str()
                .map(|s| FactValue::Text(s.to_string()))
                .ok_or_else(|| format!("expected string, got {raw}")),
            Self::Integer => raw
                .as_i64()
                .or_else(|| raw.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(FactValue::Integer)
                .ok_or_else(|| format!("expected integer, got {raw}")),
            Self::Label(terms) => {
                let s = raw.as_str().ok_or_else(|| format!("expected label, got {raw}"))?;
                check_label(terms, s)?;
                Ok(FactValue::Text(s.to_string()))
            }
            Self::LabelList(terms) => {
                let items = string_items(raw)?;
                for item in &items {
                    check_label(terms, item)?;
                }
                Ok(FactValue::TextList(items))
            }
            Self::DateList => Ok(FactValue::TextList(string_items(raw)?)),
            Self::RecordList(fields) => {
                let items = raw
                    .as_array()
                    .ok_or_else(|| format!("expected list of records, got {raw}"))?;
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    records.push(coerce_record(fields, item)?);
                }
                Ok(FactValue::RecordList(records))
            }
        }
    }

    /// JSON-schema fragment for the `value` property of a fact.
    pub fn json_schema(&self) -> Value {
        match self {
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Text => json!({ "type": "string" }),
            Self::Date => json!({ "type": "string", "description": "YYYY-MM-DD, YYYY-MM or YYYY" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Label(terms) => json!({ "type": "string", "enum": labels(terms) }),
            Self::LabelList(terms) => json!({
                "type": "array",
                "items": { "type": "string", "enum": labels(terms) },
            }),
            Self::DateList => json!({ "type": "array", "items": { "type": "string" } }),
            Self::RecordList(fields) => {
                let properties: serde_json::Map<String, Value> = fields
                    .iter()
                    .map(|f| {
                        (
                            f.name.to_string(),
                            json!({ "type": "string", "enum": labels(f.terms) }),
                        )
                    })
                    .collect();
                let required: Vec<&str> = fields.iter().map(|f| f.name).collect();
                json!({
                    "type": "array",
                    "items": { "type": "object", "properties": properties, "required": required },
                })
            }
        }
    }

    /// Recursive type descriptor published with the variable definitions.
    pub fn descriptor(&self) -> Value {
        match self {
            Self::Boolean => json!({ "type": "bool" }),
            Self::Text | Self::Date => json!({ "type": "string" }),
            Self::Integer => json!({ "type": "int" }),
            Self::Label(terms) => json!({ "type": "enum", "values": labels(terms) }),
            Self::LabelList(terms) => json!({
                "type": "list",
                "value": { "type": "enum", "values": labels(terms) },
            }),
            Self::DateList => json!({ "type": "list", "value": { "type": "string" } }),
            Self::RecordList(fields) => {
                let values: Vec<Value> = fields
                    .iter()
                    .map(|f| {
                        json!({
                            "name": f.name,
                            "value": { "type": "enum", "values": labels(f.terms) },
                        })
                    })
                    .collect();
                json!({ "type": "list", "value": { "type": "object", "values": values } })
            }
        }
    }
}

fn check_label(terms: &[Term], label: &str) -> Result<(), String> {
    if terms.iter().any(|t| t.label == label) {
        Ok(())
    } else {
        Err(format!("invalid label '{label}'"))
    }
}

fn string_items(raw: &Value) -> Result<Vec<String>, String> {
    let items = raw
        .as_array()
        .ok_or_else(|| format!("expected list, got {raw}"))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(String::from)
                .ok_or_else(|| format!("expected string list item, got {v}"))
        })
        .collect()
}

fn coerce_record(fields: &[RecordField], raw: &Value) -> Result<Record, String> {
    let obj = raw
        .as_object()
        .ok_or_else(|| format!("expected record object, got {raw}"))?;
    let mut record = Record::new();
    for field in fields {
        let value = obj
            .get(field.name)
            .and_then(|v| v.as_str())
            .ok_or_else(|| format!("record missing field '{}'", field.name))?;
        check_label(field.terms, value)?;
        record.insert(field.name.to_string(), value.to_string());
    }
    Ok(record)
}

// ═══════════════════════════════════════════
// Resolution, activation and export
// ═══════════════════════════════════════════

/// Strategy collapsing a patient's timestamped observations into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverKind {
    MostFrequent,
    MostRecent,
    LeastRecent,
    AnyTrue,
    ListUnique,
    EarliestDate,
}

impl ResolverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MostFrequent => "most_frequent",
            Self::MostRecent => "most_recent",
            Self::LeastRecent => "least_recent",
            Self::AnyTrue => "any_true",
            Self::ListUnique => "list_unique",
            Self::EarliestDate => "earliest_date",
        }
    }
}

/// Predicate over the phase-1 resolved map gating phase-2 extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationRule {
    /// Resolved value of `variable` is truthy.
    IsTrue { variable: &'static str },
    /// Resolved value of `variable` is exactly `label`.
    Equals { variable: &'static str, label: &'static str },
    /// Resolved list `variable` contains `label`.
    ListContains { variable: &'static str, label: &'static str },
    /// Resolved list `variable` is non-empty and does not contain `label`.
    ListExcludes { variable: &'static str, label: &'static str },
}

impl ActivationRule {
    pub fn dependency(&self) -> &'static str {
        match self {
            Self::IsTrue { variable }
            | Self::Equals { variable, .. }
            | Self::ListContains { variable, .. }
            | Self::ListExcludes { variable, .. } => variable,
        }
    }

    pub fn evaluate(&self, resolved: &ResolvedMap) -> bool {
        let Some(value) = resolved.get(self.dependency()) else {
            return false;
        };
        match self {
            Self::IsTrue { .. } => value.is_truthy(),
            Self::Equals { label, .. } => value.as_text() == Some(*label),
            Self::ListContains { label, .. } => value.contains_label(label),
            Self::ListExcludes { label, .. } => value.is_truthy() && !value.contains_label(label),
        }
    }
}

/// Transform from a resolved value to the external export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMapping {
    /// Text as-is, absent as empty string.
    Identity,
    /// Truthy as 1, anything else as 0.
    Flag,
    /// Label to its vocabulary code, unknown as 99.
    Code,
    /// Label list to a bracketed code list, e.g. `"[1, 4]"`.
    CodeList,
    /// First subset rule satisfied by the label list, else 99.
    SubsetCode(&'static [SubsetRule]),
}

// ═══════════════════════════════════════════
// Variable definition
// ═══════════════════════════════════════════

/// Declarative definition of one extractable clinical variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDefinition {
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    pub description: &'static str,
    /// Question passed to the model for this field.
    pub prompt: &'static str,
    pub value_type: ValueType,
    pub activation: Option<ActivationRule>,
    pub resolver: Option<ResolverKind>,
    pub export_id: Option<&'static str>,
    pub export: Option<ExportMapping>,
}

impl VariableDefinition {
    pub fn is_conditional(&self) -> bool {
        self.activation.is_some()
    }

    /// Apply the export mapping to a resolved value.
    /// Returns `None` when the variable has no mapping.
    pub fn export_value(&self, value: Option<&FactValue>) -> Option<Value> {
        let mapping = self.export?;
        let terms = match self.value_type {
            ValueType::Label(t) | ValueType::LabelList(t) => t,
            _ => &[],
        };

        let exported = match mapping {
            ExportMapping::Identity => match value {
                Some(FactValue::Text(s)) => json!(s),
                Some(other) if other.is_truthy() => json!(other.to_string()),
                _ => json!(""),
            },
            ExportMapping::Flag => json!(if value.is_some_and(|v| v.is_truthy()) { 1 } else { 0 }),
            ExportMapping::Code => {
                let code = value
                    .and_then(|v| v.as_text())
                    .map(|label| code_for(terms, label))
                    .unwrap_or(UNKNOWN_CODE);
                json!(code)
            }
            ExportMapping::CodeList => {
                let codes: Vec<String> = value
                    .and_then(|v| v.as_text_list())
                    .unwrap_or(&[])
                    .iter()
                    .map(|label| code_for(terms, label).to_string())
                    .collect();
                json!(format!("[{}]", codes.join(", ")))
            }
            ExportMapping::SubsetCode(rules) => {
                let present = value.and_then(|v| v.as_text_list()).unwrap_or(&[]);
                let code = rules
                    .iter()
                    .find(|rule| rule.labels.iter().all(|l| present.iter().any(|p| p == l)))
                    .map(|rule| rule.code)
                    .unwrap_or(UNKNOWN_CODE);
                json!(code)
            }
        };
        Some(exported)
    }

    /// Machine-readable descriptor for downstream tooling.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "type": self.value_type.descriptor(),
            "export_id": self.export_id,
        })
    }
}
