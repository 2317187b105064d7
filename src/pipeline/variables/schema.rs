//! Variable registry and per-phase schema construction.

use serde_json::{json, Map, Value};

use super::catalog::VARIABLES;
use super::types::{ResolvedMap, VariableDefinition};

/// Immutable table of variable definitions, in catalog order.
#[derive(Debug, Clone)]
pub struct Registry {
    definitions: Vec<VariableDefinition>,
}

impl Registry {
    /// The built-in clinical catalog.
    pub fn builtin() -> Self {
        Self {
            definitions: VARIABLES.to_vec(),
        }
    }

    pub fn new(definitions: Vec<VariableDefinition>) -> Self {
        Self { definitions }
    }

    pub fn get(&self, id: &str) -> Option<&VariableDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn definitions(&self) -> &[VariableDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Schema restricted to definitions matching `predicate`.
    pub fn subset<F>(&self, predicate: F) -> PhaseSchema
    where
        F: Fn(&VariableDefinition) -> bool,
    {
        PhaseSchema {
            fields: self.definitions.iter().filter(|d| predicate(d)).copied().collect(),
        }
    }

    /// Phase 1: every definition without an activation rule.
    pub fn unconditional(&self) -> PhaseSchema {
        self.subset(|d| d.activation.is_none())
    }

    /// Phase 2: conditional definitions whose rule holds for `resolved`.
    pub fn activated(&self, resolved: &ResolvedMap) -> PhaseSchema {
        self.subset(|d| d.activation.is_some_and(|rule| rule.evaluate(resolved)))
    }

    /// `{id: {name, description, type, export_id}}` for downstream tooling.
    pub fn export_definitions(&self) -> Value {
        let map: Map<String, Value> = self
            .definitions
            .iter()
            .map(|d| (d.id.to_string(), d.to_json()))
            .collect();
        Value::Object(map)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Pretty-printed variable definitions of the built-in catalog.
pub fn export_variable_definitions() -> String {
    serde_json::to_string_pretty(&Registry::builtin().export_definitions()).unwrap_or_default()
}

/// Explicit structural descriptor of one extraction request.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSchema {
    pub fields: Vec<VariableDefinition>,
}

impl PhaseSchema {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, id: &str) -> Option<&VariableDefinition> {
        self.fields.iter().find(|d| d.id == id)
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.fields.iter().map(|d| d.id).collect()
    }

    /// JSON schema the model must answer with. Every field is a nullable
    /// fact object `{citation, value, note_id}`.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for def in &self.fields {
            let fact = json!({
                "type": ["object", "null"],
                "description": def.prompt,
                "properties": {
                    "citation": { "type": "string" },
                    "value": def.value_type.json_schema(),
                    "note_id": { "type": "integer" },
                },
                "required": ["citation", "value", "note_id"],
            });
            properties.insert(def.id.to_string(), fact);
        }
        json!({
            "title": "MedicalRecord",
            "type": "object",
            "properties": properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FactValue;

    #[test]
    fn phase_one_is_every_unconditional_variable() {
        let registry = Registry::builtin();
        let phase1 = registry.unconditional();
        assert!(phase1.get("ibd_type").is_some());
        assert!(phase1.get("pers_cancer_hx").is_some());
        assert!(phase1.get("behaviour").is_none());
        assert!(phase1.fields.iter().all(|d| d.activation.is_none()));
    }

    #[test]
    fn activated_follows_resolved_map() {
        let registry = Registry::builtin();
        let mut resolved = ResolvedMap::new();
        resolved.insert("ibd_type".into(), FactValue::Text("cd".into()));
        resolved.insert("psc_hx".into(), FactValue::Bool(false));

        let phase2 = registry.activated(&resolved);
        assert_eq!(phase2.ids(), vec!["crohn_colitis_baseline", "behaviour", "disease_location"]);
    }

    #[test]
    fn nothing_activates_on_empty_map() {
        assert!(Registry::builtin().activated(&ResolvedMap::new()).is_empty());
    }

    #[test]
    fn json_schema_lists_enum_values() {
        let registry = Registry::builtin();
        let schema = registry.subset(|d| d.id == "ibd_type").json_schema();
        let value = &schema["properties"]["ibd_type"]["properties"]["value"];
        assert_eq!(value["enum"], json!(["cd", "uc", "ibd_u"]));
        assert_eq!(schema["properties"]["ibd_type"]["type"], json!(["object", "null"]));
    }

    #[test]
    fn export_definitions_carry_export_id() {
        let exported = Registry::builtin().export_definitions();
        assert_eq!(exported["smoking_history"]["export_id"], "smoking_history");
        assert_eq!(exported["pers_cancer_hx"]["export_id"], Value::Null);
        assert_eq!(exported["fam_cancer_hx"]["type"]["value"]["type"], "object");
        assert!(export_variable_definitions().contains("\"date_hosp\""));
    }
}
