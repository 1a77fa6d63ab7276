use std::collections::HashSet;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{CorepError, Result};

/// Identity of a reportable line item.
///
/// The serialized form is the canonical field name, which is also the key the
/// model must use in its JSON answer. Matching is exact and case-sensitive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum FieldId {
    #[serde(rename = "CET1 Capital")]
    #[schemars(description = "Common Equity Tier 1 capital")]
    Cet1Capital,

    #[serde(rename = "AT1 Capital")]
    #[schemars(description = "Additional Tier 1 capital")]
    At1Capital,
}

impl FieldId {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cet1Capital => "CET1 Capital",
            Self::At1Capital => "AT1 Capital",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Static description of one template row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub id: FieldId,
    /// Template row code, e.g. `0020` in C 01.00.
    pub code: String,
}

impl FieldDefinition {
    pub fn new(id: FieldId, code: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }
}

/// The value/rule pair the model returns for each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldEntry {
    #[schemars(
        description = "Amount in absolute currency units, not millions (e.g. £120 million = 120000000)"
    )]
    pub value: f64,

    #[schemars(description = "Exact reference of the regulatory rule that justifies the value")]
    pub rule: String,
}

/// One reportable line item for a single run.
///
/// `value` and `rule` stay `None` until the orchestrator finds a matching
/// entry in the recovered payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub code: String,
    pub name: String,
    pub value: Option<f64>,
    pub rule: Option<String>,
}

impl Field {
    pub fn unset(definition: &FieldDefinition) -> Self {
        Self {
            id: definition.id,
            code: definition.code.clone(),
            name: definition.name().to_string(),
            value: None,
            rule: None,
        }
    }

    pub fn is_populated(&self) -> bool {
        self.value.is_some()
    }

    pub(crate) fn populate(&mut self, entry: &FieldEntry) {
        self.value = Some(entry.value);
        self.rule = Some(entry.rule.clone());
    }
}

/// Ordered, immutable set of field definitions for one reporting template.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaRegistry {
    template_code: String,
    definitions: Vec<FieldDefinition>,
}

impl SchemaRegistry {
    pub fn new(
        template_code: impl Into<String>,
        definitions: Vec<FieldDefinition>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for definition in &definitions {
            if !seen.insert(definition.id) {
                return Err(CorepError::Config(format!(
                    "Field '{}' is defined more than once",
                    definition.name()
                )));
            }
        }

        Ok(Self {
            template_code: template_code.into(),
            definitions,
        })
    }

    /// Own funds template C 01.00, restricted to the Tier 1 components.
    pub fn c01_00() -> Self {
        Self {
            template_code: "C 01.00".to_string(),
            definitions: vec![
                FieldDefinition::new(FieldId::Cet1Capital, "0020"),
                FieldDefinition::new(FieldId::At1Capital, "0530"),
            ],
        }
    }

    pub fn template_code(&self) -> &str {
        &self.template_code
    }

    pub fn definitions(&self) -> &[FieldDefinition] {
        &self.definitions
    }

    pub fn get(&self, id: FieldId) -> Option<&FieldDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&FieldDefinition> {
        self.definitions.iter().find(|d| d.name() == name)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.definitions.iter().map(FieldDefinition::name).collect()
    }

    /// Freshly allocated, unset fields in definition order.
    pub fn new_field_set(&self) -> Vec<Field> {
        self.definitions.iter().map(Field::unset).collect()
    }

    /// JSON Schema for the answer expected from the model: one required
    /// `FieldEntry` object per registered field.
    pub fn response_schema(&self) -> Result<serde_json::Value> {
        let entry_schema = serde_json::to_value(schemars::schema_for!(FieldEntry))?;

        let mut properties = serde_json::Map::new();
        for name in self.field_names() {
            properties.insert(name.to_string(), entry_schema.clone());
        }

        Ok(serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.field_names(),
        }))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::c01_00()
    }
}
