use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::{Field, FieldId};

/// Human-readable description of a plausibility failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Warning(String);

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for Warning {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

pub trait ValidationRule: Send + Sync {
    /// Append any warnings for `fields` to `warnings`.
    fn evaluate(&self, fields: &[Field], warnings: &mut Vec<Warning>);
}

fn find(fields: &[Field], id: FieldId) -> Option<&Field> {
    fields.iter().find(|f| f.id == id)
}

/// The field's value must be strictly greater than zero. An unset value fails.
#[derive(Debug, Clone)]
pub struct PositiveValueRule {
    pub field: FieldId,
}

impl ValidationRule for PositiveValueRule {
    fn evaluate(&self, fields: &[Field], warnings: &mut Vec<Warning>) {
        let value = find(fields, self.field).and_then(|f| f.value);
        if !matches!(value, Some(v) if v > 0.0) {
            warnings.push(Warning::new(format!("{} must be positive", self.field)));
        }
    }
}

/// The field's value, when present, must not be below zero.
#[derive(Debug, Clone)]
pub struct NonNegativeRule {
    pub field: FieldId,
}

impl ValidationRule for NonNegativeRule {
    fn evaluate(&self, fields: &[Field], warnings: &mut Vec<Warning>) {
        if let Some(v) = find(fields, self.field).and_then(|f| f.value) {
            if v < 0.0 {
                warnings.push(Warning::new(format!("{} must not be negative", self.field)));
            }
        }
    }
}

/// Every field must have been populated, in field order.
#[derive(Debug, Clone, Default)]
pub struct RequiredFieldRule;

impl ValidationRule for RequiredFieldRule {
    fn evaluate(&self, fields: &[Field], warnings: &mut Vec<Warning>) {
        for field in fields.iter().filter(|f| !f.is_populated()) {
            warnings.push(Warning::new(format!("{} was not populated", field.name)));
        }
    }
}

/// Ordered rule list. Rules run in insertion order, so the warning sequence
/// is deterministic for a given field sequence.
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            rules: vec![Box::new(PositiveValueRule {
                field: FieldId::Cet1Capital,
            })],
        }
    }
}

impl Validator {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Base rule followed by non-negativity on AT1 and a completeness check.
    pub fn strict() -> Self {
        Self::default()
            .with_rule(NonNegativeRule {
                field: FieldId::At1Capital,
            })
            .with_rule(RequiredFieldRule)
    }

    /// Append a rule after the existing ones.
    pub fn with_rule(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn validate(&self, fields: &[Field]) -> Vec<Warning> {
        let mut warnings = Vec::new();
        for rule in &self.rules {
            rule.evaluate(fields, &mut warnings);
        }
        warnings
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.rules.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;

    fn fields(cet1: Option<f64>, at1: Option<f64>) -> Vec<Field> {
        let mut fields = SchemaRegistry::c01_00().new_field_set();
        fields[0].value = cet1;
        fields[0].rule = cet1.map(|_| "Article 26".to_string());
        fields[1].value = at1;
        fields[1].rule = at1.map(|_| "Article 51".to_string());
        fields
    }

    #[test]
    fn test_positive_cet1_has_no_warnings() {
        let warnings =
            Validator::default().validate(&fields(Some(120_000_000.0), Some(30_000_000.0)));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_zero_and_negative_cet1_warn() {
        for cet1 in [0.0, -5.0] {
            let warnings = Validator::default().validate(&fields(Some(cet1), Some(1.0)));
            assert_eq!(warnings, vec![Warning::new("CET1 Capital must be positive")]);
        }
    }

    #[test]
    fn test_unset_cet1_warns() {
        let warnings = Validator::default().validate(&fields(None, Some(1.0)));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0], "CET1 Capital must be positive");
    }

    #[test]
    fn test_missing_at1_is_not_a_base_warning() {
        let warnings = Validator::default().validate(&fields(Some(10.0), None));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_strict_rules_are_appended_in_order() {
        let validator = Validator::strict();
        assert_eq!(validator.len(), 3);

        let warnings = validator.validate(&fields(Some(-1.0), Some(-2.0)));
        assert_eq!(
            warnings,
            vec![
                Warning::new("CET1 Capital must be positive"),
                Warning::new("AT1 Capital must not be negative"),
            ]
        );

        let warnings = validator.validate(&fields(None, None));
        assert_eq!(
            warnings,
            vec![
                Warning::new("CET1 Capital must be positive"),
                Warning::new("CET1 Capital was not populated"),
                Warning::new("AT1 Capital was not populated"),
            ]
        );
    }

    #[test]
    fn test_validate_is_deterministic() {
        let validator = Validator::strict();
        let input = fields(Some(0.0), None);
        assert_eq!(validator.validate(&input), validator.validate(&input));
    }

    #[test]
    fn test_empty_validator() {
        assert!(Validator::empty().is_empty());
        assert!(Validator::empty().validate(&fields(None, None)).is_empty());
    }
}
