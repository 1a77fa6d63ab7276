use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extractor::ExtractionOutcome;
use crate::schema::Field;
use crate::validation::Warning;

/// Audit record of one run: every field with the rule that justifies it,
/// plus the validation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub template_code: String,
    pub generated_at: DateTime<Utc>,
    pub currency_symbol: String,
    pub fields: Vec<Field>,
    pub warnings: Vec<Warning>,
}

impl AuditReport {
    pub fn new(
        template_code: impl Into<String>,
        fields: Vec<Field>,
        warnings: Vec<Warning>,
    ) -> Self {
        Self {
            template_code: template_code.into(),
            generated_at: Utc::now(),
            currency_symbol: "£".to_string(),
            fields,
            warnings,
        }
    }

    pub fn from_outcome(outcome: &ExtractionOutcome) -> Self {
        Self::new(
            outcome.template_code.clone(),
            outcome.fields.clone(),
            outcome.warnings.clone(),
        )
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "--- COREP TEMPLATE EXTRACT ({}) ---", self.template_code);
        for field in &self.fields {
            let value = match field.value {
                Some(v) => format!("{}{}", self.currency_symbol, v),
                None => "(not populated)".to_string(),
            };
            let _ = writeln!(out, "{} | {} | {}", field.code, field.name, value);
        }

        let _ = writeln!(out, "\n--- VALIDATION ---");
        if self.warnings.is_empty() {
            let _ = writeln!(out, "No validation issues found");
        } else {
            for warning in &self.warnings {
                let _ = writeln!(out, "WARNING: {}", warning);
            }
        }

        let _ = writeln!(out, "\n--- AUDIT LOG ---");
        for field in &self.fields {
            let rule = field.rule.as_deref().unwrap_or("(no rule cited)");
            let _ = writeln!(out, "{} justified by {}", field.name, rule);
        }

        out
    }
}
