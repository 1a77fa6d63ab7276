// Instruction block for single-shot regulatory figure extraction

pub const DEFAULT_PREAMBLE: &str = "You are a regulatory reporting assistant.

Use ONLY the regulatory text below.
Do NOT invent rules.
Return STRICT JSON only.
Do not include explanations or markdown.";

/// Builds the prompt sent to the generation capability.
///
/// Composition is a pure function of its inputs, so the exact prompt can be
/// asserted on without calling a model.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    preamble: String,
    currency_code: String,
    currency_symbol: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self {
            preamble: DEFAULT_PREAMBLE.to_string(),
            currency_code: "GBP".to_string(),
            currency_symbol: "£".to_string(),
        }
    }
}

impl PromptComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Currency used in the unit-normalization instruction, e.g. `("EUR", "€")`.
    pub fn with_currency(mut self, code: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.currency_code = code.into();
        self.currency_symbol = symbol.into();
        self
    }

    pub fn compose(&self, regulatory_text: &str, scenario: &str, field_names: &[&str]) -> String {
        format!(
            "{preamble}\n\n\
             IMPORTANT:\n\
             - Values must be returned as absolute {code} amounts\n  \
             (e.g., {symbol}120 million = 120000000).\n\n\
             Regulatory Text:\n{regulatory_text}\n\n\
             User Scenario:\n{scenario}\n\n\
             Required JSON format:\n{shape}\n",
            preamble = self.preamble,
            code = self.currency_code,
            symbol = self.currency_symbol,
            shape = required_shape(field_names),
        )
    }
}

fn required_shape(field_names: &[&str]) -> String {
    let entries: Vec<String> = field_names
        .iter()
        .map(|name| {
            format!(
                "  \"{}\": {{\n    \"value\": number,\n    \"rule\": \"exact rule reference\"\n  }}",
                name
            )
        })
        .collect();

    format!("{{\n{}\n}}", entries.join(",\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = "CET1 capital is defined in Article 26 CRR.\nAT1 capital is defined in Article 51 CRR.";
    const SCENARIO: &str = "The bank has CET1 capital of £120 million and AT1 capital of £30 million.";

    #[test]
    fn test_compose_is_deterministic() {
        let composer = PromptComposer::new();
        let names = ["CET1 Capital", "AT1 Capital"];
        assert_eq!(
            composer.compose(RULES, SCENARIO, &names),
            composer.compose(RULES, SCENARIO, &names)
        );
    }

    #[test]
    fn test_compose_embeds_inputs_verbatim() {
        let prompt = PromptComposer::new().compose(RULES, SCENARIO, &["CET1 Capital"]);
        assert!(prompt.contains(RULES));
        assert!(prompt.contains(SCENARIO));
        assert!(prompt.contains("Use ONLY the regulatory text below."));
        assert!(prompt.contains("Do NOT invent rules."));
        assert!(prompt.contains("Return STRICT JSON only."));
        assert!(prompt.contains("£120 million = 120000000"));
        assert!(prompt.contains("absolute GBP amounts"));
    }

    #[test]
    fn test_required_shape_follows_field_order() {
        let shape = required_shape(&["CET1 Capital", "AT1 Capital"]);
        assert_eq!(
            shape,
            "{\n  \"CET1 Capital\": {\n    \"value\": number,\n    \"rule\": \"exact rule reference\"\n  },\n  \"AT1 Capital\": {\n    \"value\": number,\n    \"rule\": \"exact rule reference\"\n  }\n}"
        );
    }

    #[test]
    fn test_custom_currency_and_preamble() {
        let prompt = PromptComposer::new()
            .with_preamble("Custom preamble.")
            .with_currency("EUR", "€")
            .compose(RULES, SCENARIO, &["AT1 Capital"]);
        assert!(prompt.starts_with("Custom preamble."));
        assert!(prompt.contains("absolute EUR amounts"));
        assert!(prompt.contains("€120 million"));
        assert!(!prompt.contains("CET1 Capital\": {"));
    }
}
