//! # COREP Extractor
//!
//! A library for turning a free-text description of a bank's capital position
//! into validated COREP figures, each tagged with the regulatory rule that
//! justifies it.
//!
//! ## Pipeline
//!
//! - **Prompt**: regulatory excerpt + scenario + target fields → one strict-JSON instruction block
//! - **Generation**: a single call to a [`TextGenerator`] returning unstructured text
//! - **Recovery**: fence stripping and parsing into a [`RecoveredPayload`]
//! - **Population**: exact-name join onto a fresh [`Field`] set from the [`SchemaRegistry`]
//! - **Validation**: ordered plausibility rules producing [`Warning`]s
//!
//! ## Example
//!
//! ```rust,ignore
//! use corep_extractor::*;
//!
//! let client = GeminiClient::from_env()?;
//! let extractor = CapitalExtractor::new(client);
//!
//! let outcome = extractor
//!     .run_from_source(
//!         &FileTextSource::new("rules/own_funds_rules.txt"),
//!         "The bank has CET1 capital of £120 million and AT1 capital of £30 million.",
//!     )
//!     .await?;
//!
//! println!("{}", AuditReport::from_outcome(&outcome).render_text());
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod prompt;
pub mod recover;
pub mod report;
pub mod schema;
pub mod source;
pub mod validation;

#[cfg(feature = "gemini")]
pub mod llm;

pub use config::{ExtractorConfig, MissingFieldPolicy, DEFAULT_MODEL};
pub use error::{CorepError, Result};
pub use extractor::{populate_fields, CapitalExtractor, ExtractionEvent, ExtractionOutcome};
pub use generation::{GenerationRequest, TextGenerator};
pub use prompt::PromptComposer;
pub use recover::{recover, strip_fences, RecoveredPayload};
pub use report::AuditReport;
pub use schema::{Field, FieldDefinition, FieldEntry, FieldId, SchemaRegistry};
pub use source::{FileTextSource, StaticTextSource, TextSource};
pub use validation::{
    NonNegativeRule, PositiveValueRule, RequiredFieldRule, ValidationRule, Validator, Warning,
};

#[cfg(feature = "gemini")]
pub use llm::GeminiClient;

/// Recover, populate and validate an already obtained model response.
///
/// This is the deterministic tail of [`CapitalExtractor::run`] and needs no
/// generation capability.
pub fn process_response(
    registry: &SchemaRegistry,
    validator: &Validator,
    raw_response: &str,
    policy: MissingFieldPolicy,
) -> Result<(Vec<Field>, Vec<Warning>)> {
    let payload = recover(raw_response)?;
    let fields = populate_fields(registry, &payload, policy)?;
    let warnings = validator.validate(&fields);
    Ok((fields, warnings))
}
