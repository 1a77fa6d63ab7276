use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;

use crate::config::{ExtractorConfig, MissingFieldPolicy};
use crate::error::{CorepError, Result};
use crate::generation::{GenerationRequest, TextGenerator};
use crate::prompt::PromptComposer;
use crate::recover::{recover, RecoveredPayload};
use crate::schema::{Field, SchemaRegistry};
use crate::source::TextSource;
use crate::validation::{Validator, Warning};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExtractionEvent {
    Starting,
    Composed { prompt_chars: usize },
    Invoking { attempt: u32 },
    Retry { attempt: u32, error: String },
    Recovered { keys: usize },
    Populated { populated: usize, unset: usize },
    Validated { warnings: usize },
    Success,
    Failed { reason: String },
}

/// Result of one successful run: populated fields in template order plus the
/// validation warnings for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub template_code: String,
    pub fields: Vec<Field>,
    pub warnings: Vec<Warning>,
    /// Model output exactly as received.
    pub raw_response: String,
}

impl ExtractionOutcome {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Copy matching payload entries onto a fresh field set.
///
/// Matching is by exact field name. Payload keys outside the registry are
/// ignored whatever their shape. A registered field whose entry is not a
/// `value`/`rule` pair is a malformed response. A registered field with no
/// entry stays unset under [`MissingFieldPolicy::Lenient`] and aborts under
/// [`MissingFieldPolicy::Strict`].
pub fn populate_fields(
    registry: &SchemaRegistry,
    payload: &RecoveredPayload,
    policy: MissingFieldPolicy,
) -> Result<Vec<Field>> {
    let mut fields = registry.new_field_set();

    for field in &mut fields {
        match payload.entry(field.id)? {
            Some(entry) => field.populate(&entry),
            None if policy == MissingFieldPolicy::Strict => {
                return Err(CorepError::MissingField(field.name.clone()));
            }
            None => warn!("No entry for '{}' in model response; leaving unset", field.name),
        }
    }

    for key in payload.keys().filter(|k| registry.find_by_name(k).is_none()) {
        debug!("Ignoring unregistered payload key '{}'", key);
    }

    Ok(fields)
}

pub struct CapitalExtractor<G> {
    generator: G,
    registry: SchemaRegistry,
    composer: PromptComposer,
    validator: Validator,
    config: ExtractorConfig,
}

impl<G: TextGenerator> CapitalExtractor<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            registry: SchemaRegistry::default(),
            composer: PromptComposer::default(),
            validator: Validator::default(),
            config: ExtractorConfig::default(),
        }
    }

    pub fn with_registry(mut self, registry: SchemaRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_composer(mut self, composer: PromptComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_config(mut self, config: ExtractorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn compose_prompt(&self, regulatory_text: &str, scenario: &str) -> String {
        self.composer
            .compose(regulatory_text, scenario, &self.registry.field_names())
    }

    pub async fn run(&self, regulatory_text: &str, scenario: &str) -> Result<ExtractionOutcome> {
        self.run_with_progress(regulatory_text, scenario, None).await
    }

    /// Read the excerpt from `source` first; a read failure aborts before
    /// any prompt is composed.
    pub async fn run_from_source<S: TextSource + ?Sized>(
        &self,
        source: &S,
        scenario: &str,
    ) -> Result<ExtractionOutcome> {
        let regulatory_text = source.read_text()?;
        self.run(&regulatory_text, scenario).await
    }

    pub async fn run_with_progress(
        &self,
        regulatory_text: &str,
        scenario: &str,
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<ExtractionOutcome> {
        self.send_event(&progress, ExtractionEvent::Starting).await;

        let result = self.execute(regulatory_text, scenario, &progress).await;

        match &result {
            Ok(_) => self.send_event(&progress, ExtractionEvent::Success).await,
            Err(e) => {
                self.send_event(
                    &progress,
                    ExtractionEvent::Failed {
                        reason: e.to_string(),
                    },
                )
                .await
            }
        }

        result
    }

    async fn execute(
        &self,
        regulatory_text: &str,
        scenario: &str,
        progress: &Option<Sender<ExtractionEvent>>,
    ) -> Result<ExtractionOutcome> {
        let prompt = self.compose_prompt(regulatory_text, scenario);
        self.send_event(
            progress,
            ExtractionEvent::Composed {
                prompt_chars: prompt.chars().count(),
            },
        )
        .await;

        let request = GenerationRequest::new(&self.config.model, prompt)
            .with_json_mode(self.config.json_mode);

        info!(
            "Requesting {} figures from model {}",
            self.registry.template_code(),
            self.config.model
        );
        let raw_response = self.generate_with_retry(&request, progress).await?;

        let payload = recover(&raw_response)?;
        self.send_event(progress, ExtractionEvent::Recovered { keys: payload.len() })
            .await;

        let fields = populate_fields(
            &self.registry,
            &payload,
            self.config.missing_field_policy,
        )?;
        let populated = fields.iter().filter(|f| f.is_populated()).count();
        self.send_event(
            progress,
            ExtractionEvent::Populated {
                populated,
                unset: fields.len() - populated,
            },
        )
        .await;

        let warnings = self.validator.validate(&fields);
        self.send_event(
            progress,
            ExtractionEvent::Validated {
                warnings: warnings.len(),
            },
        )
        .await;

        info!(
            "Populated {}/{} fields with {} validation warning(s)",
            populated,
            fields.len(),
            warnings.len()
        );

        Ok(ExtractionOutcome {
            template_code: self.registry.template_code().to_string(),
            fields,
            warnings,
            raw_response,
        })
    }

    async fn generate_with_retry(
        &self,
        request: &GenerationRequest,
        progress: &Option<Sender<ExtractionEvent>>,
    ) -> Result<String> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.send_event(progress, ExtractionEvent::Invoking { attempt })
                .await;

            match self.generate_once(request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt <= self.config.max_retries => {
                    warn!("Generation attempt {} failed, retrying: {}", attempt, e);
                    self.send_event(
                        progress,
                        ExtractionEvent::Retry {
                            attempt,
                            error: e.to_string(),
                        },
                    )
                    .await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn generate_once(&self, request: &GenerationRequest) -> Result<String> {
        let text = match self.config.timeout() {
            Some(limit) => tokio::time::timeout(limit, self.generator.generate(request))
                .await
                .map_err(|_| CorepError::Timeout(limit))??,
            None => self.generator.generate(request).await?,
        };

        if text.trim().is_empty() {
            return Err(CorepError::Generation(
                "Model returned an empty response".to_string(),
            ));
        }

        debug!("Received {} bytes from model", text.len());
        Ok(text)
    }

    async fn send_event(&self, sender: &Option<Sender<ExtractionEvent>>, event: ExtractionEvent) {
        if let Some(tx) = sender {
            let _ = tx.send(event).await;
        }
    }
}
