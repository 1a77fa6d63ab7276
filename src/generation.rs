use std::future::Future;

use crate::error::Result;

/// A single prompt sent to the generation capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    /// Ask the backend for a JSON response MIME type, where supported.
    pub json_mode: bool,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            json_mode: false,
        }
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Given a prompt, returns unstructured text.
///
/// No schema is enforced here: structure recovery happens in
/// [`crate::recover`]. Transport, auth and quota failures are returned as
/// errors and must not be masked by implementors.
pub trait TextGenerator {
    fn generate(&self, request: &GenerationRequest) -> impl Future<Output = Result<String>> + Send;
}
