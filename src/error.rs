use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorepError {
    #[error("Could not read regulatory text from {origin}: {source}")]
    TextSource {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Generation API error (status {status}): {body}")]
    GenerationStatus { status: u16, body: String },

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model did not return valid JSON ({reason}):\n\n{raw}")]
    MalformedResponse { raw: String, reason: String },

    #[error("Recovered payload has no entry for required field '{0}'")]
    MissingField(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl CorepError {
    /// Whether the failure is a transient generation fault worth retrying.
    ///
    /// Malformed responses are a prompt/model contract defect and never qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::GenerationStatus { status, .. } => *status == 429 || *status >= 500,
            #[cfg(feature = "gemini")]
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The untouched model output attached to a malformed-response failure.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CorepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CorepError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(CorepError::GenerationStatus {
            status: 429,
            body: "quota".into()
        }
        .is_transient());
        assert!(CorepError::GenerationStatus {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!CorepError::GenerationStatus {
            status: 401,
            body: "bad key".into()
        }
        .is_transient());
        assert!(!CorepError::MalformedResponse {
            raw: "{".into(),
            reason: "eof".into()
        }
        .is_transient());
    }

    #[test]
    fn test_raw_response_only_for_malformed() {
        let err = CorepError::MalformedResponse {
            raw: "Sure! {not json}".into(),
            reason: "expected value".into(),
        };
        assert_eq!(err.raw_response(), Some("Sure! {not json}"));
        assert!(err.to_string().contains("Sure! {not json}"));
        assert_eq!(CorepError::Generation("down".into()).raw_response(), None);
    }
}
