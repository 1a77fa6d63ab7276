use std::collections::BTreeMap;

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CorepError, Result};
use crate::schema::{FieldEntry, FieldId};

const FENCE: &str = "```";

/// Top-level JSON object parsed out of a model response.
///
/// Values stay untyped until a registered field is looked up, so keys the
/// registry does not know about never affect a run.
#[derive(Debug, Clone, Default)]
pub struct RecoveredPayload {
    entries: BTreeMap<String, Value>,
    raw: String,
}

impl RecoveredPayload {
    /// The `value`/`rule` pair stored under `name`.
    ///
    /// A present entry that is not `{value: number, rule: string}` is a
    /// malformed response carrying the original raw text.
    pub fn get(&self, name: &str) -> Result<Option<FieldEntry>> {
        let Some(value) = self.entries.get(name) else {
            return Ok(None);
        };

        FieldEntry::deserialize(value)
            .map(Some)
            .map_err(|e| CorepError::MalformedResponse {
                raw: self.raw.clone(),
                reason: format!("entry '{}': {}", name, e),
            })
    }

    pub fn entry(&self, id: FieldId) -> Result<Option<FieldEntry>> {
        self.get(id.name())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Model output this payload was recovered from.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for RecoveredPayload {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Into<String>> FromIterator<(K, FieldEntry)> for RecoveredPayload {
    fn from_iter<I: IntoIterator<Item = (K, FieldEntry)>>(iter: I) -> Self {
        let entries: BTreeMap<String, Value> = iter
            .into_iter()
            .map(|(k, v)| {
                let entry = serde_json::json!({ "value": v.value, "rule": v.rule });
                (k.into(), entry)
            })
            .collect();
        let raw = serde_json::to_string(&entries).unwrap_or_default();
        Self { entries, raw }
    }
}

/// Parse a raw model response into a [`RecoveredPayload`].
///
/// Only syntax and the top-level shape (a JSON object) are checked here. On
/// failure the error carries `raw` exactly as received, fences included.
pub fn recover(raw: &str) -> Result<RecoveredPayload> {
    let candidate = strip_fences(raw);
    debug!(
        "Recovering payload: {} raw bytes, {} candidate bytes",
        raw.len(),
        candidate.len()
    );

    let entries = serde_json::from_str(candidate).map_err(|e| CorepError::MalformedResponse {
        raw: raw.to_string(),
        reason: e.to_string(),
    })?;

    Ok(RecoveredPayload {
        entries,
        raw: raw.to_string(),
    })
}

/// Return the substring expected to hold the JSON payload.
///
/// Input that does not start with a fence is only trimmed. Fenced input keeps
/// the text between the first and second fence, minus a leading language tag
/// line such as `json`.
pub fn strip_fences(raw: &str) -> &str {
    let text = raw.trim();
    if !text.starts_with(FENCE) {
        return text;
    }

    match text.split(FENCE).nth(1) {
        Some(segment) => drop_language_tag(segment).trim(),
        None => text,
    }
}

fn drop_language_tag(segment: &str) -> &str {
    match segment.split_once('\n') {
        Some((first, rest)) if is_language_tag(first.trim()) => rest,
        _ => segment,
    }
}

fn is_language_tag(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
}
