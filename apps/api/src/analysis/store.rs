//! Session Result Store: the latest generation outcome per output kind.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::kinds::OutputKind;

/// Either the generated Markdown or the reason the call failed, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Generated { markdown: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub kind: OutputKind,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub completed_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn generated(kind: OutputKind, markdown: String) -> Self {
        Self {
            kind,
            outcome: Outcome::Generated { markdown },
            completed_at: Utc::now(),
        }
    }

    pub fn failed(kind: OutputKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            outcome: Outcome::Failed {
                reason: reason.into(),
            },
            completed_at: Utc::now(),
        }
    }

    pub fn markdown(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Generated { markdown } => Some(markdown),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Generated { .. } => None,
            Outcome::Failed { reason } => Some(reason),
        }
    }
}

/// Key-overwrite map bounded by the three kinds. Iterates in generation order.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: BTreeMap<OutputKind, GenerationResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `result` under its kind, replacing whatever was there.
    pub fn put(&mut self, result: GenerationResult) {
        self.results.insert(result.kind, result);
    }

    pub fn get(&self, kind: OutputKind) -> Option<&GenerationResult> {
        self.results.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenerationResult> {
        self.results.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
