//! Per-session state machine.
//!
//! awaiting_inputs ⇄ inputs_ready → generating → results_available
//!
//! Generation is only ever started by an explicit trigger. While a run is in
//! flight the inputs are frozen and a second trigger is refused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::kinds::OutputKind;
use crate::analysis::store::{GenerationResult, ResultStore};
use crate::errors::AppError;
use crate::extraction::DocumentKind;
use crate::llm_client::ApiKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingInputs,
    InputsReady,
    Generating,
    ResultsAvailable,
}

/// The two inputs a session collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputSlot {
    Resume,
    JobDescription,
}

impl InputSlot {
    pub fn label(self) -> &'static str {
        match self {
            InputSlot::Resume => "resume",
            InputSlot::JobDescription => "job description",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum InputSource {
    Upload {
        file_name: Option<String>,
        kind: DocumentKind,
    },
    FreeText,
}

/// Extracted text for one slot. Replaced wholesale on the next upload.
#[derive(Debug, Clone)]
pub struct InputText {
    pub source: InputSource,
    pub text: String,
    pub char_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    #[serde(flatten)]
    pub source: InputSource,
    pub char_count: usize,
    pub usable: bool,
}

impl InputText {
    pub fn new(source: InputSource, text: String) -> Self {
        let char_count = text.chars().count();
        Self {
            source,
            text,
            char_count,
        }
    }

    /// Blank text (for example an image-only PDF) counts as missing input.
    pub fn is_usable(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn summary(&self) -> InputSummary {
        InputSummary {
            source: self.source.clone(),
            char_count: self.char_count,
            usable: self.is_usable(),
        }
    }
}

/// Snapshot taken when a run starts. The run works from this, not the session.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub credential: ApiKey,
    pub resume_text: String,
    pub job_text: String,
    pub kinds: Vec<OutputKind>,
}

#[derive(Debug)]
pub struct Session {
    id: Uuid,
    credential: ApiKey,
    created_at: DateTime<Utc>,
    phase: Phase,
    resume: Option<InputText>,
    job_description: Option<InputText>,
    results: ResultStore,
}

impl Session {
    pub fn new(credential: ApiKey) -> Self {
        Self {
            id: Uuid::new_v4(),
            credential,
            created_at: Utc::now(),
            phase: Phase::AwaitingInputs,
            resume: None,
            job_description: None,
            results: ResultStore::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn input(&self, slot: InputSlot) -> Option<&InputText> {
        match slot {
            InputSlot::Resume => self.resume.as_ref(),
            InputSlot::JobDescription => self.job_description.as_ref(),
        }
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Labels of slots that are absent or blank.
    pub fn missing_inputs(&self) -> Vec<&'static str> {
        [InputSlot::Resume, InputSlot::JobDescription]
            .into_iter()
            .filter(|slot| !self.input(*slot).is_some_and(InputText::is_usable))
            .map(InputSlot::label)
            .collect()
    }

    pub fn inputs_ready(&self) -> bool {
        self.missing_inputs().is_empty()
    }

    /// Replaces one input and recomputes readiness.
    ///
    /// Once results exist the phase stays `ResultsAvailable`; they remain
    /// readable and a new trigger checks readiness itself.
    pub fn set_input(&mut self, slot: InputSlot, input: InputText) -> Result<Phase, AppError> {
        if self.phase == Phase::Generating {
            return Err(AppError::Conflict(format!(
                "cannot replace the {} while generation is running",
                slot.label()
            )));
        }

        match slot {
            InputSlot::Resume => self.resume = Some(input),
            InputSlot::JobDescription => self.job_description = Some(input),
        }

        if self.phase != Phase::ResultsAvailable {
            self.phase = if self.inputs_ready() {
                Phase::InputsReady
            } else {
                Phase::AwaitingInputs
            };
        }
        Ok(self.phase)
    }

    /// Validates inputs and enters `Generating`. Nothing is sent on error.
    pub fn begin_generation(&mut self, kinds: &[OutputKind]) -> Result<GenerationJob, AppError> {
        if self.phase == Phase::Generating {
            return Err(AppError::Conflict(
                "generation is already running for this session".to_string(),
            ));
        }

        let missing = self.missing_inputs();
        if !missing.is_empty() {
            return Err(AppError::MissingInput(format!(
                "{} text is empty",
                missing.join(" and ")
            )));
        }

        let (Some(resume), Some(job_description)) = (&self.resume, &self.job_description) else {
            return Err(AppError::MissingInput(
                "resume and job description are required".to_string(),
            ));
        };

        let job = GenerationJob {
            credential: self.credential.clone(),
            resume_text: resume.text.clone(),
            job_text: job_description.text.clone(),
            kinds: kinds.to_vec(),
        };
        self.phase = Phase::Generating;
        Ok(job)
    }

    pub fn record(&mut self, result: GenerationResult) {
        self.results.put(result);
    }

    pub fn finish_generation(&mut self) -> Phase {
        self.phase = Phase::ResultsAvailable;
        self.phase
    }

    /// Leaves `Generating` for a run that ended without `finish_generation`.
    /// Results recorded before the run stopped are kept.
    pub fn abandon_generation(&mut self) -> Phase {
        if self.phase == Phase::Generating {
            self.phase = if !self.results.is_empty() {
                Phase::ResultsAvailable
            } else if self.inputs_ready() {
                Phase::InputsReady
            } else {
                Phase::AwaitingInputs
            };
        }
        self.phase
    }
}
