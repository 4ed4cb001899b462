//! Prompt Builder: fills one of the three fixed templates with the inputs.
//!
//! Interpolation is raw and single-pass. Inputs are never escaped, truncated
//! or re-scanned, so placeholder-like text inside a resume stays verbatim.

use crate::analysis::kinds::OutputKind;
use crate::analysis::prompts::{
    INTERVIEW_GUIDE_TEMPLATE, MATCHING_ANALYSIS_TEMPLATE, TAILORED_CV_TEMPLATE,
};
use crate::errors::AppError;
use crate::llm_client::prompts::{
    ADVISOR_PERSONA, MARKDOWN_FORMAT_INSTRUCTION, NO_FABRICATION_INSTRUCTION,
};

/// One validated unit of work for the generation client.
#[derive(Debug, Clone)]
pub struct AnalysisRequest<'a> {
    pub kind: OutputKind,
    pub resume_text: &'a str,
    pub job_text: &'a str,
}

impl<'a> AnalysisRequest<'a> {
    /// Both texts must contain something other than whitespace.
    pub fn new(
        kind: OutputKind,
        resume_text: &'a str,
        job_text: &'a str,
    ) -> Result<Self, AppError> {
        let mut missing = Vec::new();
        if resume_text.trim().is_empty() {
            missing.push("resume");
        }
        if job_text.trim().is_empty() {
            missing.push("job description");
        }
        if !missing.is_empty() {
            return Err(AppError::MissingInput(format!(
                "{} text is empty",
                missing.join(" and ")
            )));
        }

        Ok(Self {
            kind,
            resume_text,
            job_text,
        })
    }

    pub fn prompt(&self) -> String {
        build_prompt(self.kind, self.resume_text, self.job_text)
    }
}

pub fn build_prompt(kind: OutputKind, resume_text: &str, job_text: &str) -> String {
    let template = match kind {
        OutputKind::MatchingAnalysis => MATCHING_ANALYSIS_TEMPLATE,
        OutputKind::TailoredCv => TAILORED_CV_TEMPLATE,
        OutputKind::InterviewGuide => INTERVIEW_GUIDE_TEMPLATE,
    };

    fill_template(
        template,
        &[
            ("persona", ADVISOR_PERSONA),
            ("format_instruction", MARKDOWN_FORMAT_INSTRUCTION),
            ("no_fabrication", NO_FABRICATION_INSTRUCTION),
            ("resume_text", resume_text),
            ("job_text", job_text),
        ],
    )
}

/// Replaces `{name}` placeholders in one left-to-right pass.
/// Braces that do not name a known placeholder are copied through.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let hit = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });

        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
