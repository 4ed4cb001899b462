use std::fmt;

use serde::{Deserialize, Serialize};

/// The three outputs the pipeline produces, one LLM call each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    MatchingAnalysis,
    TailoredCv,
    InterviewGuide,
}

impl OutputKind {
    /// Every kind, in generation order.
    pub const ALL: [OutputKind; 3] = [
        OutputKind::MatchingAnalysis,
        OutputKind::TailoredCv,
        OutputKind::InterviewGuide,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            OutputKind::MatchingAnalysis => "matching-analysis",
            OutputKind::TailoredCv => "tailored-cv",
            OutputKind::InterviewGuide => "interview-guide",
        }
    }

    /// Fixed name of the Markdown download.
    pub fn download_file_name(self) -> &'static str {
        match self {
            OutputKind::MatchingAnalysis => "resume_analysis_report.md",
            OutputKind::TailoredCv => "customized_resume.md",
            OutputKind::InterviewGuide => "interview_preparation_guide.md",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
