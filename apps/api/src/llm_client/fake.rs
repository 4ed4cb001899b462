//! Scripted `TextGenerator` for tests. Never touches the network.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{ApiKey, LlmError, TextGenerator};

type Responder = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

pub struct FakeGenerator {
    respond: Responder,
    prompts: Mutex<Vec<String>>,
    accepts_credentials: bool,
}

impl FakeGenerator {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
            accepts_credentials: true,
        }
    }

    /// Answers every prompt with a plausible report for its kind.
    pub fn canned() -> Self {
        Self::new(|prompt| Ok(canned_markdown(prompt).to_string()))
    }

    pub fn rejecting_credentials(mut self) -> Self {
        self.accepts_credentials = false;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

/// Picks a response by the structural markers each template carries.
pub fn canned_markdown(prompt: &str) -> &'static str {
    if prompt.contains("STAR Method") {
        "## Likely Interview Questions\n1. Tell me about your Python work.\n\n\
         ## Questions to Ask the Interviewer\n- a\n- b\n- c\n- d\n- e\n\n\
         ## STAR Method Examples\n**Situation** ..."
    } else if prompt.contains("ATS-compatible") {
        "## Summary\nBackend engineer with 5 years of Python.\n\n\
         ## Experience\n\n## Skills\n- Python\n\n## Education\n"
    } else {
        "## Fit Score\nFit Score: 72%\n\n## Keywords to Include\n- cloud\n- senior"
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, _credential: &ApiKey, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }

    async fn verify_credential(&self, _credential: &ApiKey) -> Result<(), LlmError> {
        if self.accepts_credentials {
            Ok(())
        } else {
            Err(LlmError::Api {
                status: 400,
                message: "API key not valid. Please pass a valid API key.".to_string(),
            })
        }
    }
}
