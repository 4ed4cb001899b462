//! Analysis pipeline: runs the generation calls for one session.
//!
//! Flow: begin_generation (validate + snapshot) → for each kind in order:
//!       build prompt → generate → record outcome → finish_generation.
//!
//! Calls are strictly sequential. A failed call is recorded as that kind's
//! failure and the run moves on to the next kind.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::analysis::kinds::OutputKind;
use crate::analysis::prompt_builder::AnalysisRequest;
use crate::analysis::store::GenerationResult;
use crate::errors::AppError;
use crate::llm_client::{LlmError, TextGenerator};
use crate::session::machine::{GenerationJob, Phase};
use crate::session::registry::SessionHandle;

#[derive(Debug, Clone, Serialize)]
pub struct KindOutcome {
    pub kind: OutputKind,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub phase: Phase,
    pub outcomes: Vec<KindOutcome>,
}

impl RunReport {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }
}

/// Runs `kinds` for the session and returns once every call has completed.
///
/// Fails only when the run cannot start (missing input, run already active).
/// The session lock is never held across an external call.
pub async fn run_generation(
    session: &SessionHandle,
    generator: &dyn TextGenerator,
    kinds: &[OutputKind],
    timeout: Option<Duration>,
) -> Result<RunReport, AppError> {
    let (session_id, job) = {
        let mut guard = session.lock().await;
        let job = guard.begin_generation(kinds)?;
        (guard.id(), job)
    };

    info!(
        "Session {session_id}: generating {} output(s) (resume {} chars, job {} chars)",
        job.kinds.len(),
        job.resume_text.chars().count(),
        job.job_text.chars().count()
    );

    let mut outcomes = Vec::with_capacity(job.kinds.len());
    for &kind in &job.kinds {
        let result = generate_one(generator, &job, kind, timeout).await;
        outcomes.push(KindOutcome {
            kind,
            succeeded: result.markdown().is_some(),
            reason: result.failure_reason().map(str::to_owned),
        });
        session.lock().await.record(result);
    }

    let (phase, stored) = {
        let mut guard = session.lock().await;
        (guard.finish_generation(), guard.results().len())
    };
    let report = RunReport { phase, outcomes };

    if report.failed_count() > 0 {
        warn!(
            "Session {session_id}: run finished with {}/{} failed output(s)",
            report.failed_count(),
            report.outcomes.len()
        );
    } else {
        info!("Session {session_id}: run finished ({stored} result(s) stored)");
    }

    Ok(report)
}

/// Same as [`run_generation`], on its own task so a dropped request cannot
/// leave the session stuck in `Generating`. A run that panics is abandoned
/// and the session accepts inputs and triggers again.
pub async fn run_to_completion(
    session: SessionHandle,
    generator: Arc<dyn TextGenerator>,
    kinds: Vec<OutputKind>,
    timeout: Option<Duration>,
) -> Result<RunReport, AppError> {
    let task_session = session.clone();
    let task = tokio::spawn(async move {
        run_generation(&task_session, generator.as_ref(), &kinds, timeout).await
    });

    match task.await {
        Ok(report) => report,
        Err(e) => {
            let mut guard = session.lock().await;
            let phase = guard.abandon_generation();
            error!("Session {}: generation task failed, now {phase:?}: {e}", guard.id());
            Err(AppError::Internal(anyhow::anyhow!("generation task failed: {e}")))
        }
    }
}

async fn generate_one(
    generator: &dyn TextGenerator,
    job: &GenerationJob,
    kind: OutputKind,
    timeout: Option<Duration>,
) -> GenerationResult {
    let request = match AnalysisRequest::new(kind, &job.resume_text, &job.job_text) {
        Ok(request) => request,
        Err(e) => return GenerationResult::failed(kind, e.to_string()),
    };
    let prompt = request.prompt();
    debug!("Issuing {kind} call ({} char prompt)", prompt.chars().count());

    let call = generator.generate(&job.credential, &prompt);
    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(LlmError::Timeout {
                secs: limit.as_secs(),
            })),
        None => call.await,
    };

    match outcome {
        Ok(markdown) => {
            info!("{kind} generated ({} chars)", markdown.chars().count());
            GenerationResult::generated(kind, markdown)
        }
        Err(e) => {
            warn!("{kind} generation failed: {e}");
            GenerationResult::failed(kind, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::llm_client::fake::FakeGenerator;
    use crate::llm_client::ApiKey;
    use crate::session::machine::{InputSlot, InputSource, InputText, Session};

    const RESUME: &str = "5 years Python backend experience";
    const JOB: &str = "Seeking senior Python engineer with cloud experience";

    fn ready_session(resume: &str, job: &str) -> SessionHandle {
        let mut session = Session::new(ApiKey::parse("k").unwrap());
        session
            .set_input(
                InputSlot::Resume,
                InputText::new(InputSource::FreeText, resume.into()),
            )
            .unwrap();
        session
            .set_input(
                InputSlot::JobDescription,
                InputText::new(InputSource::FreeText, job.into()),
            )
            .unwrap();
        Arc::new(Mutex::new(session))
    }

    #[tokio::test]
    async fn test_all_kinds_run_in_fixed_order() {
        let session = ready_session(RESUME, JOB);
        let generator = FakeGenerator::canned();

        let report = run_generation(&session, &generator, &OutputKind::ALL, None)
            .await
            .unwrap();

        assert_eq!(report.phase, Phase::ResultsAvailable);
        assert_eq!(report.failed_count(), 0);
        let kinds: Vec<_> = report.outcomes.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, OutputKind::ALL.to_vec());

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("Fit Score"));
        assert!(prompts[1].contains("ATS-compatible"));
        assert!(prompts[2].contains("STAR Method"));
        assert!(prompts.iter().all(|p| p.contains(RESUME) && p.contains(JOB)));

        let guard = session.lock().await;
        assert_eq!(guard.results().len(), 3);
        assert_eq!(guard.phase(), Phase::ResultsAvailable);
    }

    #[tokio::test]
    async fn test_empty_job_text_is_rejected_without_any_call() {
        let session = ready_session(RESUME, "   ");
        let generator = FakeGenerator::canned();

        let err = run_generation(&session, &generator, &OutputKind::ALL, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingInput(_)));
        assert_eq!(generator.call_count(), 0);
        assert_eq!(session.lock().await.phase(), Phase::AwaitingInputs);
    }

    #[tokio::test]
    async fn test_tailored_cv_failure_does_not_block_siblings() {
        let session = ready_session(RESUME, JOB);
        let generator = FakeGenerator::new(|prompt| {
            if prompt.contains("ATS-compatible") {
                Err(LlmError::Api {
                    status: 429,
                    message: "Resource has been exhausted".into(),
                })
            } else {
                Ok(crate::llm_client::fake::canned_markdown(prompt).to_string())
            }
        });

        let report = run_generation(&session, &generator, &OutputKind::ALL, None)
            .await
            .unwrap();

        assert_eq!(generator.call_count(), 3);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.outcomes[1].succeeded);
        assert!(report.outcomes[1]
            .reason
            .as_deref()
            .unwrap()
            .contains("Resource has been exhausted"));

        let guard = session.lock().await;
        let store = guard.results();
        assert!(store.get(OutputKind::MatchingAnalysis).unwrap().markdown().is_some());
        assert!(store.get(OutputKind::InterviewGuide).unwrap().markdown().is_some());
        assert!(store.get(OutputKind::TailoredCv).unwrap().failure_reason().is_some());
        assert_eq!(guard.phase(), Phase::ResultsAvailable);
    }

    #[tokio::test]
    async fn test_rerun_overwrites_previous_results() {
        let session = ready_session(RESUME, JOB);
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let generator = FakeGenerator::new(move |_| {
            Ok(format!("run {}", seen.fetch_add(1, Ordering::SeqCst) / 3))
        });

        run_generation(&session, &generator, &OutputKind::ALL, None)
            .await
            .unwrap();
        run_generation(&session, &generator, &OutputKind::ALL, None)
            .await
            .unwrap();

        let guard = session.lock().await;
        assert_eq!(guard.results().len(), 3);
        for result in guard.results().iter() {
            assert_eq!(result.markdown(), Some("run 1"));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_single_kind_regeneration_leaves_others_untouched() {
        let session = ready_session(RESUME, JOB);
        run_generation(&session, &FakeGenerator::canned(), &OutputKind::ALL, None)
            .await
            .unwrap();

        let failing = FakeGenerator::new(|_| {
            Err(LlmError::EmptyContent {
                finish_reason: Some("SAFETY".into()),
            })
        });
        let report = run_generation(&session, &failing, &[OutputKind::InterviewGuide], None)
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        let guard = session.lock().await;
        assert!(guard
            .results()
            .get(OutputKind::InterviewGuide)
            .unwrap()
            .failure_reason()
            .unwrap()
            .contains("SAFETY"));
        assert!(guard.results().get(OutputKind::TailoredCv).unwrap().markdown().is_some());
    }

    struct NeverAnswers;

    #[async_trait]
    impl TextGenerator for NeverAnswers {
        async fn generate(&self, _: &ApiKey, _: &str) -> Result<String, LlmError> {
            std::future::pending().await
        }

        async fn verify_credential(&self, _: &ApiKey) -> Result<(), LlmError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_timeout_is_recorded_per_kind() {
        let session = ready_session(RESUME, JOB);

        let report = run_generation(
            &session,
            &NeverAnswers,
            &OutputKind::ALL,
            Some(Duration::from_secs(30)),
        )
        .await
        .unwrap();

        assert_eq!(report.failed_count(), 3);
        assert!(report
            .outcomes
            .iter()
            .all(|o| o.reason.as_deref() == Some("Generation timed out after 30s")));
        assert_eq!(report.phase, Phase::ResultsAvailable);
    }

    struct Panics;

    #[async_trait]
    impl TextGenerator for Panics {
        async fn generate(&self, _: &ApiKey, _: &str) -> Result<String, LlmError> {
            panic!("generator crashed")
        }

        async fn verify_credential(&self, _: &ApiKey) -> Result<(), LlmError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_panicking_run_does_not_strand_the_session() {
        let session = ready_session(RESUME, JOB);

        let err = run_to_completion(
            session.clone(),
            Arc::new(Panics),
            OutputKind::ALL.to_vec(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(session.lock().await.phase(), Phase::InputsReady);

        let report = run_to_completion(
            session.clone(),
            Arc::new(FakeGenerator::canned()),
            OutputKind::ALL.to_vec(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(report.failed_count(), 0);
        assert_eq!(session.lock().await.phase(), Phase::ResultsAvailable);
    }

    #[tokio::test]
    async fn test_spawned_run_completes_and_reports() {
        let session = ready_session(RESUME, JOB);
        let generator: Arc<dyn TextGenerator> = Arc::new(FakeGenerator::canned());

        let report = run_to_completion(
            session.clone(),
            generator,
            vec![OutputKind::MatchingAnalysis],
            None,
        )
        .await
        .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(session.lock().await.phase(), Phase::ResultsAvailable);
    }

    /// Counts list items under the first `##` heading containing `heading`.
    fn section_items(markdown: &str, heading: &str) -> usize {
        markdown
            .lines()
            .skip_while(|line| !(line.starts_with('#') && line.contains(heading)))
            .skip(1)
            .take_while(|line| !line.starts_with("## "))
            .filter(|line| {
                let line = line.trim_start();
                line.starts_with("- ")
                    || line.starts_with("* ")
                    || line.split_once(". ").is_some_and(|(n, _)| n.parse::<u32>().is_ok())
            })
            .count()
    }

    #[test]
    fn test_section_items_counts_bullets_and_numbers() {
        let markdown = "## Questions to Ask the Interviewer\n- a\n* b\n3. c\n\n## Next\n- d";
        assert_eq!(section_items(markdown, "Questions to Ask"), 3);
    }

    /// Runs the real pipeline against Gemini. Needs GEMINI_API_KEY.
    #[tokio::test]
    #[ignore]
    async fn test_live_generation_has_structural_markers() {
        let key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set");
        let client = crate::llm_client::LlmClient::new(
            "https://generativelanguage.googleapis.com/v1beta",
        )
        .unwrap();

        let mut session = Session::new(ApiKey::parse(&key).unwrap());
        session
            .set_input(
                InputSlot::Resume,
                InputText::new(InputSource::FreeText, RESUME.into()),
            )
            .unwrap();
        session
            .set_input(
                InputSlot::JobDescription,
                InputText::new(InputSource::FreeText, JOB.into()),
            )
            .unwrap();
        let session = Arc::new(Mutex::new(session));

        let report = run_generation(&session, &client, &OutputKind::ALL, None)
            .await
            .unwrap();
        assert_eq!(report.failed_count(), 0, "{:?}", report.outcomes);

        let guard = session.lock().await;
        let markdown = |kind| guard.results().get(kind).and_then(|r| r.markdown()).unwrap();

        let analysis = markdown(OutputKind::MatchingAnalysis);
        assert!(analysis.contains('%'));
        assert!(analysis.contains("Keywords to Include"));

        let cv = markdown(OutputKind::TailoredCv);
        assert!(cv.contains("Summary"));
        assert!(cv.contains("Python"));

        let guide = markdown(OutputKind::InterviewGuide);
        let star_sections = guide
            .lines()
            .filter(|line| line.starts_with('#') && line.contains("STAR"))
            .count();
        assert_eq!(star_sections, 1);
        assert!(section_items(guide, "Questions to Ask") >= 5);
    }
}
