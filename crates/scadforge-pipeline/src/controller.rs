use scadforge_analysis::{analyze, repair, validate};
use scadforge_oracle::{extract_scad_code, format_request, CodeOracle, GenRequest};
use scadforge_types::{
    ComplexityReport, GenerationAttempt, GenerationSession, Result, ScadForgeError, SessionRecord,
};

use crate::{library_hints, ContextRetriever, NullRetriever, SessionStore};

// ---------------------------------------------------------------------------
// LoopState
// ---------------------------------------------------------------------------

/// States of one generation run.
///
/// `Init -> Requesting -> Validating` then either `Finalizing` (valid result
/// or attempts exhausted) or `Repairing -> Requesting` with the validation
/// message carried forward as feedback. `Finalizing -> Done` always runs
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Init,
    Requesting,
    Validating,
    Repairing,
    Finalizing,
    Done,
}

impl LoopState {
    /// Where validation sends the loop: a valid result or the last allowed
    /// attempt finalizes, anything else goes back through repair.
    pub fn after_validation(valid: bool, last_attempt: bool) -> LoopState {
        if valid || last_attempt {
            LoopState::Finalizing
        } else {
            LoopState::Repairing
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationLoop
// ---------------------------------------------------------------------------

/// Bounded generate-validate-repair driver around a [`CodeOracle`].
pub struct GenerationLoop {
    oracle: Box<dyn CodeOracle>,
    retriever: Box<dyn ContextRetriever>,
    store: Option<Box<dyn SessionStore>>,
    max_attempts: usize,
    temperature: f32,
}

impl GenerationLoop {
    pub fn new(oracle: impl CodeOracle + 'static) -> Self {
        Self {
            oracle: Box::new(oracle),
            retriever: Box::new(NullRetriever),
            store: None,
            max_attempts: 3,
            temperature: 0.2,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retriever(mut self, retriever: impl ContextRetriever + 'static) -> Self {
        self.retriever = Box::new(retriever);
        self
    }

    pub fn with_store(mut self, store: impl SessionStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Run the loop to completion. Always performs at most `max_attempts`
    /// oracle calls; the returned session carries every attempt plus the
    /// finalized code, which is non-empty even when nothing validated.
    pub async fn run(&self, prompt: &str) -> Result<GenerationSession> {
        let mut state = LoopState::Init;
        tracing::debug!(?state, prompt, "generation started");

        let hints = library_hints(prompt);
        if !hints.is_empty() {
            tracing::info!(libraries = ?hints, "library hints selected");
        }
        let context = match self.retriever.retrieve(prompt, &hints).await {
            Ok(context) => context,
            Err(err) => {
                tracing::warn!(error = %err, "context retrieval failed, continuing without");
                None
            }
        };

        let mut session = GenerationSession {
            id: uuid::Uuid::new_v4(),
            prompt: prompt.to_string(),
            context: context.clone(),
            attempts: Vec::new(),
            max_attempts: self.max_attempts,
            final_code: String::new(),
            final_validity: false,
        };
        let mut feedback: Vec<String> = Vec::new();

        for index in 0..self.max_attempts {
            state = LoopState::Requesting;
            tracing::debug!(?state, attempt = index, backend = self.oracle.name(), "requesting oracle");

            let mut request = GenRequest::new(prompt)
                .with_feedback(feedback.clone())
                .with_temperature(self.temperature);
            if let Some(ctx) = &context {
                request = request.with_context(ctx.clone());
            }

            let raw = match self.oracle.generate(&request).await {
                Ok(raw) => raw,
                Err(err) if err.is_retryable() && index + 1 < self.max_attempts => {
                    tracing::warn!(error = %err, attempt = index, "oracle call failed, retrying");
                    feedback.push(err.to_string());
                    continue;
                }
                Err(err) => return Err(err),
            };

            state = LoopState::Validating;
            let code = repair(&extract_scad_code(&raw));
            let result = validate(&code);
            tracing::debug!(
                ?state,
                attempt = index,
                valid = result.valid,
                message = %result.message,
                "attempt validated"
            );

            let valid = result.valid;
            let message = result.message.clone();
            session.attempts.push(GenerationAttempt { index, code, result });

            let last_attempt = index + 1 == self.max_attempts;
            if LoopState::after_validation(valid, last_attempt) == LoopState::Finalizing {
                break;
            }

            state = LoopState::Repairing;
            tracing::debug!(?state, attempt = index, "carrying validation message into next attempt");
            feedback.push(message);
        }

        state = LoopState::Finalizing;
        tracing::debug!(?state, attempts = session.attempts.len(), "finalizing");

        let last = session.attempts.last().cloned().ok_or_else(|| {
            ScadForgeError::Other("oracle produced no output in any attempt".to_string())
        })?;
        let body = repair(&last.code);
        let report = analyze(&body);
        session.final_code = format!("{}{}", complexity_header(&report), body);
        session.final_validity = last.result.valid;

        if let Some(store) = &self.store {
            let mut base_request = GenRequest::new(prompt).with_temperature(self.temperature);
            if let Some(ctx) = &context {
                base_request = base_request.with_context(ctx.clone());
            }
            let record = SessionRecord {
                session_id: session.id,
                prompt: session.prompt.clone(),
                enhanced_prompt: Some(format_request(&base_request)),
                libraries: hints,
                valid: session.final_validity,
                complexity: report,
                created_at: chrono::Utc::now(),
            };
            if let Err(err) = store.save(&record) {
                tracing::warn!(error = %err, "session record save failed");
            }
        }

        state = LoopState::Done;
        tracing::debug!(
            ?state,
            valid = session.final_validity,
            attempts = session.attempts.len(),
            "generation finished"
        );
        Ok(session)
    }
}

/// Header comment prepended to finalized code: the complexity summary plus
/// one NOTE line per outstanding recommendation.
fn complexity_header(report: &ComplexityReport) -> String {
    let mut header = format!(
        "// Complexity score {:.1}: {} primitives, {} operations, {} modules. Estimated render time: {}.\n",
        report.complexity_score,
        report.primitives_count,
        report.operations_count,
        report.modules_count,
        report.render_time_estimate,
    );
    for rec in &report.recommendations {
        header.push_str("// NOTE: ");
        header.push_str(rec);
        header.push('\n');
    }
    header
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
