//! End-to-end tests for the generation loop: oracle -> extract -> repair ->
//! validate -> finalize, with retrieval and persistence collaborators wired
//! in.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use scadforge_oracle::{CodeOracle, GenRequest};
use scadforge_pipeline::{
    ContextRetriever, GenerationLoop, JsonSessionStore, NullRetriever, SessionStore,
};
use scadforge_types::{Result, SessionRecord};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// An oracle that talks too much: wraps its code in markdown and prose, the
/// way chat models do.
struct ChattyOracle;

#[async_trait]
impl CodeOracle for ChattyOracle {
    async fn generate(&self, _request: &GenRequest) -> Result<String> {
        Ok("Sure! Here is a parametric model:\n\
            ```openscad\n\
            size = 20;  // mm\n\
            module plate() {\n\
                cube([size, size, 2]);\n\
            }\n\
            plate();\n\
            ```\n\
            Let me know if you need changes."
            .to_string())
    }

    fn name(&self) -> &str {
        "chatty"
    }
}

/// Produces broken code on the first call, then fixes it when the request
/// carries feedback, like a model actually reading the error report.
struct LearningOracle {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl CodeOracle for LearningOracle {
    async fn generate(&self, request: &GenRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.feedback.is_empty() {
            // No semicolons, no primitives: unrepairable garbage.
            Ok("a model shaped like a duck".to_string())
        } else {
            Ok("// duck\ncylinder(h=20, r=8, $fn=100);\nsphere(6, $fn=100);\n".to_string())
        }
    }

    fn name(&self) -> &str {
        "learning"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prose_wrapped_output_round_trips_to_valid_code() {
    let session = GenerationLoop::new(ChattyOracle)
        .run("a square plate")
        .await
        .expect("loop should succeed");

    assert!(session.final_validity);
    assert_eq!(session.attempts.len(), 1);
    assert!(session.final_code.contains("module plate()"));
    assert!(!session.final_code.contains("Sure!"));
    assert!(!session.final_code.contains("```"));
    assert!(session.final_code.starts_with("// Complexity score"));
}

#[tokio::test]
async fn feedback_turns_a_failing_oracle_around() {
    let calls = Arc::new(AtomicUsize::new(0));
    let session = GenerationLoop::new(LearningOracle { calls: calls.clone() })
        .run("a duck")
        .await
        .expect("loop should succeed");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(session.attempts.len(), 2);
    assert!(!session.attempts[0].result.valid);
    assert!(session.attempts[1].result.valid);
    assert!(session.final_validity);
}

#[tokio::test]
async fn session_record_lands_in_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSessionStore::new(dir.path()).unwrap();

    let session = GenerationLoop::new(ChattyOracle)
        .with_store(store)
        .run("a rounded gear housing")
        .await
        .expect("loop should succeed");

    let sidecar = dir.path().join(format!("{}.json", session.id));
    assert!(sidecar.exists());

    let record: SessionRecord =
        serde_json::from_str(&std::fs::read_to_string(&sidecar).unwrap()).unwrap();
    assert_eq!(record.session_id, session.id);
    assert_eq!(record.prompt, "a rounded gear housing");
    assert!(record.valid);
    // "rounded" and "gear" both map to library hints.
    assert!(record.libraries.contains(&"BOSL2".to_string()));
    assert!(record.libraries.contains(&"Round-Anything".to_string()));
    assert!(record.enhanced_prompt.unwrap().contains("a rounded gear housing"));
}

#[tokio::test]
async fn retrieved_context_reaches_the_oracle() {
    struct CannedRetriever;

    #[async_trait]
    impl ContextRetriever for CannedRetriever {
        async fn retrieve(&self, _prompt: &str, _libraries: &[String]) -> Result<Option<String>> {
            Ok(Some("// EXAMPLE 1: module plate() from local corpus".to_string()))
        }
    }

    struct ContextAssertingOracle;

    #[async_trait]
    impl CodeOracle for ContextAssertingOracle {
        async fn generate(&self, request: &GenRequest) -> Result<String> {
            assert!(request
                .context
                .as_deref()
                .unwrap()
                .contains("local corpus"));
            Ok("cube(10);\ncube(5);\n".to_string())
        }

        fn name(&self) -> &str {
            "context-asserting"
        }
    }

    let session = GenerationLoop::new(ContextAssertingOracle)
        .with_retriever(CannedRetriever)
        .run("a plate")
        .await
        .expect("loop should succeed");
    assert!(session.final_validity);
    assert_eq!(
        session.context.as_deref(),
        Some("// EXAMPLE 1: module plate() from local corpus")
    );
}

#[tokio::test]
async fn null_retriever_means_no_context() {
    struct NoContextOracle;

    #[async_trait]
    impl CodeOracle for NoContextOracle {
        async fn generate(&self, request: &GenRequest) -> Result<String> {
            assert!(request.context.is_none());
            Ok("cube(10);\ncube(5);\n".to_string())
        }

        fn name(&self) -> &str {
            "no-context"
        }
    }

    let session = GenerationLoop::new(NoContextOracle)
        .with_retriever(NullRetriever)
        .run("a plate")
        .await
        .expect("loop should succeed");
    assert!(session.context.is_none());
}
