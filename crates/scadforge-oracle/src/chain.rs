use crate::{DynOracle, GenRequest, OllamaOracle, OpenAiOracle, TemplateOracle};
use scadforge_types::{Result, ScadForgeError};

// ---------------------------------------------------------------------------
// OracleChain
// ---------------------------------------------------------------------------

/// Prioritized list of oracles tried in order. The first backend that
/// returns text wins; when every backend fails the last error is returned.
#[derive(Debug)]
pub struct OracleChain {
    oracles: Vec<DynOracle>,
}

impl OracleChain {
    pub fn new(oracles: Vec<DynOracle>) -> Result<Self> {
        if oracles.is_empty() {
            return Err(ScadForgeError::Config(
                "oracle chain needs at least one backend".to_string(),
            ));
        }
        Ok(Self { oracles })
    }

    /// Build the chain from the environment: OpenAI when `OPENAI_API_KEY`
    /// is set, then Ollama, then the template fallback. The template entry
    /// means generation always produces something even fully offline.
    pub fn from_env() -> Result<Self> {
        let mut oracles = Vec::new();
        if let Ok(openai) = OpenAiOracle::from_env() {
            oracles.push(DynOracle::new(openai));
        }
        oracles.push(DynOracle::new(OllamaOracle::from_env()));
        oracles.push(DynOracle::new(TemplateOracle));
        Self::new(oracles)
    }

    pub fn backends(&self) -> Vec<&str> {
        self.oracles.iter().map(|o| o.name()).collect()
    }

    pub async fn generate(&self, request: &GenRequest) -> Result<String> {
        let mut last_err = None;
        for oracle in &self.oracles {
            match oracle.generate(request).await {
                Ok(code) => {
                    tracing::info!(backend = oracle.name(), "generation succeeded");
                    return Ok(code);
                }
                Err(err) => {
                    tracing::warn!(
                        backend = oracle.name(),
                        error = %err,
                        "backend failed, trying next"
                    );
                    last_err = Some(err);
                }
            }
        }
        // new() rejects empty chains, so at least one error was recorded.
        Err(last_err.unwrap_or_else(|| {
            ScadForgeError::Config("oracle chain needs at least one backend".to_string())
        }))
    }
}

// The chain is itself an oracle, so callers that take a single backend can
// take a whole chain.
#[async_trait::async_trait]
impl crate::CodeOracle for OracleChain {
    async fn generate(&self, request: &GenRequest) -> Result<String> {
        OracleChain::generate(self, request).await
    }

    fn name(&self) -> &str {
        "chain"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodeOracle;
    use async_trait::async_trait;

    struct FixedOracle(&'static str);

    #[async_trait]
    impl CodeOracle for FixedOracle {
        async fn generate(&self, _request: &GenRequest) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl CodeOracle for FailingOracle {
        async fn generate(&self, _request: &GenRequest) -> Result<String> {
            Err(ScadForgeError::OracleUnavailable {
                provider: "failing".into(),
                message: "down".into(),
            })
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn first_successful_backend_wins() {
        let chain = OracleChain::new(vec![
            DynOracle::new(FixedOracle("cube(1);")),
            DynOracle::new(FixedOracle("sphere(1);")),
        ])
        .unwrap();
        let out = chain.generate(&GenRequest::new("x")).await.unwrap();
        assert_eq!(out, "cube(1);");
    }

    #[tokio::test]
    async fn failures_fall_through_to_next_backend() {
        let chain = OracleChain::new(vec![
            DynOracle::new(FailingOracle),
            DynOracle::new(FixedOracle("cylinder(h=5, r=2);")),
        ])
        .unwrap();
        let out = chain.generate(&GenRequest::new("x")).await.unwrap();
        assert_eq!(out, "cylinder(h=5, r=2);");
    }

    #[tokio::test]
    async fn all_failures_return_last_error() {
        let chain = OracleChain::new(vec![
            DynOracle::new(FailingOracle),
            DynOracle::new(FailingOracle),
        ])
        .unwrap();
        let err = chain.generate(&GenRequest::new("x")).await.unwrap_err();
        assert!(matches!(err, ScadForgeError::OracleUnavailable { .. }));
    }

    #[test]
    fn empty_chain_is_a_config_error() {
        let err = OracleChain::new(vec![]).unwrap_err();
        assert!(matches!(err, ScadForgeError::Config(_)));
        assert!(err.is_terminal());
    }

    #[tokio::test]
    async fn from_env_chain_always_ends_with_template() {
        let chain = OracleChain::from_env().unwrap();
        let backends = chain.backends();
        assert_eq!(backends.last(), Some(&"template"));
        // Template fallback means generation cannot fail outright.
        let out = chain.generate(&GenRequest::new("a cube")).await;
        assert!(out.is_ok());
    }
}
