use async_trait::async_trait;

use scadforge_types::Result;

// ---------------------------------------------------------------------------
// GenRequest
// ---------------------------------------------------------------------------

/// One generation request to an oracle.
///
/// `feedback` carries validation messages from earlier attempts so a retry
/// can ask the backend to correct specific problems.
#[derive(Debug, Clone)]
pub struct GenRequest {
    pub prompt: String,
    pub context: Option<String>,
    pub feedback: Vec<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl GenRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: None,
            feedback: Vec::new(),
            temperature: 0.2,
            max_tokens: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_feedback(mut self, feedback: Vec<String>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

// ---------------------------------------------------------------------------
// CodeOracle
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CodeOracle: Send + Sync {
    /// Produce raw OpenSCAD source text for the request. The returned text
    /// may still carry markdown fences or prose; callers run it through
    /// [`crate::extract_scad_code`] before validating.
    async fn generate(&self, request: &GenRequest) -> Result<String>;

    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// DynOracle
// ---------------------------------------------------------------------------

pub struct DynOracle(Box<dyn CodeOracle>);

impl std::fmt::Debug for DynOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DynOracle").field(&self.0.name()).finish()
    }
}

impl DynOracle {
    pub fn new(oracle: impl CodeOracle + 'static) -> Self {
        Self(Box::new(oracle))
    }

    pub async fn generate(&self, request: &GenRequest) -> Result<String> {
        self.0.generate(request).await
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct MockOracle;

    #[async_trait]
    impl CodeOracle for MockOracle {
        async fn generate(&self, request: &GenRequest) -> Result<String> {
            Ok(format!("// {}\ncube(10);\n", request.prompt))
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn dyn_oracle_generate() {
        let oracle = DynOracle::new(MockOracle);
        let out = oracle
            .generate(&GenRequest::new("a simple cube"))
            .await
            .unwrap();
        assert!(out.contains("cube(10);"));
        assert_eq!(oracle.name(), "mock");
    }

    #[test]
    fn request_builder_sets_fields() {
        let req = GenRequest::new("a bracket")
            .with_context("// Reference 1")
            .with_feedback(vec!["Unbalanced braces".into()])
            .with_temperature(0.5);
        assert_eq!(req.prompt, "a bracket");
        assert_eq!(req.context.as_deref(), Some("// Reference 1"));
        assert_eq!(req.feedback.len(), 1);
        assert!((req.temperature - 0.5).abs() < f32::EPSILON);
        assert!(req.max_tokens.is_none());
    }
}
