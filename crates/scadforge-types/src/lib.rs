//! Shared types, errors, and reports for the scadforge generation pipeline.
//!
//! This crate provides the foundational types used across all other scadforge crates:
//! - `ScadForgeError` — unified error taxonomy
//! - `ValidationResult` / `Issue` — verdicts produced by the syntax validator
//! - `ComplexityReport` — structural analysis of a script
//! - `GenerationSession` / `GenerationAttempt` — one generate-validate-repair run

use serde::{Deserialize, Serialize};

/// Unified error type for all scadforge subsystems.
#[derive(Debug, thiserror::Error)]
pub enum ScadForgeError {
    // === Syntax / structure errors ===
    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Order error: {0}")]
    Order(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Structure error: {0}")]
    Structure(String),

    // === Render collaborator errors ===
    #[error("OpenSCAD CLI not found or not working")]
    RenderCliUnavailable,

    #[error("OpenSCAD render timed out after {timeout_ms}ms")]
    RenderTimeout { timeout_ms: u64 },

    #[error("OpenSCAD render failed (exit {status}): {stderr}")]
    RenderFailed { status: i32, stderr: String },

    // === Oracle errors ===
    #[error("Oracle '{provider}' unavailable: {message}")]
    OracleUnavailable { provider: String, message: String },

    #[error("Oracle '{provider}' timed out after {timeout_ms}ms")]
    OracleTimeout { provider: String, timeout_ms: u64 },

    // === Configuration ===
    #[error("Configuration error: {0}")]
    Config(String),

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ScadForgeError {
    /// Returns `true` if the error is transient and the operation may succeed on retry
    /// or by degrading to a fallback collaborator.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ScadForgeError::OracleUnavailable { .. }
                | ScadForgeError::OracleTimeout { .. }
                | ScadForgeError::RenderTimeout { .. }
        )
    }

    /// Returns `true` if the error is permanent and no automatic fallback exists.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScadForgeError::Config(_))
    }
}

/// A convenience alias for `Result<T, ScadForgeError>`.
pub type Result<T> = std::result::Result<T, ScadForgeError>;

// ---------------------------------------------------------------------------
// Validation verdicts
// ---------------------------------------------------------------------------

/// Category of a validator finding.
///
/// Fatal kinds fail validation outright; style kinds are advisory and leave
/// the verdict valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    // Fatal — structural
    Unbalanced,
    MissingTerminator,
    NoPrimitive,
    UseBeforeDefinition,
    MalformedTransform,
    LegacyCylinderArgs,
    CallBeforeDefinition,
    MissingLibraryImport,
    MalformedVector,
    DanglingOperation,
    RenderFailure,
    // Advisory — style
    MissingSmoothness,
    MissingUnitComment,
    ReservedWordVariable,
    UndocumentedModule,
    LargeLiteral,
    Indentation,
}

impl IssueKind {
    /// Style issues never fail validation on their own.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            IssueKind::MissingSmoothness
                | IssueKind::MissingUnitComment
                | IssueKind::ReservedWordVariable
                | IssueKind::UndocumentedModule
                | IssueKind::LargeLiteral
                | IssueKind::Indentation
        )
    }
}

/// A single validator finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub detail: String,
}

impl Issue {
    pub fn new(kind: IssueKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Verdict returned by the syntax validator.
///
/// Invariant: `valid == false` implies `issues` contains at least one fatal
/// issue and `message` names the first fatal condition found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
    pub issues: Vec<Issue>,
}

impl ValidationResult {
    /// Build an invalid verdict from the first fatal finding.
    pub fn fatal(issue: Issue) -> Self {
        Self {
            valid: false,
            message: issue.detail.clone(),
            issues: vec![issue],
        }
    }

    /// Build a valid verdict carrying zero or more advisory style issues.
    pub fn valid_with_issues(issues: Vec<Issue>) -> Self {
        let message = if issues.is_empty() {
            "Syntax check passed".to_string()
        } else {
            let joined = issues
                .iter()
                .map(|i| i.detail.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            format!("Syntax valid but code has issues: {joined}")
        };
        Self {
            valid: true,
            message,
            issues,
        }
    }
}

// ---------------------------------------------------------------------------
// Complexity analysis
// ---------------------------------------------------------------------------

/// Rough render-time bucket derived from the complexity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderTimeEstimate {
    Quick,
    Moderate,
    Slow,
}

impl std::fmt::Display for RenderTimeEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderTimeEstimate::Quick => write!(f, "quick"),
            RenderTimeEstimate::Moderate => write!(f, "moderate"),
            RenderTimeEstimate::Slow => write!(f, "slow"),
        }
    }
}

/// Structural report over one script.
///
/// `complexity_score = primitives*1 + operations*2 + modules*1.5`, kept as a
/// float and rounded only for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub primitives_count: usize,
    pub operations_count: usize,
    pub modules_count: usize,
    pub variables_count: usize,
    pub complexity_score: f64,
    pub render_time_estimate: RenderTimeEstimate,
    pub recommendations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Generation sessions
// ---------------------------------------------------------------------------

/// One loop-controller iteration, immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationAttempt {
    pub index: usize,
    pub code: String,
    pub result: ValidationResult,
}

/// The full record of one generation call. Lives only for the duration of the
/// call; no session state persists across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSession {
    pub id: uuid::Uuid,
    pub prompt: String,
    pub context: Option<String>,
    pub attempts: Vec<GenerationAttempt>,
    pub max_attempts: usize,
    pub final_code: String,
    pub final_validity: bool,
}

/// Sidecar metadata persisted next to an exported script, produced on request
/// by a storage collaborator — never by the core loop itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: uuid::Uuid,
    pub prompt: String,
    pub enhanced_prompt: Option<String>,
    pub libraries: Vec<String>,
    pub valid: bool,
    pub complexity: ComplexityReport,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
