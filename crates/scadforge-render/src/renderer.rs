use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use scadforge_types::{Issue, IssueKind, Result, ScadForgeError, ValidationResult};

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render a `.scad` file to the given STL path, failing if the process
    /// errors, produces nothing, or exceeds the timeout.
    async fn render(&self, scad_file: &Path, stl_file: &Path, timeout: Duration) -> Result<()>;

    /// Whether the rendering backend is installed and responding.
    async fn check_available(&self) -> bool;
}

// ---------------------------------------------------------------------------
// OpenScadRenderer
// ---------------------------------------------------------------------------

/// Renderer backed by the `openscad` command-line binary.
#[derive(Debug, Clone)]
pub struct OpenScadRenderer {
    binary: String,
}

impl Default for OpenScadRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenScadRenderer {
    pub fn new() -> Self {
        Self {
            binary: "openscad".to_string(),
        }
    }

    pub fn with_binary(mut self, binary: String) -> Self {
        self.binary = binary;
        self
    }

    /// Write code to a temp `.scad` file and render it. The temp file lives
    /// until the render finishes.
    pub async fn render_code(
        &self,
        code: &str,
        stl_file: &Path,
        timeout: Duration,
    ) -> Result<()> {
        let scad_file = tempfile::Builder::new()
            .prefix("scadforge-")
            .suffix(".scad")
            .tempfile()?;
        tokio::fs::write(scad_file.path(), code).await?;
        self.render(scad_file.path(), stl_file, timeout).await
    }
}

/// Structural validation followed by a real render. A script that passes the
/// structural checks can still fail in OpenSCAD proper, so the render verdict
/// is folded into the returned result as a fatal issue. Structurally invalid
/// code never reaches the renderer.
pub async fn validate_with_render(
    code: &str,
    renderer: &dyn Renderer,
) -> Result<ValidationResult> {
    let result = scadforge_analysis::validate(code);
    if !result.valid {
        return Ok(result);
    }

    let dir = tempfile::tempdir()?;
    let scad = dir.path().join("check.scad");
    tokio::fs::write(&scad, code).await?;
    let stl = dir.path().join("check.stl");

    match renderer.render(&scad, &stl, Duration::from_secs(30)).await {
        Ok(()) => Ok(result),
        Err(err) => Ok(ValidationResult::fatal(Issue::new(
            IssueKind::RenderFailure,
            format!("OpenSCAD render check failed: {err}"),
        ))),
    }
}

/// Keep only the lines OpenSCAD marks as errors; warnings and echo noise
/// would drown the message the user needs.
fn filter_error_lines(stderr: &str) -> String {
    let errors: Vec<&str> = stderr.lines().filter(|l| l.contains("ERROR:")).collect();
    if errors.is_empty() {
        stderr.trim().to_string()
    } else {
        errors.join("\n")
    }
}

#[async_trait]
impl Renderer for OpenScadRenderer {
    async fn render(&self, scad_file: &Path, stl_file: &Path, timeout: Duration) -> Result<()> {
        let mut cmd = tokio::process::Command::new(&self.binary);
        cmd.arg("-o")
            .arg(stl_file)
            .arg(scad_file)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            scad = %scad_file.display(),
            stl = %stl_file.display(),
            timeout_ms = timeout.as_millis() as u64,
            "rendering with openscad"
        );

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ScadForgeError::RenderCliUnavailable
                } else {
                    ScadForgeError::Io(e)
                }
            })?,
            Err(_) => {
                return Err(ScadForgeError::RenderTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScadForgeError::RenderFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: filter_error_lines(&stderr),
            });
        }

        // An exit status of 0 with an empty STL still means nothing usable
        // was produced.
        match tokio::fs::metadata(stl_file).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(ScadForgeError::RenderFailed {
                status: 0,
                stderr: "STL file was not created".to_string(),
            }),
        }
    }

    async fn check_available(&self) -> bool {
        tokio::process::Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
