use std::path::{Path, PathBuf};
use std::time::Duration;

use scadforge_analysis::sanitize_for_export;
use scadforge_types::{Result, ScadForgeError};

use crate::{OpenScadRenderer, Renderer};

/// A full render gets the long budget; the placeholder model is trivial and
/// gets a short one.
const FULL_RENDER_TIMEOUT: Duration = Duration::from_secs(30);
const FALLBACK_RENDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Placeholder emitted when the sanitized code itself will not render.
const FALLBACK_MODEL: &str = "$fn = 50;\ncylinder(h=10, r=10);\n";

// ---------------------------------------------------------------------------
// ExportOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub stl_path: PathBuf,
    /// True when the placeholder model was rendered instead of the real code.
    pub used_fallback: bool,
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// Export policy on top of the raw renderer: sanitize first, render with a
/// 30s budget, and degrade to a placeholder cylinder when the code fails to
/// render. Timeouts and a missing CLI are surfaced as-is since the
/// placeholder would hit the same wall.
pub struct Exporter {
    renderer: OpenScadRenderer,
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            renderer: OpenScadRenderer::new(),
            output_dir,
        })
    }

    pub fn with_renderer(mut self, renderer: OpenScadRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Save code as a `.scad` file in the output directory, appending the
    /// extension when missing.
    pub fn save_scad_file(&self, code: &str, filename: &str) -> Result<PathBuf> {
        let filename = if filename.ends_with(".scad") {
            filename.to_string()
        } else {
            format!("{filename}.scad")
        };
        let path = self.output_dir.join(filename);
        std::fs::write(&path, code)?;
        Ok(path)
    }

    /// Sanitize and render code to STL. `stl_file` defaults to
    /// `model.stl` in the output directory.
    pub async fn export_stl(&self, code: &str, stl_file: Option<&Path>) -> Result<ExportOutcome> {
        let stl_path = self.resolve_stl_path(stl_file);
        let sanitized = sanitize_for_export(code);

        match self
            .renderer
            .render_code(&sanitized, &stl_path, FULL_RENDER_TIMEOUT)
            .await
        {
            Ok(()) => Ok(ExportOutcome {
                stl_path,
                used_fallback: false,
            }),
            Err(ScadForgeError::RenderFailed { status, stderr }) => {
                tracing::warn!(status, %stderr, "render failed, trying placeholder model");
                self.renderer
                    .render_code(FALLBACK_MODEL, &stl_path, FALLBACK_RENDER_TIMEOUT)
                    .await?;
                Ok(ExportOutcome {
                    stl_path,
                    used_fallback: true,
                })
            }
            Err(err) => Err(err),
        }
    }

    fn resolve_stl_path(&self, stl_file: Option<&Path>) -> PathBuf {
        let mut path = match stl_file {
            Some(p) if p.parent().is_some_and(|d| !d.as_os_str().is_empty()) => p.to_path_buf(),
            Some(p) => self.output_dir.join(p),
            None => self.output_dir.join("model.stl"),
        };
        if path.extension().and_then(|e| e.to_str()) != Some("stl") {
            path.set_extension("stl");
        }
        path
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
