use async_trait::async_trait;

use crate::{CodeOracle, GenRequest};
use scadforge_types::Result;

// ---------------------------------------------------------------------------
// TemplateOracle
// ---------------------------------------------------------------------------

/// Last-resort backend that needs no network. Emits a fixed parametric
/// template tagged with the prompt, so downstream validation, export, and
/// the UI all keep working when no API is reachable.
#[derive(Debug, Default)]
pub struct TemplateOracle;

#[async_trait]
impl CodeOracle for TemplateOracle {
    async fn generate(&self, request: &GenRequest) -> Result<String> {
        tracing::info!("no generation backend reachable, using template fallback");
        Ok(format!(
            "\
// Auto-generated OpenSCAD model for: {prompt}
// Note: This is a fallback template. Configure an API backend for better results.

// Parameters
$fn = 100;  // Smoothness of curved surfaces
height = 10;  // mm
width = 20;   // mm
depth = 15;   // mm

// Main module
module main_shape() {{
    difference() {{
        cube([width, depth, height], center=true);

        // Round the top pocket using minkowski
        translate([0, 0, height/4]) {{
            minkowski() {{
                cube([width-4, depth-4, height/2], center=true);
                sphere(2);
            }}
        }}
    }}
}}

// Render the shape
main_shape();
",
            prompt = request.prompt,
        ))
    }

    fn name(&self) -> &str {
        "template"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn template_embeds_prompt_and_is_deterministic() {
        let oracle = TemplateOracle;
        let a = oracle.generate(&GenRequest::new("a phone stand")).await.unwrap();
        let b = oracle.generate(&GenRequest::new("a phone stand")).await.unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("// Auto-generated OpenSCAD model for: a phone stand"));
        assert!(a.contains("module main_shape()"));
        assert!(a.contains("main_shape();"));
        assert!(a.contains("$fn = 100;"));
    }
}
