//! Export sanitization: turn untrusted text into something the renderer will
//! almost always accept.
//!
//! Strips comments and blank lines (less surface for syntax errors), runs the
//! full repair pipeline, and validates structure-only. When the text still
//! does not validate, any `identifier = number;` assignments are harvested
//! and a minimal parametric cylinder is synthesized from them, so the caller
//! always receives structurally sound, non-empty code.

use std::collections::HashMap;

use regex::Regex;

use crate::repair::repair;
use crate::validator::validate;

/// Strip `//` line comments, `/* … */` block comments, and blank lines.
fn strip_comments(code: &str) -> String {
    let block = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    let without_blocks = block.replace_all(code, "\n");
    let line = Regex::new(r"(?m)//.*$").unwrap();
    let without_comments = line.replace_all(&without_blocks, "");
    let mut out = String::new();
    for l in without_comments.lines() {
        if !l.trim().is_empty() {
            out.push_str(l);
            out.push('\n');
        }
    }
    out
}

/// Harvest numeric `name = value;` assignments for fallback sizing.
fn harvest_params(code: &str) -> HashMap<String, f64> {
    let assign = Regex::new(r"(\w+)\s*=\s*(\d+(?:\.\d+)?)\s*;").unwrap();
    let mut params = HashMap::new();
    for cap in assign.captures_iter(code) {
        if let Ok(value) = cap[2].parse::<f64>() {
            params.insert(cap[1].to_string(), value);
        }
    }
    params
}

/// Synthesize the minimal guaranteed-renderable model, sized from harvested
/// parameters when any are present.
fn fallback_model(params: &HashMap<String, f64>) -> String {
    let size = params
        .get("size")
        .or_else(|| params.get("width"))
        .or_else(|| params.get("radius"))
        .copied()
        .unwrap_or(10.0);
    let height = params.get("height").copied().unwrap_or(10.0);
    format!(
        "$fn = 100;\n// Fallback model\ncylinder(h={height}, r={radius});\n",
        radius = size / 2.0
    )
}

/// Sanitize arbitrary text for export. Never fails: the result is always
/// non-empty and structurally valid, falling back to a minimal cylinder when
/// repair cannot rescue the input.
pub fn sanitize_for_export(code: &str) -> String {
    let stripped = strip_comments(code);
    let repaired = repair(&stripped);

    let verdict = validate(&repaired);
    if verdict.valid {
        return repaired;
    }

    tracing::warn!(reason = %verdict.message, "sanitized code still invalid, substituting fallback model");
    fallback_model(&harvest_params(&repaired))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blank_lines_stripped() {
        let code = "// heading\n\ncube(5);\n/* block\ncomment */\nsphere(2);\n";
        let out = strip_comments(code);
        assert!(!out.contains("//"));
        assert!(!out.contains("/*"));
        assert!(!out.contains("\n\n"));
        assert!(out.contains("cube(5);"));
        assert!(out.contains("sphere(2);"));
    }

    #[test]
    fn repairable_code_survives_sanitization() {
        let out = sanitize_for_export(
            "// a plate\ntranslate(1,2,3) cube([20, 20, 2]);\nsphere(3);\n",
        );
        assert!(out.contains("translate([1, 2, 3])"));
        assert!(!out.contains("cylinder"), "no fallback expected: {out}");
    }

    #[test]
    fn gibberish_yields_fallback_cylinder() {
        let out = sanitize_for_export("this is not a model at all");
        assert!(!out.is_empty());
        assert!(out.contains("cylinder("));
        assert!(out.contains("$fn = 100;"));
    }

    #[test]
    fn fallback_uses_harvested_size_and_height() {
        let params = harvest_params("size = 30;\nheight = 12;\n");
        let out = fallback_model(&params);
        assert!(out.contains("cylinder(h=12, r=15);"));
    }

    #[test]
    fn fallback_defaults_without_params() {
        let out = fallback_model(&HashMap::new());
        assert!(out.contains("cylinder(h=10, r=5);"));
    }

    #[test]
    fn width_used_when_size_absent() {
        let params = harvest_params("width = 8;\n");
        let out = fallback_model(&params);
        assert!(out.contains("r=4"));
    }

    #[test]
    fn sanitized_output_always_validates() {
        for input in [
            "",
            "garbage {{{ ]]",
            "cube(5);",
            "sphere(10)",
            "cylinder(3, 9);",
        ] {
            let out = sanitize_for_export(input);
            let verdict = validate(&out);
            assert!(verdict.valid, "input {input:?} gave invalid output: {}", verdict.message);
        }
    }
}
