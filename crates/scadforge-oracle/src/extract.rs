//! Recovery of OpenSCAD source from mixed oracle output.

use regex::Regex;

/// Pull OpenSCAD code out of text that may wrap it in markdown fences or
/// surround it with prose. Applied to every backend response before
/// validation.
///
/// Recovery order: text that already starts like code is returned verbatim,
/// then the first fenced code block wins, then a line scan keeps runs of
/// code-like lines. If nothing matches the original text is returned so the
/// validator can report on it directly.
pub fn extract_scad_code(text: &str) -> String {
    let trimmed = text.trim_start();
    if trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with("module")
        || trimmed.starts_with("function")
        || trimmed.starts_with("use <")
        || trimmed.starts_with("include <")
    {
        return text.to_string();
    }

    let fence = Regex::new(r"(?s)```(?:scad|openscad)?\s*(.+?)```").unwrap();
    if let Some(caps) = fence.captures(text) {
        return caps[1].to_string();
    }

    // Line scan: keep runs of lines that look like code, drop prose.
    let mut code_lines: Vec<&str> = Vec::new();
    let mut in_code_section = false;
    for line in text.lines() {
        let stripped = line.trim();
        let looks_like_code = line.contains('{')
            || line.contains('}')
            || line.contains(';')
            || stripped.starts_with("module")
            || stripped.starts_with("function")
            || stripped.starts_with("//")
            || (line.contains('=') && !stripped.starts_with('#'));
        if looks_like_code {
            in_code_section = true;
            code_lines.push(line);
        } else if in_code_section && !stripped.is_empty() && !stripped.starts_with('#') {
            code_lines.push(line);
        } else if stripped.starts_with('#')
            || stripped.to_lowercase().contains("example")
            || stripped.to_lowercase().contains("explanation")
        {
            in_code_section = false;
        }
    }

    if !code_lines.is_empty() {
        return code_lines.join("\n");
    }

    text.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
