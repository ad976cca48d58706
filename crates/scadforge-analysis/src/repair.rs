//! Structural repair: a fixed, ordered pipeline of text-rewrite passes.
//!
//! Each pass is a named pure function over source text, applied exactly once
//! per invocation and in a fixed total order. A pass must not assume the
//! effects of passes that have not yet run. The first four passes are
//! position-independent and idempotent once their target defect is gone;
//! passes 5–9 depend on textual context and may shift on repeated runs, so
//! repair as a whole is monotonically improving rather than a fixed point.

use regex::Regex;

use crate::validator::{call_order_errors, context_before, missing_library_imports, DefKind};
use crate::vocab;

// ---------------------------------------------------------------------------
// RepairPass trait
// ---------------------------------------------------------------------------

/// One rewrite pass over source text.
pub trait RepairPass: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, code: &str) -> String;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Byte offset of the first executable line: non-empty, not a comment, and
/// (when `skip_imports` is set) not an existing `use <…>` statement.
fn first_statement_offset(code: &str, skip_imports: bool) -> usize {
    let import = Regex::new(r"^\s*use\s*<").unwrap();
    let mut offset = 0;
    for line in code.lines() {
        let trimmed = line.trim();
        let skip = trimmed.is_empty()
            || trimmed.starts_with("//")
            || trimmed.starts_with("/*")
            || (skip_imports && import.is_match(line));
        if !skip {
            return offset;
        }
        offset += line.len() + 1;
    }
    offset.min(code.len())
}

// ---------------------------------------------------------------------------
// Pass 1: delimiter balancing
// ---------------------------------------------------------------------------

struct BalanceDelimiters;
impl RepairPass for BalanceDelimiters {
    fn name(&self) -> &str {
        "balance_delimiters"
    }
    // Append missing closers at the end, prepend missing openers at the
    // start, by running counts. Idempotent once balanced.
    fn apply(&self, code: &str) -> String {
        let mut out = code.to_string();
        for (open, close) in [('{', '}'), ('(', ')'), ('[', ']')] {
            let opens = out.matches(open).count();
            let closes = out.matches(close).count();
            if opens > closes {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                for _ in closes..opens {
                    out.push(close);
                }
                out.push('\n');
            } else if closes > opens {
                let mut prefix: String = std::iter::repeat(open).take(closes - opens).collect();
                prefix.push('\n');
                out.insert_str(0, &prefix);
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Pass 2: terminator normalization
// ---------------------------------------------------------------------------

struct NormalizeTerminators;
impl RepairPass for NormalizeTerminators {
    fn name(&self) -> &str {
        "normalize_terminators"
    }
    fn apply(&self, code: &str) -> String {
        // Stray terminators before a block closer become newlines.
        let semi_close = Regex::new(r";\s*\}").unwrap();
        let out = semi_close.replace_all(code, "\n}").to_string();

        // Definition headers must open a block, not end a statement.
        let header_semi =
            Regex::new(r"(module|function)\s+(\w+)\s*(\([^)]*\))\s*;(\s*\{)").unwrap();
        let out = header_semi.replace_all(&out, "${1} ${2}${3}${4}").to_string();

        // Trailing terminators at end of file.
        let mut out = out.trim_end().trim_end_matches(';').trim_end().to_string();
        out.push('\n');
        out
    }
}

// ---------------------------------------------------------------------------
// Pass 3: positional-to-named parameter rewrite
// ---------------------------------------------------------------------------

struct NamePositionalParams;
impl RepairPass for NamePositionalParams {
    fn name(&self) -> &str {
        "name_positional_params"
    }
    fn apply(&self, code: &str) -> String {
        // Legacy cylinder(r, h) becomes cylinder(h=h, r=r).
        let cyl =
            Regex::new(r"\bcylinder\s*\(\s*(\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)\s*\)").unwrap();
        let out = cyl.replace_all(code, "cylinder(h=${2}, r=${1})").to_string();

        // Bare numeric triplets to translate/rotate become bracketed vectors.
        let triplet = Regex::new(
            r"\b(translate|rotate)\s*\(\s*(\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)\s*\)",
        )
        .unwrap();
        triplet
            .replace_all(&out, "${1}([${2}, ${3}, ${4}])")
            .to_string()
    }
}

// ---------------------------------------------------------------------------
// Pass 4: vector formatting
// ---------------------------------------------------------------------------

struct CommaSeparateVectors;
impl RepairPass for CommaSeparateVectors {
    fn name(&self) -> &str {
        "comma_separate_vectors"
    }
    fn apply(&self, code: &str) -> String {
        let spaced = Regex::new(
            r"\[\s*(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s+(\d+(?:\.\d+)?)\s*\]",
        )
        .unwrap();
        spaced.replace_all(code, "[${1}, ${2}, ${3}]").to_string()
    }
}

// ---------------------------------------------------------------------------
// Pass 5: function hoisting
// ---------------------------------------------------------------------------

struct HoistFunctions;
impl RepairPass for HoistFunctions {
    fn name(&self) -> &str {
        "hoist_functions"
    }
    // Splices by byte offset, not by content match, so duplicate source
    // spans cannot relocate the wrong occurrence.
    fn apply(&self, code: &str) -> String {
        let mut names: Vec<String> = Vec::new();
        for err in call_order_errors(code) {
            if err.kind == DefKind::Function && !names.contains(&err.name) {
                names.push(err.name);
            }
        }
        if names.is_empty() {
            return code.to_string();
        }

        let mut spans: Vec<(usize, usize, String)> = Vec::new();
        for name in &names {
            let def = Regex::new(&format!(
                r"function\s+{}\s*\([^)]*\)\s*=[^;]*;",
                regex::escape(name)
            ))
            .unwrap();
            if let Some(m) = def.find(code) {
                spans.push((m.start(), m.end(), m.as_str().to_string()));
            }
        }
        if spans.is_empty() {
            return code.to_string();
        }

        // Remove highest-offset spans first so earlier offsets stay valid.
        spans.sort_by(|a, b| b.0.cmp(&a.0));
        let mut out = code.to_string();
        for (start, end, _) in &spans {
            out.replace_range(*start..*end, "");
        }

        let at = first_statement_offset(&out, false);
        let mut block = String::new();
        for (_, _, text) in spans.iter().rev() {
            block.push_str(text);
            block.push('\n');
        }
        out.insert_str(at, &block);
        out
    }
}

// ---------------------------------------------------------------------------
// Pass 6: library-import insertion
// ---------------------------------------------------------------------------

struct InsertLibraryImports;
impl RepairPass for InsertLibraryImports {
    fn name(&self) -> &str {
        "insert_library_imports"
    }
    fn apply(&self, code: &str) -> String {
        let missing = missing_library_imports(code);
        if missing.is_empty() {
            return code.to_string();
        }
        let mut block = String::new();
        for lib in vocab::KNOWN_LIBRARIES {
            if missing.contains(&lib.name) {
                block.push_str(lib.import_line);
                block.push('\n');
            }
        }
        block.push('\n');

        let mut out = code.to_string();
        let at = first_statement_offset(&out, true);
        out.insert_str(at, &block);
        out
    }
}

// ---------------------------------------------------------------------------
// Pass 7: smoothness-default insertion
// ---------------------------------------------------------------------------

struct InsertSmoothnessDefault;
impl RepairPass for InsertSmoothnessDefault {
    fn name(&self) -> &str {
        "insert_smoothness_default"
    }
    fn apply(&self, code: &str) -> String {
        let has_curves = vocab::CURVED_PRIMITIVES.iter().any(|p| code.contains(p));
        if !has_curves || code.contains("$fn") {
            return code.to_string();
        }
        let mut out = code.to_string();
        let at = first_statement_offset(&out, true);
        out.insert_str(at, "$fn = 100;  // Smoothness of curved surfaces\n");
        out
    }
}

// ---------------------------------------------------------------------------
// Pass 8: unit-annotation insertion
// ---------------------------------------------------------------------------

struct AnnotateUnits;
impl RepairPass for AnnotateUnits {
    fn name(&self) -> &str {
        "annotate_units"
    }
    fn apply(&self, code: &str) -> String {
        let bare = Regex::new(r"^\s*\w+\s*=\s*\d+(?:\.\d+)?\s*;\s*$").unwrap();
        let ends_with_newline = code.ends_with('\n');
        let mut lines: Vec<String> = Vec::new();
        for line in code.lines() {
            if bare.is_match(line) {
                lines.push(format!("{}  // mm", line.trim_end()));
            } else {
                lines.push(line.to_string());
            }
        }
        let mut out = lines.join("\n");
        if ends_with_newline {
            out.push('\n');
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Pass 9: dangling-operation wrapping
// ---------------------------------------------------------------------------

struct WrapDanglingOperations;
impl RepairPass for WrapDanglingOperations {
    fn name(&self) -> &str {
        "wrap_dangling_operations"
    }
    fn apply(&self, code: &str) -> String {
        let def_context = Regex::new(r"function|module|return").unwrap();
        let mut text = code.to_string();
        for op in vocab::TRANSFORM_OPS.iter().chain(vocab::BOOLEAN_OPS) {
            let dangling = Regex::new(&format!(r"\b({op}\s*\([^)]*\))\s*;")).unwrap();
            let mut rebuilt = String::with_capacity(text.len());
            let mut last = 0;
            for cap in dangling.captures_iter(&text) {
                let whole = cap.get(0).unwrap();
                if def_context.is_match(context_before(&text, whole.start(), 20)) {
                    continue;
                }
                rebuilt.push_str(&text[last..whole.start()]);
                rebuilt.push_str(&cap[1]);
                rebuilt.push_str(" {\n    // Add objects here\n}");
                last = whole.end();
            }
            rebuilt.push_str(&text[last..]);
            text = rebuilt;
        }
        text
    }
}

// ---------------------------------------------------------------------------
// Pass 10: documentation insertion
// ---------------------------------------------------------------------------

struct DocumentModules;
impl RepairPass for DocumentModules {
    fn name(&self) -> &str {
        "document_modules"
    }
    fn apply(&self, code: &str) -> String {
        let module_def = Regex::new(r"^\s*module\s+(\w+)\s*\([^)]*\)\s*\{").unwrap();
        let ends_with_newline = code.ends_with('\n');
        let mut out: Vec<String> = Vec::new();
        for line in code.lines() {
            if let Some(cap) = module_def.captures(line) {
                let documented = out
                    .iter()
                    .rev()
                    .find(|l| !l.trim().is_empty())
                    .map(|l| l.trim_start().starts_with("//"))
                    .unwrap_or(false);
                if !documented {
                    out.push(format!("// {}: Module for creating a component", &cap[1]));
                }
            }
            out.push(line.to_string());
        }
        let mut joined = out.join("\n");
        if ends_with_newline {
            joined.push('\n');
        }
        joined
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The repair passes in their fixed application order.
pub fn repair_pipeline() -> Vec<Box<dyn RepairPass>> {
    vec![
        Box::new(BalanceDelimiters),
        Box::new(NormalizeTerminators),
        Box::new(NamePositionalParams),
        Box::new(CommaSeparateVectors),
        Box::new(HoistFunctions),
        Box::new(InsertLibraryImports),
        Box::new(InsertSmoothnessDefault),
        Box::new(AnnotateUnits),
        Box::new(WrapDanglingOperations),
        Box::new(DocumentModules),
    ]
}

/// Apply every repair pass once, in order.
pub fn repair(code: &str) -> String {
    let mut current = code.to_string();
    for pass in repair_pipeline() {
        let next = pass.apply(&current);
        if next != current {
            tracing::debug!(pass = pass.name(), "repair pass rewrote text");
        }
        current = next;
    }
    current
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
