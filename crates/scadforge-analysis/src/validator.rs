//! Script validation: ordered structural checks plus advisory style findings.
//!
//! Ten structural checks run in a fixed order and short-circuit on the first
//! fatal finding. When all ten pass, a second sweep gathers non-fatal style
//! issues (missing `$fn`, missing unit comments, reserved-word variables, and
//! so on) which ride along in the verdict without failing it.

use std::collections::HashMap;

use regex::Regex;
use scadforge_types::{Issue, IssueKind, ValidationResult};

use crate::vocab;

// ---------------------------------------------------------------------------
// StructuralCheck trait
// ---------------------------------------------------------------------------

/// One fatal structural check. Returns `Some(issue)` on the first violation
/// it finds, `None` when the code passes.
pub trait StructuralCheck: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, code: &str) -> Option<Issue>;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Walk back from `pos` to a char boundary at most `window` bytes earlier.
pub(crate) fn context_before(code: &str, pos: usize, window: usize) -> &str {
    let mut start = pos.saturating_sub(window);
    while !code.is_char_boundary(start) {
        start += 1;
    }
    &code[start..pos]
}

/// True when the identifier occurrence at `end` is the left-hand side of an
/// assignment (`name = …` but not `name == …`).
fn occurrence_is_assignment(code: &str, end: usize) -> bool {
    let rest = code[end..].trim_start();
    rest.starts_with('=') && !rest.starts_with("==")
}

fn is_comment_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with("/*")
}

// ---------------------------------------------------------------------------
// Call-order scanning (shared with the function-hoisting repair pass)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DefKind {
    Function,
    Module,
}

impl DefKind {
    fn label(self) -> &'static str {
        match self {
            DefKind::Function => "Function",
            DefKind::Module => "Module",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CallOrderError {
    pub name: String,
    pub kind: DefKind,
    pub call_line: usize,
    pub def_line: usize,
}

impl CallOrderError {
    fn detail(&self) -> String {
        format!(
            "{} '{}' called on line {} but defined on line {}",
            self.kind.label(),
            self.name,
            self.call_line,
            self.def_line
        )
    }
}

/// Two-pass scan: build `{identifier -> defining line}` for modules and
/// functions, then flag every call whose line precedes its definition line,
/// excluding the definition line itself.
pub(crate) fn call_order_errors(code: &str) -> Vec<CallOrderError> {
    let func_def = Regex::new(r"function\s+(\w+)\s*\(").unwrap();
    let module_def = Regex::new(r"module\s+(\w+)\s*\(").unwrap();

    let mut functions: HashMap<String, usize> = HashMap::new();
    let mut modules: HashMap<String, usize> = HashMap::new();
    for (idx, line) in code.lines().enumerate() {
        if let Some(cap) = func_def.captures(line) {
            functions.insert(cap[1].to_string(), idx + 1);
        }
        if let Some(cap) = module_def.captures(line) {
            modules.insert(cap[1].to_string(), idx + 1);
        }
    }

    let mut errors = Vec::new();
    for (idx, line) in code.lines().enumerate() {
        if is_comment_line(line) {
            continue;
        }
        let line_num = idx + 1;
        for (defs, kind) in [(&functions, DefKind::Function), (&modules, DefKind::Module)] {
            // Deterministic report order within a line.
            let mut named: Vec<_> = defs.iter().collect();
            named.sort();
            for (name, &def_line) in named {
                if line_num >= def_line {
                    continue;
                }
                let call = Regex::new(&format!(r"\b{}\s*\(", regex::escape(name))).unwrap();
                if !call.is_match(line) {
                    continue;
                }
                let def_marker = match kind {
                    DefKind::Function => format!(r"function\s+{}", regex::escape(name)),
                    DefKind::Module => format!(r"module\s+{}", regex::escape(name)),
                };
                if Regex::new(&def_marker).unwrap().is_match(line) {
                    continue;
                }
                errors.push(CallOrderError {
                    name: name.clone(),
                    kind,
                    call_line: line_num,
                    def_line,
                });
            }
        }
    }
    errors
}

/// Names of the known libraries whose characteristic calls appear without a
/// matching import. Shared with the import-insertion repair pass.
pub(crate) fn missing_library_imports(code: &str) -> Vec<&'static str> {
    let mut missing = Vec::new();
    for lib in vocab::KNOWN_LIBRARIES {
        let has_import = Regex::new(lib.import_pattern).unwrap().is_match(code);
        let has_usage = lib
            .usage_patterns
            .iter()
            .any(|p| Regex::new(p).unwrap().is_match(code));
        if has_usage && !has_import {
            missing.push(lib.name);
        }
    }
    missing
}

// ---------------------------------------------------------------------------
// Structural checks, in their fixed order
// ---------------------------------------------------------------------------

struct DelimiterBalance;
impl StructuralCheck for DelimiterBalance {
    fn name(&self) -> &str {
        "delimiter_balance"
    }
    // Count-based only: interleaved mismatches such as `([)]` balance out and
    // pass. This looseness is load-bearing — the repair pipeline patches by
    // counts too, so the check stays count-based rather than stack-based.
    fn apply(&self, code: &str) -> Option<Issue> {
        for (open, close, label) in [
            ('{', '}', "curly braces"),
            ('(', ')', "parentheses"),
            ('[', ']', "square brackets"),
        ] {
            let opens = code.matches(open).count();
            let closes = code.matches(close).count();
            if opens != closes {
                return Some(Issue::new(
                    IssueKind::Unbalanced,
                    format!("Unbalanced {label}"),
                ));
            }
        }
        None
    }
}

struct TerminatorPresence;
impl StructuralCheck for TerminatorPresence {
    fn name(&self) -> &str {
        "terminator_presence"
    }
    fn apply(&self, code: &str) -> Option<Issue> {
        if code.contains(';') {
            None
        } else {
            Some(Issue::new(IssueKind::MissingTerminator, "Missing semicolons"))
        }
    }
}

struct PrimitivePresence;
impl StructuralCheck for PrimitivePresence {
    fn name(&self) -> &str {
        "primitive_presence"
    }
    fn apply(&self, code: &str) -> Option<Issue> {
        if vocab::RECOGNIZED_KEYWORDS.iter().any(|k| code.contains(k)) {
            None
        } else {
            Some(Issue::new(
                IssueKind::NoPrimitive,
                "No basic OpenSCAD primitives found",
            ))
        }
    }
}

struct VariableBeforeUse;
impl StructuralCheck for VariableBeforeUse {
    fn name(&self) -> &str {
        "variable_before_use"
    }
    fn apply(&self, code: &str) -> Option<Issue> {
        let assign = Regex::new(r"(\w+)\s*=\s*[^;]+;").unwrap();
        // First assignment position per identifier, in order of appearance.
        let mut decls: Vec<(String, usize)> = Vec::new();
        for cap in assign.captures_iter(code) {
            let name = cap[1].to_string();
            if !decls.iter().any(|(n, _)| *n == name) {
                let pos = cap.get(1).unwrap().start();
                decls.push((name, pos));
            }
        }

        for (name, decl_pos) in &decls {
            let word = Regex::new(&format!(r"\b{}\b", regex::escape(name))).unwrap();
            for m in word.find_iter(code) {
                if m.start() >= *decl_pos {
                    break;
                }
                if !occurrence_is_assignment(code, m.end()) {
                    // First violation only.
                    return Some(Issue::new(
                        IssueKind::UseBeforeDefinition,
                        format!("Variable '{name}' used before declaration"),
                    ));
                }
            }
        }
        None
    }
}

struct TransformVectorArgs;
impl StructuralCheck for TransformVectorArgs {
    fn name(&self) -> &str {
        "transform_vector_args"
    }
    fn apply(&self, code: &str) -> Option<Issue> {
        for op in ["translate", "rotate", "scale"] {
            let call = Regex::new(&format!(r"\b{op}\s*\(\s*([^)]*)\)")).unwrap();
            for cap in call.captures_iter(code) {
                if !cap[1].trim_start().starts_with('[') {
                    return Some(Issue::new(
                        IssueKind::MalformedTransform,
                        format!("Incorrect {op} syntax - should use vector [x,y,z] format"),
                    ));
                }
            }
        }
        None
    }
}

struct LegacyCylinderArgs;
impl StructuralCheck for LegacyCylinderArgs {
    fn name(&self) -> &str {
        "legacy_cylinder_args"
    }
    fn apply(&self, code: &str) -> Option<Issue> {
        let call = Regex::new(r"\bcylinder\s*\(([^)]*)\)").unwrap();
        let positional = Regex::new(r"^\s*\d+(?:\.\d+)?\s*,\s*\d+").unwrap();
        let named = Regex::new(r"[rhd]\s*=").unwrap();
        for cap in call.captures_iter(code) {
            if positional.is_match(&cap[1]) && !named.is_match(&cap[1]) {
                return Some(Issue::new(
                    IssueKind::LegacyCylinderArgs,
                    "Invalid cylinder syntax - use named parameters: cylinder(h=h, r=r)",
                ));
            }
        }
        None
    }
}

struct CallBeforeDefinition;
impl StructuralCheck for CallBeforeDefinition {
    fn name(&self) -> &str {
        "call_before_definition"
    }
    fn apply(&self, code: &str) -> Option<Issue> {
        let errors = call_order_errors(code);
        if errors.is_empty() {
            return None;
        }
        let detail = errors
            .iter()
            .map(CallOrderError::detail)
            .collect::<Vec<_>>()
            .join("; ");
        Some(Issue::new(IssueKind::CallBeforeDefinition, detail))
    }
}

struct LibraryImports;
impl StructuralCheck for LibraryImports {
    fn name(&self) -> &str {
        "library_imports"
    }
    fn apply(&self, code: &str) -> Option<Issue> {
        let missing = missing_library_imports(code);
        if missing.is_empty() {
            return None;
        }
        let detail = missing
            .iter()
            .map(|name| format!("Library functions from '{name}' used but library not imported"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(Issue::new(IssueKind::MissingLibraryImport, detail))
    }
}

struct DataStructureShape;
impl StructuralCheck for DataStructureShape {
    fn name(&self) -> &str {
        "data_structure_shape"
    }
    fn apply(&self, code: &str) -> Option<Issue> {
        let mut details = Vec::new();

        let spaced_vector =
            Regex::new(r"\[\s*\d+(?:\.\d+)?\s+\d+(?:\.\d+)?\s+\d+(?:\.\d+)?\s*\]").unwrap();
        for m in spaced_vector.find_iter(code) {
            details.push(format!("Vector/array missing commas: {}", m.as_str()));
        }

        // A point inside a point list must be followed by `,` or `]`.
        let point = Regex::new(r"\[\s*(\[\s*\d+(?:\.\d+)?\s*,\s*\d+(?:\.\d+)?\s*\])").unwrap();
        for cap in point.captures_iter(code) {
            let end = cap.get(0).unwrap().end();
            if let Some(next) = code[end..].chars().next() {
                if next != ',' && next != ']' {
                    details.push(format!("Array of points missing comma after: {}", &cap[1]));
                }
            }
        }

        if details.is_empty() {
            None
        } else {
            Some(Issue::new(IssueKind::MalformedVector, details.join("; ")))
        }
    }
}

struct OperationNesting;
impl StructuralCheck for OperationNesting {
    fn name(&self) -> &str {
        "operation_nesting"
    }
    fn apply(&self, code: &str) -> Option<Issue> {
        let mut details = Vec::new();

        for op in vocab::BOOLEAN_OPS {
            let empty = Regex::new(&format!(r"\b{op}\s*\(\s*\)\s*\{{")).unwrap();
            if empty.is_match(code) {
                details.push(format!("{op}() has no arguments"));
            }
        }

        for op in vocab::TRANSFORM_OPS {
            let dangling = Regex::new(&format!(r"\b{op}\s*\([^)]*\)\s*;")).unwrap();
            for m in dangling.find_iter(code) {
                let context = context_before(code, m.start(), 20);
                let in_def = Regex::new(r"function|module").unwrap().is_match(context);
                if !in_def {
                    details.push(format!(
                        "{op}() has no child operation; it needs {{ }} with objects inside"
                    ));
                }
            }
        }

        if details.is_empty() {
            None
        } else {
            Some(Issue::new(IssueKind::DanglingOperation, details.join("; ")))
        }
    }
}

/// The ten structural checks in the order they run.
pub fn structural_checks() -> Vec<Box<dyn StructuralCheck>> {
    vec![
        Box::new(DelimiterBalance),
        Box::new(TerminatorPresence),
        Box::new(PrimitivePresence),
        Box::new(VariableBeforeUse),
        Box::new(TransformVectorArgs),
        Box::new(LegacyCylinderArgs),
        Box::new(CallBeforeDefinition),
        Box::new(LibraryImports),
        Box::new(DataStructureShape),
        Box::new(OperationNesting),
    ]
}

// ---------------------------------------------------------------------------
// Style sweep (advisory, never fatal)
// ---------------------------------------------------------------------------

/// Gather non-fatal style findings over code that already passed the
/// structural checks.
pub fn style_issues(code: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    let has_curves = vocab::CURVED_PRIMITIVES.iter().any(|p| code.contains(p));
    if has_curves && !code.contains("$fn") {
        issues.push(Issue::new(
            IssueKind::MissingSmoothness,
            "Missing $fn parameter for curved surfaces",
        ));
    }

    let bare_assignment = Regex::new(r"^\s*(\w+)\s*=\s*\d+(?:\.\d+)?\s*;\s*$").unwrap();
    for line in code.lines() {
        if let Some(cap) = bare_assignment.captures(line) {
            issues.push(Issue::new(
                IssueKind::MissingUnitComment,
                format!("Variable '{}' is missing a unit comment (e.g. // mm)", &cap[1]),
            ));
        }
    }

    // Indentation shallower than the innermost open brace.
    let mut brace_stack: Vec<usize> = Vec::new();
    for (idx, line) in code.lines().enumerate() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with("//") {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        if line.contains('{') {
            brace_stack.push(indent);
        }
        if let Some(&top) = brace_stack.last() {
            if indent < top && !stripped.starts_with('}') {
                issues.push(Issue::new(
                    IssueKind::Indentation,
                    format!("Line {}: Inconsistent indentation", idx + 1),
                ));
            }
        }
        if line.contains('}') {
            brace_stack.pop();
        }
    }

    for word in vocab::RESERVED_WORDS {
        let assigned = Regex::new(&format!(r"\b{word}\s*=")).unwrap();
        if assigned.is_match(code) {
            issues.push(Issue::new(
                IssueKind::ReservedWordVariable,
                format!("Using reserved word '{word}' as a variable name"),
            ));
        }
    }

    let module_def = Regex::new(r"module\s+(\w+)\s*\(").unwrap();
    let lines: Vec<&str> = code.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        if let Some(cap) = module_def.captures(line) {
            let documented = lines[..idx]
                .iter()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim_start().starts_with("//"))
                .unwrap_or(false);
            if !documented {
                issues.push(Issue::new(
                    IssueKind::UndocumentedModule,
                    format!("Module '{}' is missing documentation comments", &cap[1]),
                ));
            }
        }
    }

    let large = Regex::new(r"\b\d{4,}\b").unwrap();
    let found: Vec<&str> = large.find_iter(code).map(|m| m.as_str()).collect();
    if !found.is_empty() {
        issues.push(Issue::new(
            IssueKind::LargeLiteral,
            format!("Very large numeric values found: {}", found.join(", ")),
        ));
    }

    issues
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate one script. Structural checks run in their fixed order and
/// short-circuit on the first fatal finding; otherwise the verdict is valid
/// with any style issues folded into the message.
pub fn validate(code: &str) -> ValidationResult {
    for check in structural_checks() {
        if let Some(issue) = check.apply(code) {
            tracing::debug!(check = check.name(), detail = %issue.detail, "structural check failed");
            return ValidationResult::fatal(issue);
        }
    }
    ValidationResult::valid_with_issues(style_issues(code))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = "\
// A simple box
$fn = 100;  // smoothness
width = 20;  // mm
module box() {
    cube([width, 10, 5]);
}
box();
";

    #[test]
    fn clean_code_is_valid() {
        let result = validate(CLEAN);
        assert!(result.valid, "expected valid, got: {}", result.message);
    }

    #[test]
    fn minimal_balanced_code_is_valid() {
        // Balanced delimiters + terminator + recognized primitive and no
        // other defect must validate.
        let result = validate("cube([1, 2, 3]);");
        assert!(result.valid, "got: {}", result.message);
    }

    #[test]
    fn unbalanced_braces_rejected() {
        let result = validate("module box() { cube(5);");
        assert!(!result.valid);
        assert_eq!(result.message, "Unbalanced curly braces");
        assert_eq!(result.issues[0].kind, IssueKind::Unbalanced);
    }

    #[test]
    fn unbalanced_parens_rejected() {
        let result = validate("cube(5;");
        assert!(!result.valid);
        assert_eq!(result.message, "Unbalanced parentheses");
    }

    #[test]
    fn missing_terminator_rejected() {
        let result = validate("cube(5)");
        assert!(!result.valid);
        assert_eq!(result.message, "Missing semicolons");
    }

    #[test]
    fn no_primitive_rejected() {
        let result = validate("x = 5;");
        assert!(!result.valid);
        assert_eq!(result.message, "No basic OpenSCAD primitives found");
    }

    #[test]
    fn interleaved_mismatch_passes_count_check() {
        // Documented limitation of the count-based check.
        let check = DelimiterBalance;
        assert!(check.apply("([)]").is_none());
    }

    #[test]
    fn variable_used_before_declaration_rejected() {
        let code = "cube(size);\nsize = 10;\n";
        let result = validate(code);
        assert!(!result.valid);
        assert!(result.message.contains("'size' used before declaration"));
    }

    #[test]
    fn variable_declared_then_used_is_fine() {
        let code = "size = 10;\ncube(size);\n";
        let result = validate(code);
        assert!(result.valid, "got: {}", result.message);
    }

    #[test]
    fn scalar_translate_rejected() {
        let result = validate("translate(1, 2, 3) cube(5);");
        assert!(!result.valid);
        assert!(result.message.contains("Incorrect translate syntax"));
        assert_eq!(result.issues[0].kind, IssueKind::MalformedTransform);
    }

    #[test]
    fn vector_translate_accepted() {
        let result = validate("translate([1, 2, 3]) cube(5);");
        assert!(result.valid, "got: {}", result.message);
    }

    #[test]
    fn legacy_cylinder_rejected() {
        let result = validate("cylinder(5, 10);\n$fn = 50;");
        assert!(!result.valid);
        assert!(result.message.contains("named parameters"));
    }

    #[test]
    fn named_cylinder_accepted() {
        let result = validate("$fn = 50;\ncylinder(h=10, r=5);\n");
        assert!(result.valid, "got: {}", result.message);
    }

    #[test]
    fn module_called_before_definition_rejected() {
        let code = "\
box();
module box() {
    cube(5);
}
";
        let result = validate(code);
        assert!(!result.valid);
        assert!(result
            .message
            .contains("Module 'box' called on line 1 but defined on line 2"));
    }

    #[test]
    fn definition_line_itself_not_flagged() {
        let code = "\
module box() {
    cube(5);
}
box();
";
        let result = validate(code);
        assert!(result.valid, "got: {}", result.message);
    }

    #[test]
    fn call_order_scan_ignores_comments() {
        let code = "\
// box(); explained here
module box() {
    cube(5);
}
box();
";
        assert!(call_order_errors(code).is_empty());
    }

    #[test]
    fn library_usage_without_import_rejected() {
        let result = validate("metric_thread(diameter=8, pitch=1.25, length=20);\ncube(1);");
        assert!(!result.valid);
        assert!(result.message.contains("'threads'"));
    }

    #[test]
    fn library_usage_with_import_accepted() {
        let code = "use <threads.scad>;\nmetric_thread(diameter=8, pitch=1.25, length=20);\ncube(1);";
        let result = validate(code);
        assert!(result.valid, "got: {}", result.message);
    }

    #[test]
    fn spaced_vector_rejected() {
        let result = validate("cube([1 2 3]);");
        assert!(!result.valid);
        assert!(result.message.contains("Vector/array missing commas"));
    }

    #[test]
    fn dangling_translate_rejected() {
        let result = validate("translate([1, 2, 3]);\ncube(5);");
        assert!(!result.valid);
        assert!(result.message.contains("has no child operation"));
    }

    #[test]
    fn empty_boolean_args_rejected() {
        let result = validate("union() {\n    cube(5);\n}");
        assert!(!result.valid);
        assert!(result.message.contains("union() has no arguments"));
    }

    #[test]
    fn style_issues_do_not_fail_validation() {
        let code = "sphere(10);\n";
        let result = validate(code);
        assert!(result.valid);
        assert!(result.message.contains("Missing $fn parameter"));
        assert!(result.issues.iter().all(|i| !i.kind.is_fatal()));
    }

    #[test]
    fn missing_unit_comment_reported() {
        let code = "height = 10;\ncube(height);\n";
        let result = validate(code);
        assert!(result.valid);
        assert!(result
            .message
            .contains("Variable 'height' is missing a unit comment"));
    }

    #[test]
    fn annotated_assignment_not_flagged() {
        let issues = style_issues("height = 10;  // mm\ncube(height);\n");
        assert!(!issues
            .iter()
            .any(|i| i.kind == IssueKind::MissingUnitComment));
    }

    #[test]
    fn reserved_word_variable_reported() {
        let issues = style_issues("let = 5;  // mm\ncube(let);");
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::ReservedWordVariable));
    }

    #[test]
    fn undocumented_module_reported() {
        let code = "cube(1);\nmodule unlabeled() {\n    sphere(2);\n}\n";
        let issues = style_issues(code);
        assert!(issues.iter().any(|i| i.kind == IssueKind::UndocumentedModule
            && i.detail.contains("'unlabeled'")));
    }

    #[test]
    fn large_literal_reported() {
        let issues = style_issues("$fn = 100;\ncube(50000);\n");
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::LargeLiteral && i.detail.contains("50000")));
    }

    #[test]
    fn checks_run_in_fixed_order() {
        // Both unbalanced and missing-primitive; the delimiter check fires first.
        let result = validate("x = (1;");
        assert!(!result.valid);
        assert_eq!(result.issues[0].kind, IssueKind::Unbalanced);
    }
}
