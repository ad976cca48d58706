//! Complexity analysis: keyword counting, score, and recommendations.

use regex::Regex;
use scadforge_types::{ComplexityReport, RenderTimeEstimate};

use crate::vocab;

fn count_calls(code: &str, keyword: &str) -> usize {
    Regex::new(&format!(r"\b{keyword}\s*\("))
        .unwrap()
        .find_iter(code)
        .count()
}

/// Analyze one script and produce a [`ComplexityReport`].
///
/// Counting is textual: a keyword immediately followed by an opening
/// parenthesis counts as one call. `complexity_score` is
/// `primitives*1 + operations*2 + modules*1.5`, kept unrounded.
pub fn analyze(code: &str) -> ComplexityReport {
    let primitives_count: usize = vocab::PRIMITIVES
        .iter()
        .map(|p| count_calls(code, p))
        .sum();
    let operations_count: usize = vocab::BOOLEAN_OPS
        .iter()
        .map(|op| count_calls(code, op))
        .sum();

    let modules_count = Regex::new(r"module\s+\w+\s*\(")
        .unwrap()
        .find_iter(code)
        .count();
    let variables_count = Regex::new(r"\b\w+\s*=\s*[^;]+;")
        .unwrap()
        .find_iter(code)
        .count();

    let complexity_score =
        primitives_count as f64 + operations_count as f64 * 2.0 + modules_count as f64 * 1.5;

    let render_time_estimate = if complexity_score < 10.0 {
        RenderTimeEstimate::Quick
    } else if complexity_score < 30.0 {
        RenderTimeEstimate::Moderate
    } else {
        RenderTimeEstimate::Slow
    };

    let mut recommendations = Vec::new();
    if primitives_count > 20 && modules_count < 3 {
        recommendations.push("Consider organizing repeated elements into modules".to_string());
    }
    if let Some(cap) = Regex::new(r"\$fn\s*=\s*(\d+)").unwrap().captures(code) {
        if cap[1].parse::<u32>().unwrap_or(0) > 200 {
            recommendations.push(
                "High $fn value may cause slow rendering. Consider reducing for development."
                    .to_string(),
            );
        }
    }
    if code.contains("minkowski") && complexity_score > 15.0 {
        recommendations.push(
            "Minkowski operations are computationally expensive. Consider simplifying.".to_string(),
        );
    }
    if complexity_score > 30.0 {
        recommendations.push(
            "Complex model detected. Consider breaking into separate files or modules.".to_string(),
        );
    }

    ComplexityReport {
        primitives_count,
        operations_count,
        modules_count,
        variables_count,
        complexity_score,
        render_time_estimate,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_score() {
        let code = "\
module box() {
    difference() {
        cube([10, 10, 10]);
        sphere(4);
    }
}
box();
";
        let report = analyze(code);
        assert_eq!(report.primitives_count, 2);
        assert_eq!(report.operations_count, 1);
        assert_eq!(report.modules_count, 1);
        // 2*1 + 1*2 + 1*1.5
        assert_eq!(report.complexity_score, 5.5);
        assert_eq!(report.render_time_estimate, RenderTimeEstimate::Quick);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn keyword_without_call_not_counted() {
        // "cube" in a comment or name only counts when followed by `(`.
        let report = analyze("// a cube of cheese\ncube_size = 5;\ncube(cube_size);\n");
        assert_eq!(report.primitives_count, 1);
    }

    #[test]
    fn score_buckets() {
        // 10 primitives, no ops or modules -> score 10 -> moderate
        let code = "cube(1);".repeat(10);
        assert_eq!(
            analyze(&code).render_time_estimate,
            RenderTimeEstimate::Moderate
        );

        // 15 cubes + 15 unions -> score 45 -> slow
        let code = "union() { cube(1); }".repeat(15);
        assert_eq!(analyze(&code).render_time_estimate, RenderTimeEstimate::Slow);
    }

    #[test]
    fn adding_a_primitive_never_decreases_score() {
        let base = "cube(1); sphere(2); union() { cube(3); }";
        let before = analyze(base).complexity_score;
        for extra in ["cube(9);", "minkowski() { cube(1); }", "module m() { cube(1); }"] {
            let after = analyze(&format!("{base}\n{extra}")).complexity_score;
            assert!(after >= before, "{extra} decreased score");
        }
    }

    #[test]
    fn high_fn_recommendation() {
        let report = analyze("$fn = 300;\nsphere(5);\n");
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("High $fn value")));
    }

    #[test]
    fn minkowski_recommendation_requires_score() {
        // minkowski alone, low score: no recommendation
        let report = analyze("minkowski() { cube(1); sphere(1); }");
        assert!(!report
            .recommendations
            .iter()
            .any(|r| r.contains("Minkowski")));

        // minkowski with enough surrounding weight: recommended
        let heavy = format!("{}minkowski() {{ cube(1); sphere(1); }}", "cube(2);".repeat(14));
        let report = analyze(&heavy);
        assert!(report.complexity_score > 15.0);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("Minkowski")));
    }

    #[test]
    fn modularization_recommendation() {
        let many = "cube(1);".repeat(21);
        let report = analyze(&many);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("organizing repeated elements")));
    }

    #[test]
    fn split_recommendation_over_thirty() {
        let huge = "union() { cube(1); }".repeat(16);
        let report = analyze(&huge);
        assert!(report.complexity_score > 30.0);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("breaking into separate files")));
    }

    #[test]
    fn variable_count() {
        let report = analyze("width = 10;  // mm\nheight = 2 * width;\ncube([width, width, height]);\n");
        assert_eq!(report.variables_count, 2);
    }
}
