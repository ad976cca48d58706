//! Fixed keyword vocabularies shared by the validator, repair passes, and
//! complexity analyzer.

/// Keywords whose presence satisfies the "at least one primitive" check.
pub const RECOGNIZED_KEYWORDS: &[&str] = &[
    "cube",
    "sphere",
    "cylinder",
    "union",
    "difference",
    "intersection",
    "polygon",
    "polyhedron",
    "square",
    "circle",
    "linear_extrude",
    "rotate_extrude",
    "hull",
    "minkowski",
];

/// Solid and 2D primitives counted by the complexity analyzer.
pub const PRIMITIVES: &[&str] = &[
    "cube",
    "sphere",
    "cylinder",
    "polyhedron",
    "square",
    "circle",
    "polygon",
];

/// Primitives with curved surfaces, which want a `$fn` smoothness setting.
pub const CURVED_PRIMITIVES: &[&str] = &["cylinder", "sphere", "circle"];

/// Boolean / CSG operations.
pub const BOOLEAN_OPS: &[&str] = &["union", "difference", "intersection", "minkowski", "hull"];

/// Transform operations that take a child body.
pub const TRANSFORM_OPS: &[&str] = &["translate", "rotate", "scale", "mirror", "color"];

/// Words that are legal OpenSCAD keywords but trouble as variable names.
pub const RESERVED_WORDS: &[&str] = &["if", "for", "let", "each", "function", "module"];

/// A known library: its name, the regex that matches its import statement,
/// the import line the repair pass inserts, and the characteristic call
/// patterns that betray its use.
pub struct KnownLibrary {
    pub name: &'static str,
    pub import_pattern: &'static str,
    pub import_line: &'static str,
    pub usage_patterns: &'static [&'static str],
}

/// Fixed mapping of known libraries to characteristic call patterns.
pub const KNOWN_LIBRARIES: &[KnownLibrary] = &[
    KnownLibrary {
        name: "BOSL2",
        import_pattern: r"use\s*<BOSL2/",
        import_line: "use <BOSL2/std.scad>;",
        usage_patterns: &[r"cuboid\s*\(", r"cylindroid\s*\(", r"attach\s*\("],
    },
    KnownLibrary {
        name: "BOSL",
        import_pattern: r"use\s*<BOSL/",
        import_line: "use <BOSL/basics.scad>;",
        usage_patterns: &[r"cube_center\s*\(", r"hollow_cylinder\s*\("],
    },
    KnownLibrary {
        name: "Round-Anything",
        import_pattern: r"use\s*<Round-Anything/",
        import_line: "use <Round-Anything/polyround.scad>;",
        usage_patterns: &[r"polyround\s*\(", r"round_corners\s*\("],
    },
    KnownLibrary {
        name: "threads",
        import_pattern: r"use\s*<threads\.scad>",
        import_line: "use <threads.scad>;",
        usage_patterns: &[r"metric_thread\s*\(", r"english_thread\s*\("],
    },
    KnownLibrary {
        name: "MCAD",
        import_pattern: r"use\s*<MCAD/",
        import_line: "use <MCAD/involute_gears.scad>;",
        usage_patterns: &[r"involute_gear\s*\(", r"\bgear\s*\("],
    },
];
