//! Prompt assembly for the code oracles.

use crate::GenRequest;

/// System prompt shared by every network backend. The rules here mirror the
/// structural checks the validator applies afterwards, so a backend that
/// follows them produces code that passes on the first attempt.
pub const OPENSCAD_SYSTEM_PROMPT: &str = "\
You are an expert OpenSCAD programmer and mechanical engineer specializing in \
creating precise, functional, and manufacturable 3D models.

CRITICAL REQUIREMENTS FOR OPENSCAD CODE:
1. Write ONLY executable OpenSCAD code - no markdown or explanations outside the code
2. Use proper syntax for ALL function calls:
   - cylinder(h=height, r=radius) or cylinder(h=height, d=diameter) - never just cylinder(radius, height)
   - translate([x,y,z]) - never just translate(x,y,z)
   - Always use semicolons at the end of statements
   - All blocks must have matching { and } braces
3. Avoid syntax errors:
   - No trailing semicolons after function/module blocks
   - No semicolons after module/function definitions before the opening brace
   - Always separate array elements with commas: [x, y, z]
4. Consistent units - use mm for all dimensions
5. Ensure variables are defined before they're used
6. Only call modules AFTER they are defined
7. When a model requires several parts, create separate modules for each part
8. Add comprehensive comments explaining design decisions and logic
9. Always generate complete, self-contained code that can be directly executed

PARAMETER DEFINITIONS:
- Define variables at the top of the file, grouped by component or function
- Use descriptive names: wall_thickness instead of wt
- Include explicit units in comments: wall_thickness = 2; // mm
- Define $fn for circles/curved surfaces (usually 100 for final models)
- For parameterized designs, expose ALL critical dimensions as variables

LIBRARY USAGE:
- When using BOSL/BOSL2: Include \"use <BOSL2/std.scad>;\" at the top of your code
- When using threads: Include \"use <threads.scad>;\" for threading functions
- For gears: Include \"use <MCAD/involute_gears.scad>;\" when using MCAD gear functions
- For rounded shapes/fillets: \"use <Round-Anything/polyround.scad>;\"

ERROR-PRONE PATTERNS TO AVOID:
1. Never call a function/variable before it's defined
2. Don't mix named and positional parameters: use cylinder(h=10, r=5) not cylinder(10, r=5)
3. Avoid reserved words as variables: module, function, for, if, else
4. Always ensure proper nesting of transformation operations

OPENSCAD SYNTAX SPECIFICS:
- For boolean operations, use syntax like: difference() { sphere(10); cube(15, center=true); }
- For transformations, use syntax like: translate([10, 0, 0]) rotate([0, 90, 0]) cube([10, 20, 30]);
- For rounded edges, use minkowski() { cube([10, 20, 5]); sphere(2); }
- For advanced shapes, use hull() to connect objects smoothly

IMPORTANT: Double-check your code for syntax errors before completing it. Ensure \
all functions are defined before they are used, all geometric operations have \
proper syntax, and all parameter types match their expected usage.
";

/// Build the user-role message for a request. The shape of the message
/// depends on whether reference context was retrieved, and a feedback
/// section is appended when earlier attempts failed validation.
pub fn format_request(request: &GenRequest) -> String {
    let mut out = match request.context.as_deref() {
        Some(context) if !context.trim().is_empty() => format!(
            "\
# DESIGN TASK
Generate OpenSCAD code for: {prompt}

# CODE REFERENCES
{context}

# IMPLEMENTATION GUIDELINES
- Study the reference code examples above carefully, especially syntax patterns and specialized functions
- Adapt the most relevant examples to create your solution
- Include necessary library imports if you're using specialized functions
- Use ONLY valid OpenSCAD syntax for all function calls and operations
- Make the design fully parametric with variables at the top
- Check that all modules and variables are defined before use
- Set $fn to an appropriate value (100) for smooth curved surfaces
- Include detailed comments explaining your design decisions
",
            prompt = request.prompt,
            context = context,
        ),
        _ => format!(
            "\
# DESIGN TASK
Generate OpenSCAD code for: {prompt}

# DESIGN REQUIREMENTS
- The code must be fully functional and executable in OpenSCAD
- All parameter values should be in millimeters (mm)
- Use clear variable and module names
- Include detailed comments explaining key design decisions
- Expose important parameters as variables at the top
- Ensure all syntax is correct with proper parameter naming
- Set $fn to an appropriate value (100) for smooth curved surfaces
- Consider manufacturing constraints (3D printing, CNC, etc.)
",
            prompt = request.prompt,
        ),
    };

    if !request.feedback.is_empty() {
        out.push_str("\n# PREVIOUS ATTEMPT FEEDBACK\n");
        out.push_str(
            "Earlier attempts at this task failed validation. Fix every issue below:\n",
        );
        for issue in &request.feedback {
            out.push_str("- ");
            out.push_str(issue);
            out.push('\n');
        }
    }

    out.push_str("\n# IMPLEMENTATION\nWrite complete OpenSCAD code:\n");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
