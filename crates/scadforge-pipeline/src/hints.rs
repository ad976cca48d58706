//! Prompt-keyword to library hints.

/// Domain keyword groups and the community libraries that serve them.
/// Order matters only for the stability of the returned list.
const DOMAIN_LIBRARIES: &[(&[&str], &[&str])] = &[
    (
        &["thread", "screw", "bolt", "nut", "fastener"],
        &["BOLTS_archive", "threads-scad", "NopSCADlib"],
    ),
    (
        &["gear", "cog", "sprocket", "rack", "pinion"],
        &["BOSL2", "BOLTS_archive", "BOSL"],
    ),
    (
        &["round", "rounded", "fillet", "chamfer"],
        &["Round-Anything", "BOSL2"],
    ),
    (
        &["box", "case", "enclosure", "housing", "container"],
        &["YAPP_Box", "MarksEnclosureHelper"],
    ),
    (
        &["pcb", "arduino", "raspberry pi", "electronic", "board"],
        &["NopSCADlib"],
    ),
    (&["text", "label", "letter", "writing"], &["BOSL2", "BOSL"]),
];

/// Pick the libraries a prompt is likely to need, deduplicated, in the order
/// the keyword groups matched. An empty result means the prompt has no
/// recognized specialization.
pub fn library_hints(prompt: &str) -> Vec<String> {
    let lower = prompt.to_lowercase();
    let mut hints: Vec<String> = Vec::new();
    for (keywords, libraries) in DOMAIN_LIBRARIES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            for lib in *libraries {
                if !hints.iter().any(|h| h == lib) {
                    hints.push((*lib).to_string());
                }
            }
        }
    }
    hints
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
