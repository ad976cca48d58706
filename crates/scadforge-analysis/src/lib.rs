//! Pure text analysis and repair for OpenSCAD scripts.
//!
//! Everything in this crate is a function over source text: no IO, no
//! external collaborators. The validator produces a [`ValidationResult`]
//! verdict, the repair pipeline rewrites text through a fixed sequence of
//! passes, the complexity analyzer produces a [`ComplexityReport`], and the
//! export sanitizer turns arbitrary text into something the renderer will
//! almost always accept.
//!
//! None of this is a grammar-level parser. The checks and rewrites are
//! deliberately lightweight and regex-based; the limitations that follow
//! (for example the count-based delimiter check) are documented where they
//! apply rather than silently papered over.
//!
//! [`ValidationResult`]: scadforge_types::ValidationResult
//! [`ComplexityReport`]: scadforge_types::ComplexityReport

pub mod complexity;
pub mod repair;
pub mod sanitize;
pub mod validator;
pub(crate) mod vocab;

pub use complexity::analyze;
pub use repair::{repair, repair_pipeline, RepairPass};
pub use sanitize::sanitize_for_export;
pub use validator::validate;
