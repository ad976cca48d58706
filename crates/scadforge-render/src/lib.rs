//! Rendering OpenSCAD source to STL through the `openscad` CLI.
//!
//! [`OpenScadRenderer`] shells out to the CLI with a hard timeout and maps
//! its failure modes onto typed errors. [`Exporter`] layers export policy on
//! top: sanitize the code first, render it, and fall back to a trivial
//! placeholder model when the real code will not render.

mod export;
mod renderer;

pub use export::{ExportOutcome, Exporter};
pub use renderer::{validate_with_render, OpenScadRenderer, Renderer};
