//! Code oracles: backends that turn a natural-language prompt into OpenSCAD
//! source text.
//!
//! Three backends are provided. [`OpenAiOracle`] talks to the OpenAI chat
//! API with a model fallback, [`OllamaOracle`] talks to a local Ollama
//! server, and [`TemplateOracle`] emits a deterministic parametric template
//! so the system keeps working with no network at all. [`OracleChain`]
//! strings them together in priority order.

mod chain;
mod extract;
mod ollama;
mod openai;
mod oracle;
mod prompt;
mod template;

pub use chain::OracleChain;
pub use extract::extract_scad_code;
pub use ollama::OllamaOracle;
pub use openai::OpenAiOracle;
pub use oracle::{CodeOracle, DynOracle, GenRequest};
pub use prompt::{format_request, OPENSCAD_SYSTEM_PROMPT};
pub use template::TemplateOracle;
