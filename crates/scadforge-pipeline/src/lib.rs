//! The generate-validate-repair loop.
//!
//! [`GenerationLoop`] drives an oracle through a bounded number of attempts,
//! repairing and validating each response and feeding validation messages
//! back into the next request. Collaborators plug in at trait seams:
//! [`ContextRetriever`] supplies reference context, [`SessionStore`]
//! persists a metadata record when the caller asks for one.

mod controller;
mod hints;
mod retriever;
mod store;

pub use controller::{GenerationLoop, LoopState};
pub use hints::library_hints;
pub use retriever::{ContextRetriever, NullRetriever};
pub use store::{JsonSessionStore, SessionStore};
