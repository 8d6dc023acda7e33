//! Config extension server for Pipeweld.
//!
//! Receives resolution requests from the build orchestrator, expands the
//! repository's pipeline configuration, and answers with the flattened
//! document.

pub mod error;
pub mod routes;
pub mod settings;
pub mod state;

pub use settings::Settings;
pub use state::AppState;
