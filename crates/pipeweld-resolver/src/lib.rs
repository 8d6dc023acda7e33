//! Pipeline configuration resolution for Pipeweld.
//!
//! This crate contains:
//! - The recursive resolution engine (virtual pipelines, templates)
//! - The call-scoped template registry and `${key}` rendering
//! - Fire-and-forget commit-status publishing

pub mod engine;
pub mod error;
pub mod publisher;
pub mod template;

pub use engine::{Resolution, Resolver};
pub use error::ResolveError;
pub use publisher::publish;
pub use template::{Template, TemplateRegistry};
