//! Approval-resolution engine for the greenlight workflow gate.
//!
//! The gate publishes a marker comment, watches reactions or reviews
//! placed on it by authorized humans, and resolves to an approved,
//! rejected, or timed-out outcome. [`orchestrator::Orchestrator`] is the
//! entry point; everything platform-specific hides behind
//! [`backend::Backend`].

pub mod backend;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod github;
pub mod orchestrator;
pub mod reaction;
pub mod reconcile;
pub mod types;
pub mod waitloop;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{GateError, Result};
