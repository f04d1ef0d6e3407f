//! Case execution runtime
//!
//! This crate provides the executor that walks a compiled graph, the stage
//! registry it binds nodes against, and a runtime facade that adds
//! configuration and concurrent batch runs.

mod executor;
mod registry;
mod runtime;

pub use executor::{ExecutionResult, WorkflowExecutor};
pub use registry::StageRegistry;
pub use runtime::{CaseRuntime, RuntimeConfig};
