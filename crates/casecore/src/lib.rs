//! Core abstractions for the case workflow engine
//!
//! This crate provides the case record, the stage and router contracts, and
//! the static graph definition that the runtime walks. It does not execute
//! anything itself.

mod error;
pub mod events;
mod graph;
mod record;
mod router;
mod stage;

pub use error::{CaseError, GraphError, StageError};
pub use events::*;
pub use graph::{complaint_edge, CompiledGraph, Edge, GraphDefinition, Target, Transition};
pub use record::{Category, Effectiveness, Essentials, Evidence, Overlay, Record, Status};
pub use router::{route_after_validate, RouteFn, RouteOutcome, Router};
pub use stage::{Stage, StageName};

/// Result type for case operations
pub type Result<T> = std::result::Result<T, CaseError>;
