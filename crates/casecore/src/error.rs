use crate::{RouteOutcome, StageName, Status};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaseError {
    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Run timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("{collaborator} collaborator failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Faults in the graph definition itself. These are never caused by the
/// contents of a complaint and always abort the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Graph has no entry point")]
    MissingEntryPoint,

    #[error("Node not found: {0}")]
    NodeNotFound(StageName),

    #[error("Node defined more than once: {0}")]
    DuplicateNode(StageName),

    #[error("Cyclic dependency detected")]
    CyclicDependency,

    #[error("Router '{router}' returned unmapped outcome '{outcome}'")]
    UnmappedRoute {
        router: &'static str,
        outcome: RouteOutcome,
    },

    #[error("Router '{router}' cannot route status '{status}'")]
    UnroutableStatus {
        router: &'static str,
        status: Status,
    },

    #[error("No stage registered for node: {0}")]
    StageNotRegistered(StageName),

    #[error("Stage visited twice in one run: {0}")]
    StageRevisited(StageName),
}
