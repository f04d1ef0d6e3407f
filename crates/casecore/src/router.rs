use crate::{GraphError, Record, Status};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Values a router can hand back to the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteOutcome {
    Continue,
    End,
}

impl RouteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteOutcome::Continue => "continue",
            RouteOutcome::End => "end",
        }
    }
}

impl fmt::Display for RouteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const AFTER_VALIDATE_NAME: &str = "route_after_validate";

pub type RouteFn = fn(&Record) -> Result<RouteOutcome, GraphError>;

/// A named decision function consulted on a conditional edge.
///
/// `outcomes` lists every value `decide` may return; graph compilation
/// rejects a conditional edge that leaves one of them unmapped.
#[derive(Clone, Copy)]
pub struct Router {
    pub name: &'static str,
    pub outcomes: &'static [RouteOutcome],
    decide: RouteFn,
}

impl Router {
    pub const AFTER_VALIDATE: Router = Router::new(
        AFTER_VALIDATE_NAME,
        &[RouteOutcome::Continue, RouteOutcome::End],
        route_after_validate,
    );

    pub const fn new(
        name: &'static str,
        outcomes: &'static [RouteOutcome],
        decide: RouteFn,
    ) -> Self {
        Self {
            name,
            outcomes,
            decide,
        }
    }

    pub fn route(&self, record: &Record) -> Result<RouteOutcome, GraphError> {
        (self.decide)(record)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("name", &self.name)
            .field("outcomes", &self.outcomes)
            .finish()
    }
}

/// Stop after validation when the case was rejected or escalated.
///
/// Only the statuses validation produces are routable. Anything else means
/// the router ran before validation finished, which is a wiring fault.
pub fn route_after_validate(record: &Record) -> Result<RouteOutcome, GraphError> {
    match record.status() {
        Status::Continuing => Ok(RouteOutcome::Continue),
        Status::Rejected | Status::Escalated => Ok(RouteOutcome::End),
        status @ (Status::New
        | Status::Intake
        | Status::Investigate
        | Status::Resolve
        | Status::Close) => Err(GraphError::UnroutableStatus {
            router: AFTER_VALIDATE_NAME,
            status,
        }),
    }
}
