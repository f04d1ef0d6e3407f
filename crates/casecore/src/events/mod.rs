// crates/casecore/src/events/mod.rs

mod base;

pub use base::{EventBus, ExecutionId, RunEvent};
