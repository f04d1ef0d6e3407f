use crate::registry::StageRegistry;
use casecore::{
    CaseError, CompiledGraph, EventBus, ExecutionId, GraphError, Record, RunEvent, Stage,
    StageName, Target,
};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Walks a compiled graph from its entry point, one stage at a time
pub struct WorkflowExecutor {
    graph: CompiledGraph,
    stages: HashMap<StageName, Arc<dyn Stage>>,
    keep_snapshots: bool,
}

impl WorkflowExecutor {
    /// Bind every node of `graph` to its stage in `registry`.
    ///
    /// Fails if any node has no registered implementation.
    pub fn new(graph: CompiledGraph, registry: &StageRegistry) -> Result<Self, GraphError> {
        let mut stages = HashMap::new();
        for name in graph.order() {
            stages.insert(*name, registry.get(*name)?);
        }

        Ok(Self {
            graph,
            stages,
            keep_snapshots: false,
        })
    }

    /// Keep the record produced before each stage in the result
    pub fn with_snapshots(mut self, keep: bool) -> Self {
        self.keep_snapshots = keep;
        self
    }

    pub fn graph(&self) -> &CompiledGraph {
        &self.graph
    }

    /// Run one case to termination and return the final record
    pub fn execute(&self, record: Record, event_bus: &EventBus) -> Result<ExecutionResult, CaseError> {
        let execution_id = ExecutionId::new_v4();
        let start_time = Instant::now();

        event_bus.emit(RunEvent::RunStarted {
            execution_id,
            graph: self.graph.name().to_string(),
            subject: record.subject().to_string(),
            timestamp: Utc::now(),
        });

        tracing::info!("Starting run {} on graph '{}'", execution_id, self.graph.name());

        let result = self.walk(execution_id, record, event_bus);

        let duration_ms = start_time.elapsed().as_millis() as u64;

        event_bus.emit(RunEvent::RunCompleted {
            execution_id,
            success: result.is_ok(),
            final_status: result.as_ref().ok().map(|(r, _)| r.status()),
            duration_ms,
            timestamp: Utc::now(),
        });

        let (record, snapshots) = result?;

        tracing::info!(
            "Run {} finished with status {} after {:?}",
            execution_id,
            record.status(),
            record.path()
        );

        Ok(ExecutionResult {
            execution_id,
            record,
            snapshots,
            duration_ms,
        })
    }

    fn walk(
        &self,
        execution_id: ExecutionId,
        mut record: Record,
        event_bus: &EventBus,
    ) -> Result<(Record, Vec<Record>), CaseError> {
        let mut snapshots = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Target::Stage(self.graph.entry());

        while let Target::Stage(name) = current {
            if !visited.insert(name) {
                return Err(GraphError::StageRevisited(name).into());
            }

            let stage = self
                .stages
                .get(&name)
                .ok_or(GraphError::StageNotRegistered(name))?;

            event_bus.emit(RunEvent::StageStarted {
                execution_id,
                stage: name,
                timestamp: Utc::now(),
            });

            let start = Instant::now();
            let next = match stage.run(&record) {
                Ok(next) => next,
                Err(e) => {
                    tracing::error!("Stage {} failed: {}", name, e);

                    event_bus.emit(RunEvent::StageFailed {
                        execution_id,
                        stage: name,
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    });

                    return Err(e.into());
                }
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            tracing::debug!("Stage {} completed in {}ms, status {}", name, duration_ms, next.status());

            event_bus.emit(RunEvent::StageCompleted {
                execution_id,
                stage: name,
                status: next.status(),
                duration_ms,
                timestamp: Utc::now(),
            });

            if self.keep_snapshots {
                snapshots.push(record);
            }
            record = next;

            let transition = self.graph.next(name, &record)?;
            if let Some(outcome) = transition.outcome {
                tracing::debug!("Routed {} -> {} ({})", name, transition.target, outcome);

                event_bus.emit(RunEvent::Routed {
                    execution_id,
                    from: name,
                    outcome,
                    to: transition.target,
                    timestamp: Utc::now(),
                });
            }
            current = transition.target;
        }

        Ok((record, snapshots))
    }
}

/// Result of one run
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub execution_id: ExecutionId,
    /// Record as it left the last stage
    pub record: Record,
    /// Record as it entered each stage, in visiting order. Empty unless
    /// snapshots were enabled.
    pub snapshots: Vec<Record>,
    pub duration_ms: u64,
}
