use crate::{registry::StageRegistry, ExecutionResult, WorkflowExecutor};
use casecore::{CaseError, EventBus, GraphDefinition, Record, RunEvent};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{timeout, Duration};

/// Main runtime for processing cases
pub struct CaseRuntime {
    executor: Arc<WorkflowExecutor>,
    event_bus: Arc<EventBus>,
    config: RuntimeConfig,
}

impl CaseRuntime {
    /// Create a runtime for the standard complaint workflow
    pub fn new(registry: &StageRegistry, config: RuntimeConfig) -> Result<Self, CaseError> {
        Self::with_graph(&GraphDefinition::complaint_workflow(), registry, config)
    }

    /// Create a runtime for a custom graph definition
    pub fn with_graph(
        definition: &GraphDefinition,
        registry: &StageRegistry,
        config: RuntimeConfig,
    ) -> Result<Self, CaseError> {
        let graph = definition.compile()?;
        let executor = WorkflowExecutor::new(graph, registry)?.with_snapshots(config.keep_snapshots);
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));

        Ok(Self {
            executor: Arc::new(executor),
            event_bus,
            config,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn executor(&self) -> &Arc<WorkflowExecutor> {
        &self.executor
    }

    /// Run one case on the calling thread
    pub fn execute(&self, record: Record) -> Result<ExecutionResult, CaseError> {
        self.executor.execute(record, &self.event_bus)
    }

    /// Run independent cases concurrently.
    ///
    /// At most `max_parallel_runs` cases execute at once, each on the
    /// blocking pool. A timed-out case keeps its slot until its stage
    /// returns. Results are returned in input order; one failing or
    /// timed-out case does not affect the others.
    pub async fn run_batch(&self, records: Vec<Record>) -> Vec<Result<ExecutionResult, CaseError>> {
        let total = records.len();
        let max_parallel = self.config.max_parallel_runs.max(1);
        let permits = Arc::new(Semaphore::new(max_parallel));
        let mut pending = records.into_iter().enumerate();
        let mut running = FuturesUnordered::new();
        let mut results: Vec<Option<Result<ExecutionResult, CaseError>>> =
            (0..total).map(|_| None).collect();

        tracing::info!("Starting batch of {} cases ({} in parallel)", total, max_parallel);

        loop {
            // Top up to the parallel limit
            while running.len() < max_parallel {
                let Some((index, record)) = pending.next() else {
                    break;
                };
                running.push(run_one(
                    Arc::clone(&self.executor),
                    Arc::clone(&self.event_bus),
                    Arc::clone(&permits),
                    self.config.run_timeout_ms,
                    index,
                    record,
                ));
            }

            match running.next().await {
                Some((index, result)) => {
                    if let Err(e) = &result {
                        tracing::warn!("Case {} in batch failed: {}", index, e);
                    }
                    results[index] = Some(result);
                }
                None => break,
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Err(CaseError::Execution("case was never scheduled".into()))))
            .collect()
    }

    /// Subscribe to run events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<RunEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

async fn run_one(
    executor: Arc<WorkflowExecutor>,
    event_bus: Arc<EventBus>,
    permits: Arc<Semaphore>,
    timeout_ms: Option<u64>,
    index: usize,
    record: Record,
) -> (usize, Result<ExecutionResult, CaseError>) {
    let permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => return (index, Err(CaseError::Execution(format!("Batch closed: {}", e)))),
    };

    // The permit lives on the blocking thread, so a timed-out run holds its
    // slot until the stage returns. Only the wait is abandoned.
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        executor.execute(record, &event_bus)
    });

    // The deadline starts once the case holds a slot
    let joined = match timeout_ms {
        Some(millis) => match timeout(Duration::from_millis(millis), handle).await {
            Ok(joined) => joined,
            Err(_) => return (index, Err(CaseError::Timeout { millis })),
        },
        None => handle.await,
    };

    let result = joined
        .map_err(|e| CaseError::Execution(format!("Task join error: {}", e)))
        .and_then(|r| r);

    (index, result)
}

/// Configuration for the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on cases processed concurrently by `run_batch`
    pub max_parallel_runs: usize,
    pub event_buffer_size: usize,
    /// Per-case deadline for batch runs
    pub run_timeout_ms: Option<u64>,
    pub keep_snapshots: bool,
}

impl RuntimeConfig {
    /// Load a configuration from a JSON file; missing keys take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CaseError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_parallel_runs: 10,
            event_buffer_size: 1000,
            run_timeout_ms: None,
            keep_snapshots: false,
        }
    }
}
