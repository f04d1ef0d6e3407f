use casecore::{GraphError, Stage, StageName};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of stage implementations, keyed by the node they serve
pub struct StageRegistry {
    stages: HashMap<StageName, Arc<dyn Stage>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
        }
    }

    /// Register a stage, replacing any previous one for the same node
    pub fn register(&mut self, stage: Arc<dyn Stage>) {
        let name = stage.name();
        tracing::info!("Registering stage: {}", name);
        if self.stages.insert(name, stage).is_some() {
            tracing::warn!("Stage {} was already registered and has been replaced", name);
        }
    }

    pub fn get(&self, name: StageName) -> Result<Arc<dyn Stage>, GraphError> {
        self.stages
            .get(&name)
            .cloned()
            .ok_or(GraphError::StageNotRegistered(name))
    }

    pub fn contains(&self, name: StageName) -> bool {
        self.stages.contains_key(&name)
    }

    /// Registered node names, in workflow order
    pub fn list_stages(&self) -> Vec<StageName> {
        let mut names: Vec<StageName> = self.stages.keys().copied().collect();
        names.sort();
        names
    }

    pub fn description(&self, name: StageName) -> Option<String> {
        self.stages.get(&name).map(|s| s.description().to_string())
    }
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
