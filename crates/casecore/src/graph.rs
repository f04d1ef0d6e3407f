use crate::{GraphError, Record, RouteOutcome, Router, StageName};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Where an edge leads: another stage, or the terminal marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "stage")]
pub enum Target {
    Stage(StageName),
    End,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Stage(stage) => write!(f, "{}", stage),
            Target::End => f.write_str("END"),
        }
    }
}

/// Outgoing edge of a node
#[derive(Debug, Clone, Copy)]
pub enum Edge {
    Direct(Target),
    Conditional {
        router: Router,
        branches: &'static [(RouteOutcome, Target)],
    },
}

impl Edge {
    /// Every target this edge can lead to
    pub fn targets(&self) -> Vec<Target> {
        match self {
            Edge::Direct(target) => vec![*target],
            Edge::Conditional { branches, .. } => branches.iter().map(|(_, t)| *t).collect(),
        }
    }
}

const AFTER_VALIDATE_BRANCHES: &[(RouteOutcome, Target)] = &[
    (RouteOutcome::Continue, Target::Stage(StageName::Investigate)),
    (RouteOutcome::End, Target::End),
];

/// Edge table of the complaint workflow.
///
/// The match is exhaustive, so a new stage cannot be added without
/// deciding where it leads.
pub const fn complaint_edge(stage: StageName) -> Edge {
    match stage {
        StageName::Intake => Edge::Direct(Target::Stage(StageName::Validate)),
        StageName::Validate => Edge::Conditional {
            router: Router::AFTER_VALIDATE,
            branches: AFTER_VALIDATE_BRANCHES,
        },
        StageName::Investigate => Edge::Direct(Target::Stage(StageName::Resolve)),
        StageName::Resolve => Edge::Direct(Target::Stage(StageName::Close)),
        StageName::Close => Edge::Direct(Target::End),
    }
}

/// Static topology of a workflow, checked by [`GraphDefinition::compile`]
#[derive(Debug, Clone)]
pub struct GraphDefinition {
    pub name: String,
    pub entry: Option<StageName>,
    pub edges: Vec<(StageName, Edge)>,
}

impl GraphDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry: None,
            edges: Vec::new(),
        }
    }

    /// The standard intake → validate → investigate → resolve → close graph
    pub fn complaint_workflow() -> Self {
        Self {
            name: "complaint-handling".to_string(),
            entry: Some(StageName::Intake),
            edges: StageName::ALL
                .iter()
                .map(|stage| (*stage, complaint_edge(*stage)))
                .collect(),
        }
    }

    pub fn with_entry(mut self, entry: StageName) -> Self {
        self.entry = Some(entry);
        self
    }

    pub fn with_edge(mut self, from: StageName, edge: Edge) -> Self {
        self.edges.push((from, edge));
        self
    }

    /// Validate the definition and freeze it for execution.
    ///
    /// Fails if the entry point is missing, a node is defined twice or
    /// referenced without being defined, a router outcome is unmapped, or the
    /// edges form a cycle.
    pub fn compile(&self) -> Result<CompiledGraph, GraphError> {
        let entry = self.entry.ok_or(GraphError::MissingEntryPoint)?;

        let mut edges = HashMap::new();
        for (from, edge) in &self.edges {
            if edges.insert(*from, *edge).is_some() {
                return Err(GraphError::DuplicateNode(*from));
            }
        }

        if !edges.contains_key(&entry) {
            return Err(GraphError::NodeNotFound(entry));
        }

        for edge in edges.values() {
            for target in edge.targets() {
                if let Target::Stage(stage) = target {
                    if !edges.contains_key(&stage) {
                        return Err(GraphError::NodeNotFound(stage));
                    }
                }
            }

            if let Edge::Conditional { router, branches } = edge {
                for outcome in router.outcomes {
                    if !branches.iter().any(|(o, _)| o == outcome) {
                        return Err(GraphError::UnmappedRoute {
                            router: router.name,
                            outcome: *outcome,
                        });
                    }
                }
            }
        }

        let order = self.topological_order(&edges, entry)?;

        tracing::debug!("Compiled graph '{}' with {} nodes", self.name, order.len());

        Ok(CompiledGraph {
            name: self.name.clone(),
            entry,
            edges,
            order,
        })
    }

    /// Build a dependency graph from the edge table and sort it
    fn topological_order(
        &self,
        edges: &HashMap<StageName, Edge>,
        entry: StageName,
    ) -> Result<Vec<StageName>, GraphError> {
        let mut graph = DiGraph::<StageName, ()>::new();
        let mut node_to_index: HashMap<StageName, NodeIndex> = HashMap::new();

        // Keep definition order so the sort is deterministic
        for (stage, _) in &self.edges {
            node_to_index.insert(*stage, graph.add_node(*stage));
        }

        for (from, edge) in edges {
            for target in edge.targets() {
                if let Target::Stage(to) = target {
                    graph.add_edge(node_to_index[from], node_to_index[&to], ());
                }
            }
        }

        let sorted = toposort(&graph, None).map_err(|_| GraphError::CyclicDependency)?;

        let mut reachable = Vec::new();
        let mut dfs = Dfs::new(&graph, node_to_index[&entry]);
        while let Some(idx) = dfs.next(&graph) {
            reachable.push(graph[idx]);
        }
        for (stage, _) in &self.edges {
            if !reachable.contains(stage) {
                tracing::warn!("Node {} is unreachable from entry {}", stage, entry);
            }
        }

        Ok(sorted.into_iter().map(|idx| graph[idx]).collect())
    }
}

/// A validated graph, ready to drive an executor
#[derive(Debug, Clone)]
pub struct CompiledGraph {
    name: String,
    entry: StageName,
    edges: HashMap<StageName, Edge>,
    order: Vec<StageName>,
}

/// Result of looking up the next node after a stage ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub target: Target,
    /// Router decision, if the edge was conditional
    pub outcome: Option<RouteOutcome>,
}

impl CompiledGraph {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> StageName {
        self.entry
    }

    /// Nodes in topological order
    pub fn order(&self) -> &[StageName] {
        &self.order
    }

    pub fn edge(&self, stage: StageName) -> Option<&Edge> {
        self.edges.get(&stage)
    }

    /// Pick the successor of `from`, consulting its router if the edge is
    /// conditional. `record` is the output of the stage that just ran.
    pub fn next(&self, from: StageName, record: &Record) -> Result<Transition, GraphError> {
        let edge = self.edges.get(&from).ok_or(GraphError::NodeNotFound(from))?;

        match edge {
            Edge::Direct(target) => Ok(Transition {
                target: *target,
                outcome: None,
            }),
            Edge::Conditional { router, branches } => {
                let outcome = router.route(record)?;
                let target = branches
                    .iter()
                    .find(|(o, _)| *o == outcome)
                    .map(|(_, t)| *t)
                    .ok_or(GraphError::UnmappedRoute {
                        router: router.name,
                        outcome,
                    })?;
                Ok(Transition {
                    target,
                    outcome: Some(outcome),
                })
            }
        }
    }
}
