// crates/casecli/src/main.rs

use anyhow::{Context, Result};
use casecore::{Edge, Record, RunEvent};
use caseruntime::{CaseRuntime, ExecutionResult, RuntimeConfig, StageRegistry};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "casectl")]
#[command(about = "Complaint workflow CLI", long_about = None)]
struct Cli {
    /// Path to a runtime configuration JSON file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging and run events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single complaint
    Run {
        /// Complaint text
        #[arg(short, long)]
        subject: String,

        /// Requester identifier
        #[arg(short, long, default_value = DEFAULT_REQUESTER)]
        requester: String,

        /// Print the final record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process every complaint in a JSON file concurrently
    Batch {
        /// Path to a JSON array of {"subject", "requester"} objects
        #[arg(short, long)]
        file: PathBuf,

        /// Print the final records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Process the built-in sample complaints
    Demo,

    /// Validate and print the workflow graph
    Graph,
}

const DEFAULT_REQUESTER: &str = "demo-user";

const SAMPLE_COMPLAINTS: &[&str] = &[
    "The portal behind the lab opens at random times and nobody can predict when.",
    "A demogorgon attack left claw marks all over the school gym.",
    "My telekinesis has a limit and keeps failing when I need it.",
    "The lights on Maple Street flicker every time a storm rolls in.",
    "My neighbour keeps parking in front of my house.",
    "",
];

#[derive(Deserialize)]
struct ComplaintInput {
    subject: String,
    #[serde(default = "default_requester")]
    requester: String,
}

fn default_requester() -> String {
    DEFAULT_REQUESTER.to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };

    tracing::debug!("Runtime config: {:?}", config);

    let mut registry = StageRegistry::new();
    casestages::register_defaults(&mut registry);
    let runtime = CaseRuntime::new(&registry, config)?;

    match cli.command {
        Commands::Run {
            subject,
            requester,
            json,
        } => {
            run_complaint(&runtime, Record::new(subject, requester), json, cli.verbose)?;
        }

        Commands::Batch { file, json } => {
            run_batch_file(&runtime, file, json).await?;
        }

        Commands::Demo => {
            run_demo(&runtime).await;
        }

        Commands::Graph => {
            print_graph(&runtime, &registry);
        }
    }

    Ok(())
}

fn run_complaint(runtime: &CaseRuntime, record: Record, json: bool, verbose: bool) -> Result<()> {
    let mut events = runtime.subscribe_events();

    let result = runtime.execute(record);

    if verbose {
        print_events(&mut events);
    }

    let result = result?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result.record)?);
    } else {
        print_case(1, &result);
    }

    Ok(())
}

async fn run_batch_file(runtime: &CaseRuntime, file: PathBuf, json: bool) -> Result<()> {
    let contents = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let inputs: Vec<ComplaintInput> = serde_json::from_str(&contents)?;

    let records = inputs
        .into_iter()
        .map(|c| Record::new(c.subject, c.requester))
        .collect();

    let results = runtime.run_batch(records).await;

    if json {
        let values = results
            .iter()
            .map(|r| match r {
                Ok(result) => serde_json::to_value(&result.record),
                Err(e) => Ok(serde_json::json!({ "error": e.to_string() })),
            })
            .collect::<Result<Vec<_>, _>>()?;
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    print_results(&results);
    Ok(())
}

async fn run_demo(runtime: &CaseRuntime) {
    let records = SAMPLE_COMPLAINTS
        .iter()
        .map(|subject| Record::new(*subject, DEFAULT_REQUESTER))
        .collect();

    let results = runtime.run_batch(records).await;
    print_results(&results);
}

fn print_results(results: &[Result<ExecutionResult, casecore::CaseError>]) {
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(result) => print_case(i + 1, result),
            Err(e) => {
                println!("{}", "=".repeat(80));
                println!("CASE {}: failed: {}", i + 1, e);
            }
        }
    }
}

fn print_case(number: usize, result: &ExecutionResult) {
    let record = &result.record;

    println!("{}", "=".repeat(80));
    println!("CASE {}: {}", number, record.subject());
    println!("{}", "-".repeat(80));
    println!("{}", summarize_run(record));
    println!("Logs:");
    for line in record.logs() {
        println!("  {}", line);
    }
}

fn summarize_run(record: &Record) -> String {
    let path = record
        .path()
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" → ");

    let or_unknown = |value: Option<String>| value.unwrap_or_else(|| "unknown".to_string());

    format!(
        "Path: {}\nCategory: {}\nStatus: {}\nValid: {}\nEffectiveness: {}\nEscalation: {}\nFollow-up: {}",
        path,
        or_unknown(record.category().map(|c| c.to_string())),
        record.status(),
        or_unknown(record.is_valid().map(|v| v.to_string())),
        or_unknown(record.effectiveness().map(|e| e.to_string())),
        or_unknown(record.requires_escalation().map(|v| v.to_string())),
        or_unknown(record.follow_up_required().map(|v| v.to_string())),
    )
}

fn print_events(events: &mut broadcast::Receiver<RunEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            RunEvent::RunStarted { execution_id, .. } => {
                println!("▶️  Run {} started", execution_id);
            }
            RunEvent::StageStarted { stage, .. } => {
                println!("  ⚡ Starting stage: {}", stage);
            }
            RunEvent::StageCompleted {
                stage,
                status,
                duration_ms,
                ..
            } => {
                println!("  ✅ Stage {} completed in {}ms (status {})", stage, duration_ms, status);
            }
            RunEvent::StageFailed { stage, error, .. } => {
                println!("  ❌ Stage {} failed: {}", stage, error);
            }
            RunEvent::Routed { from, outcome, to, .. } => {
                println!("  ↪️  {} routed '{}' to {}", from, outcome, to);
            }
            RunEvent::RunCompleted {
                success,
                duration_ms,
                ..
            } => {
                if success {
                    println!("✨ Run completed in {}ms", duration_ms);
                } else {
                    println!("💥 Run failed after {}ms", duration_ms);
                }
            }
        }
    }
}

fn print_graph(runtime: &CaseRuntime, registry: &StageRegistry) {
    let graph = runtime.executor().graph();

    println!("📋 Graph: {}", graph.name());
    println!("   Entry: {}", graph.entry());
    println!();

    for stage in graph.order() {
        if let Some(description) = registry.description(*stage) {
            println!("  {}: {}", stage, description);
        }
        match graph.edge(*stage) {
            Some(Edge::Direct(target)) => println!("  • {} → {}", stage, target),
            Some(Edge::Conditional { router, branches }) => {
                println!("  • {} ? {}", stage, router.name);
                for (outcome, target) in branches.iter() {
                    println!("      {} → {}", outcome, target);
                }
            }
            None => println!("  • {}", stage),
        }
    }
}
