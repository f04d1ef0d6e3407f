use crate::rules;
use casecore::{Category, Effectiveness, Overlay, Record, Stage, StageError, StageName, Status};

pub const CANNOT_RESOLVE: &str = "Cannot resolve: missing investigation evidence.";

/// Pick a resolution from the documented evidence.
///
/// Without evidence the case still moves on to closing, with a low rating
/// and an escalation flag, so the audit trail stays complete.
pub struct ResolveStage;

impl Stage for ResolveStage {
    fn name(&self) -> StageName {
        StageName::Resolve
    }

    fn description(&self) -> &str {
        "Choose a resolution and rate its effectiveness"
    }

    fn run(&self, record: &Record) -> Result<Record, StageError> {
        let category = record.category().unwrap_or(Category::Other);

        let (resolution, effectiveness, requires_escalation) = match record.evidence() {
            None => (CANNOT_RESOLVE.to_string(), Effectiveness::Low, true),
            Some(_) => (
                format!(
                    "Apply Downside Up Protocol for '{}' based on documented evidence.",
                    category
                ),
                Effectiveness::Medium,
                rules::requires_escalation(category),
            ),
        };

        let log = format!("[RESOLVE] {} (effectiveness={})", resolution, effectiveness);

        Ok(record.with_overlay(
            Overlay::visited(StageName::Resolve, Status::Resolve)
                .with_resolution(resolution, effectiveness, requires_escalation)
                .with_log(log),
        ))
    }
}
