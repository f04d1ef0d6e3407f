use casecore::{Effectiveness, Overlay, Record, Stage, StageError, StageName, Status};
use chrono::{DateTime, Utc};

/// Close the case and decide whether it needs a follow-up
pub struct CloseStage {
    clock: fn() -> DateTime<Utc>,
}

impl CloseStage {
    pub fn new() -> Self {
        Self { clock: Utc::now }
    }

    /// Use a fixed time source instead of the system clock
    pub fn with_clock(clock: fn() -> DateTime<Utc>) -> Self {
        Self { clock }
    }
}

impl Default for CloseStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for CloseStage {
    fn name(&self) -> StageName {
        StageName::Close
    }

    fn description(&self) -> &str {
        "Record closure and flag low-effectiveness cases for follow-up"
    }

    fn run(&self, record: &Record) -> Result<Record, StageError> {
        let effectiveness = record.effectiveness().unwrap_or(Effectiveness::Medium);
        let follow_up_required = effectiveness == Effectiveness::Low;

        // applied and satisfaction are placeholders until verification exists
        Ok(record.with_overlay(
            Overlay::visited(StageName::Close, Status::Close)
                .with_applied(true)
                .with_satisfaction_attempted(true)
                .with_outcome("closed")
                .with_closed_at((self.clock)())
                .with_follow_up(follow_up_required)
                .with_log(format!(
                    "[CLOSE] Closed. follow_up_required={}",
                    follow_up_required
                )),
        ))
    }
}
