use crate::rules;
use casecore::{Category, Overlay, Record, Stage, StageError, StageName, Status};

/// Apply the category rules and the essentials threshold
pub struct ValidateStage;

impl Stage for ValidateStage {
    fn name(&self) -> StageName {
        StageName::Validate
    }

    fn description(&self) -> &str {
        "Enforce category rules and minimum essentials"
    }

    fn run(&self, record: &Record) -> Result<Record, StageError> {
        let category = record.category().unwrap_or(Category::Other);

        let (valid_by_category, mut errors) =
            rules::validate_by_category(category, record.subject());

        let essentials_ok = record
            .essentials()
            .is_some_and(rules::has_minimum_essentials);
        if !essentials_ok {
            errors.push(rules::MISSING_ESSENTIALS.to_string());
        }

        let is_valid = valid_by_category && essentials_ok;

        // Manual review wins over the verdict
        let status = if rules::requires_manual_review(category) {
            Status::Escalated
        } else if is_valid {
            Status::Continuing
        } else {
            Status::Rejected
        };

        let log = format!("[VALIDATE] is_valid={}. Errors={:?}", is_valid, errors);

        Ok(record.with_overlay(
            Overlay::visited(StageName::Validate, status)
                .with_validity(is_valid, errors)
                .with_log(log),
        ))
    }
}
