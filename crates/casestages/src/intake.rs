use crate::collaborator::{Classifier, DuplicateCheck, Extractor, NoDuplicates};
use casecore::{Category, Overlay, Record, Stage, StageError, StageName, Status};
use std::sync::Arc;

/// Categorize the complaint and pull out its essentials
pub struct IntakeStage {
    classifier: Arc<dyn Classifier>,
    extractor: Arc<dyn Extractor>,
    duplicates: Arc<dyn DuplicateCheck>,
}

impl IntakeStage {
    pub fn new(classifier: Arc<dyn Classifier>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            classifier,
            extractor,
            duplicates: Arc::new(NoDuplicates),
        }
    }

    pub fn with_duplicate_check(mut self, duplicates: Arc<dyn DuplicateCheck>) -> Self {
        self.duplicates = duplicates;
        self
    }
}

impl Stage for IntakeStage {
    fn name(&self) -> StageName {
        StageName::Intake
    }

    fn description(&self) -> &str {
        "Classify the complaint and extract who/what/when/where"
    }

    fn run(&self, record: &Record) -> Result<Record, StageError> {
        let subject = record.subject();

        let label = self
            .classifier
            .classify(subject)
            .map_err(|e| StageError::Collaborator {
                collaborator: "classifier",
                message: e.to_string(),
            })?;

        let essentials = self
            .extractor
            .extract(subject)
            .map_err(|e| StageError::Collaborator {
                collaborator: "extractor",
                message: e.to_string(),
            })?;

        let duplicate_of = self.duplicates.find_duplicate(subject, record.requester());

        let mut overlay = Overlay::visited(StageName::Intake, Status::Intake)
            .with_essentials(essentials)
            .with_duplicate(duplicate_of.clone());

        let category = match Category::from_label(&label) {
            Some(category) => category,
            None => {
                tracing::warn!("Classifier returned unknown label {:?}, using 'other'", label);
                overlay = overlay.with_log(format!(
                    "[INTAKE] Unrecognized label '{}' coerced to 'other'.",
                    label.trim()
                ));
                Category::Other
            }
        };

        overlay = overlay
            .with_category(category)
            .with_log(format!("[INTAKE] Categorized as '{}'.", category));

        if let Some(case_id) = &duplicate_of {
            overlay = overlay.with_log(format!("[INTAKE] Possible duplicate of case {}.", case_id));
        }

        Ok(record.with_overlay(overlay))
    }
}
