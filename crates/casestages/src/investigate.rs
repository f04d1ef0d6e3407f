use casecore::{Category, Evidence, Overlay, Record, Stage, StageError, StageName, Status};

/// Document evidence for the case. Never blocks the workflow.
pub struct InvestigateStage;

fn notes_for(category: Category) -> &'static str {
    match category {
        Category::Portal => "Logged reported location and opening times against known gate activity.",
        Category::Monster => "Recorded creature sightings and described behavior.",
        Category::Psychic => "Recorded the reported ability and the conditions of the malfunction.",
        Category::Environmental => "Noted power and weather readings for the reported area.",
        Category::Other => "Recorded complaint as submitted for manual review.",
    }
}

impl Stage for InvestigateStage {
    fn name(&self) -> StageName {
        StageName::Investigate
    }

    fn description(&self) -> &str {
        "Document investigation evidence"
    }

    fn run(&self, record: &Record) -> Result<Record, StageError> {
        let category = record.category().unwrap_or(Category::Other);

        let evidence = Evidence {
            category,
            notes: notes_for(category).to_string(),
        };

        Ok(record.with_overlay(
            Overlay::visited(StageName::Investigate, Status::Investigate)
                .with_evidence(evidence)
                .with_log("[INVESTIGATE] Evidence documented."),
        ))
    }
}
