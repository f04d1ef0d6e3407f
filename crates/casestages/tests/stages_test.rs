// crates/casestages/tests/stages_test.rs

use casecore::{
    Category, Effectiveness, Essentials, Evidence, Overlay, Record, Stage, StageError, StageName,
    Status,
};
use casestages::rules::{self, MANUAL_REVIEW, MISSING_ESSENTIALS};
use casestages::{
    Classifier, CloseStage, CollaboratorError, Extractor, HeuristicExtractor, IntakeStage,
    InvestigateStage, KeywordClassifier, KnownCases, ResolveStage, ValidateStage, CANNOT_RESOLVE,
};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

fn fixed_label(label: &'static str) -> Arc<dyn Classifier> {
    Arc::new(move |_: &str| -> Result<String, CollaboratorError> { Ok(label.to_string()) })
}

fn what_only() -> Arc<dyn Extractor> {
    Arc::new(|text: &str| -> Result<Essentials, CollaboratorError> {
        Ok(Essentials::new(None, Some(text.to_string()), None, None))
    })
}

fn intake(label: &'static str) -> IntakeStage {
    IntakeStage::new(fixed_label(label), what_only())
}

fn after_intake(subject: &str, category: Category) -> Record {
    Record::new(subject, "demo-user").with_overlay(
        Overlay::visited(StageName::Intake, Status::Intake)
            .with_category(category)
            .with_essentials(Essentials::new(None, Some(subject.to_string()), None, None)),
    )
}

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1983, 11, 6, 20, 0, 0).unwrap()
}

#[test]
fn test_intake_sets_category_and_essentials() {
    let input = Record::new("The demogorgon attacked", "demo-user");
    let output = intake("Monster").run(&input).unwrap();

    assert_eq!(output.category(), Some(Category::Monster));
    assert_eq!(output.status(), Status::Intake);
    assert_eq!(output.path(), &[StageName::Intake]);
    assert_eq!(
        output.essentials().and_then(|e| e.what()),
        Some("The demogorgon attacked")
    );
    assert_eq!(output.is_duplicate(), Some(false));
    assert_eq!(output.logs(), &["[INTAKE] Categorized as 'monster'.".to_string()]);

    // input is a snapshot and stays as it was
    assert_eq!(input.status(), Status::New);
    assert!(input.category().is_none());
}

#[test]
fn test_intake_coerces_unknown_labels() {
    for label in ["xyz", "", "monsters", "portal gate", "OTHER?"] {
        let stage = IntakeStage::new(
            Arc::new(move |_: &str| -> Result<String, CollaboratorError> { Ok(label.to_string()) }),
            what_only(),
        );
        let output = stage.run(&Record::new("text", "demo-user")).unwrap();

        assert_eq!(output.category(), Some(Category::Other), "label {:?}", label);
        assert!(output.logs()[0].contains("coerced to 'other'"));
    }
}

#[test]
fn test_intake_propagates_classifier_failure() {
    let stage = IntakeStage::new(
        Arc::new(|_: &str| -> Result<String, CollaboratorError> {
            Err(CollaboratorError::new("service unavailable"))
        }),
        what_only(),
    );

    let err = stage.run(&Record::new("text", "demo-user")).unwrap_err();
    assert_eq!(
        err,
        StageError::Collaborator {
            collaborator: "classifier",
            message: "service unavailable".to_string(),
        }
    );
}

#[test]
fn test_intake_propagates_extractor_failure() {
    let stage = IntakeStage::new(
        fixed_label("portal"),
        Arc::new(|_: &str| -> Result<Essentials, CollaboratorError> {
            Err(CollaboratorError::new("malformed response"))
        }),
    );

    let err = stage.run(&Record::new("text", "demo-user")).unwrap_err();
    assert!(matches!(
        err,
        StageError::Collaborator {
            collaborator: "extractor",
            ..
        }
    ));
}

#[test]
fn test_intake_links_duplicates() {
    let known = KnownCases::new().with_case("case-11", "demo-user", "The lights   keep flickering");
    let stage = intake("environmental").with_duplicate_check(Arc::new(known));

    let repeat = stage
        .run(&Record::new("the lights keep flickering", "demo-user"))
        .unwrap();
    assert_eq!(repeat.is_duplicate(), Some(true));
    assert_eq!(repeat.duplicate_of(), Some("case-11"));
    assert!(repeat.logs().iter().any(|l| l.contains("case-11")));

    let other_requester = stage
        .run(&Record::new("the lights keep flickering", "someone-else"))
        .unwrap();
    assert_eq!(other_requester.is_duplicate(), Some(false));
}

#[test]
fn test_validate_continuing() {
    let input = after_intake("A creature was hunting near the school", Category::Monster);
    let output = ValidateStage.run(&input).unwrap();

    assert_eq!(output.status(), Status::Continuing);
    assert_eq!(output.is_valid(), Some(true));
    assert_eq!(output.validation_errors(), Some(&[][..]));
    assert_eq!(output.path(), &[StageName::Intake, StageName::Validate]);
    assert_eq!(output.logs().len(), 1);
}

#[test]
fn test_validate_rejects_category_rule_failure() {
    let input = after_intake("Something is wrong", Category::Psychic);
    let output = ValidateStage.run(&input).unwrap();

    assert_eq!(output.status(), Status::Rejected);
    assert_eq!(output.is_valid(), Some(false));
    assert_eq!(
        output.validation_errors().unwrap(),
        &["Psychic complaints must reference ability limitations or malfunctions.".to_string()]
    );
}

#[test]
fn test_validate_rejects_missing_essentials() {
    let input = Record::new("The portal opens at night", "demo-user").with_overlay(
        Overlay::visited(StageName::Intake, Status::Intake)
            .with_category(Category::Portal)
            .with_essentials(Essentials::default()),
    );
    let output = ValidateStage.run(&input).unwrap();

    assert_eq!(output.status(), Status::Rejected);
    assert_eq!(output.validation_errors().unwrap(), &[MISSING_ESSENTIALS.to_string()]);
}

#[test]
fn test_validate_accumulates_all_reasons() {
    let input = Record::new("nothing useful", "demo-user").with_overlay(
        Overlay::new()
            .with_category(Category::Environmental)
            .with_essentials(Essentials::default()),
    );
    let output = ValidateStage.run(&input).unwrap();

    assert_eq!(output.validation_errors().unwrap().len(), 2);
    assert_eq!(output.validation_errors().unwrap()[1], MISSING_ESSENTIALS);
}

#[test]
fn test_validate_escalates_other_even_with_essentials() {
    let input = after_intake("Something strange with full detail", Category::Other);
    let output = ValidateStage.run(&input).unwrap();

    assert_eq!(output.status(), Status::Escalated);
    assert_eq!(output.is_valid(), Some(false));
    assert_eq!(output.validation_errors().unwrap(), &[MANUAL_REVIEW.to_string()]);
}

#[test]
fn test_validate_without_intake_reads_other() {
    let output = ValidateStage.run(&Record::new("text", "demo-user")).unwrap();

    assert_eq!(output.status(), Status::Escalated);
    assert_eq!(output.validation_errors().unwrap().len(), 2);
}

#[test]
fn test_investigate_always_documents_evidence() {
    for category in Category::ALL {
        let output = InvestigateStage.run(&after_intake("text", category)).unwrap();
        let evidence = output.evidence().unwrap();

        assert_eq!(evidence.category, category);
        assert!(!evidence.notes.is_empty());
        assert_eq!(output.status(), Status::Investigate);
        assert_eq!(output.path().last(), Some(&StageName::Investigate));
    }
}

#[test]
fn test_resolve_with_evidence() {
    for (category, escalate) in [
        (Category::Portal, false),
        (Category::Monster, true),
        (Category::Psychic, false),
        (Category::Environmental, true),
    ] {
        let input = InvestigateStage.run(&after_intake("text", category)).unwrap();
        let output = ResolveStage.run(&input).unwrap();

        assert_eq!(output.effectiveness(), Some(Effectiveness::Medium));
        assert_eq!(output.requires_escalation(), Some(escalate), "{}", category);
        assert_eq!(
            output.resolution(),
            Some(format!("Apply Downside Up Protocol for '{}' based on documented evidence.", category).as_str())
        );
        assert_eq!(output.status(), Status::Resolve);
    }
}

#[test]
fn test_resolve_without_evidence_fails_safe() {
    let output = ResolveStage
        .run(&after_intake("text", Category::Portal))
        .unwrap();

    assert_eq!(output.resolution(), Some(CANNOT_RESOLVE));
    assert_eq!(output.effectiveness(), Some(Effectiveness::Low));
    assert_eq!(output.requires_escalation(), Some(true));
    assert!(output.logs().last().unwrap().contains("effectiveness=low"));
}

#[test]
fn test_close_flags_follow_up_only_for_low() {
    let close = CloseStage::with_clock(fixed_time);

    for (effectiveness, follow_up) in [
        (Effectiveness::High, false),
        (Effectiveness::Medium, false),
        (Effectiveness::Low, true),
    ] {
        let input = Record::new("text", "demo-user")
            .with_overlay(Overlay::new().with_resolution("r", effectiveness, false));
        let output = close.run(&input).unwrap();

        assert_eq!(output.follow_up_required(), Some(follow_up));
        assert_eq!(output.applied(), Some(true));
        assert_eq!(output.customer_satisfaction_attempted(), Some(true));
        assert_eq!(output.outcome(), Some("closed"));
        assert_eq!(output.closed_at(), Some(fixed_time()));
        assert_eq!(output.status(), Status::Close);
    }
}

#[test]
fn test_close_without_rating_reads_medium() {
    let output = CloseStage::new().run(&Record::new("text", "demo-user")).unwrap();
    assert_eq!(output.follow_up_required(), Some(false));
    assert!(output.closed_at().is_some());
}

#[test]
fn test_closed_at_serializes_as_iso_8601() {
    let output = CloseStage::with_clock(fixed_time)
        .run(&Record::new("text", "demo-user"))
        .unwrap();
    let json = output.to_json().unwrap();

    assert_eq!(json["closed_at"], "1983-11-06T20:00:00Z");
}

#[test]
fn test_category_rules_keywords() {
    assert!(rules::validate_by_category(Category::Portal, "It OPENS every night").0);
    assert!(rules::validate_by_category(Category::Psychic, "I can\u{2019}t move things").0);
    assert!(rules::validate_by_category(Category::Environmental, "Storm over Hawkins").0);
    assert!(!rules::validate_by_category(Category::Monster, "It was rude").0);
    assert!(!rules::validate_by_category(Category::Other, "anything at all").0);
    assert!(rules::requires_manual_review(Category::Other));
    assert!(!rules::requires_manual_review(Category::Portal));
}

#[test]
fn test_minimum_essentials_require_text() {
    assert!(!rules::has_minimum_essentials(&Essentials::default()));
    assert!(!rules::has_minimum_essentials(&Essentials::new(
        Some("Will".into()),
        Some(" \t".into()),
        None,
        None,
    )));
    assert!(rules::has_minimum_essentials(&Essentials::new(
        None,
        Some("lights flicker".into()),
        None,
        None,
    )));
}

#[test]
fn test_keyword_classifier() {
    let classify = |text: &str| KeywordClassifier.classify(text).unwrap();

    assert_eq!(classify("A demogorgon attack at the quarry"), "monster");
    assert_eq!(classify("The portal opens in the lab"), "portal");
    assert_eq!(classify("Her telekinesis stopped working"), "psychic");
    assert_eq!(classify("The lights flicker during the storm"), "environmental");
    assert_eq!(classify("My neighbour is loud"), "other");
    assert_eq!(classify(""), "other");
}

#[test]
fn test_heuristic_extractor() {
    let essentials = HeuristicExtractor
        .extract("Last night Dustin saw it at Hawkins Lab, near the fence.")
        .unwrap();

    assert_eq!(essentials.who(), Some("Dustin"));
    assert_eq!(essentials.when(), Some("night"));
    assert_eq!(essentials.location(), Some("Hawkins Lab"));
    assert_eq!(
        essentials.what(),
        Some("Last night Dustin saw it at Hawkins Lab, near the fence.")
    );
}

#[test]
fn test_heuristic_extractor_ignores_words_containing_in_or_at() {
    let essentials = HeuristicExtractor
        .extract("the painting in the attic is at 9pm")
        .unwrap();

    assert_eq!(essentials.location(), Some("the attic is"));
    assert_eq!(essentials.when(), Some("9pm"));

    let essentials = HeuristicExtractor.extract("meet at midnight").unwrap();
    assert_eq!(essentials.location(), None);
    assert_eq!(essentials.when(), Some("midnight"));

    let essentials = HeuristicExtractor.extract("a cat sat on a mat").unwrap();
    assert_eq!(essentials.location(), None);
    assert_eq!(essentials.who(), None);
}

#[test]
fn test_heuristic_extractor_empty_text() {
    let essentials = HeuristicExtractor.extract("   ").unwrap();
    assert_eq!(essentials, Essentials::default());
}

#[test]
fn test_evidence_round_trip_through_record() {
    let record = Record::new("text", "demo-user").with_overlay(Overlay::new().with_evidence(Evidence {
        category: Category::Psychic,
        notes: "n".to_string(),
    }));

    let output = ResolveStage.run(&record).unwrap();
    assert_eq!(output.evidence(), record.evidence());
}
