use crate::StageName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse lifecycle state of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    New,
    Intake,
    Continuing,
    Rejected,
    Escalated,
    Investigate,
    Resolve,
    Close,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "new",
            Status::Intake => "intake",
            Status::Continuing => "continuing",
            Status::Rejected => "rejected",
            Status::Escalated => "escalated",
            Status::Investigate => "investigate",
            Status::Resolve => "resolve",
            Status::Close => "close",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of complaint categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Portal,
    Monster,
    Psychic,
    Environmental,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Portal,
        Category::Monster,
        Category::Psychic,
        Category::Environmental,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Portal => "portal",
            Category::Monster => "monster",
            Category::Psychic => "psychic",
            Category::Environmental => "environmental",
            Category::Other => "other",
        }
    }

    /// Parse a classifier label, ignoring surrounding whitespace and case
    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim().to_lowercase();
        Category::ALL.into_iter().find(|c| c.as_str() == label)
    }

    /// Like [`Category::from_label`], but unknown labels become `Other`
    pub fn coerce(label: &str) -> Category {
        Category::from_label(label).unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_label(s).ok_or_else(|| format!("unknown category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effectiveness {
    High,
    Medium,
    Low,
}

impl Effectiveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effectiveness::High => "high",
            Effectiveness::Medium => "medium",
            Effectiveness::Low => "low",
        }
    }
}

impl fmt::Display for Effectiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who/what/when/where details extracted from the complaint text.
///
/// A blank value is stored as absent, so `Some` always carries text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEssentials")]
pub struct Essentials {
    who: Option<String>,
    what: Option<String>,
    when: Option<String>,
    #[serde(rename = "where")]
    location: Option<String>,
}

impl Essentials {
    pub fn new(
        who: Option<String>,
        what: Option<String>,
        when: Option<String>,
        location: Option<String>,
    ) -> Self {
        Self {
            who: present(who),
            what: present(what),
            when: present(when),
            location: present(location),
        }
    }

    pub fn who(&self) -> Option<&str> {
        self.who.as_deref()
    }

    pub fn what(&self) -> Option<&str> {
        self.what.as_deref()
    }

    pub fn when(&self) -> Option<&str> {
        self.when.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

/// Wire shape of [`Essentials`]; deserialized values pass through
/// [`Essentials::new`]
#[derive(Deserialize)]
struct RawEssentials {
    #[serde(default)]
    who: Option<String>,
    #[serde(default)]
    what: Option<String>,
    #[serde(default)]
    when: Option<String>,
    #[serde(default, rename = "where")]
    location: Option<String>,
}

impl From<RawEssentials> for Essentials {
    fn from(raw: RawEssentials) -> Self {
        Essentials::new(raw.who, raw.what, raw.when, raw.location)
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Evidence documented by the investigation stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub category: Category,
    pub notes: String,
}

/// The case record threaded through the workflow.
///
/// Records are never edited in place. Every change goes through
/// [`Record::with_overlay`], [`Record::append_log`] or
/// [`Record::append_path`], each of which returns a new record and leaves the
/// receiver untouched. Fields can be set or replaced but never cleared, and
/// `path` and `logs` only grow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    subject: String,
    requester: String,
    path: Vec<StageName>,
    status: Status,
    logs: Vec<String>,

    category: Option<Category>,
    essentials: Option<Essentials>,
    is_duplicate: Option<bool>,
    duplicate_of: Option<String>,

    is_valid: Option<bool>,
    validation_errors: Option<Vec<String>>,

    evidence: Option<Evidence>,

    resolution: Option<String>,
    effectiveness: Option<Effectiveness>,
    requires_escalation: Option<bool>,

    applied: Option<bool>,
    customer_satisfaction_attempted: Option<bool>,
    outcome: Option<String>,
    closed_at: Option<DateTime<Utc>>,
    follow_up_required: Option<bool>,
}

impl Record {
    pub fn new(subject: impl Into<String>, requester: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            requester: requester.into(),
            path: Vec::new(),
            status: Status::New,
            logs: Vec::new(),
            category: None,
            essentials: None,
            is_duplicate: None,
            duplicate_of: None,
            is_valid: None,
            validation_errors: None,
            evidence: None,
            resolution: None,
            effectiveness: None,
            requires_escalation: None,
            applied: None,
            customer_satisfaction_attempted: None,
            outcome: None,
            closed_at: None,
            follow_up_required: None,
        }
    }

    /// Return a copy of this record with the overlay's fields applied
    pub fn with_overlay(&self, overlay: Overlay) -> Record {
        let mut next = self.clone();
        let Overlay {
            status,
            category,
            essentials,
            is_duplicate,
            duplicate_of,
            is_valid,
            validation_errors,
            evidence,
            resolution,
            effectiveness,
            requires_escalation,
            applied,
            customer_satisfaction_attempted,
            outcome,
            closed_at,
            follow_up_required,
            visit,
            log,
        } = overlay;

        set(&mut next.status, status);
        set_opt(&mut next.category, category);
        set_opt(&mut next.essentials, essentials);
        set_opt(&mut next.is_duplicate, is_duplicate);
        set_opt(&mut next.duplicate_of, duplicate_of);
        set_opt(&mut next.is_valid, is_valid);
        set_opt(&mut next.validation_errors, validation_errors);
        set_opt(&mut next.evidence, evidence);
        set_opt(&mut next.resolution, resolution);
        set_opt(&mut next.effectiveness, effectiveness);
        set_opt(&mut next.requires_escalation, requires_escalation);
        set_opt(&mut next.applied, applied);
        set_opt(
            &mut next.customer_satisfaction_attempted,
            customer_satisfaction_attempted,
        );
        set_opt(&mut next.outcome, outcome);
        set_opt(&mut next.closed_at, closed_at);
        set_opt(&mut next.follow_up_required, follow_up_required);

        if let Some(stage) = visit {
            next.path.push(stage);
        }
        next.logs.extend(log);
        next
    }

    pub fn append_log(&self, line: impl Into<String>) -> Record {
        self.with_overlay(Overlay::new().with_log(line))
    }

    pub fn append_path(&self, stage: StageName) -> Record {
        self.with_overlay(Overlay::new().with_visit(stage))
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn requester(&self) -> &str {
        &self.requester
    }

    pub fn path(&self) -> &[StageName] {
        &self.path
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn essentials(&self) -> Option<&Essentials> {
        self.essentials.as_ref()
    }

    pub fn is_duplicate(&self) -> Option<bool> {
        self.is_duplicate
    }

    pub fn duplicate_of(&self) -> Option<&str> {
        self.duplicate_of.as_deref()
    }

    pub fn is_valid(&self) -> Option<bool> {
        self.is_valid
    }

    pub fn validation_errors(&self) -> Option<&[String]> {
        self.validation_errors.as_deref()
    }

    pub fn evidence(&self) -> Option<&Evidence> {
        self.evidence.as_ref()
    }

    pub fn resolution(&self) -> Option<&str> {
        self.resolution.as_deref()
    }

    pub fn effectiveness(&self) -> Option<Effectiveness> {
        self.effectiveness
    }

    pub fn requires_escalation(&self) -> Option<bool> {
        self.requires_escalation
    }

    pub fn applied(&self) -> Option<bool> {
        self.applied
    }

    pub fn customer_satisfaction_attempted(&self) -> Option<bool> {
        self.customer_satisfaction_attempted
    }

    pub fn outcome(&self) -> Option<&str> {
        self.outcome.as_deref()
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn follow_up_required(&self) -> Option<bool> {
        self.follow_up_required
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Partial update applied by [`Record::with_overlay`].
///
/// Unset fields leave the record's value alone; there is no way to clear one.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    status: Option<Status>,
    category: Option<Category>,
    essentials: Option<Essentials>,
    is_duplicate: Option<bool>,
    duplicate_of: Option<String>,
    is_valid: Option<bool>,
    validation_errors: Option<Vec<String>>,
    evidence: Option<Evidence>,
    resolution: Option<String>,
    effectiveness: Option<Effectiveness>,
    requires_escalation: Option<bool>,
    applied: Option<bool>,
    customer_satisfaction_attempted: Option<bool>,
    outcome: Option<String>,
    closed_at: Option<DateTime<Utc>>,
    follow_up_required: Option<bool>,
    visit: Option<StageName>,
    log: Vec<String>,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay for a stage finishing: records the visit and sets its status
    pub fn visited(stage: StageName, status: Status) -> Self {
        Self::new().with_visit(stage).with_status(status)
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_essentials(mut self, essentials: Essentials) -> Self {
        self.essentials = Some(essentials);
        self
    }

    pub fn with_duplicate(mut self, duplicate_of: Option<String>) -> Self {
        self.is_duplicate = Some(duplicate_of.is_some());
        self.duplicate_of = duplicate_of;
        self
    }

    pub fn with_validity(mut self, is_valid: bool, errors: Vec<String>) -> Self {
        self.is_valid = Some(is_valid);
        self.validation_errors = Some(errors);
        self
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence = Some(evidence);
        self
    }

    pub fn with_resolution(
        mut self,
        resolution: impl Into<String>,
        effectiveness: Effectiveness,
        requires_escalation: bool,
    ) -> Self {
        self.resolution = Some(resolution.into());
        self.effectiveness = Some(effectiveness);
        self.requires_escalation = Some(requires_escalation);
        self
    }

    pub fn with_applied(mut self, applied: bool) -> Self {
        self.applied = Some(applied);
        self
    }

    pub fn with_satisfaction_attempted(mut self, attempted: bool) -> Self {
        self.customer_satisfaction_attempted = Some(attempted);
        self
    }

    pub fn with_outcome(mut self, outcome: impl Into<String>) -> Self {
        self.outcome = Some(outcome.into());
        self
    }

    pub fn with_closed_at(mut self, closed_at: DateTime<Utc>) -> Self {
        self.closed_at = Some(closed_at);
        self
    }

    pub fn with_follow_up(mut self, follow_up_required: bool) -> Self {
        self.follow_up_required = Some(follow_up_required);
        self
    }

    pub fn with_visit(mut self, stage: StageName) -> Self {
        self.visit = Some(stage);
        self
    }

    /// Queue an audit line; may be called more than once
    pub fn with_log(mut self, line: impl Into<String>) -> Self {
        self.log.push(line.into());
        self
    }
}
