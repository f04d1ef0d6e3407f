//! Category validation policy.

use casecore::{Category, Essentials};

pub const MISSING_ESSENTIALS: &str =
    "Missing essential details; request clarification (who/what/when/where).";

pub const MANUAL_REVIEW: &str =
    "Other category complaints require manual review (auto-escalation).";

const PORTAL_KEYWORDS: &[&str] = &["time", "timing", "when", "location", "where", "opens", "close"];
const MONSTER_KEYWORDS: &[&str] = &[
    "attack",
    "behavior",
    "fight",
    "hunting",
    "interaction",
    "demogorgon",
    "creature",
];
const PSYCHIC_KEYWORDS: &[&str] = &[
    "can\u{2019}t",
    "cant",
    "cannot",
    "ability",
    "limit",
    "malfunction",
    "telekinesis",
    "mind",
];
const ENVIRONMENTAL_KEYWORDS: &[&str] = &[
    "power",
    "electric",
    "line",
    "storm",
    "weather",
    "atmosphere",
    "lights",
];

/// Check the complaint text against the rule for its category.
///
/// Returns the verdict and the reasons it failed. `Other` always fails,
/// since those complaints go to manual review.
pub fn validate_by_category(category: Category, text: &str) -> (bool, Vec<String>) {
    let text = text.to_lowercase();
    let mentions_any = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    let mut errors = Vec::new();
    match category {
        Category::Portal => {
            if !mentions_any(PORTAL_KEYWORDS) {
                errors.push("Portal complaints must reference timing or location anomalies.".to_string());
            }
        }
        Category::Monster => {
            if !mentions_any(MONSTER_KEYWORDS) {
                errors.push("Monster complaints must describe creature behavior or interactions.".to_string());
            }
        }
        Category::Psychic => {
            if !mentions_any(PSYCHIC_KEYWORDS) {
                errors.push("Psychic complaints must reference ability limitations or malfunctions.".to_string());
            }
        }
        Category::Environmental => {
            if !mentions_any(ENVIRONMENTAL_KEYWORDS) {
                errors.push(
                    "Environmental complaints must connect to electricity, weather, or observable phenomena."
                        .to_string(),
                );
            }
        }
        Category::Other => errors.push(MANUAL_REVIEW.to_string()),
    }

    (errors.is_empty(), errors)
}

/// A complaint needs at least a "what" to be actionable
pub fn has_minimum_essentials(essentials: &Essentials) -> bool {
    essentials.what().is_some_and(|what| !what.trim().is_empty())
}

pub fn requires_manual_review(category: Category) -> bool {
    category == Category::Other
}

/// Categories that always get a second look after resolution
pub fn requires_escalation(category: Category) -> bool {
    matches!(category, Category::Monster | Category::Environmental)
}
