//! Contracts for the external services the intake stage depends on, plus
//! deterministic default implementations.

use casecore::{Category, Essentials};
use thiserror::Error;

/// Failure reported by a collaborator. Intake passes it on untouched.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

impl CollaboratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Text classification: free text in, category label out.
///
/// The label is not trusted; intake coerces anything unknown to `other`.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<String, CollaboratorError>;
}

impl<F> Classifier for F
where
    F: Fn(&str) -> Result<String, CollaboratorError> + Send + Sync,
{
    fn classify(&self, text: &str) -> Result<String, CollaboratorError> {
        self(text)
    }
}

/// Who/what/when/where extraction
pub trait Extractor: Send + Sync {
    fn extract(&self, text: &str) -> Result<Essentials, CollaboratorError>;
}

impl<F> Extractor for F
where
    F: Fn(&str) -> Result<Essentials, CollaboratorError> + Send + Sync,
{
    fn extract(&self, text: &str) -> Result<Essentials, CollaboratorError> {
        self(text)
    }
}

/// Links a new complaint to an earlier case
pub trait DuplicateCheck: Send + Sync {
    /// Id of the earlier case, if this complaint repeats one
    fn find_duplicate(&self, subject: &str, requester: &str) -> Option<String>;
}

/// Never reports a duplicate
pub struct NoDuplicates;

impl DuplicateCheck for NoDuplicates {
    fn find_duplicate(&self, _subject: &str, _requester: &str) -> Option<String> {
        None
    }
}

/// Matches against a fixed list of earlier cases.
///
/// Two complaints are duplicates when they come from the same requester and
/// their subjects are equal ignoring case and whitespace.
pub struct KnownCases {
    cases: Vec<(String, String, String)>,
}

impl KnownCases {
    pub fn new() -> Self {
        Self { cases: Vec::new() }
    }

    pub fn with_case(
        mut self,
        case_id: impl Into<String>,
        requester: impl Into<String>,
        subject: &str,
    ) -> Self {
        self.cases
            .push((case_id.into(), requester.into(), normalize(subject)));
        self
    }
}

impl Default for KnownCases {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateCheck for KnownCases {
    fn find_duplicate(&self, subject: &str, requester: &str) -> Option<String> {
        let subject = normalize(subject);
        if subject.is_empty() {
            return None;
        }
        self.cases
            .iter()
            .find(|(_, r, s)| r == requester && *s == subject)
            .map(|(id, _, _)| id.clone())
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Portal,
        &["portal", "gate", "rift", "dimension", "upside", "opens"],
    ),
    (
        Category::Monster,
        &["monster", "demogorgon", "creature", "beast", "attack", "hunting"],
    ),
    (
        Category::Psychic,
        &["psychic", "telekinesis", "mind", "powers", "nosebleed", "ability"],
    ),
    (
        Category::Environmental,
        &["power", "electric", "lights", "storm", "weather", "atmosphere"],
    ),
];

/// Keyword-count classifier.
///
/// Picks the category with the most keyword hits; ties go to the category
/// listed first, and text with no hits is labelled `other`.
pub struct KeywordClassifier;

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Result<String, CollaboratorError> {
        let text = text.to_lowercase();

        let mut best = (Category::Other, 0);
        for (category, keywords) in CATEGORY_KEYWORDS {
            let hits = keywords.iter().filter(|k| text.contains(*k)).count();
            if hits > best.1 {
                best = (*category, hits);
            }
        }

        Ok(best.0.as_str().to_string())
    }
}

const TIME_WORDS: &[&str] = &[
    "yesterday", "today", "tonight", "tomorrow", "midnight", "noon", "morning", "afternoon",
    "evening", "night", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
    "sunday",
];

/// Word-level heuristics for the four essentials.
///
/// - what: the whole complaint text
/// - when: the first time word or clock time (`9pm`, `21:30`)
/// - where: up to three words following a standalone "in" or "at", unless
///   they start with a time
/// - who: the first capitalized word that does not open a sentence
pub struct HeuristicExtractor;

impl Extractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Result<Essentials, CollaboratorError> {
        let words: Vec<&str> = text.split_whitespace().collect();

        Ok(Essentials::new(
            find_who(&words),
            Some(text.to_string()),
            find_when(&words),
            find_where(&words),
        ))
    }
}

fn bare(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != ':')
}

fn is_time(word: &str) -> bool {
    let word = bare(word).to_lowercase();
    if TIME_WORDS.contains(&word.as_str()) {
        return true;
    }
    let starts_with_digit = word.chars().next().is_some_and(|c| c.is_ascii_digit());
    starts_with_digit && (word.contains(':') || word.ends_with("am") || word.ends_with("pm"))
}

fn find_when(words: &[&str]) -> Option<String> {
    words
        .iter()
        .find(|w| is_time(w))
        .map(|w| bare(w).to_string())
}

fn find_where(words: &[&str]) -> Option<String> {
    let anchor = words
        .iter()
        .position(|w| matches!(bare(w).to_lowercase().as_str(), "in" | "at"))?;
    let rest = &words[anchor + 1..];

    if rest.first().map_or(true, |w| is_time(w)) {
        return None;
    }

    let mut phrase = Vec::new();
    for word in rest.iter().take(3) {
        phrase.push(bare(word));
        if word.ends_with(|c: char| matches!(c, ',' | '.' | '!' | '?' | ';')) {
            break;
        }
    }
    Some(phrase.join(" "))
}

fn find_who(words: &[&str]) -> Option<String> {
    words
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(i, _)| !words[i - 1].ends_with(|c: char| matches!(c, '.' | '!' | '?')))
        .map(|(_, w)| bare(w))
        .find(|w| *w != "I" && w.chars().next().is_some_and(|c| c.is_uppercase()))
        .map(str::to_string)
}
