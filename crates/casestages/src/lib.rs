//! Standard stage library
//!
//! The five stages of the complaint workflow, the validation rules they
//! apply, and the collaborator contracts intake depends on.

mod close;
pub mod collaborator;
mod intake;
mod investigate;
mod resolve;
pub mod rules;
mod validate;

pub use close::CloseStage;
pub use collaborator::{
    Classifier, CollaboratorError, DuplicateCheck, Extractor, HeuristicExtractor,
    KeywordClassifier, KnownCases, NoDuplicates,
};
pub use intake::IntakeStage;
pub use investigate::InvestigateStage;
pub use resolve::{ResolveStage, CANNOT_RESOLVE};
pub use validate::ValidateStage;

use caseruntime::StageRegistry;
use std::sync::Arc;

/// Register all standard stages, with intake using the given collaborators
pub fn register_all(registry: &mut StageRegistry, intake: IntakeStage) {
    registry.register(Arc::new(intake));
    registry.register(Arc::new(ValidateStage));
    registry.register(Arc::new(InvestigateStage));
    registry.register(Arc::new(ResolveStage));
    registry.register(Arc::new(CloseStage::new()));
}

/// Register all standard stages with the keyword classifier and heuristic
/// extractor
pub fn register_defaults(registry: &mut StageRegistry) {
    let intake = IntakeStage::new(Arc::new(KeywordClassifier), Arc::new(HeuristicExtractor));
    register_all(registry, intake);
}
