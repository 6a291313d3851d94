//! AI-assist orchestration: one [`Gateway`] shared by three controllers
//! (bio drafting, semantic matching, reply suggestions), each of which owns
//! its state and degrades to a fixed fallback when generation fails.

pub mod bio_draft;
pub mod config;
pub mod gateway;
pub mod prompt;
pub mod remote;
pub mod reply_suggestion;
pub mod request;
pub mod semantic_match;
pub mod sequence;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Result;
use shared::domain::Catalog;

pub use bio_draft::{BioDraftController, DraftOutcome, DraftPhase, DraftSource, IgnoredDraft};
pub use config::{load_settings, load_settings_from, Settings};
pub use gateway::Gateway;
pub use remote::{GeminiModel, ModelPrompt, RemoteModel, RemoteModelError};
pub use reply_suggestion::{ReplySuggestionController, TailOutcome};
pub use request::{
    GeneratedValue, GenerationKind, GenerationPayload, GenerationRequest, GenerationResult,
};
pub use semantic_match::{
    MatchMode, MatchQuery, MatchRejected, MatchView, NoMatchCause, SemanticMatchController,
    SubmitOutcome,
};
pub use sequence::{ControllerState, Resolution, SequenceToken};

/// The three controllers wired to one gateway.
pub struct AssistSession {
    pub gateway: Arc<Gateway>,
    pub bio_drafts: BioDraftController,
    pub matcher: SemanticMatchController,
    pub replies: Arc<ReplySuggestionController>,
}

impl AssistSession {
    pub fn new(settings: &Settings, model: Arc<dyn RemoteModel>, catalog: Arc<Catalog>) -> Self {
        let gateway = Arc::new(Gateway::new(settings, model));
        Self {
            bio_drafts: BioDraftController::new(Arc::clone(&gateway), settings.bio_tone.clone()),
            matcher: SemanticMatchController::new(Arc::clone(&gateway), catalog),
            replies: ReplySuggestionController::new(Arc::clone(&gateway)),
            gateway,
        }
    }

    /// Session backed by the production `generateContent` client.
    pub fn connect(settings: &Settings, catalog: Arc<Catalog>) -> Result<Self> {
        let model = GeminiModel::from_settings(settings)?;
        Ok(Self::new(settings, Arc::new(model), catalog))
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
