//! Onboarding bio drafting: one request per button press, never re-entrant.

use std::sync::Arc;

use shared::{domain::ProfileRole, error::GenerationFailure};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    gateway::Gateway,
    request::{GeneratedValue, GenerationPayload, GenerationRequest, GenerationResult},
    sequence::ControllerState,
};

pub const FALLBACK_NO_CREDENTIAL: &str =
    "Passionate content creator ready to collaborate. (AI Key Missing)";
pub const FALLBACK_EMPTY: &str = "Passionate content creator ready to collaborate.";
pub const FALLBACK_FAILED: &str =
    "Passionate content creator ready to collaborate with like-minded brands.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    Idle,
    Requesting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredDraft {
    EmptyKeywords,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftSource {
    Generated,
    EmptyFallback,
    FailureFallback(GenerationFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOutcome {
    Ignored(IgnoredDraft),
    Written { text: String, source: DraftSource },
}

pub struct BioDraftController {
    gateway: Arc<Gateway>,
    tone: String,
    state: Arc<Mutex<ControllerState<String>>>,
}

impl BioDraftController {
    pub fn new(gateway: Arc<Gateway>, tone: impl Into<String>) -> Self {
        Self {
            gateway,
            tone: tone.into(),
            state: Arc::new(Mutex::new(ControllerState::new(String::new()))),
        }
    }

    pub async fn phase(&self) -> DraftPhase {
        if self.state.lock().await.is_busy() {
            DraftPhase::Requesting
        } else {
            DraftPhase::Idle
        }
    }

    /// Whether the trigger control should be enabled for `keywords`.
    pub async fn can_draft(&self, keywords: &str) -> bool {
        !keywords.trim().is_empty() && self.phase().await == DraftPhase::Idle
    }

    pub async fn bio(&self) -> String {
        self.state.lock().await.value().clone()
    }

    pub async fn edit_bio(&self, text: impl Into<String>) {
        self.state.lock().await.set_value(text.into());
    }

    pub async fn draft(&self, role: ProfileRole, keywords: &str) -> DraftOutcome {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            debug!("bio draft ignored: no keywords");
            return DraftOutcome::Ignored(IgnoredDraft::EmptyKeywords);
        }

        let request = {
            let mut state = self.state.lock().await;
            if state.is_busy() {
                debug!("bio draft ignored: request already in flight");
                return DraftOutcome::Ignored(IgnoredDraft::Busy);
            }
            let token = state.issue();
            GenerationRequest::new(
                GenerationPayload::BioDraft {
                    role,
                    keywords: keywords.to_string(),
                    tone: self.tone.clone(),
                },
                token,
            )
        };

        // Resolved inside the task: dropping this future must not leave the
        // draft in `Requesting`.
        let token = request.sequence_token();
        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let (text, source) = written_for(gateway.generate(&request).await);
            state.lock().await.resolve(token, text.clone());
            (text, source)
        });

        let (text, source) = match task.await {
            Ok(written) => written,
            Err(err) => {
                warn!(sequence_token = token.0, error = %err, "bio draft task did not finish");
                let failure = GenerationFailure::transport(err.to_string());
                let text = fallback_for(&failure).to_string();
                self.state.lock().await.resolve(token, text.clone());
                (text, DraftSource::FailureFallback(failure))
            }
        };

        info!(
            sequence_token = token.0,
            generated = matches!(source, DraftSource::Generated),
            "bio draft written"
        );
        DraftOutcome::Written { text, source }
    }
}

fn written_for(result: GenerationResult) -> (String, DraftSource) {
    match result {
        GenerationResult::Ok(GeneratedValue::Text(text)) => (text, DraftSource::Generated),
        GenerationResult::Ok(GeneratedValue::MatchIds(_)) | GenerationResult::Empty => {
            (FALLBACK_EMPTY.to_string(), DraftSource::EmptyFallback)
        }
        GenerationResult::Failed(failure) => {
            (fallback_for(&failure).to_string(), DraftSource::FailureFallback(failure))
        }
    }
}

fn fallback_for(failure: &GenerationFailure) -> &'static str {
    match failure {
        GenerationFailure::NoCredential => FALLBACK_NO_CREDENTIAL,
        GenerationFailure::Transport(_) | GenerationFailure::MalformedResponse(_) => {
            FALLBACK_FAILED
        }
    }
}

#[cfg(test)]
#[path = "tests/bio_draft_tests.rs"]
mod tests;
