//! Chat reply suggestions driven by transcript tail changes.
//!
//! Every partner-authored tail issues a new sequence token; a result is only
//! shown if its token is still the newest when it arrives. A viewer-authored
//! tail clears the suggestion and also advances the token, so nothing issued
//! before it can bring a suggestion back.

use std::sync::Arc;

use shared::domain::ConversationTail;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    gateway::Gateway,
    request::{GeneratedValue, GenerationPayload, GenerationRequest, GenerationResult},
    sequence::{ControllerState, Resolution},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TailOutcome {
    /// The viewer wrote the tail; the suggestion was cleared.
    Cleared,
    /// The result was current. `None` means nothing usable came back.
    Applied(Option<String>),
    /// A newer tail superseded this request.
    Discarded,
}

struct SuggestionState {
    suggestions: ControllerState<Option<String>>,
    draft: String,
}

pub struct ReplySuggestionController {
    gateway: Arc<Gateway>,
    state: Mutex<SuggestionState>,
}

impl ReplySuggestionController {
    pub fn new(gateway: Arc<Gateway>) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            state: Mutex::new(SuggestionState {
                suggestions: ControllerState::new(None),
                draft: String::new(),
            }),
        })
    }

    pub async fn suggestion(&self) -> Option<String> {
        self.state.lock().await.suggestions.value().clone()
    }

    pub async fn is_pending(&self) -> bool {
        self.state.lock().await.suggestions.is_busy()
    }

    pub async fn draft(&self) -> String {
        self.state.lock().await.draft.clone()
    }

    /// Copies the suggestion into the draft without sending it.
    pub async fn accept_suggestion(&self) -> Option<String> {
        let mut state = self.state.lock().await;
        let suggestion = state.suggestions.value().clone()?;
        state.draft = suggestion.clone();
        Some(suggestion)
    }

    /// Any edit of the draft hides the suggestion.
    pub async fn edit_draft(&self, text: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.draft = text.into();
        state.suggestions.set_value(None);
    }

    /// Empties the draft for sending and hides the suggestion.
    pub async fn take_draft(&self) -> String {
        let mut state = self.state.lock().await;
        state.suggestions.set_value(None);
        std::mem::take(&mut state.draft)
    }

    pub async fn on_tail_changed(&self, tail: ConversationTail) -> TailOutcome {
        match self.begin(&tail).await {
            Some(request) => self.complete(request).await,
            None => TailOutcome::Cleared,
        }
    }

    /// Consumes tail-changed events until the sender side closes.
    ///
    /// Tokens are issued in event order; only the gateway calls run
    /// concurrently.
    pub fn subscribe(
        self: &Arc<Self>,
        mut tails: broadcast::Receiver<ConversationTail>,
    ) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match tails.recv().await {
                    Ok(tail) => {
                        if let Some(request) = controller.begin(&tail).await {
                            let controller = Arc::clone(&controller);
                            tokio::spawn(async move {
                                controller.complete(request).await;
                            });
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "reply suggestion subscriber lagged behind transcript");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("transcript closed; reply suggestion subscription ended");
        })
    }

    /// Synchronous half of a tail change: clear, or issue a new token.
    async fn begin(&self, tail: &ConversationTail) -> Option<GenerationRequest> {
        let mut state = self.state.lock().await;
        if tail.authored_by_viewer() {
            let token = state.suggestions.supersede(None);
            debug!(sequence_token = token.0, "viewer sent a message; suggestion cleared");
            return None;
        }

        let token = state.suggestions.issue();
        debug!(
            sequence_token = token.0,
            message_id = %tail.last_message.id,
            "requesting reply suggestion"
        );
        Some(GenerationRequest::new(
            GenerationPayload::ReplySuggestion {
                viewer_role: tail.viewer_role,
                last_message: tail.last_message.content.clone(),
            },
            token,
        ))
    }

    async fn complete(&self, request: GenerationRequest) -> TailOutcome {
        let suggestion = match self.gateway.generate(&request).await {
            GenerationResult::Ok(GeneratedValue::Text(text)) => Some(text),
            _ => None,
        };

        let token = request.sequence_token();
        let mut state = self.state.lock().await;
        match state.suggestions.resolve(token, suggestion.clone()) {
            Resolution::Applied => {
                info!(
                    sequence_token = token.0,
                    has_suggestion = suggestion.is_some(),
                    "reply suggestion applied"
                );
                TailOutcome::Applied(suggestion)
            }
            Resolution::Discarded => {
                debug!(
                    sequence_token = token.0,
                    current = state.suggestions.last_issued().0,
                    "discarding stale reply suggestion"
                );
                TailOutcome::Discarded
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/reply_suggestion_tests.rs"]
mod tests;
