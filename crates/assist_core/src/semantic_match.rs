//! Creator discovery: literal filtering or model-ranked semantic matching.

use std::sync::Arc;

use shared::{
    domain::{Catalog, CreatorId, CreatorSummary},
    error::GenerationFailure,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    gateway::Gateway,
    request::{GeneratedValue, GenerationPayload, GenerationRequest, GenerationResult},
    sequence::{ControllerState, Resolution, SequenceToken},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Literal,
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    pub text: String,
    pub mode: MatchMode,
}

impl MatchQuery {
    pub fn new(text: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            text: text.into(),
            mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoMatchCause {
    /// The query was understood but nothing matched.
    Empty,
    /// The semantic match could not be completed.
    Failed(GenerationFailure),
}

/// What the result list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchView {
    /// No query: the unfiltered catalog.
    AllCreators(Vec<CreatorSummary>),
    Matches(Vec<CreatorSummary>),
    /// Zero results; rendered as "no results", never as the full catalog.
    NoMatches(NoMatchCause),
}

impl MatchView {
    fn from_entries(entries: Vec<CreatorSummary>) -> Self {
        if entries.is_empty() {
            Self::NoMatches(NoMatchCause::Empty)
        } else {
            Self::Matches(entries)
        }
    }

    pub fn entries(&self) -> &[CreatorSummary] {
        match self {
            Self::AllCreators(entries) | Self::Matches(entries) => entries,
            Self::NoMatches(_) => &[],
        }
    }

    pub fn ids(&self) -> Vec<CreatorId> {
        self.entries().iter().map(|entry| entry.id.clone()).collect()
    }

    pub fn is_no_results(&self) -> bool {
        matches!(self, Self::NoMatches(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchRejected {
    #[error("a semantic match is already in flight")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Applied(MatchView),
    /// A later submission superseded this one before it resolved.
    Discarded,
}

struct MatchState {
    mode: MatchMode,
    results: ControllerState<MatchView>,
}

pub struct SemanticMatchController {
    gateway: Arc<Gateway>,
    catalog: Arc<Catalog>,
    state: Arc<Mutex<MatchState>>,
}

impl SemanticMatchController {
    pub fn new(gateway: Arc<Gateway>, catalog: Arc<Catalog>) -> Self {
        let initial = MatchView::AllCreators(catalog.entries().to_vec());
        Self {
            gateway,
            catalog,
            state: Arc::new(Mutex::new(MatchState {
                mode: MatchMode::default(),
                results: ControllerState::new(initial),
            })),
        }
    }

    pub async fn mode(&self) -> MatchMode {
        self.state.lock().await.mode
    }

    /// Affects the next submission only.
    pub async fn set_mode(&self, mode: MatchMode) {
        self.state.lock().await.mode = mode;
    }

    pub async fn is_matching(&self) -> bool {
        self.state.lock().await.results.is_busy()
    }

    pub async fn view(&self) -> MatchView {
        self.state.lock().await.results.value().clone()
    }

    /// Submits `text` under the current mode.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, MatchRejected> {
        let mode = self.mode().await;
        self.submit_query(MatchQuery::new(text, mode)).await
    }

    pub async fn submit_query(&self, query: MatchQuery) -> Result<SubmitOutcome, MatchRejected> {
        if query.is_empty() {
            let view = MatchView::AllCreators(self.catalog.entries().to_vec());
            self.state.lock().await.results.supersede(view.clone());
            debug!("match query cleared; showing full catalog");
            return Ok(SubmitOutcome::Applied(view));
        }

        let text = query.text.trim();
        if query.mode == MatchMode::Literal {
            let view = MatchView::from_entries(self.catalog.filter_literal(text));
            self.state.lock().await.results.supersede(view.clone());
            debug!(hits = view.entries().len(), "literal match applied");
            return Ok(SubmitOutcome::Applied(view));
        }

        let request = {
            let mut state = self.state.lock().await;
            if state.results.is_busy() {
                debug!("semantic match rejected: request already in flight");
                return Err(MatchRejected::Busy);
            }
            let token = state.results.issue();
            GenerationRequest::new(
                GenerationPayload::SemanticMatch {
                    query: text.to_string(),
                    catalog: Arc::clone(&self.catalog),
                },
                token,
            )
        };

        // Resolved inside the task: dropping this future must not leave the
        // matcher busy.
        let token = request.sequence_token();
        let gateway = Arc::clone(&self.gateway);
        let catalog = Arc::clone(&self.catalog);
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let view = view_for(&catalog, gateway.generate(&request).await);
            apply(&state, token, view).await
        });

        match task.await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(sequence_token = token.0, error = %err, "semantic match task did not finish");
                let failure = GenerationFailure::transport(err.to_string());
                let view = MatchView::NoMatches(NoMatchCause::Failed(failure));
                Ok(apply(&self.state, token, view).await)
            }
        }
    }
}

async fn apply(state: &Mutex<MatchState>, token: SequenceToken, view: MatchView) -> SubmitOutcome {
    let mut state = state.lock().await;
    match state.results.resolve(token, view.clone()) {
        Resolution::Applied => {
            info!(
                sequence_token = token.0,
                hits = view.entries().len(),
                "semantic match applied"
            );
            SubmitOutcome::Applied(view)
        }
        Resolution::Discarded => {
            debug!(
                sequence_token = token.0,
                current = state.results.last_issued().0,
                "discarding superseded semantic match"
            );
            SubmitOutcome::Discarded
        }
    }
}

fn view_for(catalog: &Catalog, result: GenerationResult) -> MatchView {
    match result {
        GenerationResult::Ok(GeneratedValue::MatchIds(ids)) => {
            MatchView::from_entries(catalog.select_ordered(&ids))
        }
        GenerationResult::Ok(GeneratedValue::Text(_)) | GenerationResult::Empty => {
            MatchView::NoMatches(NoMatchCause::Empty)
        }
        GenerationResult::Failed(failure) => MatchView::NoMatches(NoMatchCause::Failed(failure)),
    }
}

#[cfg(test)]
#[path = "tests/semantic_match_tests.rs"]
mod tests;
