//! The single chokepoint between the controllers and the remote model.
//!
//! `Gateway::generate` never fails: every outcome, including a missing
//! credential, a transport error or an unparseable response, is folded into
//! a [`GenerationResult`].

use std::{collections::HashSet, sync::Arc};

use shared::{
    domain::{Catalog, CreatorId},
    error::GenerationFailure,
    protocol::MatchIdsEnvelope,
};
use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    prompt::{bio_prompt, match_prompt, reply_prompt},
    remote::{ModelPrompt, RemoteModel, RemoteModelError},
    request::{GenerationPayload, GenerationRequest, GenerationResult},
};

pub struct Gateway {
    credential: Option<String>,
    model: Arc<dyn RemoteModel>,
    catalog_prompt_limit: usize,
    bio_max_chars: usize,
}

impl Gateway {
    pub fn new(settings: &Settings, model: Arc<dyn RemoteModel>) -> Self {
        let credential = settings.credential().map(str::to_string);
        if credential.is_none() {
            warn!("generation credential is missing; AI assists will use fallbacks");
        }
        Self {
            credential,
            model,
            catalog_prompt_limit: settings.catalog_prompt_limit,
            bio_max_chars: settings.bio_max_chars,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let kind = request.kind();
        let token = request.sequence_token();

        let Some(credential) = self.credential.as_deref() else {
            info!(%kind, sequence_token = token.0, "skipping generation without credential");
            return GenerationResult::Failed(GenerationFailure::NoCredential);
        };

        debug!(%kind, sequence_token = token.0, "issuing generation request");
        let prompt = self.shape(request.payload());
        let result = match self.model.complete(credential, &prompt).await {
            Ok(raw) => self.normalize(request.payload(), raw),
            Err(RemoteModelError::Transport(err)) => {
                GenerationResult::Failed(GenerationFailure::transport(format!("{err:#}")))
            }
            Err(RemoteModelError::Envelope(detail)) => {
                GenerationResult::Failed(GenerationFailure::malformed(detail))
            }
        };

        match &result {
            GenerationResult::Failed(failure) => warn!(
                %kind,
                sequence_token = token.0,
                outcome = result.outcome_label(),
                error = %failure,
                "generation failed"
            ),
            _ => info!(
                %kind,
                sequence_token = token.0,
                outcome = result.outcome_label(),
                "generation completed"
            ),
        }
        result
    }

    fn shape(&self, payload: &GenerationPayload) -> ModelPrompt {
        match payload {
            GenerationPayload::BioDraft {
                role,
                keywords,
                tone,
            } => bio_prompt(*role, keywords, tone, self.bio_max_chars),
            GenerationPayload::SemanticMatch { query, catalog } => {
                match_prompt(query, catalog, self.catalog_prompt_limit)
            }
            GenerationPayload::ReplySuggestion {
                viewer_role,
                last_message,
            } => reply_prompt(*viewer_role, last_message),
        }
    }

    fn normalize(&self, payload: &GenerationPayload, raw: Option<String>) -> GenerationResult {
        let Some(raw) = raw else {
            return GenerationResult::Empty;
        };
        match payload {
            GenerationPayload::BioDraft { .. } => normalize_text(&raw, Some(self.bio_max_chars)),
            GenerationPayload::ReplySuggestion { .. } => normalize_text(&raw, None),
            GenerationPayload::SemanticMatch { catalog, .. } => {
                normalize_match_ids(&raw, catalog)
            }
        }
    }
}

/// Trims, drops one pair of wrapping quotes and caps the length in chars.
pub fn normalize_text(raw: &str, max_chars: Option<usize>) -> GenerationResult {
    let mut text = strip_wrapping_quotes(raw.trim()).trim();
    if let Some(max_chars) = max_chars {
        if let Some((cut, _)) = text.char_indices().nth(max_chars) {
            text = text[..cut].trim_end();
        }
    }
    if text.is_empty() {
        GenerationResult::Empty
    } else {
        GenerationResult::text(text)
    }
}

const QUOTE_PAIRS: [(char, char); 2] = [('"', '"'), ('\u{201c}', '\u{201d}')];

fn strip_wrapping_quotes(text: &str) -> &str {
    QUOTE_PAIRS
        .iter()
        .find_map(|&(open, close)| text.strip_prefix(open)?.strip_suffix(close))
        .unwrap_or(text)
}

/// Parses `{"matchIds": [...]}` and keeps only ids present in `catalog`,
/// in the order returned, without duplicates.
pub fn normalize_match_ids(raw: &str, catalog: &Catalog) -> GenerationResult {
    let raw = raw.trim();
    if raw.is_empty() {
        return GenerationResult::Empty;
    }
    let envelope = match parse_match_envelope(raw) {
        Ok(envelope) => envelope,
        Err(detail) => return GenerationResult::Failed(GenerationFailure::malformed(detail)),
    };

    let returned = envelope.match_ids.len();
    let known = catalog.ids();
    let mut seen: HashSet<CreatorId> = HashSet::new();
    let ids: Vec<CreatorId> = envelope
        .match_ids
        .into_iter()
        .filter(|id| known.contains(id))
        .filter(|id| seen.insert(id.clone()))
        .collect();

    if ids.len() < returned {
        debug!(
            returned,
            kept = ids.len(),
            "dropped unknown or repeated match ids"
        );
    }
    if ids.is_empty() {
        GenerationResult::Empty
    } else {
        GenerationResult::match_ids(ids)
    }
}

fn parse_match_envelope(raw: &str) -> Result<MatchIdsEnvelope, String> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|err| format!("match response is not JSON: {err}"))?;
    if !value.is_object() {
        return Err("match response is not a JSON object".to_string());
    }
    serde_json::from_value(value).map_err(|err| format!("match response has the wrong shape: {err}"))
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
