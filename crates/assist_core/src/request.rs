use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use shared::{
    domain::{Catalog, CreatorId, ProfileRole},
    error::GenerationFailure,
};

use crate::sequence::SequenceToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationKind {
    BioDraft,
    SemanticMatch,
    ReplySuggestion,
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BioDraft => "bio_draft",
            Self::SemanticMatch => "semantic_match",
            Self::ReplySuggestion => "reply_suggestion",
        })
    }
}

#[derive(Debug, Clone)]
pub enum GenerationPayload {
    BioDraft {
        role: ProfileRole,
        keywords: String,
        tone: String,
    },
    SemanticMatch {
        query: String,
        catalog: Arc<Catalog>,
    },
    ReplySuggestion {
        viewer_role: ProfileRole,
        last_message: String,
    },
}

impl GenerationPayload {
    pub fn kind(&self) -> GenerationKind {
        match self {
            Self::BioDraft { .. } => GenerationKind::BioDraft,
            Self::SemanticMatch { .. } => GenerationKind::SemanticMatch,
            Self::ReplySuggestion { .. } => GenerationKind::ReplySuggestion,
        }
    }
}

/// One issued call to the gateway. Fields are fixed at construction.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    payload: GenerationPayload,
    issued_at: DateTime<Utc>,
    sequence_token: SequenceToken,
}

impl GenerationRequest {
    pub fn new(payload: GenerationPayload, sequence_token: SequenceToken) -> Self {
        Self {
            payload,
            issued_at: Utc::now(),
            sequence_token,
        }
    }

    pub fn kind(&self) -> GenerationKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &GenerationPayload {
        &self.payload
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn sequence_token(&self) -> SequenceToken {
        self.sequence_token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedValue {
    Text(String),
    MatchIds(Vec<CreatorId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Ok(GeneratedValue),
    Empty,
    Failed(GenerationFailure),
}

impl GenerationResult {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Ok(GeneratedValue::Text(value.into()))
    }

    pub fn match_ids(ids: Vec<CreatorId>) -> Self {
        Self::Ok(GeneratedValue::MatchIds(ids))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// The text value, if this is a successful text result.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Ok(GeneratedValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Short label for structured log fields.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Self::Ok(_) => "ok",
            Self::Empty => "empty",
            Self::Failed(failure) => failure.code(),
        }
    }
}
