use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(CreatorId);
id_newtype!(ParticipantId);
id_newtype!(MessageId);

/// Which side of the marketplace a profile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Brand,
    Creator,
}

impl ProfileRole {
    /// Wording used when the role is described to the model.
    pub fn prompt_label(self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Creator => "influencer",
        }
    }
}

impl std::str::FromStr for ProfileRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "brand" => Ok(Self::Brand),
            "creator" | "influencer" => Ok(Self::Creator),
            other => Err(format!("unknown profile role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

/// Searchable projection of a creator profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorSummary {
    pub id: CreatorId,
    pub name: String,
    pub bio: String,
    pub niches: Vec<String>,
    pub location: String,
    pub price: PriceRange,
}

impl CreatorSummary {
    /// Case-insensitive substring match against the name or any niche tag.
    pub fn matches_literal(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .niches
                .iter()
                .any(|niche| niche.to_lowercase().contains(&needle))
    }
}

/// Read-only, ordered collection of creator summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<CreatorSummary>,
}

impl Catalog {
    pub fn new(entries: Vec<CreatorSummary>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CreatorSummary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &CreatorId) -> Option<&CreatorSummary> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn contains(&self, id: &CreatorId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> HashSet<&CreatorId> {
        self.entries.iter().map(|entry| &entry.id).collect()
    }

    pub fn filter_literal(&self, needle: &str) -> Vec<CreatorSummary> {
        self.entries
            .iter()
            .filter(|entry| entry.matches_literal(needle))
            .cloned()
            .collect()
    }

    /// Entries for `ids`, in the order given. Unknown ids are skipped.
    pub fn select_ordered(&self, ids: &[CreatorId]) -> Vec<CreatorSummary> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| self.get(id).cloned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: ParticipantId,
    pub receiver: ParticipantId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Most recent message of a conversation, seen from one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTail {
    pub viewer: ParticipantId,
    pub viewer_role: ProfileRole,
    pub last_message: ChatMessage,
}

impl ConversationTail {
    pub fn from_transcript(
        viewer: ParticipantId,
        viewer_role: ProfileRole,
        transcript: &[ChatMessage],
    ) -> Option<Self> {
        transcript.last().map(|last_message| Self {
            viewer,
            viewer_role,
            last_message: last_message.clone(),
        })
    }

    pub fn authored_by_viewer(&self) -> bool {
        self.last_message.sender == self.viewer
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
