//! Prompt shaping per generation kind.

use serde::Serialize;
use shared::{
    domain::{Catalog, CreatorId, CreatorSummary, PriceRange, ProfileRole},
    protocol::match_ids_schema,
};
use tracing::warn;

use crate::remote::ModelPrompt;

#[derive(Debug, Serialize)]
struct CatalogEntry<'a> {
    id: &'a CreatorId,
    name: &'a str,
    bio: &'a str,
    niches: &'a [String],
    location: &'a str,
    price: PriceRange,
}

impl<'a> From<&'a CreatorSummary> for CatalogEntry<'a> {
    fn from(summary: &'a CreatorSummary) -> Self {
        Self {
            id: &summary.id,
            name: &summary.name,
            bio: &summary.bio,
            niches: &summary.niches,
            location: &summary.location,
            price: summary.price,
        }
    }
}

pub fn bio_prompt(role: ProfileRole, keywords: &str, tone: &str, max_chars: usize) -> ModelPrompt {
    ModelPrompt::freeform(format!(
        "Write a short, engaging {tone} bio (max {max_chars} chars) for a {} profile on a marketplace.\n\
         Keywords/Niches: {}.\n\
         Focus on value proposition and personality. No hashtags.",
        role.prompt_label(),
        keywords.trim(),
    ))
}

/// Serializes at most `limit` catalog entries, in catalog order.
pub fn catalog_snapshot(catalog: &Catalog, limit: usize) -> String {
    let entries: Vec<CatalogEntry<'_>> = catalog
        .entries()
        .iter()
        .take(limit)
        .map(CatalogEntry::from)
        .collect();
    json_list_or_empty(&entries)
}

fn json_list_or_empty<T: Serialize>(items: &[T]) -> String {
    serde_json::to_string(items).unwrap_or_else(|err| {
        warn!(
            error = %err,
            entries = items.len(),
            "catalog snapshot failed to serialize; sending an empty list"
        );
        "[]".to_string()
    })
}

pub fn match_prompt(query: &str, catalog: &Catalog, limit: usize) -> ModelPrompt {
    let text = format!(
        "You are a matching engine for an influencer marketplace.\n\
         Query: {query:?}\n\n\
         Available Influencers:\n{}\n\n\
         Return a JSON object with a list of IDs of influencers that best match the query, most relevant first.\n\
         Format: {{ \"matchIds\": [\"id1\", \"id2\"] }}\n\
         Strictly JSON.",
        catalog_snapshot(catalog, limit),
        query = query.trim(),
    );
    ModelPrompt::constrained(text, match_ids_schema())
}

pub fn reply_prompt(viewer_role: ProfileRole, last_message: &str) -> ModelPrompt {
    ModelPrompt::freeform(format!(
        "You are assisting a {} in a professional chat.\n\
         The last message received was: {:?}.\n\
         Suggest a concise, professional, and friendly reply (max 1 sentence).",
        viewer_role.prompt_label(),
        last_message.trim(),
    ))
}

#[cfg(test)]
#[path = "tests/prompt_tests.rs"]
mod tests;
