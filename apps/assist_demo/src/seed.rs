//! Seed catalog and transcript for the demo.

use chrono::{Duration, Utc};
use shared::domain::{
    Catalog, ChatMessage, CreatorId, CreatorSummary, MessageId, ParticipantId, PriceRange,
};

pub const BRAND_ID: &str = "b_1";
pub const PARTNER_ID: &str = "inf_1";

fn creator(
    id: &str,
    name: &str,
    bio: &str,
    location: &str,
    niches: &[&str],
    price: (u32, u32),
) -> CreatorSummary {
    CreatorSummary {
        id: CreatorId::new(id),
        name: name.into(),
        bio: bio.into(),
        niches: niches.iter().map(|n| n.to_string()).collect(),
        location: location.into(),
        price: PriceRange {
            min: price.0,
            max: price.1,
        },
    }
}

pub fn catalog() -> Catalog {
    Catalog::new(vec![
        creator(
            "inf_1",
            "Sarah Jenkins",
            "Sustainable fashion advocate living in Brooklyn. I help ethical brands tell their stories through cinematic reels and honest reviews.",
            "New York, NY",
            &["Fashion", "Sustainability", "Lifestyle"],
            (200, 800),
        ),
        creator(
            "inf_2",
            "Davide Russo",
            "Tech reviewer and minimal desk setup enthusiast. Simplifying gadget complexity for the everyday user.",
            "San Francisco, CA",
            &["Tech", "Productivity", "Design"],
            (500, 2000),
        ),
        creator(
            "inf_3",
            "Elena Costa",
            "Plant-based chef and yoga instructor. Sharing recipes that nourish the soul.",
            "Austin, TX",
            &["Food", "Wellness", "Fitness"],
            (300, 1200),
        ),
        creator(
            "inf_4",
            "Marcus Chen",
            "Streetwear photographer and urban explorer. Capturing the city pulse.",
            "Toronto, ON",
            &["Photography", "Streetwear", "Travel"],
            (150, 600),
        ),
    ])
}

pub fn transcript() -> Vec<ChatMessage> {
    let now = Utc::now();
    let message = |id: &str, sender: &str, receiver: &str, content: &str, ago: Duration| {
        ChatMessage {
            id: MessageId::new(id),
            sender: ParticipantId::new(sender),
            receiver: ParticipantId::new(receiver),
            content: content.into(),
            sent_at: now - ago,
        }
    };

    vec![
        message(
            "m1",
            PARTNER_ID,
            BRAND_ID,
            "Hi! I loved your recent collection. Are you open to collaborations?",
            Duration::hours(48),
        ),
        message(
            "m2",
            BRAND_ID,
            PARTNER_ID,
            "Hey Sarah! Yes, we actually have a summer campaign coming up. Your profile looks perfect.",
            Duration::minutes(2736),
        ),
        message(
            "m3",
            PARTNER_ID,
            BRAND_ID,
            "That sounds exciting! Could you send over the brief?",
            Duration::hours(1),
        ),
    ]
}
