//! Fixtures and remote-model doubles shared by the unit tests.

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use shared::domain::{Catalog, CreatorId, CreatorSummary, PriceRange};
use tokio::sync::{oneshot, Mutex};

use crate::{
    config::Settings,
    gateway::Gateway,
    remote::{ModelPrompt, RemoteModel, RemoteModelError},
};

pub(crate) type ModelReply = Result<Option<String>, RemoteModelError>;

fn creator(id: &str, name: &str, niches: &[&str], min: u32, max: u32) -> CreatorSummary {
    CreatorSummary {
        id: CreatorId::new(id),
        name: name.to_string(),
        bio: format!("{name} makes content."),
        niches: niches.iter().map(|n| n.to_string()).collect(),
        location: "Somewhere".to_string(),
        price: PriceRange { min, max },
    }
}

pub(crate) fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        creator("inf_1", "Sarah Jenkins", &["Fashion", "Sustainability", "Lifestyle"], 200, 800),
        creator("inf_2", "Davide Russo", &["Tech", "Productivity", "Design"], 500, 2000),
        creator("inf_3", "Elena Costa", &["Food", "Wellness", "Fitness"], 300, 1200),
        creator("inf_4", "Marcus Chen", &["Photography", "Streetwear", "Travel"], 150, 600),
    ])
}

pub(crate) fn keyed_settings() -> Settings {
    Settings {
        api_key: Some("test-key".into()),
        ..Settings::default()
    }
}

pub(crate) fn text_reply(text: &str) -> ModelReply {
    Ok(Some(text.to_string()))
}

pub(crate) fn transport_reply(message: &str) -> ModelReply {
    Err(RemoteModelError::Transport(anyhow::anyhow!(message.to_string())))
}

/// Answers calls from a fixed script and records every prompt it saw.
#[derive(Clone, Default)]
pub(crate) struct ScriptedModel {
    replies: Arc<Mutex<VecDeque<ModelReply>>>,
    prompts: Arc<Mutex<Vec<ModelPrompt>>>,
}

impl ScriptedModel {
    pub(crate) fn with_replies(replies: impl IntoIterator<Item = ModelReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) async fn calls(&self) -> usize {
        self.prompts.lock().await.len()
    }

    pub(crate) async fn prompts(&self) -> Vec<ModelPrompt> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl RemoteModel for ScriptedModel {
    async fn complete(&self, _credential: &str, prompt: &ModelPrompt) -> ModelReply {
        self.prompts.lock().await.push(prompt.clone());
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(None))
    }
}

/// Holds every call open until the test releases it, so responses can be
/// delivered in any order.
#[derive(Clone, Default)]
pub(crate) struct GatedModel {
    pending: Arc<Mutex<Vec<(ModelPrompt, Option<oneshot::Sender<ModelReply>>)>>>,
}

impl GatedModel {
    pub(crate) async fn calls(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Waits until `count` calls have been issued.
    pub(crate) async fn wait_for_calls(&self, count: usize) {
        for _ in 0..1000 {
            if self.calls().await >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {count} model calls");
    }

    /// Releases the `index`-th call issued (0-based, in issue order).
    pub(crate) async fn release(&self, index: usize, reply: ModelReply) {
        let tx = self.pending.lock().await[index].1.take();
        if let Some(tx) = tx {
            let _ = tx.send(reply);
        }
    }

    pub(crate) async fn prompt(&self, index: usize) -> ModelPrompt {
        self.pending.lock().await[index].0.clone()
    }
}

#[async_trait]
impl RemoteModel for GatedModel {
    async fn complete(&self, _credential: &str, prompt: &ModelPrompt) -> ModelReply {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.push((prompt.clone(), Some(tx)));
        rx.await
            .unwrap_or_else(|_| Err(RemoteModelError::Transport(anyhow::anyhow!("call dropped"))))
    }
}

pub(crate) fn gateway_with(model: impl RemoteModel + 'static, settings: &Settings) -> Arc<Gateway> {
    Arc::new(Gateway::new(settings, Arc::new(model)))
}
