//! Shared test helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use notewise::agent::{AgentError, ModelInvoker};
use notewise::config::Provider;
use notewise::server::{create_router, AppState};
use notewise::Pipeline;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

enum Reply {
    Text(String),
    Fail(String),
    Timeout(Duration),
}

/// Invoker that returns a canned reply and counts how often it was called.
pub struct ScriptedInvoker {
    reply: Reply,
    calls: AtomicUsize,
}

impl ScriptedInvoker {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Text(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Fail(message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn timing_out(after: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Timeout(after),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    async fn invoke(&self, _prompt: &str) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(message) => Err(AgentError::RequestFailed(message.clone())),
            Reply::Timeout(after) => Err(AgentError::Timeout(*after)),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Router backed by `invoker`
pub fn app_with(invoker: Arc<ScriptedInvoker>) -> axum::Router {
    create_router(AppState::new(Pipeline::new(invoker), Provider::Groq))
}

pub const COMBINED_REPLY: &str = r#"{
    "summary": "AI is transforming the world. It is used in healthcare, finance and education.",
    "tags": ["ai", "technology", "future"],
    "flashcards": [
        {"front": "Name a field where AI is used.", "back": "Healthcare"},
        {"front": "How is AI changing daily life?", "back": "It changes how we work, live and interact."}
    ]
}"#;
