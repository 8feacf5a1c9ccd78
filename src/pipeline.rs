//! The text -> prompt -> model -> parser pipeline.

use crate::agent::{AgentError, ModelInvoker};
use crate::parser::{self, ParseError};
use crate::prompt;
use crate::schema::{CombinedResult, StructuredOutput, Summary, TagSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Classified failure of a pipeline run. Every kind is terminal for the request.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no text provided")]
    InvalidInput,
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("model timed out after {0:?}")]
    ModelTimeout(Duration),
    #[error("malformed model output: {0}")]
    MalformedOutput(String),
    #[error("schema violation at `{field}`: {reason}")]
    SchemaViolation { field: String, reason: String },
}

/// Coarse error category, for logging and status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ModelUnavailable,
    ModelTimeout,
    MalformedOutput,
    SchemaViolation,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InvalidInput => ErrorKind::InvalidInput,
            PipelineError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            PipelineError::ModelTimeout(_) => ErrorKind::ModelTimeout,
            PipelineError::MalformedOutput(_) => ErrorKind::MalformedOutput,
            PipelineError::SchemaViolation { .. } => ErrorKind::SchemaViolation,
        }
    }
}

impl From<AgentError> for PipelineError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Timeout(after) => PipelineError::ModelTimeout(after),
            other => PipelineError::ModelUnavailable(other.to_string()),
        }
    }
}

impl From<ParseError> for PipelineError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Malformed(detail) => PipelineError::MalformedOutput(detail),
            ParseError::SchemaViolation { field, reason } => {
                PipelineError::SchemaViolation { field, reason }
            }
        }
    }
}

/// Runs structured requests against a shared model invoker.
///
/// Holds no per-request state; clone the `Arc` freely across tasks.
pub struct Pipeline {
    invoker: Arc<dyn ModelInvoker>,
}

impl Pipeline {
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self { invoker }
    }

    pub fn model(&self) -> &str {
        self.invoker.model()
    }

    /// Build the prompt for `T`, call the model once, and validate the reply.
    pub async fn run<T: StructuredOutput>(&self, text: &str) -> Result<T, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::InvalidInput);
        }

        let schema = T::SCHEMA;
        let prompt = prompt::build_prompt(schema, text);
        debug!(schema = schema.name(), text_len = text.len(), "running pipeline");

        let outcome = match self.invoker.invoke(&prompt).await {
            Ok(raw) => parser::parse_output::<T>(&raw).map_err(PipelineError::from),
            Err(e) => Err(PipelineError::from(e)),
        };

        if let Err(e) = &outcome {
            warn!(schema = schema.name(), kind = ?e.kind(), "pipeline failed: {}", e);
        }
        outcome
    }

    pub async fn summarise(&self, text: &str) -> Result<Summary, PipelineError> {
        self.run(text).await
    }

    pub async fn generate_tags(&self, text: &str) -> Result<TagSet, PipelineError> {
        self.run(text).await
    }

    /// Summary, tags and flashcards in a single model call
    pub async fn process(&self, text: &str) -> Result<CombinedResult, PipelineError> {
        self.run(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedInvoker {
        reply: Result<String, Duration>,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl FixedInvoker {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            })
        }

        fn timing_out() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(Duration::from_secs(1)),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl ModelInvoker for FixedInvoker {
        async fn invoke(&self, prompt: &str) -> Result<String, AgentError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.reply.clone().map_err(AgentError::Timeout)
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_empty_text_skips_model() {
        let invoker = FixedInvoker::replying(r#"{"summary": "x"}"#);
        let pipeline = Pipeline::new(invoker.clone());

        for text in ["", "   \n\t"] {
            let err = pipeline.summarise(text).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prompt_carries_text() {
        let invoker = FixedInvoker::replying(r#"{"tags": ["ai", "work", "future"]}"#);
        let pipeline = Pipeline::new(invoker.clone());

        let tags = pipeline.generate_tags("AI is transforming the world.").await.unwrap();
        assert_eq!(tags.tags, vec!["ai", "work", "future"]);

        let prompt = invoker.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("AI is transforming the world."));
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_process_success() {
        let invoker = FixedInvoker::replying(
            r#"{"summary":"s","tags":["a","b","c"],"flashcards":[{"front":"q","back":"a"}]}"#,
        );
        let result = Pipeline::new(invoker).process("some notes").await.unwrap();
        assert_eq!(result.flashcards.len(), 1);
        assert_eq!(result.flashcards[0].back, "a");
    }

    #[tokio::test]
    async fn test_parse_failures_classified() {
        let pipeline = Pipeline::new(FixedInvoker::replying("Sure! {\"summary\": \"x\"}"));
        let err = pipeline.summarise("text").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedOutput);

        let pipeline = Pipeline::new(FixedInvoker::replying(r#"{"tags": ["a", "b"]}"#));
        match pipeline.generate_tags("text").await.unwrap_err() {
            PipelineError::SchemaViolation { field, .. } => assert_eq!(field, "tags"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_classified() {
        let invoker = FixedInvoker::timing_out();
        let err = Pipeline::new(invoker.clone())
            .process("text")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelTimeout);
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_request_failure_is_unavailable() {
        let err = PipelineError::from(AgentError::RequestFailed("HTTP 503".to_string()));
        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
    }
}
