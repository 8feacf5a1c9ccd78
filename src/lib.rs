//! # Notewise
//!
//! A backend service that turns study notes into a summary, topical tags and
//! question/answer flashcards using a hosted LLM.
//!
//! ## Features
//!
//! - **Structured Output**: every response is validated against a declared schema and
//!   returned as a typed `Summary`, `TagSet` or `CombinedResult`
//! - **Strict Parsing**: malformed or non-conforming model output is a classified error,
//!   never a partial result
//! - **Provider Choice**: Groq (OpenAI-compatible API) or Gemini via rstructor

pub mod agent;
pub mod config;
pub mod parser;
pub mod pipeline;
pub mod prompt;
pub mod schema;
pub mod server;

pub use config::Config;
pub use pipeline::{ErrorKind, Pipeline, PipelineError};
pub use schema::{CombinedResult, Flashcard, OutputSchema, Summary, TagSet};
