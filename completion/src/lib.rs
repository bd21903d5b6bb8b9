//! # Completion
//!
//! Single-turn, stateless text completion against an OpenAI-compatible
//! chat-completions endpoint (Groq by default).
//!
//! Every call is one prompt in and one free-text reply out; there is no
//! conversation state and no automatic retry.

pub mod error;
pub mod provider;

pub use error::{CompletionError, Result};
pub use provider::{ChatCompletionsProvider, CompletionProvider, CompletionRequest};
