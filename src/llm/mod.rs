//! LLM provider layer
//!
//! Provider-agnostic completion interface plus the concrete OpenAI and
//! Anthropic backends the crew talks to.

pub mod provider;
pub mod providers;

pub use provider::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, Message,
    MessageRole, TokenUsage,
};
pub use providers::{AnthropicConfig, AnthropicProvider, OpenAiConfig, OpenAiProvider};
