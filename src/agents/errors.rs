use thiserror::Error;

use crate::llm::LlmError;

/// Errors that can occur in the agent system
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Unresolved placeholder '{{{0}}}' in template")]
    UnresolvedPlaceholder(String),

    #[error("Crew must declare at least one {0}")]
    EmptyCrew(&'static str),

    #[error("Task is bound to undeclared agent: {0}")]
    UnknownAgent(String),

    #[error("Agent role declared twice: {0}")]
    DuplicateAgent(String),

    #[error("Task execution failed: {0}")]
    TaskExecutionFailed(String),

    #[error("Invalid process: {0} (expected \"sequential\")")]
    InvalidProcess(String),

    #[error("Unknown mode: {0}")]
    InvalidPersona(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
