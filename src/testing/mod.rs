//! Test doubles for the LLM provider and the pipeline
//!
//! Used by unit tests, the HTTP integration tests and doc examples, so the
//! crew and the handlers can be exercised without network access.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::agents::errors::{AgentError, AgentResult};
use crate::agents::pipeline::Pipeline;
use crate::llm::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, TokenUsage,
};

/// LLM provider that replays a fixed script of answers and records requests
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Usage reported for every scripted answer
    pub fn usage_per_call() -> TokenUsage {
        TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = request.model.clone();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front())
            .unwrap_or_else(|| Err(LlmError::ApiError("script exhausted".to_string())));

        next.map(|content| CompletionResponse {
            content,
            model,
            usage: Self::usage_per_call(),
            finish_reason: FinishReason::Stop,
        })
    }
}

/// Pipeline double that records every invocation
#[derive(Debug)]
pub struct MockPipeline {
    outcome: Result<String, String>,
    calls: Mutex<Vec<HashMap<String, String>>>,
}

impl MockPipeline {
    /// Answers every call with `response`
    pub fn succeeding(response: impl Into<String>) -> Self {
        Self {
            outcome: Ok(response.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with a task execution error carrying `detail`
    pub fn failing(detail: impl Into<String>) -> Self {
        Self {
            outcome: Err(detail.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<HashMap<String, String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl Pipeline for MockPipeline {
    async fn invoke(&self, inputs: &HashMap<String, String>) -> AgentResult<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(inputs.clone());
        }

        self.outcome
            .clone()
            .map_err(AgentError::TaskExecutionFailed)
    }
}
